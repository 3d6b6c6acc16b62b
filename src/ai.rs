use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

use crate::config::{AiConfig, AiProvider};
use crate::models::FieldKind;

// --- Capability ---

/// Anything that can turn a prompt into text. Empty output is an error.
pub trait TextGenerator {
    fn generate(&self, prompt: &str, context: &str) -> Result<String>;
    fn model_name(&self) -> &str;
}

#[derive(Debug)]
pub enum AiClient {
    Anthropic(AnthropicProvider),
    OpenAi(OpenAIProvider),
    ClaudeCli(ClaudeCodeProvider),
}

impl AiClient {
    pub fn from_config(config: &AiConfig) -> Result<Self> {
        let model = config.model.clone();
        let client = match config.provider {
            AiProvider::Anthropic => {
                let key_env = config.api_key_env.as_deref().unwrap_or("ANTHROPIC_API_KEY");
                AiClient::Anthropic(AnthropicProvider::new(model, key_env, config.max_tokens)?)
            }
            AiProvider::OpenAi => {
                let key_env = config.api_key_env.as_deref().unwrap_or("OPENAI_API_KEY");
                let url = config.api_url.clone().unwrap_or_else(|| OPENAI_API_URL.to_string());
                AiClient::OpenAi(OpenAIProvider::new(model, key_env, url, config.max_tokens)?)
            }
            AiProvider::ClaudeCli => AiClient::ClaudeCli(ClaudeCodeProvider::new(model)?),
        };
        Ok(client)
    }

    fn complete(&self, prompt: &str) -> Result<String> {
        match self {
            AiClient::Anthropic(p) => p.complete(prompt),
            AiClient::OpenAi(p) => p.complete(prompt),
            AiClient::ClaudeCli(p) => p.complete(prompt),
        }
    }
}

impl TextGenerator for AiClient {
    fn generate(&self, prompt: &str, context: &str) -> Result<String> {
        let full_prompt = if context.trim().is_empty() {
            prompt.to_string()
        } else {
            format!("{}\n\n{}", context.trim(), prompt)
        };
        let response = self.complete(&full_prompt)?;
        let response = response.trim();
        if response.is_empty() {
            return Err(anyhow!("Empty response from {}", self.model_name()));
        }
        Ok(response.to_string())
    }

    fn model_name(&self) -> &str {
        match self {
            AiClient::Anthropic(p) => &p.model_id,
            AiClient::OpenAi(p) => &p.model_id,
            AiClient::ClaudeCli(p) => &p.model_id,
        }
    }
}

// --- Anthropic provider ---

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    #[allow(dead_code)]
    #[serde(rename = "type")]
    content_type: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
}

#[derive(Debug)]
pub struct AnthropicProvider {
    api_key: String,
    model_id: String,
    max_tokens: u32,
    client: reqwest::blocking::Client,
}

impl AnthropicProvider {
    pub fn new(model_id: String, key_env: &str, max_tokens: u32) -> Result<Self> {
        let api_key = env::var(key_env).with_context(|| {
            format!("{key_env} environment variable not set. Set it with: export {key_env}=your-key-here")
        })?;
        let client = reqwest::blocking::Client::new();
        Ok(Self { api_key, model_id, max_tokens, client })
    }

    fn complete(&self, prompt: &str) -> Result<String> {
        let request = AnthropicRequest {
            model: self.model_id.clone(),
            max_tokens: self.max_tokens,
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .context("Failed to send request to Anthropic API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(anyhow!(
                "Anthropic API request failed with status {}: {}",
                status,
                error_text
            ));
        }

        let api_response: AnthropicResponse = response
            .json()
            .context("Failed to parse Anthropic API response")?;

        api_response
            .content
            .first()
            .map(|block| block.text.clone())
            .ok_or_else(|| anyhow!("No content in Anthropic API response"))
    }
}

// --- Claude CLI provider (shells out to `claude`) ---

#[derive(Debug)]
pub struct ClaudeCodeProvider {
    model_id: String,
}

impl ClaudeCodeProvider {
    pub fn new(model_id: String) -> Result<Self> {
        std::process::Command::new("claude")
            .arg("--version")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .context("'claude' CLI not found. Install it or set ai.provider to \"anthropic\" or \"openai\".")?;
        Ok(Self { model_id })
    }

    fn complete(&self, prompt: &str) -> Result<String> {
        let output = std::process::Command::new("claude")
            .arg("-p")
            .arg(prompt)
            .arg("--model")
            .arg(&self.model_id)
            .output()
            .context("Failed to run 'claude' CLI")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("claude CLI failed: {}", stderr));
        }

        String::from_utf8(output.stdout).context("Invalid UTF-8 in claude CLI output")
    }
}

// --- OpenAI-compatible provider ---

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<OpenAIMessage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

/// Chat-completions client. `api_url` lets the same code talk to hosts that
/// speak the OpenAI protocol, such as DeepSeek.
#[derive(Debug)]
pub struct OpenAIProvider {
    api_key: String,
    api_url: String,
    model_id: String,
    max_tokens: u32,
    client: reqwest::blocking::Client,
}

impl OpenAIProvider {
    pub fn new(model_id: String, key_env: &str, api_url: String, max_tokens: u32) -> Result<Self> {
        let api_key = env::var(key_env).with_context(|| {
            format!("{key_env} environment variable not set. Set it with: export {key_env}=your-key-here")
        })?;
        let client = reqwest::blocking::Client::new();
        Ok(Self { api_key, api_url, model_id, max_tokens, client })
    }

    fn complete(&self, prompt: &str) -> Result<String> {
        let request = OpenAIRequest {
            model: self.model_id.clone(),
            max_tokens: self.max_tokens,
            messages: vec![OpenAIMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .with_context(|| format!("Failed to send request to {}", self.api_url))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(anyhow!(
                "Chat completion request failed with status {}: {}",
                status,
                error_text
            ));
        }

        let api_response: OpenAIResponse = response
            .json()
            .context("Failed to parse chat completion response")?;

        api_response
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow!("No choices in chat completion response"))
    }
}

// --- Prompts ---

pub fn answer_question(
    generator: &dyn TextGenerator,
    label: &str,
    kind: FieldKind,
    options: Option<&[String]>,
    job_description: Option<&str>,
    user_information: &str,
) -> Result<String> {
    let length_rule = match kind {
        FieldKind::Textarea => "Answer in at most 350 characters.",
        FieldKind::Select | FieldKind::Radio => "Answer with exactly one of the options, copied verbatim.",
        _ => "Answer in a few words or a number only, no explanation.",
    };
    let mut prompt = format!(
        "You are filling in a job application form for the candidate described below.\n\
        {length_rule}\n\n\
        Question ({kind}): {label}\n"
    );
    if let Some(options) = options {
        prompt.push_str("Options:\n");
        for option in options {
            prompt.push_str(&format!("- {}\n", option));
        }
    }

    let mut context = format!("Candidate information:\n{}", user_information);
    if let Some(description) = job_description {
        context.push_str(&format!("\n\nJob description:\n{}", description));
    }

    let answer = generator.generate(&prompt, &context)?;
    let answer = answer.trim().trim_matches('"').trim().to_string();
    if answer.is_empty() {
        return Err(anyhow!("Empty answer for '{}'", label));
    }
    Ok(answer)
}

pub fn extract_skills(generator: &dyn TextGenerator, job_description: &str) -> Result<String> {
    let prompt = "Extract the key technical skills, technologies and requirements from the job \
        posting above. Return ONLY a comma-separated list of keywords, no explanations.";
    let response = generator.generate(prompt, &format!("Job posting:\n{}", job_description))?;

    let skills: Vec<&str> = response
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if skills.is_empty() {
        return Err(anyhow!("No skills in response"));
    }
    Ok(skills.join(", "))
}
