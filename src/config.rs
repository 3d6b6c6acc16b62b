use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// --- Search vocabularies ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortBy {
    #[serde(rename = "Most recent")]
    MostRecent,
    #[serde(rename = "Most relevant")]
    MostRelevant,
}

impl SortBy {
    pub fn label(self) -> &'static str {
        match self {
            SortBy::MostRecent => "Most recent",
            SortBy::MostRelevant => "Most relevant",
        }
    }

    pub fn url_code(self) -> &'static str {
        match self {
            SortBy::MostRecent => "DD",
            SortBy::MostRelevant => "R",
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            SortBy::MostRecent => SortBy::MostRelevant,
            SortBy::MostRelevant => SortBy::MostRecent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatePosted {
    #[serde(rename = "Any time")]
    AnyTime,
    #[serde(rename = "Past month")]
    PastMonth,
    #[serde(rename = "Past week")]
    PastWeek,
    #[serde(rename = "Past 24 hours")]
    Past24Hours,
}

impl DatePosted {
    pub const CYCLE: [DatePosted; 4] = [
        DatePosted::AnyTime,
        DatePosted::PastMonth,
        DatePosted::PastWeek,
        DatePosted::Past24Hours,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DatePosted::AnyTime => "Any time",
            DatePosted::PastMonth => "Past month",
            DatePosted::PastWeek => "Past week",
            DatePosted::Past24Hours => "Past 24 hours",
        }
    }

    /// Relative-seconds window; "Any time" has none.
    pub fn url_code(self) -> Option<&'static str> {
        match self {
            DatePosted::AnyTime => None,
            DatePosted::PastMonth => Some("r2592000"),
            DatePosted::PastWeek => Some("r604800"),
            DatePosted::Past24Hours => Some("r86400"),
        }
    }

    /// Next window in the cycle. With `hold_at_last` the cycle stops at
    /// "Past 24 hours" instead of wrapping back to "Any time".
    pub fn next(self, hold_at_last: bool) -> Self {
        let index = Self::CYCLE.iter().position(|d| *d == self).unwrap_or(0);
        match Self::CYCLE.get(index + 1) {
            Some(next) => *next,
            None if hold_at_last => self,
            None => Self::CYCLE[0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkType {
    #[serde(rename = "On-site")]
    OnSite,
    Remote,
    Hybrid,
}

impl WorkType {
    pub fn label(self) -> &'static str {
        match self {
            WorkType::OnSite => "On-site",
            WorkType::Remote => "Remote",
            WorkType::Hybrid => "Hybrid",
        }
    }

    pub fn url_code(self) -> &'static str {
        match self {
            WorkType::OnSite => "1",
            WorkType::Remote => "2",
            WorkType::Hybrid => "3",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobType {
    #[serde(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    PartTime,
    Contract,
    Temporary,
    Volunteer,
    Internship,
    Other,
}

impl JobType {
    pub fn label(self) -> &'static str {
        match self {
            JobType::FullTime => "Full-time",
            JobType::PartTime => "Part-time",
            JobType::Contract => "Contract",
            JobType::Temporary => "Temporary",
            JobType::Volunteer => "Volunteer",
            JobType::Internship => "Internship",
            JobType::Other => "Other",
        }
    }

    pub fn url_code(self) -> &'static str {
        match self {
            JobType::FullTime => "F",
            JobType::PartTime => "P",
            JobType::Contract => "C",
            JobType::Temporary => "T",
            JobType::Volunteer => "V",
            JobType::Internship => "I",
            JobType::Other => "O",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperienceLevel {
    Internship,
    #[serde(rename = "Entry level")]
    EntryLevel,
    Associate,
    #[serde(rename = "Mid-Senior level")]
    MidSenior,
    Director,
    Executive,
}

impl ExperienceLevel {
    pub fn label(self) -> &'static str {
        match self {
            ExperienceLevel::Internship => "Internship",
            ExperienceLevel::EntryLevel => "Entry level",
            ExperienceLevel::Associate => "Associate",
            ExperienceLevel::MidSenior => "Mid-Senior level",
            ExperienceLevel::Director => "Director",
            ExperienceLevel::Executive => "Executive",
        }
    }

    pub fn url_code(self) -> &'static str {
        match self {
            ExperienceLevel::Internship => "1",
            ExperienceLevel::EntryLevel => "2",
            ExperienceLevel::Associate => "3",
            ExperienceLevel::MidSenior => "4",
            ExperienceLevel::Director => "5",
            ExperienceLevel::Executive => "6",
        }
    }
}

// --- Sections ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub search_terms: Vec<String>,
    pub search_location: String,
    /// Applications per search term before moving on.
    pub switch_number: usize,
    pub randomize_search_order: bool,
    pub sort_by: Option<SortBy>,
    pub date_posted: Option<DatePosted>,
    pub salary: String,
    pub easy_apply_only: bool,
    pub experience_level: Vec<ExperienceLevel>,
    pub job_type: Vec<JobType>,
    pub on_site: Vec<WorkType>,
    pub companies: Vec<String>,
    pub location: Vec<String>,
    pub industry: Vec<String>,
    pub job_function: Vec<String>,
    pub job_titles: Vec<String>,
    pub benefits: Vec<String>,
    pub commitments: Vec<String>,
    pub under_10_applicants: bool,
    pub in_your_network: bool,
    pub fair_chance_employer: bool,
    pub english_only_jobs: bool,
    pub pause_after_filters: bool,
    pub about_company_bad_words: Vec<String>,
    pub about_company_good_words: Vec<String>,
    pub bad_words: Vec<String>,
    pub exclude_locations: Vec<String>,
    pub security_clearance: bool,
    pub did_masters: bool,
    /// Years of experience; -1 disables the experience filter.
    pub current_experience: i32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            search_terms: vec!["Software Engineer".to_string()],
            search_location: String::new(),
            switch_number: 30,
            randomize_search_order: false,
            sort_by: Some(SortBy::MostRecent),
            date_posted: Some(DatePosted::PastWeek),
            salary: String::new(),
            easy_apply_only: true,
            experience_level: Vec::new(),
            job_type: Vec::new(),
            on_site: Vec::new(),
            companies: Vec::new(),
            location: Vec::new(),
            industry: Vec::new(),
            job_function: Vec::new(),
            job_titles: Vec::new(),
            benefits: Vec::new(),
            commitments: Vec::new(),
            under_10_applicants: false,
            in_your_network: false,
            fair_chance_employer: false,
            english_only_jobs: false,
            pause_after_filters: true,
            about_company_bad_words: Vec::new(),
            about_company_good_words: Vec::new(),
            bad_words: Vec::new(),
            exclude_locations: Vec::new(),
            security_clearance: false,
            did_masters: false,
            current_experience: -1,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalsConfig {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub phone_country_code: String,
    pub current_city: String,
    pub street: String,
    pub state: String,
    pub zipcode: String,
    pub country: String,
    pub ethnicity: String,
    pub gender: String,
    pub disability_status: String,
    pub veteran_status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionsConfig {
    pub default_resume_path: PathBuf,
    pub years_of_experience: String,
    pub require_visa: String,
    pub us_citizenship: String,
    pub linkedin: String,
    pub website: String,
    pub linkedin_headline: String,
    pub linkedin_summary: String,
    pub cover_letter: String,
    pub user_information_all: String,
    pub recent_employer: String,
    pub confidence_level: String,
    /// Answer for "how did you hear about this job".
    pub referral_source: String,
    pub desired_salary: u64,
    pub current_ctc: u64,
    /// Notice period in days.
    pub notice_period: u32,
    pub overwrite_previous_answers: bool,
    pub pause_before_submit: bool,
    pub pause_at_failed_question: bool,
}

impl Default for QuestionsConfig {
    fn default() -> Self {
        Self {
            default_resume_path: PathBuf::from("resumes/default/resume.pdf"),
            years_of_experience: "5".to_string(),
            require_visa: "No".to_string(),
            us_citizenship: "U.S. Citizen/Permanent Resident".to_string(),
            linkedin: String::new(),
            website: String::new(),
            linkedin_headline: String::new(),
            linkedin_summary: String::new(),
            cover_letter: String::new(),
            user_information_all: String::new(),
            recent_employer: "Not Applicable".to_string(),
            confidence_level: "8".to_string(),
            referral_source: "LinkedIn".to_string(),
            desired_salary: 1_200_000,
            current_ctc: 800_000,
            notice_period: 30,
            overwrite_previous_answers: false,
            pause_before_submit: true,
            pause_at_failed_question: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    pub webdriver_url: String,
    /// Chrome user-data directory holding the logged-in session.
    pub chrome_profile: Option<PathBuf>,
    pub records_path: Option<PathBuf>,
    pub logs_folder_path: PathBuf,
    pub close_tabs: bool,
    pub follow_companies: bool,
    pub run_non_stop: bool,
    pub alternate_sortby: bool,
    pub cycle_date_posted: bool,
    pub stop_date_cycle_at_24hr: bool,
    /// Seconds between non-stop cycles.
    pub cycle_sleep_secs: u64,
    /// Seconds to wait after clicks.
    pub click_gap: f64,
    pub run_in_background: bool,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            chrome_profile: None,
            records_path: None,
            logs_folder_path: PathBuf::from("logs"),
            close_tabs: false,
            follow_companies: false,
            run_non_stop: false,
            alternate_sortby: true,
            cycle_date_posted: true,
            stop_date_cycle_at_24hr: true,
            cycle_sleep_secs: 600,
            click_gap: 1.0,
            run_in_background: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AiProvider {
    Anthropic,
    #[serde(rename = "openai")]
    OpenAi,
    ClaudeCli,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub enabled: bool,
    pub provider: AiProvider,
    pub model: String,
    /// Overrides the provider's endpoint (OpenAI-compatible hosts).
    pub api_url: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: Option<String>,
    pub max_tokens: u32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: AiProvider::ClaudeCli,
            model: "claude-haiku-4-5-20251001".to_string(),
            api_url: None,
            api_key_env: None,
            max_tokens: 1024,
        }
    }
}

const DEFAULT_HEADER: &str = "\
# autoapply configuration.
# Every key is optional; anything left out takes the value shown here.
# Sections: [search] what to look for, [personals] and [questions] how forms
# are answered, [settings] browser and run behaviour, [ai] answer generation.

";

// --- Snapshot ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip)]
    pub revision: u64,
    pub search: SearchConfig,
    pub personals: PersonalsConfig,
    pub questions: QuestionsConfig,
    pub settings: SettingsConfig,
    pub ai: AiConfig,
}

impl Config {
    pub fn default_path() -> PathBuf {
        match directories::ProjectDirs::from("", "", "autoapply") {
            Some(dirs) => dirs.config_dir().join("config.toml"),
            None => PathBuf::from("autoapply.toml"),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(raw)?;
        config.apply_background_overrides();
        Ok(config)
    }

    /// Writes the default configuration if nothing exists at `path`. Returns whether it wrote.
    pub fn write_default(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let body = format!("{}{}", DEFAULT_HEADER, toml::to_string_pretty(&Config::default())?);
        std::fs::write(path, body)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(true)
    }

    /// Background runs never wait on the operator.
    fn apply_background_overrides(&mut self) {
        if self.settings.run_in_background {
            self.questions.pause_at_failed_question = false;
            self.questions.pause_before_submit = false;
            self.search.pause_after_filters = false;
            self.settings.run_non_stop = false;
        }
    }

    pub fn next_revision(&self, sort_by: Option<SortBy>, date_posted: Option<DatePosted>) -> Self {
        let mut next = self.clone();
        next.revision = self.revision + 1;
        next.search.sort_by = sort_by;
        next.search.date_posted = date_posted;
        next
    }

    pub fn records_path(&self) -> PathBuf {
        if let Some(path) = &self.settings.records_path {
            return path.clone();
        }
        match directories::ProjectDirs::from("", "", "autoapply") {
            Some(dirs) => dirs.data_dir().join("records.db"),
            None => PathBuf::from("records.db"),
        }
    }

    /// Problems that make a run pointless or surprising. Empty means fine.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.search.search_terms.iter().all(|t| t.trim().is_empty()) {
            problems.push("search.search_terms has no non-empty term".to_string());
        }
        if self.search.switch_number == 0 {
            problems.push("search.switch_number must be at least 1".to_string());
        }
        if self.search.current_experience < -1 {
            problems.push("search.current_experience must be -1 (disabled) or >= 0".to_string());
        }
        if self.settings.click_gap < 0.0 {
            problems.push("settings.click_gap must not be negative".to_string());
        }
        if self.personals.first_name.trim().is_empty() || self.personals.last_name.trim().is_empty() {
            problems.push("personals.first_name and personals.last_name are required".to_string());
        }
        if self.questions.years_of_experience.trim().parse::<u32>().is_err() {
            problems.push("questions.years_of_experience must be a whole number".to_string());
        }
        if !self.questions.default_resume_path.exists() {
            problems.push(format!(
                "questions.default_resume_path '{}' does not exist; the previously uploaded resume will be used",
                self.questions.default_resume_path.display()
            ));
        }
        if self.ai.enabled && self.ai.model.trim().is_empty() {
            problems.push("ai.model is required when ai.enabled".to_string());
        }
        problems
    }
}
