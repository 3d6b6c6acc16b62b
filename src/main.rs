mod ai;
mod answers;
mod browser;
mod config;
mod db;
mod dom;
mod evaluator;
mod filters;
mod job_page;
mod models;
mod operator;
mod orchestrator;
mod pagination;
mod scanner;
mod selectors;
mod session;
mod state;
mod submit;
#[cfg(test)]
mod testing;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ai::{AiClient, TextGenerator};
use browser::Browser;
use config::Config;
use db::Database;
use operator::{Operator, TerminalOperator};
use orchestrator::Orchestrator;
use state::RunState;

#[derive(Parser)]
#[command(name = "autoapply")]
#[command(about = "Job application automation - search, filter, answer and apply")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the record database and a default configuration file
    Init,

    /// Search, evaluate and apply to jobs in the browser
    Run {
        /// WebDriver server URL (overrides settings.webdriver_url)
        #[arg(long)]
        webdriver: Option<String>,

        /// Keep cycling until the daily limit is reached
        #[arg(long)]
        non_stop: bool,

        /// Evaluate listings without applying or recording anything
        #[arg(long)]
        dry_run: bool,
    },

    /// List submitted applications
    History {
        /// Number of records to show
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Filter by company
        #[arg(long)]
        company: Option<String>,
    },

    /// List failed and skipped jobs
    Failures {
        /// Number of records to show
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Filter by reason (substring)
        #[arg(short, long)]
        reason: Option<String>,
    },

    /// Show everything recorded for one job
    Show {
        /// Job ID
        job_id: String,
    },

    /// Inspect the configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Load and validate the configuration file
    Check,
}

/// Structured logs to stderr, plus a plain copy in the logs folder when given.
fn init_logging(logs_folder: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}=info", env!("CARGO_PKG_NAME"))));

    let (file_layer, guard) = match logs_folder {
        Some(folder) => {
            std::fs::create_dir_all(folder)
                .with_context(|| format!("Failed to create logs folder: {}", folder.display()))?;
            let appender = tracing_appender::rolling::never(folder, "autoapply.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(guard)
}

/// The configuration at `path`, or the defaults when there is no file yet.
fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        Config::load(path)
    } else {
        Ok(Config::default())
    }
}

fn open_records(config: &Config) -> Result<Database> {
    let db = Database::open(&config.records_path())?;
    db.init()?;
    Ok(db)
}

/// Read-only commands never create the store.
fn existing_records(config_path: &Path) -> Result<Database> {
    let config = load_or_default(config_path)?;
    let db = Database::open(&config.records_path())?;
    db.ensure_initialized()?;
    Ok(db)
}

fn run(config_path: &Path, webdriver: Option<String>, non_stop: bool, dry_run: bool) -> Result<()> {
    if !config_path.exists() {
        return Err(anyhow!(
            "No configuration at {}. Run `autoapply init` first.",
            config_path.display()
        ));
    }
    let mut config = Config::load(config_path)?;
    if let Some(url) = webdriver {
        config.settings.webdriver_url = url;
    }
    if non_stop {
        config.settings.run_non_stop = !config.settings.run_in_background;
    }

    let _guard = init_logging(Some(&config.settings.logs_folder_path))?;
    for problem in config.validate() {
        warn!("{}", problem);
    }

    let db = open_records(&config)?;
    let mut state = RunState::new(db.applied_job_ids()?);
    info!(applied = state.applied.len(), records = %db.path().display(), "loaded applied job index");

    let generator = if config.ai.enabled {
        match AiClient::from_config(&config.ai) {
            Ok(client) => {
                info!(model = client.model_name(), "AI answers enabled");
                Some(client)
            }
            Err(e) => {
                warn!(error = %e, "AI client unavailable, continuing without it");
                None
            }
        }
    } else {
        None
    };

    let operator = TerminalOperator;
    let background = config.settings.run_in_background;
    let browser = Browser::connect(&config.settings)?;
    if !session::ensure_logged_in(&browser, &operator)? {
        return Err(anyhow!("Not signed in to LinkedIn, nothing to do"));
    }

    let outcome = Orchestrator::new(&browser, &db, &operator)
        .with_generator(generator.as_ref().map(|g| g as &dyn TextGenerator))
        .dry_run(dry_run)
        .run(Arc::new(config), &mut state);

    let summary = state.summary();
    info!(
        runs = summary.total_runs,
        easy_applied = summary.easy_applied,
        external = summary.external,
        failed = summary.failed,
        skipped = summary.skipped,
        "run finished"
    );
    if background {
        println!("{}", summary);
    } else {
        operator.alert("Run summary", &summary.to_string());
    }

    match outcome {
        Ok(()) => browser.quit(),
        Err(e) => {
            error!(error = %e, "browser session lost");
            Err(e).context("The run ended early")
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);

    match cli.command {
        Commands::Init => {
            if Config::write_default(&config_path)? {
                println!("Wrote default configuration to {}", config_path.display());
            } else {
                println!("Configuration already exists at {}", config_path.display());
            }
            let config = Config::load(&config_path)?;
            let db = open_records(&config)?;
            println!("Database initialized at {}", db.path().display());
        }

        Commands::Run { webdriver, non_stop, dry_run } => {
            run(&config_path, webdriver, non_stop, dry_run)?;
        }

        Commands::History { limit, company } => {
            let db = existing_records(&config_path)?;
            let records = db.list_applications(limit, company.as_deref())?;
            if records.is_empty() {
                println!("No applications found.");
            } else {
                println!("{:<12} {:<20} {:<30} {:<20} {:<14}", "JOB ID", "APPLIED", "TITLE", "COMPANY", "LINK");
                println!("{}", "-".repeat(100));
                for record in records {
                    println!(
                        "{:<12} {:<20} {:<30} {:<20} {:<14}",
                        record.job_id,
                        truncate(&record.date_applied, 19),
                        truncate(&record.title, 28),
                        truncate(&record.company, 18),
                        truncate(&record.application_link, 14)
                    );
                }
            }
        }

        Commands::Failures { limit, reason } => {
            let db = existing_records(&config_path)?;
            let failures = db.list_failures(limit, reason.as_deref())?;
            if failures.is_empty() {
                println!("No failures found.");
            } else {
                println!("{:<12} {:<20} {:<40} {:<30}", "JOB ID", "TRIED", "REASON", "DETAIL");
                println!("{}", "-".repeat(104));
                for failure in failures {
                    println!(
                        "{:<12} {:<20} {:<40} {:<30}",
                        failure.job_id,
                        truncate(&failure.date_tried, 19),
                        truncate(&failure.reason, 38),
                        truncate(failure.detail.lines().next().unwrap_or(""), 30)
                    );
                }
            }
        }

        Commands::Show { job_id } => {
            let db = existing_records(&config_path)?;
            match db.get_application(&job_id)? {
                Some(record) => {
                    println!("Job {}", record.job_id);
                    println!("Title: {}", record.title);
                    println!("Company: {}", record.company);
                    println!("Location: {} ({})", record.work_location, record.work_style);
                    println!("Listed: {}{}", record.date_listed, if record.reposted { " (reposted)" } else { "" });
                    println!("Applied: {}", record.date_applied);
                    println!("Job link: {}", record.job_link);
                    println!("Application: {}", record.application_link);
                    println!("Resume: {}", record.resume);
                    println!("Experience required: {}", record.experience_required);
                    println!("Skills: {}", record.skills);
                    if record.hr_name != models::UNKNOWN {
                        println!("Hiring manager: {} <{}>", record.hr_name, record.hr_link);
                    }
                    if !record.questions.is_empty() {
                        println!("\n--- Questions ---");
                        for question in &record.questions {
                            println!("[{}] {}", question.kind, question.label);
                            println!("    {}", question.answer);
                        }
                    }
                    println!("\n--- About the job ---");
                    println!("{}", textwrap::fill(&record.about_job, 100));
                }
                None => println!("No application recorded for job {}.", job_id),
            }

            let failures = db.failures_for(&job_id)?;
            if !failures.is_empty() {
                println!("\n--- Failures ({}) ---", failures.len());
                for failure in failures {
                    println!("{} - {}", failure.date_tried, failure.reason);
                    for line in textwrap::fill(&failure.detail, 96).lines() {
                        println!("    {}", line);
                    }
                    if failure.screenshot != "Not Available" {
                        println!("    screenshot: {}", failure.screenshot);
                    }
                }
            }
        }

        Commands::Config { command } => match command {
            ConfigCommands::Check => {
                let config = Config::load(&config_path)?;
                let problems = config.validate();
                if problems.is_empty() {
                    println!("{}: OK", config_path.display());
                } else {
                    println!("{}: {} problem(s)", config_path.display(), problems.len());
                    for problem in problems {
                        println!("  - {}", problem);
                    }
                }
            }
        },
    }

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
