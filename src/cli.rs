use crate::client::{AnalysisJob, BackendClient};
use crate::commands::{self, AppState, SettingsUpdate};
use crate::config;
use crate::db::Database;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Clean up AI survey summaries and split them into categorized bullet lists
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory holding config.json and the cache database
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Normalize a block of AI text (reads stdin when FILE is omitted)
    Normalize { file: Option<PathBuf> },

    /// Normalize a list of fragments: a JSON array of strings, or one per line
    Items { file: Option<PathBuf> },

    /// Split AI text into Positive / Negative / Suggestion / Noise lists
    Sections { file: Option<PathBuf> },

    /// Fetch the AI summary for a survey, reusing the cached one while unchanged
    Summary {
        survey_id: i64,

        /// Ask the backend for a new summary even if the cached one is fresh
        #[arg(long)]
        refresh: bool,

        /// Keep nothing on disk for this run
        #[arg(long)]
        no_cache: bool,
    },

    /// Show the most recent stored analysis for a survey
    Latest {
        survey_id: i64,

        /// Analysis kind (defaults to the configured summary kind)
        #[arg(long)]
        kind: Option<String>,
    },

    /// Run a batch analysis on the backend and print its raw result
    Run {
        survey_id: i64,

        #[arg(value_enum)]
        job: JobKind,

        /// Number of theme clusters (themes only)
        #[arg(long)]
        k: Option<u32>,
    },

    /// List locally recorded summaries for a survey, newest first
    History { survey_id: i64 },

    /// Forget the cached summary and local history for a survey
    ClearCache { survey_id: i64 },

    /// Show or update settings
    Config {
        #[arg(long)]
        api_url: Option<String>,

        #[arg(long)]
        token: Option<String>,

        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobKind {
    Keywords,
    Sentiment,
    Themes,
}

impl JobKind {
    fn with_clusters(self, k: Option<u32>) -> AnalysisJob {
        match self {
            JobKind::Keywords => AnalysisJob::Keywords,
            JobKind::Sentiment => AnalysisJob::BasicSentiment,
            JobKind::Themes => AnalysisJob::Themes { k },
        }
    }
}

pub async fn execute(args: Args) -> Result<()> {
    let app_data_dir = args.data_dir.clone().unwrap_or_else(config::default_app_data_dir);
    debug!("Using app data dir {}", app_data_dir.display());

    match args.command {
        Command::Normalize { file } => {
            let text = read_input(file.as_deref())?;
            println!("{}", commands::normalize_text(&text));
        }
        Command::Items { file } => {
            let text = read_input(file.as_deref())?;
            print_json(&commands::normalize_items(&parse_items(&text)))?;
        }
        Command::Sections { file } => {
            let text = read_input(file.as_deref())?;
            print_json(&commands::analyze_text(&text))?;
        }
        Command::Summary { survey_id, refresh, no_cache } => {
            let state = open_state(&app_data_dir, no_cache)?;
            let client = BackendClient::new(&state.config)?;
            let result = commands::get_survey_summary(&state, &client, survey_id, refresh).await?;
            print_json(&result)?;
        }
        Command::Latest { survey_id, kind } => {
            let config = config::load_config(&app_data_dir).apply_env_overrides();
            let kind = kind.unwrap_or_else(|| config.summary_kind.clone());
            let client = BackendClient::new(&config)?;
            let result = commands::get_latest_summary(&client, survey_id, &kind).await?;
            print_json(&result)?;
        }
        Command::Run { survey_id, job, k } => {
            if k.is_some() && job != JobKind::Themes {
                warn!("--k only applies to themes, ignoring it");
            }
            let config = config::load_config(&app_data_dir).apply_env_overrides();
            let client = BackendClient::new(&config)?;
            let result = commands::run_backend_analysis(&client, survey_id, job.with_clusters(k)).await?;
            print_json(&result)?;
        }
        Command::History { survey_id } => {
            let state = open_state(&app_data_dir, false)?;
            print_json(&commands::get_analysis_history(&state, survey_id)?)?;
        }
        Command::ClearCache { survey_id } => {
            let state = open_state(&app_data_dir, false)?;
            commands::clear_cached_summary(&state, survey_id)?;
        }
        Command::Config { api_url, token, timeout_secs } => {
            let mut state = open_state(&app_data_dir, true)?;
            if api_url.is_some() || token.is_some() || timeout_secs.is_some() {
                let update = SettingsUpdate {
                    api_base_url: api_url,
                    api_token: token,
                    request_timeout_secs: timeout_secs,
                };
                commands::save_settings(&mut state, update)?;
            }
            print_json(&commands::get_settings(&state))?;
        }
    }

    Ok(())
}

fn open_state(app_data_dir: &Path, in_memory: bool) -> Result<AppState> {
    let config = config::load_config(app_data_dir).apply_env_overrides();
    let db = if in_memory {
        Database::new(":memory:")?
    } else {
        fs::create_dir_all(app_data_dir)
            .with_context(|| format!("Failed to create {}", app_data_dir.display()))?;
        let db_path = app_data_dir.join("cache.sqlite");
        Database::new(&db_path.to_string_lossy())
            .with_context(|| format!("Failed to open {}", db_path.display()))?
    };

    Ok(AppState {
        db,
        app_data_dir: app_data_dir.to_path_buf(),
        config,
    })
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text).context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

/// A JSON array of strings, or else one fragment per line.
fn parse_items(text: &str) -> Vec<String> {
    serde_json::from_str::<Vec<String>>(text)
        .unwrap_or_else(|_| text.lines().map(str::to_string).collect())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
