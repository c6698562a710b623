pub mod analysis;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod db;
pub mod dto;
pub mod error;
pub mod fragments;
pub mod markers;
pub mod normalize;
pub mod sections;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub use analysis::{AnalysisResult, SummaryView};
pub use error::{AppError, Result};
pub use fragments::normalize_ai_text_array;
pub use normalize::normalize_ai_text;
pub use sections::{extract_sections, AnalysisSections, Category};

pub fn run() -> anyhow::Result<()> {
    let args = cli::Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .init();

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(cli::execute(args))
}
