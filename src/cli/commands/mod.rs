//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod check;
mod extract;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use ocrsift::config::{ExtractorConfig, CONFIG_ENV_VAR};

pub use extract::OutputFormat;

#[derive(Parser)]
#[command(name = "ocrsift")]
#[command(about = "Multi-engine OCR text extraction for images and PDFs")]
#[command(version)]
pub struct Cli {
    /// Config file path (TOML or JSON)
    #[arg(short, long, global = true, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text from images and PDFs
    Extract {
        /// Files to process (png, jpg, jpeg, bmp, tiff, gif, pdf)
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Write output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Number of files processed at once (default: 1)
        #[arg(short, long, default_value = "1")]
        jobs: usize,
        /// Per-file time budget in seconds (overrides config)
        #[arg(long)]
        deadline: Option<u64>,
    },

    /// Check if required OCR tools and backends are installed
    Check,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = ExtractorConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Extract {
            files,
            format,
            output,
            jobs,
            deadline,
        } => {
            if deadline.is_some() {
                config.deadline_secs = deadline;
            }
            extract::cmd_extract(config, files, format, output, jobs).await
        }
        Commands::Check => check::cmd_check(&config).await,
    }
}
