//! lgtail CLI - Command-line interface for reading event log directories

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lgtail::TailConfig;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "lgtail")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON file with reader configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the entries of a log directory in order
    Read {
        /// Path to the log directory
        dir: PathBuf,

        /// Keep waiting for new entries instead of stopping at the end
        #[arg(short, long)]
        live: bool,

        /// How often to re-scan the directory when caught up (milliseconds)
        #[arg(long)]
        poll_interval_ms: Option<u64>,

        /// Disable the directory watch and rely on polling alone
        #[arg(long)]
        no_watch: bool,

        /// Print one JSON object per entry
        #[arg(long)]
        json: bool,
    },

    /// List part files in the order they will be read
    Files {
        /// Path to the log directory
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let config = match &cli.config {
        Some(path) => TailConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => TailConfig::default(),
    };

    // Execute command
    match cli.command {
        Commands::Read {
            dir,
            live,
            poll_interval_ms,
            no_watch,
            json,
        } => {
            let config = commands::read::apply_flags(config, live, poll_interval_ms, no_watch);
            commands::read::execute(dir, config, json).await?;
        }
        Commands::Files { dir } => {
            commands::files::execute(dir, &config)?;
        }
    }

    Ok(())
}
