//! Main entry point for the pmqgraph CLI.

use clap::{Parser, Subcommand};
use pmqgraph_common::{init_logging, LoggingConfig, PmqGraphError, Result};
use pmqgraph_config::{Config, ConfigLoader};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error};

mod commands;

use commands::{debates, issues, pmq};

#[derive(Parser)]
#[command(name = "pmqgraph", version, about = "PMQ debate retrieval and issue polling charts")]
struct Cli {
    /// Path to a YAML config file (default: config.yaml, then built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the faceted "most important issues" chart from the polling workbook
    Issues(issues::IssuesArgs),
    /// Fetch recent PMQ debate contributions from TheyWorkForYou
    Debates(debates::DebatesArgs),
    /// Extract and summarize a PMQ session from a sitting day
    Pmq(pmq::PmqArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = setup_logging(&config, cli.log_level.as_deref()) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    debug!("Configuration loaded");

    let result = match cli.command {
        Command::Issues(args) => issues::run(&config, args),
        Command::Debates(args) => debates::run(&config, args).await,
        Command::Pmq(args) => pmq::run(&config, args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

fn setup_logging(config: &Config, override_level: Option<&str>) -> Result<()> {
    let logging = LoggingConfig {
        level: override_level
            .unwrap_or(&config.logging.level)
            .to_string(),
        compact_format: config.logging.compact,
        file_path: config.logging.file.clone(),
        ..Default::default()
    };
    init_logging(logging).map_err(|e| PmqGraphError::config(format!("logging setup failed: {e}")))
}
