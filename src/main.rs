//! Shipgen - starship concept art generator
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use shipgen::cli::{Cli, Commands};
use shipgen::config::{Config, ConfigManager};
use shipgen::error::ShipgenResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> ShipgenResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    init_logging(&config, cli.verbose);
    debug!("Configuration loaded from {}", config_manager.path().display());

    match cli.command {
        Commands::Generate(args) => shipgen::cli::commands::generate(args, &config).await,
        Commands::Prompt(args) => shipgen::cli::commands::prompt(args, &config).await,
        Commands::Batch(args) => shipgen::cli::commands::batch(args, &config).await,
        Commands::Catalog(args) => shipgen::cli::commands::catalog(args, &config).await,
        Commands::Quota(args) => shipgen::cli::commands::quota(args, &config).await,
        Commands::Status => shipgen::cli::commands::status(&config, config_manager.path()).await,
        Commands::Config(args) => {
            shipgen::cli::commands::config(args, &config, &config_manager).await
        }
    }
}

/// 0 = warn, 1 = info, 2+ = debug; `general.verbose` counts as one `-v`.
/// Logs go to stderr so `--format json` output stays parseable.
fn init_logging(config: &Config, verbose: u8) {
    let level = verbose.max(u8::from(config.general.verbose));
    let filter = match level {
        0 => EnvFilter::new("shipgen=warn"),
        1 => EnvFilter::new("shipgen=info"),
        _ => EnvFilter::new("shipgen=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
