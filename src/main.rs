use anyhow::Result;
use clap::Parser;
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use openarchive_console::cli::{self, Cli, Command};
use openarchive_console::models::Config;

/// Set up tracing. The dashboard owns the terminal, so it only logs to a file or at error level.
fn init_logging(config: &Config, dashboard: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match (&config.log_file, dashboard) {
        (Some(path), _) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Arc::new(file))
                .init();
        }
        (None, true) => {
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::new("error"))
                .with_writer(std::io::stderr)
                .init();
        }
        (None, false) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Configuration error: {}", e);
            std::process::exit(2);
        }
    };

    if let Err(e) = init_logging(&config, matches!(cli.command, Command::Dashboard)) {
        eprintln!("⚠️  Could not open log file: {}", e);
    }
    debug!("Loaded configuration for {}", config.api_url);

    if let Err(e) = cli::run(cli, config).await {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}
