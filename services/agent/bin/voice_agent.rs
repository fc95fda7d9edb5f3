//! Main entrypoint for the voice agent demo.
//!
//! 1. Parses the command line.
//! 2. Loads configuration from the environment.
//! 3. Initializes logging.
//! 4. Runs the requested command.

use anyhow::Context;
use clap::Parser;
use tracing::info;
use voice_agent::{
    cli::{Cli, Command},
    config::Config,
    run,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_env_filter(config.env_filter())
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!(api_key = %config.api_key_hint(), "Configuration loaded");

    // --- 3. Run ---
    match &cli.command {
        Command::Converse(args) => {
            run::converse(&config, args).await?;
        }
        Command::Grant(args) => run::grant(&config, args).await?,
    }

    Ok(())
}
