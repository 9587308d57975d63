//! services/client/src/bin/forum.rs

use clap::Parser;
use client_lib::{
    cli::{run, Cli},
    config::Config,
    error::ClientError,
    state::AppState,
};
use std::sync::Arc;
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    let cli = Cli::parse();

    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    debug!("Configuration loaded, using {}", config.api_url);

    // --- 2. Build the Shared AppState ---
    let state = AppState::new(config)?;

    // --- 3. Run the Command ---
    match run(cli.command, &state).await {
        Ok(output) => {
            println!("{}", output.trim_end());
            Ok(())
        }
        Err(ClientError::Forum(e)) if e.requires_sign_in() => {
            error!("{}", e);
            eprintln!("{} Run `forum login <email> --password <password>` first.", e);
            std::process::exit(2);
        }
        Err(e) => Err(e),
    }
}
