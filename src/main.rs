use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use runtime_lens::cli::{commands, Cli};
use runtime_lens::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    let shutdown_signal = Arc::new(tokio::sync::Notify::new());
    let signal = shutdown_signal.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing current trial");
            signal.notify_one();
        }
    });

    info!(version = env!("CARGO_PKG_VERSION"), "runtime-lens starting");
    commands::execute(cli, config, shutdown_signal).await
}
