//! Command implementations

pub mod aggregate;
pub mod cold_start;
pub mod frontier;
pub mod parse_summary;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use super::{Cli, ColdStartCommand, Commands, OutputMode};
use crate::config::Config;
use crate::results::{write_artifact, AnalysisArtifact, ArtifactKind};

/// Dispatch a parsed command line
pub async fn execute(cli: Cli, config: Config, shutdown_signal: Arc<tokio::sync::Notify>) -> Result<()> {
    let mode = OutputMode::from_cli(&cli);
    match cli.command {
        Commands::Coldstart(ColdStartCommand::Probe(args)) => {
            cold_start::run_probe(args, config, mode, shutdown_signal).await
        }
        Commands::Coldstart(ColdStartCommand::Summarize(args)) => {
            cold_start::run_summarize(args, &config, mode)
        }
        Commands::Aggregate(args) => aggregate::execute(args, &config, mode),
        Commands::Frontier(args) => frontier::execute(args, &config, mode),
        Commands::ParseSummary(args) => parse_summary::execute(&args),
    }
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

pub(crate) fn print_heading(title: &str) {
    println!();
    println!("{}", title.bright_cyan().bold().underline());
    println!();
}

/// Wrap `payload` in an artifact and write it under `dir`
pub(crate) fn persist<T: Serialize + ?Sized>(
    dir: &Path,
    kind: ArtifactKind,
    payload: &T,
    mode: OutputMode,
) -> Result<()> {
    let artifact = AnalysisArtifact::new(kind, payload)
        .with_context(|| format!("Failed to build {} artifact", kind))?;
    let path = write_artifact(dir, &artifact)
        .with_context(|| format!("Failed to write {} artifact", kind))?;
    if mode.human() {
        println!("{} Saved {} to {}", "=>".bright_cyan().bold(), kind, path.display());
    }
    Ok(())
}
