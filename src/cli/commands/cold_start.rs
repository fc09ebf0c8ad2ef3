//! Cold start command implementation
//!
//! `coldstart probe` runs the prober against the configured runtimes and
//! appends each trial to the cold-start CSV; `coldstart summarize` reads that
//! CSV back and prints per-runtime statistics.

use anyhow::{Context, Result};
use colored::Colorize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use super::{persist, print_heading, print_json};
use crate::cli::{ColdStartProbeArgs, ColdStartSummarizeArgs, OutputMode};
use crate::coldstart::{
    completed_pairs, read_samples, ColdStartLog, ColdStartProber, CommandLauncher, HttpHealthCheck,
};
use crate::config::Config;
use crate::report::cold_start_table;
use crate::results::ArtifactKind;
use crate::stats::{summarize_cold_starts, ColdStartReport};

/// Run cold start probe command
pub async fn run_probe(
    args: ColdStartProbeArgs,
    mut config: Config,
    mode: OutputMode,
    shutdown_signal: Arc<tokio::sync::Notify>,
) -> Result<()> {
    if let Some(replicates) = args.replicates {
        config.coldstart.replicates = replicates;
    }
    if let Some(seed) = args.seed {
        config.bootstrap.seed = seed;
    }
    let output = args
        .output
        .unwrap_or_else(|| config.paths.coldstart_csv.clone());

    let completed: HashSet<(String, u32)> = if args.resume && output.exists() {
        let existing = read_samples(&output)
            .with_context(|| format!("Failed to read existing log {}", output.display()))?;
        completed_pairs(&existing.samples)
    } else {
        HashSet::new()
    };

    let mut log = if args.resume {
        ColdStartLog::append_to(&output)
    } else {
        ColdStartLog::create(&output)
    }
    .with_context(|| format!("Failed to open cold-start log {}", output.display()))?;

    let cs = &config.coldstart;
    if mode.human() {
        let names: Vec<&str> = cs.runtimes.iter().map(|r| r.name.as_str()).collect();
        println!(
            "{} Probing cold starts for {} ({} rounds)",
            "=>".bright_cyan().bold(),
            names.join(", ").bright_yellow(),
            cs.replicates.to_string().bright_yellow()
        );
        if !completed.is_empty() {
            println!("   resuming, {} trials already recorded", completed.len());
        }
    }

    let health = HttpHealthCheck::new(cs.health_path.clone())
        .context("Failed to create health check client")?;
    let prober = ColdStartProber::new(
        cs.runtimes.clone(),
        Arc::new(CommandLauncher::new(cs.port_env.clone())),
        Arc::new(health),
    )
    .with_timing(cs.timing())
    .with_replicates(cs.replicates)
    .with_seed(config.bootstrap.seed)
    .with_completed(completed)
    .with_shutdown(shutdown_signal);

    let summary = prober.run(&mut log).await.context("Cold-start probe failed")?;
    info!(
        session_id = %summary.session_id,
        log = %log.path().display(),
        "Probe complete"
    );

    if mode.human() {
        println!(
            "{} {} trials: {} ready, {} failed{}",
            "=>".bright_cyan().bold(),
            summary.attempted,
            summary.ready.to_string().bright_green(),
            summary.failed.to_string().bright_red(),
            if summary.interrupted { " (interrupted)" } else { "" }
        );
    }

    let report = summarize_file(&output, &config)?;
    emit_report(&report, &config, mode)
}

/// Run cold start summarize command
pub fn run_summarize(args: ColdStartSummarizeArgs, config: &Config, mode: OutputMode) -> Result<()> {
    let input = args
        .input
        .unwrap_or_else(|| config.paths.coldstart_csv.clone());
    let report = summarize_file(&input, config)?;
    emit_report(&report, config, mode)
}

fn summarize_file(path: &Path, config: &Config) -> Result<ColdStartReport> {
    let read = read_samples(path)
        .with_context(|| format!("Failed to read cold-start log {}", path.display()))?;
    Ok(summarize_cold_starts(
        &read.samples,
        &config.bootstrap.config(),
        config.bootstrap.seed,
    ))
}

fn emit_report(report: &ColdStartReport, config: &Config, mode: OutputMode) -> Result<()> {
    persist(&config.paths.processed_dir, ArtifactKind::ColdStart, report, mode)?;

    if mode.json {
        return print_json(report);
    }
    if mode.human() {
        print_heading("Cold Start Latency");
        println!("{}", cold_start_table(report));
    }
    Ok(())
}
