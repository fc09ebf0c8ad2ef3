//! `aggregate`: raw k6 runs to per-cell statistics and cost per success

use anyhow::{bail, Context, Result};
use colored::Colorize;
use serde::Serialize;
use tracing::info;

use super::{persist, print_heading, print_json};
use crate::cli::{AggregateArgs, OutputMode};
use crate::config::Config;
use crate::economics::{EconomicAnalyzer, EconomicSummary};
use crate::report::{aggregates_table, economics_table};
use crate::results::{write_aggregates_csv, ArtifactKind};
use crate::stats::{AggregateStat, StatisticalAggregator};
use crate::telemetry::{IngestConfig, MetricIngestor};

#[derive(Serialize)]
struct AggregateOutput<'a> {
    aggregates: &'a [AggregateStat],
    economics: &'a [EconomicSummary],
    skipped_runs: usize,
}

pub fn execute(args: AggregateArgs, config: &Config, mode: OutputMode) -> Result<()> {
    let raw_dir = args.raw_dir.unwrap_or_else(|| config.paths.raw_dir.clone());
    let output_dir = args
        .output_dir
        .unwrap_or_else(|| config.paths.processed_dir.clone());

    info!(raw_dir = %raw_dir.display(), "Aggregating raw results");

    let ingestor = MetricIngestor::new(IngestConfig::from(&config.telemetry));
    let report = ingestor
        .ingest_dir(&raw_dir)
        .with_context(|| format!("Failed to ingest {}", raw_dir.display()))?;

    if report.results.is_empty() {
        bail!("No replicate results found under {}", raw_dir.display());
    }

    let aggregator = StatisticalAggregator::new(
        config.slo,
        config.bootstrap.config(),
        config.bootstrap.seed,
    );
    let aggregates = aggregator.aggregate(&report.results);
    let economics = EconomicAnalyzer::new(config.slo).analyze_aggregates(&aggregates);

    write_aggregates_csv(&output_dir, &aggregates).context("Failed to write aggregate CSV")?;
    persist(&output_dir, ArtifactKind::Aggregates, &aggregates, mode)?;
    persist(&output_dir, ArtifactKind::Economics, &economics, mode)?;

    if mode.json {
        return print_json(&AggregateOutput {
            aggregates: &aggregates,
            economics: &economics,
            skipped_runs: report.problem_count(),
        });
    }

    if mode.human() {
        println!(
            "{} Ingested {} runs ({} skipped)",
            "=>".bright_cyan().bold(),
            report.results.len().to_string().bright_yellow(),
            report.problem_count().to_string().bright_red()
        );
        print_heading("Per-Cell Statistics");
        println!("{}", aggregates_table(&aggregates));
        print_heading(&format!(
            "Cost per Success (SLO p99 <= {}ms)",
            config.slo.threshold_ms
        ));
        println!("{}", economics_table(&economics));
    }
    Ok(())
}
