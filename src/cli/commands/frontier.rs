//! `frontier`: economics and telemetry overhead from a load sweep

use anyhow::{bail, Context, Result};
use colored::Colorize;
use serde::Serialize;
use tracing::info;

use super::{persist, print_heading, print_json};
use crate::cli::{FrontierArgs, OutputMode};
use crate::config::Config;
use crate::economics::{
    load_frontier, EconomicAnalyzer, EconomicSummary, OverheadComparator, OverheadRow,
};
use crate::report::{economics_table, overhead_table};
use crate::results::ArtifactKind;

#[derive(Serialize)]
struct FrontierOutput<'a> {
    economics: &'a [EconomicSummary],
    overhead: &'a [OverheadRow],
    skipped_rows: usize,
}

pub fn execute(args: FrontierArgs, config: &Config, mode: OutputMode) -> Result<()> {
    let input = args.input.unwrap_or_else(|| config.paths.frontier_csv.clone());
    let output_dir = args
        .output_dir
        .unwrap_or_else(|| config.paths.processed_dir.clone());

    let load = load_frontier(&input)
        .with_context(|| format!("Failed to read frontier CSV {}", input.display()))?;
    if load.points.is_empty() {
        bail!("No frontier points in {}", input.display());
    }
    info!(points = load.points.len(), skipped = load.skipped, "Loaded frontier");

    let economics = EconomicAnalyzer::new(config.slo).analyze_frontier(&load.points);
    let overhead = OverheadComparator::new().compare_frontier(&load.points);

    persist(&output_dir, ArtifactKind::Economics, &economics, mode)?;
    persist(&output_dir, ArtifactKind::Overhead, &overhead, mode)?;

    if mode.json {
        return print_json(&FrontierOutput {
            economics: &economics,
            overhead: &overhead,
            skipped_rows: load.skipped,
        });
    }

    if mode.human() {
        if load.skipped > 0 {
            println!(
                "{} Skipped {} malformed rows",
                "!".bright_red(),
                load.skipped
            );
        }
        print_heading(&format!(
            "Cost per Success (SLO p99 <= {}ms)",
            config.slo.threshold_ms
        ));
        println!("{}", economics_table(&economics));
        print_heading("OTel Overhead (p99)");
        if overhead.is_empty() {
            println!("No load levels measured in both modes");
        } else {
            println!("{}", overhead_table(&overhead));
        }
    }
    Ok(())
}
