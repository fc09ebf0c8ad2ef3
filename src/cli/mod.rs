//! Command-line interface
//!
//! Argument definitions live here; each subcommand's behaviour lives in
//! [`commands`].

pub mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Runtime benchmark analysis: cold starts, tail latency and cost per success
#[derive(Debug, Parser)]
#[command(name = "runtime-lens")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print results as JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress human-readable output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info", value_name = "LEVEL")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Measure or summarize runtime cold starts
    #[command(subcommand)]
    Coldstart(ColdStartCommand),

    /// Aggregate raw k6 runs into per-cell statistics and cost per success
    ///
    /// Examples:
    ///   runtime-lens aggregate --raw-dir results/raw
    Aggregate(AggregateArgs),

    /// Max stable throughput and telemetry overhead from a frontier sweep
    Frontier(FrontierArgs),

    /// Print `throughput,p99,failure_rate` from one k6 summary file
    ParseSummary(ParseSummaryArgs),
}

#[derive(Debug, Subcommand)]
pub enum ColdStartCommand {
    /// Spawn each runtime repeatedly and time its first healthy response
    ///
    /// Examples:
    ///   runtime-lens coldstart probe --replicates 50
    ///   runtime-lens coldstart probe --resume --output results/raw/coldstart_results.csv
    Probe(ColdStartProbeArgs),

    /// Summarize an existing cold-start CSV
    Summarize(ColdStartSummarizeArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ColdStartProbeArgs {
    /// Rounds per runtime
    #[arg(short = 'n', long)]
    pub replicates: Option<u32>,

    /// Cold-start CSV to write
    #[arg(short, long, value_name = "CSV")]
    pub output: Option<PathBuf>,

    /// Append to the existing CSV and skip recorded trials
    #[arg(long)]
    pub resume: bool,

    /// Seed for the idle-delay RNG
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Args)]
pub struct ColdStartSummarizeArgs {
    /// Cold-start CSV to read
    #[arg(short, long, value_name = "CSV")]
    pub input: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct AggregateArgs {
    /// Directory holding one subdirectory per run
    #[arg(long, value_name = "DIR")]
    pub raw_dir: Option<PathBuf>,

    /// Where processed artifacts are written
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct FrontierArgs {
    /// Frontier CSV to read
    #[arg(short, long, value_name = "CSV")]
    pub input: Option<PathBuf>,

    /// Where processed artifacts are written
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct ParseSummaryArgs {
    /// k6 summary export (k6_summary.json)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Global output switches passed to every command
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputMode {
    pub json: bool,
    pub quiet: bool,
}

impl OutputMode {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            json: cli.json,
            quiet: cli.quiet,
        }
    }

    /// Tables and progress lines are shown
    pub fn human(&self) -> bool {
        !self.json && !self.quiet
    }
}
