//! `parse-summary`: headline numbers from one k6 summary export

use anyhow::{Context, Result};

use crate::cli::ParseSummaryArgs;
use crate::telemetry::parse_summary_file;

/// Print `throughput,p99,failure_rate` on stdout
///
/// An unreadable or undecodable file is an error (non-zero exit), never a
/// placeholder line.
pub fn execute(args: &ParseSummaryArgs) -> Result<()> {
    let metrics = parse_summary_file(&args.file)
        .with_context(|| format!("Failed to parse k6 summary {}", args.file.display()))?;
    println!("{}", metrics.to_csv_line());
    Ok(())
}
