//! Terminal tables for analysis outputs
//!
//! Each function renders plain text; callers decide where it goes and add
//! any coloured headings around it.

use tabled::{Table, Tabled};

use crate::economics::{EconomicSummary, OverheadRow};
use crate::stats::{AggregateStat, ColdStartReport};

#[derive(Tabled)]
struct AggregateRow {
    #[tabled(rename = "Runtime")]
    runtime: String,
    #[tabled(rename = "Workload")]
    workload: String,
    #[tabled(rename = "Mode")]
    mode: &'static str,
    #[tabled(rename = "N")]
    n: usize,
    #[tabled(rename = "Throughput (req/s)")]
    throughput: String,
    #[tabled(rename = "p99 (ms)")]
    p99: String,
    #[tabled(rename = "95% CI p99")]
    p99_ci: String,
    #[tabled(rename = "SLO met")]
    slo: String,
    #[tabled(rename = "Cost/Success")]
    cost: String,
}

pub fn aggregates_table(stats: &[AggregateStat]) -> String {
    let rows = stats.iter().map(|s| AggregateRow {
        runtime: s.runtime.clone(),
        workload: s.workload.clone(),
        mode: s.telemetry_mode.label(),
        n: s.n,
        throughput: format!("{:.2} ± {:.2}", s.throughput_mean, s.throughput_std),
        p99: format!("{:.2} ± {:.2}", s.p99_mean, s.p99_std),
        p99_ci: format!("[{:.2}, {:.2}]", s.p99_ci.lower, s.p99_ci.upper),
        slo: format!("{}/{}", s.slo_success_count, s.n),
        cost: s.cost_per_success.to_string(),
    });
    Table::new(rows).to_string()
}

#[derive(Tabled)]
struct EconomicRow {
    #[tabled(rename = "Runtime")]
    runtime: String,
    #[tabled(rename = "Mode")]
    mode: &'static str,
    #[tabled(rename = "Max Stable RPS")]
    max_stable: String,
    #[tabled(rename = "Cost/Success")]
    cost: String,
    #[tabled(rename = "Points within SLO")]
    points: String,
}

pub fn economics_table(summaries: &[EconomicSummary]) -> String {
    let rows = summaries.iter().map(|s| EconomicRow {
        runtime: s.runtime.clone(),
        mode: s.telemetry_mode.label(),
        max_stable: s.max_stable_throughput.to_string(),
        cost: s.cost_per_success.to_string(),
        points: format!("{}/{}", s.points_meeting_slo, s.points),
    });
    Table::new(rows).to_string()
}

#[derive(Tabled)]
struct OverheadTableRow {
    #[tabled(rename = "Runtime")]
    runtime: String,
    #[tabled(rename = "VUs")]
    vus: u32,
    #[tabled(rename = "Base p99 (ms)")]
    off: String,
    #[tabled(rename = "OTel p99 (ms)")]
    on: String,
    #[tabled(rename = "Overhead")]
    delta: String,
}

pub fn overhead_table(rows: &[OverheadRow]) -> String {
    let rows = rows.iter().map(|r| OverheadTableRow {
        runtime: r.runtime.clone(),
        vus: r.concurrency_level,
        off: format!("{:.2}", r.p99_off_ms),
        on: format!("{:.2}", r.p99_on_ms),
        delta: format!("{:+.1}%", r.delta_percent),
    });
    Table::new(rows).to_string()
}

#[derive(Tabled)]
struct ColdStartRow {
    #[tabled(rename = "Runtime")]
    runtime: String,
    #[tabled(rename = "OK/Total")]
    attempts: String,
    #[tabled(rename = "Mean (ms)")]
    mean: String,
    #[tabled(rename = "95% CI")]
    ci: String,
    #[tabled(rename = "Median (ms)")]
    median: String,
    #[tabled(rename = "Stdev (ms)")]
    stdev: String,
    #[tabled(rename = "p95 (ms)")]
    p95: String,
    #[tabled(rename = "Min/Max (ms)")]
    range: String,
}

/// Measured runtimes first, then one row per runtime that never started
pub fn cold_start_table(report: &ColdStartReport) -> String {
    let measured = report.summaries.iter().map(|s| ColdStartRow {
        runtime: s.runtime.clone(),
        attempts: format!("{}/{}", s.successes, s.attempts),
        mean: format!("{:.2}", s.mean_ms),
        ci: format!("[{:.2}, {:.2}]", s.mean_ci.lower, s.mean_ci.upper),
        median: format!("{:.2}", s.median_ms),
        stdev: format!("{:.2}", s.stdev_ms),
        p95: format!("{:.2}", s.p95_ms),
        range: format!("{:.2} / {:.2}", s.min_ms, s.max_ms),
    });
    let unmeasured = report.unmeasured.iter().map(|u| ColdStartRow {
        runtime: u.runtime.clone(),
        attempts: format!("0/{}", u.attempts),
        mean: "FAIL".to_string(),
        ci: "-".to_string(),
        median: "-".to_string(),
        stdev: "-".to_string(),
        p95: "-".to_string(),
        range: "-".to_string(),
    });
    Table::new(measured.chain(unmeasured)).to_string()
}
