//! SLO-conditioned economic analysis
//!
//! For each `(runtime, telemetry_mode)` the analyzer finds the maximum
//! throughput among points whose p99 meets the SLO and converts it to a cost
//! per success. A key with no qualifying point is an explicit
//! [`MaxStableThroughput::SloViolation`], never zero.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::slo::{CostPerSuccess, MaxStableThroughput, SloPolicy};
use crate::model::{FrontierPoint, TelemetryMode};
use crate::stats::AggregateStat;

/// Economic result for one `(runtime, telemetry_mode)` key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomicSummary {
    pub runtime: String,
    pub telemetry_mode: TelemetryMode,
    pub max_stable_throughput: MaxStableThroughput,
    pub cost_per_success: CostPerSuccess,
    /// Points (or aggregates) considered for this key
    pub points: usize,
    /// Of those, how many met the SLO
    pub points_meeting_slo: usize,
}

#[derive(Debug, Default)]
struct KeyAccumulator {
    best: Option<f64>,
    points: usize,
    meeting: usize,
}

/// Computes maximum stable throughput and cost per success
#[derive(Debug, Clone, Default)]
pub struct EconomicAnalyzer {
    slo: SloPolicy,
}

impl EconomicAnalyzer {
    pub fn new(slo: SloPolicy) -> Self {
        Self { slo }
    }

    pub fn slo(&self) -> &SloPolicy {
        &self.slo
    }

    /// Analyze frontier points keyed by `(runtime, telemetry_mode)`
    pub fn analyze_frontier(&self, points: &[FrontierPoint]) -> Vec<EconomicSummary> {
        let summaries = self.analyze(
            points
                .iter()
                .map(|p| (p.runtime.as_str(), p.telemetry_mode, p.throughput_rps, p.p99_ms)),
        );
        info!(
            points = points.len(),
            keys = summaries.len(),
            slo_ms = self.slo.threshold_ms,
            "Computed cost per success from frontier"
        );
        summaries
    }

    /// Analyze aggregates, treating each cell's means as one point
    pub fn analyze_aggregates(&self, aggregates: &[AggregateStat]) -> Vec<EconomicSummary> {
        self.analyze(aggregates.iter().map(|a| {
            (
                a.runtime.as_str(),
                a.telemetry_mode,
                a.throughput_mean,
                a.p99_mean,
            )
        }))
    }

    fn analyze<'a, I>(&self, observations: I) -> Vec<EconomicSummary>
    where
        I: IntoIterator<Item = (&'a str, TelemetryMode, f64, f64)>,
    {
        let mut keys: BTreeMap<(&'a str, TelemetryMode), KeyAccumulator> = BTreeMap::new();

        for (runtime, mode, throughput, p99) in observations {
            let acc = keys.entry((runtime, mode)).or_default();
            acc.points += 1;
            if self.slo.meets(p99) {
                acc.meeting += 1;
                let conditioned = self.slo.conditioned_throughput(throughput, p99);
                acc.best = Some(acc.best.map_or(conditioned, |b| b.max(conditioned)));
            }
        }

        keys.into_iter()
            .map(|((runtime, mode), acc)| {
                let max_stable_throughput = match acc.best {
                    Some(rps) => MaxStableThroughput::Stable(rps),
                    None => MaxStableThroughput::SloViolation,
                };
                debug!(
                    runtime,
                    otel = %mode,
                    max_stable = %max_stable_throughput,
                    "Economic key evaluated"
                );
                EconomicSummary {
                    runtime: runtime.to_string(),
                    telemetry_mode: mode,
                    cost_per_success: CostPerSuccess::from_max(&max_stable_throughput),
                    max_stable_throughput,
                    points: acc.points,
                    points_meeting_slo: acc.meeting,
                }
            })
            .collect()
    }
}
