//! Per-cell aggregation of replicate results
//!
//! Computes descriptive statistics, SLO-conditioned throughput and bootstrap
//! intervals for each `(runtime, workload, telemetry_mode)` cell. Groups are
//! independent: each draws from its own RNG seeded by the base seed and the
//! group key, so results do not depend on input order or on which other
//! groups are present.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::estimators::{
    bootstrap_mean_ci, mean, population_std, sorted, BootstrapConfig, ConfidenceInterval,
};
use super::grouping::{group_replicates, GroupKey};
use crate::economics::{CostPerSuccess, SloPolicy};
use crate::model::{ReplicateResult, TelemetryMode};

/// Aggregated statistics for one experimental cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateStat {
    pub runtime: String,
    pub workload: String,
    pub telemetry_mode: TelemetryMode,
    /// Number of replicates, always >= 1
    pub n: usize,
    pub throughput_mean: f64,
    pub throughput_std: f64,
    pub p99_mean: f64,
    pub p99_std: f64,
    pub p95_mean: f64,
    pub error_rate_mean: f64,
    /// Replicates whose p99 met the SLO
    pub slo_success_count: usize,
    /// Mean of throughput * 1[p99 <= SLO] across replicates
    pub slo_throughput_mean: f64,
    pub cost_per_success: CostPerSuccess,
    pub throughput_ci: ConfidenceInterval,
    pub p99_ci: ConfidenceInterval,
}

impl AggregateStat {
    pub fn key(&self) -> GroupKey {
        GroupKey {
            runtime: self.runtime.clone(),
            workload: self.workload.clone(),
            telemetry_mode: self.telemetry_mode,
        }
    }
}

/// Groups replicates and computes [`AggregateStat`] per group
#[derive(Debug, Clone)]
pub struct StatisticalAggregator {
    slo: SloPolicy,
    bootstrap: BootstrapConfig,
    seed: u64,
}

impl StatisticalAggregator {
    pub fn new(slo: SloPolicy, bootstrap: BootstrapConfig, seed: u64) -> Self {
        Self {
            slo,
            bootstrap,
            seed,
        }
    }

    pub fn slo(&self) -> &SloPolicy {
        &self.slo
    }

    /// Aggregate all replicates, one entry per distinct key, in key order
    pub fn aggregate(&self, results: &[ReplicateResult]) -> Vec<AggregateStat> {
        let groups = group_replicates(results);
        debug!(
            replicates = results.len(),
            groups = groups.len(),
            "Aggregating replicate results"
        );

        groups
            .iter()
            .map(|(key, members)| self.aggregate_group(key, members))
            .collect()
    }

    /// Aggregate one non-empty group
    pub fn aggregate_group(&self, key: &GroupKey, members: &[&ReplicateResult]) -> AggregateStat {
        // Canonical (sorted) order keeps sums and resampling independent of
        // the order replicates were discovered in.
        let column = |f: fn(&ReplicateResult) -> f64| -> Vec<f64> {
            sorted(&members.iter().map(|r| f(r)).collect::<Vec<_>>())
        };
        let throughput = column(|r| r.throughput_rps);
        let p99 = column(|r| r.p99_ms);
        let p95 = column(|r| r.p95_ms);
        let errors = column(|r| r.error_rate);

        let conditioned = sorted(
            &members
                .iter()
                .map(|r| self.slo.conditioned_throughput(r.throughput_rps, r.p99_ms))
                .collect::<Vec<_>>(),
        );
        let slo_success_count = members.iter().filter(|r| self.slo.meets(r.p99_ms)).count();
        let slo_throughput_mean = mean(&conditioned);

        let mut rng = self.group_rng(key);
        let throughput_mean = mean(&throughput);
        let p99_mean = mean(&p99);
        let throughput_ci = bootstrap_mean_ci(&throughput, &self.bootstrap, &mut rng)
            .unwrap_or(ConfidenceInterval {
                lower: throughput_mean,
                upper: throughput_mean,
            });
        let p99_ci = bootstrap_mean_ci(&p99, &self.bootstrap, &mut rng).unwrap_or(
            ConfidenceInterval {
                lower: p99_mean,
                upper: p99_mean,
            },
        );

        AggregateStat {
            runtime: key.runtime.clone(),
            workload: key.workload.clone(),
            telemetry_mode: key.telemetry_mode,
            n: members.len(),
            throughput_mean,
            throughput_std: population_std(&throughput),
            p99_mean,
            p99_std: population_std(&p99),
            p95_mean: mean(&p95),
            error_rate_mean: mean(&errors),
            slo_success_count,
            slo_throughput_mean,
            cost_per_success: CostPerSuccess::from_throughput(slo_throughput_mean),
            throughput_ci,
            p99_ci,
        }
    }

    fn group_rng(&self, key: &GroupKey) -> StdRng {
        StdRng::seed_from_u64(self.seed ^ key.stable_hash())
    }
}
