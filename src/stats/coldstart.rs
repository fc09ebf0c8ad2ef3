//! Cold-start summaries per runtime

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use super::estimators::{
    bootstrap_mean_ci, mean, median, percentile_nearest_rank, sample_std, sorted,
    BootstrapConfig, ConfidenceInterval,
};
use super::grouping::stable_hash;
use crate::model::ColdStartSample;

/// Below this many successes the p95 is reported as the maximum
pub const P95_MIN_SAMPLES: usize = 20;

/// Latency statistics for one runtime with at least one successful trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColdStartSummary {
    pub runtime: String,
    pub attempts: usize,
    pub successes: usize,
    pub failures: usize,
    pub mean_ms: f64,
    pub median_ms: f64,
    pub stdev_ms: f64,
    pub p95_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub mean_ci: ConfidenceInterval,
}

/// A runtime whose every trial failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmeasuredRuntime {
    pub runtime: String,
    pub attempts: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColdStartReport {
    pub summaries: Vec<ColdStartSummary>,
    pub unmeasured: Vec<UnmeasuredRuntime>,
}

/// Summarize samples per runtime, sorted by runtime name
pub fn summarize_cold_starts(
    samples: &[ColdStartSample],
    bootstrap: &BootstrapConfig,
    seed: u64,
) -> ColdStartReport {
    let mut by_runtime: BTreeMap<&str, Vec<&ColdStartSample>> = BTreeMap::new();
    for sample in samples {
        by_runtime.entry(sample.runtime.as_str()).or_default().push(sample);
    }

    let mut report = ColdStartReport::default();
    for (runtime, runtime_samples) in by_runtime {
        let latencies: Vec<f64> = runtime_samples.iter().filter_map(|s| s.elapsed_ms()).collect();
        let attempts = runtime_samples.len();

        if latencies.is_empty() {
            warn!(runtime, attempts, "No successful cold-start trials");
            report.unmeasured.push(UnmeasuredRuntime {
                runtime: runtime.to_string(),
                attempts,
            });
            continue;
        }

        let values = sorted(&latencies);
        let mut rng = StdRng::seed_from_u64(seed ^ stable_hash(runtime));
        let mean_ms = mean(&values);
        let mean_ci = bootstrap_mean_ci(&values, bootstrap, &mut rng).unwrap_or(
            ConfidenceInterval {
                lower: mean_ms,
                upper: mean_ms,
            },
        );
        let max_ms = values[values.len() - 1];
        let p95_ms = if values.len() >= P95_MIN_SAMPLES {
            percentile_nearest_rank(&values, 95.0)
        } else {
            max_ms
        };

        report.summaries.push(ColdStartSummary {
            runtime: runtime.to_string(),
            attempts,
            successes: values.len(),
            failures: attempts - values.len(),
            mean_ms,
            median_ms: median(&values),
            stdev_ms: sample_std(&values),
            p95_ms,
            min_ms: values[0],
            max_ms,
            mean_ci,
        });
    }

    report
}
