//! Point estimators and the bootstrap confidence interval
//!
//! Percentiles use the nearest-rank definition throughout so that numbers
//! line up with what k6 reports. None of these functions are ever called on
//! an empty sample by the aggregator; they still return a neutral value (or
//! `None` for the interval) instead of panicking.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Bootstrap resampling parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Number of resamples (B)
    pub resamples: usize,
    /// Two-sided confidence level, e.g. 0.95
    pub confidence: f64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            resamples: 1000,
            confidence: 0.95,
        }
    }
}

/// Lower and upper bound of a confidence interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation with denominator n
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Standard deviation with denominator n - 1; zero for fewer than two values
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Sort a copy of `values` ascending (NaN-tolerant)
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}

/// Median of already sorted values (mean of the two middle values for even n)
pub fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Nearest-rank percentile of already sorted values, `p` in [0, 100]
pub fn percentile_nearest_rank(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    let rank = (p * n as f64 / 100.0).ceil() as usize;
    let rank = rank.clamp(1, n);
    sorted[rank - 1]
}

/// Bootstrap confidence interval for the mean
///
/// Draws `config.resamples` resamples with replacement of the same size as
/// `values`, sorts their means and reads the bounds at the empirical
/// quantiles `(1 - c) / 2` and `(1 + c) / 2`.
pub fn bootstrap_mean_ci<R: Rng + ?Sized>(
    values: &[f64],
    config: &BootstrapConfig,
    rng: &mut R,
) -> Option<ConfidenceInterval> {
    if values.is_empty() || config.resamples == 0 {
        return None;
    }

    let n = values.len();
    let b = config.resamples;
    let mut means = Vec::with_capacity(b);
    for _ in 0..b {
        let mut sum = 0.0;
        for _ in 0..n {
            sum += values[rng.gen_range(0..n)];
        }
        means.push(sum / n as f64);
    }
    means.sort_by(|a, b| a.total_cmp(b));

    let lower_idx = ((b as f64) * (1.0 - config.confidence) / 2.0).floor() as usize;
    let upper_idx = ((b as f64) * (1.0 + config.confidence) / 2.0).floor() as usize;

    Some(ConfidenceInterval {
        lower: means[lower_idx.min(b - 1)],
        upper: means[upper_idx.min(b - 1)],
    })
}
