//! Telemetry overhead comparison
//!
//! Pairs p99 latency with and without instrumentation at the same
//! `(runtime, concurrency_level)` and reports the relative change.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::model::{FrontierPoint, TelemetryMode};

/// One p99 observation at a given load level and telemetry mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverheadObservation {
    pub runtime: String,
    pub concurrency_level: u32,
    pub telemetry_mode: TelemetryMode,
    pub p99_ms: f64,
}

impl From<&FrontierPoint> for OverheadObservation {
    fn from(point: &FrontierPoint) -> Self {
        Self {
            runtime: point.runtime.clone(),
            concurrency_level: point.concurrency_level,
            telemetry_mode: point.telemetry_mode,
            p99_ms: point.p99_ms,
        }
    }
}

/// Relative p99 change from telemetry off to on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverheadRow {
    pub runtime: String,
    pub concurrency_level: u32,
    pub p99_off_ms: f64,
    pub p99_on_ms: f64,
    /// (on - off) / off * 100
    pub delta_percent: f64,
}

#[derive(Default)]
struct ModePair {
    off: Vec<f64>,
    on: Vec<f64>,
}

fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OverheadComparator;

impl OverheadComparator {
    pub fn new() -> Self {
        Self
    }

    /// Compare every `(runtime, concurrency)` present in both modes
    ///
    /// Keys seen in only one mode, and keys whose baseline p99 is zero, are
    /// left out. Repeated observations of the same key are averaged.
    pub fn compare(&self, observations: &[OverheadObservation]) -> Vec<OverheadRow> {
        let mut pairs: BTreeMap<(&str, u32), ModePair> = BTreeMap::new();
        for obs in observations {
            let pair = pairs
                .entry((obs.runtime.as_str(), obs.concurrency_level))
                .or_default();
            match obs.telemetry_mode {
                TelemetryMode::Off => pair.off.push(obs.p99_ms),
                TelemetryMode::On => pair.on.push(obs.p99_ms),
            }
        }

        pairs
            .into_iter()
            .filter_map(|((runtime, concurrency_level), pair)| {
                let (Some(off), Some(on)) = (average(&pair.off), average(&pair.on)) else {
                    debug!(runtime, concurrency_level, "Unpaired overhead key skipped");
                    return None;
                };
                if off <= 0.0 {
                    debug!(runtime, concurrency_level, "Zero baseline p99, skipping");
                    return None;
                }
                Some(OverheadRow {
                    runtime: runtime.to_string(),
                    concurrency_level,
                    p99_off_ms: off,
                    p99_on_ms: on,
                    delta_percent: (on - off) / off * 100.0,
                })
            })
            .collect()
    }

    pub fn compare_frontier(&self, points: &[FrontierPoint]) -> Vec<OverheadRow> {
        let observations: Vec<OverheadObservation> = points.iter().map(Into::into).collect();
        self.compare(&observations)
    }
}
