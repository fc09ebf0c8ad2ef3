//! Shared data model
//!
//! Plain records passed between the parser, ingestor, aggregator, economic
//! analysis and the cold-start prober. All of them are immutable once built.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether the service under test ran with OpenTelemetry instrumentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TelemetryMode {
    Off,
    On,
}

impl TelemetryMode {
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            TelemetryMode::On
        } else {
            TelemetryMode::Off
        }
    }

    pub fn is_enabled(self) -> bool {
        self == TelemetryMode::On
    }

    /// Wire form used in CSV columns ("true"/"false")
    pub fn as_flag(self) -> &'static str {
        if self.is_enabled() {
            "true"
        } else {
            "false"
        }
    }

    /// Short label for reports
    pub fn label(self) -> &'static str {
        match self {
            TelemetryMode::On => "OTel",
            TelemetryMode::Off => "Base",
        }
    }
}

impl fmt::Display for TelemetryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_flag())
    }
}

impl FromStr for TelemetryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "true" => Ok(TelemetryMode::On),
            "false" => Ok(TelemetryMode::Off),
            other => Err(format!("expected 'true' or 'false', got '{}'", other)),
        }
    }
}

/// One accepted latency observation from a k6 event stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSample {
    pub timestamp: DateTime<Utc>,
    pub duration_ms: f64,
    /// HTTP status tag, as emitted by k6 (a string such as "200")
    pub status: Option<String>,
    /// Logical request name tag
    pub name: Option<String>,
}

impl NormalizedSample {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("200")
    }
}

/// Which raw file a replicate was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplicateSource {
    Summary,
    EventStream,
}

/// One experimental trial: a single k6 run against one runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicateResult {
    pub runtime: String,
    pub workload: String,
    pub telemetry_mode: TelemetryMode,
    pub replicate_id: u32,
    pub throughput_rps: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    /// Fraction of failed requests in [0, 1]
    pub error_rate: f64,
    pub source: ReplicateSource,
}

/// One measured point on a runtime's load-vs-latency curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontierPoint {
    pub timestamp: String,
    pub runtime: String,
    pub telemetry_mode: TelemetryMode,
    /// Number of k6 virtual users driving the point
    pub concurrency_level: u32,
    pub throughput_rps: f64,
    pub p99_ms: f64,
    pub failures: f64,
}

/// Result of one cold-start trial
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ColdStartOutcome {
    /// First healthy response after `elapsed_ms`
    Ready { elapsed_ms: f64 },
    /// Never became healthy, or never started
    Failure,
}

/// One cold-start measurement. Every attempted trial produces exactly one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColdStartSample {
    pub runtime: String,
    pub replicate_id: u32,
    pub outcome: ColdStartOutcome,
}

impl ColdStartSample {
    pub fn ready(runtime: impl Into<String>, replicate_id: u32, elapsed_ms: f64) -> Self {
        Self {
            runtime: runtime.into(),
            replicate_id,
            outcome: ColdStartOutcome::Ready { elapsed_ms },
        }
    }

    pub fn failure(runtime: impl Into<String>, replicate_id: u32) -> Self {
        Self {
            runtime: runtime.into(),
            replicate_id,
            outcome: ColdStartOutcome::Failure,
        }
    }

    pub fn elapsed_ms(&self) -> Option<f64> {
        match self.outcome {
            ColdStartOutcome::Ready { elapsed_ms } => Some(elapsed_ms),
            ColdStartOutcome::Failure => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, ColdStartOutcome::Failure)
    }
}
