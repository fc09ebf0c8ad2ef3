//! Tail-latency SLO and cost-per-success values

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Default p99 ceiling in milliseconds
pub const DEFAULT_SLO_MS: f64 = 200.0;

/// A fixed p99 latency ceiling a configuration must meet to count as stable
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SloPolicy {
    pub threshold_ms: f64,
}

impl Default for SloPolicy {
    fn default() -> Self {
        Self {
            threshold_ms: DEFAULT_SLO_MS,
        }
    }
}

impl SloPolicy {
    pub fn new(threshold_ms: f64) -> Self {
        Self { threshold_ms }
    }

    /// Inclusive: a p99 exactly at the threshold meets the SLO
    pub fn meets(&self, p99_ms: f64) -> bool {
        p99_ms <= self.threshold_ms
    }

    /// Throughput multiplied by the indicator that p99 is within the SLO
    pub fn conditioned_throughput(&self, throughput_rps: f64, p99_ms: f64) -> f64 {
        if self.meets(p99_ms) {
            throughput_rps
        } else {
            0.0
        }
    }
}

/// Greatest throughput observed while meeting the SLO
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "rps", rename_all = "snake_case")]
pub enum MaxStableThroughput {
    /// At least one point met the SLO; the value may be zero
    Stable(f64),
    /// No point for the key ever met the SLO
    SloViolation,
}

impl MaxStableThroughput {
    pub fn is_slo_violation(&self) -> bool {
        matches!(self, MaxStableThroughput::SloViolation)
    }

    pub fn rps(&self) -> Option<f64> {
        match self {
            MaxStableThroughput::Stable(rps) => Some(*rps),
            MaxStableThroughput::SloViolation => None,
        }
    }
}

impl fmt::Display for MaxStableThroughput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxStableThroughput::Stable(rps) => write!(f, "{:.2}", rps),
            MaxStableThroughput::SloViolation => f.write_str("SLO VIOLATION"),
        }
    }
}

/// Reciprocal of stable throughput; infinite when nothing was stable
///
/// Serialized as a JSON number, or the string `"inf"` when infinite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostPerSuccess(f64);

impl CostPerSuccess {
    pub const INFINITE: CostPerSuccess = CostPerSuccess(f64::INFINITY);

    /// `1 / throughput`, or infinite for zero (or negative) throughput
    pub fn from_throughput(throughput_rps: f64) -> Self {
        if throughput_rps > 0.0 {
            CostPerSuccess(1.0 / throughput_rps)
        } else {
            Self::INFINITE
        }
    }

    pub fn from_max(max: &MaxStableThroughput) -> Self {
        match max {
            MaxStableThroughput::Stable(rps) => Self::from_throughput(*rps),
            MaxStableThroughput::SloViolation => Self::INFINITE,
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_infinite(&self) -> bool {
        self.0.is_infinite()
    }
}

impl fmt::Display for CostPerSuccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_infinite() {
            f.write_str("inf")
        } else {
            write!(f, "{:.6}", self.0)
        }
    }
}

impl Serialize for CostPerSuccess {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.is_finite() {
            serializer.serialize_f64(self.0)
        } else {
            serializer.serialize_str("inf")
        }
    }
}

impl<'de> Deserialize<'de> for CostPerSuccess {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(CostPerSuccess(v)),
            Repr::Text(s) if s == "inf" => Ok(CostPerSuccess::INFINITE),
            Repr::Text(s) => Err(serde::de::Error::custom(format!(
                "invalid cost per success '{}'",
                s
            ))),
        }
    }
}
