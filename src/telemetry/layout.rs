//! Run directory naming
//!
//! Each k6 run lives in a directory named
//! `runtime_workload[_more]_replicate[_otel<bool>]`, e.g.
//! `node_w1_rest_3_oteltrue`. The workload may itself contain underscores;
//! the runtime is always the first segment and the replicate always
//! precedes the optional mode.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LayoutError;
use crate::model::TelemetryMode;

const MODE_PREFIX: &str = "otel";

/// Identity of one raw run directory
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId {
    pub runtime: String,
    pub workload: String,
    pub replicate_id: u32,
    pub telemetry_mode: TelemetryMode,
}

impl RunId {
    pub fn parse(name: &str) -> Result<Self, LayoutError> {
        let segments: Vec<&str> = name.split('_').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(LayoutError::EmptySegment(name.to_string()));
        }

        let (telemetry_mode, rest) = match segments.split_last() {
            Some((last, rest)) if last.starts_with(MODE_PREFIX) => {
                let flag = &last[MODE_PREFIX.len()..];
                let mode = flag.parse::<TelemetryMode>().map_err(|_| LayoutError::InvalidMode {
                    name: name.to_string(),
                    segment: last.to_string(),
                })?;
                (mode, rest)
            }
            _ => (TelemetryMode::Off, segments.as_slice()),
        };

        // runtime + at least one workload segment + replicate
        if rest.len() < 3 {
            return Err(LayoutError::TooFewSegments(name.to_string()));
        }

        let runtime = rest[0];
        let replicate = rest[rest.len() - 1];
        let workload = rest[1..rest.len() - 1].join("_");

        let replicate_id = replicate
            .parse::<u32>()
            .map_err(|_| LayoutError::InvalidReplicate {
                name: name.to_string(),
                segment: replicate.to_string(),
            })?;

        Ok(Self {
            runtime: runtime.to_string(),
            workload,
            replicate_id,
            telemetry_mode,
        })
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}{}",
            self.runtime,
            self.workload,
            self.replicate_id,
            MODE_PREFIX,
            self.telemetry_mode.as_flag()
        )
    }
}

impl FromStr for RunId {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
