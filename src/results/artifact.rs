//! Processed analysis artifacts
//!
//! Every persisted analysis output is wrapped in an [`AnalysisArtifact`]
//! carrying an id, what kind of output it is, and when it was produced.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// What an artifact's payload holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Aggregates,
    Economics,
    Overhead,
    ColdStart,
}

impl ArtifactKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Aggregates => "aggregates",
            ArtifactKind::Economics => "economics",
            ArtifactKind::Overhead => "overhead",
            ArtifactKind::ColdStart => "cold_start",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One persisted analysis output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisArtifact {
    pub artifact_id: Uuid,
    pub kind: ArtifactKind,
    pub generated_at: DateTime<Utc>,
    pub payload: Value,
}

impl AnalysisArtifact {
    pub fn new<T: Serialize + ?Sized>(kind: ArtifactKind, payload: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            artifact_id: Uuid::new_v4(),
            kind,
            generated_at: Utc::now(),
            payload: serde_json::to_value(payload)?,
        })
    }

    pub fn with_generated_at(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = generated_at;
        self
    }

    /// Decode the payload back into a typed value
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }

    /// Look up a value by dotted path; numeric segments index arrays
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.').try_fold(&self.payload, |current, key| match current {
            Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => current.get(key),
        })
    }

    /// File name the artifact is written under
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}.json",
            self.kind,
            self.generated_at.format("%Y%m%d_%H%M%S")
        )
    }
}
