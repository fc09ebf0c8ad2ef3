//! Error types for runtime-lens
//!
//! Each subsystem owns one error enum. Everything here is recoverable at the
//! call site except where `is_fatal` says otherwise; the CLI wraps these in
//! `anyhow` with context.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while reading or decoding raw k6 telemetry
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Underlying read failed
    #[error("I/O error reading telemetry: {0}")]
    Io(#[from] std::io::Error),

    /// Summary document is not valid JSON
    #[error("Invalid summary document: {0}")]
    InvalidSummary(#[from] serde_json::Error),

    /// Summary document has no top-level `metrics` object
    #[error("Summary document has no metrics object")]
    MissingMetrics,
}

/// A run directory name that does not follow the run identifier grammar
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("Run identifier '{0}' has too few segments")]
    TooFewSegments(String),

    #[error("Run identifier '{name}' has invalid replicate segment '{segment}'")]
    InvalidReplicate { name: String, segment: String },

    #[error("Run identifier '{name}' has invalid telemetry mode segment '{segment}'")]
    InvalidMode { name: String, segment: String },

    #[error("Run identifier '{0}' has an empty segment")]
    EmptySegment(String),
}

/// Errors from replicate ingestion
#[derive(Debug, Error)]
pub enum IngestError {
    /// Neither a summary nor an event stream exists for the run
    #[error("Missing data for run {run}: no telemetry under {}", .dir.display())]
    MissingData { run: String, dir: PathBuf },

    /// Event stream contained no accepted samples
    #[error("No latency samples in {}", .path.display())]
    NoSamples { path: PathBuf },

    /// A telemetry file could not be decoded
    #[error("Failed to decode {}: {source}", .path.display())]
    Telemetry {
        path: PathBuf,
        #[source]
        source: TelemetryError,
    },

    /// The raw results root could not be listed
    #[error("Failed to read raw results directory {}: {source}", .dir.display())]
    RootUnreadable {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IngestError {
    /// Whether this error should abort the whole ingestion batch
    pub fn is_fatal(&self) -> bool {
        matches!(self, IngestError::RootUnreadable { .. })
    }
}

/// Errors from the cold-start prober
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The runtime process could not be started
    #[error("Failed to spawn '{runtime}': {message}")]
    Spawn { runtime: String, message: String },

    /// Candidate has no command to run
    #[error("Runtime '{0}' has an empty command")]
    EmptyCommand(String),

    /// Health check client could not be built
    #[error("Health check client error: {0}")]
    Client(#[from] reqwest::Error),

    /// Sample could not be persisted; aborts the run
    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Errors writing or reading processed outputs
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl OutputError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        OutputError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Environment variable '{var}' has invalid value '{value}'")]
    InvalidEnv { var: String, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
