//! runtime-lens
//!
//! Benchmark analysis for competing service runtimes:
//!
//! - [`coldstart`]: spawn each runtime, time its first healthy response,
//!   and always tear it down
//! - [`telemetry`]: decode raw k6 output and ingest run directories
//! - [`stats`]: per-cell descriptive statistics and bootstrap intervals
//! - [`economics`]: SLO-conditioned throughput, cost per success and
//!   telemetry overhead
//! - [`results`] and [`report`]: persisted artifacts and terminal tables

pub mod cli;
pub mod coldstart;
pub mod config;
pub mod economics;
pub mod error;
pub mod model;
pub mod report;
pub mod results;
pub mod stats;
pub mod telemetry;

pub use config::Config;
pub use error::{ConfigError, IngestError, LayoutError, OutputError, ProbeError, TelemetryError};
pub use model::{
    ColdStartOutcome, ColdStartSample, FrontierPoint, NormalizedSample, ReplicateResult,
    ReplicateSource, TelemetryMode,
};
