//! Configuration for runtime-lens
//!
//! Defaults mirror the benchmark harness layout (node/bun/deno on ports
//! 4000-4002, 50 cold-start rounds, 200ms p99 SLO). A JSON file may override
//! any subset, and a handful of environment variables override the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::coldstart::{ProbeTiming, RuntimeCandidate};
use crate::economics::SloPolicy;
use crate::error::ConfigError;
use crate::stats::BootstrapConfig;

/// Environment variable overriding the SLO threshold in milliseconds
pub const ENV_SLO_MS: &str = "RUNTIME_LENS_SLO_MS";
/// Environment variable overriding the number of cold-start rounds
pub const ENV_REPLICATES: &str = "RUNTIME_LENS_REPLICATES";
/// Environment variable overriding the base random seed
pub const ENV_SEED: &str = "RUNTIME_LENS_SEED";
/// Environment variable overriding the raw results directory
pub const ENV_RAW_DIR: &str = "RUNTIME_LENS_RAW_DIR";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub telemetry: TelemetryConfig,
    pub slo: SloPolicy,
    pub bootstrap: BootstrapSettings,
    pub coldstart: ColdStartConfig,
}

/// Input and output locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// One subdirectory per k6 run, named by the run identifier grammar
    pub raw_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub frontier_csv: PathBuf,
    pub coldstart_csv: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("results/raw"),
            processed_dir: PathBuf::from("results/processed"),
            frontier_csv: PathBuf::from("results/frontier/frontier_summary.csv"),
            coldstart_csv: PathBuf::from("results/raw/coldstart_results.csv"),
        }
    }
}

/// Raw telemetry file naming and metric selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub latency_metric: String,
    pub summary_file: String,
    pub events_file: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            latency_metric: "http_req_duration".to_string(),
            summary_file: "k6_summary.json".to_string(),
            events_file: "k6_metrics.json".to_string(),
        }
    }
}

/// Bootstrap resampling settings plus the base seed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapSettings {
    pub resamples: usize,
    pub confidence: f64,
    pub seed: u64,
}

impl Default for BootstrapSettings {
    fn default() -> Self {
        let defaults = BootstrapConfig::default();
        Self {
            resamples: defaults.resamples,
            confidence: defaults.confidence,
            seed: 0x5eed,
        }
    }
}

impl BootstrapSettings {
    pub fn config(&self) -> BootstrapConfig {
        BootstrapConfig {
            resamples: self.resamples,
            confidence: self.confidence,
        }
    }
}

/// Cold-start prober settings; all durations in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColdStartConfig {
    pub replicates: u32,
    pub trial_timeout_ms: u64,
    pub attempt_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub grace_period_ms: u64,
    pub idle_delay_min_ms: u64,
    pub idle_delay_max_ms: u64,
    /// Environment variable carrying the port the runtime must bind
    pub port_env: String,
    pub health_path: String,
    pub runtimes: Vec<RuntimeCandidate>,
}

impl Default for ColdStartConfig {
    fn default() -> Self {
        Self {
            replicates: 50,
            trial_timeout_ms: 5000,
            attempt_timeout_ms: 100,
            poll_interval_ms: 10,
            grace_period_ms: 1000,
            idle_delay_min_ms: 500,
            idle_delay_max_ms: 1500,
            port_env: "PORT".to_string(),
            health_path: "/health".to_string(),
            runtimes: vec![
                RuntimeCandidate::new("node", ["node", "services/node/server.js"], 4000),
                RuntimeCandidate::new("bun", ["bun", "services/bun/server.ts"], 4001),
                RuntimeCandidate::new(
                    "deno",
                    [
                        "deno",
                        "run",
                        "--allow-net",
                        "--allow-env",
                        "services/deno/server.ts",
                    ],
                    4002,
                ),
            ],
        }
    }
}

impl ColdStartConfig {
    pub fn timing(&self) -> ProbeTiming {
        ProbeTiming {
            trial_timeout: Duration::from_millis(self.trial_timeout_ms),
            attempt_timeout: Duration::from_millis(self.attempt_timeout_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            grace_period: Duration::from_millis(self.grace_period_ms),
            idle_delay_min: Duration::from_millis(self.idle_delay_min_ms),
            idle_delay_max: Duration::from_millis(self.idle_delay_max_ms),
        }
    }
}

impl Config {
    /// Load defaults, then the optional JSON file, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON config file; missing keys fall back to defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `RUNTIME_LENS_*` overrides from the process environment
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_SLO_MS) {
            self.slo.threshold_ms = parse_env(ENV_SLO_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_REPLICATES) {
            self.coldstart.replicates = parse_env(ENV_REPLICATES, &value)?;
        }
        if let Some(value) = lookup(ENV_SEED) {
            self.bootstrap.seed = parse_env(ENV_SEED, &value)?;
        }
        if let Some(value) = lookup(ENV_RAW_DIR) {
            self.paths.raw_dir = PathBuf::from(value);
        }
        Ok(())
    }

    /// Reject settings that would make the analysis meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.slo.threshold_ms.is_finite() && self.slo.threshold_ms > 0.0) {
            return Err(ConfigError::Invalid(
                "slo.threshold_ms must be a positive number".to_string(),
            ));
        }
        if self.bootstrap.resamples == 0 {
            return Err(ConfigError::Invalid(
                "bootstrap.resamples must be at least 1".to_string(),
            ));
        }
        if !(self.bootstrap.confidence > 0.0 && self.bootstrap.confidence < 1.0) {
            return Err(ConfigError::Invalid(
                "bootstrap.confidence must be in (0, 1)".to_string(),
            ));
        }

        let cs = &self.coldstart;
        if cs.trial_timeout_ms == 0 || cs.attempt_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "coldstart timeouts must be non-zero".to_string(),
            ));
        }
        if cs.idle_delay_min_ms > cs.idle_delay_max_ms {
            return Err(ConfigError::Invalid(
                "coldstart.idle_delay_min_ms exceeds idle_delay_max_ms".to_string(),
            ));
        }
        if !cs.health_path.starts_with('/') {
            return Err(ConfigError::Invalid(
                "coldstart.health_path must start with '/'".to_string(),
            ));
        }
        for runtime in &cs.runtimes {
            if runtime.command.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "runtime '{}' has an empty command",
                    runtime.name
                )));
            }
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(var: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var: var.to_string(),
        value: value.to_string(),
    })
}
