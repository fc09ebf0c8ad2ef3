//! Cold-start probing
//!
//! Measures how long each runtime takes from process launch to its first
//! healthy response. Trials run strictly one at a time, rounds interleave
//! the runtimes, and a random idle delay separates consecutive trials.
//!
//! The process and health boundaries are traits so the trial state machine
//! can be driven by mocks under a paused tokio clock.

pub mod health;
pub mod log;
pub mod process;
pub mod prober;
pub mod trial;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use health::{HealthCheck, HttpHealthCheck};
pub use log::{completed_pairs, read_samples, ColdStartLog, ColdStartLogRead};
pub use process::{
    ChildProcess, CommandLauncher, Launcher, ManagedProcess, ProcessGuard, Termination,
};
pub use prober::{ColdStartProber, ProbeSummary, SampleSink};
pub use trial::{ColdStartTrial, TrialRecord, TrialState};

/// One runtime under test and how to start it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeCandidate {
    pub name: String,
    /// Program followed by its arguments
    pub command: Vec<String>,
    /// Port passed to the process and polled for health
    pub port: u16,
}

impl RuntimeCandidate {
    pub fn new<'a>(
        name: impl Into<String>,
        command: impl IntoIterator<Item = &'a str>,
        port: u16,
    ) -> Self {
        Self {
            name: name.into(),
            command: command.into_iter().map(str::to_string).collect(),
            port,
        }
    }
}

/// Every wait in a trial has one of these ceilings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeTiming {
    /// Launch to first healthy response, at most
    pub trial_timeout: Duration,
    /// Per health request
    pub attempt_timeout: Duration,
    /// Sleep between failed health requests
    pub poll_interval: Duration,
    /// Wait after the polite stop signal before killing
    pub grace_period: Duration,
    pub idle_delay_min: Duration,
    pub idle_delay_max: Duration,
}

impl Default for ProbeTiming {
    fn default() -> Self {
        Self {
            trial_timeout: Duration::from_secs(5),
            attempt_timeout: Duration::from_millis(100),
            poll_interval: Duration::from_millis(10),
            grace_period: Duration::from_secs(1),
            idle_delay_min: Duration::from_millis(500),
            idle_delay_max: Duration::from_millis(1500),
        }
    }
}
