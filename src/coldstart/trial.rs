//! Single cold-start trial
//!
//! ```text
//! SPAWNED -> POLLING -> READY     -> TERMINATED
//!                    \-> TIMED_OUT -> TERMINATED
//! SPAWN_FAILED
//! ```
//!
//! The clock starts immediately before the launch call, so spawn cost is
//! part of the measurement.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::health::HealthCheck;
use super::process::{Launcher, ProcessGuard, Termination};
use super::{ProbeTiming, RuntimeCandidate};
use crate::model::ColdStartSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialState {
    Spawned,
    Polling,
    Ready,
    TimedOut,
    SpawnFailed,
    Terminated,
}

/// Everything a trial produced
#[derive(Debug, Clone, PartialEq)]
pub struct TrialRecord {
    pub sample: ColdStartSample,
    /// States in the order they were entered
    pub states: Vec<TrialState>,
    /// `None` when nothing was spawned
    pub termination: Option<Termination>,
}

/// Runs one trial against borrowed launcher and health check
pub struct ColdStartTrial<'a> {
    launcher: &'a dyn Launcher,
    health: &'a dyn HealthCheck,
    timing: ProbeTiming,
}

impl<'a> ColdStartTrial<'a> {
    pub fn new(launcher: &'a dyn Launcher, health: &'a dyn HealthCheck, timing: ProbeTiming) -> Self {
        Self {
            launcher,
            health,
            timing,
        }
    }

    pub async fn run(&self, candidate: &RuntimeCandidate, replicate_id: u32) -> TrialRecord {
        let mut states = Vec::with_capacity(4);

        let launched_at = Instant::now();
        let process = match self.launcher.launch(candidate).await {
            Ok(process) => process,
            Err(e) => {
                warn!(runtime = %candidate.name, replicate = replicate_id, error = %e, "Spawn failed");
                states.push(TrialState::SpawnFailed);
                return TrialRecord {
                    sample: ColdStartSample::failure(&candidate.name, replicate_id),
                    states,
                    termination: None,
                };
            }
        };
        let guard = ProcessGuard::new(process);
        states.push(TrialState::Spawned);

        states.push(TrialState::Polling);
        let sample = match self.poll_until_ready(candidate.port, launched_at).await {
            Some(elapsed) => {
                states.push(TrialState::Ready);
                let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
                debug!(runtime = %candidate.name, replicate = replicate_id, elapsed_ms, "Runtime ready");
                ColdStartSample::ready(&candidate.name, replicate_id, elapsed_ms)
            }
            None => {
                states.push(TrialState::TimedOut);
                warn!(
                    runtime = %candidate.name,
                    replicate = replicate_id,
                    timeout_ms = self.timing.trial_timeout.as_millis() as u64,
                    "Runtime never became healthy"
                );
                ColdStartSample::failure(&candidate.name, replicate_id)
            }
        };

        let termination = guard.terminate(self.timing.grace_period).await;
        states.push(TrialState::Terminated);
        debug!(runtime = %candidate.name, ?termination, "Runtime stopped");

        TrialRecord {
            sample,
            states,
            termination: Some(termination),
        }
    }

    /// Elapsed time since launch at the first healthy response, or `None`
    /// once the trial timeout has passed
    async fn poll_until_ready(&self, port: u16, launched_at: Instant) -> Option<Duration> {
        let deadline = launched_at + self.timing.trial_timeout;
        loop {
            let remaining = deadline.checked_duration_since(Instant::now())?;
            if remaining.is_zero() {
                return None;
            }

            let bound = self.timing.attempt_timeout.min(remaining);
            if let Ok(true) = tokio::time::timeout(bound, self.health.check(port)).await {
                return Some(launched_at.elapsed());
            }

            let remaining = deadline.checked_duration_since(Instant::now())?;
            if remaining.is_zero() {
                return None;
            }
            tokio::time::sleep(self.timing.poll_interval.min(remaining)).await;
        }
    }
}
