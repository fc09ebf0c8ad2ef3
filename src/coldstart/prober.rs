//! Cold-start probing loop
//!
//! Round `r` runs one trial per candidate in configured order, so runtimes
//! interleave and slow drift affects them evenly. A random idle delay drawn
//! from an explicitly seeded RNG separates consecutive trials.

use futures::FutureExt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::health::HealthCheck;
use super::process::Launcher;
use super::trial::ColdStartTrial;
use super::{ProbeTiming, RuntimeCandidate};
use crate::error::{OutputError, ProbeError};
use crate::model::ColdStartSample;

/// Receives each sample as soon as its trial finishes
pub trait SampleSink: Send {
    fn record(&mut self, sample: &ColdStartSample) -> Result<(), OutputError>;
}

impl SampleSink for Vec<ColdStartSample> {
    fn record(&mut self, sample: &ColdStartSample) -> Result<(), OutputError> {
        self.push(sample.clone());
        Ok(())
    }
}

/// Counts for one probing session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSummary {
    pub session_id: Uuid,
    pub attempted: usize,
    pub ready: usize,
    pub failed: usize,
    /// Pairs skipped because they were already recorded
    pub resumed: usize,
    /// Stopped early by the shutdown signal
    pub interrupted: bool,
}

/// Drives trials across candidates and rounds
pub struct ColdStartProber {
    candidates: Vec<RuntimeCandidate>,
    timing: ProbeTiming,
    replicates: u32,
    seed: u64,
    launcher: Arc<dyn Launcher>,
    health: Arc<dyn HealthCheck>,
    completed: HashSet<(String, u32)>,
    shutdown: Option<Arc<Notify>>,
}

impl ColdStartProber {
    pub fn new(
        candidates: Vec<RuntimeCandidate>,
        launcher: Arc<dyn Launcher>,
        health: Arc<dyn HealthCheck>,
    ) -> Self {
        Self {
            candidates,
            timing: ProbeTiming::default(),
            replicates: 50,
            seed: 0,
            launcher,
            health,
            completed: HashSet::new(),
            shutdown: None,
        }
    }

    pub fn with_timing(mut self, timing: ProbeTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_replicates(mut self, replicates: u32) -> Self {
        self.replicates = replicates;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Skip `(runtime, round)` pairs that already have a sample
    pub fn with_completed(mut self, completed: HashSet<(String, u32)>) -> Self {
        self.completed = completed;
        self
    }

    /// Stop between trials once notified
    pub fn with_shutdown(mut self, shutdown: Arc<Notify>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// `(round, candidate)` pairs still to run, in execution order
    pub fn schedule(&self) -> Vec<(u32, &RuntimeCandidate)> {
        (0..self.replicates)
            .flat_map(|round| self.candidates.iter().map(move |c| (round, c)))
            .filter(|(round, c)| !self.completed.contains(&(c.name.clone(), *round)))
            .collect()
    }

    pub async fn run(&self, sink: &mut dyn SampleSink) -> Result<ProbeSummary, ProbeError> {
        let session_id = Uuid::new_v4();
        let schedule = self.schedule();
        let total = self.replicates as usize * self.candidates.len();

        let mut summary = ProbeSummary {
            session_id,
            attempted: 0,
            ready: 0,
            failed: 0,
            resumed: total - schedule.len(),
            interrupted: false,
        };

        info!(
            session_id = %session_id,
            runtimes = self.candidates.len(),
            replicates = self.replicates,
            pending = schedule.len(),
            resumed = summary.resumed,
            "Starting cold-start probe"
        );

        let mut rng = StdRng::seed_from_u64(self.seed);
        let trial = ColdStartTrial::new(self.launcher.as_ref(), self.health.as_ref(), self.timing);

        for (index, (round, candidate)) in schedule.iter().enumerate() {
            if self.shutdown_requested() {
                warn!(session_id = %session_id, round, "Shutdown requested, stopping probe");
                summary.interrupted = true;
                break;
            }

            debug!(session_id = %session_id, runtime = %candidate.name, round, "Running trial");
            let record = trial.run(candidate, *round).await;
            sink.record(&record.sample)?;

            summary.attempted += 1;
            if record.sample.is_failure() {
                summary.failed += 1;
            } else {
                summary.ready += 1;
            }

            if index + 1 < schedule.len() {
                let delay = self.idle_delay(&mut rng);
                if !self.idle(delay).await {
                    warn!(session_id = %session_id, "Shutdown requested during idle delay");
                    summary.interrupted = true;
                    break;
                }
            }
        }

        info!(
            session_id = %session_id,
            attempted = summary.attempted,
            ready = summary.ready,
            failed = summary.failed,
            interrupted = summary.interrupted,
            "Cold-start probe finished"
        );
        Ok(summary)
    }

    fn idle_delay(&self, rng: &mut StdRng) -> Duration {
        let min = self.timing.idle_delay_min.as_millis() as u64;
        let max = self.timing.idle_delay_max.as_millis() as u64;
        Duration::from_millis(rng.gen_range(min..=max.max(min)))
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .map(|notify| notify.notified().now_or_never().is_some())
            .unwrap_or(false)
    }

    /// Sleep for `delay`; `false` if shutdown arrived first
    async fn idle(&self, delay: Duration) -> bool {
        match &self.shutdown {
            Some(notify) => {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => true,
                    _ = notify.notified() => false,
                }
            }
            None => {
                tokio::time::sleep(delay).await;
                true
            }
        }
    }
}
