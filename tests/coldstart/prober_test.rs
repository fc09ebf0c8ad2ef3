//! Integration tests for the cold-start prober
//!
//! Launcher and health check are scripted mocks; the tokio clock is paused
//! so every timing assertion is exact.

use async_trait::async_trait;
use runtime_lens::coldstart::{
    completed_pairs, read_samples, ColdStartLog, ColdStartProber, HealthCheck, Launcher,
    ManagedProcess, ProbeTiming, RuntimeCandidate, Termination,
};
use runtime_lens::{ColdStartSample, ProbeError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::Instant;

/// Shared record of what the mocks observed
#[derive(Default)]
struct Observed {
    launches: Vec<String>,
    terminations: Vec<String>,
    launched_at: HashMap<u16, Instant>,
}

struct MockProcess {
    runtime: String,
    observed: Arc<Mutex<Observed>>,
}

#[async_trait]
impl ManagedProcess for MockProcess {
    fn id(&self) -> Option<u32> {
        None
    }

    async fn terminate(&mut self, _grace: Duration) -> Termination {
        self.observed
            .lock()
            .unwrap()
            .terminations
            .push(self.runtime.clone());
        Termination::Graceful
    }

    fn kill_now(&mut self) {}
}

struct MockLauncher {
    failing: Vec<&'static str>,
    observed: Arc<Mutex<Observed>>,
}

#[async_trait]
impl Launcher for MockLauncher {
    async fn launch(
        &self,
        candidate: &RuntimeCandidate,
    ) -> Result<Box<dyn ManagedProcess>, ProbeError> {
        let mut observed = self.observed.lock().unwrap();
        observed.launches.push(candidate.name.clone());
        if self.failing.contains(&candidate.name.as_str()) {
            return Err(ProbeError::Spawn {
                runtime: candidate.name.clone(),
                message: "executable not found".to_string(),
            });
        }
        observed.launched_at.insert(candidate.port, Instant::now());
        Ok(Box::new(MockProcess {
            runtime: candidate.name.clone(),
            observed: self.observed.clone(),
        }))
    }
}

/// Port -> time after launch at which /health starts answering 200
struct ScriptedHealth {
    ready_after: HashMap<u16, Duration>,
    observed: Arc<Mutex<Observed>>,
}

#[async_trait]
impl HealthCheck for ScriptedHealth {
    async fn check(&self, port: u16) -> bool {
        let launched = self.observed.lock().unwrap().launched_at.get(&port).copied();
        match (launched, self.ready_after.get(&port)) {
            (Some(at), Some(after)) => at.elapsed() >= *after,
            _ => false,
        }
    }
}

fn candidates() -> Vec<RuntimeCandidate> {
    vec![
        RuntimeCandidate::new("node", ["node", "server.js"], 4000),
        RuntimeCandidate::new("bun", ["bun", "server.ts"], 4001),
        RuntimeCandidate::new("deno", ["deno", "run", "server.ts"], 4002),
    ]
}

fn prober(
    ready_after: &[(u16, u64)],
    failing: Vec<&'static str>,
    replicates: u32,
) -> (ColdStartProber, Arc<Mutex<Observed>>) {
    let observed = Arc::new(Mutex::new(Observed::default()));
    let launcher = MockLauncher {
        failing,
        observed: observed.clone(),
    };
    let health = ScriptedHealth {
        ready_after: ready_after
            .iter()
            .map(|(port, ms)| (*port, Duration::from_millis(*ms)))
            .collect(),
        observed: observed.clone(),
    };
    let prober = ColdStartProber::new(candidates(), Arc::new(launcher), Arc::new(health))
        .with_timing(ProbeTiming::default())
        .with_replicates(replicates)
        .with_seed(11);
    (prober, observed)
}

#[tokio::test(start_paused = true)]
async fn test_ready_after_1200ms() {
    let (prober, _) = prober(&[(4000, 1200), (4001, 1200), (4002, 1200)], vec![], 1);

    let mut samples: Vec<ColdStartSample> = Vec::new();
    prober.run(&mut samples).await.unwrap();

    for sample in &samples {
        let elapsed = sample.elapsed_ms().unwrap();
        assert!(
            (1200.0..=1210.0).contains(&elapsed),
            "{} ready at {}",
            sample.runtime,
            elapsed
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_never_healthy_is_failure_and_terminated() {
    let (prober, observed) = prober(&[(4000, 100), (4002, 100)], vec![], 1);

    let started = Instant::now();
    let mut samples: Vec<ColdStartSample> = Vec::new();
    let summary = prober.run(&mut samples).await.unwrap();

    let bun = samples.iter().find(|s| s.runtime == "bun").unwrap();
    assert!(bun.is_failure());
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.ready, 2);

    let observed = observed.lock().unwrap();
    assert_eq!(observed.terminations, vec!["node", "bun", "deno"]);

    // two trials of ~100ms, one 5s timeout, two idle delays of at most 1.5s
    assert!(started.elapsed() <= Duration::from_millis(100 + 10 + 5000 + 100 + 10 + 3000));
}

#[tokio::test(start_paused = true)]
async fn test_spawn_failure_continues_with_next_runtime() {
    let (prober, observed) = prober(&[(4000, 50), (4001, 50), (4002, 50)], vec!["bun"], 2);

    let mut samples: Vec<ColdStartSample> = Vec::new();
    let summary = prober.run(&mut samples).await.unwrap();

    assert_eq!(samples.len(), 6);
    assert_eq!(summary.attempted, 6);
    assert!(samples
        .iter()
        .filter(|s| s.runtime == "bun")
        .all(|s| s.is_failure()));

    let observed = observed.lock().unwrap();
    assert!(!observed.terminations.contains(&"bun".to_string()));
    assert_eq!(observed.terminations.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_rounds_interleave_runtimes() {
    let (prober, observed) = prober(&[(4000, 10), (4001, 10), (4002, 10)], vec![], 2);

    let mut samples: Vec<ColdStartSample> = Vec::new();
    prober.run(&mut samples).await.unwrap();

    let order: Vec<(String, u32)> = samples
        .iter()
        .map(|s| (s.runtime.clone(), s.replicate_id))
        .collect();
    assert_eq!(
        order,
        vec![
            ("node".to_string(), 0),
            ("bun".to_string(), 0),
            ("deno".to_string(), 0),
            ("node".to_string(), 1),
            ("bun".to_string(), 1),
            ("deno".to_string(), 1),
        ]
    );
    assert_eq!(observed.lock().unwrap().launches.len(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_csv_log_resume_skips_recorded_trials() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("coldstart_results.csv");

    let (first, _) = prober(&[(4000, 20), (4001, 20), (4002, 20)], vec![], 1);
    let mut log = ColdStartLog::create(&path).unwrap();
    first.run(&mut log).await.unwrap();
    drop(log);

    let existing = read_samples(&path).unwrap();
    assert_eq!(existing.samples.len(), 3);

    let (second, observed) = prober(&[(4000, 20), (4001, 20), (4002, 20)], vec![], 2);
    let second = second.with_completed(completed_pairs(&existing.samples));
    let mut log = ColdStartLog::append_to(&path).unwrap();
    let summary = second.run(&mut log).await.unwrap();
    drop(log);

    assert_eq!(summary.resumed, 3);
    assert_eq!(summary.attempted, 3);
    assert_eq!(observed.lock().unwrap().launches.len(), 3);

    let all = read_samples(&path).unwrap();
    assert_eq!(all.samples.len(), 6);
    assert_eq!(all.malformed, 0);
    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.matches("runtime,replicate,cold_start_ms").count(), 1);
}
