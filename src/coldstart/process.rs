//! Runtime process lifecycle
//!
//! [`Launcher`] starts a candidate, [`ManagedProcess`] stops it, and
//! [`ProcessGuard`] makes sure a started process is stopped on every path
//! out of a trial.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use super::RuntimeCandidate;
use crate::error::ProbeError;

/// How a process ended when asked to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Exited within the grace period after the stop signal
    Graceful,
    /// Did not exit in time and was killed
    Killed,
    /// Had already exited before the stop signal
    AlreadyExited,
}

/// A started runtime process
#[async_trait]
pub trait ManagedProcess: Send {
    fn id(&self) -> Option<u32>;

    /// Signal the process to stop, wait up to `grace`, then kill it
    async fn terminate(&mut self, grace: Duration) -> Termination;

    /// Best-effort immediate kill without waiting
    fn kill_now(&mut self);
}

/// Starts runtime candidates
#[async_trait]
pub trait Launcher: Send + Sync {
    async fn launch(&self, candidate: &RuntimeCandidate)
        -> Result<Box<dyn ManagedProcess>, ProbeError>;
}

/// Owns a started process until it is terminated
///
/// Dropping the guard without calling [`terminate`](Self::terminate) kills
/// the process immediately.
pub struct ProcessGuard {
    process: Option<Box<dyn ManagedProcess>>,
}

impl ProcessGuard {
    pub fn new(process: Box<dyn ManagedProcess>) -> Self {
        Self {
            process: Some(process),
        }
    }

    pub fn id(&self) -> Option<u32> {
        self.process.as_ref().and_then(|p| p.id())
    }

    pub async fn terminate(mut self, grace: Duration) -> Termination {
        match self.process.take() {
            Some(mut process) => process.terminate(grace).await,
            None => Termination::AlreadyExited,
        }
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        if let Some(mut process) = self.process.take() {
            debug!(pid = ?process.id(), "Guard dropped with live process, killing");
            process.kill_now();
        }
    }
}

/// Spawns candidates as child processes with the port in the environment
#[derive(Debug, Clone)]
pub struct CommandLauncher {
    port_env: String,
}

impl Default for CommandLauncher {
    fn default() -> Self {
        Self::new("PORT")
    }
}

impl CommandLauncher {
    pub fn new(port_env: impl Into<String>) -> Self {
        Self {
            port_env: port_env.into(),
        }
    }
}

#[async_trait]
impl Launcher for CommandLauncher {
    async fn launch(
        &self,
        candidate: &RuntimeCandidate,
    ) -> Result<Box<dyn ManagedProcess>, ProbeError> {
        let (program, args) = candidate
            .command
            .split_first()
            .ok_or_else(|| ProbeError::EmptyCommand(candidate.name.clone()))?;

        let child = Command::new(program)
            .args(args)
            .env(&self.port_env, candidate.port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ProbeError::Spawn {
                runtime: candidate.name.clone(),
                message: e.to_string(),
            })?;

        debug!(runtime = %candidate.name, pid = ?child.id(), port = candidate.port, "Spawned runtime");
        Ok(Box::new(ChildProcess::new(child)))
    }
}

/// A tokio child process
pub struct ChildProcess {
    child: Child,
}

impl ChildProcess {
    pub fn new(child: Child) -> Self {
        Self { child }
    }

    #[cfg(unix)]
    fn signal_stop(&mut self) {
        if let Some(pid) = self.child.id() {
            // SAFETY: plain signal delivery to a pid we spawned and still own
            let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
            if rc != 0 {
                debug!(pid, "SIGTERM delivery failed");
            }
        }
    }

    #[cfg(not(unix))]
    fn signal_stop(&mut self) {
        let _ = self.child.start_kill();
    }
}

#[async_trait]
impl ManagedProcess for ChildProcess {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    async fn terminate(&mut self, grace: Duration) -> Termination {
        if let Ok(Some(_)) = self.child.try_wait() {
            return Termination::AlreadyExited;
        }

        self.signal_stop();
        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(_) => Termination::Graceful,
            Err(_) => {
                if let Err(e) = self.child.kill().await {
                    warn!(error = %e, "Failed to kill runtime after grace period");
                }
                Termination::Killed
            }
        }
    }

    fn kill_now(&mut self) {
        let _ = self.child.start_kill();
    }
}
