//! Worker process handle and termination

use std::process::ExitStatus;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::process::{Child, ChildStderr, ChildStdout};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ExecutionError;

/// Time allowed for the OS to reap a worker after SIGKILL
const KILL_WAIT: Duration = Duration::from_secs(5);

/// How a termination request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The worker had already exited on its own
    AlreadyExited(ExitStatus),
    /// The worker exited within the grace period after SIGTERM
    Graceful(ExitStatus),
    /// The worker was force-killed; `None` if it could not be reaped in time
    Killed(Option<ExitStatus>),
}

impl Termination {
    /// Whether the process is known to be gone
    pub fn confirmed(&self) -> bool {
        !matches!(self, Termination::Killed(None))
    }
}

/// Worker process lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerProcessStatus {
    Running,
    Exited(ExitStatus),
    Terminated(Termination),
}

/// An OS worker process bound to a single request.
///
/// stdout and stderr are handed out once through [`take_stdout`](Self::take_stdout)
/// and [`take_stderr`](Self::take_stderr). The child is spawned with
/// `kill_on_drop`, so dropping the handle also stops the process.
#[derive(Debug)]
pub struct WorkerProcess {
    id: String,
    pid: Option<u32>,
    started_at: DateTime<Utc>,
    child: Child,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    status: WorkerProcessStatus,
}

impl WorkerProcess {
    pub fn new(mut child: Child) -> Self {
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        Self {
            id: Uuid::new_v4().to_string(),
            pid: child.id(),
            started_at: Utc::now(),
            child,
            stdout,
            stderr,
            status: WorkerProcessStatus::Running,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn status(&self) -> WorkerProcessStatus {
        self.status
    }

    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.stdout.take()
    }

    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.stderr.take()
    }

    /// Wait for the worker to exit. Cancel-safe.
    pub async fn wait(&mut self) -> Result<ExitStatus, ExecutionError> {
        match self.status {
            WorkerProcessStatus::Exited(status) => return Ok(status),
            WorkerProcessStatus::Terminated(
                Termination::AlreadyExited(status) | Termination::Graceful(status) | Termination::Killed(Some(status)),
            ) => return Ok(status),
            _ => {}
        }

        let status = self.child.wait().await?;
        if self.status == WorkerProcessStatus::Running {
            self.status = WorkerProcessStatus::Exited(status);
        }
        debug!(worker_id = %self.id, pid = ?self.pid, exit_code = ?status.code(), "Worker process exited");
        Ok(status)
    }

    /// Stop the worker: SIGTERM, then SIGKILL once `grace` has elapsed.
    ///
    /// Idempotent. Only the first call signals the process; later calls
    /// return the recorded outcome.
    pub async fn terminate(&mut self, grace: Duration) -> Termination {
        match self.status {
            WorkerProcessStatus::Terminated(outcome) => return outcome,
            WorkerProcessStatus::Exited(status) => {
                let outcome = Termination::AlreadyExited(status);
                self.status = WorkerProcessStatus::Terminated(outcome);
                return outcome;
            }
            WorkerProcessStatus::Running => {}
        }

        if let Ok(Some(status)) = self.child.try_wait() {
            let outcome = Termination::AlreadyExited(status);
            self.status = WorkerProcessStatus::Terminated(outcome);
            return outcome;
        }

        info!(worker_id = %self.id, pid = ?self.pid, "Terminating worker process");

        if self.send_sigterm() {
            match tokio::time::timeout(grace, self.child.wait()).await {
                Ok(Ok(status)) => {
                    debug!(worker_id = %self.id, "Worker process exited after SIGTERM");
                    let outcome = Termination::Graceful(status);
                    self.status = WorkerProcessStatus::Terminated(outcome);
                    return outcome;
                }
                Ok(Err(e)) => warn!(worker_id = %self.id, "Error waiting for worker after SIGTERM: {}", e),
                Err(_) => warn!(
                    worker_id = %self.id,
                    grace_ms = grace.as_millis() as u64,
                    "Worker process did not exit within grace period, killing"
                ),
            }
        }

        if let Err(e) = self.child.start_kill() {
            warn!(worker_id = %self.id, "Failed to kill worker process: {}", e);
        }

        let outcome = match tokio::time::timeout(KILL_WAIT, self.child.wait()).await {
            Ok(Ok(status)) => Termination::Killed(Some(status)),
            Ok(Err(e)) => {
                warn!(worker_id = %self.id, "Error reaping killed worker: {}", e);
                Termination::Killed(None)
            }
            Err(_) => {
                warn!(worker_id = %self.id, "Killed worker process was not reaped in time");
                Termination::Killed(None)
            }
        };

        self.status = WorkerProcessStatus::Terminated(outcome);
        outcome
    }

    #[cfg(unix)]
    fn send_sigterm(&self) -> bool {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let Some(pid) = self.pid else {
            return false;
        };

        match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            Ok(()) => true,
            Err(e) => {
                warn!(worker_id = %self.id, pid, "Failed to send SIGTERM: {}", e);
                false
            }
        }
    }

    #[cfg(not(unix))]
    fn send_sigterm(&self) -> bool {
        false
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::process::Stdio;
    use tokio::process::Command;

    fn spawn_sh(script: &str) -> WorkerProcess {
        let child = Command::new("sh")
            .arg("-c")
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .unwrap();
        WorkerProcess::new(child)
    }

    #[tokio::test]
    async fn test_terminate_is_idempotent() {
        let mut worker = spawn_sh("exec sleep 30");
        assert!(worker.pid().is_some());

        let first = worker.terminate(Duration::from_secs(2)).await;
        assert!(matches!(first, Termination::Graceful(_)));
        assert!(first.confirmed());

        let second = worker.terminate(Duration::from_secs(2)).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_terminate_after_exit() {
        let mut worker = spawn_sh("exit 0");
        let status = worker.wait().await.unwrap();
        assert!(status.success());

        let outcome = worker.terminate(Duration::from_secs(1)).await;
        assert_eq!(outcome, Termination::AlreadyExited(status));
        assert_eq!(worker.wait().await.unwrap(), status);
    }

    #[tokio::test]
    async fn test_sigterm_ignored_falls_back_to_kill() {
        let mut worker = spawn_sh("trap '' TERM; while true; do sleep 1; done");
        tokio::time::sleep(Duration::from_millis(100)).await;

        let outcome = worker.terminate(Duration::from_millis(200)).await;
        assert!(matches!(outcome, Termination::Killed(Some(_))));
    }
}
