//! Buffered execution: run a worker to completion and collect its output

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::ExecutionError;
use crate::launcher::{EndpointSpec, WorkerLauncher};
use crate::output::{capture, WorkerOutput};
use crate::request::ExecutionRequest;

/// Output of a worker that exited successfully
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub output: WorkerOutput,
    pub stderr: String,
    pub execution_time_ms: u64,
}

/// Runs one worker per request and waits for it under the endpoint's budget
#[derive(Clone)]
pub struct BufferedRunner {
    launcher: Arc<dyn WorkerLauncher>,
    grace_period: Duration,
    max_output_bytes: usize,
}

impl BufferedRunner {
    pub fn new(launcher: Arc<dyn WorkerLauncher>, grace_period: Duration, max_output_bytes: usize) -> Self {
        Self {
            launcher,
            grace_period,
            max_output_bytes,
        }
    }

    /// Validate, launch, collect.
    ///
    /// Exit 0 yields an [`ExecutionResult`] even when the worker reported an
    /// application error in its JSON; callers inspect
    /// [`WorkerOutput::application_error`]. A nonzero exit is
    /// [`ExecutionError::WorkerFailed`] and carries whatever stdout held.
    pub async fn run(&self, request: &ExecutionRequest, endpoint: &EndpointSpec) -> Result<ExecutionResult, ExecutionError> {
        request.validate()?;

        let started = Instant::now();
        let mut worker = self.launcher.launch(endpoint, &request.to_payload()).await?;
        let stdout = worker.take_stdout();
        let stderr = worker.take_stderr();
        let limit = self.max_output_bytes;

        let collected = tokio::time::timeout(endpoint.timeout, async {
            tokio::join!(capture(stdout, limit), capture(stderr, limit), worker.wait())
        })
        .await;

        let execution_time_ms = started.elapsed().as_millis() as u64;

        let (stdout, stderr, status) = match collected {
            Ok(collected) => collected,
            Err(_) => {
                warn!(
                    endpoint = %endpoint.name,
                    worker_id = %worker.id(),
                    budget_secs = endpoint.timeout.as_secs(),
                    "Worker exceeded its time budget"
                );
                let termination = worker.terminate(self.grace_period).await;
                return Err(ExecutionError::TimeoutError {
                    budget: endpoint.timeout,
                    execution_time_ms,
                    terminated: termination.confirmed(),
                });
            }
        };

        let (stdout, _) = stdout?;
        let (stderr, _) = stderr?;
        let status = status?;

        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            debug!(endpoint = %endpoint.name, "worker stderr: {}", line);
        }

        let output = WorkerOutput::parse(&stdout);

        if !status.success() {
            warn!(
                endpoint = %endpoint.name,
                exit_code = ?status.code(),
                execution_time_ms,
                "Worker process failed"
            );
            return Err(ExecutionError::WorkerFailed {
                exit_code: status.code(),
                stderr,
                output,
                execution_time_ms,
            });
        }

        info!(endpoint = %endpoint.name, kind = request.kind(), execution_time_ms, "Worker process completed");

        Ok(ExecutionResult {
            output,
            stderr,
            execution_time_ms,
        })
    }
}
