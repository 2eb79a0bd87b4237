//! Error types for worker execution

use std::time::Duration;
use thiserror::Error;

use crate::output::WorkerOutput;

/// Worker execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// Request rejected before any process was started
    #[error("{0}")]
    ValidationError(String),

    #[error("Failed to start worker process")]
    LaunchError {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Worker exited with a nonzero status or was killed by a signal
    #[error("Worker process exited with {}", describe_exit(.exit_code))]
    WorkerFailed {
        exit_code: Option<i32>,
        stderr: String,
        output: WorkerOutput,
        execution_time_ms: u64,
    },

    #[error("Execution timed out after {}s", .budget.as_secs())]
    TimeoutError {
        budget: Duration,
        execution_time_ms: u64,
        terminated: bool,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("IPC error: {0}")]
    IpcError(String),
}

impl From<amplifier_ipc::IpcError> for ExecutionError {
    fn from(err: amplifier_ipc::IpcError) -> Self {
        Self::IpcError(err.to_string())
    }
}

impl ExecutionError {
    /// Whether the failure was caused by the caller rather than the worker
    pub fn is_client_error(&self) -> bool {
        matches!(self, ExecutionError::ValidationError(_))
    }

    /// Text suitable for an error `details` field
    pub fn details(&self) -> Option<String> {
        match self {
            ExecutionError::LaunchError { program, source } => Some(format!("{}: {}", program, source)),
            ExecutionError::WorkerFailed { stderr, .. } if !stderr.trim().is_empty() => Some(stderr.clone()),
            ExecutionError::TimeoutError { terminated, .. } => Some(if *terminated {
                "Worker process exceeded its time budget and was terminated".to_string()
            } else {
                "Worker process exceeded its time budget and could not be confirmed terminated".to_string()
            }),
            ExecutionError::IoError(e) => Some(e.to_string()),
            ExecutionError::IpcError(e) => Some(e.clone()),
            _ => None,
        }
    }

    pub fn execution_time_ms(&self) -> Option<u64> {
        match self {
            ExecutionError::WorkerFailed { execution_time_ms, .. }
            | ExecutionError::TimeoutError { execution_time_ms, .. } => Some(*execution_time_ms),
            _ => None,
        }
    }
}

pub(crate) fn describe_exit(exit_code: &Option<i32>) -> String {
    match *exit_code {
        Some(code) => format!("code {}", code),
        None => "a signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_budget() {
        let err = ExecutionError::TimeoutError {
            budget: Duration::from_secs(60),
            execution_time_ms: 60_004,
            terminated: true,
        };
        assert_eq!(err.to_string(), "Execution timed out after 60s");
        assert_eq!(err.execution_time_ms(), Some(60_004));
        assert!(err.details().unwrap().contains("terminated"));
    }

    #[test]
    fn test_launch_error_details() {
        let err = ExecutionError::LaunchError {
            program: "python3".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(err.to_string(), "Failed to start worker process");
        assert!(err.details().unwrap().starts_with("python3: "));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_worker_failed_without_stderr_has_no_details() {
        let err = ExecutionError::WorkerFailed {
            exit_code: Some(2),
            stderr: "  \n".to_string(),
            output: WorkerOutput::Empty,
            execution_time_ms: 12,
        };
        assert_eq!(err.to_string(), "Worker process exited with code 2");
        assert!(err.details().is_none());
    }
}
