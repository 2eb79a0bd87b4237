//! Process launcher: one worker process per request

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use amplifier_config::{EndpointConfig, WorkerConfig};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::ExecutionError;
use crate::worker::WorkerProcess;

/// Worker script and duration budget resolved for one endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSpec {
    pub name: String,
    pub script: PathBuf,
    pub timeout: Duration,
}

impl EndpointSpec {
    pub fn new(name: impl Into<String>, script: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            name: name.into(),
            script: script.into(),
            timeout,
        }
    }

    /// Resolve a configured endpoint; relative scripts are looked up in `worker.scripts_dir`
    pub fn from_config(name: impl Into<String>, endpoint: &EndpointConfig, worker: &WorkerConfig) -> Self {
        let script = Path::new(&endpoint.script);
        let script = if script.is_absolute() {
            script.to_path_buf()
        } else {
            worker.scripts_dir.join(script)
        };
        Self::new(name, script, endpoint.timeout)
    }
}

/// Starts worker processes
#[async_trait]
pub trait WorkerLauncher: Send + Sync {
    /// Start the worker for `endpoint` and deliver `payload` on its stdin
    async fn launch(&self, endpoint: &EndpointSpec, payload: &JsonValue) -> Result<WorkerProcess, ExecutionError>;
}

/// Which host environment variables a worker sees
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvPolicy {
    /// Everything except the listed variables
    Inherit { deny: Vec<String> },
    /// Only the listed variables
    AllowOnly(Vec<String>),
}

impl EnvPolicy {
    pub fn from_config(config: &WorkerConfig) -> Self {
        if config.inherit_env {
            EnvPolicy::Inherit {
                deny: config.env_denylist.clone(),
            }
        } else {
            EnvPolicy::AllowOnly(config.env_allowlist.clone())
        }
    }

    pub fn inherits_everything(&self) -> bool {
        matches!(self, EnvPolicy::Inherit { deny } if deny.is_empty())
    }

    fn apply(&self, command: &mut Command) {
        match self {
            EnvPolicy::Inherit { deny } => {
                for name in deny {
                    command.env_remove(name);
                }
            }
            EnvPolicy::AllowOnly(allow) => {
                command.env_clear();
                for name in allow {
                    if let Some(value) = std::env::var_os(name) {
                        command.env(name, value);
                    }
                }
            }
        }
    }
}

impl Default for EnvPolicy {
    fn default() -> Self {
        EnvPolicy::Inherit { deny: Vec::new() }
    }
}

/// Launches `<interpreter> <script>` with piped stdio
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    interpreter: String,
    working_dir: Option<PathBuf>,
    env: EnvPolicy,
}

impl ProcessLauncher {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
            working_dir: None,
            env: EnvPolicy::default(),
        }
    }

    pub fn from_config(config: &WorkerConfig) -> Self {
        Self {
            interpreter: config.interpreter.clone(),
            working_dir: config.working_dir.clone(),
            env: EnvPolicy::from_config(config),
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_env_policy(mut self, env: EnvPolicy) -> Self {
        self.env = env;
        self
    }

    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    pub fn env_policy(&self) -> &EnvPolicy {
        &self.env
    }

    fn command(&self, script: &Path) -> Command {
        let mut command = Command::new(&self.interpreter);
        command
            .arg(script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        self.env.apply(&mut command);
        command
    }
}

#[async_trait]
impl WorkerLauncher for ProcessLauncher {
    async fn launch(&self, endpoint: &EndpointSpec, payload: &JsonValue) -> Result<WorkerProcess, ExecutionError> {
        debug!(
            endpoint = %endpoint.name,
            interpreter = %self.interpreter,
            script = %endpoint.script.display(),
            "Spawning worker process"
        );

        let mut child = self.command(&endpoint.script).spawn().map_err(|source| {
            warn!(endpoint = %endpoint.name, "Failed to spawn worker process: {}", source);
            ExecutionError::LaunchError {
                program: self.interpreter.clone(),
                source,
            }
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ExecutionError::IpcError("Failed to get worker stdin".to_string()))?;

        let worker = WorkerProcess::new(child);
        info!(endpoint = %endpoint.name, worker_id = %worker.id(), pid = ?worker.pid(), "Worker process started");

        // Written off-task so a worker that never drains stdin cannot stall the caller
        let worker_id = worker.id().to_string();
        let payload = payload.clone();
        tokio::spawn(async move {
            match amplifier_ipc::write_payload(stdin, &payload).await {
                Ok(_) => {}
                Err(e) if e.is_disconnect() => {
                    debug!(worker_id = %worker_id, "Worker closed stdin before reading the payload")
                }
                Err(e) => warn!(worker_id = %worker_id, "Failed to write payload to worker: {}", e),
            }
        });

        Ok(worker)
    }
}
