//! Worker process configuration

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// How worker processes are started and supervised
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Interpreter used to run worker scripts
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Directory holding the worker scripts; relative script paths resolve against it
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: PathBuf,

    /// Working directory for spawned workers, inherited from the server when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,

    /// Time between SIGTERM and SIGKILL when a worker is stopped
    #[serde(with = "crate::domains::utils::serde_duration", default = "default_grace_period")]
    pub grace_period: Duration,

    /// Cap on captured stdout/stderr per stream
    #[serde(default = "default_max_buffered_output")]
    pub max_buffered_output_bytes: usize,

    /// Pass the server's full environment to workers
    #[serde(default = "crate::domains::utils::default_true")]
    pub inherit_env: bool,

    /// Variables removed from the inherited environment
    #[serde(default)]
    pub env_denylist: Vec<String>,

    /// Variables passed through when `inherit_env` is off
    #[serde(default = "default_env_allowlist")]
    pub env_allowlist: Vec<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            scripts_dir: default_scripts_dir(),
            working_dir: None,
            grace_period: default_grace_period(),
            max_buffered_output_bytes: default_max_buffered_output(),
            inherit_env: true,
            env_denylist: Vec::new(),
            env_allowlist: default_env_allowlist(),
        }
    }
}

impl Validatable for WorkerConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.require_non_blank("interpreter", &self.interpreter)?;
        self.require_nonzero("max_buffered_output_bytes", self.max_buffered_output_bytes)?;

        if self.scripts_dir.as_os_str().is_empty() {
            return Err(self.invalid("scripts_dir cannot be empty"));
        }

        if !self.inherit_env && self.env_allowlist.is_empty() {
            return Err(self.invalid(
                "env_allowlist cannot be empty when inherit_env is false (workers need at least PATH)",
            ));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "worker"
    }
}

/// Platform interpreter for Python workers
pub fn default_interpreter() -> String {
    if cfg!(windows) {
        "python".to_string()
    } else {
        "python3".to_string()
    }
}

fn default_scripts_dir() -> PathBuf {
    PathBuf::from("scripts")
}

fn default_grace_period() -> Duration {
    Duration::from_secs(5)
}

fn default_max_buffered_output() -> usize {
    1024 * 1024
}

fn default_env_allowlist() -> Vec<String> {
    ["PATH", "HOME", "LANG", "LC_ALL", "PYTHONPATH", "VIRTUAL_ENV", "SYSTEMROOT", "TEMP", "TMP"]
        .iter()
        .map(|name| name.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_interpreter_by_platform() {
        let interpreter = default_interpreter();
        if cfg!(windows) {
            assert_eq!(interpreter, "python");
        } else {
            assert_eq!(interpreter, "python3");
        }
    }

    #[test]
    fn test_allowlist_required_without_inheritance() {
        let mut config = WorkerConfig {
            inherit_env: false,
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        config.env_allowlist.clear();
        assert!(config.validate().is_err());
    }
}
