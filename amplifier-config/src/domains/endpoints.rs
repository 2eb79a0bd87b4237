//! Per-endpoint worker scripts and duration budgets

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Worker script and duration budget for one endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Script path, relative to `worker.scripts_dir` unless absolute
    pub script: String,

    /// Wall-clock budget for a single request
    #[serde(with = "crate::domains::utils::serde_duration")]
    pub timeout: Duration,
}

impl EndpointConfig {
    pub fn new(script: impl Into<String>, timeout: Duration) -> Self {
        Self {
            script: script.into(),
            timeout,
        }
    }
}

/// Endpoint table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub execute: EndpointConfig,
    pub execute_bundle: EndpointConfig,
    pub execute_stream: EndpointConfig,
    pub execute_bundle_stream: EndpointConfig,
    pub execute_recipe_stream: EndpointConfig,
    pub chat: EndpointConfig,
    pub warmup: EndpointConfig,
    pub create_config: EndpointConfig,
}

const SINGLE_STEP_BUDGET: Duration = Duration::from_secs(60);
const RECIPE_BUDGET: Duration = Duration::from_secs(120);
const CHAT_BUDGET: Duration = Duration::from_secs(30);

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            execute: EndpointConfig::new("run-example.py", SINGLE_STEP_BUDGET),
            execute_bundle: EndpointConfig::new("run-bundle.py", SINGLE_STEP_BUDGET),
            execute_stream: EndpointConfig::new("run-example.py", SINGLE_STEP_BUDGET),
            execute_bundle_stream: EndpointConfig::new("run-bundle-stream.py", SINGLE_STEP_BUDGET),
            execute_recipe_stream: EndpointConfig::new("run-recipe-stream.py", RECIPE_BUDGET),
            chat: EndpointConfig::new("amplifier-chat.py", CHAT_BUDGET),
            warmup: EndpointConfig::new("amplifier-warmup.py", CHAT_BUDGET),
            create_config: EndpointConfig::new("create-config.py", CHAT_BUDGET),
        }
    }
}

impl EndpointsConfig {
    /// All endpoints with their configuration keys
    pub fn entries(&self) -> [(&'static str, &EndpointConfig); 8] {
        [
            ("execute", &self.execute),
            ("execute_bundle", &self.execute_bundle),
            ("execute_stream", &self.execute_stream),
            ("execute_bundle_stream", &self.execute_bundle_stream),
            ("execute_recipe_stream", &self.execute_recipe_stream),
            ("chat", &self.chat),
            ("warmup", &self.warmup),
            ("create_config", &self.create_config),
        ]
    }
}

impl Validatable for EndpointsConfig {
    fn validate(&self) -> ConfigResult<()> {
        for (name, endpoint) in self.entries() {
            self.require_non_blank(&format!("{}.script", name), &endpoint.script)?;
            self.require_nonzero_duration(&format!("{}.timeout", name), endpoint.timeout)?;
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "endpoints"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_budgets() {
        let endpoints = EndpointsConfig::default();
        assert_eq!(endpoints.execute.timeout, Duration::from_secs(60));
        assert_eq!(endpoints.execute_bundle.timeout, Duration::from_secs(60));
        assert_eq!(endpoints.execute_recipe_stream.timeout, Duration::from_secs(120));
        assert_eq!(endpoints.chat.timeout, Duration::from_secs(30));
        assert!(endpoints.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut endpoints = EndpointsConfig::default();
        endpoints.chat.timeout = Duration::ZERO;
        let err = endpoints.validate().unwrap_err();
        assert!(err.to_string().contains("chat.timeout"));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let endpoints: EndpointsConfig = serde_yaml::from_str(
            "execute_recipe_stream:\n  script: recipes/run.py\n  timeout: 300\n",
        )
        .unwrap();
        assert_eq!(endpoints.execute_recipe_stream.script, "recipes/run.py");
        assert_eq!(endpoints.execute_recipe_stream.timeout, Duration::from_secs(300));
        assert_eq!(endpoints.execute.script, "run-example.py");
    }
}
