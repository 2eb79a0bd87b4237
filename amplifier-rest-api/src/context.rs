//! Shared state injected into every handler

use std::sync::Arc;
use std::time::Duration;

use amplifier_config::{AmplifierConfig, EndpointConfig, EndpointsConfig, WorkerConfig};
use amplifier_execution::{BufferedRunner, EndpointSpec, StreamMultiplexer, WorkerLauncher};
use amplifier_web::DEFAULT_KEEP_ALIVE;

use crate::store::{ConfigStore, InMemoryConfigStore};

/// Worker script and budget for each route
#[derive(Debug, Clone)]
pub struct PlaygroundEndpoints {
    pub execute: EndpointSpec,
    pub execute_bundle: EndpointSpec,
    pub execute_stream: EndpointSpec,
    pub execute_bundle_stream: EndpointSpec,
    pub execute_recipe_stream: EndpointSpec,
    pub chat: EndpointSpec,
    pub warmup: EndpointSpec,
    pub create_config: EndpointSpec,
}

impl PlaygroundEndpoints {
    pub fn from_config(endpoints: &EndpointsConfig, worker: &WorkerConfig) -> Self {
        let spec = |name: &str, config: &EndpointConfig| EndpointSpec::from_config(name, config, worker);
        Self {
            execute: spec("execute", &endpoints.execute),
            execute_bundle: spec("execute_bundle", &endpoints.execute_bundle),
            execute_stream: spec("execute_stream", &endpoints.execute_stream),
            execute_bundle_stream: spec("execute_bundle_stream", &endpoints.execute_bundle_stream),
            execute_recipe_stream: spec("execute_recipe_stream", &endpoints.execute_recipe_stream),
            chat: spec("chat", &endpoints.chat),
            warmup: spec("warmup", &endpoints.warmup),
            create_config: spec("create_config", &endpoints.create_config),
        }
    }
}

/// Dependencies for the playground, chat and config handlers
#[derive(Clone)]
pub struct PlaygroundContext {
    /// Streaming execution
    pub multiplexer: StreamMultiplexer,
    /// Buffered execution
    pub runner: BufferedRunner,
    /// Per-user configuration storage
    pub config_store: Arc<dyn ConfigStore>,
    pub endpoints: Arc<PlaygroundEndpoints>,
    /// Interval between SSE keep-alive comments
    pub keep_alive: Duration,
}

impl PlaygroundContext {
    pub fn new(launcher: Arc<dyn WorkerLauncher>, endpoints: PlaygroundEndpoints, worker: &WorkerConfig) -> Self {
        Self {
            multiplexer: StreamMultiplexer::new(
                launcher.clone(),
                worker.grace_period,
                worker.max_buffered_output_bytes,
            ),
            runner: BufferedRunner::new(launcher, worker.grace_period, worker.max_buffered_output_bytes),
            config_store: Arc::new(InMemoryConfigStore::new()),
            endpoints: Arc::new(endpoints),
            keep_alive: DEFAULT_KEEP_ALIVE,
        }
    }

    pub fn from_config(launcher: Arc<dyn WorkerLauncher>, config: &AmplifierConfig) -> Self {
        let endpoints = PlaygroundEndpoints::from_config(&config.endpoints, &config.worker);
        Self::new(launcher, endpoints, &config.worker).with_keep_alive(config.server.sse_keep_alive)
    }

    pub fn with_config_store(mut self, store: Arc<dyn ConfigStore>) -> Self {
        self.config_store = store;
        self
    }

    pub fn with_keep_alive(mut self, interval: Duration) -> Self {
        self.keep_alive = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_from_default_config() {
        let worker = WorkerConfig::default();
        let endpoints = PlaygroundEndpoints::from_config(&EndpointsConfig::default(), &worker);

        assert_eq!(endpoints.execute.timeout, Duration::from_secs(60));
        assert_eq!(endpoints.execute_bundle_stream.timeout, Duration::from_secs(60));
        assert_eq!(endpoints.execute_recipe_stream.timeout, Duration::from_secs(120));
        assert_eq!(endpoints.chat.timeout, Duration::from_secs(30));
        assert_eq!(endpoints.execute_stream.name, "execute_stream");
        assert!(endpoints.execute_recipe_stream.script.ends_with("run-recipe-stream.py"));
        assert!(endpoints.execute_recipe_stream.script.starts_with(&worker.scripts_dir));
    }
}
