//! Service construction and logging setup

use std::sync::Arc;

use amplifier_config::{AmplifierConfig, LogFormat, LoggingConfig};
use amplifier_execution::ProcessLauncher;
use amplifier_rest_api::PlaygroundContext;
use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Long-lived services shared by every request
#[derive(Clone)]
pub struct ServiceContainer {
    pub launcher: Arc<ProcessLauncher>,
    playground: PlaygroundContext,
}

impl ServiceContainer {
    pub fn new(config: &AmplifierConfig) -> Self {
        let launcher = Arc::new(ProcessLauncher::from_config(&config.worker));
        let playground = PlaygroundContext::from_config(launcher.clone(), config);
        Self { launcher, playground }
    }

    /// Handler context for the REST/SSE router
    pub fn rest_context(&self) -> PlaygroundContext {
        self.playground.clone()
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG`, when set, takes precedence over the configured level and
/// directives. Calling this twice leaves the first subscriber in place.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.filter_directive())
            .with_context(|| format!("Invalid log filter '{}'", config.filter_directive()))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    let installed = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };

    if installed.is_err() {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    tracing::info!(level = config.level.as_str(), format = ?config.format, "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice_is_harmless() {
        let config = LoggingConfig::default();
        assert!(init_logging(&config).is_ok());
        assert!(init_logging(&config).is_ok());
    }

    #[test]
    fn test_container_uses_configured_interpreter() {
        let mut config = AmplifierConfig::default();
        config.worker.interpreter = "python3.12".to_string();

        let services = ServiceContainer::new(&config);
        assert_eq!(services.launcher.interpreter(), "python3.12");
        assert_eq!(services.rest_context().endpoints.execute_recipe_stream.timeout.as_secs(), 120);
    }
}
