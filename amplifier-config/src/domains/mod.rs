//! Domain-specific configuration modules

pub mod endpoints;
pub mod logging;
pub mod server;
pub mod utils;
pub mod worker;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AmplifierConfig {
    #[serde(default)]
    pub server: server::ServerConfig,

    /// Worker process supervision
    #[serde(default)]
    pub worker: worker::WorkerConfig,

    /// Worker scripts and budgets per endpoint
    #[serde(default)]
    pub endpoints: endpoints::EndpointsConfig,

    #[serde(default)]
    pub logging: logging::LoggingConfig,
}

impl AmplifierConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.server.validate()?;
        self.worker.validate()?;
        self.endpoints.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let config = AmplifierConfig::default();
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        assert!(AmplifierConfig::default().validate_all().is_ok());
    }

    #[test]
    fn test_sample_round_trips() {
        let sample = AmplifierConfig::generate_sample();
        let parsed: AmplifierConfig = serde_yaml::from_str(&sample).unwrap();
        assert_eq!(parsed.server.port, 3000);
        assert_eq!(parsed.endpoints.execute_recipe_stream.timeout.as_secs(), 120);
    }
}
