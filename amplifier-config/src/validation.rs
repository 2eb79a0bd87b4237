//! Validation shared by the configuration domains

use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};

/// A configuration section that can check itself before the server starts
pub trait Validatable {
    fn validate(&self) -> ConfigResult<()>;

    /// Section name used in error reports
    fn domain_name(&self) -> &'static str;

    fn invalid(&self, message: impl Into<String>) -> ConfigError {
        ConfigError::invalid(self.domain_name(), message)
    }

    fn require_non_blank(&self, field: &str, value: &str) -> ConfigResult<()> {
        if value.trim().is_empty() {
            return Err(self.invalid(format!("{} cannot be empty", field)));
        }
        Ok(())
    }

    fn require_nonzero_duration(&self, field: &str, value: Duration) -> ConfigResult<()> {
        if value.is_zero() {
            return Err(self.invalid(format!("{} must be longer than zero", field)));
        }
        Ok(())
    }

    fn require_nonzero(&self, field: &str, value: usize) -> ConfigResult<()> {
        if value == 0 {
            return Err(self.invalid(format!("{} must be at least 1", field)));
        }
        Ok(())
    }

    /// Port 0 is rejected; privileged ports only warn since containers often bind them
    fn require_port(&self, field: &str, port: u16) -> ConfigResult<()> {
        if port == 0 {
            return Err(self.invalid(format!("{} cannot be 0", field)));
        }
        if port < 1024 {
            tracing::warn!(field, port, "binding a privileged port");
        }
        Ok(())
    }
}
