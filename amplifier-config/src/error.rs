//! Configuration errors

use std::path::PathBuf;
use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was read but is not valid YAML/JSON for [`crate::AmplifierConfig`]
    #[error("Cannot parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    /// An `AMPLIFIER_*` override could not be interpreted
    #[error("{var}={value:?} is not a valid {expected}")]
    InvalidEnv {
        var: String,
        value: String,
        expected: &'static str,
    },

    #[error("Invalid {domain} configuration: {message}")]
    Invalid { domain: String, message: String },
}

impl ConfigError {
    pub fn invalid(domain: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            domain: domain.into(),
            message: message.into(),
        }
    }
}
