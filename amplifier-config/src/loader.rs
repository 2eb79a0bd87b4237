//! Configuration loading: file first, then `<PREFIX>_*` environment overrides

use crate::domains::logging::{LogFormat, LogLevel, LoggingConfig};
use crate::domains::server::ServerConfig;
use crate::domains::utils::parse_duration;
use crate::domains::worker::WorkerConfig;
use crate::domains::AmplifierConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Reads configuration files and applies environment overrides
pub struct ConfigLoader {
    prefix: String,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::with_prefix("AMPLIFIER")
    }

    /// Loader reading `<prefix>_*` variables instead of `AMPLIFIER_*`
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    /// Load a `.json` or YAML file, apply overrides and validate
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<AmplifierConfig> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let parsed = if has_json_extension(path) {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&content).map_err(|e| e.to_string())
        };
        let mut config: AmplifierConfig = parsed.map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })?;

        self.finish(&mut config)?;
        Ok(config)
    }

    /// Defaults plus environment overrides
    pub fn from_env(&self) -> ConfigResult<AmplifierConfig> {
        let mut config = AmplifierConfig::default();
        self.finish(&mut config)?;
        Ok(config)
    }

    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<AmplifierConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    fn finish(&self, config: &mut AmplifierConfig) -> ConfigResult<()> {
        self.override_server(&mut config.server)?;
        self.override_worker(&mut config.worker)?;
        self.override_logging(&mut config.logging)?;
        config.validate_all()
    }

    fn override_server(&self, server: &mut ServerConfig) -> ConfigResult<()> {
        if let Some(bind) = self.var("SERVER_BIND_ADDRESS") {
            server.bind_address = bind;
        }
        if let Some(port) = self.parsed("SERVER_PORT", "port number")? {
            server.port = port;
        }
        if let Some(enabled) = self.parsed("SERVER_CORS_ENABLED", "boolean")? {
            server.cors.enabled = enabled;
        }
        Ok(())
    }

    fn override_worker(&self, worker: &mut WorkerConfig) -> ConfigResult<()> {
        if let Some(interpreter) = self.var("WORKER_INTERPRETER") {
            worker.interpreter = interpreter;
        }
        if let Some(dir) = self.var("WORKER_SCRIPTS_DIR") {
            worker.scripts_dir = PathBuf::from(dir);
        }
        if let Some(grace) = self.var("WORKER_GRACE_PERIOD") {
            worker.grace_period = parse_duration(&grace)
                .ok_or_else(|| self.invalid_env("WORKER_GRACE_PERIOD", grace, "duration"))?;
        }
        if let Some(inherit) = self.parsed("WORKER_INHERIT_ENV", "boolean")? {
            worker.inherit_env = inherit;
        }
        Ok(())
    }

    fn override_logging(&self, logging: &mut LoggingConfig) -> ConfigResult<()> {
        if let Some(level) = self.parsed::<LogLevel>("LOG_LEVEL", "log level")? {
            logging.level = level;
        }
        if let Some(format) = self.parsed::<LogFormat>("LOG_FORMAT", "log format")? {
            logging.format = format;
        }
        Ok(())
    }

    fn var(&self, name: &str) -> Option<String> {
        std::env::var(format!("{}_{}", self.prefix, name)).ok()
    }

    fn parsed<T: FromStr>(&self, name: &str, expected: &'static str) -> ConfigResult<Option<T>> {
        match self.var(name) {
            None => Ok(None),
            Some(raw) => match raw.trim().parse() {
                Ok(value) => Ok(Some(value)),
                Err(_) => Err(self.invalid_env(name, raw, expected)),
            },
        }
    }

    fn invalid_env(&self, name: &str, value: String, expected: &'static str) -> ConfigError {
        ConfigError::InvalidEnv {
            var: format!("{}_{}", self.prefix, name),
            value,
            expected,
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn has_json_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
