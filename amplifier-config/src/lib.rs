//! Domain-driven configuration for the Amplifier playground bridge
//!
//! Configuration is split by functional domain (server, worker processes,
//! per-endpoint worker scripts, logging), loaded from YAML or JSON with
//! `AMPLIFIER_*` environment overrides, and validated before use.

pub mod domains;
pub mod error;
pub mod loader;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

pub use domains::{
    endpoints::{EndpointConfig, EndpointsConfig},
    logging::{LogFormat, LogLevel, LoggingConfig},
    server::{CorsConfig, ServerConfig},
    worker::WorkerConfig,
    AmplifierConfig,
};

pub use domains::utils::{parse_duration, serde_duration};
