//! HTTP server configuration

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// CORS configuration
    #[serde(default)]
    pub cors: CorsConfig,

    /// Attach an `X-Request-ID` to every request and response
    #[serde(default = "crate::domains::utils::default_true")]
    pub enable_request_id: bool,

    /// Per-request HTTP tracing spans
    #[serde(default = "crate::domains::utils::default_true")]
    pub enable_tracing: bool,

    /// Interval between SSE keep-alive comments
    #[serde(with = "crate::domains::utils::serde_duration", default = "default_keep_alive")]
    pub sse_keep_alive: Duration,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    #[serde(default = "crate::domains::utils::default_true")]
    pub enabled: bool,

    /// Allowed origins; `*` allows any origin
    #[serde(default = "default_cors_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            cors: CorsConfig::default(),
            enable_request_id: true,
            enable_tracing: true,
            sse_keep_alive: default_keep_alive(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: default_cors_origins(),
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for binding a listener
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

impl Validatable for ServerConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.require_non_blank("bind_address", &self.bind_address)?;
        self.require_port("port", self.port)?;
        self.require_nonzero_duration("sse_keep_alive", self.sse_keep_alive)?;

        if self.cors.enabled && self.cors.allowed_origins.is_empty() {
            return Err(self.invalid("cors.allowed_origins cannot be empty when CORS is enabled"));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "server"
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_keep_alive() -> Duration {
    Duration::from_secs(15)
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
