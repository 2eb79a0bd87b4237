//! # Amplifier REST API
//!
//! HTTP surface of the Amplifier playground bridge. Every endpoint starts an
//! external worker process for the request it serves:
//!
//! - **Streaming**: `execute-stream`, `execute-bundle-stream` and
//!   `execute-recipe-stream` relay worker progress as Server-Sent Events
//! - **Buffered**: `execute`, `execute-bundle`, `chat` and `chat/warmup` wait
//!   for the worker and answer with one JSON document
//! - **Configuration**: `/api/config` keeps per-user assistant settings in an
//!   injected [`ConfigStore`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use amplifier_config::AmplifierConfig;
//! use amplifier_execution::ProcessLauncher;
//! use amplifier_rest_api::{create_rest_app, AppConfig, PlaygroundContext};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AmplifierConfig::default();
//! let launcher = Arc::new(ProcessLauncher::from_config(&config.worker));
//! let context = PlaygroundContext::from_config(launcher, &config);
//!
//! let app = create_rest_app(context, AppConfig::from_server_config(&config.server));
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod context;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod store;

pub use app::{create_rest_app, AppConfig};
pub use context::{PlaygroundContext, PlaygroundEndpoints};
pub use errors::{RestError, RestResult};
pub use store::{default_user_config, ConfigStore, InMemoryConfigStore, StoredConfig};
