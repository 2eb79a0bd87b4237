//! Server startup and shutdown logic

use std::future::Future;

use amplifier_config::AmplifierConfig;
use amplifier_rest_api::{create_rest_app, AppConfig};
use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;

use crate::services::{init_logging, ServiceContainer};

/// Server application struct
pub struct Server {
    config: AmplifierConfig,
    services: ServiceContainer,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: AmplifierConfig) -> Result<Self> {
        // Initialize logging first
        init_logging(&config.logging)?;

        let services = ServiceContainer::new(&config);
        Ok(Self { config, services })
    }

    pub fn config(&self) -> &AmplifierConfig {
        &self.config
    }

    /// Build the complete application router
    pub fn build_app(&self) -> Router {
        create_rest_app(
            self.services.rest_context(),
            AppConfig::from_server_config(&self.config.server),
        )
    }

    /// Bind the configured address and serve until Ctrl-C or SIGTERM
    pub async fn start(self) -> Result<()> {
        let addr = self.config.server.socket_address();
        self.log_config_summary();

        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.build_app();
        tracing::info!("Server listening on {}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .context("Server error")?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Log configuration summary
    fn log_config_summary(&self) {
        let server = &self.config.server;
        let worker = &self.config.worker;

        tracing::info!("=== Amplifier Playground Bridge ===");
        tracing::info!("Bind Address: {}", server.socket_address());
        tracing::info!("Interpreter: {}", worker.interpreter);
        tracing::info!("Scripts: {}", worker.scripts_dir.display());
        tracing::info!("CORS: {}", if server.cors.enabled { "Enabled" } else { "Disabled" });
        tracing::info!("Request ID: {}", if server.enable_request_id { "Enabled" } else { "Disabled" });
        tracing::info!("Tracing: {}", if server.enable_tracing { "Enabled" } else { "Disabled" });
        for (name, endpoint) in self.config.endpoints.entries() {
            tracing::info!("Endpoint {}: {} ({}s)", name, endpoint.script, endpoint.timeout.as_secs());
        }
        tracing::info!("===================================");

        if !worker.scripts_dir.is_dir() {
            tracing::warn!(
                "Scripts directory {} does not exist; worker launches will fail",
                worker.scripts_dir.display()
            );
        }

        if self.services.launcher.env_policy().inherits_everything() {
            tracing::warn!(
                "Worker processes inherit the full server environment, including any secrets in it; \
                 set worker.env_denylist or worker.inherit_env = false to restrict it"
            );
        }
    }
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
