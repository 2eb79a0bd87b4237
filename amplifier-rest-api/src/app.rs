//! Router assembly

use amplifier_config::{CorsConfig, ServerConfig};
use amplifier_web::{cors_layer_with_config, handle_not_found, request_id_middleware};
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{
    context::PlaygroundContext,
    handlers::{self, health},
};

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Enable CORS middleware
    pub enable_cors: bool,
    pub cors: CorsConfig,
    /// Enable request ID tracking
    pub enable_request_id: bool,
    /// Enable request tracing
    pub enable_tracing: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            enable_cors: true,
            cors: CorsConfig::default(),
            enable_request_id: true,
            enable_tracing: true,
        }
    }
}

impl AppConfig {
    pub fn from_server_config(server: &ServerConfig) -> Self {
        Self {
            enable_cors: server.cors.enabled,
            cors: server.cors.clone(),
            enable_request_id: server.enable_request_id,
            enable_tracing: server.enable_tracing,
        }
    }
}

/// Create the complete bridge application
pub fn create_rest_app(context: PlaygroundContext, config: AppConfig) -> Router {
    let mut app = Router::new()
        .route("/", get(handlers::service_index))
        .route("/health", get(handlers::health_check))
        .nest("/api", create_api_router())
        .fallback(handle_not_found)
        .with_state(context);

    // Layers wrap everything added before them, so tracing ends up outermost
    if config.enable_cors {
        app = app.layer(cors_layer_with_config(&config.cors));
    }

    if config.enable_request_id {
        app = app.layer(from_fn(request_id_middleware));
    }

    if config.enable_tracing {
        app = app.layer(TraceLayer::new_for_http());
    }

    app
}

fn create_api_router() -> Router<PlaygroundContext> {
    Router::new()
        // Playground
        .route(
            "/playground/execute",
            get(|| health::service_status(health::EXECUTE_SERVICE)).post(handlers::execute_example),
        )
        .route(
            "/playground/execute-bundle",
            get(|| health::service_status(health::EXECUTE_BUNDLE_SERVICE)).post(handlers::execute_bundle),
        )
        .route(
            "/playground/execute-stream",
            get(|| health::service_status(health::EXECUTE_STREAM_SERVICE)).post(handlers::execute_stream),
        )
        .route(
            "/playground/execute-bundle-stream",
            get(|| health::service_status(health::EXECUTE_BUNDLE_STREAM_SERVICE)).post(handlers::execute_bundle_stream),
        )
        .route(
            "/playground/execute-recipe-stream",
            get(|| health::service_status(health::EXECUTE_RECIPE_STREAM_SERVICE)).post(handlers::execute_recipe_stream),
        )
        // Chat
        .route(
            "/chat",
            get(|| health::service_status(health::CHAT_SERVICE)).post(handlers::chat),
        )
        .route(
            "/chat/warmup",
            get(|| health::service_status(health::WARMUP_SERVICE)).post(handlers::chat_warmup),
        )
        // User configuration
        .route("/config", get(handlers::get_config).post(handlers::save_config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_follows_server_config() {
        let mut server = ServerConfig::default();
        server.cors.enabled = false;
        server.enable_tracing = false;

        let config = AppConfig::from_server_config(&server);
        assert!(!config.enable_cors);
        assert!(!config.enable_tracing);
        assert!(config.enable_request_id);
    }
}
