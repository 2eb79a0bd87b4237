//! Liveness and per-endpoint status probes

use axum::Json;
use tracing::debug;

use crate::models::{ServiceIndex, ServiceStatus};

pub const BRIDGE_SERVICE: &str = "amplifier-playground-bridge";
pub const EXECUTE_SERVICE: &str = "amplifier-playground-execute";
pub const EXECUTE_BUNDLE_SERVICE: &str = "amplifier-playground-execute-bundle";
pub const EXECUTE_STREAM_SERVICE: &str = "amplifier-playground-execute-stream";
pub const EXECUTE_BUNDLE_STREAM_SERVICE: &str = "amplifier-playground-execute-bundle-stream";
pub const EXECUTE_RECIPE_STREAM_SERVICE: &str = "amplifier-playground-execute-recipe-stream";
pub const CHAT_SERVICE: &str = "amplifier-chat-api";
pub const WARMUP_SERVICE: &str = "amplifier-warmup-api";

/// Paths served by the bridge, listed by `GET /`
pub const ENDPOINT_PATHS: [&str; 10] = [
    "/health",
    "/api/playground/execute",
    "/api/playground/execute-bundle",
    "/api/playground/execute-stream",
    "/api/playground/execute-bundle-stream",
    "/api/playground/execute-recipe-stream",
    "/api/chat",
    "/api/chat/warmup",
    "/api/config",
    "/",
];

/// `{status: "ok", service, timestamp}` for the named service
pub async fn service_status(service: &'static str) -> Json<ServiceStatus> {
    debug!(service, "Status check requested");
    Json(ServiceStatus::ok(service))
}

/// Health check endpoint
pub async fn health_check() -> Json<ServiceStatus> {
    service_status(BRIDGE_SERVICE).await
}

/// Service discovery endpoint
pub async fn service_index() -> Json<ServiceIndex> {
    Json(ServiceIndex {
        service: BRIDGE_SERVICE.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: ENDPOINT_PATHS.iter().map(|p| p.to_string()).collect(),
    })
}
