use axum::{http::Uri, response::IntoResponse};

use crate::errors::WebError;

/// Fallback for unknown routes
pub async fn handle_not_found(uri: Uri) -> impl IntoResponse {
    WebError::not_found(format!("No route for {}", uri.path()))
}
