//! Web-facing error envelope
//!
//! Every failure response from the bridge has the same JSON body:
//! `{"success": false, "error": <message>, "details"?: <text>}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Web error type for HTTP API operations
#[derive(Debug, Error)]
pub enum WebError {
    #[error("{message}")]
    BadRequest { message: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("{message}")]
    Internal {
        message: String,
        details: Option<String>,
        execution_time_ms: Option<u64>,
    },
}

impl WebError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        WebError::BadRequest { message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        WebError::NotFound { message: message.into() }
    }

    /// Internal error carrying worker diagnostics
    pub fn execution(message: impl Into<String>, details: Option<String>, execution_time_ms: Option<u64>) -> Self {
        WebError::Internal {
            message: message.into(),
            details,
            execution_time_ms,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            WebError::NotFound { .. } => StatusCode::NOT_FOUND,
            WebError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for logs
    pub fn error_code(&self) -> &'static str {
        match self {
            WebError::BadRequest { .. } => "BAD_REQUEST",
            WebError::NotFound { .. } => "NOT_FOUND",
            WebError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// JSON body for this error
    pub fn body(&self) -> Value {
        let mut body = Map::new();
        body.insert("success".to_string(), Value::Bool(false));
        body.insert("error".to_string(), Value::String(self.to_string()));

        if let WebError::Internal {
            details,
            execution_time_ms,
            ..
        } = self
        {
            if let Some(details) = details {
                body.insert("details".to_string(), Value::String(details.clone()));
            }
            if let Some(ms) = execution_time_ms {
                body.insert("executionTimeMs".to_string(), json!(ms));
            }
        }

        Value::Object(body)
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), "{}", self);
        } else {
            tracing::debug!(code = self.error_code(), "{}", self);
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_request_body() {
        let err = WebError::bad_request("Example ID is required");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.body(), json!({"success": false, "error": "Example ID is required"}));
    }

    #[test]
    fn test_execution_body_includes_details() {
        let err = WebError::execution("Process exited with code 1", Some("Traceback".to_string()), Some(812));
        assert_eq!(
            err.body(),
            json!({
                "success": false,
                "error": "Process exited with code 1",
                "details": "Traceback",
                "executionTimeMs": 812
            })
        );
    }
}
