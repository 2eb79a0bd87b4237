//! REST API error type and its JSON envelope

use amplifier_execution::ExecutionError;
use amplifier_web::WebError;
use axum::{
    extract::rejection::JsonRejection,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// REST API specific error type
#[derive(Error, Debug)]
pub enum RestError {
    /// Missing or malformed request data; no worker was started
    #[error("{0}")]
    BadRequest(String),

    /// The worker could not produce a result
    #[error("{message}")]
    Execution {
        message: String,
        details: Option<String>,
        execution_time_ms: Option<u64>,
    },

    #[error(transparent)]
    Web(#[from] WebError),
}

/// Result type for REST operations
pub type RestResult<T> = Result<T, RestError>;

impl RestError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        RestError::BadRequest(message.into())
    }

    pub fn execution(message: impl Into<String>, details: Option<String>, execution_time_ms: Option<u64>) -> Self {
        RestError::Execution {
            message: message.into(),
            details,
            execution_time_ms,
        }
    }

    /// Convert to the shared web envelope
    pub fn into_web_error(self) -> WebError {
        match self {
            RestError::BadRequest(message) => WebError::bad_request(message),
            RestError::Execution {
                message,
                details,
                execution_time_ms,
            } => WebError::execution(message, details, execution_time_ms),
            RestError::Web(err) => err,
        }
    }
}

impl From<ExecutionError> for RestError {
    fn from(err: ExecutionError) -> Self {
        match err {
            ExecutionError::ValidationError(message) => RestError::BadRequest(message),
            ExecutionError::WorkerFailed {
                ref output,
                execution_time_ms,
                ..
            } => match output.application_error() {
                Some(app) => RestError::execution(app.error, app.details, Some(execution_time_ms)),
                None => RestError::execution(err.to_string(), err.details(), Some(execution_time_ms)),
            },
            other => RestError::execution(other.to_string(), other.details(), other.execution_time_ms()),
        }
    }
}

impl From<JsonRejection> for RestError {
    fn from(rejection: JsonRejection) -> Self {
        RestError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        self.into_web_error().into_response()
    }
}
