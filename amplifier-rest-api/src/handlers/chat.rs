//! Chat turns and session warmup
//!
//! Both run a buffered worker and pass its JSON reply through unchanged.

use amplifier_execution::{EndpointSpec, ExecutionError, ExecutionRequest, WorkerOutput};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::Value as JsonValue;
use tracing::{info, warn};

use crate::{
    context::PlaygroundContext,
    errors::{RestError, RestResult},
    models::ChatRequest,
};

const CHAT_FAILED: &str = "Failed to process chat request";
const WARMUP_FAILED: &str = "Failed to warm up session";

/// Send one message to the chat worker
pub async fn chat(
    State(ctx): State<PlaygroundContext>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> RestResult<Json<JsonValue>> {
    let Json(body) = payload?;
    let request = ExecutionRequest::from(body);
    info!("Executing chat command");

    run_passthrough(&ctx, &request, &ctx.endpoints.chat, CHAT_FAILED).await
}

/// Pre-load a chat session
pub async fn chat_warmup(State(ctx): State<PlaygroundContext>) -> RestResult<Json<JsonValue>> {
    info!("Warming up Amplifier session");
    let reply = run_passthrough(&ctx, &ExecutionRequest::Warmup, &ctx.endpoints.warmup, WARMUP_FAILED).await?;
    info!("Amplifier session warmed up successfully");
    Ok(reply)
}

async fn run_passthrough(
    ctx: &PlaygroundContext,
    request: &ExecutionRequest,
    endpoint: &EndpointSpec,
    failure: &str,
) -> RestResult<Json<JsonValue>> {
    let result = match ctx.runner.run(request, endpoint).await {
        Ok(result) => result,
        Err(ExecutionError::ValidationError(message)) => return Err(RestError::bad_request(message)),
        Err(ExecutionError::WorkerFailed { output, .. }) if output.application_error().is_some() => {
            return Err(reported_error(&output));
        }
        Err(e) => {
            warn!(endpoint = %endpoint.name, "{} failed: {}", request.kind(), e);
            let details = match e.details() {
                Some(details) => format!("{}: {}", e, details),
                None => e.to_string(),
            };
            return Err(RestError::execution(failure, Some(details), e.execution_time_ms()));
        }
    };

    if result.output.application_error().is_some() {
        return Err(reported_error(&result.output));
    }

    match result.output {
        WorkerOutput::Json(reply) => Ok(Json(reply)),
        WorkerOutput::Text(_) | WorkerOutput::Empty => Err(RestError::execution(
            failure,
            Some("Worker did not return a JSON reply".to_string()),
            Some(result.execution_time_ms),
        )),
    }
}

fn reported_error(output: &WorkerOutput) -> RestError {
    match output.application_error() {
        Some(app) => RestError::execution(app.error, app.details, None),
        None => RestError::execution("Unknown error", None, None),
    }
}
