//! Buffered playground execution

use amplifier_execution::{EndpointSpec, ExecutionError, ExecutionRequest};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::info;

use crate::{
    context::PlaygroundContext,
    errors::{RestError, RestResult},
    models::{playground::BUFFERED_DEFAULT_MODE, BundleRequest, ExecuteRequest, ExecuteResponse},
};

/// Run an example and return its output
pub async fn execute_example(
    State(ctx): State<PlaygroundContext>,
    payload: Result<Json<ExecuteRequest>, JsonRejection>,
) -> RestResult<Json<ExecuteResponse>> {
    let Json(body) = payload?;
    let request = body.into_request(BUFFERED_DEFAULT_MODE);
    if let ExecutionRequest::Example { example_id, mode, .. } = &request {
        info!(example_id = %example_id, mode = %mode, "Executing example");
    }

    run_buffered(&ctx, &request, &ctx.endpoints.execute).await
}

/// Run one prompt through a bundle and return its output
pub async fn execute_bundle(
    State(ctx): State<PlaygroundContext>,
    payload: Result<Json<BundleRequest>, JsonRejection>,
) -> RestResult<Json<ExecuteResponse>> {
    let Json(body) = payload?;
    info!(bundle_id = %body.bundle_id, "Executing bundle");

    let request = ExecutionRequest::from(body);
    run_buffered(&ctx, &request, &ctx.endpoints.execute_bundle).await
}

async fn run_buffered(
    ctx: &PlaygroundContext,
    request: &ExecutionRequest,
    endpoint: &EndpointSpec,
) -> RestResult<Json<ExecuteResponse>> {
    let result = ctx
        .runner
        .run(request, endpoint)
        .await
        .map_err(|e| execution_failure(request, e))?;

    if let Some(app) = result.output.application_error() {
        return Err(RestError::execution(app.error, app.details, Some(result.execution_time_ms)));
    }

    Ok(Json(ExecuteResponse {
        success: true,
        output: result.output.output(),
        metadata: result.output.metadata(),
        execution_time_ms: result.execution_time_ms,
    }))
}

/// Map a failed run to a response, naming the exit code the way the
/// request kind reports it
pub(crate) fn execution_failure(request: &ExecutionRequest, err: ExecutionError) -> RestError {
    match err {
        ExecutionError::WorkerFailed {
            exit_code,
            stderr,
            output,
            execution_time_ms,
        } => match output.application_error() {
            Some(app) => RestError::execution(app.error, app.details, Some(execution_time_ms)),
            None => {
                let details = Some(stderr.trim().to_string()).filter(|s| !s.is_empty());
                RestError::execution(request.failure_message(exit_code), details, Some(execution_time_ms))
            }
        },
        other => other.into(),
    }
}
