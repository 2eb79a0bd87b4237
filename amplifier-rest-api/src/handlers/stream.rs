//! Streaming playground execution over Server-Sent Events

use std::convert::Infallible;

use amplifier_execution::{EndpointSpec, ExecutionRequest, StreamHandle};
use amplifier_web::{json_event, sse_response};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Response,
    Json,
};
use tracing::info;

use crate::{
    context::PlaygroundContext,
    errors::RestResult,
    models::{playground::STREAMING_DEFAULT_MODE, BundleRequest, ExecuteRequest, RecipeRequest},
};

/// Run an example, streaming its progress
pub async fn execute_stream(
    State(ctx): State<PlaygroundContext>,
    payload: Result<Json<ExecuteRequest>, JsonRejection>,
) -> RestResult<Response> {
    let Json(body) = payload?;
    let request = body.into_request(STREAMING_DEFAULT_MODE);
    start_stream(&ctx, request, ctx.endpoints.execute_stream.clone())
}

/// Run a prompt through a bundle, streaming its progress
pub async fn execute_bundle_stream(
    State(ctx): State<PlaygroundContext>,
    payload: Result<Json<BundleRequest>, JsonRejection>,
) -> RestResult<Response> {
    let Json(body) = payload?;
    start_stream(&ctx, body.into(), ctx.endpoints.execute_bundle_stream.clone())
}

/// Run a recipe, streaming each step
pub async fn execute_recipe_stream(
    State(ctx): State<PlaygroundContext>,
    payload: Result<Json<RecipeRequest>, JsonRejection>,
) -> RestResult<Response> {
    let Json(body) = payload?;
    start_stream(&ctx, body.into(), ctx.endpoints.execute_recipe_stream.clone())
}

/// Validate, then hand the request to the multiplexer and relay its events.
///
/// The worker is tied to the response body: when the client disconnects the
/// body is dropped, which cancels the stream and terminates the worker.
fn start_stream(ctx: &PlaygroundContext, request: ExecutionRequest, endpoint: EndpointSpec) -> RestResult<Response> {
    request.validate()?;
    info!(endpoint = %endpoint.name, kind = request.kind(), "Starting worker stream");

    let StreamHandle { mut events, cancel, .. } = ctx.multiplexer.spawn(request, endpoint);
    // Armed before the body is first polled, so dropping an unread response still stops the worker
    let abort_on_drop = cancel.drop_guard();

    let stream = async_stream::stream! {
        let _abort_on_drop = abort_on_drop;
        while let Some(event) = events.recv().await {
            yield Ok::<_, Infallible>(json_event(event.name(), &event));
        }
    };

    Ok(sse_response(stream, ctx.keep_alive))
}
