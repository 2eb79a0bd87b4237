//! Server-Sent Event response helpers

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
};
use futures::Stream;
use serde::Serialize;

/// Interval between keep-alive comments on idle streams
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(15);

/// Build an `event: <name>` frame with a JSON `data:` line
pub fn json_event<T: Serialize>(name: &str, data: &T) -> Event {
    match Event::default().event(name).json_data(data) {
        Ok(event) => event,
        Err(e) => {
            tracing::error!(event = name, "Failed to serialize SSE payload: {}", e);
            Event::default().event(name).data("{}")
        }
    }
}

/// Wrap an event stream as a `text/event-stream` response with keep-alive
/// comments and caching disabled
pub fn sse_response<S>(stream: S, keep_alive: Duration) -> Response
where
    S: Stream<Item = Result<Event, Infallible>> + Send + 'static,
{
    let mut response = Sse::new(stream)
        .keep_alive(KeepAlive::new().interval(keep_alive).text("keep-alive"))
        .into_response();

    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_sse_frames_and_headers() {
        let events = vec![
            Ok(json_event("status", &json!({"phase": "starting"}))),
            Ok(json_event("chunk", &json!({"content": "Hi"}))),
        ];
        let response = sse_response(futures::stream::iter(events), DEFAULT_KEEP_ALIVE);

        assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "text/event-stream");
        assert_eq!(response.headers().get(header::CACHE_CONTROL).unwrap(), "no-cache");
        assert_eq!(response.headers().get(header::CONNECTION).unwrap(), "keep-alive");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert_eq!(
            text,
            "event: status\ndata: {\"phase\":\"starting\"}\n\nevent: chunk\ndata: {\"content\":\"Hi\"}\n\n"
        );
    }
}
