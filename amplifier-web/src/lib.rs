//! # Amplifier Web Utilities
//!
//! Reusable HTTP plumbing for the Amplifier playground bridge: the JSON
//! error envelope, CORS and request-id middleware, and helpers for building
//! Server-Sent Event responses.
//!
//! ## Example
//!
//! ```rust,no_run
//! use axum::{middleware::from_fn, routing::get, Router};
//! use amplifier_web::middleware::{cors_layer, request_id_middleware};
//!
//! async fn ping() -> &'static str {
//!     "pong"
//! }
//!
//! # #[tokio::main]
//! # async fn main() {
//! let app: Router = Router::new()
//!     .route("/ping", get(ping))
//!     .layer(from_fn(request_id_middleware))
//!     .layer(cors_layer());
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await.unwrap();
//! axum::serve(listener, app).await.unwrap();
//! # }
//! ```

pub mod errors;
pub mod middleware;
pub mod sse;

pub use errors::WebError;
pub use middleware::{
    cors_layer, cors_layer_with_config, handle_not_found, request_id_middleware, RequestId, REQUEST_ID_HEADER,
    USER_ID_HEADER,
};
pub use sse::{json_event, sse_response, DEFAULT_KEEP_ALIVE};
