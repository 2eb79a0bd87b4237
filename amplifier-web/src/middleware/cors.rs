use amplifier_config::CorsConfig;
use axum::http::{header, HeaderName, HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};

/// Header carrying the caller's identity for per-user configuration
pub const USER_ID_HEADER: &str = "x-user-id";

/// Create CORS layer with default configuration (any origin)
pub fn cors_layer() -> CorsLayer {
    cors_layer_with_config(&CorsConfig::default())
}

/// Create CORS layer with custom configuration
pub fn cors_layer_with_config(config: &CorsConfig) -> CorsLayer {
    let request_id = HeaderName::from_static("x-request-id");

    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::CACHE_CONTROL,
            HeaderName::from_static(USER_ID_HEADER),
            request_id.clone(),
        ])
        .expose_headers([request_id]);

    if config.allowed_origins.iter().any(|origin| origin == "*") {
        tracing::warn!("CORS configured to allow any origin");
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::error!("Ignoring invalid CORS origin {:?}: {}", origin, e);
                    None
                }
            })
            .collect();
        cors = cors.allow_origin(origins);
    }

    cors
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_wildcard_origin_allows_any() {
        let app = Router::new()
            .route("/health", get(|| async { "ok" }))
            .layer(cors_layer());

        let request = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "https://playground.example.com")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_explicit_origin_list() {
        let config = CorsConfig {
            enabled: true,
            allowed_origins: vec!["https://amplifier.example.com".to_string()],
        };
        let app = Router::new()
            .route("/health", get(|| async { "ok" }))
            .layer(cors_layer_with_config(&config));

        let request = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "https://amplifier.example.com")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://amplifier.example.com"
        );
    }
}
