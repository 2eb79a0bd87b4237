//! Per-user assistant configuration

use amplifier_execution::{ExecutionRequest, WorkerOutput};
use amplifier_web::USER_ID_HEADER;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::{
    context::PlaygroundContext,
    errors::{RestError, RestResult},
    models::{ConfigResponse, SaveConfigRequest, SaveConfigResponse},
    store::default_user_config,
};

const ANONYMOUS_USER: &str = "anonymous";

fn user_id(headers: &HeaderMap) -> String {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or(ANONYMOUS_USER)
        .to_string()
}

/// The caller's saved configuration, or the default one
pub async fn get_config(State(ctx): State<PlaygroundContext>, headers: HeaderMap) -> Json<ConfigResponse> {
    let user_id = user_id(&headers);
    let config = match ctx.config_store.get(&user_id).await {
        Some(stored) => stored.config,
        None => {
            debug!(user_id = %user_id, "No saved configuration, returning default");
            default_user_config()
        }
    };
    Json(ConfigResponse { config })
}

/// Register the caller's bundle with the app API and remember the configuration.
///
/// When the create-config worker fails the configuration is still kept
/// locally and the response says so.
pub async fn save_config(
    State(ctx): State<PlaygroundContext>,
    headers: HeaderMap,
    payload: Result<Json<SaveConfigRequest>, JsonRejection>,
) -> RestResult<Json<SaveConfigResponse>> {
    let Json(body) = payload?;
    if !body.is_complete() {
        return Err(RestError::bad_request("Missing config or bundle in request"));
    }

    let user_id = user_id(&headers);
    info!(user_id = %user_id, "Saving config");

    let request = ExecutionRequest::CreateConfig {
        user_id: user_id.clone(),
        bundle: body.bundle,
    };

    let registered = match ctx.runner.run(&request, &ctx.endpoints.create_config).await {
        Ok(result) => match (&result.output, result.output.application_error()) {
            (_, Some(app)) => Err(app.error),
            (WorkerOutput::Json(reply), None) => Ok(config_id(reply)),
            _ => Err("worker did not return a JSON reply".to_string()),
        },
        Err(e) => Err(e.to_string()),
    };

    match registered {
        Ok(config_id) => {
            ctx.config_store.put(&user_id, body.config, config_id.clone()).await;
            info!(user_id = %user_id, config_id = ?config_id, "Configuration saved");
            Ok(Json(SaveConfigResponse::saved(config_id)))
        }
        Err(reason) => {
            warn!(user_id = %user_id, "Failed to create config, falling back to in-memory storage: {}", reason);
            ctx.config_store.put(&user_id, body.config, None).await;
            Ok(Json(SaveConfigResponse::fallback("Could not connect to amplifier-app-api")))
        }
    }
}

fn config_id(reply: &JsonValue) -> Option<String> {
    match reply.get("config_id")? {
        JsonValue::String(id) if !id.is_empty() => Some(id.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    #[test]
    fn test_user_id_defaults_to_anonymous() {
        let mut headers = HeaderMap::new();
        assert_eq!(user_id(&headers), "anonymous");

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("  "));
        assert_eq!(user_id(&headers), "anonymous");

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("user-42"));
        assert_eq!(user_id(&headers), "user-42");
    }

    #[test]
    fn test_config_id_extraction() {
        assert_eq!(config_id(&json!({"config_id": "cfg-9"})).as_deref(), Some("cfg-9"));
        assert_eq!(config_id(&json!({"config_id": ""})), None);
        assert_eq!(config_id(&json!({"status": "ok"})), None);
    }
}
