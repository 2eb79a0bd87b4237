//! User configuration bodies

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// `POST /api/config` body
#[derive(Debug, Clone, Deserialize)]
pub struct SaveConfigRequest {
    #[serde(default)]
    pub config: JsonValue,
    #[serde(default)]
    pub bundle: JsonValue,
}

impl SaveConfigRequest {
    pub fn is_complete(&self) -> bool {
        !self.config.is_null() && !self.bundle.is_null()
    }
}

/// `GET /api/config` response
#[derive(Debug, Clone, Serialize)]
pub struct ConfigResponse {
    pub config: JsonValue,
}

/// `POST /api/config` response
#[derive(Debug, Clone, Serialize)]
pub struct SaveConfigResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl SaveConfigResponse {
    pub fn saved(config_id: Option<String>) -> Self {
        Self {
            success: true,
            message: "Configuration saved successfully".to_string(),
            config_id,
            warning: None,
        }
    }

    pub fn fallback(warning: impl Into<String>) -> Self {
        Self {
            success: true,
            message: "Configuration saved (in-memory fallback)".to_string(),
            config_id: None,
            warning: Some(warning.into()),
        }
    }
}
