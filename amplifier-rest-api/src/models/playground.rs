//! Playground and chat request/response bodies
//!
//! Identifier fields default to empty so that a missing field reaches
//! request validation and gets its specific message instead of a generic
//! deserialization failure.

use amplifier_execution::ExecutionRequest;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Mode used by the buffered execute endpoint when the client sends none
pub const BUFFERED_DEFAULT_MODE: &str = "normie";
/// Mode used by the streaming execute endpoint when the client sends none
pub const STREAMING_DEFAULT_MODE: &str = "developers";

fn empty_inputs() -> JsonValue {
    JsonValue::Object(Default::default())
}

/// `execute` and `execute-stream` body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    #[serde(default)]
    pub example_id: String,
    #[serde(default = "empty_inputs")]
    pub inputs: JsonValue,
    #[serde(default)]
    pub mode: Option<String>,
}

impl ExecuteRequest {
    pub fn into_request(self, default_mode: &str) -> ExecutionRequest {
        ExecutionRequest::Example {
            example_id: self.example_id,
            inputs: self.inputs,
            mode: self.mode.unwrap_or_else(|| default_mode.to_string()),
        }
    }
}

/// `execute-bundle` and `execute-bundle-stream` body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleRequest {
    #[serde(default)]
    pub bundle_id: String,
    #[serde(default)]
    pub bundle_path: String,
    #[serde(default)]
    pub prompt: String,
}

impl From<BundleRequest> for ExecutionRequest {
    fn from(body: BundleRequest) -> Self {
        ExecutionRequest::Bundle {
            bundle_id: body.bundle_id,
            bundle_path: body.bundle_path,
            prompt: body.prompt,
        }
    }
}

/// `execute-recipe-stream` body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeRequest {
    #[serde(default)]
    pub recipe_id: String,
    #[serde(default)]
    pub recipe_path: String,
    #[serde(default = "empty_inputs")]
    pub inputs: JsonValue,
}

impl From<RecipeRequest> for ExecutionRequest {
    fn from(body: RecipeRequest) -> Self {
        ExecutionRequest::Recipe {
            recipe_id: body.recipe_id,
            recipe_path: body.recipe_path,
            inputs: body.inputs,
        }
    }
}

/// `chat` body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl From<ChatRequest> for ExecutionRequest {
    fn from(body: ChatRequest) -> Self {
        ExecutionRequest::Chat {
            message: body.message,
            session_id: body.session_id.filter(|id| !id.is_empty()),
        }
    }
}

/// Successful buffered execution
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    pub success: bool,
    pub output: JsonValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonValue>,
    pub execution_time_ms: u64,
}
