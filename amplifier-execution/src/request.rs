//! Execution requests and the stdin payloads built from them

use serde_json::{json, Value as JsonValue};

use crate::error::ExecutionError;

/// What a worker is asked to run.
///
/// A request is validated before any process starts and consumed once to
/// build the JSON document written to the worker's stdin.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionRequest {
    /// Run a playground example
    Example {
        example_id: String,
        inputs: JsonValue,
        mode: String,
    },
    /// Run a single prompt through a bundle
    Bundle {
        bundle_id: String,
        bundle_path: String,
        prompt: String,
    },
    /// Run a multi-step recipe
    Recipe {
        recipe_id: String,
        recipe_path: String,
        inputs: JsonValue,
    },
    /// One chat turn
    Chat {
        message: String,
        session_id: Option<String>,
    },
    /// Pre-load a chat session so the first turn is fast
    Warmup,
    /// Register a user's bundle with the backing app API
    CreateConfig { user_id: String, bundle: JsonValue },
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

impl ExecutionRequest {
    /// Short label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutionRequest::Example { .. } => "example",
            ExecutionRequest::Bundle { .. } => "bundle",
            ExecutionRequest::Recipe { .. } => "recipe",
            ExecutionRequest::Chat { .. } => "chat",
            ExecutionRequest::Warmup => "warmup",
            ExecutionRequest::CreateConfig { .. } => "create_config",
        }
    }

    /// Reject requests missing identifying fields
    pub fn validate(&self) -> Result<(), ExecutionError> {
        let missing = match self {
            ExecutionRequest::Example { example_id, .. } => is_blank(example_id).then_some("Example ID is required"),
            ExecutionRequest::Bundle {
                bundle_id,
                bundle_path,
                prompt,
            } => (is_blank(bundle_id) || is_blank(bundle_path) || is_blank(prompt))
                .then_some("bundleId, bundlePath, and prompt are required"),
            ExecutionRequest::Recipe {
                recipe_id, recipe_path, ..
            } => (is_blank(recipe_id) || is_blank(recipe_path)).then_some("recipeId and recipePath are required"),
            ExecutionRequest::Chat { message, .. } => is_blank(message).then_some("Message is required"),
            ExecutionRequest::Warmup => None,
            ExecutionRequest::CreateConfig { user_id, bundle } => {
                (is_blank(user_id) || bundle.is_null()).then_some("Missing config or bundle in request")
            }
        };

        match missing {
            Some(message) => Err(ExecutionError::ValidationError(message.to_string())),
            None => Ok(()),
        }
    }

    /// JSON document written to the worker's stdin
    pub fn to_payload(&self) -> JsonValue {
        match self {
            ExecutionRequest::Example { example_id, inputs, mode } => json!({
                "exampleId": example_id,
                "inputs": inputs,
                "mode": mode,
            }),
            ExecutionRequest::Bundle {
                bundle_id,
                bundle_path,
                prompt,
            } => json!({
                "bundleId": bundle_id,
                "bundlePath": bundle_path,
                "prompt": prompt,
            }),
            ExecutionRequest::Recipe {
                recipe_id,
                recipe_path,
                inputs,
            } => json!({
                "recipeId": recipe_id,
                "recipePath": recipe_path,
                "inputs": inputs,
            }),
            ExecutionRequest::Chat { message, session_id } => json!({
                "message": message,
                "sessionId": session_id,
            }),
            ExecutionRequest::Warmup => json!({}),
            ExecutionRequest::CreateConfig { user_id, bundle } => json!({
                "userId": user_id,
                "bundle": bundle,
            }),
        }
    }

    /// Message carried by the initial `status` event of a stream
    pub fn starting_message(&self) -> &'static str {
        match self {
            ExecutionRequest::Recipe { .. } => "Initializing recipe execution...",
            _ => "Initializing execution...",
        }
    }

    /// Message attached to a successful `complete` event, if any
    pub fn completion_message(&self) -> Option<&'static str> {
        match self {
            ExecutionRequest::Recipe { .. } => Some("Recipe execution completed successfully"),
            _ => None,
        }
    }

    /// `output` for a successful `complete` when the worker printed no final result
    pub fn empty_output_placeholder(&self) -> Option<&'static str> {
        match self {
            ExecutionRequest::Recipe { .. } => None,
            _ => Some("Execution completed (no output)"),
        }
    }

    /// Error text for a worker that exited unsuccessfully
    pub fn failure_message(&self, exit_code: Option<i32>) -> String {
        match (self, exit_code) {
            (ExecutionRequest::Recipe { .. }, Some(code)) => format!("Recipe execution failed with code {}", code),
            (_, Some(code)) => format!("Process exited with code {}", code),
            (_, None) => "Process terminated by signal".to_string(),
        }
    }
}
