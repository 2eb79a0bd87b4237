//! Per-user assistant configuration storage

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use tokio::sync::RwLock;

const DEFAULT_INSTRUCTIONS: &str = "You are a helpful AI assistant powered by Amplifier, a modular AI agent framework.

Your role is to answer questions about Amplifier - its architecture, capabilities, and how to use it effectively.

Key topics you can help with:
- Amplifier's modular architecture (kernel, modules, bundles)
- How to create and configure bundles
- Available modules (providers, tools, orchestrators, context managers, hooks)
- Best practices for building AI applications with Amplifier
- Troubleshooting and debugging Amplifier applications

Be clear, concise, and helpful in your responses. Use examples when appropriate.";

/// Configuration returned to users who never saved one
pub fn default_user_config() -> JsonValue {
    json!({
        "provider": "anthropic",
        "apiKey": "",
        "model": "claude-sonnet-4-5",
        "tools": ["tool-web"],
        "orchestrator": "loop-basic",
        "context": "context-simple",
        "hooks": [],
        "instructions": DEFAULT_INSTRUCTIONS,
    })
}

/// A user's saved configuration and the id the backing app API assigned to it
#[derive(Debug, Clone, PartialEq)]
pub struct StoredConfig {
    pub config: JsonValue,
    pub config_id: Option<String>,
}

/// Storage for user configurations, keyed by user id
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Option<StoredConfig>;

    /// Replace the user's configuration. A `None` id keeps any id stored earlier.
    async fn put(&self, user_id: &str, config: JsonValue, config_id: Option<String>);
}

/// Process-local [`ConfigStore`]; contents are lost on restart
#[derive(Debug, Default)]
pub struct InMemoryConfigStore {
    entries: RwLock<HashMap<String, StoredConfig>>,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ConfigStore for InMemoryConfigStore {
    async fn get(&self, user_id: &str) -> Option<StoredConfig> {
        self.entries.read().await.get(user_id).cloned()
    }

    async fn put(&self, user_id: &str, config: JsonValue, config_id: Option<String>) {
        let mut entries = self.entries.write().await;
        let config_id = config_id.or_else(|| entries.get(user_id).and_then(|e| e.config_id.clone()));
        entries.insert(user_id.to_string(), StoredConfig { config, config_id });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let store = InMemoryConfigStore::new();
        assert!(store.get("alice").await.is_none());

        store
            .put("alice", json!({"model": "claude-opus"}), Some("cfg-1".to_string()))
            .await;

        let stored = store.get("alice").await.unwrap();
        assert_eq!(stored.config, json!({"model": "claude-opus"}));
        assert_eq!(stored.config_id.as_deref(), Some("cfg-1"));
        assert!(store.get("bob").await.is_none());
    }

    #[tokio::test]
    async fn test_fallback_save_keeps_config_id() {
        let store = InMemoryConfigStore::new();
        store.put("alice", json!({"model": "a"}), Some("cfg-1".to_string())).await;
        store.put("alice", json!({"model": "b"}), None).await;

        let stored = store.get("alice").await.unwrap();
        assert_eq!(stored.config, json!({"model": "b"}));
        assert_eq!(stored.config_id.as_deref(), Some("cfg-1"));
        assert_eq!(store.len().await, 1);
    }

    #[test]
    fn test_default_config() {
        let config = default_user_config();
        assert_eq!(config["provider"], "anthropic");
        assert_eq!(config["model"], "claude-sonnet-4-5");
        assert_eq!(config["tools"], json!(["tool-web"]));
        assert_eq!(config["hooks"], json!([]));
        assert!(config["instructions"].as_str().unwrap().starts_with("You are a helpful AI assistant"));
    }
}
