//! Health and discovery payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of the `GET` health probe on each endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub status: String,
    pub service: String,
    pub timestamp: DateTime<Utc>,
}

impl ServiceStatus {
    pub fn ok(service: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            service: service.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Body of `GET /`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceIndex {
    pub service: String,
    pub version: String,
    pub endpoints: Vec<String>,
}
