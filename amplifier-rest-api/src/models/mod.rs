//! Request and response bodies

pub mod common;
pub mod config;
pub mod playground;

pub use common::{ServiceIndex, ServiceStatus};
pub use config::{ConfigResponse, SaveConfigRequest, SaveConfigResponse};
pub use playground::{BundleRequest, ChatRequest, ExecuteRequest, ExecuteResponse, RecipeRequest};
