//! Amplifier playground bridge server
//!
//! Wires configuration, logging, the worker launcher and the REST/SSE router
//! into a single HTTP server with graceful shutdown.

pub mod services;
pub mod startup;

// Re-export main components
pub use services::*;
pub use startup::*;
