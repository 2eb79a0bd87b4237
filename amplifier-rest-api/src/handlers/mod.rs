pub mod chat;
pub mod config;
pub mod execute;
pub mod health;
pub mod stream;

// Re-export handler functions
pub use chat::*;
pub use config::*;
pub use execute::*;
pub use health::*;
pub use stream::*;
