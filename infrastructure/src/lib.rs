//! Infrastructure layer for vibe-coding
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod logging;
pub mod openrouter;
pub mod session_store;

// Re-export commonly used types
pub use config::{ConfigLoader, ConfigValidationError, FileConfig};
pub use logging::JsonlConversationLogger;
pub use openrouter::{
    OpenRouterConfig, OpenRouterError, OpenRouterGateway,
    error::Result,
};
pub use session_store::InMemorySessionStore;
