//! OpenRouter adapter
//!
//! Talks to OpenRouter, or any OpenAI-compatible `/chat/completions`
//! endpoint, over HTTPS. Batch requests read the whole JSON body; streaming
//! requests parse the server-sent event stream into [`StreamEvent`]s.
//!
//! [`StreamEvent`]: vibe_domain::StreamEvent

pub mod client;
pub mod error;
pub mod protocol;

pub use client::{OpenRouterConfig, OpenRouterGateway};
pub use error::OpenRouterError;
