//! Application layer for vibe-coding
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::GenerationParams;
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    llm_gateway::{CompletionRequest, GatewayError, LlmGateway, StreamHandle},
    session_store::{GenerationCommit, SessionStore, SessionStoreError},
};
pub use use_cases::provider_gateway::{
    GenerateError, GenerateOutput, InvokeOutcome, ModelStream, ProviderGateway,
};
pub use use_cases::run_generation::{
    ErrorKind, GenerationStream, RunGenerationError, RunGenerationInput, RunGenerationUseCase,
};
