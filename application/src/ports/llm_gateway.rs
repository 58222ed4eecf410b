//! LLM Gateway port
//!
//! Defines the interface for a single upstream completion call against one
//! model. Model selection and fallback live in
//! [`ProviderGateway`](crate::use_cases::provider_gateway::ProviderGateway).

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use vibe_domain::{FailureClass, Model, ProviderFailure, StreamEvent, classify_failure};

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Provider error ({category}): {message}")]
    Provider {
        status: Option<u16>,
        category: String,
        message: String,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Transport closed")]
    TransportClosed,

    #[error("Other error: {0}")]
    Other(String),
}

impl GatewayError {
    /// Short failure category, e.g. the provider's error code.
    pub fn category(&self) -> &str {
        match self {
            GatewayError::Configuration(_) => "configuration",
            GatewayError::ConnectionError(_) => "connection",
            GatewayError::Provider { category, .. } => category,
            GatewayError::InvalidResponse(_) => "invalid_response",
            GatewayError::Timeout => "timeout",
            GatewayError::TransportClosed => "transport_closed",
            GatewayError::Other(_) => "other",
        }
    }

    /// Human-readable failure detail without the category prefix.
    pub fn message(&self) -> String {
        match self {
            GatewayError::Configuration(m)
            | GatewayError::ConnectionError(m)
            | GatewayError::InvalidResponse(m)
            | GatewayError::Other(m) => m.clone(),
            GatewayError::Provider { message, .. } => message.clone(),
            GatewayError::Timeout => "request timed out".to_string(),
            GatewayError::TransportClosed => "transport closed".to_string(),
        }
    }

    /// Permission-class heuristic applied to category and message.
    ///
    /// Configuration errors are never permission-class: a missing API key
    /// must surface immediately instead of walking the fallback list.
    pub fn class(&self) -> FailureClass {
        match self {
            GatewayError::Configuration(_) => FailureClass::Other,
            other => classify_failure(other.category(), &other.message()),
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        self.class().is_permission()
    }
}

impl From<ProviderFailure> for GatewayError {
    fn from(failure: ProviderFailure) -> Self {
        GatewayError::Provider {
            status: None,
            category: failure.category,
            message: failure.message,
        }
    }
}

/// One outbound provider call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: Model,
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(
        model: Model,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> Self {
        Self {
            model,
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            temperature: 0.2,
            max_tokens: 2000,
        }
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Same prompts, different model.
    pub fn for_model(&self, model: &Model) -> Self {
        Self {
            model: model.clone(),
            ..self.clone()
        }
    }
}

/// Handle for receiving streaming events from a provider call.
///
/// Wraps an `mpsc::Receiver<StreamEvent>` and provides convenience methods
/// for consuming the stream.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self { receiver }
    }

    /// Consume the stream and collect all text into a single string.
    pub async fn collect_text(mut self) -> Result<String, GatewayError> {
        let mut full_text = String::new();
        while let Some(event) = self.receiver.recv().await {
            match event {
                StreamEvent::Delta(chunk) => full_text.push_str(&chunk),
                StreamEvent::Completed(text) => {
                    if full_text.is_empty() {
                        return Ok(text);
                    }
                    return Ok(full_text);
                }
                StreamEvent::Error(failure) => return Err(failure.into()),
            }
        }
        Err(GatewayError::TransportClosed)
    }
}

/// Gateway for LLM communication
///
/// This port defines how the application layer reaches an upstream model.
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Send one request and wait for the full assistant text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError>;

    /// Send one request and receive the reply incrementally.
    ///
    /// Errors returned here happened before any token was produced. Failures
    /// after that arrive in-band as [`StreamEvent::Error`].
    ///
    /// Default implementation calls `complete()` and wraps the result in a
    /// single `Completed` event.
    async fn complete_streaming(
        &self,
        request: &CompletionRequest,
    ) -> Result<StreamHandle, GatewayError> {
        let result = self.complete(request).await?;
        let (tx, rx) = mpsc::channel(1);
        // Receiver may already be gone; nothing to do then
        let _ = tx.send(StreamEvent::Completed(result)).await;
        Ok(StreamHandle::new(rx))
    }
}
