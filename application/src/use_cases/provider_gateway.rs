//! Provider Gateway: model priority and permission fallback.
//!
//! Turns (system instructions, user prompt) into assistant text by trying
//! the configured models in order. Each single call yields an
//! [`InvokeOutcome`]; only [`InvokeOutcome::PermissionDenied`] advances the
//! loop to the next model. Any other failure is returned as-is.

use crate::config::GenerationParams;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::llm_gateway::{CompletionRequest, GatewayError, LlmGateway, StreamHandle};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use vibe_domain::{Model, StreamEvent, extract_artifact};

/// Errors surfaced by [`ProviderGateway::generate`] and
/// [`ProviderGateway::open_stream`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerateError {
    #[error("No model configured")]
    NoModelConfigured,

    #[error("All models denied access (attempted: {}): {last_error}", join_models(.attempted))]
    AllModelsDenied {
        attempted: Vec<Model>,
        last_error: GatewayError,
    },

    #[error("Provider error: {0}")]
    Provider(GatewayError),
}

fn join_models(models: &[Model]) -> String {
    models
        .iter()
        .map(Model::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result of one call against one model.
#[derive(Debug, Clone, PartialEq)]
pub enum InvokeOutcome {
    Success(String),
    /// Access, region or entitlement restriction. The next model may work.
    PermissionDenied(GatewayError),
    OtherFailure(GatewayError),
}

impl InvokeOutcome {
    pub fn from_result(result: Result<String, GatewayError>) -> Self {
        match result {
            Ok(text) => InvokeOutcome::Success(text),
            Err(e) if e.is_permission_denied() => InvokeOutcome::PermissionDenied(e),
            Err(e) => InvokeOutcome::OtherFailure(e),
        }
    }
}

/// Output of a successful [`ProviderGateway::generate`].
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOutput {
    pub assistant_text: String,
    pub artifact: String,
    /// Model that answered.
    pub model: Model,
    /// Models tried, in order, ending with `model`.
    pub attempted: Vec<Model>,
}

/// A provider stream that has produced its first event.
///
/// The first event was read while choosing the model, so that a
/// permission-class error arriving before any token still falls through to
/// the next model. [`ModelStream::next`] replays it.
pub struct ModelStream {
    pub model: Model,
    pub attempted: Vec<Model>,
    pending: Option<StreamEvent>,
    handle: StreamHandle,
}

impl ModelStream {
    /// Next upstream event; `None` once the provider closed the stream.
    pub async fn next(&mut self) -> Option<StreamEvent> {
        if let Some(event) = self.pending.take() {
            return Some(event);
        }
        self.handle.receiver.recv().await
    }
}

/// Fallback loop over the configured models.
#[derive(Clone)]
pub struct ProviderGateway {
    gateway: Arc<dyn LlmGateway>,
    models: Vec<Model>,
    temperature: f32,
    max_tokens: u32,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl ProviderGateway {
    pub fn new(gateway: Arc<dyn LlmGateway>, params: &GenerationParams) -> Self {
        Self {
            gateway,
            models: params.list_models(),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    /// Models in priority order: primary, then fallbacks, de-duplicated.
    pub fn list_models(&self) -> &[Model] {
        &self.models
    }

    fn request(&self, model: &Model, system_prompt: &str, user_prompt: &str) -> CompletionRequest {
        CompletionRequest::new(model.clone(), system_prompt, user_prompt)
            .with_sampling(self.temperature, self.max_tokens)
    }

    /// One blocking call against one model.
    pub async fn invoke(
        &self,
        model: &Model,
        system_prompt: &str,
        user_prompt: &str,
    ) -> InvokeOutcome {
        let request = self.request(model, system_prompt, user_prompt);
        InvokeOutcome::from_result(self.gateway.complete(&request).await)
    }

    /// Try each model until one answers, falling through only on
    /// permission-class failures.
    pub async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<GenerateOutput, GenerateError> {
        if self.models.is_empty() {
            return Err(GenerateError::NoModelConfigured);
        }

        let mut attempted = Vec::with_capacity(self.models.len());
        let mut last_error = None;

        for model in &self.models {
            attempted.push(model.clone());
            debug!(model = %model, attempt = attempted.len(), "Invoking model");

            match self.invoke(model, system_prompt, user_prompt).await {
                InvokeOutcome::Success(text) => {
                    info!(model = %model, attempts = attempted.len(), "Model answered");
                    let artifact = extract_artifact(&text);
                    return Ok(GenerateOutput {
                        assistant_text: text,
                        artifact,
                        model: model.clone(),
                        attempted,
                    });
                }
                InvokeOutcome::PermissionDenied(e) => {
                    self.record_denial(model, &e);
                    last_error = Some(e);
                }
                InvokeOutcome::OtherFailure(e) => {
                    warn!(model = %model, error = %e, "Model call failed");
                    return Err(GenerateError::Provider(e));
                }
            }
        }

        Err(Self::exhausted(attempted, last_error))
    }

    /// Open a token stream, falling through to the next model on a
    /// permission-class failure raised before the first token.
    ///
    /// `idle_timeout` bounds the wait for the first event.
    pub async fn open_stream(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        idle_timeout: Duration,
    ) -> Result<ModelStream, GenerateError> {
        if self.models.is_empty() {
            return Err(GenerateError::NoModelConfigured);
        }

        let mut attempted = Vec::with_capacity(self.models.len());
        let mut last_error = None;

        for model in &self.models {
            attempted.push(model.clone());
            debug!(model = %model, attempt = attempted.len(), "Opening stream");

            let request = self.request(model, system_prompt, user_prompt);
            let error = match self.gateway.complete_streaming(&request).await {
                Ok(mut handle) => {
                    match tokio::time::timeout(idle_timeout, handle.receiver.recv()).await {
                        Err(_) => return Err(GenerateError::Provider(GatewayError::Timeout)),
                        Ok(None) => GatewayError::TransportClosed,
                        Ok(Some(StreamEvent::Error(failure))) => failure.into(),
                        Ok(Some(first)) => {
                            info!(model = %model, attempts = attempted.len(), "Stream opened");
                            return Ok(ModelStream {
                                model: model.clone(),
                                attempted,
                                pending: Some(first),
                                handle,
                            });
                        }
                    }
                }
                Err(e) => e,
            };

            if !error.is_permission_denied() {
                warn!(model = %model, error = %error, "Stream failed to open");
                return Err(GenerateError::Provider(error));
            }
            self.record_denial(model, &error);
            last_error = Some(error);
        }

        Err(Self::exhausted(attempted, last_error))
    }

    fn record_denial(&self, model: &Model, error: &GatewayError) {
        warn!(model = %model, error = %error, "Model denied, trying next");
        self.conversation_logger.log(ConversationEvent::new(
            "model_denied",
            serde_json::json!({
                "model": model.as_str(),
                "category": error.category(),
                "message": error.message(),
            }),
        ));
    }

    fn exhausted(attempted: Vec<Model>, last_error: Option<GatewayError>) -> GenerateError {
        match last_error {
            Some(last_error) => GenerateError::AllModelsDenied {
                attempted,
                last_error,
            },
            None => GenerateError::NoModelConfigured,
        }
    }
}
