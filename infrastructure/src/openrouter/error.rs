//! Error types for the OpenRouter adapter

use thiserror::Error;
use vibe_application::GatewayError;

/// Result type alias for OpenRouter operations
pub type Result<T> = std::result::Result<T, OpenRouterError>;

/// Errors that can occur when talking to an OpenAI-compatible endpoint
#[derive(Error, Debug)]
pub enum OpenRouterError {
    #[error("OPENROUTER_API_KEY is not set")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({category}): {message}")]
    Api {
        status: Option<u16>,
        category: String,
        message: String,
    },

    #[error("Failed to parse response: {error}\nRaw response: {raw}")]
    ParseError { error: String, raw: String },

    #[error("Response contained no choices")]
    EmptyResponse,
}

impl From<OpenRouterError> for GatewayError {
    fn from(e: OpenRouterError) -> Self {
        match e {
            OpenRouterError::MissingApiKey => GatewayError::Configuration(e.to_string()),
            OpenRouterError::Http(err) if err.is_timeout() => GatewayError::Timeout,
            OpenRouterError::Http(err) => GatewayError::ConnectionError(err.to_string()),
            OpenRouterError::Api {
                status,
                category,
                message,
            } => GatewayError::Provider {
                status,
                category,
                message,
            },
            OpenRouterError::ParseError { error, .. } => GatewayError::InvalidResponse(error),
            OpenRouterError::EmptyResponse => GatewayError::InvalidResponse(e.to_string()),
        }
    }
}
