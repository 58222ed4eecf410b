//! Wire types for the OpenAI-compatible chat completions API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Marker sent as the final SSE `data` payload.
pub const DONE_MARKER: &str = "[DONE]";

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

impl<'a> ChatMessage<'a> {
    pub fn system(content: &'a str) -> Self {
        Self {
            role: "system",
            content,
        }
    }

    pub fn user(content: &'a str) -> Self {
        Self {
            role: "user",
            content,
        }
    }
}

/// Completion response; also the shape of each streamed chunk.
#[derive(Debug, Default, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Choice {
    pub message: Option<ContentPart>,
    pub delta: Option<ContentPart>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContentPart {
    pub content: Option<String>,
}

/// Error object returned in a response body or stream chunk.
#[derive(Debug, Default, Deserialize)]
pub struct ApiError {
    /// Numeric HTTP-like code on OpenRouter, a string code elsewhere.
    pub code: Option<Value>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub message: Option<String>,
}

impl ApiError {
    /// Textual error type or code, if the provider sent one.
    pub fn category(&self) -> Option<String> {
        if let Some(kind) = self.kind.as_deref().filter(|k| !k.is_empty()) {
            return Some(kind.to_string());
        }
        match &self.code {
            Some(Value::String(code)) if !code.is_empty() => Some(code.clone()),
            _ => None,
        }
    }

    pub fn numeric_code(&self) -> Option<u16> {
        self.code
            .as_ref()
            .and_then(Value::as_u64)
            .and_then(|c| u16::try_from(c).ok())
    }
}

impl ChatResponse {
    /// Full message text of the first choice.
    pub fn message_text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_deref())
    }

    /// Streamed text increment of the first choice.
    pub fn delta_text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.delta.as_ref())
            .and_then(|d| d.content.as_deref())
    }
}

/// Category and message for an HTTP error response.
///
/// Prefers the provider's error type/code and falls back to the HTTP reason
/// phrase, so a bare 403 becomes `forbidden`.
pub fn parse_api_error(status: u16, body: &str) -> (String, String) {
    let reason = reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map(|r| r.to_lowercase().replace(' ', "_"))
        .unwrap_or_else(|| format!("http_{status}"));

    let parsed: Option<ChatResponse> = serde_json::from_str(body).ok();
    match parsed.and_then(|r| r.error) {
        Some(error) => {
            let message = error
                .message
                .clone()
                .unwrap_or_else(|| format!("HTTP {status}"));
            (error.category().unwrap_or(reason), message)
        }
        None if body.trim().is_empty() => (reason, format!("HTTP {status}")),
        None => (reason, format!("HTTP {status}: {}", body.trim())),
    }
}
