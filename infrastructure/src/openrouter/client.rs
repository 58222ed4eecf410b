//! OpenRouter gateway - implements LlmGateway for an OpenAI-compatible API

use super::error::{OpenRouterError, Result};
use super::protocol::{ChatMessage, ChatRequest, ChatResponse, DONE_MARKER, parse_api_error};
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use vibe_application::{CompletionRequest, GatewayError, LlmGateway, StreamHandle};
use vibe_domain::{ProviderFailure, StreamEvent};

/// Connection settings for [`OpenRouterGateway`].
#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Bound on a whole batch request.
    pub request_timeout: Duration,
    /// Sent as `HTTP-Referer` for attribution.
    pub app_url: Option<String>,
    /// Sent as `X-Title` for attribution.
    pub app_title: Option<String>,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: OpenRouterGateway::DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(120),
            app_url: None,
            app_title: Some("vibe-coding".to_string()),
        }
    }
}

/// Gateway to OpenRouter (or any OpenAI-compatible `/chat/completions`).
pub struct OpenRouterGateway {
    config: OpenRouterConfig,
    client: reqwest::Client,
}

impl OpenRouterGateway {
    pub const DEFAULT_BASE_URL: &'static str = "https://openrouter.ai/api/v1";

    const STREAM_BUFFER: usize = 64;

    pub fn new(config: OpenRouterConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &OpenRouterConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn headers(&self) -> Result<HeaderMap> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(OpenRouterError::MissingApiKey)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|_| OpenRouterError::MissingApiKey)?;
        headers.insert(AUTHORIZATION, bearer);

        if let Some(url) = &self.config.app_url
            && let Ok(value) = HeaderValue::from_str(url)
        {
            headers.insert(HeaderName::from_static("http-referer"), value);
        }
        if let Some(title) = &self.config.app_title
            && let Ok(value) = HeaderValue::from_str(title)
        {
            headers.insert(HeaderName::from_static("x-title"), value);
        }
        Ok(headers)
    }

    fn body<'a>(request: &'a CompletionRequest, stream: bool) -> ChatRequest<'a> {
        ChatRequest {
            model: request.model.as_str(),
            messages: vec![
                ChatMessage::system(&request.system_prompt),
                ChatMessage::user(&request.user_prompt),
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream,
        }
    }

    /// Send the request and turn non-2xx statuses into [`OpenRouterError::Api`].
    async fn send(&self, request: &CompletionRequest, stream: bool) -> Result<reqwest::Response> {
        let headers = self.headers()?;
        let mut builder = self
            .client
            .post(self.endpoint())
            .headers(headers)
            .json(&Self::body(request, stream));
        if !stream {
            builder = builder.timeout(self.config.request_timeout);
        }

        debug!(model = %request.model, stream, "POST chat/completions");
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let (category, message) = parse_api_error(status.as_u16(), &body);
            warn!(model = %request.model, status = status.as_u16(), %category, "Provider rejected request");
            return Err(OpenRouterError::Api {
                status: Some(status.as_u16()),
                category,
                message,
            });
        }
        Ok(response)
    }

    async fn complete_inner(&self, request: &CompletionRequest) -> Result<String> {
        let response = self.send(request, false).await?;
        let raw = response.text().await?;
        let parsed: ChatResponse =
            serde_json::from_str(&raw).map_err(|e| OpenRouterError::ParseError {
                error: e.to_string(),
                raw: raw.clone(),
            })?;

        if let Some(error) = parsed.error.as_ref() {
            return Err(OpenRouterError::Api {
                status: error.numeric_code(),
                category: error.category().unwrap_or_else(|| "provider_error".to_string()),
                message: error.message.clone().unwrap_or_default(),
            });
        }
        if parsed.choices.is_empty() {
            return Err(OpenRouterError::EmptyResponse);
        }
        Ok(parsed.message_text().unwrap_or_default().to_string())
    }
}

#[async_trait]
impl LlmGateway for OpenRouterGateway {
    async fn complete(&self, request: &CompletionRequest) -> std::result::Result<String, GatewayError> {
        Ok(self.complete_inner(request).await?)
    }

    async fn complete_streaming(
        &self,
        request: &CompletionRequest,
    ) -> std::result::Result<StreamHandle, GatewayError> {
        let response = self.send(request, true).await?;
        let (tx, rx) = mpsc::channel(Self::STREAM_BUFFER);
        let model = request.model.clone();

        tokio::spawn(async move {
            let mut events = Box::pin(response.bytes_stream().eventsource());
            let mut full_text = String::new();

            while let Some(item) = events.next().await {
                let event = match item {
                    Ok(event) => event,
                    Err(e) => {
                        warn!(model = %model, error = %e, "SSE stream broke");
                        let _ = tx
                            .send(StreamEvent::Error(ProviderFailure::new(
                                "stream_error",
                                e.to_string(),
                            )))
                            .await;
                        return;
                    }
                };

                let data = event.data.trim();
                if data.is_empty() {
                    continue;
                }
                if data == DONE_MARKER {
                    let _ = tx.send(StreamEvent::Completed(full_text)).await;
                    return;
                }

                let mut chunk: ChatResponse = match serde_json::from_str(data) {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        warn!(model = %model, error = %e, "Skipping unparsable SSE chunk");
                        continue;
                    }
                };

                if let Some(error) = chunk.error.take() {
                    let failure = ProviderFailure::new(
                        error.category().unwrap_or_else(|| "provider_error".to_string()),
                        error.message.unwrap_or_default(),
                    );
                    let _ = tx.send(StreamEvent::Error(failure)).await;
                    return;
                }

                if let Some(text) = chunk.delta_text()
                    && !text.is_empty()
                {
                    full_text.push_str(text);
                    if tx.send(StreamEvent::Delta(text.to_string())).await.is_err() {
                        debug!(model = %model, "Stream receiver dropped");
                        return;
                    }
                }
            }

            debug!(model = %model, "SSE stream ended without [DONE]");
        });

        Ok(StreamHandle::new(rx))
    }
}
