//! Provider connection settings from TOML (`[provider]` section)

use serde::{Deserialize, Serialize};

/// OpenRouter / OpenAI-compatible endpoint configuration.
///
/// ```toml
/// [provider]
/// base_url = "https://openrouter.ai/api/v1"
/// request_timeout_secs = 120
/// app_url = "https://example.com"
/// app_title = "vibe-coding"
/// ```
///
/// Prefer the `OPENROUTER_API_KEY` environment variable over writing
/// `api_key` into a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Upper bound on one batch request, in seconds.
    pub request_timeout_secs: u64,
    /// Sent as `HTTP-Referer`.
    pub app_url: Option<String>,
    /// Sent as `X-Title`.
    pub app_title: Option<String>,
}

impl Default for FileProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://openrouter.ai/api/v1".to_string(),
            request_timeout_secs: 120,
            app_url: None,
            app_title: Some("vibe-coding".to_string()),
        }
    }
}

impl FileProviderConfig {
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}
