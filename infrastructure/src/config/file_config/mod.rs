//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into application and adapter
//! settings by [`FileConfig::generation_params`] and
//! [`FileConfig::openrouter_config`].

mod generation;
mod models;
mod provider;

pub use generation::{FileContextConfig, FileGenerationConfig, FileLoggingConfig};
pub use models::{FileModelList, FileModelsConfig};
pub use provider::FileProviderConfig;

use crate::openrouter::OpenRouterConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use vibe_application::GenerationParams;

/// Problems found by [`FileConfig::validate`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    #[error("{field}: model name cannot be empty")]
    EmptyModelName { field: String },

    #[error("no model configured: set models.primary or models.fallbacks")]
    NoModelConfigured,

    #[error("{field} cannot be 0")]
    ZeroValue { field: &'static str },

    #[error("generation.temperature must be within 0.0..=2.0, got {0}")]
    TemperatureOutOfRange(f32),

    #[error(
        "context.head_keep ({head_keep}) + context.tail_keep ({tail_keep}) must be less than context.max_chars ({max_chars})"
    )]
    SnippetTooLarge {
        max_chars: usize,
        head_keep: usize,
        tail_keep: usize,
    },
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Upstream endpoint and credentials
    pub provider: FileProviderConfig,
    /// Model priority
    pub models: FileModelsConfig,
    /// Sampling and stream limits
    pub generation: FileGenerationConfig,
    /// Prompt snippet bounds
    pub context: FileContextConfig,
    /// Transcript logging
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();

        self.models.validate(&mut issues);

        if self.provider.request_timeout_secs == 0 {
            issues.push(ConfigValidationError::ZeroValue {
                field: "provider.request_timeout_secs",
            });
        }
        if self.generation.stream_idle_timeout_secs == 0 {
            issues.push(ConfigValidationError::ZeroValue {
                field: "generation.stream_idle_timeout_secs",
            });
        }
        if self.generation.max_tokens == 0 {
            issues.push(ConfigValidationError::ZeroValue {
                field: "generation.max_tokens",
            });
        }
        let temperature = self.generation.temperature;
        if !(0.0..=2.0).contains(&temperature) {
            issues.push(ConfigValidationError::TemperatureOutOfRange(temperature));
        }

        let ctx = &self.context;
        if ctx.head_keep + ctx.tail_keep >= ctx.max_chars {
            issues.push(ConfigValidationError::SnippetTooLarge {
                max_chars: ctx.max_chars,
                head_keep: ctx.head_keep,
                tail_keep: ctx.tail_keep,
            });
        }

        issues
    }

    /// Application-level generation parameters.
    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams::default()
            .with_primary_model(self.models.primary_model())
            .with_fallback_models(self.models.fallback_models())
            .with_temperature(self.generation.temperature)
            .with_max_tokens(self.generation.max_tokens)
            .with_snippet_policy(self.context.to_policy())
            .with_stream_idle_timeout(Duration::from_secs(
                self.generation.stream_idle_timeout_secs.max(1),
            ))
    }

    /// Connection settings for the OpenRouter adapter.
    pub fn openrouter_config(&self) -> OpenRouterConfig {
        OpenRouterConfig {
            api_key: self.provider.api_key.clone(),
            base_url: self.provider.base_url.clone(),
            request_timeout: Duration::from_secs(self.provider.request_timeout_secs.max(1)),
            app_url: self.provider.app_url.clone(),
            app_title: self.provider.app_title.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vibe_domain::{Model, SnippetPolicy};

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[provider]
api_key = "sk-file"
base_url = "http://localhost:8080/v1"
request_timeout_secs = 30
app_title = "My Studio"

[models]
primary = "a/one"
fallbacks = ["b/two", "c/three"]

[generation]
temperature = 0.5
max_tokens = 4000
stream_idle_timeout_secs = 20

[context]
max_chars = 1000
head_keep = 600
tail_keep = 300

[logging]
conversation_log = "/tmp/vibe.jsonl"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_empty());
        assert_eq!(config.provider.api_key.as_deref(), Some("sk-file"));

        let params = config.generation_params();
        assert_eq!(params.primary_model, Some(Model::new("a/one").unwrap()));
        assert_eq!(params.fallback_models.len(), 2);
        assert_eq!(params.temperature, 0.5);
        assert_eq!(params.max_tokens, 4000);
        assert_eq!(params.snippet, SnippetPolicy::new(1000, 600, 300));
        assert_eq!(params.stream_idle_timeout, Duration::from_secs(20));

        let openrouter = config.openrouter_config();
        assert_eq!(openrouter.base_url, "http://localhost:8080/v1");
        assert_eq!(openrouter.request_timeout, Duration::from_secs(30));
        assert_eq!(openrouter.app_title.as_deref(), Some("My Studio"));
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = FileConfig::default();
        assert!(config.validate().is_empty());

        let params = config.generation_params();
        assert_eq!(params.list_models(), vec![Model::default()]);
        assert_eq!(params.temperature, 0.2);
        assert_eq!(params.max_tokens, 2000);
        assert_eq!(params.snippet, SnippetPolicy::default());
        assert_eq!(config.provider.base_url, "https://openrouter.ai/api/v1");
        assert!(!config.provider.has_api_key());
    }

    #[test]
    fn test_validate_collects_every_issue() {
        let mut config = FileConfig::default();
        config.provider.request_timeout_secs = 0;
        config.generation.temperature = 3.0;
        config.context.head_keep = 5000;

        let issues = config.validate();
        assert_eq!(issues.len(), 3);
        assert!(issues.contains(&ConfigValidationError::ZeroValue {
            field: "provider.request_timeout_secs"
        }));
        assert!(issues.contains(&ConfigValidationError::TemperatureOutOfRange(3.0)));
        assert!(matches!(
            issues.last(),
            Some(ConfigValidationError::SnippetTooLarge { head_keep: 5000, .. })
        ));
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: FileConfig = toml::from_str("[generation]\ntemperature = 0.9\n").unwrap();
        assert_eq!(config.generation.temperature, 0.9);
        assert_eq!(config.generation.max_tokens, 2000);
        assert_eq!(config.models.primary, Model::DEFAULT_PRIMARY);
    }
}
