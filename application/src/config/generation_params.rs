//! Generation parameters: model priority, sampling, context policy.
//!
//! [`GenerationParams`] groups the values the generation use case consumes.
//! How they are loaded (files, environment) is an infrastructure concern.

use std::time::Duration;
use vibe_domain::{Model, SnippetPolicy};

/// Parameters for one generation turn.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    /// Tried first. `None` when nothing is configured.
    pub primary_model: Option<Model>,
    /// Tried in order after the primary, on permission-class failures only.
    pub fallback_models: Vec<Model>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub snippet: SnippetPolicy,
    /// Longest allowed gap between two upstream stream events.
    pub stream_idle_timeout: Duration,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            primary_model: Some(Model::default()),
            fallback_models: Vec::new(),
            temperature: 0.2,
            max_tokens: 2000,
            snippet: SnippetPolicy::default(),
            stream_idle_timeout: Duration::from_secs(60),
        }
    }
}

impl GenerationParams {
    // ==================== Builder Methods ====================

    pub fn with_primary_model(mut self, model: Option<Model>) -> Self {
        self.primary_model = model;
        self
    }

    pub fn with_fallback_models(mut self, models: Vec<Model>) -> Self {
        self.fallback_models = models;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_snippet_policy(mut self, snippet: SnippetPolicy) -> Self {
        self.snippet = snippet;
        self
    }

    pub fn with_stream_idle_timeout(mut self, timeout: Duration) -> Self {
        self.stream_idle_timeout = timeout;
        self
    }

    /// Primary first, then fallbacks in order, without duplicates.
    ///
    /// Empty when no model is configured at all.
    pub fn list_models(&self) -> Vec<Model> {
        let mut models: Vec<Model> = Vec::new();
        for model in self.primary_model.iter().chain(&self.fallback_models) {
            if !models.contains(model) {
                models.push(model.clone());
            }
        }
        models
    }
}
