//! Model selection from TOML (`[models]` section)

use super::ConfigValidationError;
use serde::{Deserialize, Serialize};
use vibe_domain::Model;

/// A model list written either as a TOML array or as one comma-separated
/// string (the form the `FALLBACK_MODELS` variable uses).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileModelList {
    List(Vec<String>),
    Csv(String),
}

impl Default for FileModelList {
    fn default() -> Self {
        FileModelList::List(Vec::new())
    }
}

impl FileModelList {
    /// Entries in order, trimmed. Empty entries are kept so they can be
    /// reported.
    pub fn entries(&self) -> Vec<String> {
        match self {
            FileModelList::List(items) => items.iter().map(|s| s.trim().to_string()).collect(),
            FileModelList::Csv(s) if s.trim().is_empty() => Vec::new(),
            FileModelList::Csv(s) => s.split(',').map(|p| p.trim().to_string()).collect(),
        }
    }
}

/// Model priority from TOML
///
/// # Example
///
/// ```toml
/// [models]
/// primary = "deepseek/deepseek-chat-v3-0324"
/// fallbacks = ["qwen/qwen-2.5-coder-32b-instruct", "meta-llama/llama-3.3-70b-instruct"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelsConfig {
    /// Tried first. An empty string means "no primary model".
    pub primary: String,
    /// Tried in order when the previous model is denied access.
    pub fallbacks: FileModelList,
}

impl Default for FileModelsConfig {
    fn default() -> Self {
        Self {
            primary: Model::DEFAULT_PRIMARY.to_string(),
            fallbacks: FileModelList::default(),
        }
    }
}

impl FileModelsConfig {
    pub fn primary_model(&self) -> Option<Model> {
        Model::new(self.primary.as_str()).ok()
    }

    /// Fallback models, skipping empty entries.
    pub fn fallback_models(&self) -> Vec<Model> {
        self.fallbacks
            .entries()
            .into_iter()
            .filter_map(|id| Model::new(id).ok())
            .collect()
    }

    pub(super) fn validate(&self, issues: &mut Vec<ConfigValidationError>) {
        for (i, entry) in self.fallbacks.entries().iter().enumerate() {
            if entry.is_empty() {
                issues.push(ConfigValidationError::EmptyModelName {
                    field: format!("models.fallbacks[{i}]"),
                });
            }
        }
        if self.primary.trim().is_empty() && self.fallback_models().is_empty() {
            issues.push(ConfigValidationError::NoModelConfigured);
        }
    }
}
