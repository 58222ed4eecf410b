//! Sampling, context and logging settings from TOML
//! (`[generation]`, `[context]`, `[logging]` sections)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use vibe_domain::SnippetPolicy;

/// `[generation]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGenerationConfig {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Longest gap between two streamed events before the stream counts as
    /// stalled, in seconds.
    pub stream_idle_timeout_secs: u64,
}

impl Default for FileGenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 2000,
            stream_idle_timeout_secs: 60,
        }
    }
}

/// `[context]`: how much of the current artifact goes into the prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileContextConfig {
    pub max_chars: usize,
    pub head_keep: usize,
    pub tail_keep: usize,
}

impl Default for FileContextConfig {
    fn default() -> Self {
        Self {
            max_chars: SnippetPolicy::DEFAULT_MAX_CHARS,
            head_keep: SnippetPolicy::DEFAULT_HEAD_KEEP,
            tail_keep: SnippetPolicy::DEFAULT_TAIL_KEEP,
        }
    }
}

impl FileContextConfig {
    pub fn to_policy(&self) -> SnippetPolicy {
        SnippetPolicy::new(self.max_chars, self.head_keep, self.tail_keep)
    }
}

/// `[logging]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL conversation transcript. Disabled when unset.
    pub conversation_log: Option<PathBuf>,
}
