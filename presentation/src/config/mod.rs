//! Presentation-level configuration
//!
//! Settings for the interactive REPL.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// REPL configuration for the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplConfig {
    /// Show the spinner and stream tokens while generating
    pub show_progress: bool,
    /// Stream replies token by token; otherwise wait for the full reply
    pub stream: bool,
    /// Path to history file; `None` disables history
    pub history_file: Option<PathBuf>,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            show_progress: true,
            stream: true,
            history_file: Self::default_history_path(),
        }
    }
}

impl ReplConfig {
    /// `$XDG_DATA_HOME/vibe-coding/history.txt`
    pub fn default_history_path() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join("vibe-coding").join("history.txt"))
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn without_history(mut self) -> Self {
        self.history_file = None;
        self
    }
}
