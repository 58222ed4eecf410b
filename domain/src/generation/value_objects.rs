//! Generation value objects

use crate::core::model::Model;
use serde::{Deserialize, Serialize};

/// Committed outcome of one generation turn (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Assistant reply shown to the user.
    pub assistant_text: String,
    /// Assistant reply exactly as received. Identical to `assistant_text` today.
    pub assistant_text_raw: String,
    pub artifact: String,
    pub diff: String,
    /// Number of the version record appended for this turn.
    pub version: u64,
    /// Model that produced the reply.
    pub model: Model,
    /// Models tried, in order, ending with `model`.
    pub attempted_models: Vec<Model>,
}

impl GenerationResult {
    /// Returns true if the artifact did not change.
    pub fn is_unchanged(&self) -> bool {
        self.diff.is_empty()
    }
}
