//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid model: {0:?}")]
    InvalidModel(String),

    #[error("Malformed diff at line {line}: {reason}")]
    MalformedDiff { line: usize, reason: String },

    #[error("Diff does not apply: expected {expected:?} at line {line}, found {found:?}")]
    PatchMismatch {
        line: usize,
        expected: String,
        found: String,
    },
}

impl DomainError {
    /// Check if this error came from applying a diff
    pub fn is_patch_error(&self) -> bool {
        matches!(
            self,
            DomainError::MalformedDiff { .. } | DomainError::PatchMismatch { .. }
        )
    }
}
