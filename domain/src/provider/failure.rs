//! Classification of upstream provider failures.
//!
//! Providers rarely return structured error codes for access restrictions,
//! so permission-class failures are recognized by a fixed keyword set
//! matched case-insensitively against the failure's category and message.
//! This is a heuristic: it should be replaced by code-based matching once
//! providers expose stable error codes for region and entitlement denials.

use serde::{Deserialize, Serialize};

/// Keywords that mark a failure as permission-class.
pub const PERMISSION_KEYWORDS: [&str; 5] = [
    "permission",
    "forbidden",
    "unsupported_country",
    "region",
    "territory",
];

/// How a provider failure affects model selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Access, region or entitlement restriction. The next model may work.
    Permission,
    /// A genuine request or service error. Never retried.
    Other,
}

impl FailureClass {
    pub fn is_permission(&self) -> bool {
        matches!(self, FailureClass::Permission)
    }
}

/// Classify a failure by its category (error type/code) and message.
pub fn classify_failure(category: &str, message: &str) -> FailureClass {
    let category = category.to_lowercase();
    let message = message.to_lowercase();
    let hit = PERMISSION_KEYWORDS
        .iter()
        .any(|k| category.contains(k) || message.contains(k));
    if hit {
        FailureClass::Permission
    } else {
        FailureClass::Other
    }
}

/// A failure reported by the upstream provider, e.g. mid-stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderFailure {
    /// Error type or code (e.g. `forbidden`, `rate_limit_exceeded`).
    pub category: String,
    pub message: String,
}

impl ProviderFailure {
    pub fn new(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            message: message.into(),
        }
    }

    pub fn class(&self) -> FailureClass {
        classify_failure(&self.category, &self.message)
    }
}

impl std::fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.category, self.message)
    }
}
