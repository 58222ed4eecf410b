//! Provider failure domain.
//!
//! - [`failure::ProviderFailure`]: a provider-reported failure (category + message)
//! - [`failure::classify_failure`]: the permission-class heuristic

pub mod failure;

pub use failure::{FailureClass, PERMISSION_KEYWORDS, ProviderFailure, classify_failure};
