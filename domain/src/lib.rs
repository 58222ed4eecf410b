//! Domain layer for vibe-coding
//!
//! This crate contains the core entities, value objects and pure policies.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Session
//!
//! A [`Session`] is a conversation plus its evolving artifact: the single-file
//! web page the user is describing. Every successful generation appends a
//! user/assistant [`Message`] pair and an immutable [`Version`] carrying the
//! full artifact and its diff against the previous version.
//!
//! ## Policies
//!
//! - [`SnippetPolicy`]: bounded head/tail snippet of the current artifact
//! - [`unified_diff`] / [`apply_unified_diff`]: line-based revision diffs
//! - [`extract_artifact`]: fenced code block extraction from model output
//! - [`classify_failure`]: permission-class heuristic for provider failures

pub mod artifact;
pub mod context;
pub mod core;
pub mod diff;
pub mod generation;
pub mod prompt;
pub mod provider;
pub mod session;
pub mod util;

// Re-export commonly used types
pub use artifact::{extract_artifact, find_fenced_block};
pub use context::SnippetPolicy;
pub use core::{error::DomainError, model::Model};
pub use diff::{apply_unified_diff, unified_diff, unified_diff_named};
pub use generation::{
    event::{EventSequence, GenerationEvent},
    value_objects::GenerationResult,
};
pub use prompt::PromptTemplate;
pub use provider::{FailureClass, ProviderFailure, classify_failure};
pub use session::{
    entities::{Message, Role, Session, Version, VersionOrigin},
    stream::StreamEvent,
};
