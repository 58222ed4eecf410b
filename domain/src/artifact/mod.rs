//! Artifact extraction from free-form model output.

mod extract;

pub use extract::{extract_artifact, find_fenced_block};
