//! Context module for prompt-size control.
//!
//! The current artifact is placed into every generation prompt. Large
//! artifacts are compressed into a bounded [`SnippetPolicy`] snippet first:
//! a deterministic head + marker + tail cut, never a summary.

pub mod snippet;

pub use snippet::{SnippetPolicy, truncation_marker};
