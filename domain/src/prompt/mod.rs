//! Prompt domain
//!
//! Templates for the system instructions and the per-turn user prompt.

mod template;

pub use template::PromptTemplate;
