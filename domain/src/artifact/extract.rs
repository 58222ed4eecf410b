//! Fenced code block extraction.

use regex::Regex;
use std::sync::OnceLock;

/// First fenced block, untagged or tagged `html`.
fn fence_pattern() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)```(?i:html)?[ \t]*\r?\n(.*?)```").expect("fence pattern is valid")
    })
}

/// Inner content of the first fenced code block, trimmed.
///
/// Returns `None` when the text has no complete fenced block.
pub fn find_fenced_block(raw: &str) -> Option<&str> {
    fence_pattern()
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

/// Extract the artifact from a model reply.
///
/// Falls back to the whole reply, verbatim, when no fenced block exists.
pub fn extract_artifact(raw: &str) -> String {
    find_fenced_block(raw).unwrap_or(raw).to_string()
}
