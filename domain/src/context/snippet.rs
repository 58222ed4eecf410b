//! Head/tail snippet policy for the existing artifact.

use serde::{Deserialize, Serialize};

/// Bounds on how much of the current artifact is placed into a prompt.
///
/// Lengths are counted in `char`s. Artifacts up to `max_chars` are passed
/// through unchanged; longer ones keep `head_keep` leading and `tail_keep`
/// trailing characters around a [`truncation_marker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetPolicy {
    pub max_chars: usize,
    pub head_keep: usize,
    pub tail_keep: usize,
}

impl SnippetPolicy {
    pub const DEFAULT_MAX_CHARS: usize = 6000;
    pub const DEFAULT_HEAD_KEEP: usize = 3500;
    pub const DEFAULT_TAIL_KEEP: usize = 1800;

    pub fn new(max_chars: usize, head_keep: usize, tail_keep: usize) -> Self {
        Self {
            max_chars,
            head_keep,
            tail_keep,
        }
    }

    /// Build the prompt snippet for `current_artifact`.
    ///
    /// `_user_message` is accepted for targeted extraction later on; the
    /// head/tail cut does not look at it yet.
    pub fn build_snippet(&self, current_artifact: Option<&str>, _user_message: &str) -> String {
        let Some(artifact) = current_artifact else {
            return String::new();
        };

        let total = artifact.chars().count();
        if total <= self.max_chars || self.head_keep + self.tail_keep >= total {
            return artifact.to_string();
        }

        let head_end = byte_offset(artifact, self.head_keep);
        let tail_start = byte_offset(artifact, total - self.tail_keep);
        let omitted = total - self.head_keep - self.tail_keep;

        let mut snippet = String::with_capacity(head_end + (artifact.len() - tail_start) + 128);
        snippet.push_str(&artifact[..head_end]);
        snippet.push_str(&truncation_marker(omitted));
        snippet.push_str(&artifact[tail_start..]);
        snippet
    }
}

impl Default for SnippetPolicy {
    fn default() -> Self {
        Self {
            max_chars: Self::DEFAULT_MAX_CHARS,
            head_keep: Self::DEFAULT_HEAD_KEEP,
            tail_keep: Self::DEFAULT_TAIL_KEEP,
        }
    }
}

/// Comment placed where the middle of the artifact was cut out.
pub fn truncation_marker(omitted: usize) -> String {
    format!(
        "\n<!-- TRUNCATED {omitted} chars omitted for context. Model: preserve unchanged middle sections. -->\n"
    )
}

/// Byte offset of the `n`-th char (or the string length).
fn byte_offset(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map_or(s.len(), |(i, _)| i)
}
