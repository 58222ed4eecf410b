//! Applying a unified diff produced by [`unified_diff`](super::unified_diff).

use super::unified::{NO_NEWLINE_MARKER, split_lines};
use crate::core::error::DomainError;

/// Reconstruct the new revision from `old` and a diff of `old` → new.
///
/// An empty diff returns `old` unchanged. Context and removed lines are
/// checked against `old`; any disagreement is a [`DomainError::PatchMismatch`].
pub fn apply_unified_diff(old: &str, diff: &str) -> Result<String, DomainError> {
    if diff.is_empty() {
        return Ok(old.to_string());
    }

    let old_lines = split_lines(old);
    let diff_lines: Vec<&str> = diff.split('\n').collect();
    let mut out = String::with_capacity(old.len());
    let mut cursor = 0usize; // next unconsumed old line
    let mut idx = 0usize;

    for expected in ["--- ", "+++ "] {
        match diff_lines.get(idx) {
            Some(line) if line.starts_with(expected) => idx += 1,
            _ => {
                return Err(DomainError::MalformedDiff {
                    line: idx + 1,
                    reason: format!("expected header starting with {expected:?}"),
                });
            }
        }
    }

    while idx < diff_lines.len() {
        let header = diff_lines[idx];
        let old_start = parse_hunk_header(header).ok_or_else(|| DomainError::MalformedDiff {
            line: idx + 1,
            reason: format!("invalid hunk header {header:?}"),
        })?;
        idx += 1;

        if old_start < cursor || old_start > old_lines.len() {
            return Err(DomainError::MalformedDiff {
                line: idx,
                reason: format!("hunk starts at old line {} out of order", old_start + 1),
            });
        }
        for line in &old_lines[cursor..old_start] {
            out.push_str(line);
        }
        cursor = old_start;

        let mut last_prefix = None;
        while idx < diff_lines.len() && !diff_lines[idx].starts_with("@@") {
            let line = diff_lines[idx];
            let diff_line_no = idx + 1;
            idx += 1;

            if line == NO_NEWLINE_MARKER {
                if last_prefix == Some('+') && out.ends_with('\n') {
                    out.pop();
                }
                continue;
            }

            let mut chars = line.chars();
            let prefix = chars.next().ok_or_else(|| DomainError::MalformedDiff {
                line: diff_line_no,
                reason: "empty hunk line".to_string(),
            })?;
            let body = chars.as_str();

            match prefix {
                ' ' | '-' => {
                    let found = old_lines.get(cursor).copied().unwrap_or("");
                    if found.strip_suffix('\n').unwrap_or(found) != body {
                        return Err(DomainError::PatchMismatch {
                            line: cursor + 1,
                            expected: body.to_string(),
                            found: found.trim_end_matches('\n').to_string(),
                        });
                    }
                    if prefix == ' ' {
                        out.push_str(found);
                    }
                    cursor += 1;
                }
                '+' => {
                    out.push_str(body);
                    out.push('\n');
                }
                other => {
                    return Err(DomainError::MalformedDiff {
                        line: diff_line_no,
                        reason: format!("unexpected line prefix {other:?}"),
                    });
                }
            }
            last_prefix = Some(prefix);
        }
    }

    for line in &old_lines[cursor..] {
        out.push_str(line);
    }
    Ok(out)
}

/// Parse `@@ -a[,b] +c[,d] @@` and return the 0-based old start line.
fn parse_hunk_header(header: &str) -> Option<usize> {
    let rest = header.strip_prefix("@@ -")?;
    let (old_range, rest) = rest.split_once(' ')?;
    if !rest.starts_with('+') || !rest.ends_with("@@") {
        return None;
    }
    let (start, len) = match old_range.split_once(',') {
        Some((s, l)) => (s.parse::<usize>().ok()?, l.parse::<usize>().ok()?),
        None => (old_range.parse::<usize>().ok()?, 1),
    };
    if len == 0 {
        Some(start)
    } else {
        start.checked_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::unified_diff;

    fn assert_round_trip(old: &str, new: &str) {
        let diff = unified_diff(Some(old), Some(new));
        let rebuilt = apply_unified_diff(old, &diff).unwrap();
        assert_eq!(rebuilt, new, "diff was:\n{diff}");
    }

    #[test]
    fn round_trip_reconstructs_new_revision() {
        assert_round_trip("", "<html>\n<body></body>\n</html>\n");
        assert_round_trip("<html>\n<body></body>\n</html>\n", "");
        assert_round_trip(
            "<html>\n<body></body>\n</html>\n",
            "<html>\n<body>Hi</body>\n</html>\n",
        );
        assert_round_trip("a\nb\nc", "a\nb\nc\n");
        assert_round_trip("a\nb\nc\n", "a\nB\nc");
        assert_round_trip("no newline", "still no newline");
    }

    #[test]
    fn round_trip_with_multiple_hunks() {
        let old: String = (1..=40).map(|i| format!("<li>{i}</li>\n")).collect();
        let new = old
            .replace("<li>3</li>\n", "")
            .replace("<li>20</li>\n", "<li>twenty</li>\n<li>20b</li>\n")
            .replace("<li>39</li>\n", "<li>39</li>\n<li>39.5</li>\n");
        assert_round_trip(&old, &new);
    }

    #[test]
    fn round_trip_with_interleaved_edits() {
        let old: String = (0..300).map(|i| format!("<p>{}</p>\n", i % 7)).collect();
        let new: String = (0..280)
            .filter(|i| i % 11 != 0)
            .map(|i| format!("<p>{}</p>\n", (i * 3) % 5))
            .collect();
        assert_round_trip(&old, &new);
        assert_round_trip(&new, &old);
    }

    #[test]
    fn round_trip_full_rewrite() {
        let old: String = (0..2_000).map(|i| format!("<td>old {i}</td>\n")).collect();
        let new: String = (0..2_500).map(|i| format!("<td>new {i}</td>\n")).collect();
        assert_round_trip(&old, &new);
    }

    #[test]
    fn empty_diff_returns_old() {
        assert_eq!(apply_unified_diff("same", "").unwrap(), "same");
    }

    #[test]
    fn mismatched_context_is_rejected() {
        let diff = unified_diff(Some("a\nb\n"), Some("a\nc\n"));
        let err = apply_unified_diff("x\nb\n", &diff).unwrap_err();
        assert!(matches!(err, DomainError::PatchMismatch { line: 1, .. }));
    }

    #[test]
    fn missing_headers_are_malformed() {
        let err = apply_unified_diff("a\n", "@@ -1 +1 @@\n-a\n+b").unwrap_err();
        assert!(matches!(err, DomainError::MalformedDiff { line: 1, .. }));
    }

    #[test]
    fn hunk_header_parsing() {
        assert_eq!(parse_hunk_header("@@ -0,0 +1,2 @@"), Some(0));
        assert_eq!(parse_hunk_header("@@ -1 +1 @@"), Some(0));
        assert_eq!(parse_hunk_header("@@ -15,6 +15,6 @@"), Some(14));
        assert_eq!(parse_hunk_header("@@ nonsense"), None);
    }
}
