//! Unified diff generation.

/// File name used in the `a/` and `b/` headers by default.
pub const DEFAULT_FILENAME: &str = "index.html";

/// Unchanged lines kept around each change.
pub const DEFAULT_CONTEXT_LINES: usize = 3;

/// Marker following a line that has no trailing newline.
pub const NO_NEWLINE_MARKER: &str = "\\ No newline at end of file";

/// Unified diff of `old` → `new` with the default `index.html` headers.
///
/// Absent revisions are treated as empty. Identical inputs produce `""`.
pub fn unified_diff(old: Option<&str>, new: Option<&str>) -> String {
    unified_diff_named(old, new, DEFAULT_FILENAME)
}

/// Unified diff of `old` → `new` with `a/<filename>` / `b/<filename>` headers.
pub fn unified_diff_named(old: Option<&str>, new: Option<&str>, filename: &str) -> String {
    let old = old.unwrap_or("");
    let new = new.unwrap_or("");
    if old == new {
        return String::new();
    }

    let old_lines = split_lines(old);
    let new_lines = split_lines(new);
    let ops = compute_edit_ops(&old_lines, &new_lines);

    let mut out = vec![format!("--- a/{filename}"), format!("+++ b/{filename}")];
    format_hunks(&old_lines, &new_lines, &ops, DEFAULT_CONTEXT_LINES, &mut out);
    out.join("\n")
}

/// Split into lines, keeping each line's `\n` terminator.
pub(super) fn split_lines(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}

/// Edit operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditOp {
    Equal(usize, usize), // old_idx, new_idx
    Delete(usize),       // old_idx
    Insert(usize),       // new_idx
}

impl EditOp {
    fn is_equal(&self) -> bool {
        matches!(self, EditOp::Equal(..))
    }
}

/// Compute a shortest edit script with Myers' divide-and-conquer search.
///
/// Each split point is found with a bidirectional sweep over two diagonal
/// vectors, so memory stays linear in the input; time is `O((N + M) * D)`
/// for `D` differing lines.
fn compute_edit_ops(old: &[&str], new: &[&str]) -> Vec<EditOp> {
    let mut myers = Myers {
        old,
        new,
        ops: Vec::with_capacity(old.len().max(new.len())),
    };
    myers.conquer(0, old.len(), 0, new.len());

    let mut ops = myers.ops;
    order_deletes_first(&mut ops);
    ops
}

struct Myers<'a> {
    old: &'a [&'a str],
    new: &'a [&'a str],
    ops: Vec<EditOp>,
}

impl Myers<'_> {
    /// Append the edit script for `old[old_lo..old_hi]` → `new[new_lo..new_hi]`.
    fn conquer(&mut self, mut old_lo: usize, old_hi: usize, mut new_lo: usize, new_hi: usize) {
        while old_lo < old_hi && new_lo < new_hi && self.old[old_lo] == self.new[new_lo] {
            self.ops.push(EditOp::Equal(old_lo, new_lo));
            old_lo += 1;
            new_lo += 1;
        }
        let suffix = self.old[old_lo..old_hi]
            .iter()
            .rev()
            .zip(self.new[new_lo..new_hi].iter().rev())
            .take_while(|(a, b)| a == b)
            .count();
        let (old_mid, new_mid) = (old_hi - suffix, new_hi - suffix);

        if old_lo == old_mid {
            self.ops.extend((new_lo..new_mid).map(EditOp::Insert));
        } else if new_lo == new_mid {
            self.ops.extend((old_lo..old_mid).map(EditOp::Delete));
        } else {
            match self.middle_snake(old_lo, old_mid, new_lo, new_mid) {
                Some((x, y)) => {
                    self.conquer(old_lo, x, new_lo, y);
                    self.conquer(x, old_mid, y, new_mid);
                }
                None => {
                    self.ops.extend((old_lo..old_mid).map(EditOp::Delete));
                    self.ops.extend((new_lo..new_mid).map(EditOp::Insert));
                }
            }
        }

        self.ops
            .extend((0..suffix).map(|k| EditOp::Equal(old_mid + k, new_mid + k)));
    }

    /// Split point of an optimal path through a non-empty region whose
    /// first and last lines differ, or `None` when nothing matches.
    fn middle_snake(
        &self,
        old_lo: usize,
        old_hi: usize,
        new_lo: usize,
        new_hi: usize,
    ) -> Option<(usize, usize)> {
        let old = &self.old[old_lo..old_hi];
        let new = &self.new[new_lo..new_hi];
        let (n, m) = (old.len() as isize, new.len() as isize);

        let max_d = (n + m + 1) / 2;
        let offset = max_d;
        let len = (2 * max_d + 2) as usize;
        // Furthest x reached on each diagonal, from the front and from the back
        let mut forward = vec![-1isize; len];
        let mut backward = vec![-1isize; len];
        forward[(offset + 1) as usize] = 0;
        backward[(offset + 1) as usize] = 0;

        let delta = n - m;
        let front_checks = delta % 2 != 0;
        let (mut k1_start, mut k1_end, mut k2_start, mut k2_end) = (0, 0, 0, 0);

        for d in 0..max_d {
            let mut k1 = -d + k1_start;
            while k1 <= d - k1_end {
                let k1_at = (offset + k1) as usize;
                let from_above =
                    k1 == -d || (k1 != d && forward[k1_at - 1] < forward[k1_at + 1]);
                let mut x1 = if from_above {
                    forward[k1_at + 1]
                } else {
                    forward[k1_at - 1] + 1
                };
                let mut y1 = x1 - k1;
                while x1 < n && y1 < m && old[x1 as usize] == new[y1 as usize] {
                    x1 += 1;
                    y1 += 1;
                }
                forward[k1_at] = x1;

                if x1 > n {
                    k1_end += 2;
                } else if y1 > m {
                    k1_start += 2;
                } else if front_checks {
                    let k2_at = offset + delta - k1;
                    if (0..len as isize).contains(&k2_at) && backward[k2_at as usize] != -1 {
                        let x2 = n - backward[k2_at as usize];
                        if x1 >= x2 {
                            return Some((old_lo + x1 as usize, new_lo + y1 as usize));
                        }
                    }
                }
                k1 += 2;
            }

            let mut k2 = -d + k2_start;
            while k2 <= d - k2_end {
                let k2_at = (offset + k2) as usize;
                let from_above =
                    k2 == -d || (k2 != d && backward[k2_at - 1] < backward[k2_at + 1]);
                let mut x2 = if from_above {
                    backward[k2_at + 1]
                } else {
                    backward[k2_at - 1] + 1
                };
                let mut y2 = x2 - k2;
                while x2 < n
                    && y2 < m
                    && old[(n - x2 - 1) as usize] == new[(m - y2 - 1) as usize]
                {
                    x2 += 1;
                    y2 += 1;
                }
                backward[k2_at] = x2;

                if x2 > n {
                    k2_end += 2;
                } else if y2 > m {
                    k2_start += 2;
                } else if !front_checks {
                    let k1_at = offset + delta - k2;
                    if (0..len as isize).contains(&k1_at) && forward[k1_at as usize] != -1 {
                        let x1 = forward[k1_at as usize];
                        let y1 = offset + x1 - k1_at;
                        if x1 >= n - x2 {
                            return Some((old_lo + x1 as usize, new_lo + y1 as usize));
                        }
                    }
                }
                k2 += 2;
            }
        }

        None
    }
}

/// Within every contiguous change run, place deletions before insertions.
fn order_deletes_first(ops: &mut [EditOp]) {
    let mut start = 0;
    while start < ops.len() {
        if ops[start].is_equal() {
            start += 1;
            continue;
        }
        let end = ops[start..]
            .iter()
            .position(EditOp::is_equal)
            .map_or(ops.len(), |p| start + p);
        ops[start..end].sort_by_key(|op| match op {
            EditOp::Delete(i) => (0, *i),
            EditOp::Insert(j) => (1, *j),
            EditOp::Equal(..) => (2, 0),
        });
        start = end;
    }
}

/// Change runs as `[start, end)` ranges into `ops`.
fn change_runs(ops: &[EditOp]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut i = 0;
    while i < ops.len() {
        if ops[i].is_equal() {
            i += 1;
            continue;
        }
        let start = i;
        while i < ops.len() && !ops[i].is_equal() {
            i += 1;
        }
        runs.push((start, i));
    }
    runs
}

/// Format a hunk range the way `diff -u` does.
fn format_range(start: usize, len: usize) -> String {
    match len {
        0 => format!("{start},0"),
        1 => format!("{}", start + 1),
        _ => format!("{},{len}", start + 1),
    }
}

/// Format edit operations into unified diff hunks.
///
/// Changes separated by at most `2 * context` unchanged lines share a hunk.
fn format_hunks(
    old: &[&str],
    new: &[&str],
    ops: &[EditOp],
    context: usize,
    out: &mut Vec<String>,
) {
    // positions[k] = (old lines, new lines) consumed before ops[k]
    let mut positions = Vec::with_capacity(ops.len() + 1);
    let (mut o, mut n) = (0usize, 0usize);
    for op in ops {
        positions.push((o, n));
        match op {
            EditOp::Equal(..) => {
                o += 1;
                n += 1;
            }
            EditOp::Delete(_) => o += 1,
            EditOp::Insert(_) => n += 1,
        }
    }
    positions.push((o, n));

    let mut groups: Vec<(usize, usize)> = Vec::new();
    for (start, end) in change_runs(ops) {
        let merge = groups
            .last()
            .is_some_and(|last| start - last.1 <= 2 * context);
        if merge && let Some(last) = groups.last_mut() {
            last.1 = end;
        } else {
            groups.push((start, end));
        }
    }

    for (start, end) in groups {
        let lo = start.saturating_sub(context);
        let hi = (end + context).min(ops.len());
        let (old_start, new_start) = positions[lo];
        let (old_end, new_end) = positions[hi];

        out.push(format!(
            "@@ -{} +{} @@",
            format_range(old_start, old_end - old_start),
            format_range(new_start, new_end - new_start)
        ));

        for op in &ops[lo..hi] {
            let (prefix, line) = match *op {
                EditOp::Equal(oi, _) => (' ', old[oi]),
                EditOp::Delete(oi) => ('-', old[oi]),
                EditOp::Insert(ni) => ('+', new[ni]),
            };
            match line.strip_suffix('\n') {
                Some(body) => out.push(format!("{prefix}{body}")),
                None => {
                    out.push(format!("{prefix}{line}"));
                    out.push(NO_NEWLINE_MARKER.to_string());
                }
            }
        }
    }
}
