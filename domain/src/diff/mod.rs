//! Diff engine for artifact revisions.
//!
//! - [`unified_diff`]: line-based unified diff between two revisions
//! - [`apply_unified_diff`]: re-apply a produced diff to the old revision
//!
//! Output follows the usual unified format:
//!
//! ```text
//! --- a/index.html
//! +++ b/index.html
//! @@ -start,count +start,count @@
//!  context line
//! -removed line
//! +added line
//! ```
//!
//! Lines are joined with `\n` and the text has no trailing terminator. A
//! line without a final newline is followed by `\ No newline at end of file`.

mod patch;
mod unified;

pub use patch::apply_unified_diff;
pub use unified::{DEFAULT_CONTEXT_LINES, DEFAULT_FILENAME, NO_NEWLINE_MARKER, unified_diff, unified_diff_named};
