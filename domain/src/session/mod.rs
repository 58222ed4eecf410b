//! Session domain.
//!
//! - [`entities::Session`]: a conversation plus its artifact and version log
//! - [`entities::Message`]: a single message within a session
//! - [`entities::Version`]: an immutable artifact snapshot with its diff
//! - [`stream::StreamEvent`]: incremental provider output

pub mod entities;
pub mod stream;
