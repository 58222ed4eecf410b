//! Progress display for streamed generations

pub mod reporter;

pub use reporter::{StreamReporter, drive_stream, interrupt_signal};
