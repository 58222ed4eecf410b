//! Presentation layer for vibe-coding
//!
//! This crate contains CLI definitions, output formatters,
//! streaming progress display, and the interactive chat interface.

pub mod chat;
pub mod cli;
pub mod config;
pub mod output;
pub mod progress;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use chat::{ChatRepl, CommandOutcome, ReplCommand};
pub use cli::{Cli, OutputFormat};
pub use config::ReplConfig;
pub use output::ConsoleFormatter;
pub use progress::{StreamReporter, drive_stream, interrupt_signal};
