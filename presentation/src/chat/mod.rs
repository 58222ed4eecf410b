//! Interactive chat module
//!
//! Provides a readline-based interactive chat over one session, with slash
//! commands to inspect, save and reset the page being built.

mod repl;

pub use repl::{ChatRepl, CommandOutcome, ReplCommand};
