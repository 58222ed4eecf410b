//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// What to print once a generation has been committed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Only the generated artifact
    #[default]
    Artifact,
    /// Unified diff against the previous artifact
    Diff,
    /// Assistant reply, diff and version summary
    Full,
    /// The committed result as JSON
    Json,
}

/// CLI arguments for vibe-coding
#[derive(Parser, Debug)]
#[command(name = "vibe-coding")]
#[command(author, version, about = "Describe a web page, get a single HTML file back")]
#[command(long_about = r#"
vibe-coding turns a plain-language description into a single self-contained
HTML file, then keeps refining it as you describe changes.

Every generation is sent to the primary model first. If the provider refuses
the request for permission reasons (region, policy, forbidden) the next
fallback model is tried.

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./vibe.toml         Project-level config
3. ~/.config/vibe-coding/config.toml   Global config

Example:
  vibe-coding "a landing page for a coffee shop" --out index.html
  vibe-coding -m openai/gpt-4o-mini --fallback mistralai/mistral-small "a todo list"
  vibe-coding --chat
"#)]
pub struct Cli {
    /// What to build (not required in chat mode)
    pub message: Option<String>,

    /// Start interactive chat mode
    #[arg(short, long)]
    pub chat: bool,

    /// Write the generated artifact to this file
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Wait for the full reply instead of streaming tokens
    #[arg(long)]
    pub no_stream: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "artifact")]
    pub output: OutputFormat,

    /// Primary model (overrides configuration)
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Fallback models, tried in order (can be specified multiple times)
    #[arg(long = "fallback", value_name = "MODEL")]
    pub fallbacks: Vec<String>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators and streamed tokens
    #[arg(short, long)]
    pub quiet: bool,

    /// Write diagnostic logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

impl Cli {
    /// Default filter directive for the given `-v` count.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
