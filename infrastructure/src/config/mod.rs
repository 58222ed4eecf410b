//! Configuration file loading for vibe-coding
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `VIBE_*` environment variables
//! 2. Flat environment variables (`OPENROUTER_API_KEY`, `MODEL`, `FALLBACK_MODELS`, ...)
//! 3. `--config <path>` specified file
//! 4. Project root: `./vibe.toml` or `./.vibe.toml`
//! 5. Global: `$XDG_CONFIG_HOME/vibe-coding/config.toml`
//! 6. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileContextConfig, FileGenerationConfig,
    FileLoggingConfig, FileModelList, FileModelsConfig, FileProviderConfig,
};
pub use loader::{ConfigLoader, ENV_PREFIX, LEGACY_ENV_VARS, legacy_env_key};
