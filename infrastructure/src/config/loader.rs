//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// Project-level config file names, checked in order.
const PROJECT_FILES: [&str; 2] = ["vibe.toml", ".vibe.toml"];

/// Flat environment variable names and the config keys they set.
pub const LEGACY_ENV_VARS: [(&str, &str); 6] = [
    ("OPENROUTER_API_KEY", "provider.api_key"),
    ("OPENROUTER_BASE_URL", "provider.base_url"),
    ("MODEL", "models.primary"),
    ("FALLBACK_MODELS", "models.fallbacks"),
    ("TEMPERATURE", "generation.temperature"),
    ("GENERATION_MAX_TOKENS", "generation.max_tokens"),
];

/// Prefix for nested environment overrides, e.g. `VIBE_MODELS__PRIMARY`.
pub const ENV_PREFIX: &str = "VIBE_";

/// Config key for a flat environment variable name.
pub fn legacy_env_key(name: &str) -> Option<&'static str> {
    LEGACY_ENV_VARS
        .iter()
        .find(|(var, _)| var.eq_ignore_ascii_case(name))
        .map(|(_, key)| *key)
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `VIBE_`-prefixed environment variables (`VIBE_GENERATION__MAX_TOKENS`)
    /// 2. Flat environment variables (`OPENROUTER_API_KEY`, `MODEL`, ...)
    /// 3. Explicit config path (if provided)
    /// 4. Project root: `./vibe.toml` or `./.vibe.toml`
    /// 5. Global: `$XDG_CONFIG_HOME/vibe-coding/config.toml`
    /// 6. Default values
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, Box<figment::Error>> {
        Self::file_figment(config_path)
            .merge(Self::legacy_env())
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)
    }

    /// Load defaults and files only, ignoring the environment.
    pub fn load_files(config_path: Option<&Path>) -> Result<FileConfig, Box<figment::Error>> {
        Self::file_figment(config_path).extract().map_err(Box::new)
    }

    /// Load only default configuration
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Defaults plus environment, skipping every file (for --no-config)
    pub fn load_env_only() -> Result<FileConfig, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(FileConfig::default()))
            .merge(Self::legacy_env())
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)
    }

    fn file_figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment
    }

    fn legacy_env() -> Env {
        let names: Vec<&str> = LEGACY_ENV_VARS.iter().map(|(var, _)| *var).collect();
        Env::raw()
            .only(&names)
            .map(|key| legacy_env_key(key.as_str()).unwrap_or(key.as_str()).into())
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/vibe-coding/config.toml if set,
    /// otherwise the platform config directory.
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("vibe-coding").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Print the config file locations being used (for debugging)
    pub fn print_config_sources(config_path: Option<&Path>) {
        println!("Configuration sources (in priority order):");

        println!("  [     ] Env:     {ENV_PREFIX}* (nested with __)");
        let set: Vec<&str> = LEGACY_ENV_VARS
            .iter()
            .map(|(var, _)| *var)
            .filter(|var| std::env::var_os(var).is_some())
            .collect();
        if set.is_empty() {
            println!("  [     ] Env:     none of the flat variables are set");
        } else {
            println!("  [FOUND] Env:     {}", set.join(", "));
        }

        if let Some(path) = config_path {
            let mark = if path.exists() { "FOUND" } else { "MISS " };
            println!("  [{mark}] Explicit: {}", path.display());
        }

        if let Some(path) = Self::project_config_path() {
            println!("  [FOUND] Project: {}", path.display());
        } else {
            println!("  [     ] Project: ./vibe.toml or ./.vibe.toml");
        }

        if let Some(path) = Self::global_config_path() {
            if path.exists() {
                println!("  [FOUND] Global:  {}", path.display());
            } else {
                println!("  [     ] Global:  {}", path.display());
            }
        }

        println!("  [     ] Default: built-in defaults");
    }
}
