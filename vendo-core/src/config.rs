//! Machine configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via VENDO_CONFIG or --config)
//! 3. Environment variables
//!
//! ```yaml
//! catalog:
//!   path: produtos.json
//! repl:
//!   prompt: ">>> "
//!   color: true
//! currency:
//!   symbol: "€"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Catalog source.
    pub catalog: CatalogConfig,
    /// Interactive front end.
    pub repl: ReplConfig,
    /// Money rendering.
    pub currency: CurrencyConfig,
}

impl Config {
    /// Loads configuration from file, then applies environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("VENDO_CONFIG") {
            config = Self::from_file(&path)?;
        }

        config.apply_env_overrides();

        Ok(config)
    }

    /// Loads configuration from an explicit file, then applies environment overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        self.catalog.apply_env_overrides();
        self.repl.apply_env_overrides();
        self.currency.apply_env_overrides();
    }

    /// Checks values that cannot be expressed in the type system.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog.path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "catalog.path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Catalog configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// JSON catalog file.
    pub path: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("produtos.json"),
        }
    }
}

impl CatalogConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("VENDO_CATALOG") {
            if !path.is_empty() {
                self.path = PathBuf::from(path);
            }
        }
    }
}

/// REPL configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplConfig {
    /// Prompt shown before each line.
    pub prompt: String,
    /// History file. Defaults to `~/.vendo_history`.
    pub history_file: Option<PathBuf>,
    /// Colored output.
    pub color: bool,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            prompt: ">>> ".to_string(),
            history_file: None,
            color: true,
        }
    }
}

impl ReplConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(prompt) = std::env::var("VENDO_PROMPT") {
            self.prompt = prompt;
        }
        if let Ok(path) = std::env::var("VENDO_HISTORY") {
            self.history_file = Some(PathBuf::from(path));
        }
        if let Ok(color) = std::env::var("VENDO_COLOR") {
            self.color = color == "1" || color.to_lowercase() == "true";
        }
    }
}

/// Currency rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyConfig {
    /// Symbol appended to amounts.
    pub symbol: String,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            symbol: "€".to_string(),
        }
    }
}

impl CurrencyConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(symbol) = std::env::var("VENDO_CURRENCY") {
            self.symbol = symbol;
        }
    }
}

/// Configuration error.
#[derive(Debug)]
pub enum ConfigError {
    IoError(PathBuf, std::io::Error),
    ParseError(PathBuf, String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, e) => write!(
                f,
                "cannot read vendo config '{}' (set by VENDO_CONFIG or --config): {}",
                path.display(),
                e
            ),
            ConfigError::ParseError(path, e) => {
                write!(f, "vendo config '{}' is not valid YAML: {}", path.display(), e)
            }
            ConfigError::ValidationError(msg) => write!(f, "invalid vendo config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
