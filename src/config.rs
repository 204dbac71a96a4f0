//! Configuration management
//!
//! Configuration is loaded from the first source found:
//! 1. An explicit path (e.g. the CLI `--config` flag)
//! 2. Project-local `nodegraph.toml`
//! 3. User config `<config_dir>/nodegraph/config.toml`
//! 4. Built-in defaults
//!
//! Environment variables are applied on top of whichever file was read.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::config::{ENV_BUILTIN_TYPES, ENV_PRETTY, LOCAL_FILE, USER_DIR, USER_FILE};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Type system configuration
    pub types: TypesConfig,

    /// JSON output configuration
    pub output: OutputConfig,
}

/// Type system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypesConfig {
    /// Load the built-in nominal class hierarchy
    pub builtins: bool,

    /// Extra nominal classes mapped to their direct bases
    pub hierarchy: BTreeMap<String, Vec<String>>,

    /// Extra spellings mapped to canonical type names
    pub aliases: BTreeMap<String, String>,
}

impl Default for TypesConfig {
    fn default() -> Self {
        Self {
            builtins: true,
            hierarchy: BTreeMap::new(),
            aliases: BTreeMap::new(),
        }
    }
}

/// JSON output configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Indent JSON payloads
    pub pretty: bool,
}

impl Config {
    /// Load configuration from the default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None::<&Path>)
    }

    /// Load configuration, preferring an explicit path when given
    pub fn load_from(path: Option<impl AsRef<Path>>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        if Path::new(LOCAL_FILE).exists() {
            return Self::from_file(LOCAL_FILE);
        }

        if let Some(user_config) = Self::user_config_path() {
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        debug!("No config file found, using defaults");
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!("Loading config from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from TOML text without applying overrides
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Path of the per-user config file, if the platform has a config dir
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(USER_DIR).join(USER_FILE))
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var(ENV_PRETTY) {
            match parse_flag(&value) {
                Some(pretty) => self.output.pretty = pretty,
                None => warn!("Ignoring {}={}: expected a boolean", ENV_PRETTY, value),
            }
        }
        if let Ok(value) = std::env::var(ENV_BUILTIN_TYPES) {
            match parse_flag(&value) {
                Some(builtins) => self.types.builtins = builtins,
                None => warn!("Ignoring {}={}: expected a boolean", ENV_BUILTIN_TYPES, value),
            }
        }
    }

    /// Render the default configuration as TOML
    pub fn default_config_string() -> String {
        toml::to_string_pretty(&Config::default()).unwrap_or_default()
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
