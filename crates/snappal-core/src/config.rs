//! Configuration management for snappal.
//!
//! Loads configuration from ${SNAPPAL_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Returns the default config template with comments.
///
/// Embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for snappal configuration and data files.
    //!
    //! SNAPPAL_HOME resolution order:
    //! 1. SNAPPAL_HOME environment variable (if set)
    //! 2. ~/.config/snappal (default)

    use std::path::PathBuf;

    /// Returns the snappal home directory.
    pub fn snappal_home() -> PathBuf {
        if let Ok(home) = std::env::var("SNAPPAL_HOME")
            && !home.trim().is_empty()
        {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".snappal"),
            |h| h.join(".config").join("snappal"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        snappal_home().join("config.toml")
    }

    /// Returns the path to the persisted history slot.
    pub fn history_path() -> PathBuf {
        snappal_home().join("history.json")
    }
}

/// Gemini provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    /// Model used for analysis
    pub model: String,

    /// Sampling temperature sent with every request
    pub temperature: f32,

    /// API key (overrides `GEMINI_API_KEY`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL for the Generative Language API
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            model: Config::DEFAULT_MODEL.to_string(),
            temperature: Config::DEFAULT_TEMPERATURE,
            api_key: None,
            base_url: None,
        }
    }
}

impl GeminiSettings {
    /// Returns the configured API key, ignoring blank values.
    pub fn effective_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn effective_base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gemini: GeminiSettings,
}

impl Config {
    pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
    pub const DEFAULT_TEMPERATURE: f32 = 0.1;

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Creates a default config file at the given path.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
        }
        fs::write(path, default_config_template())
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }
}
