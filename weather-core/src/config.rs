use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_LOCATION: &str = "San Francisco";
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Settings the agent is built from. Resolved once at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct AgentConfig {
    pub api_key: Option<String>,
    pub model_name: String,
    pub default_location: String,
    pub api_base_url: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model_name: DEFAULT_MODEL.to_string(),
            default_location: DEFAULT_LOCATION.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

// Hand-written so the key never ends up in logs.
impl std::fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model_name", &self.model_name)
            .field("default_location", &self.default_location)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

impl AgentConfig {
    /// Read the environment and the stored credentials file.
    pub fn load() -> Result<Self> {
        let stored = StoredConfig::load()?;
        Ok(Self::from_sources(std::env::var(API_KEY_ENV).ok(), stored))
    }

    /// Merge sources: the environment key wins over the stored one.
    pub fn from_sources(env_key: Option<String>, stored: StoredConfig) -> Self {
        let api_key = non_blank(env_key).or_else(|| non_blank(stored.api_key));
        let mut cfg = Self { api_key, ..Self::default() };

        if let Some(model) = non_blank(stored.model) {
            cfg.model_name = model;
        }
        cfg
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = non_blank(Some(api_key.into()));
        self
    }

    /// Same settings, but forced into mock mode.
    pub fn without_api_key(mut self) -> Self {
        self.api_key = None;
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    pub fn api_key(&self) -> &str {
        self.api_key.as_deref().unwrap_or("")
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Credentials stored on disk by `weather-agent configure`.
///
/// Example TOML:
/// api_key = "..."
/// model = "gemini-1.5-flash"
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct StoredConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
}

impl StoredConfig {
    /// Load from disk, or return an empty default if the file doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(path)
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-agent", "weather-agent")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }
}
