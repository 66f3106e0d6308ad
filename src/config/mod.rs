//! Configuration management for TargetUP

use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::theme::{Theme, ThemeMode};

/// Environment variable overriding the backend URL
pub const ENV_BACKEND_URL: &str = "TARGETUP_BACKEND_URL";
/// Environment variable overriding the API key
pub const ENV_API_KEY: &str = "TARGETUP_API_KEY";

/// Connection settings for the hosted backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project URL, e.g. https://xyz.supabase.co
    pub url: String,

    /// Public (anon) API key
    pub api_key: String,

    /// Storage bucket for exam icons and question diagrams
    pub bucket: String,

    /// Where OAuth providers redirect after sign-in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth_redirect_url: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            bucket: "images".to_string(),
            oauth_redirect_url: None,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Light or dark palette
    #[serde(default)]
    pub theme: ThemeMode,

    /// Backend connection
    #[serde(default)]
    pub backend: BackendConfig,

    /// Question count preselected on the test setup screen
    #[serde(default = "default_test_size")]
    pub default_test_size: usize,

    /// Access code for private exam batches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_code: Option<String>,
}

fn default_test_size() -> usize {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: ThemeMode::Dark,
            backend: BackendConfig::default(),
            default_test_size: default_test_size(),
            access_code: None,
        }
    }
}

impl Config {
    /// Load configuration from disk, or create default if not exists
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config from {:?}", config_path))?;
            serde_json::from_str(&contents).with_context(|| "Failed to parse config.json")?
        } else {
            let config = Self::default();
            config.save()?;
            config
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let contents =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config to {:?}", config_path))?;

        Ok(())
    }

    /// Override backend settings from the environment
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_BACKEND_URL).filter(|v| !v.is_empty()) {
            self.backend.url = url;
        }
        if let Some(key) = lookup(ENV_API_KEY).filter(|v| !v.is_empty()) {
            self.backend.api_key = key;
        }
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("", "", "targetup").context("Failed to determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.json"))
    }

    /// Get the data directory path
    pub fn data_dir() -> Result<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("", "", "targetup").context("Failed to determine data directory")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    /// Path of the signed-out progress file
    pub fn guest_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("guest.json"))
    }

    /// Directory for log files
    pub fn log_dir() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("logs"))
    }

    /// Get the active theme
    pub fn active_theme(&self) -> Theme {
        Theme::for_mode(self.theme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_dark() {
        let config = Config::default();
        assert_eq!(config.theme, ThemeMode::Dark);
        assert_eq!(config.default_test_size, 10);
    }

    #[test]
    fn config_deserializes_with_missing_fields() {
        let json = r#"{"theme":"Light","backend":{"url":"https://x.supabase.co","api_key":"k","bucket":"img"}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.theme, ThemeMode::Light);
        assert_eq!(config.backend.bucket, "img");
        assert_eq!(config.default_test_size, 10);
        assert!(config.access_code.is_none());
    }

    #[test]
    fn environment_overrides_backend() {
        let mut config = Config::default();
        config.apply_env(|key| match key {
            ENV_BACKEND_URL => Some("https://env.supabase.co".to_string()),
            ENV_API_KEY => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.backend.url, "https://env.supabase.co");
        assert_eq!(config.backend.api_key, "");
    }
}
