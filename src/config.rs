//! Configuration Management
//!
//! Handles persistent configuration storage for pipedream-provider.

use crate::api::client::{parse_base_url, DEFAULT_API_URL};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default desired-state file, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "workflows.yaml";

/// Default state file, relative to the working directory
pub const DEFAULT_STATE_FILE: &str = "pipedream.state.json";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// API base URL override
    #[serde(default)]
    pub api_url: Option<String>,
    /// State file location override
    #[serde(default)]
    pub state_file: Option<PathBuf>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("pipedream-provider").join("config.json"))
    }

    /// Load configuration from the default location
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from a path; unreadable or invalid files yield defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid config file {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    /// Save configuration to a path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get effective API URL (CLI > config > default), validated
    pub fn effective_api_url(&self, cli: Option<&str>) -> Result<String> {
        let url = cli
            .map(str::to_string)
            .or_else(|| self.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        parse_base_url(&url)?;
        Ok(url)
    }

    /// Get effective state file (CLI > config > default)
    pub fn effective_state_file(&self, cli: Option<&Path>) -> PathBuf {
        cli.map(Path::to_path_buf)
            .or_else(|| self.state_file.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE))
    }

    /// Set API URL and save
    pub fn set_api_url(&mut self, url: &str) -> Result<()> {
        parse_base_url(url)?;
        self.api_url = Some(url.to_string());
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_api_url_precedence() {
        let config = Config {
            api_url: Some("http://config.local/v1".to_string()),
            state_file: None,
        };
        assert_eq!(
            config.effective_api_url(Some("http://cli.local/v1")).unwrap(),
            "http://cli.local/v1"
        );
        assert_eq!(
            config.effective_api_url(None).unwrap(),
            "http://config.local/v1"
        );
        assert_eq!(
            Config::default().effective_api_url(None).unwrap(),
            DEFAULT_API_URL
        );
    }

    #[test]
    fn test_effective_api_url_rejects_invalid() {
        assert!(Config::default().effective_api_url(Some("nope")).is_err());
    }

    #[test]
    fn test_effective_state_file_precedence() {
        let config = Config {
            api_url: None,
            state_file: Some(PathBuf::from("/tmp/from-config.json")),
        };
        assert_eq!(
            config.effective_state_file(Some(Path::new("cli.json"))),
            PathBuf::from("cli.json")
        );
        assert_eq!(
            config.effective_state_file(None),
            PathBuf::from("/tmp/from-config.json")
        );
        assert_eq!(
            Config::default().effective_state_file(None),
            PathBuf::from(DEFAULT_STATE_FILE)
        );
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipedream-provider").join("config.json");

        let config = Config {
            api_url: Some("https://example.com/v1".to_string()),
            state_file: None,
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path);
        assert_eq!(loaded.api_url.as_deref(), Some("https://example.com/v1"));
    }

    #[test]
    fn test_invalid_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(Config::load_from(&path).api_url.is_none());
    }
}
