//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! the API base URL, the last email used to sign in, and where the
//! session is persisted.
//!
//! Configuration is stored at `~/.config/gameshelf/config.json`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::DEFAULT_BASE_URL;
use crate::auth::{FileStorage, KeyringStorage, MemoryStorage, SessionStorage};

/// Application name used for config/data directory paths
const APP_NAME: &str = "gameshelf";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Subdirectory of the data dir holding the file-backed session
const SESSION_DIR: &str = "session";

pub const ENV_API_URL: &str = "GAMESHELF_API_URL";
pub const ENV_EMAIL: &str = "GAMESHELF_EMAIL";
pub const ENV_PASSWORD: &str = "GAMESHELF_PASSWORD";

/// Where the persisted session lives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub last_email: Option<String>,
    #[serde(default)]
    pub storage: StorageBackend,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config at {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config at {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Base URL to talk to: environment first, then the config file, then the default
    pub fn api_base_url(&self) -> String {
        Self::resolve_api_url(std::env::var(ENV_API_URL).ok(), self.api_base_url.as_deref())
    }

    fn resolve_api_url(from_env: Option<String>, configured: Option<&str>) -> String {
        from_env
            .filter(|url| !url.trim().is_empty())
            .or_else(|| configured.map(str::to_string))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    /// Email to prefill on the login form
    pub fn default_email(&self) -> Option<String> {
        std::env::var(ENV_EMAIL)
            .ok()
            .filter(|e| !e.trim().is_empty())
            .or_else(|| self.last_email.clone())
    }

    /// Password from the environment, for non-interactive logins
    pub fn env_password() -> Option<String> {
        std::env::var(ENV_PASSWORD).ok().filter(|p| !p.is_empty())
    }

    /// Open the session storage backend; `ephemeral` keeps everything in memory
    pub fn open_storage(&self, ephemeral: bool) -> Result<Box<dyn SessionStorage>> {
        if ephemeral {
            debug!("Using in-memory session storage");
            return Ok(Box::new(MemoryStorage::new()));
        }
        match self.storage {
            StorageBackend::File => {
                let dir = Self::data_dir()?.join(SESSION_DIR);
                debug!(dir = %dir.display(), "Using file session storage");
                Ok(Box::new(FileStorage::new(dir)))
            }
            StorageBackend::Keyring => {
                debug!("Using keyring session storage");
                Ok(Box::new(KeyringStorage::new()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.storage, StorageBackend::File);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = Config {
            api_base_url: Some("https://games.example.com/api".to_string()),
            last_email: Some("ann@example.com".to_string()),
            storage: StorageBackend::Keyring,
        };
        config.save_to(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"keyring\""));
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"last_email": "bo@example.com"}"#).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.last_email.as_deref(), Some("bo@example.com"));
        assert_eq!(config.api_base_url, None);
    }

    #[test]
    fn test_load_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_resolve_api_url() {
        assert_eq!(Config::resolve_api_url(None, None), DEFAULT_BASE_URL);
        assert_eq!(
            Config::resolve_api_url(None, Some("http://cfg/api")),
            "http://cfg/api"
        );
        assert_eq!(
            Config::resolve_api_url(Some("http://env/api".into()), Some("http://cfg/api")),
            "http://env/api"
        );
        assert_eq!(
            Config::resolve_api_url(Some("  ".into()), Some("http://cfg/api")),
            "http://cfg/api"
        );
    }

    #[test]
    fn test_open_ephemeral_storage() {
        let config = Config::default();
        let mut storage = config.open_storage(true).unwrap();
        storage.set("token", "abc").unwrap();
        assert_eq!(storage.get("token").unwrap().as_deref(), Some("abc"));
    }
}
