use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::Deserialize;

use crate::error::{Result, UsersError};

pub const DEFAULT_API_BASE: &str = "https://dummyjson.com";
const DEFAULT_DEBOUNCE_MS: u64 = 600;
const DEFAULT_STALE_SECS: u64 = 30;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub api_base: Option<String>,
    pub debounce_ms: u64,
    pub stale_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: None,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            stale_secs: DEFAULT_STALE_SECS,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).map_err(|e| UsersError::ConfigRead {
                path: config_path.clone(),
                source: e,
            })?;

        toml::from_str(&contents).map_err(|e| UsersError::ConfigParse {
            path: config_path,
            source: e,
        })
    }

    pub fn config_path() -> Result<PathBuf> {
        ProjectDirs::from("", "", "dummy-users")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .ok_or(UsersError::NoConfigDir)
    }

    /// Get the API base with env var taking precedence over config file
    pub fn api_base(&self) -> String {
        if let Ok(base) = std::env::var("USERS_API_BASE") {
            if !base.trim().is_empty() {
                return base;
            }
        }

        self.api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_secs)
    }
}
