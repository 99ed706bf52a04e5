//! Configuration for the benchmark client.
//!
//! Supports both environment variables and YAML config file.
//! Environment variables take precedence over config file values.

use crate::error::{BenchError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default address of the benchmark backend.
pub const DEFAULT_API_BASE: &str = "http://localhost:8080";

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL for the backend (e.g., "http://localhost:8080")
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Optional request timeout in seconds. Unset means wait indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            timeout_secs: None,
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Full application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Backend settings
    pub backend: BackendConfig,
}

/// Configuration file structure (YAML format).
#[derive(Debug, Deserialize)]
struct ConfigFile {
    backend: Option<BackendFileSection>,
}

#[derive(Debug, Deserialize)]
struct BackendFileSection {
    api_base: Option<String>,
    timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables and optional config file.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (ARAG_API_BASE, ARAG_TIMEOUT_SECS)
    /// 2. Config file (~/.config/arag-bench/config.yaml)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                config = Self::load_from_file(&config_path)?;
            }
        }

        config.apply_env(|key| env::var(key).ok());

        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(api_base) = lookup("ARAG_API_BASE") {
            self.backend.api_base = api_base;
        }

        if let Some(timeout) = lookup("ARAG_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse() {
                self.backend.timeout_secs = Some(secs);
            }
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| BenchError::io(path, e))?;

        Self::from_yaml(&content)
    }

    fn from_yaml(content: &str) -> Result<Self> {
        let file_config: ConfigFile = serde_yaml::from_str(content)
            .map_err(|e| BenchError::Config(format!("Failed to parse config file: {}", e)))?;

        let mut config = Config::default();

        if let Some(backend) = file_config.backend {
            if let Some(api_base) = backend.api_base {
                config.backend.api_base = api_base;
            }
            if let Some(timeout_secs) = backend.timeout_secs {
                config.backend.timeout_secs = Some(timeout_secs);
            }
        }

        Ok(config)
    }

    /// Get the default config file path.
    pub fn config_file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "arag-bench")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Validate that required configuration is present.
    pub fn validate(&self) -> Result<()> {
        let base = self.backend.api_base.trim();

        if base.is_empty() {
            return Err(BenchError::Config(
                "Backend URL is required. Set ARAG_API_BASE environment variable or add to config file.".to_string()
            ));
        }

        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(BenchError::Config(format!(
                "Backend URL must start with http:// or https://, got '{}'",
                base
            )));
        }

        if self.backend.timeout_secs == Some(0) {
            return Err(BenchError::Config(
                "timeout_secs must be greater than zero when set".to_string(),
            ));
        }

        Ok(())
    }

    /// Create a config from an explicit backend URL (useful for testing).
    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        Self {
            backend: BackendConfig {
                api_base: api_base.into(),
                ..Default::default()
            },
        }
    }
}
