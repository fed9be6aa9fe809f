//! Console configuration
//!
//! Loaded from a TOML file; every field is optional in the file. The base
//! address is the only value the console writes back.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the base address
pub const BASE_URL_ENV: &str = "RAGDASH_BASE_URL";

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "RAGDASH_CONFIG";

/// Config file used when none is named
pub const DEFAULT_CONFIG_FILE: &str = "ragdash.toml";

/// Console configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Platform API base address
    pub base_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Documents fetched per batch
    pub doc_page_size: u32,
    /// Documents fetched to infer a schema when no batch is loaded
    pub schema_sample_size: u32,
    /// Ingestion records fetched per reload
    pub ingestion_page_size: u32,
    /// Ingestion records mapped for display
    pub ingestion_preview: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            request_timeout_secs: 10,
            doc_page_size: 20,
            schema_sample_size: 25,
            ingestion_page_size: 20,
            ingestion_preview: 6,
        }
    }
}

impl ConsoleConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With base address
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// With request timeout
    #[inline]
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// With document batch size
    #[inline]
    #[must_use]
    pub fn with_doc_page_size(mut self, size: u32) -> Self {
        self.doc_page_size = size;
        self
    }

    /// With ingestion preview length
    #[inline]
    #[must_use]
    pub fn with_ingestion_preview(mut self, preview: usize) -> Self {
        self.ingestion_preview = preview;
        self
    }

    /// Request timeout
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Apply environment overrides; blank values are ignored
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                self.base_url = url.trim().to_string();
            }
        }
        self
    }
}

/// Config file location and persistence
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Create store for a file
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store named by `RAGDASH_CONFIG`, else `ragdash.toml`
    #[must_use]
    pub fn from_env() -> Self {
        let path = std::env::var(CONFIG_PATH_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());
        Self::new(path)
    }

    /// Config file path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the config; a missing file yields defaults
    pub fn load(&self) -> Result<ConsoleConfig, ConfigError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no config file, using defaults");
                return Ok(ConsoleConfig::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Write the full config
    pub fn save(&self, config: &ConsoleConfig) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(config)?;
        std::fs::write(&self.path, contents).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Persist a new base address, keeping every other stored value
    pub fn save_base_url(&self, base_url: &str) -> Result<ConsoleConfig, ConfigError> {
        let config = self.load()?.with_base_url(base_url.trim());
        self.save(&config)?;
        tracing::info!(path = %self.path.display(), base_url = %config.base_url, "base address saved");
        Ok(config)
    }
}
