//! Error types for the console engine
//!
//! Engine operations surface:
//! - Transport failures from the platform API
//! - Local validation failures (no network call was made)
//! - Export refusals
//! - Configuration file problems

use ragdash_client::ClientError;
use ragdash_core::{ExportError, ValidationError};
use std::path::PathBuf;

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// Platform API call failed
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Input rejected before any call
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Export refused or failed
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Configuration could not be read or written
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ConsoleError {
    /// Check if the failure happened before any network call
    #[inline]
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Export(_))
    }

    /// Check if retrying could succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Client(err) => err.is_retryable(),
            _ => false,
        }
    }
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        /// Config file path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// File could not be written
    #[error("failed to write {path}: {source}")]
    Write {
        /// Config file path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// File is not valid TOML for the config shape
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// Config file path
        path: PathBuf,
        /// Underlying parse error
        source: toml::de::Error,
    },

    /// Config could not be encoded
    #[error("failed to encode config: {0}")]
    Encode(#[from] toml::ser::Error),
}
