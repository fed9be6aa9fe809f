//! ragdash Engine - drives the console against the platform API
//!
//! Provides:
//! - A one-shot reachability probe gating live data versus the fallback dataset
//! - The view-model reconciler with isolated per-knowledge-base stats fan-out
//! - [`ConsoleSession`], which runs reducer effects and exposes operator commands
//! - TOML configuration with a persisted base address
//!
//! # Example
//!
//! ```rust,ignore
//! use ragdash_client::HttpClient;
//! use ragdash_engine::{ConsoleConfig, ConsoleSession};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConsoleConfig::new();
//! let api = Arc::new(HttpClient::with_timeout(&config.base_url, config.timeout())?);
//! let session = ConsoleSession::new(api, config);
//!
//! session.refresh().await;
//! println!("{} vectors", session.state().snapshot().total_vectors);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod fallback;
pub mod probe;
pub mod reconciler;
pub mod session;

pub use config::{ConfigStore, ConsoleConfig, BASE_URL_ENV, CONFIG_PATH_ENV};
pub use error::{ConfigError, ConsoleError};
pub use fallback::FallbackDataset;
pub use probe::probe;
pub use reconciler::Reconciler;
pub use session::ConsoleSession;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving a console session
    pub use crate::{ConsoleConfig, ConsoleError, ConsoleSession, Reconciler};
    pub use ragdash_client::{HttpClient, RagApi};
    pub use ragdash_core::prelude::*;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
