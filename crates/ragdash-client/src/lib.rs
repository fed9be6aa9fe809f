//! ragdash Client - transport for the RAG platform REST API
//!
//! Provides:
//! - The [`RagApi`] trait, the single seam between the console and the backend
//! - [`HttpClient`], a `reqwest` implementation with a swappable base address
//! - [`ClientError`], carrying status code and body of failed calls
//!
//! Retry and backoff are left to callers; every call is attempted once.
//!
//! # Example
//!
//! ```rust,ignore
//! use ragdash_client::{HttpClient, RagApi};
//!
//! # async fn example() -> Result<(), ragdash_client::ClientError> {
//! let client = HttpClient::new("http://127.0.0.1:8000")?;
//! let apps = client.list_apps().await?;
//! println!("{} applications", apps.len());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod api;
pub mod error;
pub mod http;

pub use api::{IngestionQuery, Page, RagApi};
#[cfg(any(test, feature = "mock"))]
pub use api::MockRagApi;
pub use error::ClientError;
pub use http::{HttpClient, DEFAULT_TIMEOUT};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
