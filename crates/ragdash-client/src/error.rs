//! Error types for the transport client

/// Transport failure
///
/// Carries plain strings rather than the underlying `reqwest` error so that
/// in-memory backends and test doubles can produce every variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// Non-2xx response
    #[error("request failed ({status}): {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body text
        body: String,
    },

    /// Connection, timeout or protocol failure
    #[error("network error: {0}")]
    Network(String),

    /// Response body did not match the expected shape
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Base address could not be used
    #[error("invalid base address `{url}`: {reason}")]
    InvalidBaseUrl {
        /// Offending address
        url: String,
        /// Why it was rejected
        reason: String,
    },
}

impl ClientError {
    /// Create status error
    #[inline]
    #[must_use]
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// HTTP status code, if the server answered
    #[inline]
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if the server answered with a non-2xx status
    #[inline]
    #[must_use]
    pub fn is_status(&self) -> bool {
        matches!(self, Self::Status { .. })
    }

    /// Check if the server reported a missing resource
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }

    /// Check if retrying the same call could succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Decode(_) | Self::InvalidBaseUrl { .. } => false,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}
