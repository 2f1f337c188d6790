//! Error types for the offline proxy.

use crate::worker::Phase;

/// Proxy errors.
///
/// Only lifecycle, configuration and atomic-precache failures ever reach a
/// host. Everything the router sees is absorbed into a fallback response.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// Network fetch failed (connection refused, DNS, reset, ...).
    #[error("network error: {message}")]
    Network { message: String },

    /// Network fetch timed out.
    #[error("request timed out: {url}")]
    Timeout { url: String },

    /// Cache store error.
    #[error("cache error: {message}")]
    Cache { message: String },

    /// A manifest entry could not be precached under the atomic strategy.
    #[error("precache failed for {identity}: {reason}")]
    Precache { identity: String, reason: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Request descriptor could not be normalized.
    #[error("invalid resource identity: {input} - {reason}")]
    InvalidIdentity { input: String, reason: String },

    /// Lifecycle signal arrived in the wrong phase.
    #[error("lifecycle violation: expected phase {expected}, worker is {actual}")]
    Lifecycle { expected: Phase, actual: Phase },
}

impl ProxyError {
    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            // Config / input issues
            Self::Config { .. } => 1,
            Self::InvalidIdentity { .. } => 1,

            // Host ordering
            Self::Lifecycle { .. } => 2,

            // Install failed
            Self::Precache { .. } => 3,

            // Network/transient
            Self::Network { .. } => 5,
            Self::Timeout { .. } => 5,

            // Store
            Self::Cache { .. } => 6,
        }
    }

    /// Whether the error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Timeout { .. })
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout {
                url: err
                    .url()
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| "<unknown>".to_string()),
            };
        }
        Self::Network {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for ProxyError {
    fn from(err: std::io::Error) -> Self {
        Self::Cache {
            message: err.to_string(),
        }
    }
}

/// Result type for proxy operations.
pub type ProxyResult<T> = Result<T, ProxyError>;
