//! Error types for zonesync
//!
//! This module defines all error types used throughout the crate.

use crate::validate::Violation;
use thiserror::Error;

/// Result type alias for zonesync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for zonesync
#[derive(Error, Debug)]
pub enum Error {
    /// No hosted zone matched the requested name
    #[error("zone {0} not found in response")]
    ZoneNotFound(String),

    /// Paginated retrieval of the remote record set failed
    ///
    /// `page` is the 1-based index of the page request that failed. The
    /// underlying error is kept as-is in `source`.
    #[error("fetching record sets failed at page {page}: {source}")]
    FetchFailed {
        /// Page request that failed
        page: usize,
        /// The error returned while requesting or parsing that page
        #[source]
        source: Box<Error>,
    },

    /// Operation invoked on inputs of the wrong shape
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A change batch exceeded provider limits and was not submitted
    #[error("changeset invalid: {}", join_violations(.0))]
    ChangesetInvalid(Vec<Violation>),

    /// XML could not be parsed or written
    #[error("XML error: {0}")]
    Xml(String),

    /// A provider response was well-formed XML but not the expected document
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Audit log errors
    #[error("Audit log error: {0}")]
    AuditLog(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors (from provider APIs)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Resource not found on the provider
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input document
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Create a fetch failure for the given 1-based page index
    pub fn fetch_failed(page: usize, source: Error) -> Self {
        Self::FetchFailed {
            page,
            source: Box::new(source),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create an XML error
    pub fn xml(msg: impl Into<String>) -> Self {
        Self::Xml(msg.into())
    }

    /// Create a malformed response error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an audit log error
    pub fn audit_log(msg: impl Into<String>) -> Self {
        Self::AuditLog(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
