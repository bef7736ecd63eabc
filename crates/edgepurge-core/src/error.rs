//! Error types for the EdgePurge system
//!
//! This module defines all error types used throughout the crate.
//!
//! The taxonomy separates "the feature is off" (`Config`) from "the CDN
//! rejected or garbled a call" (`Cdn`) so callers can treat the former as
//! an expected no-op and the latter as an operational failure.

use thiserror::Error;

/// Result type alias for EdgePurge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the EdgePurge system
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (not configured, feature disabled, gated off)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Non-2xx or malformed response from the CDN provider.
    ///
    /// `status` is `None` when the response body was malformed rather than
    /// the status line being the problem.
    #[error("CDN API error ({}): {body}", .status.map(|s| s.to_string()).unwrap_or_else(|| "malformed response".to_string()))]
    Cdn {
        /// HTTP status code, if one was received
        status: Option<u16>,
        /// Raw response body (or a parse-failure description)
        body: String,
    },

    /// Transport-level HTTP failure (connect error, timeout)
    #[error("HTTP error: {0}")]
    Http(String),

    /// The edge module is disabled; no network call was made
    #[error("Edge module is disabled")]
    ModuleDisabled,

    /// Rendering the edge snippet failed
    #[error("Failed to render edge snippet: {0}")]
    SnippetRender(String),

    /// An entity lacks a capability the operation requires (programming error)
    #[error("Misconfigured entity: {0}")]
    MisconfiguredEntity(String),

    /// Webhook delivery failed. Always caught by the orchestrator, never
    /// propagated out of the purge path.
    #[error("Webhook delivery failed: {0}")]
    WebhookDelivery(String),

    /// A deploy step failed after a target version was established.
    ///
    /// Carries the version number so operators can clean up the orphaned
    /// (inert, never-activated) version by hand.
    #[error("Deploy to version {version} failed: {source}")]
    Deploy {
        /// The version the failed workflow was editing
        version: u64,
        /// The step failure
        #[source]
        source: Box<Error>,
    },

    /// Version validation reported a failure
    #[error("Version {version} failed validation: {message}")]
    ValidationFailed {
        /// The version that was validated
        version: u64,
        /// The provider's validation message
        message: String,
    },

    /// Purge ledger storage errors
    #[error("Purge ledger error: {0}")]
    Ledger(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors (ledger and config files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a CDN API error from a status code and response body
    pub fn cdn(status: impl Into<Option<u16>>, body: impl Into<String>) -> Self {
        Self::Cdn {
            status: status.into(),
            body: body.into(),
        }
    }

    /// Create a transport-level HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a snippet render error
    pub fn snippet_render(msg: impl Into<String>) -> Self {
        Self::SnippetRender(msg.into())
    }

    /// Create a misconfigured-entity error
    pub fn misconfigured_entity(msg: impl Into<String>) -> Self {
        Self::MisconfiguredEntity(msg.into())
    }

    /// Create a webhook delivery error
    pub fn webhook(msg: impl Into<String>) -> Self {
        Self::WebhookDelivery(msg.into())
    }

    /// Create a purge ledger error
    pub fn ledger(msg: impl Into<String>) -> Self {
        Self::Ledger(msg.into())
    }

    /// Wrap a step failure with the deploy target version
    pub fn deploy(version: u64, source: Error) -> Self {
        Self::Deploy {
            version,
            source: Box::new(source),
        }
    }

    /// The HTTP status carried by this error, if any
    pub fn response_status(&self) -> Option<u16> {
        match self {
            Self::Cdn { status, .. } => *status,
            Self::Deploy { source, .. } => source.response_status(),
            _ => None,
        }
    }

    /// The response body carried by this error, if any
    pub fn response_body(&self) -> Option<&str> {
        match self {
            Self::Cdn { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
