// # Purge Ledger Trait
//
// Defines the interface for the append-only record of purge attempts.
//
// ## Purpose
//
// Every purge the orchestrator issues, successful or not, leaves one
// entry behind, so operators can answer "what did we purge, when, and did
// the CDN accept it" without trawling logs.
//
// ## Implementations
//
// - Memory: ephemeral, for tests and short-lived processes
// - File: append-only JSON lines
//
// Entries are never updated or deleted by the core.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response bodies are truncated to this many characters before storage
pub const RESPONSE_BODY_LIMIT: usize = 4000;

/// How a purge targeted the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurgeMethod {
    /// Purge by URL path
    Url,
    /// Purge by surrogate key
    Key,
    /// Full cache purge
    PurgeAll,
}

impl PurgeMethod {
    /// Short label used in log lines and CLI output
    pub fn as_str(&self) -> &'static str {
        match self {
            PurgeMethod::Url => "url",
            PurgeMethod::Key => "key",
            PurgeMethod::PurgeAll => "purge_all",
        }
    }
}

/// One purge attempt and its outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurgeLogEntry {
    /// When the attempt was made
    pub created_at: DateTime<Utc>,
    /// How the purge targeted the cache
    pub method: PurgeMethod,
    /// The key or path purged ("*" for purge-all)
    pub target: String,
    /// Whether the CDN accepted the purge
    pub success: bool,
    /// HTTP status of the response, if one was received
    pub response_status: Option<u16>,
    /// Response body, truncated to [`RESPONSE_BODY_LIMIT`] characters
    pub response_body: String,
}

impl PurgeLogEntry {
    /// Create an entry stamped with the current time.
    ///
    /// The response body is truncated here so no backend ever stores an
    /// unbounded payload.
    pub fn new(
        method: PurgeMethod,
        target: impl Into<String>,
        success: bool,
        response_status: Option<u16>,
        response_body: impl Into<String>,
    ) -> Self {
        let mut response_body: String = response_body.into();
        if response_body.chars().count() > RESPONSE_BODY_LIMIT {
            response_body = response_body.chars().take(RESPONSE_BODY_LIMIT).collect();
        }

        Self {
            created_at: Utc::now(),
            method,
            target: target.into(),
            success,
            response_status,
            response_body,
        }
    }
}

/// Trait for purge ledger implementations
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks;
/// concurrent appends may interleave but must not corrupt entries.
#[async_trait]
pub trait PurgeLedger: Send + Sync {
    /// Append one entry to the ledger
    async fn record(&self, entry: PurgeLogEntry) -> Result<(), crate::Error>;

    /// The most recent entries, newest first, at most `limit`
    async fn recent(&self, limit: usize) -> Result<Vec<PurgeLogEntry>, crate::Error>;

    /// Total number of entries
    async fn len(&self) -> Result<usize, crate::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_truncates_body() {
        let body = "x".repeat(RESPONSE_BODY_LIMIT + 500);
        let entry = PurgeLogEntry::new(PurgeMethod::Key, "blog.post:1", false, Some(500), body);
        assert_eq!(entry.response_body.chars().count(), RESPONSE_BODY_LIMIT);
    }

    #[test]
    fn test_entry_keeps_short_body() {
        let entry = PurgeLogEntry::new(PurgeMethod::Url, "/blog/", true, Some(200), "ok");
        assert_eq!(entry.response_body, "ok");
        assert_eq!(entry.method.as_str(), "url");
    }

    #[test]
    fn test_method_serialization() {
        let json = serde_json::to_string(&PurgeMethod::PurgeAll).unwrap();
        assert_eq!(json, "\"purge_all\"");
    }
}
