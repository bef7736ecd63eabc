// # CDN Provider Trait
//
// Defines the interface for issuing purge and versioned-configuration
// calls against a CDN provider's REST API.
//
// ## Implementations
//
// - Fastly: `edgepurge-provider-fastly` crate
// - Future: CloudFront, Akamai, etc.
//
// ## Responsibility boundary
//
// Providers are thin API wrappers. They make exactly the call they are
// asked to make and report the outcome:
//
// - NO retry or backoff logic (retry policy is owned by callers)
// - NO ledger writes (owned by the purge orchestrator)
// - NO webhook notifications (owned by the purge orchestrator)
// - NO caching of provider state between calls
//
// All calls carry bounded timeouts: 5 seconds for read-only checks,
// 10 seconds for mutating calls.

use async_trait::async_trait;

use crate::config::CdnConfig;
use crate::error::Result;

/// Result of a connectivity test
///
/// `test_connection` never fails on a non-2xx response; the failure is
/// folded into `ok`/`message` so admin surfaces can display it directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatus {
    /// Whether the service detail call succeeded
    pub ok: bool,
    /// Human-readable outcome (service name on success, status + body on failure)
    pub message: String,
}

/// Successful purge response, kept for the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeReceipt {
    /// HTTP status of the purge call
    pub status: u16,
    /// Raw response body
    pub body: String,
}

/// Result of validating a service version
///
/// A provider-side validation failure is a normal outcome, not an error:
/// `ok = false` with the provider's message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    /// Whether the version validated cleanly
    pub ok: bool,
    /// The provider's validation message
    pub message: String,
}

/// Outcome of probing for a named snippet on a version
///
/// The probe is deliberately a tagged three-way result (found / not found /
/// error via `Result`) so the deploy workflow branches on data instead of
/// re-inspecting status codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnippetProbe {
    /// No snippet with that name exists on the version (create it)
    NotFound,
    /// A snippet with that name already exists (update it in place)
    Existing(SnippetMeta),
}

/// Metadata about an existing snippet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetMeta {
    /// Provider-assigned snippet ID, when the API returns one
    pub id: Option<String>,
    /// Snippet name
    pub name: String,
}

/// The VCL phase a snippet is injected into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnippetType {
    /// vcl_recv
    Recv,
    /// vcl_fetch
    Fetch,
    /// vcl_deliver
    Deliver,
    /// vcl_log
    Log,
}

impl SnippetType {
    /// The provider API's name for this snippet type
    pub fn as_str(&self) -> &'static str {
        match self {
            SnippetType::Recv => "recv",
            SnippetType::Fetch => "fetch",
            SnippetType::Deliver => "deliver",
            SnippetType::Log => "log",
        }
    }
}

/// A snippet to create on a service version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetSpec {
    /// Fixed snippet name; re-applying under the same name is what makes
    /// deploys idempotent
    pub name: String,
    /// VCL phase
    pub snippet_type: SnippetType,
    /// Ordering priority among snippets of the same type
    pub priority: u32,
    /// Rendered snippet content
    pub content: String,
}

/// Trait for CDN provider implementations
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Error contract
///
/// Mutating calls return `Error::Cdn { status, body }` on a non-2xx
/// response and `Error::Http` on transport failures. `test_connection`
/// and `validate_version` fold provider-side rejection into their return
/// value instead, because "it said no" is the answer those calls exist to
/// fetch.
#[async_trait]
pub trait CdnProvider: Send + Sync {
    /// Test connectivity by fetching the service detail.
    ///
    /// The success message includes the service's display name; the
    /// failure message includes the status code and raw body.
    async fn test_connection(&self) -> Result<ConnectionStatus>;

    /// Purge the entire cache for the service
    async fn purge_all(&self, soft: bool) -> Result<PurgeReceipt>;

    /// Purge everything tagged with the given surrogate key
    async fn purge_key(&self, key: &str, soft: bool) -> Result<PurgeReceipt>;

    /// Purge a single URL path (no service prefix on the wire)
    async fn purge_url_path(&self, path: &str, soft: bool) -> Result<PurgeReceipt>;

    /// The number of the currently active service version.
    ///
    /// Fails with a CDN error if no version is flagged active or the
    /// number is malformed.
    async fn active_version(&self) -> Result<u64>;

    /// Clone a version into a new editable version, returning its number
    async fn clone_version(&self, version: u64) -> Result<u64>;

    /// Validate a version. Does not error on a validation failure.
    async fn validate_version(&self, version: u64) -> Result<Validation>;

    /// Activate a version
    async fn activate_version(&self, version: u64) -> Result<()>;

    /// Probe for a named snippet on a version
    async fn get_snippet(&self, version: u64, name: &str) -> Result<SnippetProbe>;

    /// Create a snippet on a version
    async fn create_snippet(&self, version: u64, spec: &SnippetSpec) -> Result<()>;

    /// Replace the content of an existing named snippet
    async fn update_snippet(&self, version: u64, name: &str, content: &str) -> Result<()>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing CDN providers from configuration
pub trait CdnProviderFactory: Send + Sync {
    /// Create a provider instance from configuration.
    ///
    /// Must fail with `Error::Config` when the configuration is unusable
    /// (disabled, or missing token / service ID).
    fn create(&self, config: &CdnConfig) -> Result<Box<dyn CdnProvider>>;
}
