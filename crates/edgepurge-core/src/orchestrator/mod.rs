//! Purge orchestration
//!
//! The orchestrator owns the content-change → invalidation flow:
//!
//! ```text
//! ┌──────────────┐
//! │ change event │──── entity ───┐
//! └──────────────┘               ▼
//!                       ┌──────────────────┐
//!                       │ PurgeOrchestrator │
//!                       └──────────────────┘
//!                                │
//!        ┌───────────────────────┼───────────────────────┐
//!        │                       │                       │
//!        ▼                       ▼                       ▼
//! ┌─────────────┐       ┌──────────────┐       ┌─────────────────┐
//! │ CdnProvider │       │ PurgeLedger  │       │ PurgeNotifier   │
//! │ (network)   │       │ (persist)    │       │ (best-effort)   │
//! └─────────────┘       └──────────────┘       └─────────────────┘
//! ```
//!
//! ## Failure policy
//!
//! Entity purges are best-effort across all targets: an individual
//! failure is logged and collected, every remaining target is still
//! attempted, and the last error seen is returned once the batch
//! completes. Earlier failures are not lost: each one is logged at warn
//! level and has its own ledger entry.
//!
//! ## Off-switch policy
//!
//! A disabled or unconfigured integration makes `purge_entity` a silent
//! no-op (zero network calls): content saves must keep working on an
//! instance that never set up its CDN. The administrative operations are
//! the opposite: they exist to exercise the integration, so they fail
//! loudly with a configuration error instead.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::SystemConfig;
use crate::error::{Error, Result};
use crate::keys::derive_surrogate_keys;
use crate::traits::{
    CdnProvider, ConnectionStatus, ContentEntity, PurgeLedger, PurgeLogEntry, PurgeMethod,
    PurgeNotifier, Validation, WebhookMessage,
};

/// Which invalidation targets an entity purge covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeScope {
    /// Purge the derived surrogate keys
    pub use_keys: bool,
    /// Purge the entity's canonical URL path
    pub use_path: bool,
}

impl Default for PurgeScope {
    fn default() -> Self {
        Self {
            use_keys: true,
            use_path: true,
        }
    }
}

/// Orchestrates purges against the CDN, recording and notifying each attempt
///
/// Holds an immutable configuration snapshot taken at construction time;
/// build a fresh orchestrator per operation (they are cheap) rather than
/// mutating one in place.
pub struct PurgeOrchestrator {
    config: Arc<SystemConfig>,
    provider: Box<dyn CdnProvider>,
    ledger: Box<dyn PurgeLedger>,
    notifier: Option<Box<dyn PurgeNotifier>>,
}

impl PurgeOrchestrator {
    /// Create a new orchestrator over the given collaborators
    pub fn new(
        config: Arc<SystemConfig>,
        provider: Box<dyn CdnProvider>,
        ledger: Box<dyn PurgeLedger>,
        notifier: Option<Box<dyn PurgeNotifier>>,
    ) -> Self {
        Self {
            config,
            provider,
            ledger,
            notifier,
        }
    }

    /// Purge every invalidation target for a changed entity.
    ///
    /// Silent no-op when the integration is disabled or unconfigured.
    /// Fails with [`Error::MisconfiguredEntity`] when `scope.use_path` is
    /// requested but the entity has no routable capability; that is a
    /// programming error, not a transient one.
    pub async fn purge_entity(&self, entity: &dyn ContentEntity, scope: PurgeScope) -> Result<()> {
        let cdn = &self.config.cdn;

        if !cdn.enabled {
            return Ok(());
        }
        if !cdn.is_configured() {
            debug!(
                "CDN integration is enabled but not configured, skipping purge for {}",
                entity.type_label()
            );
            return Ok(());
        }

        let mut last_error: Option<Error> = None;

        if scope.use_keys {
            let keys = derive_surrogate_keys(entity, &cdn.always_purged_keys);
            for key in &keys {
                if let Err(e) = self.execute_purge(PurgeMethod::Key, key).await {
                    warn!("Purge of surrogate key {:?} failed: {}", key, e);
                    last_error = Some(e);
                }
            }
        }

        if scope.use_path {
            let routable = entity.as_routable().ok_or_else(|| {
                Error::misconfigured_entity(format!(
                    "{} must resolve a canonical path for URL purging to work",
                    entity.type_label()
                ))
            })?;
            let path = routable.canonical_path();
            if let Err(e) = self.execute_purge(PurgeMethod::Url, &path).await {
                warn!("Purge of URL path {:?} failed: {}", path, e);
                last_error = Some(e);
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Purge a single surrogate key (operator action)
    pub async fn purge_key(&self, key: &str) -> Result<()> {
        self.require_configured()?;
        self.execute_purge(PurgeMethod::Key, key).await
    }

    /// Purge a single URL path (operator action)
    pub async fn purge_path(&self, path: &str) -> Result<()> {
        self.require_configured()?;
        self.execute_purge(PurgeMethod::Url, path).await
    }

    /// Purge the entire cache.
    ///
    /// Refuses unless `allow_full_cache_purges` is set; a full purge on a
    /// busy service is an origin-traffic incident waiting to happen.
    pub async fn purge_all(&self) -> Result<()> {
        self.require_configured()?;

        if !self.config.cdn.allow_full_cache_purges {
            return Err(Error::config(
                "Full cache purges are disabled. Enable allow_full_cache_purges if you really want this.",
            ));
        }

        self.execute_purge(PurgeMethod::PurgeAll, "*").await
    }

    /// Test connectivity to the CDN (operator action, no ledger entry)
    pub async fn test_connection(&self) -> Result<ConnectionStatus> {
        self.require_configured()?;
        self.provider.test_connection().await
    }

    /// Validate the currently active service version (operator action)
    pub async fn validate_active_version(&self) -> Result<Validation> {
        self.require_configured()?;
        let version = self.provider.active_version().await?;
        self.provider.validate_version(version).await
    }

    fn require_configured(&self) -> Result<()> {
        if !self.config.cdn.is_configured() {
            return Err(Error::config(
                "CDN is not configured (missing token, service ID, or disabled).",
            ));
        }
        Ok(())
    }

    /// Issue one purge call, record it, notify, and report the outcome.
    ///
    /// The ledger entry and webhook message are written for failures too;
    /// the error is re-raised afterwards so callers still see it.
    async fn execute_purge(&self, method: PurgeMethod, target: &str) -> Result<()> {
        let cdn = &self.config.cdn;
        let soft = cdn.soft_purge;

        let result = match method {
            PurgeMethod::Key => self.provider.purge_key(target, soft).await,
            PurgeMethod::Url => self.provider.purge_url_path(target, soft).await,
            PurgeMethod::PurgeAll => self.provider.purge_all(soft).await,
        };

        let (success, status, body) = match &result {
            Ok(receipt) => (true, Some(receipt.status), receipt.body.clone()),
            Err(e) => (
                false,
                e.response_status(),
                e.response_body()
                    .map(str::to_string)
                    .unwrap_or_else(|| e.to_string()),
            ),
        };

        if cdn.debug_mode {
            debug!(
                "CDN purge {} {:?} -> success={} status={:?}",
                method.as_str(),
                target,
                success,
                status
            );
        }

        if cdn.log_purges {
            let entry = PurgeLogEntry::new(method, target, success, status, body);
            if let Err(e) = self.ledger.record(entry).await {
                // The purge outcome stands on its own; a ledger write
                // failure must not mask it
                warn!("Failed to record purge ledger entry: {}", e);
            }
        }

        self.notify_purge(method, target, success, status).await;

        result.map(|_| ())
    }

    /// Fire-and-forget webhook notification; never fails the purge path
    async fn notify_purge(
        &self,
        method: PurgeMethod,
        target: &str,
        success: bool,
        status: Option<u16>,
    ) {
        let webhook = &self.config.cdn.webhook;
        if !webhook.active {
            return;
        }
        let Some(notifier) = self.notifier.as_deref() else {
            return;
        };

        let mode = if self.config.cdn.soft_purge {
            "soft"
        } else {
            "hard"
        };
        let text = if success {
            format!(
                "Purged ({}, {}) `{}` on service {}",
                method.as_str(),
                mode,
                target,
                self.config.cdn.service_id
            )
        } else {
            format!(
                "Purge ({}) of `{}` on service {} FAILED (status {})",
                method.as_str(),
                target,
                self.config.cdn.service_id,
                status.map(|s| s.to_string()).unwrap_or_else(|| "n/a".to_string())
            )
        };

        let message = WebhookMessage {
            text,
            username: webhook.username.clone(),
            channel: webhook.channel.clone(),
        };

        if let Err(e) = notifier.notify(&message).await {
            warn!("Webhook notification failed (ignored): {}", e);
        }
    }
}
