// # Memory Purge Ledger
//
// In-memory implementation of PurgeLedger.
//
// ## Purpose
//
// Keeps purge history in process memory only. Useful for tests and for
// deployments where purge history is inspected via the webhook trail
// rather than on the box.
//
// ## Crash Behavior
//
// All history is lost on restart. Nothing in the purge path depends on
// reading the ledger back, so this is purely an observability trade-off.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::traits::{PurgeLedger, PurgeLogEntry};
use crate::Error;

/// In-memory purge ledger
///
/// Entries are held in an append-only `Vec` behind a `RwLock`. Clones
/// share the same underlying history.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    inner: Arc<RwLock<Vec<PurgeLogEntry>>>,
}

impl MemoryLedger {
    /// Create a new empty memory ledger
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PurgeLedger for MemoryLedger {
    async fn record(&self, entry: PurgeLogEntry) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.push(entry);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<PurgeLogEntry>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.iter().rev().take(limit).cloned().collect())
    }

    async fn len(&self) -> Result<usize, Error> {
        let guard = self.inner.read().await;
        Ok(guard.len())
    }
}
