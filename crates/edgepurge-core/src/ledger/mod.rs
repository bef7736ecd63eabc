//! Purge ledger implementations
//!
//! - [`MemoryLedger`]: ephemeral, for tests and short-lived processes
//! - [`FileLedger`]: append-only JSON lines on disk

pub mod file;
pub mod memory;

pub use file::FileLedger;
pub use memory::MemoryLedger;

use crate::config::LedgerConfig;
use crate::error::Result;
use crate::traits::PurgeLedger;

/// Construct a ledger from configuration
pub async fn create_ledger(config: &LedgerConfig) -> Result<Box<dyn PurgeLedger>> {
    match config {
        LedgerConfig::Memory => Ok(Box::new(MemoryLedger::new())),
        LedgerConfig::File { path } => Ok(Box::new(FileLedger::new(path).await?)),
    }
}
