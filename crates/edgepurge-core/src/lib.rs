// # edgepurge-core
//
// Core library for the EdgePurge CDN cache-invalidation system.
//
// ## Architecture Overview
//
// This library provides the core functionality for CDN cache invalidation:
// - **CdnProvider**: Trait for purge and versioned-configuration calls
//   against a CDN provider's API
// - **ContentEntity / Identifiable / Routable**: Capability traits the
//   external content layer implements
// - **PurgeLedger**: Append-only record of purge attempts
// - **PurgeOrchestrator**: Derives keys and drives the purge → ledger →
//   webhook flow for a changed entity
// - **deploy**: The clone → upsert → validate → activate workflow for
//   edge snippets
// - **headers**: Cache/surrogate/CORS response header composition
// - **ProviderRegistry**: Plugin-based registry for CDN providers
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Providers wrap the wire; the orchestrator
//    owns policy (logging, notification, failure aggregation)
// 2. **Explicit configuration**: components receive an immutable config
//    snapshot, no hidden global state
// 3. **Plugin-Based**: Providers are registered dynamically, no hard-coded
//    if-else
// 4. **Library-First**: All core functionality can be used as a library

pub mod config;
pub mod deploy;
pub mod error;
pub mod headers;
pub mod keys;
pub mod ledger;
pub mod orchestrator;
pub mod registry;
pub mod traits;

// Re-export core types for convenience
pub use config::{CdnConfig, ConfigStore, CorsModuleConfig, LedgerConfig, OriginMode, SystemConfig};
pub use error::{Error, Result};
pub use keys::derive_surrogate_keys;
pub use ledger::{FileLedger, MemoryLedger};
pub use orchestrator::{PurgeOrchestrator, PurgeScope};
pub use registry::ProviderRegistry;
pub use traits::{CdnProvider, ContentEntity, Identifiable, PurgeLedger, PurgeNotifier, Routable};
