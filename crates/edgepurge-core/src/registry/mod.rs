//! Plugin-based CDN provider registry
//!
//! The registry allows CDN providers to be registered dynamically at
//! runtime, avoiding hardcoded if-else chains in the wiring layer.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use edgepurge_core::registry::ProviderRegistry;
//!
//! let registry = ProviderRegistry::new();
//! edgepurge_provider_fastly::register(&registry);
//!
//! let provider = registry.create_provider(&config.cdn)?;
//! ```
//!
//! Provider crates expose a `register(&registry)` function called during
//! initialization.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::config::CdnConfig;
use crate::error::{Error, Result};
use crate::traits::{CdnProvider, CdnProviderFactory};

/// Registry mapping provider type names to factories
///
/// ## Thread Safety
///
/// Uses interior mutability with `RwLock`, allowing concurrent reads and
/// exclusive writes.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, Box<dyn CdnProviderFactory>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a CDN provider factory under a type name
    pub fn register_provider(&self, name: impl Into<String>, factory: Box<dyn CdnProviderFactory>) {
        let name = name.into();
        let mut providers = self.providers.write().unwrap();
        providers.insert(name, factory);
    }

    /// Create a provider from configuration.
    ///
    /// The provider type is taken from `config.provider`. Fails with a
    /// configuration error if the type is not registered, and with
    /// whatever the factory reports (typically `Error::Config` for an
    /// unconfigured integration) if creation fails.
    pub fn create_provider(&self, config: &CdnConfig) -> Result<Box<dyn CdnProvider>> {
        let providers = self.providers.read().unwrap();

        let factory = providers
            .get(&config.provider)
            .ok_or_else(|| Error::config(format!("Unknown CDN provider type: {}", config.provider)))?;

        factory.create(config)
    }

    /// List all registered provider types
    pub fn list_providers(&self) -> Vec<String> {
        let providers = self.providers.read().unwrap();
        providers.keys().cloned().collect()
    }

    /// Check if a provider type is registered
    pub fn has_provider(&self, name: &str) -> bool {
        let providers = self.providers.read().unwrap();
        providers.contains_key(name)
    }
}
