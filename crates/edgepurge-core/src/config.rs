//! Configuration types and the file-backed config store
//!
//! This module defines all configuration structures used throughout the
//! crate, plus [`ConfigStore`], which loads and persists them.
//!
//! Components never reach for a global: they receive an `Arc<SystemConfig>`
//! snapshot taken at the start of an operation and thread it through every
//! call. The store only exists so the CLI and the admin update path have a
//! durable place to read and write that snapshot.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::error::{Error, Result};

/// Default Fastly API endpoint, used when `api_endpoint` is not set
pub const DEFAULT_API_ENDPOINT: &str = "https://api.fastly.com";

/// Top-level system configuration
///
/// One serializable document holding every tunable: CDN credentials and
/// cache policy, the CORS edge module, and the purge ledger backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemConfig {
    /// CDN credentials, purge policy, and webhook settings
    #[serde(default)]
    pub cdn: CdnConfig,

    /// CORS edge module configuration
    #[serde(default)]
    pub cors_module: CorsModuleConfig,

    /// Purge ledger backend
    #[serde(default)]
    pub ledger: LedgerConfig,
}

impl SystemConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.cdn.validate()?;
        self.cors_module.validate()?;
        Ok(())
    }
}

/// CDN provider configuration
///
/// Mirrors the operator-facing settings: credentials, TTL policy, purge
/// behavior, and webhook notification options.
#[derive(Clone, Serialize, Deserialize)]
pub struct CdnConfig {
    /// Master switch; when false every orchestration call is a no-op
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Provider type name (resolved through the provider registry)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// API token with purge and configuration access
    #[serde(default)]
    pub api_token: String,

    /// Service ID to control
    #[serde(default)]
    pub service_id: String,

    /// Optional API endpoint override; None uses the provider default
    #[serde(default)]
    pub api_endpoint: Option<String>,

    /// Use soft purge (mark stale, keep serving) instead of hard purge
    #[serde(default = "default_true")]
    pub soft_purge: bool,

    /// Surrogate-Control max-age in seconds (0 disables the header)
    #[serde(default = "default_ttl")]
    pub default_ttl: u32,

    /// Cache-Control max-age in seconds (falls back to `default_ttl` when 0)
    #[serde(default = "default_ttl")]
    pub cache_ttl: u32,

    /// stale-while-revalidate window in seconds (0 = disabled)
    #[serde(default)]
    pub stale_while_revalidate: u32,

    /// stale-if-error window in seconds (0 = disabled)
    #[serde(default)]
    pub stale_if_error: u32,

    /// Safety switch for full cache purges
    #[serde(default)]
    pub allow_full_cache_purges: bool,

    /// Record purge requests in the purge ledger
    #[serde(default = "default_true")]
    pub log_purges: bool,

    /// Extra debug logging for CDN API calls
    #[serde(default)]
    pub debug_mode: bool,

    /// Surrogate keys to purge alongside every entity purge
    #[serde(default)]
    pub always_purged_keys: Vec<String>,

    /// Webhook notification settings
    #[serde(default)]
    pub webhook: WebhookConfig,
}

impl CdnConfig {
    /// Whether the CDN integration is usable: enabled with credentials set.
    ///
    /// Every client construction path checks this before making any call.
    pub fn is_configured(&self) -> bool {
        self.enabled && !self.api_token.is_empty() && !self.service_id.is_empty()
    }

    /// The effective API endpoint (configured override or provider default)
    pub fn endpoint(&self) -> &str {
        self.api_endpoint.as_deref().unwrap_or(DEFAULT_API_ENDPOINT)
    }

    /// Validate the CDN configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(ref endpoint) = self.api_endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(Error::config(format!(
                    "api_endpoint must be an HTTP(S) URL, got: {}",
                    endpoint
                )));
            }
        }

        if self.webhook.active && self.webhook.url.is_none() {
            return Err(Error::config(
                "webhook.active is set but webhook.url is empty",
            ));
        }

        if let Some(ref url) = self.webhook.url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(Error::config(format!(
                    "webhook.url must be an HTTP(S) URL, got: {}",
                    url
                )));
            }
        }

        Ok(())
    }
}

impl Default for CdnConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: default_provider(),
            api_token: String::new(),
            service_id: String::new(),
            api_endpoint: None,
            soft_purge: true,
            default_ttl: default_ttl(),
            cache_ttl: default_ttl(),
            stale_while_revalidate: 0,
            stale_if_error: 0,
            allow_full_cache_purges: false,
            log_purges: true,
            debug_mode: false,
            always_purged_keys: Vec::new(),
            webhook: WebhookConfig::default(),
        }
    }
}

// The API token never appears in logs or debug output.
impl std::fmt::Debug for CdnConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdnConfig")
            .field("enabled", &self.enabled)
            .field("provider", &self.provider)
            .field("api_token", &"<REDACTED>")
            .field("service_id", &self.service_id)
            .field("api_endpoint", &self.api_endpoint)
            .field("soft_purge", &self.soft_purge)
            .field("default_ttl", &self.default_ttl)
            .field("cache_ttl", &self.cache_ttl)
            .field("allow_full_cache_purges", &self.allow_full_cache_purges)
            .field("log_purges", &self.log_purges)
            .field("debug_mode", &self.debug_mode)
            .finish_non_exhaustive()
    }
}

/// Webhook notification settings (e.g. Slack incoming webhook)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Webhook URL to POST purge notifications to
    #[serde(default)]
    pub url: Option<String>,

    /// Optional display name for webhook messages
    #[serde(default)]
    pub username: Option<String>,

    /// Optional channel identifier, e.g. "#ops"
    #[serde(default)]
    pub channel: Option<String>,

    /// Send purge notifications to the configured webhook
    #[serde(default)]
    pub active: bool,
}

/// How the CORS edge module decides which origins are allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginMode {
    /// Allow any origin (`Access-Control-Allow-Origin: *`)
    Anyone,
    /// Allow origins matching `allowed_origins_regex`
    Regex,
}

/// CORS edge module configuration
///
/// Read by the response header composer (serving path) and rendered into a
/// VCL snippet by the edge module deployer (deploy path).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsModuleConfig {
    /// Enable the CORS edge module
    #[serde(default)]
    pub enabled: bool,

    /// What origins are allowed
    #[serde(default = "default_origin_mode")]
    pub origin_mode: OriginMode,

    /// Allowed HTTP methods, e.g. "GET,HEAD,POST,OPTIONS"
    #[serde(default = "default_allowed_methods")]
    pub allowed_methods: String,

    /// Allowed HTTP request headers, e.g. "Content-Type, Authorization"
    #[serde(default)]
    pub allowed_headers: String,

    /// Regex matching allowed origins, without the leading scheme.
    /// Only used in [`OriginMode::Regex`].
    #[serde(default)]
    pub allowed_origins_regex: String,

    /// Max age in seconds for preflight responses (stored, not yet applied)
    #[serde(default = "default_max_age")]
    pub max_age: u32,

    /// Send Access-Control-Allow-Credentials (stored, not yet applied;
    /// requires a non-* origin)
    #[serde(default)]
    pub allow_credentials: bool,
}

impl CorsModuleConfig {
    /// Validate the CORS module configuration
    pub fn validate(&self) -> Result<()> {
        if self.enabled
            && self.origin_mode == OriginMode::Regex
            && self.allowed_origins_regex.trim().is_empty()
        {
            return Err(Error::config(
                "origin_mode is \"regex\" but allowed_origins_regex is empty",
            ));
        }
        Ok(())
    }
}

impl Default for CorsModuleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            origin_mode: default_origin_mode(),
            allowed_methods: default_allowed_methods(),
            allowed_headers: String::new(),
            allowed_origins_regex: String::new(),
            max_age: default_max_age(),
            allow_credentials: false,
        }
    }
}

/// Purge ledger backend configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerConfig {
    /// Append-only JSON-lines file
    File {
        /// Path to the ledger file
        path: String,
    },

    /// In-memory ledger (not persistent; tests and ephemeral deployments)
    #[default]
    Memory,
}

fn default_true() -> bool {
    true
}

fn default_provider() -> String {
    "fastly".to_string()
}

fn default_ttl() -> u32 {
    300
}

fn default_origin_mode() -> OriginMode {
    OriginMode::Anyone
}

fn default_allowed_methods() -> String {
    "GET,HEAD,POST,OPTIONS".to_string()
}

fn default_max_age() -> u32 {
    600
}

/// File-backed configuration store
///
/// Loads [`SystemConfig`] from a JSON file on first access and caches the
/// parsed snapshot. A missing file yields defaults (the integration starts
/// unconfigured, not broken). Updates go through [`ConfigStore::update`],
/// which persists with a write-then-rename so a crash mid-write never
/// leaves a truncated config behind.
pub struct ConfigStore {
    path: PathBuf,
    cached: RwLock<Option<Arc<SystemConfig>>>,
}

impl ConfigStore {
    /// Create a store backed by the given file path.
    ///
    /// Nothing is read until the first [`ConfigStore::get`].
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            cached: RwLock::new(None),
        }
    }

    /// Get the current configuration snapshot (cached-or-freshly-loaded)
    pub async fn get(&self) -> Result<Arc<SystemConfig>> {
        {
            let guard = self.cached.read().await;
            if let Some(ref config) = *guard {
                return Ok(Arc::clone(config));
            }
        }
        self.reload().await
    }

    /// Drop the cache and re-read the file
    pub async fn reload(&self) -> Result<Arc<SystemConfig>> {
        let config = Arc::new(Self::load(&self.path).await?);
        let mut guard = self.cached.write().await;
        *guard = Some(Arc::clone(&config));
        Ok(config)
    }

    /// Administrative update path: mutate, validate, persist, refresh cache.
    ///
    /// Returns the new snapshot. The file on disk is replaced atomically.
    pub async fn update<F>(&self, mutate: F) -> Result<Arc<SystemConfig>>
    where
        F: FnOnce(&mut SystemConfig),
    {
        let mut config = Self::load(&self.path).await?;
        mutate(&mut config);
        config.validate()?;
        self.persist(&config).await?;

        let config = Arc::new(config);
        let mut guard = self.cached.write().await;
        *guard = Some(Arc::clone(&config));
        Ok(config)
    }

    async fn load(path: &Path) -> Result<SystemConfig> {
        if !path.exists() {
            tracing::debug!("Config file does not exist, using defaults: {}", path.display());
            return Ok(SystemConfig::default());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config: SystemConfig = serde_json::from_str(&content).map_err(|e| {
            Error::config(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    async fn persist(&self, config: &SystemConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    Error::config(format!(
                        "Failed to create config directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let json = serde_json::to_string_pretty(config)?;

        // Write to a temporary file first, then rename over the target
        let mut temp_path = self.path.clone();
        temp_path.set_extension("tmp");
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create temp config file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::config(format!(
                    "Failed to write temp config file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            file.flush().await.map_err(|e| {
                Error::config(format!(
                    "Failed to flush temp config file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::config(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::debug!("Config written to {}", self.path.display());
        Ok(())
    }
}
