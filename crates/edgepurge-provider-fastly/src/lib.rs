// # Fastly CDN Provider
//
// This crate provides a Fastly implementation of the `CdnProvider` trait
// for the EdgePurge system.
//
// ## Responsibility boundary
//
// The client is a thin wrapper over the Fastly REST API:
//
// - Makes exactly one HTTP request per trait call (the composite deploy
//   workflow lives in edgepurge-core, not here)
// - Full error propagation to the caller; NO retry or backoff logic
// - NO ledger writes and NO webhook notifications (owned by the purge
//   orchestrator)
// - Bounded timeouts: 5 seconds for read-only checks, 10 seconds for
//   mutating calls
//
// ## Security
//
// - The API token never appears in logs or Debug output
// - The client fails fast at construction if the config is unusable
//
// ## API Reference
//
// - Service detail:   GET  `/service/:service_id`
// - Purge all:        POST `/service/:service_id/purge_all`
// - Purge by key:     POST `/service/:service_id/purge`
// - Purge by URL:     POST `/purge/:path` (no service prefix, no body)
// - Validate version: GET  `/service/:service_id/version/:n/validate`
// - Clone version:    PUT  `/service/:service_id/version/:n/clone`
// - Activate version: PUT  `/service/:service_id/version/:n/activate`
// - Snippet CRUD:     GET/POST/PUT under `/service/:service_id/version/:n/snippet`
//
// Soft purges set the `Fastly-Soft-Purge: 1` header on the purge request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::debug;

use edgepurge_core::config::CdnConfig;
use edgepurge_core::traits::{
    CdnProvider, CdnProviderFactory, ConnectionStatus, PurgeReceipt, SnippetMeta, SnippetProbe,
    SnippetSpec, Validation,
};
use edgepurge_core::{Error, Result};

/// Timeout for read-only checks (service detail, validate, snippet probe)
const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for mutating calls (purges, clone, snippet writes, activate)
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Fastly API client
///
/// Stateless and single-shot: every method issues one request against the
/// configured endpoint and reports the outcome. Retry policy belongs to
/// callers.
pub struct FastlyClient {
    /// Fastly API token. Never log this value.
    api_token: String,

    /// Service ID under control
    service_id: String,

    /// API base URL (default endpoint or configured override)
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for FastlyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastlyClient")
            .field("api_token", &"<REDACTED>")
            .field("service_id", &self.service_id)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl FastlyClient {
    /// Create a client with explicit credentials.
    ///
    /// `base_url` falls back to the default Fastly endpoint. Credentials
    /// are not validated here; use [`FastlyClient::from_config`] for the
    /// checked construction path.
    pub fn new(
        api_token: impl Into<String>,
        service_id: impl Into<String>,
        base_url: Option<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(WRITE_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        let base_url = base_url
            .unwrap_or_else(|| edgepurge_core::config::DEFAULT_API_ENDPOINT.to_string())
            .trim_end_matches('/')
            .to_string();

        Self {
            api_token: api_token.into(),
            service_id: service_id.into(),
            base_url,
            client,
        }
    }

    /// Create a client from configuration.
    ///
    /// Fails with a configuration error when the integration is disabled
    /// or the token / service ID is missing.
    pub fn from_config(config: &CdnConfig) -> Result<Self> {
        if !config.is_configured() {
            return Err(Error::config(
                "Fastly is not configured (missing token, service ID, or disabled).",
            ));
        }
        Ok(Self::new(
            config.api_token.clone(),
            config.service_id.clone(),
            config.api_endpoint.clone(),
        ))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str, read_only: bool) -> reqwest::RequestBuilder {
        let timeout = if read_only { READ_TIMEOUT } else { WRITE_TIMEOUT };
        self.client
            .request(method, self.url(path))
            .timeout(timeout)
            .header("Fastly-Key", &self.api_token)
            .header("Accept", "application/json")
    }

    /// Send a request and collect (status, body) without judging the outcome
    async fn dispatch(&self, builder: reqwest::RequestBuilder) -> Result<(StatusCode, String)> {
        let response = builder
            .send()
            .await
            .map_err(|e| Error::http(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());

        debug!("Fastly API response: {} ({} bytes)", status, body.len());
        Ok((status, body))
    }

    fn parse_json(body: &str) -> Result<Value> {
        serde_json::from_str(body)
            .map_err(|e| Error::cdn(None, format!("Failed to parse response: {}", e)))
    }

    fn receipt(status: StatusCode, body: String) -> Result<PurgeReceipt> {
        if status.is_success() {
            Ok(PurgeReceipt {
                status: status.as_u16(),
                body,
            })
        } else {
            Err(Error::cdn(status.as_u16(), body))
        }
    }

    fn soft_header(builder: reqwest::RequestBuilder, soft: bool) -> reqwest::RequestBuilder {
        if soft {
            builder.header("Fastly-Soft-Purge", "1")
        } else {
            builder
        }
    }
}

#[async_trait]
impl CdnProvider for FastlyClient {
    async fn test_connection(&self) -> Result<ConnectionStatus> {
        let path = format!("/service/{}", self.service_id);
        let (status, body) = self
            .dispatch(self.request(reqwest::Method::GET, &path, true))
            .await?;

        if !status.is_success() {
            return Ok(ConnectionStatus {
                ok: false,
                message: format!("Fastly API error ({}): {}", status.as_u16(), body),
            });
        }

        let json = Self::parse_json(&body)?;
        let name = json["name"].as_str().unwrap_or("Unknown");
        Ok(ConnectionStatus {
            ok: true,
            message: format!("Connection OK. Service name: {}", name),
        })
    }

    async fn purge_all(&self, soft: bool) -> Result<PurgeReceipt> {
        let path = format!("/service/{}/purge_all", self.service_id);
        let builder = Self::soft_header(self.request(reqwest::Method::POST, &path, false), soft);
        let (status, body) = self.dispatch(builder).await?;
        Self::receipt(status, body)
    }

    async fn purge_key(&self, key: &str, soft: bool) -> Result<PurgeReceipt> {
        let path = format!("/service/{}/purge", self.service_id);
        let builder = Self::soft_header(self.request(reqwest::Method::POST, &path, false), soft)
            .json(&json!({ "surrogate_keys": [key] }));
        let (status, body) = self.dispatch(builder).await?;
        Self::receipt(status, body)
    }

    async fn purge_url_path(&self, path: &str, soft: bool) -> Result<PurgeReceipt> {
        // URL purges address the edge directly, without the service prefix
        let path = format!("/purge/{}", path.trim_start_matches('/'));
        let builder = Self::soft_header(self.request(reqwest::Method::POST, &path, false), soft);
        let (status, body) = self.dispatch(builder).await?;
        Self::receipt(status, body)
    }

    async fn active_version(&self) -> Result<u64> {
        let path = format!("/service/{}", self.service_id);
        let (status, body) = self
            .dispatch(self.request(reqwest::Method::GET, &path, true))
            .await?;

        if !status.is_success() {
            return Err(Error::cdn(status.as_u16(), body));
        }

        let json = Self::parse_json(&body)?;
        let versions = json["versions"]
            .as_array()
            .ok_or_else(|| Error::cdn(None, "Invalid response format: versions is not an array"))?;

        let active = versions
            .iter()
            .find(|v| v["active"].as_bool().unwrap_or(false))
            .ok_or_else(|| Error::cdn(None, "No active version found for service"))?;

        active["number"]
            .as_u64()
            .ok_or_else(|| Error::cdn(None, "Active version number is missing or malformed"))
    }

    async fn clone_version(&self, version: u64) -> Result<u64> {
        let path = format!("/service/{}/version/{}/clone", self.service_id, version);
        let (status, body) = self
            .dispatch(self.request(reqwest::Method::PUT, &path, false))
            .await?;

        if !status.is_success() {
            return Err(Error::cdn(status.as_u16(), body));
        }

        let json = Self::parse_json(&body)?;
        json["number"]
            .as_u64()
            .ok_or_else(|| Error::cdn(None, "Clone response has no valid version number"))
    }

    async fn validate_version(&self, version: u64) -> Result<Validation> {
        let path = format!("/service/{}/version/{}/validate", self.service_id, version);
        let (status, body) = self
            .dispatch(self.request(reqwest::Method::GET, &path, true))
            .await?;

        if !status.is_success() {
            return Err(Error::cdn(status.as_u16(), body));
        }

        let json = Self::parse_json(&body)?;
        if json["status"].as_str() == Some("ok") {
            Ok(Validation {
                ok: true,
                message: format!("Version {} is valid.", version),
            })
        } else {
            // A failed validation is a result, not an error
            let message = json["msg"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| body.clone());
            Ok(Validation { ok: false, message })
        }
    }

    async fn activate_version(&self, version: u64) -> Result<()> {
        let path = format!("/service/{}/version/{}/activate", self.service_id, version);
        let (status, body) = self
            .dispatch(self.request(reqwest::Method::PUT, &path, false))
            .await?;

        if !status.is_success() {
            return Err(Error::cdn(status.as_u16(), body));
        }
        Ok(())
    }

    async fn get_snippet(&self, version: u64, name: &str) -> Result<SnippetProbe> {
        let path = format!(
            "/service/{}/version/{}/snippet/{}",
            self.service_id, version, name
        );
        let (status, body) = self
            .dispatch(self.request(reqwest::Method::GET, &path, true))
            .await?;

        if status == StatusCode::NOT_FOUND {
            return Ok(SnippetProbe::NotFound);
        }
        if !status.is_success() {
            return Err(Error::cdn(status.as_u16(), body));
        }

        let json = Self::parse_json(&body)?;
        Ok(SnippetProbe::Existing(SnippetMeta {
            id: json["id"].as_str().map(str::to_string),
            name: json["name"].as_str().unwrap_or(name).to_string(),
        }))
    }

    async fn create_snippet(&self, version: u64, spec: &SnippetSpec) -> Result<()> {
        let path = format!("/service/{}/version/{}/snippet", self.service_id, version);
        let builder = self.request(reqwest::Method::POST, &path, false).json(&json!({
            "name": spec.name,
            "type": spec.snippet_type.as_str(),
            "dynamic": 0,
            "priority": spec.priority,
            "content": spec.content,
        }));
        let (status, body) = self.dispatch(builder).await?;

        if !status.is_success() {
            return Err(Error::cdn(status.as_u16(), body));
        }
        Ok(())
    }

    async fn update_snippet(&self, version: u64, name: &str, content: &str) -> Result<()> {
        let path = format!(
            "/service/{}/version/{}/snippet/{}",
            self.service_id, version, name
        );
        // The resource is addressed by name; the body carries only content
        let builder = self
            .request(reqwest::Method::PUT, &path, false)
            .json(&json!({ "content": content }));
        let (status, body) = self.dispatch(builder).await?;

        if !status.is_success() {
            return Err(Error::cdn(status.as_u16(), body));
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "fastly"
    }
}

/// Factory for creating Fastly clients
pub struct FastlyFactory;

impl CdnProviderFactory for FastlyFactory {
    fn create(&self, config: &CdnConfig) -> Result<Box<dyn CdnProvider>> {
        Ok(Box::new(FastlyClient::from_config(config)?))
    }
}

/// Register the Fastly provider with a registry
///
/// Call during initialization to make the provider available under the
/// `"fastly"` type name.
pub fn register(registry: &edgepurge_core::ProviderRegistry) {
    registry.register_provider("fastly", Box::new(FastlyFactory));
}
