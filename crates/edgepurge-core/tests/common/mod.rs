//! Test doubles and common utilities for contract tests
//!
//! This module provides a scriptable CDN provider and notifier doubles
//! that record every interaction, so tests can assert on call sequences
//! and shapes rather than just outcomes.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use edgepurge_core::config::{CdnConfig, CorsModuleConfig, SystemConfig};
use edgepurge_core::traits::{
    CdnProvider, ConnectionStatus, ContentEntity, Identifiable, PurgeNotifier, PurgeReceipt,
    Routable, SnippetMeta, SnippetProbe, SnippetRenderer, SnippetSpec, Validation, WebhookMessage,
};
use edgepurge_core::{Error, Result};

/// One recorded provider interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    TestConnection,
    PurgeAll { soft: bool },
    PurgeKey { key: String, soft: bool },
    PurgeUrl { path: String, soft: bool },
    ActiveVersion,
    CloneVersion(u64),
    ValidateVersion(u64),
    ActivateVersion(u64),
    GetSnippet { version: u64, name: String },
    CreateSnippet { version: u64, name: String, priority: u32 },
    UpdateSnippet { version: u64, name: String },
}

/// A scriptable CDN provider that records every call
#[derive(Clone)]
pub struct MockCdnProvider {
    calls: Arc<Mutex<Vec<ProviderCall>>>,
    /// Purge targets that fail with HTTP 500
    failing_targets: Arc<Mutex<HashSet<String>>>,
    pub active_version: u64,
    pub cloned_version: u64,
    pub validate_ok: bool,
    pub snippet_exists: bool,
}

impl MockCdnProvider {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            failing_targets: Arc::new(Mutex::new(HashSet::new())),
            active_version: 1,
            cloned_version: 2,
            validate_ok: true,
            snippet_exists: false,
        }
    }

    /// Make purges of the given key or path fail with HTTP 500
    pub fn fail_target(self, target: &str) -> Self {
        self.failing_targets.lock().unwrap().insert(target.to_string());
        self
    }

    pub fn with_snippet_existing(mut self) -> Self {
        self.snippet_exists = true;
        self
    }

    pub fn with_validation_failure(mut self) -> Self {
        self.validate_ok = false;
        self
    }

    /// Everything the provider was asked to do, in order
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: ProviderCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn purge_outcome(&self, target: &str) -> Result<PurgeReceipt> {
        if self.failing_targets.lock().unwrap().contains(target) {
            Err(Error::cdn(500, "simulated provider failure"))
        } else {
            Ok(PurgeReceipt {
                status: 200,
                body: "{\"status\":\"ok\"}".to_string(),
            })
        }
    }
}

#[async_trait]
impl CdnProvider for MockCdnProvider {
    async fn test_connection(&self) -> Result<ConnectionStatus> {
        self.record(ProviderCall::TestConnection);
        Ok(ConnectionStatus {
            ok: true,
            message: "Connection OK. Service name: Mock Service".to_string(),
        })
    }

    async fn purge_all(&self, soft: bool) -> Result<PurgeReceipt> {
        self.record(ProviderCall::PurgeAll { soft });
        self.purge_outcome("*")
    }

    async fn purge_key(&self, key: &str, soft: bool) -> Result<PurgeReceipt> {
        self.record(ProviderCall::PurgeKey {
            key: key.to_string(),
            soft,
        });
        self.purge_outcome(key)
    }

    async fn purge_url_path(&self, path: &str, soft: bool) -> Result<PurgeReceipt> {
        self.record(ProviderCall::PurgeUrl {
            path: path.to_string(),
            soft,
        });
        self.purge_outcome(path)
    }

    async fn active_version(&self) -> Result<u64> {
        self.record(ProviderCall::ActiveVersion);
        Ok(self.active_version)
    }

    async fn clone_version(&self, version: u64) -> Result<u64> {
        self.record(ProviderCall::CloneVersion(version));
        Ok(self.cloned_version)
    }

    async fn validate_version(&self, version: u64) -> Result<Validation> {
        self.record(ProviderCall::ValidateVersion(version));
        if self.validate_ok {
            Ok(Validation {
                ok: true,
                message: format!("Version {} is valid", version),
            })
        } else {
            Ok(Validation {
                ok: false,
                message: "syntax error in generated VCL".to_string(),
            })
        }
    }

    async fn activate_version(&self, version: u64) -> Result<()> {
        self.record(ProviderCall::ActivateVersion(version));
        Ok(())
    }

    async fn get_snippet(&self, version: u64, name: &str) -> Result<SnippetProbe> {
        self.record(ProviderCall::GetSnippet {
            version,
            name: name.to_string(),
        });
        if self.snippet_exists {
            Ok(SnippetProbe::Existing(SnippetMeta {
                id: Some("snip-123".to_string()),
                name: name.to_string(),
            }))
        } else {
            Ok(SnippetProbe::NotFound)
        }
    }

    async fn create_snippet(&self, version: u64, spec: &SnippetSpec) -> Result<()> {
        self.record(ProviderCall::CreateSnippet {
            version,
            name: spec.name.clone(),
            priority: spec.priority,
        });
        Ok(())
    }

    async fn update_snippet(&self, version: u64, name: &str, _content: &str) -> Result<()> {
        self.record(ProviderCall::UpdateSnippet {
            version,
            name: name.to_string(),
        });
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Notifier that records every delivered message
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<WebhookMessage>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<WebhookMessage> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl PurgeNotifier for RecordingNotifier {
    async fn notify(&self, message: &WebhookMessage) -> Result<()> {
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Notifier that always fails delivery
pub struct FailingNotifier;

#[async_trait]
impl PurgeNotifier for FailingNotifier {
    async fn notify(&self, _message: &WebhookMessage) -> Result<()> {
        Err(Error::webhook("connection refused"))
    }
}

/// Renderer that always fails
pub struct FailingRenderer;

impl SnippetRenderer for FailingRenderer {
    fn render(&self, _module: &CorsModuleConfig) -> Result<String> {
        Err(Error::snippet_render("template exploded"))
    }
}

/// A routable blog post entity
pub struct TestPost {
    pub id: u64,
    pub slug: String,
}

impl Identifiable for TestPost {
    fn type_label(&self) -> &str {
        "blog.post"
    }

    fn primary_key(&self) -> Option<String> {
        Some(self.id.to_string())
    }

    fn slug(&self) -> Option<String> {
        Some(self.slug.clone())
    }
}

impl Routable for TestPost {
    fn canonical_path(&self) -> String {
        format!("/blog/{}/", self.slug)
    }
}

impl ContentEntity for TestPost {
    fn as_routable(&self) -> Option<&dyn Routable> {
        Some(self)
    }
}

/// An entity with no routable capability and no pk/slug
pub struct BareEntity;

impl Identifiable for BareEntity {
    fn type_label(&self) -> &str {
        "site.setting"
    }

    fn primary_key(&self) -> Option<String> {
        None
    }

    fn slug(&self) -> Option<String> {
        None
    }
}

impl ContentEntity for BareEntity {}

/// A configured, enabled system config pointing at a mock service
pub fn configured() -> SystemConfig {
    SystemConfig {
        cdn: CdnConfig {
            api_token: "test-token".to_string(),
            service_id: "svc123".to_string(),
            ..CdnConfig::default()
        },
        ..SystemConfig::default()
    }
}
