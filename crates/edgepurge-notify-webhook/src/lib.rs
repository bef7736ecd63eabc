// # Webhook Purge Notifier
//
// This crate provides an HTTP webhook implementation of the
// `PurgeNotifier` trait for the EdgePurge system.
//
// ## Purpose
//
// Posts a small JSON message for every purge attempt to an
// operator-configured URL (Slack-style incoming webhooks work as-is):
//
// ```json
// {"text": "Purged (key, soft) `blog.post:7` on service svc123",
//  "username": "edgepurge", "channel": "#ops"}
// ```
//
// ## Delivery contract
//
// Best-effort and fire-and-forget: one POST per message, bounded timeout,
// no retries. The purge orchestrator logs and swallows whatever this
// crate reports; delivery failure must never fail a purge.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use edgepurge_core::config::WebhookConfig;
use edgepurge_core::traits::{PurgeNotifier, WebhookMessage};
use edgepurge_core::{Error, Result};

/// Timeout for webhook delivery
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP webhook notifier
pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    /// Create a notifier posting to the given URL
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DELIVERY_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            url: url.into(),
            client,
        }
    }

    /// Create a notifier from configuration.
    ///
    /// Returns `None` when notifications are inactive or no URL is set;
    /// the caller simply wires no notifier in that case.
    pub fn from_config(config: &WebhookConfig) -> Option<Self> {
        if !config.active {
            return None;
        }
        config.url.as_deref().map(Self::new)
    }
}

#[async_trait]
impl PurgeNotifier for WebhookNotifier {
    async fn notify(&self, message: &WebhookMessage) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(message)
            .send()
            .await
            .map_err(|e| Error::webhook(format!("POST failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            return Err(Error::webhook(format!(
                "webhook returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        debug!("Webhook delivered ({})", status);
        Ok(())
    }
}
