// # Purge Notifier Trait
//
// Defines the interface for best-effort purge notifications (e.g. a Slack
// incoming webhook).
//
// Delivery is fire-and-forget from the orchestrator's point of view: a
// notifier returning an error gets logged at warn level and the purge
// path continues. Implementations must not retry internally.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The message posted to the webhook
///
/// Serializes to the wire payload directly; `username` and `channel` are
/// omitted when unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookMessage {
    /// Message text
    pub text: String,

    /// Optional display name for the message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Optional channel identifier, e.g. "#ops"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

impl WebhookMessage {
    /// Create a bare text message
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            username: None,
            channel: None,
        }
    }
}

/// Trait for purge notification implementations
#[async_trait]
pub trait PurgeNotifier: Send + Sync {
    /// Deliver one message.
    ///
    /// Failures should surface as `Error::WebhookDelivery`; the caller
    /// decides whether to swallow them (the orchestrator always does).
    async fn notify(&self, message: &WebhookMessage) -> Result<(), crate::Error>;
}
