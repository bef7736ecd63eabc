//! Orchestrator contract tests
//!
//! Verifies the purge orchestrator's promises: the off-switch policies
//! make zero network calls, individual target failures never stop the
//! batch, every attempt lands in the ledger, and webhook delivery can
//! never fail a purge.

mod common;

use std::sync::Arc;

use common::{
    configured, BareEntity, FailingNotifier, MockCdnProvider, ProviderCall, RecordingNotifier,
    TestPost,
};
use edgepurge_core::ledger::MemoryLedger;
use edgepurge_core::orchestrator::{PurgeOrchestrator, PurgeScope};
use edgepurge_core::traits::{PurgeLedger, PurgeMethod};
use edgepurge_core::Error;

fn orchestrator(
    config: edgepurge_core::SystemConfig,
    provider: MockCdnProvider,
    ledger: MemoryLedger,
    notifier: Option<Box<dyn edgepurge_core::PurgeNotifier>>,
) -> PurgeOrchestrator {
    PurgeOrchestrator::new(
        Arc::new(config),
        Box::new(provider),
        Box::new(ledger),
        notifier,
    )
}

#[tokio::test]
async fn disabled_integration_is_a_silent_noop() {
    let mut config = configured();
    config.cdn.enabled = false;

    let provider = MockCdnProvider::new();
    let ledger = MemoryLedger::new();
    let orch = orchestrator(config, provider.clone(), ledger.clone(), None);

    let post = TestPost {
        id: 1,
        slug: "hello".to_string(),
    };
    orch.purge_entity(&post, PurgeScope::default()).await.unwrap();

    assert_eq!(provider.call_count(), 0, "no network calls when disabled");
    assert_eq!(ledger.len().await.unwrap(), 0);
}

#[tokio::test]
async fn unconfigured_integration_is_a_silent_noop() {
    // Enabled but with no token: the feature-off policy, not an error
    let mut config = configured();
    config.cdn.api_token = String::new();

    let provider = MockCdnProvider::new();
    let ledger = MemoryLedger::new();
    let orch = orchestrator(config, provider.clone(), ledger.clone(), None);

    let post = TestPost {
        id: 1,
        slug: "hello".to_string(),
    };
    orch.purge_entity(&post, PurgeScope::default()).await.unwrap();

    assert_eq!(provider.call_count(), 0);
    assert_eq!(ledger.len().await.unwrap(), 0);
}

#[tokio::test]
async fn admin_actions_fail_loudly_when_unconfigured() {
    let mut config = configured();
    config.cdn.service_id = String::new();

    let provider = MockCdnProvider::new();
    let orch = orchestrator(config, provider.clone(), MemoryLedger::new(), None);

    let err = orch.purge_key("blog.post").await.unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().contains("not configured"));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn partial_failure_attempts_every_target_and_reports_last_error() {
    // Three derived keys, sorted: blog.post, blog.post:7, blog.post:slug:hello.
    // The middle one fails; both others must still be attempted.
    let provider = MockCdnProvider::new().fail_target("blog.post:7");
    let ledger = MemoryLedger::new();
    let orch = orchestrator(configured(), provider.clone(), ledger.clone(), None);

    let post = TestPost {
        id: 7,
        slug: "hello".to_string(),
    };
    let err = orch
        .purge_entity(
            &post,
            PurgeScope {
                use_keys: true,
                use_path: false,
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.response_status(), Some(500));

    let calls = provider.calls();
    assert_eq!(calls.len(), 3, "failure must not stop the batch");
    assert!(matches!(&calls[2], ProviderCall::PurgeKey { key, .. } if key == "blog.post:slug:hello"));

    // Ledger: success, failure, success, in attempt order
    let entries: Vec<_> = ledger.recent(10).await.unwrap().into_iter().rev().collect();
    assert_eq!(entries.len(), 3);
    assert!(entries[0].success);
    assert!(!entries[1].success);
    assert_eq!(entries[1].target, "blog.post:7");
    assert_eq!(entries[1].response_status, Some(500));
    assert!(entries[2].success);
}

#[tokio::test]
async fn path_purge_failure_is_reported_after_keys_succeed() {
    let provider = MockCdnProvider::new().fail_target("/blog/hello/");
    let ledger = MemoryLedger::new();
    let orch = orchestrator(configured(), provider.clone(), ledger.clone(), None);

    let post = TestPost {
        id: 7,
        slug: "hello".to_string(),
    };
    let err = orch.purge_entity(&post, PurgeScope::default()).await.unwrap_err();
    assert_eq!(err.response_status(), Some(500));

    // 3 key purges + 1 URL purge, all attempted
    assert_eq!(provider.call_count(), 4);
    let entries = ledger.recent(10).await.unwrap();
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0].method, PurgeMethod::Url);
    assert!(!entries[0].success);
}

#[tokio::test]
async fn unroutable_entity_is_a_misconfiguration() {
    let provider = MockCdnProvider::new();
    let orch = orchestrator(configured(), provider.clone(), MemoryLedger::new(), None);

    let err = orch
        .purge_entity(&BareEntity, PurgeScope::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MisconfiguredEntity(_)));
    assert!(err.to_string().contains("site.setting"));

    // Key purges (just the type label here) still ran before the error
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn always_purged_keys_join_the_batch() {
    let mut config = configured();
    config.cdn.always_purged_keys = vec!["frontpage".to_string(), "  ".to_string()];

    let provider = MockCdnProvider::new();
    let orch = orchestrator(config, provider.clone(), MemoryLedger::new(), None);

    let post = TestPost {
        id: 7,
        slug: "hello".to_string(),
    };
    orch.purge_entity(
        &post,
        PurgeScope {
            use_keys: true,
            use_path: false,
        },
    )
    .await
    .unwrap();

    let keys: Vec<String> = provider
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            ProviderCall::PurgeKey { key, .. } => Some(key),
            _ => None,
        })
        .collect();
    assert!(keys.contains(&"frontpage".to_string()));
    assert_eq!(keys.len(), 4, "blank always-keys are skipped");
}

#[tokio::test]
async fn soft_purge_setting_reaches_the_wire() {
    let mut config = configured();
    config.cdn.soft_purge = false;

    let provider = MockCdnProvider::new();
    let orch = orchestrator(config, provider.clone(), MemoryLedger::new(), None);

    orch.purge_key("blog.post").await.unwrap();
    assert_eq!(
        provider.calls(),
        vec![ProviderCall::PurgeKey {
            key: "blog.post".to_string(),
            soft: false,
        }]
    );
}

#[tokio::test]
async fn purge_all_is_gated_behind_the_safety_switch() {
    let provider = MockCdnProvider::new();
    let ledger = MemoryLedger::new();
    let orch = orchestrator(configured(), provider.clone(), ledger.clone(), None);

    let err = orch.purge_all().await.unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert_eq!(provider.call_count(), 0);

    let mut config = configured();
    config.cdn.allow_full_cache_purges = true;
    let orch = orchestrator(config, provider.clone(), ledger.clone(), None);
    orch.purge_all().await.unwrap();

    assert_eq!(provider.calls(), vec![ProviderCall::PurgeAll { soft: true }]);
    let entries = ledger.recent(10).await.unwrap();
    assert_eq!(entries[0].method, PurgeMethod::PurgeAll);
    assert_eq!(entries[0].target, "*");
}

#[tokio::test]
async fn log_purges_off_skips_the_ledger_but_not_the_purge() {
    let mut config = configured();
    config.cdn.log_purges = false;

    let provider = MockCdnProvider::new();
    let ledger = MemoryLedger::new();
    let orch = orchestrator(config, provider.clone(), ledger.clone(), None);

    orch.purge_key("blog.post").await.unwrap();
    assert_eq!(provider.call_count(), 1);
    assert_eq!(ledger.len().await.unwrap(), 0);
}

#[tokio::test]
async fn webhook_failure_never_fails_the_purge() {
    let mut config = configured();
    config.cdn.webhook.active = true;
    config.cdn.webhook.url = Some("https://hooks.example.com/T000".to_string());

    let provider = MockCdnProvider::new();
    let orch = orchestrator(
        config,
        provider.clone(),
        MemoryLedger::new(),
        Some(Box::new(FailingNotifier)),
    );

    orch.purge_key("blog.post").await.unwrap();
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn webhook_messages_carry_identity_and_outcome() {
    let mut config = configured();
    config.cdn.webhook.active = true;
    config.cdn.webhook.url = Some("https://hooks.example.com/T000".to_string());
    config.cdn.webhook.username = Some("edgepurge".to_string());
    config.cdn.webhook.channel = Some("#ops".to_string());

    let provider = MockCdnProvider::new().fail_target("blog.post:broken");
    let notifier = RecordingNotifier::new();
    let orch = orchestrator(
        config,
        provider,
        MemoryLedger::new(),
        Some(Box::new(notifier.clone())),
    );

    orch.purge_key("blog.post").await.unwrap();
    let _ = orch.purge_key("blog.post:broken").await;

    let messages = notifier.messages();
    assert_eq!(messages.len(), 2, "failed purges notify too");
    assert_eq!(messages[0].username.as_deref(), Some("edgepurge"));
    assert_eq!(messages[0].channel.as_deref(), Some("#ops"));
    assert!(messages[0].text.contains("blog.post"));
    assert!(messages[1].text.contains("FAILED"));
}

#[tokio::test]
async fn webhook_inactive_sends_nothing() {
    let notifier = RecordingNotifier::new();
    let orch = orchestrator(
        configured(),
        MockCdnProvider::new(),
        MemoryLedger::new(),
        Some(Box::new(notifier.clone())),
    );

    orch.purge_key("blog.post").await.unwrap();
    assert!(notifier.messages().is_empty());
}

#[tokio::test]
async fn validate_active_version_resolves_the_active_version_first() {
    let provider = MockCdnProvider::new();
    let orch = orchestrator(configured(), provider.clone(), MemoryLedger::new(), None);

    let validation = orch.validate_active_version().await.unwrap();
    assert!(validation.ok);
    assert_eq!(
        provider.calls(),
        vec![ProviderCall::ActiveVersion, ProviderCall::ValidateVersion(1)]
    );
}
