//! Core traits for the EdgePurge system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`CdnProvider`]: issue purge and configuration calls against a CDN API
//! - [`Identifiable`] / [`Routable`] / [`ContentEntity`]: capabilities the
//!   external content layer exposes to the core
//! - [`PurgeLedger`]: append-only record of purge attempts
//! - [`PurgeNotifier`]: best-effort webhook delivery
//! - [`SnippetRenderer`]: turn module config into edge snippet content

pub mod cdn;
pub mod entity;
pub mod ledger;
pub mod notify;
pub mod render;

pub use cdn::{
    CdnProvider, CdnProviderFactory, ConnectionStatus, PurgeReceipt, SnippetMeta, SnippetProbe,
    SnippetSpec, SnippetType, Validation,
};
pub use entity::{ContentEntity, Identifiable, Routable};
pub use ledger::{PurgeLedger, PurgeLogEntry, PurgeMethod};
pub use notify::{PurgeNotifier, WebhookMessage};
pub use render::SnippetRenderer;
