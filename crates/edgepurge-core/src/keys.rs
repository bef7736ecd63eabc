//! Surrogate-key derivation
//!
//! Pure, deterministic computation of the canonical invalidation key set
//! for a changed entity. No network, no persistence, no config store:
//! the caller hands in the always-purged keys it read from its snapshot.
//!
//! Derivation rules, in order:
//!
//! 1. the entity's type label, always (e.g. `blog.post`)
//! 2. `{label}:{pk}` when the primary key is non-empty
//! 3. `{label}:slug:{slug}` when the slug is non-empty
//! 4. every non-blank always-purged key, verbatim
//!
//! The result is a set: duplicates collapse, and `BTreeSet` iteration
//! gives callers a stable sorted order for display and logging.

use std::collections::BTreeSet;

use crate::traits::Identifiable;

/// Derive the canonical surrogate-key set for an entity.
///
/// Empty entity attributes contribute no key; blank `always_keys` entries
/// are skipped after trimming.
pub fn derive_surrogate_keys(
    entity: &dyn Identifiable,
    always_keys: &[String],
) -> BTreeSet<String> {
    let mut keys = BTreeSet::new();

    let label = entity.type_label();
    keys.insert(label.to_string());

    if let Some(pk) = entity.primary_key() {
        if !pk.is_empty() {
            keys.insert(format!("{}:{}", label, pk));
        }
    }

    if let Some(slug) = entity.slug() {
        if !slug.is_empty() {
            keys.insert(format!("{}:slug:{}", label, slug));
        }
    }

    for line in always_keys {
        let line = line.trim();
        if !line.is_empty() {
            keys.insert(line.to_string());
        }
    }

    keys
}
