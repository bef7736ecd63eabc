// # Content Entity Capabilities
//
// The content layer (blog posts, pages, whatever emits change events) is
// an external collaborator. The core never persists or inspects entities;
// it depends on them only through the capability traits defined here.
//
// Two capabilities exist:
//
// - `Identifiable`: a stable type label plus optional primary key and
//   slug. Enough to derive surrogate keys.
// - `Routable`: resolve the canonical URL path. Required for path-based
//   purging; entities without a public page simply don't implement it.
//
// `ContentEntity` is the object-safe umbrella the orchestrator accepts.
// Whether an entity is routable is a runtime question (`as_routable`),
// because the event source hands the orchestrator heterogeneous entities
// behind one trait object.

/// Capability: stable identity for surrogate-key derivation
pub trait Identifiable: Send + Sync {
    /// Stable type label, e.g. `"blog.post"`
    fn type_label(&self) -> &str;

    /// Primary key rendered as a string, if the entity is persisted
    fn primary_key(&self) -> Option<String>;

    /// URL slug, if the entity has one
    fn slug(&self) -> Option<String>;
}

/// Capability: canonical URL path resolution
pub trait Routable {
    /// The canonical path for this entity, e.g. `/blog/my-first-post/`
    fn canonical_path(&self) -> String;
}

/// The combined view the purge orchestrator operates on
pub trait ContentEntity: Identifiable {
    /// The routable capability, when this entity has a public page.
    ///
    /// Returning `None` while a caller requests path purging is a
    /// programming error and surfaces as `Error::MisconfiguredEntity`.
    fn as_routable(&self) -> Option<&dyn Routable> {
        None
    }
}
