// # Snippet Renderer Trait
//
// Turns edge module configuration into snippet content. Kept behind a
// trait so the deploy workflow can be tested without caring what VCL
// looks like, and so alternative templating can slot in later.

use crate::config::CorsModuleConfig;
use crate::error::Result;

/// Trait for rendering edge module configuration into snippet content
pub trait SnippetRenderer: Send + Sync {
    /// Render the CORS module into snippet content.
    ///
    /// Failures surface as `Error::SnippetRender` carrying the cause.
    fn render(&self, module: &CorsModuleConfig) -> Result<String>;
}
