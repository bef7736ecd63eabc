//! Edge module deployment
//!
//! Pushes a rendered edge snippet through the provider's versioned
//! configuration workflow:
//!
//! ```text
//! Start ──▶ ActiveFetched ──▶ (Cloned | SameVersion) ──▶ SnippetChecked
//!                                       │
//!                                       ▼
//!        (Activated | Done) ◀── Validated ◀── SnippetUpserted
//! ```
//!
//! The workflow is fail-fast: the first fatal step aborts the remainder.
//! It is deliberately not transactional across the provider: a clone
//! that succeeds followed by a later failure leaves an orphaned but inert
//! version behind (never activated). Every failure past the point where a
//! target version exists carries that version number so operators can
//! clean up by hand.
//!
//! Re-applying is idempotent because the snippet always lives under the
//! same fixed name: the probe decides create-vs-update, nothing else does.

pub mod vcl;

pub use vcl::CorsVclRenderer;

use tracing::{debug, info};

use crate::config::CorsModuleConfig;
use crate::error::{Error, Result};
use crate::traits::{CdnProvider, SnippetProbe, SnippetRenderer, SnippetSpec, SnippetType};

/// Fixed name of the CORS snippet on the service
pub const CORS_SNIPPET_NAME: &str = "edgepurge-cors-headers";

/// Priority of the CORS snippet among deliver-phase snippets
pub const CORS_SNIPPET_PRIORITY: u32 = 100;

/// Options for a snippet deployment
#[derive(Debug, Clone, Copy)]
pub struct DeployOptions {
    /// Clone the active version and edit the clone (strongly recommended;
    /// editing the active version in place is permitted but discouraged)
    pub autoclone: bool,
    /// Activate the target version after a successful validation
    pub activate: bool,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            autoclone: true,
            activate: false,
        }
    }
}

/// Outcome of a successful deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnippetDeployment {
    /// The version the snippet was written to
    pub version: u64,
    /// Whether that version was activated
    pub activated: bool,
}

/// Run the apply-snippet workflow for the CORS edge module.
///
/// Requires `module.enabled`; a disabled module fails with
/// [`Error::ModuleDisabled`] before any network call.
pub async fn deploy_cors_snippet(
    provider: &dyn CdnProvider,
    renderer: &dyn SnippetRenderer,
    module: &CorsModuleConfig,
    options: DeployOptions,
) -> Result<SnippetDeployment> {
    if !module.enabled {
        return Err(Error::ModuleDisabled);
    }

    let active = provider.active_version().await?;
    debug!("Active version is {}", active);

    let target = if options.autoclone {
        let cloned = provider.clone_version(active).await?;
        info!("Cloned version {} -> {}", active, cloned);
        cloned
    } else {
        debug!("Autoclone disabled, editing version {} in place", active);
        active
    };

    // A target version exists from here on; surface it in any failure
    match apply_to_version(provider, renderer, module, target, options.activate).await {
        Ok(activated) => Ok(SnippetDeployment {
            version: target,
            activated,
        }),
        Err(e) => Err(Error::deploy(target, e)),
    }
}

async fn apply_to_version(
    provider: &dyn CdnProvider,
    renderer: &dyn SnippetRenderer,
    module: &CorsModuleConfig,
    version: u64,
    activate: bool,
) -> Result<bool> {
    let content = renderer.render(module)?;

    match provider.get_snippet(version, CORS_SNIPPET_NAME).await? {
        SnippetProbe::NotFound => {
            debug!("Snippet {} not present on version {}, creating", CORS_SNIPPET_NAME, version);
            let spec = SnippetSpec {
                name: CORS_SNIPPET_NAME.to_string(),
                snippet_type: SnippetType::Deliver,
                priority: CORS_SNIPPET_PRIORITY,
                content,
            };
            provider.create_snippet(version, &spec).await?;
        }
        SnippetProbe::Existing(meta) => {
            debug!(
                "Snippet {} already on version {} (id {:?}), updating",
                CORS_SNIPPET_NAME, version, meta.id
            );
            provider
                .update_snippet(version, CORS_SNIPPET_NAME, &content)
                .await?;
        }
    }

    let validation = provider.validate_version(version).await?;
    if !validation.ok {
        return Err(Error::ValidationFailed {
            version,
            message: validation.message,
        });
    }
    debug!("Version {} validated: {}", version, validation.message);

    if activate {
        provider.activate_version(version).await?;
        info!("Activated version {}", version);
        return Ok(true);
    }

    Ok(false)
}
