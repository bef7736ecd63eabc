// # edgepurgectl - EdgePurge Operator CLI
//
// Thin integration layer wiring the EdgePurge pieces together for
// operators: connectivity tests, manual purges, version validation, and
// CORS edge module deployment. All orchestration logic lives in
// edgepurge-core; this binary only parses arguments, loads configuration,
// and prints outcomes.
//
// ## Configuration
//
// Configuration is a JSON file (see `SystemConfig`). The path is resolved
// in order:
//
// 1. `--config <path>`
// 2. `EDGEPURGE_CONFIG` environment variable
// 3. `./edgepurge.json`
//
// Log level comes from `EDGEPURGE_LOG` (trace|debug|info|warn|error,
// default info).
//
// ## Exit codes
//
// - 0: success
// - 1: configuration error (unusable config, integration not configured,
//      gated-off action)
// - 2: runtime error (CDN rejected a call, validation failed, transport
//      failure)

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use edgepurge_core::config::{ConfigStore, SystemConfig};
use edgepurge_core::deploy::{deploy_cors_snippet, CorsVclRenderer, DeployOptions};
use edgepurge_core::ledger::create_ledger;
use edgepurge_core::orchestrator::PurgeOrchestrator;
use edgepurge_core::traits::PurgeNotifier;
use edgepurge_core::{Error, ProviderRegistry};
use edgepurge_notify_webhook::WebhookNotifier;

/// Exit codes following the conventions used by the daemon tooling
#[derive(Debug, Clone, Copy)]
enum CtlExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<CtlExitCode> for ExitCode {
    fn from(code: CtlExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

#[derive(Parser, Debug)]
#[command(name = "edgepurgectl", version, about = "EdgePurge CDN cache control")]
struct Cli {
    /// Path to the config file (JSON); falls back to $EDGEPURGE_CONFIG,
    /// then ./edgepurge.json
    #[arg(long = "config", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Test connectivity to the CDN service
    TestConnection,
    /// Purge the entire cache (requires allow_full_cache_purges)
    PurgeAll,
    /// Purge a single surrogate key
    PurgeKey {
        /// Surrogate key, e.g. "blog.post:7"
        key: String,
    },
    /// Purge a single URL path
    PurgeUrl {
        /// URL path, e.g. "/blog/my-first-post/"
        path: String,
    },
    /// Validate the currently active service version
    Validate,
    /// Render the CORS edge module and deploy it as a snippet
    DeployCors {
        /// Edit the active version in place instead of cloning it
        #[arg(long = "no-clone")]
        no_clone: bool,
        /// Activate the target version after validation
        #[arg(long = "activate")]
        activate: bool,
    },
    /// Print the effective configuration (token redacted)
    ShowConfig,
    /// Print recent purge ledger entries
    Ledger {
        /// Maximum number of entries to show
        #[arg(long = "limit", default_value_t = 20)]
        limit: usize,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match env::var("EDGEPURGE_LOG")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return CtlExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to create tokio runtime: {}", e);
            return CtlExitCode::RuntimeError.into();
        }
    };

    let outcome = rt.block_on(run(cli));
    match outcome {
        Ok(code) => code.into(),
        Err(e) => {
            eprintln!("{}", e);
            // Configuration problems get their own exit code so scripts
            // can tell "set it up first" apart from "the CDN said no"
            let code = match e.downcast_ref::<Error>() {
                Some(Error::Config(_)) => CtlExitCode::ConfigError,
                _ => CtlExitCode::RuntimeError,
            };
            code.into()
        }
    }
}

fn config_path(cli: &Cli) -> PathBuf {
    cli.config
        .clone()
        .or_else(|| env::var("EDGEPURGE_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("edgepurge.json"))
}

async fn run(cli: Cli) -> Result<CtlExitCode> {
    let path = config_path(&cli);
    debug!("Loading configuration from {}", path.display());

    let store = ConfigStore::new(&path);
    let config = store.get().await?;

    let registry = ProviderRegistry::new();
    edgepurge_provider_fastly::register(&registry);

    match cli.command {
        Commands::TestConnection => {
            let orch = build_orchestrator(&config, &registry).await?;
            let status = orch.test_connection().await?;
            println!("{}", status.message);
            Ok(if status.ok {
                CtlExitCode::Success
            } else {
                CtlExitCode::RuntimeError
            })
        }

        Commands::PurgeAll => {
            let orch = build_orchestrator(&config, &registry).await?;
            orch.purge_all().await?;
            println!("Triggered full cache purge.");
            Ok(CtlExitCode::Success)
        }

        Commands::PurgeKey { key } => {
            let orch = build_orchestrator(&config, &registry).await?;
            orch.purge_key(&key).await?;
            println!("Purged surrogate key {}.", key);
            Ok(CtlExitCode::Success)
        }

        Commands::PurgeUrl { path } => {
            let orch = build_orchestrator(&config, &registry).await?;
            orch.purge_path(&path).await?;
            println!("Purged URL path {}.", path);
            Ok(CtlExitCode::Success)
        }

        Commands::Validate => {
            let orch = build_orchestrator(&config, &registry).await?;
            let validation = orch.validate_active_version().await?;
            println!("{}", validation.message);
            Ok(if validation.ok {
                CtlExitCode::Success
            } else {
                CtlExitCode::RuntimeError
            })
        }

        Commands::DeployCors { no_clone, activate } => {
            let provider = registry.create_provider(&config.cdn)?;
            let deployment = deploy_cors_snippet(
                provider.as_ref(),
                &CorsVclRenderer::new(),
                &config.cors_module,
                DeployOptions {
                    autoclone: !no_clone,
                    activate,
                },
            )
            .await?;

            if deployment.activated {
                println!("Deployed CORS snippet to version {} and activated it.", deployment.version);
            } else {
                println!(
                    "Deployed CORS snippet to version {} (not activated; use --activate or activate it manually).",
                    deployment.version
                );
            }
            Ok(CtlExitCode::Success)
        }

        Commands::ShowConfig => {
            println!("{}", render_config(&config)?);
            Ok(CtlExitCode::Success)
        }

        Commands::Ledger { limit } => {
            let ledger = create_ledger(&config.ledger).await?;
            let entries = ledger.recent(limit).await?;
            if entries.is_empty() {
                println!("No purge ledger entries.");
            }
            for entry in entries {
                println!(
                    "{}  {:9}  {:5}  {:4}  {}",
                    entry.created_at.format("%Y-%m-%d %H:%M:%S"),
                    entry.method.as_str(),
                    if entry.success { "ok" } else { "FAIL" },
                    entry
                        .response_status
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    entry.target,
                );
            }
            Ok(CtlExitCode::Success)
        }
    }
}

async fn build_orchestrator(
    config: &std::sync::Arc<SystemConfig>,
    registry: &ProviderRegistry,
) -> Result<PurgeOrchestrator> {
    let provider = registry.create_provider(&config.cdn)?;
    let ledger = create_ledger(&config.ledger).await?;
    let notifier: Option<Box<dyn PurgeNotifier>> = WebhookNotifier::from_config(&config.cdn.webhook)
        .map(|n| Box::new(n) as Box<dyn PurgeNotifier>);

    Ok(PurgeOrchestrator::new(
        config.clone(),
        provider,
        ledger,
        notifier,
    ))
}

/// Pretty-print the configuration with the API token redacted
fn render_config(config: &SystemConfig) -> Result<String> {
    let mut clone = config.clone();
    if !clone.cdn.api_token.is_empty() {
        clone.cdn.api_token = "<redacted>".to_string();
    }
    Ok(serde_json::to_string_pretty(&clone)?)
}
