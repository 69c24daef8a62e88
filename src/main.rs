//! Suggestion Composer CLI
//!
//! Renders the desired Deployment, Service and storage for a Suggestion
//! manifest as a multi-document YAML stream on stdout.

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use suggestion_composer::config::{fetch_config_map, load_config_map};
use suggestion_composer::{
    Composer, ComposerConfig, ConfigStore, DesiredResources, Error, Suggestion,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Suggestion Composer - desired state for Katib suggestion services
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Suggestion manifest (YAML or JSON)
    #[arg(long, env = "SUGGESTION_MANIFEST")]
    suggestion: PathBuf,

    /// katib-config ConfigMap manifest (YAML or JSON)
    #[arg(long, env = "KATIB_CONFIG", conflicts_with = "from_cluster")]
    config: Option<PathBuf>,

    /// Read the katib-config ConfigMap from the cluster instead of a file
    #[arg(long, env = "FROM_CLUSTER")]
    from_cluster: bool,

    /// Namespace of the katib-config ConfigMap
    #[arg(long, env = "KATIB_CONFIG_NAMESPACE", default_value = "kubeflow")]
    config_namespace: String,

    /// Name of the katib-config ConfigMap
    #[arg(long, env = "KATIB_CONFIG_NAME", default_value = "katib-config")]
    config_name: String,

    /// Leave gRPC health probes off the suggestion container
    #[arg(long, env = "DISABLE_GRPC_PROBE")]
    disable_grpc_probe: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args);

    info!("Starting Suggestion Composer");
    info!("  Version: {}", suggestion_composer::VERSION);
    info!("  Suggestion: {}", args.suggestion.display());
    info!("  gRPC probe: {}", !args.disable_grpc_probe);

    let suggestion = load_suggestion(&args.suggestion)?;
    let store = load_store(&args).await?;

    let config = ComposerConfig {
        enable_grpc_probe: !args.disable_grpc_probe,
        ..Default::default()
    };
    let composer = Composer::new(config, store);

    let desired = composer
        .desired_resources(&suggestion)
        .with_context(|| format!("composing resources for {}", suggestion.composed_name()))?;

    write_manifests(&desired)?;

    info!("Composed resources for {}", suggestion.composed_name());
    Ok(())
}

// =============================================================================
// Inputs
// =============================================================================

fn load_suggestion(path: &Path) -> anyhow::Result<Suggestion> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading suggestion manifest {}", path.display()))?;
    let suggestion: Suggestion = serde_yaml::from_str(&raw)
        .with_context(|| format!("parsing suggestion manifest {}", path.display()))?;

    debug!(
        "Loaded suggestion {} (algorithm: {}, resume policy: {})",
        suggestion.composed_name(),
        suggestion.algorithm_name(),
        suggestion.spec.resume_policy
    );
    Ok(suggestion)
}

async fn load_store(args: &Args) -> anyhow::Result<Arc<dyn ConfigStore>> {
    if let Some(path) = &args.config {
        let config_map = load_config_map(path)
            .with_context(|| format!("loading katib config {}", path.display()))?;
        let store: Arc<dyn ConfigStore> = Arc::new(config_map);
        return Ok(store);
    }

    if !args.from_cluster {
        return Err(Error::Configuration(
            "either --config or --from-cluster is required".into(),
        )
        .into());
    }

    let client = kube::Client::try_default()
        .await
        .context("creating Kubernetes client")?;
    let config_map = fetch_config_map(client, &args.config_namespace, &args.config_name).await?;
    let store: Arc<dyn ConfigStore> = Arc::new(config_map);
    Ok(store)
}

// =============================================================================
// Output
// =============================================================================

fn write_manifests(desired: &DesiredResources) -> anyhow::Result<()> {
    let mut documents = vec![
        to_yaml(&desired.deployment)?,
        to_yaml(&desired.service)?,
    ];
    if let Some(pvc) = &desired.persistent_volume_claim {
        documents.push(to_yaml(pvc)?);
    }
    if let Some(pv) = &desired.persistent_volume {
        documents.push(to_yaml(pv)?);
    }

    let mut stdout = std::io::stdout().lock();
    for document in documents {
        writeln!(stdout, "---")?;
        write!(stdout, "{}", document)?;
    }
    Ok(())
}

fn to_yaml<T: Serialize>(object: &T) -> anyhow::Result<String> {
    Ok(serde_yaml::to_string(object)?)
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("kube=info".parse().unwrap())
        .add_directive("tower=warn".parse().unwrap());

    // Manifests go to stdout, logs to stderr
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
