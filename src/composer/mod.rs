//! Desired-state composition
//!
//! Builds the Deployment, Service, PersistentVolumeClaim and optional
//! PersistentVolume that run a suggestion algorithm service. Composition is
//! pure: each call resolves config, builds the object, binds ownership and
//! returns it without touching the cluster.

pub mod deployment;
pub mod labels;
pub mod owner;
pub mod service;
pub mod volume;

pub use deployment::*;
pub use labels::*;
pub use owner::*;
pub use service::*;
pub use volume::*;

use crate::config::{ConfigResolver, ConfigStore};
use crate::crd::Suggestion;
use crate::error::Result;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{PersistentVolume, PersistentVolumeClaim, Service};
use std::sync::Arc;

// =============================================================================
// Composer Configuration
// =============================================================================

/// Fixed values baked into every composed object
#[derive(Debug, Clone)]
pub struct ComposerConfig {
    /// Port the suggestion service listens on
    pub port: i32,
    /// Name of the container and service port
    pub port_name: String,
    /// Container name
    pub container_name: String,
    /// Health probe binary inside the suggestion image
    pub health_probe_binary: String,
    /// gRPC service name passed to the health probe
    pub grpc_service: String,
    /// Emit readiness and liveness probes
    pub enable_grpc_probe: bool,
    /// Probe initial delay in seconds
    pub initial_delay_seconds: i32,
    /// Readiness probe period in seconds
    pub period_ready_seconds: i32,
    /// Liveness probe period in seconds
    pub period_live_seconds: i32,
    /// Liveness failures before restart
    pub failure_threshold: i32,
    /// Pod volume and mount name
    pub volume_name: String,
    /// Mount path used when the config sets none
    pub volume_mount_path: String,
    /// Default requested storage
    pub volume_storage: String,
    /// Default storage class; only this class gets a composed PV
    pub storage_class_name: String,
    /// Default access mode
    pub volume_access_mode: String,
    /// Host path prefix for composed PVs
    pub volume_local_path_prefix: String,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            port: 6789,
            port_name: "katib-api".to_string(),
            container_name: "suggestion".to_string(),
            health_probe_binary: "/bin/grpc_health_probe".to_string(),
            grpc_service: "manager.v1beta1.Suggestion".to_string(),
            enable_grpc_probe: true,
            initial_delay_seconds: 10,
            period_ready_seconds: 10,
            period_live_seconds: 120,
            failure_threshold: 12,
            volume_name: "suggestion-volume".to_string(),
            volume_mount_path: "/opt/katib/data".to_string(),
            volume_storage: "1Gi".to_string(),
            storage_class_name: "katib-suggestion".to_string(),
            volume_access_mode: "ReadWriteOnce".to_string(),
            volume_local_path_prefix: "/tmp/katib/suggestions/".to_string(),
        }
    }
}

// =============================================================================
// Composer
// =============================================================================

/// Builds the child objects of a Suggestion.
///
/// Holds no mutable state; one instance can serve concurrent reconciles.
#[derive(Debug, Clone)]
pub struct Composer {
    config: ComposerConfig,
    resolver: ConfigResolver,
    registry: KindRegistry,
}

/// Every object a Suggestion needs
#[derive(Debug, Clone)]
pub struct DesiredResources {
    pub deployment: Deployment,
    pub service: Service,
    pub persistent_volume_claim: Option<PersistentVolumeClaim>,
    pub persistent_volume: Option<PersistentVolume>,
}

impl Composer {
    /// Create a composer with the default kind registry
    pub fn new(config: ComposerConfig, store: Arc<dyn ConfigStore>) -> Self {
        Self::with_resolver(config, ConfigResolver::new(store))
    }

    /// Create a composer around an existing resolver
    pub fn with_resolver(config: ComposerConfig, resolver: ConfigResolver) -> Self {
        Self {
            config,
            resolver,
            registry: KindRegistry::with_defaults(),
        }
    }

    /// Replace the kind registry used for ownership binding
    pub fn with_registry(mut self, registry: KindRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Fixed values this composer bakes into every object
    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Compose everything the Suggestion needs.
    ///
    /// Storage is only composed when the Suggestion resumes from a volume.
    pub fn desired_resources(&self, suggestion: &Suggestion) -> Result<DesiredResources> {
        let deployment = self.desired_deployment(suggestion)?;
        let service = self.desired_service(suggestion)?;

        let (persistent_volume_claim, persistent_volume) = if suggestion.resumes_from_volume() {
            let (pvc, pv) = self.desired_volume(suggestion)?;
            (Some(pvc), pv)
        } else {
            (None, None)
        };

        Ok(DesiredResources {
            deployment,
            service,
            persistent_volume_claim,
            persistent_volume,
        })
    }
}
