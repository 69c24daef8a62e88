//! Suggestion Composer - desired state for suggestion services
//!
//! Given a `Suggestion` and the per-algorithm config stored in the
//! katib-config ConfigMap, composes the Kubernetes objects that run the
//! suggestion algorithm service. Reconcilers apply and diff the result;
//! this crate never talks to the API server while composing.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                          Suggestion (CRD)                            │
//! └──────────────────────────────────┬───────────────────────────────────┘
//!                                    │
//! ┌──────────────────────────────────┴───────────────────────────────────┐
//! │                              Composer                                │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────────────────┐  │
//! │  │  Deployment  │   │   Service    │   │  PVC + PV (conditional)  │  │
//! │  └──────┬───────┘   └──────┬───────┘   └────────────┬─────────────┘  │
//! │         └──────────────────┼────────────────────────┘                │
//! │                 ┌──────────┴───────────┐                             │
//! │                 │  Ownership binding   │                             │
//! │                 │   (KindRegistry)     │                             │
//! │                 └──────────────────────┘                             │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │          ConfigResolver  ◄──  ConfigStore (ConfigMap / map)          │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`composer`]: Deployment, Service and volume composition
//! - [`config`]: Per-algorithm config, stores and resolution
//! - [`crd`]: The Suggestion custom resource
//! - [`error`]: Error types and handling

pub mod composer;
pub mod config;
pub mod crd;
pub mod error;

// Re-export commonly used types
pub use composer::{
    bind_controller, should_compose_volume, Composer, ComposerConfig, DesiredResources,
    KindRegistry, OwnerDescriptor,
};

pub use config::{
    ConfigResolver, ConfigStore, ImagePullPolicy, SuggestionConfig, SUGGESTION_CONFIG_KEY,
};

pub use crd::{AlgorithmSpec, ResumePolicy, Suggestion, SuggestionSpec, SuggestionStatus};

pub use error::{Error, ErrorAction, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
