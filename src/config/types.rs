//! Per-algorithm suggestion config
//!
//! Field names follow the JSON stored under the `suggestion` key of the
//! katib-config ConfigMap.

use crate::config::quantity::{normalize_quantity, validate_quantity};
use crate::error::Result;
use k8s_openapi::api::core::v1::{PersistentVolumeClaimSpec, PersistentVolumeSpec, ResourceRequirements};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// =============================================================================
// Image Pull Policy
// =============================================================================

/// Image pull policy for the suggestion container.
///
/// Unrecognized values decode to `IfNotPresent` instead of failing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ImagePullPolicy {
    Always,
    #[default]
    IfNotPresent,
    Never,
}

impl ImagePullPolicy {
    /// Map a raw policy string, falling back to `IfNotPresent`
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "Always" => ImagePullPolicy::Always,
            "Never" => ImagePullPolicy::Never,
            _ => ImagePullPolicy::IfNotPresent,
        }
    }
}

impl<'de> Deserialize<'de> for ImagePullPolicy {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Self::from_raw).unwrap_or_default())
    }
}

impl std::fmt::Display for ImagePullPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImagePullPolicy::Always => write!(f, "Always"),
            ImagePullPolicy::IfNotPresent => write!(f, "IfNotPresent"),
            ImagePullPolicy::Never => write!(f, "Never"),
        }
    }
}

// =============================================================================
// Suggestion Config
// =============================================================================

/// Resolved settings for one suggestion algorithm
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionConfig {
    /// Algorithm service image
    #[serde(default)]
    pub image: String,

    /// Pull policy, defaulted when missing or unrecognized
    #[serde(default)]
    pub image_pull_policy: ImagePullPolicy,

    /// Container limits and requests
    #[serde(default)]
    pub resource: ResourceRequirements,

    /// Service account the suggestion pod runs as
    #[serde(default)]
    pub service_account_name: String,

    /// Where the suggestion volume is mounted in the container
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_mount_path: Option<String>,

    /// Partial override for the suggestion PVC spec
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent_volume_claim_spec: Option<PersistentVolumeClaimSpec>,

    /// Partial override for the suggestion PV spec
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent_volume_spec: Option<PersistentVolumeSpec>,

    /// Labels replacing the default PV labels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent_volume_labels: Option<BTreeMap<String, String>>,
}

impl SuggestionConfig {
    /// Mount path override, if a non-empty one was configured
    pub fn volume_mount_path(&self) -> Option<&str> {
        self.volume_mount_path.as_deref().filter(|p| !p.is_empty())
    }

    /// Check every resource quantity in the config
    pub fn validate(&self) -> Result<()> {
        validate_resource_list("resource.limits", self.resource.limits.as_ref())?;
        validate_resource_list("resource.requests", self.resource.requests.as_ref())?;

        if let Some(resources) = self
            .persistent_volume_claim_spec
            .as_ref()
            .and_then(|spec| spec.resources.as_ref())
        {
            validate_resource_list(
                "persistentVolumeClaimSpec.resources.limits",
                resources.limits.as_ref(),
            )?;
            validate_resource_list(
                "persistentVolumeClaimSpec.resources.requests",
                resources.requests.as_ref(),
            )?;
        }

        if let Some(spec) = &self.persistent_volume_spec {
            validate_resource_list("persistentVolumeSpec.capacity", spec.capacity.as_ref())?;
        }

        Ok(())
    }
}

/// Quantity maps inside a raw config entry, as JSON key paths
const QUANTITY_MAPS: &[&[&str]] = &[
    &["resource", "limits"],
    &["resource", "requests"],
    &["persistentVolumeClaimSpec", "resources", "limits"],
    &["persistentVolumeClaimSpec", "resources", "requests"],
    &["persistentVolumeSpec", "capacity"],
];

/// Normalize every quantity of a raw config entry before decoding it
pub fn normalize_quantities(entry: &mut Value) {
    for path in QUANTITY_MAPS {
        let map = path
            .iter()
            .try_fold(&mut *entry, |value, key| value.get_mut(*key));
        if let Some(Value::Object(map)) = map {
            map.values_mut().for_each(normalize_quantity);
        }
    }
}

fn validate_resource_list(
    field: &str,
    list: Option<&BTreeMap<String, Quantity>>,
) -> Result<()> {
    for (name, quantity) in list.into_iter().flatten() {
        validate_quantity(&format!("{}.{}", field, name), quantity)?;
    }
    Ok(())
}
