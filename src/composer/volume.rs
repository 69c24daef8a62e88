//! Suggestion storage
//!
//! Composes the PersistentVolumeClaim the suggestion pod mounts, and a
//! host-path PersistentVolume for it when the claim uses the default
//! storage class. Any other class is left to its dynamic provisioner.
//!
//! Config overrides are merged field by field:
//!
//! | Field                        | PVC     | PV      |
//! |------------------------------|---------|---------|
//! | `storageClassName`           | replace | -       |
//! | `accessModes`                | append  | append  |
//! | `volumeMode`                 | replace | replace |
//! | `resources.requests.storage` | replace | -       |
//! | volume source                | -       | replace |
//! | `capacity`                   | -       | replace |
//!
//! Appended access modes skip modes already in the list.

use super::owner::bind_controller;
use super::{Composer, ComposerConfig};
use crate::crd::Suggestion;
use crate::error::Result;
use k8s_openapi::api::core::v1::{
    HostPathVolumeSource, PersistentVolume, PersistentVolumeClaim, PersistentVolumeClaimSpec,
    PersistentVolumeSpec, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;
use std::collections::BTreeMap;

/// Resource name of requested and provided storage
pub const RESOURCE_STORAGE: &str = "storage";

impl Composer {
    /// Build the PVC and, for the default storage class, the PV of a Suggestion
    pub fn desired_volume(
        &self,
        suggestion: &Suggestion,
    ) -> Result<(PersistentVolumeClaim, Option<PersistentVolume>)> {
        let config = self.resolver.resolve(suggestion.algorithm_name())?;

        let mut claim_spec = default_claim_spec(&self.config);
        if let Some(overrides) = &config.persistent_volume_claim_spec {
            merge_claim_spec(&mut claim_spec, overrides);
        }
        let compose_volume =
            should_compose_volume(&self.config, claim_spec.storage_class_name.as_deref());

        let mut pvc = PersistentVolumeClaim {
            metadata: ObjectMeta {
                name: Some(suggestion.composed_name()),
                namespace: suggestion.namespace(),
                ..Default::default()
            },
            spec: Some(claim_spec),
            ..Default::default()
        };
        bind_controller(&self.registry, suggestion, &mut pvc.metadata)?;

        if !compose_volume {
            return Ok((pvc, None));
        }

        let pv_name = suggestion.volume_name();
        let mut volume_spec = default_volume_spec(&self.config, &pv_name);
        if let Some(overrides) = &config.persistent_volume_spec {
            merge_volume_spec(&mut volume_spec, overrides);
        }

        let labels = config
            .persistent_volume_labels
            .clone()
            .filter(|labels| !labels.is_empty())
            .unwrap_or_else(|| BTreeMap::from([("type".to_string(), "local".to_string())]));

        let mut pv = PersistentVolume {
            metadata: ObjectMeta {
                name: Some(pv_name),
                labels: Some(labels),
                ..Default::default()
            },
            spec: Some(volume_spec),
            ..Default::default()
        };
        bind_controller(&self.registry, suggestion, &mut pv.metadata)?;

        Ok((pvc, Some(pv)))
    }
}

/// A PV is composed only for claims on the default storage class
pub fn should_compose_volume(composer: &ComposerConfig, storage_class: Option<&str>) -> bool {
    storage_class == Some(composer.storage_class_name.as_str())
}

fn default_storage(composer: &ComposerConfig) -> BTreeMap<String, Quantity> {
    BTreeMap::from([(
        RESOURCE_STORAGE.to_string(),
        Quantity(composer.volume_storage.clone()),
    )])
}

/// Claim spec before config overrides
pub fn default_claim_spec(composer: &ComposerConfig) -> PersistentVolumeClaimSpec {
    PersistentVolumeClaimSpec {
        storage_class_name: Some(composer.storage_class_name.clone()),
        access_modes: Some(vec![composer.volume_access_mode.clone()]),
        resources: Some(VolumeResourceRequirements {
            requests: Some(default_storage(composer)),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Volume spec before config overrides, backed by a host path under the
/// configured prefix
pub fn default_volume_spec(composer: &ComposerConfig, pv_name: &str) -> PersistentVolumeSpec {
    PersistentVolumeSpec {
        storage_class_name: Some(composer.storage_class_name.clone()),
        access_modes: Some(vec![composer.volume_access_mode.clone()]),
        host_path: Some(HostPathVolumeSource {
            path: format!("{}{}", composer.volume_local_path_prefix, pv_name),
            type_: None,
        }),
        capacity: Some(default_storage(composer)),
        ..Default::default()
    }
}

/// Merge a partial claim spec from config into `spec`
pub fn merge_claim_spec(spec: &mut PersistentVolumeClaimSpec, overrides: &PersistentVolumeClaimSpec) {
    if let Some(class) = &overrides.storage_class_name {
        spec.storage_class_name = Some(class.clone());
    }

    append_access_modes(&mut spec.access_modes, overrides.access_modes.as_deref());

    if let Some(mode) = &overrides.volume_mode {
        spec.volume_mode = Some(mode.clone());
    }

    let storage = overrides
        .resources
        .as_ref()
        .and_then(|r| r.requests.as_ref())
        .and_then(|requests| requests.get(RESOURCE_STORAGE));
    if let Some(storage) = storage {
        spec.resources
            .get_or_insert_with(Default::default)
            .requests
            .get_or_insert_with(Default::default)
            .insert(RESOURCE_STORAGE.to_string(), storage.clone());
    }
}

/// Merge a partial volume spec from config into `spec`
pub fn merge_volume_spec(spec: &mut PersistentVolumeSpec, overrides: &PersistentVolumeSpec) {
    if let Some(mode) = &overrides.volume_mode {
        spec.volume_mode = Some(mode.clone());
    }

    append_access_modes(&mut spec.access_modes, overrides.access_modes.as_deref());

    let source = volume_source(overrides);
    if source != PersistentVolumeSpec::default() {
        replace_volume_source(spec, source);
    }

    if let Some(capacity) = overrides.capacity.as_ref().filter(|c| !c.is_empty()) {
        spec.capacity = Some(capacity.clone());
    }
}

// TODO: the append policy for access modes differs from every other
// override field, which all replace. Confirm with the katib-config owners
// whether a replace is what users expect before changing it.
fn append_access_modes(modes: &mut Option<Vec<String>>, extra: Option<&[String]>) {
    let extra = match extra {
        Some(extra) if !extra.is_empty() => extra,
        _ => return,
    };

    let modes = modes.get_or_insert_with(Vec::new);
    for mode in extra {
        if !modes.contains(mode) {
            modes.push(mode.clone());
        }
    }
}

/// Only the backing-storage fields of a volume spec
fn volume_source(spec: &PersistentVolumeSpec) -> PersistentVolumeSpec {
    PersistentVolumeSpec {
        aws_elastic_block_store: spec.aws_elastic_block_store.clone(),
        azure_disk: spec.azure_disk.clone(),
        azure_file: spec.azure_file.clone(),
        cephfs: spec.cephfs.clone(),
        cinder: spec.cinder.clone(),
        csi: spec.csi.clone(),
        fc: spec.fc.clone(),
        flex_volume: spec.flex_volume.clone(),
        flocker: spec.flocker.clone(),
        gce_persistent_disk: spec.gce_persistent_disk.clone(),
        glusterfs: spec.glusterfs.clone(),
        host_path: spec.host_path.clone(),
        iscsi: spec.iscsi.clone(),
        local: spec.local.clone(),
        nfs: spec.nfs.clone(),
        photon_persistent_disk: spec.photon_persistent_disk.clone(),
        portworx_volume: spec.portworx_volume.clone(),
        quobyte: spec.quobyte.clone(),
        rbd: spec.rbd.clone(),
        scale_io: spec.scale_io.clone(),
        storageos: spec.storageos.clone(),
        vsphere_volume: spec.vsphere_volume.clone(),
        ..Default::default()
    }
}

fn replace_volume_source(spec: &mut PersistentVolumeSpec, source: PersistentVolumeSpec) {
    spec.aws_elastic_block_store = source.aws_elastic_block_store;
    spec.azure_disk = source.azure_disk;
    spec.azure_file = source.azure_file;
    spec.cephfs = source.cephfs;
    spec.cinder = source.cinder;
    spec.csi = source.csi;
    spec.fc = source.fc;
    spec.flex_volume = source.flex_volume;
    spec.flocker = source.flocker;
    spec.gce_persistent_disk = source.gce_persistent_disk;
    spec.glusterfs = source.glusterfs;
    spec.host_path = source.host_path;
    spec.iscsi = source.iscsi;
    spec.local = source.local;
    spec.nfs = source.nfs;
    spec.photon_persistent_disk = source.photon_persistent_disk;
    spec.portworx_volume = source.portworx_volume;
    spec.quobyte = source.quobyte;
    spec.rbd = source.rbd;
    spec.scale_io = source.scale_io;
    spec.storageos = source.storageos;
    spec.vsphere_volume = source.vsphere_volume;
}
