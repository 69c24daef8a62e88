//! Controller ownership for composed objects
//!
//! Every composed object gets exactly one owner reference pointing at the
//! Suggestion, with `controller` and `blockOwnerDeletion` set, so deleting
//! the Suggestion cascades to its children.
//!
//! The API version and kind of the owner are looked up in a `KindRegistry`
//! handed to the composer. An owner type missing from the registry cannot
//! be bound and the compose call fails.

use crate::crd::Suggestion;
use crate::error::{Error, Result};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::Resource;
use std::any::{type_name, TypeId};
use std::collections::BTreeMap;

/// API version and kind of an owner type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerDescriptor {
    pub api_version: String,
    pub kind: String,
}

impl OwnerDescriptor {
    pub fn new(api_version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
        }
    }

    /// Descriptor of a statically typed kube resource
    pub fn of<K: Resource<DynamicType = ()>>() -> Self {
        Self::new(K::api_version(&()), K::kind(&()))
    }
}

/// Maps owner Rust types to their API version and kind
#[derive(Debug, Clone, Default)]
pub struct KindRegistry {
    kinds: BTreeMap<TypeId, OwnerDescriptor>,
}

impl KindRegistry {
    /// Empty registry; every bind against it fails
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the Suggestion kind registered
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register::<Suggestion>();
        registry
    }

    /// Register a kube resource type under its own API version and kind
    pub fn register<K: Resource<DynamicType = ()> + 'static>(&mut self) -> &mut Self {
        self.register_as::<K>(OwnerDescriptor::of::<K>())
    }

    /// Register a type under an explicit descriptor
    pub fn register_as<K: 'static>(&mut self, descriptor: OwnerDescriptor) -> &mut Self {
        self.kinds.insert(TypeId::of::<K>(), descriptor);
        self
    }

    /// Descriptor registered for `K`
    pub fn descriptor<K: 'static>(&self) -> Option<&OwnerDescriptor> {
        self.kinds.get(&TypeId::of::<K>())
    }
}

/// Set `owner` as the single controller of the object described by `meta`
pub fn bind_controller<K>(registry: &KindRegistry, owner: &K, meta: &mut ObjectMeta) -> Result<()>
where
    K: Resource + 'static,
{
    let descriptor = registry
        .descriptor::<K>()
        .ok_or_else(|| Error::OwnershipBind {
            kind: short_type_name::<K>().to_string(),
            reason: "no kind is registered for the owner type".into(),
        })?;

    let owner_meta = owner.meta();
    let name = owner_meta
        .name
        .clone()
        .ok_or_else(|| Error::OwnershipBind {
            kind: descriptor.kind.clone(),
            reason: "owner has no name".into(),
        })?;

    meta.owner_references = Some(vec![OwnerReference {
        api_version: descriptor.api_version.clone(),
        kind: descriptor.kind.clone(),
        name,
        uid: owner_meta.uid.clone().unwrap_or_default(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }]);

    Ok(())
}

fn short_type_name<K>() -> &'static str {
    let full = type_name::<K>();
    full.rsplit("::").next().unwrap_or(full)
}
