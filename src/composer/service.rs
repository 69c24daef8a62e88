//! Suggestion Service
//!
//! ClusterIP service in front of the suggestion pods. It needs no
//! per-algorithm config.

use super::labels::identity_labels;
use super::owner::bind_controller;
use super::Composer;
use crate::crd::Suggestion;
use crate::error::Result;
use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;

impl Composer {
    /// Build the Service for a Suggestion
    pub fn desired_service(&self, suggestion: &Suggestion) -> Result<Service> {
        let mut service = Service {
            metadata: ObjectMeta {
                name: Some(suggestion.composed_name()),
                namespace: suggestion.namespace(),
                ..Default::default()
            },
            spec: Some(ServiceSpec {
                selector: Some(identity_labels(suggestion)),
                ports: Some(vec![ServicePort {
                    name: Some(self.config.port_name.clone()),
                    port: self.config.port,
                    ..Default::default()
                }]),
                type_: Some("ClusterIP".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        bind_controller(&self.registry, suggestion, &mut service.metadata)?;
        Ok(service)
    }
}
