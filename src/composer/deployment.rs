//! Suggestion Deployment
//!
//! A Deployment running a single suggestion container with
//! gRPC health probes and, for `FromVolume` suggestions, the suggestion
//! volume mounted.

use super::labels::{identity_labels, pod_annotations};
use super::owner::bind_controller;
use super::{Composer, ComposerConfig};
use crate::config::SuggestionConfig;
use crate::crd::Suggestion;
use crate::error::Result;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, ExecAction, PersistentVolumeClaimVolumeSource, PodSpec,
    PodTemplateSpec, Probe, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use kube::ResourceExt;

impl Composer {
    /// Build the Deployment for a Suggestion
    pub fn desired_deployment(&self, suggestion: &Suggestion) -> Result<Deployment> {
        let config = self.resolver.resolve(suggestion.algorithm_name())?;
        let name = suggestion.composed_name();
        let labels = identity_labels(suggestion);

        let mut pod_spec = PodSpec {
            containers: vec![suggestion_container(&self.config, suggestion, &config)],
            service_account_name: Some(config.service_account_name.clone())
                .filter(|sa| !sa.is_empty()),
            ..Default::default()
        };

        if suggestion.resumes_from_volume() {
            pod_spec.volumes = Some(vec![Volume {
                name: self.config.volume_name.clone(),
                persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                    claim_name: name.clone(),
                    read_only: None,
                }),
                ..Default::default()
            }]);
        }

        let mut deployment = Deployment {
            metadata: ObjectMeta {
                name: Some(name),
                namespace: suggestion.namespace(),
                labels: suggestion.metadata.labels.clone(),
                annotations: suggestion.metadata.annotations.clone(),
                ..Default::default()
            },
            spec: Some(DeploymentSpec {
                selector: LabelSelector {
                    match_labels: Some(labels.clone()),
                    ..Default::default()
                },
                template: PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(labels),
                        annotations: Some(pod_annotations(suggestion)),
                        ..Default::default()
                    }),
                    spec: Some(pod_spec),
                },
                ..Default::default()
            }),
            ..Default::default()
        };

        bind_controller(&self.registry, suggestion, &mut deployment.metadata)?;
        Ok(deployment)
    }
}

fn suggestion_container(
    composer: &ComposerConfig,
    suggestion: &Suggestion,
    config: &SuggestionConfig,
) -> Container {
    let mut container = Container {
        name: composer.container_name.clone(),
        image: Some(config.image.clone()),
        image_pull_policy: Some(config.image_pull_policy.to_string()),
        ports: Some(vec![ContainerPort {
            name: Some(composer.port_name.clone()),
            container_port: composer.port,
            ..Default::default()
        }]),
        resources: Some(config.resource.clone()),
        ..Default::default()
    };

    if composer.enable_grpc_probe {
        container.readiness_probe = Some(readiness_probe(composer));
        container.liveness_probe = Some(liveness_probe(composer));
    }

    if suggestion.resumes_from_volume() {
        let mount_path = config
            .volume_mount_path()
            .unwrap_or(&composer.volume_mount_path);

        container.volume_mounts = Some(vec![VolumeMount {
            name: composer.volume_name.clone(),
            mount_path: mount_path.to_string(),
            ..Default::default()
        }]);
    }

    container
}

/// `<probe> -addr=:<port> -service=<grpc service>`
pub fn health_check_command(composer: &ComposerConfig) -> Vec<String> {
    vec![
        composer.health_probe_binary.clone(),
        format!("-addr=:{}", composer.port),
        format!("-service={}", composer.grpc_service),
    ]
}

fn health_check_probe(composer: &ComposerConfig) -> Probe {
    Probe {
        exec: Some(ExecAction {
            command: Some(health_check_command(composer)),
        }),
        initial_delay_seconds: Some(composer.initial_delay_seconds),
        ..Default::default()
    }
}

fn readiness_probe(composer: &ComposerConfig) -> Probe {
    Probe {
        period_seconds: Some(composer.period_ready_seconds),
        ..health_check_probe(composer)
    }
}

fn liveness_probe(composer: &ComposerConfig) -> Probe {
    Probe {
        period_seconds: Some(composer.period_live_seconds),
        failure_threshold: Some(composer.failure_threshold),
        ..health_check_probe(composer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_check_command() {
        assert_eq!(
            health_check_command(&ComposerConfig::default()),
            vec![
                "/bin/grpc_health_probe".to_string(),
                "-addr=:6789".to_string(),
                "-service=manager.v1beta1.Suggestion".to_string(),
            ]
        );
    }

    #[test]
    fn test_probe_timings() {
        let composer = ComposerConfig::default();

        let ready = readiness_probe(&composer);
        assert_eq!(ready.initial_delay_seconds, Some(10));
        assert_eq!(ready.period_seconds, Some(10));
        assert_eq!(ready.failure_threshold, None);

        let live = liveness_probe(&composer);
        assert_eq!(live.initial_delay_seconds, Some(10));
        assert_eq!(live.period_seconds, Some(120));
        assert_eq!(live.failure_threshold, Some(12));
        assert_eq!(live.exec, ready.exec);
    }
}
