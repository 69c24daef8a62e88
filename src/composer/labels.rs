//! Identity labels and pod annotations
//!
//! The same label set is used for the Deployment selector, the pod template
//! and the Service selector, so traffic always reaches the suggestion pods.

use crate::crd::Suggestion;
use kube::ResourceExt;
use std::collections::BTreeMap;

/// Label carrying the Deployment name
pub const LABEL_DEPLOYMENT: &str = "deployment";
/// Label carrying the experiment name
pub const LABEL_EXPERIMENT: &str = "experiment";
/// Label carrying the suggestion name
pub const LABEL_SUGGESTION: &str = "suggestion";

/// Pod annotation turning off service-mesh sidecar injection
pub const ANNOTATION_SIDECAR_INJECT: &str = "sidecar.istio.io/inject";

/// Caller labels merged with the identity labels
pub fn identity_labels(suggestion: &Suggestion) -> BTreeMap<String, String> {
    let name = suggestion.name_any();
    let mut labels = suggestion.labels().clone();
    labels.insert(LABEL_DEPLOYMENT.to_string(), suggestion.composed_name());
    labels.insert(LABEL_EXPERIMENT.to_string(), name.clone());
    labels.insert(LABEL_SUGGESTION.to_string(), name);
    labels
}

/// Caller annotations with sidecar injection disabled
pub fn pod_annotations(suggestion: &Suggestion) -> BTreeMap<String, String> {
    let mut annotations = suggestion.annotations().clone();
    annotations.insert(ANNOTATION_SIDECAR_INJECT.to_string(), "false".to_string());
    annotations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{AlgorithmSpec, ResumePolicy, SuggestionSpec};
    use kube::api::ObjectMeta;

    fn suggestion() -> Suggestion {
        Suggestion {
            metadata: ObjectMeta {
                name: Some("test-suggestion".into()),
                namespace: Some("kubeflow".into()),
                labels: Some(BTreeMap::from([
                    ("custom-label".to_string(), "test".to_string()),
                    ("suggestion".to_string(), "overridden".to_string()),
                ])),
                annotations: Some(BTreeMap::from([(
                    "custom-annotation".to_string(),
                    "test".to_string(),
                )])),
                ..Default::default()
            },
            spec: SuggestionSpec {
                algorithm: AlgorithmSpec {
                    algorithm_name: "random".into(),
                    algorithm_settings: vec![],
                },
                requests: 1,
                resume_policy: ResumePolicy::Never,
            },
            status: None,
        }
    }

    #[test]
    fn test_identity_labels() {
        let labels = identity_labels(&suggestion());
        assert_eq!(
            labels,
            BTreeMap::from([
                ("custom-label".to_string(), "test".to_string()),
                ("deployment".to_string(), "test-suggestion-random".to_string()),
                ("experiment".to_string(), "test-suggestion".to_string()),
                ("suggestion".to_string(), "test-suggestion".to_string()),
            ])
        );
    }

    #[test]
    fn test_pod_annotations() {
        let annotations = pod_annotations(&suggestion());
        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations["custom-annotation"], "test");
        assert_eq!(annotations[ANNOTATION_SIDECAR_INJECT], "false");
    }

    #[test]
    fn test_labels_without_caller_labels() {
        let mut s = suggestion();
        s.metadata.labels = None;
        s.metadata.annotations = None;

        assert_eq!(identity_labels(&s).len(), 3);
        assert_eq!(pod_annotations(&s).len(), 1);
    }
}
