//! Suggestion CRD
//!
//! A Suggestion asks for a stream of hyperparameter assignments from one
//! search algorithm. The composer turns it into the Deployment, Service and
//! storage that run the algorithm service.

use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// =============================================================================
// Suggestion CRD
// =============================================================================

/// Suggestion is the request object that owns every composed child resource.
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "kubeflow.org",
    version = "v1beta1",
    kind = "Suggestion",
    plural = "suggestions",
    status = "SuggestionStatus",
    printcolumn = r#"{"name": "Algorithm", "type": "string", "jsonPath": ".spec.algorithm.algorithmName"}"#,
    printcolumn = r#"{"name": "Requested", "type": "integer", "jsonPath": ".spec.requests"}"#,
    printcolumn = r#"{"name": "Assigned", "type": "integer", "jsonPath": ".status.suggestionCount"}"#,
    printcolumn = r#"{"name": "Age", "type": "date", "jsonPath": ".metadata.creationTimestamp"}"#,
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionSpec {
    /// Search algorithm and its settings
    pub algorithm: AlgorithmSpec,

    /// Number of suggestions requested so far
    #[serde(default)]
    pub requests: i32,

    /// How algorithm state is restored after the service restarts
    #[serde(default)]
    pub resume_policy: ResumePolicy,
}

// =============================================================================
// Sub-Types
// =============================================================================

/// Algorithm selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlgorithmSpec {
    /// Name used to look up the per-algorithm config (e.g. "random", "tpe")
    pub algorithm_name: String,

    /// Free-form settings forwarded to the algorithm service
    #[serde(default)]
    pub algorithm_settings: Vec<AlgorithmSetting>,
}

/// Single algorithm setting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AlgorithmSetting {
    pub name: String,
    pub value: String,
}

/// Resume policy for the suggestion service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ResumePolicy {
    /// Service is torn down once the experiment ends
    #[default]
    Never,
    /// Service keeps running for the experiment lifetime
    LongRunning,
    /// State is persisted to a volume and reloaded on restart
    FromVolume,
}

impl std::fmt::Display for ResumePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResumePolicy::Never => write!(f, "Never"),
            ResumePolicy::LongRunning => write!(f, "LongRunning"),
            ResumePolicy::FromVolume => write!(f, "FromVolume"),
        }
    }
}

// =============================================================================
// Status
// =============================================================================

/// Status of the Suggestion
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionStatus {
    /// Number of suggestions handed out
    #[serde(default)]
    pub suggestion_count: i32,

    /// Conditions
    #[serde(default)]
    pub conditions: Vec<SuggestionCondition>,
}

/// Condition for suggestion status
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionCondition {
    /// Type of condition (Created, DeploymentReady, Running, Succeeded, Failed)
    pub r#type: String,
    /// Status: True, False, Unknown
    pub status: String,
    /// Machine-readable reason
    #[serde(default)]
    pub reason: Option<String>,
    /// Human-readable message
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// Implementations
// =============================================================================

impl Suggestion {
    /// Name of the search algorithm
    pub fn algorithm_name(&self) -> &str {
        &self.spec.algorithm.algorithm_name
    }

    /// Name shared by the Deployment, Service and PVC: `<name>-<algorithm>`
    pub fn composed_name(&self) -> String {
        format!("{}-{}", self.name_any(), self.algorithm_name())
    }

    /// Name of the PersistentVolume: `<name>-<algorithm>-<namespace>`.
    ///
    /// PersistentVolumes are cluster scoped, so the namespace is folded into
    /// the name to keep it unique across namespaces. A Suggestion that has
    /// not been assigned a namespace yet gets `<name>-<algorithm>`.
    pub fn volume_name(&self) -> String {
        match self.namespace().filter(|ns| !ns.is_empty()) {
            Some(namespace) => format!("{}-{}", self.composed_name(), namespace),
            None => self.composed_name(),
        }
    }

    /// Whether algorithm state is persisted to a volume
    pub fn resumes_from_volume(&self) -> bool {
        self.spec.resume_policy == ResumePolicy::FromVolume
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::api::ObjectMeta;
    use kube::Resource;

    fn suggestion(resume_policy: ResumePolicy) -> Suggestion {
        Suggestion {
            metadata: ObjectMeta {
                name: Some("test-suggestion".into()),
                namespace: Some("kubeflow".into()),
                ..Default::default()
            },
            spec: SuggestionSpec {
                algorithm: AlgorithmSpec {
                    algorithm_name: "random".into(),
                    algorithm_settings: vec![],
                },
                requests: 1,
                resume_policy,
            },
            status: None,
        }
    }

    #[test]
    fn test_kind_and_version() {
        assert_eq!(Suggestion::api_version(&()), "kubeflow.org/v1beta1");
        assert_eq!(Suggestion::kind(&()), "Suggestion");
    }

    #[test]
    fn test_names() {
        let s = suggestion(ResumePolicy::Never);
        assert_eq!(s.composed_name(), "test-suggestion-random");
        assert_eq!(s.volume_name(), "test-suggestion-random-kubeflow");
    }

    #[test]
    fn test_volume_name_without_namespace() {
        let mut s = suggestion(ResumePolicy::FromVolume);
        s.metadata.namespace = None;
        assert_eq!(s.volume_name(), "test-suggestion-random");

        s.metadata.namespace = Some(String::new());
        assert_eq!(s.volume_name(), "test-suggestion-random");
    }

    #[test]
    fn test_resume_policy() {
        assert!(!suggestion(ResumePolicy::Never).resumes_from_volume());
        assert!(!suggestion(ResumePolicy::LongRunning).resumes_from_volume());
        assert!(suggestion(ResumePolicy::FromVolume).resumes_from_volume());
    }

    #[test]
    fn test_spec_deserialize_defaults() {
        let spec: SuggestionSpec =
            serde_json::from_str(r#"{"algorithm": {"algorithmName": "tpe"}}"#).unwrap();
        assert_eq!(spec.algorithm.algorithm_name, "tpe");
        assert_eq!(spec.requests, 0);
        assert_eq!(spec.resume_policy, ResumePolicy::Never);
    }
}
