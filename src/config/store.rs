//! Config stores
//!
//! The resolver only needs a string lookup by key. A store is usually the
//! already-fetched katib-config ConfigMap; tests use a plain map.

use crate::error::Result;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::{Api, Client};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Read access to raw configuration text
pub trait ConfigStore: Send + Sync {
    /// Raw value stored under `key`, if present
    fn lookup(&self, key: &str) -> Option<String>;
}

impl ConfigStore for ConfigMap {
    fn lookup(&self, key: &str) -> Option<String> {
        self.data.as_ref().and_then(|data| data.get(key)).cloned()
    }
}

impl ConfigStore for BTreeMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// A missing store behaves as a store with no entries
impl<S: ConfigStore> ConfigStore for Option<S> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.as_ref().and_then(|store| store.lookup(key))
    }
}

/// Load a ConfigMap manifest from a YAML or JSON file
pub fn load_config_map(path: impl AsRef<Path>) -> Result<ConfigMap> {
    let path = path.as_ref();
    debug!("Loading config map from {}", path.display());

    let raw = std::fs::read_to_string(path)?;
    let config_map: ConfigMap = serde_yaml::from_str(&raw)?;
    Ok(config_map)
}

/// Fetch a ConfigMap from the cluster.
///
/// Returns `Ok(None)` when it does not exist so the resolver can report
/// `ConfigNotFound` for the algorithm being composed.
pub async fn fetch_config_map(
    client: Client,
    namespace: &str,
    name: &str,
) -> Result<Option<ConfigMap>> {
    let api: Api<ConfigMap> = Api::namespaced(client, namespace);
    let config_map = api.get_opt(name).await?;

    match &config_map {
        Some(_) => info!("Fetched config map {}/{}", namespace, name),
        None => warn!("Config map {}/{} not found", namespace, name),
    }

    Ok(config_map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use assert_matches::assert_matches;
    use std::io::Write;

    fn config_map(data: &[(&str, &str)]) -> ConfigMap {
        ConfigMap {
            data: Some(
                data.iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
            ..Default::default()
        }
    }

    #[test]
    fn test_config_map_lookup() {
        let cm = config_map(&[("suggestion", "{}")]);
        assert_eq!(cm.lookup("suggestion").as_deref(), Some("{}"));
        assert_eq!(cm.lookup("metrics-collector-sidecar"), None);

        assert_eq!(ConfigMap::default().lookup("suggestion"), None);
    }

    #[test]
    fn test_optional_store() {
        let missing: Option<ConfigMap> = None;
        assert_eq!(missing.lookup("suggestion"), None);

        let present = Some(config_map(&[("suggestion", "{}")]));
        assert_eq!(present.lookup("suggestion").as_deref(), Some("{}"));
    }

    #[test]
    fn test_map_lookup() {
        let mut map = BTreeMap::new();
        map.insert("suggestion".to_string(), "{}".to_string());
        assert_eq!(map.lookup("suggestion").as_deref(), Some("{}"));
    }

    #[test]
    fn test_load_config_map() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: katib-config
  namespace: kubeflow
data:
  suggestion: |
    {{"random": {{"image": "docker.io/kubeflowkatib/suggestion-hyperopt"}}}}
"#
        )
        .unwrap();

        let cm = load_config_map(file.path()).unwrap();
        assert_eq!(cm.metadata.name.as_deref(), Some("katib-config"));
        assert!(cm.lookup("suggestion").unwrap().contains("suggestion-hyperopt"));
    }

    #[test]
    fn test_load_config_map_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config_map(dir.path().join("katib-config.yaml"));
        assert_matches!(result, Err(Error::Io(_)));
    }
}
