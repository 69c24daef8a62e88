//! Suggestion config resolution
//!
//! Decodes the JSON map stored under the suggestion key and picks the entry
//! for one algorithm. Every resolve reads the store again; nothing is cached.

use crate::config::store::ConfigStore;
use crate::config::types::{normalize_quantities, SuggestionConfig};
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Key under which per-algorithm configs are stored
pub const SUGGESTION_CONFIG_KEY: &str = "suggestion";

/// Resolves `SuggestionConfig` values from a config store
#[derive(Clone)]
pub struct ConfigResolver {
    store: Arc<dyn ConfigStore>,
    key: String,
}

impl ConfigResolver {
    /// Create a resolver reading the default suggestion key
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self::with_key(store, SUGGESTION_CONFIG_KEY)
    }

    /// Create a resolver reading a custom key
    pub fn with_key(store: Arc<dyn ConfigStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Resolve the config for one algorithm.
    ///
    /// Missing entries fail with `ConfigNotFound`, undecodable JSON and
    /// malformed quantities with `ConfigParse`. Quantities may be bare JSON
    /// numbers or padded strings. An unknown image pull policy is not an
    /// error and resolves to `IfNotPresent`.
    pub fn resolve(&self, algorithm: &str) -> Result<SuggestionConfig> {
        let not_found = || Error::ConfigNotFound {
            algorithm: algorithm.to_string(),
        };

        let raw = self.store.lookup(&self.key).ok_or_else(not_found)?;

        let mut entries: BTreeMap<String, serde_json::Value> = serde_json::from_str(&raw)
            .map_err(|e| Error::ConfigParse(format!("{} config: {}", self.key, e)))?;

        let mut entry = entries.remove(algorithm).ok_or_else(not_found)?;
        normalize_quantities(&mut entry);

        let config: SuggestionConfig = serde_json::from_value(entry)
            .map_err(|e| Error::ConfigParse(format!("{} config for {}: {}", self.key, algorithm, e)))?;

        config.validate()?;
        Ok(config)
    }
}

impl std::fmt::Debug for ConfigResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigResolver")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
