use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ModelError;
use crate::scope::value_as_string;

const REQUIRED_KEYS: [&str; 4] = ["repo_commit", "objective_hash", "graph_hash", "params_hash"];

/// Identity fields — the four hashes/references that pin an artifact to the
/// exact inputs that produced it.
///
/// Every value must be a non-empty string after layered resolution; a key
/// that is still missing or empty after consulting the run-manifest default
/// is a hard validation failure naming the missing keys.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityFields {
    pub repo_commit: String,
    pub objective_hash: String,
    pub graph_hash: String,
    pub params_hash: String,
}

impl IdentityFields {
    /// Resolve identity fields per key: document value, then run-manifest
    /// default. There is no sentinel layer.
    pub fn resolve(
        document: Option<&Map<String, Value>>,
        manifest_default: Option<&Map<String, Value>>,
    ) -> Result<Self, ModelError> {
        let mut resolved: Vec<String> = Vec::with_capacity(REQUIRED_KEYS.len());
        let mut missing: Vec<String> = Vec::new();

        for key in REQUIRED_KEYS {
            let value = [document, manifest_default]
                .into_iter()
                .flatten()
                .find_map(|provider| provider.get(key))
                .map(value_as_string)
                .filter(|s| !s.is_empty());
            match value {
                Some(v) => resolved.push(v),
                None => missing.push(key.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(ModelError::MissingIdentityKeys(missing));
        }

        let mut values = resolved.into_iter();
        Ok(Self {
            repo_commit: values.next().unwrap_or_default(),
            objective_hash: values.next().unwrap_or_default(),
            graph_hash: values.next().unwrap_or_default(),
            params_hash: values.next().unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: serde_json::Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn document_overrides_manifest_defaults() {
        let doc = map(json!({"repo_commit": "c2"}));
        let defaults = map(json!({
            "repo_commit": "c1",
            "objective_hash": "o1",
            "graph_hash": "g1",
            "params_hash": "p1"
        }));
        let identity = IdentityFields::resolve(Some(&doc), Some(&defaults)).unwrap();
        assert_eq!(identity.repo_commit, "c2");
        assert_eq!(identity.objective_hash, "o1");
    }

    #[test]
    fn missing_keys_are_named_in_the_error() {
        let defaults = map(json!({"repo_commit": "c1", "graph_hash": "g1"}));
        let err = IdentityFields::resolve(None, Some(&defaults)).unwrap_err();
        match err {
            ModelError::MissingIdentityKeys(keys) => {
                assert_eq!(keys, vec!["objective_hash", "params_hash"]);
            }
        }
    }

    #[test]
    fn empty_string_counts_as_missing() {
        let defaults = map(json!({
            "repo_commit": "",
            "objective_hash": "o1",
            "graph_hash": "g1",
            "params_hash": "p1"
        }));
        let err = IdentityFields::resolve(None, Some(&defaults)).unwrap_err();
        assert!(matches!(err, ModelError::MissingIdentityKeys(keys) if keys == vec!["repo_commit"]));
    }
}
