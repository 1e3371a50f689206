use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Sentinel for scope keys with no value from any provider.
pub const UNKNOWN: &str = "unknown";

/// Decision scope — the ordered tuple that discriminates "the same thing
/// observed again" from "a different thing".
///
/// All four keys are required. Resolution is layered: the artifact's own
/// scope sub-document wins, then the run-manifest default scope, then the
/// `unknown` sentinel. The lifecycle id additionally falls back to the
/// registry's currently active lifecycle id before the sentinel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub od_pair: String,
    pub graph_id: String,
    pub run_id: String,
    pub lifecycle_id: String,
}

impl Scope {
    /// Resolve a scope from its providers, consulted in sequence per key:
    /// document value, run-manifest default, sentinel.
    pub fn resolve(
        document: Option<&Map<String, Value>>,
        manifest_default: Option<&Map<String, Value>>,
        lifecycle_fallback: &str,
    ) -> Self {
        let lifecycle_fallback = if lifecycle_fallback.is_empty() {
            UNKNOWN
        } else {
            lifecycle_fallback
        };
        Self {
            od_pair: resolve_key(document, manifest_default, "od_pair", UNKNOWN),
            graph_id: resolve_key(document, manifest_default, "graph_id", UNKNOWN),
            run_id: resolve_key(document, manifest_default, "run_id", UNKNOWN),
            lifecycle_id: resolve_key(document, manifest_default, "lifecycle_id", lifecycle_fallback),
        }
    }
}

fn resolve_key(
    document: Option<&Map<String, Value>>,
    manifest_default: Option<&Map<String, Value>>,
    key: &str,
    sentinel: &str,
) -> String {
    for provider in [document, manifest_default].into_iter().flatten() {
        if let Some(value) = provider.get(key) {
            return value_as_string(value);
        }
    }
    sentinel.to_string()
}

/// Scope values are strings; any other JSON scalar keeps its compact JSON
/// rendering so resolution never loses information.
pub fn value_as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn document_values_win_over_manifest_defaults() {
        let doc = map(json!({"od_pair": "p1", "run_id": "r9"}));
        let defaults = map(json!({"od_pair": "p0", "graph_id": "g0", "run_id": "r0"}));
        let scope = Scope::resolve(Some(&doc), Some(&defaults), "L1");
        assert_eq!(scope.od_pair, "p1");
        assert_eq!(scope.graph_id, "g0");
        assert_eq!(scope.run_id, "r9");
        assert_eq!(scope.lifecycle_id, "L1");
    }

    #[test]
    fn missing_keys_fall_back_to_sentinel() {
        let scope = Scope::resolve(None, None, "");
        assert_eq!(scope.od_pair, UNKNOWN);
        assert_eq!(scope.graph_id, UNKNOWN);
        assert_eq!(scope.run_id, UNKNOWN);
        assert_eq!(scope.lifecycle_id, UNKNOWN);
    }

    #[test]
    fn lifecycle_id_prefers_document_then_fallback() {
        let doc = map(json!({"lifecycle_id": "L-doc"}));
        let scope = Scope::resolve(Some(&doc), None, "L-manifest");
        assert_eq!(scope.lifecycle_id, "L-doc");

        let scope = Scope::resolve(None, None, "L-manifest");
        assert_eq!(scope.lifecycle_id, "L-manifest");
    }

    #[test]
    fn non_string_scope_values_keep_json_rendering() {
        let doc = map(json!({"graph_id": 7}));
        let scope = Scope::resolve(Some(&doc), None, "L1");
        assert_eq!(scope.graph_id, "7");
    }
}
