use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Run manifest — supplies the default scope, default identity fields, and
/// the fallback lifecycle id consulted when an artifact omits its own.
///
/// Unknown fields are tolerated; every field here is optional because an
/// absent manifest degrades to "no defaults", not to an error.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RunManifest {
    #[serde(default)]
    pub decision_scope: Option<Map<String, Value>>,
    #[serde(default)]
    pub identity_fields: Option<Map<String, Value>>,
    #[serde(default)]
    pub lifecycle_id: Option<String>,
}

impl RunManifest {
    /// The lifecycle id artifacts fall back to, `unknown` if unset.
    pub fn lifecycle_fallback(&self) -> &str {
        self.lifecycle_id.as_deref().unwrap_or(crate::scope::UNKNOWN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerates_unknown_fields() {
        let manifest: RunManifest = serde_json::from_str(
            r#"{"lifecycle_id": "L3", "operator": "cron", "seeds": [1, 2]}"#,
        )
        .unwrap();
        assert_eq!(manifest.lifecycle_fallback(), "L3");
        assert!(manifest.decision_scope.is_none());
    }

    #[test]
    fn empty_manifest_falls_back_to_unknown() {
        let manifest = RunManifest::default();
        assert_eq!(manifest.lifecycle_fallback(), "unknown");
    }
}
