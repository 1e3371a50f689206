use canonry_canon::hash_json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::identity::IdentityFields;
use crate::scope::Scope;

/// Which canonicalization rule produced an artifact's content hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquivalencePolicy {
    pub policy_name: String,
    pub canonicalization: String,
    pub compare_fields: Vec<String>,
}

impl EquivalencePolicy {
    /// Structured payloads: every field participates.
    pub fn canonical_json() -> Self {
        Self {
            policy_name: "canonical_json_sha256".into(),
            canonicalization: "JSON sort keys, compact separators, UTF-8".into(),
            compare_fields: vec!["__full_json__".into()],
        }
    }

    /// Text payloads: the whole canonical text body participates.
    pub fn canonical_text() -> Self {
        Self {
            policy_name: "canonical_lf_trim_trailing_ws_sha256".into(),
            canonicalization: "LF normalize, trim trailing whitespace per line, UTF-8".into(),
            compare_fields: vec!["__full_text__".into()],
        }
    }
}

/// The file variant an artifact record was parsed from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Json,
    Text,
}

/// Where a record came from and which tool produced it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub source_artifact: String,
    pub source_type: SourceType,
    pub generator: String,
}

/// One parsed artifact, produced per source file and never persisted
/// itself — only its projection into a registry entry survives a pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub kind: String,
    pub scope: Scope,
    pub identity_fields: IdentityFields,
    pub artifact_path: String,
    pub artifact_hash: String,
    pub equivalence_policy: EquivalencePolicy,
    pub provenance: Provenance,
}

impl ArtifactRecord {
    /// Hash identifying the (kind, scope, identity) decision slot,
    /// independent of content version.
    pub fn equivalence_key(&self) -> String {
        hash_json(&json!({
            "kind": self.kind,
            "scope": self.scope,
            "identity_fields": self.identity_fields,
        }))
    }

    /// Hash identifying one specific content version within the slot.
    pub fn decision_id(&self) -> String {
        hash_json(&json!({
            "kind": self.kind,
            "scope": self.scope,
            "identity_fields": self.identity_fields,
            "artifact_hash": self.artifact_hash,
        }))
    }
}
