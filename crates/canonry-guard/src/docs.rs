use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::GuardError;

/// Fenced payload embedded in the lifecycle contract document.
#[derive(Clone, Debug, Deserialize)]
pub struct ContractPayload {
    pub lifecycle_id: String,
    #[serde(default)]
    pub orphan_override_rule: OrphanOverrideRule,
}

/// Orphan-override rule: letting orphan snapshots through must be an
/// explicit, auditable decision, never a default.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct OrphanOverrideRule {
    #[serde(default)]
    pub enabled: bool,
}

/// Lifecycle index: the managed snapshot set and its orphan count.
#[derive(Clone, Debug, Deserialize)]
pub struct LifecycleIndex {
    pub lifecycle_id: String,
    #[serde(default)]
    pub orphan_count: u64,
    #[serde(default)]
    pub managed_snapshot_refs: Vec<String>,
}

/// Reconstruction-check report produced by the rebuild tooling.
#[derive(Clone, Debug, Deserialize)]
pub struct ReconstructionCheck {
    pub lifecycle_id: String,
    #[serde(default)]
    pub reconstructable: bool,
    #[serde(default)]
    pub summary: ReconstructionSummary,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ReconstructionSummary {
    #[serde(default)]
    pub status: String,
}

/// Claims matrix: scientific claims and their evidence references.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ClaimsMatrix {
    #[serde(default)]
    pub claims: Vec<Claim>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Claim {
    #[serde(default = "unknown_claim")]
    pub claim_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub evidence_refs: Vec<serde_json::Value>,
}

fn unknown_claim() -> String {
    "unknown_claim".to_string()
}

/// Evidence index: each record pins a raw source file and, optionally, a
/// slice of it addressed by a JSON pointer.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct EvidenceIndex {
    #[serde(default)]
    pub evidence: Vec<EvidenceRecord>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvidenceRecord {
    #[serde(default = "unknown_evidence")]
    pub evidence_id: String,
    #[serde(default)]
    pub raw_path: String,
    #[serde(default)]
    pub raw_file_sha256: String,
    #[serde(default)]
    pub slice_sha256: String,
    #[serde(default)]
    pub range: EvidenceRange,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EvidenceRange {
    #[serde(default)]
    pub json_pointer: String,
}

fn unknown_evidence() -> String {
    "unknown_evidence".to_string()
}

/// Load a typed canon document. Unknown fields are tolerated, required
/// fields are enforced; a missing file or broken schema is fatal to the
/// evaluation that needed it.
pub(crate) fn load_canon<T: DeserializeOwned>(path: &Path) -> Result<T, GuardError> {
    let text = read_canon(path)?;
    serde_json::from_str(&text).map_err(|source| GuardError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn read_canon(path: &Path) -> Result<String, GuardError> {
    if !path.exists() {
        return Err(GuardError::MissingCanonFile(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(|source| GuardError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Extract the contract's fenced JSON payload from the document text.
pub fn extract_contract_payload(
    contract_path: &Path,
    text: &str,
) -> Result<ContractPayload, GuardError> {
    let fence = Regex::new(r"(?s)```json\s*(\{.*?\})\s*```").expect("fence pattern is valid");
    let payload = fence
        .captures(text)
        .and_then(|c| c.get(1))
        .ok_or_else(|| GuardError::ContractPayloadMissing(contract_path.to_path_buf()))?;
    serde_json::from_str(payload.as_str()).map_err(|source| GuardError::Json {
        path: contract_path.to_path_buf(),
        source,
    })
}

/// Resolve the snapshot named by the current-snapshot pointer file.
pub fn current_snapshot_path(
    pointer_path: &Path,
    snapshot_dir: &Path,
) -> Result<PathBuf, GuardError> {
    let name = read_canon(pointer_path)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(GuardError::EmptyCurrentPointer(pointer_path.to_path_buf()));
    }
    Ok(snapshot_dir.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_payload_parses_from_fenced_block() {
        let text = "# Lifecycle contract\n\nSome prose.\n\n```json\n{\n  \"lifecycle_id\": \"L7\",\n  \"orphan_override_rule\": {\"enabled\": true}\n}\n```\n";
        let payload = extract_contract_payload(Path::new("contract.md"), text).unwrap();
        assert_eq!(payload.lifecycle_id, "L7");
        assert!(payload.orphan_override_rule.enabled);
    }

    #[test]
    fn contract_without_payload_is_rejected() {
        let err = extract_contract_payload(Path::new("contract.md"), "# nothing here\n");
        assert!(matches!(err, Err(GuardError::ContractPayloadMissing(_))));
    }

    #[test]
    fn override_rule_defaults_to_disabled() {
        let text = "```json\n{\"lifecycle_id\": \"L1\"}\n```";
        let payload = extract_contract_payload(Path::new("contract.md"), text).unwrap();
        assert!(!payload.orphan_override_rule.enabled);
    }

    #[test]
    fn canon_documents_tolerate_unknown_fields() {
        let index: LifecycleIndex = serde_json::from_str(
            r#"{"lifecycle_id": "L1", "orphan_count": 2, "managed_snapshot_refs": [], "notes": "x"}"#,
        )
        .unwrap();
        assert_eq!(index.orphan_count, 2);
    }

    #[test]
    fn missing_lifecycle_id_is_a_schema_error() {
        let parsed: Result<LifecycleIndex, _> = serde_json::from_str(r#"{"orphan_count": 0}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn current_pointer_resolves_into_snapshot_dir() {
        let dir = tempfile::tempdir().unwrap();
        let pointer = dir.path().join("CURRENT");
        fs::write(&pointer, "snap_002.json\n").unwrap();
        let resolved = current_snapshot_path(&pointer, dir.path()).unwrap();
        assert_eq!(resolved, dir.path().join("snap_002.json"));
    }

    #[test]
    fn empty_current_pointer_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let pointer = dir.path().join("CURRENT");
        fs::write(&pointer, "  \n").unwrap();
        assert!(matches!(
            current_snapshot_path(&pointer, dir.path()),
            Err(GuardError::EmptyCurrentPointer(_))
        ));
    }
}
