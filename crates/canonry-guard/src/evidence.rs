use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use canonry_canon::{hash_json, sha256_hex, slice_at_pointer};
use canonry_types::WorkspaceLayout;

use crate::docs::{EvidenceRange, EvidenceRecord};
use crate::error::GuardError;

const PLACEHOLDER: &str = "UNSET";

/// Verify every evidence record against the raw files on disk.
///
/// A record resolves when its raw file exists, the declared raw-file hash
/// matches the recomputed hash of the file bytes, and — when a JSON
/// pointer is named — the canonical-JSON hash of the value addressed by
/// that pointer matches the declared slice hash. An empty pointer
/// addresses the whole raw file. Placeholders in declared hashes are
/// violations in their own right.
pub fn verify_evidence(layout: &WorkspaceLayout, records: &[EvidenceRecord]) -> Vec<String> {
    let mut violations = Vec::new();
    for record in records {
        if let Some(violation) = verify_record(layout, record) {
            violations.push(violation);
        }
    }
    violations
}

fn verify_record(layout: &WorkspaceLayout, record: &EvidenceRecord) -> Option<String> {
    let id = &record.evidence_id;
    if record.raw_path.is_empty() {
        return Some(format!("{id}:missing_raw_path"));
    }
    if record.raw_file_sha256.contains(PLACEHOLDER) || record.slice_sha256.contains(PLACEHOLDER) {
        return Some(format!("{id}:unset_hash"));
    }

    let raw_abs = layout.root().join(&record.raw_path);
    let Ok(raw_bytes) = fs::read(&raw_abs) else {
        return Some(format!("{id}:raw_missing:{}", record.raw_path));
    };
    if sha256_hex(&raw_bytes) != record.raw_file_sha256 {
        return Some(format!("{id}:raw_hash_mismatch"));
    }

    let computed_slice = if record.range.json_pointer.is_empty() {
        sha256_hex(&raw_bytes)
    } else {
        let Some(hash) = slice_hash(&raw_bytes, &record.range.json_pointer) else {
            return Some(format!("{id}:invalid_json_pointer"));
        };
        hash
    };
    if computed_slice != record.slice_sha256 {
        return Some(format!("{id}:slice_hash_mismatch"));
    }

    debug!(evidence_id = %id, "evidence resolved");
    None
}

fn slice_hash(raw_bytes: &[u8], pointer: &str) -> Option<String> {
    let root: Value = serde_json::from_slice(raw_bytes).ok()?;
    slice_at_pointer(&root, pointer).map(hash_json)
}

impl EvidenceRecord {
    /// Construct a record by hashing a raw file (and optionally a pointer
    /// slice of it) as it exists on disk right now. Verifying the result
    /// against the same file passes by construction.
    pub fn compute(
        layout: &WorkspaceLayout,
        evidence_id: &str,
        raw_path: &str,
        json_pointer: &str,
    ) -> Result<Self, GuardError> {
        let raw_abs = layout.root().join(raw_path);
        let raw_bytes = read_bytes(&raw_abs)?;
        let slice_sha256 = if json_pointer.is_empty() {
            sha256_hex(&raw_bytes)
        } else {
            let root: Value =
                serde_json::from_slice(&raw_bytes).map_err(|source| GuardError::Json {
                    path: raw_abs.clone(),
                    source,
                })?;
            slice_at_pointer(&root, json_pointer)
                .map(hash_json)
                .ok_or_else(|| GuardError::InvalidPointer {
                    path: raw_abs.clone(),
                    pointer: json_pointer.to_string(),
                })?
        };
        Ok(Self {
            evidence_id: evidence_id.to_string(),
            raw_path: raw_path.to_string(),
            raw_file_sha256: sha256_hex(&raw_bytes),
            slice_sha256,
            range: EvidenceRange {
                json_pointer: json_pointer.to_string(),
            },
        })
    }
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, GuardError> {
    fs::read(path).map_err(|source| GuardError::Io {
        path: path.to_path_buf(),
        source,
    })
}
