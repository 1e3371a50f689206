use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use walkdir::WalkDir;

use canonry_canon::hash_text;
use canonry_types::{EntryStatus, Registry, WorkspaceLayout};

use crate::docs::{
    self, ClaimsMatrix, EvidenceIndex, LifecycleIndex, ReconstructionCheck,
};
use crate::error::GuardError;
use crate::evidence::verify_evidence;

const PLACEHOLDER: &str = "UNSET";
const CONTRACT_KIND: &str = "lifecycle_contract";

/// Outcome of one guard evaluation: per-check results, accumulated abort
/// reasons, and the violation detail the report surfaces verbatim.
#[derive(Clone, Debug, Serialize)]
pub struct GuardVerdict {
    pub allowed: bool,
    pub lifecycle_id: String,
    pub checks: BTreeMap<String, bool>,
    pub orphan_count: u64,
    pub override_enabled: bool,
    pub contract_hash: String,
    pub unset_violations: Vec<String>,
    pub supported_claim_violations: Vec<String>,
    pub evidence_hash_violations: Vec<String>,
    pub reasons: Vec<String>,
}

/// Evaluate the fixed resume-gate battery.
///
/// The contract's own lifecycle id is ground truth; the run manifest,
/// lifecycle index, reconstruction check, and the caller's expected id (if
/// any) are all measured against it. The verdict allows resume only when
/// no abort reason accumulated — the gate fails closed.
pub fn evaluate_resume_gates(
    layout: &WorkspaceLayout,
    expected_lifecycle_id: Option<&str>,
) -> Result<GuardVerdict, GuardError> {
    let manifest: canonry_types::RunManifest = docs::load_canon(&layout.run_manifest_path())?;
    let lifecycle_index: LifecycleIndex = docs::load_canon(&layout.lifecycle_index_path())?;
    let reconstruction: ReconstructionCheck =
        docs::load_canon(&layout.reconstruction_check_path())?;

    let contract_path = layout.lifecycle_contract_path();
    let contract_text = docs::read_canon(&contract_path)?;
    let contract = docs::extract_contract_payload(&contract_path, &contract_text)?;
    let contract_hash = hash_text(&contract_text);
    let contract_lifecycle = contract.lifecycle_id.clone();

    let mut checks = BTreeMap::new();
    let mut reasons = Vec::new();

    let manifest_lifecycle = manifest.lifecycle_id.as_deref().unwrap_or("");
    gate_check(
        &mut checks,
        &mut reasons,
        "manifest_contract_match",
        manifest_lifecycle == contract_lifecycle,
        "abort: lifecycle_id mismatch between run_manifest and lifecycle_contract",
    );
    gate_check(
        &mut checks,
        &mut reasons,
        "lifecycle_index_match",
        lifecycle_index.lifecycle_id == contract_lifecycle,
        "abort: lifecycle_id mismatch between lifecycle_index and lifecycle_contract",
    );
    gate_check(
        &mut checks,
        &mut reasons,
        "reconstruction_lifecycle_match",
        reconstruction.lifecycle_id == contract_lifecycle,
        "abort: lifecycle_id mismatch between reconstruction_check and lifecycle_contract",
    );
    gate_check(
        &mut checks,
        &mut reasons,
        "reconstructable",
        reconstruction.reconstructable,
        "abort: reconstruction_check.reconstructable is false",
    );
    gate_check(
        &mut checks,
        &mut reasons,
        "summary_pass",
        reconstruction.summary.status == "pass",
        "abort: reconstruction_check summary status is not pass",
    );
    gate_check(
        &mut checks,
        &mut reasons,
        "requested_lifecycle_match",
        expected_lifecycle_id.map_or(true, |expected| expected == contract_lifecycle),
        "abort: lifecycle_id mismatch against requested lifecycle_id",
    );

    let orphan_count = lifecycle_index.orphan_count;
    let orphan_free = orphan_count == 0;
    // Informational: the orphan policy itself is enforced below.
    checks.insert("orphan_free".to_string(), orphan_free);

    let current_snapshot =
        docs::current_snapshot_path(&layout.current_pointer_path(), &layout.snapshot_dir())?;
    let snapshot_exists = current_snapshot.exists();
    gate_check(
        &mut checks,
        &mut reasons,
        "current_snapshot_exists",
        snapshot_exists,
        "abort: current snapshot referenced by the CURRENT pointer is missing",
    );

    let current_rel = layout.rel_unix(&current_snapshot).unwrap_or_default();
    let snapshot_managed = lifecycle_index
        .managed_snapshot_refs
        .iter()
        .any(|r| r == &current_rel);
    checks.insert("current_snapshot_managed".to_string(), snapshot_managed);
    if snapshot_exists && !snapshot_managed {
        reasons
            .push("abort: current snapshot is not in lifecycle_index managed_snapshot_refs".into());
    }

    let override_enabled = contract.orphan_override_rule.enabled;
    checks.insert(
        "override_enabled_if_needed".to_string(),
        orphan_free || override_enabled,
    );
    if !orphan_free && !override_enabled {
        reasons.push("abort: orphan snapshots detected and override is not explicitly enabled".into());
    }

    let contract_active =
        contract_is_active_in_registry(layout, &contract_hash, &contract_lifecycle)?;
    checks.insert("contract_active_in_registry".to_string(), contract_active);
    if !orphan_free && override_enabled && !contract_active {
        reasons.push(
            "abort: orphan override enabled but updated lifecycle contract is not active in the registry"
                .into(),
        );
    }

    let unset_violations = identity_placeholder_violations(layout);
    gate_check(
        &mut checks,
        &mut reasons,
        "identity_fields_no_unset",
        unset_violations.is_empty(),
        "abort: UNSET found in identity_fields",
    );

    let supported_claim_violations = supported_claim_violations(layout);
    gate_check(
        &mut checks,
        &mut reasons,
        "supported_claims_have_evidence_refs",
        supported_claim_violations.is_empty(),
        "abort: supported claim missing evidence_refs",
    );

    let evidence_hash_violations = evidence_violations(layout);
    gate_check(
        &mut checks,
        &mut reasons,
        "evidence_hashes_match_raw",
        evidence_hash_violations.is_empty(),
        "abort: evidence hash mismatch or invalid evidence record",
    );

    let allowed = reasons.is_empty();
    debug!(allowed, lifecycle_id = %contract_lifecycle, "guard evaluation complete");
    Ok(GuardVerdict {
        allowed,
        lifecycle_id: contract_lifecycle,
        checks,
        orphan_count,
        override_enabled,
        contract_hash,
        unset_violations,
        supported_claim_violations,
        evidence_hash_violations,
        reasons,
    })
}

fn gate_check(
    checks: &mut BTreeMap<String, bool>,
    reasons: &mut Vec<String>,
    name: &str,
    passed: bool,
    reason: &str,
) {
    checks.insert(name.to_string(), passed);
    if !passed {
        warn!(check = name, "resume gate failed");
        reasons.push(reason.to_string());
    }
}

/// Overrides must be auditable in the ledger, not just declared in a
/// file: the current contract text's canonical hash has to be an active
/// `lifecycle_contract` entry at the contract's path, scoped to the same
/// lifecycle id.
fn contract_is_active_in_registry(
    layout: &WorkspaceLayout,
    contract_hash: &str,
    lifecycle_id: &str,
) -> Result<bool, GuardError> {
    let registry_path = layout.registry_path();
    if !registry_path.exists() {
        return Ok(false);
    }
    let text = fs::read_to_string(&registry_path).map_err(|source| GuardError::Io {
        path: registry_path.clone(),
        source,
    })?;
    let registry: Registry = serde_json::from_str(&text).map_err(|source| GuardError::Json {
        path: registry_path,
        source,
    })?;

    let contract_rel = layout.lifecycle_contract_rel();
    Ok(registry.entries.iter().any(|entry| {
        entry.status == EntryStatus::Active
            && entry.kind == CONTRACT_KIND
            && entry.artifact_path == contract_rel
            && entry.artifact_hash == contract_hash
            && entry.scope.lifecycle_id == lifecycle_id
    }))
}

/// Scan every non-tool-owned canon JSON document for placeholder tokens
/// inside its top-level `identity_fields` object.
fn identity_placeholder_violations(layout: &WorkspaceLayout) -> Vec<String> {
    let tool_prefix = layout.tool_prefix();
    let mut violations = Vec::new();
    for entry in WalkDir::new(layout.canon_dir())
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(rel) = layout.rel_unix(path) else {
            continue;
        };
        if rel.starts_with(&tool_prefix) {
            continue;
        }
        let Ok(text) = fs::read_to_string(path) else {
            violations.push(format!("{rel}:unreadable"));
            continue;
        };
        let Ok(payload) = serde_json::from_str::<Value>(&text) else {
            violations.push(format!("{rel}:unparseable_json"));
            continue;
        };
        let Some(identity) = payload.get("identity_fields").and_then(Value::as_object) else {
            continue;
        };
        for (key, value) in identity {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            if rendered.contains(PLACEHOLDER) {
                violations.push(format!("{rel}:{key}"));
            }
        }
    }
    violations
}

/// Every claim marked "supported" must carry at least one evidence
/// reference. A missing claims matrix is itself a violation.
fn supported_claim_violations(layout: &WorkspaceLayout) -> Vec<String> {
    let path = layout.claims_matrix_path();
    let matrix: ClaimsMatrix = match load_or_missing(layout, &path) {
        Ok(matrix) => matrix,
        Err(violation) => return vec![violation],
    };
    matrix
        .claims
        .iter()
        .filter(|claim| claim.status.eq_ignore_ascii_case("supported"))
        .filter(|claim| claim.evidence_refs.is_empty())
        .map(|claim| claim.claim_id.clone())
        .collect()
}

fn evidence_violations(layout: &WorkspaceLayout) -> Vec<String> {
    let path = layout.evidence_index_path();
    let index: EvidenceIndex = match load_or_missing(layout, &path) {
        Ok(index) => index,
        Err(violation) => return vec![violation],
    };
    verify_evidence(layout, &index.evidence)
}

fn load_or_missing<T: serde::de::DeserializeOwned>(
    layout: &WorkspaceLayout,
    path: &Path,
) -> Result<T, String> {
    let rel = layout
        .rel_unix(path)
        .unwrap_or_else(|| path.display().to_string());
    if !path.exists() {
        return Err(format!("missing {rel}"));
    }
    let text = fs::read_to_string(path).map_err(|_| format!("unreadable {rel}"))?;
    serde_json::from_str(&text).map_err(|_| format!("invalid {rel}"))
}
