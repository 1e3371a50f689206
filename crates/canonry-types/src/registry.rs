use canonry_canon::canonical_json_bytes;
use serde::{Deserialize, Serialize};

use crate::identity::IdentityFields;
use crate::record::{ArtifactRecord, EquivalencePolicy, Provenance};
use crate::scope::Scope;

/// Schema version written into new registries.
pub const REGISTRY_SCHEMA_VERSION: &str = "1.0";

/// Entry status. The only mutation an entry ever sees is the
/// active → superseded transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Active,
    Superseded,
}

/// One decision recorded in the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub decision_id: String,
    pub kind: String,
    pub scope: Scope,
    pub identity_fields: IdentityFields,
    pub artifact_path: String,
    pub artifact_hash: String,
    pub equivalence_policy: EquivalencePolicy,
    pub provenance: Provenance,
    pub status: EntryStatus,
    /// Decision ids this entry retired when it became active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supersedes: Option<Vec<String>>,
}

impl RegistryEntry {
    fn from_record(record: &ArtifactRecord, superseded: Vec<String>) -> Self {
        Self {
            decision_id: record.decision_id(),
            kind: record.kind.clone(),
            scope: record.scope.clone(),
            identity_fields: record.identity_fields.clone(),
            artifact_path: record.artifact_path.clone(),
            artifact_hash: record.artifact_hash.clone(),
            equivalence_policy: record.equivalence_policy.clone(),
            provenance: record.provenance.clone(),
            status: EntryStatus::Active,
            supersedes: if superseded.is_empty() {
                None
            } else {
                Some(superseded)
            },
        }
    }

    /// Whether this entry occupies the same decision slot as `record`.
    fn same_slot(&self, record: &ArtifactRecord) -> bool {
        self.kind == record.kind
            && self.scope == record.scope
            && self.identity_fields == record.identity_fields
    }
}

/// The registry ledger: schema version plus deterministically ordered
/// entries. Append/supersede only — no deletion, no in-place edits.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Registry {
    pub schema_version: String,
    pub entries: Vec<RegistryEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            schema_version: REGISTRY_SCHEMA_VERSION.to_string(),
            entries: Vec::new(),
        }
    }

    /// Upsert a batch of records.
    ///
    /// Per record: the matching set is every *active* entry sharing the
    /// record's (kind, scope, identity_fields) slot. Identical content in
    /// that set makes the record a no-op; otherwise every match is
    /// superseded (its decision id recorded on the new entry) and one new
    /// active entry is appended. Returns the decision ids created, in
    /// input order. Entries are re-sorted deterministically afterwards so
    /// re-serialization never produces diff noise.
    pub fn upsert(&mut self, records: &[ArtifactRecord]) -> Vec<String> {
        let mut created = Vec::new();
        for record in records {
            let matching: Vec<usize> = self
                .entries
                .iter()
                .enumerate()
                .filter(|(_, e)| e.status == EntryStatus::Active && e.same_slot(record))
                .map(|(i, _)| i)
                .collect();

            if matching
                .iter()
                .any(|&i| self.entries[i].artifact_hash == record.artifact_hash)
            {
                // Idempotent re-registration: already-registered content
                // never grows the ledger.
                continue;
            }

            let superseded: Vec<String> = matching
                .iter()
                .map(|&i| self.entries[i].decision_id.clone())
                .collect();
            for &i in &matching {
                self.entries[i].status = EntryStatus::Superseded;
            }

            let entry = RegistryEntry::from_record(record, superseded);
            created.push(entry.decision_id.clone());
            self.entries.push(entry);
        }
        self.sort_entries();
        created
    }

    /// Entries currently marked active.
    pub fn active_entries(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries
            .iter()
            .filter(|e| e.status == EntryStatus::Active)
    }

    /// Deterministic order: (kind, canonical scope JSON, canonical
    /// identity JSON, decision id).
    pub fn sort_entries(&mut self) {
        self.entries.sort_by_cached_key(|entry| {
            (
                entry.kind.clone(),
                canon_string(&entry.scope),
                canon_string(&entry.identity_fields),
                entry.decision_id.clone(),
            )
        });
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

fn canon_string<T: Serialize>(value: &T) -> String {
    let value = serde_json::to_value(value).unwrap_or_default();
    String::from_utf8(canonical_json_bytes(&value)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::SourceType;
    use std::collections::HashSet;

    fn record(kind: &str, run_id: &str, content_hash: &str) -> ArtifactRecord {
        ArtifactRecord {
            kind: kind.into(),
            scope: Scope {
                od_pair: "p1".into(),
                graph_id: "g1".into(),
                run_id: run_id.into(),
                lifecycle_id: "L1".into(),
            },
            identity_fields: IdentityFields {
                repo_commit: "c1".into(),
                objective_hash: "o1".into(),
                graph_hash: "g1h".into(),
                params_hash: "pa1".into(),
            },
            artifact_path: format!("canon/{kind}.json"),
            artifact_hash: content_hash.into(),
            equivalence_policy: EquivalencePolicy::canonical_json(),
            provenance: Provenance {
                source_artifact: format!("canon/{kind}.json"),
                source_type: SourceType::Json,
                generator: "test".into(),
            },
        }
    }

    fn assert_at_most_one_active_per_slot(registry: &Registry) {
        let mut seen = HashSet::new();
        for entry in registry.active_entries() {
            let key = (
                entry.kind.clone(),
                canon_string(&entry.scope),
                canon_string(&entry.identity_fields),
            );
            assert!(seen.insert(key), "two active entries share a slot");
        }
    }

    #[test]
    fn first_registration_creates_one_active_entry() {
        let mut registry = Registry::new();
        let created = registry.upsert(&[record("objective_spec", "r1", "h1")]);
        assert_eq!(created.len(), 1);
        assert_eq!(registry.entries.len(), 1);
        assert_eq!(registry.entries[0].status, EntryStatus::Active);
        assert!(registry.entries[0].supersedes.is_none());
    }

    #[test]
    fn re_registering_identical_content_is_a_no_op() {
        let mut registry = Registry::new();
        registry.upsert(&[record("objective_spec", "r1", "h1")]);
        let before = registry.entries.clone();

        let created = registry.upsert(&[record("objective_spec", "r1", "h1")]);
        assert!(created.is_empty());
        assert_eq!(registry.entries, before);
    }

    #[test]
    fn changed_content_supersedes_the_prior_active_entry() {
        let mut registry = Registry::new();
        let first = registry.upsert(&[record("objective_spec", "r1", "h1")]);
        let second = registry.upsert(&[record("objective_spec", "r1", "h2")]);
        assert_eq!(second.len(), 1);

        let active: Vec<_> = registry.active_entries().collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].artifact_hash, "h2");
        assert_eq!(active[0].supersedes, Some(first));

        let superseded: Vec<_> = registry
            .entries
            .iter()
            .filter(|e| e.status == EntryStatus::Superseded)
            .collect();
        assert_eq!(superseded.len(), 1);
        assert_eq!(superseded[0].artifact_hash, "h1");
    }

    #[test]
    fn distinct_slots_do_not_interfere() {
        let mut registry = Registry::new();
        registry.upsert(&[
            record("objective_spec", "r1", "h1"),
            record("objective_spec", "r2", "h1"),
            record("sweep_manifest", "r1", "h1"),
        ]);
        assert_eq!(registry.active_entries().count(), 3);
        assert_at_most_one_active_per_slot(&registry);
    }

    #[test]
    fn supersession_chain_preserves_history() {
        let mut registry = Registry::new();
        registry.upsert(&[record("objective_spec", "r1", "h1")]);
        registry.upsert(&[record("objective_spec", "r1", "h2")]);
        registry.upsert(&[record("objective_spec", "r1", "h3")]);

        assert_eq!(registry.entries.len(), 3);
        assert_eq!(registry.active_entries().count(), 1);
        assert_at_most_one_active_per_slot(&registry);
    }

    #[test]
    fn entry_order_is_deterministic() {
        let mut a = Registry::new();
        a.upsert(&[
            record("sweep_manifest", "r1", "h1"),
            record("objective_spec", "r2", "h2"),
            record("objective_spec", "r1", "h3"),
        ]);

        let mut b = Registry::new();
        b.upsert(&[record("objective_spec", "r1", "h3")]);
        b.upsert(&[record("sweep_manifest", "r1", "h1")]);
        b.upsert(&[record("objective_spec", "r2", "h2")]);

        let ids_a: Vec<_> = a.entries.iter().map(|e| &e.decision_id).collect();
        let ids_b: Vec<_> = b.entries.iter().map(|e| &e.decision_id).collect();
        assert_eq!(ids_a, ids_b);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        // Any sequence of upserts keeps the slot invariant.
        proptest! {
            #[test]
            fn at_most_one_active_per_slot(
                ops in proptest::collection::vec(
                    ("(objective_spec|sweep_manifest)", "r[12]", "h[1-4]"),
                    1..24,
                )
            ) {
                let mut registry = Registry::new();
                for (kind, run_id, hash) in &ops {
                    registry.upsert(&[record(kind, run_id, hash)]);
                }
                assert_at_most_one_active_per_slot(&registry);
            }
        }
    }
}
