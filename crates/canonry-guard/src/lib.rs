//! Lifecycle resume gates.
//!
//! A fixed battery of independent checks evaluated against the canon
//! documents of a workspace (run manifest, lifecycle contract, lifecycle
//! index, reconstruction check, current-snapshot pointer), the registry
//! ledger, the claims matrix, and the evidence index. Every failing check
//! appends a specific abort reason; the verdict allows resume only when no
//! reason accumulated. There is no soft-fail mode — the gate fails closed.

#![deny(unsafe_code)]

pub mod docs;
pub mod error;
pub mod evidence;
pub mod guard;

pub use docs::{
    Claim, ClaimsMatrix, ContractPayload, EvidenceIndex, EvidenceRange, EvidenceRecord,
    LifecycleIndex, OrphanOverrideRule, ReconstructionCheck,
};
pub use error::GuardError;
pub use guard::{evaluate_resume_gates, GuardVerdict};
