//! Canonry data model.
//!
//! This crate provides:
//! - decision scope and identity-field value objects with layered default
//!   resolution
//! - transient artifact records with equivalence-key / decision-id content
//!   addressing
//! - the registry ledger: append/supersede upserts, deterministic ordering,
//!   and the at-most-one-active-per-slot invariant
//! - the workspace layout structure threaded into every component in place
//!   of process-wide path globals

#![deny(unsafe_code)]

pub mod error;
pub mod identity;
pub mod layout;
pub mod manifest;
pub mod record;
pub mod registry;
pub mod scope;

pub use error::ModelError;
pub use identity::IdentityFields;
pub use layout::WorkspaceLayout;
pub use manifest::RunManifest;
pub use record::{ArtifactRecord, EquivalencePolicy, Provenance, SourceType};
pub use registry::{EntryStatus, Registry, RegistryEntry, REGISTRY_SCHEMA_VERSION};
pub use scope::Scope;
