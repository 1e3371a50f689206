//! Artifact registration.
//!
//! A registration pass walks the candidate artifact set, parses each file
//! into a transient [`canonry_types::ArtifactRecord`], and upserts the
//! records into the registry ledger under the single-writer discipline:
//! load-mutate-write is one critical section guarded by an advisory lock
//! file. Per-artifact parse failures are isolated — they are reported as
//! skipped artifacts, never aborting the batch — while an unreadable
//! registry or a broken registry schema aborts the whole pass.

#![deny(unsafe_code)]

pub mod collect;
pub mod config;
pub mod error;
pub mod parser;
pub mod pass;
pub mod store;

pub use collect::Collector;
pub use config::RegisterConfig;
pub use error::RegisterError;
pub use parser::ArtifactParser;
pub use pass::{run_registration, RegistrationSummary, SkippedArtifact};
pub use store::{RegistryLock, RegistryStore};
