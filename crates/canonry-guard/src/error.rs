use std::path::PathBuf;

use thiserror::Error;

/// Guard evaluation errors.
///
/// These are environment/schema failures that prevent the battery from
/// running at all; individual check failures are not errors, they are
/// abort reasons inside the verdict.
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("required canon file missing: {0}")]
    MissingCanonFile(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("lifecycle contract {0} missing fenced JSON payload")]
    ContractPayloadMissing(PathBuf),

    #[error("JSON pointer {pointer} does not resolve inside {path}")]
    InvalidPointer { path: PathBuf, pointer: String },

    #[error("current-snapshot pointer {0} is empty")]
    EmptyCurrentPointer(PathBuf),
}
