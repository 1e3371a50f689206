use std::path::PathBuf;

use thiserror::Error;

/// Registration errors.
///
/// `Model`, `UnsupportedArtifactType`, and `InvalidHeaderPayload` are
/// per-artifact validation failures the pass isolates; the rest are fatal
/// to the step that hits them.
#[derive(Debug, Error)]
pub enum RegisterError {
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

    #[error("unsupported artifact type: {0}")]
    UnsupportedArtifactType(PathBuf),

    #[error("malformed {key} payload in {path}: {source}")]
    InvalidHeaderPayload {
        path: PathBuf,
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("artifact {0} is outside the workspace root")]
    OutsideWorkspace(PathBuf),

    #[error(transparent)]
    Model(#[from] canonry_types::ModelError),

    #[error("invalid exclusion glob {pattern}: {source}")]
    InvalidExcludeGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("artifact root {0} not found")]
    CanonRootMissing(PathBuf),

    #[error("registry is locked by another writer: {0}")]
    RegistryLocked(PathBuf),
}
