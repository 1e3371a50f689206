use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use canonry_types::{RunManifest, WorkspaceLayout};

use crate::collect::Collector;
use crate::config::RegisterConfig;
use crate::error::RegisterError;
use crate::parser::ArtifactParser;
use crate::store::RegistryStore;

/// One artifact the pass rejected, with the reason. Skips are isolated:
/// they never abort the batch.
#[derive(Clone, Debug, Serialize)]
pub struct SkippedArtifact {
    pub path: String,
    pub reason: String,
}

/// Outcome of one registration pass.
#[derive(Clone, Debug, Serialize)]
pub struct RegistrationSummary {
    pub dry_run: bool,
    pub artifact_count: usize,
    pub new_decision_ids: Vec<String>,
    pub skipped: Vec<SkippedArtifact>,
}

/// Run one collection + upsert pass over the workspace.
///
/// `dry_run` computes everything but leaves the registry untouched. A
/// write pass holds the advisory lock across load-mutate-write. Fatal
/// errors are environment/schema level: missing canon root, unreadable or
/// schema-invalid registry/config/manifest.
pub fn run_registration(
    layout: &WorkspaceLayout,
    config_path: Option<&Path>,
    dry_run: bool,
) -> Result<RegistrationSummary, RegisterError> {
    let canon_dir = layout.canon_dir();
    if !canon_dir.is_dir() {
        return Err(RegisterError::CanonRootMissing(canon_dir));
    }

    let default_config_path = layout.register_config_path();
    let config_path = config_path.unwrap_or(&default_config_path);
    let config = RegisterConfig::load(config_path, layout)?;
    let manifest = load_manifest(layout)?;

    let paths = Collector::new(layout, &config).collect()?;
    let parser = ArtifactParser::new(layout, &manifest);

    let mut records = Vec::new();
    let mut skipped = Vec::new();
    for path in &paths {
        match parser.parse(path) {
            Ok(record) => records.push(record),
            Err(reason) => {
                let rel = layout
                    .rel_unix(path)
                    .unwrap_or_else(|| path.display().to_string());
                warn!(path = %rel, %reason, "skipping artifact");
                skipped.push(SkippedArtifact {
                    path: rel,
                    reason: reason.to_string(),
                });
            }
        }
    }

    let store = RegistryStore::new(layout);
    let new_decision_ids = if dry_run {
        let mut registry = store.load()?;
        registry.upsert(&records)
    } else {
        let _guard = store.lock()?;
        let mut registry = store.load()?;
        let created = registry.upsert(&records);
        store.persist(&registry)?;
        created
    };

    info!(
        artifacts = paths.len(),
        new_decisions = new_decision_ids.len(),
        skipped = skipped.len(),
        dry_run,
        "registration pass complete"
    );
    Ok(RegistrationSummary {
        dry_run,
        artifact_count: paths.len(),
        new_decision_ids,
        skipped,
    })
}

fn load_manifest(layout: &WorkspaceLayout) -> Result<RunManifest, RegisterError> {
    let path = layout.run_manifest_path();
    if !path.exists() {
        return Ok(RunManifest::default());
    }
    let text = fs::read_to_string(&path).map_err(|source| RegisterError::Io {
        path: path.clone(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| RegisterError::Json { path, source })
}
