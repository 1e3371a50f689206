use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use canonry_canon::{hash_json, hash_text};
use canonry_types::scope::value_as_string;
use canonry_types::{
    ArtifactRecord, EquivalencePolicy, IdentityFields, Provenance, RunManifest, Scope, SourceType,
    WorkspaceLayout,
};

use crate::error::RegisterError;

/// Generator identity stamped into provenance.
pub const GENERATOR: &str = "canonry-registry";

const HEADER_START: &str = "<!--";
const HEADER_END: &str = "-->";

/// Parses one artifact file into an in-memory record.
///
/// Two variants, selected by file suffix: structured (`.json`) documents
/// hash their full canonical JSON form; text (`.md`) documents hash their
/// canonical text form and may carry scope/identity/kind metadata in a
/// leading comment header. Parsing is read-only.
pub struct ArtifactParser<'a> {
    layout: &'a WorkspaceLayout,
    manifest: &'a RunManifest,
}

impl<'a> ArtifactParser<'a> {
    pub fn new(layout: &'a WorkspaceLayout, manifest: &'a RunManifest) -> Self {
        Self { layout, manifest }
    }

    pub fn parse(&self, path: &Path) -> Result<ArtifactRecord, RegisterError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => self.parse_json(path),
            Some("md") => self.parse_text(path),
            _ => Err(RegisterError::UnsupportedArtifactType(path.to_path_buf())),
        }
    }

    fn parse_json(&self, path: &Path) -> Result<ArtifactRecord, RegisterError> {
        let text = read(path)?;
        let payload: Value = serde_json::from_str(&text).map_err(|source| RegisterError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        let doc = payload.as_object();

        let lifecycle_id = doc
            .and_then(|d| d.get("lifecycle_id"))
            .map(value_as_string)
            .unwrap_or_else(|| self.manifest.lifecycle_fallback().to_string());
        let scope = Scope::resolve(
            doc.and_then(|d| d.get("decision_scope")).and_then(Value::as_object),
            self.manifest.decision_scope.as_ref(),
            &lifecycle_id,
        );
        let identity = IdentityFields::resolve(
            doc.and_then(|d| d.get("identity_fields")).and_then(Value::as_object),
            self.manifest.identity_fields.as_ref(),
        )?;
        let kind = doc
            .and_then(|d| d.get("artifact_kind"))
            .map(value_as_string)
            .unwrap_or_else(|| file_stem(path));

        let rel = self.rel(path)?;
        debug!(path = %rel, kind = %kind, "parsed structured artifact");
        Ok(ArtifactRecord {
            kind,
            scope,
            identity_fields: identity,
            artifact_path: rel.clone(),
            artifact_hash: hash_json(&payload),
            equivalence_policy: EquivalencePolicy::canonical_json(),
            provenance: Provenance {
                source_artifact: rel,
                source_type: SourceType::Json,
                generator: GENERATOR.to_string(),
            },
        })
    }

    fn parse_text(&self, path: &Path) -> Result<ArtifactRecord, RegisterError> {
        let text = read(path)?;
        let header = parse_header(&text);

        let lifecycle_id = header
            .get("LIFECYCLE_ID")
            .cloned()
            .unwrap_or_else(|| self.manifest.lifecycle_fallback().to_string());
        let scope_doc = header_json(&header, "DECISION_SCOPE_JSON", path)?;
        let scope = Scope::resolve(
            scope_doc.as_ref().and_then(Value::as_object),
            self.manifest.decision_scope.as_ref(),
            &lifecycle_id,
        );
        let identity_doc = header_json(&header, "DECISION_IDENTITY_FIELDS_JSON", path)?;
        let identity = IdentityFields::resolve(
            identity_doc.as_ref().and_then(Value::as_object),
            self.manifest.identity_fields.as_ref(),
        )?;
        let kind = header
            .get("DECISION_KIND")
            .cloned()
            .unwrap_or_else(|| file_stem(path));

        let rel = self.rel(path)?;
        debug!(path = %rel, kind = %kind, "parsed text artifact");
        Ok(ArtifactRecord {
            kind,
            scope,
            identity_fields: identity,
            artifact_path: rel.clone(),
            artifact_hash: hash_text(&text),
            equivalence_policy: EquivalencePolicy::canonical_text(),
            provenance: Provenance {
                source_artifact: rel,
                source_type: SourceType::Text,
                generator: GENERATOR.to_string(),
            },
        })
    }

    fn rel(&self, path: &Path) -> Result<String, RegisterError> {
        self.layout
            .rel_unix(path)
            .ok_or_else(|| RegisterError::OutsideWorkspace(path.to_path_buf()))
    }
}

fn read(path: &Path) -> Result<String, RegisterError> {
    fs::read_to_string(path).map_err(|source| RegisterError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Extract the leading comment-style header block: `KEY: value` lines
/// between the start/end markers. Absent or unterminated headers yield an
/// empty map — the document is still a valid artifact.
fn parse_header(text: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    if !text.trim_start().starts_with(HEADER_START) {
        return out;
    }
    let Some(start) = text.find(HEADER_START) else {
        return out;
    };
    let body = &text[start + HEADER_START.len()..];
    let Some(end) = body.find(HEADER_END) else {
        return out;
    };
    for line in body[..end].lines() {
        let Some((key, value)) = line.trim().split_once(':') else {
            continue;
        };
        out.insert(key.trim().to_string(), value.trim().to_string());
    }
    out
}

/// A recognized header key carrying an embedded JSON payload. Malformed
/// JSON here rejects the file, not the whole run.
fn header_json(
    header: &BTreeMap<String, String>,
    key: &'static str,
    path: &Path,
) -> Result<Option<Value>, RegisterError> {
    header
        .get(key)
        .map(|raw| {
            serde_json::from_str(raw).map_err(|source| RegisterError::InvalidHeaderPayload {
                path: path.to_path_buf(),
                key,
                source,
            })
        })
        .transpose()
}
