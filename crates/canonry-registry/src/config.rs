use std::fs;
use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;

use canonry_types::WorkspaceLayout;

use crate::error::RegisterError;

/// Registration config.
///
/// An absent file defaults to an empty allow-list (triggering recursive
/// discovery of the canon directory) plus one exclusion glob protecting
/// tool-owned files from self-registration.
#[derive(Clone, Debug, Deserialize)]
pub struct RegisterConfig {
    #[serde(default)]
    pub known_artifacts: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Option<Vec<String>>,
}

impl RegisterConfig {
    /// Load from `path`, falling back to defaults when the file is absent.
    /// A present-but-malformed config is a schema error, never coerced.
    pub fn load(path: &Path, layout: &WorkspaceLayout) -> Result<Self, RegisterError> {
        if !path.exists() {
            return Ok(Self {
                known_artifacts: Vec::new(),
                exclude_globs: Some(vec![layout.tool_exclude_glob()]),
            });
        }
        let text = fs::read_to_string(path).map_err(|source| RegisterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self =
            serde_json::from_str(&text).map_err(|source| RegisterError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        if config.exclude_globs.is_none() {
            config.exclude_globs = Some(vec![layout.tool_exclude_glob()]);
        }
        Ok(config)
    }

    pub fn exclude_globs(&self) -> &[String] {
        self.exclude_globs.as_deref().unwrap_or_default()
    }

    /// Compile the exclusion globs. Evaluated against forward-slash
    /// relative paths only.
    pub fn exclude_set(&self) -> Result<GlobSet, RegisterError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in self.exclude_globs() {
            let glob = Glob::new(pattern).map_err(|source| RegisterError::InvalidExcludeGlob {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        builder
            .build()
            .map_err(|source| RegisterError::InvalidExcludeGlob {
                pattern: self.exclude_globs().join(", "),
                source,
            })
    }
}
