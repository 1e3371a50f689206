use std::path::PathBuf;

use tracing::debug;
use walkdir::WalkDir;

use canonry_types::WorkspaceLayout;

use crate::config::RegisterConfig;
use crate::error::RegisterError;

const SUPPORTED_SUFFIXES: [&str; 2] = ["json", "md"];

/// Collects candidate artifact paths.
///
/// An explicit allow-list wins; otherwise the canon directory is walked
/// recursively in a deterministic order. Either way a candidate must be a
/// regular file with a supported suffix whose forward-slash relative path
/// matches no exclusion glob.
pub struct Collector<'a> {
    layout: &'a WorkspaceLayout,
    config: &'a RegisterConfig,
}

impl<'a> Collector<'a> {
    pub fn new(layout: &'a WorkspaceLayout, config: &'a RegisterConfig) -> Self {
        Self { layout, config }
    }

    pub fn collect(&self) -> Result<Vec<PathBuf>, RegisterError> {
        let excludes = self.config.exclude_set()?;
        let mut out = Vec::new();

        if !self.config.known_artifacts.is_empty() {
            for relative in &self.config.known_artifacts {
                let path = self.layout.root().join(relative);
                if !path.is_file() {
                    continue;
                }
                if !has_supported_suffix(&path) {
                    continue;
                }
                let Some(rel) = self.layout.rel_unix(&path) else {
                    continue;
                };
                if excludes.is_match(&rel) {
                    debug!(path = %rel, "excluded by glob");
                    continue;
                }
                out.push(path);
            }
            return Ok(out);
        }

        let canon_dir = self.layout.canon_dir();
        for entry in WalkDir::new(&canon_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.into_path();
            if !has_supported_suffix(&path) {
                continue;
            }
            let Some(rel) = self.layout.rel_unix(&path) else {
                continue;
            };
            if excludes.is_match(&rel) {
                debug!(path = %rel, "excluded by glob");
                continue;
            }
            out.push(path);
        }
        Ok(out)
    }
}

fn has_supported_suffix(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SUPPORTED_SUFFIXES.contains(&e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn workspace() -> (tempfile::TempDir, WorkspaceLayout) {
        let dir = tempfile::tempdir().unwrap();
        let layout = WorkspaceLayout::new(dir.path());
        fs::create_dir_all(layout.canon_dir().join("tools")).unwrap();
        fs::create_dir_all(layout.canon_dir().join("nested")).unwrap();
        (dir, layout)
    }

    fn default_config(layout: &WorkspaceLayout) -> RegisterConfig {
        RegisterConfig {
            known_artifacts: Vec::new(),
            exclude_globs: Some(vec![layout.tool_exclude_glob()]),
        }
    }

    #[test]
    fn discovery_finds_supported_files_and_skips_tools() {
        let (_dir, layout) = workspace();
        fs::write(layout.canon_dir().join("a.json"), "{}").unwrap();
        fs::write(layout.canon_dir().join("nested/b.md"), "x").unwrap();
        fs::write(layout.canon_dir().join("c.txt"), "x").unwrap();
        fs::write(layout.canon_dir().join("tools/helper.json"), "{}").unwrap();

        let config = default_config(&layout);
        let found = Collector::new(&layout, &config).collect().unwrap();
        let rels: Vec<String> = found
            .iter()
            .map(|p| layout.rel_unix(p).unwrap())
            .collect();
        assert_eq!(rels, [".sst/a.json", ".sst/nested/b.md"]);
    }

    #[test]
    fn allow_list_bypasses_discovery() {
        let (_dir, layout) = workspace();
        fs::write(layout.canon_dir().join("a.json"), "{}").unwrap();
        fs::write(layout.canon_dir().join("b.json"), "{}").unwrap();

        let config = RegisterConfig {
            known_artifacts: vec![".sst/b.json".into(), ".sst/missing.json".into()],
            exclude_globs: Some(vec![layout.tool_exclude_glob()]),
        };
        let found = Collector::new(&layout, &config).collect().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(layout.rel_unix(&found[0]).unwrap(), ".sst/b.json");
    }

    #[test]
    fn allow_list_entries_still_respect_exclusions_and_suffixes() {
        let (_dir, layout) = workspace();
        fs::write(layout.canon_dir().join("tools/helper.json"), "{}").unwrap();
        fs::write(layout.canon_dir().join("raw.csv"), "a,b").unwrap();

        let config = RegisterConfig {
            known_artifacts: vec![".sst/tools/helper.json".into(), ".sst/raw.csv".into()],
            exclude_globs: Some(vec![layout.tool_exclude_glob()]),
        };
        let found = Collector::new(&layout, &config).collect().unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn discovery_order_is_deterministic() {
        let (_dir, layout) = workspace();
        fs::write(layout.canon_dir().join("z.json"), "{}").unwrap();
        fs::write(layout.canon_dir().join("a.json"), "{}").unwrap();
        fs::write(layout.canon_dir().join("nested/m.json"), "{}").unwrap();

        let config = default_config(&layout);
        let first = Collector::new(&layout, &config).collect().unwrap();
        let second = Collector::new(&layout, &config).collect().unwrap();
        assert_eq!(first, second);
    }
}
