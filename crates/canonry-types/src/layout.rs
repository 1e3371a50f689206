use std::path::{Path, PathBuf};

const DEFAULT_CANON_DIR: &str = ".sst";
const DEFAULT_LEDGER_DIR: &str = ".ddb";
const DEFAULT_META_DIR: &str = ".meta";

/// Canonical file locations for one workspace, constructed once at program
/// entry and threaded as a parameter into every component. No component
/// reads ambient global state.
#[derive(Clone, Debug)]
pub struct WorkspaceLayout {
    root: PathBuf,
    canon_dir: String,
    ledger_dir: String,
    meta_dir: String,
}

impl WorkspaceLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            canon_dir: DEFAULT_CANON_DIR.to_string(),
            ledger_dir: DEFAULT_LEDGER_DIR.to_string(),
            meta_dir: DEFAULT_META_DIR.to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the canon documents and registered artifacts.
    pub fn canon_dir(&self) -> PathBuf {
        self.root.join(&self.canon_dir)
    }

    /// Directory holding the registry ledger and registration config.
    pub fn ledger_dir(&self) -> PathBuf {
        self.root.join(&self.ledger_dir)
    }

    pub fn registry_path(&self) -> PathBuf {
        self.ledger_dir().join("registry.json")
    }

    /// Advisory lock taken around load-mutate-write of the registry.
    pub fn registry_lock_path(&self) -> PathBuf {
        self.ledger_dir().join("registry.json.lock")
    }

    pub fn register_config_path(&self) -> PathBuf {
        self.ledger_dir().join("register_config.json")
    }

    pub fn run_manifest_path(&self) -> PathBuf {
        self.canon_dir().join("run_manifest.json")
    }

    pub fn lifecycle_contract_path(&self) -> PathBuf {
        self.canon_dir().join("lifecycle_contract.md")
    }

    pub fn lifecycle_index_path(&self) -> PathBuf {
        self.canon_dir().join("lifecycle_index.json")
    }

    pub fn reconstruction_check_path(&self) -> PathBuf {
        self.canon_dir().join("reconstruction_check.json")
    }

    /// Pointer file naming the current snapshot.
    pub fn current_pointer_path(&self) -> PathBuf {
        self.canon_dir().join("system").join("CURRENT")
    }

    pub fn snapshot_dir(&self) -> PathBuf {
        self.canon_dir().join("system")
    }

    pub fn claims_matrix_path(&self) -> PathBuf {
        self.canon_dir().join("claims_matrix.json")
    }

    pub fn evidence_index_path(&self) -> PathBuf {
        self.canon_dir().join("evidence_index.json")
    }

    /// Where timestamped completeness reports are written.
    pub fn reports_dir(&self) -> PathBuf {
        self.root.join(&self.meta_dir).join("reports")
    }

    /// Repo-relative path of the lifecycle contract, as it appears in
    /// registry entries.
    pub fn lifecycle_contract_rel(&self) -> String {
        format!("{}/lifecycle_contract.md", self.canon_dir)
    }

    /// Glob protecting tool-owned files from self-registration.
    pub fn tool_exclude_glob(&self) -> String {
        format!("{}/tools/**", self.canon_dir)
    }

    /// Prefix of tool-owned files, for non-glob prefix checks.
    pub fn tool_prefix(&self) -> String {
        format!("{}/tools/", self.canon_dir)
    }

    /// The fixed set of repo-relative paths that must exist for the canon
    /// layout to count as complete.
    pub fn required_canon_paths(&self) -> Vec<String> {
        let canon = &self.canon_dir;
        let ledger = &self.ledger_dir;
        vec![
            format!("{canon}/run_manifest.json"),
            format!("{canon}/lifecycle_contract.md"),
            format!("{canon}/lifecycle_index.json"),
            format!("{canon}/reconstruction_check.json"),
            format!("{canon}/claims_matrix.json"),
            format!("{canon}/evidence_index.json"),
            format!("{canon}/system/CURRENT"),
            format!("{ledger}/registry.json"),
        ]
    }

    /// Forward-slash-normalized path of `path` relative to the workspace
    /// root. Exclusion globs and registry paths are always evaluated
    /// against this form.
    pub fn rel_unix(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_locations() {
        let layout = WorkspaceLayout::new("/ws");
        assert_eq!(layout.registry_path(), PathBuf::from("/ws/.ddb/registry.json"));
        assert_eq!(
            layout.current_pointer_path(),
            PathBuf::from("/ws/.sst/system/CURRENT")
        );
        assert_eq!(layout.lifecycle_contract_rel(), ".sst/lifecycle_contract.md");
        assert_eq!(layout.tool_exclude_glob(), ".sst/tools/**");
    }

    #[test]
    fn required_canon_paths_cover_every_gate_input() {
        let layout = WorkspaceLayout::new("/ws");
        let required = layout.required_canon_paths();
        assert!(required.contains(&".sst/run_manifest.json".to_string()));
        assert!(required.contains(&".ddb/registry.json".to_string()));
        assert_eq!(required.len(), 8);
    }

    #[test]
    fn rel_unix_normalizes_separators() {
        let layout = WorkspaceLayout::new("/ws");
        let rel = layout.rel_unix(Path::new("/ws/.sst/system/snap_001.json"));
        assert_eq!(rel.as_deref(), Some(".sst/system/snap_001.json"));
        assert!(layout.rel_unix(Path::new("/elsewhere/x.json")).is_none());
    }
}
