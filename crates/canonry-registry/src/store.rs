use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use canonry_types::{Registry, WorkspaceLayout};

use crate::error::RegisterError;

/// File-backed registry store.
///
/// Load-mutate-write is one critical section: callers take the advisory
/// lock before loading when they intend to persist. A held lock is a hard
/// error — artifact content is assumed stable once written, so nothing
/// here retries.
pub struct RegistryStore {
    registry_path: PathBuf,
    lock_path: PathBuf,
}

impl RegistryStore {
    pub fn new(layout: &WorkspaceLayout) -> Self {
        Self {
            registry_path: layout.registry_path(),
            lock_path: layout.registry_lock_path(),
        }
    }

    /// Read the ledger, or initialize an empty one when the file does not
    /// exist yet. A present registry that fails the schema (including an
    /// `entries` field that is not a list) aborts the pass.
    pub fn load(&self) -> Result<Registry, RegisterError> {
        if !self.registry_path.exists() {
            debug!(path = %self.registry_path.display(), "no registry on disk, starting empty");
            return Ok(Registry::new());
        }
        let text = fs::read_to_string(&self.registry_path).map_err(|source| RegisterError::Io {
            path: self.registry_path.clone(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| RegisterError::Json {
            path: self.registry_path.clone(),
            source,
        })
    }

    /// Write the ledger back: pretty-printed, sorted keys, trailing
    /// newline. Re-serialization without content changes is byte-stable.
    pub fn persist(&self, registry: &Registry) -> Result<(), RegisterError> {
        if let Some(parent) = self.registry_path.parent() {
            fs::create_dir_all(parent).map_err(|source| RegisterError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let value = serde_json::to_value(registry).map_err(|source| RegisterError::Json {
            path: self.registry_path.clone(),
            source,
        })?;
        let mut text = serde_json::to_string_pretty(&value).map_err(|source| {
            RegisterError::Json {
                path: self.registry_path.clone(),
                source,
            }
        })?;
        text.push('\n');
        fs::write(&self.registry_path, text).map_err(|source| RegisterError::Io {
            path: self.registry_path.clone(),
            source,
        })?;
        info!(
            path = %self.registry_path.display(),
            entries = registry.entries.len(),
            "registry persisted"
        );
        Ok(())
    }

    /// Take the single-writer advisory lock. Released when the guard
    /// drops.
    pub fn lock(&self) -> Result<RegistryLock, RegisterError> {
        RegistryLock::acquire(&self.lock_path)
    }
}

/// Advisory lock file with create-new semantics.
pub struct RegistryLock {
    path: PathBuf,
}

impl RegistryLock {
    fn acquire(path: &Path) -> Result<Self, RegisterError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| RegisterError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        match fs::OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(_) => Ok(Self {
                path: path.to_path_buf(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(RegisterError::RegistryLocked(path.to_path_buf()))
            }
            Err(source) => Err(RegisterError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

impl Drop for RegistryLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
