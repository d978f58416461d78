//! Plugin registry with hot reload.
//!
//! Readers always see a complete snapshot: `load` builds a fresh map from
//! disk and swaps it in with a single pointer store.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{error, info, warn};

use super::manifest::{PluginDescriptor, load_manifest};

type Snapshot = Arc<HashMap<String, Arc<PluginDescriptor>>>;

const MANIFEST_EXTENSION: &str = "toml";

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("cannot create plugin directory {path}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot read plugin directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Command name -> descriptor, loaded from a manifest directory.
pub struct PluginRegistry {
    dir: PathBuf,
    snapshot: RwLock<Snapshot>,
}

impl PluginRegistry {
    /// An empty registry over `dir`. Call `load` to populate it.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            snapshot: RwLock::new(Arc::new(HashMap::new())),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Rebuild the registry from disk.
    ///
    /// Broken manifests are logged and skipped. When the directory itself
    /// cannot be read the current registry stays in place. Returns the
    /// number of active command names.
    pub fn load(&self) -> Result<usize, RegistryError> {
        self.ensure_dir()?;

        let mut files = Vec::new();
        collect_manifests(&self.dir, &mut files).map_err(|source| {
            error!("Error reading plugins directory: {}", source);
            RegistryError::ReadDir {
                path: self.dir.clone(),
                source,
            }
        })?;
        files.sort();

        let mut map: HashMap<String, Arc<PluginDescriptor>> = HashMap::new();
        for file in &files {
            match load_manifest(file) {
                Ok(descriptor) => {
                    let descriptor = Arc::new(descriptor);
                    for name in &descriptor.commands {
                        if let Some(previous) = map.insert(name.clone(), descriptor.clone()) {
                            warn!(
                                "Command '{}' from {} overrides {}",
                                name,
                                file.display(),
                                previous.source.display()
                            );
                        }
                    }
                }
                Err(e) => warn!("Failed to load plugin: {}", e),
            }
        }

        let count = map.len();
        *self.snapshot.write() = Arc::new(map);

        info!("Plugin System Loaded: {} commands active.", count);
        Ok(count)
    }

    fn ensure_dir(&self) -> Result<(), RegistryError> {
        if self.dir.exists() {
            return Ok(());
        }

        std::fs::create_dir_all(self.dir.join("main")).map_err(|source| RegistryError::Create {
            path: self.dir.clone(),
            source,
        })?;
        info!("Created plugin directory {}", self.dir.display());
        Ok(())
    }

    fn current(&self) -> Snapshot {
        self.snapshot.read().clone()
    }

    /// Descriptor for an (already lowercased) command name.
    pub fn lookup(&self, command: &str) -> Option<Arc<PluginDescriptor>> {
        self.current().get(command).cloned()
    }

    /// Every descriptor once, however many aliases it has, ordered by
    /// primary command name.
    pub fn list(&self) -> Vec<Arc<PluginDescriptor>> {
        let snapshot = self.current();
        let mut unique: Vec<Arc<PluginDescriptor>> = Vec::new();

        for descriptor in snapshot.values() {
            if !unique.iter().any(|d| Arc::ptr_eq(d, descriptor)) {
                unique.push(descriptor.clone());
            }
        }

        unique.sort_by(|a, b| a.primary().cmp(b.primary()));
        unique
    }

    /// Number of registered command names (aliases included).
    pub fn len(&self) -> usize {
        self.snapshot.read().len()
    }
}

/// Recursively collect manifest files. Only the root being unreadable is
/// an error; unreadable subdirectories are skipped.
fn collect_manifests(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };

        if path.is_dir() {
            if let Err(e) = collect_manifests(&path, out) {
                warn!("Skipping plugin directory {}: {}", path.display(), e);
            }
        } else if path.extension().is_some_and(|ext| ext == MANIFEST_EXTENSION) {
            out.push(path);
        }
    }
    Ok(())
}
