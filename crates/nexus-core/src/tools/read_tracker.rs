//! Session-scoped record of successfully read files

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use parking_lot::RwLock;

use crate::config::paths::resolve_at_project_root;

/// Remembers which resolved paths were read in this session
///
/// Paths are resolved against the project root and normalized lexically,
/// so `notes.md`, `./notes.md` and `<root>/docs/../notes.md` are one entry.
#[derive(Debug)]
pub struct ReadTracker {
    root: PathBuf,
    read: RwLock<HashSet<PathBuf>>,
}

impl ReadTracker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            read: RwLock::new(HashSet::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a tool-supplied path to its tracking key
    pub fn resolve(&self, path: &str) -> PathBuf {
        normalize(&resolve_at_project_root(&self.root, path))
    }

    pub fn record_read(&self, path: &str) {
        let resolved = self.resolve(path);
        self.read.write().insert(resolved);
    }

    pub fn has_read(&self, path: &str) -> bool {
        self.read.read().contains(&self.resolve(path))
    }

    pub fn clear(&self) {
        self.read.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read.read().is_empty()
    }
}

/// Error text for an edit without a prior read
pub fn read_before_edit_error(path: &str) -> String {
    format!("File '{path}' must be read before edit. Use read_file on it first, then retry the edit.")
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
