//! Registry of files seen as created but not yet confirmed complete

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Set of pending file paths
///
/// Has no locking of its own; the orchestrator keeps it behind a mutex.
#[derive(Debug, Default)]
pub struct PendingFileRegistry {
    paths: HashSet<PathBuf>,
}

impl PendingFileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `path`; adding an already tracked path is a no-op
    pub fn add(&mut self, path: impl Into<PathBuf>) {
        self.paths.insert(path.into());
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    /// Re-key a tracked file after a rename
    ///
    /// Returns false (and changes nothing) when `old` was not tracked.
    pub fn rename(&mut self, old: &Path, new: impl Into<PathBuf>) -> bool {
        if self.paths.remove(old) {
            self.paths.insert(new.into());
            true
        } else {
            false
        }
    }

    /// Stop tracking `path`, returning whether it was tracked
    pub fn remove(&mut self, path: &Path) -> bool {
        self.paths.remove(path)
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Snapshot of the tracked paths, sorted
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.paths.iter().cloned().collect();
        paths.sort();
        paths
    }
}
