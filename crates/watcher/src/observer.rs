//! Notifications delivered to consumers of a watcher

use crossbeam_channel::Sender;
use std::path::{Path, PathBuf};

/// Receives watcher notifications
///
/// Called synchronously from the watcher's worker threads; implementations
/// should return quickly.
pub trait WatchObserver: Send + Sync {
    /// A created file finished being written
    fn on_new_file(&self, path: &Path);

    /// The subscription failed and is about to be started again
    fn on_restart(&self) {}
}

/// Notification as a value, for channel-based consumers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    NewFileCreated(PathBuf),
    WatcherWillStartAgain,
}

impl WatchObserver for Sender<Notification> {
    fn on_new_file(&self, path: &Path) {
        let _ = self.send(Notification::NewFileCreated(path.to_path_buf()));
    }

    fn on_restart(&self) {
        let _ = self.send(Notification::WatcherWillStartAgain);
    }
}
