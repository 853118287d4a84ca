//! Error types for the watcher

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, WatchError>;

/// Errors produced by the watcher and its backends
#[derive(Debug, Error)]
pub enum WatchError {
    /// `start_watching` was called on an instance that already started
    #[error("watcher already started")]
    AlreadyStarted,

    /// `shutdown` was called while `start_watching` was still retrying
    #[error("watcher shut down before its subscription started")]
    ShutDown,

    /// The filename filter could not be compiled
    #[error("invalid filter pattern {pattern:?}: {source}")]
    InvalidFilter {
        pattern: String,
        #[source]
        source: ignore::Error,
    },

    /// Error reported by the `notify` backend
    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),

    /// The backend dropped events (kernel queue overflow or similar)
    #[error("event queue overflow, rescan required")]
    Overflow,

    /// Backend-specific failure
    #[error("backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl WatchError {
    /// Convenience constructor for backend failures
    pub fn backend(msg: impl Into<String>) -> Self {
        WatchError::Backend(msg.into())
    }
}
