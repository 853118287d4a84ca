//! Directory watching with completion detection
//!
//! This crate reports files created in a directory once they are fully
//! written, with:
//! - Readiness probing by exclusive open
//! - Tracking of pending files across renames
//! - Automatic restart of the underlying subscription on errors
//! - Filename glob filtering

pub mod backend;
pub mod config;
pub mod container;
pub mod error;
pub mod event;
pub mod filter;
pub mod observer;
pub mod readiness;
pub mod registry;
pub mod session;

pub use backend::{Backend, NotifyBackend, Subscription, WatchTarget};
pub use config::WatcherConfig;
pub use container::{ContainerWatcher, ContainerWatcherBuilder};
pub use error::{Result, WatchError};
pub use event::{EventSink, RawEvent};
pub use filter::FilenameFilter;
pub use observer::{Notification, WatchObserver};
pub use readiness::{ExclusiveOpen, ReadinessProbe};
pub use registry::PendingFileRegistry;
pub use session::{SessionState, WatchSession};
