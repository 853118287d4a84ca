//! Notification backends
//!
//! A backend constructs subscriptions; a subscription delivers raw events to
//! an [`EventSink`] between `enable` and `disable`.

mod native;

pub use self::native::{translate, NotifyBackend, NotifySubscription};

use crate::error::Result;
use crate::event::EventSink;
use crate::filter::FilenameFilter;
use std::path::PathBuf;
use std::sync::Arc;

/// Directory and filename filter a session watches
#[derive(Debug, Clone)]
pub struct WatchTarget {
    pub path: PathBuf,
    pub filter: Arc<FilenameFilter>,
}

/// Factory for subscriptions
pub trait Backend: Send + Sync {
    /// Construct a disabled subscription for `target` that reports to `sink`
    fn open(&self, target: &WatchTarget, sink: EventSink) -> Result<Box<dyn Subscription>>;
}

/// One instantiation of the underlying notification mechanism
pub trait Subscription: Send {
    /// Start delivering events
    fn enable(&mut self) -> Result<()>;

    /// Stop delivering events
    fn disable(&mut self) -> Result<()>;

    /// Whether events are currently being delivered
    fn is_enabled(&self) -> bool;

    /// Release underlying resources; the subscription is unusable afterwards
    fn release(&mut self) -> Result<()>;
}
