//! Lifecycle of a single subscription attempt

use crate::backend::{Backend, Subscription, WatchTarget};
use crate::error::Result;
use crate::event::EventSink;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Lifecycle state of a [`WatchSession`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Stopped,
    Starting,
    Active,
    Stopping,
}

/// One live subscription for a directory and filter
pub struct WatchSession {
    state: SessionState,
    subscription: Option<Box<dyn Subscription>>,
    generation: u64,
    retry_delay: Duration,
}

impl WatchSession {
    /// Construct and enable a subscription, retrying until it succeeds
    ///
    /// There is no attempt limit: a directory that never becomes watchable
    /// keeps this call looping until `cancel` is set, which makes it return
    /// `None` before the next attempt.
    pub fn start(
        backend: &dyn Backend,
        target: &WatchTarget,
        sink: EventSink,
        retry_delay: Duration,
        cancel: &AtomicBool,
    ) -> Option<Self> {
        let mut session = Self {
            state: SessionState::Starting,
            subscription: None,
            generation: sink.generation(),
            retry_delay,
        };

        let mut attempt: u64 = 0;
        loop {
            if cancel.load(Ordering::SeqCst) {
                info!(generation = session.generation, attempt, "Watcher start cancelled");
                session.state = SessionState::Stopped;
                return None;
            }
            attempt += 1;
            info!(
                path = %target.path.display(),
                filter = target.filter.pattern(),
                generation = session.generation,
                attempt,
                "Watcher starting"
            );

            match Self::open_enabled(backend, target, sink.clone()) {
                Ok(subscription) => {
                    session.subscription = Some(subscription);
                    session.state = SessionState::Active;
                    info!(generation = session.generation, "Watcher started");
                    return Some(session);
                }
                Err(e) => {
                    warn!(error = %e, attempt, "Error on watcher starting");
                    thread::sleep(retry_delay);
                }
            }
        }
    }

    fn open_enabled(
        backend: &dyn Backend,
        target: &WatchTarget,
        sink: EventSink,
    ) -> Result<Box<dyn Subscription>> {
        let mut subscription = backend.open(target, sink)?;
        if let Err(e) = subscription.enable() {
            if let Err(release_err) = subscription.release() {
                debug!(error = %release_err, "Failed to release subscription after enable error");
            }
            return Err(e);
        }
        Ok(subscription)
    }

    /// Disable delivery and release the subscription
    ///
    /// Always ends in [`SessionState::Stopped`]. A failing disable is retried
    /// while the subscription still reports itself enabled.
    pub fn stop(&mut self) {
        let Some(mut subscription) = self.subscription.take() else {
            self.state = SessionState::Stopped;
            return;
        };

        self.state = SessionState::Stopping;
        info!(generation = self.generation, "Watcher stopping");

        loop {
            match subscription.disable() {
                Ok(()) => break,
                Err(e) => {
                    warn!(error = %e, "Error on watcher stopping");
                    if !subscription.is_enabled() {
                        break;
                    }
                    thread::sleep(self.retry_delay);
                }
            }
        }

        if let Err(e) = subscription.release() {
            warn!(error = %e, "Error on watcher releasing");
        }

        self.state = SessionState::Stopped;
        info!(generation = self.generation, "Watcher stopped");
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Generation stamped on every event this session delivers
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for WatchSession {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for WatchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSession")
            .field("state", &self.state)
            .field("generation", &self.generation)
            .finish()
    }
}
