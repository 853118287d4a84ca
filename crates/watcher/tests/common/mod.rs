//! Shared fixtures for watcher integration tests
//!
//! - `FakeBackend`: in-memory subscriptions the test injects events into
//! - `ScriptedReadiness`: readiness check driven by a set of locked paths

#![allow(dead_code)]

use dirwatch::{
    Backend, ContainerWatcher, EventSink, RawEvent, ReadinessProbe, Result, Subscription,
    WatchError, WatchTarget, WatcherConfig,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const TIMEOUT: Duration = Duration::from_secs(5);
pub const QUIET: Duration = Duration::from_millis(150);

#[derive(Default)]
struct BackendState {
    sinks: Mutex<Vec<EventSink>>,
    opens: AtomicUsize,
    releases: AtomicUsize,
    enabled: AtomicUsize,
    max_enabled: AtomicUsize,
    enable_failures: AtomicUsize,
}

/// Backend whose subscriptions are driven by the test
#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<BackendState>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` enable calls fail
    pub fn fail_enables(&self, n: usize) {
        self.state.enable_failures.store(n, Ordering::SeqCst);
    }

    /// Deliver an event through the most recently opened subscription
    pub fn inject(&self, event: RawEvent) -> bool {
        let sink = self.state.sinks.lock().last().cloned();
        sink.expect("no subscription opened").deliver(event)
    }

    /// Deliver an event through the subscription opened `index`-th (0-based)
    pub fn inject_into(&self, index: usize, event: RawEvent) -> bool {
        let sink = self.state.sinks.lock()[index].clone();
        sink.deliver(event)
    }

    pub fn opens(&self) -> usize {
        self.state.opens.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.state.releases.load(Ordering::SeqCst)
    }

    pub fn enabled(&self) -> usize {
        self.state.enabled.load(Ordering::SeqCst)
    }

    pub fn max_enabled(&self) -> usize {
        self.state.max_enabled.load(Ordering::SeqCst)
    }
}

impl Backend for FakeBackend {
    fn open(&self, _target: &WatchTarget, sink: EventSink) -> Result<Box<dyn Subscription>> {
        self.state.opens.fetch_add(1, Ordering::SeqCst);
        self.state.sinks.lock().push(sink);
        Ok(Box::new(FakeSubscription {
            state: self.state.clone(),
            enabled: false,
            released: false,
        }))
    }
}

struct FakeSubscription {
    state: Arc<BackendState>,
    enabled: bool,
    released: bool,
}

impl Subscription for FakeSubscription {
    fn enable(&mut self) -> Result<()> {
        let failed = self
            .state
            .enable_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(WatchError::backend("enable failed"));
        }
        self.enabled = true;
        let now = self.state.enabled.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_enabled.fetch_max(now, Ordering::SeqCst);
        Ok(())
    }

    fn disable(&mut self) -> Result<()> {
        if self.enabled {
            self.enabled = false;
            self.state.enabled.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn release(&mut self) -> Result<()> {
        if !self.released {
            self.released = true;
            self.state.releases.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

#[derive(Default)]
struct ReadinessState {
    locked: Mutex<HashSet<PathBuf>>,
    checks: Mutex<HashMap<PathBuf, usize>>,
}

/// Readiness check reporting every path ready unless the test locked it
#[derive(Clone, Default)]
pub struct ScriptedReadiness {
    state: Arc<ReadinessState>,
}

impl ScriptedReadiness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self, path: impl Into<PathBuf>) {
        self.state.locked.lock().insert(path.into());
    }

    pub fn unlock(&self, path: &Path) {
        self.state.locked.lock().remove(path);
    }

    pub fn checks(&self, path: &Path) -> usize {
        self.state.checks.lock().get(path).copied().unwrap_or(0)
    }
}

impl ReadinessProbe for ScriptedReadiness {
    fn is_ready(&self, path: &Path) -> bool {
        *self
            .state
            .checks
            .lock()
            .entry(path.to_path_buf())
            .or_insert(0) += 1;
        !self.state.locked.lock().contains(path)
    }
}

pub fn fast_config() -> WatcherConfig {
    WatcherConfig {
        retry_delay_ms: 1,
        poll_interval_ms: 1,
        case_insensitive: false,
    }
}

/// Started watcher on `/in` wired to the fakes
pub fn started_watcher(filter: &str, backend: &FakeBackend, readiness: &ScriptedReadiness) -> ContainerWatcher {
    let watcher = ContainerWatcher::builder("/in", filter)
        .config(fast_config())
        .backend(backend.clone())
        .probe(readiness.clone())
        .build()
        .unwrap();
    watcher.start_watching().unwrap();
    watcher
}

/// Poll `condition` until it holds or the timeout expires
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + TIMEOUT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    condition()
}
