//! Orchestrator: turns raw events into "new file ready" notifications
//!
//! Two worker threads are spawned by [`ContainerWatcher::start_watching`]:
//! - the event thread applies registry mutations and performs restarts,
//! - the readiness thread runs the poll protocol, one path at a time, under
//!   the readiness lock.
//! Registry access from either thread goes through the registry mutex, so a
//! rename or restart applied while a poll is running is seen by the poll on
//! its next iteration.

use crate::backend::{Backend, NotifyBackend, WatchTarget};
use crate::config::WatcherConfig;
use crate::error::{Result, WatchError};
use crate::event::{Envelope, EventSink, Message, RawEvent};
use crate::filter::FilenameFilter;
use crate::observer::{Notification, WatchObserver};
use crate::readiness::{ExclusiveOpen, ReadinessProbe};
use crate::registry::PendingFileRegistry;
use crate::session::WatchSession;
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, trace, warn};

/// Work item for the readiness thread
#[derive(Debug)]
enum Check {
    Path(PathBuf),
    Shutdown,
}

/// Watches a directory and reports files once they are fully written
///
/// # Example
/// ```ignore
/// let watcher = ContainerWatcher::new("/srv/inbox", "*.dat")?;
/// let notifications = watcher.subscribe();
/// watcher.start_watching()?;
/// for notification in notifications {
///     println!("{notification:?}");
/// }
/// ```
pub struct ContainerWatcher {
    inner: Arc<Inner>,
    receivers: Mutex<Option<(Receiver<Message>, Receiver<Check>)>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

struct Inner {
    target: WatchTarget,
    config: WatcherConfig,
    backend: Arc<dyn Backend>,
    probe: Arc<dyn ReadinessProbe>,
    observers: RwLock<Vec<Arc<dyn WatchObserver>>>,

    /// `None` means not running
    session: Mutex<Option<WatchSession>>,
    registry: Mutex<PendingFileRegistry>,
    /// Paths with a `Check::Path` waiting in the checks channel
    queued: Mutex<HashSet<PathBuf>>,

    /// Serializes readiness determinations across all paths
    readiness_lock: Mutex<()>,

    /// Generation of the most recently started session
    generation: AtomicU64,
    events_tx: Sender<Message>,
    checks_tx: Sender<Check>,
    shutdown: AtomicBool,
}

/// Builder for [`ContainerWatcher`]
pub struct ContainerWatcherBuilder {
    path: PathBuf,
    filter: String,
    config: WatcherConfig,
    backend: Arc<dyn Backend>,
    probe: Arc<dyn ReadinessProbe>,
    observers: Vec<Arc<dyn WatchObserver>>,
}

impl ContainerWatcherBuilder {
    pub fn config(mut self, config: WatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the `notify` backend
    pub fn backend(mut self, backend: impl Backend + 'static) -> Self {
        self.backend = Arc::new(backend);
        self
    }

    /// Replace the exclusive-open probe
    pub fn probe(mut self, probe: impl ReadinessProbe + 'static) -> Self {
        self.probe = Arc::new(probe);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn WatchObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Compile the filter and assemble the watcher
    ///
    /// A relative path is resolved against the current directory so that
    /// reported paths are absolute.
    pub fn build(self) -> Result<ContainerWatcher> {
        let filter = FilenameFilter::new(&self.filter, self.config.case_insensitive)?;
        let path = if self.path.is_absolute() {
            self.path
        } else {
            std::env::current_dir()?.join(self.path)
        };

        let (events_tx, events_rx) = unbounded();
        let (checks_tx, checks_rx) = unbounded();

        let inner = Inner {
            target: WatchTarget {
                path,
                filter: Arc::new(filter),
            },
            config: self.config,
            backend: self.backend,
            probe: self.probe,
            observers: RwLock::new(self.observers),
            session: Mutex::new(None),
            registry: Mutex::new(PendingFileRegistry::new()),
            queued: Mutex::new(HashSet::new()),
            readiness_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
            events_tx,
            checks_tx,
            shutdown: AtomicBool::new(false),
        };

        Ok(ContainerWatcher {
            inner: Arc::new(inner),
            receivers: Mutex::new(Some((events_rx, checks_rx))),
            workers: Mutex::new(Vec::new()),
        })
    }
}

impl ContainerWatcher {
    /// Watcher for `path` using the `notify` backend and exclusive-open probe
    pub fn new(path: impl Into<PathBuf>, filter: impl Into<String>) -> Result<Self> {
        Self::builder(path, filter).build()
    }

    pub fn builder(path: impl Into<PathBuf>, filter: impl Into<String>) -> ContainerWatcherBuilder {
        ContainerWatcherBuilder {
            path: path.into(),
            filter: filter.into(),
            config: WatcherConfig::default(),
            backend: Arc::new(NotifyBackend),
            probe: Arc::new(ExclusiveOpen),
            observers: Vec::new(),
        }
    }

    /// Register an observer; may be called before or after starting
    pub fn add_observer(&self, observer: Arc<dyn WatchObserver>) {
        self.inner.observers.write().push(observer);
    }

    /// Register a channel observer and return its receiving end
    pub fn subscribe(&self) -> Receiver<Notification> {
        let (tx, rx) = unbounded();
        self.add_observer(Arc::new(tx));
        rx
    }

    /// Start the worker threads and the first session
    ///
    /// Blocks until the first subscription is enabled. Fails with
    /// [`WatchError::AlreadyStarted`] on any call after the first, and with
    /// [`WatchError::ShutDown`] if [`shutdown`](Self::shutdown) interrupts
    /// the start.
    pub fn start_watching(&self) -> Result<()> {
        let mut session = self.inner.session.lock();
        if session.is_some() {
            return Err(WatchError::AlreadyStarted);
        }
        let Some((events_rx, checks_rx)) = self.receivers.lock().take() else {
            return Err(WatchError::AlreadyStarted);
        };

        let mut workers = self.workers.lock();

        let inner = self.inner.clone();
        workers.push(
            thread::Builder::new()
                .name("dirwatch-events".to_string())
                .spawn(move || inner.run_events(events_rx))?,
        );

        let inner = self.inner.clone();
        workers.push(
            thread::Builder::new()
                .name("dirwatch-readiness".to_string())
                .spawn(move || inner.run_checks(checks_rx))?,
        );

        *session = self.inner.start_session();
        if session.is_none() {
            return Err(WatchError::ShutDown);
        }
        Ok(())
    }

    /// Stop the session and join the worker threads
    ///
    /// A readiness poll in progress gives up, and so does a restart still
    /// retrying its subscription. The instance cannot be started again
    /// afterwards.
    pub fn shutdown(&self) {
        if self.inner.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }
        self.receivers.lock().take();

        if let Some(mut session) = self.inner.session.lock().take() {
            session.stop();
        }

        let _ = self.inner.events_tx.send(Message::Shutdown);
        let _ = self.inner.checks_tx.send(Check::Shutdown);

        for worker in self.workers.lock().drain(..) {
            if worker.join().is_err() {
                warn!("Watcher worker thread panicked");
            }
        }
        info!(path = %self.inner.target.path.display(), "Watcher shut down");
    }

    pub fn path(&self) -> &Path {
        &self.inner.target.path
    }

    pub fn filter(&self) -> &str {
        self.inner.target.filter.pattern()
    }

    pub fn is_running(&self) -> bool {
        self.inner
            .session
            .lock()
            .as_ref()
            .is_some_and(WatchSession::is_active)
    }

    /// Files seen as created and not yet reported
    pub fn pending_files(&self) -> Vec<PathBuf> {
        self.inner.registry.lock().paths()
    }

    pub fn is_pending(&self, path: &Path) -> bool {
        self.inner.registry.lock().contains(path)
    }

    /// Number of paths waiting for a readiness check
    ///
    /// A path is queued at most once no matter how many change events
    /// arrive for it while an earlier poll holds the readiness lock.
    pub fn queued_checks(&self) -> usize {
        self.inner.queued.lock().len()
    }
}

impl Drop for ContainerWatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for ContainerWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerWatcher")
            .field("path", &self.inner.target.path)
            .field("filter", &self.inner.target.filter.pattern())
            .field("config", &self.inner.config)
            .finish()
    }
}

impl Inner {
    /// `None` when shutdown interrupted the retry loop
    fn start_session(&self) -> Option<WatchSession> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let sink = EventSink::new(generation, self.target.filter.clone(), self.events_tx.clone());
        WatchSession::start(
            self.backend.as_ref(),
            &self.target,
            sink,
            self.config.retry_delay(),
            &self.shutdown,
        )
    }

    fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    fn run_events(&self, rx: Receiver<Message>) {
        for message in rx.iter() {
            match message {
                Message::Event(envelope) => self.handle_event(envelope),
                Message::Shutdown => break,
            }
        }
        debug!("Event thread exiting");
    }

    fn run_checks(&self, rx: Receiver<Check>) {
        for check in rx.iter() {
            match check {
                Check::Path(path) => {
                    self.queued.lock().remove(&path);
                    self.process_if_ready(&path);
                }
                Check::Shutdown => break,
            }
        }
        debug!("Readiness thread exiting");
    }

    fn handle_event(&self, envelope: Envelope) {
        if self.is_shutting_down() {
            return;
        }
        let current = self.generation.load(Ordering::SeqCst);
        if envelope.generation != current {
            trace!(
                generation = envelope.generation,
                current,
                "Discarding event from replaced session"
            );
            return;
        }

        match envelope.event {
            RawEvent::Created(path) => {
                debug!(path = %path.display(), "File created");
                self.registry.lock().add(path.clone());
                self.request_check(path);
            }
            RawEvent::Changed(path) => self.request_check(path),
            RawEvent::Renamed { from, to } => {
                if self.registry.lock().rename(&from, to.clone()) {
                    debug!(from = %from.display(), to = %to.display(), "Pending file renamed");
                }
                self.request_check(to);
            }
            RawEvent::Error(e) => {
                warn!(error = %e, "Watcher error");
                self.restart();
            }
        }
    }

    /// Queue a readiness check for a tracked path
    fn request_check(&self, path: PathBuf) {
        if !self.registry.lock().contains(&path) {
            return;
        }
        if !self.queued.lock().insert(path.clone()) {
            trace!(path = %path.display(), "Readiness check already queued");
            return;
        }
        let _ = self.checks_tx.send(Check::Path(path));
    }

    /// Readiness-check protocol
    ///
    /// Polls until the file is ready, it stops being tracked, or the watcher
    /// shuts down. Holds the readiness lock for the whole duration.
    fn process_if_ready(&self, path: &Path) {
        let _guard = self.readiness_lock.lock();
        let mut attempts: u64 = 0;

        loop {
            if self.is_shutting_down() {
                debug!(path = %path.display(), "Abandoning readiness poll on shutdown");
                return;
            }
            if !self.registry.lock().contains(path) {
                trace!(path = %path.display(), "Path no longer pending");
                return;
            }

            attempts += 1;
            if self.probe.is_ready(path) {
                // A rename or restart may have raced the probe
                if self.registry.lock().remove(path) {
                    debug!(path = %path.display(), attempts, "File ready");
                    self.emit_new_file(path);
                }
                return;
            }

            trace!(path = %path.display(), attempts, "File not ready yet");
            thread::sleep(self.config.poll_interval());
        }
    }

    /// Stop the session, forget pending files, notify, start again
    fn restart(&self) {
        let mut session = self.session.lock();
        if self.is_shutting_down() {
            return;
        }
        info!(path = %self.target.path.display(), "Watcher restarting");

        if let Some(mut old) = session.take() {
            old.stop();
        }

        let dropped = {
            let mut registry = self.registry.lock();
            let dropped = registry.len();
            registry.clear();
            dropped
        };
        if dropped > 0 {
            debug!(dropped, "Cleared pending files");
        }

        let observers = self.observers.read().clone();
        for observer in observers {
            observer.on_restart();
        }

        *session = self.start_session();
        if session.is_none() {
            debug!("Restart abandoned on shutdown");
        }
    }

    fn emit_new_file(&self, path: &Path) {
        let observers = self.observers.read().clone();
        for observer in observers {
            observer.on_new_file(path);
        }
    }
}
