//! Backend built on the platform watcher picked by `notify`

use super::{Backend, Subscription, WatchTarget};
use crate::error::{Result, WatchError};
use crate::event::{EventSink, RawEvent};
use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;

/// Production backend
#[derive(Debug, Default, Clone, Copy)]
pub struct NotifyBackend;

impl Backend for NotifyBackend {
    fn open(&self, target: &WatchTarget, sink: EventSink) -> Result<Box<dyn Subscription>> {
        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    for raw in translate(event) {
                        sink.deliver(raw);
                    }
                }
                Err(e) => {
                    sink.deliver(RawEvent::Error(e.into()));
                }
            },
            Config::default(),
        )?;

        Ok(Box::new(NotifySubscription {
            watcher: Some(watcher),
            path: target.path.clone(),
            enabled: false,
        }))
    }
}

/// A `notify` watcher on a single, non-recursive directory
pub struct NotifySubscription {
    watcher: Option<RecommendedWatcher>,
    path: PathBuf,
    enabled: bool,
}

impl NotifySubscription {
    fn watcher(&mut self) -> Result<&mut RecommendedWatcher> {
        self.watcher
            .as_mut()
            .ok_or_else(|| WatchError::backend("subscription already released"))
    }
}

impl Subscription for NotifySubscription {
    fn enable(&mut self) -> Result<()> {
        if self.enabled {
            return Ok(());
        }
        let path = self.path.clone();
        self.watcher()?.watch(&path, RecursiveMode::NonRecursive)?;
        self.enabled = true;
        Ok(())
    }

    fn disable(&mut self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let path = self.path.clone();
        match self.watcher()?.unwatch(&path) {
            Ok(()) => {
                self.enabled = false;
                Ok(())
            }
            Err(e) => {
                // The kernel drops the watch itself when the directory goes away
                if matches!(e.kind, notify::ErrorKind::WatchNotFound) {
                    self.enabled = false;
                }
                Err(e.into())
            }
        }
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn release(&mut self) -> Result<()> {
        self.enabled = false;
        self.watcher = None;
        Ok(())
    }
}

/// Convert a `notify` event into raw events
///
/// Folder creations, deletions and the `From` half of a rename produce
/// nothing. An event flagged for rescan means the backend lost events and is
/// reported as an overflow error.
pub fn translate(event: Event) -> Vec<RawEvent> {
    if event.need_rescan() {
        return vec![RawEvent::Error(WatchError::Overflow)];
    }

    match event.kind {
        EventKind::Create(CreateKind::Folder) => Vec::new(),
        EventKind::Create(_) => event.paths.into_iter().map(RawEvent::Created).collect(),

        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut paths = event.paths.into_iter();
            match (paths.next(), paths.next()) {
                (Some(from), Some(to)) => vec![RawEvent::Renamed { from, to }],
                // Only one side known: treat like a change of that path
                (Some(path), None) => vec![RawEvent::Changed(path)],
                _ => Vec::new(),
            }
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Vec::new(),
        EventKind::Modify(_) | EventKind::Access(_) => {
            event.paths.into_iter().map(RawEvent::Changed).collect()
        }

        EventKind::Remove(_) | EventKind::Any | EventKind::Other => Vec::new(),
    }
}
