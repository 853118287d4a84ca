//! Raw events produced by a subscription and the sink they flow through

use crate::error::WatchError;
use crate::filter::FilenameFilter;
use crossbeam_channel::Sender;
use std::path::PathBuf;
use std::sync::Arc;

/// Event reported by the underlying notification mechanism
#[derive(Debug)]
pub enum RawEvent {
    /// A file appeared
    Created(PathBuf),
    /// A file was written to, or its metadata or access time changed
    Changed(PathBuf),
    /// A file was renamed within the watched directory
    Renamed { from: PathBuf, to: PathBuf },
    /// The subscription failed and must be restarted
    Error(WatchError),
}

/// Raw event tagged with the generation of the session that produced it
#[derive(Debug)]
pub(crate) struct Envelope {
    pub generation: u64,
    pub event: RawEvent,
}

/// Messages consumed by the event thread
#[derive(Debug)]
pub(crate) enum Message {
    Event(Envelope),
    Shutdown,
}

/// Delivery handle given to a subscription
///
/// Applies the filename filter and tags every event with the generation of
/// the session it was created for. Cloneable so backends can move it into
/// their callback.
#[derive(Debug, Clone)]
pub struct EventSink {
    generation: u64,
    filter: Arc<FilenameFilter>,
    tx: Sender<Message>,
}

impl EventSink {
    pub(crate) fn new(generation: u64, filter: Arc<FilenameFilter>, tx: Sender<Message>) -> Self {
        Self {
            generation,
            filter,
            tx,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Deliver an event, returning whether it passed the filter and was queued
    pub fn deliver(&self, event: RawEvent) -> bool {
        let wanted = match &event {
            RawEvent::Created(path) | RawEvent::Changed(path) => self.filter.matches(path),
            RawEvent::Renamed { from, to } => self.filter.matches(from) || self.filter.matches(to),
            RawEvent::Error(_) => true,
        };
        if !wanted {
            return false;
        }

        // The receiver is gone once the watcher shut down
        self.tx
            .send(Message::Event(Envelope {
                generation: self.generation,
                event,
            }))
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    fn sink(pattern: &str) -> (EventSink, crossbeam_channel::Receiver<Message>) {
        let (tx, rx) = unbounded();
        let filter = Arc::new(FilenameFilter::new(pattern, false).unwrap());
        (EventSink::new(7, filter, tx), rx)
    }

    #[test]
    fn test_filtered_out_events_are_dropped() {
        let (sink, rx) = sink("*.dat");

        assert!(!sink.deliver(RawEvent::Created(PathBuf::from("/in/a.txt"))));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_events_carry_generation() {
        let (sink, rx) = sink("*.dat");

        assert!(sink.deliver(RawEvent::Changed(PathBuf::from("/in/a.dat"))));
        match rx.try_recv().unwrap() {
            Message::Event(envelope) => {
                assert_eq!(envelope.generation, 7);
                assert!(matches!(envelope.event, RawEvent::Changed(_)));
            }
            Message::Shutdown => panic!("unexpected shutdown"),
        }
    }

    #[test]
    fn test_rename_passes_if_either_name_matches() {
        let (sink, _rx) = sink("*.dat");

        assert!(sink.deliver(RawEvent::Renamed {
            from: PathBuf::from("/in/a.tmp"),
            to: PathBuf::from("/in/a.dat"),
        }));
        assert!(sink.deliver(RawEvent::Renamed {
            from: PathBuf::from("/in/a.dat"),
            to: PathBuf::from("/in/a.bak"),
        }));
        assert!(!sink.deliver(RawEvent::Renamed {
            from: PathBuf::from("/in/a.tmp"),
            to: PathBuf::from("/in/a.bak"),
        }));
    }

    #[test]
    fn test_errors_always_pass() {
        let (sink, _rx) = sink("*.dat");
        assert!(sink.deliver(RawEvent::Error(WatchError::Overflow)));
    }
}
