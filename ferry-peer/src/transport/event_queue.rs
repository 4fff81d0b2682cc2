use crate::transport::{EventKind, TransportEvent};
use std::collections::VecDeque;
use tokio::sync::mpsc;
use tracing::debug;

/// Transport events plus the ones put aside for later.
///
/// A session waiting for one kind of event can [`defer`](Self::defer) others
/// that will matter in a later phase. Deferred events are handed out again,
/// in arrival order, before anything new is read from the transport.
pub struct EventQueue {
    rx: mpsc::Receiver<TransportEvent>,
    deferred: VecDeque<TransportEvent>,
}

impl EventQueue {
    pub fn new(rx: mpsc::Receiver<TransportEvent>) -> Self {
        Self {
            rx,
            deferred: VecDeque::new(),
        }
    }

    pub fn defer(&mut self, event: TransportEvent) {
        debug!("Deferring transport event {:?}", event);
        self.deferred.push_back(event);
    }

    /// Removes the oldest deferred event of `kind`, if any.
    pub fn take_deferred(&mut self, kind: EventKind) -> Option<TransportEvent> {
        let pos = self.deferred.iter().position(|e| e.kind() == kind)?;
        self.deferred.remove(pos)
    }

    pub fn has_deferred(&self, kind: EventKind) -> bool {
        self.deferred.iter().any(|e| e.kind() == kind)
    }

    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    /// Next event from the transport only, ignoring the deferred ones.
    ///
    /// `None` means the transport dropped its sending side.
    pub async fn recv(&mut self) -> Option<TransportEvent> {
        self.rx.recv().await
    }

    /// Next event, deferred ones first.
    pub async fn next(&mut self) -> Option<TransportEvent> {
        if let Some(event) = self.deferred.pop_front() {
            return Some(event);
        }
        self.rx.recv().await
    }
}
