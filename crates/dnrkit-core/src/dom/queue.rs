//! Event queue filled by host listeners.

use crate::input::DomEvent;
use std::collections::VecDeque;

/// Events waiting for the host to forward them to the engines.
///
/// One browser event reaches every listener registered for it (the list,
/// the document, each engine's own document listener), so pushes carry the
/// id of the dispatch they came from and only the first one is kept. Ids
/// come from [`EventQueue::next_dispatch`] and increase monotonically.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<DomEvent>,
    next: u64,
    last_pushed: Option<u64>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id for a dispatch seen for the first time.
    pub fn next_dispatch(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Queue an event unless its dispatch was already queued.
    /// Returns true when the event was kept.
    pub fn push(&mut self, dispatch: u64, event: DomEvent) -> bool {
        if self.last_pushed.is_some_and(|last| dispatch <= last) {
            return false;
        }
        self.last_pushed = Some(dispatch);
        self.events.push_back(event);
        true
    }

    /// Take every queued event in arrival order.
    pub fn drain(&mut self) -> Vec<DomEvent> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
