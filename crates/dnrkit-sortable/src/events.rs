//! Sortable lifecycle events and their dispatcher.

use crate::error::SortableError;
use crate::group::PullMode;
use dnrkit_core::{DomEvent, ElementId};
use kurbo::Rect;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;
use std::str::FromStr;

/// Lifecycle event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortableEventType {
    Start,
    End,
    Add,
    Remove,
    Update,
    Sort,
    Filter,
    Move,
    Clone,
    Change,
    Choose,
    Unchoose,
    Spill,
    Select,
    Deselect,
}

impl SortableEventType {
    pub const ALL: [SortableEventType; 15] = [
        SortableEventType::Start,
        SortableEventType::End,
        SortableEventType::Add,
        SortableEventType::Remove,
        SortableEventType::Update,
        SortableEventType::Sort,
        SortableEventType::Filter,
        SortableEventType::Move,
        SortableEventType::Clone,
        SortableEventType::Change,
        SortableEventType::Choose,
        SortableEventType::Unchoose,
        SortableEventType::Spill,
        SortableEventType::Select,
        SortableEventType::Deselect,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortableEventType::Start => "start",
            SortableEventType::End => "end",
            SortableEventType::Add => "add",
            SortableEventType::Remove => "remove",
            SortableEventType::Update => "update",
            SortableEventType::Sort => "sort",
            SortableEventType::Filter => "filter",
            SortableEventType::Move => "move",
            SortableEventType::Clone => "clone",
            SortableEventType::Change => "change",
            SortableEventType::Choose => "choose",
            SortableEventType::Unchoose => "unchoose",
            SortableEventType::Spill => "spill",
            SortableEventType::Select => "select",
            SortableEventType::Deselect => "deselect",
        }
    }
}

impl fmt::Display for SortableEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortableEventType {
    type Err = SortableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| SortableError::UnknownEventType(s.to_string()))
    }
}

/// Normalized event payload.
#[derive(Debug, Clone, PartialEq)]
pub struct SortableEvent {
    pub kind: SortableEventType,
    /// List the item is in (or was dropped into).
    pub to: ElementId,
    /// List the gesture started in.
    pub from: ElementId,
    pub item: ElementId,
    pub clone: Option<ElementId>,
    pub old_index: Option<usize>,
    pub new_index: Option<usize>,
    pub old_draggable_index: Option<usize>,
    pub new_draggable_index: Option<usize>,
    pub pull_mode: Option<PullMode>,
    /// Element the item was moved next to.
    pub related: Option<ElementId>,
    pub will_insert_after: Option<bool>,
    pub original_event: Option<DomEvent>,
}

impl SortableEvent {
    pub fn new(kind: SortableEventType, list: ElementId, item: ElementId) -> Self {
        Self {
            kind,
            to: list,
            from: list,
            item,
            clone: None,
            old_index: None,
            new_index: None,
            old_draggable_index: None,
            new_draggable_index: None,
            pull_mode: None,
            related: None,
            will_insert_after: None,
            original_event: None,
        }
    }
}

/// Arguments of the `on_move` callback.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveEvent {
    pub from: ElementId,
    pub to: ElementId,
    pub dragged: ElementId,
    pub dragged_rect: Option<Rect>,
    pub related: ElementId,
    pub related_rect: Option<Rect>,
    pub will_insert_after: bool,
}

/// What an `on_move` callback wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveOutcome {
    #[default]
    Proceed,
    Cancel,
    /// Insert before the related element regardless of pointer side.
    InsertBefore,
    /// Insert after the related element regardless of pointer side.
    InsertAfter,
}

/// Subscription handle returned by [`EventDispatcher::on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type Listener = Rc<dyn Fn(&SortableEvent)>;

struct Subscription {
    id: SubscriptionId,
    once: bool,
    listener: Listener,
}

/// Typed pub/sub for sortable events.
///
/// Listeners run in subscription order. A panicking listener is logged and
/// the remaining listeners still run.
#[derive(Default)]
pub struct EventDispatcher {
    next_id: Cell<u64>,
    listeners: RefCell<HashMap<SortableEventType, Vec<Subscription>>>,
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn subscribe(&self, kind: SortableEventType, listener: Listener, once: bool) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push(Subscription { id, once, listener });
        id
    }

    pub fn on(&self, kind: SortableEventType, listener: impl Fn(&SortableEvent) + 'static) -> SubscriptionId {
        self.subscribe(kind, Rc::new(listener), false)
    }

    /// Subscribe for the next event of `kind` only.
    pub fn once(&self, kind: SortableEventType, listener: impl Fn(&SortableEvent) + 'static) -> SubscriptionId {
        self.subscribe(kind, Rc::new(listener), true)
    }

    /// Remove one listener, or every listener of `kind` when `id` is `None`.
    /// Returns the number removed.
    pub fn off(&self, kind: SortableEventType, id: Option<SubscriptionId>) -> usize {
        let mut listeners = self.listeners.borrow_mut();
        let Some(subs) = listeners.get_mut(&kind) else {
            return 0;
        };
        let before = subs.len();
        match id {
            Some(id) => subs.retain(|s| s.id != id),
            None => subs.clear(),
        }
        let removed = before - subs.len();
        if subs.is_empty() {
            listeners.remove(&kind);
        }
        removed
    }

    pub fn clear(&self) {
        self.listeners.borrow_mut().clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().values().map(Vec::len).sum()
    }

    /// Deliver an event. Returns how many listeners completed without panicking.
    pub fn emit(&self, event: &SortableEvent) -> usize {
        let batch: Vec<Listener> = {
            let mut listeners = self.listeners.borrow_mut();
            let Some(subs) = listeners.get_mut(&event.kind) else {
                return 0;
            };
            let batch = subs.iter().map(|s| Rc::clone(&s.listener)).collect();
            subs.retain(|s| !s.once);
            if subs.is_empty() {
                listeners.remove(&event.kind);
            }
            batch
        };

        let mut delivered = 0;
        for listener in batch {
            match catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(()) => delivered += 1,
                Err(payload) => {
                    let message = payload
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    log::error!("Listener for {} panicked: {message}", event.kind);
                }
            }
        }
        delivered
    }
}
