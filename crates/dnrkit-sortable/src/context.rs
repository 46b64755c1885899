//! State shared by every sortable list in a scope.

use crate::animation::AnimationManager;
use crate::events::{EventDispatcher, SortableEvent};
use crate::group::{DropDecision, GroupManager, GroupOptions};
use crate::options::SortableOptions;
use dnrkit_core::{Dom, DomEvent, ElementId};
use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use uuid::Uuid;

/// Handles a list shares with the context.
#[derive(Debug, Clone)]
pub(crate) struct ListEntry {
    pub options: Rc<RefCell<SortableOptions>>,
    pub events: Rc<EventDispatcher>,
    pub animation: Rc<RefCell<AnimationManager>>,
}

#[derive(Debug, Default)]
struct ContextState {
    groups: GroupManager,
    lists: HashMap<ElementId, ListEntry>,
    /// Source list of the drag in progress.
    active: Option<ElementId>,
}

/// Shared handle linking sortable lists so items can travel between them.
///
/// Lists that should exchange items must share one context. At most one
/// drag runs per context.
#[derive(Debug, Clone)]
pub struct SortableContext {
    id: Uuid,
    state: Rc<RefCell<ContextState>>,
}

impl Default for SortableContext {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for SortableContext {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl SortableContext {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: Rc::new(RefCell::new(ContextState::default())),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub(crate) fn register_list(&self, list: ElementId, entry: ListEntry) {
        let group = entry.options.borrow().group.clone();
        let mut state = self.state.borrow_mut();
        state.lists.insert(list, entry);
        match group {
            Some(group) => state.groups.register(list, group),
            None => {
                state.groups.unregister(list);
            }
        }
    }

    pub(crate) fn unregister_list(&self, list: ElementId) {
        let mut state = self.state.borrow_mut();
        state.lists.remove(&list);
        state.groups.unregister(list);
        if state.active == Some(list) {
            state.active = None;
        }
    }

    /// Re-read a list's group after its options changed.
    pub(crate) fn update_group(&self, list: ElementId, group: Option<GroupOptions>) {
        let mut state = self.state.borrow_mut();
        if !state.lists.contains_key(&list) {
            return;
        }
        match group {
            Some(group) => state.groups.register(list, group),
            None => {
                state.groups.unregister(list);
            }
        }
    }

    pub fn is_registered(&self, list: ElementId) -> bool {
        self.state.borrow().lists.contains_key(&list)
    }

    pub fn list_count(&self) -> usize {
        self.state.borrow().lists.len()
    }

    /// The group registry.
    pub fn groups(&self) -> Ref<'_, GroupManager> {
        Ref::map(self.state.borrow(), |s| &s.groups)
    }

    pub fn containers_in_group(&self, name: &str) -> Vec<ElementId> {
        self.state.borrow().groups.containers_in_group(name)
    }

    pub fn can_accept_drop(
        &self,
        source: ElementId,
        target: ElementId,
        dragged: ElementId,
        event: Option<&DomEvent>,
    ) -> DropDecision {
        self.state.borrow().groups.can_accept_drop(source, target, dragged, event)
    }

    /// Nearest registered list containing `element` (the element itself
    /// included).
    pub fn list_of(&self, dom: &dyn Dom, element: ElementId) -> Option<ElementId> {
        let state = self.state.borrow();
        let mut current = Some(element);
        while let Some(el) = current {
            if state.lists.contains_key(&el) {
                return Some(el);
            }
            current = dom.parent(el);
        }
        None
    }

    /// Snapshot of a list's options.
    pub(crate) fn options_of(&self, list: ElementId) -> Option<SortableOptions> {
        let options = Rc::clone(&self.state.borrow().lists.get(&list)?.options);
        let snapshot = options.borrow().clone();
        Some(snapshot)
    }

    pub(crate) fn animation_of(&self, list: ElementId) -> Option<Rc<RefCell<AnimationManager>>> {
        self.state.borrow().lists.get(&list).map(|e| Rc::clone(&e.animation))
    }

    /// Deliver an event to a list's listeners.
    pub(crate) fn emit(&self, list: ElementId, event: &SortableEvent) -> usize {
        let events = self.state.borrow().lists.get(&list).map(|e| Rc::clone(&e.events));
        match events {
            Some(events) => events.emit(event),
            None => 0,
        }
    }

    /// Claim the context for a drag starting in `list`.
    pub(crate) fn try_begin(&self, list: ElementId) -> bool {
        let mut state = self.state.borrow_mut();
        match state.active {
            Some(active) if active != list => false,
            _ => {
                state.active = Some(list);
                true
            }
        }
    }

    pub(crate) fn end(&self, list: ElementId) {
        let mut state = self.state.borrow_mut();
        if state.active == Some(list) {
            state.active = None;
        }
    }

    /// Source list of the drag in progress.
    pub fn active_list(&self) -> Option<ElementId> {
        self.state.borrow().active
    }
}
