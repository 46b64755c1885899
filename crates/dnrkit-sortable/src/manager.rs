//! Public facade over a sortable list.

use crate::context::SortableContext;
use crate::error::SortableResult;
use crate::events::{SortableEvent, SortableEventType, SubscriptionId};
use crate::instance::Sortable;
use crate::options::SortableOptions;
use dnrkit_core::{Dom, DomEvent, ElementId, Instant};

/// A sortable list with its lifecycle.
///
/// `initialize` mounts the list and `destroy` tears it down again; events
/// delivered in between drive the drag engine.
#[derive(Debug)]
pub struct SortableManager {
    sortable: Sortable,
}

impl SortableManager {
    pub fn new(list: ElementId, context: SortableContext, options: SortableOptions) -> Self {
        Self {
            sortable: Sortable::new(list, context, options),
        }
    }

    /// Manager for a list that shares no items with other lists.
    pub fn standalone(list: ElementId, options: SortableOptions) -> Self {
        Self::new(list, SortableContext::new(), options)
    }

    pub fn list(&self) -> ElementId {
        self.sortable.list()
    }

    pub fn context(&self) -> &SortableContext {
        self.sortable.context()
    }

    pub fn sortable(&self) -> &Sortable {
        &self.sortable
    }

    pub fn is_initialized(&self) -> bool {
        self.sortable.is_mounted()
    }

    pub fn initialize(&mut self, dom: &mut dyn Dom) -> SortableResult<()> {
        self.sortable.mount(dom)
    }

    pub fn destroy(&mut self, dom: &mut dyn Dom) {
        self.sortable.unmount(dom);
    }

    /// Feed a host event; true asks the host to prevent its default action.
    pub fn handle_event(&mut self, dom: &mut dyn Dom, event: &DomEvent) -> bool {
        self.sortable.handle_event(dom, event)
    }

    pub fn poll(&mut self, dom: &mut dyn Dom, now: Instant) {
        self.sortable.poll(dom, now);
    }

    pub fn is_dragging(&self) -> bool {
        self.sortable.is_dragging()
    }

    pub fn drag_element(&self) -> Option<ElementId> {
        self.sortable.drag_element()
    }

    /// Item ids in DOM order.
    pub fn items(&self, dom: &dyn Dom) -> Vec<String> {
        self.sortable.to_array(dom)
    }

    pub fn to_array(&self, dom: &dyn Dom) -> Vec<String> {
        self.sortable.to_array(dom)
    }

    pub fn sort(&mut self, dom: &mut dyn Dom, ordered_ids: &[String], use_animation: bool, now: Instant) {
        self.sortable.sort(dom, ordered_ids, use_animation, now);
    }

    pub fn is_animating(&self) -> bool {
        self.sortable.animation().is_animating()
    }

    pub fn animating_elements(&self) -> Vec<ElementId> {
        self.sortable.animation().animating_elements()
    }

    pub fn option(&self, name: &str) -> Option<serde_json::Value> {
        self.sortable.option(name)
    }

    pub fn set_option(&mut self, name: &str, value: serde_json::Value) -> SortableResult<()> {
        self.sortable.set_option(name, value)
    }

    pub fn on(&self, kind: SortableEventType, listener: impl Fn(&SortableEvent) + 'static) -> SubscriptionId {
        self.sortable.events().on(kind, listener)
    }

    pub fn once(&self, kind: SortableEventType, listener: impl Fn(&SortableEvent) + 'static) -> SubscriptionId {
        self.sortable.events().once(kind, listener)
    }

    /// Remove one listener, or every listener of `kind` when `id` is `None`.
    pub fn off(&self, kind: SortableEventType, id: Option<SubscriptionId>) -> usize {
        self.sortable.events().off(kind, id)
    }

    pub fn select(&mut self, dom: &mut dyn Dom, item: ElementId) -> SortableResult<bool> {
        self.sortable.select(dom, item)
    }

    pub fn deselect(&mut self, dom: &mut dyn Dom, item: ElementId) -> SortableResult<bool> {
        self.sortable.deselect(dom, item)
    }

    pub fn selected(&self) -> &[ElementId] {
        self.sortable.selected()
    }
}
