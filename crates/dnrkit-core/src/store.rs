//! Shared interaction state.
//!
//! Every engine is given an [`InteractionScope`]. Engines sharing a scope see
//! each other's active, dragging and resizing elements; at most one drag or
//! resize runs per scope at any time.

use crate::dom::ElementId;
use crate::handle::HandlePosition;
use kurbo::{Point, Size};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use uuid::Uuid;

/// Mutable record shared by every engine in a scope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionState {
    /// The single active element. Activating another element replaces it.
    pub active_element: Option<ElementId>,
    pub dragging_element: Option<ElementId>,
    pub drag_position: Option<Point>,
    pub resizing_element: Option<ElementId>,
    pub resize_size: Option<Size>,
    pub active_handle: Option<HandlePosition>,
    /// Handle currently under the pointer and the element it belongs to.
    pub hover_handle: Option<(ElementId, HandlePosition)>,
    /// Elements with a mounted engine.
    pub attached: HashSet<ElementId>,
    /// Resize handle nodes; a pointer-down on one never starts a drag.
    pub handle_elements: HashSet<ElementId>,
}

impl InteractionState {
    pub fn is_dragging(&self) -> bool {
        self.dragging_element.is_some()
    }

    pub fn is_resizing(&self) -> bool {
        self.resizing_element.is_some()
    }

    /// A drag or resize is in progress.
    pub fn is_busy(&self) -> bool {
        self.is_dragging() || self.is_resizing()
    }
}

/// Shared handle to an [`InteractionState`].
///
/// Cloning the scope shares the state. Independent scopes (for example one per
/// modal overlay) never interact.
#[derive(Debug, Clone)]
pub struct InteractionScope {
    id: Uuid,
    state: Rc<RefCell<InteractionState>>,
}

impl Default for InteractionScope {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for InteractionScope {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl InteractionScope {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: Rc::new(RefCell::new(InteractionState::default())),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> InteractionState {
        self.state.borrow().clone()
    }

    pub fn attach(&self, element: ElementId) {
        self.state.borrow_mut().attached.insert(element);
    }

    /// Forget an element. When the last element detaches the scope resets.
    pub fn detach(&self, element: ElementId) {
        let mut state = self.state.borrow_mut();
        state.attached.remove(&element);
        if state.active_element == Some(element) {
            state.active_element = None;
        }
        if state.hover_handle.is_some_and(|(el, _)| el == element) {
            state.hover_handle = None;
        }
        if state.attached.is_empty() {
            log::debug!("Interaction scope {} reset", self.id);
            *state = InteractionState::default();
        }
    }

    pub fn active(&self) -> Option<ElementId> {
        self.state.borrow().active_element
    }

    /// Make `element` the scope's active element, displacing any other.
    pub fn set_active(&self, element: ElementId) {
        self.state.borrow_mut().active_element = Some(element);
    }

    /// Clear the active slot if `element` holds it.
    pub fn release_active(&self, element: ElementId) -> bool {
        let mut state = self.state.borrow_mut();
        if state.active_element == Some(element) {
            state.active_element = None;
            true
        } else {
            false
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.state.borrow().is_dragging()
    }

    pub fn is_resizing(&self) -> bool {
        self.state.borrow().is_resizing()
    }

    pub fn dragging_element(&self) -> Option<ElementId> {
        self.state.borrow().dragging_element
    }

    pub fn resizing_element(&self) -> Option<ElementId> {
        self.state.borrow().resizing_element
    }

    /// Claim the drag lock. Fails while any drag or resize is in progress.
    pub fn try_begin_drag(&self, element: ElementId, position: Point) -> bool {
        let mut state = self.state.borrow_mut();
        if state.is_busy() {
            return false;
        }
        state.dragging_element = Some(element);
        state.drag_position = Some(position);
        true
    }

    pub fn update_drag(&self, element: ElementId, position: Point) {
        let mut state = self.state.borrow_mut();
        if state.dragging_element == Some(element) {
            state.drag_position = Some(position);
        }
    }

    /// Release the drag lock if `element` holds it.
    pub fn end_drag(&self, element: ElementId) -> bool {
        let mut state = self.state.borrow_mut();
        if state.dragging_element != Some(element) {
            return false;
        }
        state.dragging_element = None;
        state.drag_position = None;
        true
    }

    /// Claim the resize lock. Fails while any drag or resize is in progress.
    pub fn try_begin_resize(&self, element: ElementId, handle: HandlePosition, size: Size) -> bool {
        let mut state = self.state.borrow_mut();
        if state.is_busy() {
            return false;
        }
        state.resizing_element = Some(element);
        state.active_handle = Some(handle);
        state.resize_size = Some(size);
        true
    }

    pub fn update_resize(&self, element: ElementId, size: Size) {
        let mut state = self.state.borrow_mut();
        if state.resizing_element == Some(element) {
            state.resize_size = Some(size);
        }
    }

    /// Release the resize lock if `element` holds it.
    pub fn end_resize(&self, element: ElementId) -> bool {
        let mut state = self.state.borrow_mut();
        if state.resizing_element != Some(element) {
            return false;
        }
        state.resizing_element = None;
        state.active_handle = None;
        state.resize_size = None;
        true
    }

    /// Record the handle under the pointer for `element`. Clearing only
    /// applies when `element` owns the current hover.
    pub fn set_hover_handle(&self, element: ElementId, handle: Option<HandlePosition>) {
        let mut state = self.state.borrow_mut();
        match handle {
            Some(h) => state.hover_handle = Some((element, h)),
            None => {
                if state.hover_handle.is_some_and(|(el, _)| el == element) {
                    state.hover_handle = None;
                }
            }
        }
    }

    /// Hovered handle of `element`, if the pointer is over one.
    pub fn hover_handle_for(&self, element: ElementId) -> Option<HandlePosition> {
        self.state
            .borrow()
            .hover_handle
            .filter(|(el, _)| *el == element)
            .map(|(_, h)| h)
    }

    pub fn register_handle_element(&self, element: ElementId) {
        self.state.borrow_mut().handle_elements.insert(element);
    }

    pub fn unregister_handle_element(&self, element: ElementId) {
        self.state.borrow_mut().handle_elements.remove(&element);
    }

    pub fn is_handle_element(&self, element: ElementId) -> bool {
        self.state.borrow().handle_elements.contains(&element)
    }
}
