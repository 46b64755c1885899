//! Element activation.
//!
//! An element must be active before it can be dragged or resized (unless its
//! trigger is [`ActivationTrigger::None`]). A scope holds a single active
//! element, so activating one deactivates the previous one.

use crate::dom::{Dom, DomResult, ElementId, EventKind, ListenTarget, ListenerId};
use crate::input::{PointerEvent, PointerPhase, PointerType};
use crate::options::{Reactive, Veto, ask};
use crate::store::InteractionScope;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;

/// What activates an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationTrigger {
    /// Always active.
    #[default]
    None,
    /// Pointer-down inside activates, pointer-down elsewhere deactivates.
    Click,
    /// Pointer-enter activates, pointer-leave deactivates.
    Hover,
}

#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivationOptions {
    pub trigger: Reactive<ActivationTrigger>,
    /// Keep the element active when the pointer goes down elsewhere or leaves.
    pub prevent_deactivation: Reactive<bool>,
    /// Activate on mount (ignored for [`ActivationTrigger::None`]).
    pub initial_active: bool,
    pub disabled: Reactive<bool>,
    /// Pointer types allowed to change activation.
    pub pointer_types: Reactive<Vec<PointerType>>,
    /// Called with the requested state before it changes.
    #[serde(skip)]
    pub on_active_change: Option<Veto<bool>>,
}

impl Default for ActivationOptions {
    fn default() -> Self {
        Self {
            trigger: ActivationTrigger::None.into(),
            prevent_deactivation: false.into(),
            initial_active: false,
            disabled: false.into(),
            pointer_types: PointerType::ALL.to_vec().into(),
            on_active_change: None,
        }
    }
}

impl fmt::Debug for ActivationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivationOptions")
            .field("trigger", &self.trigger)
            .field("prevent_deactivation", &self.prevent_deactivation)
            .field("initial_active", &self.initial_active)
            .field("disabled", &self.disabled)
            .field("pointer_types", &self.pointer_types)
            .finish_non_exhaustive()
    }
}

/// Activation state machine for one element.
///
/// State lives in the [`InteractionScope`], so an `Activation` can be shared
/// (behind an `Rc`) by a draggable and a resizable on the same element.
pub struct Activation {
    element: ElementId,
    scope: InteractionScope,
    options: ActivationOptions,
    listeners: RefCell<Vec<ListenerId>>,
}

impl fmt::Debug for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Activation")
            .field("element", &self.element)
            .field("options", &self.options)
            .field("active", &self.is_active())
            .finish()
    }
}

impl Activation {
    pub fn new(element: ElementId, scope: InteractionScope, options: ActivationOptions) -> Self {
        Self {
            element,
            scope,
            options,
            listeners: RefCell::new(Vec::new()),
        }
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn scope(&self) -> &InteractionScope {
        &self.scope
    }

    pub fn trigger(&self) -> ActivationTrigger {
        self.options.trigger.get()
    }

    pub fn is_active(&self) -> bool {
        self.trigger() == ActivationTrigger::None || self.scope.active() == Some(self.element)
    }

    /// Check if events from this pointer type are handled.
    pub fn accepts(&self, pointer_type: PointerType) -> bool {
        self.options.pointer_types.get().contains(&pointer_type)
    }

    /// Request a state change. Returns true when the state changed.
    pub fn set_active(&self, active: bool) -> bool {
        if self.options.disabled.get() {
            log::trace!("Activation of {} is disabled", self.element);
            return false;
        }
        let holds = self.scope.active() == Some(self.element);
        if holds == active {
            return false;
        }
        if ask(&self.options.on_active_change, &active).is_cancel() {
            log::debug!("Activation change of {} cancelled", self.element);
            return false;
        }
        if active {
            self.scope.set_active(self.element);
        } else {
            self.scope.release_active(self.element);
        }
        true
    }

    /// Feed a pointer event to the state machine.
    pub fn handle_event(&self, dom: &dyn Dom, event: &PointerEvent) {
        if !self.accepts(event.pointer_type) {
            return;
        }
        let inside = |el: Option<ElementId>| el.is_some_and(|el| dom.contains(self.element, el));
        let keep = self.options.prevent_deactivation.get();
        match (self.trigger(), event.phase) {
            (ActivationTrigger::Click, PointerPhase::Down) => {
                if inside(event.target) {
                    self.set_active(true);
                } else if !keep {
                    self.set_active(false);
                }
            }
            (ActivationTrigger::Hover, PointerPhase::Enter) if inside(event.target) => {
                self.set_active(true);
            }
            (ActivationTrigger::Hover, PointerPhase::Leave) if !keep && !inside(event.related_target) => {
                self.set_active(false);
            }
            _ => {}
        }
    }

    /// Register listeners for the trigger and apply `initial_active`.
    pub fn mount(&self, dom: &mut dyn Dom) -> DomResult<()> {
        self.scope.attach(self.element);
        let kinds = match self.trigger() {
            ActivationTrigger::None => vec![],
            ActivationTrigger::Click => vec![(ListenTarget::Document, EventKind::PointerDown)],
            ActivationTrigger::Hover => vec![
                (ListenTarget::Element(self.element), EventKind::PointerEnter),
                (ListenTarget::Element(self.element), EventKind::PointerLeave),
            ],
        };
        for (target, kind) in kinds {
            let id = dom.add_listener(target, kind)?;
            self.listeners.borrow_mut().push(id);
        }
        if self.options.initial_active && self.trigger() != ActivationTrigger::None {
            self.set_active(true);
        }
        Ok(())
    }

    /// Remove listeners and leave the scope.
    pub fn unmount(&self, dom: &mut dyn Dom) {
        for id in self.listeners.borrow_mut().drain(..) {
            dom.remove_listener(id);
        }
        self.scope.detach(self.element);
    }
}
