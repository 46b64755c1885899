//! Combined drag-and-resize.

use crate::activation::{Activation, ActivationOptions};
use crate::dom::{Dom, DomResult, ElementId};
use crate::draggable::{DragOptions, Draggable};
use crate::geometry::ElementSize;
use crate::handle::HandlePosition;
use crate::input::{Instant, PointerEvent};
use crate::options::Reactive;
use crate::resizable::{ResizeOptions, Resizable};
use crate::store::InteractionScope;
use crate::style::StyleMap;
use kurbo::Point;
use serde::Deserialize;
use std::rc::Rc;

/// Options for [`DragAndResize`].
///
/// `drag.initial_position` and `drag.position_type` apply to both engines.
/// The engines' own `activation` options are ignored in favour of
/// `activation`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DnrOptions {
    pub drag: DragOptions,
    pub resize: ResizeOptions,
    pub activation: ActivationOptions,
    pub disabled: Reactive<bool>,
    pub disable_drag: Reactive<bool>,
    pub disable_resize: Reactive<bool>,
}

fn either(shared: Reactive<bool>, own: Reactive<bool>, engine: Reactive<bool>) -> Reactive<bool> {
    Reactive::dynamic(move || shared.get() || own.get() || engine.get())
}

/// A draggable and a resizable on one element sharing one activation.
///
/// Events reach the resizable first so a press on a resize handle claims the
/// resize before the draggable sees it.
#[derive(Debug)]
pub struct DragAndResize {
    element: ElementId,
    activation: Rc<Activation>,
    draggable: Draggable,
    resizable: Resizable,
}

impl DragAndResize {
    pub fn new(element: ElementId, scope: InteractionScope, options: DnrOptions) -> Self {
        let DnrOptions {
            mut drag,
            mut resize,
            activation,
            disabled,
            disable_drag,
            disable_resize,
        } = options;

        drag.disabled = either(disabled.clone(), disable_drag, drag.disabled);
        resize.disabled = either(disabled, disable_resize, resize.disabled);
        resize.initial_position = drag.initial_position;
        resize.position_type = drag.position_type.clone();

        let activation = Rc::new(Activation::new(element, scope, activation));
        Self {
            element,
            draggable: Draggable::with_activation(element, Rc::clone(&activation), drag),
            resizable: Resizable::with_activation(element, Rc::clone(&activation), resize),
            activation,
        }
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn draggable(&self) -> &Draggable {
        &self.draggable
    }

    pub fn resizable(&self) -> &Resizable {
        &self.resizable
    }

    pub fn position(&self) -> Point {
        self.draggable.position()
    }

    pub fn size(&self) -> ElementSize {
        self.resizable.size()
    }

    pub fn is_dragging(&self) -> bool {
        self.draggable.is_dragging()
    }

    pub fn is_resizing(&self) -> bool {
        self.resizable.is_resizing()
    }

    pub fn is_active(&self) -> bool {
        self.activation.is_active()
    }

    pub fn set_active(&self, active: bool) -> bool {
        self.activation.set_active(active)
    }

    pub fn active_handle(&self) -> Option<HandlePosition> {
        self.resizable.active_handle()
    }

    pub fn hover_handle(&self) -> Option<HandlePosition> {
        self.resizable.hover_handle()
    }

    pub fn set_position(&mut self, position: Point) {
        self.draggable.set_position(position);
        self.resizable.set_position(position);
    }

    pub fn set_size(&mut self, size: ElementSize) {
        self.resizable.set_size(size);
    }

    pub fn register_handle(&mut self, dom: &mut dyn Dom, position: HandlePosition, element: ElementId) -> DomResult<()> {
        self.resizable.register_handle(dom, position, element)
    }

    pub fn unregister_handle(&mut self, dom: &mut dyn Dom, position: HandlePosition) -> bool {
        self.resizable.unregister_handle(dom, position)
    }

    pub fn mount(&mut self, dom: &mut dyn Dom) -> DomResult<()> {
        self.activation.mount(dom)?;
        self.resizable.mount(dom)?;
        self.draggable.mount(dom)
    }

    pub fn unmount(&mut self, dom: &mut dyn Dom) {
        self.draggable.unmount(dom);
        self.resizable.unmount(dom);
        self.activation.unmount(dom);
    }

    pub fn handle_event(&mut self, dom: &mut dyn Dom, event: &PointerEvent) {
        self.activation.handle_event(dom, event);
        let before = (self.draggable.position(), self.resizable.position());
        self.resizable.handle_event(dom, event);
        self.draggable.handle_event(dom, event);
        self.sync_position(before);
    }

    pub fn poll(&mut self, dom: &mut dyn Dom, now: Instant) {
        let before = (self.draggable.position(), self.resizable.position());
        self.resizable.poll(dom, now);
        self.draggable.poll(dom, now);
        self.sync_position(before);
    }

    fn sync_position(&mut self, (drag_before, resize_before): (Point, Point)) {
        let dragged = self.draggable.position();
        let resized = self.resizable.position();
        if dragged != drag_before {
            self.resizable.set_position(dragged);
        } else if resized != resize_before {
            self.draggable.set_position(resized);
        }
    }

    /// Drag style with the resize style layered over it.
    pub fn style(&self) -> StyleMap {
        self.draggable.style().merged(&self.resizable.style())
    }

    pub fn apply_style(&self, dom: &mut dyn Dom) -> DomResult<()> {
        self.style().apply(dom, self.element)
    }
}
