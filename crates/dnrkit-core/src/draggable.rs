//! Pointer-driven drag engine.

use crate::activation::{Activation, ActivationOptions};
use crate::dom::{Dom, DomResult, ElementId, EventKind, ListenTarget, ListenerId};
use crate::geometry::{Axis, PositionType, apply_axis, clamp_to_bounds, px, round_point};
use crate::input::{Instant, PointerEvent, PointerPhase};
use crate::options::{Notify, Reactive, Veto, ask};
use crate::snap::{Grid, snap_to_grid};
use crate::store::InteractionScope;
use crate::style::{StateStyles, StyleMap};
use crate::throttle::Throttle;
use kurbo::{Point, Size, Vec2};
use serde::Deserialize;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

/// z-index applied while dragging when the option is left on auto.
pub const DRAGGING_Z_INDEX: i32 = 9999;

/// Payload of drag callbacks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragEventData {
    pub element: ElementId,
    /// Element position (the proposed one for `on_drag`).
    pub position: Point,
    /// Pointer position in client coordinates.
    pub pointer: Point,
}

#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DragOptions {
    pub initial_position: Point,
    pub position_type: Reactive<PositionType>,
    pub axis: Reactive<Axis>,
    pub grid: Reactive<Option<Grid>>,
    /// Container the element must stay inside.
    #[serde(skip)]
    pub bounds: Reactive<Option<ElementId>>,
    /// Zoom factor of the coordinate space the element lives in.
    pub scale: Reactive<f64>,
    /// Drag handle; the element itself when unset.
    #[serde(skip)]
    pub handle: Reactive<Option<ElementId>>,
    /// Minimum milliseconds between move frames.
    pub throttle: Reactive<u64>,
    pub disabled: Reactive<bool>,
    pub activation: ActivationOptions,
    /// Fixed z-index; `None` means auto (raised while dragging).
    pub z_index: Reactive<Option<i32>>,
    pub state_styles: StateStyles,
    #[serde(skip)]
    pub on_drag_start: Option<Veto<DragEventData>>,
    #[serde(skip)]
    pub on_drag: Option<Veto<DragEventData>>,
    #[serde(skip)]
    pub on_drag_end: Option<Notify<DragEventData>>,
}

impl Default for DragOptions {
    fn default() -> Self {
        Self {
            initial_position: Point::ZERO,
            position_type: PositionType::Absolute.into(),
            axis: Axis::Both.into(),
            grid: None.into(),
            bounds: None.into(),
            scale: 1.0.into(),
            handle: None.into(),
            throttle: 0.into(),
            disabled: false.into(),
            activation: ActivationOptions::default(),
            z_index: None.into(),
            state_styles: StateStyles::default(),
            on_drag_start: None,
            on_drag: None,
            on_drag_end: None,
        }
    }
}

impl fmt::Debug for DragOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragOptions")
            .field("initial_position", &self.initial_position)
            .field("position_type", &self.position_type)
            .field("axis", &self.axis)
            .field("grid", &self.grid)
            .field("bounds", &self.bounds)
            .field("scale", &self.scale)
            .field("throttle", &self.throttle)
            .field("disabled", &self.disabled)
            .finish_non_exhaustive()
    }
}

/// Options read once per operation.
#[derive(Debug, Clone, Copy)]
struct ResolvedDragOptions {
    axis: Axis,
    grid: Option<Grid>,
    bounds: Option<ElementId>,
    scale: f64,
}

impl DragOptions {
    fn resolve(&self) -> ResolvedDragOptions {
        let scale = self.scale.get();
        ResolvedDragOptions {
            axis: self.axis.get(),
            grid: self.grid.get().filter(Grid::is_enabled),
            bounds: self.bounds.get(),
            scale: if scale.is_finite() && scale > 0.0 { scale } else { 1.0 },
        }
    }

    fn throttle_interval(&self) -> Duration {
        Duration::from_millis(self.throttle.get())
    }
}

#[derive(Debug, Clone, Copy)]
struct DragGesture {
    start_pointer: Point,
    start_position: Point,
}

/// Makes one element draggable.
pub struct Draggable {
    element: ElementId,
    scope: InteractionScope,
    activation: Rc<Activation>,
    owns_activation: bool,
    options: DragOptions,
    position: Point,
    gesture: Option<DragGesture>,
    throttle: Throttle<Point>,
    listeners: Vec<ListenerId>,
}

impl fmt::Debug for Draggable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Draggable")
            .field("element", &self.element)
            .field("position", &self.position)
            .field("dragging", &self.is_dragging())
            .finish_non_exhaustive()
    }
}

impl Draggable {
    pub fn new(element: ElementId, scope: InteractionScope, options: DragOptions) -> Self {
        let activation = Rc::new(Activation::new(element, scope.clone(), options.activation.clone()));
        Self::build(element, scope, activation, true, options)
    }

    /// Create an engine driven by an activation owned elsewhere. The owner
    /// routes events to the activation and mounts it.
    pub fn with_activation(element: ElementId, activation: Rc<Activation>, options: DragOptions) -> Self {
        let scope = activation.scope().clone();
        Self::build(element, scope, activation, false, options)
    }

    fn build(
        element: ElementId,
        scope: InteractionScope,
        activation: Rc<Activation>,
        owns_activation: bool,
        options: DragOptions,
    ) -> Self {
        Self {
            element,
            scope,
            activation,
            owns_activation,
            position: options.initial_position,
            options,
            gesture: None,
            throttle: Throttle::new(),
            listeners: Vec::new(),
        }
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn is_dragging(&self) -> bool {
        self.gesture.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.activation.is_active()
    }

    pub fn set_active(&self, active: bool) -> bool {
        self.activation.set_active(active)
    }

    pub fn activation(&self) -> &Rc<Activation> {
        &self.activation
    }

    pub fn options(&self) -> &DragOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut DragOptions {
        &mut self.options
    }

    /// Move the element programmatically.
    pub fn set_position(&mut self, position: Point) {
        self.position = position;
        self.scope.update_drag(self.element, position);
    }

    /// Register pointer listeners and join the scope.
    pub fn mount(&mut self, dom: &mut dyn Dom) -> DomResult<()> {
        if !self.listeners.is_empty() {
            return Ok(());
        }
        if self.owns_activation {
            self.activation.mount(dom)?;
        } else {
            self.scope.attach(self.element);
        }
        let handle = self.options.handle.get().unwrap_or(self.element);
        let wanted = [
            (ListenTarget::Element(handle), EventKind::PointerDown),
            (ListenTarget::Document, EventKind::PointerMove),
            (ListenTarget::Document, EventKind::PointerUp),
            (ListenTarget::Document, EventKind::PointerCancel),
        ];
        for (target, kind) in wanted {
            self.listeners.push(dom.add_listener(target, kind)?);
        }
        Ok(())
    }

    /// Remove listeners, end any gesture and leave the scope.
    pub fn unmount(&mut self, dom: &mut dyn Dom) {
        for id in self.listeners.drain(..) {
            dom.remove_listener(id);
        }
        if self.gesture.take().is_some() {
            self.scope.end_drag(self.element);
        }
        self.throttle.reset();
        if self.owns_activation {
            self.activation.unmount(dom);
        } else {
            self.scope.detach(self.element);
        }
    }

    /// Feed a pointer event.
    pub fn handle_event(&mut self, dom: &dyn Dom, event: &PointerEvent) {
        if self.owns_activation {
            self.activation.handle_event(dom, event);
        }
        if !self.activation.accepts(event.pointer_type) {
            return;
        }
        match event.phase {
            PointerPhase::Down => self.pointer_down(dom, event),
            PointerPhase::Move => self.pointer_move(dom, event.position, event.timestamp),
            PointerPhase::Up | PointerPhase::Cancel => self.pointer_up(dom, event.position),
            PointerPhase::Enter | PointerPhase::Leave => {}
        }
    }

    /// Deliver a throttled trailing frame once its interval has elapsed.
    pub fn poll(&mut self, dom: &dyn Dom, now: Instant) {
        if self.gesture.is_none() {
            return;
        }
        if let Some(pointer) = self.throttle.poll(now, self.options.throttle_interval()) {
            self.apply_frame(dom, pointer);
        }
    }

    fn pointer_down(&mut self, dom: &dyn Dom, event: &PointerEvent) {
        if self.gesture.is_some() {
            return;
        }
        if self.options.disabled.get() {
            log::trace!("Drag of {} ignored: disabled", self.element);
            return;
        }
        if !self.activation.is_active() {
            log::trace!("Drag of {} ignored: inactive", self.element);
            return;
        }
        if self.scope.is_resizing() {
            log::trace!("Drag of {} ignored: resize in progress", self.element);
            return;
        }
        let handle = self.options.handle.get().unwrap_or(self.element);
        let Some(target) = event.target.filter(|&t| dom.contains(handle, t)) else {
            return;
        };
        if self.is_on_resize_handle(dom, target) || self.scope.hover_handle_for(self.element).is_some() {
            log::trace!("Drag of {} ignored: pointer on a resize handle", self.element);
            return;
        }

        let data = DragEventData {
            element: self.element,
            position: self.position,
            pointer: event.position,
        };
        if ask(&self.options.on_drag_start, &data).is_cancel() {
            log::debug!("Drag of {} cancelled by on_drag_start", self.element);
            return;
        }
        if !self.scope.try_begin_drag(self.element, self.position) {
            log::debug!("Drag of {} rejected: scope busy", self.element);
            return;
        }
        self.throttle.reset();
        self.gesture = Some(DragGesture {
            start_pointer: event.position,
            start_position: self.position,
        });
    }

    fn is_on_resize_handle(&self, dom: &dyn Dom, target: ElementId) -> bool {
        let mut current = Some(target);
        while let Some(el) = current {
            if self.scope.is_handle_element(el) {
                return true;
            }
            if el == self.element {
                break;
            }
            current = dom.parent(el);
        }
        false
    }

    fn pointer_move(&mut self, dom: &dyn Dom, pointer: Point, now: Instant) {
        if self.gesture.is_none() {
            return;
        }
        if let Some(pointer) = self.throttle.submit(pointer, now, self.options.throttle_interval()) {
            self.apply_frame(dom, pointer);
        }
    }

    fn pointer_up(&mut self, dom: &dyn Dom, pointer: Point) {
        if self.gesture.is_none() {
            return;
        }
        if let Some(pointer) = self.throttle.flush() {
            self.apply_frame(dom, pointer);
        }
        self.gesture = None;
        self.scope.end_drag(self.element);
        if let Some(on_end) = &self.options.on_drag_end {
            on_end(&DragEventData {
                element: self.element,
                position: self.position,
                pointer,
            });
        }
    }

    fn apply_frame(&mut self, dom: &dyn Dom, pointer: Point) {
        let Some(gesture) = self.gesture else {
            return;
        };
        let opts = self.options.resolve();
        let delta = apply_axis((pointer - gesture.start_pointer) / opts.scale, opts.axis);
        let mut candidate = round_point(gesture.start_position + delta);
        if let Some(grid) = opts.grid {
            candidate = snap_to_grid(candidate, grid).point;
        }
        if let Some(bounds) = opts.bounds {
            match (dom.rect(bounds), dom.rect(self.element)) {
                (Some(container), Some(rect)) => {
                    let to_local = |s: Size| Size::new(s.width / opts.scale, s.height / opts.scale);
                    candidate = clamp_to_bounds(candidate, to_local(rect.size()), to_local(container.size()));
                }
                _ => log::debug!("Bounds of {} not measurable, skipping clamp", self.element),
            }
        }

        let data = DragEventData {
            element: self.element,
            position: candidate,
            pointer,
        };
        if ask(&self.options.on_drag, &data).is_cancel() {
            return;
        }
        self.position = candidate;
        self.scope.update_drag(self.element, candidate);
    }

    /// Inline styles for the current state.
    pub fn style(&self) -> StyleMap {
        let mut style = StyleMap::new();
        let position_type = self.options.position_type.get();
        style.set("position", position_type.as_css());
        match position_type {
            PositionType::Absolute => {
                style.set("left", px(self.position.x)).set("top", px(self.position.y));
            }
            PositionType::Relative => {
                style.set("transform", translate(self.position.to_vec2()));
            }
        }
        style.set("touch-action", "none");

        let dragging = self.is_dragging();
        let active = self.is_active();
        if !self.options.disabled.get() && active {
            style.set("cursor", if dragging { "grabbing" } else { "grab" });
        }
        if dragging {
            style.set("user-select", "none");
        }
        match self.options.z_index.get() {
            Some(z) => {
                style.set("z-index", z.to_string());
            }
            None if dragging => {
                style.set("z-index", DRAGGING_Z_INDEX.to_string());
            }
            None => {}
        }

        let layers = &self.options.state_styles;
        style.merge(&layers.default);
        if active {
            style.merge(&layers.active);
        }
        if dragging {
            style.merge(&layers.dragging);
        }
        style
    }

    /// Write [`style`](Self::style) to the element.
    pub fn apply_style(&self, dom: &mut dyn Dom) -> DomResult<()> {
        self.style().apply(dom, self.element)
    }
}

fn translate(offset: Vec2) -> String {
    format!("translate({}, {})", px(offset.x), px(offset.y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationTrigger;
    use crate::dom::MemoryDom;
    use crate::handle::HandlePosition;
    use crate::options::Outcome;
    use kurbo::Rect;
    use std::cell::RefCell;

    struct Fixture {
        dom: MemoryDom,
        container: ElementId,
        element: ElementId,
        scope: InteractionScope,
        now: Instant,
    }

    fn fixture() -> Fixture {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        let container = dom.spawn(body, "div", Rect::new(0.0, 0.0, 300.0, 300.0)).unwrap();
        let element = dom.spawn(container, "div", Rect::new(50.0, 50.0, 100.0, 100.0)).unwrap();
        Fixture {
            dom,
            container,
            element,
            scope: InteractionScope::new(),
            now: Instant::now(),
        }
    }

    fn at(f: &Fixture, ms: u64) -> Instant {
        f.now + Duration::from_millis(ms)
    }

    fn drag(f: &Fixture, engine: &mut Draggable, from: Point, to: &[Point]) {
        engine.handle_event(&f.dom, &PointerEvent::down(from, Some(f.element), f.now));
        for (i, &p) in to.iter().enumerate() {
            engine.handle_event(&f.dom, &PointerEvent::moved(p, at(f, i as u64 + 1)));
        }
    }

    fn options_at(x: f64, y: f64) -> DragOptions {
        DragOptions {
            initial_position: Point::new(x, y),
            ..Default::default()
        }
    }

    #[test]
    fn test_basic_drag() {
        let f = fixture();
        let mut engine = Draggable::new(f.element, f.scope.clone(), options_at(50.0, 50.0));
        drag(&f, &mut engine, Point::new(100.0, 100.0), &[Point::new(150.0, 130.0)]);

        assert!(engine.is_dragging());
        assert_eq!(f.scope.snapshot().drag_position, Some(Point::new(100.0, 80.0)));
        engine.handle_event(&f.dom, &PointerEvent::up(Point::new(150.0, 130.0), at(&f, 5)));
        assert_eq!(engine.position(), Point::new(100.0, 80.0));
        assert!(!engine.is_dragging());
        assert!(!f.scope.is_dragging());
    }

    #[test]
    fn test_axis_and_grid() {
        let f = fixture();
        let mut engine = Draggable::new(
            f.element,
            f.scope.clone(),
            DragOptions {
                axis: Axis::X.into(),
                grid: Some(Grid::uniform(20.0)).into(),
                ..options_at(40.0, 40.0)
            },
        );
        drag(&f, &mut engine, Point::new(0.0, 0.0), &[Point::new(27.0, 90.0)]);
        assert_eq!(engine.position(), Point::new(60.0, 40.0));
    }

    #[test]
    fn test_scale_divides_delta() {
        let f = fixture();
        let mut engine = Draggable::new(
            f.element,
            f.scope.clone(),
            DragOptions {
                scale: 2.0.into(),
                ..options_at(10.0, 10.0)
            },
        );
        drag(&f, &mut engine, Point::new(0.0, 0.0), &[Point::new(40.0, -20.0)]);
        assert_eq!(engine.position(), Point::new(30.0, 0.0));
    }

    #[test]
    fn test_bounds_hold_on_every_frame() {
        let f = fixture();
        let mut engine = Draggable::new(
            f.element,
            f.scope.clone(),
            DragOptions {
                bounds: Some(f.container).into(),
                ..options_at(50.0, 50.0)
            },
        );
        engine.handle_event(&f.dom, &PointerEvent::down(Point::new(60.0, 60.0), Some(f.element), f.now));
        for i in 0..40 {
            let wobble = if i % 2 == 0 { 1.0 } else { -1.0 };
            let p = Point::new(60.0 + wobble * 37.0 * i as f64, 60.0 - wobble * 23.0 * i as f64);
            engine.handle_event(&f.dom, &PointerEvent::moved(p, at(&f, i + 1)));
            let pos = engine.position();
            assert!((0.0..=250.0).contains(&pos.x), "x {pos:?}");
            assert!((0.0..=250.0).contains(&pos.y), "y {pos:?}");
        }
    }

    #[test]
    fn test_start_callback_cancels_before_lock() {
        let f = fixture();
        let mut engine = Draggable::new(
            f.element,
            f.scope.clone(),
            DragOptions {
                on_drag_start: Some(Rc::new(|_: &DragEventData| Outcome::Cancel)),
                ..Default::default()
            },
        );
        drag(&f, &mut engine, Point::ZERO, &[Point::new(10.0, 10.0)]);
        assert!(!engine.is_dragging());
        assert!(!f.scope.is_dragging());
        assert_eq!(engine.position(), Point::ZERO);
    }

    #[test]
    fn test_frame_callback_drops_frame() {
        let f = fixture();
        let mut engine = Draggable::new(
            f.element,
            f.scope.clone(),
            DragOptions {
                on_drag: Some(Rc::new(|d: &DragEventData| Outcome::from(d.position.x < 30.0))),
                ..Default::default()
            },
        );
        drag(&f, &mut engine, Point::ZERO, &[Point::new(20.0, 0.0), Point::new(40.0, 0.0)]);
        assert_eq!(engine.position(), Point::new(20.0, 0.0));
        assert!(engine.is_dragging());
    }

    #[test]
    fn test_end_callback_and_cancel_phase() {
        let f = fixture();
        let ended = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&ended);
        let mut engine = Draggable::new(
            f.element,
            f.scope.clone(),
            DragOptions {
                on_drag_end: Some(Rc::new(move |d: &DragEventData| *sink.borrow_mut() = Some(d.position))),
                ..Default::default()
            },
        );
        drag(&f, &mut engine, Point::ZERO, &[Point::new(5.0, 5.0)]);
        engine.handle_event(
            &f.dom,
            &PointerEvent::new(PointerPhase::Cancel, Point::new(5.0, 5.0), at(&f, 9)),
        );
        assert_eq!(*ended.borrow(), Some(Point::new(5.0, 5.0)));
        assert!(!f.scope.is_dragging());
    }

    #[test]
    fn test_end_callback_reports_release_point() {
        let f = fixture();
        let ended = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&ended);
        let mut engine = Draggable::new(
            f.element,
            f.scope.clone(),
            DragOptions {
                on_drag_end: Some(Rc::new(move |d: &DragEventData| *sink.borrow_mut() = Some((d.position, d.pointer)))),
                ..Default::default()
            },
        );
        drag(&f, &mut engine, Point::ZERO, &[Point::new(5.0, 5.0)]);
        engine.handle_event(&f.dom, &PointerEvent::up(Point::new(7.0, 9.0), at(&f, 9)));
        assert_eq!(*ended.borrow(), Some((Point::new(5.0, 5.0), Point::new(7.0, 9.0))));
    }

    #[test]
    fn test_throttle_trailing_frame_flushed_on_release() {
        let f = fixture();
        let mut engine = Draggable::new(
            f.element,
            f.scope.clone(),
            DragOptions {
                throttle: 50.into(),
                ..Default::default()
            },
        );
        engine.handle_event(&f.dom, &PointerEvent::down(Point::ZERO, Some(f.element), f.now));
        engine.handle_event(&f.dom, &PointerEvent::moved(Point::new(10.0, 0.0), at(&f, 1)));
        engine.handle_event(&f.dom, &PointerEvent::moved(Point::new(20.0, 0.0), at(&f, 2)));
        engine.handle_event(&f.dom, &PointerEvent::moved(Point::new(30.0, 0.0), at(&f, 3)));
        assert_eq!(engine.position(), Point::new(10.0, 0.0));

        engine.poll(&f.dom, at(&f, 20));
        assert_eq!(engine.position(), Point::new(10.0, 0.0));
        engine.poll(&f.dom, at(&f, 60));
        assert_eq!(engine.position(), Point::new(30.0, 0.0));

        engine.handle_event(&f.dom, &PointerEvent::moved(Point::new(45.0, 0.0), at(&f, 61)));
        engine.handle_event(&f.dom, &PointerEvent::up(Point::new(45.0, 0.0), at(&f, 62)));
        assert_eq!(engine.position(), Point::new(45.0, 0.0));
    }

    #[test]
    fn test_rejected_while_resizing_or_on_handle() {
        let mut f = fixture();
        let handle_node = f.dom.create_element("div");
        f.dom.append_child(f.element, handle_node).unwrap();
        f.scope.register_handle_element(handle_node);

        let mut engine = Draggable::new(f.element, f.scope.clone(), DragOptions::default());
        engine.handle_event(&f.dom, &PointerEvent::down(Point::ZERO, Some(handle_node), f.now));
        assert!(!engine.is_dragging());

        f.scope.set_hover_handle(f.element, Some(HandlePosition::Right));
        engine.handle_event(&f.dom, &PointerEvent::down(Point::ZERO, Some(f.element), f.now));
        assert!(!engine.is_dragging());
        f.scope.set_hover_handle(f.element, None);

        let other = ElementId::new();
        assert!(f.scope.try_begin_resize(other, HandlePosition::Right, Size::new(1.0, 1.0)));
        engine.handle_event(&f.dom, &PointerEvent::down(Point::ZERO, Some(f.element), f.now));
        assert!(!engine.is_dragging());
    }

    #[test]
    fn test_only_one_drag_per_scope() {
        let mut f = fixture();
        let body = f.dom.body();
        let second_el = f.dom.spawn(body, "div", Rect::new(400.0, 0.0, 450.0, 50.0)).unwrap();
        let mut first = Draggable::new(f.element, f.scope.clone(), DragOptions::default());
        let mut second = Draggable::new(second_el, f.scope.clone(), DragOptions::default());

        first.handle_event(&f.dom, &PointerEvent::down(Point::ZERO, Some(f.element), f.now));
        second.handle_event(&f.dom, &PointerEvent::down(Point::new(410.0, 5.0), Some(second_el), f.now));
        assert!(first.is_dragging());
        assert!(!second.is_dragging());
        assert_eq!(f.scope.dragging_element(), Some(f.element));
    }

    #[test]
    fn test_click_activation_gates_drag() {
        let f = fixture();
        let mut engine = Draggable::new(
            f.element,
            f.scope.clone(),
            DragOptions {
                activation: ActivationOptions {
                    trigger: ActivationTrigger::Click.into(),
                    ..Default::default()
                },
                disabled: Reactive::dynamic(|| false),
                ..Default::default()
            },
        );
        assert!(!engine.is_active());
        engine.handle_event(&f.dom, &PointerEvent::down(Point::ZERO, Some(f.element), f.now));
        assert!(engine.is_active());
        assert!(engine.is_dragging());
    }

    #[test]
    fn test_style_projection() {
        let f = fixture();
        let mut engine = Draggable::new(f.element, f.scope.clone(), options_at(12.0, 34.0));
        let style = engine.style();
        assert_eq!(style.get("position"), Some("absolute"));
        assert_eq!(style.get("left"), Some("12px"));
        assert_eq!(style.get("top"), Some("34px"));
        assert_eq!(style.get("cursor"), Some("grab"));
        assert_eq!(style.get("z-index"), None);

        drag(&f, &mut engine, Point::ZERO, &[Point::new(1.0, 1.0)]);
        let style = engine.style();
        assert_eq!(style.get("cursor"), Some("grabbing"));
        assert_eq!(style.get("z-index"), Some("9999"));

        engine.options_mut().position_type = PositionType::Relative.into();
        assert_eq!(engine.style().get("transform"), Some("translate(13px, 35px)"));
    }

    #[test]
    fn test_state_styles_layering() {
        let f = fixture();
        let mut engine = Draggable::new(
            f.element,
            f.scope.clone(),
            DragOptions {
                state_styles: StateStyles {
                    default: StyleMap::new().with("opacity", "1"),
                    dragging: StyleMap::new().with("opacity", "0.5"),
                    ..Default::default()
                },
                ..Default::default()
            },
        );
        assert_eq!(engine.style().get("opacity"), Some("1"));
        drag(&f, &mut engine, Point::ZERO, &[]);
        assert_eq!(engine.style().get("opacity"), Some("0.5"));
    }

    #[test]
    fn test_unmount_removes_every_listener() {
        let mut f = fixture();
        let mut engine = Draggable::new(
            f.element,
            f.scope.clone(),
            DragOptions {
                activation: ActivationOptions {
                    trigger: ActivationTrigger::Hover.into(),
                    ..Default::default()
                },
                ..Default::default()
            },
        );
        engine.mount(&mut f.dom).unwrap();
        assert_eq!(f.dom.listener_count(), 6);
        engine.unmount(&mut f.dom);
        assert_eq!(f.dom.listener_count(), 0);
    }

    #[test]
    fn test_options_from_json() {
        let options: DragOptions =
            crate::options::from_json(r#"{"initialPosition": {"x": 5, "y": 6}, "axis": "y", "grid": [10, 10], "throttle": 16}"#)
                .unwrap();
        assert_eq!(options.initial_position, Point::new(5.0, 6.0));
        assert_eq!(options.axis.get(), Axis::Y);
        assert_eq!(options.grid.get(), Some(Grid::uniform(10.0)));
        assert_eq!(options.throttle.get(), 16);
    }
}
