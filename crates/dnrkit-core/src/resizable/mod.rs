//! Pointer-driven resize engine.

mod arena;
mod compute;

pub use arena::{HANDLE_CLASS, HandleArena, HandleStrategy, HandleStyles, locate_border};
pub use compute::{ResizeInput, ResizeOutput, compute_resize};

use crate::activation::{Activation, ActivationOptions};
use crate::dom::{Dom, DomResult, ElementId, EventKind, ListenTarget, ListenerId};
use crate::geometry::{ElementSize, PositionType, SizeLimits, SizeValue, px};
use crate::handle::{HandlePosition, HandleType};
use crate::input::{Instant, PointerEvent, PointerPhase};
use crate::options::{Notify, Reactive, Veto, ask};
use crate::snap::Grid;
use crate::store::InteractionScope;
use crate::style::StyleMap;
use crate::throttle::Throttle;
use kurbo::{Point, Size};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

/// Payload of resize callbacks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeEventData {
    pub element: ElementId,
    pub handle: HandlePosition,
    /// Element size (the proposed one for `on_resize`).
    pub size: Size,
    pub position: Point,
}

#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResizeOptions {
    pub initial_size: ElementSize,
    pub initial_position: Point,
    pub position_type: Reactive<PositionType>,
    pub handle_type: Reactive<HandleType>,
    /// Enabled handles.
    pub handles: Reactive<Vec<HandlePosition>>,
    /// Side length of engine-created handle nodes.
    pub handle_size: Reactive<f64>,
    /// Width of the border zones used by [`HandleType::Borders`].
    pub border_threshold: Reactive<f64>,
    pub handle_styles: HandleStyles,
    #[serde(skip)]
    pub custom_handles: Reactive<BTreeMap<HandlePosition, ElementId>>,
    #[serde(flatten)]
    pub limits: Reactive<SizeLimits>,
    pub lock_aspect_ratio: Reactive<bool>,
    pub grid: Reactive<Option<Grid>>,
    #[serde(skip)]
    pub bounds: Reactive<Option<ElementId>>,
    pub scale: Reactive<f64>,
    pub throttle: Reactive<u64>,
    pub disabled: Reactive<bool>,
    pub activation: ActivationOptions,
    #[serde(skip)]
    pub on_resize_start: Option<Veto<ResizeEventData>>,
    #[serde(skip)]
    pub on_resize: Option<Veto<ResizeEventData>>,
    #[serde(skip)]
    pub on_resize_end: Option<Notify<ResizeEventData>>,
}

impl Default for ResizeOptions {
    fn default() -> Self {
        Self {
            initial_size: ElementSize::auto(),
            initial_position: Point::ZERO,
            position_type: PositionType::Absolute.into(),
            handle_type: HandleType::Borders.into(),
            handles: HandlePosition::ALL.to_vec().into(),
            handle_size: 8.0.into(),
            border_threshold: 8.0.into(),
            handle_styles: HandleStyles::default(),
            custom_handles: BTreeMap::new().into(),
            limits: SizeLimits::default().into(),
            lock_aspect_ratio: false.into(),
            grid: None.into(),
            bounds: None.into(),
            scale: 1.0.into(),
            throttle: 0.into(),
            disabled: false.into(),
            activation: ActivationOptions::default(),
            on_resize_start: None,
            on_resize: None,
            on_resize_end: None,
        }
    }
}

impl fmt::Debug for ResizeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResizeOptions")
            .field("initial_size", &self.initial_size)
            .field("initial_position", &self.initial_position)
            .field("handle_type", &self.handle_type)
            .field("handles", &self.handles)
            .field("limits", &self.limits)
            .field("lock_aspect_ratio", &self.lock_aspect_ratio)
            .field("grid", &self.grid)
            .finish_non_exhaustive()
    }
}

impl ResizeOptions {
    fn scale(&self) -> f64 {
        let scale = self.scale.get();
        if scale.is_finite() && scale > 0.0 { scale } else { 1.0 }
    }

    fn throttle_interval(&self) -> Duration {
        Duration::from_millis(self.throttle.get())
    }
}

#[derive(Debug, Clone, Copy)]
struct ResizeGesture {
    handle: HandlePosition,
    start_pointer: Point,
    start_size: Size,
    start_position: Point,
    aspect_ratio: Option<f64>,
}

/// What the handle nodes were last built for.
#[derive(Debug, Clone, PartialEq)]
struct HandleSetup {
    handle_type: HandleType,
    handles: Vec<HandlePosition>,
    custom: BTreeMap<HandlePosition, ElementId>,
}

/// Makes one element resizable.
pub struct Resizable {
    element: ElementId,
    scope: InteractionScope,
    activation: Rc<Activation>,
    owns_activation: bool,
    options: ResizeOptions,
    size: ElementSize,
    position: Point,
    gesture: Option<ResizeGesture>,
    hover_handle: Option<HandlePosition>,
    strategy: HandleStrategy,
    setup: Option<HandleSetup>,
    registered: BTreeMap<HandlePosition, ElementId>,
    throttle: Throttle<Point>,
    listeners: Vec<ListenerId>,
}

impl fmt::Debug for Resizable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resizable")
            .field("element", &self.element)
            .field("size", &self.size)
            .field("position", &self.position)
            .field("active_handle", &self.active_handle())
            .field("hover_handle", &self.hover_handle)
            .finish_non_exhaustive()
    }
}

impl Resizable {
    pub fn new(element: ElementId, scope: InteractionScope, options: ResizeOptions) -> Self {
        let activation = Rc::new(Activation::new(element, scope.clone(), options.activation.clone()));
        Self::build(element, scope, activation, true, options)
    }

    /// Create an engine driven by an activation owned elsewhere.
    pub fn with_activation(element: ElementId, activation: Rc<Activation>, options: ResizeOptions) -> Self {
        let scope = activation.scope().clone();
        Self::build(element, scope, activation, false, options)
    }

    fn build(
        element: ElementId,
        scope: InteractionScope,
        activation: Rc<Activation>,
        owns_activation: bool,
        options: ResizeOptions,
    ) -> Self {
        Self {
            element,
            scope,
            activation,
            owns_activation,
            size: options.initial_size,
            position: options.initial_position,
            options,
            gesture: None,
            hover_handle: None,
            strategy: HandleStrategy::None,
            setup: None,
            registered: BTreeMap::new(),
            throttle: Throttle::new(),
            listeners: Vec::new(),
        }
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn size(&self) -> ElementSize {
        self.size
    }

    /// Numeric size, measuring the element for `auto` axes.
    pub fn resolved_size(&self, dom: &dyn Dom) -> Size {
        let scale = self.options.scale();
        let measured = dom
            .rect(self.element)
            .map(|r| Size::new(r.width() / scale, r.height() / scale))
            .unwrap_or(Size::ZERO);
        self.size.resolve(measured)
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn is_resizing(&self) -> bool {
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

    pub fn active_handle(&self) -> Option<HandlePosition> {
        self.gesture.map(|g| g.handle)
    }

    pub fn hover_handle(&self) -> Option<HandlePosition> {
        self.hover_handle
    }

    pub fn options(&self) -> &ResizeOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut ResizeOptions {
        &mut self.options
    }

    /// Handle node for a position, when nodes are built.
    pub fn handle_element(&self, position: HandlePosition) -> Option<ElementId> {
        self.strategy.arena()?.element_of(position)
    }

    pub fn set_size(&mut self, size: ElementSize) {
        self.size = size;
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    /// Supply a node for a custom handle, replacing any previous node.
    pub fn register_handle(&mut self, dom: &mut dyn Dom, position: HandlePosition, element: ElementId) -> DomResult<()> {
        self.registered.insert(position, element);
        let custom_built = self.setup.as_ref().is_some_and(|s| s.handle_type == HandleType::Custom);
        if let (true, Some(arena)) = (custom_built, self.strategy.arena_mut()) {
            arena.register(dom, &self.scope, position, element)?;
            if let Some(setup) = &mut self.setup {
                setup.custom.insert(position, element);
            }
        }
        Ok(())
    }

    pub fn unregister_handle(&mut self, dom: &mut dyn Dom, position: HandlePosition) -> bool {
        let known = self.registered.remove(&position).is_some();
        let released = self
            .strategy
            .arena_mut()
            .is_some_and(|arena| arena.unregister(dom, &self.scope, position));
        if let Some(setup) = &mut self.setup {
            setup.custom.remove(&position);
        }
        known || released
    }

    /// Register listeners, join the scope and build handles.
    pub fn mount(&mut self, dom: &mut dyn Dom) -> DomResult<()> {
        if !self.listeners.is_empty() {
            return Ok(());
        }
        if self.owns_activation {
            self.activation.mount(dom)?;
        } else {
            self.scope.attach(self.element);
        }
        let wanted = [
            (ListenTarget::Document, EventKind::PointerDown),
            (ListenTarget::Document, EventKind::PointerMove),
            (ListenTarget::Document, EventKind::PointerUp),
            (ListenTarget::Document, EventKind::PointerCancel),
        ];
        for (target, kind) in wanted {
            self.listeners.push(dom.add_listener(target, kind)?);
        }
        self.refresh(dom);
        Ok(())
    }

    /// Remove every listener and handle node and leave the scope.
    pub fn unmount(&mut self, dom: &mut dyn Dom) {
        for id in self.listeners.drain(..) {
            dom.remove_listener(id);
        }
        self.strategy.teardown(dom, &self.scope);
        self.setup = None;
        if self.gesture.take().is_some() {
            self.scope.end_resize(self.element);
        }
        self.set_hover(None);
        self.throttle.reset();
        if self.owns_activation {
            self.activation.unmount(dom);
        } else {
            self.scope.detach(self.element);
        }
    }

    /// Bring handle nodes in line with activation and options.
    ///
    /// Nodes are built while the element is active and rebuilt when the handle
    /// type or list changes; they are torn down as soon as the element becomes
    /// inactive.
    pub fn refresh(&mut self, dom: &mut dyn Dom) {
        let enabled = self.activation.is_active() && !self.options.disabled.get();
        let wanted = enabled.then(|| {
            let mut custom = self.options.custom_handles.get();
            custom.extend(self.registered.iter().map(|(&p, &e)| (p, e)));
            HandleSetup {
                handle_type: self.options.handle_type.get(),
                handles: self.options.handles.get(),
                custom,
            }
        });

        if wanted != self.setup {
            self.strategy.teardown(dom, &self.scope);
            if let Some(setup) = &wanted {
                if let Err(err) = self.build_strategy(dom, setup) {
                    log::warn!("Failed to build resize handles for {}: {err}", self.element);
                    self.strategy.teardown(dom, &self.scope);
                }
            }
            if wanted.is_none() {
                self.set_hover(None);
            }
            self.setup = wanted;
        }

        if let HandleStrategy::Borders { threshold } = &mut self.strategy {
            *threshold = self.options.border_threshold.get();
        }
        if let Err(err) = self.layout_handles(dom) {
            log::warn!("Failed to lay out resize handles for {}: {err}", self.element);
        }
    }

    fn build_strategy(&mut self, dom: &mut dyn Dom, setup: &HandleSetup) -> DomResult<()> {
        match setup.handle_type {
            HandleType::None => {
                self.strategy = HandleStrategy::None;
                Ok(())
            }
            HandleType::Borders => {
                self.strategy = HandleStrategy::Borders {
                    threshold: self.options.border_threshold.get(),
                };
                Ok(())
            }
            HandleType::Handles => {
                let mut arena = HandleArena::new();
                let result = arena.build(dom, &self.scope, self.element, &setup.handles);
                self.strategy = HandleStrategy::Nodes(arena);
                result
            }
            HandleType::Custom => {
                let mut arena = HandleArena::new();
                let result = setup
                    .custom
                    .iter()
                    .filter(|(p, _)| setup.handles.contains(p))
                    .try_for_each(|(&position, &node)| arena.register(dom, &self.scope, position, node));
                self.strategy = HandleStrategy::Nodes(arena);
                result
            }
        }
    }

    fn layout_handles(&self, dom: &mut dyn Dom) -> DomResult<()> {
        let Some(arena) = self.strategy.arena() else {
            return Ok(());
        };
        let size = self.resolved_size(dom);
        arena.layout(
            dom,
            size,
            self.options.handle_size.get(),
            &self.options.handle_styles,
            self.hover_handle,
            self.active_handle(),
        )
    }

    fn set_hover(&mut self, handle: Option<HandlePosition>) {
        if self.hover_handle != handle {
            self.hover_handle = handle;
            self.scope.set_hover_handle(self.element, handle);
        }
    }

    /// Feed a pointer event.
    pub fn handle_event(&mut self, dom: &mut dyn Dom, event: &PointerEvent) {
        if self.owns_activation {
            self.activation.handle_event(dom, event);
        }
        self.refresh(dom);
        if !self.activation.accepts(event.pointer_type) {
            return;
        }
        match event.phase {
            PointerPhase::Down => self.pointer_down(dom, event),
            PointerPhase::Move if self.gesture.is_some() => {
                if let Some(pointer) = self
                    .throttle
                    .submit(event.position, event.timestamp, self.options.throttle_interval())
                {
                    self.apply_frame(dom, pointer);
                }
            }
            PointerPhase::Move => self.update_hover(dom, event),
            PointerPhase::Up | PointerPhase::Cancel => self.pointer_up(dom),
            PointerPhase::Enter | PointerPhase::Leave => {}
        }
        if let Err(err) = self.layout_handles(dom) {
            log::warn!("Failed to lay out resize handles for {}: {err}", self.element);
        }
    }

    /// Deliver a throttled trailing frame once its interval has elapsed.
    pub fn poll(&mut self, dom: &mut dyn Dom, now: Instant) {
        if self.gesture.is_none() {
            return;
        }
        if let Some(pointer) = self.throttle.poll(now, self.options.throttle_interval()) {
            self.apply_frame(dom, pointer);
            if let Err(err) = self.layout_handles(dom) {
                log::warn!("Failed to lay out resize handles for {}: {err}", self.element);
            }
        }
    }

    fn can_start(&self) -> bool {
        !self.options.disabled.get() && self.activation.is_active()
    }

    fn update_hover(&mut self, dom: &dyn Dom, event: &PointerEvent) {
        let handle = if self.can_start() {
            self.strategy
                .locate(dom, self.element, event, &self.options.handles.get())
        } else {
            None
        };
        self.set_hover(handle);
    }

    fn pointer_down(&mut self, dom: &dyn Dom, event: &PointerEvent) {
        if self.gesture.is_some() {
            return;
        }
        if !self.can_start() {
            log::trace!("Resize of {} ignored: disabled or inactive", self.element);
            return;
        }
        if self.scope.is_dragging() {
            log::trace!("Resize of {} ignored: drag in progress", self.element);
            return;
        }
        let Some(handle) = self
            .strategy
            .locate(dom, self.element, event, &self.options.handles.get())
        else {
            return;
        };

        let start_size = self.resolved_size(dom);
        let data = ResizeEventData {
            element: self.element,
            handle,
            size: start_size,
            position: self.position,
        };
        if ask(&self.options.on_resize_start, &data).is_cancel() {
            log::debug!("Resize of {} cancelled by on_resize_start", self.element);
            return;
        }
        if !self.scope.try_begin_resize(self.element, handle, start_size) {
            log::debug!("Resize of {} rejected: scope busy", self.element);
            return;
        }
        let aspect_ratio = (self.options.lock_aspect_ratio.get() && start_size.height > 0.0)
            .then(|| start_size.width / start_size.height);
        self.throttle.reset();
        self.set_hover(Some(handle));
        self.gesture = Some(ResizeGesture {
            handle,
            start_pointer: event.position,
            start_size,
            start_position: self.position,
            aspect_ratio,
        });
    }

    fn pointer_up(&mut self, dom: &dyn Dom) {
        let Some(gesture) = self.gesture else {
            return;
        };
        if let Some(pointer) = self.throttle.flush() {
            self.apply_frame(dom, pointer);
        }
        self.gesture = None;
        self.scope.end_resize(self.element);
        self.set_hover(None);
        if let Some(on_end) = &self.options.on_resize_end {
            on_end(&ResizeEventData {
                element: self.element,
                handle: gesture.handle,
                size: self.size.resolve(gesture.start_size),
                position: self.position,
            });
        }
    }

    fn apply_frame(&mut self, dom: &dyn Dom, pointer: Point) {
        let Some(gesture) = self.gesture else {
            return;
        };
        let scale = self.options.scale();
        let bounds = self.options.bounds.get().and_then(|b| match dom.rect(b) {
            Some(rect) => Some(Size::new(rect.width() / scale, rect.height() / scale)),
            None => {
                log::debug!("Bounds of {} not measurable, skipping clamp", self.element);
                None
            }
        });
        let out = compute_resize(&ResizeInput {
            handle: gesture.handle,
            start_size: gesture.start_size,
            start_position: gesture.start_position,
            delta: (pointer - gesture.start_pointer) / scale,
            bounds,
            limits: self.options.limits.get(),
            aspect_ratio: gesture.aspect_ratio,
            grid: self.options.grid.get().filter(Grid::is_enabled),
        });

        let data = ResizeEventData {
            element: self.element,
            handle: gesture.handle,
            size: out.size,
            position: out.position,
        };
        if ask(&self.options.on_resize, &data).is_cancel() {
            return;
        }
        self.size = ElementSize::px(out.size.width, out.size.height);
        self.position = out.position;
        self.scope.update_resize(self.element, out.size);
    }

    /// Inline styles for the current state.
    pub fn style(&self) -> StyleMap {
        let mut style = StyleMap::new();
        let position_type = self.options.position_type.get();
        style.set("position", position_type.as_css());
        style.set("width", size_css(self.size.width));
        style.set("height", size_css(self.size.height));
        if position_type == PositionType::Absolute {
            style.set("left", px(self.position.x)).set("top", px(self.position.y));
        }
        if let Some(handle) = self.active_handle().or(self.hover_handle) {
            style.set("cursor", handle.cursor());
        }
        if self.is_resizing() {
            style.set("user-select", "none");
        }
        style
    }

    /// Write [`style`](Self::style) to the element.
    pub fn apply_style(&self, dom: &mut dyn Dom) -> DomResult<()> {
        self.style().apply(dom, self.element)
    }
}

fn size_css(value: SizeValue) -> String {
    match value {
        SizeValue::Px(v) => px(v),
        SizeValue::Auto => "auto".to_string(),
    }
}
