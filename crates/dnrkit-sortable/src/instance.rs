//! Drag engine of one sortable list.
//!
//! A gesture runs `Idle -> Chosen -> Dragging -> Idle`, with an optional
//! `Pending` step while a press delay runs. Fallback mode (forced, touch, or
//! a host without platform drag) moves a ghost under pointer events; native
//! mode follows the platform's drag events. Items only ever move through
//! `Dom::insert_before`.

use crate::animation::AnimationManager;
use crate::autoscroll::AutoScroll;
use crate::context::{ListEntry, SortableContext};
use crate::error::{SortableError, SortableResult};
use crate::events::{EventDispatcher, MoveEvent, MoveOutcome, SortableEvent, SortableEventType};
use crate::ghost::{Ghost, GhostClasses};
use crate::group::PullMode;
use crate::options::{DataTransfer, Direction, SortableOptions};
use crate::swap::{SwapConfig, SwapSide, detect_direction, swap_side};
use dnrkit_core::input::MouseButton;
use dnrkit_core::{
    Dom, DomEvent, ElementId, EventKind, Instant, ListenTarget, ListenerId, NativeDragEvent, NativeDragPhase,
    PointerEvent, PointerPhase, PointerType,
};
use kurbo::Point;
use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::time::Duration;

/// Events a list listens for while mounted.
const LIST_EVENTS: [EventKind; 5] = [
    EventKind::PointerDown,
    EventKind::DragStart,
    EventKind::DragOver,
    EventKind::Drop,
    EventKind::DragEnd,
];

/// Document events followed between press and release.
const GESTURE_EVENTS: [EventKind; 3] = [EventKind::PointerMove, EventKind::PointerUp, EventKind::PointerCancel];

#[derive(Debug, Clone)]
struct Press {
    item: ElementId,
    start: Point,
    fallback: bool,
}

#[derive(Debug)]
struct DragState {
    item: ElementId,
    fallback: bool,
    /// List the item currently sits in.
    parent: ElementId,
    /// Original next sibling, used to put the item or its clone back.
    next_sibling: Option<ElementId>,
    old_index: Option<usize>,
    old_draggable_index: Option<usize>,
    ghost: Option<Ghost>,
    clone: Option<ElementId>,
    clone_shown: bool,
    pull_mode: Option<PullMode>,
    /// List under the pointer at the last move; `None` once outside every list.
    over_list: Option<ElementId>,
    transfer: DataTransfer,
}

impl DragState {
    /// Elements of this drag that never count as items.
    fn transient(&self) -> Vec<ElementId> {
        self.ghost.iter().map(Ghost::element).chain(self.clone).collect()
    }
}

#[derive(Debug, Default)]
enum Phase {
    #[default]
    Idle,
    Pending { press: Press, ready_at: Instant },
    Chosen(Press),
    Dragging(Box<DragState>),
}

/// Nearest direct child of `list` at or above `element` that matches the item
/// selector.
fn item_of(dom: &dyn Dom, list: ElementId, selector: &str, element: ElementId) -> Option<ElementId> {
    let mut current = Some(element);
    while let Some(el) = current {
        if el == list {
            return None;
        }
        let parent = dom.parent(el);
        if parent == Some(list) {
            return dom.matches_in(el, selector, Some(list)).then_some(el);
        }
        current = parent;
    }
    None
}

fn list_items(dom: &dyn Dom, list: ElementId, selector: &str, exclude: &[ElementId]) -> Vec<ElementId> {
    dom.children(list)
        .into_iter()
        .filter(|c| !exclude.contains(c) && dom.matches_in(*c, selector, Some(list)))
        .collect()
}

/// Index of `element` among the children of `list`, skipping `exclude` and,
/// when given, children not matching `selector`.
fn index_in(
    dom: &dyn Dom,
    list: ElementId,
    element: ElementId,
    selector: Option<&str>,
    exclude: &[ElementId],
) -> Option<usize> {
    dom.children(list)
        .into_iter()
        .filter(|c| !exclude.contains(c))
        .filter(|c| selector.is_none_or(|s| dom.matches_in(*c, s, Some(list))))
        .position(|c| c == element)
}

fn travel(from: Point, to: Point) -> f64 {
    (to.x - from.x).abs().max((to.y - from.y).abs())
}

/// One sortable list.
pub struct Sortable {
    list: ElementId,
    context: SortableContext,
    options: Rc<RefCell<SortableOptions>>,
    events: Rc<EventDispatcher>,
    animation: Rc<RefCell<AnimationManager>>,
    phase: Phase,
    listeners: Vec<ListenerId>,
    gesture_listeners: Vec<ListenerId>,
    selected: Vec<ElementId>,
}

impl std::fmt::Debug for Sortable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sortable")
            .field("list", &self.list)
            .field("phase", &self.phase)
            .field("selected", &self.selected)
            .finish_non_exhaustive()
    }
}

impl Sortable {
    pub fn new(list: ElementId, context: SortableContext, options: SortableOptions) -> Self {
        let animation = AnimationManager::new(list, options.animation, options.easing.clone());
        Self {
            list,
            context,
            options: Rc::new(RefCell::new(options)),
            events: Rc::new(EventDispatcher::new()),
            animation: Rc::new(RefCell::new(animation)),
            phase: Phase::Idle,
            listeners: Vec::new(),
            gesture_listeners: Vec::new(),
            selected: Vec::new(),
        }
    }

    pub fn list(&self) -> ElementId {
        self.list
    }

    pub fn context(&self) -> &SortableContext {
        &self.context
    }

    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }

    pub fn options(&self) -> Ref<'_, SortableOptions> {
        self.options.borrow()
    }

    pub fn animation(&self) -> Ref<'_, AnimationManager> {
        self.animation.borrow()
    }

    pub fn is_mounted(&self) -> bool {
        !self.listeners.is_empty()
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, Phase::Dragging(_))
    }

    /// Item held by the current gesture, chosen or dragged.
    pub fn drag_element(&self) -> Option<ElementId> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Pending { press, .. } | Phase::Chosen(press) => Some(press.item),
            Phase::Dragging(state) => Some(state.item),
        }
    }

    /// Payload set for a platform drag in progress.
    pub fn data_transfer(&self) -> Option<&DataTransfer> {
        match &self.phase {
            Phase::Dragging(state) if !state.fallback => Some(&state.transfer),
            _ => None,
        }
    }

    pub fn selected(&self) -> &[ElementId] {
        &self.selected
    }

    fn snapshot(&self) -> SortableOptions {
        self.options.borrow().clone()
    }

    /// Read an option by name.
    pub fn option(&self, name: &str) -> Option<serde_json::Value> {
        self.options.borrow().get(name)
    }

    /// Write an option by name. Group and animation changes take effect
    /// immediately.
    pub fn set_option(&mut self, name: &str, value: serde_json::Value) -> SortableResult<()> {
        self.options.borrow_mut().set(name, value)?;
        let options = self.snapshot();
        match name {
            "group" => self.context.update_group(self.list, options.group),
            "animation" | "easing" => self.animation.borrow_mut().set_timing(options.animation, options.easing),
            _ => {}
        }
        Ok(())
    }

    /// Register with the context and attach list listeners.
    pub fn mount(&mut self, dom: &mut dyn Dom) -> SortableResult<()> {
        if self.is_mounted() {
            return Ok(());
        }
        self.context.register_list(
            self.list,
            ListEntry {
                options: Rc::clone(&self.options),
                events: Rc::clone(&self.events),
                animation: Rc::clone(&self.animation),
            },
        );
        for kind in LIST_EVENTS {
            match dom.add_listener(ListenTarget::Element(self.list), kind) {
                Ok(id) => self.listeners.push(id),
                Err(err) => {
                    self.unmount(dom);
                    return Err(err.into());
                }
            }
        }
        log::debug!("Mounted sortable list {}", self.list);
        Ok(())
    }

    /// Abort any gesture and detach everything the list added.
    pub fn unmount(&mut self, dom: &mut dyn Dom) {
        self.abort(dom);
        self.animation.borrow_mut().cancel(dom);
        let selected_class = self.options.borrow().selected_class.clone();
        for item in self.selected.drain(..) {
            if dom.exists(item) {
                if let Err(err) = dom.remove_class(item, &selected_class) {
                    log::debug!("Failed to clear selection of {item}: {err}");
                }
            }
        }
        for id in self.listeners.drain(..) {
            dom.remove_listener(id);
        }
        self.context.unregister_list(self.list);
        log::debug!("Unmounted sortable list {}", self.list);
    }

    /// Feed a host event. Returns true when the host should prevent the
    /// event's default action.
    pub fn handle_event(&mut self, dom: &mut dyn Dom, event: &DomEvent) -> bool {
        match event {
            DomEvent::Pointer(pointer) => match pointer.phase {
                PointerPhase::Down => self.pointer_down(dom, pointer, event),
                PointerPhase::Move => self.pointer_move(dom, pointer, event),
                PointerPhase::Up | PointerPhase::Cancel => self.pointer_up(dom, event),
                PointerPhase::Enter | PointerPhase::Leave => false,
            },
            DomEvent::Drag(drag) => self.native_drag(dom, drag, event),
        }
    }

    /// Expire a press delay and advance animations.
    pub fn poll(&mut self, dom: &mut dyn Dom, now: Instant) {
        let expired = matches!(&self.phase, Phase::Pending { ready_at, .. } if now >= *ready_at);
        if expired {
            if let Phase::Pending { press, .. } = std::mem::take(&mut self.phase) {
                self.choose(dom, press, None);
            }
        }
        self.animation.borrow_mut().tick(dom, now);
    }

    /// Items of the list in DOM order.
    pub fn items(&self, dom: &dyn Dom) -> Vec<ElementId> {
        let selector = self.options.borrow().item_selector(dom, self.list);
        let exclude = match &self.phase {
            Phase::Dragging(state) => state.transient(),
            _ => Vec::new(),
        };
        list_items(dom, self.list, &selector, &exclude)
    }

    /// Ids of the items: the `data_id_attr` attribute, else the element id.
    pub fn to_array(&self, dom: &dyn Dom) -> Vec<String> {
        let attr = self.options.borrow().data_id_attr.clone();
        self.items(dom)
            .into_iter()
            .map(|el| dom.attribute(el, &attr).unwrap_or_else(|| el.to_string()))
            .collect()
    }

    /// Reorder items to match `order`. Unknown ids are skipped; items not
    /// listed keep their relative order ahead of the listed ones.
    pub fn sort(&mut self, dom: &mut dyn Dom, order: &[String], use_animation: bool, now: Instant) {
        let attr = self.options.borrow().data_id_attr.clone();
        let items: Vec<(String, ElementId)> = self
            .items(dom)
            .into_iter()
            .map(|el| (dom.attribute(el, &attr).unwrap_or_else(|| el.to_string()), el))
            .collect();
        if use_animation {
            self.animation.borrow_mut().capture_animation_state(dom, &[], now);
        }
        for id in order {
            let Some(&(_, el)) = items.iter().find(|(key, _)| key == id) else {
                continue;
            };
            if let Err(err) = dom.append_child(self.list, el) {
                log::warn!("Failed to reorder {el}: {err}");
            }
        }
        if use_animation {
            self.animation.borrow_mut().animate_all(dom, now, None);
        }
    }

    /// Add an item to the selection. Returns false if it already was selected.
    pub fn select(&mut self, dom: &mut dyn Dom, item: ElementId) -> SortableResult<bool> {
        self.require_item(dom, item)?;
        if self.selected.contains(&item) {
            return Ok(false);
        }
        let class = self.options.borrow().selected_class.clone();
        dom.add_class(item, &class)?;
        self.selected.push(item);
        self.context
            .emit(self.list, &SortableEvent::new(SortableEventType::Select, self.list, item));
        Ok(true)
    }

    /// Remove an item from the selection. Returns false if it was not selected.
    pub fn deselect(&mut self, dom: &mut dyn Dom, item: ElementId) -> SortableResult<bool> {
        self.require_item(dom, item)?;
        let Some(i) = self.selected.iter().position(|&s| s == item) else {
            return Ok(false);
        };
        self.selected.remove(i);
        let class = self.options.borrow().selected_class.clone();
        dom.remove_class(item, &class)?;
        self.context
            .emit(self.list, &SortableEvent::new(SortableEventType::Deselect, self.list, item));
        Ok(true)
    }

    fn require_item(&self, dom: &dyn Dom, item: ElementId) -> SortableResult<()> {
        if self.items(dom).contains(&item) {
            Ok(())
        } else {
            Err(SortableError::NotAnItem(item))
        }
    }

    fn pointer_down(&mut self, dom: &mut dyn Dom, pointer: &PointerEvent, raw: &DomEvent) -> bool {
        if !matches!(self.phase, Phase::Idle) || pointer.button != MouseButton::Left {
            return false;
        }
        let options = self.snapshot();
        if options.disabled {
            log::trace!("Press on list {} ignored: disabled", self.list);
            return false;
        }
        let Some(target) = pointer.target.or_else(|| dom.element_from_point(pointer.position)) else {
            return false;
        };
        if target == self.list || !dom.contains(self.list, target) {
            return false;
        }
        if self.context.active_list().is_some() {
            log::trace!("Press on list {} ignored: another drag is running", self.list);
            return false;
        }

        let selector = options.item_selector(dom, self.list);
        let Some(item) = item_of(dom, self.list, &selector, target) else {
            return false;
        };

        let filtered = options
            .filter
            .as_deref()
            .is_some_and(|f| dom.closest(target, f, Some(self.list)).is_some())
            || options.filter_fn.as_ref().is_some_and(|f| f(&*dom, target, self.list));
        if filtered {
            let mut event = SortableEvent::new(SortableEventType::Filter, self.list, item);
            event.original_event = Some(raw.clone());
            self.context.emit(self.list, &event);
            return options.prevent_on_filter;
        }

        if let Some(handle) = options.handle.as_deref() {
            if dom.closest(target, handle, Some(item)).is_none() {
                return false;
            }
        }

        let touch = pointer.pointer_type == PointerType::Touch;
        let press = Press {
            item,
            start: pointer.position,
            fallback: options.force_fallback || touch || !dom.platform().supports_native_drag,
        };
        self.listen_gesture(dom);

        if options.delay > 0 && (!options.delay_on_touch_only || touch) {
            let ready_at = pointer.timestamp + Duration::from_millis(options.delay);
            self.phase = Phase::Pending { press, ready_at };
        } else {
            self.choose(dom, press, Some(raw));
        }
        false
    }

    fn choose(&mut self, dom: &mut dyn Dom, press: Press, raw: Option<&DomEvent>) {
        let options = self.snapshot();
        if let Err(err) = dom.add_class(press.item, &options.chosen_class) {
            log::warn!("Failed to mark chosen item: {err}");
        }
        if !press.fallback {
            if let Err(err) = dom.set_attribute(press.item, "draggable", "true") {
                log::warn!("Failed to enable platform drag: {err}");
            }
        }
        let mut event = SortableEvent::new(SortableEventType::Choose, self.list, press.item);
        event.old_index = index_in(dom, self.list, press.item, None, &[]);
        event.original_event = raw.cloned();
        self.phase = Phase::Chosen(press);
        self.context.emit(self.list, &event);
    }

    fn pointer_move(&mut self, dom: &mut dyn Dom, pointer: &PointerEvent, raw: &DomEvent) -> bool {
        match std::mem::take(&mut self.phase) {
            Phase::Idle => false,
            Phase::Pending { press, ready_at } => {
                let threshold = self.options.borrow().touch_start_threshold;
                if travel(press.start, pointer.position) >= threshold {
                    log::trace!("Pending press on {} cancelled by movement", press.item);
                    self.release_gesture(dom);
                } else if pointer.timestamp >= ready_at {
                    self.choose(dom, press, Some(raw));
                } else {
                    self.phase = Phase::Pending { press, ready_at };
                }
                false
            }
            Phase::Chosen(press) => {
                let tolerance = self.options.borrow().fallback_tolerance;
                if !press.fallback || travel(press.start, pointer.position) < tolerance {
                    self.phase = Phase::Chosen(press);
                    return false;
                }
                self.start_drag(dom, press, pointer.position, raw);
                self.drag_over(dom, pointer.position, None, raw);
                true
            }
            Phase::Dragging(state) => {
                let fallback = state.fallback;
                self.phase = Phase::Dragging(state);
                if fallback {
                    self.drag_over(dom, pointer.position, None, raw);
                }
                fallback
            }
        }
    }

    fn pointer_up(&mut self, dom: &mut dyn Dom, raw: &DomEvent) -> bool {
        match std::mem::take(&mut self.phase) {
            Phase::Idle => false,
            Phase::Pending { .. } => {
                self.release_gesture(dom);
                false
            }
            Phase::Chosen(press) => {
                self.release_gesture(dom);
                self.unchoose(dom, press, raw);
                false
            }
            Phase::Dragging(state) => {
                if state.fallback {
                    self.finish(dom, *state, raw);
                    true
                } else {
                    self.phase = Phase::Dragging(state);
                    false
                }
            }
        }
    }

    fn native_drag(&mut self, dom: &mut dyn Dom, drag: &NativeDragEvent, raw: &DomEvent) -> bool {
        match drag.phase {
            NativeDragPhase::Start => match std::mem::take(&mut self.phase) {
                Phase::Chosen(press) if !press.fallback => {
                    if drag.target.is_some_and(|t| !dom.contains(press.item, t)) {
                        self.phase = Phase::Chosen(press);
                        return false;
                    }
                    self.start_drag(dom, press, drag.position, raw);
                    false
                }
                // A platform drag during a fallback gesture is suppressed.
                Phase::Chosen(press) => {
                    self.phase = Phase::Chosen(press);
                    true
                }
                other => {
                    self.phase = other;
                    false
                }
            },
            NativeDragPhase::Enter | NativeDragPhase::Over => {
                if !self.native_drag_running() {
                    return false;
                }
                self.drag_over(dom, drag.position, drag.target, raw);
                true
            }
            NativeDragPhase::Leave => false,
            NativeDragPhase::Drop | NativeDragPhase::End => {
                if !self.native_drag_running() {
                    return false;
                }
                if let Phase::Dragging(state) = std::mem::take(&mut self.phase) {
                    self.finish(dom, *state, raw);
                }
                drag.phase == NativeDragPhase::Drop
            }
        }
    }

    fn native_drag_running(&self) -> bool {
        matches!(&self.phase, Phase::Dragging(state) if !state.fallback)
    }

    fn unchoose(&mut self, dom: &mut dyn Dom, press: Press, raw: &DomEvent) {
        let options = self.snapshot();
        self.clear_marks(dom, press.item, &options);
        let mut event = SortableEvent::new(SortableEventType::Unchoose, self.list, press.item);
        event.old_index = index_in(dom, self.list, press.item, None, &[]);
        event.new_index = event.old_index;
        event.original_event = Some(raw.clone());
        self.context.emit(self.list, &event);

        if options.multi_drag {
            let toggled = if self.selected.contains(&press.item) {
                self.deselect(dom, press.item)
            } else {
                self.select(dom, press.item)
            };
            if let Err(err) = toggled {
                log::warn!("Failed to toggle selection: {err}");
            }
        }
    }

    fn start_drag(&mut self, dom: &mut dyn Dom, press: Press, pointer: Point, raw: &DomEvent) {
        let options = self.snapshot();
        if !self.context.try_begin(self.list) {
            log::debug!("Drag of {} refused: another drag is running", press.item);
            self.release_gesture(dom);
            self.unchoose(dom, press, raw);
            return;
        }

        let item = press.item;
        let selector = options.item_selector(dom, self.list);
        let mut state = DragState {
            item,
            fallback: press.fallback,
            parent: self.list,
            next_sibling: dom.next_sibling(item),
            old_index: index_in(dom, self.list, item, None, &[]),
            old_draggable_index: index_in(dom, self.list, item, Some(&selector), &[]),
            ghost: None,
            clone: None,
            clone_shown: false,
            pull_mode: None,
            over_list: Some(self.list),
            transfer: DataTransfer::new(),
        };

        match dom.clone_element(item, true) {
            Ok(clone) => {
                for class in [&options.chosen_class, &options.ghost_class, &options.drag_class] {
                    if let Err(err) = dom.remove_class(clone, class) {
                        log::debug!("Failed to clean clone: {err}");
                    }
                }
                state.clone = Some(clone);
                let event = self.drag_event(dom, SortableEventType::Clone, &state, raw);
                self.context.emit(self.list, &event);
            }
            Err(err) => log::warn!("Failed to clone dragged item: {err}"),
        }

        if press.fallback {
            let classes = GhostClasses {
                fallback: &options.fallback_class,
                drag: &options.drag_class,
                ghost: &options.ghost_class,
                chosen: &options.chosen_class,
            };
            match Ghost::create(dom, item, self.list, press.start, options.fallback_on_body, classes) {
                Ok(ghost) => state.ghost = Some(ghost),
                Err(err) => log::warn!("Failed to create drag ghost: {err}"),
            }
        } else if let Some(set_data) = &options.set_data {
            set_data(&mut state.transfer, item);
        }

        if let Err(err) = dom.add_class(item, &options.ghost_class) {
            log::warn!("Failed to mark dragged item: {err}");
        }

        log::debug!(
            "Drag of {item} started in list {} ({} mode) at {pointer:?}",
            self.list,
            if press.fallback { "fallback" } else { "native" }
        );
        let event = self.drag_event(dom, SortableEventType::Start, &state, raw);
        self.phase = Phase::Dragging(Box::new(state));
        self.context.emit(self.list, &event);
    }

    fn drag_over(&mut self, dom: &mut dyn Dom, pointer: Point, hovered: Option<ElementId>, raw: &DomEvent) {
        let Phase::Dragging(mut state) = std::mem::take(&mut self.phase) else {
            return;
        };
        self.drag_over_with(dom, &mut state, pointer, hovered, raw);
        self.phase = Phase::Dragging(state);
    }

    fn drag_over_with(
        &mut self,
        dom: &mut dyn Dom,
        state: &mut DragState,
        pointer: Point,
        hovered: Option<ElementId>,
        raw: &DomEvent,
    ) {
        let options = self.snapshot();
        let now = raw.timestamp();
        let hovered = hovered.or_else(|| dom.element_from_point(pointer));
        let target_list = hovered.and_then(|h| self.context.list_of(dom, h));

        if options.scroll {
            let autoscroll = AutoScroll {
                sensitivity: options.scroll_sensitivity,
                speed: options.scroll_speed,
            };
            autoscroll.step(dom, target_list.unwrap_or(state.parent), pointer);
        }
        if let Some(ghost) = &state.ghost {
            if let Err(err) = ghost.update(dom, pointer, options.fallback_offset) {
                log::warn!("Failed to move drag ghost: {err}");
            }
        }

        state.over_list = target_list;
        let (Some(hovered), Some(target_list)) = (hovered, target_list) else {
            return;
        };
        if dom.contains(state.item, hovered) {
            return;
        }
        let target_options = if target_list == self.list {
            Some(options.clone())
        } else {
            self.context.options_of(target_list)
        };
        let Some(target_options) = target_options else {
            return;
        };
        if target_options.disabled {
            return;
        }

        let allowed = if target_list == self.list {
            options.sort || state.parent != self.list
        } else if target_list == state.parent {
            true
        } else {
            let decision = self.context.can_accept_drop(self.list, target_list, state.item, Some(raw));
            if decision.allowed {
                state.pull_mode = decision.pull_mode;
            }
            decision.allowed
        };
        if !allowed {
            log::trace!("List {target_list} refuses {}", state.item);
            return;
        }

        let transient = state.transient();
        let selector = target_options.item_selector(dom, target_list);
        let mut others = transient.clone();
        others.push(state.item);
        let items = list_items(dom, target_list, &selector, &others);
        let direction = detect_direction(dom, target_list, target_options.direction, &items);

        let related = item_of(dom, target_list, &selector, hovered).filter(|r| !transient.contains(r));
        let (related, mut side) = match related {
            Some(related) => {
                let Some(rect) = dom.rect(related) else {
                    return;
                };
                let config = SwapConfig {
                    threshold: target_options.swap_threshold,
                    invert: target_options.invert_swap,
                    inverted_threshold: target_options.inverted_threshold(),
                };
                let Some(side) = swap_side(pointer, rect, direction, config) else {
                    return;
                };
                (related, side)
            }
            // Over the list itself: append once past the last item.
            None => match items.last() {
                Some(&last) => {
                    let Some(rect) = dom.rect(last) else {
                        return;
                    };
                    let past = match direction {
                        Direction::Vertical => pointer.y > rect.y1,
                        Direction::Horizontal => pointer.x > rect.x1,
                    };
                    if !past {
                        return;
                    }
                    (last, SwapSide::After)
                }
                None => (target_list, SwapSide::After),
            },
        };

        if let Some(on_move) = &options.on_move {
            let query = MoveEvent {
                from: self.list,
                to: target_list,
                dragged: state.item,
                dragged_rect: dom.rect(state.item),
                related,
                related_rect: dom.rect(related),
                will_insert_after: side.is_after(),
            };
            match on_move(&query) {
                MoveOutcome::Cancel => return,
                MoveOutcome::InsertBefore => side = SwapSide::Before,
                MoveOutcome::InsertAfter => side = SwapSide::After,
                MoveOutcome::Proceed => {}
            }
        }

        let back_to_clone = target_list == self.list
            && state.clone_shown
            && options.group.as_ref().is_some_and(|g| g.revert_clone);
        let reference = if back_to_clone {
            state.clone
        } else if related == target_list {
            None
        } else {
            match side {
                SwapSide::Before => Some(related),
                SwapSide::After => dom.next_sibling(related),
            }
        };
        let in_place = dom.parent(state.item) == Some(target_list)
            && (reference == Some(state.item) || dom.next_sibling(state.item) == reference);
        if in_place {
            return;
        }

        let mut moved = self.drag_event(dom, SortableEventType::Move, state, raw);
        moved.to = target_list;
        moved.related = Some(related);
        moved.will_insert_after = Some(side.is_after());
        self.context.emit(self.list, &moved);

        let mut lists = vec![target_list];
        if state.parent != target_list {
            lists.push(state.parent);
        }
        if state.clone_shown || state.pull_mode == Some(PullMode::Clone) {
            lists.push(self.list);
        }
        lists.dedup();
        let animations: Vec<_> = lists.iter().filter_map(|&l| self.context.animation_of(l)).collect();
        for animation in &animations {
            animation.borrow_mut().capture_animation_state(dom, &transient, now);
        }

        if let Err(err) = dom.insert_before(target_list, state.item, reference) {
            log::warn!("Failed to move {} into {target_list}: {err}", state.item);
            return;
        }
        state.parent = target_list;
        if target_list == self.list {
            state.pull_mode = None;
        }
        self.sync_clone(dom, state);

        for animation in &animations {
            animation.borrow_mut().animate_all(dom, now, None);
        }

        let mut change = self.drag_event(dom, SortableEventType::Change, state, raw);
        change.related = Some(related);
        change.will_insert_after = Some(side.is_after());
        self.context.emit(target_list, &change);
    }

    /// Show the clone in the source list while a cloning pull is away, and
    /// hide it once the item is back.
    fn sync_clone(&self, dom: &mut dyn Dom, state: &mut DragState) {
        let Some(clone) = state.clone else {
            return;
        };
        let wanted = state.parent != self.list && state.pull_mode == Some(PullMode::Clone);
        if wanted && !state.clone_shown {
            let reference = state
                .next_sibling
                .filter(|&n| n != state.item && dom.parent(n) == Some(self.list));
            match dom.insert_before(self.list, clone, reference) {
                Ok(()) => state.clone_shown = true,
                Err(err) => log::warn!("Failed to show clone: {err}"),
            }
        } else if !wanted && state.clone_shown {
            match dom.remove(clone) {
                Ok(()) => state.clone_shown = false,
                Err(err) => log::warn!("Failed to hide clone: {err}"),
            }
        }
    }

    fn finish(&mut self, dom: &mut dyn Dom, mut state: DragState, raw: &DomEvent) {
        let options = self.snapshot();
        self.release_gesture(dom);
        if let Some(ghost) = state.ghost.take() {
            ghost.remove(dom);
        }
        self.clear_marks(dom, state.item, &options);

        let mut removed = false;
        if state.over_list.is_none() && (options.remove_on_spill || options.revert_on_spill) {
            let spill = self.drag_event(dom, SortableEventType::Spill, &state, raw);
            self.context.emit(self.list, &spill);
            if options.remove_on_spill {
                match dom.remove(state.item) {
                    Ok(()) => removed = true,
                    Err(err) => log::warn!("Failed to remove spilled item: {err}"),
                }
            } else {
                let reference = state
                    .next_sibling
                    .filter(|&n| n != state.item && dom.parent(n) == Some(self.list));
                match dom.insert_before(self.list, state.item, reference) {
                    Ok(()) => {
                        state.parent = self.list;
                        state.pull_mode = None;
                    }
                    Err(err) => log::warn!("Failed to revert spilled item: {err}"),
                }
            }
            self.sync_clone(dom, &mut state);
        }

        if !removed && options.multi_drag && self.selected.contains(&state.item) {
            self.carry_selection(dom, &state);
        }

        let unchoose = self.drag_event(dom, SortableEventType::Unchoose, &state, raw);
        self.context.emit(self.list, &unchoose);

        if removed {
            let event = self.drag_event(dom, SortableEventType::Remove, &state, raw);
            self.context.emit(self.list, &event);
        } else if state.parent != self.list {
            let target = state.parent;
            let add = self.drag_event(dom, SortableEventType::Add, &state, raw);
            self.context.emit(target, &add);
            let remove = self.drag_event(dom, SortableEventType::Remove, &state, raw);
            self.context.emit(self.list, &remove);
            let sort = self.drag_event(dom, SortableEventType::Sort, &state, raw);
            self.context.emit(target, &sort);
            self.context.emit(self.list, &sort);
        } else {
            let update = self.drag_event(dom, SortableEventType::Update, &state, raw);
            if update.new_index != state.old_index {
                self.context.emit(self.list, &update);
                let mut sort = update;
                sort.kind = SortableEventType::Sort;
                self.context.emit(self.list, &sort);
            }
        }

        let end = self.drag_event(dom, SortableEventType::End, &state, raw);
        self.context.emit(self.list, &end);
        self.context.end(self.list);
        log::debug!("Drag of {} ended in list {}", state.item, state.parent);
    }

    /// Move the other selected items right after the dropped one.
    fn carry_selection(&self, dom: &mut dyn Dom, state: &DragState) {
        let mut anchor = state.item;
        for &el in self.selected.iter().filter(|&&el| el != state.item) {
            if !dom.exists(el) {
                continue;
            }
            let reference = dom.next_sibling(anchor);
            if let Err(err) = dom.insert_before(state.parent, el, reference) {
                log::warn!("Failed to carry selected item {el}: {err}");
                continue;
            }
            anchor = el;
        }
    }

    /// Event payload for the drag in progress.
    fn drag_event(&self, dom: &dyn Dom, kind: SortableEventType, state: &DragState, raw: &DomEvent) -> SortableEvent {
        let transient = state.transient();
        let selector = self
            .context
            .options_of(state.parent)
            .unwrap_or_else(|| self.snapshot())
            .item_selector(dom, state.parent);
        let mut event = SortableEvent::new(kind, state.parent, state.item);
        event.from = self.list;
        event.clone = state.clone;
        event.old_index = state.old_index;
        event.old_draggable_index = state.old_draggable_index;
        event.new_index = index_in(dom, state.parent, state.item, None, &transient);
        event.new_draggable_index = index_in(dom, state.parent, state.item, Some(&selector), &transient);
        event.pull_mode = state.pull_mode;
        event.original_event = Some(raw.clone());
        event
    }

    fn clear_marks(&self, dom: &mut dyn Dom, item: ElementId, options: &SortableOptions) {
        if !dom.exists(item) {
            return;
        }
        let cleared = dom
            .remove_class(item, &options.chosen_class)
            .and_then(|_| dom.remove_class(item, &options.ghost_class));
        if let Err(err) = cleared {
            log::warn!("Failed to clear drag classes: {err}");
        }
        if dom.attribute(item, "draggable").is_some() {
            if let Err(err) = dom.set_attribute(item, "draggable", "false") {
                log::warn!("Failed to reset draggable attribute: {err}");
            }
        }
    }

    fn listen_gesture(&mut self, dom: &mut dyn Dom) {
        for kind in GESTURE_EVENTS {
            match dom.add_listener(ListenTarget::Document, kind) {
                Ok(id) => self.gesture_listeners.push(id),
                Err(err) => log::warn!("Failed to follow pointer: {err}"),
            }
        }
    }

    fn release_gesture(&mut self, dom: &mut dyn Dom) {
        for id in self.gesture_listeners.drain(..) {
            dom.remove_listener(id);
        }
    }

    /// Drop all transient state without emitting events.
    fn abort(&mut self, dom: &mut dyn Dom) {
        let options = self.snapshot();
        self.release_gesture(dom);
        match std::mem::take(&mut self.phase) {
            Phase::Idle | Phase::Pending { .. } => {}
            Phase::Chosen(press) => self.clear_marks(dom, press.item, &options),
            Phase::Dragging(mut state) => {
                if let Some(ghost) = state.ghost.take() {
                    ghost.remove(dom);
                }
                if let Some(clone) = state.clone.filter(|_| state.clone_shown) {
                    if let Err(err) = dom.remove(clone) {
                        log::warn!("Failed to remove clone: {err}");
                    }
                }
                self.clear_marks(dom, state.item, &options);
                self.context.end(self.list);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::{GroupOptions, Pull, Put};
    use dnrkit_core::{FlowAxis, MemoryDom, Platform};
    use kurbo::Rect;
    use std::cell::RefCell;

    struct Fixture {
        dom: MemoryDom,
        list: ElementId,
        items: Vec<ElementId>,
        t0: Instant,
    }

    impl Fixture {
        fn at(&self, ms: u64) -> Instant {
            self.t0 + Duration::from_millis(ms)
        }
    }

    /// Vertical list at `x` with `n` items of 200x30.
    fn spawn_list(dom: &mut MemoryDom, x: f64, n: usize) -> (ElementId, Vec<ElementId>) {
        let body = dom.body();
        let list = dom.spawn(body, "ul", Rect::new(x, 0.0, x + 200.0, 300.0)).unwrap();
        dom.set_flow(list, FlowAxis::Vertical, 0.0);
        let items = (0..n)
            .map(|i| {
                let item = dom.spawn(list, "li", Rect::new(x, 0.0, x + 200.0, 30.0)).unwrap();
                dom.set_attribute(item, "data-id", &format!("{}", (b'a' + i as u8) as char)).unwrap();
                item
            })
            .collect();
        (list, items)
    }

    fn fixture() -> Fixture {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        dom.set_rect(body, Rect::new(0.0, 0.0, 1000.0, 1000.0));
        let (list, items) = spawn_list(&mut dom, 0.0, 3);
        Fixture {
            dom,
            list,
            items,
            t0: Instant::now(),
        }
    }

    fn fallback() -> SortableOptions {
        SortableOptions {
            force_fallback: true,
            ..Default::default()
        }
    }

    fn record(sortable: &Sortable) -> Rc<RefCell<Vec<SortableEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        for kind in SortableEventType::ALL {
            let log = Rc::clone(&log);
            sortable.events().on(kind, move |e| log.borrow_mut().push(e.clone()));
        }
        log
    }

    fn kinds(log: &Rc<RefCell<Vec<SortableEvent>>>) -> Vec<SortableEventType> {
        log.borrow().iter().map(|e| e.kind).collect()
    }

    fn down(s: &mut Sortable, dom: &mut MemoryDom, pos: (f64, f64), target: ElementId, t: Instant) -> bool {
        s.handle_event(dom, &PointerEvent::down(Point::new(pos.0, pos.1), Some(target), t).into())
    }

    fn moved(s: &mut Sortable, dom: &mut MemoryDom, pos: (f64, f64), t: Instant) -> bool {
        s.handle_event(dom, &PointerEvent::moved(Point::new(pos.0, pos.1), t).into())
    }

    fn up(s: &mut Sortable, dom: &mut MemoryDom, pos: (f64, f64), t: Instant) -> bool {
        s.handle_event(dom, &PointerEvent::up(Point::new(pos.0, pos.1), t).into())
    }

    fn native(s: &mut Sortable, dom: &mut MemoryDom, phase: NativeDragPhase, pos: (f64, f64), target: Option<ElementId>, t: Instant) -> bool {
        s.handle_event(dom, &NativeDragEvent::new(phase, Point::new(pos.0, pos.1), target, t).into())
    }

    #[test]
    fn test_fallback_reorder_to_end() {
        let mut f = fixture();
        let (a, b, c) = (f.items[0], f.items[1], f.items[2]);
        let mut sortable = Sortable::new(f.list, SortableContext::new(), fallback());
        sortable.mount(&mut f.dom).unwrap();
        let log = record(&sortable);

        let t = f.at(0);
        down(&mut sortable, &mut f.dom, (100.0, 15.0), a, t);
        assert!(f.dom.has_class(a, "sortable-chosen"));
        let t = f.at(16);
        moved(&mut sortable, &mut f.dom, (100.0, 20.0), t);
        assert!(sortable.is_dragging());
        let t = f.at(32);
        moved(&mut sortable, &mut f.dom, (100.0, 85.0), t);
        let t = f.at(48);
        up(&mut sortable, &mut f.dom, (100.0, 85.0), t);

        assert_eq!(f.dom.children(f.list), vec![b, c, a]);
        assert!(!f.dom.has_class(a, "sortable-chosen"));
        assert!(!f.dom.has_class(a, "sortable-ghost"));
        assert!(!sortable.is_dragging());
        assert_eq!(sortable.to_array(&f.dom), vec!["b", "c", "a"]);

        let events = log.borrow();
        let update = events.iter().find(|e| e.kind == SortableEventType::Update).unwrap();
        assert_eq!(update.old_index, Some(0));
        assert_eq!(update.new_index, Some(2));
        assert_eq!(update.item, a);
        drop(events);
        assert_eq!(
            kinds(&log),
            vec![
                SortableEventType::Choose,
                SortableEventType::Clone,
                SortableEventType::Start,
                SortableEventType::Move,
                SortableEventType::Change,
                SortableEventType::Unchoose,
                SortableEventType::Update,
                SortableEventType::Sort,
                SortableEventType::End,
            ]
        );
    }

    #[test]
    fn test_ghost_follows_and_is_removed() {
        let mut f = fixture();
        let a = f.items[0];
        let mut sortable = Sortable::new(f.list, SortableContext::new(), fallback());
        sortable.mount(&mut f.dom).unwrap();

        let t = f.at(0);
        down(&mut sortable, &mut f.dom, (100.0, 15.0), a, t);
        let t = f.at(16);
        moved(&mut sortable, &mut f.dom, (100.0, 20.0), t);
        let ghost = *f.dom.children(f.list).last().unwrap();
        assert!(f.dom.has_class(ghost, "sortable-fallback"));
        assert_eq!(
            f.dom.inline_style(ghost, "transform").as_deref(),
            Some("matrix(1, 0, 0, 1, 0, 5)")
        );
        // The ghost never counts as an item.
        assert_eq!(sortable.items(&f.dom).len(), 3);

        let t = f.at(32);
        up(&mut sortable, &mut f.dom, (100.0, 20.0), t);
        assert_eq!(f.dom.children(f.list).len(), 3);
        assert!(f.dom.parent(ghost).is_none());
    }

    #[test]
    fn test_click_without_drag() {
        let mut f = fixture();
        let a = f.items[0];
        let mut sortable = Sortable::new(f.list, SortableContext::new(), fallback());
        sortable.mount(&mut f.dom).unwrap();
        let log = record(&sortable);

        let t = f.at(0);
        down(&mut sortable, &mut f.dom, (100.0, 15.0), a, t);
        let t = f.at(10);
        up(&mut sortable, &mut f.dom, (100.0, 15.0), t);
        assert_eq!(kinds(&log), vec![SortableEventType::Choose, SortableEventType::Unchoose]);
        assert_eq!(f.dom.children(f.list), f.items);
    }

    #[test]
    fn test_sort_disabled_keeps_order() {
        let mut f = fixture();
        let a = f.items[0];
        let options = SortableOptions {
            sort: false,
            ..fallback()
        };
        let mut sortable = Sortable::new(f.list, SortableContext::new(), options);
        sortable.mount(&mut f.dom).unwrap();

        let t = f.at(0);
        down(&mut sortable, &mut f.dom, (100.0, 15.0), a, t);
        let t = f.at(16);
        moved(&mut sortable, &mut f.dom, (100.0, 20.0), t);
        let t = f.at(32);
        moved(&mut sortable, &mut f.dom, (100.0, 85.0), t);
        let t = f.at(48);
        up(&mut sortable, &mut f.dom, (100.0, 85.0), t);
        assert_eq!(f.dom.children(f.list), f.items);
    }

    #[test]
    fn test_native_mode() {
        let mut f = fixture();
        let (a, b, c) = (f.items[0], f.items[1], f.items[2]);
        let options = SortableOptions {
            set_data: Some(Rc::new(|transfer: &mut DataTransfer, item: ElementId| {
                transfer.set_data("text/plain", &item.to_string());
            })),
            ..Default::default()
        };
        let mut sortable = Sortable::new(f.list, SortableContext::new(), options);
        sortable.mount(&mut f.dom).unwrap();
        let log = record(&sortable);

        let t = f.at(0);
        down(&mut sortable, &mut f.dom, (100.0, 15.0), a, t);
        assert_eq!(f.dom.attribute(a, "draggable").as_deref(), Some("true"));
        // Pointer moves do not start a platform drag.
        let t = f.at(8);
        moved(&mut sortable, &mut f.dom, (100.0, 40.0), t);
        assert!(!sortable.is_dragging());

        let t = f.at(16);
        native(&mut sortable, &mut f.dom, NativeDragPhase::Start, (100.0, 15.0), Some(a), t);
        assert!(sortable.is_dragging());
        assert_eq!(
            sortable.data_transfer().and_then(|d| d.get_data("text/plain")),
            Some(a.to_string().as_str())
        );
        // No ghost in native mode.
        assert_eq!(f.dom.children(f.list).len(), 3);

        let t = f.at(32);
        assert!(native(&mut sortable, &mut f.dom, NativeDragPhase::Over, (100.0, 85.0), Some(c), t));
        let t = f.at(48);
        assert!(native(&mut sortable, &mut f.dom, NativeDragPhase::Drop, (100.0, 85.0), Some(c), t));
        assert_eq!(f.dom.children(f.list), vec![b, c, a]);
        assert_eq!(f.dom.attribute(a, "draggable").as_deref(), Some("false"));
        assert!(kinds(&log).contains(&SortableEventType::Update));
        assert_eq!(kinds(&log).last(), Some(&SortableEventType::End));
    }

    #[test]
    fn test_touch_uses_fallback() {
        let mut f = fixture();
        let a = f.items[0];
        let mut sortable = Sortable::new(f.list, SortableContext::new(), SortableOptions::default());
        sortable.mount(&mut f.dom).unwrap();

        let press = PointerEvent::down(Point::new(100.0, 15.0), Some(a), f.at(0)).with_pointer_type(PointerType::Touch);
        sortable.handle_event(&mut f.dom, &press.into());
        let step = PointerEvent::moved(Point::new(100.0, 20.0), f.at(16)).with_pointer_type(PointerType::Touch);
        assert!(sortable.handle_event(&mut f.dom, &step.into()));
        assert!(sortable.is_dragging());
        assert!(sortable.data_transfer().is_none());
    }

    #[test]
    fn test_no_native_support_uses_fallback() {
        let mut f = fixture();
        f.dom.set_platform(Platform {
            supports_native_drag: false,
            is_ios: false,
        });
        let a = f.items[0];
        let mut sortable = Sortable::new(f.list, SortableContext::new(), SortableOptions::default());
        sortable.mount(&mut f.dom).unwrap();
        let t = f.at(0);
        down(&mut sortable, &mut f.dom, (100.0, 15.0), a, t);
        let t = f.at(16);
        moved(&mut sortable, &mut f.dom, (100.0, 20.0), t);
        assert!(sortable.is_dragging());
    }

    #[test]
    fn test_fallback_tolerance() {
        let mut f = fixture();
        let a = f.items[0];
        let options = SortableOptions {
            fallback_tolerance: 10.0,
            ..fallback()
        };
        let mut sortable = Sortable::new(f.list, SortableContext::new(), options);
        sortable.mount(&mut f.dom).unwrap();
        let t = f.at(0);
        down(&mut sortable, &mut f.dom, (100.0, 15.0), a, t);
        let t = f.at(16);
        moved(&mut sortable, &mut f.dom, (104.0, 20.0), t);
        assert!(!sortable.is_dragging());
        let t = f.at(32);
        moved(&mut sortable, &mut f.dom, (100.0, 26.0), t);
        assert!(sortable.is_dragging());
    }

    #[test]
    fn test_cross_list_move() {
        let mut f = fixture();
        let (list2, others) = spawn_list(&mut f.dom, 300.0, 2);
        let context = SortableContext::new();
        let grouped = || SortableOptions {
            group: Some(GroupOptions::named("shared")),
            ..fallback()
        };
        let mut source = Sortable::new(f.list, context.clone(), grouped());
        let mut target = Sortable::new(list2, context.clone(), grouped());
        source.mount(&mut f.dom).unwrap();
        target.mount(&mut f.dom).unwrap();
        let source_log = record(&source);
        let target_log = record(&target);

        let a = f.items[0];
        let t = f.at(0);
        down(&mut source, &mut f.dom, (100.0, 15.0), a, t);
        let t = f.at(16);
        moved(&mut source, &mut f.dom, (100.0, 20.0), t);
        let t = f.at(32);
        moved(&mut source, &mut f.dom, (400.0, 50.0), t);
        let t = f.at(48);
        up(&mut source, &mut f.dom, (400.0, 50.0), t);

        assert_eq!(f.dom.children(list2), vec![others[0], others[1], a]);
        assert_eq!(f.dom.children(f.list), vec![f.items[1], f.items[2]]);
        assert_eq!(
            kinds(&target_log),
            vec![SortableEventType::Change, SortableEventType::Add, SortableEventType::Sort]
        );
        let add = target_log.borrow()[1].clone();
        assert_eq!((add.from, add.to), (f.list, list2));
        assert_eq!(add.new_index, Some(2));
        assert_eq!(add.pull_mode, Some(PullMode::Move));
        assert!(kinds(&source_log).contains(&SortableEventType::Remove));
        assert_eq!(context.active_list(), None);
    }

    #[test]
    fn test_cross_list_denied_between_groups() {
        let mut f = fixture();
        let (list2, others) = spawn_list(&mut f.dom, 300.0, 2);
        let context = SortableContext::new();
        let group = |name: &str| SortableOptions {
            group: Some(GroupOptions::named(name)),
            ..fallback()
        };
        let mut source = Sortable::new(f.list, context.clone(), group("x"));
        let mut target = Sortable::new(list2, context.clone(), group("y"));
        source.mount(&mut f.dom).unwrap();
        target.mount(&mut f.dom).unwrap();
        let log = record(&source);

        let a = f.items[0];
        let t = f.at(0);
        down(&mut source, &mut f.dom, (100.0, 15.0), a, t);
        let t = f.at(16);
        moved(&mut source, &mut f.dom, (100.0, 20.0), t);
        let t = f.at(32);
        moved(&mut source, &mut f.dom, (400.0, 50.0), t);
        let t = f.at(48);
        up(&mut source, &mut f.dom, (400.0, 50.0), t);

        assert_eq!(f.dom.children(f.list), f.items);
        assert_eq!(f.dom.children(list2), others);
        assert!(!kinds(&log).contains(&SortableEventType::Remove));
    }

    #[test]
    fn test_clone_pull_leaves_copy() {
        let mut f = fixture();
        let (list2, _) = spawn_list(&mut f.dom, 300.0, 1);
        let context = SortableContext::new();
        let source_options = SortableOptions {
            group: Some(GroupOptions {
                pull: Pull::Clone,
                put: Put::Allowed(false),
                ..GroupOptions::named("palette")
            }),
            ..fallback()
        };
        let target_options = SortableOptions {
            group: Some(GroupOptions {
                put: Put::Groups(vec!["palette".to_string()]),
                ..GroupOptions::named("board")
            }),
            ..fallback()
        };
        let mut source = Sortable::new(f.list, context.clone(), source_options);
        let mut target = Sortable::new(list2, context.clone(), target_options);
        source.mount(&mut f.dom).unwrap();
        target.mount(&mut f.dom).unwrap();
        let target_log = record(&target);

        let a = f.items[0];
        let t = f.at(0);
        down(&mut source, &mut f.dom, (100.0, 15.0), a, t);
        let t = f.at(16);
        moved(&mut source, &mut f.dom, (100.0, 20.0), t);
        let t = f.at(32);
        moved(&mut source, &mut f.dom, (400.0, 50.0), t);

        let children = f.dom.children(f.list);
        assert_eq!(children.len(), 4); // clone, b, c, ghost
        let clone = children[0];
        assert_ne!(clone, a);
        assert_eq!(f.dom.attribute(clone, "data-id").as_deref(), Some("a"));

        let t = f.at(48);
        up(&mut source, &mut f.dom, (400.0, 50.0), t);
        assert_eq!(f.dom.parent(a), Some(list2));
        assert_eq!(f.dom.children(f.list), vec![clone, f.items[1], f.items[2]]);
        let add = target_log.borrow().iter().find(|e| e.kind == SortableEventType::Add).cloned().unwrap();
        assert_eq!(add.pull_mode, Some(PullMode::Clone));
        assert_eq!(add.clone, Some(clone));
    }

    #[test]
    fn test_revert_on_spill() {
        let mut f = fixture();
        let a = f.items[0];
        let options = SortableOptions {
            revert_on_spill: true,
            ..fallback()
        };
        let mut sortable = Sortable::new(f.list, SortableContext::new(), options);
        sortable.mount(&mut f.dom).unwrap();
        let log = record(&sortable);

        let t = f.at(0);
        down(&mut sortable, &mut f.dom, (100.0, 15.0), a, t);
        let t = f.at(16);
        moved(&mut sortable, &mut f.dom, (100.0, 20.0), t);
        let t = f.at(32);
        moved(&mut sortable, &mut f.dom, (100.0, 85.0), t);
        assert_eq!(f.dom.children(f.list)[2], a);
        let t = f.at(48);
        moved(&mut sortable, &mut f.dom, (600.0, 600.0), t);
        let t = f.at(64);
        up(&mut sortable, &mut f.dom, (600.0, 600.0), t);

        assert_eq!(f.dom.children(f.list), f.items);
        let kinds = kinds(&log);
        assert!(kinds.contains(&SortableEventType::Spill));
        assert!(!kinds.contains(&SortableEventType::Update));
    }

    #[test]
    fn test_remove_on_spill() {
        let mut f = fixture();
        let a = f.items[0];
        let options = SortableOptions {
            remove_on_spill: true,
            ..fallback()
        };
        let mut sortable = Sortable::new(f.list, SortableContext::new(), options);
        sortable.mount(&mut f.dom).unwrap();
        let log = record(&sortable);

        let t = f.at(0);
        down(&mut sortable, &mut f.dom, (100.0, 15.0), a, t);
        let t = f.at(16);
        moved(&mut sortable, &mut f.dom, (100.0, 20.0), t);
        let t = f.at(32);
        moved(&mut sortable, &mut f.dom, (600.0, 600.0), t);
        let t = f.at(48);
        up(&mut sortable, &mut f.dom, (600.0, 600.0), t);

        assert!(f.dom.parent(a).is_none());
        assert_eq!(f.dom.children(f.list), vec![f.items[1], f.items[2]]);
        assert!(kinds(&log).contains(&SortableEventType::Remove));
    }

    #[test]
    fn test_delay_gate() {
        let mut f = fixture();
        let a = f.items[0];
        let options = SortableOptions {
            delay: 100,
            touch_start_threshold: 5.0,
            ..fallback()
        };
        let mut sortable = Sortable::new(f.list, SortableContext::new(), options);
        sortable.mount(&mut f.dom).unwrap();
        let log = record(&sortable);

        let t = f.at(0);
        down(&mut sortable, &mut f.dom, (100.0, 15.0), a, t);
        let t = f.at(50);
        sortable.poll(&mut f.dom, t);
        assert!(kinds(&log).is_empty());
        let t = f.at(100);
        sortable.poll(&mut f.dom, t);
        assert_eq!(kinds(&log), vec![SortableEventType::Choose]);
        let t = f.at(120);
        up(&mut sortable, &mut f.dom, (100.0, 15.0), t);

        // Moving past the threshold before the delay cancels the press.
        log.borrow_mut().clear();
        let t = f.at(200);
        down(&mut sortable, &mut f.dom, (100.0, 15.0), a, t);
        let t = f.at(220);
        moved(&mut sortable, &mut f.dom, (100.0, 25.0), t);
        let t = f.at(400);
        sortable.poll(&mut f.dom, t);
        assert!(kinds(&log).is_empty());
        assert_eq!(sortable.drag_element(), None);
        assert_eq!(f.dom.listener_count(), LIST_EVENTS.len());
    }

    #[test]
    fn test_delay_on_touch_only() {
        let mut f = fixture();
        let a = f.items[0];
        let options = SortableOptions {
            delay: 100,
            delay_on_touch_only: true,
            ..fallback()
        };
        let mut sortable = Sortable::new(f.list, SortableContext::new(), options);
        sortable.mount(&mut f.dom).unwrap();
        let log = record(&sortable);

        let t = f.at(0);
        down(&mut sortable, &mut f.dom, (100.0, 15.0), a, t);
        assert_eq!(kinds(&log), vec![SortableEventType::Choose]);
    }

    #[test]
    fn test_filter_blocks_drag() {
        let mut f = fixture();
        let b = f.items[1];
        f.dom.add_class(b, "locked").unwrap();
        let options = SortableOptions {
            filter: Some(".locked".to_string()),
            ..fallback()
        };
        let mut sortable = Sortable::new(f.list, SortableContext::new(), options);
        sortable.mount(&mut f.dom).unwrap();
        let log = record(&sortable);

        let t = f.at(0);
        assert!(down(&mut sortable, &mut f.dom, (100.0, 45.0), b, t));
        assert_eq!(kinds(&log), vec![SortableEventType::Filter]);
        assert_eq!(sortable.drag_element(), None);
    }

    #[test]
    fn test_handle_required() {
        let mut f = fixture();
        let a = f.items[0];
        let grip = f.dom.spawn(a, "span", Rect::new(0.0, 0.0, 20.0, 30.0)).unwrap();
        f.dom.add_class(grip, "grip").unwrap();
        let options = SortableOptions {
            handle: Some(".grip".to_string()),
            ..fallback()
        };
        let mut sortable = Sortable::new(f.list, SortableContext::new(), options);
        sortable.mount(&mut f.dom).unwrap();

        let t = f.at(0);
        down(&mut sortable, &mut f.dom, (100.0, 15.0), a, t);
        assert_eq!(sortable.drag_element(), None);
        let t = f.at(10);
        down(&mut sortable, &mut f.dom, (10.0, 15.0), grip, t);
        assert_eq!(sortable.drag_element(), Some(a));
    }

    #[test]
    fn test_disabled_ignores_press() {
        let mut f = fixture();
        let mut sortable = Sortable::new(f.list, SortableContext::new(), fallback());
        sortable.mount(&mut f.dom).unwrap();
        sortable.set_option("disabled", serde_json::json!(true)).unwrap();
        let t = f.at(0);
        down(&mut sortable, &mut f.dom, (100.0, 15.0), f.items[0], t);
        assert_eq!(sortable.drag_element(), None);
    }

    #[test]
    fn test_multi_drag_selection() {
        let mut f = fixture();
        let (a, b, c) = (f.items[0], f.items[1], f.items[2]);
        let options = SortableOptions {
            multi_drag: true,
            ..fallback()
        };
        let mut sortable = Sortable::new(f.list, SortableContext::new(), options);
        sortable.mount(&mut f.dom).unwrap();
        let log = record(&sortable);

        // Clicks toggle selection.
        let t = f.at(0);
        down(&mut sortable, &mut f.dom, (100.0, 15.0), a, t);
        let t = f.at(10);
        up(&mut sortable, &mut f.dom, (100.0, 15.0), t);
        assert!(f.dom.has_class(a, "sortable-selected"));
        assert!(kinds(&log).contains(&SortableEventType::Select));
        sortable.select(&mut f.dom, b).unwrap();
        assert_eq!(sortable.selected(), &[a, b]);

        // Dragging A past C carries B along.
        let t = f.at(100);
        down(&mut sortable, &mut f.dom, (100.0, 15.0), a, t);
        let t = f.at(116);
        moved(&mut sortable, &mut f.dom, (100.0, 20.0), t);
        let t = f.at(132);
        moved(&mut sortable, &mut f.dom, (100.0, 85.0), t);
        let t = f.at(148);
        up(&mut sortable, &mut f.dom, (100.0, 85.0), t);
        assert_eq!(f.dom.children(f.list), vec![c, a, b]);

        assert!(sortable.deselect(&mut f.dom, b).unwrap());
        assert!(!f.dom.has_class(b, "sortable-selected"));
        let stranger = f.dom.create_element("li");
        assert!(matches!(sortable.select(&mut f.dom, stranger), Err(SortableError::NotAnItem(_))));
    }

    #[test]
    fn test_on_move_can_cancel() {
        let mut f = fixture();
        let a = f.items[0];
        let options = SortableOptions {
            on_move: Some(Rc::new(|_: &MoveEvent| MoveOutcome::Cancel)),
            ..fallback()
        };
        let mut sortable = Sortable::new(f.list, SortableContext::new(), options);
        sortable.mount(&mut f.dom).unwrap();
        let t = f.at(0);
        down(&mut sortable, &mut f.dom, (100.0, 15.0), a, t);
        let t = f.at(16);
        moved(&mut sortable, &mut f.dom, (100.0, 20.0), t);
        let t = f.at(32);
        moved(&mut sortable, &mut f.dom, (100.0, 85.0), t);
        let t = f.at(48);
        up(&mut sortable, &mut f.dom, (100.0, 85.0), t);
        assert_eq!(f.dom.children(f.list), f.items);
    }

    #[test]
    fn test_sort_by_ids() {
        let mut f = fixture();
        let mut sortable = Sortable::new(f.list, SortableContext::new(), fallback());
        sortable.mount(&mut f.dom).unwrap();
        let order = ["c", "a", "missing", "b"].map(String::from);
        let t = f.at(0);
        sortable.sort(&mut f.dom, &order, false, t);
        assert_eq!(sortable.to_array(&f.dom), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_teardown_mid_drag() {
        let mut f = fixture();
        let a = f.items[0];
        let context = SortableContext::new();
        let mut sortable = Sortable::new(f.list, context.clone(), fallback());
        sortable.mount(&mut f.dom).unwrap();
        assert_eq!(f.dom.listener_count(), LIST_EVENTS.len());

        let t = f.at(0);
        down(&mut sortable, &mut f.dom, (100.0, 15.0), a, t);
        assert_eq!(f.dom.listener_count(), LIST_EVENTS.len() + GESTURE_EVENTS.len());
        let t = f.at(16);
        moved(&mut sortable, &mut f.dom, (100.0, 20.0), t);
        assert_eq!(f.dom.children(f.list).len(), 4);

        sortable.unmount(&mut f.dom);
        assert_eq!(f.dom.listener_count(), 0);
        assert_eq!(f.dom.children(f.list), f.items);
        assert!(!f.dom.has_class(a, "sortable-ghost"));
        assert!(!f.dom.has_class(a, "sortable-chosen"));
        assert!(!context.is_registered(f.list));
        assert_eq!(context.active_list(), None);
    }
}
