//! Browser document adapter.
//!
//! Elements are identified by a `data-dnr-id` attribute assigned the first time
//! the adapter sees them. Registered listeners push converted events into a
//! queue the host drains (see [`WebDom::drain_events`]) and forwards to the
//! engines. A browser event seen by several listeners is queued once.

use super::{Dom, DomError, DomResult, ElementId, EventKind, EventQueue, ListenTarget, ListenerId, Platform};
use crate::input::{
    DomEvent, Instant, Modifiers, MouseButton, NativeDragEvent, NativeDragPhase, PointerEvent, PointerPhase,
    PointerType,
};
use kurbo::{Point, Rect, Vec2};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use uuid::Uuid;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};

const ID_ATTRIBUTE: &str = "data-dnr-id";
/// Property stamped on browser events once they are queued.
const DISPATCH_PROPERTY: &str = "__dnrDispatch";

#[derive(Default)]
struct Registry {
    elements: HashMap<ElementId, web_sys::Element>,
}

impl Registry {
    fn id_of(&mut self, element: &web_sys::Element) -> ElementId {
        let existing = element
            .get_attribute(ID_ATTRIBUTE)
            .and_then(|v| Uuid::parse_str(&v).ok())
            .map(ElementId::from_uuid);
        let id = existing.unwrap_or_else(|| {
            let id = ElementId::new();
            if let Err(err) = element.set_attribute(ID_ATTRIBUTE, &id.to_string()) {
                log::warn!("Failed to tag element: {err:?}");
            }
            id
        });
        self.elements.entry(id).or_insert_with(|| element.clone());
        id
    }
}

struct Registered {
    target: web_sys::EventTarget,
    kind: EventKind,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

/// [`Dom`] implementation over the browser document.
pub struct WebDom {
    window: web_sys::Window,
    document: web_sys::Document,
    registry: Rc<RefCell<Registry>>,
    queue: Rc<RefCell<EventQueue>>,
    listeners: HashMap<ListenerId, Registered>,
    platform: Platform,
}

fn platform_error(err: wasm_bindgen::JsValue) -> DomError {
    DomError::Platform(format!("{err:?}"))
}

impl WebDom {
    /// Attach to the current window's document.
    pub fn new() -> DomResult<Self> {
        let window = web_sys::window().ok_or_else(|| DomError::Platform("no window".to_string()))?;
        let document = window
            .document()
            .ok_or_else(|| DomError::Platform("no document".to_string()))?;
        let user_agent = window.navigator().user_agent().unwrap_or_default();
        let is_ios = ["iPad", "iPhone", "iPod"].iter().any(|d| user_agent.contains(d));
        Ok(Self {
            window,
            document,
            registry: Rc::new(RefCell::new(Registry::default())),
            queue: Rc::new(RefCell::new(EventQueue::new())),
            listeners: HashMap::new(),
            platform: Platform {
                supports_native_drag: !is_ios,
                is_ios,
            },
        })
    }

    /// Get (or assign) the id of a browser element.
    pub fn register(&self, element: &web_sys::Element) -> ElementId {
        self.registry.borrow_mut().id_of(element)
    }

    /// The browser element behind an id.
    pub fn element(&self, id: ElementId) -> Option<web_sys::Element> {
        self.registry.borrow().elements.get(&id).cloned()
    }

    /// Take every queued event in arrival order.
    pub fn drain_events(&self) -> Vec<DomEvent> {
        self.queue.borrow_mut().drain()
    }

    fn require(&self, id: ElementId) -> DomResult<web_sys::Element> {
        self.element(id).ok_or(DomError::UnknownElement(id))
    }

    fn html(&self, id: ElementId) -> DomResult<web_sys::HtmlElement> {
        self.require(id)?
            .dyn_into::<web_sys::HtmlElement>()
            .map_err(|_| DomError::Platform(format!("{id} is not an HTML element")))
    }
}

/// Dispatch id of a browser event, stamping it on first sight.
fn dispatch_of(event: &web_sys::Event, queue: &RefCell<EventQueue>) -> u64 {
    let key = JsValue::from_str(DISPATCH_PROPERTY);
    if let Some(id) = js_sys::Reflect::get(event, &key).ok().and_then(|v| v.as_f64()) {
        return id as u64;
    }
    let id = queue.borrow_mut().next_dispatch();
    if let Err(err) = js_sys::Reflect::set(event, &key, &JsValue::from_f64(id as f64)) {
        log::warn!("Failed to stamp {} event: {err:?}", event.type_());
    }
    id
}

fn convert(event: &web_sys::Event, kind: EventKind, registry: &RefCell<Registry>) -> Option<DomEvent> {
    let now = Instant::now();
    let mut registry = registry.borrow_mut();
    let mut element_of = |t: Option<web_sys::EventTarget>| {
        t.and_then(|t| t.dyn_into::<web_sys::Element>().ok())
            .map(|el| registry.id_of(&el))
    };

    let drag_phase = match kind {
        EventKind::DragStart => Some(NativeDragPhase::Start),
        EventKind::DragEnter => Some(NativeDragPhase::Enter),
        EventKind::DragOver => Some(NativeDragPhase::Over),
        EventKind::DragLeave => Some(NativeDragPhase::Leave),
        EventKind::Drop => Some(NativeDragPhase::Drop),
        EventKind::DragEnd => Some(NativeDragPhase::End),
        _ => None,
    };
    if let Some(phase) = drag_phase {
        if matches!(phase, NativeDragPhase::Over | NativeDragPhase::Drop) {
            event.prevent_default();
        }
        let mouse = event.dyn_ref::<web_sys::MouseEvent>()?;
        let position = Point::new(mouse.client_x() as f64, mouse.client_y() as f64);
        return Some(NativeDragEvent::new(phase, position, element_of(event.target()), now).into());
    }

    let phase = match kind {
        EventKind::PointerDown => PointerPhase::Down,
        EventKind::PointerMove => PointerPhase::Move,
        EventKind::PointerUp => PointerPhase::Up,
        EventKind::PointerCancel => PointerPhase::Cancel,
        EventKind::PointerEnter => PointerPhase::Enter,
        EventKind::PointerLeave => PointerPhase::Leave,
        _ => return None,
    };
    let pointer = event.dyn_ref::<web_sys::PointerEvent>()?;
    let pointer_type = match pointer.pointer_type().as_str() {
        "touch" => PointerType::Touch,
        "pen" => PointerType::Pen,
        _ => PointerType::Mouse,
    };
    let button = match pointer.button() {
        1 => MouseButton::Middle,
        2 => MouseButton::Right,
        _ => MouseButton::Left,
    };
    let mut out = PointerEvent::new(
        phase,
        Point::new(pointer.client_x() as f64, pointer.client_y() as f64),
        now,
    )
    .with_pointer_type(pointer_type)
    .with_button(button)
    .with_target(element_of(event.target()))
    .with_related_target(element_of(pointer.related_target()));
    out.modifiers = Modifiers {
        shift: pointer.shift_key(),
        ctrl: pointer.ctrl_key(),
        alt: pointer.alt_key(),
        meta: pointer.meta_key(),
    };
    Some(out.into())
}

impl Dom for WebDom {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn body(&self) -> ElementId {
        match self.document.body() {
            Some(body) => self.register(&body),
            None => self
                .document
                .document_element()
                .map(|root| self.register(&root))
                .unwrap_or_default(),
        }
    }

    fn exists(&self, element: ElementId) -> bool {
        self.element(element).is_some()
    }

    fn parent(&self, element: ElementId) -> Option<ElementId> {
        let parent = self.element(element)?.parent_element()?;
        Some(self.register(&parent))
    }

    fn children(&self, element: ElementId) -> Vec<ElementId> {
        let Some(el) = self.element(element) else {
            return Vec::new();
        };
        let children = el.children();
        (0..children.length())
            .filter_map(|i| children.item(i))
            .map(|child| self.register(&child))
            .collect()
    }

    fn tag_name(&self, element: ElementId) -> Option<String> {
        Some(self.element(element)?.tag_name().to_ascii_lowercase())
    }

    fn rect(&self, element: ElementId) -> Option<Rect> {
        let r = self.element(element)?.get_bounding_client_rect();
        Some(Rect::new(r.left(), r.top(), r.right(), r.bottom()))
    }

    fn tracks_transitions(&self) -> bool {
        true
    }

    fn computed_style(&self, element: ElementId, property: &str) -> Option<String> {
        let el = self.element(element)?;
        let style = self.window.get_computed_style(&el).ok()??;
        style.get_property_value(property).ok().filter(|v| !v.is_empty())
    }

    fn inline_style(&self, element: ElementId, property: &str) -> Option<String> {
        let el = self.html(element).ok()?;
        el.style().get_property_value(property).ok().filter(|v| !v.is_empty())
    }

    fn set_style(&mut self, element: ElementId, property: &str, value: &str) -> DomResult<()> {
        self.html(element)?
            .style()
            .set_property(property, value)
            .map_err(platform_error)
    }

    fn remove_style(&mut self, element: ElementId, property: &str) -> DomResult<()> {
        self.html(element)?
            .style()
            .remove_property(property)
            .map(|_| ())
            .map_err(platform_error)
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
        self.element(element)?.get_attribute(name)
    }

    fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) -> DomResult<()> {
        self.require(element)?.set_attribute(name, value).map_err(platform_error)
    }

    fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.element(element).is_some_and(|el| el.class_list().contains(class))
    }

    fn add_class(&mut self, element: ElementId, class: &str) -> DomResult<()> {
        let list = self.require(element)?.class_list();
        for c in class.split_whitespace() {
            list.add_1(c).map_err(platform_error)?;
        }
        Ok(())
    }

    fn remove_class(&mut self, element: ElementId, class: &str) -> DomResult<()> {
        let list = self.require(element)?.class_list();
        for c in class.split_whitespace() {
            list.remove_1(c).map_err(platform_error)?;
        }
        Ok(())
    }

    fn create_element(&mut self, tag: &str) -> ElementId {
        match self.document.create_element(tag) {
            Ok(el) => self.register(&el),
            Err(err) => {
                log::error!("Failed to create <{tag}>: {err:?}");
                ElementId::new()
            }
        }
    }

    fn clone_element(&mut self, element: ElementId, deep: bool) -> DomResult<ElementId> {
        let copy = self
            .require(element)?
            .clone_node_with_deep(deep)
            .map_err(platform_error)?
            .dyn_into::<web_sys::Element>()
            .map_err(|_| DomError::Platform("clone is not an element".to_string()))?;
        copy.remove_attribute(ID_ATTRIBUTE).map_err(platform_error)?;
        let tagged = copy
            .query_selector_all(&format!("[{ID_ATTRIBUTE}]"))
            .map_err(platform_error)?;
        for i in 0..tagged.length() {
            if let Some(node) = tagged.item(i).and_then(|n| n.dyn_into::<web_sys::Element>().ok()) {
                node.remove_attribute(ID_ATTRIBUTE).map_err(platform_error)?;
            }
        }
        Ok(self.register(&copy))
    }

    fn insert_before(&mut self, parent: ElementId, child: ElementId, reference: Option<ElementId>) -> DomResult<()> {
        let parent_el = self.require(parent)?;
        let child_el = self.require(child)?;
        let reference_el = match reference {
            Some(r) => Some(self.require(r)?),
            None => None,
        };
        let reference_node: Option<&web_sys::Node> = reference_el.as_ref().map(|r| r.as_ref());
        parent_el
            .insert_before(&child_el, reference_node)
            .map(|_| ())
            .map_err(|_| DomError::InvalidInsertion {
                parent,
                child,
                reason: "rejected by the document",
            })
    }

    fn remove(&mut self, element: ElementId) -> DomResult<()> {
        self.require(element)?.remove();
        Ok(())
    }

    fn scroll_offset(&self, element: ElementId) -> Vec2 {
        self.element(element)
            .map(|el| Vec2::new(el.scroll_left() as f64, el.scroll_top() as f64))
            .unwrap_or(Vec2::ZERO)
    }

    fn scroll_by(&mut self, element: ElementId, delta: Vec2) -> DomResult<()> {
        let el = self.require(element)?;
        el.set_scroll_left(el.scroll_left() + delta.x.round() as i32);
        el.set_scroll_top(el.scroll_top() + delta.y.round() as i32);
        Ok(())
    }

    fn element_from_point(&self, point: Point) -> Option<ElementId> {
        let el = self.document.element_from_point(point.x as f32, point.y as f32)?;
        Some(self.register(&el))
    }

    fn add_listener(&mut self, target: ListenTarget, kind: EventKind) -> DomResult<ListenerId> {
        let event_target: web_sys::EventTarget = match target {
            ListenTarget::Document => self.document.clone().into(),
            ListenTarget::Element(el) => self.require(el)?.into(),
        };
        let queue = Rc::clone(&self.queue);
        let registry = Rc::clone(&self.registry);
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
            let dispatch = dispatch_of(&event, &queue);
            if let Some(converted) = convert(&event, kind, &registry) {
                queue.borrow_mut().push(dispatch, converted);
            }
        });
        event_target
            .add_event_listener_with_callback(kind.as_str(), closure.as_ref().unchecked_ref())
            .map_err(platform_error)?;

        let id = ListenerId::new();
        self.listeners.insert(
            id,
            Registered {
                target: event_target,
                kind,
                closure,
            },
        );
        Ok(id)
    }

    fn remove_listener(&mut self, id: ListenerId) -> bool {
        let Some(registered) = self.listeners.remove(&id) else {
            return false;
        };
        if let Err(err) = registered
            .target
            .remove_event_listener_with_callback(registered.kind.as_str(), registered.closure.as_ref().unchecked_ref())
        {
            log::warn!("Failed to remove {} listener: {err:?}", registered.kind.as_str());
        }
        true
    }
}
