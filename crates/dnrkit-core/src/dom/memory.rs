//! In-memory element tree.

use super::{Dom, DomError, DomResult, ElementId, EventKind, ListenTarget, ListenerId, Platform};
use crate::geometry::parse_px;
use crate::geometry::transform::translation_of_css;
use kurbo::{Point, Rect, Size, Vec2};
use std::collections::{BTreeMap, HashMap};

/// Main axis of a flow container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowAxis {
    Horizontal,
    Vertical,
}

/// Simple block/inline layout: children are stacked along one axis in DOM
/// order, each taking its own size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowLayout {
    pub axis: FlowAxis,
    pub gap: f64,
}

#[derive(Debug, Clone, Default)]
struct Node {
    tag: String,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    inline: BTreeMap<String, String>,
    computed: BTreeMap<String, String>,
    rect: Option<Rect>,
    size: Option<Size>,
    scroll: Vec2,
    flow: Option<FlowLayout>,
}

/// In-memory storage for an element tree, used by tests and headless hosts.
///
/// Geometry is explicit: an element's rect is either set directly, derived from
/// a flow-layout parent, or derived from inline `left`/`top`/`width`/`height`
/// pixel styles relative to its parent. The translation of the computed
/// `transform` (the inline one unless overridden) is applied on top, as a
/// browser's bounding rect would. By default transitions jump to their end
/// value; see [`MemoryDom::set_tracks_transitions`] for hosts that report
/// them mid-flight.
#[derive(Debug, Clone)]
pub struct MemoryDom {
    nodes: HashMap<ElementId, Node>,
    body: ElementId,
    listeners: HashMap<ListenerId, (ListenTarget, EventKind)>,
    platform: Platform,
    tracks_transitions: bool,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    /// Create a document with an empty 1024x768 body.
    pub fn new() -> Self {
        let body = ElementId::new();
        let mut nodes = HashMap::new();
        nodes.insert(
            body,
            Node {
                tag: "body".to_string(),
                rect: Some(Rect::new(0.0, 0.0, 1024.0, 768.0)),
                ..Node::default()
            },
        );
        Self {
            nodes,
            body,
            listeners: HashMap::new(),
            platform: Platform::default(),
            tracks_transitions: false,
        }
    }

    pub fn set_platform(&mut self, platform: Platform) {
        self.platform = platform;
    }

    /// Report transitions as they play. The host then sets each animating
    /// element's computed `transform` to its current value.
    pub fn set_tracks_transitions(&mut self, enabled: bool) {
        self.tracks_transitions = enabled;
    }

    /// Drop a computed style override.
    pub fn clear_computed_style(&mut self, element: ElementId, property: &str) {
        if let Some(node) = self.nodes.get_mut(&element) {
            node.computed.remove(property);
        }
    }

    /// Set an element's client rect.
    pub fn set_rect(&mut self, element: ElementId, rect: Rect) {
        if let Some(node) = self.nodes.get_mut(&element) {
            node.rect = Some(rect);
        }
    }

    /// Set the size an element takes inside a flow container.
    pub fn set_size(&mut self, element: ElementId, size: Size) {
        if let Some(node) = self.nodes.get_mut(&element) {
            node.size = Some(size);
        }
    }

    /// Lay out an element's children in a flow.
    pub fn set_flow(&mut self, element: ElementId, axis: FlowAxis, gap: f64) {
        if let Some(node) = self.nodes.get_mut(&element) {
            node.flow = Some(FlowLayout { axis, gap });
        }
    }

    /// Override a computed style value (as a stylesheet would).
    pub fn set_computed_style(&mut self, element: ElementId, property: &str, value: &str) {
        if let Some(node) = self.nodes.get_mut(&element) {
            node.computed.insert(property.to_string(), value.to_string());
        }
    }

    /// Create an element, append it to `parent` and give it a rect.
    pub fn spawn(&mut self, parent: ElementId, tag: &str, rect: Rect) -> DomResult<ElementId> {
        let element = self.create_element(tag);
        self.insert_before(parent, element, None)?;
        self.set_rect(element, rect);
        self.set_size(element, rect.size());
        Ok(element)
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Listeners attached to a target.
    pub fn listeners_on(&self, target: ListenTarget) -> Vec<EventKind> {
        self.listeners
            .values()
            .filter(|(t, _)| *t == target)
            .map(|(_, k)| *k)
            .collect()
    }

    fn node_mut(&mut self, element: ElementId) -> DomResult<&mut Node> {
        self.nodes.get_mut(&element).ok_or(DomError::UnknownElement(element))
    }

    fn own_size(&self, element: ElementId) -> Size {
        self.nodes
            .get(&element)
            .and_then(|n| n.size.or(n.rect.map(|r| r.size())))
            .unwrap_or(Size::ZERO)
    }

    fn flow_rect(&self, parent: ElementId, flow: FlowLayout, element: ElementId) -> Option<Rect> {
        let parent_node = self.nodes.get(&parent)?;
        let origin = self.rect(parent)?.origin() - parent_node.scroll;
        let mut offset = 0.0;
        for &child in &parent_node.children {
            if !self.is_displayed(child) || !self.in_flow(child) {
                continue;
            }
            let size = self.own_size(child);
            if child == element {
                let at = match flow.axis {
                    FlowAxis::Horizontal => origin + Vec2::new(offset, 0.0),
                    FlowAxis::Vertical => origin + Vec2::new(0.0, offset),
                };
                return Some(Rect::from_origin_size(at, size));
            }
            offset += match flow.axis {
                FlowAxis::Horizontal => size.width,
                FlowAxis::Vertical => size.height,
            } + flow.gap;
        }
        None
    }

    fn in_flow(&self, element: ElementId) -> bool {
        !matches!(self.computed_style(element, "position").as_deref(), Some("absolute" | "fixed"))
    }

    fn positioned_rect(&self, node: &Node) -> Option<Rect> {
        let parent_rect = self.rect(node.parent?)?;
        let read = |p: &str| node.inline.get(p).and_then(|v| parse_px(v));
        let (left, top, width, height) = (read("left"), read("top"), read("width"), read("height"));
        if left.is_none() && top.is_none() && width.is_none() {
            return None;
        }
        let fallback = node.size.unwrap_or(Size::ZERO);
        let origin = parent_rect.origin() + Vec2::new(left.unwrap_or(0.0), top.unwrap_or(0.0));
        Some(Rect::from_origin_size(
            origin,
            Size::new(width.unwrap_or(fallback.width), height.unwrap_or(fallback.height)),
        ))
    }

    fn hit_test(&self, element: ElementId, point: Point, hit: &mut Option<ElementId>) {
        if !self.is_displayed(element) || self.computed_style(element, "pointer-events").as_deref() == Some("none") {
            return;
        }
        if self.rect(element).is_some_and(|r| r.contains(point)) {
            *hit = Some(element);
        }
        if let Some(node) = self.nodes.get(&element) {
            for &child in &node.children {
                self.hit_test(child, point, hit);
            }
        }
    }

    fn clone_node(&mut self, element: ElementId, deep: bool) -> DomResult<ElementId> {
        let source = self.nodes.get(&element).ok_or(DomError::UnknownElement(element))?.clone();
        let id = ElementId::new();
        let children = if deep { source.children.clone() } else { Vec::new() };
        self.nodes.insert(
            id,
            Node {
                parent: None,
                children: Vec::new(),
                ..source
            },
        );
        for child in children {
            let copy = self.clone_node(child, true)?;
            self.insert_before(id, copy, None)?;
        }
        Ok(id)
    }

    fn detach(&mut self, element: ElementId) {
        let parent = self.nodes.get_mut(&element).and_then(|n| n.parent.take());
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|&c| c != element);
        }
    }
}

impl Dom for MemoryDom {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn body(&self) -> ElementId {
        self.body
    }

    fn exists(&self, element: ElementId) -> bool {
        self.nodes.contains_key(&element)
    }

    fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.nodes.get(&element)?.parent
    }

    fn children(&self, element: ElementId) -> Vec<ElementId> {
        self.nodes.get(&element).map(|n| n.children.clone()).unwrap_or_default()
    }

    fn tag_name(&self, element: ElementId) -> Option<String> {
        self.nodes.get(&element).map(|n| n.tag.clone())
    }

    fn rect(&self, element: ElementId) -> Option<Rect> {
        let node = self.nodes.get(&element)?;
        if self.computed_style(element, "display").as_deref() == Some("none") {
            return None;
        }
        let flow = node
            .parent
            .filter(|_| self.in_flow(element))
            .and_then(|p| self.nodes.get(&p)?.flow.map(|f| (p, f)));
        let base = match flow {
            Some((parent, flow)) => self.flow_rect(parent, flow, element),
            None => node.rect.or_else(|| self.positioned_rect(node)),
        }?;
        Some(base + translation_of_css(self.computed_style(element, "transform").as_deref()))
    }

    fn tracks_transitions(&self) -> bool {
        self.tracks_transitions
    }

    fn computed_style(&self, element: ElementId, property: &str) -> Option<String> {
        let node = self.nodes.get(&element)?;
        if let Some(v) = node.computed.get(property).or_else(|| node.inline.get(property)) {
            return Some(v.clone());
        }
        let default = match property {
            "display" => "block",
            "position" => "static",
            "transform" => "none",
            "pointer-events" => "auto",
            "flex-direction" => "row",
            _ => return None,
        };
        Some(default.to_string())
    }

    fn inline_style(&self, element: ElementId, property: &str) -> Option<String> {
        self.nodes.get(&element)?.inline.get(property).cloned()
    }

    fn set_style(&mut self, element: ElementId, property: &str, value: &str) -> DomResult<()> {
        self.node_mut(element)?.inline.insert(property.to_string(), value.to_string());
        Ok(())
    }

    fn remove_style(&mut self, element: ElementId, property: &str) -> DomResult<()> {
        self.node_mut(element)?.inline.remove(property);
        Ok(())
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
        self.nodes.get(&element)?.attributes.get(name).cloned()
    }

    fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) -> DomResult<()> {
        self.node_mut(element)?.attributes.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.nodes.get(&element).is_some_and(|n| n.classes.iter().any(|c| c == class))
    }

    fn add_class(&mut self, element: ElementId, class: &str) -> DomResult<()> {
        let node = self.node_mut(element)?;
        for c in class.split_whitespace() {
            if !node.classes.iter().any(|existing| existing == c) {
                node.classes.push(c.to_string());
            }
        }
        Ok(())
    }

    fn remove_class(&mut self, element: ElementId, class: &str) -> DomResult<()> {
        let node = self.node_mut(element)?;
        let remove: Vec<&str> = class.split_whitespace().collect();
        node.classes.retain(|c| !remove.contains(&c.as_str()));
        Ok(())
    }

    fn create_element(&mut self, tag: &str) -> ElementId {
        let id = ElementId::new();
        self.nodes.insert(
            id,
            Node {
                tag: tag.to_ascii_lowercase(),
                ..Node::default()
            },
        );
        id
    }

    fn clone_element(&mut self, element: ElementId, deep: bool) -> DomResult<ElementId> {
        self.clone_node(element, deep)
    }

    fn insert_before(&mut self, parent: ElementId, child: ElementId, reference: Option<ElementId>) -> DomResult<()> {
        if !self.exists(parent) {
            return Err(DomError::UnknownElement(parent));
        }
        if !self.exists(child) {
            return Err(DomError::UnknownElement(child));
        }
        if self.contains(child, parent) {
            return Err(DomError::InvalidInsertion {
                parent,
                child,
                reason: "child contains parent",
            });
        }
        if let Some(reference) = reference {
            if reference == child {
                return Ok(());
            }
            if self.parent(reference) != Some(parent) {
                return Err(DomError::InvalidInsertion {
                    parent,
                    child,
                    reason: "reference is not a child of parent",
                });
            }
        }

        self.detach(child);
        let siblings = &mut self.node_mut(parent)?.children;
        let index = reference
            .and_then(|r| siblings.iter().position(|&c| c == r))
            .unwrap_or(siblings.len());
        siblings.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    fn remove(&mut self, element: ElementId) -> DomResult<()> {
        if !self.exists(element) {
            return Err(DomError::UnknownElement(element));
        }
        self.detach(element);
        Ok(())
    }

    fn scroll_offset(&self, element: ElementId) -> Vec2 {
        self.nodes.get(&element).map(|n| n.scroll).unwrap_or(Vec2::ZERO)
    }

    fn scroll_by(&mut self, element: ElementId, delta: Vec2) -> DomResult<()> {
        let node = self.node_mut(element)?;
        node.scroll = Vec2::new((node.scroll.x + delta.x).max(0.0), (node.scroll.y + delta.y).max(0.0));
        Ok(())
    }

    fn element_from_point(&self, point: Point) -> Option<ElementId> {
        let mut hit = None;
        self.hit_test(self.body, point, &mut hit);
        hit
    }

    fn add_listener(&mut self, target: ListenTarget, kind: EventKind) -> DomResult<ListenerId> {
        if let ListenTarget::Element(el) = target {
            if !self.exists(el) {
                return Err(DomError::UnknownElement(el));
            }
        }
        let id = ListenerId::new();
        self.listeners.insert(id, (target, kind));
        Ok(id)
    }

    fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_reorder() {
        let mut dom = MemoryDom::new();
        let list = dom.create_element("ul");
        let a = dom.create_element("li");
        let b = dom.create_element("li");
        let c = dom.create_element("li");
        for el in [a, b, c] {
            dom.append_child(list, el).unwrap();
        }

        dom.insert_before(list, a, None).unwrap();
        assert_eq!(dom.children(list), vec![b, c, a]);

        dom.insert_before(list, a, Some(b)).unwrap();
        assert_eq!(dom.children(list), vec![a, b, c]);
    }

    #[test]
    fn test_insert_cycle_rejected() {
        let mut dom = MemoryDom::new();
        let outer = dom.create_element("div");
        let inner = dom.create_element("div");
        dom.append_child(outer, inner).unwrap();
        let result = dom.append_child(inner, outer);
        assert!(matches!(result, Err(DomError::InvalidInsertion { .. })));
    }

    #[test]
    fn test_flow_layout_follows_order() {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        let list = dom.spawn(body, "ul", Rect::new(0.0, 0.0, 100.0, 300.0)).unwrap();
        dom.set_flow(list, FlowAxis::Vertical, 0.0);
        let a = dom.spawn(list, "li", Rect::new(0.0, 0.0, 100.0, 30.0)).unwrap();
        let b = dom.spawn(list, "li", Rect::new(0.0, 0.0, 100.0, 30.0)).unwrap();

        assert_eq!(dom.rect(b), Some(Rect::new(0.0, 30.0, 100.0, 60.0)));
        dom.insert_before(list, b, Some(a)).unwrap();
        assert_eq!(dom.rect(b), Some(Rect::new(0.0, 0.0, 100.0, 30.0)));
        assert_eq!(dom.rect(a), Some(Rect::new(0.0, 30.0, 100.0, 60.0)));
    }

    #[test]
    fn test_rect_includes_inline_translation() {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        let el = dom.spawn(body, "div", Rect::new(10.0, 10.0, 20.0, 20.0)).unwrap();
        dom.set_style(el, "transform", "translate3d(5px, -5px, 0)").unwrap();
        assert_eq!(dom.rect(el), Some(Rect::new(15.0, 5.0, 25.0, 15.0)));
    }

    #[test]
    fn test_live_transform_moves_rect_not_layout() {
        let mut dom = MemoryDom::new();
        dom.set_tracks_transitions(true);
        let body = dom.body();
        let el = dom.spawn(body, "div", Rect::new(10.0, 10.0, 20.0, 20.0)).unwrap();
        dom.set_style(el, "transform", "translate3d(0px, 0px, 0)").unwrap();
        dom.set_computed_style(el, "transform", "matrix(1, 0, 0, 1, 0, 12)");

        assert!(dom.tracks_transitions());
        assert_eq!(dom.rect(el), Some(Rect::new(10.0, 22.0, 20.0, 32.0)));
        assert_eq!(dom.layout_rect(el), Some(Rect::new(10.0, 10.0, 20.0, 20.0)));

        dom.clear_computed_style(el, "transform");
        assert_eq!(dom.rect(el), dom.layout_rect(el));
    }

    #[test]
    fn test_positioned_child_rect() {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        let parent = dom.spawn(body, "div", Rect::new(100.0, 100.0, 300.0, 300.0)).unwrap();
        let child = dom.create_element("div");
        dom.append_child(parent, child).unwrap();
        dom.set_style(child, "left", "-4px").unwrap();
        dom.set_style(child, "top", "10px").unwrap();
        dom.set_style(child, "width", "8px").unwrap();
        dom.set_style(child, "height", "8px").unwrap();
        assert_eq!(dom.rect(child), Some(Rect::new(96.0, 110.0, 104.0, 118.0)));
    }

    #[test]
    fn test_element_from_point_skips_pointer_events_none() {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        let below = dom.spawn(body, "div", Rect::new(0.0, 0.0, 50.0, 50.0)).unwrap();
        let above = dom.spawn(body, "div", Rect::new(0.0, 0.0, 50.0, 50.0)).unwrap();
        assert_eq!(dom.element_from_point(Point::new(10.0, 10.0)), Some(above));

        dom.set_style(above, "pointer-events", "none").unwrap();
        assert_eq!(dom.element_from_point(Point::new(10.0, 10.0)), Some(below));
        assert_eq!(dom.element_from_point(Point::new(2000.0, 10.0)), None);
    }

    #[test]
    fn test_deep_clone_is_detached() {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        let item = dom.spawn(body, "li", Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        let label = dom.create_element("span");
        dom.append_child(item, label).unwrap();
        dom.add_class(item, "row").unwrap();

        let copy = dom.clone_element(item, true).unwrap();
        assert_eq!(dom.parent(copy), None);
        assert!(dom.has_class(copy, "row"));
        assert_eq!(dom.children(copy).len(), 1);
        assert_ne!(dom.children(copy)[0], label);
    }

    #[test]
    fn test_listener_bookkeeping() {
        let mut dom = MemoryDom::new();
        let el = dom.create_element("div");
        let id = dom.add_listener(ListenTarget::Element(el), EventKind::PointerDown).unwrap();
        dom.add_listener(ListenTarget::Document, EventKind::PointerMove).unwrap();
        assert_eq!(dom.listener_count(), 2);
        assert_eq!(dom.listeners_on(ListenTarget::Element(el)), vec![EventKind::PointerDown]);
        assert!(dom.remove_listener(id));
        assert!(!dom.remove_listener(id));
        assert_eq!(dom.listener_count(), 1);
    }
}
