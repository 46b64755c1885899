//! Resize handle nodes and handle location strategies.

use crate::dom::{Dom, DomResult, ElementId, EventKind, ListenTarget, ListenerId};
use crate::geometry::px;
use crate::handle::HandlePosition;
use crate::input::PointerEvent;
use crate::store::InteractionScope;
use crate::style::StyleMap;
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Class put on every handle node.
pub const HANDLE_CLASS: &str = "dnr-handle";

/// Share of the border threshold used by edge (non-corner) zones.
const EDGE_THRESHOLD_FACTOR: f64 = 0.8;

/// Caller overrides layered over the built-in handle style.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HandleStyles {
    pub default: StyleMap,
    pub hover: StyleMap,
    pub active: StyleMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HandleNode {
    element: ElementId,
    /// Created by the arena (removed on teardown) rather than supplied by the caller.
    created: bool,
    /// Position, size and cursor are written by the arena.
    auto_style: bool,
    listener: ListenerId,
}

/// Handle nodes owned by one resizable engine.
///
/// Every node carries a pointer-down listener and is registered with the
/// scope so draggables ignore presses on it. [`HandleArena::teardown`] must
/// run whenever the nodes stop being needed.
#[derive(Debug, Default)]
pub struct HandleArena {
    nodes: BTreeMap<HandlePosition, HandleNode>,
}

impl HandleArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn element_of(&self, position: HandlePosition) -> Option<ElementId> {
        self.nodes.get(&position).map(|n| n.element)
    }

    /// Create one node per handle, appended to `target`.
    pub fn build(
        &mut self,
        dom: &mut dyn Dom,
        scope: &InteractionScope,
        target: ElementId,
        handles: &[HandlePosition],
    ) -> DomResult<()> {
        for &position in handles {
            let node = dom.create_element("div");
            dom.add_class(node, HANDLE_CLASS)?;
            dom.add_class(node, &format!("{HANDLE_CLASS}-{position}"))?;
            dom.set_attribute(node, "data-handle", position.as_str())?;
            dom.append_child(target, node)?;
            self.insert(dom, scope, position, node, true, true)?;
        }
        log::debug!("Built {} resize handles on {target}", handles.len());
        Ok(())
    }

    /// Adopt a caller-supplied node for `position`, replacing any previous one.
    ///
    /// The node is laid out by the arena unless it already has an inline
    /// `position`.
    pub fn register(
        &mut self,
        dom: &mut dyn Dom,
        scope: &InteractionScope,
        position: HandlePosition,
        element: ElementId,
    ) -> DomResult<()> {
        if self.element_of(position) == Some(element) {
            return Ok(());
        }
        self.unregister(dom, scope, position);
        dom.remove_style(element, "display")?;
        let auto_style = dom.inline_style(element, "position").is_none();
        self.insert(dom, scope, position, element, false, auto_style)
    }

    fn insert(
        &mut self,
        dom: &mut dyn Dom,
        scope: &InteractionScope,
        position: HandlePosition,
        element: ElementId,
        created: bool,
        auto_style: bool,
    ) -> DomResult<()> {
        let listener = dom.add_listener(ListenTarget::Element(element), EventKind::PointerDown)?;
        scope.register_handle_element(element);
        self.nodes.insert(
            position,
            HandleNode {
                element,
                created,
                auto_style,
                listener,
            },
        );
        Ok(())
    }

    /// Release one node. Returns false when nothing was registered.
    pub fn unregister(&mut self, dom: &mut dyn Dom, scope: &InteractionScope, position: HandlePosition) -> bool {
        let Some(node) = self.nodes.remove(&position) else {
            return false;
        };
        release(dom, scope, node);
        true
    }

    /// Release every node: listeners removed, created nodes detached, caller
    /// nodes hidden.
    pub fn teardown(&mut self, dom: &mut dyn Dom, scope: &InteractionScope) {
        for (_, node) in std::mem::take(&mut self.nodes) {
            release(dom, scope, node);
        }
    }

    /// Position every node around a box of `size` and apply state styles.
    pub fn layout(
        &self,
        dom: &mut dyn Dom,
        size: Size,
        handle_size: f64,
        styles: &HandleStyles,
        hover: Option<HandlePosition>,
        active: Option<HandlePosition>,
    ) -> DomResult<()> {
        let frame = Rect::from_origin_size(Point::ZERO, size);
        for (&position, node) in &self.nodes {
            let mut style = StyleMap::new();
            if node.auto_style {
                let at = position.point_on(frame);
                style
                    .set("position", "absolute")
                    .set("left", px(at.x - handle_size / 2.0))
                    .set("top", px(at.y - handle_size / 2.0))
                    .set("width", px(handle_size))
                    .set("height", px(handle_size))
                    .set("cursor", position.cursor());
                if node.created {
                    style.set("background", "#fff").set("border", "1px solid #4a90d9").set("box-sizing", "border-box");
                }
            }
            style.merge(&styles.default);
            if hover == Some(position) {
                style.merge(&styles.hover);
            }
            if active == Some(position) {
                style.merge(&styles.active);
            }
            style.apply(dom, node.element)?;
        }
        Ok(())
    }

    /// Handle whose node is (or contains) the event target, or whose rect
    /// contains the pointer.
    pub fn locate(&self, dom: &dyn Dom, event: &PointerEvent, enabled: &[HandlePosition]) -> Option<HandlePosition> {
        let candidates = self.nodes.iter().filter(|(p, _)| enabled.contains(p));
        if let Some(target) = event.target {
            let hit = candidates
                .clone()
                .find(|(_, node)| dom.contains(node.element, target))
                .map(|(&p, _)| p);
            if hit.is_some() {
                return hit;
            }
        }
        candidates
            .filter(|(_, node)| dom.rect(node.element).is_some_and(|r| r.contains(event.position)))
            .map(|(&p, _)| p)
            .next()
    }

    pub fn listener_ids(&self) -> Vec<ListenerId> {
        self.nodes.values().map(|n| n.listener).collect()
    }
}

fn release(dom: &mut dyn Dom, scope: &InteractionScope, node: HandleNode) {
    dom.remove_listener(node.listener);
    scope.unregister_handle_element(node.element);
    let result = if node.created {
        dom.remove(node.element)
    } else {
        dom.set_style(node.element, "display", "none")
    };
    if let Err(err) = result {
        log::warn!("Failed to release handle node: {err}");
    }
}

/// Locate a border zone for a pointer position.
///
/// The zone extends `threshold` on both sides of each edge. Corners win when
/// the pointer is within `threshold` of two perpendicular edges; edges use a
/// tighter zone.
pub fn locate_border(rect: Rect, point: Point, threshold: f64, enabled: &[HandlePosition]) -> Option<HandlePosition> {
    if threshold <= 0.0 || !rect.inflate(threshold, threshold).contains(point) {
        return None;
    }
    let d_left = (point.x - rect.x0).abs();
    let d_right = (rect.x1 - point.x).abs();
    let d_top = (point.y - rect.y0).abs();
    let d_bottom = (rect.y1 - point.y).abs();

    let side = |near: f64, far: f64, limit: f64, a: bool, b: bool| match (near <= limit, far <= limit) {
        (true, true) => Some(if near <= far { a } else { b }),
        (true, false) => Some(a),
        (false, true) => Some(b),
        (false, false) => None,
    };

    let mut candidates = Vec::with_capacity(3);
    let corner_x = side(d_left, d_right, threshold, true, false);
    let corner_y = side(d_top, d_bottom, threshold, true, false);
    if let (Some(left), Some(top)) = (corner_x, corner_y) {
        candidates.push(match (left, top) {
            (true, true) => HandlePosition::TopLeft,
            (false, true) => HandlePosition::TopRight,
            (true, false) => HandlePosition::BottomLeft,
            (false, false) => HandlePosition::BottomRight,
        });
    }

    let edge = threshold * EDGE_THRESHOLD_FACTOR;
    let within_x = point.x >= rect.x0 - edge && point.x <= rect.x1 + edge;
    let within_y = point.y >= rect.y0 - edge && point.y <= rect.y1 + edge;
    if within_y {
        if let Some(left) = side(d_left, d_right, edge, true, false) {
            candidates.push(if left { HandlePosition::Left } else { HandlePosition::Right });
        }
    }
    if within_x {
        if let Some(top) = side(d_top, d_bottom, edge, true, false) {
            candidates.push(if top { HandlePosition::Top } else { HandlePosition::Bottom });
        }
    }

    candidates.into_iter().find(|h| enabled.contains(h))
}

/// How the engine finds the handle under a pointer.
#[derive(Debug, Default)]
pub enum HandleStrategy {
    #[default]
    None,
    Borders {
        threshold: f64,
    },
    Nodes(HandleArena),
}

impl HandleStrategy {
    /// Handle under the pointer for `element`, restricted to `enabled`.
    pub fn locate(
        &self,
        dom: &dyn Dom,
        element: ElementId,
        event: &PointerEvent,
        enabled: &[HandlePosition],
    ) -> Option<HandlePosition> {
        match self {
            HandleStrategy::None => None,
            HandleStrategy::Borders { threshold } => {
                let rect = dom.rect(element)?;
                locate_border(rect, event.position, *threshold, enabled)
            }
            HandleStrategy::Nodes(arena) => arena.locate(dom, event, enabled),
        }
    }

    pub fn arena(&self) -> Option<&HandleArena> {
        match self {
            HandleStrategy::Nodes(arena) => Some(arena),
            _ => None,
        }
    }

    pub fn arena_mut(&mut self) -> Option<&mut HandleArena> {
        match self {
            HandleStrategy::Nodes(arena) => Some(arena),
            _ => None,
        }
    }

    /// Release any nodes and fall back to [`HandleStrategy::None`].
    pub fn teardown(&mut self, dom: &mut dyn Dom, scope: &InteractionScope) {
        if let HandleStrategy::Nodes(arena) = self {
            arena.teardown(dom, scope);
        }
        *self = HandleStrategy::None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDom;
    use crate::input::Instant;

    const ALL: [HandlePosition; 8] = HandlePosition::ALL;

    #[test]
    fn test_border_corners_win() {
        let rect = Rect::new(100.0, 100.0, 200.0, 200.0);
        assert_eq!(locate_border(rect, Point::new(98.0, 97.0), 8.0, &ALL), Some(HandlePosition::TopLeft));
        assert_eq!(locate_border(rect, Point::new(205.0, 195.0), 8.0, &ALL), Some(HandlePosition::BottomRight));
        assert_eq!(locate_border(rect, Point::new(150.0, 203.0), 8.0, &ALL), Some(HandlePosition::Bottom));
        assert_eq!(locate_border(rect, Point::new(96.0, 150.0), 8.0, &ALL), Some(HandlePosition::Left));
    }

    #[test]
    fn test_border_edges_use_tighter_zone() {
        let rect = Rect::new(100.0, 100.0, 200.0, 200.0);
        assert_eq!(locate_border(rect, Point::new(150.0, 92.5), 8.0, &ALL), None);
        assert_eq!(locate_border(rect, Point::new(150.0, 93.8), 8.0, &ALL), Some(HandlePosition::Top));
        assert_eq!(locate_border(rect, Point::new(150.0, 150.0), 8.0, &ALL), None);
        assert_eq!(locate_border(rect, Point::new(300.0, 150.0), 8.0, &ALL), None);
    }

    #[test]
    fn test_border_respects_enabled_list() {
        let rect = Rect::new(0.0, 0.0, 100.0, 100.0);
        let only_edges = [HandlePosition::Right, HandlePosition::Bottom];
        assert_eq!(
            locate_border(rect, Point::new(99.0, 99.0), 8.0, &only_edges),
            Some(HandlePosition::Right)
        );
        assert_eq!(locate_border(rect, Point::new(1.0, 1.0), 8.0, &only_edges), None);
    }

    #[test]
    fn test_build_layout_and_teardown() {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        let target = dom.spawn(body, "div", Rect::new(10.0, 10.0, 110.0, 60.0)).unwrap();
        let scope = InteractionScope::new();
        let mut arena = HandleArena::new();

        arena.build(&mut dom, &scope, target, &ALL).unwrap();
        assert_eq!(arena.len(), 8);
        assert_eq!(dom.children(target).len(), 8);
        assert_eq!(dom.listener_count(), 8);

        arena
            .layout(&mut dom, Size::new(100.0, 50.0), 8.0, &HandleStyles::default(), None, None)
            .unwrap();
        let br = arena.element_of(HandlePosition::BottomRight).unwrap();
        assert!(scope.is_handle_element(br));
        assert_eq!(dom.inline_style(br, "left").as_deref(), Some("96px"));
        assert_eq!(dom.inline_style(br, "top").as_deref(), Some("46px"));
        assert_eq!(dom.rect(br), Some(Rect::new(106.0, 56.0, 114.0, 64.0)));

        let event = PointerEvent::down(Point::new(110.0, 60.0), None, Instant::now());
        assert_eq!(arena.locate(&dom, &event, &ALL), Some(HandlePosition::BottomRight));
        let event = PointerEvent::down(Point::new(0.0, 0.0), Some(br), Instant::now());
        assert_eq!(arena.locate(&dom, &event, &ALL), Some(HandlePosition::BottomRight));

        arena.teardown(&mut dom, &scope);
        assert!(arena.is_empty());
        assert_eq!(dom.listener_count(), 0);
        assert!(dom.children(target).is_empty());
        assert!(!scope.is_handle_element(br));
    }

    #[test]
    fn test_register_replaces_previous_node() {
        let mut dom = MemoryDom::new();
        let scope = InteractionScope::new();
        let first = dom.create_element("span");
        let second = dom.create_element("span");
        dom.set_style(second, "position", "fixed").unwrap();
        let mut arena = HandleArena::new();

        arena.register(&mut dom, &scope, HandlePosition::Right, first).unwrap();
        arena.register(&mut dom, &scope, HandlePosition::Right, second).unwrap();
        assert_eq!(dom.listener_count(), 1);
        assert_eq!(dom.inline_style(first, "display").as_deref(), Some("none"));
        assert!(!scope.is_handle_element(first));

        arena
            .layout(&mut dom, Size::new(10.0, 10.0), 8.0, &HandleStyles::default(), None, None)
            .unwrap();
        assert_eq!(dom.inline_style(second, "position").as_deref(), Some("fixed"));
        assert_eq!(dom.inline_style(second, "cursor"), None);

        assert!(arena.unregister(&mut dom, &scope, HandlePosition::Right));
        assert!(!arena.unregister(&mut dom, &scope, HandlePosition::Right));
        assert_eq!(dom.listener_count(), 0);
    }

    #[test]
    fn test_hover_and_active_layers() {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        let target = dom.spawn(body, "div", Rect::new(0.0, 0.0, 50.0, 50.0)).unwrap();
        let scope = InteractionScope::new();
        let mut arena = HandleArena::new();
        arena.build(&mut dom, &scope, target, &[HandlePosition::Top, HandlePosition::Left]).unwrap();

        let styles = HandleStyles {
            default: StyleMap::new().with("opacity", "0.5"),
            hover: StyleMap::new().with("opacity", "1"),
            active: StyleMap::new().with("background", "red"),
        };
        arena
            .layout(
                &mut dom,
                Size::new(50.0, 50.0),
                6.0,
                &styles,
                Some(HandlePosition::Top),
                Some(HandlePosition::Left),
            )
            .unwrap();
        let top = arena.element_of(HandlePosition::Top).unwrap();
        let left = arena.element_of(HandlePosition::Left).unwrap();
        assert_eq!(dom.inline_style(top, "opacity").as_deref(), Some("1"));
        assert_eq!(dom.inline_style(left, "opacity").as_deref(), Some("0.5"));
        assert_eq!(dom.inline_style(left, "background").as_deref(), Some("red"));
    }
}
