//! Fallback drag ghost.

use dnrkit_core::geometry::px;
use dnrkit_core::geometry::transform::{scale_of_css, to_css_matrix};
use dnrkit_core::{Dom, DomResult, ElementId};
use kurbo::{Affine, Point, Vec2};

/// Ghost translation for a pointer position.
///
/// Computed from scratch each frame: `(pointer - initial + offset) / scale +
/// scroll_delta`.
pub fn ghost_transform(pointer: Point, initial: Point, offset: Vec2, scale: Vec2, scroll_delta: Vec2) -> Affine {
    let moved = pointer - initial + offset;
    let sx = if scale.x > 0.0 { scale.x } else { 1.0 };
    let sy = if scale.y > 0.0 { scale.y } else { 1.0 };
    Affine::translate(Vec2::new(moved.x / sx, moved.y / sy) + scroll_delta)
}

/// Accumulated scale of an element and its ancestors.
pub fn chain_scale(dom: &dyn Dom, element: ElementId) -> Vec2 {
    let mut scale = Vec2::new(1.0, 1.0);
    let mut current = Some(element);
    while let Some(el) = current {
        let s = scale_of_css(dom.computed_style(el, "transform").as_deref());
        scale = Vec2::new(scale.x * s.x, scale.y * s.y);
        current = dom.parent(el);
    }
    scale
}

/// Nearest ancestor (from `element` up) that is not statically positioned.
fn positioned_ancestor(dom: &dyn Dom, element: ElementId) -> ElementId {
    let mut current = Some(element);
    while let Some(el) = current {
        if el == dom.body() {
            break;
        }
        if dom.computed_style(el, "position").is_some_and(|p| p != "static") {
            return el;
        }
        current = dom.parent(el);
    }
    dom.body()
}

/// Classes applied to and removed from the ghost.
#[derive(Debug, Clone, Copy)]
pub struct GhostClasses<'a> {
    pub fallback: &'a str,
    pub drag: &'a str,
    pub ghost: &'a str,
    pub chosen: &'a str,
}

/// A clone of the dragged item following the pointer.
#[derive(Debug, Clone)]
pub struct Ghost {
    element: ElementId,
    parent: ElementId,
    initial_pointer: Point,
    scroll_origin: Vec2,
}

impl Ghost {
    /// Clone `item` and place it over the item.
    ///
    /// The ghost goes into the body when `on_body` is set, otherwise into the
    /// list. On iOS it goes into the nearest positioned ancestor of the list
    /// and is positioned absolutely against it.
    pub fn create(
        dom: &mut dyn Dom,
        item: ElementId,
        list: ElementId,
        pointer: Point,
        on_body: bool,
        classes: GhostClasses<'_>,
    ) -> DomResult<Self> {
        let rect = dom.rect(item).unwrap_or_default();
        let is_ios = dom.platform().is_ios;
        let parent = if is_ios {
            positioned_ancestor(dom, list)
        } else if on_body {
            dom.body()
        } else {
            list
        };

        let element = dom.clone_element(item, true)?;
        dom.remove_class(element, classes.ghost)?;
        dom.remove_class(element, classes.chosen)?;
        dom.add_class(element, classes.fallback)?;
        dom.add_class(element, classes.drag)?;

        let origin = if is_ios {
            let parent_rect = dom.rect(parent).unwrap_or_default();
            (rect.origin() - parent_rect.origin() + dom.scroll_offset(parent)).to_point()
        } else {
            rect.origin()
        };
        let styles = [
            ("transition", String::new()),
            ("position", (if is_ios { "absolute" } else { "fixed" }).to_string()),
            ("z-index", "100000".to_string()),
            ("pointer-events", "none".to_string()),
            ("box-sizing", "border-box".to_string()),
            ("margin", "0".to_string()),
            ("opacity", "0.8".to_string()),
            ("left", px(origin.x)),
            ("top", px(origin.y)),
            ("width", px(rect.width())),
            ("height", px(rect.height())),
            ("transform", to_css_matrix(Affine::IDENTITY)),
        ];
        for (property, value) in &styles {
            dom.set_style(element, property, value)?;
        }
        dom.append_child(parent, element)?;
        log::debug!("Created drag ghost {element} for {item}");

        Ok(Self {
            element,
            parent,
            initial_pointer: pointer,
            scroll_origin: dom.scroll_offset(parent),
        })
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn parent(&self) -> ElementId {
        self.parent
    }

    /// Move the ghost to follow the pointer. Scale is read from the parent's
    /// current transform on every call.
    pub fn update(&self, dom: &mut dyn Dom, pointer: Point, offset: Vec2) -> DomResult<Affine> {
        let scale = chain_scale(dom, self.parent);
        let scroll_delta = dom.scroll_offset(self.parent) - self.scroll_origin;
        let transform = ghost_transform(pointer, self.initial_pointer, offset, scale, scroll_delta);
        dom.set_style(self.element, "transform", &to_css_matrix(transform))?;
        Ok(transform)
    }

    pub fn remove(self, dom: &mut dyn Dom) {
        if let Err(err) = dom.remove(self.element) {
            log::warn!("Failed to remove drag ghost: {err}");
        }
    }
}
