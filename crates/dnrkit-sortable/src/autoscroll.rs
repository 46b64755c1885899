//! Edge autoscroll while dragging.

use dnrkit_core::{Dom, ElementId};
use kurbo::{Point, Rect, Vec2};

/// Scroll speed along one axis: zero outside the sensitive band, ramping
/// linearly up to `speed` at the edge itself.
fn axis_step(pointer: f64, start: f64, end: f64, sensitivity: f64, speed: f64) -> f64 {
    if sensitivity <= 0.0 || pointer < start || pointer > end {
        return 0.0;
    }
    let to_start = pointer - start;
    let to_end = end - pointer;
    if to_start < sensitivity && to_start <= to_end {
        -speed * (1.0 - to_start / sensitivity)
    } else if to_end < sensitivity {
        speed * (1.0 - to_end / sensitivity)
    } else {
        0.0
    }
}

/// Scroll delta for one frame with the pointer at `pointer` over `rect`.
pub fn scroll_step(pointer: Point, rect: Rect, sensitivity: f64, speed: f64) -> Vec2 {
    Vec2::new(
        axis_step(pointer.x, rect.x0, rect.x1, sensitivity, speed),
        axis_step(pointer.y, rect.y0, rect.y1, sensitivity, speed),
    )
}

/// Nearest scrollable element from `element` up, falling back to the body.
pub fn scroll_parent(dom: &dyn Dom, element: ElementId) -> ElementId {
    let scrollable = |el: ElementId| {
        ["overflow", "overflow-y", "overflow-x"].iter().any(|p| {
            dom.computed_style(el, p)
                .is_some_and(|v| v == "auto" || v == "scroll")
        })
    };
    let mut current = Some(element);
    while let Some(el) = current {
        if scrollable(el) {
            return el;
        }
        current = dom.parent(el);
    }
    dom.body()
}

/// Scrolls the list's scroll container when the pointer nears its edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoScroll {
    pub sensitivity: f64,
    pub speed: f64,
}

impl AutoScroll {
    /// Scroll once for this frame. Returns the applied delta.
    pub fn step(&self, dom: &mut dyn Dom, list: ElementId, pointer: Point) -> Vec2 {
        let target = scroll_parent(dom, list);
        let Some(rect) = dom.rect(target) else {
            return Vec2::ZERO;
        };
        let delta = scroll_step(pointer, rect, self.sensitivity, self.speed);
        if delta == Vec2::ZERO {
            return delta;
        }
        let before = dom.scroll_offset(target);
        if let Err(err) = dom.scroll_by(target, delta) {
            log::debug!("Autoscroll skipped: {err}");
            return Vec2::ZERO;
        }
        dom.scroll_offset(target) - before
    }
}
