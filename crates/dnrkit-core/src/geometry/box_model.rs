//! CSS box model computation.

use super::parse_px;
use crate::dom::{Dom, ElementId};
use kurbo::Rect;

/// Edge widths for one box-model layer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Insets {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Insets {
    pub fn uniform(v: f64) -> Self {
        Self { top: v, right: v, bottom: v, left: v }
    }

    /// Read `{prefix}-top`, `{prefix}-right`, ... (with an optional suffix such as
    /// `-width` for borders) from computed style.
    pub fn from_style(dom: &dyn Dom, element: ElementId, prefix: &str, suffix: &str) -> Self {
        let read = |side: &str| {
            dom.computed_style(element, &format!("{prefix}-{side}{suffix}"))
                .and_then(|v| parse_px(&v))
                .unwrap_or(0.0)
        };
        Self {
            top: read("top"),
            right: read("right"),
            bottom: read("bottom"),
            left: read("left"),
        }
    }

    fn grow(self, rect: Rect) -> Rect {
        Rect::new(rect.x0 - self.left, rect.y0 - self.top, rect.x1 + self.right, rect.y1 + self.bottom)
    }

    fn shrink(self, rect: Rect) -> Rect {
        let x0 = rect.x0 + self.left;
        let y0 = rect.y0 + self.top;
        Rect::new(x0, y0, (rect.x1 - self.right).max(x0), (rect.y1 - self.bottom).max(y0))
    }
}

/// The four nested boxes of an element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxModel {
    pub margin: Rect,
    pub border: Rect,
    pub padding: Rect,
    pub content: Rect,
}

impl BoxModel {
    /// Build the box model from a border-box rect and the three inset layers.
    pub fn from_border_box(border: Rect, margin: Insets, border_width: Insets, padding: Insets) -> Self {
        let padding_box = border_width.shrink(border);
        Self {
            margin: margin.grow(border),
            border,
            padding: padding_box,
            content: padding.shrink(padding_box),
        }
    }

    /// Measure an element. `None` when it has no layout box.
    pub fn measure(dom: &dyn Dom, element: ElementId) -> Option<Self> {
        let border = dom.rect(element)?;
        Some(Self::from_border_box(
            border,
            Insets::from_style(dom, element, "margin", ""),
            Insets::from_style(dom, element, "border", "-width"),
            Insets::from_style(dom, element, "padding", ""),
        ))
    }
}
