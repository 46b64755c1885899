//! Size and position for one resize frame.

use crate::geometry::{AspectDriver, SizeLimits, lock_aspect_ratio};
use crate::handle::HandlePosition;
use crate::snap::{Grid, snap_size};
use kurbo::{Point, Size, Vec2};

/// Everything a resize frame depends on. Coordinates are container-local.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeInput {
    pub handle: HandlePosition,
    pub start_size: Size,
    pub start_position: Point,
    /// Pointer movement since the gesture started, already divided by scale.
    pub delta: Vec2,
    /// Container size; the box stays inside `[0, bounds]`.
    pub bounds: Option<Size>,
    pub limits: SizeLimits,
    /// Width / height to preserve.
    pub aspect_ratio: Option<f64>,
    pub grid: Option<Grid>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeOutput {
    pub size: Size,
    pub position: Point,
}

/// Compute the box for a resize frame.
///
/// Right and bottom edges grow away from a fixed top-left corner. Left and top
/// edges move the anchor, so the opposite edge stays where it was.
pub fn compute_resize(input: &ResizeInput) -> ResizeOutput {
    let edges = input.handle.edges();
    let (sx, sy) = (input.start_position.x, input.start_position.y);
    let (sw, sh) = (input.start_size.width, input.start_size.height);
    let (dx, dy) = (input.delta.x, input.delta.y);

    let mut w = sw;
    let mut h = sh;

    if edges.right {
        w = sw + dx;
        if let Some(b) = input.bounds {
            w = w.min(b.width - sx);
        }
    }
    if edges.left {
        let mut nx = sx + dx;
        if input.bounds.is_some() {
            nx = nx.max(0.0);
        }
        nx = nx.min(sx + sw);
        w = sw - (nx - sx);
    }
    if edges.bottom {
        h = sh + dy;
        if let Some(b) = input.bounds {
            h = h.min(b.height - sy);
        }
    }
    if edges.top {
        let mut ny = sy + dy;
        if input.bounds.is_some() {
            ny = ny.max(0.0);
        }
        ny = ny.min(sy + sh);
        h = sh - (ny - sy);
    }

    if let Some(ratio) = input.aspect_ratio.filter(|r| r.is_finite() && *r > 0.0) {
        let driver = match (edges.horizontal(), edges.vertical()) {
            (true, true) => AspectDriver::Larger,
            (true, false) => AspectDriver::Width,
            _ => AspectDriver::Height,
        };
        let locked = lock_aspect_ratio(Size::new(w, h), input.start_size, ratio, driver);
        w = locked.width;
        h = locked.height;

        if let Some(b) = input.bounds {
            let max_w = if edges.left { sx + sw } else { b.width - sx };
            let max_h = if edges.top { sy + sh } else { b.height - sy };
            if w > max_w {
                w = max_w;
                h = w / ratio;
            }
            if h > max_h {
                h = max_h;
                w = h * ratio;
            }
        }
    }

    let mut size = input.limits.clamp(Size::new(w, h));
    if let Some(grid) = input.grid {
        size = snap_size(size, grid);
    }

    let mut x = if edges.left { sx + sw - size.width } else { sx };
    let mut y = if edges.top { sy + sh - size.height } else { sy };

    if let Some(b) = input.bounds {
        if x < 0.0 {
            if edges.left {
                size.width += x;
            }
            x = 0.0;
        }
        if y < 0.0 {
            if edges.top {
                size.height += y;
            }
            y = 0.0;
        }
        size.width = size.width.min(b.width - x).max(0.0);
        size.height = size.height.min(b.height - y).max(0.0);
    }

    ResizeOutput {
        size,
        position: Point::new(x, y),
    }
}
