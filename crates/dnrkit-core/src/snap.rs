//! Grid snapping for positions and sizes.

use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

/// Grid cell size. A cell of zero (or less) disables snapping on that axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Grid {
    pub x: f64,
    pub y: f64,
}

impl Grid {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn uniform(cell: f64) -> Self {
        Self { x: cell, y: cell }
    }

    /// Check if any axis snaps.
    pub fn is_enabled(&self) -> bool {
        self.x > 0.0 || self.y > 0.0
    }
}

impl From<[f64; 2]> for Grid {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Grid> for [f64; 2] {
    fn from(grid: Grid) -> Self {
        [grid.x, grid.y]
    }
}

/// Result of a snap operation.
#[derive(Debug, Clone, Copy)]
pub struct SnapResult {
    /// The snapped point.
    pub point: Point,
    /// Whether the X coordinate was snapped.
    pub snapped_x: bool,
    /// Whether the Y coordinate was snapped.
    pub snapped_y: bool,
}

impl SnapResult {
    /// Create a result with no snapping.
    pub fn none(point: Point) -> Self {
        Self {
            point,
            snapped_x: false,
            snapped_y: false,
        }
    }

    /// Check if any snapping occurred.
    pub fn is_snapped(&self) -> bool {
        self.snapped_x || self.snapped_y
    }
}

/// Round a value to the nearest multiple of `cell`.
pub fn snap_value(value: f64, cell: f64) -> f64 {
    if cell > 0.0 && value.is_finite() {
        (value / cell).round() * cell
    } else {
        value
    }
}

/// Snap a point to the nearest grid intersection.
pub fn snap_to_grid(point: Point, grid: Grid) -> SnapResult {
    SnapResult {
        point: Point::new(snap_value(point.x, grid.x), snap_value(point.y, grid.y)),
        snapped_x: grid.x > 0.0,
        snapped_y: grid.y > 0.0,
    }
}

/// Snap a size to whole grid cells.
pub fn snap_size(size: Size, grid: Grid) -> Size {
    Size::new(snap_value(size.width, grid.x), snap_value(size.height, grid.y))
}

/// Snap only when a grid is configured.
pub fn snap_point_opt(point: Point, grid: Option<Grid>) -> Point {
    match grid {
        Some(grid) => snap_to_grid(point, grid).point,
        None => point,
    }
}
