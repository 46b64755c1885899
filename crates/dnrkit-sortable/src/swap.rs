//! Layout direction and swap side detection.

use crate::options::Direction;
use dnrkit_core::{Dom, ElementId};
use kurbo::{Point, Rect};

/// Side of a target an item should be inserted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapSide {
    Before,
    After,
}

impl SwapSide {
    pub fn is_after(self) -> bool {
        self == SwapSide::After
    }
}

/// Main axis of a list: the explicit option, then flex direction, then the
/// relative placement of the first two items.
pub fn detect_direction(dom: &dyn Dom, list: ElementId, explicit: Option<Direction>, items: &[ElementId]) -> Direction {
    if let Some(direction) = explicit {
        return direction;
    }

    let display = dom.computed_style(list, "display").unwrap_or_default();
    if display == "flex" || display == "inline-flex" {
        let flex = dom.computed_style(list, "flex-direction").unwrap_or_default();
        return if flex.starts_with("column") {
            Direction::Vertical
        } else {
            Direction::Horizontal
        };
    }

    let mut rects = items.iter().filter_map(|&item| dom.rect(item));
    match (rects.next(), rects.next()) {
        (Some(first), Some(second)) => {
            let dx = (second.x0 - first.x0).abs();
            let dy = (second.y0 - first.y0).abs();
            if dx > dy {
                Direction::Horizontal
            } else {
                Direction::Vertical
            }
        }
        _ => Direction::Vertical,
    }
}

/// Swap thresholds of a list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwapConfig {
    pub threshold: f64,
    pub invert: bool,
    pub inverted_threshold: f64,
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            threshold: 1.0,
            invert: false,
            inverted_threshold: 1.0,
        }
    }
}

/// Decide which side of `target` the pointer asks for, or `None` inside the
/// dead zone.
///
/// With a threshold of 1 the center line decides. Below 1, a band of
/// `(1 - threshold) * length` around the center gives no decision. In inverted
/// mode only the outer bands of `inverted_threshold * length / 2` decide.
pub fn swap_side(pointer: Point, target: Rect, direction: Direction, config: SwapConfig) -> Option<SwapSide> {
    let (mouse, start, end) = match direction {
        Direction::Vertical => (pointer.y, target.y0, target.y1),
        Direction::Horizontal => (pointer.x, target.x0, target.x1),
    };
    let length = end - start;
    if length <= 0.0 {
        return None;
    }

    if config.invert {
        let band = length * config.inverted_threshold.clamp(0.0, 1.0) / 2.0;
        return if mouse < start + band {
            Some(SwapSide::Before)
        } else if mouse > end - band {
            Some(SwapSide::After)
        } else {
            None
        };
    }

    let center = start + length / 2.0;
    let threshold = config.threshold.clamp(0.0, 1.0);
    if threshold >= 1.0 {
        return Some(if mouse < center { SwapSide::Before } else { SwapSide::After });
    }
    let half_dead = (1.0 - threshold) * length / 2.0;
    if mouse < center - half_dead {
        Some(SwapSide::Before)
    } else if mouse > center + half_dead {
        Some(SwapSide::After)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnrkit_core::MemoryDom;

    const ROW: Rect = Rect::new(0.0, 100.0, 200.0, 140.0);

    fn at(y: f64) -> Point {
        Point::new(50.0, y)
    }

    #[test]
    fn test_center_decides_at_full_threshold() {
        let config = SwapConfig::default();
        assert_eq!(swap_side(at(110.0), ROW, Direction::Vertical, config), Some(SwapSide::Before));
        assert_eq!(swap_side(at(121.0), ROW, Direction::Vertical, config), Some(SwapSide::After));
    }

    #[test]
    fn test_dead_zone() {
        let config = SwapConfig {
            threshold: 0.5,
            ..Default::default()
        };
        // Dead zone is 110..130.
        assert_eq!(swap_side(at(109.0), ROW, Direction::Vertical, config), Some(SwapSide::Before));
        assert_eq!(swap_side(at(115.0), ROW, Direction::Vertical, config), None);
        assert_eq!(swap_side(at(129.0), ROW, Direction::Vertical, config), None);
        assert_eq!(swap_side(at(131.0), ROW, Direction::Vertical, config), Some(SwapSide::After));
    }

    #[test]
    fn test_inverted_bands() {
        let config = SwapConfig {
            invert: true,
            inverted_threshold: 0.5,
            ..Default::default()
        };
        // Bands are 100..110 and 130..140.
        assert_eq!(swap_side(at(105.0), ROW, Direction::Vertical, config), Some(SwapSide::Before));
        assert_eq!(swap_side(at(120.0), ROW, Direction::Vertical, config), None);
        assert_eq!(swap_side(at(135.0), ROW, Direction::Vertical, config), Some(SwapSide::After));
    }

    #[test]
    fn test_horizontal_axis() {
        let config = SwapConfig::default();
        assert_eq!(
            swap_side(Point::new(150.0, 0.0), ROW, Direction::Horizontal, config),
            Some(SwapSide::After)
        );
    }

    #[test]
    fn test_detect_direction() {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        let list = dom.spawn(body, "div", Rect::new(0.0, 0.0, 400.0, 400.0)).unwrap();
        let a = dom.spawn(list, "div", Rect::new(0.0, 0.0, 100.0, 30.0)).unwrap();
        let b = dom.spawn(list, "div", Rect::new(0.0, 30.0, 100.0, 60.0)).unwrap();
        assert_eq!(detect_direction(&dom, list, None, &[a, b]), Direction::Vertical);

        dom.set_rect(b, Rect::new(100.0, 0.0, 200.0, 30.0));
        assert_eq!(detect_direction(&dom, list, None, &[a, b]), Direction::Horizontal);

        dom.set_computed_style(list, "display", "flex");
        dom.set_computed_style(list, "flex-direction", "column");
        assert_eq!(detect_direction(&dom, list, None, &[a, b]), Direction::Vertical);

        assert_eq!(
            detect_direction(&dom, list, Some(Direction::Horizontal), &[a, b]),
            Direction::Horizontal
        );
        assert_eq!(detect_direction(&dom, list, None, &[]), Direction::Vertical);
    }
}
