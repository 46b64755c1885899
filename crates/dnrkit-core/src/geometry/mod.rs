//! Pure geometry helpers shared by the drag and resize engines.

mod box_model;
pub mod transform;

pub use box_model::{BoxModel, Insets};

use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Deserializer, Serialize};

/// Axis a drag is allowed to move along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    #[default]
    Both,
    X,
    Y,
}

/// CSS positioning scheme the engines write into their style output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionType {
    #[default]
    Absolute,
    Relative,
}

impl PositionType {
    pub fn as_css(self) -> &'static str {
        match self {
            PositionType::Absolute => "absolute",
            PositionType::Relative => "relative",
        }
    }
}

/// One axis of an element size: a pixel count or the `auto` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub enum SizeValue {
    Px(f64),
    #[default]
    Auto,
}

impl SizeValue {
    /// Resolve against a measured length.
    pub fn resolve(self, measured: f64) -> f64 {
        match self {
            SizeValue::Px(v) => v,
            SizeValue::Auto => measured,
        }
    }

    pub fn is_auto(self) -> bool {
        matches!(self, SizeValue::Auto)
    }
}

impl<'de> Deserialize<'de> for SizeValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Keyword(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(v) => Ok(SizeValue::Px(v)),
            Raw::Keyword(k) if k == "auto" => Ok(SizeValue::Auto),
            Raw::Keyword(k) => match parse_px(&k) {
                Some(v) => Ok(SizeValue::Px(v)),
                None => Err(serde::de::Error::custom(format!("invalid size: {k}"))),
            },
        }
    }
}

/// Width and height, each possibly `auto`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementSize {
    pub width: SizeValue,
    pub height: SizeValue,
}

impl ElementSize {
    pub fn px(width: f64, height: f64) -> Self {
        Self {
            width: SizeValue::Px(width),
            height: SizeValue::Px(height),
        }
    }

    pub fn auto() -> Self {
        Self::default()
    }

    /// Resolve to a numeric size using a measured fallback for `auto` axes.
    pub fn resolve(&self, measured: Size) -> Size {
        Size::new(self.width.resolve(measured.width), self.height.resolve(measured.height))
    }
}

/// Optional minimum and maximum dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SizeLimits {
    pub min_width: Option<f64>,
    pub min_height: Option<f64>,
    pub max_width: Option<f64>,
    pub max_height: Option<f64>,
}

impl SizeLimits {
    /// Clamp each axis independently. The result is never negative.
    ///
    /// When both bounds are set and `min <= max`, `min <= result <= max` holds
    /// for any input, including negative and non-finite ones.
    pub fn clamp(&self, size: Size) -> Size {
        Size::new(
            clamp_axis(size.width, self.min_width, self.max_width),
            clamp_axis(size.height, self.min_height, self.max_height),
        )
    }
}

fn clamp_axis(value: f64, min: Option<f64>, max: Option<f64>) -> f64 {
    let mut v = if value.is_nan() { 0.0 } else { value };
    if let Some(min) = min {
        v = v.max(min);
    }
    if let Some(max) = max {
        v = v.min(max);
    }
    v.max(0.0)
}

/// Zero out the delta component an axis lock forbids.
pub fn apply_axis(delta: Vec2, axis: Axis) -> Vec2 {
    match axis {
        Axis::Both => delta,
        Axis::X => Vec2::new(delta.x, 0.0),
        Axis::Y => Vec2::new(0.0, delta.y),
    }
}

/// Clamp a top-left position so a box of `size` stays inside `bounds`
/// (container-local coordinates, origin at zero).
pub fn clamp_to_bounds(position: Point, size: Size, bounds: Size) -> Point {
    let max_x = (bounds.width - size.width).max(0.0);
    let max_y = (bounds.height - size.height).max(0.0);
    Point::new(position.x.clamp(0.0, max_x), position.y.clamp(0.0, max_y))
}

/// Which dimension drives an aspect-ratio correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectDriver {
    Width,
    Height,
    /// Whichever grew proportionally more relative to `reference`.
    Larger,
}

/// Force `size` to `ratio` (width / height).
pub fn lock_aspect_ratio(size: Size, reference: Size, ratio: f64, driver: AspectDriver) -> Size {
    if ratio <= 0.0 || !ratio.is_finite() {
        return size;
    }
    let by_width = match driver {
        AspectDriver::Width => true,
        AspectDriver::Height => false,
        AspectDriver::Larger => {
            let gw = if reference.width > 0.0 { size.width / reference.width } else { 1.0 };
            let gh = if reference.height > 0.0 { size.height / reference.height } else { 1.0 };
            gw >= gh
        }
    };
    if by_width {
        Size::new(size.width, size.width / ratio)
    } else {
        Size::new(size.height * ratio, size.height)
    }
}

/// Vector from `from` to `to`.
pub fn delta(from: Point, to: Point) -> Vec2 {
    to - from
}

pub fn distance(a: Point, b: Point) -> f64 {
    (b - a).hypot()
}

pub fn center(rect: Rect) -> Point {
    rect.center()
}

/// Round both coordinates to whole pixels.
pub fn round_point(point: Point) -> Point {
    Point::new(point.x.round(), point.y.round())
}

/// Express `rect` in the coordinate space of `container` (origin at its top-left).
pub fn to_local(rect: Rect, container: Rect) -> Rect {
    rect - container.origin().to_vec2()
}

/// Parse a CSS pixel length such as `"12px"`, `"12"` or `"-3.5px"`.
pub fn parse_px(value: &str) -> Option<f64> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    number.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Format a pixel length for style output.
pub fn px(value: f64) -> String {
    format!("{value}px")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_axis() {
        let d = Vec2::new(10.0, -4.0);
        assert_eq!(apply_axis(d, Axis::Both), d);
        assert_eq!(apply_axis(d, Axis::X), Vec2::new(10.0, 0.0));
        assert_eq!(apply_axis(d, Axis::Y), Vec2::new(0.0, -4.0));
    }

    #[test]
    fn test_clamp_to_bounds() {
        let bounds = Size::new(300.0, 200.0);
        let size = Size::new(50.0, 40.0);
        assert_eq!(clamp_to_bounds(Point::new(-10.0, 20.0), size, bounds), Point::new(0.0, 20.0));
        assert_eq!(clamp_to_bounds(Point::new(400.0, 400.0), size, bounds), Point::new(250.0, 160.0));
    }

    #[test]
    fn test_clamp_to_bounds_larger_than_container() {
        let p = clamp_to_bounds(Point::new(30.0, 30.0), Size::new(500.0, 500.0), Size::new(100.0, 100.0));
        assert_eq!(p, Point::ZERO);
    }

    #[test]
    fn test_size_limits_ordering() {
        let limits = SizeLimits {
            min_width: Some(20.0),
            min_height: Some(10.0),
            max_width: Some(100.0),
            max_height: Some(50.0),
        };
        for &v in &[-1e9, -5.0, 0.0, 15.0, 42.0, 99.9, 1e12, f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let s = limits.clamp(Size::new(v, v));
            assert!((20.0..=100.0).contains(&s.width), "width {} from {}", s.width, v);
            assert!((10.0..=50.0).contains(&s.height), "height {} from {}", s.height, v);
        }
    }

    #[test]
    fn test_size_limits_never_negative() {
        let s = SizeLimits::default().clamp(Size::new(-30.0, 12.0));
        assert_eq!(s, Size::new(0.0, 12.0));
    }

    #[test]
    fn test_lock_aspect_ratio_larger() {
        let reference = Size::new(200.0, 100.0);
        let s = lock_aspect_ratio(Size::new(300.0, 110.0), reference, 2.0, AspectDriver::Larger);
        assert_eq!(s, Size::new(300.0, 150.0));
        let s = lock_aspect_ratio(Size::new(210.0, 200.0), reference, 2.0, AspectDriver::Larger);
        assert_eq!(s, Size::new(400.0, 200.0));
    }

    #[test]
    fn test_size_value_deserialize() {
        let size: ElementSize = serde_json::from_str(r#"{"width": 120, "height": "auto"}"#).unwrap();
        assert_eq!(size.width, SizeValue::Px(120.0));
        assert!(size.height.is_auto());
        let resolved = size.resolve(Size::new(1.0, 64.0));
        assert_eq!(resolved, Size::new(120.0, 64.0));
    }

    #[test]
    fn test_parse_px() {
        assert_eq!(parse_px("12px"), Some(12.0));
        assert_eq!(parse_px(" -3.5px "), Some(-3.5));
        assert_eq!(parse_px("7"), Some(7.0));
        assert_eq!(parse_px("auto"), None);
    }

    #[test]
    fn test_distance_and_delta() {
        let a = Point::new(1.0, 1.0);
        let b = Point::new(4.0, 5.0);
        assert_eq!(delta(a, b), Vec2::new(3.0, 4.0));
        assert!((distance(a, b) - 5.0).abs() < f64::EPSILON);
    }
}
