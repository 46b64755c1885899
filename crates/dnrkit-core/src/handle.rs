//! Resize handle definitions.

use crate::options::ConfigError;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A compass position a resize can be started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HandlePosition {
    // Edge handles
    Top,
    Bottom,
    Left,
    Right,
    // Corner handles
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Which sides of the box a handle moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Edges {
    pub top: bool,
    pub bottom: bool,
    pub left: bool,
    pub right: bool,
}

impl Edges {
    /// The handle changes the width.
    pub fn horizontal(&self) -> bool {
        self.left || self.right
    }

    /// The handle changes the height.
    pub fn vertical(&self) -> bool {
        self.top || self.bottom
    }
}

impl HandlePosition {
    /// Every handle, corners last.
    pub const ALL: [HandlePosition; 8] = [
        HandlePosition::Top,
        HandlePosition::Bottom,
        HandlePosition::Left,
        HandlePosition::Right,
        HandlePosition::TopLeft,
        HandlePosition::TopRight,
        HandlePosition::BottomLeft,
        HandlePosition::BottomRight,
    ];

    /// Short name (`t`, `br`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            HandlePosition::Top => "t",
            HandlePosition::Bottom => "b",
            HandlePosition::Left => "l",
            HandlePosition::Right => "r",
            HandlePosition::TopLeft => "tl",
            HandlePosition::TopRight => "tr",
            HandlePosition::BottomLeft => "bl",
            HandlePosition::BottomRight => "br",
        }
    }

    pub fn edges(self) -> Edges {
        let (top, bottom, left, right) = match self {
            HandlePosition::Top => (true, false, false, false),
            HandlePosition::Bottom => (false, true, false, false),
            HandlePosition::Left => (false, false, true, false),
            HandlePosition::Right => (false, false, false, true),
            HandlePosition::TopLeft => (true, false, true, false),
            HandlePosition::TopRight => (true, false, false, true),
            HandlePosition::BottomLeft => (false, true, true, false),
            HandlePosition::BottomRight => (false, true, false, true),
        };
        Edges {
            top,
            bottom,
            left,
            right,
        }
    }

    pub fn is_corner(self) -> bool {
        matches!(
            self,
            HandlePosition::TopLeft | HandlePosition::TopRight | HandlePosition::BottomLeft | HandlePosition::BottomRight
        )
    }

    /// CSS cursor shown while hovering or dragging this handle.
    pub fn cursor(self) -> &'static str {
        match self {
            HandlePosition::Top => "n-resize",
            HandlePosition::Bottom => "s-resize",
            HandlePosition::Left => "w-resize",
            HandlePosition::Right => "e-resize",
            HandlePosition::TopLeft => "nw-resize",
            HandlePosition::TopRight => "ne-resize",
            HandlePosition::BottomLeft => "sw-resize",
            HandlePosition::BottomRight => "se-resize",
        }
    }

    /// Location of the handle on `rect`.
    pub fn point_on(self, rect: Rect) -> Point {
        let x = match self.edges() {
            e if e.left => rect.x0,
            e if e.right => rect.x1,
            _ => (rect.x0 + rect.x1) / 2.0,
        };
        let y = match self.edges() {
            e if e.top => rect.y0,
            e if e.bottom => rect.y1,
            _ => (rect.y0 + rect.y1) / 2.0,
        };
        Point::new(x, y)
    }
}

impl fmt::Display for HandlePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HandlePosition {
    type Err = ConfigError;

    /// Accepts short (`tl`) and long (`top-left`, `topLeft`, `top_left`) names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        let handle = match normalized.as_str() {
            "t" | "top" => HandlePosition::Top,
            "b" | "bottom" => HandlePosition::Bottom,
            "l" | "left" => HandlePosition::Left,
            "r" | "right" => HandlePosition::Right,
            "tl" | "topleft" => HandlePosition::TopLeft,
            "tr" | "topright" => HandlePosition::TopRight,
            "bl" | "bottomleft" => HandlePosition::BottomLeft,
            "br" | "bottomright" => HandlePosition::BottomRight,
            _ => return Err(ConfigError::UnknownHandle(s.to_string())),
        };
        Ok(handle)
    }
}

impl TryFrom<String> for HandlePosition {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HandlePosition> for String {
    fn from(handle: HandlePosition) -> Self {
        handle.as_str().to_string()
    }
}

/// How resize handles are presented and located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleType {
    /// No nodes; handles are zones around the element's border.
    #[default]
    Borders,
    /// Engine-created handle nodes.
    Handles,
    /// Caller-supplied handle nodes.
    Custom,
    /// Resizing is not possible.
    None,
}
