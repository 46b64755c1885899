//! Pointer and native drag events delivered by the host.

use crate::dom::ElementId;
use kurbo::Point;
use serde::{Deserialize, Serialize};

// Use web_time for WASM compatibility
#[cfg(target_arch = "wasm32")]
pub use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
pub use std::time::Instant;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// Input device that produced a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerType {
    #[default]
    Mouse,
    Touch,
    Pen,
}

impl PointerType {
    /// Every pointer type; the default allow-list.
    pub const ALL: [PointerType; 3] = [PointerType::Mouse, PointerType::Touch, PointerType::Pen];
}

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
    Enter,
    Leave,
}

impl PointerPhase {
    /// `Up` and `Cancel` both end a gesture.
    pub fn is_release(self) -> bool {
        matches!(self, PointerPhase::Up | PointerPhase::Cancel)
    }
}

/// Unified mouse/touch/pen event in client coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub position: Point,
    pub pointer_type: PointerType,
    pub button: MouseButton,
    /// Deepest element under the pointer, when known.
    pub target: Option<ElementId>,
    /// For enter/leave: the element the pointer came from or went to.
    pub related_target: Option<ElementId>,
    pub modifiers: Modifiers,
    pub timestamp: Instant,
}

impl PointerEvent {
    pub fn new(phase: PointerPhase, position: Point, timestamp: Instant) -> Self {
        Self {
            phase,
            position,
            pointer_type: PointerType::Mouse,
            button: MouseButton::Left,
            target: None,
            related_target: None,
            modifiers: Modifiers::default(),
            timestamp,
        }
    }

    pub fn down(position: Point, target: Option<ElementId>, timestamp: Instant) -> Self {
        Self::new(PointerPhase::Down, position, timestamp).with_target(target)
    }

    pub fn moved(position: Point, timestamp: Instant) -> Self {
        Self::new(PointerPhase::Move, position, timestamp)
    }

    pub fn up(position: Point, timestamp: Instant) -> Self {
        Self::new(PointerPhase::Up, position, timestamp)
    }

    pub fn with_target(mut self, target: Option<ElementId>) -> Self {
        self.target = target;
        self
    }

    pub fn with_related_target(mut self, related: Option<ElementId>) -> Self {
        self.related_target = related;
        self
    }

    pub fn with_pointer_type(mut self, pointer_type: PointerType) -> Self {
        self.pointer_type = pointer_type;
        self
    }

    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }
}

/// Phase of a platform (HTML5) drag event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NativeDragPhase {
    Start,
    Enter,
    Over,
    Leave,
    Drop,
    End,
}

/// Platform drag event. The platform draws the drag image itself.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeDragEvent {
    pub phase: NativeDragPhase,
    pub position: Point,
    pub target: Option<ElementId>,
    pub timestamp: Instant,
}

impl NativeDragEvent {
    pub fn new(phase: NativeDragPhase, position: Point, target: Option<ElementId>, timestamp: Instant) -> Self {
        Self {
            phase,
            position,
            target,
            timestamp,
        }
    }
}

/// Any event a host can deliver to the engines.
#[derive(Debug, Clone, PartialEq)]
pub enum DomEvent {
    Pointer(PointerEvent),
    Drag(NativeDragEvent),
}

impl DomEvent {
    pub fn timestamp(&self) -> Instant {
        match self {
            DomEvent::Pointer(e) => e.timestamp,
            DomEvent::Drag(e) => e.timestamp,
        }
    }

    pub fn position(&self) -> Point {
        match self {
            DomEvent::Pointer(e) => e.position,
            DomEvent::Drag(e) => e.position,
        }
    }

    pub fn target(&self) -> Option<ElementId> {
        match self {
            DomEvent::Pointer(e) => e.target,
            DomEvent::Drag(e) => e.target,
        }
    }

    pub fn pointer_type(&self) -> PointerType {
        match self {
            DomEvent::Pointer(e) => e.pointer_type,
            DomEvent::Drag(_) => PointerType::Mouse,
        }
    }
}

impl From<PointerEvent> for DomEvent {
    fn from(event: PointerEvent) -> Self {
        DomEvent::Pointer(event)
    }
}

impl From<NativeDragEvent> for DomEvent {
    fn from(event: NativeDragEvent) -> Self {
        DomEvent::Drag(event)
    }
}
