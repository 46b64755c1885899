//! Host element tree abstraction.
//!
//! Engines measure and mutate elements only through [`Dom`]. [`MemoryDom`] is an
//! in-memory tree usable on every target; on wasm, `WebDom` wraps the browser
//! document.

mod memory;
mod queue;
pub mod selector;

#[cfg(target_arch = "wasm32")]
mod web;

pub use memory::{FlowAxis, FlowLayout, MemoryDom};
pub use queue::EventQueue;
pub use selector::Selector;

#[cfg(target_arch = "wasm32")]
pub use web::WebDom;

use crate::geometry::transform::translation_of_css;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// DOM errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomError {
    #[error("Unknown element: {0}")]
    UnknownElement(ElementId),
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),
    #[error("Cannot insert {child} into {parent}: {reason}")]
    InvalidInsertion {
        parent: ElementId,
        child: ElementId,
        reason: &'static str,
    },
    #[error("Unknown listener: {0}")]
    UnknownListener(ListenerId),
    #[error("Platform error: {0}")]
    Platform(String),
}

/// Result type for DOM operations.
pub type DomResult<T> = Result<T, DomError>;

/// Stable identity of an element in the host tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(Uuid);

impl ElementId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a registered event listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a listener is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenTarget {
    Document,
    Element(ElementId),
}

/// Event kinds an engine can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PointerDown,
    PointerMove,
    PointerUp,
    PointerCancel,
    PointerEnter,
    PointerLeave,
    DragStart,
    DragEnter,
    DragOver,
    DragLeave,
    Drop,
    DragEnd,
}

impl EventKind {
    /// DOM event type name.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::PointerDown => "pointerdown",
            EventKind::PointerMove => "pointermove",
            EventKind::PointerUp => "pointerup",
            EventKind::PointerCancel => "pointercancel",
            EventKind::PointerEnter => "pointerenter",
            EventKind::PointerLeave => "pointerleave",
            EventKind::DragStart => "dragstart",
            EventKind::DragEnter => "dragenter",
            EventKind::DragOver => "dragover",
            EventKind::DragLeave => "dragleave",
            EventKind::Drop => "drop",
            EventKind::DragEnd => "dragend",
        }
    }
}

/// Runtime capabilities of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    /// The host can run platform (HTML5) drag and drop.
    pub supports_native_drag: bool,
    /// iOS positions absolutely placed nodes against the nearest positioned
    /// ancestor rather than the containing block used elsewhere.
    pub is_ios: bool,
}

impl Default for Platform {
    fn default() -> Self {
        Self {
            supports_native_drag: true,
            is_ios: false,
        }
    }
}

/// Host element tree.
///
/// Reads never fail: an unknown element simply has no rect, no parent and no
/// style. Mutations report unknown elements as [`DomError`]s.
pub trait Dom {
    /// Platform capabilities.
    fn platform(&self) -> Platform;

    /// The document body.
    fn body(&self) -> ElementId;

    /// Check if an element is known to the host.
    fn exists(&self, element: ElementId) -> bool;

    fn parent(&self, element: ElementId) -> Option<ElementId>;

    fn children(&self, element: ElementId) -> Vec<ElementId>;

    /// Lower-case tag name.
    fn tag_name(&self, element: ElementId) -> Option<String>;

    /// Border-box rect in client coordinates, as drawn (transforms included).
    fn rect(&self, element: ElementId) -> Option<Rect>;

    /// Rect of the element where layout placed it, without the translation
    /// of its computed transform.
    fn layout_rect(&self, element: ElementId) -> Option<Rect> {
        let rect = self.rect(element)?;
        Some(rect - translation_of_css(self.computed_style(element, "transform").as_deref()))
    }

    /// Check if `rect` and the computed `transform` follow CSS transitions
    /// while they play. When false, both report the transition's end value.
    fn tracks_transitions(&self) -> bool {
        false
    }

    /// Computed value of a CSS property.
    fn computed_style(&self, element: ElementId, property: &str) -> Option<String>;

    /// Inline value of a CSS property.
    fn inline_style(&self, element: ElementId, property: &str) -> Option<String>;

    fn set_style(&mut self, element: ElementId, property: &str, value: &str) -> DomResult<()>;

    fn remove_style(&mut self, element: ElementId, property: &str) -> DomResult<()>;

    fn attribute(&self, element: ElementId, name: &str) -> Option<String>;

    fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) -> DomResult<()>;

    fn has_class(&self, element: ElementId, class: &str) -> bool;

    fn add_class(&mut self, element: ElementId, class: &str) -> DomResult<()>;

    fn remove_class(&mut self, element: ElementId, class: &str) -> DomResult<()>;

    /// Create a detached element.
    fn create_element(&mut self, tag: &str) -> ElementId;

    /// Copy an element (and its subtree when `deep`) into a detached element.
    fn clone_element(&mut self, element: ElementId, deep: bool) -> DomResult<ElementId>;

    /// Insert `child` into `parent` before `reference` (append when `None`),
    /// detaching it from its current parent first.
    fn insert_before(&mut self, parent: ElementId, child: ElementId, reference: Option<ElementId>) -> DomResult<()>;

    /// Detach an element from its parent. The element stays known to the host.
    fn remove(&mut self, element: ElementId) -> DomResult<()>;

    /// Current scroll offset of a scroll container.
    fn scroll_offset(&self, element: ElementId) -> Vec2;

    fn scroll_by(&mut self, element: ElementId, delta: Vec2) -> DomResult<()>;

    /// Topmost element at a client point, skipping `pointer-events: none`.
    fn element_from_point(&self, point: Point) -> Option<ElementId>;

    fn add_listener(&mut self, target: ListenTarget, kind: EventKind) -> DomResult<ListenerId>;

    /// Returns false when the listener was not registered.
    fn remove_listener(&mut self, id: ListenerId) -> bool;

    fn append_child(&mut self, parent: ElementId, child: ElementId) -> DomResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Check if `element` is `ancestor` or inside it.
    fn contains(&self, ancestor: ElementId, element: ElementId) -> bool {
        let mut current = Some(element);
        while let Some(el) = current {
            if el == ancestor {
                return true;
            }
            current = self.parent(el);
        }
        false
    }

    fn index_of(&self, element: ElementId) -> Option<usize> {
        let parent = self.parent(element)?;
        self.children(parent).iter().position(|&c| c == element)
    }

    fn next_sibling(&self, element: ElementId) -> Option<ElementId> {
        let parent = self.parent(element)?;
        let children = self.children(parent);
        let i = children.iter().position(|&c| c == element)?;
        children.get(i + 1).copied()
    }

    fn previous_sibling(&self, element: ElementId) -> Option<ElementId> {
        let parent = self.parent(element)?;
        let children = self.children(parent);
        let i = children.iter().position(|&c| c == element)?;
        i.checked_sub(1).and_then(|j| children.get(j).copied())
    }

    /// Check if an element is rendered (it and its ancestors are not
    /// `display: none`).
    fn is_displayed(&self, element: ElementId) -> bool {
        let mut current = Some(element);
        while let Some(el) = current {
            if self.computed_style(el, "display").as_deref() == Some("none") {
                return false;
            }
            current = self.parent(el);
        }
        true
    }
}

impl dyn Dom + '_ {
    /// Check an element against a selector. Invalid selectors never match.
    pub fn matches(&self, element: ElementId, selector: &str) -> bool {
        self.matches_in(element, selector, None)
    }

    /// Like [`matches`](Self::matches), resolving a leading `>` against `context`.
    pub fn matches_in(&self, element: ElementId, selector: &str, context: Option<ElementId>) -> bool {
        match Selector::parse(selector) {
            Ok(s) => s.matches(self, element, context),
            Err(err) => {
                log::warn!("{err}");
                false
            }
        }
    }

    /// Nearest element from `element` upwards matching `selector`, stopping at
    /// (and including) `boundary`.
    pub fn closest(&self, element: ElementId, selector: &str, boundary: Option<ElementId>) -> Option<ElementId> {
        let selector = Selector::parse(selector).ok()?;
        let mut current = Some(element);
        while let Some(el) = current {
            if selector.matches(self, el, boundary) {
                return Some(el);
            }
            if Some(el) == boundary {
                break;
            }
            current = self.parent(el);
        }
        None
    }
}
