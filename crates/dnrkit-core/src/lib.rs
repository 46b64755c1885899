//! dnrkit core library
//!
//! Headless drag, resize and drag-and-resize engines. Engines never talk to a
//! browser directly: they measure and mutate elements through the [`Dom`] trait,
//! which is implemented by [`MemoryDom`] on every target and by `WebDom` on wasm.

pub mod activation;
pub mod dnr;
pub mod dom;
pub mod draggable;
pub mod geometry;
pub mod handle;
pub mod input;
pub mod options;
pub mod resizable;
pub mod snap;
pub mod store;
pub mod style;
pub mod throttle;

pub use activation::{Activation, ActivationOptions, ActivationTrigger};
pub use dnr::{DnrOptions, DragAndResize};
pub use dom::{Dom, DomError, DomResult, ElementId, EventKind, EventQueue, FlowAxis, ListenTarget, ListenerId, MemoryDom, Platform};
pub use draggable::{DragEventData, DragOptions, Draggable};
pub use geometry::{Axis, BoxModel, ElementSize, PositionType, SizeLimits, SizeValue};
pub use handle::{HandlePosition, HandleType};
pub use input::{DomEvent, Instant, NativeDragEvent, NativeDragPhase, PointerEvent, PointerPhase, PointerType};
pub use options::{ConfigError, ConfigResult, Outcome, Reactive};
pub use resizable::{ResizeEventData, ResizeOptions, Resizable};
pub use snap::{Grid, SnapResult, snap_to_grid};
pub use store::{InteractionScope, InteractionState};
pub use style::StyleMap;
pub use throttle::Throttle;
