//! dnrkit sortable lists
//!
//! Reorderable lists built on the [`dnrkit_core::Dom`] abstraction. A
//! [`SortableManager`] owns one list; lists sharing a [`SortableContext`]
//! can exchange items according to their [`GroupOptions`].

pub mod animation;
pub mod autoscroll;
pub mod context;
pub mod error;
pub mod events;
pub mod ghost;
pub mod group;
pub mod instance;
pub mod manager;
pub mod options;
pub mod swap;

pub use animation::{AnimationManager, AnimationState};
pub use autoscroll::AutoScroll;
pub use context::SortableContext;
pub use error::{SortableError, SortableResult};
pub use events::{EventDispatcher, MoveEvent, MoveOutcome, SortableEvent, SortableEventType, SubscriptionId};
pub use ghost::Ghost;
pub use group::{DropDecision, GroupManager, GroupOptions, Pull, PullMode, Put};
pub use instance::Sortable;
pub use manager::SortableManager;
pub use options::{DataTransfer, Direction, SortableOptions};
pub use swap::{SwapConfig, SwapSide};
