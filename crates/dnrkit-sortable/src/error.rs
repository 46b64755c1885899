//! Sortable errors.

use dnrkit_core::{ConfigError, DomError, ElementId};
use thiserror::Error;

/// Sortable errors.
#[derive(Debug, Error)]
pub enum SortableError {
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Unknown option: {0}")]
    UnknownOption(String),
    #[error("Unknown event type: {0}")]
    UnknownEventType(String),
    #[error("Element {0} is not a child of the list")]
    NotAnItem(ElementId),
}

/// Result type for sortable operations.
pub type SortableResult<T> = Result<T, SortableError>;
