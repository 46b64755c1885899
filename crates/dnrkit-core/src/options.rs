//! Option values that may change between reads, cancellable callback outcomes,
//! and configuration loading.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse options: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Unknown resize handle: {0}")]
    UnknownHandle(String),
    #[error("Invalid value for {option}: {reason}")]
    InvalidValue { option: String, reason: String },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Parse an options struct from JSON.
pub fn from_json<T: DeserializeOwned>(json: &str) -> ConfigResult<T> {
    Ok(serde_json::from_str(json)?)
}

/// A value that is either fixed or re-computed on every read.
///
/// Engines call [`Reactive::get`] once per operation and never cache the result
/// across pointer frames, so a dynamic source can change an option mid-gesture.
pub enum Reactive<T> {
    Static(T),
    Dynamic(Rc<dyn Fn() -> T>),
}

impl<T: Clone> Reactive<T> {
    /// Wrap a closure that is evaluated on every read.
    pub fn dynamic(f: impl Fn() -> T + 'static) -> Self {
        Self::Dynamic(Rc::new(f))
    }

    /// Read the current value.
    pub fn get(&self) -> T {
        match self {
            Self::Static(value) => value.clone(),
            Self::Dynamic(f) => f(),
        }
    }

    /// Replace the value with a static one.
    pub fn set(&mut self, value: T) {
        *self = Self::Static(value);
    }
}

impl<T: Clone> Clone for Reactive<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Static(value) => Self::Static(value.clone()),
            Self::Dynamic(f) => Self::Dynamic(Rc::clone(f)),
        }
    }
}

impl<T: Default> Default for Reactive<T> {
    fn default() -> Self {
        Self::Static(T::default())
    }
}

impl<T> From<T> for Reactive<T> {
    fn from(value: T) -> Self {
        Self::Static(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Reactive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(value) => f.debug_tuple("Static").field(value).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Reactive<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Self::Static)
    }
}

/// What a cancellable callback wants to happen next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Outcome {
    /// Continue with the operation. A callback with no opinion returns this.
    #[default]
    Proceed,
    /// Abort the operation (or, for per-frame callbacks, drop the frame).
    Cancel,
}

impl Outcome {
    pub fn is_cancel(self) -> bool {
        self == Outcome::Cancel
    }
}

impl From<bool> for Outcome {
    fn from(proceed: bool) -> Self {
        if proceed { Outcome::Proceed } else { Outcome::Cancel }
    }
}

impl From<()> for Outcome {
    fn from(_: ()) -> Self {
        Outcome::Proceed
    }
}

/// A cancellable callback.
pub type Veto<A> = Rc<dyn Fn(&A) -> Outcome>;

/// A notification callback whose return value is ignored.
pub type Notify<A> = Rc<dyn Fn(&A)>;

/// Invoke an optional cancellable callback; absent callbacks proceed.
pub(crate) fn ask<A>(callback: &Option<Veto<A>>, arg: &A) -> Outcome {
    callback.as_ref().map(|f| f(arg)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_static_value() {
        let value: Reactive<u32> = 5.into();
        assert_eq!(value.get(), 5);
    }

    #[test]
    fn test_dynamic_value_is_reread() {
        let counter = Rc::new(Cell::new(0));
        let source = Rc::clone(&counter);
        let value = Reactive::dynamic(move || source.get());

        assert_eq!(value.get(), 0);
        counter.set(7);
        assert_eq!(value.get(), 7);
    }

    #[test]
    fn test_outcome_from_bool() {
        assert_eq!(Outcome::from(true), Outcome::Proceed);
        assert!(Outcome::from(false).is_cancel());
        assert_eq!(Outcome::default(), Outcome::Proceed);
    }

    #[test]
    fn test_deserialize_as_static() {
        let value: Reactive<f64> = serde_json::from_str("2.5").unwrap();
        assert!((value.get() - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_json_error() {
        let result: ConfigResult<Reactive<f64>> = from_json("\"nope\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
