//! Leading + trailing edge throttling for pointer-move frames.

use crate::input::Instant;
use std::time::Duration;

/// Throttles a stream of values to at most one per interval.
///
/// The first value after a quiet period is delivered immediately (leading
/// edge). Values arriving inside the interval replace a single pending slot,
/// which is delivered by [`Throttle::poll`] once the interval has elapsed or by
/// [`Throttle::flush`] when the gesture ends (trailing edge), so the final value
/// is never dropped.
#[derive(Debug, Clone)]
pub struct Throttle<T> {
    last_emit: Option<Instant>,
    pending: Option<T>,
}

impl<T> Default for Throttle<T> {
    fn default() -> Self {
        Self {
            last_emit: None,
            pending: None,
        }
    }
}

impl<T> Throttle<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a value. Returns it when it may be delivered now.
    pub fn submit(&mut self, value: T, now: Instant, interval: Duration) -> Option<T> {
        let ready = interval.is_zero()
            || self
                .last_emit
                .is_none_or(|last| now.saturating_duration_since(last) >= interval);
        if ready {
            self.last_emit = Some(now);
            self.pending = None;
            Some(value)
        } else {
            self.pending = Some(value);
            None
        }
    }

    /// Deliver the pending trailing value if the interval has elapsed.
    pub fn poll(&mut self, now: Instant, interval: Duration) -> Option<T> {
        let due = self
            .last_emit
            .is_none_or(|last| now.saturating_duration_since(last) >= interval);
        if due && self.pending.is_some() {
            self.last_emit = Some(now);
            self.pending.take()
        } else {
            None
        }
    }

    /// Take the pending value regardless of timing.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Forget timing and any pending value.
    pub fn reset(&mut self) {
        self.last_emit = None;
        self.pending = None;
    }
}
