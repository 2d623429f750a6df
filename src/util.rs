//! Shared utilities

use std::time::{Duration, Instant};

// ============================================================================
// Event throttle
// ============================================================================

/// Rate limiter for pointer events.
///
/// The first event after a quiet period passes straight through. Events
/// arriving inside the interval are held, each replacing the last, and the
/// newest one is released by [`Throttle::flush`] once the interval has
/// elapsed. Superseded events are dropped.
#[derive(Debug, Clone)]
pub struct Throttle<T> {
    interval: Duration,
    last_fired: Option<Instant>,
    pending: Option<T>,
}

impl<T> Throttle<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fired: None,
            pending: None,
        }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    fn ready(&self, now: Instant) -> bool {
        match self.last_fired {
            Some(t) => now.saturating_duration_since(t) >= self.interval,
            None => true,
        }
    }

    /// Offer an event. Returns it if it may be handled now.
    pub fn offer(&mut self, now: Instant, item: T) -> Option<T> {
        if self.ready(now) {
            self.last_fired = Some(now);
            self.pending = None;
            Some(item)
        } else {
            self.pending = Some(item);
            None
        }
    }

    /// Release the held event if its interval has passed
    pub fn flush(&mut self, now: Instant) -> Option<T> {
        if self.pending.is_some() && self.ready(now) {
            self.last_fired = Some(now);
            self.pending.take()
        } else {
            None
        }
    }

    /// Drop any held event, e.g. when a competing event supersedes it
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
