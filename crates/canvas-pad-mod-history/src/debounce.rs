/// Cancel-and-reschedule timer for coalescing bursts of changes.
use std::time::{Duration, Instant};

/// Longest accepted debounce delay. Longer delays are clamped to it.
pub const MAX_DELAY: Duration = Duration::from_secs(10);

/// A single pending deadline that moves forward on every trigger.
///
/// The owner drives it: `schedule` on each change, `fire_if_due` from the
/// event loop. Nothing runs on its own.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay: delay.min(MAX_DELAY),
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replaces any pending deadline with `now + delay`.
    ///
    /// If that instant is not representable the deadline becomes `now`.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now.checked_add(self.delay).unwrap_or(now));
    }

    /// Drops the pending deadline. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Clears and reports the deadline once `now` has reached it.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
