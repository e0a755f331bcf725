use std::time::Duration;

use tokio::time::Instant;

/// Trailing debounce: a value only settles after `delay` without a newer push.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    settled: T,
    pending: Option<(T, Instant)>,
}

impl<T: Clone + PartialEq> Debouncer<T> {
    pub fn new(initial: T, delay: Duration) -> Self {
        Self {
            delay,
            settled: initial,
            pending: None,
        }
    }

    /// Record a new raw value and restart the quiet period.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    /// When the pending value will settle, if there is one.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at)
    }

    /// Settle the pending value if its quiet period has elapsed.
    /// Returns the new value only when it differs from the previous one.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.pending.take() {
            Some((value, at)) if now >= at => {
                if value == self.settled {
                    return None;
                }
                self.settled = value.clone();
                Some(value)
            }
            not_yet => {
                self.pending = not_yet;
                None
            }
        }
    }

    pub fn settled(&self) -> &T {
        &self.settled
    }
}
