use crate::timer::Timer;
use std::time::Duration;
use tracing::debug;

/// One-shot, cancellable timeout measured against a [`Timer`].
///
/// Nothing fires on its own: the owner calls [`Countdown::poll`] from its
/// event loop and gets `true` exactly once after the deadline.
#[derive(Debug, Clone)]
pub struct Countdown<T: Timer> {
    timer: T,
    armed: Option<(T::Timestamp, Duration)>,
}

impl<T: Timer> Countdown<T> {
    pub fn new(timer: T) -> Self {
        Self { timer, armed: None }
    }

    /// Arms the countdown, replacing any pending one.
    pub fn start(&mut self, duration: Duration) {
        debug!("Countdown started for {:?}", duration);
        self.armed = Some((self.timer.now(), duration));
    }

    pub fn cancel(&mut self) {
        if self.armed.take().is_some() {
            debug!("Countdown cancelled");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.armed
            .map(|(start, duration)| duration.saturating_sub(self.timer.elapsed(start)))
    }

    /// Returns true once the deadline has passed, then disarms.
    pub fn poll(&mut self) -> bool {
        match self.armed {
            Some((start, duration)) if self.timer.elapsed(start) >= duration => {
                self.armed = None;
                true
            }
            _ => false,
        }
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }
}
