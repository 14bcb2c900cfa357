#![forbid(unsafe_code)]

//! Trailing-edge debouncing over the timer queue.

use std::cell::Cell;
use std::rc::Rc;

use crate::timers::{TimerId, TimerQueue};

/// Delays an action until a quiet period has elapsed since the last trigger.
/// Each trigger cancels the previous pending action; only the last survives.
pub struct Debouncer {
    timers: TimerQueue,
    delay_ms: u64,
    pending: Rc<Cell<Option<TimerId>>>,
}

impl Debouncer {
    #[must_use]
    pub fn new(timers: TimerQueue, delay_ms: u64) -> Self {
        Self {
            timers,
            delay_ms,
            pending: Rc::new(Cell::new(None)),
        }
    }

    #[must_use]
    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    /// Arm (or re-arm) the quiet-period timer with `f` as the action.
    pub fn trigger(&self, f: impl FnOnce() + 'static) {
        if let Some(id) = self.pending.take() {
            self.timers.cancel(id);
        }
        let pending = Rc::clone(&self.pending);
        let id = self.timers.set_timeout(self.delay_ms, move || {
            pending.set(None);
            f();
        });
        self.pending.set(Some(id));
    }

    /// Drop any pending action.
    pub fn cancel(&self) {
        if let Some(id) = self.pending.take() {
            self.timers.cancel(id);
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.get().is_some()
    }
}

impl std::fmt::Debug for Debouncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("delay_ms", &self.delay_ms)
            .field("pending", &self.is_pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_last_trigger_fires() {
        let timers = TimerQueue::new();
        let debouncer = Debouncer::new(timers.clone(), 500);
        let seen = Rc::new(Cell::new(0));

        for i in 1..=3 {
            let s = Rc::clone(&seen);
            debouncer.trigger(move || s.set(i));
            timers.advance(100);
        }
        assert_eq!(seen.get(), 0, "still within the quiet period");

        timers.advance(500);
        assert_eq!(seen.get(), 3, "only the last action runs");
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn quiet_period_restarts_on_trigger() {
        let timers = TimerQueue::new();
        let debouncer = Debouncer::new(timers.clone(), 500);
        let seen = Rc::new(Cell::new(false));

        let s = Rc::clone(&seen);
        debouncer.trigger(move || s.set(true));
        timers.advance(499);

        let s = Rc::clone(&seen);
        debouncer.trigger(move || s.set(true));
        timers.advance(499);
        assert!(!seen.get(), "timer restarted by second trigger");

        timers.advance(1);
        assert!(seen.get());
    }

    #[test]
    fn cancel_discards_pending_action() {
        let timers = TimerQueue::new();
        let debouncer = Debouncer::new(timers.clone(), 200);
        let seen = Rc::new(Cell::new(false));

        let s = Rc::clone(&seen);
        debouncer.trigger(move || s.set(true));
        debouncer.cancel();
        timers.advance(1000);
        assert!(!seen.get());
    }
}
