#![forbid(unsafe_code)]

//! Virtual-clock timer queue: one-shot timeouts and repeating intervals.
//!
//! Time only moves when the host calls [`TimerQueue::advance`]. That makes
//! every timing-dependent behavior in the stack (debounced validation,
//! staggered reveals, simulated submission delays, notification dismissal)
//! deterministic under test: advance the clock, observe the effects.

use std::cell::RefCell;
use std::rc::Rc;

/// Handle to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

enum Callback {
    Once(Box<dyn FnOnce()>),
    Every(Rc<dyn Fn()>),
}

struct Entry {
    id: u64,
    seq: u64,
    deadline: u64,
    period: Option<u64>,
    callback: Callback,
}

#[derive(Default)]
struct Inner {
    now: u64,
    next_id: u64,
    next_seq: u64,
    entries: Vec<Entry>,
}

impl Inner {
    /// Index of the due entry with the smallest `(deadline, seq)`.
    fn next_due(&self, target: u64) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.deadline <= target)
            .min_by_key(|(_, e)| (e.deadline, e.seq))
            .map(|(i, _)| i)
    }
}

/// Cloneable handle to the timer queue.
#[derive(Clone, Default)]
pub struct TimerQueue {
    inner: Rc<RefCell<Inner>>,
}

impl TimerQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual milliseconds since the queue was created.
    #[must_use]
    pub fn now(&self) -> u64 {
        self.inner.borrow().now
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    /// Run `f` once, `delay_ms` from now. A zero delay fires on the next
    /// `advance`, not synchronously.
    pub fn set_timeout(&self, delay_ms: u64, f: impl FnOnce() + 'static) -> TimerId {
        self.push(delay_ms, None, Callback::Once(Box::new(f)))
    }

    /// Run `f` every `period_ms` (clamped to at least 1 ms), starting one
    /// period from now.
    pub fn set_interval(&self, period_ms: u64, f: impl Fn() + 'static) -> TimerId {
        let period = period_ms.max(1);
        self.push(period, Some(period), Callback::Every(Rc::new(f)))
    }

    /// Cancel a timer. Returns whether it was still scheduled.
    pub fn cancel(&self, timer: TimerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.entries.len();
        inner.entries.retain(|e| e.id != timer.0);
        inner.entries.len() != before
    }

    /// Move the clock forward by `ms`, firing everything that comes due in
    /// `(deadline, sequence)` order. Callbacks run with no borrow held and
    /// may schedule or cancel timers; newly scheduled timers fire within the
    /// same `advance` if their deadline lands inside it.
    pub fn advance(&self, ms: u64) {
        let target = self.inner.borrow().now + ms;
        loop {
            let fire = {
                let mut inner = self.inner.borrow_mut();
                let Some(idx) = inner.next_due(target) else {
                    break;
                };
                let deadline = inner.entries[idx].deadline;
                inner.now = inner.now.max(deadline);
                match inner.entries[idx].period {
                    // One-shot: remove the entry, take ownership of the callback.
                    None => match inner.entries.remove(idx).callback {
                        Callback::Once(f) => FireOnce::Once(f),
                        Callback::Every(f) => FireOnce::Every(f),
                    },
                    Some(period) => {
                        let seq = inner.next_seq;
                        inner.next_seq += 1;
                        let entry = &mut inner.entries[idx];
                        entry.deadline = deadline + period;
                        entry.seq = seq;
                        match &entry.callback {
                            Callback::Every(f) => FireOnce::Every(Rc::clone(f)),
                            Callback::Once(_) => unreachable!("periodic entries hold Fn callbacks"),
                        }
                    }
                }
            };
            match fire {
                FireOnce::Once(f) => f(),
                FireOnce::Every(f) => f(),
            }
        }
        self.inner.borrow_mut().now = target;
    }

    fn push(&self, delay_ms: u64, period: Option<u64>, callback: Callback) -> TimerId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        let deadline = inner.now + delay_ms;
        inner.entries.push(Entry {
            id,
            seq,
            deadline,
            period,
            callback,
        });
        tracing::trace!(id, deadline, periodic = period.is_some(), "timer armed");
        TimerId(id)
    }
}

enum FireOnce {
    Once(Box<dyn FnOnce()>),
    Every(Rc<dyn Fn()>),
}

impl std::fmt::Debug for TimerQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("TimerQueue")
            .field("now", &inner.now)
            .field("pending", &inner.entries.len())
            .finish()
    }
}
