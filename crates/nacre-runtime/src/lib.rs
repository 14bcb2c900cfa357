#![forbid(unsafe_code)]

//! Cooperative scheduling primitives for Nacre.
//!
//! Everything here is single-threaded and host-driven: the host calls
//! [`FrameScheduler::run_frame`] once per repaint and [`TimerQueue::advance`]
//! as wall time passes (tests pass virtual time instead). Nothing blocks,
//! nothing spawns threads.
//!
//! # Invariants
//!
//! 1. A frame callback registered during `run_frame` runs in the *next*
//!    frame, never the current one.
//! 2. Timers fire in `(deadline, registration sequence)` order; an interval
//!    re-armed within one `advance` keeps firing until its next deadline
//!    passes the target time.
//! 3. Cancellation is immediate: a cancelled callback never fires, even if
//!    its deadline already passed.
//! 4. Callbacks are invoked with no internal borrow held; they may schedule
//!    and cancel freely.

pub mod debounce;
pub mod frame;
pub mod timers;

pub use debounce::Debouncer;
pub use frame::{FrameRequest, FrameScheduler};
pub use timers::{TimerId, TimerQueue};
