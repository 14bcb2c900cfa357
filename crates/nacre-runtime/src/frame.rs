#![forbid(unsafe_code)]

//! One-shot per-frame callback scheduling.
//!
//! The analog of a repaint-synchronized callback queue: consumers request a
//! callback before the next frame and re-request from inside it to build
//! loops. Each request is one-shot and individually cancellable, which is
//! what gives render loops a teardown handle.

use std::cell::RefCell;
use std::mem;
use std::rc::Rc;
use std::time::Duration;

use web_time::Instant;

/// Handle to a pending frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(u64);

type FrameFn = Box<dyn FnOnce()>;

#[derive(Default)]
struct Inner {
    next_id: u64,
    queue: Vec<(u64, FrameFn)>,
    frames_run: u64,
    last_frame: Option<Instant>,
}

/// Cloneable handle to the frame callback queue.
#[derive(Clone, Default)]
pub struct FrameScheduler {
    inner: Rc<RefCell<Inner>>,
}

impl FrameScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `f` to run on the next frame.
    pub fn request(&self, f: impl FnOnce() + 'static) -> FrameRequest {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.queue.push((id, Box::new(f)));
        FrameRequest(id)
    }

    /// Drop a pending request. Returns whether it was still pending.
    pub fn cancel(&self, request: FrameRequest) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.queue.len();
        inner.queue.retain(|(id, _)| *id != request.0);
        inner.queue.len() != before
    }

    /// Number of callbacks waiting for the next frame.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.borrow().queue.len()
    }

    /// Run one frame: drain the current batch in registration order.
    /// Requests made by the callbacks land in the next batch. Returns the
    /// number of callbacks run.
    pub fn run_frame(&self) -> usize {
        let batch = {
            let mut inner = self.inner.borrow_mut();
            inner.frames_run += 1;
            inner.last_frame = Some(Instant::now());
            mem::take(&mut inner.queue)
        };
        let count = batch.len();
        for (_, callback) in batch {
            callback();
        }
        tracing::trace!(callbacks = count, "frame");
        count
    }

    /// Total frames run so far.
    #[must_use]
    pub fn frames_run(&self) -> u64 {
        self.inner.borrow().frames_run
    }

    /// Wall-clock time since the last `run_frame`, if any.
    #[must_use]
    pub fn since_last_frame(&self) -> Option<Duration> {
        self.inner.borrow().last_frame.map(|t| t.elapsed())
    }
}

impl std::fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("FrameScheduler")
            .field("pending", &inner.queue.len())
            .field("frames_run", &inner.frames_run)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn callbacks_run_in_registration_order() {
        let frames = FrameScheduler::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let o = Rc::clone(&order);
            frames.request(move || o.borrow_mut().push(i));
        }
        assert_eq!(frames.run_frame(), 3);
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn rerequest_lands_in_next_frame() {
        let frames = FrameScheduler::new();
        let hits = Rc::new(Cell::new(0));

        let f2 = frames.clone();
        let h = Rc::clone(&hits);
        frames.request(move || {
            h.set(h.get() + 1);
            let h2 = Rc::clone(&h);
            f2.request(move || h2.set(h2.get() + 1));
        });

        assert_eq!(frames.run_frame(), 1);
        assert_eq!(hits.get(), 1, "re-request must not run this frame");
        assert_eq!(frames.run_frame(), 1);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn cancel_prevents_run() {
        let frames = FrameScheduler::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let req = frames.request(move || h.set(h.get() + 1));

        assert!(frames.cancel(req));
        assert!(!frames.cancel(req), "double cancel reports false");
        frames.run_frame();
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn empty_frame_is_fine() {
        let frames = FrameScheduler::new();
        assert_eq!(frames.run_frame(), 0);
        assert_eq!(frames.frames_run(), 1);
    }
}
