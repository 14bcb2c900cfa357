#![forbid(unsafe_code)]

//! Public facade for Nacre: the interaction layer of a portfolio site as an
//! embeddable, host-driven library.
//!
//! The host owns the real page and the event loop; Nacre owns the behavior.
//! Wire it up by mirroring page structure into a [`dom::Document`], then
//! constructing the two controllers:
//!
//! ```
//! use nacre::prelude::*;
//!
//! let doc = Document::new();
//! let frames = FrameScheduler::new();
//! let timers = TimerQueue::new();
//!
//! let mut animations =
//!     AnimationController::new(&doc, &frames, &timers, MotionConfig::default());
//! let mut forms = FormHandler::new(&doc, &timers);
//!
//! // Host loop: forward events, run frames, advance time.
//! doc.scroll_to(120.0);
//! doc.dispatch(doc.root(), EventKind::Scroll);
//! frames.run_frame();
//! timers.advance(16);
//!
//! animations.dispose();
//! forms.dispose();
//! ```
//!
//! The two controllers share the document without coordination and are torn
//! down independently; see the crate docs of [`motion`] and [`forms`] for
//! their contracts.

pub use nacre_dom as dom;
pub use nacre_forms as forms;
pub use nacre_motion as motion;
pub use nacre_runtime as runtime;

/// One-stop imports for embedding Nacre.
pub mod prelude {
    pub use nacre_dom::{
        Canvas, Document, DrawOp, Event, EventKind, ListenerId, NodeId, Rect, Rgba, Viewport,
    };
    pub use nacre_forms::{
        FieldRule, FileMeta, FormData, FormDescriptor, FormHandler, FormPhase, NotificationKind,
        Outcome, SubmitResult, Submission, ValidationResult,
    };
    pub use nacre_motion::{
        AnimationController, MotionConfig, Particle, ParticleConfig, ParticleSystem, SlideFrom,
    };
    pub use nacre_runtime::{Debouncer, FrameScheduler, TimerQueue};
}
