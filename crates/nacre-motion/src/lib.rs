#![forbid(unsafe_code)]

//! Animation layer for Nacre: visibility-triggered reveals with staggered
//! children, frame-coalesced scroll effects (parallax, navigation bar),
//! hover micro-interactions, a typing effect, one-shot utility animations,
//! and the particle background.
//!
//! One [`AnimationController`] instance owns all wiring for a document. It
//! is constructed explicitly with the document and scheduling handles (no
//! globals, no load-order side effects) and torn down with
//! [`AnimationController::dispose`], which unregisters every listener,
//! cancels every armed timer, and stops every particle loop it spawned.
//!
//! The controller and the form layer share the document without
//! coordination; they stay out of each other's way by touching disjoint
//! class namespaces.

pub mod controller;
pub mod fx;
pub mod hover;
pub mod particles;
pub mod scroll;
pub mod typing;
pub mod visibility;

pub use controller::{
    AnimationController, MotionConfig, REVEAL_PREFIXES, STAGGER_CLASS, STAGGER_ROLES,
};
pub use fx::SlideFrom;
pub use particles::{Particle, ParticleConfig, ParticleSystem, step_particles};
pub use visibility::VisibilityWatcher;
