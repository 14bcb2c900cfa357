#![forbid(unsafe_code)]

//! The animation controller: one explicit instance per document.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use nacre_dom::{Document, EventKind, ListenerId, NodeId};
use nacre_runtime::{FrameScheduler, TimerId, TimerQueue};

use crate::fx::{self, SlideFrom};
use crate::hover;
use crate::particles::{ParticleConfig, ParticleSystem};
use crate::scroll;
use crate::typing;
use crate::visibility::{VisibilityWatcher, intersects_viewport};

/// Class prefixes that mark an element as reveal-animated.
pub const REVEAL_PREFIXES: [&str; 3] = ["animate-", "fade-", "slide-"];

/// Descendant roles that get the staggered secondary class on reveal.
pub const STAGGER_ROLES: [&str; 3] = ["skill-item", "project-card", "timeline-item"];

/// Secondary class applied to staggered descendants.
pub const STAGGER_CLASS: &str = "fade-in-up";

/// Tunables for the animation layer. The defaults reproduce the stock
/// portfolio behavior.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionConfig {
    /// Fraction of an element that must be visible before it reveals.
    pub reveal_threshold: f64,
    /// Pixels shaved off the viewport bottom for reveal purposes.
    pub reveal_bottom_inset: f64,
    /// Per-sibling delay of the staggered secondary class.
    pub stagger_step_ms: u64,
    /// Pause before the typing effect starts.
    pub typing_start_delay_ms: u64,
    /// Per-grapheme reveal interval.
    pub typing_tick_ms: u64,
    /// Cursor blink half-period after typing finishes.
    pub cursor_blink_ms: u64,
    /// Parallax speed factor when `data-speed` is absent or malformed.
    pub parallax_default_speed: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            reveal_threshold: 0.1,
            reveal_bottom_inset: 50.0,
            stagger_step_ms: 100,
            typing_start_delay_ms: 1000,
            typing_tick_ms: 100,
            cursor_blink_ms: 500,
            parallax_default_speed: 0.5,
        }
    }
}

/// Owns all animation wiring for one document.
///
/// Construction scans the document once and registers everything; no
/// elements discovered later are picked up (matching a page whose structure
/// is complete when the controller comes up). [`AnimationController::dispose`]
/// tears all of it down.
pub struct AnimationController {
    doc: Document,
    frames: FrameScheduler,
    timers: TimerQueue,
    config: MotionConfig,
    listeners: Vec<ListenerId>,
    watcher: Rc<RefCell<VisibilityWatcher>>,
    armed: Rc<RefCell<Vec<TimerId>>>,
    particles: Vec<ParticleSystem>,
    disposed: bool,
}

impl AnimationController {
    pub fn new(
        doc: &Document,
        frames: &FrameScheduler,
        timers: &TimerQueue,
        config: MotionConfig,
    ) -> Self {
        let watcher = Rc::new(RefCell::new(VisibilityWatcher::new(
            config.reveal_threshold,
            config.reveal_bottom_inset,
        )));
        let mut controller = Self {
            doc: doc.clone(),
            frames: frames.clone(),
            timers: timers.clone(),
            config,
            listeners: Vec::new(),
            watcher,
            armed: Rc::new(RefCell::new(Vec::new())),
            particles: Vec::new(),
            disposed: false,
        };

        controller.setup_reveal();
        controller.setup_scroll_styles();
        let hover_listeners = hover::wire_hover(&controller.doc);
        controller.listeners.extend(hover_listeners);
        typing::start_typing(
            &controller.doc,
            &controller.timers,
            config.typing_start_delay_ms,
            config.typing_tick_ms,
            config.cursor_blink_ms,
            &controller.armed,
        );
        scroll::mark_parallax(&controller.doc);

        tracing::debug!(
            watched = controller.watcher.borrow().len(),
            listeners = controller.listeners.len(),
            "animation controller wired"
        );
        controller
    }

    /// Reveal dispatch and progress bars: one document scan, then updates on
    /// scroll and resize. Elements already in view reveal immediately.
    fn setup_reveal(&mut self) {
        {
            let mut watcher = self.watcher.borrow_mut();
            for node in self.doc.query_class_prefix(&REVEAL_PREFIXES) {
                watcher.observe(node);
            }
        }
        let progress_bars = self.doc.query_class("progress-bar");

        let update = {
            let doc = self.doc.clone();
            let timers = self.timers.clone();
            let watcher = Rc::clone(&self.watcher);
            let armed = Rc::clone(&self.armed);
            let stagger_step_ms = self.config.stagger_step_ms;
            move || {
                let entered = watcher.borrow_mut().update(&doc);
                for node in entered {
                    reveal_element(&doc, &timers, stagger_step_ms, &armed, node);
                }
                for bar in &progress_bars {
                    if !doc.has_class(*bar, "animate") && intersects_viewport(&doc, *bar) {
                        doc.add_class(*bar, "animate");
                    }
                }
            }
        };

        // Initial pass, then keep current on scroll and resize.
        update();
        let on_scroll = update.clone();
        self.listeners.push(self.doc.add_listener(
            self.doc.root(),
            EventKind::Scroll,
            move |_| on_scroll(),
        ));
        self.listeners.push(self.doc.add_listener(
            self.doc.root(),
            EventKind::Resize,
            move |_| update(),
        ));
    }

    /// Parallax + navbar, coalesced to one recompute per frame via a
    /// pending-frame flag.
    fn setup_scroll_styles(&mut self) {
        let ticking = Rc::new(Cell::new(false));
        let doc = self.doc.clone();
        let frames = self.frames.clone();
        let default_speed = self.config.parallax_default_speed;
        self.listeners.push(self.doc.add_listener(
            self.doc.root(),
            EventKind::Scroll,
            move |_| {
                if ticking.get() {
                    return;
                }
                ticking.set(true);
                let ticking = Rc::clone(&ticking);
                let doc = doc.clone();
                frames.request(move || {
                    ticking.set(false);
                    scroll::apply_scroll_styles(&doc, default_speed);
                });
            },
        ));
    }

    /// Spawn a particle background in `container`; the controller keeps the
    /// system alive and stops it on dispose. Returns the canvas node.
    pub fn create_particle_system(&mut self, container: NodeId, config: ParticleConfig) -> NodeId {
        let system = ParticleSystem::spawn(&self.doc, &self.frames, container, config);
        let canvas = system.canvas_node();
        self.particles.push(system);
        canvas
    }

    /// Particle systems spawned through this controller.
    #[must_use]
    pub fn particle_systems(&self) -> &[ParticleSystem] {
        &self.particles
    }

    pub fn fade_in(&self, node: NodeId, duration_ms: u64) {
        let ids = fx::fade_in(&self.doc, &self.timers, node, duration_ms);
        self.armed.borrow_mut().extend(ids);
    }

    pub fn fade_out(&self, node: NodeId, duration_ms: u64) {
        let ids = fx::fade_out(&self.doc, &self.timers, node, duration_ms);
        self.armed.borrow_mut().extend(ids);
    }

    pub fn slide_in(&self, node: NodeId, from: SlideFrom, duration_ms: u64) {
        let ids = fx::slide_in(&self.doc, &self.timers, node, from, duration_ms);
        self.armed.borrow_mut().extend(ids);
    }

    /// Add `class` to each node, the i-th after `i × step_ms`.
    pub fn stagger(&self, nodes: &[NodeId], class: &str, step_ms: u64) {
        let ids = fx::stagger(&self.doc, &self.timers, nodes, class, step_ms);
        self.armed.borrow_mut().extend(ids);
    }

    pub fn morph(&self, from: NodeId, to: NodeId, duration_ms: u64) {
        let ids = fx::morph(&self.doc, &self.timers, from, to, duration_ms);
        self.armed.borrow_mut().extend(ids);
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Tear down: unregister listeners, cancel armed timers, clear the
    /// watcher, stop particle loops. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        for listener in self.listeners.drain(..) {
            self.doc.remove_listener(listener);
        }
        for timer in self.armed.borrow_mut().drain(..) {
            self.timers.cancel(timer);
        }
        self.watcher.borrow_mut().clear();
        self.particles.clear();
        tracing::debug!("animation controller disposed");
    }
}

impl std::fmt::Debug for AnimationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationController")
            .field("listeners", &self.listeners.len())
            .field("watched", &self.watcher.borrow().len())
            .field("particle_systems", &self.particles.len())
            .field("disposed", &self.disposed)
            .finish()
    }
}

/// Apply the reveal to a newly visible element: re-add its intent class and
/// stagger the secondary class onto role descendants.
fn reveal_element(
    doc: &Document,
    timers: &TimerQueue,
    stagger_step_ms: u64,
    armed: &Rc<RefCell<Vec<TimerId>>>,
    node: NodeId,
) {
    let Some(class) = doc.class_with_prefix(node, &REVEAL_PREFIXES) else {
        return;
    };
    doc.add_class(node, &class);

    let staggered: Vec<NodeId> = doc
        .descendants(node)
        .into_iter()
        .filter(|n| STAGGER_ROLES.iter().any(|role| doc.has_class(*n, role)))
        .collect();
    let ids = fx::stagger(doc, timers, &staggered, STAGGER_CLASS, stagger_step_ms);
    armed.borrow_mut().extend(ids);
}
