#![forbid(unsafe_code)]

//! Particle background: fixed-size batch, simulate-then-draw every frame.
//!
//! # Invariants
//!
//! 1. The particle count never changes after spawn; the simulation step
//!    neither creates nor destroys particles.
//! 2. Boundary handling flips the offending velocity component's sign only.
//!    Positions are not clamped — a particle may overshoot the boundary for
//!    a tick and the reflection self-corrects on the next one.
//! 3. A canvas resize does not rescale particle positions; particles left
//!    outside the new bounds bounce back in within one reflection.
//! 4. `stop()` cancels the pending frame request and the resize listener;
//!    no further ticks run. Dropping the system stops it.

use std::cell::RefCell;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use nacre_dom::{Document, EventKind, ListenerId, NodeId, Rgba};
use nacre_runtime::{FrameRequest, FrameScheduler};

/// Default particle batch size.
pub const DEFAULT_PARTICLE_COUNT: usize = 50;

/// Base particle color before per-particle opacity is applied.
pub const PARTICLE_COLOR: Rgba = Rgba::rgb(37, 99, 235);

/// One particle. Plain data, owned exclusively by its system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub size: f64,
    pub opacity: f64,
}

/// Spawn parameters for a particle system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleConfig {
    pub count: usize,
    pub color: Rgba,
    /// Fixed RNG seed for deterministic batches (tests); `None` seeds from
    /// the OS.
    pub seed: Option<u64>,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            count: DEFAULT_PARTICLE_COUNT,
            color: PARTICLE_COLOR,
            seed: None,
        }
    }
}

/// Advance every particle by one tick: move by velocity, reflect velocity
/// off the `[0, width] × [0, height]` bounds.
pub fn step_particles(particles: &mut [Particle], width: f64, height: f64) {
    for p in particles {
        p.x += p.vx;
        p.y += p.vy;
        if p.x < 0.0 || p.x > width {
            p.vx = -p.vx;
        }
        if p.y < 0.0 || p.y > height {
            p.vy = -p.vy;
        }
    }
}

struct Shared {
    particles: Vec<Particle>,
    color: Rgba,
    running: bool,
    pending: Option<FrameRequest>,
    resize_listener: Option<ListenerId>,
    ticks: u64,
}

/// A running particle background attached to a container node.
///
/// The owning handle doubles as the stop handle: [`ParticleSystem::stop`]
/// halts the loop, [`ParticleSystem::detach`] additionally removes the
/// canvas node, and dropping the system stops it.
pub struct ParticleSystem {
    doc: Document,
    frames: FrameScheduler,
    canvas: NodeId,
    container: NodeId,
    shared: Rc<RefCell<Shared>>,
}

impl ParticleSystem {
    /// Attach a full-bleed, non-interactive, behind-content canvas to
    /// `container`, seed the particle batch, and start the frame loop.
    pub fn spawn(
        doc: &Document,
        frames: &FrameScheduler,
        container: NodeId,
        config: ParticleConfig,
    ) -> Self {
        let canvas = doc.create_element("canvas");
        for (prop, value) in [
            ("position", "absolute"),
            ("top", "0"),
            ("left", "0"),
            ("width", "100%"),
            ("height", "100%"),
            ("pointer-events", "none"),
            ("z-index", "-1"),
        ] {
            doc.set_style(canvas, prop, value);
        }
        doc.append_child(container, canvas);

        let rect = doc.rect(container);
        doc.attach_canvas(canvas, rect.width, rect.height);

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let particles = (0..config.count)
            .map(|_| Particle {
                x: sample_extent(&mut rng, rect.width),
                y: sample_extent(&mut rng, rect.height),
                vx: rng.random_range(-1.0..1.0),
                vy: rng.random_range(-1.0..1.0),
                size: rng.random_range(1.0..4.0),
                opacity: rng.random_range(0.2..0.7),
            })
            .collect();

        let shared = Rc::new(RefCell::new(Shared {
            particles,
            color: config.color,
            running: true,
            pending: None,
            resize_listener: None,
            ticks: 0,
        }));

        // Canvas tracks the container size; positions are left alone.
        let resize_listener = {
            let doc = doc.clone();
            doc.clone().add_listener(doc.root(), EventKind::Resize, move |_| {
                let rect = doc.rect(container);
                doc.resize_canvas(canvas, rect.width, rect.height);
            })
        };
        shared.borrow_mut().resize_listener = Some(resize_listener);

        tracing::debug!(count = config.count, "particle system spawned");

        let system = Self {
            doc: doc.clone(),
            frames: frames.clone(),
            canvas,
            container,
            shared,
        };
        arm(&system.doc, &system.frames, canvas, &system.shared);
        system
    }

    #[must_use]
    pub fn canvas_node(&self) -> NodeId {
        self.canvas
    }

    #[must_use]
    pub fn container(&self) -> NodeId {
        self.container
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.shared.borrow().particles.len()
    }

    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.shared.borrow().ticks
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shared.borrow().running
    }

    /// Snapshot of the current batch.
    #[must_use]
    pub fn particles(&self) -> Vec<Particle> {
        self.shared.borrow().particles.clone()
    }

    /// Stop the loop: no further frames are requested, the pending request
    /// is cancelled, the resize listener is dropped. Idempotent.
    pub fn stop(&self) {
        let (pending, listener) = {
            let mut shared = self.shared.borrow_mut();
            shared.running = false;
            (shared.pending.take(), shared.resize_listener.take())
        };
        if let Some(request) = pending {
            self.frames.cancel(request);
        }
        if let Some(listener) = listener {
            self.doc.remove_listener(listener);
        }
    }

    /// Stop the loop and remove the canvas node from the document.
    pub fn detach(self) {
        self.stop();
        self.doc.remove(self.canvas);
    }
}

impl Drop for ParticleSystem {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for ParticleSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shared = self.shared.borrow();
        f.debug_struct("ParticleSystem")
            .field("count", &shared.particles.len())
            .field("ticks", &shared.ticks)
            .field("running", &shared.running)
            .finish()
    }
}

fn sample_extent(rng: &mut StdRng, extent: f64) -> f64 {
    if extent > 0.0 {
        rng.random_range(0.0..extent)
    } else {
        0.0
    }
}

/// Request the next tick. The tick steps, redraws, and re-arms itself until
/// `running` goes false.
fn arm(doc: &Document, frames: &FrameScheduler, canvas: NodeId, shared: &Rc<RefCell<Shared>>) {
    let doc = doc.clone();
    let frames_again = frames.clone();
    let shared_again = Rc::clone(shared);
    let request = frames.request(move || {
        {
            let mut s = shared_again.borrow_mut();
            s.pending = None;
            if !s.running {
                return;
            }
            let (width, height) = doc.canvas_size(canvas).unwrap_or((0.0, 0.0));
            step_particles(&mut s.particles, width, height);
            s.ticks += 1;

            doc.canvas_clear(canvas);
            let color = s.color;
            for p in &s.particles {
                doc.canvas_fill_circle(canvas, p.x, p.y, p.size, color.with_alpha(p.opacity));
            }
        }
        arm(&doc, &frames_again, canvas, &shared_again);
    });
    shared.borrow_mut().pending = Some(request);
}
