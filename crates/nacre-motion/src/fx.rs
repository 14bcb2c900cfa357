#![forbid(unsafe_code)]

//! One-shot utility animations: fades, slides, list staggering, and a
//! rect-to-rect morph. Each call writes the arming styles immediately and
//! schedules the release; CSS transitions do the easing.

use nacre_dom::{Document, NodeId};
use nacre_runtime::{TimerId, TimerQueue};

/// Delay between arming a transition and releasing it, so the transition
/// property lands before the final value.
const KICK_MS: u64 = 10;

/// Where a sliding element starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideFrom {
    Left,
    Right,
    Up,
    Down,
}

impl SlideFrom {
    #[must_use]
    pub const fn offset(self) -> &'static str {
        match self {
            Self::Left => "translateX(-100%)",
            Self::Right => "translateX(100%)",
            Self::Up => "translateY(-100%)",
            Self::Down => "translateY(100%)",
        }
    }
}

/// Fade `node` in over `duration_ms`.
pub(crate) fn fade_in(
    doc: &Document,
    timers: &TimerQueue,
    node: NodeId,
    duration_ms: u64,
) -> Vec<TimerId> {
    doc.set_style(node, "opacity", "0");
    doc.set_style(
        node,
        "transition",
        &format!("opacity {duration_ms}ms ease-in-out"),
    );
    let doc = doc.clone();
    vec![timers.set_timeout(KICK_MS, move || doc.set_style(node, "opacity", "1"))]
}

/// Fade `node` out over `duration_ms`, then take it out of flow.
pub(crate) fn fade_out(
    doc: &Document,
    timers: &TimerQueue,
    node: NodeId,
    duration_ms: u64,
) -> Vec<TimerId> {
    doc.set_style(
        node,
        "transition",
        &format!("opacity {duration_ms}ms ease-in-out"),
    );
    doc.set_style(node, "opacity", "0");
    let doc = doc.clone();
    vec![timers.set_timeout(duration_ms, move || doc.set_style(node, "display", "none"))]
}

/// Slide `node` in from `from` over `duration_ms`.
pub(crate) fn slide_in(
    doc: &Document,
    timers: &TimerQueue,
    node: NodeId,
    from: SlideFrom,
    duration_ms: u64,
) -> Vec<TimerId> {
    doc.set_style(node, "transform", from.offset());
    doc.set_style(
        node,
        "transition",
        &format!("transform {duration_ms}ms ease-out"),
    );
    let doc = doc.clone();
    vec![timers.set_timeout(KICK_MS, move || {
        doc.set_style(node, "transform", "translate(0, 0)");
    })]
}

/// Add `class` to the i-th element after `i × step_ms`.
pub(crate) fn stagger(
    doc: &Document,
    timers: &TimerQueue,
    nodes: &[NodeId],
    class: &str,
    step_ms: u64,
) -> Vec<TimerId> {
    nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let doc = doc.clone();
            let node = *node;
            let class = class.to_owned();
            timers.set_timeout(i as u64 * step_ms, move || doc.add_class(node, &class))
        })
        .collect()
}

/// Visually morph `to` from `from`'s rect onto its own over `duration_ms`.
pub(crate) fn morph(
    doc: &Document,
    timers: &TimerQueue,
    from: NodeId,
    to: NodeId,
    duration_ms: u64,
) -> Vec<TimerId> {
    let from_rect = doc.rect(from);
    let to_rect = doc.rect(to);

    let dx = from_rect.x - to_rect.x;
    let dy = from_rect.y - to_rect.y;
    // Zero-sized targets keep unit scale.
    let sw = if to_rect.width > 0.0 {
        from_rect.width / to_rect.width
    } else {
        1.0
    };
    let sh = if to_rect.height > 0.0 {
        from_rect.height / to_rect.height
    } else {
        1.0
    };

    doc.set_style(
        to,
        "transform",
        &format!("translate({dx}px, {dy}px) scale({sw}, {sh})"),
    );
    doc.set_style(
        to,
        "transition",
        &format!("transform {duration_ms}ms ease-out"),
    );
    let doc = doc.clone();
    vec![timers.set_timeout(KICK_MS, move || {
        doc.set_style(to, "transform", "translate(0, 0) scale(1, 1)");
    })]
}
