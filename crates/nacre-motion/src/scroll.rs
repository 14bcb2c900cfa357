#![forbid(unsafe_code)]

//! Scroll-coupled style updates: parallax translation and navigation bar
//! background. The controller coalesces these to one recompute per frame;
//! the functions here do the actual style writes.

use nacre_dom::{Document, Rgba};

/// Navigation bar base color for the dark theme.
pub const NAVBAR_DARK_BASE: Rgba = Rgba::rgb(15, 23, 42);
/// Navigation bar base color for the light theme.
pub const NAVBAR_LIGHT_BASE: Rgba = Rgba::rgb(255, 255, 255);

/// Promote every element carrying the `data-parallax` attribute into the
/// parallax set by adding the `parallax` class. Runs once at controller
/// construction.
pub(crate) fn mark_parallax(doc: &Document) {
    for node in doc.descendants(doc.root()) {
        if doc.attr(node, "data-parallax").is_some() {
            doc.add_class(node, "parallax");
        }
    }
}

/// Recompute every scroll-coupled style from the current viewport.
///
/// Parallax elements get `translateY(-(scroll_y × speed)px)` with the speed
/// read from `data-speed` (falling back to `default_speed` when absent or
/// malformed). The `navbar` element, if present, gets a theme-dependent
/// background whose alpha tracks the scroll offset, capped at its maximum.
pub fn apply_scroll_styles(doc: &Document, default_speed: f64) {
    let scroll_y = doc.viewport().scroll_y;

    for node in doc.query_class("parallax") {
        let speed = doc
            .attr(node, "data-speed")
            .and_then(|raw| raw.parse::<f64>().ok())
            .unwrap_or(default_speed);
        let y = -(scroll_y * speed);
        doc.set_style(node, "transform", &format!("translateY({y}px)"));
    }

    if let Some(navbar) = doc.query_id("navbar") {
        let progress = (scroll_y / 100.0).min(1.0);
        let alpha = 0.95 + progress * 0.03;
        let base = if doc.attr(doc.root(), "data-theme").as_deref() == Some("dark") {
            NAVBAR_DARK_BASE
        } else {
            NAVBAR_LIGHT_BASE
        };
        doc.set_style(navbar, "background-color", &base.with_alpha(alpha).css());
    }
}
