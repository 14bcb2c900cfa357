#![forbid(unsafe_code)]

//! Visibility tracking against the document viewport.
//!
//! The platform analog is an intersection observer; here the watcher is
//! recomputed explicitly from node rects and the viewport on every scroll or
//! resize. Consumers are notified of *entries* (not-intersecting →
//! intersecting). Exits update internal state silently so a later re-entry
//! notifies again.

use nacre_dom::{Document, NodeId};

struct Entry {
    node: NodeId,
    intersecting: bool,
}

/// Threshold-based visibility watcher with a bottom inset.
///
/// An element counts as intersecting once at least `threshold` of its height
/// overlaps the band `[scroll_y, scroll_y + viewport_height - bottom_inset]`.
/// The inset pulls the effective bottom edge up so reveals trigger slightly
/// before an element fully scrolls in.
pub struct VisibilityWatcher {
    threshold: f64,
    bottom_inset: f64,
    entries: Vec<Entry>,
}

impl VisibilityWatcher {
    #[must_use]
    pub fn new(threshold: f64, bottom_inset: f64) -> Self {
        Self {
            threshold,
            bottom_inset,
            entries: Vec::new(),
        }
    }

    /// Track `node`. Tracking starts as not-intersecting; the next
    /// [`VisibilityWatcher::update`] reports it if it is already visible.
    pub fn observe(&mut self, node: NodeId) {
        if !self.entries.iter().any(|e| e.node == node) {
            self.entries.push(Entry {
                node,
                intersecting: false,
            });
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn is_intersecting(&self, node: NodeId) -> bool {
        self.entries
            .iter()
            .any(|e| e.node == node && e.intersecting)
    }

    /// Drop every tracked node.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Recompute visibility for every tracked node. Returns the nodes that
    /// crossed from not-intersecting to intersecting, in tracking order.
    pub fn update(&mut self, doc: &Document) -> Vec<NodeId> {
        let viewport = doc.viewport();
        let top = viewport.scroll_y;
        let bottom = viewport.bottom() - self.bottom_inset;

        let mut entered = Vec::new();
        for entry in &mut self.entries {
            let rect = doc.rect(entry.node);
            let now = if rect.height > 0.0 {
                rect.vertical_overlap(top, bottom) / rect.height >= self.threshold
            } else {
                rect.y >= top && rect.y <= bottom
            };
            if now && !entry.intersecting {
                entered.push(entry.node);
            }
            entry.intersecting = now;
        }
        entered
    }
}

impl std::fmt::Debug for VisibilityWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisibilityWatcher")
            .field("threshold", &self.threshold)
            .field("tracked", &self.entries.len())
            .finish()
    }
}

/// Whether any part of `node`'s rect overlaps the plain viewport band
/// (no threshold, no inset). Used by the progress-bar reveal.
#[must_use]
pub fn intersects_viewport(doc: &Document, node: NodeId) -> bool {
    let viewport = doc.viewport();
    doc.rect(node)
        .vertical_overlap(viewport.scroll_y, viewport.bottom())
        > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use nacre_dom::{Rect, Viewport};

    fn doc_with_node(y: f64, height: f64) -> (Document, NodeId) {
        let doc = Document::new();
        doc.set_viewport(Viewport::new(1000.0, 800.0));
        let node = doc.create_element("div");
        doc.append_child(doc.root(), node);
        doc.set_rect(node, Rect::new(0.0, y, 100.0, height));
        (doc, node)
    }

    #[test]
    fn reports_entry_once_per_crossing() {
        let (doc, node) = doc_with_node(1000.0, 200.0);
        let mut watcher = VisibilityWatcher::new(0.1, 50.0);
        watcher.observe(node);

        assert!(watcher.update(&doc).is_empty(), "off-screen at start");

        doc.scroll_to(300.0);
        assert_eq!(watcher.update(&doc), vec![node]);
        assert!(watcher.is_intersecting(node));

        doc.scroll_to(310.0);
        assert!(watcher.update(&doc).is_empty(), "still visible, no re-entry");
    }

    #[test]
    fn reentry_after_exit_notifies_again() {
        let (doc, node) = doc_with_node(1000.0, 200.0);
        let mut watcher = VisibilityWatcher::new(0.1, 50.0);
        watcher.observe(node);

        doc.scroll_to(400.0);
        assert_eq!(watcher.update(&doc).len(), 1);

        doc.scroll_to(0.0);
        assert!(watcher.update(&doc).is_empty());
        assert!(!watcher.is_intersecting(node));

        doc.scroll_to(400.0);
        assert_eq!(watcher.update(&doc).len(), 1);
    }

    #[test]
    fn threshold_requires_fraction_visible() {
        // Element of height 200 at y=1000; viewport 800 with 50 inset covers
        // up to scroll + 750. At scroll 260 only 10 px (5%) is visible.
        let (doc, node) = doc_with_node(1000.0, 200.0);
        let mut watcher = VisibilityWatcher::new(0.1, 50.0);
        watcher.observe(node);

        doc.scroll_to(260.0);
        assert!(watcher.update(&doc).is_empty(), "5% is below threshold");

        doc.scroll_to(270.0);
        assert_eq!(watcher.update(&doc), vec![node], "10% meets threshold");
    }

    #[test]
    fn bottom_inset_delays_trigger() {
        let (doc, node) = doc_with_node(780.0, 100.0);
        // Without inset the element is 20 px visible at scroll 0; the inset
        // pushes the effective bottom to 750, hiding it entirely.
        let mut watcher = VisibilityWatcher::new(0.1, 50.0);
        watcher.observe(node);
        assert!(watcher.update(&doc).is_empty());

        let mut no_inset = VisibilityWatcher::new(0.1, 0.0);
        no_inset.observe(node);
        assert_eq!(no_inset.update(&doc), vec![node]);
    }

    #[test]
    fn observe_is_idempotent() {
        let (doc, node) = doc_with_node(0.0, 100.0);
        let mut watcher = VisibilityWatcher::new(0.1, 50.0);
        watcher.observe(node);
        watcher.observe(node);
        assert_eq!(watcher.len(), 1);
        assert_eq!(watcher.update(&doc), vec![node]);
    }

    #[test]
    fn plain_intersection_for_progress_bars() {
        let (doc, node) = doc_with_node(900.0, 50.0);
        assert!(!intersects_viewport(&doc, node));
        doc.scroll_to(101.0);
        assert!(intersects_viewport(&doc, node));
    }
}
