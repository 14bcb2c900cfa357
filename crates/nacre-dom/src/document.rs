#![forbid(unsafe_code)]

//! The document handle: tree mutation, queries, and event dispatch.

use std::cell::RefCell;
use std::rc::Rc;

use crate::NodeId;
use crate::canvas::{Canvas, DrawOp};
use crate::event::{Event, EventKind, ListenerId, ListenerTable};
use crate::geometry::{Rect, Viewport};
use crate::node::{Node, NodeFlags};
use crate::style::Rgba;

/// Tags treated as form controls by value operations and control queries.
const CONTROL_TAGS: [&str; 3] = ["input", "textarea", "select"];

struct DocInner {
    nodes: Vec<Node>,
    root: NodeId,
    viewport: Viewport,
    listeners: ListenerTable,
}

/// Cloneable, single-threaded handle to the element tree.
///
/// All methods take `&self`; interior mutability follows the reactive-state
/// idiom used across the workspace. Methods on dead or out-of-range ids are
/// no-ops (reads return defaults) rather than panics.
#[derive(Clone)]
pub struct Document {
    inner: Rc<RefCell<DocInner>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document with a single `body` root.
    #[must_use]
    pub fn new() -> Self {
        let root = NodeId(0);
        Self {
            inner: Rc::new(RefCell::new(DocInner {
                nodes: vec![Node::new("body")],
                root,
                viewport: Viewport::default(),
                listeners: ListenerTable::default(),
            })),
        }
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.inner.borrow().root
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.inner.borrow().viewport
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        self.inner.borrow_mut().viewport = viewport;
    }

    /// Update only the scroll offset, keeping the window size.
    pub fn scroll_to(&self, scroll_y: f64) {
        self.inner.borrow_mut().viewport.scroll_y = scroll_y;
    }

    // -----------------------------------------------------------------------
    // Tree mutation
    // -----------------------------------------------------------------------

    pub fn create_element(&self, tag: &str) -> NodeId {
        let mut inner = self.inner.borrow_mut();
        let id = NodeId(inner.nodes.len() as u32);
        inner.nodes.push(Node::new(tag));
        id
    }

    /// Append `child` as the last child of `parent`. Detaches `child` from
    /// any previous parent first.
    pub fn append_child(&self, parent: NodeId, child: NodeId) {
        let mut inner = self.inner.borrow_mut();
        if !inner.is_alive(parent) || !inner.is_alive(child) || parent == child {
            return;
        }
        inner.detach(child);
        inner.node_mut(child).parent = Some(parent);
        inner.node_mut(parent).children.push(child);
    }

    /// Insert `node` as the next sibling of `reference`.
    pub fn insert_after(&self, reference: NodeId, node: NodeId) {
        let mut inner = self.inner.borrow_mut();
        if !inner.is_alive(reference) || !inner.is_alive(node) || reference == node {
            return;
        }
        let Some(parent) = inner.node(reference).parent else {
            return;
        };
        inner.detach(node);
        inner.node_mut(node).parent = Some(parent);
        let pos = inner
            .node(parent)
            .children
            .iter()
            .position(|c| *c == reference)
            .map_or(usize::MAX, |p| p + 1);
        let children = &mut inner.node_mut(parent).children;
        if pos >= children.len() {
            children.push(node);
        } else {
            children.insert(pos, node);
        }
    }

    /// Remove `node` and its whole subtree. Their listeners go with them.
    pub fn remove(&self, node: NodeId) {
        let mut inner = self.inner.borrow_mut();
        if !inner.is_alive(node) || node == inner.root {
            return;
        }
        inner.detach(node);
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            stack.extend(inner.node(id).children.iter().copied());
            let n = inner.node_mut(id);
            n.alive = false;
            n.children.clear();
            n.parent = None;
            inner.listeners.remove_node(id);
        }
    }

    #[must_use]
    pub fn is_alive(&self, node: NodeId) -> bool {
        self.inner.borrow().is_alive(node)
    }

    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        let inner = self.inner.borrow();
        if inner.is_alive(node) {
            inner.node(node).parent
        } else {
            None
        }
    }

    #[must_use]
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        let inner = self.inner.borrow();
        if inner.is_alive(node) {
            inner.node(node).children.clone()
        } else {
            Vec::new()
        }
    }

    /// Preorder traversal of the subtree below `node`, excluding `node`.
    #[must_use]
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let inner = self.inner.borrow();
        if !inner.is_alive(node) {
            return Vec::new();
        }
        inner.descendants(node)
    }

    #[must_use]
    pub fn tag(&self, node: NodeId) -> String {
        self.read(node, |n| n.tag.clone()).unwrap_or_default()
    }

    // -----------------------------------------------------------------------
    // Text, values, flags
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn text(&self, node: NodeId) -> String {
        self.read(node, |n| n.text.clone()).unwrap_or_default()
    }

    pub fn set_text(&self, node: NodeId, text: &str) {
        self.write(node, |n| n.text = text.to_owned());
    }

    /// Current control value (empty for non-controls).
    #[must_use]
    pub fn value(&self, node: NodeId) -> String {
        self.read(node, |n| n.value.clone()).unwrap_or_default()
    }

    pub fn set_value(&self, node: NodeId, value: &str) {
        self.write(node, |n| n.value = value.to_owned());
    }

    /// Clear the values of every control in the subtree (form reset).
    pub fn reset_controls(&self, form: NodeId) {
        for control in self.controls(form) {
            self.write(control, |n| n.value.clear());
        }
    }

    #[must_use]
    pub fn is_disabled(&self, node: NodeId) -> bool {
        self.read(node, |n| n.flags.contains(NodeFlags::DISABLED))
            .unwrap_or(false)
    }

    pub fn set_disabled(&self, node: NodeId, disabled: bool) {
        self.write(node, |n| n.flags.set(NodeFlags::DISABLED, disabled));
    }

    // -----------------------------------------------------------------------
    // Classes, attributes, styles, rects
    // -----------------------------------------------------------------------

    pub fn add_class(&self, node: NodeId, class: &str) {
        self.write(node, |n| {
            if !n.classes.iter().any(|c| c == class) {
                n.classes.push(class.to_owned());
            }
        });
    }

    pub fn remove_class(&self, node: NodeId, class: &str) {
        self.write(node, |n| n.classes.retain(|c| c != class));
    }

    #[must_use]
    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.read(node, |n| n.classes.iter().any(|c| c == class))
            .unwrap_or(false)
    }

    #[must_use]
    pub fn classes(&self, node: NodeId) -> Vec<String> {
        self.read(node, |n| n.classes.clone()).unwrap_or_default()
    }

    /// First class token starting with any of `prefixes`, scanning the class
    /// list in insertion order.
    #[must_use]
    pub fn class_with_prefix(&self, node: NodeId, prefixes: &[&str]) -> Option<String> {
        self.read(node, |n| {
            n.classes
                .iter()
                .find(|c| prefixes.iter().any(|p| c.starts_with(p)))
                .cloned()
        })
        .flatten()
    }

    #[must_use]
    pub fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.read(node, |n| n.attributes.get(name).cloned()).flatten()
    }

    pub fn set_attr(&self, node: NodeId, name: &str, value: &str) {
        self.write(node, |n| {
            n.attributes.insert(name.to_owned(), value.to_owned());
        });
    }

    #[must_use]
    pub fn style(&self, node: NodeId, property: &str) -> Option<String> {
        self.read(node, |n| n.styles.get(property).cloned()).flatten()
    }

    pub fn set_style(&self, node: NodeId, property: &str, value: &str) {
        self.write(node, |n| {
            n.styles.insert(property.to_owned(), value.to_owned());
        });
    }

    #[must_use]
    pub fn rect(&self, node: NodeId) -> Rect {
        self.read(node, |n| n.rect).unwrap_or_default()
    }

    pub fn set_rect(&self, node: NodeId, rect: Rect) {
        self.write(node, |n| n.rect = rect);
    }

    // -----------------------------------------------------------------------
    // Queries (document order = preorder from root)
    // -----------------------------------------------------------------------

    /// First node whose `id` attribute equals `id`.
    #[must_use]
    pub fn query_id(&self, id: &str) -> Option<NodeId> {
        let inner = self.inner.borrow();
        inner
            .preorder()
            .into_iter()
            .find(|n| inner.node(*n).attributes.get("id").map(String::as_str) == Some(id))
    }

    /// Every node carrying `class`.
    #[must_use]
    pub fn query_class(&self, class: &str) -> Vec<NodeId> {
        let inner = self.inner.borrow();
        inner
            .preorder()
            .into_iter()
            .filter(|n| inner.node(*n).classes.iter().any(|c| c == class))
            .collect()
    }

    /// Every node with at least one class starting with any of `prefixes`.
    #[must_use]
    pub fn query_class_prefix(&self, prefixes: &[&str]) -> Vec<NodeId> {
        let inner = self.inner.borrow();
        inner
            .preorder()
            .into_iter()
            .filter(|n| {
                inner
                    .node(*n)
                    .classes
                    .iter()
                    .any(|c| prefixes.iter().any(|p| c.starts_with(p)))
            })
            .collect()
    }

    /// Descendants of `scope` with the given tag.
    #[must_use]
    pub fn query_tag_within(&self, scope: NodeId, tag: &str) -> Vec<NodeId> {
        let inner = self.inner.borrow();
        if !inner.is_alive(scope) {
            return Vec::new();
        }
        inner
            .descendants(scope)
            .into_iter()
            .filter(|n| inner.node(*n).tag == tag)
            .collect()
    }

    /// Descendants of `scope` carrying `class`.
    #[must_use]
    pub fn query_class_within(&self, scope: NodeId, class: &str) -> Vec<NodeId> {
        let inner = self.inner.borrow();
        if !inner.is_alive(scope) {
            return Vec::new();
        }
        inner
            .descendants(scope)
            .into_iter()
            .filter(|n| inner.node(*n).classes.iter().any(|c| c == class))
            .collect()
    }

    /// First control under `scope` whose `name` attribute equals `name`.
    #[must_use]
    pub fn query_name_within(&self, scope: NodeId, name: &str) -> Option<NodeId> {
        let inner = self.inner.borrow();
        if !inner.is_alive(scope) {
            return None;
        }
        inner.descendants(scope).into_iter().find(|n| {
            inner.node(*n).attributes.get("name").map(String::as_str) == Some(name)
        })
    }

    /// Form controls (input/textarea/select) under `scope`.
    #[must_use]
    pub fn controls(&self, scope: NodeId) -> Vec<NodeId> {
        let inner = self.inner.borrow();
        if !inner.is_alive(scope) {
            return Vec::new();
        }
        inner
            .descendants(scope)
            .into_iter()
            .filter(|n| CONTROL_TAGS.contains(&inner.node(*n).tag.as_str()))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Canvas
    // -----------------------------------------------------------------------

    /// Give `node` a draw-list canvas surface of the given size.
    pub fn attach_canvas(&self, node: NodeId, width: f64, height: f64) {
        self.write(node, |n| n.canvas = Some(Canvas::new(width, height)));
    }

    #[must_use]
    pub fn canvas_size(&self, node: NodeId) -> Option<(f64, f64)> {
        self.read(node, |n| n.canvas.as_ref().map(|c| (c.width(), c.height())))
            .flatten()
    }

    pub fn resize_canvas(&self, node: NodeId, width: f64, height: f64) {
        self.write(node, |n| {
            if let Some(canvas) = n.canvas.as_mut() {
                canvas.resize(width, height);
            }
        });
    }

    pub fn canvas_clear(&self, node: NodeId) {
        self.write(node, |n| {
            if let Some(canvas) = n.canvas.as_mut() {
                canvas.clear();
            }
        });
    }

    pub fn canvas_fill_circle(&self, node: NodeId, x: f64, y: f64, radius: f64, color: Rgba) {
        self.write(node, |n| {
            if let Some(canvas) = n.canvas.as_mut() {
                canvas.fill_circle(x, y, radius, color);
            }
        });
    }

    /// Draw list recorded since the last clear, empty if `node` has no canvas.
    #[must_use]
    pub fn canvas_ops(&self, node: NodeId) -> Vec<DrawOp> {
        self.read(node, |n| {
            n.canvas.as_ref().map(|c| c.ops().to_vec()).unwrap_or_default()
        })
        .unwrap_or_default()
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    pub fn add_listener(
        &self,
        node: NodeId,
        kind: EventKind,
        f: impl Fn(&Event) + 'static,
    ) -> ListenerId {
        self.inner
            .borrow_mut()
            .listeners
            .add(node, kind, Rc::new(f))
    }

    pub fn remove_listener(&self, listener: ListenerId) -> bool {
        self.inner.borrow_mut().listeners.remove(listener)
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// Dispatch `kind` at `node`. Listeners run in registration order with
    /// no document borrow held, so they may mutate freely.
    pub fn dispatch(&self, node: NodeId, kind: EventKind) {
        let snapshot = {
            let inner = self.inner.borrow();
            if !inner.is_alive(node) {
                return;
            }
            inner.listeners.snapshot(node, kind)
        };
        let event = Event { kind, target: node };
        for listener in snapshot {
            listener(&event);
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn read<T>(&self, node: NodeId, f: impl FnOnce(&Node) -> T) -> Option<T> {
        let inner = self.inner.borrow();
        if inner.is_alive(node) {
            Some(f(inner.node(node)))
        } else {
            None
        }
    }

    fn write(&self, node: NodeId, f: impl FnOnce(&mut Node)) {
        let mut inner = self.inner.borrow_mut();
        if inner.is_alive(node) {
            f(inner.node_mut(node));
        }
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Document")
            .field("nodes", &inner.nodes.len())
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

impl DocInner {
    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    fn is_alive(&self, id: NodeId) -> bool {
        (id.0 as usize) < self.nodes.len() && self.node(id).alive
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.node(id).parent {
            self.node_mut(parent).children.retain(|c| *c != id);
            self.node_mut(id).parent = None;
        }
    }

    fn preorder(&self) -> Vec<NodeId> {
        let mut out = vec![self.root];
        out.extend(self.descendants(self.root));
        out
    }

    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.node(node).children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.node(id).children.iter().rev().copied());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn doc_with_child(class: &str) -> (Document, NodeId) {
        let doc = Document::new();
        let node = doc.create_element("div");
        doc.add_class(node, class);
        doc.append_child(doc.root(), node);
        (doc, node)
    }

    #[test]
    fn append_and_traverse() {
        let doc = Document::new();
        let a = doc.create_element("section");
        let b = doc.create_element("div");
        let c = doc.create_element("span");
        doc.append_child(doc.root(), a);
        doc.append_child(a, b);
        doc.append_child(b, c);

        assert_eq!(doc.descendants(doc.root()), vec![a, b, c]);
        assert_eq!(doc.parent(c), Some(b));
    }

    #[test]
    fn insert_after_places_next_sibling() {
        let doc = Document::new();
        let a = doc.create_element("input");
        let b = doc.create_element("input");
        doc.append_child(doc.root(), a);
        doc.append_child(doc.root(), b);

        let err = doc.create_element("div");
        doc.insert_after(a, err);
        assert_eq!(doc.children(doc.root()), vec![a, err, b]);
    }

    #[test]
    fn remove_kills_subtree_and_listeners() {
        let doc = Document::new();
        let a = doc.create_element("div");
        let b = doc.create_element("span");
        doc.append_child(doc.root(), a);
        doc.append_child(a, b);
        doc.add_listener(b, EventKind::Click, |_| {});
        assert_eq!(doc.listener_count(), 1);

        doc.remove(a);
        assert!(!doc.is_alive(a));
        assert!(!doc.is_alive(b));
        assert_eq!(doc.listener_count(), 0);
        assert!(doc.descendants(doc.root()).is_empty());
    }

    #[test]
    fn removed_node_ops_are_noops() {
        let (doc, node) = doc_with_child("x");
        doc.remove(node);
        doc.set_text(node, "ignored");
        doc.add_class(node, "y");
        assert_eq!(doc.text(node), "");
        assert!(!doc.has_class(node, "y"));
        assert_eq!(doc.query_class("y"), Vec::<NodeId>::new());
    }

    #[test]
    fn add_class_is_idempotent() {
        let (doc, node) = doc_with_child("fade-in");
        doc.add_class(node, "fade-in");
        assert_eq!(doc.classes(node), vec!["fade-in".to_owned()]);
    }

    #[test]
    fn class_with_prefix_first_token_wins() {
        let (doc, node) = doc_with_child("card");
        doc.add_class(node, "slide-left");
        doc.add_class(node, "fade-in");
        assert_eq!(
            doc.class_with_prefix(node, &["animate-", "fade-", "slide-"]),
            Some("slide-left".to_owned())
        );
    }

    #[test]
    fn class_prefix_query_matches_document_order() {
        let doc = Document::new();
        let a = doc.create_element("div");
        doc.add_class(a, "fade-in");
        let b = doc.create_element("div");
        doc.add_class(b, "plain");
        let c = doc.create_element("div");
        doc.add_class(c, "animate-pop");
        doc.append_child(doc.root(), a);
        doc.append_child(doc.root(), b);
        doc.append_child(doc.root(), c);

        assert_eq!(doc.query_class_prefix(&["animate-", "fade-", "slide-"]), vec![a, c]);
    }

    #[test]
    fn query_id_and_name() {
        let doc = Document::new();
        let form = doc.create_element("form");
        doc.set_attr(form, "id", "contact-form");
        let field = doc.create_element("input");
        doc.set_attr(field, "name", "email");
        doc.append_child(doc.root(), form);
        doc.append_child(form, field);

        assert_eq!(doc.query_id("contact-form"), Some(form));
        assert_eq!(doc.query_name_within(form, "email"), Some(field));
        assert_eq!(doc.query_name_within(form, "missing"), None);
    }

    #[test]
    fn controls_filters_by_tag() {
        let doc = Document::new();
        let form = doc.create_element("form");
        let input = doc.create_element("input");
        let area = doc.create_element("textarea");
        let div = doc.create_element("div");
        doc.append_child(doc.root(), form);
        doc.append_child(form, input);
        doc.append_child(form, div);
        doc.append_child(div, area);

        assert_eq!(doc.controls(form), vec![input, area]);
    }

    #[test]
    fn reset_controls_clears_values() {
        let doc = Document::new();
        let form = doc.create_element("form");
        let input = doc.create_element("input");
        doc.append_child(doc.root(), form);
        doc.append_child(form, input);
        doc.set_value(input, "hello");

        doc.reset_controls(form);
        assert_eq!(doc.value(input), "");
    }

    #[test]
    fn dispatch_in_registration_order() {
        let (doc, node) = doc_with_child("x");
        let order = Rc::new(RefCell::new(Vec::new()));
        let o1 = Rc::clone(&order);
        doc.add_listener(node, EventKind::Click, move |_| o1.borrow_mut().push(1));
        let o2 = Rc::clone(&order);
        doc.add_listener(node, EventKind::Click, move |_| o2.borrow_mut().push(2));

        doc.dispatch(node, EventKind::Click);
        assert_eq!(*order.borrow(), vec![1, 2]);
    }

    #[test]
    fn listener_may_mutate_document_during_dispatch() {
        let (doc, node) = doc_with_child("x");
        let doc2 = doc.clone();
        doc.add_listener(node, EventKind::Click, move |e| {
            doc2.add_class(e.target, "clicked");
            let extra = doc2.create_element("div");
            doc2.append_child(doc2.root(), extra);
        });

        doc.dispatch(node, EventKind::Click);
        assert!(doc.has_class(node, "clicked"));
    }

    #[test]
    fn removed_listener_does_not_fire() {
        let (doc, node) = doc_with_child("x");
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let id = doc.add_listener(node, EventKind::Blur, move |_| h.set(h.get() + 1));

        doc.dispatch(node, EventKind::Blur);
        assert!(doc.remove_listener(id));
        doc.dispatch(node, EventKind::Blur);
        assert_eq!(hits.get(), 1);
        assert!(!doc.remove_listener(id), "second removal reports false");
    }

    #[test]
    fn disabled_flag_round_trip() {
        let (doc, node) = doc_with_child("x");
        assert!(!doc.is_disabled(node));
        doc.set_disabled(node, true);
        assert!(doc.is_disabled(node));
        doc.set_disabled(node, false);
        assert!(!doc.is_disabled(node));
    }

    #[test]
    fn canvas_round_trip() {
        let (doc, node) = doc_with_child("hero");
        doc.attach_canvas(node, 300.0, 150.0);
        assert_eq!(doc.canvas_size(node), Some((300.0, 150.0)));

        doc.canvas_fill_circle(node, 10.0, 20.0, 2.0, Rgba::rgb(37, 99, 235));
        assert_eq!(doc.canvas_ops(node).len(), 1);

        doc.canvas_clear(node);
        assert!(doc.canvas_ops(node).is_empty());

        doc.resize_canvas(node, 400.0, 200.0);
        assert_eq!(doc.canvas_size(node), Some((400.0, 200.0)));
    }
}
