#![forbid(unsafe_code)]

//! Hover micro-interactions: stateless, symmetric enter/leave style pairs on
//! fixed element classes. Transitions themselves live in CSS; only the
//! target values are written here.

use nacre_dom::{Document, EventKind, ListenerId, NodeId};

/// Wire every hover pair and return the listener handles for teardown.
pub(crate) fn wire_hover(doc: &Document) -> Vec<ListenerId> {
    let mut listeners = Vec::new();

    for item in doc.query_class("skill-item") {
        listeners.push(on_hover(doc, item, |doc, node| {
            doc.set_style(node, "transform", "translateY(-10px) scale(1.05)");
            doc.set_style(node, "box-shadow", "0 20px 40px rgba(0, 0, 0, 0.1)");
        }));
        listeners.push(on_leave(doc, item, |doc, node| {
            doc.set_style(node, "transform", "translateY(0) scale(1)");
            doc.set_style(node, "box-shadow", "0 4px 6px rgba(0, 0, 0, 0.1)");
        }));
    }

    for card in doc.query_class("project-card") {
        // Either child may be missing; the handlers tolerate absence.
        let image = doc
            .query_class_within(card, "project-image")
            .into_iter()
            .find_map(|wrap| doc.query_tag_within(wrap, "img").into_iter().next());
        let overlay = doc.query_class_within(card, "project-overlay").into_iter().next();

        listeners.push(on_hover(doc, card, move |doc, _| {
            if let Some(image) = image {
                doc.set_style(image, "transform", "scale(1.1)");
            }
            if let Some(overlay) = overlay {
                doc.set_style(overlay, "opacity", "1");
            }
        }));
        listeners.push(on_leave(doc, card, move |doc, _| {
            if let Some(image) = image {
                doc.set_style(image, "transform", "scale(1)");
            }
            if let Some(overlay) = overlay {
                doc.set_style(overlay, "opacity", "0");
            }
        }));
    }

    for link in doc.query_class("social-link") {
        listeners.push(on_hover(doc, link, |doc, node| {
            doc.set_style(node, "transform", "translateY(-3px) rotate(5deg)");
        }));
        listeners.push(on_leave(doc, link, |doc, node| {
            doc.set_style(node, "transform", "translateY(0) rotate(0deg)");
        }));
    }

    listeners
}

fn on_hover(
    doc: &Document,
    node: NodeId,
    apply: impl Fn(&Document, NodeId) + 'static,
) -> ListenerId {
    let doc_handle = doc.clone();
    doc.add_listener(node, EventKind::MouseEnter, move |event| {
        apply(&doc_handle, event.target);
    })
}

fn on_leave(
    doc: &Document,
    node: NodeId,
    apply: impl Fn(&Document, NodeId) + 'static,
) -> ListenerId {
    let doc_handle = doc.clone();
    doc.add_listener(node, EventKind::MouseLeave, move |event| {
        apply(&doc_handle, event.target);
    })
}
