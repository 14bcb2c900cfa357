#![forbid(unsafe_code)]

//! Transient notifications. At most one is live: showing a new one evicts
//! the previous immediately. Dismissal (auto or via the close button) plays
//! the slide-out style and removes the node shortly after.

use std::cell::RefCell;
use std::rc::Rc;

use nacre_dom::{Document, EventKind, NodeId, Rgba};
use nacre_runtime::{TimerId, TimerQueue};

/// Auto-dismiss delay.
pub const AUTO_DISMISS_MS: u64 = 5000;
/// How long the exit animation gets before the node is removed.
pub const EXIT_ANIMATION_MS: u64 = 300;

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

impl NotificationKind {
    /// Class-name suffix (`notification-<suffix>`).
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }

    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Success => "✓",
            Self::Error => "✕",
            Self::Warning => "⚠",
            Self::Info => "ℹ",
        }
    }

    #[must_use]
    pub const fn color(self) -> Rgba {
        match self {
            Self::Success => Rgba::rgb(16, 185, 129),
            Self::Error => Rgba::rgb(239, 68, 68),
            Self::Warning => Rgba::rgb(245, 158, 11),
            Self::Info => Rgba::rgb(59, 130, 246),
        }
    }
}

struct Live {
    node: NodeId,
    auto_timer: TimerId,
    removal_timer: Option<TimerId>,
    fading: bool,
}

struct Inner {
    doc: Document,
    timers: TimerQueue,
    current: Option<Live>,
}

/// Owns the single live notification slot.
#[derive(Clone)]
pub struct NotificationCenter {
    inner: Rc<RefCell<Inner>>,
}

impl NotificationCenter {
    #[must_use]
    pub fn new(doc: &Document, timers: &TimerQueue) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                doc: doc.clone(),
                timers: timers.clone(),
                current: None,
            })),
        }
    }

    /// Show a notification, evicting any previous one. Returns its node.
    pub fn show(&self, kind: NotificationKind, message: &str) -> NodeId {
        self.evict();

        let (doc, timers) = {
            let inner = self.inner.borrow();
            (inner.doc.clone(), inner.timers.clone())
        };

        let node = doc.create_element("div");
        doc.add_class(node, "notification");
        doc.add_class(node, &format!("notification-{}", kind.suffix()));
        for (prop, value) in [
            ("position", "fixed"),
            ("top", "20px"),
            ("right", "20px"),
            ("color", "white"),
            ("z-index", "10000"),
            ("max-width", "400px"),
            ("animation", "slideInRight 0.3s ease-out"),
        ] {
            doc.set_style(node, prop, value);
        }
        doc.set_style(node, "background", &kind.color().css());

        let icon = doc.create_element("div");
        doc.add_class(icon, "notification-icon");
        doc.set_text(icon, kind.icon());
        doc.append_child(node, icon);

        let text = doc.create_element("span");
        doc.add_class(text, "notification-message");
        doc.set_text(text, message);
        doc.append_child(node, text);

        let close = doc.create_element("button");
        doc.add_class(close, "notification-close");
        doc.set_attr(close, "aria-label", "Close notification");
        doc.set_text(close, "×");
        doc.append_child(node, close);

        doc.append_child(doc.root(), node);

        let center = self.clone();
        doc.add_listener(close, EventKind::Click, move |_| center.dismiss());

        let center = self.clone();
        let auto_timer = timers.set_timeout(AUTO_DISMISS_MS, move || center.dismiss());

        self.inner.borrow_mut().current = Some(Live {
            node,
            auto_timer,
            removal_timer: None,
            fading: false,
        });
        tracing::debug!(kind = kind.suffix(), "notification shown");
        node
    }

    /// Start the exit animation and schedule removal. No-op when nothing is
    /// live or the exit is already underway.
    pub fn dismiss(&self) {
        let (doc, timers, node, auto_timer) = {
            let mut inner = self.inner.borrow_mut();
            let Some(live) = inner.current.as_mut() else {
                return;
            };
            if live.fading {
                return;
            }
            live.fading = true;
            (
                inner.doc.clone(),
                inner.timers.clone(),
                inner.current.as_ref().map(|l| l.node),
                inner.current.as_ref().map(|l| l.auto_timer),
            )
        };
        let Some(node) = node else { return };
        if let Some(timer) = auto_timer {
            timers.cancel(timer);
        }
        doc.set_style(node, "animation", "slideOutRight 0.3s ease-in");

        let center = self.clone();
        let removal = timers.set_timeout(EXIT_ANIMATION_MS, move || {
            let mut inner = center.inner.borrow_mut();
            if inner.current.as_ref().is_some_and(|l| l.node == node) {
                inner.current = None;
            }
            inner.doc.clone().remove(node);
        });
        if let Some(live) = self.inner.borrow_mut().current.as_mut() {
            live.removal_timer = Some(removal);
        }
    }

    /// Remove the live notification immediately, cancelling its timers.
    pub fn evict(&self) {
        let mut inner = self.inner.borrow_mut();
        if let Some(live) = inner.current.take() {
            inner.timers.cancel(live.auto_timer);
            if let Some(removal) = live.removal_timer {
                inner.timers.cancel(removal);
            }
            inner.doc.clone().remove(live.node);
        }
    }

    /// Node of the live notification, if one is showing.
    #[must_use]
    pub fn current(&self) -> Option<NodeId> {
        self.inner.borrow().current.as_ref().map(|l| l.node)
    }
}

impl std::fmt::Debug for NotificationCenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationCenter")
            .field("live", &self.current().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (Document, TimerQueue, NotificationCenter) {
        let doc = Document::new();
        let timers = TimerQueue::new();
        let center = NotificationCenter::new(&doc, &timers);
        (doc, timers, center)
    }

    #[test]
    fn show_builds_decorated_node() {
        let (doc, _timers, center) = fixture();
        let node = center.show(NotificationKind::Success, "Saved.");

        assert!(doc.has_class(node, "notification"));
        assert!(doc.has_class(node, "notification-success"));
        assert_eq!(
            doc.style(node, "background").as_deref(),
            Some("rgba(16, 185, 129, 1)")
        );

        let children = doc.children(node);
        assert_eq!(children.len(), 3);
        assert_eq!(doc.text(children[0]), "✓");
        assert_eq!(doc.text(children[1]), "Saved.");
        assert_eq!(doc.attr(children[2], "aria-label").as_deref(), Some("Close notification"));
    }

    #[test]
    fn second_show_evicts_first() {
        let (doc, _timers, center) = fixture();
        let first = center.show(NotificationKind::Info, "one");
        let second = center.show(NotificationKind::Error, "two");

        assert!(!doc.is_alive(first));
        assert!(doc.is_alive(second));
        assert_eq!(center.current(), Some(second));
    }

    #[test]
    fn auto_dismiss_removes_after_exit_animation() {
        let (doc, timers, center) = fixture();
        let node = center.show(NotificationKind::Warning, "careful");

        timers.advance(AUTO_DISMISS_MS);
        assert!(doc.is_alive(node), "exit animation still playing");
        assert_eq!(
            doc.style(node, "animation").as_deref(),
            Some("slideOutRight 0.3s ease-in")
        );

        timers.advance(EXIT_ANIMATION_MS);
        assert!(!doc.is_alive(node));
        assert_eq!(center.current(), None);
    }

    #[test]
    fn close_button_dismisses() {
        let (doc, timers, center) = fixture();
        let node = center.show(NotificationKind::Info, "hello");
        let close = doc.children(node)[2];

        doc.dispatch(close, EventKind::Click);
        timers.advance(EXIT_ANIMATION_MS);
        assert!(!doc.is_alive(node));
    }

    #[test]
    fn dismiss_is_idempotent_during_fade() {
        let (doc, timers, center) = fixture();
        let node = center.show(NotificationKind::Info, "hello");

        center.dismiss();
        center.dismiss();
        timers.advance(EXIT_ANIMATION_MS);
        assert!(!doc.is_alive(node));
        assert_eq!(timers.pending(), 0);
    }

    #[test]
    fn dismiss_without_live_notification_is_noop() {
        let (_doc, _timers, center) = fixture();
        center.dismiss();
        assert_eq!(center.current(), None);
    }

    #[test]
    fn kind_palette() {
        assert_eq!(NotificationKind::Error.color(), Rgba::rgb(239, 68, 68));
        assert_eq!(NotificationKind::Warning.icon(), "⚠");
        assert_eq!(NotificationKind::Info.suffix(), "info");
    }
}
