#![forbid(unsafe_code)]

//! Typing effect: reveal the target's text one grapheme cluster per tick,
//! then blink a border "cursor" forever. Single-shot per controller; a
//! missing target skips the subsystem.

use std::cell::RefCell;
use std::rc::Rc;

use unicode_segmentation::UnicodeSegmentation;

use nacre_dom::{Document, NodeId};
use nacre_runtime::{TimerId, TimerQueue};

/// Border style used as the typing cursor.
pub const CURSOR_STYLE: &str = "2px solid var(--primary-color)";

struct TypingState {
    graphemes: Vec<String>,
    next: usize,
}

/// Find the first `.typing` element, capture and clear its text, and arm the
/// reveal sequence. Returns the target node, if any.
pub(crate) fn start_typing(
    doc: &Document,
    timers: &TimerQueue,
    start_delay_ms: u64,
    tick_ms: u64,
    blink_ms: u64,
    armed: &Rc<RefCell<Vec<TimerId>>>,
) -> Option<NodeId> {
    let node = doc.query_class("typing").into_iter().next()?;

    let graphemes: Vec<String> = doc
        .text(node)
        .graphemes(true)
        .map(str::to_owned)
        .collect();
    doc.set_text(node, "");
    doc.set_style(node, "border-right", CURSOR_STYLE);

    let state = Rc::new(RefCell::new(TypingState { graphemes, next: 0 }));
    arm_tick(doc, timers, node, &state, armed, start_delay_ms, tick_ms, blink_ms);
    tracing::debug!(graphemes = state.borrow().graphemes.len(), "typing effect armed");
    Some(node)
}

#[allow(clippy::too_many_arguments)]
fn arm_tick(
    doc: &Document,
    timers: &TimerQueue,
    node: NodeId,
    state: &Rc<RefCell<TypingState>>,
    armed: &Rc<RefCell<Vec<TimerId>>>,
    delay_ms: u64,
    tick_ms: u64,
    blink_ms: u64,
) {
    let doc = doc.clone();
    let timers_again = timers.clone();
    let state = Rc::clone(state);
    let armed_again = Rc::clone(armed);
    let id = timers.set_timeout(delay_ms, move || {
        let done = {
            let mut st = state.borrow_mut();
            if st.next < st.graphemes.len() {
                let mut text = doc.text(node);
                text.push_str(&st.graphemes[st.next]);
                doc.set_text(node, &text);
                st.next += 1;
                false
            } else {
                true
            }
        };
        if done {
            arm_blink(&doc, &timers_again, node, &armed_again, blink_ms);
        } else {
            arm_tick(
                &doc,
                &timers_again,
                node,
                &state,
                &armed_again,
                tick_ms,
                tick_ms,
                blink_ms,
            );
        }
    });
    armed.borrow_mut().push(id);
}

fn arm_blink(
    doc: &Document,
    timers: &TimerQueue,
    node: NodeId,
    armed: &Rc<RefCell<Vec<TimerId>>>,
    blink_ms: u64,
) {
    let doc = doc.clone();
    let id = timers.set_interval(blink_ms, move || {
        if doc.style(node, "border-right").as_deref() == Some("none") {
            doc.set_style(node, "border-right", CURSOR_STYLE);
        } else {
            doc.set_style(node, "border-right", "none");
        }
    });
    armed.borrow_mut().push(id);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(text: &str) -> (Document, TimerQueue, NodeId, Rc<RefCell<Vec<TimerId>>>) {
        let doc = Document::new();
        let node = doc.create_element("h1");
        doc.add_class(node, "typing");
        doc.set_text(node, text);
        doc.append_child(doc.root(), node);
        (doc, TimerQueue::new(), node, Rc::new(RefCell::new(Vec::new())))
    }

    #[test]
    fn reveals_one_grapheme_per_tick() {
        let (doc, timers, node, armed) = fixture("Hi!");
        start_typing(&doc, &timers, 1000, 100, 500, &armed);
        assert_eq!(doc.text(node), "", "text cleared before the start delay");

        timers.advance(999);
        assert_eq!(doc.text(node), "");
        timers.advance(1);
        assert_eq!(doc.text(node), "H");
        timers.advance(100);
        assert_eq!(doc.text(node), "Hi");
        timers.advance(100);
        assert_eq!(doc.text(node), "Hi!");
    }

    #[test]
    fn multibyte_text_stays_intact() {
        let (doc, timers, node, armed) = fixture("héllo");
        start_typing(&doc, &timers, 0, 100, 500, &armed);

        timers.advance(0);
        assert_eq!(doc.text(node), "h");
        timers.advance(100);
        assert_eq!(doc.text(node), "hé");
        timers.advance(300);
        assert_eq!(doc.text(node), "héllo");
    }

    #[test]
    fn cursor_blinks_after_exhaustion() {
        let (doc, timers, node, armed) = fixture("A");
        start_typing(&doc, &timers, 0, 100, 500, &armed);

        timers.advance(0); // types "A"
        timers.advance(100); // exhausted; blink armed
        assert_eq!(doc.style(node, "border-right").as_deref(), Some(CURSOR_STYLE));

        timers.advance(500);
        assert_eq!(doc.style(node, "border-right").as_deref(), Some("none"));
        timers.advance(500);
        assert_eq!(doc.style(node, "border-right").as_deref(), Some(CURSOR_STYLE));
        timers.advance(500);
        assert_eq!(doc.style(node, "border-right").as_deref(), Some("none"));
    }

    #[test]
    fn absent_target_skips_subsystem() {
        let doc = Document::new();
        let timers = TimerQueue::new();
        let armed = Rc::new(RefCell::new(Vec::new()));
        assert!(start_typing(&doc, &timers, 1000, 100, 500, &armed).is_none());
        assert_eq!(timers.pending(), 0);
    }

    #[test]
    fn empty_text_goes_straight_to_blink() {
        let (doc, timers, node, armed) = fixture("");
        start_typing(&doc, &timers, 0, 100, 500, &armed);
        timers.advance(0);
        timers.advance(500);
        assert_eq!(doc.style(node, "border-right").as_deref(), Some("none"));
    }
}
