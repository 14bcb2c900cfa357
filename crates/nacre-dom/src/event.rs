#![forbid(unsafe_code)]

//! Event kinds and the listener registry.
//!
//! Listeners attach directly to their target node; dispatch is target-only
//! (no capture or bubble phases — the interaction layer registers on the
//! exact elements it cares about).

use std::rc::Rc;

use ahash::AHashMap;

use crate::NodeId;

/// The event vocabulary the interaction layer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Scroll,
    Resize,
    MouseEnter,
    MouseLeave,
    Focus,
    Blur,
    Input,
    Change,
    Submit,
    Click,
}

/// A dispatched event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub target: NodeId,
}

/// Handle for removing a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

pub(crate) type ListenerFn = Rc<dyn Fn(&Event)>;

/// Per-(node, kind) listener lists plus a reverse index for O(1) removal.
#[derive(Default)]
pub(crate) struct ListenerTable {
    next_id: u64,
    by_target: AHashMap<(NodeId, EventKind), Vec<(u64, ListenerFn)>>,
    index: AHashMap<u64, (NodeId, EventKind)>,
}

impl ListenerTable {
    pub(crate) fn add(&mut self, node: NodeId, kind: EventKind, f: ListenerFn) -> ListenerId {
        let id = self.next_id;
        self.next_id += 1;
        self.by_target.entry((node, kind)).or_default().push((id, f));
        self.index.insert(id, (node, kind));
        ListenerId(id)
    }

    pub(crate) fn remove(&mut self, listener: ListenerId) -> bool {
        let Some(key) = self.index.remove(&listener.0) else {
            return false;
        };
        if let Some(list) = self.by_target.get_mut(&key) {
            list.retain(|(id, _)| *id != listener.0);
            if list.is_empty() {
                self.by_target.remove(&key);
            }
        }
        true
    }

    /// Drop every listener attached to `node`.
    pub(crate) fn remove_node(&mut self, node: NodeId) {
        self.by_target.retain(|(target, _), list| {
            if *target == node {
                for (id, _) in list.iter() {
                    self.index.remove(id);
                }
                false
            } else {
                true
            }
        });
    }

    /// Snapshot of the listeners for `(node, kind)`, in registration order.
    /// Cloned out so the caller can release its borrow before invoking.
    pub(crate) fn snapshot(&self, node: NodeId, kind: EventKind) -> Vec<ListenerFn> {
        self.by_target
            .get(&(node, kind))
            .map(|list| list.iter().map(|(_, f)| Rc::clone(f)).collect())
            .unwrap_or_default()
    }

    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }
}
