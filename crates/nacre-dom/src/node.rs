#![forbid(unsafe_code)]

//! Node storage: element data plus tree links.

use ahash::AHashMap;
use bitflags::bitflags;

use crate::NodeId;
use crate::canvas::Canvas;
use crate::geometry::Rect;

bitflags! {
    /// Boolean node state that is not expressed as a class or attribute.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NodeFlags: u8 {
        /// Control refuses interaction (submit button while in flight).
        const DISABLED = 1 << 0;
    }
}

/// One arena slot. A removed node keeps its slot but `alive` goes false and
/// the slot is never handed out again.
#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) alive: bool,
    pub(crate) tag: String,
    pub(crate) classes: Vec<String>,
    pub(crate) attributes: AHashMap<String, String>,
    pub(crate) styles: AHashMap<String, String>,
    pub(crate) text: String,
    pub(crate) value: String,
    pub(crate) flags: NodeFlags,
    pub(crate) rect: Rect,
    pub(crate) canvas: Option<Canvas>,
}

impl Node {
    pub(crate) fn new(tag: &str) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            alive: true,
            tag: tag.to_owned(),
            classes: Vec::new(),
            attributes: AHashMap::new(),
            styles: AHashMap::new(),
            text: String::new(),
            value: String::new(),
            flags: NodeFlags::empty(),
            rect: Rect::default(),
            canvas: None,
        }
    }
}
