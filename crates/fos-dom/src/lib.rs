//! fOS DOM - Document Object Model
//!
//! Arena-backed native tree: elements, text, selector queries, bubbling
//! event listeners and batched mutation observers. This is the host tree the
//! fOS virtual DOM reconciles against.

mod attributes;
mod document;
mod dom_events;
mod node;
mod observer;
mod operations;
mod selector;
mod tree;

pub use attributes::{Attr, NamedNodeMap};
pub use document::{Document, ReadyCallback};
pub use dom_events::{DomEvent, EventListener, GlobalTarget, ListenerId};
pub use node::{ElementData, Node, NodeData, PropValue, TextData};
pub use observer::{MutationCallback, MutationRecord, MutationType, ObserverId};
pub use operations::{DomError, DomResult};
pub use selector::{AttributeMatcher, AttributeSelector, Combinator, SelectorList, SimpleSelector};
pub use tree::{DomTree, MutationStats};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root node ID
    pub const ROOT: NodeId = NodeId(0);
    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check that this is not the `NONE` sentinel
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Raw arena index
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) fn slot(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            write!(f, "#{}", self.0)
        } else {
            f.write_str("#none")
        }
    }
}
