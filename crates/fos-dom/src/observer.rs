//! DOM Observers
//!
//! Mutation observers. Records are queued by the tree while at least one
//! observer is attached and delivered in batches by
//! [`Document::flush_mutations`](crate::Document::flush_mutations).

use std::rc::Rc;

use crate::NodeId;

/// Mutation record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub mutation_type: MutationType,
    pub target: NodeId,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
    pub attribute_name: Option<String>,
    pub old_value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationType {
    Attributes,
    CharacterData,
    ChildList,
}

impl MutationRecord {
    pub fn child_list(target: NodeId, added_nodes: Vec<NodeId>, removed_nodes: Vec<NodeId>) -> Self {
        Self {
            mutation_type: MutationType::ChildList,
            target,
            added_nodes,
            removed_nodes,
            attribute_name: None,
            old_value: None,
        }
    }

    pub fn attribute(target: NodeId, name: &str) -> Self {
        Self {
            mutation_type: MutationType::Attributes,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            attribute_name: Some(name.to_string()),
            old_value: None,
        }
    }

    pub fn character_data(target: NodeId, old_value: String) -> Self {
        Self {
            mutation_type: MutationType::CharacterData,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            attribute_name: None,
            old_value: Some(old_value),
        }
    }
}

/// Mutation observer identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) u32);

/// Callback receiving one batch of records
pub type MutationCallback = Rc<dyn Fn(&[MutationRecord])>;

/// Observer attached to a subtree root
pub(crate) struct MutationObserver {
    pub id: ObserverId,
    pub root: NodeId,
    pub callback: MutationCallback,
}

/// All observers attached to one document
#[derive(Default)]
pub(crate) struct ObserverSet {
    next_id: u32,
    observers: Vec<MutationObserver>,
}

impl ObserverSet {
    pub fn observe(&mut self, root: NodeId, callback: MutationCallback) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push(MutationObserver { id, root, callback });
        id
    }

    pub fn disconnect(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|o| o.id != id);
        self.observers.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Snapshot of (root, callback) pairs for delivery outside the borrow
    pub fn snapshot(&self) -> Vec<(NodeId, MutationCallback)> {
        self.observers.iter().map(|o| (o.root, o.callback.clone())).collect()
    }
}
