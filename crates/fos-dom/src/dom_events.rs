//! DOM Events
//!
//! Listener storage and the event object handed to listeners. Dispatch
//! itself lives on [`Document`](crate::Document) since it must release the
//! tree borrow before running listeners.

use std::cell::Cell;
use std::rc::Rc;

use crate::NodeId;

/// Global listener targets outside the node tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalTarget {
    Window,
    Document,
}

/// Listener registration handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u32);

/// Event listener callback
pub type EventListener = Rc<dyn Fn(&DomEvent)>;

/// DOM event
#[derive(Debug, Clone)]
pub struct DomEvent {
    pub event_type: String,
    /// Node the event was dispatched at (`NONE` for global dispatch)
    pub target: NodeId,
    /// Node whose listener is running (`None` at global targets)
    pub current_target: Option<NodeId>,
    pub bubbles: bool,
    propagation_stopped: Cell<bool>,
}

impl DomEvent {
    pub fn new(event_type: &str, target: NodeId) -> Self {
        Self {
            event_type: event_type.to_string(),
            target,
            current_target: None,
            bubbles: true,
            propagation_stopped: Cell::new(false),
        }
    }

    /// Stop propagation after the current target's listeners
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListenerTarget {
    Node(NodeId),
    Global(GlobalTarget),
}

struct ListenerEntry {
    id: ListenerId,
    target: ListenerTarget,
    event_type: String,
    listener: EventListener,
}

/// Listener table for one document
#[derive(Default)]
pub(crate) struct ListenerTable {
    next_id: u32,
    entries: Vec<ListenerEntry>,
}

impl ListenerTable {
    pub fn add(&mut self, target: ListenerTarget, event_type: &str, listener: EventListener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push(ListenerEntry {
            id,
            target,
            event_type: event_type.to_string(),
            listener,
        });
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Listeners for a target in registration order
    pub fn collect(&self, target: ListenerTarget, event_type: &str) -> Vec<EventListener> {
        self.entries
            .iter()
            .filter(|e| e.target == target && e.event_type == event_type)
            .map(|e| e.listener.clone())
            .collect()
    }

    pub fn count(&self, target: ListenerTarget, event_type: &str) -> usize {
        self.entries
            .iter()
            .filter(|e| e.target == target && e.event_type == event_type)
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
