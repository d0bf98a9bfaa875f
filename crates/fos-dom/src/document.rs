//! Document - High-level document API
//!
//! `Document` is a cheap, clonable handle over one tree plus its listeners
//! and observers. All callbacks run with no internal borrow held, so a
//! listener may freely mutate the document it was fired from.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::Rc;

use crate::dom_events::{ListenerTable, ListenerTarget};
use crate::observer::ObserverSet;
use crate::{
    DomEvent, DomResult, DomTree, EventListener, GlobalTarget, ListenerId, MutationCallback, MutationRecord,
    MutationStats, NodeId, ObserverId, SelectorList,
};

/// Upper bound on observer delivery rounds in one flush
const MAX_FLUSH_ROUNDS: usize = 32;

/// Hook run once the body element exists
pub type ReadyCallback = Box<dyn FnOnce(NodeId)>;

struct DocumentInner {
    url: String,
    tree: RefCell<DomTree>,
    html_element: Cell<NodeId>,
    body_element: Cell<NodeId>,
    listeners: RefCell<ListenerTable>,
    observers: RefCell<ObserverSet>,
    ready: RefCell<Vec<ReadyCallback>>,
}

/// HTML Document
#[derive(Clone)]
pub struct Document {
    inner: Rc<DocumentInner>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("url", &self.inner.url)
            .field("nodes", &self.inner.tree.borrow().len())
            .field("body", &self.inner.body_element.get())
            .finish()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Document {}

impl Document {
    /// Create a document with `<html><head></head><body></body></html>`
    pub fn new(url: &str) -> Self {
        let doc = Self::empty(url);
        doc.attach_body();
        doc
    }

    /// Create an empty document (no structure, no body yet)
    pub fn empty(url: &str) -> Self {
        Self {
            inner: Rc::new(DocumentInner {
                url: url.to_string(),
                tree: RefCell::new(DomTree::new()),
                html_element: Cell::new(NodeId::NONE),
                body_element: Cell::new(NodeId::NONE),
                listeners: RefCell::new(ListenerTable::default()),
                observers: RefCell::new(ObserverSet::default()),
                ready: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Get document URL
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Borrow the tree
    pub fn tree(&self) -> Ref<'_, DomTree> {
        self.inner.tree.borrow()
    }

    /// Borrow the tree mutably
    pub fn tree_mut(&self) -> RefMut<'_, DomTree> {
        self.inner.tree.borrow_mut()
    }

    /// Get `<html>` element
    pub fn document_element(&self) -> Option<NodeId> {
        Some(self.inner.html_element.get()).filter(|id| id.is_valid())
    }

    /// Get `<body>` element, if the document has one yet
    pub fn body(&self) -> Option<NodeId> {
        Some(self.inner.body_element.get()).filter(|id| id.is_valid())
    }

    /// Build `<html><head/><body/></html>` if missing and run ready hooks
    pub fn attach_body(&self) -> NodeId {
        if let Some(body) = self.body() {
            return body;
        }
        let body = {
            let mut tree = self.tree_mut();
            let root = tree.root();
            let build = |tree: &mut DomTree| -> DomResult<(NodeId, NodeId)> {
                let html = tree.create_element("html")?;
                let head = tree.create_element("head")?;
                let body = tree.create_element("body")?;
                tree.append_child(root, html)?;
                tree.append_child(html, head)?;
                tree.append_child(html, body)?;
                Ok((html, body))
            };
            match build(&mut tree) {
                Ok((html, body)) => {
                    self.inner.html_element.set(html);
                    body
                }
                Err(err) => {
                    tracing::warn!("failed to build document skeleton: {}", err);
                    return NodeId::NONE;
                }
            }
        };
        self.inner.body_element.set(body);
        tracing::debug!("Body attached for {}", self.inner.url);

        let hooks = std::mem::take(&mut *self.inner.ready.borrow_mut());
        for hook in hooks {
            hook(body);
        }
        body
    }

    /// Run `callback` once a body exists (immediately if it already does)
    pub fn on_body_ready(&self, callback: ReadyCallback) {
        match self.body() {
            Some(body) => callback(body),
            None => self.inner.ready.borrow_mut().push(callback),
        }
    }

    /// Get element by ID
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        let tree = self.tree();
        tree.descendants(tree.root())
            .into_iter()
            .find(|&node| tree.get_attribute(node, "id").as_deref() == Some(id))
    }

    /// All descendants of `root` matching `selector`
    pub fn query_selector_all(&self, root: NodeId, selector: &str) -> DomResult<Vec<NodeId>> {
        let list = SelectorList::parse(selector)?;
        Ok(list.query_all(&self.tree(), root))
    }

    /// Whether `node` matches `selector`
    pub fn matches(&self, node: NodeId, selector: &str) -> DomResult<bool> {
        let list = SelectorList::parse(selector)?;
        Ok(list.matches(&self.tree(), node))
    }

    /// Write counters
    pub fn stats(&self) -> MutationStats {
        self.tree().stats()
    }

    pub fn reset_stats(&self) {
        self.tree_mut().reset_stats();
    }

    /// Markup for a node and its subtree
    pub fn outer_html(&self, node: NodeId) -> String {
        self.tree().outer_html(node)
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn add_event_listener(&self, node: NodeId, event_type: &str, listener: EventListener) -> ListenerId {
        self.inner
            .listeners
            .borrow_mut()
            .add(ListenerTarget::Node(node), event_type, listener)
    }

    pub fn add_global_listener(&self, target: GlobalTarget, event_type: &str, listener: EventListener) -> ListenerId {
        self.inner
            .listeners
            .borrow_mut()
            .add(ListenerTarget::Global(target), event_type, listener)
    }

    /// Remove a node or global listener
    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        self.inner.listeners.borrow_mut().remove(id)
    }

    /// Listeners attached to `node` for `event_type`
    pub fn listener_count(&self, node: NodeId, event_type: &str) -> usize {
        self.inner.listeners.borrow().count(ListenerTarget::Node(node), event_type)
    }

    /// Listeners attached at a global target for `event_type`
    pub fn global_listener_count(&self, target: GlobalTarget, event_type: &str) -> usize {
        self.inner.listeners.borrow().count(ListenerTarget::Global(target), event_type)
    }

    /// Total listeners of every kind
    pub fn total_listeners(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Dispatch an event at `target`, bubbling to the document then window.
    ///
    /// Pending mutation records are delivered first. Returns the number of
    /// listeners invoked.
    pub fn dispatch_event(&self, target: NodeId, event_type: &str) -> usize {
        self.flush_mutations();

        let path: Vec<NodeId> = {
            let tree = self.tree();
            let mut path = Vec::new();
            let mut current = Some(target).filter(|id| tree.get(*id).is_some());
            while let Some(id) = current {
                path.push(id);
                current = tree.parent(id);
            }
            path
        };

        let mut event = DomEvent::new(event_type, target);
        let mut invoked = 0;
        for node in path {
            let listeners = self.inner.listeners.borrow().collect(ListenerTarget::Node(node), event_type);
            event.current_target = Some(node);
            for listener in listeners {
                listener(&event);
                invoked += 1;
            }
            if event.is_propagation_stopped() {
                return invoked;
            }
        }
        event.current_target = None;
        for global in [GlobalTarget::Document, GlobalTarget::Window] {
            invoked += self.run_global(global, &event);
            if event.is_propagation_stopped() {
                break;
            }
        }
        invoked
    }

    /// Dispatch an event directly at a global target
    pub fn dispatch_global(&self, target: GlobalTarget, event_type: &str) -> usize {
        self.flush_mutations();
        let event = DomEvent::new(event_type, NodeId::NONE);
        self.run_global(target, &event)
    }

    fn run_global(&self, target: GlobalTarget, event: &DomEvent) -> usize {
        let listeners = self
            .inner
            .listeners
            .borrow()
            .collect(ListenerTarget::Global(target), &event.event_type);
        for listener in &listeners {
            listener(event);
        }
        listeners.len()
    }

    // ------------------------------------------------------------------
    // Mutation observers
    // ------------------------------------------------------------------

    /// Observe mutations in the subtree rooted at `root`
    pub fn observe(&self, root: NodeId, callback: MutationCallback) -> ObserverId {
        let id = self.inner.observers.borrow_mut().observe(root, callback);
        self.tree_mut().set_recording(true);
        id
    }

    /// Stop an observer; returns whether it was attached
    pub fn disconnect(&self, id: ObserverId) -> bool {
        let mut observers = self.inner.observers.borrow_mut();
        let removed = observers.disconnect(id);
        if observers.is_empty() {
            self.tree_mut().set_recording(false);
        }
        removed
    }

    /// Mutation records queued since the last flush
    pub fn pending_records(&self) -> usize {
        self.tree().pending_records()
    }

    /// Deliver queued mutation records to observers.
    ///
    /// Observers may mutate the tree; the resulting records are delivered in
    /// further rounds. Returns the number of records delivered.
    pub fn flush_mutations(&self) -> usize {
        let mut delivered = 0;
        for _ in 0..MAX_FLUSH_ROUNDS {
            let records = self.tree_mut().take_records();
            if records.is_empty() {
                return delivered;
            }
            delivered += records.len();
            let observers = self.inner.observers.borrow().snapshot();
            for (root, callback) in observers {
                let batch: Vec<MutationRecord> = {
                    let tree = self.tree();
                    records
                        .iter()
                        .filter(|r| tree.is_inclusive_ancestor(root, r.target))
                        .cloned()
                        .collect()
                };
                if !batch.is_empty() {
                    callback(&batch);
                }
            }
        }
        tracing::warn!("Mutation delivery did not settle after {} rounds", MAX_FLUSH_ROUNDS);
        delivered
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}
