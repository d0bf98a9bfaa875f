//! Event Delegation Registry
//!
//! A table of `(event, selector, callback)` handlers. For every node that
//! currently matches a handler's selector the registry attaches exactly one
//! native listener per event kind; when that listener fires it scans the
//! whole table and runs every handler whose kind and selector match the
//! node, in ascending id order. Growth notifications from the host re-run
//! binding so nodes inserted later pick up existing handlers, and drop the
//! listeners of nodes that left the tree.
//!
//! Handler lifecycle: registered, then bound to zero or more nodes, then
//! removed. Ids are never reused within one registry.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::{Rc, Weak};

use crate::adapter::{GlobalScope, GrowthBatch, NativeEvent, NativeListener, NativeTree};
use crate::config::RenderConfig;
use crate::error::{VdomError, VdomResult};
use crate::event::{Callback, DelegatedEvent, EventKind, HandlerId};

struct HandlerRecord<A: NativeTree> {
    id: HandlerId,
    kind: EventKind,
    selector: String,
    callback: Callback,
    /// Shared listener covering each node this handler was bound to
    bound: HashMap<A::Node, A::ListenerId>,
    global_listener: Option<A::ListenerId>,
}

impl<A: NativeTree> HandlerRecord<A> {
    fn global_scope(&self) -> Option<GlobalScope> {
        GlobalScope::from_selector(&self.selector).filter(|_| self.kind.is_global_scope())
    }
}

struct RegistryState<A: NativeTree> {
    next_id: u64,
    handlers: BTreeMap<HandlerId, HandlerRecord<A>>,
    /// Element-seen set: one native listener per (node, kind)
    seen: HashMap<A::Node, HashMap<EventKind, A::ListenerId>>,
    root: Option<A::Node>,
    subscription: Option<A::Subscription>,
    initialized: bool,
    awaiting_root: bool,
    warn_unmatched: bool,
}

type Shared<A> = Rc<RefCell<RegistryState<A>>>;

/// Delegated event registry over one native tree
pub struct EventRegistry<A: NativeTree> {
    tree: A,
    state: Shared<A>,
}

impl<A: NativeTree> std::fmt::Debug for EventRegistry<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("EventRegistry")
            .field("handlers", &state.handlers.len())
            .field("seen_nodes", &state.seen.len())
            .field("initialized", &state.initialized)
            .finish()
    }
}

impl<A: NativeTree> EventRegistry<A> {
    /// Create a registry and initialize it against the tree's observation root
    pub fn new(tree: A) -> Self {
        Self::with_config(tree, &RenderConfig::default())
    }

    pub fn with_config(tree: A, config: &RenderConfig) -> Self {
        let registry = Self {
            tree,
            state: Rc::new(RefCell::new(RegistryState {
                next_id: 1,
                handlers: BTreeMap::new(),
                seen: HashMap::new(),
                root: None,
                subscription: None,
                initialized: false,
                awaiting_root: false,
                warn_unmatched: config.warn_unmatched_selectors,
            })),
        };
        registry.init();
        registry
    }

    /// Subscribe to tree growth and bind pending handlers.
    ///
    /// Returns `false` when already initialized (with a warning) or when the
    /// observation root does not exist yet; in the latter case
    /// initialization completes as soon as the host reports the root.
    pub fn init(&self) -> bool {
        {
            let mut state = self.state.borrow_mut();
            if state.initialized {
                tracing::warn!("Event registry already initialized");
                return false;
            }
            if state.awaiting_root {
                return false;
            }
            if self.tree.observation_root().is_none() {
                state.awaiting_root = true;
                drop(state);
                tracing::debug!("Observation root missing, deferring registry init");
                let tree = self.tree.clone();
                let weak = Rc::downgrade(&self.state);
                self.tree.on_root_ready(Box::new(move |root| {
                    if let Some(shared) = weak.upgrade() {
                        shared.borrow_mut().awaiting_root = false;
                        initialize(&tree, &shared, root);
                    }
                }));
                return false;
            }
        }
        match self.tree.observation_root() {
            Some(root) => {
                initialize(&self.tree, &self.state, root);
                true
            }
            None => false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.state.borrow().initialized
    }

    /// Register a handler and bind it immediately
    pub fn on_event(&self, event_type: &str, selector: &str, callback: impl Into<Callback>) -> VdomResult<HandlerId> {
        let kind = EventKind::from_name(event_type).ok_or_else(|| {
            VdomError::unsupported_event(event_type).with("selector", selector)
        })?;
        Ok(self.register(kind, selector, callback.into(), true))
    }

    /// Register without the unmatched-selector warning; used for handlers on
    /// nodes that are not attached yet
    pub(crate) fn register(&self, kind: EventKind, selector: &str, callback: Callback, report_unmatched: bool) -> HandlerId {
        let id = {
            let mut state = self.state.borrow_mut();
            let id = HandlerId(state.next_id);
            state.next_id += 1;
            state.handlers.insert(
                id,
                HandlerRecord {
                    id,
                    kind,
                    selector: selector.to_string(),
                    callback,
                    bound: HashMap::new(),
                    global_listener: None,
                },
            );
            id
        };
        tracing::debug!("Registered {} handler {} for {:?}", kind, id, selector);
        bind(&self.tree, &self.state, id, report_unmatched);
        id
    }

    /// Remove a handler; returns whether it existed
    pub fn remove_event(&self, id: HandlerId) -> bool {
        let removed = self.state.borrow_mut().handlers.remove(&id);
        let Some(record) = removed else {
            tracing::warn!("No event handler with id {}", id);
            return false;
        };
        if let Some(listener) = record.global_listener {
            self.tree.remove_listener(listener);
        }
        let orphaned: Vec<(A::Node, A::ListenerId)> = {
            let mut state = self.state.borrow_mut();
            let mut orphaned = Vec::new();
            for (&node, &listener) in &record.bound {
                let shared = state
                    .handlers
                    .values()
                    .any(|r| r.kind == record.kind && r.bound.contains_key(&node));
                if shared {
                    continue;
                }
                if let Some(kinds) = state.seen.get_mut(&node) {
                    kinds.remove(&record.kind);
                    if kinds.is_empty() {
                        state.seen.remove(&node);
                    }
                }
                orphaned.push((node, listener));
            }
            orphaned
        };
        for (_, listener) in orphaned {
            self.tree.remove_listener(listener);
        }
        tracing::debug!("Removed handler {}", id);
        true
    }

    /// Remove every handler, cancel the growth subscription, reset tracking
    pub fn destroy(&self) {
        let (handlers, seen, subscription) = {
            let mut state = self.state.borrow_mut();
            state.initialized = false;
            (
                std::mem::take(&mut state.handlers),
                std::mem::take(&mut state.seen),
                state.subscription.take(),
            )
        };
        for record in handlers.values() {
            if let Some(listener) = record.global_listener {
                self.tree.remove_listener(listener);
            }
        }
        for listener in seen.values().flat_map(|kinds| kinds.values()) {
            self.tree.remove_listener(*listener);
        }
        if let Some(subscription) = subscription {
            self.tree.unsubscribe(subscription);
        }
        if !handlers.is_empty() {
            tracing::debug!("Registry destroyed, dropped {} handlers", handlers.len());
        }
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.state.borrow().handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: HandlerId) -> bool {
        self.state.borrow().handlers.contains_key(&id)
    }

    /// Nodes a handler is currently bound to
    pub fn bound_nodes(&self, id: HandlerId) -> Vec<A::Node> {
        self.state
            .borrow()
            .handlers
            .get(&id)
            .map(|r| r.bound.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Whether `node` carries the shared listener for `kind`
    pub fn is_seen(&self, node: A::Node, kind: EventKind) -> bool {
        self.state.borrow().seen.get(&node).is_some_and(|k| k.contains_key(&kind))
    }
}

impl<A: NativeTree> Drop for EventRegistry<A> {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Subscribe to growth under `root` and bind everything registered so far
fn initialize<A: NativeTree>(tree: &A, shared: &Shared<A>, root: A::Node) {
    let weak = Rc::downgrade(shared);
    let growth_tree = tree.clone();
    let subscription = tree.subscribe_growth(
        root,
        Rc::new(move |batch: &GrowthBatch<A::Node>| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            if !batch.removed.is_empty() {
                prune_detached(&growth_tree, &shared, &batch.removed);
            }
            if !batch.inserted.is_empty() {
                rebind_after_growth(&growth_tree, &shared, batch.inserted.len());
            }
        }),
    );
    let pending: Vec<HandlerId> = {
        let mut state = shared.borrow_mut();
        state.root = Some(root);
        state.subscription = Some(subscription);
        state.initialized = true;
        state.handlers.keys().copied().collect()
    };
    tracing::debug!("Event registry initialized, binding {} pending handlers", pending.len());
    for id in pending {
        bind(tree, shared, id, false);
    }
}

fn rebind_after_growth<A: NativeTree>(tree: &A, shared: &Shared<A>, inserted: usize) {
    let ids: Vec<HandlerId> = shared
        .borrow()
        .handlers
        .values()
        .filter(|r| r.global_scope().is_none())
        .map(|r| r.id)
        .collect();
    tracing::debug!("{} nodes inserted, rebinding {} handlers", inserted, ids.len());
    for id in ids {
        bind(tree, shared, id, false);
    }
}

/// Drop tracking and shared listeners for removed nodes that are no longer
/// under the root. Nodes moved back in within the same batch are kept.
fn prune_detached<A: NativeTree>(tree: &A, shared: &Shared<A>, removed: &[A::Node]) {
    let (listeners, pruned) = {
        let mut state = shared.borrow_mut();
        let Some(root) = state.root else {
            return;
        };
        let detached: HashSet<A::Node> = removed
            .iter()
            .copied()
            .filter(|&node| !tree.is_attached(root, node))
            .collect();
        if detached.is_empty() {
            return;
        }
        let mut listeners = Vec::new();
        for node in &detached {
            if let Some(kinds) = state.seen.remove(node) {
                listeners.extend(kinds.into_values());
            }
        }
        for record in state.handlers.values_mut() {
            record.bound.retain(|node, _| !detached.contains(node));
        }
        (listeners, detached.len())
    };
    for listener in &listeners {
        tree.remove_listener(*listener);
    }
    if !listeners.is_empty() {
        tracing::debug!("{} nodes removed, dropped {} shared listeners", pruned, listeners.len());
    }
}

/// Attach listeners for one handler; returns the number of nodes newly covered
fn bind<A: NativeTree>(tree: &A, shared: &Shared<A>, id: HandlerId, report_unmatched: bool) -> usize {
    let (kind, selector, global, callback, has_global, root, warn_unmatched) = {
        let state = shared.borrow();
        let Some(record) = state.handlers.get(&id) else {
            return 0;
        };
        (
            record.kind,
            record.selector.clone(),
            record.global_scope(),
            record.callback.clone(),
            record.global_listener.is_some(),
            state.root,
            state.warn_unmatched,
        )
    };

    if let Some(scope) = global {
        if has_global {
            return 0;
        }
        let listener: NativeListener = Rc::new(move |_event: &NativeEvent| {
            callback.call(&DelegatedEvent {
                kind,
                handler: id,
                target: None,
                current_target: None,
            });
        });
        let listener_id = tree.add_global_listener(scope, kind.name(), listener);
        if let Some(record) = shared.borrow_mut().handlers.get_mut(&id) {
            record.global_listener = Some(listener_id);
        }
        return 1;
    }

    let Some(root) = root else {
        return 0;
    };
    let matches = match tree.query_selector_all(root, &selector) {
        Ok(matches) => matches,
        Err(err) => {
            tracing::warn!("Cannot bind handler {}: {}", id, err);
            return 0;
        }
    };
    if matches.is_empty() {
        if report_unmatched && warn_unmatched {
            tracing::warn!("Selector {:?} matched no elements for {} handler {}", selector, kind, id);
        }
        return 0;
    }

    let mut newly_bound = 0;
    for node in matches {
        let existing = shared.borrow().seen.get(&node).and_then(|k| k.get(&kind)).copied();
        let listener_id = match existing {
            Some(listener_id) => listener_id,
            None => {
                let listener = dispatcher(tree.clone(), Rc::downgrade(shared), node, kind);
                let listener_id = tree.add_listener(node, kind.name(), listener);
                shared.borrow_mut().seen.entry(node).or_default().insert(kind, listener_id);
                listener_id
            }
        };
        let mut state = shared.borrow_mut();
        if let Some(record) = state.handlers.get_mut(&id) {
            if record.bound.insert(node, listener_id).is_none() {
                newly_bound += 1;
            }
        }
    }
    if newly_bound > 0 {
        tracing::debug!("Bound {} handler {} to {} new nodes", kind, id, newly_bound);
    }
    newly_bound
}

/// Shared native listener for one (node, kind): fans out to every matching handler
fn dispatcher<A: NativeTree>(tree: A, weak: Weak<RefCell<RegistryState<A>>>, node: A::Node, kind: EventKind) -> NativeListener {
    Rc::new(move |event: &NativeEvent| {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        let matched: Vec<(HandlerId, Callback)> = shared
            .borrow()
            .handlers
            .values()
            .filter(|r| r.kind == kind && r.global_scope().is_none() && tree.matches(node, &r.selector))
            .map(|r| (r.id, r.callback.clone()))
            .collect();
        let current = tree.node_key(node);
        for (handler, callback) in matched {
            callback.call(&DelegatedEvent {
                kind,
                handler,
                target: event.target,
                current_target: Some(current),
            });
        }
    })
}
