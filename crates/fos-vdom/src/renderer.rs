//! Renderer
//!
//! Owns the native tree handle, the delegation registry and the bookkeeping
//! that ties `on*` attributes to registry handlers. The materializer, the
//! attribute reconciler and the tree reconciler are implemented on it in
//! their own modules.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::adapter::NativeTree;
use crate::config::RenderConfig;
use crate::event::HandlerId;
use crate::registry::EventRegistry;

static NEXT_REF: AtomicU64 = AtomicU64::new(1);

/// Process-unique reference token for a handler-bearing node
pub(crate) fn next_ref_token() -> String {
    format!("v{}", NEXT_REF.fetch_add(1, Ordering::Relaxed))
}

/// Virtual tree renderer over one native tree
pub struct Renderer<A: NativeTree> {
    pub(crate) tree: A,
    pub(crate) registry: EventRegistry<A>,
    pub(crate) config: RenderConfig,
    /// `on*` key → handler, per native node
    pub(crate) bindings: RefCell<HashMap<A::Node, BTreeMap<String, HandlerId>>>,
    /// Reference token written on each handler-bearing node
    pub(crate) refs: RefCell<HashMap<A::Node, String>>,
}

impl<A: NativeTree> std::fmt::Debug for Renderer<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("registry", &self.registry)
            .field("bound_nodes", &self.bindings.borrow().len())
            .finish()
    }
}

impl<A: NativeTree> Renderer<A> {
    pub fn new(tree: A) -> Self {
        Self::with_config(tree, RenderConfig::default())
    }

    pub fn with_config(tree: A, config: RenderConfig) -> Self {
        let registry = EventRegistry::with_config(tree.clone(), &config);
        Self {
            tree,
            registry,
            config,
            bindings: RefCell::new(HashMap::new()),
            refs: RefCell::new(HashMap::new()),
        }
    }

    pub fn tree(&self) -> &A {
        &self.tree
    }

    /// Delegation registry shared by rendered handlers and direct callers
    pub fn registry(&self) -> &EventRegistry<A> {
        &self.registry
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Handler bound for an `on*` key on `node`, if any
    pub fn handler_for(&self, node: A::Node, key: &str) -> Option<HandlerId> {
        self.bindings.borrow().get(&node).and_then(|keys| keys.get(key)).copied()
    }

    /// Number of native nodes carrying rendered handlers
    pub fn bound_node_count(&self) -> usize {
        self.bindings.borrow().len()
    }

    /// Release handlers bound anywhere in the subtree rooted at `node`
    pub(crate) fn release(&self, node: A::Node) {
        let mut stack = vec![node];
        let mut released = 0;
        while let Some(current) = stack.pop() {
            let removed = self.bindings.borrow_mut().remove(&current);
            if let Some(keys) = removed {
                for id in keys.into_values() {
                    self.registry.remove_event(id);
                    released += 1;
                }
            }
            self.refs.borrow_mut().remove(&current);
            stack.extend(self.tree.children(current));
        }
        if released > 0 {
            tracing::debug!("Released {} handlers with removed subtree {:?}", released, node);
        }
    }

    /// Release handlers under every child of `parent`
    pub(crate) fn release_children(&self, parent: A::Node) {
        for child in self.tree.children(parent) {
            self.release(child);
        }
    }
}
