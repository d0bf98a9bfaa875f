//! Native Tree Adapter contract
//!
//! Everything the reconciler and the delegation registry need from a host
//! tree. Handles are cheap clones of a shared, single-threaded tree, so
//! every method takes `&self`.
//!
//! Implementations must not run listener or growth callbacks re-entrantly
//! from inside a mutation: insertions and removals are reported in batches
//! at the host's next flush point.

use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

use crate::error::VdomResult;
use crate::vnode::StyleMap;

/// Listener scopes outside the node tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalScope {
    Window,
    Document,
}

impl GlobalScope {
    /// Parse the selector sentinel (`"window"` / `"document"`)
    pub fn from_selector(selector: &str) -> Option<Self> {
        match selector.trim() {
            "window" => Some(Self::Window),
            "document" => Some(Self::Document),
            _ => None,
        }
    }
}

/// Value assigned through a native property
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Str(String),
    Num(f64),
    Bool(bool),
}

/// Event delivered to a native listener
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeEvent {
    pub event_type: String,
    /// Key of the dispatch target, `None` at global scope
    pub target: Option<u64>,
}

/// Native listener callback
pub type NativeListener = Rc<dyn Fn(&NativeEvent)>;

/// Structural changes under the observation root since the last flush
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrowthBatch<N> {
    pub inserted: Vec<N>,
    /// Removed nodes together with their descendants
    pub removed: Vec<N>,
}

/// Growth callback receiving one batch per flush
pub type GrowthCallback<N> = Rc<dyn Fn(&GrowthBatch<N>)>;

/// Host tree contract
pub trait NativeTree: Clone + 'static {
    /// Node handle; identity-comparable
    type Node: Copy + Eq + Hash + Debug + 'static;
    /// Listener registration handle
    type ListenerId: Copy + Eq + Debug + 'static;
    /// Growth subscription handle
    type Subscription: Copy + Eq + Debug + 'static;

    // Creation
    fn create_element(&self, tag: &str) -> VdomResult<Self::Node>;
    fn create_text(&self, content: &str) -> Self::Node;

    // Content
    fn set_text(&self, node: Self::Node, content: &str) -> VdomResult<()>;
    fn has_property(&self, node: Self::Node, name: &str) -> bool;
    fn set_property(&self, node: Self::Node, name: &str, value: &PropValue) -> VdomResult<()>;
    fn set_attribute(&self, node: Self::Node, name: &str, value: &str) -> VdomResult<()>;
    fn remove_attribute(&self, node: Self::Node, name: &str) -> VdomResult<()>;
    fn set_class(&self, node: Self::Node, class: &str) -> VdomResult<()>;
    fn merge_style(&self, node: Self::Node, style: &StyleMap) -> VdomResult<()>;

    // Structure
    fn child_count(&self, parent: Self::Node) -> usize;
    fn child_at(&self, parent: Self::Node, index: usize) -> Option<Self::Node>;
    fn children(&self, parent: Self::Node) -> Vec<Self::Node>;
    fn append_child(&self, parent: Self::Node, child: Self::Node) -> VdomResult<()>;
    /// Insert before `reference`, appending when `None`
    fn insert_before(&self, parent: Self::Node, child: Self::Node, reference: Option<Self::Node>) -> VdomResult<()>;
    fn remove_child(&self, parent: Self::Node, child: Self::Node) -> VdomResult<()>;
    fn replace_child(&self, parent: Self::Node, new: Self::Node, old: Self::Node) -> VdomResult<()>;
    /// Remove every child in one step
    fn clear_children(&self, parent: Self::Node) -> VdomResult<()>;
    /// Whether `node` is `root` or sits somewhere below it
    fn is_attached(&self, root: Self::Node, node: Self::Node) -> bool;

    // Selectors
    fn query_selector_all(&self, root: Self::Node, selector: &str) -> VdomResult<Vec<Self::Node>>;
    /// Whether `node` matches `selector`; unparseable selectors match nothing
    fn matches(&self, node: Self::Node, selector: &str) -> bool;

    // Listeners
    fn add_listener(&self, node: Self::Node, event_type: &str, listener: NativeListener) -> Self::ListenerId;
    fn add_global_listener(&self, scope: GlobalScope, event_type: &str, listener: NativeListener) -> Self::ListenerId;
    fn remove_listener(&self, id: Self::ListenerId) -> bool;

    // Growth observation
    /// Root under which delegated selectors are resolved, if it exists yet
    fn observation_root(&self) -> Option<Self::Node>;
    /// Run `callback` once the observation root exists
    fn on_root_ready(&self, callback: Box<dyn FnOnce(Self::Node)>);
    fn subscribe_growth(&self, root: Self::Node, callback: GrowthCallback<Self::Node>) -> Self::Subscription;
    fn unsubscribe(&self, subscription: Self::Subscription) -> bool;
    /// Deliver pending growth batches now
    fn flush(&self);

    /// Stable key handed to event callbacks
    fn node_key(&self, node: Self::Node) -> u64;
}
