//! fOS VDOM - virtual tree rendering and delegated events
//!
//! Describe UI with [`h`], render it into any [`NativeTree`] with a
//! [`Renderer`], and keep it in sync by diffing successive virtual trees.
//! `on*` attributes are bound through an [`EventRegistry`] that attaches one
//! native listener per (node, event type) and rebinds as the tree grows.
//!
//! ```ignore
//! let doc = fos_dom::Document::default();
//! let renderer = Renderer::new(doc.clone());
//! let body = doc.body().unwrap();
//! let view = h("p", Attrs::new().with("class", "greeting"), ["hello"]);
//! renderer.render_with_diff(body, &view, None)?;
//! ```

mod adapter;
mod attributes;
mod config;
mod dom;
mod error;
mod event;
mod materialize;
mod reconcile;
mod registry;
mod renderer;
mod vnode;

pub use adapter::{GlobalScope, GrowthBatch, GrowthCallback, NativeEvent, NativeListener, NativeTree, PropValue};
pub use config::{DEFAULT_REF_ATTRIBUTE, RenderConfig};
pub use error::{ErrorCode, VdomError, VdomResult};
pub use event::{Callback, DelegatedEvent, EventKind, HandlerId};
pub use reconcile::has_changed;
pub use registry::EventRegistry;
pub use renderer::Renderer;
pub use vnode::{AttrValue, Attrs, Child, Key, StyleMap, VElement, VNode, h, normalize_children, text};
