//! Attribute Reconciler
//!
//! Applies one attribute to a native node, or the difference between two
//! attribute maps. Keys resolve in priority order: `on*` handlers go through
//! the delegation registry, `class`/`className` replace the class field,
//! `style` mappings merge onto the native style, settable properties are
//! assigned directly, and everything else becomes a plain attribute.

use crate::adapter::{NativeTree, PropValue};
use crate::error::{VdomError, VdomResult};
use crate::event::{Callback, EventKind};
use crate::renderer::{Renderer, next_ref_token};
use crate::vnode::{AttrValue, Attrs};

fn is_class_key(key: &str) -> bool {
    key == "class" || key == "className"
}

fn is_handler_key(key: &str) -> bool {
    key.len() > 2 && key.starts_with("on")
}

fn prop_value(value: &AttrValue) -> PropValue {
    match value {
        AttrValue::Number(n) => PropValue::Num(*n),
        AttrValue::Bool(b) => PropValue::Bool(*b),
        other => PropValue::Str(other.to_text()),
    }
}

impl<A: NativeTree> Renderer<A> {
    /// Apply a single attribute to `node`
    pub fn set_attribute(&self, node: A::Node, key: &str, value: &AttrValue) -> VdomResult<()> {
        if is_handler_key(key) {
            if let AttrValue::Handler(callback) = value {
                return self.bind_listener(node, key, callback);
            }
        }
        if is_class_key(key) {
            return self.tree.set_class(node, &value.to_text());
        }
        if let ("style", AttrValue::Style(map)) = (key, value) {
            return self.tree.merge_style(node, map);
        }
        if value.as_handler().is_some() {
            tracing::warn!("Ignoring handler under non-event attribute {:?}", key);
            return Ok(());
        }
        if self.tree.has_property(node, key) {
            return self.tree.set_property(node, key, &prop_value(value));
        }
        self.tree.set_attribute(node, key, &value.to_text())
    }

    /// Bring `node` from the `old` attribute map to the `new` one.
    ///
    /// Keys dropped from `old` are cleared first; keys whose value changed
    /// (handlers by identity) are then set. Unchanged keys cause no writes.
    pub fn update_attributes(&self, node: A::Node, new: &Attrs, old: &Attrs) -> VdomResult<()> {
        for (key, old_value) in old.iter() {
            if !new.contains_key(key) {
                self.clear_attribute(node, key, old_value)?;
            }
        }
        for (key, value) in new.iter() {
            if old.get(key) != Some(value) {
                self.set_attribute(node, key, value)?;
            }
        }
        Ok(())
    }

    fn clear_attribute(&self, node: A::Node, key: &str, old_value: &AttrValue) -> VdomResult<()> {
        if is_handler_key(key) && old_value.as_handler().is_some() {
            return self.unbind_listener(node, key);
        }
        if is_class_key(key) {
            return self.tree.set_class(node, "");
        }
        if let AttrValue::Bool(_) = old_value {
            if self.tree.has_property(node, key) {
                return self.tree.set_property(node, key, &PropValue::Bool(false));
            }
        }
        self.tree.remove_attribute(node, key)
    }

    fn bind_listener(&self, node: A::Node, key: &str, callback: &Callback) -> VdomResult<()> {
        let kind = EventKind::from_attribute(key)
            .ok_or_else(|| VdomError::unsupported_event(&key[2..]).with("attribute", key))?;
        let previous = self.bindings.borrow_mut().get_mut(&node).and_then(|keys| keys.remove(key));
        if let Some(id) = previous {
            self.registry.remove_event(id);
        }
        let token = self.ref_token(node)?;
        let selector = format!("[{}=\"{}\"]", self.config.ref_attribute, token);
        let id = self.registry.register(kind, &selector, callback.clone(), false);
        self.bindings
            .borrow_mut()
            .entry(node)
            .or_default()
            .insert(key.to_string(), id);
        Ok(())
    }

    fn unbind_listener(&self, node: A::Node, key: &str) -> VdomResult<()> {
        let (removed, now_empty) = {
            let mut bindings = self.bindings.borrow_mut();
            let Some(keys) = bindings.get_mut(&node) else {
                return Ok(());
            };
            let removed = keys.remove(key);
            let now_empty = keys.is_empty();
            if now_empty {
                bindings.remove(&node);
            }
            (removed, now_empty)
        };
        if let Some(id) = removed {
            self.registry.remove_event(id);
        }
        if now_empty && self.refs.borrow_mut().remove(&node).is_some() {
            self.tree.remove_attribute(node, &self.config.ref_attribute)?;
        }
        Ok(())
    }

    /// Reference token for `node`, tagging it on first use
    fn ref_token(&self, node: A::Node) -> VdomResult<String> {
        let existing = self.refs.borrow().get(&node).cloned();
        if let Some(token) = existing {
            return Ok(token);
        }
        let token = next_ref_token();
        self.tree.set_attribute(node, &self.config.ref_attribute, &token)?;
        self.refs.borrow_mut().insert(node, token.clone());
        Ok(token)
    }
}
