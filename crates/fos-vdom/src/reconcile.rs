//! Tree Reconciler
//!
//! Positional diff between two virtual trees. Children are matched by index
//! only; keys signal a change but never move nodes. A fault while diffing a
//! children list drops that list and rebuilds it from the new virtual
//! children.

use crate::adapter::NativeTree;
use crate::error::{VdomError, VdomResult};
use crate::renderer::Renderer;
use crate::vnode::VNode;

/// Whether `old` must be replaced rather than updated in place
pub fn has_changed(new: &VNode, old: &VNode) -> bool {
    match (new, old) {
        (VNode::Text(a), VNode::Text(b)) => a != b,
        (VNode::Element(a), VNode::Element(b)) => {
            a.tag != b.tag || matches!((&a.key, &b.key), (Some(x), Some(y)) if x != y)
        }
        (VNode::Empty, VNode::Empty) => false,
        _ => true,
    }
}

fn present(node: Option<&VNode>) -> Option<&VNode> {
    node.filter(|n| !n.is_empty())
}

impl<A: NativeTree> Renderer<A> {
    /// Render `new` into `container`, diffing against `old` when given.
    ///
    /// Pending growth batches are flushed before returning, on success and
    /// on error, so the registry tracks the tree as it was left.
    pub fn render_with_diff(&self, container: A::Node, new: &VNode, old: Option<&VNode>) -> VdomResult<()> {
        let result = match old {
            Some(old) => self.patch(container, Some(new), Some(old), 0),
            None => self.render_fresh(container, new),
        };
        self.tree.flush();
        result
    }

    fn render_fresh(&self, container: A::Node, new: &VNode) -> VdomResult<()> {
        self.release_children(container);
        self.tree.clear_children(container)?;
        if let Some(node) = self.materialize(new)? {
            self.tree.append_child(container, node)?;
        }
        Ok(())
    }

    /// Reconcile the child of `parent` at `index`
    pub fn patch(&self, parent: A::Node, new: Option<&VNode>, old: Option<&VNode>, index: usize) -> VdomResult<()> {
        match (present(new), present(old)) {
            (None, None) => Ok(()),
            (Some(new), None) => {
                let Some(node) = self.materialize(new)? else {
                    return Ok(());
                };
                let reference = self.tree.child_at(parent, index);
                self.tree.insert_before(parent, node, reference)
            }
            (None, Some(_)) => match self.tree.child_at(parent, index) {
                Some(child) => {
                    self.release(child);
                    self.tree.remove_child(parent, child)
                }
                None => Ok(()),
            },
            (Some(new), Some(old)) if has_changed(new, old) => self.replace(parent, new, Some(old), index),
            (Some(new), Some(old)) => self.update_node(parent, new, old, index),
        }
    }

    /// Reconcile the children of `parent` from `old` to `new`
    pub fn patch_children(&self, parent: A::Node, new: &[VNode], old: &[VNode]) -> VdomResult<()> {
        let new: Vec<&VNode> = new.iter().filter(|n| !n.is_empty()).collect();
        let old: Vec<&VNode> = old.iter().filter(|n| !n.is_empty()).collect();

        if new.is_empty() {
            self.release_children(parent);
            return self.tree.clear_children(parent);
        }

        match self.diff_children(parent, &new, &old) {
            Ok(()) => Ok(()),
            Err(err) if self.config.rebuild_on_diff_error => {
                tracing::warn!("Diffing children of {:?} failed, rebuilding: {}", parent, err);
                self.rebuild_children(parent, &new)
            }
            Err(err) => Err(err),
        }
    }

    fn diff_children(&self, parent: A::Node, new: &[&VNode], old: &[&VNode]) -> VdomResult<()> {
        let mut native_len = self.tree.child_count(parent);
        while native_len > new.len() {
            let last = self
                .tree
                .child_at(parent, native_len - 1)
                .ok_or_else(|| VdomError::missing_child(native_len - 1))?;
            self.release(last);
            self.tree.remove_child(parent, last)?;
            native_len -= 1;
        }

        for (index, &vnode) in new.iter().enumerate() {
            if self.tree.child_at(parent, index).is_none() {
                if let Some(node) = self.materialize(vnode)? {
                    self.tree.append_child(parent, node)?;
                }
                continue;
            }
            match old.get(index).copied() {
                Some(prev) if !has_changed(vnode, prev) => self.update_node(parent, vnode, prev, index)?,
                prev => self.replace(parent, vnode, prev, index)?,
            }
        }
        Ok(())
    }

    fn rebuild_children(&self, parent: A::Node, new: &[&VNode]) -> VdomResult<()> {
        self.release_children(parent);
        self.tree.clear_children(parent)?;
        for &vnode in new {
            if let Some(node) = self.materialize(vnode)? {
                self.tree.append_child(parent, node)?;
            }
        }
        Ok(())
    }

    /// Swap the child at `index` for a fresh materialization of `new`.
    /// Text replacing text is a single in-place write.
    fn replace(&self, parent: A::Node, new: &VNode, old: Option<&VNode>, index: usize) -> VdomResult<()> {
        let current = self
            .tree
            .child_at(parent, index)
            .ok_or_else(|| VdomError::missing_child(index))?;
        if let (VNode::Text(content), Some(VNode::Text(_))) = (new, old) {
            return self.tree.set_text(current, content);
        }
        tracing::debug!("Replacing child {} of {:?}", index, parent);
        match self.materialize(new)? {
            Some(node) => {
                self.release(current);
                self.tree.replace_child(parent, node, current)
            }
            None => {
                self.release(current);
                self.tree.remove_child(parent, current)
            }
        }
    }

    fn update_node(&self, parent: A::Node, new: &VNode, old: &VNode, index: usize) -> VdomResult<()> {
        let (VNode::Element(new), VNode::Element(old)) = (new, old) else {
            return Ok(());
        };
        let node = self
            .tree
            .child_at(parent, index)
            .ok_or_else(|| VdomError::missing_child(index))?;
        self.update_attributes(node, &new.attrs, &old.attrs)?;
        self.patch_children(node, &new.children, &old.children)
    }
}
