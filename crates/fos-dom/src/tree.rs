//! DOM Tree (arena-based allocation)
//!
//! Nodes are never freed; detached nodes simply lose their links. Every
//! mutation bumps a counter in [`MutationStats`] and, while observers are
//! attached, appends a [`MutationRecord`] for later delivery.

use crate::operations::validate_name;
use crate::{DomError, DomResult, MutationRecord, Node, NodeData, NodeId, PropValue};

/// Counters for writes applied to the tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationStats {
    /// Nodes allocated
    pub nodes_created: u64,
    /// Children appended or inserted
    pub insertions: u64,
    /// Children removed one at a time
    pub removals: u64,
    /// Children replaced in place
    pub replacements: u64,
    /// Whole child lists cleared in one step
    pub clears: u64,
    /// Text content writes
    pub text_writes: u64,
    /// Attribute, property, class and style writes
    pub attribute_writes: u64,
}

impl MutationStats {
    /// Writes that changed the shape of the tree
    pub fn structural(&self) -> u64 {
        self.insertions + self.removals + self.replacements + self.clears
    }
}

/// Arena-based DOM tree for memory efficiency
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
    stats: MutationStats,
    recording: bool,
    records: Vec<MutationRecord>,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    /// Create a new tree holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::document()],
            stats: MutationStats::default(),
            recording: false,
            records: Vec::new(),
        }
    }

    /// Document node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.slot())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.slot())
    }

    /// Number of nodes in the arena (attached or not)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Write counters since creation or the last reset
    pub fn stats(&self) -> MutationStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = MutationStats::default();
    }

    pub(crate) fn set_recording(&mut self, recording: bool) {
        self.recording = recording;
        if !recording {
            self.records.clear();
        }
    }

    /// Number of mutation records waiting for delivery
    pub fn pending_records(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.records)
    }

    fn record(&mut self, record: MutationRecord) {
        if self.recording {
            self.records.push(record);
        }
    }

    fn node(&self, id: NodeId) -> DomResult<&Node> {
        self.get(id).ok_or(DomError::NotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        self.get_mut(id).ok_or(DomError::NotFound(id))
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        self.stats.nodes_created += 1;
        id
    }

    // ------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> DomResult<NodeId> {
        validate_name(tag)?;
        Ok(self.alloc(Node::element(tag)))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.alloc(Node::text(content.to_string()))
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Parent of a node, if attached
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.parent).filter(|p| p.is_valid())
    }

    /// Iterate children in order
    pub fn children(&self, parent: NodeId) -> Children<'_> {
        let next = self.get(parent).map_or(NodeId::NONE, |n| n.first_child);
        Children { tree: self, next }
    }

    /// Child IDs in order
    pub fn child_ids(&self, parent: NodeId) -> Vec<NodeId> {
        self.children(parent).map(|(id, _)| id).collect()
    }

    /// Child at a position
    pub fn child_at(&self, parent: NodeId, index: usize) -> Option<NodeId> {
        self.children(parent).nth(index).map(|(id, _)| id)
    }

    pub fn child_count(&self, parent: NodeId) -> usize {
        self.children(parent).count()
    }

    /// All descendants of `root` in document order, excluding `root`
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.child_ids(root).into_iter().rev().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.child_ids(id).into_iter().rev());
        }
        out
    }

    /// Whether `ancestor` is `node` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Concatenated text of a subtree
    pub fn text_content(&self, id: NodeId) -> String {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Text(t)) => t.content.clone(),
            Some(_) => self
                .descendants(id)
                .into_iter()
                .filter_map(|d| self.get(d).and_then(Node::as_text))
                .collect(),
            None => String::new(),
        }
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    fn check_insert(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        if !self.node(parent)?.is_container() {
            return Err(DomError::HierarchyRequest(format!("{parent} cannot hold children")));
        }
        let node = self.node(child)?;
        if matches!(node.data, NodeData::Document) {
            return Err(DomError::HierarchyRequest("document node cannot be inserted".into()));
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest(format!("{child} is an ancestor of {parent}")));
        }
        Ok(())
    }

    /// Unlink a node from its parent without recording anything
    fn unlink(&mut self, id: NodeId) {
        let (parent, prev, next) = match self.get(id) {
            Some(n) if n.parent.is_valid() => (n.parent, n.prev_sibling, n.next_sibling),
            _ => return,
        };
        if prev.is_valid() {
            self.nodes[prev.slot()].next_sibling = next;
        } else {
            self.nodes[parent.slot()].first_child = next;
        }
        if next.is_valid() {
            self.nodes[next.slot()].prev_sibling = prev;
        } else {
            self.nodes[parent.slot()].last_child = prev;
        }
        let node = &mut self.nodes[id.slot()];
        node.parent = NodeId::NONE;
        node.prev_sibling = NodeId::NONE;
        node.next_sibling = NodeId::NONE;
    }

    /// Link a detached node before `reference` (or at the end)
    fn link(&mut self, parent: NodeId, child: NodeId, reference: NodeId) {
        let prev = if reference.is_valid() {
            self.nodes[reference.slot()].prev_sibling
        } else {
            self.nodes[parent.slot()].last_child
        };
        {
            let node = &mut self.nodes[child.slot()];
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = reference;
        }
        if prev.is_valid() {
            self.nodes[prev.slot()].next_sibling = child;
        } else {
            self.nodes[parent.slot()].first_child = child;
        }
        if reference.is_valid() {
            self.nodes[reference.slot()].prev_sibling = child;
        } else {
            self.nodes[parent.slot()].last_child = child;
        }
    }

    /// Append a child, moving it if already attached elsewhere
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert before a reference child (append when `None`)
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> DomResult<()> {
        self.check_insert(parent, child)?;
        if let Some(reference) = reference {
            if reference == child {
                return Ok(());
            }
            if self.parent(reference) != Some(parent) {
                return Err(DomError::NotAChild { parent, child: reference });
            }
        }
        self.unlink(child);
        self.link(parent, child, reference.unwrap_or(NodeId::NONE));
        self.stats.insertions += 1;
        self.record(MutationRecord::child_list(parent, vec![child], Vec::new()));
        Ok(())
    }

    /// Remove a child from its parent
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        if self.parent(child) != Some(parent) {
            return Err(DomError::NotAChild { parent, child });
        }
        self.unlink(child);
        self.stats.removals += 1;
        self.record(MutationRecord::child_list(parent, Vec::new(), vec![child]));
        Ok(())
    }

    /// Replace `old` with `new` in place
    pub fn replace_child(&mut self, parent: NodeId, new: NodeId, old: NodeId) -> DomResult<()> {
        if self.parent(old) != Some(parent) {
            return Err(DomError::NotAChild { parent, child: old });
        }
        if new == old {
            return Ok(());
        }
        self.check_insert(parent, new)?;
        self.unlink(new);
        let reference = self.nodes[old.slot()].next_sibling;
        self.unlink(old);
        self.link(parent, new, reference);
        self.stats.replacements += 1;
        self.record(MutationRecord::child_list(parent, vec![new], vec![old]));
        Ok(())
    }

    /// Detach every child in one step
    pub fn remove_all_children(&mut self, parent: NodeId) -> DomResult<Vec<NodeId>> {
        self.node(parent)?;
        let removed = self.child_ids(parent);
        if removed.is_empty() {
            return Ok(removed);
        }
        for &child in &removed {
            let node = &mut self.nodes[child.slot()];
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }
        let node = &mut self.nodes[parent.slot()];
        node.first_child = NodeId::NONE;
        node.last_child = NodeId::NONE;
        self.stats.clears += 1;
        self.record(MutationRecord::child_list(parent, Vec::new(), removed.clone()));
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Content
    // ------------------------------------------------------------------

    /// Overwrite a text node's content
    pub fn set_text(&mut self, id: NodeId, content: &str) -> DomResult<()> {
        let old = match &mut self.node_mut(id)?.data {
            NodeData::Text(t) => std::mem::replace(&mut t.content, content.to_string()),
            _ => return Err(DomError::InvalidNodeType { operation: "set_text", node: id }),
        };
        self.stats.text_writes += 1;
        self.record(MutationRecord::character_data(id, old));
        Ok(())
    }

    fn element_mut(&mut self, id: NodeId, operation: &'static str) -> DomResult<&mut crate::ElementData> {
        self.node_mut(id)?
            .as_element_mut()
            .ok_or(DomError::InvalidNodeType { operation, node: id })
    }

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<String> {
        self.get(id)?.as_element()?.get_attr(name)
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<()> {
        validate_name(name)?;
        self.element_mut(id, "set_attribute")?.set_attr(name, value);
        self.stats.attribute_writes += 1;
        self.record(MutationRecord::attribute(id, name));
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> DomResult<()> {
        if self.element_mut(id, "remove_attribute")?.remove_attr(name) {
            self.stats.attribute_writes += 1;
            self.record(MutationRecord::attribute(id, name));
        }
        Ok(())
    }

    /// Assign a property; errors if the element has no such property
    pub fn set_property(&mut self, id: NodeId, name: &str, value: &PropValue) -> DomResult<()> {
        if !self.element_mut(id, "set_property")?.set_property(name, value) {
            return Err(DomError::InvalidNodeType { operation: "set_property", node: id });
        }
        self.stats.attribute_writes += 1;
        self.record(MutationRecord::attribute(id, name));
        Ok(())
    }

    /// Replace the class field wholesale
    pub fn set_class(&mut self, id: NodeId, class: &str) -> DomResult<()> {
        self.element_mut(id, "set_class")?.class_name = class.to_string();
        self.stats.attribute_writes += 1;
        self.record(MutationRecord::attribute(id, "class"));
        Ok(())
    }

    /// Merge style properties; existing properties not mentioned persist
    pub fn merge_style<'a>(
        &mut self,
        id: NodeId,
        props: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> DomResult<()> {
        let style = &mut self.element_mut(id, "merge_style")?.style;
        for (prop, value) in props {
            style.insert(prop.to_string(), value.to_string());
        }
        self.stats.attribute_writes += 1;
        self.record(MutationRecord::attribute(id, "style"));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Serialization
    // ------------------------------------------------------------------

    /// Markup for a node and its subtree
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.get(id) else { return };
        match &node.data {
            NodeData::Document => {
                for (child, _) in self.children(id) {
                    self.write_html(child, out);
                }
            }
            NodeData::Text(t) => out.push_str(&escape(&t.content)),
            NodeData::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                if !el.class_name.is_empty() {
                    out.push_str(&format!(" class=\"{}\"", escape(&el.class_name)));
                }
                for attr in el.attrs.iter() {
                    out.push_str(&format!(" {}=\"{}\"", attr.name, escape(&attr.value)));
                }
                if !el.style.is_empty() {
                    out.push_str(&format!(" style=\"{}\"", escape(&el.style_text())));
                }
                out.push('>');
                for (child, _) in self.children(id) {
                    self.write_html(child, out);
                }
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
        }
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

/// Iterator over a node's children
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl<'a> Iterator for Children<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        if !self.next.is_valid() {
            return None;
        }
        let id = self.next;
        let node = self.tree.get(id)?;
        self.next = node.next_sibling;
        Some((id, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(tree: &mut DomTree, items: &[&str]) -> (NodeId, Vec<NodeId>) {
        let ul = tree.create_element("ul").unwrap();
        tree.append_child(tree.root(), ul).unwrap();
        let ids = items
            .iter()
            .map(|text| {
                let t = tree.create_text(text);
                tree.append_child(ul, t).unwrap();
                t
            })
            .collect();
        (ul, ids)
    }

    #[test]
    fn test_insert_before_and_order() {
        let mut tree = DomTree::new();
        let (ul, ids) = list(&mut tree, &["a", "c"]);
        let b = tree.create_text("b");
        tree.insert_before(ul, b, Some(ids[1])).unwrap();
        assert_eq!(tree.text_content(ul), "abc");
        assert_eq!(tree.child_at(ul, 1), Some(b));
        assert_eq!(tree.child_count(ul), 3);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut tree = DomTree::new();
        let (ul, ids) = list(&mut tree, &["a", "b", "c"]);
        let x = tree.create_text("x");
        tree.replace_child(ul, x, ids[1]).unwrap();
        assert_eq!(tree.text_content(ul), "axc");
        assert_eq!(tree.parent(ids[1]), None);
        assert_eq!(tree.stats().replacements, 1);
    }

    #[test]
    fn test_remove_last_updates_links() {
        let mut tree = DomTree::new();
        let (ul, ids) = list(&mut tree, &["a", "b"]);
        tree.remove_child(ul, ids[1]).unwrap();
        assert_eq!(tree.get(ul).unwrap().last_child, ids[0]);
        assert_eq!(tree.get(ids[0]).unwrap().next_sibling, NodeId::NONE);
        assert!(matches!(tree.remove_child(ul, ids[1]), Err(DomError::NotAChild { .. })));
    }

    #[test]
    fn test_hierarchy_checks() {
        let mut tree = DomTree::new();
        let (ul, ids) = list(&mut tree, &["a"]);
        assert!(matches!(tree.append_child(ids[0], ul), Err(DomError::HierarchyRequest(_))));
        assert!(matches!(tree.append_child(ul, ul), Err(DomError::HierarchyRequest(_))));
        assert!(matches!(tree.append_child(ul, NodeId(999)), Err(DomError::NotFound(_))));
    }

    #[test]
    fn test_clear_counts_once() {
        let mut tree = DomTree::new();
        let (ul, _) = list(&mut tree, &["a", "b", "c"]);
        tree.reset_stats();
        let removed = tree.remove_all_children(ul).unwrap();
        assert_eq!(removed.len(), 3);
        assert_eq!(tree.child_count(ul), 0);
        assert_eq!(tree.stats().clears, 1);
        assert_eq!(tree.stats().structural(), 1);
    }

    #[test]
    fn test_outer_html() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div").unwrap();
        tree.set_class(div, "box").unwrap();
        tree.set_attribute(div, "title", "a<b").unwrap();
        tree.merge_style(div, [("color", "red")]).unwrap();
        let t = tree.create_text("hi");
        tree.append_child(div, t).unwrap();
        assert_eq!(
            tree.outer_html(div),
            "<div class=\"box\" title=\"a&lt;b\" style=\"color: red;\">hi</div>"
        );
    }
}
