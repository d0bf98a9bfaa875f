//! `NativeTree` binding for the fOS DOM

use std::rc::Rc;

use fos_dom::{Document, DomEvent, GlobalTarget, ListenerId, MutationRecord, NodeId, ObserverId};

use crate::adapter::{GlobalScope, GrowthBatch, GrowthCallback, NativeEvent, NativeListener, NativeTree, PropValue};
use crate::error::VdomResult;
use crate::vnode::StyleMap;

fn forward(listener: NativeListener) -> fos_dom::EventListener {
    Rc::new(move |event: &DomEvent| {
        listener(&NativeEvent {
            event_type: event.event_type.clone(),
            target: event.target.is_valid().then(|| u64::from(event.target.index())),
        })
    })
}

impl NativeTree for Document {
    type Node = NodeId;
    type ListenerId = ListenerId;
    type Subscription = ObserverId;

    fn create_element(&self, tag: &str) -> VdomResult<NodeId> {
        Ok(self.tree_mut().create_element(tag)?)
    }

    fn create_text(&self, content: &str) -> NodeId {
        self.tree_mut().create_text(content)
    }

    fn set_text(&self, node: NodeId, content: &str) -> VdomResult<()> {
        Ok(self.tree_mut().set_text(node, content)?)
    }

    fn has_property(&self, node: NodeId, name: &str) -> bool {
        self.tree().get(node).is_some_and(|n| n.is_element()) && fos_dom::ElementData::has_property(name)
    }

    fn set_property(&self, node: NodeId, name: &str, value: &PropValue) -> VdomResult<()> {
        let value = match value {
            PropValue::Str(s) => fos_dom::PropValue::Str(s.clone()),
            PropValue::Num(n) => fos_dom::PropValue::Num(*n),
            PropValue::Bool(b) => fos_dom::PropValue::Bool(*b),
        };
        Ok(self.tree_mut().set_property(node, name, &value)?)
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> VdomResult<()> {
        Ok(self.tree_mut().set_attribute(node, name, value)?)
    }

    fn remove_attribute(&self, node: NodeId, name: &str) -> VdomResult<()> {
        Ok(self.tree_mut().remove_attribute(node, name)?)
    }

    fn set_class(&self, node: NodeId, class: &str) -> VdomResult<()> {
        Ok(self.tree_mut().set_class(node, class)?)
    }

    fn merge_style(&self, node: NodeId, style: &StyleMap) -> VdomResult<()> {
        Ok(self
            .tree_mut()
            .merge_style(node, style.iter().map(|(k, v)| (k.as_str(), v.as_str())))?)
    }

    fn child_count(&self, parent: NodeId) -> usize {
        self.tree().child_count(parent)
    }

    fn child_at(&self, parent: NodeId, index: usize) -> Option<NodeId> {
        self.tree().child_at(parent, index)
    }

    fn children(&self, parent: NodeId) -> Vec<NodeId> {
        self.tree().child_ids(parent)
    }

    fn append_child(&self, parent: NodeId, child: NodeId) -> VdomResult<()> {
        Ok(self.tree_mut().append_child(parent, child)?)
    }

    fn insert_before(&self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> VdomResult<()> {
        Ok(self.tree_mut().insert_before(parent, child, reference)?)
    }

    fn remove_child(&self, parent: NodeId, child: NodeId) -> VdomResult<()> {
        Ok(self.tree_mut().remove_child(parent, child)?)
    }

    fn replace_child(&self, parent: NodeId, new: NodeId, old: NodeId) -> VdomResult<()> {
        Ok(self.tree_mut().replace_child(parent, new, old)?)
    }

    fn clear_children(&self, parent: NodeId) -> VdomResult<()> {
        self.tree_mut().remove_all_children(parent)?;
        Ok(())
    }

    fn is_attached(&self, root: NodeId, node: NodeId) -> bool {
        self.tree().is_inclusive_ancestor(root, node)
    }

    fn query_selector_all(&self, root: NodeId, selector: &str) -> VdomResult<Vec<NodeId>> {
        Ok(Document::query_selector_all(self, root, selector)?)
    }

    fn matches(&self, node: NodeId, selector: &str) -> bool {
        Document::matches(self, node, selector).unwrap_or(false)
    }

    fn add_listener(&self, node: NodeId, event_type: &str, listener: NativeListener) -> ListenerId {
        self.add_event_listener(node, event_type, forward(listener))
    }

    fn add_global_listener(&self, scope: GlobalScope, event_type: &str, listener: NativeListener) -> ListenerId {
        let target = match scope {
            GlobalScope::Window => GlobalTarget::Window,
            GlobalScope::Document => GlobalTarget::Document,
        };
        Document::add_global_listener(self, target, event_type, forward(listener))
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.remove_event_listener(id)
    }

    fn observation_root(&self) -> Option<NodeId> {
        self.body()
    }

    fn on_root_ready(&self, callback: Box<dyn FnOnce(NodeId)>) {
        self.on_body_ready(callback);
    }

    fn subscribe_growth(&self, root: NodeId, callback: GrowthCallback<NodeId>) -> ObserverId {
        let doc = self.clone();
        self.observe(
            root,
            Rc::new(move |records: &[MutationRecord]| {
                let mut batch = GrowthBatch {
                    inserted: Vec::new(),
                    removed: Vec::new(),
                };
                {
                    let tree = doc.tree();
                    for record in records {
                        batch.inserted.extend_from_slice(&record.added_nodes);
                        for &node in &record.removed_nodes {
                            batch.removed.push(node);
                            batch.removed.extend(tree.descendants(node));
                        }
                    }
                }
                if !batch.inserted.is_empty() || !batch.removed.is_empty() {
                    callback(&batch);
                }
            }),
        )
    }

    fn unsubscribe(&self, subscription: ObserverId) -> bool {
        self.disconnect(subscription)
    }

    fn flush(&self) {
        self.flush_mutations();
    }

    fn node_key(&self, node: NodeId) -> u64 {
        u64::from(node.index())
    }
}
