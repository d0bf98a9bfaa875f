//! Element Materializer

use crate::adapter::NativeTree;
use crate::error::{ErrorCode, VdomError, VdomResult};
use crate::renderer::Renderer;
use crate::vnode::{Attrs, VElement, VNode};

impl<A: NativeTree> Renderer<A> {
    /// Build native nodes for a virtual subtree.
    ///
    /// Returns `None` for [`VNode::Empty`]. Attributes go through
    /// [`Renderer::update_attributes`] against an empty prior set, so
    /// handlers are bound exactly as they are on update. When any part of
    /// the subtree fails, handlers bound inside it are released before the
    /// error is returned.
    pub fn materialize(&self, vnode: &VNode) -> VdomResult<Option<A::Node>> {
        match vnode {
            VNode::Empty => Ok(None),
            VNode::Text(content) => Ok(Some(self.tree.create_text(content))),
            VNode::Element(el) => {
                if el.tag.trim().is_empty() {
                    return Err(VdomError::new("materialize", ErrorCode::InvalidTag, "element tag is empty"));
                }
                let node = self
                    .tree
                    .create_element(&el.tag)
                    .map_err(|err| err.with("tag", &el.tag))?;
                if let Err(err) = self.fill_element(node, el) {
                    self.release(node);
                    return Err(err);
                }
                Ok(Some(node))
            }
        }
    }

    fn fill_element(&self, node: A::Node, el: &VElement) -> VdomResult<()> {
        self.update_attributes(node, &el.attrs, &Attrs::new())?;
        for child in &el.children {
            if let Some(native) = self.materialize(child)? {
                self.tree.append_child(node, native)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vnode::{Child, h};
    use fos_dom::Document;

    #[test]
    fn test_materialize_nested() {
        let renderer = Renderer::new(Document::default());
        let vnode = h(
            "ul",
            Attrs::new().with("class", "list"),
            vec![
                h("li", Attrs::new(), ["one"]),
                h("li", Attrs::new().with("title", "second"), [2]),
            ],
        );
        let node = renderer.materialize(&vnode).unwrap().unwrap();
        assert_eq!(
            renderer.tree().outer_html(node),
            r#"<ul class="list"><li>one</li><li title="second">2</li></ul>"#
        );
    }

    #[test]
    fn test_empty_materializes_to_nothing() {
        let renderer = Renderer::new(Document::default());
        assert_eq!(renderer.materialize(&VNode::Empty).unwrap(), None);
    }

    #[test]
    fn test_missing_tag_is_capability_error() {
        let renderer = Renderer::new(Document::default());
        let err = renderer.materialize(&h("", Attrs::new(), Vec::<Child>::new())).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTag);
        assert_eq!(err.module, "materialize");
    }

    #[test]
    fn test_malformed_tag_is_capability_error() {
        let renderer = Renderer::new(Document::default());
        let err = renderer.materialize(&h("a b", Attrs::new(), Vec::<Child>::new())).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTag);
        assert_eq!(err.meta("tag"), Some("a b"));
    }
}
