//! Comprehensive tests for fos-dom
//!
//! Tree mutation, selector queries, event dispatch and mutation observers
//! exercised through the `Document` handle.

use std::cell::RefCell;
use std::rc::Rc;

use fos_dom::{Document, DomError, GlobalTarget, MutationRecord, MutationType, NodeId};

fn list_document(items: &[&str]) -> (Document, NodeId, Vec<NodeId>) {
    let doc = Document::new("about:blank");
    let body = doc.body().unwrap();
    let mut tree = doc.tree_mut();
    let ul = tree.create_element("ul").unwrap();
    tree.append_child(body, ul).unwrap();
    let lis = items
        .iter()
        .map(|text| {
            let li = tree.create_element("li").unwrap();
            tree.set_class(li, "item").unwrap();
            let t = tree.create_text(text);
            tree.append_child(li, t).unwrap();
            tree.append_child(ul, li).unwrap();
            li
        })
        .collect();
    drop(tree);
    (doc, ul, lis)
}

// ============================================================================
// TREE AND QUERIES
// ============================================================================

#[test]
fn test_query_selector_all_document_order() {
    let (doc, ul, lis) = list_document(&["a", "b", "c"]);
    let body = doc.body().unwrap();
    assert_eq!(doc.query_selector_all(body, "ul > li.item").unwrap(), lis);
    assert_eq!(doc.query_selector_all(body, "ul").unwrap(), vec![ul]);
    assert!(doc.query_selector_all(body, ".missing").unwrap().is_empty());
    assert!(matches!(doc.query_selector_all(body, "li["), Err(DomError::Syntax { .. })));
}

#[test]
fn test_matches_and_get_element_by_id() {
    let (doc, _, lis) = list_document(&["a", "b"]);
    doc.tree_mut().set_attribute(lis[1], "id", "second").unwrap();
    assert_eq!(doc.get_element_by_id("second"), Some(lis[1]));
    assert!(doc.matches(lis[1], "#second").unwrap());
    assert!(!doc.matches(lis[0], "#second").unwrap());
}

#[test]
fn test_outer_html_round_trip() {
    let (doc, ul, _) = list_document(&["a", "b"]);
    assert_eq!(
        doc.outer_html(ul),
        "<ul><li class=\"item\">a</li><li class=\"item\">b</li></ul>"
    );
}

#[test]
fn test_stats_track_each_write_kind() {
    let (doc, ul, lis) = list_document(&["a"]);
    doc.reset_stats();
    {
        let mut tree = doc.tree_mut();
        let text = tree.get(lis[0]).unwrap().first_child;
        tree.set_text(text, "z").unwrap();
        tree.set_attribute(ul, "title", "list").unwrap();
        tree.remove_child(ul, lis[0]).unwrap();
    }
    let stats = doc.stats();
    assert_eq!(stats.text_writes, 1);
    assert_eq!(stats.attribute_writes, 1);
    assert_eq!(stats.removals, 1);
    assert_eq!(stats.structural(), 1);
}

// ============================================================================
// EVENTS
// ============================================================================

#[test]
fn test_dispatch_bubbles_through_ancestors() {
    let (doc, ul, lis) = list_document(&["a"]);
    let log = Rc::new(RefCell::new(Vec::new()));

    let l = log.clone();
    doc.add_event_listener(lis[0], "click", Rc::new(move |e| l.borrow_mut().push(("li", e.current_target))));
    let l = log.clone();
    doc.add_event_listener(ul, "click", Rc::new(move |e| l.borrow_mut().push(("ul", e.current_target))));
    let l = log.clone();
    doc.add_global_listener(GlobalTarget::Window, "click", Rc::new(move |e| l.borrow_mut().push(("window", e.current_target))));

    let invoked = doc.dispatch_event(lis[0], "click");
    assert_eq!(invoked, 3);
    assert_eq!(
        *log.borrow(),
        vec![("li", Some(lis[0])), ("ul", Some(ul)), ("window", None)]
    );
}

#[test]
fn test_stop_propagation_halts_bubbling() {
    let (doc, ul, lis) = list_document(&["a"]);
    let hits = Rc::new(RefCell::new(0));
    doc.add_event_listener(lis[0], "click", Rc::new(|e| e.stop_propagation()));
    let h = hits.clone();
    doc.add_event_listener(ul, "click", Rc::new(move |_| *h.borrow_mut() += 1));

    assert_eq!(doc.dispatch_event(lis[0], "click"), 1);
    assert_eq!(*hits.borrow(), 0);
}

#[test]
fn test_listener_may_mutate_document() {
    let (doc, ul, lis) = list_document(&["a"]);
    let handle = doc.clone();
    doc.add_event_listener(
        lis[0],
        "click",
        Rc::new(move |_| {
            let mut tree = handle.tree_mut();
            let li = tree.create_element("li").unwrap();
            tree.append_child(ul, li).unwrap();
        }),
    );
    doc.dispatch_event(lis[0], "click");
    assert_eq!(doc.tree().child_count(ul), 2);
}

#[test]
fn test_remove_listener() {
    let (doc, _, lis) = list_document(&["a"]);
    let id = doc.add_event_listener(lis[0], "click", Rc::new(|_| {}));
    assert_eq!(doc.listener_count(lis[0], "click"), 1);
    assert!(doc.remove_event_listener(id));
    assert!(!doc.remove_event_listener(id));
    assert_eq!(doc.dispatch_event(lis[0], "click"), 0);
}

#[test]
fn test_dispatch_global() {
    let doc = Document::default();
    let hits = Rc::new(RefCell::new(0));
    let h = hits.clone();
    doc.add_global_listener(GlobalTarget::Window, "resize", Rc::new(move |_| *h.borrow_mut() += 1));
    assert_eq!(doc.dispatch_global(GlobalTarget::Window, "resize"), 1);
    assert_eq!(doc.dispatch_global(GlobalTarget::Document, "resize"), 0);
    assert_eq!(*hits.borrow(), 1);
}

// ============================================================================
// MUTATION OBSERVERS
// ============================================================================

#[test]
fn test_observer_receives_batched_insertions() {
    let (doc, ul, _) = list_document(&[]);
    let batches: Rc<RefCell<Vec<Vec<MutationRecord>>>> = Rc::default();
    let sink = batches.clone();
    doc.observe(ul, Rc::new(move |records| sink.borrow_mut().push(records.to_vec())));

    let (a, b) = {
        let mut tree = doc.tree_mut();
        let a = tree.create_element("li").unwrap();
        let b = tree.create_element("li").unwrap();
        tree.append_child(ul, a).unwrap();
        tree.append_child(ul, b).unwrap();
        (a, b)
    };
    assert!(batches.borrow().is_empty(), "delivery waits for a flush");
    assert_eq!(doc.flush_mutations(), 2);

    let batches = batches.borrow();
    assert_eq!(batches.len(), 1);
    let added: Vec<NodeId> = batches[0].iter().flat_map(|r| r.added_nodes.clone()).collect();
    assert_eq!(added, vec![a, b]);
    assert!(batches[0].iter().all(|r| r.mutation_type == MutationType::ChildList));
}

#[test]
fn test_observer_scoped_to_subtree() {
    let (doc, ul, _) = list_document(&[]);
    let count = Rc::new(RefCell::new(0));
    let c = count.clone();
    doc.observe(ul, Rc::new(move |records| *c.borrow_mut() += records.len()));

    let body = doc.body().unwrap();
    {
        let mut tree = doc.tree_mut();
        let outside = tree.create_element("p").unwrap();
        tree.append_child(body, outside).unwrap();
    }
    doc.flush_mutations();
    assert_eq!(*count.borrow(), 0);
}

#[test]
fn test_dispatch_flushes_pending_records() {
    let (doc, ul, lis) = list_document(&["a"]);
    let flushed = Rc::new(RefCell::new(false));
    let f = flushed.clone();
    doc.observe(ul, Rc::new(move |_| *f.borrow_mut() = true));
    doc.tree_mut().set_attribute(ul, "title", "x").unwrap();
    doc.dispatch_event(lis[0], "click");
    assert!(*flushed.borrow());
}

#[test]
fn test_disconnect_stops_delivery() {
    let (doc, ul, _) = list_document(&[]);
    let count = Rc::new(RefCell::new(0));
    let c = count.clone();
    let id = doc.observe(ul, Rc::new(move |_| *c.borrow_mut() += 1));
    assert!(doc.disconnect(id));
    {
        let mut tree = doc.tree_mut();
        let li = tree.create_element("li").unwrap();
        tree.append_child(ul, li).unwrap();
    }
    assert_eq!(doc.flush_mutations(), 0);
    assert_eq!(*count.borrow(), 0);
}
