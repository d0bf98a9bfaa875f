//! Reconciliation tests for fos-vdom
//!
//! First render, positional diffing, minimal writes and fault recovery,
//! checked against the fos-dom mutation counters.

use std::cell::Cell;
use std::rc::Rc;

use fos_dom::{Document, NodeId};
use fos_vdom::{Attrs, Child, ErrorCode, RenderConfig, Renderer, VNode, h, text};

fn setup() -> (Document, Renderer<Document>, NodeId) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let doc = Document::default();
    let renderer = Renderer::new(doc.clone());
    let body = doc.body().unwrap();
    (doc, renderer, body)
}

fn list(items: &[&str]) -> VNode {
    h(
        "ul",
        Attrs::new(),
        items.iter().map(|item| h("li", Attrs::new(), [*item])).collect::<Vec<_>>(),
    )
}

fn keyed_list(items: &[&str]) -> VNode {
    h(
        "ul",
        Attrs::new(),
        items
            .iter()
            .map(|item| h("li", Attrs::new().with("key", *item), [*item]))
            .collect::<Vec<_>>(),
    )
}

fn body_html(doc: &Document) -> String {
    doc.outer_html(doc.body().unwrap())
}

// ============================================================================
// FIRST RENDER
// ============================================================================

#[test]
fn test_first_render_round_trip() {
    let (doc, renderer, body) = setup();
    let view = h(
        "div",
        Attrs::new().with("className", "app"),
        vec![
            Child::from(h("h1", Attrs::new(), ["Title"])),
            Child::from(list(&["a", "b"])),
            Child::from(None::<VNode>),
            Child::from(h(
                "input",
                Attrs::new().with("type", "text").with("value", "x").with("disabled", true),
                Vec::<Child>::new(),
            )),
        ],
    );
    renderer.render_with_diff(body, &view, None).unwrap();
    assert_eq!(
        body_html(&doc),
        "<body><div class=\"app\"><h1>Title</h1><ul><li>a</li><li>b</li></ul>\
         <input disabled=\"\" type=\"text\" value=\"x\"></input></div></body>"
    );
}

#[test]
fn test_render_without_previous_replaces_container_content() {
    let (doc, renderer, body) = setup();
    {
        let mut tree = doc.tree_mut();
        let stale = tree.create_element("p").unwrap();
        tree.append_child(body, stale).unwrap();
    }
    renderer.render_with_diff(body, &text("fresh"), None).unwrap();
    assert_eq!(body_html(&doc), "<body>fresh</body>");
}

#[test]
fn test_style_and_numbers() {
    let (doc, renderer, body) = setup();
    let view = h(
        "span",
        Attrs::new().with("tabIndex", 3).style([("color", "red")]),
        [Child::from(1.0), Child::from(2.5)],
    );
    renderer.render_with_diff(body, &view, None).unwrap();
    assert_eq!(
        body_html(&doc),
        "<body><span tabindex=\"3\" style=\"color: red;\">12.5</span></body>"
    );
}

// ============================================================================
// MINIMAL WRITES
// ============================================================================

#[test]
fn test_identical_rerender_writes_nothing() {
    let (doc, renderer, body) = setup();
    let view = h(
        "section",
        Attrs::new().with("id", "main").with("class", "c").style([("margin", "0")]),
        vec![list(&["a", "b", "c"]), text("tail")],
    );
    renderer.render_with_diff(body, &view, None).unwrap();
    doc.reset_stats();

    renderer.render_with_diff(body, &view.clone(), Some(&view)).unwrap();
    let stats = doc.stats();
    assert_eq!(stats.structural(), 0);
    assert_eq!(stats.nodes_created, 0);
    assert_eq!(stats.text_writes, 0);
    assert_eq!(stats.attribute_writes, 0);
}

#[test]
fn test_single_leaf_change_is_one_text_write() {
    let (doc, renderer, body) = setup();
    let old = list(&["a", "b", "c"]);
    renderer.render_with_diff(body, &old, None).unwrap();
    doc.reset_stats();

    let new = list(&["a", "B", "c"]);
    renderer.render_with_diff(body, &new, Some(&old)).unwrap();
    let stats = doc.stats();
    assert_eq!(stats.text_writes, 1);
    assert_eq!(stats.structural(), 0);
    assert_eq!(stats.attribute_writes, 0);
    assert_eq!(body_html(&doc), "<body><ul><li>a</li><li>B</li><li>c</li></ul></body>");
}

#[test]
fn test_attribute_only_change() {
    let (doc, renderer, body) = setup();
    let old = h("a", Attrs::new().with("href", "/x").with("title", "t"), ["link"]);
    let new = h("a", Attrs::new().with("href", "/y"), ["link"]);
    renderer.render_with_diff(body, &old, None).unwrap();
    doc.reset_stats();

    renderer.render_with_diff(body, &new, Some(&old)).unwrap();
    assert_eq!(doc.stats().attribute_writes, 2);
    assert_eq!(doc.stats().structural(), 0);
    assert_eq!(body_html(&doc), "<body><a href=\"/y\">link</a></body>");
}

// ============================================================================
// POSITIONAL DIFF
// ============================================================================

#[test]
fn test_positional_prepend_scenario() {
    let (doc, renderer, body) = setup();
    let empty = list(&[]);
    let one = list(&["A"]);
    let two = list(&["B", "A"]);

    renderer.render_with_diff(body, &empty, None).unwrap();
    let ul = doc.query_selector_all(body, "ul").unwrap()[0];

    doc.reset_stats();
    renderer.render_with_diff(body, &one, Some(&empty)).unwrap();
    assert_eq!(body_html(&doc), "<body><ul><li>A</li></ul></body>");
    let stats = doc.stats();
    assert_eq!(stats.insertions, 1);
    assert_eq!(stats.structural(), 1);
    assert_eq!(doc.tree().child_count(ul), 1);

    doc.reset_stats();
    renderer.render_with_diff(body, &two, Some(&one)).unwrap();
    assert_eq!(body_html(&doc), "<body><ul><li>B</li><li>A</li></ul></body>");
    let stats = doc.stats();
    assert_eq!(stats.text_writes, 1);
    assert_eq!(stats.insertions, 2);
    assert_eq!(stats.replacements, 0);
}

#[test]
fn test_keys_signal_change_but_never_move() {
    let (doc, renderer, body) = setup();
    let old = keyed_list(&["a"]);
    let new = keyed_list(&["b", "a"]);
    renderer.render_with_diff(body, &old, None).unwrap();
    let first_li = doc.query_selector_all(body, "li").unwrap()[0];
    doc.reset_stats();

    renderer.render_with_diff(body, &new, Some(&old)).unwrap();
    assert_eq!(body_html(&doc), "<body><ul><li>b</li><li>a</li></ul></body>");
    assert_eq!(doc.stats().replacements, 1);
    assert_eq!(doc.stats().removals, 0);
    let lis = doc.query_selector_all(body, "li").unwrap();
    assert!(!lis.contains(&first_li));
}

#[test]
fn test_trailing_children_removed() {
    let (doc, renderer, body) = setup();
    let old = list(&["a", "b", "c"]);
    let new = list(&["a"]);
    renderer.render_with_diff(body, &old, None).unwrap();
    doc.reset_stats();

    renderer.render_with_diff(body, &new, Some(&old)).unwrap();
    assert_eq!(doc.stats().removals, 2);
    assert_eq!(doc.stats().clears, 0);
    assert_eq!(body_html(&doc), "<body><ul><li>a</li></ul></body>");
}

#[test]
fn test_empty_children_cleared_in_one_step() {
    let (doc, renderer, body) = setup();
    let old = list(&["a", "b", "c"]);
    let new = list(&[]);
    renderer.render_with_diff(body, &old, None).unwrap();
    doc.reset_stats();

    renderer.render_with_diff(body, &new, Some(&old)).unwrap();
    assert_eq!(doc.stats().clears, 1);
    assert_eq!(doc.stats().removals, 0);
    assert_eq!(body_html(&doc), "<body><ul></ul></body>");
}

#[test]
fn test_text_and_element_swap() {
    let (doc, renderer, body) = setup();
    let old = h("p", Attrs::new(), vec![text("plain")]);
    let new = h("p", Attrs::new(), vec![h("em", Attrs::new(), ["loud"])]);
    renderer.render_with_diff(body, &old, None).unwrap();
    doc.reset_stats();

    renderer.render_with_diff(body, &new, Some(&old)).unwrap();
    assert_eq!(doc.stats().replacements, 1);
    assert_eq!(body_html(&doc), "<body><p><em>loud</em></p></body>");

    renderer.render_with_diff(body, &old, Some(&new)).unwrap();
    assert_eq!(body_html(&doc), "<body><p>plain</p></body>");
}

#[test]
fn test_patch_inserts_and_removes_at_index() {
    let (doc, renderer, body) = setup();
    renderer.render_with_diff(body, &list(&["a", "c"]), None).unwrap();
    let ul = doc.query_selector_all(body, "ul").unwrap()[0];

    let b = h("li", Attrs::new(), ["b"]);
    renderer.patch(ul, Some(&b), None, 1).unwrap();
    assert_eq!(doc.outer_html(ul), "<ul><li>a</li><li>b</li><li>c</li></ul>");

    renderer.patch(ul, None, Some(&b), 0).unwrap();
    assert_eq!(doc.outer_html(ul), "<ul><li>b</li><li>c</li></ul>");

    renderer.patch(ul, Some(&b), None, 9).unwrap();
    assert_eq!(doc.outer_html(ul), "<ul><li>b</li><li>c</li><li>b</li></ul>");

    doc.reset_stats();
    renderer.patch(ul, None, None, 0).unwrap();
    renderer.patch(ul, Some(&VNode::Empty), Some(&VNode::Empty), 0).unwrap();
    assert_eq!(doc.stats().structural(), 0);
}

#[test]
fn test_patch_children_directly() {
    let (doc, renderer, body) = setup();
    let old = vec![text("x"), VNode::Empty, text("y")];
    let new = vec![text("x"), text("z"), text("w")];
    renderer.patch_children(body, &old, &[]).unwrap();
    assert_eq!(body_html(&doc), "<body>xy</body>");

    renderer.patch_children(body, &new, &old).unwrap();
    assert_eq!(body_html(&doc), "<body>xzw</body>");
}

// ============================================================================
// FAULT RECOVERY
// ============================================================================

fn corrupt_first_text(doc: &Document, parent: NodeId) {
    let mut tree = doc.tree_mut();
    let old = tree.child_at(parent, 0).unwrap();
    let intruder = tree.create_element("em").unwrap();
    tree.replace_child(parent, intruder, old).unwrap();
}

#[test]
fn test_diff_fault_rebuilds_children() {
    let (doc, renderer, body) = setup();
    let old = h("div", Attrs::new(), vec![h("p", Attrs::new(), ["hello"]), text("after")]);
    let new = h("div", Attrs::new(), vec![h("p", Attrs::new(), ["world"]), text("after")]);
    renderer.render_with_diff(body, &old, None).unwrap();
    let p = doc.query_selector_all(body, "p").unwrap()[0];
    corrupt_first_text(&doc, p);
    doc.reset_stats();

    renderer.render_with_diff(body, &new, Some(&old)).unwrap();
    assert_eq!(doc.stats().clears, 1);
    assert_eq!(body_html(&doc), "<body><div><p>world</p>after</div></body>");
}

#[test]
fn test_diff_fault_propagates_when_rebuild_disabled() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let doc = Document::default();
    let config = RenderConfig {
        rebuild_on_diff_error: false,
        ..RenderConfig::default()
    };
    let renderer = Renderer::with_config(doc.clone(), config);
    let body = doc.body().unwrap();
    let old = h("p", Attrs::new(), ["hello"]);
    let new = h("p", Attrs::new(), ["world"]);
    renderer.render_with_diff(body, &old, None).unwrap();
    let p = doc.query_selector_all(body, "p").unwrap()[0];
    corrupt_first_text(&doc, p);

    let err = renderer.render_with_diff(body, &new, Some(&old)).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidTarget);
    assert_eq!(err.module, "dom");
}

#[test]
fn test_materialize_error_propagates() {
    let (_doc, renderer, body) = setup();
    let bad = h("div", Attrs::new(), vec![h("", Attrs::new(), Vec::<Child>::new())]);
    let err = renderer.render_with_diff(body, &bad, None).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidTag);
}

#[test]
fn test_failed_materialize_releases_handlers() {
    let (doc, renderer, body) = setup();
    let bad = h(
        "div",
        Attrs::new().on("onClick", |_| {}),
        vec![
            h("span", Attrs::new().on("onKeyDown", |_| {}), ["ok"]),
            h("", Attrs::new(), Vec::<Child>::new()),
        ],
    );
    for _ in 0..3 {
        let err = renderer.render_with_diff(body, &bad, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTag);
    }
    assert!(renderer.registry().is_empty());
    assert_eq!(renderer.bound_node_count(), 0);
    assert_eq!(doc.total_listeners(), 0);
    assert_eq!(doc.tree().child_count(body), 0);
}

// ============================================================================
// HANDLER LIFETIME
// ============================================================================

#[test]
fn test_bindings_released_with_removed_nodes() {
    let (doc, renderer, body) = setup();
    let clicks = Rc::new(Cell::new(0));
    let counter = clicks.clone();
    let with_button = h(
        "div",
        Attrs::new(),
        vec![
            h("button", Attrs::new().on("onClick", move |_| counter.set(counter.get() + 1)), ["go"]),
            text("label"),
        ],
    );
    let without_button = h("div", Attrs::new(), vec![text("label")]);

    renderer.render_with_diff(body, &with_button, None).unwrap();
    assert_eq!(renderer.registry().len(), 1);
    assert_eq!(renderer.bound_node_count(), 1);
    let button = doc.query_selector_all(body, "button").unwrap()[0];
    doc.dispatch_event(button, "click");
    assert_eq!(clicks.get(), 1);

    renderer.render_with_diff(body, &without_button, Some(&with_button)).unwrap();
    assert!(renderer.registry().is_empty());
    assert_eq!(renderer.bound_node_count(), 0);
    assert_eq!(doc.listener_count(button, "click"), 0);
    doc.dispatch_event(button, "click");
    assert_eq!(clicks.get(), 1);
}

#[test]
fn test_clearing_container_releases_bindings() {
    let (_doc, renderer, body) = setup();
    let view = list(&["a"]);
    let handlers = h(
        "ul",
        Attrs::new(),
        vec![
            h("li", Attrs::new().on("onClick", |_| {}), ["a"]),
            h("li", Attrs::new().on("onKeyDown", |_| {}), ["b"]),
        ],
    );
    renderer.render_with_diff(body, &handlers, None).unwrap();
    assert_eq!(renderer.registry().len(), 2);

    renderer.render_with_diff(body, &view, None).unwrap();
    assert!(renderer.registry().is_empty());
}

// ============================================================================
// MUTATION QUEUE
// ============================================================================

#[test]
fn test_render_loop_leaves_no_queued_records() {
    let (doc, renderer, body) = setup();
    let view = |i: i32| h("p", Attrs::new().with("title", format!("t{i}")), [i]);

    let mut previous = view(0);
    renderer.render_with_diff(body, &previous, None).unwrap();
    assert_eq!(doc.pending_records(), 0);
    for i in 1..200 {
        let next = view(i);
        renderer.render_with_diff(body, &next, Some(&previous)).unwrap();
        assert_eq!(doc.pending_records(), 0);
        previous = next;
    }
    assert_eq!(body_html(&doc), "<body><p title=\"t199\">199</p></body>");
}

#[test]
fn test_failed_render_still_flushes() {
    let (doc, renderer, body) = setup();
    renderer.render_with_diff(body, &list(&["a", "b"]), None).unwrap();
    let bad = h("div", Attrs::new(), vec![h("", Attrs::new(), Vec::<Child>::new())]);
    assert!(renderer.render_with_diff(body, &bad, None).is_err());
    assert_eq!(doc.pending_records(), 0);
}
