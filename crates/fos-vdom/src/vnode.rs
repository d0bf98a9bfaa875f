//! Virtual Node Model
//!
//! Immutable description of desired UI. Child input of any shape is
//! normalized once, in [`h`], into the tagged [`VNode`] union; everything
//! downstream matches on it exhaustively.

use std::collections::BTreeMap;

use crate::event::{Callback, DelegatedEvent};

/// Style property mapping
pub type StyleMap = BTreeMap<String, String>;

/// Print a number the way a scripting host does (`1`, `2.5`)
pub(crate) fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Style(StyleMap),
    Handler(Callback),
}

impl AttrValue {
    /// String form written to a native attribute
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => format_number(*n),
            Self::Bool(b) => b.to_string(),
            Self::Style(map) => map
                .iter()
                .map(|(k, v)| format!("{k}: {v};"))
                .collect::<Vec<_>>()
                .join(" "),
            Self::Handler(_) => String::new(),
        }
    }

    pub fn as_handler(&self) -> Option<&Callback> {
        match self {
            Self::Handler(cb) => Some(cb),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for AttrValue {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<StyleMap> for AttrValue {
    fn from(map: StyleMap) -> Self {
        Self::Style(map)
    }
}

impl From<Callback> for AttrValue {
    fn from(cb: Callback) -> Self {
        Self::Handler(cb)
    }
}

/// Ordered attribute map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attrs(BTreeMap<String, AttrValue>);

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add or replace an attribute
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Builder: add an `on*` handler
    pub fn on(self, key: impl Into<String>, f: impl Fn(&DelegatedEvent) + 'static) -> Self {
        self.with(key, Callback::new(f))
    }

    /// Builder: add a style mapping
    pub fn style<'a>(self, props: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let map: StyleMap = props.into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        self.with("style", map)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Option<AttrValue> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Sibling identity token
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key(String);

impl Key {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_value(value: &AttrValue) -> Option<Self> {
        match value {
            AttrValue::Text(s) => Some(Self(s.clone())),
            AttrValue::Number(n) => Some(Self(format_number(*n))),
            AttrValue::Bool(b) => Some(Self(b.to_string())),
            AttrValue::Style(_) | AttrValue::Handler(_) => None,
        }
    }
}

/// Element description
#[derive(Debug, Clone, PartialEq)]
pub struct VElement {
    pub tag: String,
    pub attrs: Attrs,
    pub children: Vec<VNode>,
    pub key: Option<Key>,
}

/// Virtual node
#[derive(Debug, Clone, PartialEq)]
pub enum VNode {
    Element(VElement),
    Text(String),
    /// Renders nothing
    Empty,
}

impl VNode {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Element(el) => Some(&el.tag),
            _ => None,
        }
    }

    pub fn key(&self) -> Option<&Key> {
        match self {
            Self::Element(el) => el.key.as_ref(),
            _ => None,
        }
    }

    pub fn as_element(&self) -> Option<&VElement> {
        match self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Children, empty for text
    pub fn children(&self) -> &[VNode] {
        match self {
            Self::Element(el) => &el.children,
            _ => &[],
        }
    }
}

/// Child input accepted by [`h`]
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    Node(VNode),
    Text(String),
    Number(f64),
    /// Dropped; supports `cond && child` style conditionals
    Bool(bool),
    /// Dropped
    Null,
    /// Flattened in place
    List(Vec<Child>),
}

impl From<VNode> for Child {
    fn from(node: VNode) -> Self {
        Self::Node(node)
    }
}

impl From<&str> for Child {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Child {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for Child {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Child {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<usize> for Child {
    fn from(n: usize) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for Child {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl<T: Into<Child>> From<Option<T>> for Child {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Child>> From<Vec<T>> for Child {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

/// Flatten child input into canonical nodes, dropping empties
pub fn normalize_children(children: impl IntoIterator<Item = Child>) -> Vec<VNode> {
    let mut out = Vec::new();
    for child in children {
        push_child(&mut out, child);
    }
    out
}

fn push_child(out: &mut Vec<VNode>, child: Child) {
    match child {
        Child::Node(VNode::Empty) | Child::Bool(_) | Child::Null => {}
        Child::Node(node) => out.push(node),
        Child::Text(s) => out.push(VNode::Text(s)),
        Child::Number(n) => out.push(VNode::Text(format_number(n))),
        Child::List(items) => {
            for item in items {
                push_child(out, item);
            }
        }
    }
}

/// Build an element node. `attrs.key`, if present, becomes the node key.
pub fn h<C: Into<Child>>(tag: impl Into<String>, mut attrs: Attrs, children: impl IntoIterator<Item = C>) -> VNode {
    let key = attrs.remove("key").as_ref().and_then(Key::from_value);
    VNode::Element(VElement {
        tag: tag.into(),
        attrs,
        children: normalize_children(children.into_iter().map(Into::into)),
        key,
    })
}

/// Build a text node
pub fn text(value: impl Into<Child>) -> VNode {
    match value.into() {
        Child::Text(s) => VNode::Text(s),
        Child::Number(n) => VNode::Text(format_number(n)),
        Child::Node(node) => node,
        Child::Bool(_) | Child::Null | Child::List(_) => VNode::Empty,
    }
}
