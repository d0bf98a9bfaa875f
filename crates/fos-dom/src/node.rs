//! DOM Node - Compact representation
//!
//! Nodes live in the tree arena and link to each other by `NodeId`:
//! - parent / first child / last child for O(1) append
//! - prev / next sibling for O(1) insert and unlink

use std::collections::BTreeMap;

use crate::{NamedNodeMap, NodeId};

/// Properties reflected to an attribute: (property name, attribute name)
const REFLECTED_PROPERTIES: &[(&str, &str)] = &[
    ("id", "id"),
    ("title", "title"),
    ("value", "value"),
    ("name", "name"),
    ("type", "type"),
    ("href", "href"),
    ("src", "src"),
    ("alt", "alt"),
    ("placeholder", "placeholder"),
    ("tabIndex", "tabindex"),
    ("htmlFor", "for"),
    ("lang", "lang"),
    ("dir", "dir"),
];

/// Boolean properties, present-or-absent attributes
const BOOLEAN_PROPERTIES: &[(&str, &str)] = &[
    ("checked", "checked"),
    ("disabled", "disabled"),
    ("selected", "selected"),
    ("hidden", "hidden"),
    ("readOnly", "readonly"),
    ("required", "required"),
    ("multiple", "multiple"),
    ("autofocus", "autofocus"),
    ("open", "open"),
];

/// DOM Node - Core structure
#[derive(Debug)]
pub struct Node {
    /// Parent node (NONE if detached or root)
    pub parent: NodeId,
    /// First child
    pub first_child: NodeId,
    /// Last child (for O(1) append)
    pub last_child: NodeId,
    /// Previous sibling
    pub prev_sibling: NodeId,
    /// Next sibling
    pub next_sibling: NodeId,
    /// Node-specific data
    pub data: NodeData,
}

impl Node {
    fn with_data(data: NodeData) -> Self {
        Self {
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
            data,
        }
    }

    /// Create a new element node
    pub fn element(tag: &str) -> Self {
        Self::with_data(NodeData::Element(ElementData::new(tag)))
    }

    /// Create a new text node
    pub fn text(content: String) -> Self {
        Self::with_data(NodeData::Text(TextData { content }))
    }

    /// Create a document node
    pub fn document() -> Self {
        Self::with_data(NodeData::Document)
    }

    /// Check if this is an element
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    /// Check if this is text
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    /// Whether this node may hold children
    #[inline]
    pub fn is_container(&self) -> bool {
        matches!(self.data, NodeData::Element(_) | NodeData::Document)
    }

    /// Get element data if this is an element
    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get mutable element data
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get text content if this is a text node
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(&t.content),
            _ => None,
        }
    }
}

/// Node-specific data
#[derive(Debug)]
pub enum NodeData {
    /// Document root
    Document,
    /// Element
    Element(ElementData),
    /// Text content
    Text(TextData),
}

/// Value written through an element property
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Str(String),
    Num(f64),
    Bool(bool),
}

impl PropValue {
    /// Attribute form of the value
    pub fn to_attr_value(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::Num(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Self::Num(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

/// Element-specific data
#[derive(Debug, Default)]
pub struct ElementData {
    /// Tag name, lowercase
    pub tag: String,
    /// Attributes other than class and style
    pub attrs: NamedNodeMap,
    /// Class field
    pub class_name: String,
    /// Inline style properties
    pub style: BTreeMap<String, String>,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    /// Get an attribute value; `class` and `style` read their dedicated fields
    pub fn get_attr(&self, name: &str) -> Option<String> {
        match name {
            "class" => (!self.class_name.is_empty()).then(|| self.class_name.clone()),
            "style" => (!self.style.is_empty()).then(|| self.style_text()),
            _ => self.attrs.get_attribute(name).map(str::to_string),
        }
    }

    /// Set an attribute; `class` and `style` are routed to their fields
    pub fn set_attr(&mut self, name: &str, value: &str) {
        match name {
            "class" => self.class_name = value.to_string(),
            "style" => {
                self.style.clear();
                for decl in value.split(';') {
                    if let Some((prop, val)) = decl.split_once(':') {
                        let prop = prop.trim();
                        if !prop.is_empty() {
                            self.style.insert(prop.to_string(), val.trim().to_string());
                        }
                    }
                }
            }
            _ => {
                self.attrs.set_attribute(name, value);
            }
        }
    }

    /// Remove an attribute; returns whether anything was present
    pub fn remove_attr(&mut self, name: &str) -> bool {
        match name {
            "class" => !std::mem::take(&mut self.class_name).is_empty(),
            "style" => !std::mem::take(&mut self.style).is_empty(),
            _ => self.attrs.remove_named_item(name).is_some(),
        }
    }

    /// Check for a class in the whitespace-separated class field
    pub fn has_class(&self, class: &str) -> bool {
        self.class_name.split_whitespace().any(|c| c == class)
    }

    /// Whether `name` is a settable property on this element
    pub fn has_property(name: &str) -> bool {
        Self::property_attr(name).is_some()
    }

    /// Assign a property, reflecting it to its attribute
    pub fn set_property(&mut self, name: &str, value: &PropValue) -> bool {
        match Self::property_attr(name) {
            Some((attr, true)) => {
                let on = match value {
                    PropValue::Bool(b) => *b,
                    PropValue::Num(n) => *n != 0.0,
                    PropValue::Str(s) => !s.is_empty(),
                };
                self.attrs.toggle_attribute(attr, Some(on));
                true
            }
            Some((attr, false)) => {
                self.attrs.set_attribute(attr, &value.to_attr_value());
                true
            }
            None => false,
        }
    }

    /// Read a property back
    pub fn get_property(&self, name: &str) -> Option<PropValue> {
        match Self::property_attr(name)? {
            (attr, true) => Some(PropValue::Bool(self.attrs.has_attribute(attr))),
            (attr, false) => self.attrs.get_attribute(attr).map(|v| PropValue::Str(v.to_string())),
        }
    }

    /// Serialized inline style
    pub fn style_text(&self) -> String {
        self.style
            .iter()
            .map(|(k, v)| format!("{k}: {v};"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn property_attr(name: &str) -> Option<(&'static str, bool)> {
        if let Some(&(_, attr)) = BOOLEAN_PROPERTIES.iter().find(|(prop, _)| *prop == name) {
            return Some((attr, true));
        }
        REFLECTED_PROPERTIES
            .iter()
            .find(|(prop, _)| *prop == name)
            .map(|&(_, attr)| (attr, false))
    }
}

/// Text node data
#[derive(Debug)]
pub struct TextData {
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean_property_reflects_presence() {
        let mut el = ElementData::new("INPUT");
        assert_eq!(el.tag, "input");
        assert!(el.set_property("checked", &PropValue::Bool(true)));
        assert_eq!(el.get_attr("checked").as_deref(), Some(""));
        el.set_property("checked", &PropValue::Bool(false));
        assert_eq!(el.get_attr("checked"), None);
        assert_eq!(el.get_property("checked"), Some(PropValue::Bool(false)));
    }

    #[test]
    fn test_reflected_property_renames_attribute() {
        let mut el = ElementData::new("label");
        el.set_property("htmlFor", &PropValue::Str("email".into()));
        el.set_property("tabIndex", &PropValue::Num(3.0));
        assert_eq!(el.get_attr("for").as_deref(), Some("email"));
        assert_eq!(el.get_attr("tabindex").as_deref(), Some("3"));
        assert!(!ElementData::has_property("data-x"));
        assert!(!el.set_property("data-x", &PropValue::Bool(true)));
    }

    #[test]
    fn test_style_attribute_round_trip() {
        let mut el = ElementData::new("div");
        el.set_attr("style", "color: red; margin : 0");
        assert_eq!(el.style.get("margin").map(String::as_str), Some("0"));
        assert_eq!(el.get_attr("style").as_deref(), Some("color: red; margin: 0;"));
        assert!(el.remove_attr("style"));
        assert!(el.style.is_empty());
    }

    #[test]
    fn test_class_field() {
        let mut el = ElementData::new("li");
        el.set_attr("class", "item  active");
        assert!(el.has_class("active"));
        assert!(!el.has_class("act"));
        assert!(el.remove_attr("class"));
        assert_eq!(el.get_attr("class"), None);
    }
}
