//! Element Attributes
//!
//! Plain attributes of an element in the order they were first set. Class
//! and inline style live on [`crate::ElementData`] directly and never
//! appear here.

/// Single attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: String,
    pub value: String,
}

/// Insertion-ordered attribute list. Elements carry a handful of
/// attributes, so lookups are linear.
#[derive(Debug, Clone, Default)]
pub struct NamedNodeMap {
    attributes: Vec<Attr>,
}

impl NamedNodeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }

    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.position(name).map(|i| self.attributes[i].value.as_str())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Set a value; an existing attribute keeps its position.
    /// Returns the previous value.
    pub fn set_attribute(&mut self, name: &str, value: &str) -> Option<String> {
        match self.position(name) {
            Some(i) => Some(std::mem::replace(&mut self.attributes[i].value, value.to_string())),
            None => {
                self.attributes.push(Attr {
                    name: name.to_string(),
                    value: value.to_string(),
                });
                None
            }
        }
    }

    pub fn remove_named_item(&mut self, name: &str) -> Option<Attr> {
        self.position(name).map(|i| self.attributes.remove(i))
    }

    /// Force presence (`Some`) or flip it (`None`); returns the new presence
    pub fn toggle_attribute(&mut self, name: &str, force: Option<bool>) -> bool {
        let present = force.unwrap_or(!self.has_attribute(name));
        match (present, self.has_attribute(name)) {
            (true, false) => {
                self.set_attribute(name, "");
            }
            (false, true) => {
                self.remove_named_item(name);
            }
            _ => {}
        }
        present
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attr> {
        self.attributes.iter()
    }
}
