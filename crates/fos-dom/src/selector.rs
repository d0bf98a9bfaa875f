//! Element Selectors
//!
//! A small CSS selector engine for `query_selector_all` and `matches`:
//! type, universal, `#id`, `.class`, attribute matchers, compound
//! selectors, descendant and child combinators, and comma lists.

use std::iter::Peekable;
use std::str::Chars;

use crate::{DomError, DomResult, DomTree, ElementData, NodeId};

/// Simple selector types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    /// Universal selector (*)
    Universal,
    /// Tag name selector (div, span, etc.)
    Type(String),
    /// ID selector (#id)
    Id(String),
    /// Class selector (.class)
    Class(String),
    /// Attribute selector
    Attribute(AttributeSelector),
}

/// Attribute selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    pub name: String,
    pub matcher: Option<AttributeMatcher>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeMatcher {
    /// [attr=value] - exact match
    Exact(String),
    /// [attr~=value] - whitespace-separated list contains
    Contains(String),
    /// [attr|=value] - exact or prefix with hyphen
    DashMatch(String),
    /// [attr^=value] - starts with
    Prefix(String),
    /// [attr$=value] - ends with
    Suffix(String),
    /// [attr*=value] - contains substring
    Substring(String),
}

impl AttributeSelector {
    /// Check if an attribute value matches
    pub fn matches(&self, value: Option<&str>) -> bool {
        match (&self.matcher, value) {
            (None, Some(_)) => true,
            (_, None) => false,
            (Some(matcher), Some(val)) => match matcher {
                AttributeMatcher::Exact(expected) => val == expected,
                AttributeMatcher::Contains(expected) => val.split_whitespace().any(|w| w == expected),
                AttributeMatcher::DashMatch(expected) => {
                    val == expected || val.strip_prefix(expected.as_str()).is_some_and(|rest| rest.starts_with('-'))
                }
                AttributeMatcher::Prefix(expected) => !expected.is_empty() && val.starts_with(expected.as_str()),
                AttributeMatcher::Suffix(expected) => !expected.is_empty() && val.ends_with(expected.as_str()),
                AttributeMatcher::Substring(expected) => !expected.is_empty() && val.contains(expected.as_str()),
            },
        }
    }
}

impl SimpleSelector {
    /// Match against an element
    pub fn matches(&self, element: &ElementData) -> bool {
        match self {
            SimpleSelector::Universal => true,
            SimpleSelector::Type(tag) => element.tag.eq_ignore_ascii_case(tag),
            SimpleSelector::Id(id) => element.attrs.get_attribute("id") == Some(id.as_str()),
            SimpleSelector::Class(class) => element.has_class(class),
            SimpleSelector::Attribute(attr) => attr.matches(element.get_attr(&attr.name).as_deref()),
        }
    }
}

/// Relationship between a compound and the one to its left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Compound(Vec<SimpleSelector>);

impl Compound {
    fn matches(&self, element: &ElementData) -> bool {
        self.0.iter().all(|s| s.matches(element))
    }
}

/// Compounds left to right; each combinator links a compound to the previous one
#[derive(Debug, Clone, PartialEq, Eq)]
struct ComplexSelector {
    parts: Vec<(Combinator, Compound)>,
}

impl ComplexSelector {
    fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        self.parts.len().checked_sub(1).is_some_and(|last| self.matches_at(tree, node, last))
    }

    fn matches_at(&self, tree: &DomTree, node: NodeId, idx: usize) -> bool {
        let (combinator, compound) = &self.parts[idx];
        let Some(element) = tree.get(node).and_then(|n| n.as_element()) else {
            return false;
        };
        if !compound.matches(element) {
            return false;
        }
        if idx == 0 {
            return true;
        }
        match combinator {
            Combinator::Child => tree.parent(node).is_some_and(|p| self.matches_at(tree, p, idx - 1)),
            Combinator::Descendant => {
                let mut ancestor = tree.parent(node);
                while let Some(id) = ancestor {
                    if self.matches_at(tree, id, idx - 1) {
                        return true;
                    }
                    ancestor = tree.parent(id);
                }
                false
            }
        }
    }
}

/// Parsed selector list (`a, b > c`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<ComplexSelector>,
}

impl SelectorList {
    /// Parse selector text
    pub fn parse(text: &str) -> DomResult<Self> {
        let selectors = text
            .split(',')
            .map(|part| parse_complex(text, part))
            .collect::<DomResult<Vec<_>>>()?;
        Ok(Self { selectors })
    }

    /// Whether a node matches any selector in the list
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        self.selectors.iter().any(|s| s.matches(tree, node))
    }

    /// All matching descendants of `root` in document order
    pub fn query_all(&self, tree: &DomTree, root: NodeId) -> Vec<NodeId> {
        tree.descendants(root)
            .into_iter()
            .filter(|&id| self.matches(tree, id))
            .collect()
    }
}

fn syntax(selector: &str, reason: &'static str) -> DomError {
    DomError::Syntax {
        selector: selector.to_string(),
        reason,
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn read_ident(source: &str, chars: &mut Peekable<Chars<'_>>) -> DomResult<String> {
    let mut ident = String::new();
    while let Some(&c) = chars.peek() {
        if !is_ident_char(c) {
            break;
        }
        ident.push(c);
        chars.next();
    }
    if ident.is_empty() {
        Err(syntax(source, "expected identifier"))
    } else {
        Ok(ident)
    }
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
}

fn parse_attribute(source: &str, chars: &mut Peekable<Chars<'_>>) -> DomResult<AttributeSelector> {
    skip_whitespace(chars);
    let name = read_ident(source, chars)?;
    skip_whitespace(chars);
    let op = match chars.next() {
        Some(']') => return Ok(AttributeSelector { name, matcher: None }),
        Some('=') => '=',
        Some(c @ ('~' | '|' | '^' | '$' | '*')) => {
            if chars.next() != Some('=') {
                return Err(syntax(source, "expected '=' in attribute selector"));
            }
            c
        }
        _ => return Err(syntax(source, "malformed attribute selector")),
    };
    skip_whitespace(chars);
    let value = match chars.peek() {
        Some(&quote) if quote == '"' || quote == '\'' => {
            chars.next();
            let mut value = String::new();
            loop {
                match chars.next() {
                    Some(c) if c == quote => break value,
                    Some(c) => value.push(c),
                    None => return Err(syntax(source, "unterminated string")),
                }
            }
        }
        _ => read_ident(source, chars)?,
    };
    skip_whitespace(chars);
    if chars.next() != Some(']') {
        return Err(syntax(source, "expected ']'"));
    }
    let matcher = match op {
        '=' => AttributeMatcher::Exact(value),
        '~' => AttributeMatcher::Contains(value),
        '|' => AttributeMatcher::DashMatch(value),
        '^' => AttributeMatcher::Prefix(value),
        '$' => AttributeMatcher::Suffix(value),
        _ => AttributeMatcher::Substring(value),
    };
    Ok(AttributeSelector {
        name,
        matcher: Some(matcher),
    })
}

fn parse_complex(source: &str, text: &str) -> DomResult<ComplexSelector> {
    let mut parts = Vec::new();
    let mut current = Vec::new();
    let mut pending = Combinator::Descendant;
    let mut dangling = false;
    let mut chars = text.trim().chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
                if !current.is_empty() {
                    parts.push((pending, Compound(std::mem::take(&mut current))));
                    pending = Combinator::Descendant;
                }
            }
            '>' => {
                chars.next();
                if !current.is_empty() {
                    parts.push((pending, Compound(std::mem::take(&mut current))));
                }
                if parts.is_empty() || dangling {
                    return Err(syntax(source, "combinator without left operand"));
                }
                pending = Combinator::Child;
                dangling = true;
            }
            '*' => {
                chars.next();
                current.push(SimpleSelector::Universal);
                dangling = false;
            }
            '#' => {
                chars.next();
                current.push(SimpleSelector::Id(read_ident(source, &mut chars)?));
                dangling = false;
            }
            '.' => {
                chars.next();
                current.push(SimpleSelector::Class(read_ident(source, &mut chars)?));
                dangling = false;
            }
            '[' => {
                chars.next();
                current.push(SimpleSelector::Attribute(parse_attribute(source, &mut chars)?));
                dangling = false;
            }
            c if is_ident_char(c) => {
                let tag = read_ident(source, &mut chars)?;
                current.push(SimpleSelector::Type(tag.to_ascii_lowercase()));
                dangling = false;
            }
            _ => return Err(syntax(source, "unexpected character")),
        }
    }
    if !current.is_empty() {
        parts.push((pending, Compound(current)));
    }
    if parts.is_empty() {
        return Err(syntax(source, "empty selector"));
    }
    if dangling {
        return Err(syntax(source, "combinator without right operand"));
    }
    Ok(ComplexSelector { parts })
}
