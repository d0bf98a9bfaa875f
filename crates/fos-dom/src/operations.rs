//! DOM Node Operations
//!
//! Error type shared by every tree mutation and query.

use crate::NodeId;

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Node not found
    #[error("node {0} not found")]
    NotFound(NodeId),
    /// Hierarchy error (e.g., inserting ancestor, children under text)
    #[error("hierarchy request error: {0}")]
    HierarchyRequest(String),
    /// Operation not valid for this node type
    #[error("invalid node type for {operation} on {node}")]
    InvalidNodeType { operation: &'static str, node: NodeId },
    /// Node is not a child of the given parent
    #[error("node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },
    /// Invalid tag or attribute name
    #[error("invalid character in name {0:?}")]
    InvalidCharacter(String),
    /// Unparseable selector
    #[error("selector syntax error in {selector:?}: {reason}")]
    Syntax { selector: String, reason: &'static str },
}

/// Check a tag or attribute name: non-empty, no whitespace or markup characters
pub(crate) fn validate_name(name: &str) -> DomResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| !c.is_whitespace() && !matches!(c, '<' | '>' | '"' | '\'' | '/' | '=' | '\0'));
    if valid {
        Ok(())
    } else {
        Err(DomError::InvalidCharacter(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("div").is_ok());
        assert!(validate_name("data-ref").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("a b").is_err());
        assert!(validate_name("<p>").is_err());
    }

    #[test]
    fn test_error_display() {
        let err = DomError::NotAChild { parent: NodeId(1), child: NodeId(7) };
        assert_eq!(err.to_string(), "node #7 is not a child of #1");
    }
}
