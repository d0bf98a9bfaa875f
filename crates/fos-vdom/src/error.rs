//! Capability errors
//!
//! Contract violations carry a module tag, a short code, a message and
//! key/value diagnostics. They are raised at the call site and never
//! swallowed.

use fos_dom::DomError;

/// Result alias for engine operations
pub type VdomResult<T> = Result<T, VdomError>;

/// Short error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Native-tree operation on a node that cannot take it
    InvalidTarget,
    /// Element tag missing or malformed
    InvalidTag,
    /// Selector text the native tree cannot parse
    InvalidSelector,
    /// Event name outside the supported set
    UnsupportedEvent,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidTarget => "E_TARGET",
            Self::InvalidTag => "E_TAG",
            Self::InvalidSelector => "E_SELECTOR",
            Self::UnsupportedEvent => "E_EVENT",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured capability error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("[{module}] {code}: {message}")]
pub struct VdomError {
    pub module: &'static str,
    pub code: ErrorCode,
    pub message: String,
    pub metadata: Vec<(&'static str, String)>,
}

impl VdomError {
    pub fn new(module: &'static str, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            module,
            code,
            message: message.into(),
            metadata: Vec::new(),
        }
    }

    /// Attach a diagnostic key/value
    pub fn with(mut self, key: &'static str, value: impl ToString) -> Self {
        self.metadata.push((key, value.to_string()));
        self
    }

    /// Look up a diagnostic value
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub(crate) fn unsupported_event(event_type: &str) -> Self {
        Self::new("events", ErrorCode::UnsupportedEvent, format!("unsupported event type {event_type:?}"))
            .with("event", event_type)
    }

    pub(crate) fn missing_child(index: usize) -> Self {
        Self::new("reconcile", ErrorCode::InvalidTarget, "native child vanished during patch")
            .with("index", index)
    }
}

impl From<DomError> for VdomError {
    fn from(err: DomError) -> Self {
        let code = match &err {
            DomError::InvalidCharacter(_) => ErrorCode::InvalidTag,
            DomError::Syntax { .. } => ErrorCode::InvalidSelector,
            DomError::NotFound(_)
            | DomError::HierarchyRequest(_)
            | DomError::InvalidNodeType { .. }
            | DomError::NotAChild { .. } => ErrorCode::InvalidTarget,
        };
        Self::new("dom", code, err.to_string())
    }
}
