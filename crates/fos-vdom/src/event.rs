//! Event types and handler callbacks

use std::fmt;
use std::rc::Rc;

/// Supported event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Click,
    DblClick,
    ContextMenu,
    MouseDown,
    MouseUp,
    MouseMove,
    MouseEnter,
    MouseLeave,
    MouseOver,
    MouseOut,
    KeyDown,
    KeyUp,
    KeyPress,
    Input,
    Change,
    Focus,
    Blur,
    Submit,
    Reset,
    Scroll,
    Wheel,
    TouchStart,
    TouchEnd,
    TouchMove,
    TouchCancel,
    Load,
    Unload,
    Resize,
    HashChange,
    PopState,
}

const ALL_KINDS: &[EventKind] = &[
    EventKind::Click,
    EventKind::DblClick,
    EventKind::ContextMenu,
    EventKind::MouseDown,
    EventKind::MouseUp,
    EventKind::MouseMove,
    EventKind::MouseEnter,
    EventKind::MouseLeave,
    EventKind::MouseOver,
    EventKind::MouseOut,
    EventKind::KeyDown,
    EventKind::KeyUp,
    EventKind::KeyPress,
    EventKind::Input,
    EventKind::Change,
    EventKind::Focus,
    EventKind::Blur,
    EventKind::Submit,
    EventKind::Reset,
    EventKind::Scroll,
    EventKind::Wheel,
    EventKind::TouchStart,
    EventKind::TouchEnd,
    EventKind::TouchMove,
    EventKind::TouchCancel,
    EventKind::Load,
    EventKind::Unload,
    EventKind::Resize,
    EventKind::HashChange,
    EventKind::PopState,
];

impl EventKind {
    /// Native event name
    pub fn name(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::DblClick => "dblclick",
            Self::ContextMenu => "contextmenu",
            Self::MouseDown => "mousedown",
            Self::MouseUp => "mouseup",
            Self::MouseMove => "mousemove",
            Self::MouseEnter => "mouseenter",
            Self::MouseLeave => "mouseleave",
            Self::MouseOver => "mouseover",
            Self::MouseOut => "mouseout",
            Self::KeyDown => "keydown",
            Self::KeyUp => "keyup",
            Self::KeyPress => "keypress",
            Self::Input => "input",
            Self::Change => "change",
            Self::Focus => "focus",
            Self::Blur => "blur",
            Self::Submit => "submit",
            Self::Reset => "reset",
            Self::Scroll => "scroll",
            Self::Wheel => "wheel",
            Self::TouchStart => "touchstart",
            Self::TouchEnd => "touchend",
            Self::TouchMove => "touchmove",
            Self::TouchCancel => "touchcancel",
            Self::Load => "load",
            Self::Unload => "unload",
            Self::Resize => "resize",
            Self::HashChange => "hashchange",
            Self::PopState => "popstate",
        }
    }

    /// Parse a native event name, case-insensitively
    pub fn from_name(name: &str) -> Option<Self> {
        ALL_KINDS.iter().copied().find(|k| k.name().eq_ignore_ascii_case(name))
    }

    /// Parse an `on*` attribute key (`onClick`, `onkeydown`)
    pub fn from_attribute(key: &str) -> Option<Self> {
        key.strip_prefix("on").and_then(Self::from_name)
    }

    /// Whether a listener may be attached at window/document scope
    pub fn is_global_scope(self) -> bool {
        matches!(
            self,
            Self::Click
                | Self::KeyDown
                | Self::KeyUp
                | Self::KeyPress
                | Self::MouseMove
                | Self::MouseUp
                | Self::Scroll
                | Self::Wheel
                | Self::TouchMove
                | Self::TouchEnd
                | Self::Load
                | Self::Unload
                | Self::Resize
                | Self::HashChange
                | Self::PopState
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Registered handler identifier; monotonic, never reused by one registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub(crate) u64);

impl HandlerId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h{}", self.0)
    }
}

/// Event as seen by a registered handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegatedEvent {
    pub kind: EventKind,
    /// Handler being invoked
    pub handler: HandlerId,
    /// Stable key of the node the event was dispatched at (`None` at global scope)
    pub target: Option<u64>,
    /// Stable key of the matched node whose listener fired (`None` at global scope)
    pub current_target: Option<u64>,
}

/// Handler callback; compared by identity
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn(&DelegatedEvent)>);

impl Callback {
    pub fn new(f: impl Fn(&DelegatedEvent) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, event: &DelegatedEvent) {
        (self.0)(event)
    }
}

impl<F: Fn(&DelegatedEvent) + 'static> From<F> for Callback {
    fn from(f: F) -> Self {
        Self::new(f)
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", Rc::as_ptr(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trip() {
        for &kind in ALL_KINDS {
            assert_eq!(EventKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(EventKind::from_name("CLICK"), Some(EventKind::Click));
        assert_eq!(EventKind::from_name("explode"), None);
    }

    #[test]
    fn test_from_attribute() {
        assert_eq!(EventKind::from_attribute("onClick"), Some(EventKind::Click));
        assert_eq!(EventKind::from_attribute("onkeydown"), Some(EventKind::KeyDown));
        assert_eq!(EventKind::from_attribute("onMystery"), None);
        assert_eq!(EventKind::from_attribute("click"), None);
    }

    #[test]
    fn test_global_scope() {
        assert!(EventKind::Resize.is_global_scope());
        assert!(EventKind::KeyDown.is_global_scope());
        assert!(!EventKind::Input.is_global_scope());
        assert!(!EventKind::Focus.is_global_scope());
    }

    #[test]
    fn test_callback_identity() {
        let a = Callback::new(|_| {});
        let b = a.clone();
        let c = Callback::new(|_| {});
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
