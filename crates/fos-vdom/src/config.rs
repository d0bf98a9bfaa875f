//! Renderer Configuration

/// Attribute used to tag nodes that carry `on*` handlers
pub const DEFAULT_REF_ATTRIBUTE: &str = "data-vref";

/// Renderer and registry options
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Attribute written on nodes that own delegated handlers
    pub ref_attribute: String,

    /// Warn when a handler's selector matches nothing at registration
    pub warn_unmatched_selectors: bool,

    /// Rebuild a children list from scratch when diffing it fails
    pub rebuild_on_diff_error: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            ref_attribute: DEFAULT_REF_ATTRIBUTE.to_string(),
            warn_unmatched_selectors: true,
            rebuild_on_diff_error: true,
        }
    }
}
