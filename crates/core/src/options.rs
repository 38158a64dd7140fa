//! Render options.
//!
//! Contains `RenderOptions` for controlling how strictly page markup is
//! interpreted.

/// Default limit on visual brushes nested inside each other's content.
pub const DEFAULT_MAX_VISUAL_DEPTH: usize = 32;

/// Options for page rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Visual brushes nested deeper than this fail with `NestingTooDeep`.
    pub max_visual_depth: usize,

    /// Fail on unknown content elements instead of logging and skipping
    /// their start tag.
    pub strict_unknown_elements: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_visual_depth: DEFAULT_MAX_VISUAL_DEPTH,
            strict_unknown_elements: false,
        }
    }
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_visual_depth(mut self, depth: usize) -> Self {
        self.max_visual_depth = depth;
        self
    }

    pub fn with_strict_unknown_elements(mut self, strict: bool) -> Self {
        self.strict_unknown_elements = strict;
        self
    }
}
