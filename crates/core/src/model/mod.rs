//! XPS model types - colors, brushes and element state.
//!
//! This module contains:
//! - `color` - Color literals and ICC conversion (Color, ColorResolver)
//! - `brush` - Brush descriptions and surface patterns (Brush, Pattern)
//! - `state` - Path and glyph run state (PathState, GlyphRun, StrokeStyle)

pub mod brush;
pub mod color;
pub mod state;

// Re-export main types for convenience
pub use brush::{Brush, Extend, GradientStop, GradientStops, Pattern, PatternKind};
pub use color::{Color, ColorError, ColorResolver, IccProfile, IccProfileCache};
pub use state::{DashArray, FillRule, GlyphRun, LineCap, LineJoin, PathState, StrokeStyle};
