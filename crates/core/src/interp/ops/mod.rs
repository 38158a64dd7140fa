//! Element handlers of the page interpreter.
//!
//! Handlers are grouped by element family:
//! - `canvas` - Page root, Canvas and the content dispatch shared by both
//! - `path` - Path, PathGeometry, PathFigure and poly segments
//! - `glyphs` - Glyphs
//! - `brush` - SolidColorBrush, gradients, ImageBrush, VisualBrush
//! - `transform` - MatrixTransform
//! - `resources` - Resource dictionaries, inline and remote

mod brush;
mod canvas;
mod glyphs;
mod path;
mod resources;
mod transform;

// Each file adds an impl block to PageInterpreter; nothing to re-export.
