//! Fixed page interpretation and surface output.
//!
//! This module contains:
//! - `interpreter`: Page interpreter and frame dispatch
//! - `stack`: Element frames and the values they produce
//! - `resources`: Resource dictionaries and stored fragments
//! - `device`: Drawing surface trait and the recording surface
//! - `ops`: Element handlers by family

pub mod device;
pub mod interpreter;
pub mod ops;
pub mod resources;
pub mod stack;

// Re-export main types for convenience
pub use device::{DrawingSurface, PathBuilder, PathSegment, PathSink, RecordingSurface, SurfaceOp};
pub use interpreter::{PageContext, PageInterpreter};
pub use resources::{ResourceScope, geometry_to_path_data};
