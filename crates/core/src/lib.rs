//! oxps - An interpreter for XPS fixed-page markup.
//!
//! Pages are read from a package through an `ArchiveReader`, interpreted
//! as a stream of markup events and drawn onto any `DrawingSurface`.

pub mod document;
pub mod error;
pub mod font;
pub mod image;
pub mod interp;
pub mod model;
pub mod options;
pub mod parser;
pub mod utils;

pub use document::{ArchiveReader, DirArchive, MemoryArchive, PageRenderer, XpsArchive};
pub use error::{Location, Result, XpsError};
pub use font::{FontCache, FontHandle, FontProvider, ScaledFont};
pub use image::{Image, ImageCache, ImageProvider, NoImages};
pub use interp::{DrawingSurface, PageContext, PageInterpreter, RecordingSurface, SurfaceOp};
pub use options::RenderOptions;
