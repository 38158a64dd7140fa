//! Package access and page rendering.
//!
//! This module contains:
//! - `archive` - Part lookup (ArchiveReader, MemoryArchive, DirArchive, XpsArchive)
//! - `page` - Fixed page rendering (PageRenderer)

pub mod archive;
pub mod page;

pub use archive::{ArchiveReader, DirArchive, MemoryArchive, XpsArchive};
pub use page::PageRenderer;
