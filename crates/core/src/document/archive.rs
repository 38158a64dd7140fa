//! Package part access.
//!
//! `ArchiveReader` is the lookup interface the interpreter needs from a
//! package: case-insensitive part names, streamed or whole-buffer reads.
//! `XpsArchive` wraps a reader with the caches whose lifetime is tied to the
//! package (ICC profiles and font faces).

use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::error::{Result, XpsError};
use crate::font::FontCache;
use crate::model::IccProfileCache;

/// Read access to the parts of a package.
pub trait ArchiveReader {
    /// Whether a part exists. Part names compare case-insensitively.
    fn has_entry(&self, path: &str) -> bool;

    /// Opens a part for streaming.
    fn open(&self, path: &str) -> Result<Box<dyn Read + '_>>;

    /// Reads a whole part into memory.
    fn read_entry(&self, path: &str) -> Result<Vec<u8>> {
        let mut reader = self.open(path)?;
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(data)
    }
}

/// Normalizes a part name for lookups: leading slash, lowercase.
fn part_key(path: &str) -> String {
    let trimmed = path.trim_start_matches('/');
    format!("/{}", trimmed.to_lowercase())
}

/// An archive held entirely in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryArchive {
    parts: FxHashMap<String, Vec<u8>>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a part.
    pub fn insert(&mut self, path: &str, data: impl Into<Vec<u8>>) {
        self.parts.insert(part_key(path), data.into());
    }

    pub fn with_part(mut self, path: &str, data: impl Into<Vec<u8>>) -> Self {
        self.insert(path, data);
        self
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl ArchiveReader for MemoryArchive {
    fn has_entry(&self, path: &str) -> bool {
        self.parts.contains_key(&part_key(path))
    }

    fn open(&self, path: &str) -> Result<Box<dyn Read + '_>> {
        let data = self
            .parts
            .get(&part_key(path))
            .ok_or_else(|| XpsError::ResourceNotFound(path.to_string()))?;
        Ok(Box::new(Cursor::new(data.as_slice())))
    }
}

/// An extracted package on disk. The directory is indexed once so that
/// lookups are case-insensitive on every platform.
#[derive(Debug, Clone)]
pub struct DirArchive {
    root: PathBuf,
    index: FxHashMap<String, PathBuf>,
}

impl DirArchive {
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let mut index = FxHashMap::default();
        let mut pending = vec![root.clone()];
        while let Some(dir) = pending.pop() {
            for entry in fs::read_dir(&dir)? {
                let path = entry?.path();
                if path.is_dir() {
                    pending.push(path);
                    continue;
                }
                let Ok(relative) = path.strip_prefix(&root) else {
                    continue;
                };
                let name = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                index.insert(part_key(&name), path);
            }
        }
        tracing::debug!(root = %root.display(), parts = index.len(), "indexed package directory");
        Ok(Self { root, index })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl ArchiveReader for DirArchive {
    fn has_entry(&self, path: &str) -> bool {
        self.index.contains_key(&part_key(path))
    }

    fn open(&self, path: &str) -> Result<Box<dyn Read + '_>> {
        let file_path = self
            .index
            .get(&part_key(path))
            .ok_or_else(|| XpsError::ResourceNotFound(path.to_string()))?;
        Ok(Box::new(fs::File::open(file_path)?))
    }

    fn read_entry(&self, path: &str) -> Result<Vec<u8>> {
        let file_path = self
            .index
            .get(&part_key(path))
            .ok_or_else(|| XpsError::ResourceNotFound(path.to_string()))?;
        Ok(fs::read(file_path)?)
    }
}

/// A package together with its long-lived caches.
#[derive(Debug)]
pub struct XpsArchive<R> {
    reader: R,
    icc_profiles: IccProfileCache,
    fonts: FontCache,
}

impl<R: ArchiveReader> XpsArchive<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            icc_profiles: IccProfileCache::new(),
            fonts: FontCache::new(),
        }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn icc_profiles(&self) -> &IccProfileCache {
        &self.icc_profiles
    }

    pub fn fonts(&self) -> &FontCache {
        &self.fonts
    }
}

impl<R: ArchiveReader> ArchiveReader for XpsArchive<R> {
    fn has_entry(&self, path: &str) -> bool {
        self.reader.has_entry(path)
    }

    fn open(&self, path: &str) -> Result<Box<dyn Read + '_>> {
        self.reader.open(path)
    }

    fn read_entry(&self, path: &str) -> Result<Vec<u8>> {
        self.reader.read_entry(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_archive_is_case_insensitive() {
        let archive = MemoryArchive::new().with_part("/Documents/1/Pages/1.fpage", "<FixedPage/>");
        assert!(archive.has_entry("/documents/1/pages/1.FPAGE"));
        assert!(archive.has_entry("Documents/1/Pages/1.fpage"));
        assert_eq!(
            archive.read_entry("/DOCUMENTS/1/Pages/1.fpage").unwrap(),
            b"<FixedPage/>"
        );
        assert!(matches!(
            archive.read_entry("/missing"),
            Err(XpsError::ResourceNotFound(_))
        ));
    }
}
