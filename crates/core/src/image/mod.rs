//! Decoded raster images used by `ImageBrush`.
//!
//! Decoding is delegated to an `ImageProvider`; the interpreter only needs
//! pixel dimensions and the native resolution to map viewboxes (given in
//! 1/96 inch) onto pixels.

use std::cell::RefCell;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::document::ArchiveReader;
use crate::error::{Result, XpsError};

/// Resolution assumed when an image does not declare one.
pub const DEFAULT_RESOLUTION: f64 = 96.0;

/// A decoded image as straight (non-premultiplied) RGBA8 rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    /// Horizontal resolution in pixels per inch.
    pub res_x: f64,
    /// Vertical resolution in pixels per inch.
    pub res_y: f64,
}

impl Image {
    /// Creates an image at the default resolution.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
            res_x: DEFAULT_RESOLUTION,
            res_y: DEFAULT_RESOLUTION,
        }
    }

    pub fn with_resolution(mut self, res_x: f64, res_y: f64) -> Self {
        self.res_x = res_x;
        self.res_y = res_y;
        self
    }
}

/// Decodes image parts of an archive.
pub trait ImageProvider {
    fn get_image(&self, archive: &dyn ArchiveReader, uri: &str) -> Result<Arc<Image>>;
}

/// Provider for documents rendered without image support.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoImages;

impl ImageProvider for NoImages {
    fn get_image(&self, _archive: &dyn ArchiveReader, uri: &str) -> Result<Arc<Image>> {
        Err(XpsError::Image(format!("no image decoder for {uri}")))
    }
}

/// Images decoded for one page, keyed by part name.
#[derive(Debug, Default)]
pub struct ImageCache {
    images: RefCell<FxHashMap<String, Arc<Image>>>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(
        &self,
        provider: &dyn ImageProvider,
        archive: &dyn ArchiveReader,
        uri: &str,
    ) -> Result<Arc<Image>> {
        if let Some(image) = self.images.borrow().get(uri) {
            return Ok(Arc::clone(image));
        }
        let image = provider.get_image(archive, uri)?;
        self.images
            .borrow_mut()
            .insert(uri.to_string(), Arc::clone(&image));
        Ok(image)
    }

    pub fn len(&self) -> usize {
        self.images.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.borrow().is_empty()
    }
}
