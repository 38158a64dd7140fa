//! Font access for glyph runs.
//!
//! Font loading is delegated to a `FontProvider`. The interpreter works with
//! `FontHandle` metrics in em units and scales them through a font matrix
//! with `ScaledFont`, the way a glyph run places text:
//! - advances and bearings are transformed by the font matrix
//! - the font matrix includes sideways rotation and italic shear

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::document::ArchiveReader;
use crate::error::Result;
use crate::utils::{Matrix, Rectangle, apply_matrix_distance, transform_hypot};

/// Glyph metrics in em units, y axis pointing down.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlyphMetrics {
    /// Horizontal advance.
    pub advance: f64,
    /// Left edge of the ink box relative to the origin.
    pub x_bearing: f64,
    /// Top edge of the ink box relative to the baseline (negative above).
    pub y_bearing: f64,
    pub width: f64,
    pub height: f64,
}

/// Font-wide metrics in em units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FontMetrics {
    /// Distance from the baseline to the top, positive.
    pub ascent: f64,
    /// Distance from the baseline to the bottom, positive.
    pub descent: f64,
}

/// A loaded font face.
pub trait FontHandle: fmt::Debug {
    /// Glyph for a character, `None` when the cmap has no entry.
    fn glyph_index(&self, ch: char) -> Option<u32>;

    fn glyph_metrics(&self, glyph: u32) -> GlyphMetrics;

    fn font_metrics(&self) -> FontMetrics;
}

/// Loads font parts of an archive.
pub trait FontProvider {
    fn get_font(&self, archive: &dyn ArchiveReader, uri: &str) -> Result<Arc<dyn FontHandle>>;
}

/// Fonts loaded from one archive, keyed by part name.
#[derive(Default)]
pub struct FontCache {
    faces: RefCell<FxHashMap<String, Arc<dyn FontHandle>>>,
}

impl fmt::Debug for FontCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontCache")
            .field("len", &self.faces.borrow().len())
            .finish()
    }
}

impl FontCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(
        &self,
        provider: &dyn FontProvider,
        archive: &dyn ArchiveReader,
        uri: &str,
    ) -> Result<Arc<dyn FontHandle>> {
        if let Some(face) = self.faces.borrow().get(uri) {
            return Ok(Arc::clone(face));
        }
        let face = provider.get_font(archive, uri)?;
        self.faces
            .borrow_mut()
            .insert(uri.to_string(), Arc::clone(&face));
        Ok(face)
    }

    pub fn len(&self) -> usize {
        self.faces.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.borrow().is_empty()
    }
}

/// Glyph extents in user space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlyphExtents {
    pub x_bearing: f64,
    pub y_bearing: f64,
    pub width: f64,
    pub height: f64,
    pub x_advance: f64,
    pub y_advance: f64,
}

/// A font face combined with the matrix mapping em space to user space.
#[derive(Debug, Clone)]
pub struct ScaledFont {
    pub face: Arc<dyn FontHandle>,
    pub font_matrix: Matrix,
}

impl ScaledFont {
    pub fn new(face: Arc<dyn FontHandle>, font_matrix: Matrix) -> Self {
        Self { face, font_matrix }
    }

    pub fn glyph_index(&self, ch: char) -> u32 {
        self.face.glyph_index(ch).unwrap_or(0)
    }

    /// Extents of a glyph after applying the font matrix.
    pub fn glyph_extents(&self, glyph: u32) -> GlyphExtents {
        let metrics = self.face.glyph_metrics(glyph);
        let (x_advance, y_advance) = apply_matrix_distance(self.font_matrix, (metrics.advance, 0.0));

        let (x0, y0) = (metrics.x_bearing, metrics.y_bearing);
        let (x1, y1) = (x0 + metrics.width, y0 + metrics.height);
        let corners = [(x0, y0), (x1, y0), (x0, y1), (x1, y1)]
            .map(|corner| apply_matrix_distance(self.font_matrix, corner));
        let ink = Rectangle::bounding(corners).unwrap_or_default();

        GlyphExtents {
            x_bearing: ink.x,
            y_bearing: ink.y,
            width: ink.width,
            height: ink.height,
            x_advance,
            y_advance,
        }
    }

    /// Font descent scaled to user space.
    pub fn descent(&self) -> f64 {
        self.face.font_metrics().descent * transform_hypot(self.font_matrix, 0.0, 1.0)
    }

    /// Maps a distance from em space to user space.
    pub fn transform_distance(&self, dx: f64, dy: f64) -> (f64, f64) {
        apply_matrix_distance(self.font_matrix, (dx, dy))
    }
}
