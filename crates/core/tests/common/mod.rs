//! Shared fixtures for interpreter tests.
//!
//! Provides a synthetic font (every glyph 0.5 em wide), an image provider
//! returning a fixed 4x4 image and helpers that render a page from an
//! in-memory package onto a `RecordingSurface`.

#![allow(dead_code)]

use std::sync::Arc;

use oxps_core::document::{ArchiveReader, MemoryArchive, PageRenderer, XpsArchive};
use oxps_core::font::{FontHandle, FontMetrics, FontProvider, GlyphMetrics, ScaledFont};
use oxps_core::image::{Image, ImageProvider};
use oxps_core::interp::{RecordingSurface, SurfaceOp};
use oxps_core::model::{Pattern, PatternKind};
use oxps_core::{RenderOptions, Result, XpsError};

pub const PAGE: &str = "/Documents/1/Pages/1.fpage";
pub const FONT: &str = "/Documents/1/Resources/Fonts/test.ttf";

/// Font mapping each character to its code point.
#[derive(Debug)]
pub struct TestFont;

impl FontHandle for TestFont {
    fn glyph_index(&self, ch: char) -> Option<u32> {
        Some(ch as u32)
    }

    fn glyph_metrics(&self, _glyph: u32) -> GlyphMetrics {
        GlyphMetrics {
            advance: 0.5,
            x_bearing: 0.05,
            y_bearing: -0.7,
            width: 0.4,
            height: 0.7,
        }
    }

    fn font_metrics(&self) -> FontMetrics {
        FontMetrics {
            ascent: 0.8,
            descent: 0.2,
        }
    }
}

/// Serves `TestFont` for any font part present in the archive.
pub struct TestFonts;

impl FontProvider for TestFonts {
    fn get_font(&self, archive: &dyn ArchiveReader, uri: &str) -> Result<Arc<dyn FontHandle>> {
        if !archive.has_entry(uri) {
            return Err(XpsError::Font(format!("{uri} not found")));
        }
        Ok(Arc::new(TestFont))
    }
}

pub struct TestImages;

impl ImageProvider for TestImages {
    fn get_image(&self, archive: &dyn ArchiveReader, uri: &str) -> Result<Arc<Image>> {
        if !archive.has_entry(uri) {
            return Err(XpsError::ResourceNotFound(uri.to_string()));
        }
        Ok(Arc::new(Image::new(4, 4, vec![255; 64])))
    }
}

pub fn scaled_test_font(em_size: f64) -> ScaledFont {
    ScaledFont::new(Arc::new(TestFont), (em_size, 0.0, 0.0, em_size, 0.0, 0.0))
}

/// Wraps page content in a `FixedPage` root.
pub fn fixed_page(content: &str) -> String {
    format!(
        r#"<FixedPage Width="816" Height="1056" xmlns="http://schemas.microsoft.com/xps/2005/06" xmlns:x="http://schemas.microsoft.com/xps/2005/06/resourcedictionary-key">{content}</FixedPage>"#
    )
}

pub fn archive_with_page(content: &str) -> MemoryArchive {
    MemoryArchive::new()
        .with_part(PAGE, fixed_page(content))
        .with_part(FONT, b"font".to_vec())
        .with_part("/Documents/1/Resources/Images/tile.png", b"png".to_vec())
}

pub fn render_archive(archive: MemoryArchive, options: RenderOptions) -> (Result<()>, RecordingSurface) {
    let archive = XpsArchive::new(archive);
    let mut surface = RecordingSurface::new();
    let result = PageRenderer::new(&archive, PAGE, &TestFonts)
        .with_image_provider(&TestImages)
        .with_options(options)
        .render(&mut surface);
    (result, surface)
}

pub fn render(content: &str) -> (Result<()>, RecordingSurface) {
    render_archive(archive_with_page(content), RenderOptions::default())
}

/// Renders and asserts success and a balanced surface.
pub fn render_ok(content: &str) -> Vec<SurfaceOp> {
    let (result, surface) = render(content);
    if let Err(err) = result {
        panic!("render failed: {err}");
    }
    assert_balanced(&surface);
    surface.into_ops()
}

pub fn assert_balanced(surface: &RecordingSurface) {
    assert_eq!(surface.save_depth(), 0, "unbalanced save/restore");
    assert_eq!(surface.group_depth(), 0, "unbalanced push/pop group");
}

/// Patterns passed to `set_source`, in order.
pub fn sources(ops: &[SurfaceOp]) -> Vec<Pattern<usize>> {
    ops.iter()
        .filter_map(|op| match op {
            SurfaceOp::SetSource(pattern) => Some(pattern.clone()),
            _ => None,
        })
        .collect()
}

pub fn solid_rgba(pattern: &Pattern<usize>) -> Option<(f64, f64, f64, f64)> {
    match pattern.kind {
        PatternKind::Solid(c) => Some((c.red, c.green, c.blue, c.alpha)),
        _ => None,
    }
}
