//! xpsdump - Dump the drawing operations of an XPS page
//!
//! Renders one fixed page of an extracted XPS package through a recording
//! surface and prints every surface call, one per line.

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{ArgAction, Parser};
use oxps_core::font::{FontHandle, FontMetrics, FontProvider, GlyphMetrics};
use oxps_core::image::{Image, ImageProvider};
use oxps_core::options::DEFAULT_MAX_VISUAL_DEPTH;
use oxps_core::{
    ArchiveReader, DirArchive, PageRenderer, RecordingSurface, RenderOptions, XpsArchive, XpsError,
};
use tracing_subscriber::EnvFilter;

/// Dump the drawing operations of one page of an extracted XPS package.
#[derive(Parser, Debug)]
#[command(name = "xpsdump")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the extracted package
    dir: PathBuf,

    /// Part name of the fixed page, e.g. /Documents/1/Pages/1.fpage
    page: String,

    /// Print the page size instead of the drawing operations
    #[arg(long, action = ArgAction::SetTrue)]
    size: bool,

    /// Maximum nesting depth of visual brushes
    #[arg(long = "max-visual-depth", default_value_t = DEFAULT_MAX_VISUAL_DEPTH)]
    max_visual_depth: usize,

    /// Fail on elements the page grammar does not know
    #[arg(long, action = ArgAction::SetTrue)]
    strict: bool,

    /// Increase logging verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

// ============================================================================
// Fonts
// ============================================================================

/// A TrueType or OpenType face kept as raw data. The face tables are
/// re-parsed on access, which only reads the table directory.
#[derive(Debug)]
struct TtfFont {
    uri: String,
    data: Vec<u8>,
}

impl TtfFont {
    fn face(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.data, 0)
            .inspect_err(|err| tracing::debug!(uri = %self.uri, %err, "font no longer parses"))
            .ok()
    }
}

impl FontHandle for TtfFont {
    fn glyph_index(&self, ch: char) -> Option<u32> {
        let face = self.face()?;
        face.glyph_index(ch).map(|id| u32::from(id.0))
    }

    fn glyph_metrics(&self, glyph: u32) -> GlyphMetrics {
        let Some(face) = self.face() else {
            return GlyphMetrics::default();
        };
        let Ok(id) = u16::try_from(glyph) else {
            return GlyphMetrics::default();
        };
        let id = ttf_parser::GlyphId(id);
        let upem = f64::from(face.units_per_em());
        let advance = face.glyph_hor_advance(id).map_or(0.0, f64::from) / upem;

        // Font units have y pointing up.
        match face.glyph_bounding_box(id) {
            Some(bbox) => GlyphMetrics {
                advance,
                x_bearing: f64::from(bbox.x_min) / upem,
                y_bearing: -f64::from(bbox.y_max) / upem,
                width: f64::from(bbox.width()) / upem,
                height: f64::from(bbox.height()) / upem,
            },
            None => GlyphMetrics {
                advance,
                ..GlyphMetrics::default()
            },
        }
    }

    fn font_metrics(&self) -> FontMetrics {
        let Some(face) = self.face() else {
            return FontMetrics::default();
        };
        let upem = f64::from(face.units_per_em());
        FontMetrics {
            ascent: f64::from(face.ascender()) / upem,
            descent: -f64::from(face.descender()) / upem,
        }
    }
}

/// Loads font parts with `ttf-parser`.
struct TtfFonts;

impl FontProvider for TtfFonts {
    fn get_font(&self, archive: &dyn ArchiveReader, uri: &str) -> oxps_core::Result<Arc<dyn FontHandle>> {
        let mut data = archive.read_entry(uri)?;
        if ttf_parser::Face::parse(&data, 0).is_err() {
            let key = obfuscation_key(uri)
                .ok_or_else(|| XpsError::Font(format!("{uri} is not a font and has no GUID name")))?;
            tracing::debug!(uri, "deobfuscating font");
            deobfuscate(&mut data, &key);
            ttf_parser::Face::parse(&data, 0)
                .map_err(|err| XpsError::Font(format!("{uri}: {err}")))?;
        }
        Ok(Arc::new(TtfFont {
            uri: uri.to_string(),
            data,
        }))
    }
}

/// GUID bytes named by the file stem of an obfuscated font part, in the
/// order they are written.
fn obfuscation_key(uri: &str) -> Option<[u8; 16]> {
    let file = uri.rsplit('/').next()?;
    let stem = file.split('.').next()?;
    let hex: String = stem.chars().filter(|c| !matches!(c, '{' | '}' | '-')).collect();
    if hex.len() != 32 || !hex.is_ascii() {
        return None;
    }

    let mut key = [0u8; 16];
    for (i, byte) in key.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(key)
}

/// XORs the first 32 bytes of the font with the key read backwards.
fn deobfuscate(data: &mut [u8], key: &[u8; 16]) {
    for (i, byte) in data.iter_mut().take(32).enumerate() {
        *byte ^= key[15 - i % 16];
    }
}

// ============================================================================
// Images
// ============================================================================

/// Decodes PNG, JPEG and TIFF parts with the `image` crate.
struct DecodedImages;

impl ImageProvider for DecodedImages {
    fn get_image(&self, archive: &dyn ArchiveReader, uri: &str) -> oxps_core::Result<Arc<Image>> {
        let data = archive.read_entry(uri)?;
        let decoded =
            image::load_from_memory(&data).map_err(|err| XpsError::Image(format!("{uri}: {err}")))?;
        let rgba = decoded.to_rgba8();
        Ok(Arc::new(Image::new(rgba.width(), rgba.height(), rgba.into_raw())))
    }
}

// ============================================================================
// Main
// ============================================================================

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let reader = DirArchive::open(&args.dir)
        .with_context(|| format!("failed to open package directory {}", args.dir.display()))?;
    let archive = XpsArchive::new(reader);
    if !archive.has_entry(&args.page) {
        bail!("page {} not found in {}", args.page, args.dir.display());
    }

    let options = RenderOptions::new()
        .with_max_visual_depth(args.max_visual_depth)
        .with_strict_unknown_elements(args.strict);
    let renderer = PageRenderer::new(&archive, args.page.as_str(), &TtfFonts)
        .with_image_provider(&DecodedImages)
        .with_options(options);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if args.size {
        let (width, height) = renderer.size()?;
        writeln!(out, "{width} x {height}")?;
        return Ok(());
    }

    let mut surface = RecordingSurface::new();
    renderer
        .render(&mut surface)
        .with_context(|| format!("failed to render {}", args.page))?;
    tracing::debug!(ops = surface.ops().len(), "page rendered");

    for op in surface.ops() {
        writeln!(out, "{op}")?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obfuscation_key_from_guid_name() {
        let key = obfuscation_key("/Documents/1/Resources/Fonts/{0A1B2C3D-4E5F-6071-8293-A4B5C6D7E8F9}.odttf")
            .expect("key");
        assert_eq!(key[0], 0x0A);
        assert_eq!(key[15], 0xF9);
        assert!(obfuscation_key("/Resources/Fonts/arial.ttf").is_none());
    }

    #[test]
    fn test_deobfuscate_touches_first_32_bytes() {
        let key: [u8; 16] = std::array::from_fn(|i| i as u8 + 1);
        let mut data = vec![0u8; 40];
        deobfuscate(&mut data, &key);
        assert_eq!(data[0], 16);
        assert_eq!(data[15], 1);
        assert_eq!(data[16], 16);
        assert_eq!(data[31], 1);
        assert!(data[32..].iter().all(|&b| b == 0));
    }
}
