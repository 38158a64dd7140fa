//! Benchmarks for the abbreviated syntaxes and page interpretation.
//!
//! Benchmark groups:
//! - `path_data`: abbreviated geometry parsing at various sizes
//! - `glyph_indices`: glyph run layout with per-glyph advances
//! - `page_render`: full interpretation of a page of filled paths

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;

use oxps_core::document::{ArchiveReader, MemoryArchive, PageRenderer, XpsArchive};
use oxps_core::font::{FontHandle, FontMetrics, FontProvider, GlyphMetrics, ScaledFont};
use oxps_core::interp::{PathBuilder, RecordingSurface};
use oxps_core::parser::{GlyphPlacement, layout_glyphs, parse_path_data};
use oxps_core::{Result, XpsError};

// =============================================================================
// Data Generation
// =============================================================================

/// Path data with `n` segments cycling through every drawing command.
fn generate_path_data(n: usize) -> String {
    let mut data = String::with_capacity(n * 24);
    data.push_str("F1 M 0,0");
    for i in 0..n {
        let x = (i % 500) as f64 * 1.5;
        let y = (i % 300) as f64 * 0.75;
        let segment = match i % 6 {
            0 => format!(" L {x},{y}"),
            1 => format!(" l {:.2},-{:.2}", x / 10.0, y / 10.0),
            2 => format!(" C {x},{y} {},{} {},{}", x + 2.0, y, x + 4.0, y + 1.0),
            3 => format!(" S {},{y} {x},.5", x + 1.0),
            4 => format!(" Q {x},{y} {},{}", x + 3.0, y + 3.0),
            _ => format!(" H {x} V {y} Z M {x},{y}"),
        };
        data.push_str(&segment);
    }
    data
}

/// Indices for `n` glyphs, every third one with an explicit advance and
/// offsets.
fn generate_indices(n: usize) -> (String, String) {
    let text: String = (0..n).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
    let indices = (0..n)
        .map(|i| match i % 3 {
            0 => format!("{},{},{},{}", 68 + i % 26, 50 + i % 20, i % 5, i % 3),
            1 => format!(",{}", 45 + i % 10),
            _ => String::new(),
        })
        .collect::<Vec<_>>()
        .join(";");
    (text, indices)
}

fn generate_page(paths: usize) -> String {
    let mut page = String::from(r#"<FixedPage Width="816" Height="1056" xmlns="http://schemas.microsoft.com/xps/2005/06">"#);
    for i in 0..paths {
        let x = (i % 40) as f64 * 20.0;
        let y = (i / 40) as f64 * 20.0;
        page.push_str(&format!(
            r##"<Path Data="M {x},{y} L {},{y} {},{} {x},{} Z" Fill="#FF{:02X}00" Stroke="#000000"/>"##,
            x + 15.0,
            x + 15.0,
            y + 15.0,
            y + 15.0,
            i % 256
        ));
    }
    page.push_str("</FixedPage>");
    page
}

#[derive(Debug)]
struct FixedPitchFont;

impl FontHandle for FixedPitchFont {
    fn glyph_index(&self, ch: char) -> Option<u32> {
        Some(ch as u32)
    }

    fn glyph_metrics(&self, _glyph: u32) -> GlyphMetrics {
        GlyphMetrics {
            advance: 0.6,
            x_bearing: 0.0,
            y_bearing: -0.7,
            width: 0.6,
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

struct NoFonts;

impl FontProvider for NoFonts {
    fn get_font(&self, _archive: &dyn ArchiveReader, uri: &str) -> Result<Arc<dyn FontHandle>> {
        Err(XpsError::Font(format!("no font for {uri}")))
    }
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_path_data(c: &mut Criterion) {
    let mut group = c.benchmark_group("path_data");

    for segments in [100usize, 10_000, 100_000] {
        let data = generate_path_data(segments);
        group.bench_with_input(BenchmarkId::new("segments", segments), &data, |b, data| {
            b.iter(|| {
                let mut path = PathBuilder::new();
                parse_path_data(black_box(data), &mut path).unwrap();
                path.segments.len()
            })
        });
    }

    group.finish();
}

fn bench_glyph_indices(c: &mut Criterion) {
    let mut group = c.benchmark_group("glyph_indices");
    let font = ScaledFont::new(Arc::new(FixedPitchFont), (12.0, 0.0, 0.0, 12.0, 0.0, 0.0));

    for glyphs in [80usize, 2_000] {
        let (text, indices) = generate_indices(glyphs);
        group.bench_with_input(
            BenchmarkId::new("glyphs", glyphs),
            &(text, indices),
            |b, (text, indices)| {
                b.iter(|| {
                    let placement = GlyphPlacement::new((72.0, 720.0));
                    let layout = layout_glyphs(&font, black_box(text), Some(indices), placement).unwrap();
                    layout.glyphs.len()
                })
            },
        );
    }

    group.finish();
}

fn bench_page_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("page_render");

    for paths in [100usize, 2_000] {
        let source = "/Documents/1/Pages/1.fpage";
        let archive = XpsArchive::new(MemoryArchive::new().with_part(source, generate_page(paths)));
        group.bench_with_input(BenchmarkId::new("paths", paths), &archive, |b, archive| {
            b.iter(|| {
                let mut surface = RecordingSurface::new();
                PageRenderer::new(archive, source, &NoFonts)
                    .render(&mut surface)
                    .unwrap();
                surface.ops().len()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_path_data, bench_glyph_indices, bench_page_render);
criterion_main!(benches);
