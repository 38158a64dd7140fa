mod common;

use std::sync::Arc;

use oxps_core::document::{ArchiveReader, MemoryArchive, PageRenderer, XpsArchive};
use oxps_core::image::{Image, ImageProvider};
use oxps_core::interp::{RecordingSurface, SurfaceOp};
use oxps_core::model::{Color, Extend, FillRule, Pattern, PatternKind, StrokeStyle};
use oxps_core::parser::{PositionedGlyph, TextCluster};
use oxps_core::utils::{Matrix, Rectangle};
use oxps_core::{RenderOptions, XpsError};

use common::{
    PAGE, TestFonts, archive_with_page, assert_balanced, render, render_archive, render_ok,
    solid_rgba, sources,
};

const RED: &str = "#FF0000";

fn red() -> Pattern<usize> {
    Pattern::solid(Color::rgba(1.0, 0.0, 0.0, 1.0))
}

fn assert_close(got: f64, want: f64) {
    assert!((got - want).abs() < 1e-9, "{got} != {want}");
}

// ============================================================================
// Paths
// ============================================================================

#[test]
fn test_filled_path_ops() {
    let ops = render_ok(r##"<Path Data="M 0,0 L 10,0 10,10 Z" Fill="#FF0000"/>"##);
    assert_eq!(
        ops,
        vec![
            SurfaceOp::Save,
            SurfaceOp::SetFillRule(FillRule::EvenOdd),
            SurfaceOp::NewPath,
            SurfaceOp::MoveTo(0.0, 0.0),
            SurfaceOp::LineTo(10.0, 0.0),
            SurfaceOp::LineTo(10.0, 10.0),
            SurfaceOp::ClosePath,
            SurfaceOp::SetSource(red()),
            SurfaceOp::Fill { preserve: false },
            SurfaceOp::Restore,
        ]
    );
}

#[test]
fn test_fill_and_stroke_preserve_path() {
    let ops = render_ok(
        r##"<Path Data="F1 M 0,0 L 5,5" Fill="#FF0000" Stroke="#0000FF" StrokeThickness="2" StrokeLineJoin="Round"/>"##,
    );
    let fill = ops
        .iter()
        .position(|op| *op == SurfaceOp::Fill { preserve: true })
        .expect("fill keeps the path");
    let SurfaceOp::Stroke(style) = &ops[fill + 2] else {
        panic!("expected a stroke after the fill, got {:?}", ops[fill + 2]);
    };
    assert_eq!(style.width, 2.0);
    assert_eq!(style.join, oxps_core::model::LineJoin::Round);
    assert!(ops.contains(&SurfaceOp::SetFillRule(FillRule::NonZero)));
}

#[test]
fn test_path_clip_applies_before_drawing() {
    let ops = render_ok(r##"<Path Data="M 0,0 L 9,9" Clip="M 0,0 L 5,0 5,5 Z" Fill="#FF0000"/>"##);
    let clip = ops.iter().position(|op| *op == SurfaceOp::Clip).expect("clip");
    let fill = ops
        .iter()
        .position(|op| matches!(op, SurfaceOp::Fill { .. }))
        .expect("fill");
    assert!(clip < fill);
}

#[test]
fn test_path_without_paint_draws_nothing() {
    let ops = render_ok(r#"<Path Data="M 0,0 L 9,9"/>"#);
    assert!(sources(&ops).is_empty());
    assert!(!ops.iter().any(|op| matches!(op, SurfaceOp::Fill { .. } | SurfaceOp::Stroke(_))));
}

#[test]
fn test_path_figure_children() {
    let ops = render_ok(
        r##"<Path Fill="#FF0000">
              <Path.Data>
                <PathGeometry FillRule="NonZero">
                  <PathFigure StartPoint="0,0" IsClosed="true">
                    <PolyLineSegment Points="10,0 10,10"/>
                  </PathFigure>
                </PathGeometry>
              </Path.Data>
            </Path>"##,
    );
    assert_eq!(
        ops,
        vec![
            SurfaceOp::Save,
            SurfaceOp::SetFillRule(FillRule::NonZero),
            SurfaceOp::NewPath,
            SurfaceOp::MoveTo(0.0, 0.0),
            SurfaceOp::LineTo(10.0, 0.0),
            SurfaceOp::LineTo(10.0, 10.0),
            SurfaceOp::ClosePath,
            SurfaceOp::SetSource(red()),
            SurfaceOp::Fill { preserve: false },
            SurfaceOp::Restore,
        ]
    );
}

#[test]
fn test_quadratic_segment_becomes_cubic() {
    let ops = render_ok(
        r##"<Path Stroke="#000000">
              <Path.Data>
                <PathGeometry>
                  <PathFigure StartPoint="0,0">
                    <PolyQuadraticBezierSegment Points="3,3 6,0"/>
                  </PathFigure>
                </PathGeometry>
              </Path.Data>
            </Path>"##,
    );
    let curve = ops
        .iter()
        .find_map(|op| match *op {
            SurfaceOp::CurveTo(x1, y1, x2, y2, x3, y3) => Some([x1, y1, x2, y2, x3, y3]),
            _ => None,
        })
        .expect("curve");
    for (got, want) in curve.into_iter().zip([2.0, 2.0, 4.0, 2.0, 6.0, 0.0]) {
        assert_close(got, want);
    }
}

#[test]
fn test_incomplete_bezier_segment_is_an_error() {
    let (result, surface) = render(
        r##"<Path Stroke="#000000">
              <Path.Data>
                <PathGeometry>
                  <PathFigure StartPoint="0,0">
                    <PolyBezierSegment Points="1,1 2,2"/>
                  </PathFigure>
                </PathGeometry>
              </Path.Data>
            </Path>"##,
    );
    assert!(matches!(result, Err(XpsError::InvalidContent { .. })));
    assert_balanced(&surface);
}

#[test]
fn test_invalid_path_data_fails_the_page() {
    let (result, surface) = render(r##"<Path Data="M 0,0 L" Fill="#FF0000"/>"##);
    assert!(matches!(result, Err(XpsError::PathParse { .. })));
    assert_balanced(&surface);
}

// ============================================================================
// Canvas
// ============================================================================

#[test]
fn test_canvas_opacity_group() {
    let ops = render_ok(
        r##"<Canvas Opacity="0.5" RenderTransform="1,0,0,1,10,0">
              <Path Data="M 0,0 L 1,1" Stroke="#000000"/>
            </Canvas>"##,
    );
    let shift = (1.0, 0.0, 0.0, 1.0, 10.0, 0.0);
    assert_eq!(
        ops,
        vec![
            SurfaceOp::Save,
            SurfaceOp::Transform(shift),
            SurfaceOp::PushGroup,
            SurfaceOp::Save,
            SurfaceOp::SetFillRule(FillRule::EvenOdd),
            SurfaceOp::NewPath,
            SurfaceOp::MoveTo(0.0, 0.0),
            SurfaceOp::LineTo(1.0, 1.0),
            SurfaceOp::SetSource(Pattern::solid(Color::BLACK)),
            SurfaceOp::Stroke(StrokeStyle::default()),
            SurfaceOp::Restore,
            SurfaceOp::PopGroup(0),
            SurfaceOp::SetSource(Pattern::new(PatternKind::Layer(0)).with_matrix(shift)),
            SurfaceOp::PaintWithAlpha(0.5),
            SurfaceOp::Restore,
        ]
    );
}

#[test]
fn test_canvas_opacity_mask_masks_content() {
    let ops = render_ok(
        r##"<Canvas>
              <Canvas.OpacityMask>
                <SolidColorBrush Color="#80000000"/>
              </Canvas.OpacityMask>
              <Path Data="M 0,0 L 1,1" Stroke="#000000"/>
            </Canvas>"##,
    );
    assert!(ops.contains(&SurfaceOp::PushGroup));
    assert!(matches!(ops[ops.len() - 2], SurfaceOp::Mask(_)));
}

#[test]
fn test_unknown_content_is_skipped_unless_strict() {
    let ops = render_ok(r#"<Ellipse Width="3"/>"#);
    assert!(ops.is_empty());

    let options = RenderOptions::new().with_strict_unknown_elements(true);
    let (result, surface) = render_archive(archive_with_page(r#"<Ellipse Width="3"/>"#), options);
    assert!(matches!(
        result,
        Err(XpsError::UnknownElement { ref element, .. }) if element == "Ellipse"
    ));
    assert_balanced(&surface);
}

#[test]
fn test_error_unwinds_open_groups() {
    let (result, surface) = render(
        r##"<Canvas Opacity="0.5">
              <Path Data="M 0,0 L 1,1" Fill="#FF0000"/>
              <Glyphs OriginX="0" OriginY="0" FontRenderingEmSize="10" UnicodeString="a"/>
            </Canvas>"##,
    );
    assert!(matches!(
        result,
        Err(XpsError::MissingAttribute { ref attribute, .. }) if attribute == "FontUri"
    ));
    assert_balanced(&surface);
}

#[test]
fn test_malformed_color_is_an_error() {
    let (result, surface) = render(r##"<Path Data="M 0,0 L 1,1" Fill="#12"/>"##);
    assert!(matches!(
        result,
        Err(XpsError::InvalidContent { ref attribute, .. }) if attribute == "Fill"
    ));
    assert_balanced(&surface);
}

// ============================================================================
// Resources
// ============================================================================

#[test]
fn test_static_resources() {
    let ops = render_ok(
        r##"<FixedPage.Resources>
              <ResourceDictionary>
                <SolidColorBrush x:Key="red" Color="#FF0000"/>
                <MatrixTransform x:Key="shift" Matrix="1,0,0,1,5,6"/>
                <PathGeometry x:Key="tri" Figures="M 0,0 L 4,0 4,4 Z"/>
              </ResourceDictionary>
            </FixedPage.Resources>
            <Path Data="{StaticResource tri}" Fill="{StaticResource red}" RenderTransform="{StaticResource shift}"/>"##,
    );
    assert_eq!(
        ops,
        vec![
            SurfaceOp::Save,
            SurfaceOp::Transform((1.0, 0.0, 0.0, 1.0, 5.0, 6.0)),
            SurfaceOp::SetFillRule(FillRule::EvenOdd),
            SurfaceOp::NewPath,
            SurfaceOp::MoveTo(0.0, 0.0),
            SurfaceOp::LineTo(4.0, 0.0),
            SurfaceOp::LineTo(4.0, 4.0),
            SurfaceOp::ClosePath,
            SurfaceOp::SetSource(red()),
            SurfaceOp::Fill { preserve: false },
            SurfaceOp::Restore,
        ]
    );
}

#[test]
fn test_canvas_resources_shadow_page_resources() {
    let ops = render_ok(
        r##"<FixedPage.Resources>
              <ResourceDictionary>
                <SolidColorBrush x:Key="ink" Color="#FF0000"/>
              </ResourceDictionary>
            </FixedPage.Resources>
            <Canvas>
              <Canvas.Resources>
                <ResourceDictionary>
                  <SolidColorBrush x:Key="ink" Color="#0000FF"/>
                </ResourceDictionary>
              </Canvas.Resources>
              <Path Data="M 0,0 L 1,1" Fill="{StaticResource ink}"/>
            </Canvas>
            <Path Data="M 0,0 L 1,1" Fill="{StaticResource ink}"/>"##,
    );
    let colors: Vec<_> = sources(&ops).iter().filter_map(solid_rgba).collect();
    assert_eq!(colors, vec![(0.0, 0.0, 1.0, 1.0), (1.0, 0.0, 0.0, 1.0)]);
}

#[test]
fn test_gradient_resource_replays_stops() {
    let ops = render_ok(
        r##"<FixedPage.Resources>
              <ResourceDictionary>
                <LinearGradientBrush x:Key="fade" StartPoint="0,0" EndPoint="10,0">
                  <LinearGradientBrush.GradientStops>
                    <GradientStop Color="#FF0000" Offset="0"/>
                    <GradientStop Color="#0000FF" Offset="1"/>
                  </LinearGradientBrush.GradientStops>
                </LinearGradientBrush>
              </ResourceDictionary>
            </FixedPage.Resources>
            <Path Data="M 0,0 L 1,1" Fill="{StaticResource fade}"/>"##,
    );
    let fill = &sources(&ops)[0];
    assert!(matches!(fill.kind, PatternKind::Linear { .. }));
    assert_eq!(fill.stops().len(), 2);
}

#[test]
fn test_missing_resource_key() {
    let (result, surface) = render(r#"<Path Data="M 0,0 L 1,1" Fill="{StaticResource nope}"/>"#);
    assert!(matches!(result, Err(XpsError::ResourceNotFound(ref key)) if key == "nope"));
    assert_balanced(&surface);
}

#[test]
fn test_resource_entry_without_key() {
    let (result, _) = render(
        r##"<FixedPage.Resources>
              <ResourceDictionary>
                <SolidColorBrush Color="#FF0000"/>
              </ResourceDictionary>
            </FixedPage.Resources>"##,
    );
    assert!(matches!(
        result,
        Err(XpsError::MissingAttribute { ref attribute, .. }) if attribute == "x:Key"
    ));
}

#[test]
fn test_remote_dictionary() {
    let archive = archive_with_page(
        r#"<FixedPage.Resources>
             <ResourceDictionary Source="../Resources/shared.dict"/>
           </FixedPage.Resources>
           <Path Data="M 0,0 L 1,1" Fill="{StaticResource blue}"/>"#,
    )
    .with_part(
        "/Documents/1/Resources/shared.dict",
        r##"<ResourceDictionary xmlns="http://schemas.microsoft.com/xps/2005/06" xmlns:x="http://schemas.microsoft.com/xps/2005/06/resourcedictionary-key">
              <SolidColorBrush x:Key="blue" Color="#0000FF"/>
            </ResourceDictionary>"##,
    );
    let (result, surface) = render_archive(archive, RenderOptions::default());
    result.expect("render");
    let colors: Vec<_> = sources(surface.ops()).iter().filter_map(solid_rgba).collect();
    assert_eq!(colors, vec![(0.0, 0.0, 1.0, 1.0)]);
}

#[test]
fn test_remote_dictionary_rejects_inline_content() {
    let archive = archive_with_page(
        r#"<FixedPage.Resources>
             <ResourceDictionary Source="../Resources/shared.dict">
               <ResourceDictionary/>
             </ResourceDictionary>
           </FixedPage.Resources>"#,
    )
    .with_part(
        "/Documents/1/Resources/shared.dict",
        r#"<ResourceDictionary xmlns="http://schemas.microsoft.com/xps/2005/06"/>"#,
    );
    let (result, surface) = render_archive(archive, RenderOptions::default());
    assert!(matches!(
        result,
        Err(XpsError::UnknownElement { ref element, .. }) if element == "ResourceDictionary"
    ));
    assert_balanced(&surface);
}

#[test]
fn test_missing_remote_dictionary() {
    let (result, surface) = render(
        r#"<FixedPage.Resources>
             <ResourceDictionary Source="../Resources/absent.dict"/>
           </FixedPage.Resources>"#,
    );
    assert!(matches!(
        result,
        Err(XpsError::ResourceNotFound(ref uri)) if uri == "/Documents/1/Resources/absent.dict"
    ));
    assert_balanced(&surface);
}

// ============================================================================
// Brushes
// ============================================================================

#[test]
fn test_gradient_stops_keep_order_and_take_opacity() {
    let ops = render_ok(
        r##"<Path Data="M 0,0 L 10,0 10,10 Z">
              <Path.Fill>
                <LinearGradientBrush StartPoint="0,0" EndPoint="10,0" Opacity="0.5">
                  <LinearGradientBrush.GradientStops>
                    <GradientStop Color="#0000FF" Offset="0.5"/>
                    <GradientStop Color="#FF0000" Offset="0.1"/>
                    <GradientStop Color="#00FF00" Offset="0.9"/>
                  </LinearGradientBrush.GradientStops>
                </LinearGradientBrush>
              </Path.Fill>
            </Path>"##,
    );
    let fill = &sources(&ops)[0];
    assert_eq!(fill.extend, Extend::Pad);
    let offsets: Vec<_> = fill.stops().iter().map(|stop| stop.offset).collect();
    assert_eq!(offsets, vec![0.5, 0.1, 0.9]);
    assert!(fill.stops().iter().all(|stop| stop.color.alpha == 0.5));
}

#[test]
fn test_gradient_stop_rejects_unknown_attribute() {
    let (result, surface) = render(
        r##"<Path Data="M 0,0 L 1,1">
              <Path.Fill>
                <LinearGradientBrush StartPoint="0,0" EndPoint="1,0">
                  <LinearGradientBrush.GradientStops>
                    <GradientStop Color="#0000FF" Offset="1" Name="x"/>
                  </LinearGradientBrush.GradientStops>
                </LinearGradientBrush>
              </Path.Fill>
            </Path>"##,
    );
    assert!(matches!(result, Err(XpsError::UnknownAttribute { .. })));
    assert_balanced(&surface);
}

#[test]
fn test_radial_gradient_focus_and_ellipse() {
    let ops = render_ok(
        r##"<Path Data="M 0,0 L 20,20">
              <Path.Fill>
                <RadialGradientBrush Center="10,10" GradientOrigin="14,10" RadiusX="8" RadiusY="4">
                  <RadialGradientBrush.GradientStops>
                    <GradientStop Color="#FFFFFF" Offset="0"/>
                    <GradientStop Color="#000000" Offset="1"/>
                  </RadialGradientBrush.GradientStops>
                </RadialGradientBrush>
              </Path.Fill>
            </Path>"##,
    );
    let fill = &sources(&ops)[0];
    let PatternKind::Radial {
        focus,
        center,
        radius,
        ..
    } = fill.kind
    else {
        panic!("expected a radial pattern, got {:?}", fill.kind);
    };
    assert_eq!(center, (10.0, 10.0));
    assert_eq!(radius, 4.0);
    assert_close(focus.0, 12.0);
    assert_close(focus.1, 10.0);

    let (a, b, c, d, e, f) = fill.matrix;
    for (got, want) in [a, b, c, d, e, f].into_iter().zip([0.5, 0.0, 0.0, 1.0, 5.0, 0.0]) {
        assert_close(got, want);
    }
}

const IMAGE_PATH: &str = r#"<Path Data="M 0,0 L 4,0 4,4 Z">
      <Path.Fill>
        <ImageBrush ImageSource="../Resources/Images/tile.png" Viewport="0,0,4,4" Viewbox="0,0,4,4"
                    ViewportUnits="Absolute" ViewboxUnits="Absolute" TileMode="Tile"OPACITY/>
      </Path.Fill>
    </Path>"#;

#[test]
fn test_image_brush_pattern() {
    let ops = render_ok(&IMAGE_PATH.replace("OPACITY", ""));
    let fill = &sources(&ops)[0];
    let PatternKind::Image { image, source } = &fill.kind else {
        panic!("expected an image pattern, got {:?}", fill.kind);
    };
    assert_eq!((image.width, image.height), (4, 4));
    assert_eq!(*source, Rectangle::new(0.0, 0.0, 4.0, 4.0));
    assert_eq!(fill.extend, Extend::Repeat);
    assert_eq!(fill.matrix, (1.0, 0.0, 0.0, 1.0, 0.0, 0.0));
}

/// Serves every image at twice the default resolution.
struct HiResImages;

impl ImageProvider for HiResImages {
    fn get_image(&self, _archive: &dyn ArchiveReader, _uri: &str) -> oxps_core::Result<Arc<Image>> {
        Ok(Arc::new(Image::new(8, 8, vec![255; 256]).with_resolution(192.0, 192.0)))
    }
}

#[test]
fn test_image_viewbox_follows_resolution() {
    let archive = XpsArchive::new(archive_with_page(&IMAGE_PATH.replace("OPACITY", "")));
    let mut surface = RecordingSurface::new();
    PageRenderer::new(&archive, PAGE, &TestFonts)
        .with_image_provider(&HiResImages)
        .render(&mut surface)
        .expect("render");
    let fill = &sources(surface.ops())[0];
    let PatternKind::Image { source, .. } = &fill.kind else {
        panic!("expected an image pattern, got {:?}", fill.kind);
    };
    assert_eq!(*source, Rectangle::new(0.0, 0.0, 8.0, 8.0));
    assert_eq!(fill.matrix, (2.0, 0.0, 0.0, 2.0, 0.0, 0.0));
}

#[test]
fn test_image_brush_opacity_renders_a_layer() {
    let ops = render_ok(&IMAGE_PATH.replace("OPACITY", r#" Opacity="0.5""#));
    assert!(ops.contains(&SurfaceOp::PaintWithAlpha(0.5)));
    let fill = sources(&ops).pop().expect("fill source");
    assert_eq!(fill.kind, PatternKind::Layer(0));
}

#[test]
fn test_undecodable_image_omits_fill() {
    let archive = XpsArchive::new(archive_with_page(&IMAGE_PATH.replace("OPACITY", "")));
    let mut surface = RecordingSurface::new();
    PageRenderer::new(&archive, PAGE, &TestFonts)
        .render(&mut surface)
        .expect("render");
    assert!(sources(surface.ops()).is_empty());
    assert!(!surface.ops().iter().any(|op| matches!(op, SurfaceOp::Fill { .. })));
}

const VISUAL_PATH: &str = r##"<Path Data="M 0,0 L 20,0 20,20 Z">
      <Path.Fill>
        <VisualBrush Viewport="0,0,20,20" Viewbox="0,0,10,10" TileMode="None">
          <VisualBrush.Visual>
            <Path Data="M 0,0 L 10,10" Stroke="#000000"/>
          </VisualBrush.Visual>
        </VisualBrush>
      </Path.Fill>
    </Path>"##;

#[test]
fn test_visual_brush_renders_into_a_group() {
    let ops = render_ok(VISUAL_PATH);
    let push = ops.iter().position(|op| *op == SurfaceOp::PushGroup).expect("group");
    assert_eq!(ops[push - 1], SurfaceOp::Clip);
    assert_eq!(ops[push + 1], SurfaceOp::Transform((2.0, 0.0, 0.0, 2.0, 0.0, 0.0)));
    assert!(ops.contains(&SurfaceOp::PopGroup(0)));

    let fill = sources(&ops).pop().expect("fill source");
    assert_eq!(fill.kind, PatternKind::Layer(0));
    assert_eq!(fill.matrix, (1.0, 0.0, 0.0, 1.0, 0.0, 0.0));
}

#[test]
fn test_visual_brush_nesting_limit() {
    let options = RenderOptions::new().with_max_visual_depth(0);
    let (result, surface) = render_archive(archive_with_page(VISUAL_PATH), options);
    assert!(matches!(result, Err(XpsError::NestingTooDeep(0))));
    assert_balanced(&surface);
}

// ============================================================================
// Glyphs
// ============================================================================

#[test]
fn test_glyph_run() {
    let ops = render_ok(
        r##"<Glyphs FontUri="../Resources/Fonts/test.ttf" FontRenderingEmSize="10"
                    OriginX="5" OriginY="20" UnicodeString="ab" Fill="#000000"/>"##,
    );
    assert_eq!(
        ops,
        vec![
            SurfaceOp::Save,
            SurfaceOp::SetSource(Pattern::solid(Color::BLACK)),
            SurfaceOp::ShowGlyphs {
                font_matrix: (10.0, 0.0, 0.0, 10.0, 0.0, 0.0),
                glyphs: vec![
                    PositionedGlyph { index: 97, x: 5.0, y: 20.0 },
                    PositionedGlyph { index: 98, x: 10.0, y: 20.0 },
                ],
                clusters: vec![TextCluster { num_bytes: 1, num_glyphs: 1 }; 2],
                text: "ab".to_string(),
            },
            SurfaceOp::Restore,
        ]
    );
}

#[test]
fn test_italic_simulation_shears_font_matrix() {
    let ops = render_ok(
        r##"<Glyphs FontUri="../Resources/Fonts/test.ttf" FontRenderingEmSize="10"
                    OriginX="0" OriginY="0" UnicodeString="a" StyleSimulations="ItalicSimulation"/>"##,
    );
    let font_matrix = ops
        .iter()
        .find_map(|op| match op {
            SurfaceOp::ShowGlyphs { font_matrix, .. } => Some(*font_matrix),
            _ => None,
        })
        .expect("glyphs");
    assert_close(font_matrix.2, -3.42);
}

fn shown_glyphs(ops: &[SurfaceOp]) -> (Matrix, Vec<PositionedGlyph>, String) {
    ops.iter()
        .find_map(|op| match op {
            SurfaceOp::ShowGlyphs {
                font_matrix,
                glyphs,
                text,
                ..
            } => Some((*font_matrix, glyphs.clone(), text.clone())),
            _ => None,
        })
        .expect("glyphs")
}

#[test]
fn test_sideways_run_rotates_font_matrix() {
    let ops = render_ok(
        r##"<Glyphs FontUri="../Resources/Fonts/test.ttf" FontRenderingEmSize="10"
                    OriginX="5" OriginY="20" UnicodeString="a" IsSideways="true"/>"##,
    );
    let (font_matrix, glyphs, _) = shown_glyphs(&ops);
    let (a, b, c, d, e, f) = font_matrix;
    for (found, expected) in [(a, 0.0), (b, -10.0), (c, 10.0), (d, 0.0), (e, 0.0), (f, 0.0)] {
        assert_close(found, expected);
    }
    assert_close(glyphs[0].x, 12.0);
    assert_close(glyphs[0].y, 22.5);
}

#[test]
fn test_escaped_unicode_string_drops_prefix() {
    let ops = render_ok(
        r##"<Glyphs FontUri="../Resources/Fonts/test.ttf" FontRenderingEmSize="10"
                    OriginX="0" OriginY="0" UnicodeString="{}{abc}"/>"##,
    );
    let (_, glyphs, text) = shown_glyphs(&ops);
    assert_eq!(text, "{abc}");
    let indices: Vec<_> = glyphs.iter().map(|glyph| glyph.index).collect();
    assert_eq!(indices, vec!['{' as u32, 97, 98, 99, '}' as u32]);
}

#[test]
fn test_missing_font_fails_the_page() {
    let (result, surface) = render(
        r##"<Canvas Opacity="0.5">
              <Glyphs FontUri="../Resources/Fonts/absent.ttf" FontRenderingEmSize="10"
                      OriginX="0" OriginY="0" UnicodeString="a" Fill="#000000"/>
            </Canvas>"##,
    );
    assert!(matches!(result, Err(XpsError::Font(_))));
    assert_balanced(&surface);
}

// ============================================================================
// Page Size
// ============================================================================

fn page_size(page: &str) -> oxps_core::Result<(f64, f64)> {
    let archive = XpsArchive::new(MemoryArchive::new().with_part(PAGE, page));
    PageRenderer::new(&archive, PAGE, &TestFonts).size()
}

#[test]
fn test_page_size() {
    let size = page_size(r#"<FixedPage Width="816" Height="1056"/>"#).expect("size");
    assert_eq!(size, (816.0, 1056.0));
}

#[test]
fn test_page_size_errors() {
    assert!(matches!(
        page_size(r#"<Canvas Width="816" Height="1056"/>"#),
        Err(XpsError::UnknownElement { .. })
    ));
    assert!(matches!(
        page_size(r#"<FixedPage Width="816"/>"#),
        Err(XpsError::MissingAttribute { ref attribute, .. }) if attribute == "Height"
    ));
    assert!(matches!(
        page_size(r#"<FixedPage Width="0.5" Height="10"/>"#),
        Err(XpsError::InvalidContent { ref attribute, .. }) if attribute == "Width"
    ));

    let archive = XpsArchive::new(MemoryArchive::new());
    let renderer = PageRenderer::new(&archive, PAGE, &TestFonts);
    assert!(matches!(renderer.size(), Err(XpsError::ResourceNotFound(_))));
}
