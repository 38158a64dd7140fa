//! Drawing surface - output interface for page interpretation.
//!
//! The interpreter drives a `DrawingSurface` with a small 2D graphics model:
//! a save/restore state stack, a current transformation, a current path,
//! a clip, a source pattern and offscreen groups. Any vector backend can
//! implement it. `RecordingSurface` records every call and is what tests
//! and the dump tool use.

use std::fmt;

use crate::font::ScaledFont;
use crate::model::{FillRule, Pattern, PatternKind, StrokeStyle};
use crate::parser::glyph_indices::{PositionedGlyph, TextCluster};
use crate::utils::{MATRIX_IDENTITY, Matrix, Rectangle, mult_matrix, scale_matrix, translation_matrix};

/// Receiver of primitive path construction calls. Coordinates are absolute
/// user-space values.
pub trait PathSink {
    fn move_to(&mut self, x: f64, y: f64);

    fn line_to(&mut self, x: f64, y: f64);

    /// Cubic Bezier curve from the current point.
    fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64);

    fn close_path(&mut self);

    /// Fill rule requested by the path data itself.
    fn set_fill_rule(&mut self, _rule: FillRule) {}
}

/// Path segment for graphics operations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    /// Move to point (x, y)
    MoveTo(f64, f64),
    /// Line to point (x, y)
    LineTo(f64, f64),
    /// Cubic bezier curve (x1, y1, x2, y2, x3, y3)
    CurveTo(f64, f64, f64, f64, f64, f64),
    /// Close path
    ClosePath,
}

/// Collects path segments so a path can be measured before it is drawn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathBuilder {
    pub segments: Vec<PathSegment>,
    /// Fill rule set by an `F` command, if any.
    pub fill_rule: Option<FillRule>,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Bounding box of every point the path mentions, control points
    /// included.
    pub fn extents(&self) -> Option<Rectangle> {
        Rectangle::bounding(self.segments.iter().flat_map(|segment| {
            let points: smallvec::SmallVec<[(f64, f64); 3]> = match *segment {
                PathSegment::MoveTo(x, y) | PathSegment::LineTo(x, y) => {
                    smallvec::smallvec![(x, y)]
                }
                PathSegment::CurveTo(x1, y1, x2, y2, x3, y3) => {
                    smallvec::smallvec![(x1, y1), (x2, y2), (x3, y3)]
                }
                PathSegment::ClosePath => smallvec::SmallVec::new(),
            };
            points
        }))
    }

    /// End point of the last segment. A close returns to the start of its
    /// subpath.
    pub fn current_point(&self) -> Option<(f64, f64)> {
        let mut closing = false;
        for segment in self.segments.iter().rev() {
            match *segment {
                PathSegment::ClosePath => closing = true,
                PathSegment::MoveTo(x, y) => return Some((x, y)),
                PathSegment::LineTo(x, y) | PathSegment::CurveTo(_, _, _, _, x, y) if !closing => {
                    return Some((x, y));
                }
                _ => {}
            }
        }
        None
    }

    /// Emits the recorded segments to another sink.
    pub fn replay<S: PathSink + ?Sized>(&self, sink: &mut S) {
        if let Some(rule) = self.fill_rule {
            sink.set_fill_rule(rule);
        }
        for segment in &self.segments {
            match *segment {
                PathSegment::MoveTo(x, y) => sink.move_to(x, y),
                PathSegment::LineTo(x, y) => sink.line_to(x, y),
                PathSegment::CurveTo(x1, y1, x2, y2, x3, y3) => {
                    sink.curve_to(x1, y1, x2, y2, x3, y3)
                }
                PathSegment::ClosePath => sink.close_path(),
            }
        }
    }
}

impl PathSink for PathBuilder {
    fn move_to(&mut self, x: f64, y: f64) {
        self.segments.push(PathSegment::MoveTo(x, y));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.segments.push(PathSegment::LineTo(x, y));
    }

    fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) {
        self.segments
            .push(PathSegment::CurveTo(x1, y1, x2, y2, x3, y3));
    }

    fn close_path(&mut self) {
        self.segments.push(PathSegment::ClosePath);
    }

    fn set_fill_rule(&mut self, rule: FillRule) {
        self.fill_rule = Some(rule);
    }
}

/// Drawing surface trait - the 2D graphics model the interpreter renders
/// into.
///
/// Semantics follow a conventional immediate-mode vector API:
/// - `transform` pre-multiplies the current transformation, so the new
///   matrix applies before the existing one
/// - `clip` and `fill`/`stroke` (without preserve) consume the current path
/// - `push_group` implies a save; `pop_group` restores and returns the
///   group as a pattern whose matrix is the transformation current at the
///   time of the pop
pub trait DrawingSurface: PathSink {
    /// Handle to a closed offscreen group.
    type Layer: Clone + fmt::Debug;

    fn save(&mut self);

    fn restore(&mut self);

    /// Concatenates `matrix` with the current transformation.
    fn transform(&mut self, matrix: Matrix);

    fn translate(&mut self, tx: f64, ty: f64) {
        self.transform(translation_matrix(tx, ty));
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.transform(scale_matrix(sx, sy));
    }

    /// Discards the current path.
    fn new_path(&mut self);

    /// Appends a closed rectangle subpath.
    fn rectangle(&mut self, rect: &Rectangle) {
        self.move_to(rect.x, rect.y);
        self.line_to(rect.x + rect.width, rect.y);
        self.line_to(rect.x + rect.width, rect.y + rect.height);
        self.line_to(rect.x, rect.y + rect.height);
        self.close_path();
    }

    /// Intersects the clip with the current path and clears the path.
    fn clip(&mut self);

    fn set_source(&mut self, pattern: &Pattern<Self::Layer>);

    /// Fills the current path with the source. `preserve` keeps the path.
    fn fill(&mut self, preserve: bool);

    /// Strokes and clears the current path.
    fn stroke(&mut self, style: &StrokeStyle);

    /// Paints the source everywhere inside the clip with constant alpha.
    fn paint_with_alpha(&mut self, alpha: f64);

    fn push_group(&mut self);

    fn pop_group(&mut self) -> Pattern<Self::Layer>;

    fn pop_group_to_source(&mut self) {
        let pattern = self.pop_group();
        self.set_source(&pattern);
    }

    /// Paints the source using the alpha channel of `mask`.
    fn mask(&mut self, mask: &Pattern<Self::Layer>);

    /// Draws positioned glyphs with the source. `clusters` maps `text` to
    /// glyphs for surfaces that keep text.
    fn show_glyphs(
        &mut self,
        font: &ScaledFont,
        glyphs: &[PositionedGlyph],
        clusters: &[TextCluster],
        text: &str,
    );
}

/// One recorded surface call.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    Save,
    Restore,
    Transform(Matrix),
    NewPath,
    MoveTo(f64, f64),
    LineTo(f64, f64),
    CurveTo(f64, f64, f64, f64, f64, f64),
    ClosePath,
    SetFillRule(FillRule),
    Clip,
    SetSource(Pattern<usize>),
    Fill { preserve: bool },
    Stroke(StrokeStyle),
    PaintWithAlpha(f64),
    PushGroup,
    /// Closes the group with the given layer id.
    PopGroup(usize),
    Mask(Pattern<usize>),
    ShowGlyphs {
        font_matrix: Matrix,
        glyphs: Vec<PositionedGlyph>,
        clusters: Vec<TextCluster>,
        text: String,
    },
}

fn fmt_matrix(f: &mut fmt::Formatter<'_>, m: &Matrix) -> fmt::Result {
    write!(
        f,
        "[{:.3} {:.3} {:.3} {:.3} {:.3} {:.3}]",
        m.0, m.1, m.2, m.3, m.4, m.5
    )
}

fn fmt_pattern(f: &mut fmt::Formatter<'_>, pattern: &Pattern<usize>) -> fmt::Result {
    match &pattern.kind {
        PatternKind::Solid(c) => write!(
            f,
            "solid({:.3}, {:.3}, {:.3}, {:.3})",
            c.red, c.green, c.blue, c.alpha
        )?,
        PatternKind::Linear { start, end, stops } => write!(
            f,
            "linear({:.2},{:.2} -> {:.2},{:.2}, {} stops)",
            start.0,
            start.1,
            end.0,
            end.1,
            stops.len()
        )?,
        PatternKind::Radial {
            focus,
            center,
            radius,
            stops,
            ..
        } => write!(
            f,
            "radial({:.2},{:.2} -> {:.2},{:.2} r={:.2}, {} stops)",
            focus.0,
            focus.1,
            center.0,
            center.1,
            radius,
            stops.len()
        )?,
        PatternKind::Image { image, source } => write!(
            f,
            "image({}x{}, source {:.1},{:.1} {:.1}x{:.1})",
            image.width, image.height, source.x, source.y, source.width, source.height
        )?,
        PatternKind::Layer(id) => write!(f, "layer#{id}")?,
    }
    write!(f, " extend={:?} matrix=", pattern.extend)?;
    fmt_matrix(f, &pattern.matrix)
}

impl fmt::Display for SurfaceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Save => write!(f, "save"),
            Self::Restore => write!(f, "restore"),
            Self::Transform(m) => {
                write!(f, "transform ")?;
                fmt_matrix(f, m)
            }
            Self::NewPath => write!(f, "new_path"),
            Self::MoveTo(x, y) => write!(f, "move_to {x:.2} {y:.2}"),
            Self::LineTo(x, y) => write!(f, "line_to {x:.2} {y:.2}"),
            Self::CurveTo(x1, y1, x2, y2, x3, y3) => write!(
                f,
                "curve_to {x1:.2} {y1:.2} {x2:.2} {y2:.2} {x3:.2} {y3:.2}"
            ),
            Self::ClosePath => write!(f, "close_path"),
            Self::SetFillRule(rule) => write!(f, "set_fill_rule {rule:?}"),
            Self::Clip => write!(f, "clip"),
            Self::SetSource(pattern) => {
                write!(f, "set_source ")?;
                fmt_pattern(f, pattern)
            }
            Self::Fill { preserve } => write!(f, "fill preserve={preserve}"),
            Self::Stroke(style) => write!(
                f,
                "stroke width={:.2} cap={:?} join={:?} dashes={:?}",
                style.width,
                style.cap,
                style.join,
                style.dash.as_slice()
            ),
            Self::PaintWithAlpha(alpha) => write!(f, "paint_with_alpha {alpha:.3}"),
            Self::PushGroup => write!(f, "push_group"),
            Self::PopGroup(id) => write!(f, "pop_group layer#{id}"),
            Self::Mask(pattern) => {
                write!(f, "mask ")?;
                fmt_pattern(f, pattern)
            }
            Self::ShowGlyphs {
                font_matrix,
                glyphs,
                text,
                ..
            } => {
                write!(f, "show_glyphs {} glyphs {text:?} font=", glyphs.len())?;
                fmt_matrix(f, font_matrix)
            }
        }
    }
}

/// Surface that records calls instead of drawing. It tracks the current
/// transformation so group patterns carry the right matrix.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    ops: Vec<SurfaceOp>,
    ctm: Matrix,
    saved: Vec<Matrix>,
    groups: Vec<usize>,
    next_layer: usize,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            ctm: MATRIX_IDENTITY,
            saved: Vec::new(),
            groups: Vec::new(),
            next_layer: 0,
        }
    }

    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<SurfaceOp> {
        self.ops
    }

    /// Current transformation matrix.
    pub fn ctm(&self) -> Matrix {
        self.ctm
    }

    /// Number of saves (explicit or implied by groups) not yet restored.
    pub fn save_depth(&self) -> usize {
        self.saved.len()
    }

    /// Number of groups pushed and not yet popped.
    pub fn group_depth(&self) -> usize {
        self.groups.len()
    }
}

impl PathSink for RecordingSurface {
    fn move_to(&mut self, x: f64, y: f64) {
        self.ops.push(SurfaceOp::MoveTo(x, y));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.ops.push(SurfaceOp::LineTo(x, y));
    }

    fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) {
        self.ops.push(SurfaceOp::CurveTo(x1, y1, x2, y2, x3, y3));
    }

    fn close_path(&mut self) {
        self.ops.push(SurfaceOp::ClosePath);
    }

    fn set_fill_rule(&mut self, rule: FillRule) {
        self.ops.push(SurfaceOp::SetFillRule(rule));
    }
}

impl DrawingSurface for RecordingSurface {
    type Layer = usize;

    fn save(&mut self) {
        self.saved.push(self.ctm);
        self.ops.push(SurfaceOp::Save);
    }

    fn restore(&mut self) {
        match self.saved.pop() {
            Some(ctm) => self.ctm = ctm,
            None => tracing::warn!("restore without matching save"),
        }
        self.ops.push(SurfaceOp::Restore);
    }

    fn transform(&mut self, matrix: Matrix) {
        self.ctm = mult_matrix(matrix, self.ctm);
        self.ops.push(SurfaceOp::Transform(matrix));
    }

    fn new_path(&mut self) {
        self.ops.push(SurfaceOp::NewPath);
    }

    fn clip(&mut self) {
        self.ops.push(SurfaceOp::Clip);
    }

    fn set_source(&mut self, pattern: &Pattern<usize>) {
        self.ops.push(SurfaceOp::SetSource(pattern.clone()));
    }

    fn fill(&mut self, preserve: bool) {
        self.ops.push(SurfaceOp::Fill { preserve });
    }

    fn stroke(&mut self, style: &StrokeStyle) {
        self.ops.push(SurfaceOp::Stroke(style.clone()));
    }

    fn paint_with_alpha(&mut self, alpha: f64) {
        self.ops.push(SurfaceOp::PaintWithAlpha(alpha));
    }

    fn push_group(&mut self) {
        self.saved.push(self.ctm);
        self.groups.push(self.next_layer);
        self.next_layer += 1;
        self.ops.push(SurfaceOp::PushGroup);
    }

    fn pop_group(&mut self) -> Pattern<usize> {
        let id = self.groups.pop().unwrap_or_else(|| {
            tracing::warn!("pop_group without matching push_group");
            usize::MAX
        });
        if let Some(ctm) = self.saved.pop() {
            self.ctm = ctm;
        }
        self.ops.push(SurfaceOp::PopGroup(id));
        Pattern::new(PatternKind::Layer(id)).with_matrix(self.ctm)
    }

    fn mask(&mut self, mask: &Pattern<usize>) {
        self.ops.push(SurfaceOp::Mask(mask.clone()));
    }

    fn show_glyphs(
        &mut self,
        font: &ScaledFont,
        glyphs: &[PositionedGlyph],
        clusters: &[TextCluster],
        text: &str,
    ) {
        self.ops.push(SurfaceOp::ShowGlyphs {
            font_matrix: font.font_matrix,
            glyphs: glyphs.to_vec(),
            clusters: clusters.to_vec(),
            text: text.to_string(),
        });
    }
}
