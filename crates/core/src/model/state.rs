//! Per-element render state.
//!
//! `PathState` is the state of a `Path` element (shared by each of its
//! `PathFigure`s); `GlyphRun` is the state of a `Glyphs` element.

use smallvec::SmallVec;

use super::brush::Pattern;

/// Fill rule for path filling and clipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    #[default]
    EvenOdd,
    NonZero,
}

impl FillRule {
    /// Parses a `FillRule` attribute value. Unknown values fall back to
    /// even-odd.
    pub fn parse(value: &str) -> Self {
        match value {
            "NonZero" => Self::NonZero,
            "EvenOdd" => Self::EvenOdd,
            other => {
                tracing::debug!(value = other, "unknown fill rule, using EvenOdd");
                Self::EvenOdd
            }
        }
    }
}

/// Line cap style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

impl LineCap {
    /// Parses `Flat`, `Round` or `Square`. `Triangle` has no surface
    /// equivalent and falls back to butt caps.
    pub fn parse(value: &str) -> Self {
        match value {
            "Flat" => Self::Butt,
            "Round" => Self::Round,
            "Square" => Self::Square,
            other => {
                tracing::debug!(value = other, "unsupported line cap");
                Self::Butt
            }
        }
    }
}

/// Line join style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Bevel,
    Round,
}

impl LineJoin {
    pub fn parse(value: &str) -> Self {
        match value {
            "Miter" => Self::Miter,
            "Bevel" => Self::Bevel,
            "Round" => Self::Round,
            other => {
                tracing::debug!(value = other, "unsupported line join");
                Self::Miter
            }
        }
    }
}

/// Dash lengths, in multiples of the stroke width.
pub type DashArray = SmallVec<[f64; 4]>;

/// Everything the surface needs to stroke a path.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    pub width: f64,
    pub dash: DashArray,
    pub dash_offset: f64,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f64,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 1.0,
            dash: DashArray::new(),
            dash_offset: 0.0,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            miter_limit: 10.0,
        }
    }
}

/// State of a `Path` element while its children are parsed.
#[derive(Debug, Clone)]
pub struct PathState<L> {
    /// Abbreviated geometry from the `Data` attribute or a `PathGeometry`
    /// with `Figures`.
    pub data: Option<String>,
    /// Abbreviated clip geometry.
    pub clip_data: Option<String>,
    pub fill_rule: FillRule,
    pub stroke: StrokeStyle,
    pub fill_pattern: Option<Pattern<L>>,
    pub stroke_pattern: Option<Pattern<L>>,
    pub opacity_mask: Option<Pattern<L>>,
    pub opacity: f64,
    /// Current figure flags, reset by each `PathFigure`.
    pub is_closed: bool,
    pub is_filled: bool,
}

impl<L> Default for PathState<L> {
    fn default() -> Self {
        Self {
            data: None,
            clip_data: None,
            fill_rule: FillRule::EvenOdd,
            stroke: StrokeStyle::default(),
            fill_pattern: None,
            stroke_pattern: None,
            opacity_mask: None,
            opacity: 1.0,
            is_closed: false,
            is_filled: true,
        }
    }
}

/// State of a `Glyphs` element while its children are parsed.
#[derive(Debug, Clone)]
pub struct GlyphRun<L> {
    /// Font part name, already resolved against the page.
    pub font_uri: String,
    pub em_size: f64,
    pub origin_x: f64,
    pub origin_y: f64,
    pub fill_pattern: Option<Pattern<L>>,
    pub opacity_mask: Option<Pattern<L>>,
    pub text: Option<String>,
    pub indices: Option<String>,
    pub clip_data: Option<String>,
    pub bidi_level: i32,
    pub is_sideways: bool,
    pub italic: bool,
    pub opacity: f64,
}

impl<L> GlyphRun<L> {
    pub fn new(font_uri: String, em_size: f64, origin_x: f64, origin_y: f64) -> Self {
        Self {
            font_uri,
            em_size,
            origin_x,
            origin_y,
            fill_pattern: None,
            opacity_mask: None,
            text: None,
            indices: None,
            clip_data: None,
            bidi_level: 0,
            is_sideways: false,
            italic: false,
            opacity: 1.0,
        }
    }

    /// Odd bidi levels lay glyphs out right to left.
    pub fn is_rtl(&self) -> bool {
        self.bidi_level % 2 != 0
    }
}
