//! Brushes and the patterns they resolve to.
//!
//! A `Brush` is the parsed description of a fill source; a `Pattern` is what
//! the drawing surface paints with. Gradient stops are kept in document
//! order and never sorted by offset.

use std::sync::Arc;

use smallvec::SmallVec;

use super::color::Color;
use crate::image::Image;
use crate::utils::{MATRIX_IDENTITY, Matrix, Point, Rectangle};

/// How a pattern behaves outside its defined area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Extend {
    #[default]
    None,
    Pad,
    Repeat,
    Reflect,
}

impl Extend {
    /// Maps a gradient `SpreadMethod` value.
    pub fn from_spread_method(value: &str) -> Self {
        match value {
            "Pad" => Self::Pad,
            "Reflect" => Self::Reflect,
            "Repeat" => Self::Repeat,
            other => {
                tracing::debug!(value = other, "unknown spread method");
                Self::None
            }
        }
    }

    /// Maps an image or visual brush `TileMode` value.
    pub fn from_tile_mode(value: &str) -> Self {
        match value {
            "None" => Self::None,
            "Tile" => Self::Repeat,
            "FlipX" | "FlipY" | "FlipXY" => {
                tracing::debug!(value, "unsupported tile mode");
                Self::None
            }
            other => {
                tracing::debug!(value = other, "unknown tile mode");
                Self::None
            }
        }
    }
}

/// A `GradientStop` element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f64,
    pub color: Color,
}

pub type GradientStops = SmallVec<[GradientStop; 4]>;

/// Parsed brush description.
#[derive(Debug, Clone, PartialEq)]
pub enum Brush {
    Solid {
        color: Color,
    },
    LinearGradient {
        start: Point,
        end: Point,
        spread: Extend,
        matrix: Matrix,
        opacity: f64,
        stops: GradientStops,
    },
    RadialGradient {
        origin: Point,
        center: Point,
        radius_x: f64,
        radius_y: f64,
        spread: Extend,
        matrix: Matrix,
        opacity: f64,
        stops: GradientStops,
    },
    Image {
        uri: String,
        viewport: Rectangle,
        viewbox: Rectangle,
        matrix: Matrix,
        extend: Extend,
        opacity: f64,
    },
}

impl Brush {
    /// Appends a stop to a gradient brush. Other brushes ignore stops.
    pub fn push_stop(&mut self, stop: GradientStop) {
        match self {
            Self::LinearGradient { stops, .. } | Self::RadialGradient { stops, .. } => {
                stops.push(stop)
            }
            _ => tracing::debug!("gradient stop outside a gradient brush"),
        }
    }

    /// Mutable access to the brush transform.
    pub fn matrix_mut(&mut self) -> Option<&mut Matrix> {
        match self {
            Self::Solid { .. } => None,
            Self::LinearGradient { matrix, .. }
            | Self::RadialGradient { matrix, .. }
            | Self::Image { matrix, .. } => Some(matrix),
        }
    }
}

/// Pattern contents.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternKind<L> {
    Solid(Color),
    Linear {
        start: Point,
        end: Point,
        stops: GradientStops,
    },
    Radial {
        focus: Point,
        focus_radius: f64,
        center: Point,
        radius: f64,
        stops: GradientStops,
    },
    /// The `source` sub-rectangle of a decoded image, in image pixels.
    Image {
        image: Arc<Image>,
        source: Rectangle,
    },
    /// A closed offscreen group of the surface.
    Layer(L),
}

/// A paint source. `matrix` maps user space to pattern space.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern<L> {
    pub kind: PatternKind<L>,
    pub extend: Extend,
    pub matrix: Matrix,
}

impl<L> Pattern<L> {
    pub fn new(kind: PatternKind<L>) -> Self {
        Self {
            kind,
            extend: Extend::None,
            matrix: MATRIX_IDENTITY,
        }
    }

    pub fn solid(color: Color) -> Self {
        Self::new(PatternKind::Solid(color))
    }

    pub fn with_extend(mut self, extend: Extend) -> Self {
        self.extend = extend;
        self
    }

    pub fn with_matrix(mut self, matrix: Matrix) -> Self {
        self.matrix = matrix;
        self
    }

    /// Gradient stops in the order they were added.
    pub fn stops(&self) -> &[GradientStop] {
        match &self.kind {
            PatternKind::Linear { stops, .. } | PatternKind::Radial { stops, .. } => stops.as_slice(),
            _ => &[],
        }
    }
}
