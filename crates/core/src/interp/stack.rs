//! Element frames of the page interpreter.
//!
//! Markup is processed as a stream. Every element that needs to collect
//! state across its children owns a `Frame`; the frame on top of the
//! stack receives the start and end events of the elements nested inside
//! it. When the owning element ends the frame is popped, finished into a
//! `Product` and handed to the frame below.

use crate::interp::resources::ResourceMarkup;
use crate::model::{Brush, GlyphRun, PathState, Pattern};
use crate::utils::{MATRIX_IDENTITY, Matrix, Rectangle};

/// Value a finished frame hands to its parent.
#[derive(Debug)]
pub enum Product<L> {
    None,
    /// A resolved brush. `None` when the brush cannot be painted.
    Pattern(Option<Pattern<L>>),
    /// A gradient or image brush with its stops and transform collected.
    Brush(Brush),
    Matrix(Matrix),
    /// Path state returned by a `PathGeometry` with figure children.
    Path(PathState<L>),
    /// A rendered visual brush, waiting to be turned into a pattern.
    Visual(VisualContext),
}

/// Layout of a visual brush while its content renders into a group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualContext {
    pub viewport: Rectangle,
    pub viewbox: Rectangle,
    /// Transform from the `Transform` attribute or child.
    pub transform: Matrix,
    pub extend: crate::model::Extend,
    /// Size of the rendered tile in user space.
    pub width: f64,
    pub height: f64,
}

/// Renders content elements (`Canvas`, `Path`, `Glyphs`). The page root
/// and the content of a visual brush are both render frames.
#[derive(Debug, Default)]
pub struct RenderFrame {
    pub visual: Option<VisualContext>,
    /// Dictionaries pushed by `FixedPage.Resources`.
    pub resource_dicts: usize,
}

#[derive(Debug)]
pub struct CanvasFrame<L> {
    pub opacity: f64,
    pub opacity_mask: Option<Pattern<L>>,
    pub opacity_group: bool,
    pub mask_group: bool,
    pub resource_dicts: usize,
}

impl<L> Default for CanvasFrame<L> {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            opacity_mask: None,
            opacity_group: false,
            mask_group: false,
            resource_dicts: 0,
        }
    }
}

#[derive(Debug)]
pub struct PathFrame<L> {
    pub state: PathState<L>,
    /// Inside `Path.Clip`.
    pub in_clip: bool,
    pub opacity_group: bool,
}

/// Collects the `PathFigure` children of a `PathGeometry`. Figures are
/// drawn as each one ends.
#[derive(Debug)]
pub struct PathGeometryFrame<L> {
    pub state: PathState<L>,
    pub figure: crate::interp::device::PathBuilder,
}

#[derive(Debug)]
pub struct BrushFrame<L> {
    pub pattern: Option<Pattern<L>>,
}

impl<L> Default for BrushFrame<L> {
    fn default() -> Self {
        Self { pattern: None }
    }
}

/// Owns a gradient brush element while its stops are collected.
#[derive(Debug)]
pub struct GradientFrame {
    pub brush: Brush,
}

#[derive(Debug)]
pub struct ImageBrushFrame {
    pub brush: Brush,
}

#[derive(Debug)]
pub struct GlyphsFrame<L> {
    pub run: GlyphRun<L>,
    pub opacity_group: bool,
    pub mask_group: bool,
}

#[derive(Debug)]
pub struct MatrixFrame {
    pub matrix: Matrix,
}

impl Default for MatrixFrame {
    fn default() -> Self {
        Self {
            matrix: MATRIX_IDENTITY,
        }
    }
}

/// Owns an `X.Resources` property element.
#[derive(Debug, Default)]
pub struct ResourcesFrame {
    /// Set while a `ResourceDictionary` with a `Source` is open. Any
    /// element nested inside it is rejected.
    pub remote: bool,
}

/// Owns a `ResourceDictionary` and records its entries.
#[derive(Debug, Default)]
pub struct ResourceDictFrame {
    pub current: Option<ResourceMarkup>,
}

#[derive(Debug)]
pub enum Frame<L> {
    Render(RenderFrame),
    Canvas(CanvasFrame<L>),
    Path(PathFrame<L>),
    PathGeometry(PathGeometryFrame<L>),
    Brush(BrushFrame<L>),
    Gradient(GradientFrame),
    ImageBrush(ImageBrushFrame),
    Glyphs(GlyphsFrame<L>),
    Matrix(MatrixFrame),
    Resources(ResourcesFrame),
    ResourceDict(ResourceDictFrame),
}

impl<L> Frame<L> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Render(_) => "render",
            Self::Canvas(_) => "canvas",
            Self::Path(_) => "path",
            Self::PathGeometry(_) => "path geometry",
            Self::Brush(_) => "brush",
            Self::Gradient(_) => "gradient",
            Self::ImageBrush(_) => "image brush",
            Self::Glyphs(_) => "glyphs",
            Self::Matrix(_) => "matrix",
            Self::Resources(_) => "resources",
            Self::ResourceDict(_) => "resource dictionary",
        }
    }
}

/// A frame and the element depth of the element that owns it.
#[derive(Debug)]
pub struct StackEntry<L> {
    pub frame: Frame<L>,
    pub owner_depth: usize,
}

/// The frame stack together with the current element depth.
#[derive(Debug)]
pub struct ParserStack<L> {
    pub entries: Vec<StackEntry<L>>,
    pub depth: usize,
}

impl<L> ParserStack<L> {
    /// A stack for a whole part. The root frame sees every top-level
    /// element.
    pub fn new(root: Frame<L>) -> Self {
        Self {
            entries: vec![StackEntry {
                frame: root,
                owner_depth: 0,
            }],
            depth: 0,
        }
    }

    /// A stack whose root frame is owned by an element that has already
    /// started.
    pub fn with_open_root(root: Frame<L>) -> Self {
        Self {
            entries: vec![StackEntry {
                frame: root,
                owner_depth: 1,
            }],
            depth: 1,
        }
    }

    pub fn push(&mut self, frame: Frame<L>) {
        tracing::trace!(frame = frame.name(), depth = self.depth, "push frame");
        self.entries.push(StackEntry {
            frame,
            owner_depth: self.depth,
        });
    }

    pub fn pop(&mut self) -> Option<StackEntry<L>> {
        self.entries.pop()
    }

    /// Whether the top frame is owned by the element at the current depth.
    pub fn top_owned_here(&self) -> bool {
        self.entries
            .last()
            .is_some_and(|entry| entry.owner_depth == self.depth)
    }
}
