//! Path elements.
//!
//! Handles: Path, Path.Fill, Path.Stroke, Path.Data, Path.Clip,
//! Path.OpacityMask, Path.RenderTransform, PathGeometry, PathFigure,
//! PolyLineSegment, PolyBezierSegment, PolyQuadraticBezierSegment
//!
//! Geometry comes in two forms:
//! - abbreviated data (`Data` attribute or `Figures`) drawn when the path
//!   element ends
//! - `PathFigure` children, each drawn as soon as it ends
//!
//! Painting with an opacity mask draws into a group clipped to the path
//! extents and masks it onto the surface.

use crate::error::{Location, Result, XpsError};
use crate::interp::device::{DrawingSurface, PathBuilder, PathSink};
use crate::interp::interpreter::{PageInterpreter, parse_attribute, required_attribute};
use crate::interp::stack::{BrushFrame, Frame, MatrixFrame, PathFrame, PathGeometryFrame, Product};
use crate::model::{FillRule, LineCap, LineJoin, PathState};
use crate::parser::markup::{Attribute, attribute_value};
use crate::parser::path_data::parse_path_data;
use crate::parser::values::{parse_bool, parse_dash_array, parse_double, parse_point, parse_points};

impl<'a, S: DrawingSurface> PageInterpreter<'a, S> {
    // ========================================================================
    // Path
    // ========================================================================

    pub(crate) fn begin_path(
        &mut self,
        attributes: &[Attribute],
        location: &Location,
    ) -> Result<PathFrame<S::Layer>> {
        self.surface.save();
        let mut frame = PathFrame {
            state: PathState::default(),
            in_clip: false,
            opacity_group: false,
        };
        if let Err(err) = self.path_attributes(&mut frame.state, attributes, location) {
            self.surface.restore();
            return Err(err);
        }

        if frame.state.opacity != 1.0 {
            self.surface.push_group();
            frame.opacity_group = true;
        }
        Ok(frame)
    }

    fn path_attributes(
        &mut self,
        state: &mut PathState<S::Layer>,
        attributes: &[Attribute],
        location: &Location,
    ) -> Result<()> {
        const ELEMENT: &str = "Path";
        for attr in attributes {
            let value = attr.value.as_str();
            let name = attr.name.as_str();
            match name {
                "Data" => state.data = Some(self.geometry_attribute(value)?),
                "Clip" => state.clip_data = Some(self.geometry_attribute(value)?),
                "RenderTransform" => {
                    let matrix = self.transform_attribute(ELEMENT, name, value, location)?;
                    self.surface.transform(matrix);
                }
                "Fill" => state.fill_pattern = self.brush_attribute(ELEMENT, name, value, location)?,
                "Stroke" => {
                    state.stroke_pattern = self.brush_attribute(ELEMENT, name, value, location)?;
                }
                "OpacityMask" => {
                    state.opacity_mask = self.brush_attribute(ELEMENT, name, value, location)?;
                }
                "StrokeThickness" => {
                    state.stroke.width = parse_attribute(ELEMENT, name, value, location, parse_double)?;
                }
                "StrokeDashArray" => {
                    state.stroke.dash = parse_attribute(ELEMENT, name, value, location, parse_dash_array)?;
                }
                "StrokeDashOffset" => {
                    state.stroke.dash_offset =
                        parse_attribute(ELEMENT, name, value, location, parse_double)?;
                }
                "StrokeStartLineCap" | "StrokeEndLineCap" => state.stroke.cap = LineCap::parse(value),
                "StrokeDashCap" => tracing::debug!(value, "dash caps follow the line cap"),
                "StrokeLineJoin" => state.stroke.join = LineJoin::parse(value),
                "StrokeMiterLimit" => {
                    state.stroke.miter_limit =
                        parse_attribute(ELEMENT, name, value, location, parse_double)?;
                }
                "Opacity" => {
                    state.opacity = parse_attribute(ELEMENT, name, value, location, parse_double)?;
                }
                other => tracing::trace!(attribute = other, "ignoring path attribute"),
            }
        }
        Ok(())
    }

    pub(crate) fn path_start(
        &mut self,
        frame: &mut PathFrame<S::Layer>,
        name: &str,
        attributes: &[Attribute],
        location: &Location,
    ) -> Result<Option<Frame<S::Layer>>> {
        match name {
            "Path.Fill" | "Path.Stroke" | "Path.OpacityMask" => {
                Ok(Some(Frame::Brush(BrushFrame::default())))
            }
            "Path.RenderTransform" => Ok(Some(Frame::Matrix(MatrixFrame::default()))),
            "Path.Data" => Ok(None),
            "Path.Clip" => {
                frame.in_clip = true;
                Ok(None)
            }
            "PathGeometry" if frame.in_clip => {
                self.clip_geometry(&mut frame.state, attributes);
                Ok(None)
            }
            "PathGeometry" => self.begin_path_geometry(frame, attributes, location),
            other => {
                tracing::debug!(%location, element = other, "ignoring path child");
                Ok(None)
            }
        }
    }

    /// A `PathGeometry` inside `Path.Clip`. Only the `Figures` form can be
    /// turned into clip data.
    fn clip_geometry(&mut self, state: &mut PathState<S::Layer>, attributes: &[Attribute]) {
        let Some(figures) = attribute_value(attributes, "Figures") else {
            tracing::debug!("figure clip geometries are not supported");
            return;
        };
        let rule = attribute_value(attributes, "FillRule")
            .map(FillRule::parse)
            .unwrap_or_default();
        state.clip_data = Some(match rule {
            FillRule::NonZero => format!("F1 {figures}"),
            FillRule::EvenOdd => figures.to_string(),
        });
    }

    fn begin_path_geometry(
        &mut self,
        frame: &mut PathFrame<S::Layer>,
        attributes: &[Attribute],
        location: &Location,
    ) -> Result<Option<Frame<S::Layer>>> {
        let mut figures = None;
        for attr in attributes {
            let value = attr.value.as_str();
            match attr.name.as_str() {
                "Figures" => figures = Some(value),
                "FillRule" => frame.state.fill_rule = FillRule::parse(value),
                "Transform" => {
                    let matrix = self.transform_attribute("PathGeometry", "Transform", value, location)?;
                    self.surface.transform(matrix);
                }
                other => tracing::trace!(attribute = other, "ignoring path geometry attribute"),
            }
        }

        if let Some(figures) = figures {
            frame.state.data = Some(figures.to_string());
            return Ok(None);
        }

        // Figures are drawn as they end, so the clip has to be in place now.
        self.surface.set_fill_rule(frame.state.fill_rule);
        if let Some(clip) = frame.state.clip_data.take() {
            self.surface.new_path();
            parse_path_data(&clip, &mut *self.surface)?;
            self.surface.clip();
        }
        Ok(Some(Frame::PathGeometry(PathGeometryFrame {
            state: std::mem::take(&mut frame.state),
            figure: PathBuilder::new(),
        })))
    }

    pub(crate) fn path_end(
        &mut self,
        frame: &mut PathFrame<S::Layer>,
        name: &str,
        product: Product<S::Layer>,
    ) -> Result<()> {
        let state = &mut frame.state;
        match (name, product) {
            ("Path.Fill", Product::Pattern(pattern)) => state.fill_pattern = pattern,
            ("Path.Stroke", Product::Pattern(pattern)) => state.stroke_pattern = pattern,
            ("Path.OpacityMask", Product::Pattern(pattern)) if state.opacity_mask.is_none() => {
                state.opacity_mask = pattern;
            }
            ("Path.RenderTransform", Product::Matrix(matrix)) => self.surface.transform(matrix),
            ("PathGeometry", Product::Path(returned)) => *state = returned,
            ("Path.Clip", _) => frame.in_clip = false,
            _ => {}
        }
        Ok(())
    }

    pub(crate) fn finish_path(&mut self, frame: &mut PathFrame<S::Layer>) -> Result<Product<S::Layer>> {
        let state = &frame.state;
        if let Some(data) = &state.data {
            self.surface.set_fill_rule(state.fill_rule);
            if let Some(clip) = &state.clip_data {
                self.surface.new_path();
                parse_path_data(clip, &mut *self.surface)?;
                self.surface.clip();
            }
            let mut path = PathBuilder::new();
            parse_path_data(data, &mut path)?;
            self.draw_path(&path, state, true);
        }

        if std::mem::take(&mut frame.opacity_group) {
            self.surface.pop_group_to_source();
            self.surface.paint_with_alpha(frame.state.opacity);
        }
        self.surface.restore();
        Ok(Product::None)
    }

    pub(crate) fn abort_path(&mut self, frame: PathFrame<S::Layer>) {
        if frame.opacity_group {
            self.surface.pop_group();
        }
        self.surface.restore();
    }

    /// Fills and strokes `path` with the patterns of `state`.
    fn draw_path(&mut self, path: &PathBuilder, state: &PathState<S::Layer>, filled: bool) {
        let mask = state.opacity_mask.as_ref();
        if mask.is_some() {
            if let Some(extents) = path.extents() {
                let extents = match state.stroke_pattern {
                    Some(_) => extents.inflated(state.stroke.width / 2.0),
                    None => extents,
                };
                self.surface.new_path();
                self.surface.rectangle(&extents);
                self.surface.clip();
            }
            self.surface.push_group();
        }

        self.surface.new_path();
        path.replay(&mut *self.surface);
        let fill = state.fill_pattern.as_ref().filter(|_| filled);
        match (fill, state.stroke_pattern.as_ref()) {
            (Some(fill), Some(stroke)) => {
                self.surface.set_source(fill);
                self.surface.fill(true);
                self.surface.set_source(stroke);
                self.surface.stroke(&state.stroke);
            }
            (Some(fill), None) => {
                self.surface.set_source(fill);
                self.surface.fill(false);
            }
            (None, Some(stroke)) => {
                self.surface.set_source(stroke);
                self.surface.stroke(&state.stroke);
            }
            (None, None) => self.surface.new_path(),
        }

        if let Some(mask) = mask {
            self.surface.pop_group_to_source();
            self.surface.mask(mask);
        }
    }

    // ========================================================================
    // PathGeometry Children
    // ========================================================================

    pub(crate) fn path_geometry_start(
        &mut self,
        frame: &mut PathGeometryFrame<S::Layer>,
        name: &str,
        attributes: &[Attribute],
        location: &Location,
    ) -> Result<Option<Frame<S::Layer>>> {
        match name {
            "PathGeometry.Transform" => Ok(Some(Frame::Matrix(MatrixFrame::default()))),
            "PathFigure" => {
                self.begin_figure(frame, attributes, location)?;
                Ok(None)
            }
            "PolyLineSegment" | "PolyBezierSegment" | "PolyQuadraticBezierSegment" => {
                add_segment(&mut frame.figure, name, attributes, location)?;
                Ok(None)
            }
            "ArcSegment" => {
                tracing::debug!(%location, "arc segments are not rendered");
                Ok(None)
            }
            other => {
                tracing::debug!(%location, element = other, "ignoring path geometry child");
                Ok(None)
            }
        }
    }

    fn begin_figure(
        &mut self,
        frame: &mut PathGeometryFrame<S::Layer>,
        attributes: &[Attribute],
        location: &Location,
    ) -> Result<()> {
        const ELEMENT: &str = "PathFigure";
        let start = required_attribute(attributes, ELEMENT, "StartPoint", location)?;
        let (x, y) = parse_attribute(ELEMENT, "StartPoint", start, location, parse_point)?;

        frame.state.is_closed = false;
        frame.state.is_filled = true;
        for attr in attributes {
            let value = attr.value.as_str();
            match attr.name.as_str() {
                "IsClosed" => {
                    frame.state.is_closed = parse_attribute(ELEMENT, "IsClosed", value, location, parse_bool)?;
                }
                "IsFilled" => {
                    frame.state.is_filled = parse_attribute(ELEMENT, "IsFilled", value, location, parse_bool)?;
                }
                _ => {}
            }
        }

        frame.figure = PathBuilder::new();
        frame.figure.move_to(x, y);
        Ok(())
    }

    pub(crate) fn path_geometry_end(
        &mut self,
        frame: &mut PathGeometryFrame<S::Layer>,
        name: &str,
        product: Product<S::Layer>,
    ) -> Result<()> {
        match (name, product) {
            ("PathGeometry.Transform", Product::Matrix(matrix)) => self.surface.transform(matrix),
            ("PathFigure", _) => {
                let mut figure = std::mem::take(&mut frame.figure);
                if frame.state.is_closed {
                    figure.close_path();
                }
                self.draw_path(&figure, &frame.state, frame.state.is_filled);
            }
            _ => {}
        }
        Ok(())
    }
}

/// Appends a poly segment to the current figure. Segments with
/// `IsStroked="false"` are left out of the figure.
fn add_segment(
    figure: &mut PathBuilder,
    element: &str,
    attributes: &[Attribute],
    location: &Location,
) -> Result<()> {
    let value = required_attribute(attributes, element, "Points", location)?;
    let points = parse_attribute(element, "Points", value, location, parse_points)?;
    let stroked = match attribute_value(attributes, "IsStroked") {
        Some(flag) => parse_attribute(element, "IsStroked", flag, location, parse_bool)?,
        None => true,
    };
    if !stroked {
        tracing::debug!(element, "skipping unstroked segment");
        return Ok(());
    }

    let group = match element {
        "PolyBezierSegment" => 3,
        "PolyQuadraticBezierSegment" => 2,
        _ => 1,
    };
    if points.len() % group != 0 {
        return Err(XpsError::invalid_content(location, element, "Points", value));
    }

    for chunk in points.chunks_exact(group) {
        match *chunk {
            [(x, y)] => figure.line_to(x, y),
            [(x1, y1), (x2, y2), (x3, y3)] => figure.curve_to(x1, y1, x2, y2, x3, y3),
            [(qx, qy), (x, y)] => {
                let (cx, cy) = figure.current_point().unwrap_or_default();
                figure.curve_to(
                    cx + 2.0 / 3.0 * (qx - cx),
                    cy + 2.0 / 3.0 * (qy - cy),
                    x + 2.0 / 3.0 * (qx - x),
                    y + 2.0 / 3.0 * (qy - y),
                    x,
                    y,
                );
            }
            _ => {}
        }
    }
    Ok(())
}
