//! Brush elements.
//!
//! Handles: SolidColorBrush, LinearGradientBrush, RadialGradientBrush,
//! GradientStop, ImageBrush, VisualBrush and their property elements
//!
//! Every brush resolves to an optional `Pattern`. Pattern matrices map
//! user space to pattern space, so brush transforms are inverted here. A
//! brush that cannot be painted (singular transform, image that fails to
//! decode) resolves to `None` and the element it fills draws nothing.

use crate::error::{Location, Result, XpsError};
use crate::image::DEFAULT_RESOLUTION;
use crate::interp::device::DrawingSurface;
use crate::interp::interpreter::{PageInterpreter, parse_attribute, required_attribute};
use crate::interp::resources::KEY_ATTRIBUTE;
use crate::interp::stack::{
    BrushFrame, Frame, GradientFrame, ImageBrushFrame, MatrixFrame, Product, RenderFrame,
    VisualContext,
};
use crate::model::{Brush, Extend, GradientStop, GradientStops, Pattern, PatternKind};
use crate::parser::markup::Attribute;
use crate::parser::values::{parse_box, parse_double, parse_point};
use crate::utils::{
    MATRIX_IDENTITY, Matrix, Rectangle, invert_matrix, mult_matrix, resolve_relative_path,
    transform_hypot,
};

impl<'a, S: DrawingSurface> PageInterpreter<'a, S> {
    // ========================================================================
    // Brush Property Elements
    // ========================================================================

    pub(crate) fn brush_start(
        &mut self,
        frame: &mut BrushFrame<S::Layer>,
        name: &str,
        attributes: &[Attribute],
        location: &Location,
    ) -> Result<Option<Frame<S::Layer>>> {
        match name {
            "SolidColorBrush" => {
                let brush = self.solid_color_brush(attributes, location)?;
                frame.pattern = brush.and_then(|brush| self.brush_pattern(&brush));
                Ok(None)
            }
            "LinearGradientBrush" => Ok(Some(Frame::Gradient(GradientFrame {
                brush: self.linear_gradient_brush(attributes, location)?,
            }))),
            "RadialGradientBrush" => Ok(Some(Frame::Gradient(GradientFrame {
                brush: self.radial_gradient_brush(attributes, location)?,
            }))),
            "ImageBrush" => Ok(Some(Frame::ImageBrush(ImageBrushFrame {
                brush: self.image_brush(attributes, location)?,
            }))),
            "VisualBrush" => Ok(Some(Frame::Render(RenderFrame {
                visual: Some(self.begin_visual_brush(attributes, location)?),
                resource_dicts: 0,
            }))),
            other => Err(XpsError::unknown_element(location, other)),
        }
    }

    pub(crate) fn brush_end(
        &mut self,
        frame: &mut BrushFrame<S::Layer>,
        product: Product<S::Layer>,
    ) -> Result<()> {
        match product {
            Product::Brush(brush) => frame.pattern = self.brush_pattern(&brush),
            Product::Visual(visual) => frame.pattern = Some(self.visual_pattern(&visual)),
            _ => {}
        }
        Ok(())
    }

    fn brush_pattern(&mut self, brush: &Brush) -> Option<Pattern<S::Layer>> {
        match brush {
            Brush::Solid { color } => Some(Pattern::solid(*color)),
            Brush::LinearGradient { .. } | Brush::RadialGradient { .. } => gradient_pattern(brush),
            Brush::Image { .. } => self.image_pattern(brush),
        }
    }

    // ========================================================================
    // SolidColorBrush
    // ========================================================================

    /// `None` when the color cannot be converted.
    fn solid_color_brush(&mut self, attributes: &[Attribute], location: &Location) -> Result<Option<Brush>> {
        const ELEMENT: &str = "SolidColorBrush";
        let mut color = None;
        let mut opacity = 1.0;
        for attr in attributes {
            let value = attr.value.as_str();
            match attr.name.as_str() {
                "Color" => color = self.resolve_color(ELEMENT, "Color", value, location)?,
                "Opacity" => opacity = parse_attribute(ELEMENT, "Opacity", value, location, parse_double)?,
                KEY_ATTRIBUTE => {}
                other => return Err(XpsError::unknown_attribute(location, ELEMENT, other)),
            }
        }
        required_attribute(attributes, ELEMENT, "Color", location)?;
        Ok(color.map(|color| Brush::Solid {
            color: color.with_opacity(opacity),
        }))
    }

    // ========================================================================
    // Gradients
    // ========================================================================

    fn linear_gradient_brush(&mut self, attributes: &[Attribute], location: &Location) -> Result<Brush> {
        const ELEMENT: &str = "LinearGradientBrush";
        let mut matrix = MATRIX_IDENTITY;
        let mut opacity = 1.0;
        let mut spread = Extend::Pad;
        for attr in attributes {
            let value = attr.value.as_str();
            let name = attr.name.as_str();
            match name {
                "StartPoint" | "EndPoint" => {}
                "SpreadMethod" => spread = Extend::from_spread_method(value),
                "Opacity" => opacity = parse_attribute(ELEMENT, name, value, location, parse_double)?,
                "Transform" => matrix = self.transform_attribute(ELEMENT, name, value, location)?,
                "MappingMode" | "ColorInterpolationMode" => {
                    tracing::debug!(attribute = name, value, "gradient attribute not supported");
                }
                KEY_ATTRIBUTE => {}
                other => return Err(XpsError::unknown_attribute(location, ELEMENT, other)),
            }
        }

        let start = required_attribute(attributes, ELEMENT, "StartPoint", location)?;
        let end = required_attribute(attributes, ELEMENT, "EndPoint", location)?;
        Ok(Brush::LinearGradient {
            start: parse_attribute(ELEMENT, "StartPoint", start, location, parse_point)?,
            end: parse_attribute(ELEMENT, "EndPoint", end, location, parse_point)?,
            spread,
            matrix,
            opacity,
            stops: GradientStops::new(),
        })
    }

    fn radial_gradient_brush(&mut self, attributes: &[Attribute], location: &Location) -> Result<Brush> {
        const ELEMENT: &str = "RadialGradientBrush";
        let mut matrix = MATRIX_IDENTITY;
        let mut opacity = 1.0;
        let mut spread = Extend::Pad;
        for attr in attributes {
            let value = attr.value.as_str();
            let name = attr.name.as_str();
            match name {
                "GradientOrigin" | "Center" | "RadiusX" | "RadiusY" => {}
                "SpreadMethod" => spread = Extend::from_spread_method(value),
                "Opacity" => opacity = parse_attribute(ELEMENT, name, value, location, parse_double)?,
                "Transform" => matrix = self.transform_attribute(ELEMENT, name, value, location)?,
                "MappingMode" | "ColorInterpolationMode" => {
                    tracing::debug!(attribute = name, value, "gradient attribute not supported");
                }
                KEY_ATTRIBUTE => {}
                other => return Err(XpsError::unknown_attribute(location, ELEMENT, other)),
            }
        }

        let point = |attribute: &str| -> Result<(f64, f64)> {
            let value = required_attribute(attributes, ELEMENT, attribute, location)?;
            parse_attribute(ELEMENT, attribute, value, location, parse_point)
        };
        let length = |attribute: &str| -> Result<f64> {
            let value = required_attribute(attributes, ELEMENT, attribute, location)?;
            parse_attribute(ELEMENT, attribute, value, location, parse_double)
        };
        Ok(Brush::RadialGradient {
            origin: point("GradientOrigin")?,
            center: point("Center")?,
            radius_x: length("RadiusX")?,
            radius_y: length("RadiusY")?,
            spread,
            matrix,
            opacity,
            stops: GradientStops::new(),
        })
    }

    pub(crate) fn gradient_start(
        &mut self,
        frame: &mut GradientFrame,
        name: &str,
        attributes: &[Attribute],
        location: &Location,
    ) -> Result<Option<Frame<S::Layer>>> {
        match name {
            "LinearGradientBrush.GradientStops" | "RadialGradientBrush.GradientStops" => Ok(None),
            "LinearGradientBrush.Transform" | "RadialGradientBrush.Transform" => {
                Ok(Some(Frame::Matrix(MatrixFrame::default())))
            }
            "GradientStop" => {
                if let Some(stop) = self.gradient_stop(attributes, location)? {
                    frame.brush.push_stop(stop);
                }
                Ok(None)
            }
            other => Err(XpsError::unknown_element(location, other)),
        }
    }

    fn gradient_stop(&self, attributes: &[Attribute], location: &Location) -> Result<Option<GradientStop>> {
        const ELEMENT: &str = "GradientStop";
        if let Some(attr) = attributes
            .iter()
            .find(|attr| !matches!(attr.name.as_str(), "Color" | "Offset"))
        {
            return Err(XpsError::unknown_attribute(location, ELEMENT, &attr.name));
        }

        let color = required_attribute(attributes, ELEMENT, "Color", location)?;
        let offset = required_attribute(attributes, ELEMENT, "Offset", location)?;
        let offset = parse_attribute(ELEMENT, "Offset", offset, location, parse_double)?;
        let color = self.resolve_color(ELEMENT, "Color", color, location)?;
        Ok(color.map(|color| GradientStop { offset, color }))
    }

    pub(crate) fn gradient_end(
        &mut self,
        frame: &mut GradientFrame,
        name: &str,
        product: Product<S::Layer>,
    ) -> Result<()> {
        if let Product::Matrix(transform) = product
            && name.ends_with(".Transform")
            && let Some(matrix) = frame.brush.matrix_mut()
        {
            *matrix = transform;
        }
        Ok(())
    }

    // ========================================================================
    // ImageBrush
    // ========================================================================

    fn image_brush(&mut self, attributes: &[Attribute], location: &Location) -> Result<Brush> {
        const ELEMENT: &str = "ImageBrush";
        let mut matrix = MATRIX_IDENTITY;
        let mut opacity = 1.0;
        let mut extend = Extend::None;
        for attr in attributes {
            let value = attr.value.as_str();
            let name = attr.name.as_str();
            match name {
                "ImageSource" | "Viewport" | "Viewbox" => {}
                "TileMode" => extend = Extend::from_tile_mode(value),
                "ViewportUnits" | "ViewboxUnits" => {
                    if value != "Absolute" {
                        tracing::debug!(attribute = name, value, "only absolute units are supported");
                    }
                }
                "Opacity" => opacity = parse_attribute(ELEMENT, name, value, location, parse_double)?,
                "Transform" => matrix = self.transform_attribute(ELEMENT, name, value, location)?,
                KEY_ATTRIBUTE => {}
                other => return Err(XpsError::unknown_attribute(location, ELEMENT, other)),
            }
        }

        let source = required_attribute(attributes, ELEMENT, "ImageSource", location)?;
        let viewport = required_attribute(attributes, ELEMENT, "Viewport", location)?;
        let viewbox = required_attribute(attributes, ELEMENT, "Viewbox", location)?;
        Ok(Brush::Image {
            uri: resolve_relative_path(self.ctx.source, source.trim()),
            viewport: parse_attribute(ELEMENT, "Viewport", viewport, location, parse_box)?,
            viewbox: parse_attribute(ELEMENT, "Viewbox", viewbox, location, parse_box)?,
            matrix,
            extend,
            opacity,
        })
    }

    pub(crate) fn image_brush_start(
        &mut self,
        name: &str,
        location: &Location,
    ) -> Result<Option<Frame<S::Layer>>> {
        match name {
            "ImageBrush.Transform" => Ok(Some(Frame::Matrix(MatrixFrame::default()))),
            other => Err(XpsError::unknown_element(location, other)),
        }
    }

    pub(crate) fn image_brush_end(
        &mut self,
        frame: &mut ImageBrushFrame,
        name: &str,
        product: Product<S::Layer>,
    ) -> Result<()> {
        if let ("ImageBrush.Transform", Product::Matrix(transform)) = (name, product)
            && let Some(matrix) = frame.brush.matrix_mut()
        {
            *matrix = transform;
        }
        Ok(())
    }

    /// Decodes the image and maps its viewbox onto the viewport. An image
    /// that cannot be loaded yields no pattern.
    fn image_pattern(&mut self, brush: &Brush) -> Option<Pattern<S::Layer>> {
        let Brush::Image {
            uri,
            viewport,
            viewbox,
            matrix,
            extend,
            opacity,
        } = brush
        else {
            return None;
        };

        let image = match self
            .ctx
            .images
            .get_or_load(self.ctx.image_provider, self.ctx.archive, uri)
        {
            Ok(image) => image,
            Err(err) => {
                tracing::debug!(uri, %err, "omitting image brush");
                return None;
            }
        };

        let source = viewbox.scaled(
            image.res_x / DEFAULT_RESOLUTION,
            image.res_y / DEFAULT_RESOLUTION,
        );
        let Some(pattern_matrix) = tile_matrix(viewport, &source, *matrix) else {
            tracing::debug!(uri, "degenerate image brush");
            return None;
        };
        let pattern = Pattern::new(PatternKind::Image { image, source })
            .with_extend(*extend)
            .with_matrix(pattern_matrix);

        if *opacity == 1.0 {
            return Some(pattern);
        }
        self.surface.push_group();
        self.surface.set_source(&pattern);
        self.surface.paint_with_alpha(*opacity);
        Some(self.surface.pop_group())
    }

    // ========================================================================
    // VisualBrush
    // ========================================================================

    /// Opens a group sized to the transformed viewport and maps the viewbox
    /// onto it. The brush content renders into the group.
    fn begin_visual_brush(&mut self, attributes: &[Attribute], location: &Location) -> Result<VisualContext> {
        const ELEMENT: &str = "VisualBrush";
        let limit = self.ctx.options.max_visual_depth;
        if self.visual_depth >= limit {
            return Err(XpsError::NestingTooDeep(limit));
        }

        let mut transform = MATRIX_IDENTITY;
        let mut extend = Extend::None;
        for attr in attributes {
            let value = attr.value.as_str();
            let name = attr.name.as_str();
            match name {
                "Viewport" | "Viewbox" => {}
                "TileMode" => extend = Extend::from_tile_mode(value),
                "Transform" => transform = self.transform_attribute(ELEMENT, name, value, location)?,
                "ViewportUnits" | "ViewboxUnits" => {
                    if value != "Absolute" {
                        tracing::debug!(attribute = name, value, "only absolute units are supported");
                    }
                }
                "Opacity" | "Visual" => tracing::debug!(attribute = name, "visual brush attribute not supported"),
                KEY_ATTRIBUTE => {}
                other => return Err(XpsError::unknown_attribute(location, ELEMENT, other)),
            }
        }

        let viewport = required_attribute(attributes, ELEMENT, "Viewport", location)?;
        let viewbox = required_attribute(attributes, ELEMENT, "Viewbox", location)?;
        let viewport = parse_attribute(ELEMENT, "Viewport", viewport, location, parse_box)?;
        let viewbox = parse_attribute(ELEMENT, "Viewbox", viewbox, location, parse_box)?;

        let width = transform_hypot(transform, viewport.width, 0.0);
        let height = transform_hypot(transform, 0.0, viewport.height);

        self.surface.save();
        self.surface.new_path();
        self.surface.rectangle(&Rectangle::new(0.0, 0.0, width, height));
        self.surface.clip();
        self.surface.push_group();
        if viewbox.width != 0.0 && viewbox.height != 0.0 {
            self.surface.scale(width / viewbox.width, height / viewbox.height);
            self.surface.translate(-viewbox.x, -viewbox.y);
        } else {
            tracing::debug!("degenerate visual brush viewbox");
        }
        self.visual_depth += 1;

        Ok(VisualContext {
            viewport,
            viewbox,
            transform,
            extend,
            width,
            height,
        })
    }

    /// Closes the visual group and places it on the viewport.
    fn visual_pattern(&mut self, visual: &VisualContext) -> Pattern<S::Layer> {
        let mut pattern = self.surface.pop_group().with_extend(visual.extend);
        self.surface.restore();

        let tile = Rectangle::new(0.0, 0.0, visual.width, visual.height);
        match tile_matrix(&visual.viewport, &tile, visual.transform) {
            Some(inverse) => pattern.matrix = mult_matrix(inverse, pattern.matrix),
            None => tracing::debug!("degenerate visual brush transform"),
        }
        pattern
    }
}

/// Pattern matrix mapping user space onto a tile: `source` is stretched
/// over `viewport` and then transformed by `transform`.
fn tile_matrix(viewport: &Rectangle, source: &Rectangle, transform: Matrix) -> Option<Matrix> {
    if source.width == 0.0 || source.height == 0.0 {
        return None;
    }
    let tile = (
        viewport.width / source.width,
        0.0,
        0.0,
        viewport.height / source.height,
        viewport.x,
        viewport.y,
    );
    invert_matrix(mult_matrix(tile, transform))
}

/// Builds a gradient pattern. Stops keep their document order and take
/// the brush opacity into their alpha.
fn gradient_pattern<L>(brush: &Brush) -> Option<Pattern<L>> {
    let scale_stops = |stops: &GradientStops, opacity: f64| -> GradientStops {
        stops
            .iter()
            .map(|stop| GradientStop {
                offset: stop.offset,
                color: stop.color.with_opacity(opacity),
            })
            .collect()
    };

    match brush {
        Brush::LinearGradient {
            start,
            end,
            spread,
            matrix,
            opacity,
            stops,
        } => {
            let Some(inverse) = invert_matrix(*matrix) else {
                tracing::debug!("gradient transform is not invertible");
                return None;
            };
            let kind = PatternKind::Linear {
                start: *start,
                end: *end,
                stops: scale_stops(stops, *opacity),
            };
            Some(Pattern::new(kind).with_extend(*spread).with_matrix(inverse))
        }
        Brush::RadialGradient {
            origin,
            center,
            radius_x,
            radius_y,
            spread,
            matrix,
            opacity,
            stops,
        } => {
            if *radius_x == 0.0 || *radius_y == 0.0 {
                tracing::debug!("degenerate radial gradient");
                return None;
            }
            // Circles of radius `radius_y` in pattern space, stretched
            // horizontally around the center into the ellipse.
            let (cx, cy) = *center;
            let ratio = radius_x / radius_y;
            let ellipse = (ratio, 0.0, 0.0, 1.0, cx - cx * ratio, 0.0);
            let Some(inverse) = invert_matrix(mult_matrix(ellipse, *matrix)) else {
                tracing::debug!("gradient transform is not invertible");
                return None;
            };
            let kind = PatternKind::Radial {
                focus: (cx + (origin.0 - cx) / ratio, origin.1),
                focus_radius: 0.0,
                center: (cx, cy),
                radius: *radius_y,
                stops: scale_stops(stops, *opacity),
            };
            Some(Pattern::new(kind).with_extend(*spread).with_matrix(inverse))
        }
        _ => None,
    }
}
