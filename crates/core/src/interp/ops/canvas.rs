//! Page root and Canvas elements.
//!
//! A `Canvas` groups content under a shared transform, clip, opacity and
//! opacity mask:
//! - the transform and clip apply inside a save that the end tag restores
//! - opacity renders the content into a group painted with that alpha
//! - an opacity mask renders into a second group used as mask source

use crate::error::{Location, Result, XpsError};
use crate::interp::device::DrawingSurface;
use crate::interp::interpreter::{PageInterpreter, parse_attribute};
use crate::interp::stack::{
    BrushFrame, CanvasFrame, Frame, MatrixFrame, Product, RenderFrame, ResourcesFrame,
};
use crate::parser::markup::Attribute;
use crate::parser::path_data::parse_path_data;
use crate::parser::values::parse_double;

impl<'a, S: DrawingSurface> PageInterpreter<'a, S> {
    // ========================================================================
    // Content Elements
    // ========================================================================

    /// Starts a content element inside the page, a canvas or a visual.
    pub(crate) fn content_start(
        &mut self,
        name: &str,
        attributes: &[Attribute],
        location: &Location,
    ) -> Result<Option<Frame<S::Layer>>> {
        match name {
            "Canvas" => Ok(Some(Frame::Canvas(self.begin_canvas(attributes, location)?))),
            "Path" => Ok(Some(Frame::Path(self.begin_path(attributes, location)?))),
            "Glyphs" => Ok(Some(Frame::Glyphs(self.begin_glyphs(attributes, location)?))),
            other if self.ctx.options.strict_unknown_elements => {
                Err(XpsError::unknown_element(location, other))
            }
            other => {
                tracing::debug!(%location, element = other, "skipping unsupported element");
                Ok(None)
            }
        }
    }

    /// Opens a property element holding resource dictionaries.
    fn open_resources(&mut self, resource_dicts: &mut usize) -> Frame<S::Layer> {
        self.resources.push_dict();
        *resource_dicts += 1;
        Frame::Resources(ResourcesFrame::default())
    }

    // ========================================================================
    // Page Root
    // ========================================================================

    pub(crate) fn render_start(
        &mut self,
        frame: &mut RenderFrame,
        name: &str,
        attributes: &[Attribute],
        location: &Location,
    ) -> Result<Option<Frame<S::Layer>>> {
        match name {
            "FixedPage" => Ok(None),
            "FixedPage.Resources" => Ok(Some(self.open_resources(&mut frame.resource_dicts))),
            "VisualBrush.Visual" if frame.visual.is_some() => Ok(None),
            "VisualBrush.Transform" if frame.visual.is_some() => {
                Ok(Some(Frame::Matrix(MatrixFrame::default())))
            }
            _ => self.content_start(name, attributes, location),
        }
    }

    pub(crate) fn render_end(
        &mut self,
        frame: &mut RenderFrame,
        name: &str,
        product: Product<S::Layer>,
    ) -> Result<()> {
        match (name, product) {
            ("FixedPage", _) => self.pop_dicts(&mut frame.resource_dicts),
            ("VisualBrush.Transform", Product::Matrix(matrix)) => {
                if let Some(visual) = frame.visual.as_mut() {
                    visual.transform = matrix;
                }
            }
            _ => {}
        }
        Ok(())
    }

    pub(crate) fn finish_render(&mut self, frame: &mut RenderFrame) -> Product<S::Layer> {
        self.pop_dicts(&mut frame.resource_dicts);
        match frame.visual.take() {
            Some(visual) => {
                self.visual_depth = self.visual_depth.saturating_sub(1);
                Product::Visual(visual)
            }
            None => Product::None,
        }
    }

    pub(crate) fn abort_render(&mut self, mut frame: RenderFrame) {
        self.pop_dicts(&mut frame.resource_dicts);
        if frame.visual.is_some() {
            self.surface.pop_group();
            self.surface.restore();
            self.visual_depth = self.visual_depth.saturating_sub(1);
        }
    }

    // ========================================================================
    // Canvas
    // ========================================================================

    fn begin_canvas(
        &mut self,
        attributes: &[Attribute],
        location: &Location,
    ) -> Result<CanvasFrame<S::Layer>> {
        self.surface.save();
        let mut frame = CanvasFrame::default();
        if let Err(err) = self.canvas_attributes(&mut frame, attributes, location) {
            self.abort_canvas(frame);
            return Err(err);
        }

        if frame.opacity != 1.0 {
            self.surface.push_group();
            frame.opacity_group = true;
        }
        if frame.opacity_mask.is_some() {
            self.surface.push_group();
            frame.mask_group = true;
        }
        Ok(frame)
    }

    fn canvas_attributes(
        &mut self,
        frame: &mut CanvasFrame<S::Layer>,
        attributes: &[Attribute],
        location: &Location,
    ) -> Result<()> {
        let mut clip = None;
        for attr in attributes {
            let value = attr.value.as_str();
            match attr.name.as_str() {
                "RenderTransform" => {
                    let matrix = self.transform_attribute("Canvas", "RenderTransform", value, location)?;
                    self.surface.transform(matrix);
                }
                "Clip" => clip = Some(self.geometry_attribute(value)?),
                "Opacity" => {
                    frame.opacity = parse_attribute("Canvas", "Opacity", value, location, parse_double)?;
                }
                "OpacityMask" => {
                    frame.opacity_mask = self.brush_attribute("Canvas", "OpacityMask", value, location)?;
                }
                other => tracing::trace!(attribute = other, "ignoring canvas attribute"),
            }
        }

        if let Some(clip) = clip {
            self.surface.new_path();
            parse_path_data(&clip, &mut *self.surface)?;
            self.surface.clip();
        }
        Ok(())
    }

    pub(crate) fn canvas_start(
        &mut self,
        frame: &mut CanvasFrame<S::Layer>,
        name: &str,
        attributes: &[Attribute],
        location: &Location,
    ) -> Result<Option<Frame<S::Layer>>> {
        match name {
            "Canvas.RenderTransform" => Ok(Some(Frame::Matrix(MatrixFrame::default()))),
            "Canvas.OpacityMask" => Ok(Some(Frame::Brush(BrushFrame::default()))),
            "Canvas.Resources" => Ok(Some(self.open_resources(&mut frame.resource_dicts))),
            _ => self.content_start(name, attributes, location),
        }
    }

    pub(crate) fn canvas_end(
        &mut self,
        frame: &mut CanvasFrame<S::Layer>,
        name: &str,
        product: Product<S::Layer>,
    ) -> Result<()> {
        match (name, product) {
            ("Canvas.RenderTransform", Product::Matrix(matrix)) => self.surface.transform(matrix),
            ("Canvas.OpacityMask", Product::Pattern(Some(mask))) if frame.opacity_mask.is_none() => {
                frame.opacity_mask = Some(mask);
                self.surface.push_group();
                frame.mask_group = true;
            }
            _ => {}
        }
        Ok(())
    }

    pub(crate) fn finish_canvas(&mut self, frame: &mut CanvasFrame<S::Layer>) -> Product<S::Layer> {
        if std::mem::take(&mut frame.mask_group) {
            self.surface.pop_group_to_source();
            if let Some(mask) = frame.opacity_mask.take() {
                self.surface.mask(&mask);
            }
        }
        if std::mem::take(&mut frame.opacity_group) {
            self.surface.pop_group_to_source();
            self.surface.paint_with_alpha(frame.opacity);
        }
        self.pop_dicts(&mut frame.resource_dicts);
        self.surface.restore();
        Product::None
    }

    pub(crate) fn abort_canvas(&mut self, mut frame: CanvasFrame<S::Layer>) {
        if frame.mask_group {
            self.surface.pop_group();
        }
        if frame.opacity_group {
            self.surface.pop_group();
        }
        self.pop_dicts(&mut frame.resource_dicts);
        self.surface.restore();
    }
}
