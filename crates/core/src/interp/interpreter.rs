//! Fixed page interpreter.
//!
//! `PageInterpreter` consumes the markup events of a page and drives a
//! `DrawingSurface`. Elements are handled through the frame stack in
//! `stack`: the frame on top receives the start and end tags of the
//! elements nested in the element that owns it. Element handlers live in
//! `ops`, grouped by element family.
//!
//! Resources referenced with `{StaticResource key}` are stored as markup
//! and replayed through a nested frame stack, so a brush defined in a
//! dictionary goes through the same code as an inline one.

use crate::document::ArchiveReader;
use crate::error::{Location, Result, XpsError};
use crate::font::{FontCache, FontProvider};
use crate::image::{ImageCache, ImageProvider};
use crate::interp::device::DrawingSurface;
use crate::interp::resources::{ResourceScope, geometry_to_path_data};
use crate::interp::stack::{Frame, ParserStack, Product, RenderFrame};
use crate::model::{Color, ColorError, ColorResolver, IccProfileCache, Pattern};
use crate::options::RenderOptions;
use crate::parser::markup::{Attribute, MarkupEvent, MarkupEventSource, MarkupReader};
use crate::parser::values::{parse_matrix, static_resource_key};
use crate::utils::Matrix;

/// Everything a page needs from its document besides the markup.
#[derive(Clone, Copy)]
pub struct PageContext<'a> {
    /// Part name of the page. Relative URIs resolve against it.
    pub source: &'a str,
    pub archive: &'a dyn ArchiveReader,
    pub icc_profiles: &'a IccProfileCache,
    pub fonts: &'a FontCache,
    pub font_provider: &'a dyn FontProvider,
    pub image_provider: &'a dyn ImageProvider,
    pub images: &'a ImageCache,
    pub options: &'a RenderOptions,
}

/// Fixed page interpreter - executes page markup against a surface.
pub struct PageInterpreter<'a, S: DrawingSurface> {
    pub(crate) ctx: PageContext<'a>,
    /// Output surface for drawing operations
    pub(crate) surface: &'a mut S,
    /// Resource dictionaries in scope
    pub(crate) resources: ResourceScope,
    /// Visual brushes currently rendering their content
    pub(crate) visual_depth: usize,
}

impl<'a, S: DrawingSurface> PageInterpreter<'a, S> {
    pub fn new(ctx: PageContext<'a>, surface: &'a mut S) -> Self {
        Self {
            ctx,
            surface,
            resources: ResourceScope::new(),
            visual_depth: 0,
        }
    }

    // ========================================================================
    // Page Processing
    // ========================================================================

    /// Renders a page from its markup events.
    ///
    /// On error every open group and save is undone before returning, so
    /// the surface is left balanced.
    pub fn render<I: MarkupEventSource>(&mut self, events: I) -> Result<()> {
        tracing::debug!(source = self.ctx.source, "rendering page");
        let mut stack = ParserStack::new(Frame::Render(RenderFrame::default()));

        for item in events {
            let result = item.and_then(|(location, event)| self.feed(&mut stack, &location, event));
            if let Err(err) = result {
                self.unwind(&mut stack);
                return Err(err);
            }
        }

        if stack.depth != 0 || stack.entries.len() != 1 {
            self.unwind(&mut stack);
            return Err(self.truncated_markup());
        }
        match stack.pop() {
            Some(mut root) => self.finish_frame(&mut root.frame).map(|_| ()),
            None => Ok(()),
        }
    }

    /// Replays a stored fragment. The fragment's first element owns
    /// `root`; its product is returned once that element ends.
    pub(crate) fn run_fragment(
        &mut self,
        root: Frame<S::Layer>,
        mut events: MarkupReader,
        expected_root: Option<&str>,
    ) -> Result<Product<S::Layer>> {
        let (location, first) = events.next().ok_or_else(|| self.truncated_markup())??;
        match first {
            MarkupEvent::Start { name, .. } => {
                if expected_root.is_some_and(|expected| expected != name) {
                    return Err(XpsError::unknown_element(&location, &name));
                }
            }
            _ => {
                return Err(XpsError::Xml {
                    location,
                    msg: "expected a start tag".to_string(),
                });
            }
        }

        let mut stack = ParserStack::with_open_root(root);
        for item in events {
            let result = item.and_then(|(location, event)| self.feed(&mut stack, &location, event));
            match result {
                Ok(Some(product)) => return Ok(product),
                Ok(None) => {}
                Err(err) => {
                    self.unwind(&mut stack);
                    return Err(err);
                }
            }
        }

        self.unwind(&mut stack);
        Err(self.truncated_markup())
    }

    fn truncated_markup(&self) -> XpsError {
        XpsError::Xml {
            location: Location::new(self.ctx.source, 0, 0),
            msg: "unexpected end of markup".to_string(),
        }
    }

    /// Processes one event. Returns the root product when the element
    /// owning the bottom frame ends.
    fn feed(
        &mut self,
        stack: &mut ParserStack<S::Layer>,
        location: &Location,
        event: MarkupEvent,
    ) -> Result<Option<Product<S::Layer>>> {
        match event {
            MarkupEvent::Start { name, attributes } => {
                stack.depth += 1;
                let Some(mut top) = stack.pop() else {
                    return Err(XpsError::unknown_element(location, &name));
                };
                let child = self.start_element(&mut top.frame, &name, &attributes, location);
                stack.entries.push(top);
                if let Some(child) = child? {
                    stack.push(child);
                }
                Ok(None)
            }
            MarkupEvent::End { name } => {
                let owned = stack.top_owned_here();
                stack.depth = stack.depth.saturating_sub(1);
                let Some(mut top) = stack.pop() else {
                    return Err(XpsError::unknown_element(location, &name));
                };

                if !owned {
                    let result = self.end_element(&mut top.frame, &name, Product::None, location);
                    stack.entries.push(top);
                    return result.map(|()| None);
                }

                let product = match self.finish_frame(&mut top.frame) {
                    Ok(product) => product,
                    Err(err) => {
                        self.abort_frame(top.frame);
                        return Err(err);
                    }
                };
                let Some(mut parent) = stack.pop() else {
                    return Ok(Some(product));
                };
                let result = self.end_element(&mut parent.frame, &name, product, location);
                stack.entries.push(parent);
                result.map(|()| None)
            }
            MarkupEvent::Text(_) => Ok(None),
        }
    }

    /// Aborts every frame left on the stack, innermost first.
    fn unwind(&mut self, stack: &mut ParserStack<S::Layer>) {
        while let Some(entry) = stack.pop() {
            tracing::trace!(frame = entry.frame.name(), "aborting frame");
            self.abort_frame(entry.frame);
        }
    }

    // ========================================================================
    // Frame Dispatch
    // ========================================================================

    fn start_element(
        &mut self,
        frame: &mut Frame<S::Layer>,
        name: &str,
        attributes: &[Attribute],
        location: &Location,
    ) -> Result<Option<Frame<S::Layer>>> {
        match frame {
            Frame::Render(f) => self.render_start(f, name, attributes, location),
            Frame::Canvas(f) => self.canvas_start(f, name, attributes, location),
            Frame::Path(f) => self.path_start(f, name, attributes, location),
            Frame::PathGeometry(f) => self.path_geometry_start(f, name, attributes, location),
            Frame::Brush(f) => self.brush_start(f, name, attributes, location),
            Frame::Gradient(f) => self.gradient_start(f, name, attributes, location),
            Frame::ImageBrush(_) => self.image_brush_start(name, location),
            Frame::Glyphs(f) => self.glyphs_start(f, name, location),
            Frame::Matrix(f) => self.matrix_start(f, name, attributes, location),
            Frame::Resources(f) => self.resources_start(f, name, attributes, location),
            Frame::ResourceDict(f) => self.resource_dict_start(f, name, attributes, location),
        }
    }

    fn end_element(
        &mut self,
        frame: &mut Frame<S::Layer>,
        name: &str,
        product: Product<S::Layer>,
        location: &Location,
    ) -> Result<()> {
        match frame {
            Frame::Render(f) => self.render_end(f, name, product),
            Frame::Canvas(f) => self.canvas_end(f, name, product),
            Frame::Path(f) => self.path_end(f, name, product),
            Frame::PathGeometry(f) => self.path_geometry_end(f, name, product),
            Frame::Brush(f) => self.brush_end(f, product),
            Frame::Gradient(f) => self.gradient_end(f, name, product),
            Frame::ImageBrush(f) => self.image_brush_end(f, name, product),
            Frame::Glyphs(f) => self.glyphs_end(f, name, product),
            Frame::Matrix(_) => Ok(()),
            Frame::Resources(f) => self.resources_end(f, name),
            Frame::ResourceDict(f) => self.resource_dict_end(f, name),
        }
        .inspect_err(|err| tracing::debug!(%location, %err, "element end failed"))
    }

    /// Finishes a frame whose owning element ended. On error nothing the
    /// frame opened has been closed yet, so `abort_frame` still applies.
    fn finish_frame(&mut self, frame: &mut Frame<S::Layer>) -> Result<Product<S::Layer>> {
        match frame {
            Frame::Render(f) => Ok(self.finish_render(f)),
            Frame::Canvas(f) => Ok(self.finish_canvas(f)),
            Frame::Path(f) => self.finish_path(f),
            Frame::PathGeometry(f) => Ok(Product::Path(std::mem::take(&mut f.state))),
            Frame::Brush(f) => Ok(Product::Pattern(f.pattern.take())),
            Frame::Gradient(f) => Ok(Product::Brush(f.brush.clone())),
            Frame::ImageBrush(f) => Ok(Product::Brush(f.brush.clone())),
            Frame::Glyphs(f) => self.finish_glyphs(f),
            Frame::Matrix(f) => Ok(Product::Matrix(f.matrix)),
            Frame::Resources(_) | Frame::ResourceDict(_) => Ok(Product::None),
        }
    }

    /// Undoes whatever surface and resource state a frame still holds.
    fn abort_frame(&mut self, frame: Frame<S::Layer>) {
        match frame {
            Frame::Render(f) => self.abort_render(f),
            Frame::Canvas(f) => self.abort_canvas(f),
            Frame::Path(f) => self.abort_path(f),
            Frame::Glyphs(f) => self.abort_glyphs(f),
            Frame::PathGeometry(_)
            | Frame::Brush(_)
            | Frame::Gradient(_)
            | Frame::ImageBrush(_)
            | Frame::Matrix(_)
            | Frame::Resources(_)
            | Frame::ResourceDict(_) => {}
        }
    }

    // ========================================================================
    // Attribute Values
    // ========================================================================

    pub(crate) fn color_resolver(&self) -> ColorResolver<'a> {
        ColorResolver::new(self.ctx.archive, self.ctx.icc_profiles, self.ctx.source)
    }

    /// Resolves a color literal. Malformed literals are errors; colors that
    /// cannot be converted resolve to `None`.
    pub(crate) fn resolve_color(
        &self,
        element: &str,
        attribute: &str,
        value: &str,
        location: &Location,
    ) -> Result<Option<Color>> {
        match self.color_resolver().resolve(value) {
            Ok(color) => Ok(Some(color)),
            Err(ColorError::Malformed(_)) => Err(XpsError::invalid_content(
                location, element, attribute, value,
            )),
            Err(ColorError::Unsupported(msg)) => {
                tracing::debug!(element, attribute, %msg, "omitting unsupported color");
                Ok(None)
            }
        }
    }

    /// Resolves a brush-valued attribute: a color literal or a reference
    /// to a brush resource.
    pub(crate) fn brush_attribute(
        &mut self,
        element: &str,
        attribute: &str,
        value: &str,
        location: &Location,
    ) -> Result<Option<Pattern<S::Layer>>> {
        if let Some(key) = static_resource_key(value) {
            return self.replay_brush(key);
        }
        Ok(self
            .resolve_color(element, attribute, value, location)?
            .map(Pattern::solid))
    }

    /// Resolves a transform-valued attribute: six matrix components or a
    /// reference to a `MatrixTransform` resource.
    pub(crate) fn transform_attribute(
        &mut self,
        element: &str,
        attribute: &str,
        value: &str,
        location: &Location,
    ) -> Result<Matrix> {
        if let Some(key) = static_resource_key(value) {
            return self.replay_transform(key);
        }
        parse_matrix(value)
            .ok_or_else(|| XpsError::invalid_content(location, element, attribute, value))
    }

    /// Resolves a geometry-valued attribute to abbreviated path data.
    pub(crate) fn geometry_attribute(&self, value: &str) -> Result<String> {
        match static_resource_key(value) {
            Some(key) => geometry_to_path_data(self.ctx.source, self.resource(key)?),
            None => Ok(value.to_string()),
        }
    }

    // ========================================================================
    // Static Resources
    // ========================================================================

    fn resource(&self, key: &str) -> Result<&str> {
        self.resources
            .get(key)
            .ok_or_else(|| XpsError::ResourceNotFound(key.to_string()))
    }

    fn replay_brush(&mut self, key: &str) -> Result<Option<Pattern<S::Layer>>> {
        tracing::trace!(key, "replaying brush resource");
        let events = MarkupReader::from_text(self.ctx.source, self.resource(key)?);
        match self.run_fragment(Frame::Brush(Default::default()), events, None)? {
            Product::Pattern(pattern) => Ok(pattern),
            _ => Ok(None),
        }
    }

    fn replay_transform(&mut self, key: &str) -> Result<Matrix> {
        tracing::trace!(key, "replaying transform resource");
        let events = MarkupReader::from_text(self.ctx.source, self.resource(key)?);
        match self.run_fragment(Frame::Matrix(Default::default()), events, None)? {
            Product::Matrix(matrix) => Ok(matrix),
            _ => Ok(crate::utils::MATRIX_IDENTITY),
        }
    }

    /// Pops the resource dictionaries a frame pushed.
    pub(crate) fn pop_dicts(&mut self, count: &mut usize) {
        for _ in 0..std::mem::take(count) {
            self.resources.pop_dict();
        }
    }
}

/// Value of a required attribute.
pub(crate) fn required_attribute<'v>(
    attributes: &'v [Attribute],
    element: &str,
    attribute: &str,
    location: &Location,
) -> Result<&'v str> {
    crate::parser::markup::attribute_value(attributes, attribute)
        .ok_or_else(|| XpsError::missing_attribute(location, element, attribute))
}

/// Parses an attribute value with one of the value grammars.
pub(crate) fn parse_attribute<T>(
    element: &str,
    attribute: &str,
    value: &str,
    location: &Location,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Result<T> {
    parse(value).ok_or_else(|| XpsError::invalid_content(location, element, attribute, value))
}
