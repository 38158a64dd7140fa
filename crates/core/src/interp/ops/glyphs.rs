//! Glyphs element.
//!
//! Handles: Glyphs, Glyphs.RenderTransform, Glyphs.Fill, Glyphs.OpacityMask,
//! Glyphs.Clip
//!
//! The run is laid out and drawn when the element ends, once every
//! property element has been seen.

use std::f64::consts::FRAC_PI_2;

use crate::error::{Location, Result};
use crate::font::ScaledFont;
use crate::interp::device::DrawingSurface;
use crate::interp::interpreter::{PageInterpreter, parse_attribute, required_attribute};
use crate::interp::stack::{BrushFrame, Frame, GlyphsFrame, MatrixFrame, Product};
use crate::model::GlyphRun;
use crate::parser::glyph_indices::{GlyphPlacement, layout_glyphs};
use crate::parser::markup::Attribute;
use crate::parser::path_data::parse_path_data;
use crate::parser::values::{parse_bool, parse_double, parse_int};
use crate::utils::{mult_matrix, resolve_relative_path, rotation_matrix, scale_matrix};

/// Horizontal shear of simulated italics, relative to the em size.
const ITALIC_SHEAR: f64 = 0.342;

impl<'a, S: DrawingSurface> PageInterpreter<'a, S> {
    pub(crate) fn begin_glyphs(
        &mut self,
        attributes: &[Attribute],
        location: &Location,
    ) -> Result<GlyphsFrame<S::Layer>> {
        const ELEMENT: &str = "Glyphs";
        let font_uri = required_attribute(attributes, ELEMENT, "FontUri", location)?;
        let em_size = required_attribute(attributes, ELEMENT, "FontRenderingEmSize", location)?;
        let origin_x = required_attribute(attributes, ELEMENT, "OriginX", location)?;
        let origin_y = required_attribute(attributes, ELEMENT, "OriginY", location)?;

        let run = GlyphRun::new(
            resolve_relative_path(self.ctx.source, font_uri),
            parse_attribute(ELEMENT, "FontRenderingEmSize", em_size, location, parse_double)?,
            parse_attribute(ELEMENT, "OriginX", origin_x, location, parse_double)?,
            parse_attribute(ELEMENT, "OriginY", origin_y, location, parse_double)?,
        );
        let mut frame = GlyphsFrame {
            run,
            opacity_group: false,
            mask_group: false,
        };

        self.surface.save();
        if let Err(err) = self.glyphs_attributes(&mut frame.run, attributes, location) {
            self.surface.restore();
            return Err(err);
        }

        if frame.run.opacity != 1.0 {
            self.surface.push_group();
            frame.opacity_group = true;
        }
        if frame.run.opacity_mask.is_some() {
            self.surface.push_group();
            frame.mask_group = true;
        }
        Ok(frame)
    }

    fn glyphs_attributes(
        &mut self,
        run: &mut GlyphRun<S::Layer>,
        attributes: &[Attribute],
        location: &Location,
    ) -> Result<()> {
        const ELEMENT: &str = "Glyphs";
        for attr in attributes {
            let value = attr.value.as_str();
            let name = attr.name.as_str();
            match name {
                "FontUri" | "FontRenderingEmSize" | "OriginX" | "OriginY" => {}
                "UnicodeString" => run.text = Some(value.to_string()),
                "Indices" => run.indices = Some(value.to_string()).filter(|v| !v.trim().is_empty()),
                "Fill" => run.fill_pattern = self.brush_attribute(ELEMENT, name, value, location)?,
                "OpacityMask" => run.opacity_mask = self.brush_attribute(ELEMENT, name, value, location)?,
                "Clip" => run.clip_data = Some(self.geometry_attribute(value)?),
                "RenderTransform" => {
                    let matrix = self.transform_attribute(ELEMENT, name, value, location)?;
                    self.surface.transform(matrix);
                }
                "BidiLevel" => run.bidi_level = parse_attribute(ELEMENT, name, value, location, parse_int)?,
                "IsSideways" => run.is_sideways = parse_attribute(ELEMENT, name, value, location, parse_bool)?,
                "StyleSimulations" => {
                    run.italic = matches!(value, "ItalicSimulation" | "BoldItalicSimulation");
                    if value.starts_with("Bold") {
                        tracing::debug!("bold simulation is not applied");
                    }
                }
                "Opacity" => run.opacity = parse_attribute(ELEMENT, name, value, location, parse_double)?,
                other => tracing::trace!(attribute = other, "ignoring glyphs attribute"),
            }
        }
        Ok(())
    }

    pub(crate) fn glyphs_start(
        &mut self,
        _frame: &mut GlyphsFrame<S::Layer>,
        name: &str,
        location: &Location,
    ) -> Result<Option<Frame<S::Layer>>> {
        match name {
            "Glyphs.RenderTransform" => Ok(Some(Frame::Matrix(MatrixFrame::default()))),
            "Glyphs.Fill" | "Glyphs.OpacityMask" => Ok(Some(Frame::Brush(BrushFrame::default()))),
            other => {
                tracing::debug!(%location, element = other, "ignoring glyphs child");
                Ok(None)
            }
        }
    }

    pub(crate) fn glyphs_end(
        &mut self,
        frame: &mut GlyphsFrame<S::Layer>,
        name: &str,
        product: Product<S::Layer>,
    ) -> Result<()> {
        match (name, product) {
            ("Glyphs.RenderTransform", Product::Matrix(matrix)) => self.surface.transform(matrix),
            ("Glyphs.Fill", Product::Pattern(pattern)) => frame.run.fill_pattern = pattern,
            ("Glyphs.OpacityMask", Product::Pattern(Some(mask))) if frame.run.opacity_mask.is_none() => {
                frame.run.opacity_mask = Some(mask);
                self.surface.push_group();
                frame.mask_group = true;
            }
            _ => {}
        }
        Ok(())
    }

    /// Lays out and draws the run. Font and layout errors fail the page.
    pub(crate) fn finish_glyphs(&mut self, frame: &mut GlyphsFrame<S::Layer>) -> Result<Product<S::Layer>> {
        let run = &frame.run;
        let face = self
            .ctx
            .fonts
            .get_or_load(self.ctx.font_provider, self.ctx.archive, &run.font_uri)?;

        if let Some(clip) = &run.clip_data {
            self.surface.new_path();
            parse_path_data(clip, &mut *self.surface)?;
            self.surface.clip();
        }

        let mut font_matrix = scale_matrix(run.em_size, run.em_size);
        if run.italic {
            font_matrix.2 = -ITALIC_SHEAR * run.em_size;
        }
        if run.is_sideways {
            font_matrix = mult_matrix(rotation_matrix(-FRAC_PI_2), font_matrix);
        }
        let font = ScaledFont::new(face, font_matrix);

        let text = run.text.as_deref().unwrap_or_default();
        let text = text.strip_prefix("{}").unwrap_or(text);
        let placement = GlyphPlacement {
            origin: (run.origin_x, run.origin_y),
            rtl: run.is_rtl(),
            sideways: run.is_sideways,
        };
        let layout = layout_glyphs(&font, text, run.indices.as_deref(), placement)?;
        tracing::trace!(glyphs = layout.glyphs.len(), font = %run.font_uri, "drawing glyph run");

        if let Some(fill) = &run.fill_pattern {
            self.surface.set_source(fill);
        }
        self.surface
            .show_glyphs(&font, &layout.glyphs, &layout.clusters, text);

        if std::mem::take(&mut frame.mask_group) {
            self.surface.pop_group_to_source();
            if let Some(mask) = frame.run.opacity_mask.take() {
                self.surface.mask(&mask);
            }
        }
        if std::mem::take(&mut frame.opacity_group) {
            self.surface.pop_group_to_source();
            self.surface.paint_with_alpha(frame.run.opacity);
        }
        self.surface.restore();
        Ok(Product::None)
    }

    pub(crate) fn abort_glyphs(&mut self, frame: GlyphsFrame<S::Layer>) {
        if frame.mask_group {
            self.surface.pop_group();
        }
        if frame.opacity_group {
            self.surface.pop_group();
        }
        self.surface.restore();
    }
}
