//! Fixed page parts.
//!
//! `PageRenderer` ties a page part to its archive and the providers that
//! decode fonts and images, and runs the interpreter over it.

use crate::document::archive::{ArchiveReader, XpsArchive};
use crate::error::{Location, Result, XpsError};
use crate::font::FontProvider;
use crate::image::{ImageCache, ImageProvider, NoImages};
use crate::interp::device::DrawingSurface;
use crate::interp::interpreter::{PageContext, PageInterpreter};
use crate::options::RenderOptions;
use crate::parser::markup::{MarkupEvent, MarkupReader, attribute_value};
use crate::parser::values::parse_double;

/// Renders one fixed page of a package.
pub struct PageRenderer<'a, R: ArchiveReader> {
    archive: &'a XpsArchive<R>,
    source: String,
    font_provider: &'a dyn FontProvider,
    image_provider: &'a dyn ImageProvider,
    /// Images decoded for this page
    images: ImageCache,
    options: RenderOptions,
}

impl<'a, R: ArchiveReader> PageRenderer<'a, R> {
    /// Creates a renderer for the page part `source`.
    pub fn new(
        archive: &'a XpsArchive<R>,
        source: impl Into<String>,
        font_provider: &'a dyn FontProvider,
    ) -> Self {
        Self {
            archive,
            source: source.into(),
            font_provider,
            image_provider: &NoImages,
            images: ImageCache::new(),
            options: RenderOptions::default(),
        }
    }

    pub fn with_image_provider(mut self, provider: &'a dyn ImageProvider) -> Self {
        self.image_provider = provider;
        self
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    fn reader(&self) -> Result<MarkupReader> {
        if !self.archive.has_entry(&self.source) {
            return Err(XpsError::ResourceNotFound(self.source.clone()));
        }
        let data = self.archive.read_entry(&self.source)?;
        MarkupReader::new(self.source.as_str(), data)
    }

    /// Page size from the `Width` and `Height` of the root `FixedPage`.
    /// Both must be at least 1.
    pub fn size(&self) -> Result<(f64, f64)> {
        let mut events = self.reader()?;
        let (location, event) = events.next().ok_or_else(|| XpsError::Xml {
            location: Location::new(self.source.as_str(), 1, 1),
            msg: "empty page".to_string(),
        })??;
        let MarkupEvent::Start { name, attributes } = event else {
            return Err(XpsError::Xml {
                location,
                msg: "expected a start tag".to_string(),
            });
        };
        if name != "FixedPage" {
            return Err(XpsError::unknown_element(&location, &name));
        }

        let dimension = |attribute: &str| -> Result<f64> {
            let value = attribute_value(&attributes, attribute)
                .ok_or_else(|| XpsError::missing_attribute(&location, &name, attribute))?;
            parse_double(value)
                .filter(|v| *v >= 1.0)
                .ok_or_else(|| XpsError::invalid_content(&location, &name, attribute, value))
        };
        Ok((dimension("Width")?, dimension("Height")?))
    }

    /// Interprets the page onto `surface`.
    pub fn render<S: DrawingSurface>(&self, surface: &mut S) -> Result<()> {
        let events = self.reader()?;
        let ctx = PageContext {
            source: &self.source,
            archive: self.archive,
            icc_profiles: self.archive.icc_profiles(),
            fonts: self.archive.fonts(),
            font_provider: self.font_provider,
            image_provider: self.image_provider,
            images: &self.images,
            options: &self.options,
        };
        PageInterpreter::new(ctx, surface).render(events)
    }
}
