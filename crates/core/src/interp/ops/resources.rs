//! Resource dictionaries.
//!
//! Handles: ResourceDictionary (inline or with a `Source` part) and its
//! keyed entries
//!
//! Entries are not interpreted when they are defined. Their markup is
//! recorded under the entry key and replayed when a `{StaticResource}`
//! reference uses it.

use crate::error::{Location, Result, XpsError};
use crate::interp::device::DrawingSurface;
use crate::interp::interpreter::{PageInterpreter, required_attribute};
use crate::interp::resources::{KEY_ATTRIBUTE, ResourceMarkup};
use crate::interp::stack::{Frame, ResourceDictFrame, ResourcesFrame};
use crate::parser::markup::{Attribute, MarkupReader, attribute_value};
use crate::utils::resolve_relative_path;

impl<'a, S: DrawingSurface> PageInterpreter<'a, S> {
    pub(crate) fn resources_start(
        &mut self,
        frame: &mut ResourcesFrame,
        name: &str,
        attributes: &[Attribute],
        location: &Location,
    ) -> Result<Option<Frame<S::Layer>>> {
        // A dictionary loaded from `Source` takes no inline content.
        if name != "ResourceDictionary" || frame.remote {
            return Err(XpsError::unknown_element(location, name));
        }
        match attribute_value(attributes, "Source") {
            Some(source) => {
                self.load_remote_dictionary(source)?;
                frame.remote = true;
                Ok(None)
            }
            None => Ok(Some(Frame::ResourceDict(ResourceDictFrame::default()))),
        }
    }

    pub(crate) fn resources_end(&mut self, frame: &mut ResourcesFrame, name: &str) -> Result<()> {
        if name == "ResourceDictionary" {
            frame.remote = false;
        }
        Ok(())
    }

    /// Loads the entries of a dictionary stored in its own part into the
    /// innermost dictionary.
    fn load_remote_dictionary(&mut self, source: &str) -> Result<()> {
        let uri = resolve_relative_path(self.ctx.source, source.trim());
        if !self.ctx.archive.has_entry(&uri) {
            return Err(XpsError::ResourceNotFound(uri));
        }
        tracing::debug!(uri, "loading remote resource dictionary");
        let data = self.ctx.archive.read_entry(&uri)?;
        let events = MarkupReader::new(uri, data)?;
        self.run_fragment(
            Frame::ResourceDict(ResourceDictFrame::default()),
            events,
            Some("ResourceDictionary"),
        )?;
        Ok(())
    }

    pub(crate) fn resource_dict_start(
        &mut self,
        frame: &mut ResourceDictFrame,
        name: &str,
        attributes: &[Attribute],
        location: &Location,
    ) -> Result<Option<Frame<S::Layer>>> {
        match frame.current.as_mut() {
            Some(entry) => entry.start_child(name, attributes),
            None => {
                let key = required_attribute(attributes, name, KEY_ATTRIBUTE, location)?;
                frame.current = Some(ResourceMarkup::open(key, name, attributes));
            }
        }
        Ok(None)
    }

    pub(crate) fn resource_dict_end(&mut self, frame: &mut ResourceDictFrame, name: &str) -> Result<()> {
        let closes_entry = frame
            .current
            .as_mut()
            .is_some_and(|entry| entry.end_element(name));
        if closes_entry && let Some(entry) = frame.current.take() {
            let (key, markup) = entry.finish();
            tracing::trace!(key, "stored resource");
            self.resources.set(&key, markup);
        }
        Ok(())
    }
}
