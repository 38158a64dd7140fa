//! MatrixTransform element, the body of every `*.Transform` and
//! `*.RenderTransform` property element.

use crate::error::{Location, Result, XpsError};
use crate::interp::device::DrawingSurface;
use crate::interp::interpreter::{PageInterpreter, parse_attribute};
use crate::interp::resources::KEY_ATTRIBUTE;
use crate::interp::stack::{Frame, MatrixFrame};
use crate::parser::markup::Attribute;
use crate::parser::values::parse_matrix;

impl<'a, S: DrawingSurface> PageInterpreter<'a, S> {
    pub(crate) fn matrix_start(
        &mut self,
        frame: &mut MatrixFrame,
        name: &str,
        attributes: &[Attribute],
        location: &Location,
    ) -> Result<Option<Frame<S::Layer>>> {
        const ELEMENT: &str = "MatrixTransform";
        if name != ELEMENT {
            return Err(XpsError::unknown_element(location, name));
        }

        for attr in attributes {
            match attr.name.as_str() {
                "Matrix" => {
                    frame.matrix = parse_attribute(ELEMENT, "Matrix", &attr.value, location, parse_matrix)?;
                }
                KEY_ATTRIBUTE => {}
                other => return Err(XpsError::unknown_attribute(location, ELEMENT, other)),
            }
        }
        Ok(None)
    }
}
