//! Resource dictionaries and the markup fragments they hold.
//!
//! A resource is stored as markup text and replayed through the
//! interpreter when a `{StaticResource key}` reference names it. Each
//! fragment is wrapped in an element named after the resource so the
//! replay has a single root:
//!
//! ```text
//! <SolidColorBrush>
//! <SolidColorBrush Color="#FF0000">
//! </SolidColorBrush>
//! </SolidColorBrush>
//! ```

use std::fmt::Write;

use quick_xml::escape::escape;
use rustc_hash::FxHashMap;

use crate::error::{Location, Result, XpsError};
use crate::model::FillRule;
use crate::parser::markup::{Attribute, MarkupEvent, MarkupReader, attribute_value};
use crate::parser::values::{parse_bool, parse_point, parse_points};

/// Attribute naming the key of a dictionary entry.
pub const KEY_ATTRIBUTE: &str = "x:Key";

/// Stack of resource dictionaries. Lookups search the innermost
/// dictionary first.
#[derive(Debug, Default, Clone)]
pub struct ResourceScope {
    dicts: Vec<FxHashMap<String, String>>,
}

impl ResourceScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_dict(&mut self) {
        self.dicts.push(FxHashMap::default());
    }

    pub fn pop_dict(&mut self) {
        if self.dicts.pop().is_none() {
            tracing::warn!("resource dictionary stack underflow");
        }
    }

    /// Stores `markup` under `key` in the innermost dictionary, pushing
    /// one if the stack is empty. An existing key keeps its first value;
    /// returns whether the entry was stored.
    pub fn set(&mut self, key: &str, markup: String) -> bool {
        if self.dicts.is_empty() {
            self.push_dict();
        }
        let Some(dict) = self.dicts.last_mut() else {
            return false;
        };
        if dict.contains_key(key) {
            tracing::debug!(key, "duplicate resource key, keeping the first value");
            return false;
        }
        dict.insert(key.to_string(), markup);
        true
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.dicts
            .iter()
            .rev()
            .find_map(|dict| dict.get(key))
            .map(String::as_str)
    }

    /// Number of dictionaries currently pushed.
    pub fn depth(&self) -> usize {
        self.dicts.len()
    }
}

/// Builds the stored markup of one dictionary entry while its elements
/// stream past.
#[derive(Debug, Clone)]
pub struct ResourceMarkup {
    key: String,
    root: String,
    text: String,
    /// Open elements below the entry root.
    nesting: usize,
}

impl ResourceMarkup {
    /// Starts an entry whose root element is `name`. The key attribute is
    /// not copied into the stored markup.
    pub fn open(key: &str, name: &str, attributes: &[Attribute]) -> Self {
        let mut text = format!("<{name}>\n");
        write_start_tag(&mut text, name, attributes);
        Self {
            key: key.to_string(),
            root: name.to_string(),
            text,
            nesting: 0,
        }
    }

    pub fn start_child(&mut self, name: &str, attributes: &[Attribute]) {
        write_start_tag(&mut self.text, name, attributes);
        self.nesting += 1;
    }

    /// Records an end tag. Returns `true` when it closes the entry root.
    pub fn end_element(&mut self, name: &str) -> bool {
        if self.nesting == 0 {
            return true;
        }
        self.nesting -= 1;
        let _ = writeln!(self.text, "</{name}>");
        false
    }

    /// Closes the wrapper and returns the key and the stored markup.
    pub fn finish(mut self) -> (String, String) {
        let _ = write!(self.text, "</{0}>\n</{0}>", self.root);
        (self.key, self.text)
    }
}

fn write_start_tag(text: &mut String, name: &str, attributes: &[Attribute]) {
    let _ = write!(text, "<{name}");
    for attr in attributes.iter().filter(|attr| attr.name != KEY_ATTRIBUTE) {
        let _ = write!(text, " {}=\"{}\"", attr.name, escape(attr.value.as_str()));
    }
    text.push_str(">\n");
}

// ============================================================================
// Geometry resources
// ============================================================================

/// Converts a stored `PathGeometry` resource to abbreviated path data, so a
/// `Data` or `Clip` attribute can reference it.
///
/// A geometry with `Figures` contributes them verbatim; otherwise the
/// `PathFigure` children are written out as `M`, `L`, `C`, `Q`, `A` and
/// `Z` commands. A nonzero fill rule becomes a leading `F1`.
pub fn geometry_to_path_data(source: &str, markup: &str) -> Result<String> {
    let mut data = String::new();
    let mut depth = 0usize;
    let mut figure_closed = false;

    for item in MarkupReader::from_text(source, markup) {
        let (location, event) = item?;
        match event {
            MarkupEvent::Start { name, attributes } => {
                depth += 1;
                match (depth, name.as_str()) {
                    (1, _) => {}
                    (2, "PathGeometry") => {
                        let rule = attribute_value(&attributes, "FillRule")
                            .map(FillRule::parse)
                            .unwrap_or_default();
                        if rule == FillRule::NonZero {
                            data.push_str("F1 ");
                        }
                        if let Some(figures) = attribute_value(&attributes, "Figures") {
                            data.push_str(figures);
                        }
                        if attribute_value(&attributes, "Transform").is_some() {
                            tracing::debug!("geometry transform dropped from path data");
                        }
                    }
                    (2, other) => return Err(XpsError::unknown_element(&location, other)),
                    (_, "PathFigure") => {
                        figure_closed = write_figure_start(&mut data, &attributes, &location)?;
                    }
                    (_, "PathGeometry.Transform" | "MatrixTransform") => {
                        tracing::debug!("geometry transform dropped from path data");
                    }
                    (_, segment) => write_segment(&mut data, segment, &attributes, &location)?,
                }
            }
            MarkupEvent::End { name } => {
                depth = depth.saturating_sub(1);
                if name == "PathFigure" && std::mem::take(&mut figure_closed) {
                    data.push_str(" Z");
                }
            }
            MarkupEvent::Text(_) => {}
        }
    }

    Ok(data.trim_end().to_string())
}

/// Writes the `M` of a figure and returns its `IsClosed` flag.
fn write_figure_start(
    data: &mut String,
    attributes: &[Attribute],
    location: &Location,
) -> Result<bool> {
    let start = attribute_value(attributes, "StartPoint")
        .ok_or_else(|| XpsError::missing_attribute(location, "PathFigure", "StartPoint"))?;
    let (x, y) = parse_point(start)
        .ok_or_else(|| XpsError::invalid_content(location, "PathFigure", "StartPoint", start))?;
    let closed = match attribute_value(attributes, "IsClosed") {
        Some(value) => parse_bool(value)
            .ok_or_else(|| XpsError::invalid_content(location, "PathFigure", "IsClosed", value))?,
        None => false,
    };
    if !data.is_empty() && !data.ends_with(' ') {
        data.push(' ');
    }
    let _ = write!(data, "M {x},{y}");
    Ok(closed)
}

fn write_segment(
    data: &mut String,
    segment: &str,
    attributes: &[Attribute],
    location: &Location,
) -> Result<()> {
    let points_of = |attribute: &str| -> Result<Vec<(f64, f64)>> {
        let value = attribute_value(attributes, attribute)
            .ok_or_else(|| XpsError::missing_attribute(location, segment, attribute))?;
        parse_points(value)
            .ok_or_else(|| XpsError::invalid_content(location, segment, attribute, value))
    };

    let command = match segment {
        "PolyLineSegment" => "L",
        "PolyBezierSegment" => "C",
        "PolyQuadraticBezierSegment" => "Q",
        "ArcSegment" => {
            let point = points_of("Point")?;
            let size = points_of("Size")?;
            let rotation = attribute_value(attributes, "RotationAngle").unwrap_or("0");
            let large = attribute_value(attributes, "IsLargeArc") == Some("true");
            let sweep = attribute_value(attributes, "SweepDirection") == Some("Clockwise");
            if let (Some(&(px, py)), Some(&(sw, sh))) = (point.first(), size.first()) {
                let _ = write!(
                    data,
                    " A {sw},{sh} {rotation} {} {} {px},{py}",
                    u8::from(large),
                    u8::from(sweep)
                );
            }
            return Ok(());
        }
        other => {
            tracing::debug!(element = other, "ignoring element in geometry resource");
            return Ok(());
        }
    };

    let points = points_of("Points")?;
    let _ = write!(data, " {command}");
    for (x, y) in points {
        let _ = write!(data, " {x},{y}");
    }
    Ok(())
}
