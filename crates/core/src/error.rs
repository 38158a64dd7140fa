//! Error types for page content interpretation.

use std::fmt;

use thiserror::Error;

/// Position of a markup event inside a part.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    /// Part name the event was read from.
    pub source: String,
    /// 1-based line.
    pub line: usize,
    /// 1-based column.
    pub column: usize,
}

impl Location {
    pub fn new(source: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            source: source.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source, self.line, self.column)
    }
}

#[derive(Error, Debug)]
pub enum XpsError {
    #[error("{location} invalid element '{element}'")]
    UnknownElement { location: Location, element: String },

    #[error("{location} unknown attribute '{attribute}' of element '{element}'")]
    UnknownAttribute {
        location: Location,
        element: String,
        attribute: String,
    },

    #[error("{location} missing attribute '{attribute}' of element '{element}'")]
    MissingAttribute {
        location: Location,
        element: String,
        attribute: String,
    },

    #[error("{location} invalid content in attribute '{attribute}' of element '{element}': {content}")]
    InvalidContent {
        location: Location,
        element: String,
        attribute: String,
        content: String,
    },

    #[error("{location} malformed markup: {msg}")]
    Xml { location: Location, msg: String },

    #[error("error parsing abbreviated path: {msg} at offset {pos}")]
    PathParse { pos: usize, msg: String },

    #[error("error parsing glyph indices: {msg} at offset {pos}")]
    GlyphParse { pos: usize, msg: String },

    #[error("error parsing glyphs: both UnicodeString and Indices are empty")]
    EmptyGlyphRun,

    #[error("unsupported color: {0}")]
    ColorResolution(String),

    #[error("source {0} not found in archive")]
    ResourceNotFound(String),

    #[error("visual brushes nested deeper than {0} levels")]
    NestingTooDeep(usize),

    #[error("font error: {0}")]
    Font(String),

    #[error("image error: {0}")]
    Image(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl XpsError {
    pub fn unknown_element(location: &Location, element: &str) -> Self {
        Self::UnknownElement {
            location: location.clone(),
            element: element.to_string(),
        }
    }

    pub fn unknown_attribute(location: &Location, element: &str, attribute: &str) -> Self {
        Self::UnknownAttribute {
            location: location.clone(),
            element: element.to_string(),
            attribute: attribute.to_string(),
        }
    }

    pub fn missing_attribute(location: &Location, element: &str, attribute: &str) -> Self {
        Self::MissingAttribute {
            location: location.clone(),
            element: element.to_string(),
            attribute: attribute.to_string(),
        }
    }

    pub fn invalid_content(
        location: &Location,
        element: &str,
        attribute: &str,
        content: &str,
    ) -> Self {
        Self::InvalidContent {
            location: location.clone(),
            element: element.to_string(),
            attribute: attribute.to_string(),
            content: content.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, XpsError>;
