//! Parsers for fixed-page markup and its attribute mini-languages.

pub mod glyph_indices;
pub mod markup;
pub mod path_data;
pub mod values;

pub use glyph_indices::{GlyphLayout, GlyphPlacement, PositionedGlyph, TextCluster, layout_glyphs};
pub use markup::{
    Attribute, MarkupEvent, MarkupEventSource, MarkupReader, PositionedEvent, attribute_value,
};
pub use path_data::parse_path_data;
