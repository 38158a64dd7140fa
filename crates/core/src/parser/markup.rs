//! Streaming markup events.
//!
//! `MarkupReader` turns a part's bytes into `(Location, MarkupEvent)` pairs
//! using quick-xml. Encoding normalization happens here:
//! - a UTF-8 byte order mark is skipped
//! - UTF-16 parts (detected by their byte order mark) are transcoded
//! - self-closing elements produce a start and an end event
//! - entity and character references are resolved in text and attributes

use std::borrow::Cow;
use std::io::Cursor;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{Location, Result, XpsError};

/// A single `name="value"` pair of a start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Value of the attribute called `name`, if present.
pub fn attribute_value<'a>(attributes: &'a [Attribute], name: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|attr| attr.name == name)
        .map(|attr| attr.value.as_str())
}

/// Events delivered to the interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupEvent {
    Start {
        name: String,
        attributes: Vec<Attribute>,
    },
    End {
        name: String,
    },
    Text(String),
}

pub type PositionedEvent = (Location, MarkupEvent);

/// Anything that yields positioned markup events.
pub trait MarkupEventSource: Iterator<Item = Result<PositionedEvent>> {}

impl<T: Iterator<Item = Result<PositionedEvent>>> MarkupEventSource for T {}

/// Tracks line and column while the reader advances through the input.
#[derive(Debug, Clone, Copy)]
struct LineCursor {
    offset: usize,
    line: usize,
    column: usize,
}

impl LineCursor {
    fn new() -> Self {
        Self {
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    fn advance_to(&mut self, data: &[u8], offset: usize) {
        let end = offset.min(data.len());
        if end < self.offset {
            return;
        }
        for &byte in &data[self.offset..end] {
            if byte == b'\n' {
                self.line += 1;
                self.column = 1;
            } else if byte & 0xC0 != 0x80 {
                self.column += 1;
            }
        }
        self.offset = end;
    }
}

/// Converts raw part bytes to UTF-8 without a byte order mark.
pub fn normalize_encoding(data: Vec<u8>) -> std::result::Result<Vec<u8>, String> {
    let decode_utf16 = |bytes: &[u8], from: fn([u8; 2]) -> u16| {
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| from([pair[0], pair[1]]))
            .collect();
        String::from_utf16(&units)
            .map(String::into_bytes)
            .map_err(|err| format!("invalid UTF-16 markup: {err}"))
    };

    match data.as_slice() {
        [0xEF, 0xBB, 0xBF, rest @ ..] => Ok(rest.to_vec()),
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes),
        _ => Ok(data),
    }
}

/// Pull-based markup reader over one part.
pub struct MarkupReader {
    source: String,
    reader: Reader<Cursor<Vec<u8>>>,
    buf: Vec<u8>,
    cursor: LineCursor,
    pending_end: Option<PositionedEvent>,
    finished: bool,
}

impl MarkupReader {
    /// Creates a reader for the part `source` holding `data`.
    pub fn new(source: impl Into<String>, data: Vec<u8>) -> Result<Self> {
        let source = source.into();
        let data = normalize_encoding(data).map_err(|msg| XpsError::Xml {
            location: Location::new(source.clone(), 1, 1),
            msg,
        })?;
        let mut reader = Reader::from_reader(Cursor::new(data));
        reader.config_mut().trim_text(true);
        Ok(Self {
            source,
            reader,
            buf: Vec::new(),
            cursor: LineCursor::new(),
            pending_end: None,
            finished: false,
        })
    }

    /// Creates a reader over markup text.
    pub fn from_text(source: impl Into<String>, text: &str) -> Self {
        let mut reader = Reader::from_reader(Cursor::new(text.as_bytes().to_vec()));
        reader.config_mut().trim_text(true);
        Self {
            source: source.into(),
            reader,
            buf: Vec::new(),
            cursor: LineCursor::new(),
            pending_end: None,
            finished: false,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Location of the first non-whitespace byte at or after `offset`,
    /// which is where the next event starts once trimmed text is skipped.
    fn location_at(&mut self, offset: impl TryInto<usize>) -> Location {
        let offset = offset.try_into().unwrap_or(usize::MAX);
        let data = self.reader.get_ref().get_ref();
        let start = data
            .get(offset..)
            .and_then(|rest| rest.iter().position(|b| !b.is_ascii_whitespace()))
            .map_or(offset, |skip| offset + skip);
        self.cursor.advance_to(data, start);
        Location::new(self.source.clone(), self.cursor.line, self.cursor.column)
    }

    fn syntax_error(&self, location: Location, err: impl std::fmt::Display) -> XpsError {
        XpsError::Xml {
            location,
            msg: err.to_string(),
        }
    }

    fn decode<'b>(&self, bytes: &'b [u8], location: &Location) -> Result<Cow<'b, str>> {
        self.reader
            .decoder()
            .decode(bytes)
            .map_err(|err| self.syntax_error(location.clone(), err))
    }

    fn start_event(&self, e: &BytesStart<'_>, location: &Location) -> Result<MarkupEvent> {
        let name = self.decode(e.name().as_ref(), location)?.into_owned();
        let mut attributes = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| self.syntax_error(location.clone(), err))?;
            let key = self.decode(attr.key.as_ref(), location)?.into_owned();
            let raw = self.decode(&attr.value, location)?;
            let normalized = raw.replace(['\t', '\n', '\r'], " ");
            let value = quick_xml::escape::unescape(&normalized)
                .map_err(|err| self.syntax_error(location.clone(), err))?
                .into_owned();
            attributes.push(Attribute::new(key, value));
        }
        Ok(MarkupEvent::Start { name, attributes })
    }

    fn next_event(&mut self) -> Option<Result<PositionedEvent>> {
        if let Some(pending) = self.pending_end.take() {
            return Some(Ok(pending));
        }
        if self.finished {
            return None;
        }

        loop {
            let start = self.reader.buffer_position();
            self.buf.clear();
            let event = self
                .reader
                .read_event_into(&mut self.buf)
                .map(|event| event.into_owned());
            let location = self.location_at(start);
            let event = match event {
                Ok(event) => event,
                Err(err) => {
                    self.finished = true;
                    return Some(Err(self.syntax_error(location, err)));
                }
            };

            let result = match event {
                Event::Start(e) => self.start_event(&e, &location),
                Event::Empty(e) => self.start_event(&e, &location).map(|start| {
                    if let MarkupEvent::Start { name, .. } = &start {
                        let end = MarkupEvent::End { name: name.clone() };
                        self.pending_end = Some((location.clone(), end));
                    }
                    start
                }),
                Event::End(e) => self
                    .decode(e.name().as_ref(), &location)
                    .map(|name| MarkupEvent::End {
                        name: name.into_owned(),
                    }),
                Event::Text(e) => self
                    .decode(&e, &location)
                    .map(|text| MarkupEvent::Text(text.into_owned())),
                Event::CData(e) => self
                    .decode(&e, &location)
                    .map(|text| MarkupEvent::Text(text.into_owned())),
                Event::GeneralRef(e) => self.decode(&e, &location).and_then(|entity| {
                    quick_xml::escape::unescape(&format!("&{entity};"))
                        .map(|text| MarkupEvent::Text(text.into_owned()))
                        .map_err(|err| self.syntax_error(location.clone(), err))
                }),
                Event::Eof => {
                    self.finished = true;
                    return None;
                }
                _ => continue,
            };

            if result.is_err() {
                self.finished = true;
            }
            return Some(result.map(|event| (location, event)));
        }
    }
}

impl Iterator for MarkupReader {
    type Item = Result<PositionedEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event()
    }
}
