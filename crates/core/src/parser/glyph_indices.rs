//! Glyph run layout.
//!
//! Turns a glyph run's `UnicodeString` and `Indices` into positioned
//! glyphs and text clusters. The `Indices` grammar is a semicolon-separated
//! list of entries:
//!
//! ```text
//! entry   := cluster? INDEX? (',' ADVANCE? (',' UOFFSET? (',' VOFFSET)?)?)?
//! cluster := '(' CODE_UNITS (':' GLYPHS)? ')'
//! ```
//!
//! Advances and offsets are hundredths of the em size. Entries without an
//! index take the glyph mapped to the next character of the text; once the
//! entries run out, every remaining character gets its own glyph.

use crate::error::{Result, XpsError};
use crate::font::ScaledFont;
use crate::utils::Point;

/// A glyph placed in user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionedGlyph {
    pub index: u32,
    pub x: f64,
    pub y: f64,
}

/// Maps `num_bytes` UTF-8 bytes of the text to `num_glyphs` glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextCluster {
    pub num_bytes: usize,
    pub num_glyphs: usize,
}

impl Default for TextCluster {
    fn default() -> Self {
        Self {
            num_bytes: 0,
            num_glyphs: 1,
        }
    }
}

/// Output of glyph run layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphLayout {
    pub glyphs: Vec<PositionedGlyph>,
    pub clusters: Vec<TextCluster>,
}

/// Where and in which direction a run is laid out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphPlacement {
    pub origin: Point,
    pub rtl: bool,
    pub sideways: bool,
}

impl GlyphPlacement {
    pub fn new(origin: Point) -> Self {
        Self {
            origin,
            rtl: false,
            sideways: false,
        }
    }
}

/// Lays out a glyph run. An empty `indices` string counts as absent.
pub fn layout_glyphs(
    font: &ScaledFont,
    text: &str,
    indices: Option<&str>,
    placement: GlyphPlacement,
) -> Result<GlyphLayout> {
    match indices.filter(|indices| !indices.is_empty()) {
        Some(indices) => IndicesParser::new(indices, font, text, placement).run(),
        None => layout_text(font, text, placement),
    }
}

/// One glyph per character, each advancing by its own width.
fn layout_text(font: &ScaledFont, text: &str, placement: GlyphPlacement) -> Result<GlyphLayout> {
    if text.is_empty() {
        return Err(XpsError::EmptyGlyphRun);
    }

    let (mut x, y) = placement.origin;
    let mut layout = GlyphLayout::default();
    for ch in text.chars() {
        let index = font.glyph_index(ch);
        let extents = font.glyph_extents(index);
        let mut glyph = PositionedGlyph { index, x, y };
        if placement.sideways {
            glyph.x -= extents.x_bearing;
            glyph.y -= extents.y_advance / 2.0;
        }

        let mut advance = if placement.sideways {
            -extents.x_bearing + font.descent()
        } else {
            extents.x_advance
        };
        if placement.rtl {
            glyph.x -= extents.x_advance;
            advance = -advance;
        }
        x += advance;

        layout.glyphs.push(glyph);
        layout.clusters.push(TextCluster {
            num_bytes: ch.len_utf8(),
            num_glyphs: 1,
        });
    }
    Ok(layout)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TokenKind {
    Number(f64),
    Comma,
    Colon,
    Semicolon,
    StartCluster,
    EndCluster,
    Eof,
    Invalid(u8),
}

impl TokenKind {
    fn describe(self) -> String {
        match self {
            TokenKind::Number(n) => format!("number {n}"),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Colon => "':'".to_string(),
            TokenKind::Semicolon => "';'".to_string(),
            TokenKind::StartCluster => "'('".to_string(),
            TokenKind::EndCluster => "')'".to_string(),
            TokenKind::Eof => "end of data".to_string(),
            TokenKind::Invalid(c) => format!("invalid character '{}'", c as char),
        }
    }
}

struct IndicesParser<'a> {
    data: &'a [u8],
    pos: usize,
    kind: TokenKind,
    token_pos: usize,

    font: &'a ScaledFont,
    placement: GlyphPlacement,
    /// Text not yet assigned to a cluster.
    text: &'a str,
    x: f64,
    y: f64,

    cluster: TextCluster,
    /// Glyphs left in the current cluster, counting the next one.
    cluster_pos: usize,
    index: Option<u32>,
    advance: Option<f64>,
    h_offset: f64,
    v_offset: f64,
    /// Whether the current entry mentioned anything.
    pending: bool,

    layout: GlyphLayout,
}

impl<'a> IndicesParser<'a> {
    fn new(indices: &'a str, font: &'a ScaledFont, text: &'a str, placement: GlyphPlacement) -> Self {
        Self {
            data: indices.as_bytes(),
            pos: 0,
            kind: TokenKind::Eof,
            token_pos: 0,
            font,
            placement,
            text,
            x: placement.origin.0,
            y: placement.origin.1,
            cluster: TextCluster::default(),
            cluster_pos: 1,
            index: None,
            advance: None,
            h_offset: 0.0,
            v_offset: 0.0,
            pending: false,
            layout: GlyphLayout::default(),
        }
    }

    fn error(&self, pos: usize, msg: impl Into<String>) -> XpsError {
        XpsError::GlyphParse {
            pos,
            msg: msg.into(),
        }
    }

    fn unexpected(&self, expected: &str) -> XpsError {
        self.error(
            self.token_pos,
            format!("expected {expected} but {} found", self.kind.describe()),
        )
    }

    fn advance(&mut self) -> Result<()> {
        self.token_pos = self.pos;
        let Some(&c) = self.data.get(self.pos) else {
            self.kind = TokenKind::Eof;
            return Ok(());
        };

        self.kind = match c {
            b'0'..=b'9' | b'+' | b'-' => self.scan_number()?,
            b'(' => TokenKind::StartCluster,
            b')' => TokenKind::EndCluster,
            b',' => TokenKind::Comma,
            b':' => TokenKind::Colon,
            b';' => TokenKind::Semicolon,
            c => TokenKind::Invalid(c),
        };
        if !matches!(self.kind, TokenKind::Number(_)) {
            self.pos += 1;
        }
        Ok(())
    }

    fn scan_number(&mut self) -> Result<TokenKind> {
        let start = self.pos;
        let digits = |parser: &mut Self| {
            while parser.data.get(parser.pos).is_some_and(u8::is_ascii_digit) {
                parser.pos += 1;
            }
        };

        self.pos += 1;
        digits(self);
        if self.data.get(self.pos) == Some(&b'.') {
            self.pos += 1;
            digits(self);
        }
        if matches!(self.data.get(self.pos), Some(b'e' | b'E')) {
            self.pos += 1;
            if matches!(self.data.get(self.pos), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            digits(self);
        }

        let text = std::str::from_utf8(&self.data[start..self.pos]).unwrap_or_default();
        text.parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(TokenKind::Number)
            .ok_or_else(|| self.error(start, format!("invalid number '{text}'")))
    }

    fn expect_number(&mut self) -> Result<f64> {
        match self.kind {
            TokenKind::Number(n) => Ok(n),
            _ => Err(self.unexpected("number")),
        }
    }

    fn run(mut self) -> Result<GlyphLayout> {
        self.advance()?;
        loop {
            match self.kind {
                TokenKind::StartCluster => self.cluster_spec()?,
                TokenKind::Number(n) => {
                    if !(0.0..=f64::from(u32::MAX)).contains(&n) {
                        return Err(self.error(self.token_pos, format!("invalid glyph index {n}")));
                    }
                    self.index = Some(n as u32);
                    self.pending = true;
                }
                TokenKind::Comma => {
                    self.pending = true;
                    if !self.metrics()? {
                        continue;
                    }
                }
                TokenKind::Semicolon => self.emit(),
                TokenKind::Eof => {
                    if self.pending || !self.text.is_empty() || self.layout.glyphs.is_empty() {
                        self.emit();
                    }
                    if self.text.is_empty() {
                        return Ok(self.layout);
                    }
                }
                TokenKind::Invalid(_) => {
                    return Err(self.error(self.token_pos, self.kind.describe()));
                }
                TokenKind::Colon | TokenKind::EndCluster => {
                    return Err(self.error(
                        self.token_pos,
                        format!("unexpected {}", self.kind.describe()),
                    ));
                }
            }
            self.advance()?;
        }
    }

    /// Parses `(count[:glyphs])`. Leaves the closing parenthesis current.
    fn cluster_spec(&mut self) -> Result<()> {
        self.pending = true;
        self.advance()?;
        let code_units = self.expect_number()?.max(0.0) as usize;

        let mut remaining = code_units;
        let mut num_bytes = 0;
        for ch in self.text.chars() {
            if remaining == 0 {
                break;
            }
            remaining = remaining.saturating_sub(ch.len_utf16());
            num_bytes += ch.len_utf8();
        }
        self.cluster.num_bytes = num_bytes;

        self.advance()?;
        if self.kind == TokenKind::EndCluster {
            return Ok(());
        }
        if self.kind != TokenKind::Colon {
            return Err(self.unexpected("':'"));
        }
        self.advance()?;
        let glyphs = self.expect_number()?.max(0.0) as usize;
        self.cluster.num_glyphs = glyphs;
        self.cluster_pos = glyphs;

        self.advance()?;
        if self.kind != TokenKind::EndCluster {
            return Err(self.unexpected("')'"));
        }
        Ok(())
    }

    /// Parses the comma-separated advance and offsets after an index.
    /// Returns `false` when it stopped on a token that still needs to be
    /// dispatched.
    fn metrics(&mut self) -> Result<bool> {
        self.advance()?;
        if let TokenKind::Number(n) = self.kind {
            self.advance = Some(n / 100.0);
            self.advance()?;
        }
        if self.kind != TokenKind::Comma {
            return Ok(false);
        }

        self.advance()?;
        if let TokenKind::Number(n) = self.kind {
            self.h_offset = n / 100.0;
            self.advance()?;
        }
        if self.kind != TokenKind::Comma {
            return Ok(false);
        }

        self.advance()?;
        self.v_offset = self.expect_number()? / 100.0;
        Ok(true)
    }

    fn emit(&mut self) {
        let font = self.font;
        let GlyphPlacement { rtl, sideways, .. } = self.placement;
        let next_char = self.text.chars().next();

        let index = self
            .index
            .take()
            .unwrap_or_else(|| next_char.map_or(0, |ch| font.glyph_index(ch)));

        let (mut h_offset, mut v_offset) = (self.h_offset, self.v_offset);
        if rtl {
            h_offset = -h_offset;
        }
        if sideways {
            (h_offset, v_offset) = (-v_offset, h_offset);
        }
        let (h_offset, v_offset) = font.transform_distance(h_offset, v_offset);
        let mut glyph = PositionedGlyph {
            index,
            x: self.x + h_offset,
            y: self.y - v_offset,
        };

        let extents = font.glyph_extents(index);
        if sideways {
            glyph.x -= extents.x_bearing;
            glyph.y -= extents.y_advance / 2.0;
        }

        let (mut advance_width, advance_height) = match self.advance.take() {
            None if sideways => (-extents.x_bearing + font.descent(), 0.0),
            None => (extents.x_advance, 0.0),
            Some(advance) if sideways => font.transform_distance(0.0, advance),
            Some(advance) => font.transform_distance(advance, 0.0),
        };
        if rtl {
            glyph.x -= extents.x_advance;
            advance_width = -advance_width;
        }

        if self.cluster.num_bytes == 0 {
            if let Some(ch) = next_char {
                self.cluster.num_bytes = ch.len_utf8();
            }
        }
        if self.cluster_pos <= 1 {
            self.text = self.text.get(self.cluster.num_bytes..).unwrap_or_default();
            self.layout.clusters.push(self.cluster);
            self.cluster = TextCluster::default();
            self.cluster_pos = 1;
        } else {
            self.cluster_pos -= 1;
        }

        self.x += advance_width;
        self.y += advance_height;
        self.h_offset = 0.0;
        self.v_offset = 0.0;
        self.pending = false;
        self.layout.glyphs.push(glyph);
    }
}
