//! Abbreviated path geometry syntax.
//!
//! Grammar (uppercase commands take absolute coordinates, lowercase ones
//! are relative to the current point):
//!
//! ```text
//! data    := (command operand*)*
//! point   := NUMBER ',' NUMBER
//! M m     := point+          move, extra points draw lines
//! L l     := point+
//! H h V v := NUMBER+
//! C c     := (point point point)+
//! Q q     := (point point)+  emitted as an equivalent cubic
//! S s     := (point point)+  first control point reflected
//! A a     := (point NUMBER NUMBER NUMBER point)+  parsed, not drawn
//! Z z     :=
//! F       := NUMBER          0 even-odd, otherwise nonzero
//! ```
//!
//! Only space and tab separate tokens. Numbers take an optional sign,
//! digits and at most one decimal point; exponents are not part of the
//! syntax.

use crate::error::{Result, XpsError};
use crate::interp::device::PathSink;
use crate::model::FillRule;
use crate::utils::Point;

#[derive(Debug, Clone, Copy, PartialEq)]
enum TokenKind {
    Number(f64),
    Comma,
    Command(u8),
    Eof,
    Invalid(u8),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Token {
    kind: TokenKind,
    pos: usize,
}

impl TokenKind {
    fn describe(self) -> String {
        match self {
            TokenKind::Number(n) => format!("number {n}"),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Command(c) => format!("command '{}'", c as char),
            TokenKind::Eof => "end of data".to_string(),
            TokenKind::Invalid(c) => format!("invalid character '{}'", c as char),
        }
    }
}

/// Tokenizer and evaluator state for one path data string.
struct PathDataParser<'a> {
    data: &'a [u8],
    pos: usize,
    token: Token,
    current: Point,
    subpath_start: Point,
    /// Offset from the last curve's second control point to its end point.
    control: Point,
}

impl<'a> PathDataParser<'a> {
    fn new(data: &'a str) -> Self {
        Self {
            data: data.as_bytes(),
            pos: 0,
            token: Token {
                kind: TokenKind::Eof,
                pos: 0,
            },
            current: (0.0, 0.0),
            subpath_start: (0.0, 0.0),
            control: (0.0, 0.0),
        }
    }

    fn error(&self, pos: usize, msg: impl Into<String>) -> XpsError {
        XpsError::PathParse {
            pos,
            msg: msg.into(),
        }
    }

    fn unexpected(&self, expected: &str) -> XpsError {
        self.error(
            self.token.pos,
            format!(
                "expected {expected} but {} found",
                self.token.kind.describe()
            ),
        )
    }

    fn advance(&mut self) -> Result<()> {
        while matches!(self.data.get(self.pos), Some(b' ' | b'\t')) {
            self.pos += 1;
        }

        let start = self.pos;
        let Some(&c) = self.data.get(start) else {
            self.token = Token {
                kind: TokenKind::Eof,
                pos: start,
            };
            return Ok(());
        };

        let kind = match c {
            b'0'..=b'9' | b'+' | b'-' | b'.' => self.scan_number()?,
            b',' => {
                self.pos += 1;
                TokenKind::Comma
            }
            c if c.is_ascii_alphabetic() => {
                self.pos += 1;
                TokenKind::Command(c)
            }
            c => {
                self.pos += 1;
                TokenKind::Invalid(c)
            }
        };
        self.token = Token { kind, pos: start };
        Ok(())
    }

    fn scan_number(&mut self) -> Result<TokenKind> {
        let start = self.pos;
        if matches!(self.data.get(self.pos), Some(b'+' | b'-')) {
            self.pos += 1;
        }
        let skip_digits = |parser: &mut Self| {
            while parser.data.get(parser.pos).is_some_and(u8::is_ascii_digit) {
                parser.pos += 1;
            }
        };
        skip_digits(self);
        if self.data.get(self.pos) == Some(&b'.') {
            self.pos += 1;
            skip_digits(self);
        }

        let text = std::str::from_utf8(&self.data[start..self.pos]).unwrap_or_default();
        text.parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| self.error(start, format!("invalid number '{text}'")))
    }

    fn at_number(&self) -> bool {
        matches!(self.token.kind, TokenKind::Number(_))
    }

    fn number(&mut self) -> Result<f64> {
        let TokenKind::Number(value) = self.token.kind else {
            return Err(self.unexpected("number"));
        };
        self.advance()?;
        Ok(value)
    }

    fn point(&mut self) -> Result<Point> {
        let x = self.number()?;
        if self.token.kind != TokenKind::Comma {
            return Err(self.unexpected("','"));
        }
        self.advance()?;
        let y = self.number()?;
        Ok((x, y))
    }

    fn point_from(&mut self, relative: bool) -> Result<Point> {
        let (x, y) = self.point()?;
        if relative {
            Ok((self.current.0 + x, self.current.1 + y))
        } else {
            Ok((x, y))
        }
    }

    fn run<S: PathSink + ?Sized>(mut self, sink: &mut S) -> Result<()> {
        self.advance()?;
        loop {
            match self.token.kind {
                TokenKind::Eof => return Ok(()),
                TokenKind::Command(command) => {
                    let command_pos = self.token.pos;
                    self.advance()?;
                    self.command(command, command_pos, sink)?;
                }
                _ => return Err(self.unexpected("command")),
            }
        }
    }

    fn command<S: PathSink + ?Sized>(&mut self, command: u8, pos: usize, sink: &mut S) -> Result<()> {
        let relative = command.is_ascii_lowercase();
        match command.to_ascii_uppercase() {
            b'M' => {
                let p = self.point_from(relative)?;
                sink.move_to(p.0, p.1);
                self.current = p;
                self.subpath_start = p;
                self.control = (0.0, 0.0);
                while self.at_number() {
                    let p = self.point_from(relative)?;
                    sink.line_to(p.0, p.1);
                    self.current = p;
                }
            }
            b'L' => loop {
                let p = self.point_from(relative)?;
                sink.line_to(p.0, p.1);
                self.current = p;
                self.control = (0.0, 0.0);
                if !self.at_number() {
                    break;
                }
            },
            b'H' => loop {
                let x = self.number()?;
                let x = if relative { self.current.0 + x } else { x };
                sink.line_to(x, self.current.1);
                self.current.0 = x;
                self.control = (0.0, 0.0);
                if !self.at_number() {
                    break;
                }
            },
            b'V' => loop {
                let y = self.number()?;
                let y = if relative { self.current.1 + y } else { y };
                sink.line_to(self.current.0, y);
                self.current.1 = y;
                self.control = (0.0, 0.0);
                if !self.at_number() {
                    break;
                }
            },
            b'C' => loop {
                let p1 = self.point_from(relative)?;
                let p2 = self.point_from(relative)?;
                let p3 = self.point_from(relative)?;
                sink.curve_to(p1.0, p1.1, p2.0, p2.1, p3.0, p3.1);
                self.control = (p3.0 - p2.0, p3.1 - p2.1);
                self.current = p3;
                if !self.at_number() {
                    break;
                }
            },
            b'Q' => loop {
                let q = self.point_from(relative)?;
                let end = self.point_from(relative)?;
                let cur = self.current;
                let cp1 = (
                    2.0 / 3.0 * q.0 + 1.0 / 3.0 * cur.0,
                    2.0 / 3.0 * q.1 + 1.0 / 3.0 * cur.1,
                );
                let cp2 = (
                    2.0 / 3.0 * q.0 + 1.0 / 3.0 * end.0,
                    2.0 / 3.0 * q.1 + 1.0 / 3.0 * end.1,
                );
                sink.curve_to(cp1.0, cp1.1, cp2.0, cp2.1, end.0, end.1);
                self.control = (0.0, 0.0);
                self.current = end;
                if !self.at_number() {
                    break;
                }
            },
            b'S' => loop {
                let p1 = (
                    self.current.0 + self.control.0,
                    self.current.1 + self.control.1,
                );
                let p2 = self.point_from(relative)?;
                let p3 = self.point_from(relative)?;
                sink.curve_to(p1.0, p1.1, p2.0, p2.1, p3.0, p3.1);
                self.control = (p3.0 - p2.0, p3.1 - p2.1);
                self.current = p3;
                if !self.at_number() {
                    break;
                }
            },
            b'A' => loop {
                let size = self.point()?;
                let rotation = self.number()?;
                let large_arc = self.number()?;
                let sweep = self.number()?;
                let end = self.point_from(relative)?;
                tracing::debug!(
                    ?size,
                    rotation,
                    large_arc,
                    sweep,
                    ?end,
                    "arc segments are not rendered"
                );
                self.control = (0.0, 0.0);
                if !self.at_number() {
                    break;
                }
            },
            b'Z' => {
                sink.close_path();
                self.current = self.subpath_start;
                self.control = (0.0, 0.0);
            }
            b'F' if !relative => {
                let rule = if self.number()? == 0.0 {
                    FillRule::EvenOdd
                } else {
                    FillRule::NonZero
                };
                sink.set_fill_rule(rule);
                self.control = (0.0, 0.0);
            }
            _ => {
                return Err(self.error(pos, format!("unknown command '{}'", command as char)));
            }
        }
        Ok(())
    }
}

/// Parses abbreviated path data and emits the primitive path operations to
/// `sink`.
pub fn parse_path_data<S: PathSink + ?Sized>(data: &str, sink: &mut S) -> Result<()> {
    tracing::trace!(data, "parsing path data");
    PathDataParser::new(data).run(sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::device::{PathBuilder, PathSegment};

    #[test]
    fn test_implicit_lines_after_move() {
        let mut path = PathBuilder::new();
        parse_path_data("M 0,0 5,5 10,0", &mut path).unwrap();
        assert_eq!(
            path.segments,
            vec![
                PathSegment::MoveTo(0.0, 0.0),
                PathSegment::LineTo(5.0, 5.0),
                PathSegment::LineTo(10.0, 0.0),
            ]
        );
    }

    #[test]
    fn test_leading_dot_numbers() {
        let mut path = PathBuilder::new();
        parse_path_data("M.5,-.25", &mut path).unwrap();
        assert_eq!(path.segments, vec![PathSegment::MoveTo(0.5, -0.25)]);
    }

    #[test]
    fn test_newline_is_not_whitespace() {
        let mut path = PathBuilder::new();
        let err = parse_path_data("M 0,0\nL 1,1", &mut path).unwrap_err();
        assert!(matches!(err, XpsError::PathParse { pos: 5, .. }));
    }
}
