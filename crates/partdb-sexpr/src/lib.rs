//! A small S-expression parser that keeps the byte span of every node.
//!
//! Spans make it possible to edit a KiCad file without re-serializing it:
//! collect edits in a [`PatchSet`] and stream the patched text to any
//! `std::io::Write`. Everything outside the patched spans is written back
//! byte for byte.

pub mod board;
mod patch;

pub use patch::{Patch, PatchSet, quote_string};

use std::fmt;

/// Byte span in source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-length span at `offset`, used for insertions.
    pub fn at(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// The kind of S-expression value
#[derive(Debug, Clone, PartialEq)]
pub enum SexprKind {
    /// Unquoted atom
    Symbol(String),
    /// Quoted text, unescaped
    String(String),
    Int(i64),
    F64(f64),
    List(Vec<Sexpr>),
}

/// An S-expression value with its source span
#[derive(Debug, Clone)]
pub struct Sexpr {
    pub kind: SexprKind,
    pub span: Span,
}

impl PartialEq for Sexpr {
    fn eq(&self, other: &Self) -> bool {
        // Equality ignores spans.
        self.kind == other.kind
    }
}

impl Sexpr {
    pub fn with_span(kind: SexprKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn as_sym(&self) -> Option<&str> {
        match &self.kind {
            SexprKind::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            SexprKind::String(s) => Some(s),
            _ => None,
        }
    }

    /// Symbol or string content.
    pub fn as_atom(&self) -> Option<&str> {
        match &self.kind {
            SexprKind::Symbol(s) | SexprKind::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.kind {
            SexprKind::Int(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.kind {
            SexprKind::F64(f) => Some(f),
            _ => None,
        }
    }

    /// Int or float, as f64.
    pub fn as_number(&self) -> Option<f64> {
        self.as_float().or_else(|| self.as_int().map(|n| n as f64))
    }

    pub fn as_list(&self) -> Option<&[Sexpr]> {
        match &self.kind {
            SexprKind::List(items) => Some(items),
            _ => None,
        }
    }

    /// Tag of a list node: the leading symbol of `(tag ...)`.
    pub fn tag(&self) -> Option<&str> {
        self.as_list()?.first()?.as_sym()
    }

    /// First direct child list tagged `name`.
    pub fn find_list(&self, name: &str) -> Option<&[Sexpr]> {
        find_child_list(self.as_list()?, name)
    }
}

/// Find a direct child list `(name ...)` within a list of [`Sexpr`] nodes.
pub fn find_child_list<'a>(items: &'a [Sexpr], name: &str) -> Option<&'a [Sexpr]> {
    items
        .iter()
        .filter_map(Sexpr::as_list)
        .find(|list| list.first().and_then(Sexpr::as_sym) == Some(name))
}

/// Iterate direct child nodes `(name ...)`, keeping the node so its span is available.
pub fn child_nodes<'a>(items: &'a [Sexpr], name: &'a str) -> impl Iterator<Item = &'a Sexpr> {
    items.iter().filter(move |node| node.tag() == Some(name))
}

/// Errors that can occur during parsing
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    UnexpectedEof,
    UnexpectedChar { found: char, expected: char, at: usize },
    UnclosedList { opened_at: usize },
    UnterminatedString { opened_at: usize },
    EmptyAtom { at: usize },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnexpectedEof => write!(f, "Unexpected end of input"),
            ParseError::UnexpectedChar {
                found,
                expected,
                at,
            } => write!(f, "Expected '{expected}', found '{found}' at byte {at}"),
            ParseError::UnclosedList { opened_at } => {
                write!(f, "Unclosed list opened at byte {opened_at}")
            }
            ParseError::UnterminatedString { opened_at } => {
                write!(f, "Unterminated string starting at byte {opened_at}")
            }
            ParseError::EmptyAtom { at } => write!(f, "Empty atom at byte {at}"),
        }
    }
}

impl std::error::Error for ParseError {}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_trivia(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.bump();
            } else if ch == ';' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn node(&mut self) -> Result<Sexpr, ParseError> {
        self.skip_trivia();
        match self.peek() {
            None => Err(ParseError::UnexpectedEof),
            Some('(') => self.list(),
            Some('"') => self.string(),
            Some(_) => self.atom(),
        }
    }

    fn list(&mut self) -> Result<Sexpr, ParseError> {
        let start = self.pos;
        self.bump();
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                None => return Err(ParseError::UnclosedList { opened_at: start }),
                Some(')') => {
                    self.bump();
                    break;
                }
                Some(_) => items.push(self.node()?),
            }
        }
        Ok(Sexpr::with_span(
            SexprKind::List(items),
            Span::new(start, self.pos),
        ))
    }

    fn string(&mut self) -> Result<Sexpr, ParseError> {
        let start = self.pos;
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(ParseError::UnterminatedString { opened_at: start }),
                Some('"') => break,
                Some('\\') => match self.bump() {
                    None => return Err(ParseError::UnterminatedString { opened_at: start }),
                    Some('n') => value.push('\n'),
                    Some('r') => value.push('\r'),
                    Some('t') => value.push('\t'),
                    Some(other) => value.push(other),
                },
                Some(ch) => value.push(ch),
            }
        }
        Ok(Sexpr::with_span(
            SexprKind::String(value),
            Span::new(start, self.pos),
        ))
    }

    fn atom(&mut self) -> Result<Sexpr, ParseError> {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() || ch == '(' || ch == ')' || ch == '"' {
                break;
            }
            self.bump();
        }
        if self.pos == start {
            return match self.peek() {
                Some(found) => Err(ParseError::UnexpectedChar {
                    found,
                    expected: '(',
                    at: start,
                }),
                None => Err(ParseError::EmptyAtom { at: start }),
            };
        }

        let text = &self.input[start..self.pos];
        let span = Span::new(start, self.pos);
        let numeric = text.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'));
        let kind = if let Ok(n) = text.parse::<i64>() {
            SexprKind::Int(n)
        } else if let Some(f) = numeric.then(|| text.parse::<f64>().ok()).flatten() {
            SexprKind::F64(f)
        } else {
            SexprKind::Symbol(text.to_string())
        };
        Ok(Sexpr::with_span(kind, span))
    }
}

/// Parse a single S-expression. Trailing whitespace and comments are allowed.
pub fn parse(input: &str) -> Result<Sexpr, ParseError> {
    log::trace!("Parsing S-expression from {} bytes", input.len());
    let mut parser = Parser::new(input);
    let node = parser.node()?;
    parser.skip_trivia();
    if let Some(found) = parser.peek() {
        return Err(ParseError::UnexpectedChar {
            found,
            expected: ')',
            at: parser.pos,
        });
    }
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_atoms() {
        assert_eq!(parse("hello").unwrap().kind, SexprKind::Symbol("hello".into()));
        assert_eq!(parse("42").unwrap().kind, SexprKind::Int(42));
        assert_eq!(parse("-1.5").unwrap().kind, SexprKind::F64(-1.5));
        assert_eq!(
            parse(r#""with \"quotes\"""#).unwrap().kind,
            SexprKind::String("with \"quotes\"".into())
        );
    }

    #[test]
    fn keeps_spans_of_nested_strings() {
        let input = r#"(property "MPN" "GRM123")"#;
        let parsed = parse(input).unwrap();
        let items = parsed.as_list().unwrap();
        assert_eq!(parsed.span, Span::new(0, input.len()));
        assert_eq!(&input[items[2].span.start..items[2].span.end], r#""GRM123""#);
    }

    #[test]
    fn skips_comments() {
        let parsed = parse("; header\n(a ; inline\n b)").unwrap();
        assert_eq!(parsed.as_list().unwrap().len(), 2);
    }

    #[test]
    fn utf8_strings_keep_byte_spans() {
        let input = r#"(x "Lager ÄÖÜ" y)"#;
        let parsed = parse(input).unwrap();
        let items = parsed.as_list().unwrap();
        assert_eq!(items[1].as_str(), Some("Lager ÄÖÜ"));
        assert_eq!(items[2].span.start, input.len() - 2);
    }

    #[test]
    fn reports_unclosed_list() {
        assert_eq!(
            parse("(a (b c)"),
            Err(ParseError::UnclosedList { opened_at: 0 })
        );
        assert!(matches!(
            parse(r#"(a "open)"#),
            Err(ParseError::UnterminatedString { .. })
        ));
        assert!(parse("(a) b").is_err());
    }

    #[test]
    fn find_list_by_tag() {
        let parsed = parse(r#"(footprint "R" (layer "F.Cu") (at 1 2))"#).unwrap();
        let at = parsed.find_list("at").unwrap();
        assert_eq!(at[1].as_number(), Some(1.0));
        assert!(parsed.find_list("uuid").is_none());
    }
}
