//! Raw-value operations: `is_valid`, `compact`, `indent`, `canonicalize`.
//!
//! These operate on a complete, in-memory JSON value buffer rather than a
//! streaming [`crate::io::Source`]/[`crate::io::Sink`] — the whole value
//! already sits in one byte slice, so a plain recursive-descent parse over
//! `&[u8]` is the right shape — a hand-written `Parser`/`Value`/emit
//! pipeline, the same pattern a standalone canonicalizer would use, built
//! on this crate's own scanners so grammar correctness isn't duplicated a
//! second time.

use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::vec::Vec;

use crate::error::{Error, SyntaxError, SyntaxErrorKind};
use crate::kind::Kind;
use crate::scanner::string::Utf8Mode;
use crate::scanner::{
    Scan, append_float, append_quote, consume_false, consume_null, consume_number_resumable,
    consume_simple_string, consume_string_resumable, consume_true, consume_whitespace,
};
use crate::scanner::format::QuoteMode;
use crate::scanner::number::{NumberState, parse_float};

/// A parsed value tree whose scalars borrow their original byte spans —
/// `Number` and `Str` point at the still-escaped source text, not a decoded
/// value, so `compact`/`indent` can copy them through verbatim.
enum Node<'a> {
    Null,
    True,
    False,
    Number(&'a [u8]),
    /// Includes the surrounding quotes, in the original (possibly
    /// non-minimal) escaping.
    Str(&'a [u8]),
    Array(Vec<Node<'a>>),
    /// Name spans also include their quotes; order is source order, not yet
    /// sorted.
    Object(Vec<(&'a [u8], Node<'a>)>),
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    fn err(&self, kind: SyntaxErrorKind) -> SyntaxError {
        SyntaxError::new(kind, self.pos as u64)
    }

    fn skip_ws(&mut self) {
        self.pos += consume_whitespace(&self.input[self.pos..]);
    }

    fn consume_literal(&mut self, scan: impl Fn(&[u8]) -> crate::scanner::ScanResult<()>) -> Result<(), SyntaxError> {
        match scan(&self.input[self.pos..])? {
            Scan::Complete { consumed, .. } => {
                self.pos += consumed;
                Ok(())
            }
            Scan::Truncated { .. } => Err(self.err(SyntaxErrorKind::UnexpectedEof)),
        }
    }

    fn consume_number(&mut self) -> Result<&'a [u8], SyntaxError> {
        let start = self.pos;
        match consume_number_resumable(&self.input[start..], NumberState::BeforeIntegerDigits, 0)? {
            Scan::Complete { consumed, .. } => {
                self.pos = start + consumed;
                Ok(&self.input[start..self.pos])
            }
            // The whole value is already in memory: a truncation here means
            // the window (the rest of the buffer) ran out while the number
            // was in one of its `within_*` states, which is exactly the
            // condition under which it is nonetheless a complete number (see
            // `crate::decoder`'s identical end-of-input reasoning).
            Scan::Truncated { consumed } if consumed > 0 && self.input[start + consumed - 1].is_ascii_digit() => {
                self.pos = start + consumed;
                Ok(&self.input[start..self.pos])
            }
            Scan::Truncated { .. } => Err(self.err(SyntaxErrorKind::UnexpectedEof)),
        }
    }

    fn consume_string_span(&mut self) -> Result<&'a [u8], SyntaxError> {
        let start = self.pos;
        if let Some(len) = consume_simple_string(&self.input[start..]) {
            self.pos = start + len;
            return Ok(&self.input[start..self.pos]);
        }
        let mut scratch = String::new();
        match consume_string_resumable(&self.input[start..], 0, &mut scratch, Utf8Mode::Validate)? {
            Scan::Complete { consumed, .. } => {
                self.pos = start + consumed;
                Ok(&self.input[start..self.pos])
            }
            Scan::Truncated { .. } => Err(self.err(SyntaxErrorKind::UnexpectedEof)),
        }
    }

    fn parse_value(&mut self) -> Result<Node<'a>, SyntaxError> {
        self.skip_ws();
        let Some(&b) = self.input.get(self.pos) else {
            return Err(self.err(SyntaxErrorKind::UnexpectedEof));
        };
        match Kind::from_byte(b) {
            Kind::Null => {
                self.consume_literal(consume_null)?;
                Ok(Node::Null)
            }
            Kind::True => {
                self.consume_literal(consume_true)?;
                Ok(Node::True)
            }
            Kind::False => {
                self.consume_literal(consume_false)?;
                Ok(Node::False)
            }
            Kind::Number => Ok(Node::Number(self.consume_number()?)),
            Kind::String => Ok(Node::Str(self.consume_string_span()?)),
            Kind::ObjectStart => self.parse_object(),
            Kind::ArrayStart => self.parse_array(),
            _ => Err(self.err(SyntaxErrorKind::InvalidCharacter)),
        }
    }

    fn parse_object(&mut self) -> Result<Node<'a>, SyntaxError> {
        self.pos += 1;
        self.skip_ws();
        let mut members = Vec::new();
        if self.input.get(self.pos) == Some(&b'}') {
            self.pos += 1;
            return Ok(Node::Object(members));
        }
        loop {
            self.skip_ws();
            if self.input.get(self.pos) != Some(&b'"') {
                return Err(self.err(SyntaxErrorKind::MissingName));
            }
            let name = self.consume_string_span()?;
            self.skip_ws();
            if self.input.get(self.pos) != Some(&b':') {
                return Err(self.err(SyntaxErrorKind::MissingColon));
            }
            self.pos += 1;
            let value = self.parse_value()?;
            members.push((name, value));
            self.skip_ws();
            match self.input.get(self.pos) {
                Some(&b',') => self.pos += 1,
                Some(&b'}') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.err(SyntaxErrorKind::MissingComma)),
            }
        }
        Ok(Node::Object(members))
    }

    fn parse_array(&mut self) -> Result<Node<'a>, SyntaxError> {
        self.pos += 1;
        self.skip_ws();
        let mut items = Vec::new();
        if self.input.get(self.pos) == Some(&b']') {
            self.pos += 1;
            return Ok(Node::Array(items));
        }
        loop {
            let value = self.parse_value()?;
            items.push(value);
            self.skip_ws();
            match self.input.get(self.pos) {
                Some(&b',') => self.pos += 1,
                Some(&b']') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.err(SyntaxErrorKind::MissingComma)),
            }
        }
        Ok(Node::Array(items))
    }
}

fn parse_complete(input: &[u8]) -> Result<Node<'_>, SyntaxError> {
    let mut p = Parser::new(input);
    let value = p.parse_value()?;
    p.skip_ws();
    if p.pos != input.len() {
        return Err(p.err(SyntaxErrorKind::InvalidCharacterAfterTopLevelValue));
    }
    Ok(value)
}

/// `true` iff `input` is a syntactically complete JSON value with no
/// trailing garbage (beyond insignificant whitespace).
#[must_use]
pub fn is_valid(input: &[u8]) -> bool {
    parse_complete(input).is_ok()
}

/// The leading [`Kind`] of `input`'s value, ignoring leading whitespace.
/// `None` if `input` doesn't start with a recognizable value byte.
#[must_use]
pub fn kind(input: &[u8]) -> Option<Kind> {
    let skip = consume_whitespace(input);
    let k = Kind::from_byte(*input.get(skip)?);
    (k != Kind::Invalid).then_some(k)
}

fn write_compact(node: &Node, out: &mut Vec<u8>) {
    match node {
        Node::Null => out.extend_from_slice(b"null"),
        Node::True => out.extend_from_slice(b"true"),
        Node::False => out.extend_from_slice(b"false"),
        Node::Number(s) | Node::Str(s) => out.extend_from_slice(s),
        Node::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_compact(item, out);
            }
            out.push(b']');
        }
        Node::Object(members) => {
            out.push(b'{');
            for (i, (name, value)) in members.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                out.extend_from_slice(name);
                out.push(b':');
                write_compact(value, out);
            }
            out.push(b'}');
        }
    }
}

/// Copies `input` into the output, dropping whitespace outside of string
/// literals; string and number text is preserved byte-for-byte.
pub fn compact(input: &[u8]) -> Result<Vec<u8>, Error> {
    let node = parse_complete(input)?;
    let mut out = Vec::with_capacity(input.len());
    write_compact(&node, &mut out);
    Ok(out)
}

fn push_newline_indent(out: &mut Vec<u8>, prefix: &str, unit: &str, depth: usize) {
    out.push(b'\n');
    out.extend_from_slice(prefix.as_bytes());
    for _ in 0..depth {
        out.extend_from_slice(unit.as_bytes());
    }
}

fn write_indented(node: &Node, out: &mut Vec<u8>, prefix: &str, unit: &str, depth: usize) {
    match node {
        Node::Null => out.extend_from_slice(b"null"),
        Node::True => out.extend_from_slice(b"true"),
        Node::False => out.extend_from_slice(b"false"),
        Node::Number(s) | Node::Str(s) => out.extend_from_slice(s),
        Node::Array(items) => {
            out.push(b'[');
            if !items.is_empty() {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(b',');
                    }
                    push_newline_indent(out, prefix, unit, depth + 1);
                    write_indented(item, out, prefix, unit, depth + 1);
                }
                push_newline_indent(out, prefix, unit, depth);
            }
            out.push(b']');
        }
        Node::Object(members) => {
            out.push(b'{');
            if !members.is_empty() {
                for (i, (name, value)) in members.iter().enumerate() {
                    if i > 0 {
                        out.push(b',');
                    }
                    push_newline_indent(out, prefix, unit, depth + 1);
                    out.extend_from_slice(name);
                    out.extend_from_slice(b": ");
                    write_indented(value, out, prefix, unit, depth + 1);
                }
                push_newline_indent(out, prefix, unit, depth);
            }
            out.push(b'}');
        }
    }
}

/// Compacts `input` then reinserts `"\n" + prefix + depth * unit` before each
/// element; empty containers stay on one line.
pub fn indent(input: &[u8], prefix: &str, unit: &str) -> Result<Vec<u8>, Error> {
    let node = parse_complete(input)?;
    let mut out = Vec::with_capacity(input.len() * 2);
    write_indented(&node, &mut out, prefix, unit, 0);
    Ok(out)
}

fn unescape(raw_quoted: &[u8]) -> Result<String, SyntaxError> {
    let mut out = String::new();
    consume_string_resumable(raw_quoted, 0, &mut out, Utf8Mode::Validate)?;
    Ok(out)
}

fn offset_of(input: &[u8], span: &[u8]) -> u64 {
    (span.as_ptr() as usize - input.as_ptr() as usize) as u64
}

fn write_canonical(node: &Node, input: &[u8], out: &mut Vec<u8>) -> Result<(), Error> {
    match node {
        Node::Null => out.extend_from_slice(b"null"),
        Node::True => out.extend_from_slice(b"true"),
        Node::False => out.extend_from_slice(b"false"),
        Node::Number(raw) => {
            let text = core::str::from_utf8(raw).expect("number scanner only emits ASCII");
            let v = parse_float(text);
            let mut s = String::new();
            if v == 0.0 {
                // RFC 8785 normalizes `-0` to `0`; every other formatter in
                // this crate preserves the sign (see `append_float`), so the
                // normalization lives only here.
                s.push('0');
            } else {
                append_float(&mut s, v);
            }
            out.extend_from_slice(s.as_bytes());
        }
        Node::Str(raw) => {
            let decoded = unescape(raw)?;
            append_quote(out, &decoded, QuoteMode::Canonical);
        }
        Node::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(item, input, out)?;
            }
            out.push(b']');
        }
        Node::Object(members) => {
            let mut decoded: Vec<(String, Vec<u16>, &Node)> = Vec::with_capacity(members.len());
            let mut seen: BTreeSet<String> = BTreeSet::new();
            for (name_raw, value) in members {
                let name = unescape(name_raw)?;
                if !seen.insert(name.clone()) {
                    let offset = offset_of(input, name_raw);
                    return Err(SyntaxError::new(SyntaxErrorKind::DuplicateName, offset).into());
                }
                let units: Vec<u16> = name.encode_utf16().collect();
                decoded.push((name, units, value));
            }
            let mut order: Vec<usize> = (0..decoded.len()).collect();
            order.sort_by(|&a, &b| decoded[a].1.cmp(&decoded[b].1));
            out.push(b'{');
            for (i, &idx) in order.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                append_quote(out, &decoded[idx].0, QuoteMode::Canonical);
                out.push(b':');
                write_canonical(decoded[idx].2, input, out)?;
            }
            out.push(b'}');
        }
    }
    Ok(())
}

/// Compacts `input`, reformats numbers by round-tripping through `f64` and
/// strings to minimal escapes, and reorders object members by ascending
/// UTF-16 code-unit order of their unescaped names, per RFC 8785. A
/// duplicate name is an error carrying the byte offset of the second
/// occurrence.
pub fn canonicalize(input: &[u8]) -> Result<Vec<u8>, Error> {
    let node = parse_complete(input)?;
    let mut out = Vec::with_capacity(input.len());
    write_canonical(&node, input, &mut out)?;
    Ok(out)
}

/// An owned, already-validated JSON value buffer. Acts as both a marshal
/// source (pass it to [`crate::bind`] as a value to embed verbatim) and an
/// unmarshal sink (receive an object member or array element as raw,
/// unparsed text instead of eagerly decoding it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawValue(Vec<u8>);

impl RawValue {
    /// Validates `bytes` as a complete JSON value and wraps it.
    pub fn new(bytes: Vec<u8>) -> Result<Self, Error> {
        parse_complete(&bytes)?;
        Ok(Self(bytes))
    }

    /// Borrows the validated raw JSON bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Unwraps into the owned raw JSON bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// The leading kind of the wrapped value.
    #[must_use]
    pub fn kind(&self) -> Kind {
        kind(&self.0).expect("constructor validated this is a complete value")
    }

    /// See [`compact`].
    pub fn compact(&self) -> Result<Vec<u8>, Error> {
        compact(&self.0)
    }

    /// See [`indent`].
    pub fn indent(&self, prefix: &str, unit: &str) -> Result<Vec<u8>, Error> {
        indent(&self.0, prefix, unit)
    }

    /// See [`canonicalize`].
    pub fn canonicalize(&self) -> Result<Vec<u8>, Error> {
        canonicalize(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_value_reports_true() {
        assert!(is_valid(br#"{"a": [1, 2, null]}"#));
    }

    #[test]
    fn trailing_garbage_is_invalid() {
        assert!(!is_valid(b"{} garbage"));
    }

    #[test]
    fn compact_drops_whitespace_outside_strings() {
        let out = compact(b" { \"a\" : [1, 2] , \"b\" : \" x  y \" }\n").unwrap();
        assert_eq!(out, br#"{"a":[1,2],"b":" x  y "}"#.to_vec());
    }

    #[test]
    fn compact_preserves_original_number_text() {
        let out = compact(b"[1.50, 2e10]").unwrap();
        assert_eq!(out, b"[1.50,2e10]".to_vec());
    }

    #[test]
    fn indent_expands_nested_object() {
        let out = indent(br#"{"a":1,"b":[1,2]}"#, "", "  ").unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\n  \"a\": 1,\n  \"b\": [\n    1,\n    2\n  ]\n}"
        );
    }

    #[test]
    fn indent_keeps_empty_container_on_one_line() {
        let out = indent(b"{}", "", "  ").unwrap();
        assert_eq!(out, b"{}".to_vec());
    }

    #[test]
    fn canonicalize_reorders_by_utf16_order() {
        let out = canonicalize("{\"\u{20ac}\":\"E\",\"\\r\":\"C\",\"1\":\"O\"}".as_bytes()).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"\\r\":\"C\",\"1\":\"O\",\"\u{20ac}\":\"E\"}"
        );
    }

    #[test]
    fn canonicalize_reformats_number_and_string() {
        let out = canonicalize(br#"{"a":1.0,"b":"x\u0041y"}"#).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), r#"{"a":1,"b":"xAy"}"#);
    }

    #[test]
    fn canonicalize_rejects_duplicate_name() {
        let err = canonicalize(br#"{"a":1,"a":2}"#).unwrap_err();
        assert!(err.is(&Error::Syntax(SyntaxError::new(SyntaxErrorKind::DuplicateName, 0))));
    }

    #[test]
    fn canonicalize_is_idempotent() {
        let once = canonicalize(br#" { "b" : 2 , "a" : 1.50 } "#).unwrap();
        let twice = canonicalize(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn raw_value_round_trips_through_compact() {
        let rv = RawValue::new(b"{ \"a\" : 1 }".to_vec()).unwrap();
        assert_eq!(rv.compact().unwrap(), b"{\"a\":1}".to_vec());
        assert_eq!(rv.kind(), Kind::ObjectStart);
    }
}
