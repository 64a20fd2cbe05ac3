//! The streaming, push-style encoder: the write-side mirror of
//! [`crate::decoder::Decoder`], sharing the same [`Grammar`] so the two sides
//! agree on well-formedness without duplicating the state machine.

use alloc::string::String;
use alloc::vec::Vec;

use crate::error::{Error, SyntaxError, SyntaxErrorKind};
use crate::grammar::Grammar;
use crate::io::Sink;
use crate::kind::Kind;
use crate::scanner::format::QuoteMode;
use crate::scanner::{append_float, append_quote};

/// Indentation applied when expanded (multi-line) output is requested.
#[derive(Debug, Clone)]
pub struct Indent {
    /// Written once at the start of every indented line, before the
    /// per-depth `unit` repetitions.
    pub prefix: String,
    /// Repeated once per nesting level on every indented line.
    pub unit: String,
}

/// Output is flushed to the sink after every completed top-level value, or
/// once the internal buffer reaches this many bytes, whichever comes first.
const FLUSH_THRESHOLD: usize = 4096;
/// Initial output buffer capacity, checked out of the shared [`crate::pool`].
const INITIAL_BUF_CAP: usize = 256;

/// A push-style JSON token writer over a [`Sink`], sharing [`Grammar`] with
/// [`crate::decoder::Decoder`] so both sides of a duplex connection agree on
/// well-formedness.
pub struct Encoder<'s> {
    grammar: Grammar,
    sink: &'s mut dyn Sink,
    buf: Vec<u8>,
    high_water: usize,
    scratch: Vec<u8>,
    indent: Option<Indent>,
    quote_mode: QuoteMode,
}

impl<'s> Encoder<'s> {
    /// Wraps `sink`, writing compact output with no HTML escaping by default.
    #[must_use]
    pub fn new(sink: &'s mut dyn Sink) -> Self {
        Self {
            grammar: Grammar::new(),
            sink,
            buf: crate::pool::global().take(INITIAL_BUF_CAP),
            high_water: 0,
            scratch: Vec::new(),
            indent: None,
            quote_mode: QuoteMode::Canonical,
        }
    }

    /// Writes any buffered output to the sink now, regardless of how much
    /// has accumulated. Called automatically after every completed
    /// top-level value and whenever the buffer exceeds [`FLUSH_THRESHOLD`];
    /// exposed so a caller can force a flush mid-document (e.g. before
    /// blocking on more input on the read side of a duplex connection).
    pub fn flush(&mut self) -> Result<(), Error> {
        if self.buf.is_empty() {
            return Ok(());
        }
        self.high_water = self.high_water.max(self.buf.len());
        self.sink.write_all(&self.buf)?;
        self.buf.clear();
        Ok(())
    }

    fn maybe_flush(&mut self) -> Result<(), Error> {
        if self.grammar.is_top_level() || self.buf.len() >= FLUSH_THRESHOLD {
            self.flush()?;
        }
        Ok(())
    }

    /// Enables expanded (multi-line) output with the given indentation, or
    /// reverts to compact output if `None`.
    #[must_use]
    pub fn with_indent(mut self, indent: Option<Indent>) -> Self {
        self.indent = indent;
        self
    }

    /// Switches between canonical and HTML-safe string quoting.
    #[must_use]
    pub fn with_html_escaping(mut self, html: bool) -> Self {
        self.quote_mode = if html { QuoteMode::Html } else { QuoteMode::Canonical };
        self
    }

    /// Current container nesting depth, `0` at the top level.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.grammar.depth()
    }

    fn write_indent(&mut self, next: Kind) -> Result<(), Error> {
        if self.indent.is_none() {
            return Ok(());
        }
        if self.grammar.is_top_level() && self.grammar.depth_length() == 0 {
            return Ok(()); // nothing written yet this document
        }
        if next.is_closer() && self.grammar.depth_length() == 0 {
            return Ok(()); // empty container stays on one line: "{}", "[]"
        }
        if self.grammar.expects_value() {
            return Ok(()); // value sits inline after "name: ", no its own line
        }
        let levels = self.grammar.need_indent(next);
        let style = self.indent.as_ref().expect("checked above");
        self.buf.extend_from_slice(b"\n");
        self.buf.extend_from_slice(style.prefix.as_bytes());
        for _ in 0..levels {
            self.buf.extend_from_slice(style.unit.as_bytes());
        }
        Ok(())
    }

    fn write_delim(&mut self, next: Kind) -> Result<(), Error> {
        let needed = self.grammar.need_delim(next);
        match needed {
            0 => {}
            b':' => {
                self.buf.extend_from_slice(b":");
                if self.indent.is_some() {
                    self.buf.extend_from_slice(b" ");
                }
            }
            b',' => self.buf.extend_from_slice(b","),
            _ => unreachable!("need_delim only returns 0, ':' or ','"),
        }
        Ok(())
    }

    fn before_token(&mut self, kind: Kind) -> Result<(), Error> {
        self.write_delim(kind)?;
        self.write_indent(kind)
    }

    /// Writes a `null` literal.
    pub fn write_null(&mut self) -> Result<(), Error> {
        self.before_token(Kind::Null)?;
        self.buf.extend_from_slice(b"null");
        self.grammar.append_literal()?;
        self.maybe_flush()
    }

    /// Writes a `true`/`false` literal.
    pub fn write_bool(&mut self, v: bool) -> Result<(), Error> {
        let kind = if v { Kind::True } else { Kind::False };
        self.before_token(kind)?;
        self.buf.extend_from_slice(if v { b"true" } else { b"false" });
        self.grammar.append_literal()?;
        self.maybe_flush()
    }

    /// Writes a number from its already-formatted JSON text (e.g. from
    /// [`crate::token::Token::number_text`] when re-emitting a decoded
    /// token verbatim).
    pub fn write_number_raw(&mut self, text: &str) -> Result<(), Error> {
        self.before_token(Kind::Number)?;
        self.buf.extend_from_slice(text.as_bytes());
        self.grammar.append_number()?;
        self.maybe_flush()
    }

    /// Writes `v` as a JSON number; errors on NaN/infinite values, which have
    /// no JSON representation.
    pub fn write_f64(&mut self, v: f64) -> Result<(), Error> {
        if !v.is_finite() {
            return Err(SyntaxError::new(SyntaxErrorKind::InvalidCharacter, 0).into());
        }
        let mut text = String::new();
        append_float(&mut text, v);
        self.write_number_raw(&text)
    }

    /// Writes a string value or, when the grammar currently expects an
    /// object member name, a string name. Name-uniqueness enforcement on
    /// the write side is the caller's responsibility: unlike the decoder,
    /// the encoder never rejects a duplicate name on its own.
    pub fn write_str(&mut self, s: &str) -> Result<(), Error> {
        self.before_token(Kind::String)?;
        self.scratch.clear();
        append_quote(&mut self.scratch, s, self.quote_mode);
        self.buf.extend_from_slice(&self.scratch);
        self.grammar.append_string()?;
        self.maybe_flush()
    }

    /// Opens an object; must be matched by [`Encoder::end_object`].
    pub fn start_object(&mut self) -> Result<(), Error> {
        self.before_token(Kind::ObjectStart)?;
        self.buf.extend_from_slice(b"{");
        self.grammar.push_object()?;
        self.maybe_flush()
    }

    /// Closes the innermost open object.
    pub fn end_object(&mut self) -> Result<(), Error> {
        self.write_indent(Kind::ObjectEnd)?;
        self.grammar.pop_object()?;
        self.buf.extend_from_slice(b"}");
        self.maybe_flush()
    }

    /// Opens an array; must be matched by [`Encoder::end_array`].
    pub fn start_array(&mut self) -> Result<(), Error> {
        self.before_token(Kind::ArrayStart)?;
        self.buf.extend_from_slice(b"[");
        self.grammar.push_array()?;
        self.maybe_flush()
    }

    /// Closes the innermost open array.
    pub fn end_array(&mut self) -> Result<(), Error> {
        self.write_indent(Kind::ArrayEnd)?;
        self.grammar.pop_array()?;
        self.buf.extend_from_slice(b"]");
        self.maybe_flush()
    }

    /// Writes a pre-validated raw JSON value verbatim: the grammar is
    /// consulted just enough to account for one value slot (delimiter,
    /// indentation, name/value parity) but its internal structure is not
    /// re-validated.
    pub fn write_raw_value(&mut self, raw: &[u8]) -> Result<(), Error> {
        let kind = crate::raw::kind(raw)
            .ok_or_else(|| SyntaxError::new(SyntaxErrorKind::InvalidCharacter, 0))?;
        self.before_token(kind)?;
        self.buf.extend_from_slice(raw);
        self.grammar.append_literal()?;
        self.maybe_flush()
    }

    /// Writes a complete [`crate::value::Value`] tree.
    pub fn write_value(&mut self, value: &crate::value::Value) -> Result<(), Error> {
        use crate::value::Value;
        match value {
            Value::Null => self.write_null(),
            Value::Bool(b) => self.write_bool(*b),
            Value::Number(n) => self.write_f64(*n),
            Value::String(s) => self.write_str(s),
            Value::Array(items) => {
                self.start_array()?;
                for item in items {
                    self.write_value(item)?;
                }
                self.end_array()
            }
            Value::Object(map) => {
                self.start_object()?;
                for (k, v) in map {
                    self.write_str(k)?;
                    self.write_value(v)?;
                }
                self.end_object()
            }
        }
    }
}

impl<'s> Drop for Encoder<'s> {
    fn drop(&mut self) {
        let _ = self.flush();
        let buf = core::mem::take(&mut self.buf);
        crate::pool::global().put(buf, self.high_water);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::VecSink;

    fn encode(f: impl FnOnce(&mut Encoder) -> Result<(), Error>) -> String {
        let mut sink = VecSink::default();
        {
            let mut enc = Encoder::new(&mut sink);
            f(&mut enc).unwrap();
        }
        String::from_utf8(sink.0).unwrap()
    }

    #[test]
    fn writes_compact_object() {
        let out = encode(|enc| {
            enc.start_object()?;
            enc.write_str("a")?;
            enc.write_f64(1.0)?;
            enc.write_str("b")?;
            enc.write_bool(true)?;
            enc.end_object()
        });
        assert_eq!(out, r#"{"a":1,"b":true}"#);
    }

    #[test]
    fn writes_nested_array() {
        let out = encode(|enc| {
            enc.start_array()?;
            enc.write_null()?;
            enc.start_array()?;
            enc.end_array()?;
            enc.end_array()
        });
        assert_eq!(out, "[null,[]]");
    }

    #[test]
    fn writes_expanded_form_with_indent() {
        let out = encode(|enc| {
            enc.indent = Some(Indent { prefix: String::new(), unit: "  ".into() });
            enc.start_object()?;
            enc.write_str("a")?;
            enc.write_f64(1.0)?;
            enc.end_object()
        });
        assert_eq!(out, "{\n  \"a\": 1\n}");
    }

    #[test]
    fn rejects_non_finite_float() {
        let mut sink = VecSink::default();
        let mut enc = Encoder::new(&mut sink);
        assert!(enc.write_f64(f64::NAN).is_err());
    }

    #[test]
    fn mismatched_close_is_rejected() {
        let mut sink = VecSink::default();
        let mut enc = Encoder::new(&mut sink);
        enc.start_array().unwrap();
        assert!(enc.end_object().is_err());
    }
}
