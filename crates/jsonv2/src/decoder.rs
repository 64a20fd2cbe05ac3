//! The streaming, pull-style decoder: owns a [`DecodeBuffer`], refills it
//! from a [`Source`], and drives [`Grammar`] + [`NamespaceStack`] as it
//! tokenizes.
//!
//! A single `read_token` call loops internally (via repeated
//! `DecodeBuffer::fetch`) until the token is complete or input is truly
//! exhausted, since [`Source::fill`] blocks rather than returning a partial
//! read for "no data yet" (see `crate::io`). There is therefore no scanner
//! state to persist *across* `read_token` calls.

use alloc::string::String;

use crate::buffer::DecodeBuffer;
use crate::error::{Error, SyntaxError, SyntaxErrorKind};
use crate::grammar::Grammar;
use crate::io::Source;
use crate::kind::Kind;
use crate::namespace::NamespaceStack;
use crate::scanner::number::NumberState;
use crate::scanner::string::Utf8Mode;
use crate::scanner::{self, Scan};
use crate::token::Token;

/// A pull-style JSON token reader over a [`Source`].
pub struct Decoder<'s> {
    buf: DecodeBuffer,
    grammar: Grammar,
    namespaces: NamespaceStack,
    source: &'s mut dyn Source,
    reject_duplicate_names: bool,
    allow_invalid_utf8: bool,
}

impl<'s> Decoder<'s> {
    /// A decoder reading from `source`, with no duplicate-name rejection and
    /// no invalid-UTF-8 tolerance (call [`Decoder::with_options`] to change
    /// either).
    #[must_use]
    pub fn new(source: &'s mut dyn Source) -> Self {
        Self {
            buf: DecodeBuffer::new(),
            grammar: Grammar::new(),
            namespaces: NamespaceStack::new(),
            source,
            reject_duplicate_names: false,
            allow_invalid_utf8: false,
        }
    }

    /// Sets duplicate-object-member-name rejection and invalid-UTF-8
    /// tolerance for this decoder.
    #[must_use]
    pub fn with_options(mut self, reject_duplicate_names: bool, allow_invalid_utf8: bool) -> Self {
        self.reject_duplicate_names = reject_duplicate_names;
        self.allow_invalid_utf8 = allow_invalid_utf8;
        self
    }

    /// Current container nesting depth (0 at the top level).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.grammar.depth()
    }

    fn utf8_mode(&self) -> Utf8Mode {
        if self.allow_invalid_utf8 {
            Utf8Mode::AllowInvalid
        } else {
            Utf8Mode::Validate
        }
    }

    /// Ensures at least one unread byte is available, fetching more input if
    /// needed.
    fn ensure_byte(&mut self) -> Result<bool, Error> {
        while self.buf.unread().is_empty() {
            if self.buf.at_eof() {
                return Ok(false);
            }
            self.buf.fetch(self.source)?;
        }
        Ok(true)
    }

    /// Skips (permanently consuming) any run of whitespace, then at most one
    /// delimiter byte (`,` or `:`) plus any whitespace following it, and
    /// returns the delimiter observed (`0` if none). Used only by
    /// `read_token`, which validates the returned byte via
    /// `Grammar::check_delim` immediately afterwards.
    fn skip_ws_and_delim(&mut self) -> Result<u8, Error> {
        self.skip_ws()?;
        let mut delim = 0u8;
        if let Some(&b) = self.buf.unread().first() {
            if b == b',' || b == b':' {
                delim = b;
                self.buf.advance(1);
                self.skip_ws()?;
            }
        }
        Ok(delim)
    }

    /// Permanently drops a run of whitespace. Always safe: whitespace is
    /// never grammatically significant, so nothing downstream needs to see
    /// it again.
    fn skip_ws(&mut self) -> Result<(), Error> {
        loop {
            let skipped = crate::scanner::consume_whitespace(self.buf.unread());
            self.buf.advance(skipped);
            if !self.buf.unread().is_empty() {
                return Ok(());
            }
            if self.buf.at_eof() {
                return Ok(());
            }
            self.buf.fetch(self.source)?;
        }
    }

    /// Ensures at least `idx + 1` unread bytes are buffered (fetching more
    /// input as needed) without advancing the cursor. Returns `false` if
    /// end-of-input is reached first.
    fn ensure_available(&mut self, idx: usize) -> Result<bool, Error> {
        while self.buf.unread().len() <= idx {
            if self.buf.at_eof() {
                return Ok(false);
            }
            self.buf.fetch(self.source)?;
        }
        Ok(true)
    }

    /// Peeks the kind of the upcoming token — skipping past whitespace and,
    /// if present, a single delimiter plus trailing whitespace — without
    /// consuming the delimiter itself: `read_token` still needs to observe
    /// it in order to validate it via `Grammar::check_delim`. Any problem
    /// here is swallowed and reported as [`Kind::Invalid`], to be
    /// re-surfaced with a precise error by the following `read_token` call.
    pub fn peek_kind(&mut self) -> Kind {
        self.peek_kind_inner().unwrap_or(Kind::Invalid)
    }

    fn peek_kind_inner(&mut self) -> Result<Kind, Error> {
        self.skip_ws()?;
        if !self.ensure_available(0)? {
            return Ok(Kind::Invalid);
        }
        let mut idx = 0usize;
        if matches!(self.buf.unread()[0], b',' | b':') {
            idx = 1;
        }
        loop {
            if !self.ensure_available(idx)? {
                return Ok(Kind::Invalid);
            }
            let ws = crate::scanner::consume_whitespace(&self.buf.unread()[idx..]);
            if ws == 0 {
                break;
            }
            idx += ws;
        }
        if !self.ensure_available(idx)? {
            return Ok(Kind::Invalid);
        }
        Ok(Kind::from_byte(self.buf.unread()[idx]))
    }

    fn eof_error(&self) -> Error {
        let off = self.buf.absolute(self.buf.cursor());
        if self.grammar.is_top_level() {
            SyntaxError::new(SyntaxErrorKind::Eof, off).into()
        } else {
            SyntaxError::new(SyntaxErrorKind::UnexpectedEof, off).into()
        }
    }

    /// Reads the next single token (scalar or bracket), advancing the
    /// grammar machine and, for object member names, the namespace stack.
    pub fn read_token(&mut self) -> Result<Token<'_>, Error> {
        let observed = self.skip_ws_and_delim()?;
        if !self.ensure_byte()? {
            return Err(self.eof_error());
        }
        let start = self.buf.cursor();
        self.buf.set_returned(start, start);
        let kind = Kind::from_byte(self.buf.unread()[0]);
        self.grammar.set_offset(self.buf.absolute(start));
        self.grammar.check_delim(observed, kind)?;

        let token = match kind {
            Kind::Null => {
                self.consume_literal_token(scanner::consume_null)?;
                self.grammar.append_literal()?;
                Token::null()
            }
            Kind::True => {
                self.consume_literal_token(scanner::consume_true)?;
                self.grammar.append_literal()?;
                Token::bool(true)
            }
            Kind::False => {
                self.consume_literal_token(scanner::consume_false)?;
                self.grammar.append_literal()?;
                Token::bool(false)
            }
            Kind::Number => {
                let owned = self.consume_number_token()?;
                self.grammar.append_number()?;
                Token::number_owned(owned)
            }
            Kind::String => {
                let is_name = self.grammar.expects_name();
                let owned = self.consume_string_token()?;
                self.grammar.append_string()?;
                if is_name {
                    self.track_name(&owned)?;
                }
                Token::string(owned)
            }
            Kind::ObjectStart => {
                self.buf.advance(1);
                self.grammar.push_object()?;
                self.namespaces.push();
                Token::object_start()
            }
            Kind::ObjectEnd => {
                self.buf.advance(1);
                self.grammar.pop_object()?;
                self.namespaces.pop_and_recycle();
                Token::object_end()
            }
            Kind::ArrayStart => {
                self.buf.advance(1);
                self.grammar.push_array()?;
                Token::array_start()
            }
            Kind::ArrayEnd => {
                self.buf.advance(1);
                self.grammar.pop_array()?;
                Token::array_end()
            }
            Kind::Invalid => {
                return Err(SyntaxError::new(SyntaxErrorKind::InvalidCharacter, self.buf.absolute(start)).into());
            }
        };
        self.buf.set_returned(start, self.buf.cursor());
        Ok(token)
    }

    fn track_name(&mut self, name: &str) -> Result<(), Error> {
        if let Some(ns) = self.namespaces.top_mut() {
            if !ns.insert(name) && self.reject_duplicate_names {
                return Err(SyntaxError::new(SyntaxErrorKind::DuplicateName, self.buf.absolute(self.buf.cursor())).into());
            }
        }
        Ok(())
    }

    fn consume_literal_token(
        &mut self,
        scan: impl Fn(&[u8]) -> scanner::ScanResult<()>,
    ) -> Result<(), Error> {
        loop {
            match scan(self.buf.unread())? {
                Scan::Complete { consumed, .. } => {
                    self.buf.advance(consumed);
                    return Ok(());
                }
                Scan::Truncated { .. } => {
                    if self.buf.at_eof() {
                        return Err(self.eof_error());
                    }
                    self.buf.fetch(self.source)?;
                }
            }
        }
    }

    /// A number is the only JSON construct without a self-terminating
    /// closing character, so `consume_number_resumable` reports `Truncated`
    /// both for "might have more digits" and for a genuinely incomplete
    /// number ("-", "1.", "1e"). It always restarts the scan from
    /// `BeforeIntegerDigits`/offset 0 each time the buffer grows — the
    /// already-scanned prefix is re-validated rather than resumed
    /// mid-state, since `Scan::Truncated` carries no state for the caller
    /// to resume with. Whether a truncation at true EOF is actually a
    /// complete number is decided by inspecting the last scanned byte: every
    /// truncation reachable from a "within a digit run" state ends on an
    /// ASCII digit, and every other truncation point ends on `-`, `.`,
    /// `e`/`E`, or a bare exponent sign.
    fn consume_number_token(&mut self) -> Result<String, Error> {
        loop {
            match scanner::consume_number_resumable(self.buf.unread(), NumberState::BeforeIntegerDigits, 0)? {
                Scan::Complete { consumed, .. } => {
                    let text = core::str::from_utf8(&self.buf.unread()[..consumed])
                        .expect("number scanner only consumes ASCII")
                        .into();
                    self.buf.advance(consumed);
                    return Ok(text);
                }
                Scan::Truncated { consumed } => {
                    if self.buf.at_eof() {
                        let complete = consumed > 0 && self.buf.unread()[consumed - 1].is_ascii_digit();
                        if !complete {
                            return Err(self.eof_error());
                        }
                        let text = core::str::from_utf8(&self.buf.unread()[..consumed])
                            .expect("number scanner only consumes ASCII")
                            .into();
                        self.buf.advance(consumed);
                        return Ok(text);
                    }
                    self.buf.fetch(self.source)?;
                }
            }
        }
    }

    fn consume_string_token(&mut self) -> Result<String, Error> {
        let mode = self.utf8_mode();
        let mut acc = String::new();
        let mut offset = 0usize;
        loop {
            match scanner::consume_string_resumable(self.buf.unread(), offset, &mut acc, mode)? {
                Scan::Complete { consumed, .. } => {
                    self.buf.advance(consumed);
                    return Ok(acc);
                }
                Scan::Truncated { consumed } => {
                    if self.buf.at_eof() {
                        return Err(self.eof_error());
                    }
                    self.buf.fetch(self.source)?;
                    offset = consumed;
                }
            }
        }
    }

    /// Recursively reads one complete value. Unlike `read_token`, nested
    /// containers are consumed whole.
    pub fn read_value(&mut self) -> Result<(), Error> {
        let kind = self.peek_kind();
        match kind {
            Kind::ObjectStart => {
                self.read_token()?;
                loop {
                    if self.peek_kind() == Kind::ObjectEnd {
                        self.read_token()?;
                        break;
                    }
                    self.read_token()?; // name
                    self.read_value()?; // value
                }
            }
            Kind::ArrayStart => {
                self.read_token()?;
                loop {
                    if self.peek_kind() == Kind::ArrayEnd {
                        self.read_token()?;
                        break;
                    }
                    self.read_value()?;
                }
            }
            _ => {
                // Either a scalar, or Invalid/EOF — either way `read_token`
                // surfaces the precise outcome (token or error).
                self.read_token()?;
            }
        }
        Ok(())
    }

    /// After a successful top-level value, asserts only trailing whitespace
    /// remains.
    pub fn check_eof(&mut self) -> Result<(), Error> {
        self.skip_ws()?;
        if self.ensure_byte()? {
            return Err(SyntaxError::new(
                SyntaxErrorKind::InvalidCharacterAfterTopLevelValue,
                self.buf.absolute(self.buf.cursor()),
            )
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::SliceSource;

    fn tokens(input: &[u8]) -> Vec<Kind> {
        let mut src = SliceSource::new(input);
        let mut dec = Decoder::new(&mut src);
        let mut kinds = Vec::new();
        loop {
            match dec.read_token() {
                Ok(t) => kinds.push(t.kind()),
                Err(e) if e.is_eof() => break,
                Err(e) => panic!("unexpected error: {e:?}"),
            }
        }
        kinds
    }

    #[test]
    fn mixed_stream_token_sequence() {
        let input = br#"{"name":"value","array":[null,false,true,3.14159],"object":{"k":"v"}}"#;
        let kinds = tokens(input);
        use Kind::*;
        assert_eq!(
            kinds,
            vec![
                ObjectStart, String, String, String, ArrayStart, Null, False, True, Number, ArrayEnd,
                String, ObjectStart, String, String, ObjectEnd, ObjectEnd,
            ]
        );
    }

    #[test]
    fn string_value_inside_array_inside_object_is_not_mistaken_for_a_name() {
        let input = br#"{"items":["a","b"]}"#;
        let kinds = tokens(input);
        use Kind::*;
        assert_eq!(
            kinds,
            vec![ObjectStart, String, ArrayStart, String, String, ArrayEnd, ObjectEnd]
        );
    }

    #[test]
    fn duplicate_name_rejected_when_enabled() {
        let mut src = SliceSource::new(br#"{"a":1,"a":2}"#);
        let mut dec = Decoder::new(&mut src).with_options(true, false);
        dec.read_token().unwrap(); // {
        dec.read_token().unwrap(); // "a"
        dec.read_token().unwrap(); // 1
        dec.read_token().unwrap(); // "a" again -> dup
        let err = dec.read_token();
        assert!(err.is_err());
    }

    #[test]
    fn resumable_split_number_across_feeds() {
        struct Chunks<'a>(&'a [&'a [u8]], usize);
        impl Source for Chunks<'_> {
            fn fill(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
                if self.1 >= self.0.len() {
                    return Ok(0);
                }
                let chunk = self.0[self.1];
                buf[..chunk.len()].copy_from_slice(chunk);
                self.1 += 1;
                Ok(chunk.len())
            }
        }
        let mut src = Chunks(&[b"1.23e", b"10"], 0);
        let mut dec = Decoder::new(&mut src);
        let tok = dec.read_token().unwrap();
        assert_eq!(tok.number_text(), Some("1.23e10"));
    }

    #[test]
    fn number_at_true_eof_without_trailing_digit_is_an_error() {
        let mut src = SliceSource::new(b"1.");
        let mut dec = Decoder::new(&mut src);
        assert!(dec.read_token().is_err());
    }

    #[test]
    fn missing_name_is_rejected() {
        let mut src = SliceSource::new(br#"{1:2}"#);
        let mut dec = Decoder::new(&mut src);
        dec.read_token().unwrap();
        assert!(dec.read_token().is_err());
    }

    #[test]
    fn check_eof_rejects_trailing_garbage() {
        let mut src = SliceSource::new(b"1 x");
        let mut dec = Decoder::new(&mut src);
        dec.read_token().unwrap();
        assert!(dec.check_eof().is_err());
    }
}
