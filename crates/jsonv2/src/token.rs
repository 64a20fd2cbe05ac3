//! The [`Token`] type: a value-kind plus a lazily-materialized payload.

use alloc::string::String;

use crate::kind::Kind;

/// A value-kind plus its payload. Tokens obtained from a decoder are valid
/// only until the next `peek`/`read` call on that decoder (see the
/// Hyrum-proofing discipline in [`crate::buffer`]).
#[derive(Debug, Clone)]
pub struct Token<'a> {
    kind: Kind,
    payload: TokenPayload<'a>,
}

#[derive(Debug, Clone)]
enum TokenPayload<'a> {
    None,
    Bool(bool),
    /// Raw bytes of a number literal, valid JSON number syntax.
    NumberRaw(&'a str),
    NumberOwned(String),
    /// Already-unescaped string value. Borrowed when the source had no
    /// escapes and fit entirely in one buffer window; owned otherwise.
    StringBorrowed(&'a str),
    StringOwned(String),
}

impl<'a> Token<'a> {
    /// A `null` token.
    #[must_use]
    pub fn null() -> Self {
        Self {
            kind: Kind::Null,
            payload: TokenPayload::None,
        }
    }

    /// A `true`/`false` token.
    #[must_use]
    pub fn bool(v: bool) -> Self {
        Self {
            kind: if v { Kind::True } else { Kind::False },
            payload: TokenPayload::Bool(v),
        }
    }

    /// An object-opening `{` token.
    #[must_use]
    pub fn object_start() -> Self {
        Self {
            kind: Kind::ObjectStart,
            payload: TokenPayload::None,
        }
    }

    /// An object-closing `}` token.
    #[must_use]
    pub fn object_end() -> Self {
        Self {
            kind: Kind::ObjectEnd,
            payload: TokenPayload::None,
        }
    }

    /// An array-opening `[` token.
    #[must_use]
    pub fn array_start() -> Self {
        Self {
            kind: Kind::ArrayStart,
            payload: TokenPayload::None,
        }
    }

    /// An array-closing `]` token.
    #[must_use]
    pub fn array_end() -> Self {
        Self {
            kind: Kind::ArrayEnd,
            payload: TokenPayload::None,
        }
    }

    /// A string token owning its decoded text.
    #[must_use]
    pub fn string(s: impl Into<String>) -> Token<'static> {
        Token {
            kind: Kind::String,
            payload: TokenPayload::StringOwned(s.into()),
        }
    }

    /// A string token borrowing its decoded text from the caller.
    #[must_use]
    pub fn string_borrowed(s: &'a str) -> Self {
        Self {
            kind: Kind::String,
            payload: TokenPayload::StringBorrowed(s),
        }
    }

    /// A number token borrowing its raw JSON text from the caller.
    #[must_use]
    pub fn number_raw(text: &'a str) -> Self {
        Self {
            kind: Kind::Number,
            payload: TokenPayload::NumberRaw(text),
        }
    }

    /// A number token owning its raw JSON text.
    #[must_use]
    pub fn number_owned(text: String) -> Token<'static> {
        Token {
            kind: Kind::Number,
            payload: TokenPayload::NumberOwned(text),
        }
    }

    /// This token's value kind.
    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// The boolean value, if this is a `true`/`false` token.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self.payload {
            TokenPayload::Bool(v) => Some(v),
            _ => None,
        }
    }

    /// The decoded text, if this is a string token.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match &self.payload {
            TokenPayload::StringBorrowed(s) => Some(s),
            TokenPayload::StringOwned(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// The raw (unparsed) JSON text of a number token.
    #[must_use]
    pub fn number_text(&self) -> Option<&str> {
        match &self.payload {
            TokenPayload::NumberRaw(s) => Some(s),
            TokenPayload::NumberOwned(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// The parsed value, if this is a number token.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        self.number_text().map(crate::scanner::number::parse_float)
    }
}
