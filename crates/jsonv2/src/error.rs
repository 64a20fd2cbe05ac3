//! Error taxonomy for the codec core.
//!
//! Four kinds, matching the wire/value boundary: [`SyntaxError`] for
//! malformed JSON encountered by a scanner or the grammar machine,
//! [`SemanticError`] for a mismatch between a JSON value and a Rust target
//! type, [`Error::Wrap`] for an I/O failure from the underlying byte
//! source/sink, and the `skip` sentinel used internally by custom hooks
//! (never surfaced to callers, see [`crate::bind::hooks`]).

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

use thiserror::Error;

/// Action a [`SemanticError`] occurred during.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Converting a Rust value into JSON.
    Marshal,
    /// Converting JSON into a Rust value.
    Unmarshal,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Marshal => f.write_str("marshal"),
            Action::Unmarshal => f.write_str("unmarshal"),
        }
    }
}

/// A malformed-JSON error, carrying the absolute byte offset it was detected
/// at.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at byte offset {offset}")]
pub struct SyntaxError {
    /// The specific grammar/scanner failure.
    pub kind: SyntaxErrorKind,
    /// Absolute byte offset the failure was detected at.
    pub offset: u64,
}

impl SyntaxError {
    /// Builds a syntax error of `kind` detected at `offset`.
    #[must_use]
    pub fn new(kind: SyntaxErrorKind, offset: u64) -> Self {
        Self { kind, offset }
    }
}

/// Specific grammar/scanner failures. Variants map directly to the
/// vocabulary used throughout the design (missing-name, mismatch-delim,
/// etc.) so callers can match on stable names rather than message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    #[error("invalid character")]
    InvalidCharacter,
    #[error("expected an object member name")]
    MissingName,
    #[error("expected a value")]
    MissingValue,
    #[error("mismatched closing delimiter")]
    MismatchDelim,
    #[error("missing ':' between name and value")]
    MissingColon,
    #[error("missing ',' between elements")]
    MissingComma,
    #[error("unexpected character before token")]
    InvalidCharacterBeforeToken,
    #[error("invalid character after top-level value")]
    InvalidCharacterAfterTopLevelValue,
    #[error("invalid UTF-8")]
    InvalidUtf8,
    #[error("invalid escape sequence")]
    InvalidEscape,
    #[error("invalid unicode surrogate pair")]
    InvalidSurrogatePair,
    #[error("duplicate object name")]
    DuplicateName,
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("end of input")]
    Eof,
}

/// A JSON-value-to-Rust-value mismatch, or a violated contract such as
/// "struct has no serialisable fields".
#[derive(Debug, Error)]
#[error("cannot {action} JSON{}{}: {detail}",
    .json_kind.map(|k| alloc::format!(" {k:?}")).unwrap_or_default(),
    .target_type.as_ref().map(|t| alloc::format!(" into/from {t}")).unwrap_or_default())]
pub struct SemanticError {
    /// Whether this occurred during marshal or unmarshal.
    pub action: Action,
    /// The JSON kind encountered, if known.
    pub json_kind: Option<crate::kind::Kind>,
    /// The Rust target type's name, if known.
    pub target_type: Option<Cow<'static, str>>,
    /// Absolute byte offset the failure was detected at, if known.
    pub offset: Option<u64>,
    /// JSON Pointer to the failing location within the top-level value, if known.
    pub pointer: Option<String>,
    /// The specific mismatch or violated contract.
    pub detail: SemanticDetail,
    /// The underlying error this one was raised in response to, if any.
    #[source]
    pub cause: Option<Box<Error>>,
}

impl SemanticError {
    /// Builds a bare semantic error with no type/offset/pointer context yet attached.
    #[must_use]
    pub fn new(action: Action, detail: SemanticDetail) -> Self {
        Self {
            action,
            json_kind: None,
            target_type: None,
            offset: None,
            pointer: None,
            detail,
            cause: None,
        }
    }

    /// Attaches the Rust target type's name.
    #[must_use]
    pub fn with_type(mut self, ty: impl Into<Cow<'static, str>>) -> Self {
        self.target_type = Some(ty.into());
        self
    }

    /// Attaches the JSON kind that was encountered.
    #[must_use]
    pub fn with_kind(mut self, kind: crate::kind::Kind) -> Self {
        self.json_kind = Some(kind);
        self
    }

    /// Attaches the underlying error this one was raised in response to.
    #[must_use]
    pub fn with_cause(mut self, cause: Error) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

impl PartialEq for SemanticError {
    fn eq(&self, other: &Self) -> bool {
        self.action == other.action
            && self.json_kind == other.json_kind
            && self.target_type == other.target_type
            && self.detail == other.detail
    }
}

/// Specific semantic failure detail. The two phrasing choices
/// ("cannot"/"unable to") mentioned in the design are intentionally not
/// baked into this enum's `Display`: [`Error::hyrum_message`] performs the
/// alternation so the choice is made once, at the outermost error, rather
/// than duplicated across every detail variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticDetail {
    /// The JSON value's kind cannot bind to the target type at all.
    #[error("JSON kind does not match target type")]
    WrongKind,
    /// A number's magnitude does not fit the target integer width.
    #[error("number overflows target integer width")]
    Overflow,
    /// A string member expected to carry base64 failed to decode as such.
    #[error("invalid base64 in string")]
    Base64,
    /// A map's key type cannot be ordered/compared, so it cannot be used as a
    /// JSON object key.
    #[error("map key type is not comparable")]
    IncomparableKey,
    /// An unmarshal target is a null or absent pointer-like value.
    #[error("target is not a pointer or is nil")]
    NilTarget,
    /// A struct declares no fields eligible for marshal/unmarshal.
    #[error("struct has no serialisable fields")]
    NoFields,
    /// Two fields on the same struct resolved to the same wire name.
    #[error("duplicate field name {0:?} declared on struct")]
    DuplicateFieldName(String),
    /// An object member had no matching field and no fallback absorbed it.
    #[error("unknown object member {0:?}")]
    UnknownMember(String),
    /// A float value is NaN or infinite and cannot be written as JSON.
    #[error("NaN or infinite float is not representable in JSON")]
    NonFiniteFloat,
    /// A custom hook read/wrote something other than exactly one JSON value.
    #[error("custom hook did not produce exactly one JSON value")]
    HookArityViolation,
    /// The target is an interface/trait object with a non-empty method set,
    /// which this crate cannot bind to.
    #[error("interface type has non-empty method set")]
    NonEmptyInterface,
}

/// Adapter error wrapping a failure from the underlying byte source or sink.
#[derive(Debug, Error)]
#[error("I/O error: {0}")]
pub struct WrapError(
    /// The wrapped I/O failure.
    #[source]
    pub Box<dyn core::error::Error + Send + Sync + 'static>,
);

impl PartialEq for WrapError {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_string() == other.0.to_string()
    }
}

/// The tagged error type returned by every fallible operation in this crate.
///
/// All variants participate in a common `is` protocol ([`Error::is`]) so
/// callers can match against a single sentinel without knowing which variant
/// produced it.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// Malformed JSON, detected below the value-binding layer.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    /// A mismatch between a JSON value and a Rust target type.
    #[error(transparent)]
    Semantic(#[from] SemanticError),
    /// A failure from the underlying byte source or sink.
    #[error(transparent)]
    Wrap(#[from] WrapError),
    /// A catch-all for errors that don't fit the other variants.
    #[error("{0}")]
    Generic(String),
}

impl Error {
    /// Matches this error against a `marker`, the way a caller would compare
    /// against a sentinel such as `io::ErrorKind`. Two errors match if they
    /// carry the same variant and, for [`Error::Syntax`], the same
    /// [`SyntaxErrorKind`].
    #[must_use]
    pub fn is(&self, marker: &Error) -> bool {
        match (self, marker) {
            (Error::Syntax(a), Error::Syntax(b)) => a.kind == b.kind,
            (Error::Semantic(a), Error::Semantic(b)) => a.detail == b.detail,
            (Error::Wrap(_), Error::Wrap(_)) => true,
            (Error::Generic(a), Error::Generic(b)) => a == b,
            _ => false,
        }
    }

    /// Whether this is the benign end-of-input marker, not a true failure.
    #[must_use]
    pub fn is_eof(&self) -> bool {
        matches!(
            self,
            Error::Syntax(SyntaxError {
                kind: SyntaxErrorKind::Eof,
                ..
            })
        )
    }

    /// Whether this is an end-of-input encountered mid-value.
    #[must_use]
    pub fn is_unexpected_eof(&self) -> bool {
        matches!(
            self,
            Error::Syntax(SyntaxError {
                kind: SyntaxErrorKind::UnexpectedEof,
                ..
            })
        )
    }

    /// Hyrum-proofs the human-readable message by alternating between two
    /// equivalent phrasings, selected by a cheap, non-cryptographic hash of
    /// the error's discriminant and offset rather than a stored counter (so
    /// formatting stays free of interior mutability). Discourages callers
    /// from pattern-matching on message text instead of [`Error::is`].
    #[must_use]
    pub fn hyrum_message(&self) -> String {
        let base = self.to_string();
        let flip = self.hyrum_seed() % 2 == 0;
        if flip {
            base.replacen("cannot", "unable to", 1)
        } else {
            base
        }
    }

    fn hyrum_seed(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        for b in self.to_string().bytes() {
            h ^= u64::from(b);
            h = h.wrapping_mul(0x0000_0100_0000_01b3);
        }
        h
    }
}

/// This crate's fallible-operation result alias.
pub type Result<T> = core::result::Result<T, Error>;
