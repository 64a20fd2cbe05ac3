//! The `Options` value: a bitset of boolean flags plus an associated
//! heterogeneous payload list, following a plain `Copy` options-struct
//! convention, but extended with a small payload vector since several of
//! these options carry data (an indent string, a user hook chain) rather
//! than being bare flags.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::bind::hooks::{Marshaler, Unmarshaler};

bitflags::bitflags! {
    /// Boolean option flags. Every flag defaults to unset.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Flags: u32 {
        /// Quote numbers as strings on the wire, in both directions.
        const STRINGIFY_NUMBERS       = 1 << 0;
        /// Sort map keys (and struct map-typed fallback members) before
        /// emission.
        const DETERMINISTIC           = 1 << 1;
        /// Emit `null` instead of `[]` for an empty/nil slice.
        const FORMAT_NIL_SLICE_NULL   = 1 << 2;
        /// Emit `null` instead of `{}` for an empty/nil map.
        const FORMAT_NIL_MAP_NULL     = 1 << 3;
        /// Suppress emission of the inlined fallback member.
        const DISCARD_UNKNOWN_MEMBERS = 1 << 4;
        /// Error on an unrecognized object member during unmarshal.
        const REJECT_UNKNOWN_MEMBERS  = 1 << 5;
        /// Error on a duplicate object member name during unmarshal.
        const REJECT_DUPLICATE_NAMES  = 1 << 6;
        /// Replace invalid UTF-8 with U+FFFD instead of erroring.
        const ALLOW_INVALID_UTF8      = 1 << 7;
        /// Use the encoder's expanded (multi-line, indented) form.
        const EXPAND                  = 1 << 8;
        /// Escape `<`,`>`,`&`,U+2028,U+2029 for safe HTML embedding.
        const ESCAPE_FOR_HTML         = 1 << 9;
        /// Escape ` `/` ` (the two code points that are valid JSON
        /// but invalid inside a raw JavaScript string literal).
        const ESCAPE_FOR_JS           = 1 << 10;
    }
}

impl Default for Flags {
    fn default() -> Self {
        Flags::empty()
    }
}

/// Indentation configuration used when [`Flags::EXPAND`] is set.
#[derive(Debug, Clone, Default)]
pub struct IndentStyle {
    /// Written once at the start of every indented line, before the
    /// per-depth `indent` units.
    pub prefix: String,
    /// Repeated once per nesting level on every indented line.
    pub indent: String,
}

/// A user-supplied custom escape selector: given a rune, returns `true` if
/// it must be escaped even when not otherwise required.
pub type EscapeFunc = Arc<dyn Fn(char) -> bool + Send + Sync>;

/// Options controlling marshal/unmarshal and streaming codec behavior.
/// Unknown future options are expected to be carried via the `extension`
/// hook rather than growing this struct indefinitely.
#[derive(Clone, Default)]
pub struct Options {
    /// Boolean behavior switches; see [`Flags`].
    pub flags: Flags,
    /// Indentation style, consulted only when [`Flags::EXPAND`] is set.
    pub indent: Option<IndentStyle>,
    /// Optional override for which runes must be escaped beyond the
    /// baseline RFC 8259 set.
    pub escape_func: Option<EscapeFunc>,
    /// User-registered marshal hooks, consulted in order before the default
    /// arshaler at the outermost [`crate::bind::marshal`] call.
    pub marshalers: Vec<Arc<dyn Marshaler>>,
    /// User-registered unmarshal hooks, the unmarshal-side counterpart of
    /// `marshalers`.
    pub unmarshalers: Vec<Arc<dyn Unmarshaler>>,
    /// Extension hook for options this crate doesn't know about yet; an
    /// unrecognized option is appended here rather than requiring a change
    /// to this struct.
    pub extensions: Vec<Box<dyn core::any::Any + Send + Sync>>,
}

impl core::fmt::Debug for Options {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Options")
            .field("flags", &self.flags)
            .field("indent", &self.indent)
            .field("marshalers", &self.marshalers.len())
            .field("unmarshalers", &self.unmarshalers.len())
            .field("extensions", &self.extensions.len())
            .finish_non_exhaustive()
    }
}

impl Options {
    /// Default options: every flag unset, compact output, no hooks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an additional flag, leaving others unchanged.
    #[must_use]
    pub fn with_flag(mut self, flag: Flags) -> Self {
        self.flags |= flag;
        self
    }

    /// Whether `flag` is set.
    #[must_use]
    pub fn has(&self, flag: Flags) -> bool {
        self.flags.contains(flag)
    }

    /// Enables expanded (multi-line, indented) output with the given
    /// prefix/indent unit.
    #[must_use]
    pub fn expand(mut self, prefix: impl Into<String>, indent: impl Into<String>) -> Self {
        self.flags |= Flags::EXPAND;
        self.indent = Some(IndentStyle {
            prefix: prefix.into(),
            indent: indent.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_join_with_bitor() {
        let o = Options::new()
            .with_flag(Flags::DETERMINISTIC)
            .with_flag(Flags::STRINGIFY_NUMBERS);
        assert!(o.has(Flags::DETERMINISTIC));
        assert!(o.has(Flags::STRINGIFY_NUMBERS));
        assert!(!o.has(Flags::EXPAND));
    }
}
