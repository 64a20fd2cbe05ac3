//! The struct field tag grammar and the layout it builds.
//!
//! Rust has no runtime reflection, so there is no way to iterate a struct's
//! fields generically the way the dispatch this module is modeled on does.
//! Each concrete struct still hand-writes its `Marshal`/`Unmarshal` impl (no
//! derive macro), but the per-field bookkeeping — name resolution,
//! case-insensitive fallback, conflicting-name detection, the "no
//! serialisable fields" error — is common enough to centralise here. A
//! hand-written impl calls [`StructLayout::build`] once (memoised by
//! [`crate::bind::arshaler`]) and then asks it to resolve incoming member
//! names and to check per-field omit policy, while the actual per-field
//! value marshal/unmarshal still happens in the impl itself since field
//! types differ per struct.

use alloc::borrow::ToOwned;
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::decoder::Decoder;
use crate::error::{Action, Error, SemanticDetail, SemanticError};
use crate::kind::Kind;
use crate::options::{Flags, Options};

/// A recognised `format:<token>` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatToken {
    Base64,
    Hex,
    Array,
    NonFinite,
    EmitNull,
    Nanos,
    /// A quoted format layout the field owner interprets itself (e.g. a
    /// time layout string).
    Custom(String),
}

/// One field's parsed tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTag {
    pub name: Option<String>,
    pub omit_zero: bool,
    pub omit_empty: bool,
    pub stringify: bool,
    pub nocase: bool,
    pub inline: bool,
    pub unknown: bool,
    pub ignore: bool,
    pub format: Option<FormatToken>,
}

/// Parses a comma-separated field tag: an optional leading explicit name
/// followed by recognised keys (`omitzero`, `omitempty`, `string`,
/// `nocase`, `inline`, `unknown`, `format:<token>`). A bare `-` ignores the
/// field entirely.
pub fn parse_field_tag(tag: &str) -> FieldTag {
    if tag.trim() == "-" {
        return FieldTag { ignore: true, ..FieldTag::default() };
    }
    let mut out = FieldTag::default();
    for (i, part) in tag.split(',').enumerate() {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match part {
            "omitzero" => out.omit_zero = true,
            "omitempty" => out.omit_empty = true,
            "string" => out.stringify = true,
            "nocase" => out.nocase = true,
            "inline" => out.inline = true,
            "unknown" => out.unknown = true,
            _ if part.starts_with("format:") => {
                let token = &part["format:".len()..];
                out.format = Some(match token {
                    "base64" => FormatToken::Base64,
                    "hex" => FormatToken::Hex,
                    "array" => FormatToken::Array,
                    "nonfinite" => FormatToken::NonFinite,
                    "emitnull" => FormatToken::EmitNull,
                    "nanos" => FormatToken::Nanos,
                    custom => FormatToken::Custom(custom.trim_matches('"').to_string()),
                });
            }
            explicit if i == 0 => out.name = Some(explicit.to_owned()),
            _ => {}
        }
    }
    out
}

/// The resolved layout of a struct's declared fields: name lookup (with a
/// case-insensitive fallback sweep when any field requested `nocase`),
/// conflicting-name detection, and the "no serialisable fields" guard.
#[derive(Debug, Clone)]
pub struct StructLayout {
    names: BTreeMap<String, usize>,
    any_nocase: bool,
    fields: Vec<(String, FieldTag)>,
}

impl StructLayout {
    /// Builds a layout from `(rust_field_name, tag_string)` pairs, in
    /// declaration order. Fields tagged `ignore` are dropped; a name
    /// collision between two serialisable fields is a build-time error
    /// (callers are expected to cache it as a sticky error per type, the
    /// way [`crate::bind::arshaler`]'s own per-type cache publishes once
    /// and never retries a failed construction).
    pub fn build(raw_fields: &[(&str, &str)]) -> Result<Self, Error> {
        let mut names = BTreeMap::new();
        let mut fields = Vec::new();
        let mut any_nocase = false;

        for (rust_name, tag_str) in raw_fields {
            let tag = parse_field_tag(tag_str);
            if tag.ignore || tag.unknown {
                fields.push(((*rust_name).to_owned(), tag));
                continue;
            }
            let wire_name = tag.name.clone().unwrap_or_else(|| (*rust_name).to_owned());
            any_nocase |= tag.nocase;
            let index = fields.len();
            if names.insert(wire_name.clone(), index).is_some() {
                return Err(SemanticError::new(Action::Marshal, SemanticDetail::DuplicateFieldName(wire_name)).into());
            }
            fields.push(((*rust_name).to_owned(), tag));
        }

        if !raw_fields.is_empty() && names.is_empty() {
            return Err(SemanticError::new(Action::Marshal, SemanticDetail::NoFields).into());
        }

        Ok(Self { names, any_nocase, fields })
    }

    /// Resolves an incoming object member name to a field index: exact
    /// case-sensitive match first, then (only if some field opted in) a
    /// linear case-insensitive sweep.
    pub fn resolve(&self, member: &str) -> Option<usize> {
        if let Some(&idx) = self.names.get(member) {
            return Some(idx);
        }
        if !self.any_nocase {
            return None;
        }
        self.names.iter().find(|(name, _)| name.eq_ignore_ascii_case(member)).map(|(_, &idx)| idx)
    }

    pub fn field_tag(&self, index: usize) -> &FieldTag {
        &self.fields[index].1
    }

    /// The wire name a field is matched/emitted under: its explicit tag name
    /// if given, otherwise its Rust field name verbatim.
    pub fn wire_name(&self, index: usize) -> &str {
        let (rust_name, tag) = &self.fields[index];
        tag.name.as_deref().unwrap_or(rust_name)
    }

    pub fn unknown_field_index(&self) -> Option<usize> {
        self.fields.iter().position(|(_, tag)| tag.unknown)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One object member as routed by [`unmarshal_object`]: either a member name
/// that resolved to a declared field, or one that didn't and is being
/// offered to the struct's fallback field (if it has one).
pub enum Member {
    Field(usize),
    Unknown(String),
}

/// Drives an object's members through `layout`, calling `on_member` once per
/// member with either the resolved field index or the raw member name.
///
/// A single callback (rather than separate known/unknown closures) is
/// deliberate: both cases need a mutable borrow of the same target struct,
/// and two closures each trying to capture that borrow would not satisfy
/// the borrow checker.
///
/// An unresolved name is routed to `on_member` as [`Member::Unknown`] only
/// when the layout declares a fallback field (`unknown_field_index` is
/// `Some`); otherwise it is rejected under [`Flags::REJECT_UNKNOWN_MEMBERS`]
/// or silently discarded (the struct has no room for it and the caller
/// didn't ask for strictness).
pub fn unmarshal_object(
    dec: &mut Decoder,
    opts: &Options,
    layout: &StructLayout,
    mut on_member: impl FnMut(Member, &mut Decoder, &Options) -> Result<(), Error>,
) -> Result<(), Error> {
    let open = dec.read_token()?;
    if open.kind() != Kind::ObjectStart {
        return Err(SemanticError::new(Action::Unmarshal, SemanticDetail::WrongKind).with_kind(open.kind()).into());
    }
    loop {
        if dec.peek_kind() == Kind::ObjectEnd {
            dec.read_token()?;
            return Ok(());
        }
        let name_tok = dec.read_token()?;
        let name: String = name_tok.as_str().expect("object member name is a string").into();

        if let Some(index) = layout.resolve(&name) {
            on_member(Member::Field(index), dec, opts)?;
            continue;
        }
        if layout.unknown_field_index().is_some() {
            on_member(Member::Unknown(name), dec, opts)?;
            continue;
        }
        if opts.has(Flags::REJECT_UNKNOWN_MEMBERS) {
            return Err(SemanticError::new(Action::Unmarshal, SemanticDetail::UnknownMember(name)).into());
        }
        dec.read_value()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_and_flags() {
        let tag = parse_field_tag("fullName,omitempty,nocase");
        assert_eq!(tag.name.as_deref(), Some("fullName"));
        assert!(tag.omit_empty);
        assert!(tag.nocase);
        assert!(!tag.omit_zero);
    }

    #[test]
    fn parses_format_token() {
        let tag = parse_field_tag("data,format:base64");
        assert_eq!(tag.format, Some(FormatToken::Base64));
    }

    #[test]
    fn bare_dash_ignores_field() {
        let tag = parse_field_tag("-");
        assert!(tag.ignore);
    }

    #[test]
    fn layout_rejects_duplicate_names() {
        let fields = [("a", "x"), ("b", "x")];
        assert!(StructLayout::build(&fields).is_err());
    }

    #[test]
    fn layout_rejects_struct_with_no_serialisable_fields() {
        let fields = [("a", "-")];
        assert!(StructLayout::build(&fields).is_err());
    }

    #[test]
    fn layout_resolves_nocase_fallback() {
        let fields = [("Name", "name,nocase")];
        let layout = StructLayout::build(&fields).unwrap();
        assert_eq!(layout.resolve("name"), Some(0));
        assert_eq!(layout.resolve("NAME"), Some(0));
    }

    #[test]
    fn layout_without_nocase_is_case_sensitive() {
        let fields = [("Name", "name")];
        let layout = StructLayout::build(&fields).unwrap();
        assert_eq!(layout.resolve("name"), Some(0));
        assert_eq!(layout.resolve("NAME"), None);
    }

    #[test]
    fn unmarshal_object_discards_unknown_members_without_a_fallback_field() {
        use crate::bind::Unmarshal;
        use crate::io::SliceSource;

        let layout = StructLayout::build(&[("a", "")]).unwrap();
        let opts = crate::options::Options::new();
        let mut src = SliceSource::new(br#"{"a":1,"b":2}"#);
        let mut dec = Decoder::new(&mut src);
        let mut seen_a = None;
        unmarshal_object(&mut dec, &opts, &layout, |member, dec, opts| {
            match member {
                Member::Field(0) => seen_a = Some(i32::unmarshal(dec, opts)?),
                Member::Field(_) => unreachable!(),
                Member::Unknown(_) => unreachable!("layout has no fallback field"),
            }
            Ok(())
        })
        .unwrap();
        assert_eq!(seen_a, Some(1));
    }

    #[test]
    fn unmarshal_object_rejects_unknown_members_when_flagged() {
        use crate::bind::Unmarshal;
        use crate::io::SliceSource;
        use crate::options::Flags;

        let layout = StructLayout::build(&[("a", "")]).unwrap();
        let opts = crate::options::Options::new().with_flag(Flags::REJECT_UNKNOWN_MEMBERS);
        let mut src = SliceSource::new(br#"{"a":1,"b":2}"#);
        let mut dec = Decoder::new(&mut src);
        let result = unmarshal_object(&mut dec, &opts, &layout, |member, dec, opts| {
            if let Member::Field(0) = member {
                let _: i32 = i32::unmarshal(dec, opts)?;
            }
            Ok(())
        });
        assert!(result.is_err());
    }
}
