//! Inlined fallback members: a struct field that absorbs unknown object
//! members during unmarshal and contributes extra members during marshal.
//!
//! Two shapes are supported — a typed map (`BTreeMap<String, T>`) and a raw
//! accumulating buffer — matching the two kinds named for the fallback
//! field. There is no streaming precedent for this; both shapes are built
//! directly from this crate's own `Encoder`/`Decoder` primitives.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::bind::{Marshal, Unmarshal};
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::Error;
use crate::options::{Flags, Options};

/// A typed fallback: unknown members unmarshal into `T`, and every entry is
/// re-emitted as a declared-looking member on marshal (unless
/// [`Flags::DISCARD_UNKNOWN_MEMBERS`] is set).
pub trait MapFallback {
    /// Unmarshals the value following an unrecognized member name and
    /// records it under `name`.
    fn insert_unknown(&mut self, name: String, dec: &mut Decoder, opts: &Options) -> Result<(), Error>;
    /// Marshals every recorded entry as a `"name":value` member.
    fn emit_extra(&self, enc: &mut Encoder, opts: &Options) -> Result<(), Error>;
    /// Whether any unknown members have been recorded.
    fn is_empty(&self) -> bool;
}

impl<T: Marshal + Unmarshal> MapFallback for BTreeMap<String, T> {
    fn insert_unknown(&mut self, name: String, dec: &mut Decoder, opts: &Options) -> Result<(), Error> {
        let value = T::unmarshal(dec, opts)?;
        self.insert(name, value);
        Ok(())
    }

    fn emit_extra(&self, enc: &mut Encoder, opts: &Options) -> Result<(), Error> {
        if opts.has(Flags::DISCARD_UNKNOWN_MEMBERS) {
            return Ok(());
        }
        for (name, value) in self {
            enc.write_str(name)?;
            value.marshal(enc, opts)?;
        }
        Ok(())
    }

    fn is_empty(&self) -> bool {
        BTreeMap::is_empty(self)
    }
}

/// A raw-buffer fallback: unknown members are captured via
/// [`crate::bind::dynamic::capture_raw_value`] and appended to an
/// incrementally-built `"name":value` sequence. The buffer never carries
/// the enclosing `{`/`}` itself — [`RawFallback::emit_extra`] writes each
/// member through the encoder like any other field, so the surrounding
/// object delimiters are always supplied by the struct driver, not by this
/// buffer.
#[derive(Debug, Clone, Default)]
pub struct RawFallback {
    entries: Vec<(String, Vec<u8>)>,
}

impl RawFallback {
    /// Whether any unknown members have been captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Captures the raw bytes of the value following an unrecognized member
    /// name under `name`.
    pub fn insert_unknown(&mut self, name: String, dec: &mut Decoder, opts: &Options) -> Result<(), Error> {
        let raw = crate::bind::dynamic::capture_raw_value(dec, opts)?;
        self.entries.push((name, raw));
        Ok(())
    }

    /// Re-emits every captured member verbatim.
    pub fn emit_extra(&self, enc: &mut Encoder, opts: &Options) -> Result<(), Error> {
        if opts.has(Flags::DISCARD_UNKNOWN_MEMBERS) {
            return Ok(());
        }
        for (name, raw) in &self.entries {
            enc.write_str(name)?;
            enc.write_raw_value(raw)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{SliceSource, VecSink};

    #[test]
    fn map_fallback_collects_unknown_members() {
        let opts = Options::new();
        let mut src = SliceSource::new(b"1");
        let mut dec = Decoder::new(&mut src);
        let mut fallback: BTreeMap<String, i32> = BTreeMap::new();
        fallback.insert_unknown("extra".into(), &mut dec, &opts).unwrap();
        assert_eq!(fallback.get("extra"), Some(&1));
    }

    #[test]
    fn raw_fallback_round_trips_member() {
        let opts = Options::new();
        let mut src = SliceSource::new(br#"{"x":1}"#);
        let mut dec = Decoder::new(&mut src);
        let mut fallback = RawFallback::default();
        fallback.insert_unknown("extra".into(), &mut dec, &opts).unwrap();

        let mut sink = VecSink::default();
        {
            let mut enc = Encoder::new(&mut sink);
            enc.start_object().unwrap();
            fallback.emit_extra(&mut enc, &opts).unwrap();
            enc.end_object().unwrap();
        }
        assert_eq!(sink.0, br#"{"extra":{"x":1}}"#.to_vec());
    }

    #[test]
    fn discard_unknown_suppresses_emission() {
        let opts = Options::new().with_flag(Flags::DISCARD_UNKNOWN_MEMBERS);
        let mut fallback: BTreeMap<String, i32> = BTreeMap::new();
        fallback.insert("extra".into(), 1);
        let mut sink = VecSink::default();
        {
            let mut enc = Encoder::new(&mut sink);
            enc.start_object().unwrap();
            MapFallback::emit_extra(&fallback, &mut enc, &opts).unwrap();
            enc.end_object().unwrap();
        }
        assert_eq!(sink.0, b"{}".to_vec());
    }
}
