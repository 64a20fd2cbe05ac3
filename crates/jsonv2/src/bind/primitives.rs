//! Default arshalers for JSON-native scalar kinds: bool, string, the integer
//! family, float, and byte sequences (base64).
//!
//! The streaming calls themselves are the same `Encoder`/`Decoder` methods
//! `encoder.rs`'s own tests already exercise, so no new wire-level behavior
//! is introduced here — this module is purely the glue between Rust's
//! primitive types and those methods.

use alloc::string::String;
use alloc::vec::Vec;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{Action, Error, SemanticDetail, SemanticError};
use crate::kind::Kind;
use crate::options::Flags;
use crate::options::Options;
use crate::scanner::number::parse_float;

use super::{Marshal, Unmarshal};

fn wrong_kind(action: Action, kind: Kind) -> Error {
    SemanticError::new(action, SemanticDetail::WrongKind)
        .with_kind(kind)
        .into()
}

impl Marshal for bool {
    fn marshal(&self, enc: &mut Encoder, _opts: &Options) -> Result<(), Error> {
        enc.write_bool(*self)
    }
}

impl Unmarshal for bool {
    fn unmarshal(dec: &mut Decoder, _opts: &Options) -> Result<Self, Error> {
        let tok = dec.read_token()?;
        match tok.kind() {
            Kind::Null => Ok(false),
            Kind::True | Kind::False => Ok(tok.as_bool().expect("kind is True/False")),
            k => Err(wrong_kind(Action::Unmarshal, k)),
        }
    }
}

impl Marshal for String {
    fn marshal(&self, enc: &mut Encoder, _opts: &Options) -> Result<(), Error> {
        enc.write_str(self)
    }
}

impl Marshal for str {
    fn marshal(&self, enc: &mut Encoder, _opts: &Options) -> Result<(), Error> {
        enc.write_str(self)
    }
}

impl Unmarshal for String {
    fn unmarshal(dec: &mut Decoder, _opts: &Options) -> Result<Self, Error> {
        let tok = dec.read_token()?;
        match tok.kind() {
            Kind::Null => Ok(String::new()),
            Kind::String => Ok(tok.as_str().expect("kind is String").into()),
            k => Err(wrong_kind(Action::Unmarshal, k)),
        }
    }
}

impl Marshal for f64 {
    fn marshal(&self, enc: &mut Encoder, opts: &Options) -> Result<(), Error> {
        if !self.is_finite() {
            return Err(SemanticError::new(Action::Marshal, SemanticDetail::NonFiniteFloat).into());
        }
        if opts.has(Flags::STRINGIFY_NUMBERS) {
            let mut text = String::new();
            crate::scanner::append_float(&mut text, *self);
            enc.write_str(&text)
        } else {
            enc.write_f64(*self)
        }
    }
}

impl Unmarshal for f64 {
    fn unmarshal(dec: &mut Decoder, _opts: &Options) -> Result<Self, Error> {
        let tok = dec.read_token()?;
        match tok.kind() {
            Kind::Null => Ok(0.0),
            Kind::Number => Ok(tok.as_f64().expect("kind is Number")),
            Kind::String => Ok(parse_float(tok.as_str().expect("kind is String"))),
            k => Err(wrong_kind(Action::Unmarshal, k)),
        }
    }
}

/// `f64::marshal` with a field's `format:nonfinite` override applied: when
/// `nonfinite` is set, NaN/+Inf/-Inf are written as the literal strings
/// `"NaN"`/`"Infinity"`/`"-Infinity"` instead of being rejected. Not part of
/// the blanket `impl Marshal for f64` since only a struct field carries the
/// tag that grants this override; callers reach it through their own
/// hand-written field marshaling.
pub fn marshal_f64_with_format(value: f64, enc: &mut Encoder, opts: &Options, nonfinite: bool) -> Result<(), Error> {
    if value.is_finite() || !nonfinite {
        return value.marshal(enc, opts);
    }
    enc.write_str(if value.is_nan() {
        "NaN"
    } else if value > 0.0 {
        "Infinity"
    } else {
        "-Infinity"
    })
}

/// The unmarshal counterpart of [`marshal_f64_with_format`]: recognises the
/// same three literal strings before falling back to ordinary float parsing.
pub fn unmarshal_f64_with_format(dec: &mut Decoder, opts: &Options, nonfinite: bool) -> Result<f64, Error> {
    if !nonfinite || dec.peek_kind() != Kind::String {
        return f64::unmarshal(dec, opts);
    }
    let tok = dec.read_token()?;
    let text = tok.as_str().expect("kind is String");
    match text {
        "NaN" => Ok(f64::NAN),
        "Infinity" => Ok(f64::INFINITY),
        "-Infinity" => Ok(f64::NEG_INFINITY),
        other => Ok(parse_float(other)),
    }
}

impl Marshal for f32 {
    fn marshal(&self, enc: &mut Encoder, opts: &Options) -> Result<(), Error> {
        f64::from(*self).marshal(enc, opts)
    }
}

impl Unmarshal for f32 {
    fn unmarshal(dec: &mut Decoder, opts: &Options) -> Result<Self, Error> {
        let v = f64::unmarshal(dec, opts)?;
        Ok(if v.is_finite() {
            v as f32
        } else if v.is_sign_negative() {
            f32::MIN
        } else {
            f32::MAX
        })
    }
}

fn parse_integer_text(text: &str) -> Result<i128, Error> {
    if let Ok(v) = text.parse::<i128>() {
        return Ok(v);
    }
    let f = parse_float(text);
    if f.is_finite() && f.fract() == 0.0 {
        return Ok(f as i128);
    }
    Err(SemanticError::new(Action::Unmarshal, SemanticDetail::Overflow).into())
}

macro_rules! impl_signed {
    ($($t:ty),+ $(,)?) => {$(
        impl Marshal for $t {
            fn marshal(&self, enc: &mut Encoder, opts: &Options) -> Result<(), Error> {
                if opts.has(Flags::STRINGIFY_NUMBERS) {
                    enc.write_str(&alloc::format!("{self}"))
                } else {
                    enc.write_number_raw(&alloc::format!("{self}"))
                }
            }
        }

        impl Unmarshal for $t {
            fn unmarshal(dec: &mut Decoder, _opts: &Options) -> Result<Self, Error> {
                let tok = dec.read_token()?;
                let text = match tok.kind() {
                    Kind::Null => return Ok(0),
                    Kind::Number => tok.number_text().expect("kind is Number").into(),
                    Kind::String => alloc::string::String::from(tok.as_str().expect("kind is String")),
                    k => return Err(wrong_kind(Action::Unmarshal, k)),
                };
                let wide = parse_integer_text(&text)?;
                <$t>::try_from(wide)
                    .map_err(|_| SemanticError::new(Action::Unmarshal, SemanticDetail::Overflow).into())
            }
        }
    )+};
}

macro_rules! impl_unsigned {
    ($($t:ty),+ $(,)?) => {$(
        impl Marshal for $t {
            fn marshal(&self, enc: &mut Encoder, opts: &Options) -> Result<(), Error> {
                if opts.has(Flags::STRINGIFY_NUMBERS) {
                    enc.write_str(&alloc::format!("{self}"))
                } else {
                    enc.write_number_raw(&alloc::format!("{self}"))
                }
            }
        }

        impl Unmarshal for $t {
            fn unmarshal(dec: &mut Decoder, _opts: &Options) -> Result<Self, Error> {
                let tok = dec.read_token()?;
                let text = match tok.kind() {
                    Kind::Null => return Ok(0),
                    Kind::Number => tok.number_text().expect("kind is Number").into(),
                    Kind::String => alloc::string::String::from(tok.as_str().expect("kind is String")),
                    k => return Err(wrong_kind(Action::Unmarshal, k)),
                };
                if let Some(rest) = text.strip_prefix('-') {
                    if rest.chars().all(|c| c == '0') {
                        return Ok(0);
                    }
                    return Err(SemanticError::new(Action::Unmarshal, SemanticDetail::Overflow).into());
                }
                let wide = parse_integer_text(&text)?;
                u128::try_from(wide)
                    .ok()
                    .and_then(|w| <$t>::try_from(w).ok())
                    .ok_or_else(|| SemanticError::new(Action::Unmarshal, SemanticDetail::Overflow).into())
            }
        }
    )+};
}

impl_signed!(i8, i16, i32, i64, i128, isize);
impl_unsigned!(u8, u16, u32, u64, u128, usize);

/// Byte sequences marshal as base64 (standard alphabet, padded); parse
/// strips padding via the `base64` crate's own decoder and errors with
/// [`SemanticDetail::Base64`] on invalid input.
impl Marshal for Vec<u8> {
    fn marshal(&self, enc: &mut Encoder, _opts: &Options) -> Result<(), Error> {
        enc.write_str(&BASE64.encode(self))
    }
}

impl Unmarshal for Vec<u8> {
    fn unmarshal(dec: &mut Decoder, _opts: &Options) -> Result<Self, Error> {
        let tok = dec.read_token()?;
        match tok.kind() {
            Kind::Null => Ok(Vec::new()),
            Kind::String => BASE64
                .decode(tok.as_str().expect("kind is String"))
                .map_err(|_| SemanticError::new(Action::Unmarshal, SemanticDetail::Base64).into()),
            k => Err(wrong_kind(Action::Unmarshal, k)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{SliceSource, VecSink};

    fn marshal_to_string<T: Marshal>(v: &T, opts: &Options) -> String {
        let mut sink = VecSink::default();
        {
            let mut enc = Encoder::new(&mut sink);
            v.marshal(&mut enc, opts).unwrap();
        }
        String::from_utf8(sink.0).unwrap()
    }

    fn unmarshal_from<T: Unmarshal>(bytes: &[u8], opts: &Options) -> Result<T, Error> {
        let mut src = SliceSource::new(bytes);
        let mut dec = Decoder::new(&mut src);
        T::unmarshal(&mut dec, opts)
    }

    #[test]
    fn bool_null_unmarshals_false() {
        let opts = Options::new();
        assert_eq!(unmarshal_from::<bool>(b"null", &opts).unwrap(), false);
    }

    #[test]
    fn i32_round_trips() {
        let opts = Options::new();
        assert_eq!(marshal_to_string(&-42i32, &opts), "-42");
        assert_eq!(unmarshal_from::<i32>(b"-42", &opts).unwrap(), -42);
    }

    #[test]
    fn u8_overflow_is_rejected() {
        let opts = Options::new();
        assert!(unmarshal_from::<u8>(b"256", &opts).is_err());
    }

    #[test]
    fn stringify_numbers_quotes_integers() {
        let opts = Options::new().with_flag(Flags::STRINGIFY_NUMBERS);
        assert_eq!(marshal_to_string(&7i32, &opts), r#""7""#);
        assert_eq!(unmarshal_from::<i32>(br#""7""#, &opts).unwrap(), 7);
    }

    #[test]
    fn base64_round_trips_bytes() {
        let opts = Options::new();
        let bytes: Vec<u8> = alloc::vec![0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef];
        let s = marshal_to_string(&bytes, &opts);
        assert_eq!(s, r#""ASNFZ4mrze8=""#);
        assert_eq!(unmarshal_from::<Vec<u8>>(s.as_bytes(), &opts).unwrap(), bytes);
    }

    #[test]
    fn non_finite_float_rejected_on_marshal() {
        let opts = Options::new();
        let mut sink = VecSink::default();
        let mut enc = Encoder::new(&mut sink);
        assert!(f64::NAN.marshal(&mut enc, &opts).is_err());
    }

    #[test]
    fn nonfinite_format_token_round_trips_non_finite_floats() {
        let opts = Options::new();
        for (value, text) in [
            (f64::NAN, r#""NaN""#),
            (f64::INFINITY, r#""Infinity""#),
            (f64::NEG_INFINITY, r#""-Infinity""#),
        ] {
            let mut sink = VecSink::default();
            {
                let mut enc = Encoder::new(&mut sink);
                marshal_f64_with_format(value, &mut enc, &opts, true).unwrap();
            }
            assert_eq!(String::from_utf8(sink.0).unwrap(), text);

            let mut src = SliceSource::new(text.as_bytes());
            let mut dec = Decoder::new(&mut src);
            let back = unmarshal_f64_with_format(&mut dec, &opts, true).unwrap();
            if value.is_nan() {
                assert!(back.is_nan());
            } else {
                assert_eq!(back, value);
            }
        }
    }

    #[test]
    fn nonfinite_format_token_off_still_rejects_non_finite_floats() {
        let opts = Options::new();
        let mut sink = VecSink::default();
        let mut enc = Encoder::new(&mut sink);
        assert!(marshal_f64_with_format(f64::NAN, &mut enc, &opts, false).is_err());
    }
}
