//! The `any`/[`crate::value::Value`] fast path: marshal switches on the
//! concrete variant directly instead of going through the per-kind
//! dispatcher a second time; unmarshal peeks the next token's kind to pick
//! the variant to build.
//!
//! Grounded on [`crate::value::Value`]'s own variant shape (see its module
//! doc) and on this crate's `peek_kind` (`decoder.rs`) for the dispatch
//! itself.

use alloc::string::String;
use alloc::vec::Vec;

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{Action, Error, SemanticDetail, SemanticError};
use crate::io::VecSink;
use crate::kind::Kind;
use crate::options::Options;
use crate::value::Value;

/// Marshals `value` via [`Encoder::write_value`] — the concrete-kind switch
/// described as the `any` fast path is exactly what that method already
/// does.
pub fn marshal_value(value: &Value, enc: &mut Encoder, _opts: &Options) -> Result<(), Error> {
    enc.write_value(value)
}

/// Unmarshals the next JSON value into a [`Value`], selecting the variant
/// from the upcoming token's kind: `f`/`t` → bool, `"` → string, `0` →
/// number, `{` → object, `[` → array, `n` → null.
pub fn unmarshal_value(dec: &mut Decoder, opts: &Options) -> Result<Value, Error> {
    match dec.peek_kind() {
        Kind::Null => {
            dec.read_token()?;
            Ok(Value::Null)
        }
        Kind::True | Kind::False => {
            let tok = dec.read_token()?;
            Ok(Value::Bool(tok.as_bool().expect("kind is True/False")))
        }
        Kind::String => {
            let tok = dec.read_token()?;
            Ok(Value::String(tok.as_str().expect("kind is String").into()))
        }
        Kind::Number => {
            let tok = dec.read_token()?;
            Ok(Value::Number(tok.as_f64().expect("kind is Number")))
        }
        Kind::ArrayStart => {
            dec.read_token()?;
            let mut items = Vec::new();
            loop {
                if dec.peek_kind() == Kind::ArrayEnd {
                    dec.read_token()?;
                    break;
                }
                items.push(unmarshal_value(dec, opts)?);
            }
            Ok(Value::Array(items))
        }
        Kind::ObjectStart => {
            dec.read_token()?;
            let mut map = crate::value::Map::new();
            loop {
                if dec.peek_kind() == Kind::ObjectEnd {
                    dec.read_token()?;
                    break;
                }
                let name_tok = dec.read_token()?;
                let name: String = name_tok.as_str().expect("object member name is a string").into();
                let value = unmarshal_value(dec, opts)?;
                map.insert(name, value);
            }
            Ok(Value::Object(map))
        }
        Kind::ObjectEnd | Kind::ArrayEnd | Kind::Invalid => {
            // Let `read_token` surface the precise syntax error.
            dec.read_token()?;
            Err(SemanticError::new(Action::Unmarshal, SemanticDetail::WrongKind).into())
        }
    }
}

/// Captures the next complete value's bytes by decoding it dynamically and
/// re-serializing in compact form. Used by [`crate::bind::hooks`]'s V1
/// unmarshal adapter and by raw-value struct fallback members.
///
/// This does not reproduce the original source bytes verbatim (whitespace
/// and non-canonical number text are not preserved) — the decode buffer
/// does not expose a stable contiguous span across a value that spans
/// multiple internal `fetch` calls, so a round-trip through [`Value`] is
/// used instead. Byte-identical capture is a possible future extension, not
/// a behavior this adapter currently promises.
pub fn capture_raw_value(dec: &mut Decoder, opts: &Options) -> Result<Vec<u8>, Error> {
    let value = unmarshal_value(dec, opts)?;
    let mut sink = VecSink::default();
    {
        let mut enc = Encoder::new(&mut sink);
        enc.write_value(&value)?;
    }
    Ok(sink.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::SliceSource;

    #[test]
    fn unmarshals_mixed_object() {
        let mut src = SliceSource::new(br#"{"a":1,"b":[true,null,"x"]}"#);
        let mut dec = Decoder::new(&mut src);
        let opts = Options::new();
        let v = unmarshal_value(&mut dec, &opts).unwrap();
        let obj = v.as_object().unwrap();
        assert_eq!(obj.get("a").unwrap().as_f64(), Some(1.0));
        assert_eq!(obj.get("b").unwrap().as_array().unwrap().len(), 3);
    }

    #[test]
    fn marshal_round_trips_through_encoder() {
        let mut src = SliceSource::new(b"[1,2,3]");
        let mut dec = Decoder::new(&mut src);
        let opts = Options::new();
        let v = unmarshal_value(&mut dec, &opts).unwrap();
        let mut sink = VecSink::default();
        {
            let mut enc = Encoder::new(&mut sink);
            marshal_value(&v, &mut enc, &opts).unwrap();
        }
        assert_eq!(sink.0, b"[1,2,3]".to_vec());
    }
}
