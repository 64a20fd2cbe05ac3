//! A streaming JSON codec core: a pull-style decoder and push-style
//! encoder sharing one grammar state machine, backed by resumable
//! byte-level scanners, plus a value-binding layer that dispatches
//! marshal/unmarshal by static type instead of runtime reflection.
//!
//! `#![no_std]` with `alloc`; `std` is pulled in explicitly only where a
//! byte `Read`/`Write` adapter or a piece of shared process-wide state (the
//! arshaler cache, the buffer pool) needs it.
#![no_std]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

extern crate alloc;
extern crate std;

pub mod bind;
pub mod buffer;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod grammar;
pub mod io;
pub mod kind;
pub mod namespace;
pub mod options;
pub mod pool;
pub mod raw;
pub mod scanner;
pub mod token;
pub mod value;

pub use bind::{Marshal, Unmarshal};
pub use decoder::Decoder;
pub use encoder::{Encoder, Indent};
pub use error::{Error, Result};
pub use options::{Flags, Options};
pub use token::Token;
pub use value::Value;

use alloc::vec::Vec;
use core::any::Any;

use io::{Sink, Source, SliceSource, VecSink};

fn encoder_for<'s>(sink: &'s mut dyn Sink, opts: &Options) -> Encoder<'s> {
    let indent = opts.indent.as_ref().map(|style| Indent {
        prefix: style.prefix.clone(),
        unit: style.indent.clone(),
    });
    Encoder::new(sink)
        .with_indent(indent)
        .with_html_escaping(opts.has(Flags::ESCAPE_FOR_HTML))
}

/// Marshals `value` to a freshly allocated byte buffer.
pub fn marshal<T: Marshal + Any>(value: &T, opts: &Options) -> Result<Vec<u8>> {
    let mut sink = VecSink::default();
    marshal_to(&mut sink, value, opts)?;
    Ok(sink.0)
}

/// Marshals `value` directly into `sink`.
pub fn marshal_to<T: Marshal + Any>(sink: &mut dyn Sink, value: &T, opts: &Options) -> Result<()> {
    let mut enc = encoder_for(sink, opts);
    marshal_encode(&mut enc, value, opts)
}

/// Marshals `value` through an already-constructed [`Encoder`] handle,
/// e.g. one interleaved with other hand-written writes.
pub fn marshal_encode<T: Marshal + Any>(enc: &mut Encoder<'_>, value: &T, opts: &Options) -> Result<()> {
    bind::marshal(value, enc, opts)
}

/// Unmarshals a complete value from `bytes`.
pub fn unmarshal<T: Unmarshal + Default + Any>(bytes: &[u8], opts: &Options) -> Result<T> {
    let mut src = SliceSource::new(bytes);
    unmarshal_from(&mut src, opts)
}

/// Unmarshals a complete value from `source`.
pub fn unmarshal_from<T: Unmarshal + Default + Any>(source: &mut dyn Source, opts: &Options) -> Result<T> {
    let mut dec = Decoder::new(source).with_options(
        opts.has(Flags::REJECT_DUPLICATE_NAMES),
        opts.has(Flags::ALLOW_INVALID_UTF8),
    );
    unmarshal_decode(&mut dec, opts)
}

/// Unmarshals a value through an already-constructed [`Decoder`] handle.
pub fn unmarshal_decode<T: Unmarshal + Default + Any>(dec: &mut Decoder<'_>, opts: &Options) -> Result<T> {
    bind::unmarshal(dec, opts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marshal_then_unmarshal_round_trips_a_struct_like_map() {
        use alloc::collections::BTreeMap;
        use alloc::string::String;

        let mut m: BTreeMap<String, i32> = BTreeMap::new();
        m.insert("a".into(), 1);
        m.insert("b".into(), 2);
        let opts = Options::new();
        let bytes = marshal(&m, &opts).unwrap();
        let back: BTreeMap<String, i32> = unmarshal(&bytes, &opts).unwrap();
        assert_eq!(m, back);
    }

    #[test]
    fn marshal_to_honors_expand_indent() {
        let opts = Options::new().expand(alloc::string::String::new(), "  ");
        let bytes = marshal(&7i32, &opts).unwrap();
        assert_eq!(bytes, b"7".to_vec());
    }
}
