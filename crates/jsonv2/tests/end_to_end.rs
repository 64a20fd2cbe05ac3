//! End-to-end scenarios spanning the grammar machine, the decoder/encoder,
//! raw-value canonicalization, and the value-binding layer together, as
//! opposed to the unit tests living alongside each module that exercise one
//! piece in isolation.

use jsonv2::io::{SliceSource, VecSink};
use jsonv2::kind::Kind;
use jsonv2::{raw, Decoder, Encoder, Flags, Options};

fn token_kinds(input: &[u8]) -> Vec<Kind> {
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

/// A mixed stream of every scalar/bracket kind, read token by token.
#[test]
fn mixed_stream_yields_expected_token_sequence() {
    let input = br#"{"a":1,"b":[true,false,null,"x"]}"#;
    let kinds = token_kinds(input);
    assert_eq!(
        kinds,
        vec![
            Kind::ObjectStart,
            Kind::String, // "a"
            Kind::Number, // 1
            Kind::String, // "b"
            Kind::ArrayStart,
            Kind::True,
            Kind::False,
            Kind::Null,
            Kind::String, // "x"
            Kind::ArrayEnd,
            Kind::ObjectEnd,
        ]
    );
}

/// With case-insensitive matching off (the default — `nocase` is opt-in per
/// field), a struct-style lookup only resolves an exact-case member name.
/// Exercised here directly against `StructLayout`, the piece that owns this
/// policy.
#[test]
fn case_insensitive_matching_is_off_by_default() {
    use jsonv2::bind::structbind::StructLayout;

    let layout = StructLayout::build(&[("Name", "")]).unwrap();
    assert_eq!(layout.resolve("Name"), Some(0));
    assert_eq!(layout.resolve("name"), None);

    let nocase = StructLayout::build(&[("Name", "nocase")]).unwrap();
    assert_eq!(nocase.resolve("Name"), Some(0));
    assert_eq!(nocase.resolve("name"), Some(0));
}

/// Byte slices marshal as standard, padded base64.
#[test]
fn bytes_round_trip_through_base64() {
    use jsonv2::Marshal;

    let bytes: Vec<u8> = vec![0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef];
    let mut sink = VecSink::default();
    {
        let mut enc = Encoder::new(&mut sink);
        bytes.marshal(&mut enc, &Options::new()).unwrap();
    }
    assert_eq!(sink.0, br#""ASNFZ4mrze8=""#.to_vec());
}

/// RFC 8785 canonicalization: Unicode-escaped member names are unescaped,
/// then ordered by ascending UTF-16 code-unit value of the unescaped name.
#[test]
fn canonicalize_orders_members_by_utf16_code_unit() {
    let input = br#"{"\u20ac":"E","\r":"C","1":"O"}"#;
    let out = raw::canonicalize(input).unwrap();
    assert_eq!(out, "{\"\\r\":\"C\",\"1\":\"O\",\"\u{20ac}\":\"E\"}".as_bytes());
}

/// A number split across a truncated first chunk (`1.23e`) and its
/// continuation (`10`) produces the same token as if it had arrived whole.
#[test]
fn resumable_number_spans_a_chunk_boundary() {
    struct Chunks(Vec<&'static [u8]>);
    impl jsonv2::io::Source for Chunks {
        fn fill(&mut self, buf: &mut [u8]) -> jsonv2::Result<usize> {
            if self.0.is_empty() {
                return Ok(0);
            }
            let chunk = self.0.remove(0);
            buf[..chunk.len()].copy_from_slice(chunk);
            Ok(chunk.len())
        }
    }

    let mut src = Chunks(vec![b"1.23e", b"10"]);
    let mut dec = Decoder::new(&mut src);
    let tok = dec.read_token().unwrap();
    assert_eq!(tok.kind(), Kind::Number);
    assert_eq!(tok.number_text().unwrap(), "1.23e10");
}

/// A duplicate object member name is rejected only when
/// `REJECT_DUPLICATE_NAMES` is set; otherwise the later occurrence simply
/// wins, matching plain JSON's "last value wins" convention.
#[test]
fn duplicate_member_name_rejected_only_when_flagged() {
    let input = br#"{"a":1,"a":2}"#;

    let mut src = SliceSource::new(input);
    let mut dec = Decoder::new(&mut src);
    loop {
        match dec.read_token() {
            Ok(_) => {}
            Err(e) if e.is_eof() => break,
            Err(e) => panic!("unexpected error without the flag set: {e:?}"),
        }
    }

    let mut src = SliceSource::new(input);
    let mut dec = Decoder::new(&mut src).with_options(true, false);
    let mut saw_error = false;
    loop {
        match dec.read_token() {
            Ok(_) => {}
            Err(e) if e.is_eof() => break,
            Err(_) => {
                saw_error = true;
                break;
            }
        }
    }
    assert!(saw_error, "expected a duplicate-name error once REJECT_DUPLICATE_NAMES is in effect");
}

/// `FORMAT_NIL_SLICE_NULL` swaps an empty slice's emission from `[]` to
/// `null`; unset, the default is `[]`.
#[test]
fn nil_slice_policy_controls_empty_array_emission() {
    use jsonv2::Marshal;

    let empty: Vec<i32> = Vec::new();

    let mut sink = VecSink::default();
    {
        let mut enc = Encoder::new(&mut sink);
        empty.marshal(&mut enc, &Options::new()).unwrap();
    }
    assert_eq!(sink.0, b"[]".to_vec());

    let mut sink = VecSink::default();
    {
        let mut enc = Encoder::new(&mut sink);
        empty
            .marshal(&mut enc, &Options::new().with_flag(Flags::FORMAT_NIL_SLICE_NULL))
            .unwrap();
    }
    assert_eq!(sink.0, b"null".to_vec());
}

/// A registered hook intercepts marshal before the type's own default
/// arshaler runs — Rust has no Go-style non-addressable-receiver distinction,
/// so this stands in for that scenario's "a hook still applies" guarantee.
#[test]
fn registered_hook_is_consulted_before_the_default_arshaler() {
    use jsonv2::bind::hooks::{FnMarshaler, HookOutcome, Marshaler};
    use std::sync::Arc;

    let hook: Arc<dyn Marshaler> = Arc::new(FnMarshaler::<i32, _>::new(|v, enc, _opts| {
        enc.write_str(&format!("v{v}"))?;
        Ok(HookOutcome::Handled)
    }));
    let opts = Options {
        marshalers: vec![hook],
        ..Options::new()
    };
    let mut sink = VecSink::default();
    {
        let mut enc = Encoder::new(&mut sink);
        jsonv2::bind::marshal(&99i32, &mut enc, &opts).unwrap();
    }
    assert_eq!(sink.0, br#""v99""#.to_vec());
}
