//! Custom-hook generations: the two wire-facing shapes a type may implement
//! instead of relying on its default per-kind arshaler, plus the
//! user-supplied hook chain's `skip` sentinel.
//!
//! Mirrors this crate's own options-carry-behavior convention — `Options`
//! already carries plain data payloads alongside bare flags; here the
//! payload is executable instead. There is no streaming precedent for a
//! value-binding hook specifically, since streaming tokens/events alone
//! have nothing to hook into.

use alloc::boxed::Box;
use core::any::{Any, TypeId};

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::Error;
use crate::options::Options;

/// What a hook invocation decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOutcome {
    /// The hook fully produced/consumed the value.
    Handled,
    /// Defer to the next hook in the chain, or the built-in default arshaler
    /// if none remain. Must be returned before any observable mutation of
    /// the encoder/decoder (peeking the next kind is fine; reading or
    /// writing a token is not).
    Skip,
}

/// A type-erased marshal hook, dispatched by [`TypeId`].
pub trait Marshaler: Send + Sync {
    /// The concrete type this hook claims.
    fn type_id(&self) -> TypeId;
    /// Attempts to marshal `value`, which is always of this hook's claimed type.
    fn marshal(&self, value: &dyn Any, enc: &mut Encoder, opts: &Options) -> Result<HookOutcome, Error>;
}

/// A type-erased unmarshal hook, dispatched by [`TypeId`].
pub trait Unmarshaler: Send + Sync {
    /// The concrete type this hook claims.
    fn type_id(&self) -> TypeId;
    /// Attempts to unmarshal into `value`, which is always of this hook's claimed type.
    fn unmarshal(&self, value: &mut dyn Any, dec: &mut Decoder, opts: &Options) -> Result<HookOutcome, Error>;
}

/// First-generation hook: produces/consumes a complete JSON value as an
/// in-memory byte buffer rather than streaming through an encoder/decoder.
pub trait MarshalerV1: 'static {
    /// Produces a complete, self-contained JSON value.
    fn marshal_v1(&self) -> Result<alloc::vec::Vec<u8>, Error>;
}

/// First-generation unmarshal counterpart of [`MarshalerV1`].
pub trait UnmarshalerV1: Sized + 'static {
    /// Parses a complete JSON value's raw bytes into `Self`.
    fn unmarshal_v1(bytes: &[u8]) -> Result<Self, Error>;
}

/// Second-generation hook: streams directly through the shared codec
/// machinery, so it must produce/consume exactly one JSON value (the
/// dispatcher enforces this by comparing grammar depth and top-frame
/// length before and after the call).
pub trait MarshalerV2: 'static {
    /// Streams `self` as exactly one JSON value through `enc`.
    fn marshal_v2(&self, enc: &mut Encoder, opts: &Options) -> Result<(), Error>;
}

/// Second-generation unmarshal counterpart of [`MarshalerV2`].
pub trait UnmarshalerV2: Sized + 'static {
    /// Consumes exactly one JSON value from `dec`.
    fn unmarshal_v2(dec: &mut Decoder, opts: &Options) -> Result<Self, Error>;
}

/// Adapter used when a type implements neither V1 nor V2: its value is
/// represented as a single JSON string.
pub trait MarshalerText: 'static {
    /// Renders `self` as the text to embed in a JSON string.
    fn marshal_text(&self) -> Result<alloc::string::String, Error>;
}

/// Text unmarshal counterpart of [`MarshalerText`].
pub trait UnmarshalerText: Sized + 'static {
    /// Parses `Self` from a JSON string's decoded text.
    fn unmarshal_text(text: &str) -> Result<Self, Error>;
}

/// Wraps a [`MarshalerV2`] implementation as a type-erased [`Marshaler`],
/// verifying it produced exactly one value by comparing encoder depth
/// before and after the call.
pub struct V2MarshalAdapter<T>(core::marker::PhantomData<T>);

impl<T> Default for V2MarshalAdapter<T> {
    fn default() -> Self {
        Self(core::marker::PhantomData)
    }
}

impl<T: MarshalerV2 + 'static> Marshaler for V2MarshalAdapter<T> {
    fn type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn marshal(&self, value: &dyn Any, enc: &mut Encoder, opts: &Options) -> Result<HookOutcome, Error> {
        let v = value
            .downcast_ref::<T>()
            .expect("dispatcher matched type_id before calling this hook");
        let before = enc.depth();
        v.marshal_v2(enc, opts)?;
        let after = enc.depth();
        if before != after {
            return Err(crate::error::SemanticError::new(
                crate::error::Action::Marshal,
                crate::error::SemanticDetail::HookArityViolation,
            )
            .into());
        }
        Ok(HookOutcome::Handled)
    }
}

/// Wraps a [`MarshalerV1`] implementation: the hook's bytes are validated as
/// one complete JSON value, then embedded verbatim.
pub struct V1MarshalAdapter<T>(core::marker::PhantomData<T>);

impl<T> Default for V1MarshalAdapter<T> {
    fn default() -> Self {
        Self(core::marker::PhantomData)
    }
}

impl<T: MarshalerV1 + 'static> Marshaler for V1MarshalAdapter<T> {
    fn type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn marshal(&self, value: &dyn Any, enc: &mut Encoder, _opts: &Options) -> Result<HookOutcome, Error> {
        let v = value
            .downcast_ref::<T>()
            .expect("dispatcher matched type_id before calling this hook");
        let bytes = v.marshal_v1()?;
        crate::raw::is_valid(&bytes)
            .then_some(())
            .ok_or_else(|| crate::error::SyntaxError::new(crate::error::SyntaxErrorKind::InvalidCharacter, 0))?;
        enc.write_raw_value(&bytes)?;
        Ok(HookOutcome::Handled)
    }
}

/// Wraps a [`MarshalerText`] implementation: the returned text is emitted as
/// a JSON string.
pub struct TextMarshalAdapter<T>(core::marker::PhantomData<T>);

impl<T> Default for TextMarshalAdapter<T> {
    fn default() -> Self {
        Self(core::marker::PhantomData)
    }
}

impl<T: MarshalerText + 'static> Marshaler for TextMarshalAdapter<T> {
    fn type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn marshal(&self, value: &dyn Any, enc: &mut Encoder, _opts: &Options) -> Result<HookOutcome, Error> {
        let v = value
            .downcast_ref::<T>()
            .expect("dispatcher matched type_id before calling this hook");
        let text = v.marshal_text()?;
        enc.write_str(&text)?;
        Ok(HookOutcome::Handled)
    }
}

/// A closure-based [`Marshaler`]/[`Unmarshaler`] pair for ad hoc
/// registration through [`crate::options::Options::marshalers`] without
/// defining a named adapter type.
pub struct FnMarshaler<T, F> {
    type_id: TypeId,
    f: F,
    _marker: core::marker::PhantomData<fn(&T)>,
}

impl<T: 'static, F> FnMarshaler<T, F>
where
    F: Fn(&T, &mut Encoder, &Options) -> Result<HookOutcome, Error> + Send + Sync,
{
    /// Wraps `f` as a hook claiming every value of type `T`.
    pub fn new(f: F) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            f,
            _marker: core::marker::PhantomData,
        }
    }
}

impl<T: 'static, F> Marshaler for FnMarshaler<T, F>
where
    F: Fn(&T, &mut Encoder, &Options) -> Result<HookOutcome, Error> + Send + Sync,
{
    fn type_id(&self) -> TypeId {
        self.type_id
    }

    fn marshal(&self, value: &dyn Any, enc: &mut Encoder, opts: &Options) -> Result<HookOutcome, Error> {
        let v = value
            .downcast_ref::<T>()
            .expect("dispatcher matched type_id before calling this hook");
        (self.f)(v, enc, opts)
    }
}

/// Wraps an [`UnmarshalerV2`] implementation as a type-erased [`Unmarshaler`].
pub struct V2UnmarshalAdapter<T>(core::marker::PhantomData<T>);

impl<T> Default for V2UnmarshalAdapter<T> {
    fn default() -> Self {
        Self(core::marker::PhantomData)
    }
}

impl<T: UnmarshalerV2 + 'static> Unmarshaler for V2UnmarshalAdapter<T> {
    fn type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn unmarshal(&self, value: &mut dyn Any, dec: &mut Decoder, opts: &Options) -> Result<HookOutcome, Error> {
        let slot = value
            .downcast_mut::<T>()
            .expect("dispatcher matched type_id before calling this hook");
        let before = dec.depth();
        let parsed = T::unmarshal_v2(dec, opts)?;
        let after = dec.depth();
        if before != after {
            return Err(crate::error::SemanticError::new(
                crate::error::Action::Unmarshal,
                crate::error::SemanticDetail::HookArityViolation,
            )
            .into());
        }
        *slot = parsed;
        Ok(HookOutcome::Handled)
    }
}

/// Wraps an [`UnmarshalerV1`] implementation: the next raw value's bytes are
/// captured and handed to the hook whole.
pub struct V1UnmarshalAdapter<T>(core::marker::PhantomData<T>);

impl<T> Default for V1UnmarshalAdapter<T> {
    fn default() -> Self {
        Self(core::marker::PhantomData)
    }
}

impl<T: UnmarshalerV1 + 'static> Unmarshaler for V1UnmarshalAdapter<T> {
    fn type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn unmarshal(&self, value: &mut dyn Any, dec: &mut Decoder, opts: &Options) -> Result<HookOutcome, Error> {
        let slot = value
            .downcast_mut::<T>()
            .expect("dispatcher matched type_id before calling this hook");
        let bytes = crate::bind::dynamic::capture_raw_value(dec, opts)?;
        *slot = T::unmarshal_v1(&bytes)?;
        Ok(HookOutcome::Handled)
    }
}

/// Wraps an [`UnmarshalerText`] implementation: the next token must be a
/// JSON string.
pub struct TextUnmarshalAdapter<T>(core::marker::PhantomData<T>);

impl<T> Default for TextUnmarshalAdapter<T> {
    fn default() -> Self {
        Self(core::marker::PhantomData)
    }
}

impl<T: UnmarshalerText + 'static> Unmarshaler for TextUnmarshalAdapter<T> {
    fn type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn unmarshal(&self, value: &mut dyn Any, dec: &mut Decoder, _opts: &Options) -> Result<HookOutcome, Error> {
        let slot = value
            .downcast_mut::<T>()
            .expect("dispatcher matched type_id before calling this hook");
        let tok = dec.read_token()?;
        let text = tok.as_str().ok_or_else(|| {
            crate::error::SemanticError::new(crate::error::Action::Unmarshal, crate::error::SemanticDetail::WrongKind)
                .with_kind(tok.kind())
        })?;
        *slot = T::unmarshal_text(text)?;
        Ok(HookOutcome::Handled)
    }
}

/// Runs the user-supplied marshal hook chain for `value`'s type, returning
/// `None` if no registered hook claimed it (so the caller falls back to the
/// built-in default arshaler).
pub fn try_user_marshalers(
    value: &dyn Any,
    type_id: TypeId,
    enc: &mut Encoder,
    opts: &Options,
) -> Result<Option<()>, Error> {
    for hook in &opts.marshalers {
        if hook.type_id() != type_id {
            continue;
        }
        match hook.marshal(value, enc, opts)? {
            HookOutcome::Handled => return Ok(Some(())),
            HookOutcome::Skip => continue,
        }
    }
    Ok(None)
}

/// Runs the user-supplied unmarshal hook chain for `value`'s type, returning
/// `false` if no registered hook claimed it.
pub fn try_user_unmarshalers(
    value: &mut dyn Any,
    type_id: TypeId,
    dec: &mut Decoder,
    opts: &Options,
) -> Result<bool, Error> {
    for hook in &opts.unmarshalers {
        if hook.type_id() != type_id {
            continue;
        }
        match hook.unmarshal(value, dec, opts)? {
            HookOutcome::Handled => return Ok(true),
            HookOutcome::Skip => continue,
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::VecSink;

    struct Celsius(f64);

    impl MarshalerText for Celsius {
        fn marshal_text(&self) -> Result<alloc::string::String, Error> {
            Ok(alloc::format!("{}C", self.0))
        }
    }

    #[test]
    fn text_adapter_emits_string() {
        let adapter = TextMarshalAdapter::<Celsius>::default();
        let mut sink = VecSink::default();
        let mut enc = Encoder::new(&mut sink);
        let opts = Options::new();
        let v = Celsius(36.6);
        let outcome = adapter.marshal(&v, &mut enc, &opts).unwrap();
        assert_eq!(outcome, HookOutcome::Handled);
        assert_eq!(sink.0, br#""36.6C""#.to_vec());
    }

    #[test]
    fn v1_adapter_embeds_validated_bytes() {
        struct Point;
        impl MarshalerV1 for Point {
            fn marshal_v1(&self) -> Result<alloc::vec::Vec<u8>, Error> {
                Ok(b"[1,2]".to_vec())
            }
        }
        let adapter = V1MarshalAdapter::<Point>::default();
        let mut sink = VecSink::default();
        let mut enc = Encoder::new(&mut sink);
        let opts = Options::new();
        adapter.marshal(&Point, &mut enc, &opts).unwrap();
        assert_eq!(sink.0, b"[1,2]".to_vec());
    }
}
