//! Value binding: the layer that turns a concrete Rust value into a stream
//! of encoder calls and back, standing in for a reflective marshal/unmarshal
//! dispatcher the way this crate's grammar machine stands in for a
//! stackful coroutine.
//!
//! Nothing resembling this exists in a plain streaming-tokenizer crate —
//! streaming tokens/events alone never bind to a target type — so there is
//! no per-module precedent to generalise here. Instead this
//! module (and its children) takes the dispatch *shape* described for a
//! reflective binder and replaces the reflection with ordinary Rust trait
//! dispatch: [`Marshal`]/[`Unmarshal`] are implemented once per concrete
//! type at compile time (mirroring how `serde::Serialize`/`Deserialize` are
//! implemented, since this crate has no derive macro to generate them), and
//! [`hooks::Marshaler`]/[`hooks::Unmarshaler`] provide the one genuinely
//! dynamic piece — user-registered custom behavior looked up by [`TypeId`]
//! at runtime, which is exactly the part that cannot be resolved at compile
//! time because the hook list lives in a runtime [`crate::options::Options`]
//! value.
//!
//! Dispatch order at the entry points ([`marshal`]/[`unmarshal`]) is: try
//! the user-supplied hook chain first, then the type's declared custom hook
//! (if any, wired up by the type itself choosing to implement [`Marshal`]
//! via one of the `hooks` adapters instead of a from-scratch impl), then
//! the default per-kind arshaler. Recursion into a value's own fields calls
//! the field type's [`Marshal`]/[`Unmarshal`] impl directly rather than
//! re-entering the top-level dispatch functions — the user hook chain is
//! therefore consulted once, at the outermost call, not at every nested
//! field. A struct wanting hooks to apply to one of its own fields calls
//! [`marshal`]/[`unmarshal`] explicitly for that field instead of using the
//! field's plain trait method; this is a deliberate scope limit of the
//! hand-written entry-point layer, recorded in `DESIGN.md`.

pub mod arshaler;
pub mod composite;
pub mod dynamic;
pub mod fallback;
pub mod hooks;
pub mod primitives;
pub mod structbind;

use core::any::{Any, TypeId};

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::Error;
use crate::options::Options;

/// Per-type default arshaler, marshal side. Implemented directly for every
/// type this crate knows how to emit; see `primitives.rs` and
/// `composite.rs` for the built-in implementations.
pub trait Marshal {
    /// Emits `self` as exactly one JSON value.
    fn marshal(&self, enc: &mut Encoder, opts: &Options) -> Result<(), Error>;
}

/// Per-type default arshaler, unmarshal side.
pub trait Unmarshal: Sized {
    /// Consumes exactly one JSON value and produces `Self`.
    fn unmarshal(dec: &mut Decoder, opts: &Options) -> Result<Self, Error>;
}

/// The entry-point marshal dispatch: user hook chain first, default
/// arshaler otherwise.
pub fn marshal<T: Marshal + Any>(value: &T, enc: &mut Encoder, opts: &Options) -> Result<(), Error> {
    if opts.marshalers.is_empty() {
        return value.marshal(enc, opts);
    }
    match hooks::try_user_marshalers(value, TypeId::of::<T>(), enc, opts)? {
        Some(()) => Ok(()),
        None => value.marshal(enc, opts),
    }
}

/// The entry-point unmarshal dispatch: user hook chain first, default
/// arshaler otherwise.
///
/// Consulting the hook chain requires an addressable slot to hand the hook
/// as `&mut dyn Any` — the same "addressability as scratch cell" idea used
/// throughout this layer — so `T` must be [`Default`] to seed that slot
/// before any hook runs.
pub fn unmarshal<T: Unmarshal + Default + Any>(dec: &mut Decoder, opts: &Options) -> Result<T, Error> {
    if opts.unmarshalers.is_empty() {
        return T::unmarshal(dec, opts);
    }
    let mut slot = T::default();
    if hooks::try_user_unmarshalers(&mut slot, TypeId::of::<T>(), dec, opts)? {
        return Ok(slot);
    }
    T::unmarshal(dec, opts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{SliceSource, VecSink};
    use hooks::{FnMarshaler, HookOutcome};
    use alloc::sync::Arc;

    #[test]
    fn marshal_falls_back_to_default_when_no_hooks_registered() {
        let opts = Options::new();
        let mut sink = VecSink::default();
        {
            let mut enc = Encoder::new(&mut sink);
            marshal(&7i32, &mut enc, &opts).unwrap();
        }
        assert_eq!(sink.0, b"7".to_vec());
    }

    #[test]
    fn marshal_prefers_registered_hook() {
        let hook: Arc<dyn hooks::Marshaler> = Arc::new(FnMarshaler::<i32, _>::new(|_v, enc, _opts| {
            enc.write_str("intercepted")?;
            Ok(HookOutcome::Handled)
        }));
        let opts = Options { marshalers: alloc::vec![hook], ..Options::new() };
        let mut sink = VecSink::default();
        {
            let mut enc = Encoder::new(&mut sink);
            marshal(&7i32, &mut enc, &opts).unwrap();
        }
        assert_eq!(sink.0, br#""intercepted""#.to_vec());
    }

    #[test]
    fn unmarshal_falls_back_to_default_when_no_hooks_registered() {
        let opts = Options::new();
        let mut src = SliceSource::new(b"42");
        let mut dec = Decoder::new(&mut src);
        let v: i32 = unmarshal(&mut dec, &opts).unwrap();
        assert_eq!(v, 42);
    }
}
