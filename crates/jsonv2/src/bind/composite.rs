//! Default arshalers for compound shapes: optionals, sequences, maps, and
//! pointer-likes (`Box`/`Rc`/`Arc`), plus the pointer-cycle guard described
//! for self-referential graphs.
//!
//! There is no streaming precedent for any of this (plain token/event
//! streaming never binds to a target type), so each shape is implemented
//! directly on top of this crate's own `Encoder`/`Decoder` primitives.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{Action, Error, SemanticDetail, SemanticError};
use crate::kind::Kind;
use crate::options::{Flags, Options};

use super::{Marshal, Unmarshal};

impl<T: Marshal> Marshal for Option<T> {
    fn marshal(&self, enc: &mut Encoder, opts: &Options) -> Result<(), Error> {
        match self {
            Some(v) => v.marshal(enc, opts),
            None => enc.write_null(),
        }
    }
}

impl<T: Unmarshal> Unmarshal for Option<T> {
    fn unmarshal(dec: &mut Decoder, opts: &Options) -> Result<Self, Error> {
        if dec.peek_kind() == Kind::Null {
            dec.read_token()?;
            return Ok(None);
        }
        Ok(Some(T::unmarshal(dec, opts)?))
    }
}

impl<T: Marshal> Marshal for Vec<T> {
    fn marshal(&self, enc: &mut Encoder, opts: &Options) -> Result<(), Error> {
        if self.is_empty() && opts.has(Flags::FORMAT_NIL_SLICE_NULL) {
            return enc.write_null();
        }
        enc.start_array()?;
        for item in self {
            item.marshal(enc, opts)?;
        }
        enc.end_array()
    }
}

impl<T: Unmarshal> Unmarshal for Vec<T> {
    fn unmarshal(dec: &mut Decoder, opts: &Options) -> Result<Self, Error> {
        if dec.peek_kind() == Kind::Null {
            dec.read_token()?;
            return Ok(Vec::new());
        }
        let open = dec.read_token()?;
        if open.kind() != Kind::ArrayStart {
            return Err(SemanticError::new(Action::Unmarshal, SemanticDetail::WrongKind)
                .with_kind(open.kind())
                .into());
        }
        let mut out = Vec::new();
        loop {
            if dec.peek_kind() == Kind::ArrayEnd {
                dec.read_token()?;
                return Ok(out);
            }
            out.push(T::unmarshal(dec, opts)?);
        }
    }
}

/// Fixed-size arrays reject over/underflow rather than silently truncating
/// or padding.
impl<T: Marshal, const N: usize> Marshal for [T; N] {
    fn marshal(&self, enc: &mut Encoder, opts: &Options) -> Result<(), Error> {
        enc.start_array()?;
        for item in self {
            item.marshal(enc, opts)?;
        }
        enc.end_array()
    }
}

impl<T: Unmarshal + Default + Copy, const N: usize> Unmarshal for [T; N] {
    fn unmarshal(dec: &mut Decoder, opts: &Options) -> Result<Self, Error> {
        let open = dec.read_token()?;
        if open.kind() != Kind::ArrayStart {
            return Err(SemanticError::new(Action::Unmarshal, SemanticDetail::WrongKind)
                .with_kind(open.kind())
                .into());
        }
        let mut out = [T::default(); N];
        for slot in out.iter_mut() {
            if dec.peek_kind() == Kind::ArrayEnd {
                return Err(SemanticError::new(Action::Unmarshal, SemanticDetail::WrongKind).into());
            }
            *slot = T::unmarshal(dec, opts)?;
        }
        let close = dec.read_token()?;
        if close.kind() != Kind::ArrayEnd {
            return Err(SemanticError::new(Action::Unmarshal, SemanticDetail::WrongKind)
                .with_kind(close.kind())
                .into());
        }
        Ok(out)
    }
}

/// String-keyed maps: keys are always emitted as JSON strings (the key
/// arshaler runs with `stringify_numbers` conceptually forced on, which for
/// `String` keys is a no-op). Emission order follows insertion unless
/// [`Flags::DETERMINISTIC`] is set, in which case keys are sorted — which
/// `BTreeMap`'s iteration order already guarantees, so the flag is honored
/// for free here.
impl<T: Marshal> Marshal for BTreeMap<String, T> {
    fn marshal(&self, enc: &mut Encoder, opts: &Options) -> Result<(), Error> {
        if self.is_empty() && opts.has(Flags::FORMAT_NIL_MAP_NULL) {
            return enc.write_null();
        }
        enc.start_object()?;
        for (k, v) in self {
            enc.write_str(k)?;
            v.marshal(enc, opts)?;
        }
        enc.end_object()
    }
}

impl<T: Unmarshal> Unmarshal for BTreeMap<String, T> {
    fn unmarshal(dec: &mut Decoder, opts: &Options) -> Result<Self, Error> {
        if dec.peek_kind() == Kind::Null {
            dec.read_token()?;
            return Ok(BTreeMap::new());
        }
        let open = dec.read_token()?;
        if open.kind() != Kind::ObjectStart {
            return Err(SemanticError::new(Action::Unmarshal, SemanticDetail::WrongKind)
                .with_kind(open.kind())
                .into());
        }
        let mut out = BTreeMap::new();
        loop {
            if dec.peek_kind() == Kind::ObjectEnd {
                dec.read_token()?;
                return Ok(out);
            }
            let name = dec.read_token()?;
            let key: String = name.as_str().expect("object member name is a string").into();
            let value = T::unmarshal(dec, opts)?;
            out.insert(key, value);
        }
    }
}

impl<T: Marshal> Marshal for Box<T> {
    fn marshal(&self, enc: &mut Encoder, opts: &Options) -> Result<(), Error> {
        (**self).marshal(enc, opts)
    }
}

impl<T: Unmarshal> Unmarshal for Box<T> {
    fn unmarshal(dec: &mut Decoder, opts: &Options) -> Result<Self, Error> {
        Ok(Box::new(T::unmarshal(dec, opts)?))
    }
}

/// A guard against infinite recursion through self-referential pointer
/// graphs (`Rc<RefCell<_>>`-style cycles), keyed on pointer identity. Cheap
/// below [`CycleGuard::THRESHOLD_DEPTH`]: the visited set is only consulted
/// once recursion passes that depth, so shallow acyclic values never pay
/// for the check.
pub struct CycleGuard;

impl CycleGuard {
    const THRESHOLD_DEPTH: usize = 32;

    /// Enters `addr`, returning an error if it is already being visited at
    /// or beyond the threshold depth, and a drop guard that removes it on
    /// unwind otherwise.
    pub fn enter(addr: usize) -> Result<Option<CycleGuardToken>, Error> {
        VISITING.with(|cell| {
            let mut stack = cell.borrow_mut();
            if stack.len() < Self::THRESHOLD_DEPTH {
                stack.push(addr);
                return Ok(Some(CycleGuardToken { addr, tracked: false }));
            }
            if stack.contains(&addr) {
                return Err(SemanticError::new(Action::Marshal, SemanticDetail::WrongKind).into());
            }
            stack.push(addr);
            Ok(Some(CycleGuardToken { addr, tracked: true }))
        })
    }
}

std::thread_local! {
    static VISITING: core::cell::RefCell<Vec<usize>> = const { core::cell::RefCell::new(Vec::new()) };
}

/// Drop guard returned by [`CycleGuard::enter`]; removes its address from
/// the visited set on drop (including on unwind).
pub struct CycleGuardToken {
    addr: usize,
    tracked: bool,
}

impl Drop for CycleGuardToken {
    fn drop(&mut self) {
        let _ = self.tracked;
        VISITING.with(|cell| {
            let mut stack = cell.borrow_mut();
            if let Some(pos) = stack.iter().rposition(|&a| a == self.addr) {
                stack.remove(pos);
            }
        });
    }
}

impl<T: Marshal> Marshal for Rc<T> {
    fn marshal(&self, enc: &mut Encoder, opts: &Options) -> Result<(), Error> {
        let addr = Rc::as_ptr(self) as usize;
        let _guard = CycleGuard::enter(addr)?;
        (**self).marshal(enc, opts)
    }
}

impl<T: Unmarshal> Unmarshal for Rc<T> {
    fn unmarshal(dec: &mut Decoder, opts: &Options) -> Result<Self, Error> {
        Ok(Rc::new(T::unmarshal(dec, opts)?))
    }
}

impl<T: Marshal> Marshal for Arc<T> {
    fn marshal(&self, enc: &mut Encoder, opts: &Options) -> Result<(), Error> {
        let addr = Arc::as_ptr(self) as usize;
        let _guard = CycleGuard::enter(addr)?;
        (**self).marshal(enc, opts)
    }
}

impl<T: Unmarshal> Unmarshal for Arc<T> {
    fn unmarshal(dec: &mut Decoder, opts: &Options) -> Result<Self, Error> {
        Ok(Arc::new(T::unmarshal(dec, opts)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{SliceSource, VecSink};

    fn roundtrip<T: Marshal + Unmarshal + PartialEq + core::fmt::Debug>(v: &T, opts: &Options) {
        let mut sink = VecSink::default();
        {
            let mut enc = Encoder::new(&mut sink);
            v.marshal(&mut enc, opts).unwrap();
        }
        let mut src = SliceSource::new(&sink.0);
        let mut dec = Decoder::new(&mut src);
        let back = T::unmarshal(&mut dec, opts).unwrap();
        assert_eq!(&back, v);
    }

    #[test]
    fn option_none_round_trips_through_null() {
        roundtrip(&None::<i32>, &Options::new());
        roundtrip(&Some(7i32), &Options::new());
    }

    #[test]
    fn vec_round_trips() {
        roundtrip(&alloc::vec![1i32, 2, 3], &Options::new());
    }

    #[test]
    fn empty_slice_with_nil_policy_emits_null() {
        let opts = Options::new().with_flag(Flags::FORMAT_NIL_SLICE_NULL);
        let mut sink = VecSink::default();
        {
            let mut enc = Encoder::new(&mut sink);
            Vec::<i32>::new().marshal(&mut enc, &opts).unwrap();
        }
        assert_eq!(sink.0, b"null".to_vec());
    }

    #[test]
    fn empty_slice_default_emits_array() {
        let mut sink = VecSink::default();
        {
            let mut enc = Encoder::new(&mut sink);
            Vec::<i32>::new().marshal(&mut enc, &Options::new()).unwrap();
        }
        assert_eq!(sink.0, b"[]".to_vec());
    }

    #[test]
    fn map_round_trips() {
        let mut m = BTreeMap::new();
        m.insert("a".to_string(), 1i32);
        m.insert("b".to_string(), 2i32);
        roundtrip(&m, &Options::new());
    }

    #[test]
    fn fixed_array_round_trips() {
        roundtrip(&[1i32, 2, 3], &Options::new());
    }

    #[test]
    fn fixed_array_rejects_underflow() {
        let mut src = SliceSource::new(b"[1,2]");
        let mut dec = Decoder::new(&mut src);
        let opts = Options::new();
        let res: Result<[i32; 3], Error> = Unmarshal::unmarshal(&mut dec, &opts);
        assert!(res.is_err());
    }
}
