//! The process-wide, type-indexed cache: on first sight of a type, its
//! [`StructLayout`] is built once and published; every later lookup for
//! that same type observes the same pointer-equal entry, and reads after
//! publication never block.
//!
//! Built on plain `std::sync::{RwLock, OnceLock}` rather than a lock-free
//! structure, matching `pool.rs`'s equivalent choice for the buffer pool —
//! this crate's only other piece of shared process-wide state.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use crate::bind::structbind::StructLayout;
use crate::error::Error;

type CacheEntry = Result<Arc<StructLayout>, CachedError>;

/// A build failure (duplicate field names, no serialisable fields) is
/// itself cached: construction is never retried for a type that has
/// already failed once, so a persistently malformed tag set fails exactly
/// the same way on every call instead of re-parsing and re-erroring each
/// time.
#[derive(Debug, Clone)]
struct CachedError(String);

fn registry() -> &'static RwLock<HashMap<TypeId, CacheEntry>> {
    static REGISTRY: OnceLock<RwLock<HashMap<TypeId, CacheEntry>>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Returns the cached [`StructLayout`] for `T`, building and publishing it
/// on first sight via `build`. `build` is only ever invoked by whichever
/// caller wins the race to populate the entry; losers observe the winner's
/// result.
pub fn layout_for<T: 'static>(build: impl FnOnce() -> Result<StructLayout, Error>) -> Result<Arc<StructLayout>, Error> {
    let type_id = TypeId::of::<T>();

    if let Some(entry) = registry().read().expect("arshaler cache poisoned").get(&type_id) {
        return clone_entry(entry);
    }

    let mut guard = registry().write().expect("arshaler cache poisoned");
    // Re-check: another thread may have published between the read-unlock
    // and this write-lock acquisition.
    if let Some(entry) = guard.get(&type_id) {
        return clone_entry(entry);
    }

    let entry: CacheEntry = match build() {
        Ok(layout) => Ok(Arc::new(layout)),
        Err(e) => Err(CachedError(e.to_string())),
    };
    guard.insert(type_id, entry.clone());
    clone_entry(&entry)
}

fn clone_entry(entry: &CacheEntry) -> Result<Arc<StructLayout>, Error> {
    match entry {
        Ok(layout) => Ok(layout.clone()),
        Err(CachedError(msg)) => Err(Error::Generic(msg.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker;

    #[test]
    fn publishes_once_and_reuses_entry() {
        let mut calls = 0;
        let first = layout_for::<Marker>(|| {
            calls += 1;
            StructLayout::build(&[("a", "a")])
        })
        .unwrap();
        let second = layout_for::<Marker>(|| {
            calls += 1;
            StructLayout::build(&[("a", "a")])
        })
        .unwrap();
        assert_eq!(calls, 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    struct BadMarker;

    #[test]
    fn caches_build_failure() {
        let mut calls = 0;
        let first = layout_for::<BadMarker>(|| {
            calls += 1;
            StructLayout::build(&[("a", "x"), ("b", "x")])
        });
        let second = layout_for::<BadMarker>(|| {
            calls += 1;
            StructLayout::build(&[("a", "x"), ("b", "x")])
        });
        assert!(first.is_err());
        assert!(second.is_err());
        assert_eq!(calls, 1);
    }
}
