//! A process-wide pool of reusable scan/serialize scratch buffers.
//!
//! Buffers of up to 4 KiB are always recycled; larger buffers are kept with a
//! per-buffer strike counter. A return that is at least 25% utilised resets
//! the buffer's strikes to zero and keeps it; an under-utilised return
//! increments its strikes, and a buffer that accumulates 4 strikes is
//! dropped instead of re-pooled, with its length (rounded up to the next
//! power of two) recorded as a size hint for the pool's next allocation —
//! the buffer-pool half of this crate's shared process-wide state (the
//! other half is [`crate::bind::arshaler`]'s type cache); both use plain
//! `std::sync` primitives rather than a dedicated lock crate, matching the
//! teacher's avoidance of concurrency dependencies beyond what
//! `alloc`/`core` already provide.

use alloc::vec::Vec;
use std::sync::{Mutex, OnceLock};

const ALWAYS_RECYCLE_SIZE: usize = 4096;
const UTILISATION_THRESHOLD: f64 = 0.25;
const MAX_STRIKES: u32 = 4;
const MIN_HINT: usize = 64;

struct Entry {
    buf: Vec<u8>,
    strikes: u32,
}

struct Inner {
    free: Vec<Entry>,
    size_hint: usize,
}

/// A shared, bounded free-list of byte buffers.
pub struct BufferPool {
    inner: Mutex<Inner>,
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferPool {
    /// An empty pool with no buffers checked in yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                free: Vec::new(),
                size_hint: MIN_HINT,
            }),
        }
    }

    /// Checks out a buffer, cleared and with at least `min_capacity` bytes of
    /// capacity.
    #[must_use]
    pub fn take(&self, min_capacity: usize) -> Vec<u8> {
        let mut inner = self.inner.lock().expect("pool mutex poisoned");
        let want = min_capacity.max(inner.size_hint);
        if let Some(pos) = inner.free.iter().position(|e| e.buf.capacity() >= want) {
            let mut entry = inner.free.swap_remove(pos);
            entry.buf.clear();
            return entry.buf;
        }
        Vec::with_capacity(want)
    }

    /// Returns a buffer, `used` being how many of its bytes were populated
    /// immediately before return (the utilisation heuristic input). Strikes
    /// are carried only for the duration this specific `Vec` allocation
    /// stays in the pool; a fresh allocation always starts at zero strikes.
    pub fn put(&self, buf: Vec<u8>, used: usize) {
        self.put_with_strikes(buf, used, 0);
    }

    fn put_with_strikes(&self, buf: Vec<u8>, used: usize, prior_strikes: u32) {
        let cap = buf.capacity();
        if cap == 0 {
            return;
        }
        let mut inner = self.inner.lock().expect("pool mutex poisoned");
        if cap <= ALWAYS_RECYCLE_SIZE {
            inner.free.push(Entry { buf, strikes: 0 });
            return;
        }
        let utilisation = used as f64 / cap as f64;
        if utilisation >= UTILISATION_THRESHOLD {
            inner.free.push(Entry { buf, strikes: 0 });
            return;
        }
        let strikes = prior_strikes + 1;
        if strikes >= MAX_STRIKES {
            inner.size_hint = cap.next_power_of_two().max(MIN_HINT);
            // buf is dropped here, freeing the oversized allocation.
        } else {
            inner.free.push(Entry { buf, strikes });
        }
    }

    /// Returns a buffer previously checked out of this same pool, carrying
    /// forward its existing strike count (looked up by capacity+pointer
    /// identity is unnecessary here: callers that want strike accumulation
    /// across multiple checkouts should hold onto the strike count returned
    /// by [`BufferPool::take_tracked`] instead).
    #[must_use]
    pub fn take_tracked(&self, min_capacity: usize) -> (Vec<u8>, u32) {
        let mut inner = self.inner.lock().expect("pool mutex poisoned");
        let want = min_capacity.max(inner.size_hint);
        if let Some(pos) = inner.free.iter().position(|e| e.buf.capacity() >= want) {
            let mut entry = inner.free.swap_remove(pos);
            entry.buf.clear();
            return (entry.buf, entry.strikes);
        }
        (Vec::with_capacity(want), 0)
    }

    /// As [`BufferPool::put`], carrying forward a strike count obtained from
    /// a matching [`BufferPool::take_tracked`] call.
    pub fn put_tracked(&self, buf: Vec<u8>, used: usize, strikes: u32) {
        self.put_with_strikes(buf, used, strikes);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().unwrap().free.len()
    }
}

/// The process-wide pool shared by [`crate::encoder::Encoder`]'s output
/// buffer and [`crate::buffer::DecodeBuffer`]'s backing storage, mirroring
/// the lazily-initialised singleton in [`crate::bind::arshaler`].
pub fn global() -> &'static BufferPool {
    static POOL: OnceLock<BufferPool> = OnceLock::new();
    POOL.get_or_init(BufferPool::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_buffers_always_recycled() {
        let pool = BufferPool::new();
        let buf = pool.take(100);
        pool.put(buf, 1);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn well_utilised_large_buffer_recycled() {
        let pool = BufferPool::new();
        let buf = pool.take(8192);
        pool.put(buf, 4096);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn underutilised_large_buffer_eventually_dropped() {
        let pool = BufferPool::new();
        let (mut buf, mut strikes) = pool.take_tracked(8192);
        for _ in 0..MAX_STRIKES {
            buf.resize(8192, 0);
            pool.put_tracked(buf, 10, strikes);
            let (b2, s2) = pool.take_tracked(8192);
            buf = b2;
            strikes = s2;
        }
        assert_eq!(strikes, 0); // evicted before reaching here; fresh alloc
        assert_eq!(pool.len(), 0);
    }

    #[test]
    fn global_returns_the_same_pool_every_call() {
        let a = global() as *const BufferPool;
        let b = global() as *const BufferPool;
        assert_eq!(a, b);
    }
}
