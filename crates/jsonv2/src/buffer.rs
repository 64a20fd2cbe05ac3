//! The decoder's duplex input buffer: four logical segments over one backing
//! array, refilled from a [`crate::io::Source`] on demand.
//!
//! ```text
//! [0 .. prev_start)   already consumed
//! [prev_start .. prev_end)  most recently returned token/value slice
//! [prev_end .. len)   unread, not yet tokenized
//! [len .. cap)        unused capacity
//! ```
//!
//! Grounded on a ring-buffer growth/compaction policy (geometric growth,
//! compact-in-place), generalized here to byte offsets, plus a
//! Hyrum-proofing behavior: the first byte of a previously returned slice is
//! stomped with `#` before every new read so that a caller who retained the
//! slice across calls observes a syntactically invalid character rather than
//! silently shifting data.

use alloc::vec::Vec;

use crate::error::{Error, SyntaxError, SyntaxErrorKind};
use crate::io::Source;

/// Buffers below this target size stay put; above it, geometric growth
/// doubles the capacity each time, up to this cap.
const GROWTH_CAP: usize = 4096;
/// Initial buffer allocation.
const INITIAL_CAP: usize = 256;

/// An invalid JSON byte deliberately written over the first byte of an
/// already-returned slice. Never a valid JSON start byte.
const TOMBSTONE: u8 = b'#';

/// The decoder's growable, compacting input window over a [`crate::io::Source`].
pub struct DecodeBuffer {
    data: Vec<u8>,
    /// Absolute byte offset of `data[0]`.
    base_offset: u64,
    /// Start of the most recently returned slice, used to decide whether
    /// compaction can proceed and where to plant the Hyrum tombstone.
    prev_start: usize,
    /// End of the most recently returned slice == start of unread data.
    prev_end: usize,
    /// End of valid (read-but-not-yet-consumed) data.
    len: usize,
    at_eof: bool,
}

impl DecodeBuffer {
    /// An empty buffer with nothing fetched yet.
    #[must_use]
    pub fn new() -> Self {
        let mut data = crate::pool::global().take(INITIAL_CAP);
        data.resize(INITIAL_CAP, 0);
        Self {
            data,
            base_offset: 0,
            prev_start: 0,
            prev_end: 0,
            len: 0,
            at_eof: false,
        }
    }

    /// Absolute stream offset of `data[0]`, accounting for past compactions.
    #[must_use]
    pub fn base_offset(&self) -> u64 {
        self.base_offset
    }

    /// Converts a local buffer offset to an absolute stream offset.
    #[must_use]
    pub fn absolute(&self, local: usize) -> u64 {
        self.base_offset + local as u64
    }

    /// The unread window `[prev_end, len)`.
    #[must_use]
    pub fn unread(&self) -> &[u8] {
        &self.data[self.prev_end..self.len]
    }

    /// Local offset one past the most recently returned slice, i.e. the
    /// start of unread data.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.prev_end
    }

    /// Advances the unread cursor by `n` bytes without yet declaring a
    /// returned-slice boundary (used while scanning inside a container,
    /// before the whole value's bounds are known).
    pub fn advance(&mut self, n: usize) {
        self.prev_end += n;
    }

    /// Declares `[start, end)` (local offsets) as the most recently returned
    /// slice, the one that will be Hyrum-stomped on the next call.
    pub fn set_returned(&mut self, start: usize, end: usize) {
        self.prev_start = start;
        self.prev_end = end;
    }

    /// The most recently declared returned slice, `[prev_start, prev_end)`.
    #[must_use]
    pub fn returned_slice(&self) -> &[u8] {
        &self.data[self.prev_start..self.prev_end]
    }

    fn invalidate_previous_read(&mut self) {
        if self.prev_end > self.prev_start {
            self.data[self.prev_start] = TOMBSTONE;
        }
    }

    /// Refills the buffer from `source`. Growth/compaction policy:
    /// - compact unread bytes to the front unless growing;
    /// - grow geometrically (×2, cap [`GROWTH_CAP`]) only when capacity is
    ///   below the cap *and* enough of it has already been consumed;
    /// - if we're mid-consumption of one large value (`prev_start == 0`) and
    ///   the buffer is at least 75% full, grow even past the cap, since a
    ///   single scalar token may simply be larger than the cap.
    ///
    /// A `fill` returning `0` is end-of-stream; whether that is `Eof` or
    /// `UnexpectedEof` is the caller's call (depends on grammar depth), not
    /// this function's.
    pub fn fetch(&mut self, source: &mut dyn Source) -> Result<(), Error> {
        if self.at_eof {
            return Err(SyntaxError::new(SyntaxErrorKind::UnexpectedEof, self.absolute(self.len)).into());
        }

        self.invalidate_previous_read();

        let cap = self.data.len();
        let consumed = self.prev_end;
        let unread_len = self.len - self.prev_end;
        let full_ratio_num = self.len * 4;
        let should_grow_past_cap = self.prev_start == 0 && full_ratio_num >= cap * 3;
        let should_grow = (cap < GROWTH_CAP && consumed * 2 >= cap) || should_grow_past_cap;

        if should_grow {
            let mut new_cap = cap.saturating_mul(2).max(INITIAL_CAP);
            if should_grow_past_cap {
                new_cap = new_cap.max(cap + cap / 2);
            }
            let mut new_data = crate::pool::global().take(new_cap);
            new_data.resize(new_cap, 0);
            new_data[..unread_len].copy_from_slice(&self.data[self.prev_end..self.len]);
            let old_data = core::mem::replace(&mut self.data, new_data);
            crate::pool::global().put(old_data, self.len);
        } else if consumed > 0 {
            self.data.copy_within(self.prev_end..self.len, 0);
        }

        if should_grow || consumed > 0 {
            self.base_offset += consumed as u64;
            self.prev_start = self.prev_start.saturating_sub(consumed);
            self.prev_end = 0;
            self.len = unread_len;
        }

        loop {
            let dst = &mut self.data[self.len..];
            if dst.is_empty() {
                // Out of room and not eligible to grow this round (small
                // read); grow unconditionally to make progress.
                let new_cap = (self.data.len() * 2).max(INITIAL_CAP);
                let mut new_data = crate::pool::global().take(new_cap);
                new_data.resize(new_cap, 0);
                new_data[..self.len].copy_from_slice(&self.data[..self.len]);
                let old_data = core::mem::replace(&mut self.data, new_data);
                crate::pool::global().put(old_data, self.len);
                continue;
            }
            let n = source.fill(dst)?;
            if n == 0 {
                self.at_eof = true;
                return Ok(());
            }
            self.len += n;
            return Ok(());
        }
    }

    /// Whether the underlying source has signaled end-of-stream.
    #[must_use]
    pub fn at_eof(&self) -> bool {
        self.at_eof
    }
}

impl Default for DecodeBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DecodeBuffer {
    fn drop(&mut self) {
        let data = core::mem::take(&mut self.data);
        crate::pool::global().put(data, self.len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::SliceSource;

    #[test]
    fn fetch_reads_whole_small_input() {
        let mut buf = DecodeBuffer::new();
        let mut src = SliceSource::new(b"{\"a\":1}");
        buf.fetch(&mut src).unwrap();
        assert_eq!(buf.unread(), b"{\"a\":1}");
    }

    #[test]
    fn fetch_signals_eof_after_drained() {
        let mut buf = DecodeBuffer::new();
        let mut src = SliceSource::new(b"1");
        buf.fetch(&mut src).unwrap();
        buf.advance(1);
        buf.set_returned(0, 1);
        assert!(!buf.at_eof());
        buf.fetch(&mut src).unwrap();
        assert!(buf.at_eof());
    }

    #[test]
    fn invalidate_stomps_previous_slice() {
        let mut buf = DecodeBuffer::new();
        let mut src = SliceSource::new(b"12 34");
        buf.fetch(&mut src).unwrap();
        buf.set_returned(0, 2);
        let first = buf.returned_slice().to_vec();
        assert_eq!(first, b"12");
        // Force another fetch cycle to trigger invalidation + compaction.
        buf.advance(3);
        let mut src2 = SliceSource::new(b"");
        let _ = buf.fetch(&mut src2);
        assert_eq!(buf.data[0], TOMBSTONE);
    }
}
