//! Byte source/sink abstractions the decoder and encoder suspend on.
//!
//! The only suspension point inside a decoder is [`Source::fill`]; the only
//! one inside an encoder is [`Sink::write_all`]. Both are synchronous: there
//! is no internal task scheduler or implicit parallelism.

use alloc::boxed::Box;

use crate::error::{Error, WrapError};

/// A byte source a decoder refills its buffer from.
pub trait Source {
    /// Reads as many bytes as are immediately available into `buf`, returning
    /// the number written. Returns `Ok(0)` only at true end-of-stream;
    /// implementations must not return `Ok(0)` merely because no data is
    /// *currently* available (block or loop internally: `(0, nil)` means
    /// "loop until data", `(0, eof)` means true end-of-stream).
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize, Error>;
}

/// A byte sink an encoder flushes its buffer to.
pub trait Sink {
    /// Writes the whole of `buf`, or fails — partial writes are not exposed.
    fn write_all(&mut self, buf: &[u8]) -> Result<(), Error>;
}

/// Adapts a [`std::io::Read`] into a [`Source`].
pub struct ReadSource<R>(
    /// The wrapped reader.
    pub R,
);

impl<R: std::io::Read> Source for ReadSource<R> {
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        loop {
            match self.0.read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Wrap(WrapError(Box::new(e)))),
            }
        }
    }
}

/// Adapts a [`std::io::Write`] into a [`Sink`].
pub struct WriteSink<W>(
    /// The wrapped writer.
    pub W,
);

impl<W: std::io::Write> Sink for WriteSink<W> {
    fn write_all(&mut self, buf: &[u8]) -> Result<(), Error> {
        self.0
            .write_all(buf)
            .map_err(|e| Error::Wrap(WrapError(Box::new(e))))
    }
}

/// A source that yields a fixed in-memory byte slice and then EOF. Used when
/// decoding from an already-materialised buffer (e.g. `unmarshal(&[u8])`).
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    /// Wraps `data`, starting at its first byte.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl Source for SliceSource<'_> {
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let n = core::cmp::min(buf.len(), self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// A sink that appends to an owned `Vec<u8>`.
#[derive(Debug, Default)]
pub struct VecSink(
    /// The accumulated output.
    pub alloc::vec::Vec<u8>,
);

impl Sink for VecSink {
    fn write_all(&mut self, buf: &[u8]) -> Result<(), Error> {
        self.0.extend_from_slice(buf);
        Ok(())
    }
}
