//! Byte sinks.
//!
//! The engine never writes straight to an [`io::Write`]. It asks a [`Sink`] for a
//! writable region, fills a prefix of it and commits what it used. The sink decides
//! when that region is "full enough" through [`Sink::free_capacity`], which is what
//! the flush controller watches.
//!
//! [`BufferSink`] is the stock implementation: a growable buffer with a soft capacity
//! in front of any [`io::Write`].
//!
//! ```rust
//! use chunked_json::{BufferSink, Sink};
//!
//! let mut sink = BufferSink::with_capacity(Vec::new(), 8);
//! let region = sink.reserve(2).unwrap();
//! region.copy_from_slice(b"[]");
//! sink.commit(2);
//! assert_eq!(sink.free_capacity(), 6);
//! sink.flush().unwrap();
//! assert_eq!(sink.into_inner(), b"[]");
//! ```

use crate::{Error, Result};
use std::io;

/// Destination for encoded bytes.
///
/// Implementations must hand out regions of exactly the requested size and must
/// keep committed bytes in order. Only the flush controller calls [`Sink::flush`].
pub trait Sink {
    /// Returns a writable region of `min` bytes directly after the committed data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExhausted`] when the sink cannot grow by `min` bytes.
    fn reserve(&mut self, min: usize) -> Result<&mut [u8]>;

    /// Marks the first `used` bytes of the last reserved region as written.
    fn commit(&mut self, used: usize);

    /// Bytes that can still be committed before the sink wants draining.
    fn free_capacity(&self) -> usize;

    /// Drains committed bytes to the underlying destination.
    fn flush(&mut self) -> Result<()>;
}

/// A growable buffer with a soft capacity in front of an [`io::Write`].
///
/// The soft capacity only drives [`Sink::free_capacity`]; `reserve` grows past it so
/// atomic tokens always fit. An optional hard limit turns growth past it into
/// [`Error::CapacityExhausted`].
#[derive(Debug)]
pub struct BufferSink<W> {
    writer: W,
    buf: Vec<u8>,
    filled: usize,
    capacity: usize,
    limit: Option<usize>,
    flushes: usize,
    bytes_flushed: u64,
}

impl<W: io::Write> BufferSink<W> {
    /// Creates a sink with an 8 KiB soft capacity.
    pub fn new(writer: W) -> Self {
        Self::with_capacity(writer, 8 * 1024)
    }

    pub fn with_capacity(writer: W, capacity: usize) -> Self {
        BufferSink {
            writer,
            buf: Vec::with_capacity(capacity),
            filled: 0,
            capacity,
            limit: None,
            flushes: 0,
            bytes_flushed: 0,
        }
    }

    /// Sets a hard limit on buffered bytes. The soft capacity never exceeds it.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self.capacity = self.capacity.min(limit);
        self
    }

    /// Committed bytes that have not been flushed yet.
    pub fn buffered(&self) -> &[u8] {
        &self.buf[..self.filled]
    }

    /// Number of completed flushes.
    pub fn flushes(&self) -> usize {
        self.flushes
    }

    pub fn bytes_flushed(&self) -> u64 {
        self.bytes_flushed
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Returns the inner writer. Unflushed bytes are dropped, so flush first.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: io::Write> Sink for BufferSink<W> {
    fn reserve(&mut self, min: usize) -> Result<&mut [u8]> {
        let end = self.filled + min;
        if let Some(limit) = self.limit {
            if end > limit {
                return Err(Error::capacity_exhausted(min, limit));
            }
        }
        if self.buf.len() < end {
            self.buf.resize(end, 0);
        }
        Ok(&mut self.buf[self.filled..end])
    }

    fn commit(&mut self, used: usize) {
        debug_assert!(self.filled + used <= self.buf.len());
        self.filled += used;
    }

    fn free_capacity(&self) -> usize {
        self.capacity.saturating_sub(self.filled)
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.write_all(&self.buf[..self.filled])?;
        self.writer.flush()?;
        self.bytes_flushed += self.filled as u64;
        self.filled = 0;
        self.flushes += 1;
        Ok(())
    }
}
