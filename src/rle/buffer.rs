use std::borrow::Cow;

use bytes::BufMut as _;

use crate::rle::run_length;
use crate::{UtilError, UtilResult};

/// Destination of a compress or decompress call.
///
/// `Borrowed` writes into caller memory and never frees it. `Owned` is
/// allocated by the codec and handed to the caller only on success. Dropping
/// the buffer on an error path therefore frees exactly what the codec
/// allocated.
#[derive(Debug)]
pub enum OutputBuffer<'out> {
    /// Caller-supplied memory and the number of bytes written so far
    Borrowed { buffer: &'out mut [u8], written: usize },
    /// Codec-allocated memory, never grown past `limit`
    Owned { buffer: Vec<u8>, limit: usize },
}

impl<'out> OutputBuffer<'out> {
    /// Wraps caller memory. The whole slice is usable.
    pub fn borrowed(buffer: &'out mut [u8]) -> Self {
        OutputBuffer::Borrowed { buffer, written: 0 }
    }

    /// Allocates room for exactly `limit` bytes.
    pub fn allocate(limit: usize) -> UtilResult<Self> {
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(limit)
            .map_err(|_| UtilError::InsufficientSpace(limit))?;
        Ok(OutputBuffer::Owned { buffer, limit })
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        match self {
            OutputBuffer::Borrowed { written, .. } => *written,
            OutputBuffer::Owned { buffer, .. } => buffer.len(),
        }
    }

    /// Total bytes this buffer may hold.
    pub fn limit(&self) -> usize {
        match self {
            OutputBuffer::Borrowed { buffer, .. } => buffer.len(),
            OutputBuffer::Owned { limit, .. } => *limit,
        }
    }

    /// Bytes that can still be written.
    pub fn remaining(&self) -> usize {
        self.limit() - self.len()
    }

    /// Gives a writer over the unwritten tail.
    ///
    /// The closure must write at most `remaining()` bytes and returns how many
    /// it wrote.
    fn write_with(&mut self, f: impl FnOnce(&mut dyn bytes::BufMut) -> usize) {
        match self {
            OutputBuffer::Borrowed { buffer, written } => {
                let mut tail = &mut buffer[*written..];
                *written += f(&mut tail);
            }
            OutputBuffer::Owned { buffer, limit } => {
                f(buffer);
                debug_assert!(buffer.len() <= *limit);
            }
        }
    }

    /// Appends `bytes`. The caller checks `remaining()` first.
    pub fn put_slice(&mut self, bytes: &[u8]) {
        debug_assert!(bytes.len() <= self.remaining());
        self.write_with(|out| {
            out.put_slice(bytes);
            bytes.len()
        });
    }

    /// Appends `count` copies of `byte`. The caller checks `remaining()` first.
    pub fn put_repeated(&mut self, byte: u8, count: usize) {
        debug_assert!(count <= self.remaining());
        self.write_with(|out| {
            out.put_bytes(byte, count);
            count
        });
    }

    /// Appends a run-length count. The caller checks `remaining()` first.
    pub fn put_count(&mut self, count: usize) {
        let width = run_length::encoded_width(count);
        debug_assert!(width <= self.remaining());
        self.write_with(|mut out| {
            run_length::put_count(count, &mut out);
            width
        });
    }

    /// Hands the written bytes to the caller.
    ///
    /// Owned buffers are shrunk to the written length.
    pub fn finish(self) -> Cow<'out, [u8]> {
        match self {
            OutputBuffer::Borrowed { buffer, written } => {
                let buffer: &'out [u8] = buffer;
                Cow::Borrowed(&buffer[..written])
            }
            OutputBuffer::Owned { mut buffer, .. } => {
                buffer.shrink_to_fit();
                Cow::Owned(buffer)
            }
        }
    }
}
