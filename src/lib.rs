#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

#[cfg(not(any(feature = "fifo", feature = "rle",)))]
compile_error!("At least one of the features 'fifo' or 'rle' must be enabled");

pub mod bit_converter;
mod error;

#[cfg(feature = "fifo")]
/// Fixed-capacity ring FIFO with a lock-free SPSC split.
pub mod fifo;

#[cfg(feature = "rle")]
/// Run-length codec with a self-describing header.
pub mod rle;

pub use error::{UtilError, UtilResult};

/// Low-level compression interface using caller-provided buffers.
///
/// Codecs write into pre-allocated slices and return a sub-slice showing exactly
/// what was written. Nothing is allocated, so the same buffers can be reused
/// across calls.
///
/// # Type Parameters
///
/// - `In`: Input data type (`u8` for the byte codecs in this crate)
/// - `Out`: Compressed output type (defaults to `In`)
///
/// # Buffer Sizing
///
/// Caller must ensure output buffers are large enough. For [`rle::RleCodec`],
/// [`rle::max_compressed_len`] gives the worst case for compression and
/// [`rle::decompressed_len`] reads the exact size needed for decompression.
pub trait CodecToSlice<In, Out = In> {
    /// Error type returned by compression/decompression operations.
    type Error;

    /// Compresses input into output buffer, returning slice of data written.
    fn compress_to_slice<'out>(
        &mut self,
        input: &[In],
        output: &'out mut [Out],
    ) -> Result<&'out [Out], Self::Error>;

    /// Decompresses input into output buffer, returning slice of data written.
    fn decompress_to_slice<'out>(
        &mut self,
        input: &[Out],
        output: &'out mut [In],
    ) -> Result<&'out [In], Self::Error>;
}
