mod buffer;
mod codec;
mod run_length;

pub use codec::{decompressed_len, max_compressed_len, RleCodec};
pub use run_length::MAX_RUN_LENGTH;

/// Magic bytes that open every compressed buffer
pub const MAGIC: [u8; 3] = *b"RLE";

/// Length of the header: magic plus the little-endian u32 decompressed length
pub const HEADER_LENGTH: usize = MAGIC.len() + size_of::<u32>();

/// Largest input accepted by [`RleCodec::compress`] and
/// [`RleCodec::decompress`].
///
/// Equal to [`MAX_RUN_LENGTH`], so an input made of a single run can always
/// be encoded.
pub const MAX_INPUT_SIZE: usize = (1 << 30) - 1;

/// Worst-case encoded size of one run: a 4-byte count plus the symbol
pub const ENCODED_RUN_MAX_SIZE: usize = size_of::<u32>() + 1;
