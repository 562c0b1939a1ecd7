use std::borrow::Cow;

use bytes::Buf as _;
use log::{debug, trace};

use crate::bit_converter;
use crate::rle::buffer::OutputBuffer;
use crate::rle::run_length;
use crate::rle::{ENCODED_RUN_MAX_SIZE, HEADER_LENGTH, MAGIC, MAX_INPUT_SIZE};
use crate::{CodecToSlice, UtilError, UtilResult};

/// Worst-case compressed size for `input_len` bytes.
///
/// Every run costs at most two bytes per input byte (a one-byte run needs a
/// one-byte count plus the symbol), plus the header.
pub fn max_compressed_len(input_len: usize) -> usize {
    input_len.saturating_mul(2).saturating_add(HEADER_LENGTH)
}

/// Reads the decompressed length announced by a compressed buffer's header.
///
/// Performs the same header checks as [`RleCodec::decompress`], so a static
/// output buffer can be sized before decompressing.
pub fn decompressed_len(input: &[u8]) -> UtilResult<usize> {
    if input.len() > MAX_INPUT_SIZE {
        return Err(UtilError::InvalidParameter(input.len()));
    }
    if input.len() < HEADER_LENGTH {
        return Err(UtilError::BufferTooSmall {
            needed: HEADER_LENGTH,
            available: input.len(),
        });
    }
    if input[..MAGIC.len()] != MAGIC {
        return Err(UtilError::InvalidState("missing RLE magic header"));
    }
    let declared = bit_converter::get_u32_le(&input[MAGIC.len()..HEADER_LENGTH])?;
    Ok(declared as usize)
}

/// Run-length codec for byte buffers with long runs of equal bytes.
///
/// Each call either writes into a caller-supplied buffer (`Some(buffer)`,
/// returned as [`Cow::Borrowed`]) or allocates an exactly sized one (`None`,
/// returned as [`Cow::Owned`]). On failure nothing allocated by the codec is
/// left behind. A caller buffer may hold partial output after a failure.
///
/// ```
/// use libutils::rle::RleCodec;
///
/// let codec = RleCodec::new();
/// let compressed = codec.compress(&[0; 10], None).unwrap();
/// assert_eq!(&*compressed, b"RLE\x0a\x00\x00\x00\x0a\x00");
///
/// let mut out = [0u8; 16];
/// let restored = codec.decompress(&compressed, Some(&mut out)).unwrap();
/// assert_eq!(&*restored, &[0; 10]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RleCodec;

impl RleCodec {
    /// Creates a new instance
    pub fn new() -> RleCodec {
        RleCodec
    }

    /// Compresses `input`.
    ///
    /// # Errors
    ///
    /// - [`UtilError::InvalidParameter`] if `input` is longer than
    ///   [`MAX_INPUT_SIZE`]
    /// - [`UtilError::BufferTooSmall`] if `output` cannot hold the header
    /// - [`UtilError::InsufficientSpace`] if allocating the output fails
    /// - [`UtilError::Aborted`] if a run does not fit in `output`
    pub fn compress<'out>(
        &self,
        input: &[u8],
        output: Option<&'out mut [u8]>,
    ) -> UtilResult<Cow<'out, [u8]>> {
        if input.len() > MAX_INPUT_SIZE {
            debug!("rle: refusing to compress {} bytes", input.len());
            return Err(UtilError::InvalidParameter(input.len()));
        }

        let mut out = match output {
            Some(buffer) => {
                if buffer.len() < HEADER_LENGTH {
                    debug!("rle: output of {} bytes cannot hold the header", buffer.len());
                    return Err(UtilError::BufferTooSmall {
                        needed: HEADER_LENGTH,
                        available: buffer.len(),
                    });
                }
                OutputBuffer::borrowed(buffer)
            }
            None => OutputBuffer::allocate(max_compressed_len(input.len()))?,
        };

        let mut header = [0u8; HEADER_LENGTH];
        header[..MAGIC.len()].copy_from_slice(&MAGIC);
        bit_converter::put_u32_le(input.len() as u32, &mut header[MAGIC.len()..])?;
        out.put_slice(&header);

        for run in input.chunk_by(|a, b| a == b) {
            let needed = run_length::encoded_width(run.len()) + 1;
            debug_assert!(needed <= ENCODED_RUN_MAX_SIZE);
            if needed > out.remaining() {
                debug!(
                    "rle: run of {} bytes needs {needed} bytes at offset {}, {} left",
                    run.len(),
                    out.len(),
                    out.remaining()
                );
                return Err(UtilError::Aborted(out.len()));
            }
            trace!("rle: run {} x {:#04x}", run.len(), run[0]);
            out.put_count(run.len());
            out.put_slice(&run[..1]);
        }

        debug!("rle: compressed {} bytes into {}", input.len(), out.len());
        Ok(out.finish())
    }

    /// Decompresses `input`.
    ///
    /// # Errors
    ///
    /// - [`UtilError::InvalidParameter`] if `input` is longer than
    ///   [`MAX_INPUT_SIZE`]
    /// - [`UtilError::BufferTooSmall`] if `input` is shorter than the header
    ///   or the declared length does not fit in `output`
    /// - [`UtilError::InvalidState`] if the magic is wrong or the body does not
    ///   produce exactly the declared length
    /// - [`UtilError::InsufficientSpace`] if allocating the output fails
    /// - [`UtilError::Aborted`] if a run is truncated or overflows the output
    pub fn decompress<'out>(
        &self,
        input: &[u8],
        output: Option<&'out mut [u8]>,
    ) -> UtilResult<Cow<'out, [u8]>> {
        let declared = decompressed_len(input).inspect_err(|e| debug!("rle: bad header: {e}"))?;

        let mut out = match output {
            Some(buffer) => {
                if declared > buffer.len() {
                    debug!(
                        "rle: declared length {declared} exceeds output of {} bytes",
                        buffer.len()
                    );
                    return Err(UtilError::BufferTooSmall {
                        needed: declared,
                        available: buffer.len(),
                    });
                }
                OutputBuffer::borrowed(&mut buffer[..declared])
            }
            None => {
                if declared > MAX_INPUT_SIZE {
                    debug!("rle: declared length {declared} exceeds the maximum");
                    return Err(UtilError::InvalidState(
                        "declared length exceeds the supported maximum",
                    ));
                }
                OutputBuffer::allocate(declared)?
            }
        };

        let mut body = &input[HEADER_LENGTH..];
        while body.has_remaining() {
            let Some(count) = run_length::get_count(&mut body) else {
                debug!("rle: truncated run count at output offset {}", out.len());
                return Err(UtilError::Aborted(out.len()));
            };
            if !body.has_remaining() {
                debug!("rle: run without symbol at output offset {}", out.len());
                return Err(UtilError::Aborted(out.len()));
            }
            let symbol = body.get_u8();
            if count > out.remaining() {
                debug!(
                    "rle: run of {count} bytes overflows output at offset {}, {} left",
                    out.len(),
                    out.remaining()
                );
                return Err(UtilError::Aborted(out.len()));
            }
            trace!("rle: run {count} x {symbol:#04x}");
            out.put_repeated(symbol, count);
        }

        if out.remaining() != 0 {
            debug!("rle: body produced {} of {declared} bytes", out.len());
            return Err(UtilError::InvalidState(
                "body is shorter than the declared length",
            ));
        }

        debug!("rle: decompressed {} bytes into {declared}", input.len());
        Ok(out.finish())
    }

    /// Compresses `input` into a newly allocated, exactly sized buffer.
    pub fn compress_to_vec(&self, input: &[u8]) -> UtilResult<Vec<u8>> {
        self.compress(input, None).map(Cow::into_owned)
    }

    /// Decompresses `input` into a newly allocated, exactly sized buffer.
    pub fn decompress_to_vec(&self, input: &[u8]) -> UtilResult<Vec<u8>> {
        self.decompress(input, None).map(Cow::into_owned)
    }
}

impl CodecToSlice<u8> for RleCodec {
    type Error = UtilError;

    fn compress_to_slice<'out>(
        &mut self,
        input: &[u8],
        output: &'out mut [u8],
    ) -> Result<&'out [u8], Self::Error> {
        let written = self.compress(input, Some(&mut *output))?.len();
        Ok(&output[..written])
    }

    fn decompress_to_slice<'out>(
        &mut self,
        input: &[u8],
        output: &'out mut [u8],
    ) -> Result<&'out [u8], Self::Error> {
        let written = self.decompress(input, Some(&mut *output))?.len();
        Ok(&output[..written])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ten_zeros() {
        let codec = RleCodec::new();
        let compressed = codec.compress_to_vec(&[0; 10]).unwrap();
        assert_eq!(
            compressed,
            [b'R', b'L', b'E', 10, 0, 0, 0, 0b0000_1010, 0x00]
        );
        assert_eq!(codec.decompress_to_vec(&compressed).unwrap(), vec![0; 10]);
    }

    #[test]
    fn test_compress_header_only() {
        // Output can hold only the header, which is all an empty input needs
        let mut out = [0u8; HEADER_LENGTH];
        let compressed = RleCodec::new().compress(&[], Some(&mut out)).unwrap();
        assert_eq!(&*compressed, b"RLE\0\0\0\0");
    }

    #[test]
    fn test_compress_neg() {
        let codec = RleCodec::new();
        let input = [0u8; 32];

        // Output can hold the header, but not more
        let mut out = [0u8; 7];
        assert_eq!(
            codec.compress(&input, Some(&mut out)),
            Err(UtilError::Aborted(HEADER_LENGTH))
        );

        // Output cannot even hold the header
        let mut out = [0u8; 6];
        assert_eq!(
            codec.compress(&[], Some(&mut out)),
            Err(UtilError::BufferTooSmall {
                needed: 7,
                available: 6
            })
        );
        assert_eq!(
            codec.compress(&input, Some(&mut [])),
            Err(UtilError::BufferTooSmall {
                needed: 7,
                available: 0
            })
        );
    }

    #[test]
    fn test_decompress_neg() {
        let codec = RleCodec::new();
        let input = [0u8; 32];
        let mut out = [0u8; 32];

        // Input doesn't even have room for the header
        assert_eq!(
            codec.decompress(&input[..6], Some(&mut out)),
            Err(UtilError::BufferTooSmall {
                needed: 7,
                available: 6
            })
        );

        let mut compressed = codec.compress_to_vec(&input).unwrap();
        assert_eq!(compressed.len(), 9);

        // Mess up the "RLE" header
        compressed[0] ^= 0xFF;
        assert!(matches!(
            codec.decompress(&compressed, Some(&mut out)),
            Err(UtilError::InvalidState(_))
        ));
        compressed[0] ^= 0xFF;

        // Mess up the decompressed size in the header
        compressed[4] = 0xFF;
        assert_eq!(
            codec.decompress(&compressed, Some(&mut out)),
            Err(UtilError::BufferTooSmall {
                needed: 0xFF20,
                available: 32
            })
        );
        compressed[4] = 0x00;

        // Mess up the length of the first run; the header still fits but
        // the run count now claims four bytes that are not there
        compressed[7] = 0xFF;
        assert_eq!(
            codec.decompress(&compressed, Some(&mut out)),
            Err(UtilError::Aborted(0))
        );
    }

    #[test]
    fn test_any_magic_bit_flip_is_rejected() {
        let codec = RleCodec::new();
        let mut compressed = codec.compress_to_vec(&[7u8; 20]).unwrap();
        let mut out = [0u8; 32];
        for bit in 0..MAGIC.len() * 8 {
            compressed[bit / 8] ^= 1 << (bit % 8);
            assert!(
                matches!(
                    codec.decompress(&compressed, Some(&mut out)),
                    Err(UtilError::InvalidState(_))
                ),
                "bit {bit} flipped"
            );
            assert!(matches!(
                codec.decompress(&compressed, None),
                Err(UtilError::InvalidState(_))
            ));
            compressed[bit / 8] ^= 1 << (bit % 8);
        }
        assert_eq!(codec.decompress_to_vec(&compressed).unwrap(), [7u8; 20]);
    }

    #[test]
    fn test_run_overflowing_declared_length() {
        // Declares 4 bytes, first run claims 5
        let compressed = [b'R', b'L', b'E', 4, 0, 0, 0, 5, 0xAA];
        let codec = RleCodec::new();
        assert_eq!(
            codec.decompress(&compressed, None),
            Err(UtilError::Aborted(0))
        );
        let mut out = [0u8; 64];
        assert_eq!(
            codec.decompress(&compressed, Some(&mut out)),
            Err(UtilError::Aborted(0))
        );
        // Only the declared prefix of a caller buffer is ever written
        assert_eq!(out, [0u8; 64]);
    }

    #[test]
    fn test_body_shorter_than_declared() {
        let compressed = [b'R', b'L', b'E', 4, 0, 0, 0, 3, 0xAA];
        assert!(matches!(
            RleCodec::new().decompress(&compressed, None),
            Err(UtilError::InvalidState(_))
        ));
    }

    #[test]
    fn test_run_without_symbol() {
        let compressed = [b'R', b'L', b'E', 3, 0, 0, 0, 3];
        assert_eq!(
            RleCodec::new().decompress(&compressed, None),
            Err(UtilError::Aborted(0))
        );
    }

    #[test]
    fn test_compress_decompress_modes() {
        let codec = RleCodec::new();
        let input = [0u8; 32];
        let mut static_buf = [0u8; 32];

        // Compress into a static buf, then decompress into an allocated buf
        let compressed = codec.compress(&input, Some(&mut static_buf)).unwrap();
        assert!(matches!(compressed, Cow::Borrowed(_)));
        let restored = codec.decompress(&compressed, None).unwrap();
        assert!(matches!(restored, Cow::Owned(_)));
        assert_eq!(&*restored, &input);

        // Compress into an allocated buf, then decompress into a static buf
        let compressed = codec.compress(&input, None).unwrap();
        let mut out = [0u8; 32];
        let restored = codec.decompress(&compressed, Some(&mut out)).unwrap();
        assert_eq!(&*restored, &input);
    }

    #[test]
    fn test_static_and_dynamic_agree() {
        let codec = RleCodec::new();
        let input: Vec<u8> = (0..200u32).map(|i| (i / 7) as u8).collect();
        let owned = codec.compress_to_vec(&input).unwrap();
        let mut out = vec![0u8; max_compressed_len(input.len())];
        let borrowed = codec.compress(&input, Some(&mut out)).unwrap();
        assert_eq!(&*borrowed, &owned[..]);
    }

    #[test]
    fn test_exact_static_buffer_fits() {
        let codec = RleCodec::new();
        let input = [1u8, 2, 2, 3, 3, 3];
        let expected_len = HEADER_LENGTH + 3 * 2;
        let mut out = vec![0u8; expected_len];
        assert_eq!(
            codec.compress(&input, Some(&mut out)).unwrap().len(),
            expected_len
        );
        let mut short = vec![0u8; expected_len - 1];
        assert_eq!(
            codec.compress(&input, Some(&mut short)),
            Err(UtilError::Aborted(expected_len - 2))
        );
    }

    #[test]
    fn test_single_byte_dynamic() {
        let codec = RleCodec::new();
        let compressed = codec.compress_to_vec(&[0x42]).unwrap();
        assert_eq!(compressed.len(), max_compressed_len(1));
        assert_eq!(codec.decompress_to_vec(&compressed).unwrap(), [0x42]);
    }

    #[test]
    fn test_longest_run_costs_max_encoded_size() {
        let codec = RleCodec::new();
        let run = vec![0xA5u8; (1 << 22) + 1];
        let compressed = codec.compress_to_vec(&run).unwrap();
        assert_eq!(compressed.len(), HEADER_LENGTH + ENCODED_RUN_MAX_SIZE);

        // One byte short of a full-width run aborts right after the header
        let mut out = [0u8; HEADER_LENGTH + ENCODED_RUN_MAX_SIZE - 1];
        assert_eq!(
            codec.compress(&run, Some(&mut out)),
            Err(UtilError::Aborted(HEADER_LENGTH))
        );
    }

    #[test]
    fn test_decompressed_len() {
        let codec = RleCodec::new();
        let compressed = codec.compress_to_vec(&[9; 1000]).unwrap();
        assert_eq!(decompressed_len(&compressed), Ok(1000));
        assert_eq!(
            decompressed_len(b"RLE"),
            Err(UtilError::BufferTooSmall {
                needed: 7,
                available: 3
            })
        );
        assert!(matches!(
            decompressed_len(b"LZ4\0\0\0\0"),
            Err(UtilError::InvalidState(_))
        ));
    }

    #[test]
    fn test_declared_length_over_maximum() {
        let mut compressed = vec![b'R', b'L', b'E'];
        compressed.extend_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            RleCodec::new().decompress(&compressed, None),
            Err(UtilError::InvalidState(_))
        ));
    }

    #[test]
    fn test_codec_to_slice() {
        let mut codec = RleCodec::new();
        let input = b"aaaabbbcc\0\0\0\0\0";
        let mut compressed = [0u8; 64];
        let compressed = codec.compress_to_slice(input, &mut compressed).unwrap();
        assert_eq!(compressed.len(), HEADER_LENGTH + 8);

        let mut restored = [0u8; 64];
        let restored = codec.decompress_to_slice(compressed, &mut restored).unwrap();
        assert_eq!(restored, input);
    }
}
