//! Variable-width run counts.
//!
//! The two most significant bits of the first byte give the total width of
//! the field. The remaining bits hold the count, most significant byte first.
//!
//! ```text
//!   00xx xxxx                                  1 byte,  6 bits
//!   01xx xxxx  xxxx xxxx                       2 bytes, 14 bits
//!   10xx xxxx  xxxx xxxx  xxxx xxxx            3 bytes, 22 bits
//!   11xx xxxx  xxxx xxxx  xxxx xxxx  xxxx xxxx 4 bytes, 30 bits
//! ```

use bytes::{Buf as _, BufMut as _};

/// Longest run a single count field can describe
pub const MAX_RUN_LENGTH: usize = (1 << 30) - 1;

/// Number of bytes needed to encode `count`.
pub fn encoded_width(count: usize) -> usize {
    debug_assert!(count <= MAX_RUN_LENGTH);
    if count < (1 << 6) {
        1
    } else if count < (1 << 14) {
        2
    } else if count < (1 << 22) {
        3
    } else {
        4
    }
}

/// Writes `count` into the front of `out`, advancing it.
///
/// The caller checks beforehand that `out` has `encoded_width(count)` bytes.
pub fn put_count(count: usize, out: &mut impl bytes::BufMut) {
    let width = encoded_width(count);
    let class = (width - 1) as u64;
    let value_bits = 8 * width - 2;
    out.put_uint((class << value_bits) | count as u64, width);
}

/// Reads a count from the front of `input`, advancing it.
///
/// Returns `None` without consuming anything if `input` is shorter than the
/// width announced by its first byte.
pub fn get_count(input: &mut &[u8]) -> Option<usize> {
    let first = *input.first()?;
    let width = usize::from(first >> 6) + 1;
    if input.remaining() < width {
        return None;
    }
    let value_bits = 8 * width - 2;
    let raw = input.get_uint(width);
    Some((raw & ((1 << value_bits) - 1)) as usize)
}
