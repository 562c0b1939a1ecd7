//! Conversions between fixed-width integers and byte sequences.
//!
//! Every `put_*` writes into the first `size_of::<T>()` bytes of the target
//! slice and every `get_*` reads from the first `size_of::<T>()` bytes of the
//! source slice. Bytes past that prefix are never touched. The `_ne` variants
//! follow the byte order of the target the code runs on.

use bytes::{Buf as _, BufMut as _};

use crate::{UtilError, UtilResult};

/// Byte order of a multi-byte integer in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    /// Most significant byte first
    Big,
    /// Least significant byte first
    Little,
}

impl Endianness {
    /// Byte order of the running target.
    pub const fn native() -> Endianness {
        if cfg!(target_endian = "big") {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }
}

/// Returns true when the running target stores integers big-endian.
pub const fn is_big_endian() -> bool {
    matches!(Endianness::native(), Endianness::Big)
}

fn check_room(available: usize, needed: usize) -> UtilResult<()> {
    if available < needed {
        return Err(UtilError::BufferTooSmall { needed, available });
    }
    Ok(())
}

fn check_data(available: usize, needed: usize) -> UtilResult<()> {
    if available < needed {
        return Err(UtilError::NotEnoughData);
    }
    Ok(())
}

macro_rules! byte_order_fns {
    (
        $ty:ty,
        $put_be:ident => $buf_put_be:ident,
        $put_le:ident => $buf_put_le:ident,
        $put_ne:ident,
        $get_be:ident => $buf_get_be:ident,
        $get_le:ident => $buf_get_le:ident,
        $get_ne:ident
    ) => {
        #[doc = concat!("Writes a `", stringify!($ty), "` into `mem` in big-endian order.")]
        pub fn $put_be(value: $ty, mut mem: &mut [u8]) -> UtilResult<()> {
            check_room(mem.len(), size_of::<$ty>())?;
            mem.$buf_put_be(value);
            Ok(())
        }

        #[doc = concat!("Writes a `", stringify!($ty), "` into `mem` in little-endian order.")]
        pub fn $put_le(value: $ty, mut mem: &mut [u8]) -> UtilResult<()> {
            check_room(mem.len(), size_of::<$ty>())?;
            mem.$buf_put_le(value);
            Ok(())
        }

        #[doc = concat!("Writes a `", stringify!($ty), "` into `mem` in native order.")]
        pub fn $put_ne(value: $ty, mem: &mut [u8]) -> UtilResult<()> {
            match Endianness::native() {
                Endianness::Big => $put_be(value, mem),
                Endianness::Little => $put_le(value, mem),
            }
        }

        #[doc = concat!("Reads a big-endian `", stringify!($ty), "` from `mem`.")]
        pub fn $get_be(mut mem: &[u8]) -> UtilResult<$ty> {
            check_data(mem.len(), size_of::<$ty>())?;
            Ok(mem.$buf_get_be())
        }

        #[doc = concat!("Reads a little-endian `", stringify!($ty), "` from `mem`.")]
        pub fn $get_le(mut mem: &[u8]) -> UtilResult<$ty> {
            check_data(mem.len(), size_of::<$ty>())?;
            Ok(mem.$buf_get_le())
        }

        #[doc = concat!("Reads a native-order `", stringify!($ty), "` from `mem`.")]
        pub fn $get_ne(mem: &[u8]) -> UtilResult<$ty> {
            match Endianness::native() {
                Endianness::Big => $get_be(mem),
                Endianness::Little => $get_le(mem),
            }
        }
    };
}

byte_order_fns!(
    u16,
    put_u16_be => put_u16,
    put_u16_le => put_u16_le,
    put_u16_ne,
    get_u16_be => get_u16,
    get_u16_le => get_u16_le,
    get_u16_ne
);

byte_order_fns!(
    u32,
    put_u32_be => put_u32,
    put_u32_le => put_u32_le,
    put_u32_ne,
    get_u32_be => get_u32,
    get_u32_le => get_u32_le,
    get_u32_ne
);

byte_order_fns!(
    u64,
    put_u64_be => put_u64,
    put_u64_le => put_u64_le,
    put_u64_ne,
    get_u64_be => get_u64,
    get_u64_le => get_u64_le,
    get_u64_ne
);

byte_order_fns!(
    i16,
    put_i16_be => put_i16,
    put_i16_le => put_i16_le,
    put_i16_ne,
    get_i16_be => get_i16,
    get_i16_le => get_i16_le,
    get_i16_ne
);

byte_order_fns!(
    i32,
    put_i32_be => put_i32,
    put_i32_le => put_i32_le,
    put_i32_ne,
    get_i32_be => get_i32,
    get_i32_le => get_i32_le,
    get_i32_ne
);

byte_order_fns!(
    i64,
    put_i64_be => put_i64,
    put_i64_le => put_i64_le,
    put_i64_ne,
    get_i64_be => get_i64,
    get_i64_le => get_i64_le,
    get_i64_ne
);
