use libutils::rle::{max_compressed_len, RleCodec};

/// How the fuzz target supplies output memory to the codec
#[derive(arbitrary::Arbitrary, Clone, Copy, PartialEq, Eq, Debug)]
pub enum OutputMode {
    /// Let the codec allocate
    Allocate,
    /// Worst-case sized caller buffer
    Generous,
    /// Caller buffer cut short by the given number of bytes
    Short(u8),
}

#[derive(arbitrary::Arbitrary)]
pub struct FuzzInput {
    pub data: Vec<u8>,
    pub mode: OutputMode,
}

impl std::fmt::Debug for FuzzInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FuzzInput")
            .field("mode", &self.mode)
            .field("data", &HexSlice(&self.data))
            .finish()
    }
}

impl OutputMode {
    /// Size of the caller buffer to hand the compressor, if any.
    pub fn compress_buffer_len(self, input_len: usize) -> Option<usize> {
        let worst = max_compressed_len(input_len);
        match self {
            OutputMode::Allocate => None,
            OutputMode::Generous => Some(worst),
            OutputMode::Short(cut) => Some(worst.saturating_sub(usize::from(cut))),
        }
    }
}

/// Compresses with `RleCodec` in dynamic mode, for use as the reference.
pub fn reference_compress(data: &[u8]) -> Vec<u8> {
    RleCodec::new()
        .compress_to_vec(data)
        .expect("Any input below the size limit compresses")
}

pub struct HexSlice<'a>(pub &'a [u8]);

impl std::fmt::Debug for HexSlice<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const MAX: usize = 32;

        let total = self.0.len();
        let shown = total.min(MAX);

        let mut list = f.debug_list();

        for v in &self.0[..shown] {
            list.entry(&format_args!("{v:#04x}"));
        }

        if total > MAX {
            list.entry(&format_args!(".. out of {total} total"));
        }

        list.finish()
    }
}
