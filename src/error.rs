use thiserror::Error;

/// Alias for the result type of fallible `libutils` operations.
pub type UtilResult<T> = Result<T, UtilError>;

/// Errors that can occur when using the codecs, converters and containers.
///
/// Full and empty FIFOs are not errors; those outcomes are reported through
/// `bool` and `Option` returns.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UtilError {
    /// Input length exceeds the largest size a codec accepts
    #[error("Invalid parameter: input length {0} exceeds the supported maximum")]
    InvalidParameter(usize),

    /// A buffer cannot hold the data it is required to hold
    #[error("Buffer too small: {needed} bytes needed, {available} available")]
    BufferTooSmall {
        /// Bytes the operation requires
        needed: usize,
        /// Bytes the caller supplied
        available: usize,
    },

    /// Allocating an output buffer failed
    #[error("Insufficient space: cannot allocate {0} bytes")]
    InsufficientSpace(usize),

    /// Data is inconsistent with its own header
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),

    /// Encoding or decoding ran past a buffer boundary
    #[error("Operation aborted at output offset {0}")]
    Aborted(usize),

    /// Not enough data in the input buffer
    #[error("Not enough data in the input buffer")]
    NotEnoughData,

    /// A FIFO was constructed over a backing store without slots
    #[error("Backing store has no slots")]
    NoBackingStore,
}
