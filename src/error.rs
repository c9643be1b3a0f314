use thiserror::Error;

use crate::time::TimeUnit;

/// Error type for decoding failures.
///
/// The first error encountered by a [`ReaderIterator`](crate::ReaderIterator)
/// is stored and reported by `err()`; iteration halts from that point on.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The compressed stream ended in the middle of a field.
    #[error("unexpected end of compressed stream")]
    UnexpectedEof,

    /// No time encoding scheme is registered for the active time unit.
    #[error("no time encoding scheme for time unit {0:?}")]
    SchemeMissing(TimeUnit),

    /// A decoded annotation length was zero or negative.
    #[error("unexpected annotation length {0}")]
    InvalidAnnotationLength(i64),

    /// A varint field did not terminate within 64 bits.
    #[error("varint overflows 64 bits")]
    InvalidVarint,

    /// The underlying byte reader failed.
    #[error("read error: {0}")]
    Io(#[from] std::io::Error),
}

impl DecodeError {
    /// Returns `true` if this error was caused by the stream ending early.
    pub fn is_eof(&self) -> bool {
        matches!(self, DecodeError::UnexpectedEof)
    }
}
