//! Codec error types

use thiserror::Error;

/// Errors raised while decoding containers or primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unexpected end of buffer: needed {needed} more bytes, had {remaining}")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("invalid UTF-8 in string value")]
    InvalidUtf8,

    #[error("unknown {kind} code: {value}")]
    UnknownCode { kind: &'static str, value: u8 },

    #[error("wrong element type: expected {expected}, got {actual}")]
    WrongElementType {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("declared length {declared} exceeds remaining buffer {remaining}")]
    BadLength { declared: usize, remaining: usize },
}

/// Errors raised while encoding containers or primitives.
///
/// All encode failures surface synchronously, before any bytes leave the
/// process; retrying with a larger buffer is always safe.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("buffer full: limit of {limit} bytes exceeded")]
    BufferFull { limit: usize },

    #[error("value too long for u16 length prefix: {len} bytes")]
    TooLong { len: usize },

    #[error("{action} entries must not carry a payload")]
    ActionPayloadMismatch { action: &'static str },

    #[error("container entry count overflow")]
    CountOverflow,
}
