use thiserror::Error;

/// Errors from decoding a single operation blob.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("unknown opcode {0}")]
    UnknownOpcode(u8),

    #[error("truncated operation: missing {0}")]
    Truncated(&'static str),

    #[error("length prefix for {field} exceeds remaining bytes ({declared} > {remaining})")]
    LengthOverrun {
        field: &'static str,
        declared: usize,
        remaining: usize,
    },

    #[error("{0} trailing bytes after operation payload")]
    TrailingBytes(usize),
}

/// Errors from walking or resolving a chain.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    /// A blob in the chain failed to decode. `position` is the blob's index
    /// counted from the oldest end of the chain.
    #[error("malformed operation in blob {position}: {source}")]
    MalformedOperation {
        position: usize,
        source: CodecError,
    },
}
