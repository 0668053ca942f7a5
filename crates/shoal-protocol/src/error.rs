use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("framing error: {0}")]
    Framing(String),

    /// The peer sent a message opcode this side does not implement. On the
    /// client this is a configuration incompatibility (an older server saw
    /// a newer opcode).
    #[error("unsupported message opcode {0:#04x}")]
    UnsupportedOpcode(u8),

    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
