use thiserror::Error;

use shoal_chain::ChainError;
use shoal_protocol::{ProtocolError, ResponseStatus};
use shoal_types::TypeError;

#[derive(Debug, Error)]
pub enum ClientError {
    /// A user-provided serializer rejected a key or value.
    #[error(transparent)]
    Serialization(#[from] TypeError),

    /// A chain returned by the server contained a malformed blob.
    #[error(transparent)]
    Malformed(#[from] ChainError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The round-trip exceeded the call deadline. For mutating calls the
    /// outcome is unknown: the server may or may not have appended, and
    /// only a subsequent `get` can clarify.
    #[error("call timed out after {elapsed_ms} ms; outcome unknown")]
    Timeout { elapsed_ms: u64 },

    /// The endpoint is closed or the store alias is unknown to the server.
    #[error("entity unavailable: {0}")]
    EntityUnavailable(String),

    /// An older server rejected a message opcode it does not implement.
    /// This is a configuration incompatibility, not a transient failure.
    #[error("incompatible server: {0}")]
    IncompatibleServer(String),

    #[error("server error ({status:?}): {message}")]
    Server {
        status: ResponseStatus,
        message: String,
    },
}

pub type ClientResult<T> = Result<T, ClientError>;
