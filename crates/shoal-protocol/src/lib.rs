//! Entity message protocol for the Shoal clustered store.
//!
//! Clients talk to a server-side store entity through a small set of
//! framed messages: every request names a store alias and carries one
//! store-level operation; every response carries a status byte and either
//! a chain or an error descriptor. The framing is length-prefixed binary
//! with big-endian integers and no trailing delimiters.

pub mod codec;
pub mod endpoint;
pub mod error;
pub mod message;

pub use codec::EntityCodec;
pub use endpoint::HealthResponse;
pub use error::{ProtocolError, ProtocolResult};
pub use message::{
    EntityRequest, EntityResponse, ResponseStatus, StoreRequest, MAX_FRAME_SIZE, PROTOCOL_VERSION,
};
