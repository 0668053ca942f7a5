//! Client side of the Shoal clustered store.
//!
//! [`StoreProxy`] is the caller-facing facade: it translates key-level
//! cache operations into appends against the server's per-key-hash chains
//! and computes every answer from the chains the server returns. The
//! critical design move is that conditional operations (`put_if_absent`,
//! `replace`, `replace_conditional`) need no server-side logic: the server
//! returns the chain as it was immediately before the append, and the
//! outcome is a pure function of that pre-chain plus the operation the
//! client authored — every later observer folds the same operation to the
//! same answer.

pub mod error;
pub mod proxy;
pub mod transport;

pub use error::{ClientError, ClientResult};
pub use proxy::{ProxyConfig, StoreProxy};
pub use transport::{EntityTransport, FrameTransport};
