//! Append-log model for the Shoal clustered store.
//!
//! Every mutation of a cached mapping is expressed as an [`Operation`],
//! encoded by the [`OperationCodec`] into a [`Blob`], and appended to the
//! server-side [`Chain`] of the key's hash bucket. The current value of a
//! key is never stored anywhere: it is recomputed on demand by the
//! [`Resolver`], a deterministic fold of the chain.
//!
//! # Design Rules
//!
//! 1. The operation sum is closed at the wire level. Adding a variant is a
//!    coordinated client/server change that reserves a new opcode; existing
//!    opcode layouts are never mutated or reused.
//! 2. `Operation::apply` is pure, total, and deterministic — the property
//!    that makes the fold well-defined and lets every observer of a chain
//!    reach the same answer independently.
//! 3. Only operations whose key bytes equal the target key influence its
//!    resolution; hash collisions within a bucket are therefore harmless.
//! 4. Compaction ([`Compactor`]) is equivalence-preserving and optional;
//!    resolution must agree with and without it.

pub mod chain;
pub mod codec;
pub mod compaction;
pub mod error;
pub mod operation;
pub mod resolver;

pub use chain::{Blob, Chain, ChainDecoder};
pub use codec::{OpcodeTable, OperationCodec};
pub use compaction::Compactor;
pub use error::{ChainError, CodecError};
pub use operation::{Opcode, Operation};
pub use resolver::{MalformedPolicy, Resolver};
