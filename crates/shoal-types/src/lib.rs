//! Foundation types for the Shoal clustered store.
//!
//! This crate provides the key hashing, serialization, and clock types used
//! throughout the Shoal system. Every other Shoal crate depends on
//! `shoal-types`.
//!
//! # Key Types
//!
//! - [`KeyHash`] — 64-bit bucket selector derived from serialized key bytes
//! - [`KeyHasher`] — domain-separated BLAKE3 hasher producing [`KeyHash`]es
//! - [`Serializer`] — byte-encoder seam for opaque key and value types
//! - [`WriteClock`] — monotonic millisecond clock for operation timestamps

pub mod clock;
pub mod error;
pub mod hash;
pub mod serializer;

pub use clock::WriteClock;
pub use error::TypeError;
pub use hash::{KeyHash, KeyHasher};
pub use serializer::{IdentitySerializer, Serializer, StringSerializer};
