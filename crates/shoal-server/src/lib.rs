//! Server side of the Shoal clustered store.
//!
//! The server is deliberately minimal: it never interprets operation
//! payloads. Each named store is a map from key hash to a chain of opaque
//! blobs, and the only primitives are an atomic append-and-fetch, an
//! exact-prefix head replacement (the compaction CAS), and clear. All
//! mapping semantics live in the clients, which fold chains independently
//! and deterministically to the same answers.
//!
//! # Concurrency
//!
//! Each bucket behaves as if serialized by a per-bucket lock; operations on
//! different buckets are independent, and no cross-bucket ordering is
//! guaranteed or observable.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod service;
pub mod store;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::ShoalServer;
pub use service::{EntityService, StoreRegistry};
pub use store::ChainStore;
