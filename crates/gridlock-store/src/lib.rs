//! Storage backends for the Gridlock claim server.
//!
//! The engine needs only a handful of primitives from its store: a
//! per-grid metadata record, an atomic set-if-absent on a single cell
//! field, field deletion and listing, and topic publish/subscribe.
//! [`Store`] captures exactly that seam.
//!
//! # Backends
//!
//! - [`MemoryStore`]: process-local, for single-instance deployments and tests
//! - [`RedisStore`]: shared Redis, for horizontally scaled deployments

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod memory;
pub mod redis_store;
pub mod store;

pub use config::{connect, ConfigError, StoreBackend, StoreConfig};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use store::{EventStream, GridRecord, Store};
