//! Claim coordination engine for Gridlock.
//!
//! Provides the three stateful components of the system and the
//! [`GridService`] facade that composes them:
//!
//! - [`GridRegistry`]: grid creation, lookup, and metadata decoding
//! - [`ClaimEngine`]: first-claim-wins conditional writes and releases
//! - [`EventFanout`]: best-effort publication and live subscriptions
//!
//! No grid or cell state is cached in-process; every read goes to the
//! [`Store`](gridlock_store::Store), so any number of engine instances
//! may share one backend.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod claim;
pub mod error;
pub mod fanout;
pub mod metrics;
pub mod registry;
pub mod service;

pub use claim::ClaimEngine;
pub use error::EngineError;
pub use fanout::{EventFanout, Subscription};
pub use metrics::{EngineMetrics, MetricsSnapshot};
pub use registry::GridRegistry;
pub use service::{GridService, GridState};
