//! The [`Store`] trait: the only storage surface the engine relies on.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use gridlock_core::GridId;

use crate::error::StoreError;

/// A live stream of raw topic payloads.
///
/// Dropping the stream releases the underlying subscription.
pub type EventStream = BoxStream<'static, String>;

/// Serialized grid metadata as persisted by a backend.
///
/// Both fields are opaque strings to the store. An empty
/// `default_value` means the grid has no default.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GridRecord {
    /// Encoded dimensions list (`"3,3"`).
    pub dimensions: String,
    /// JSON-serialized default value, or empty.
    pub default_value: String,
}

/// Storage primitives required by the claim engine.
///
/// Implementations must be safe to share across all request handlers.
/// Every method is a suspension point; callers never hold in-process
/// locks across them.
///
/// # Atomicity
///
/// [`set_cell_if_absent`](Store::set_cell_if_absent) must perform its
/// existence check and write as one indivisible step with respect to all
/// other callers targeting the same `(grid, field)`. A read followed by a
/// separate write is not an acceptable implementation.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Persist the metadata record of a grid.
    async fn put_grid(&self, id: &GridId, record: GridRecord) -> Result<(), StoreError>;

    /// Load the metadata record of a grid, `None` if it does not exist.
    async fn get_grid(&self, id: &GridId) -> Result<Option<GridRecord>, StoreError>;

    /// Set `field` to `value` only if it currently has no value.
    ///
    /// Returns `true` if this call performed the write and `false` if
    /// the field was already set.
    async fn set_cell_if_absent(
        &self,
        id: &GridId,
        field: &str,
        value: &str,
    ) -> Result<bool, StoreError>;

    /// Remove `field` if present. Returns whether anything was removed.
    async fn delete_cell(&self, id: &GridId, field: &str) -> Result<bool, StoreError>;

    /// All `(field, value)` pairs currently set for a grid.
    async fn list_cells(&self, id: &GridId) -> Result<Vec<(String, String)>, StoreError>;

    /// Broadcast a payload to the current subscribers of `topic`.
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), StoreError>;

    /// Open a live subscription to `topic`.
    ///
    /// Only payloads published after this call returns are delivered.
    async fn subscribe(&self, topic: &str) -> Result<EventStream, StoreError>;
}
