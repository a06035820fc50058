//! Reusable store fixtures.
//!
//! - [`memory_store`]: a fresh in-memory backend behind `Arc<dyn Store>`.
//! - [`seed_grid`]: write a grid's metadata record directly, bypassing
//!   validation, to model data written by other instances or versions.
//! - [`seed_cell`]: write a raw cell entry directly.

use std::sync::Arc;

use gridlock_core::{encode_dimensions, GridId};
use gridlock_store::{GridRecord, MemoryStore, Store};

/// A fresh [`MemoryStore`] as a shared trait object.
pub fn memory_store() -> Arc<dyn Store> {
    Arc::new(MemoryStore::new())
}

/// Store a metadata record for `id` with the given dimensions and raw
/// default string.
pub async fn seed_grid(store: &dyn Store, id: &GridId, dimensions: &[i64], default_value: &str) {
    let record = GridRecord {
        dimensions: encode_dimensions(dimensions),
        default_value: default_value.to_string(),
    };
    if let Err(e) = store.put_grid(id, record).await {
        panic!("seeding grid {id} failed: {e}");
    }
}

/// Store a raw `(key, value)` cell entry for `id`.
pub async fn seed_cell(store: &dyn Store, id: &GridId, key: &str, raw_value: &str) {
    match store.set_cell_if_absent(id, key, raw_value).await {
        Ok(true) => {}
        Ok(false) => panic!("cell {key} of {id} already seeded"),
        Err(e) => panic!("seeding cell {key} of {id} failed: {e}"),
    }
}
