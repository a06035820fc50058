//! Test utilities and fault-injecting stores for Gridlock development.
//!
//! Provides [`FlakyStore`], a [`Store`] wrapper whose operations can be
//! made to fail on demand, and the [`fixtures`] module with small
//! builders for common test setups.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use gridlock_core::GridId;
use gridlock_store::{EventStream, GridRecord, MemoryStore, Store, StoreError};

/// A [`Store`] that delegates to an inner store unless told to fail.
///
/// Failures are reported as [`StoreError::Unavailable`]. Toggle them
/// with [`fail_publish`](FlakyStore::fail_publish) and
/// [`fail_all`](FlakyStore::fail_all); inspect how often each primitive
/// was reached with the `*_calls` accessors.
pub struct FlakyStore {
    inner: Arc<dyn Store>,
    fail_publish: AtomicBool,
    fail_all: AtomicBool,
    publish_calls: AtomicUsize,
    write_calls: AtomicUsize,
    subscribe_calls: AtomicUsize,
}

impl FlakyStore {
    /// Wrap `inner` with all faults disabled.
    pub fn new(inner: Arc<dyn Store>) -> Self {
        Self {
            inner,
            fail_publish: AtomicBool::new(false),
            fail_all: AtomicBool::new(false),
            publish_calls: AtomicUsize::new(0),
            write_calls: AtomicUsize::new(0),
            subscribe_calls: AtomicUsize::new(0),
        }
    }

    /// Wrap a fresh [`MemoryStore`].
    pub fn over_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Make every `publish` fail while `on` is set.
    pub fn fail_publish(&self, on: bool) {
        self.fail_publish.store(on, Ordering::SeqCst);
    }

    /// Make every operation fail while `on` is set.
    pub fn fail_all(&self, on: bool) {
        self.fail_all.store(on, Ordering::SeqCst);
    }

    /// Number of `publish` calls received, failed or not.
    pub fn publish_calls(&self) -> usize {
        self.publish_calls.load(Ordering::SeqCst)
    }

    /// Number of cell writes and deletes received, failed or not.
    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    /// Number of `subscribe` calls received, failed or not.
    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    fn check(&self, op: &str) -> Result<(), StoreError> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(injected(op));
        }
        Ok(())
    }
}

fn injected(op: &str) -> StoreError {
    StoreError::Unavailable {
        reason: format!("injected {op} failure"),
    }
}

#[async_trait]
impl Store for FlakyStore {
    fn backend_name(&self) -> &'static str {
        "flaky"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check("ping")?;
        self.inner.ping().await
    }

    async fn put_grid(&self, id: &GridId, record: GridRecord) -> Result<(), StoreError> {
        self.check("put_grid")?;
        self.inner.put_grid(id, record).await
    }

    async fn get_grid(&self, id: &GridId) -> Result<Option<GridRecord>, StoreError> {
        self.check("get_grid")?;
        self.inner.get_grid(id).await
    }

    async fn set_cell_if_absent(
        &self,
        id: &GridId,
        field: &str,
        value: &str,
    ) -> Result<bool, StoreError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.check("set_cell_if_absent")?;
        self.inner.set_cell_if_absent(id, field, value).await
    }

    async fn delete_cell(&self, id: &GridId, field: &str) -> Result<bool, StoreError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.check("delete_cell")?;
        self.inner.delete_cell(id, field).await
    }

    async fn list_cells(&self, id: &GridId) -> Result<Vec<(String, String)>, StoreError> {
        self.check("list_cells")?;
        self.inner.list_cells(id).await
    }

    async fn publish(&self, topic: &str, payload: &str) -> Result<(), StoreError> {
        self.publish_calls.fetch_add(1, Ordering::SeqCst);
        self.check("publish")?;
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(injected("publish"));
        }
        self.inner.publish(topic, payload).await
    }

    async fn subscribe(&self, topic: &str) -> Result<EventStream, StoreError> {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        self.check("subscribe")?;
        self.inner.subscribe(topic).await
    }
}
