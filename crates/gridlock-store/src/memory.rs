//! Process-local store backed by a mutex-guarded map.
//!
//! All grid state lives behind a single [`Mutex`] that is only held for
//! the duration of a map operation, never across an `.await`. Holding
//! the lock for the whole check-and-insert is what makes
//! [`set_cell_if_absent`](Store::set_cell_if_absent) atomic here.
//!
//! Topics are `tokio::sync::broadcast` channels created on first
//! subscribe and dropped as soon as their last subscriber goes away.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures_util::future::ready;
use futures_util::{Stream, StreamExt};
use gridlock_core::GridId;
use indexmap::IndexMap;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::store::{EventStream, GridRecord, Store};

/// Default per-topic broadcast buffer.
pub const DEFAULT_EVENT_BUFFER: usize = 256;

#[derive(Default)]
struct GridTables {
    meta: HashMap<GridId, GridRecord>,
    // Insertion-ordered so listings follow claim order.
    cells: HashMap<GridId, IndexMap<String, String>>,
}

type Topics = Arc<Mutex<HashMap<String, broadcast::Sender<String>>>>;

/// In-memory [`Store`] implementation.
pub struct MemoryStore {
    tables: Mutex<GridTables>,
    topics: Topics,
    event_buffer: usize,
}

/// Subscriber stream that frees its topic once no receivers remain.
struct TopicStream {
    // Declared first so the receiver is gone before the guard runs.
    inner: EventStream,
    _guard: TopicGuard,
}

impl Stream for TopicStream {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<String>> {
        self.inner.poll_next_unpin(cx)
    }
}

struct TopicGuard {
    topics: Topics,
    topic: String,
}

impl Drop for TopicGuard {
    fn drop(&mut self) {
        let mut topics = lock(&self.topics);
        if topics
            .get(&self.topic)
            .is_some_and(|tx| tx.receiver_count() == 0)
        {
            debug!(topic = %self.topic, "last subscriber left, dropping topic");
            topics.remove(&self.topic);
        }
    }
}

// Compile-time assertion: MemoryStore must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<MemoryStore>();
};

impl MemoryStore {
    /// Create an empty store with the default topic buffer.
    pub fn new() -> Self {
        Self::with_event_buffer(DEFAULT_EVENT_BUFFER)
    }

    /// Create an empty store whose topics buffer `event_buffer` payloads
    /// per subscriber before a slow subscriber starts skipping.
    ///
    /// A zero buffer is raised to 1.
    pub fn with_event_buffer(event_buffer: usize) -> Self {
        Self {
            tables: Mutex::new(GridTables::default()),
            topics: Arc::new(Mutex::new(HashMap::new())),
            event_buffer: event_buffer.max(1),
        }
    }

    /// Number of live subscribers on `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        lock(&self.topics)
            .get(topic)
            .map_or(0, broadcast::Sender::receiver_count)
    }

    /// Number of topics currently allocated.
    pub fn topic_count(&self) -> usize {
        lock(&self.topics).len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic while holding the lock cannot leave a map half-updated:
    // every critical section is a single insert/remove/clone.
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl Store for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn put_grid(&self, id: &GridId, record: GridRecord) -> Result<(), StoreError> {
        lock(&self.tables).meta.insert(id.clone(), record);
        Ok(())
    }

    async fn get_grid(&self, id: &GridId) -> Result<Option<GridRecord>, StoreError> {
        Ok(lock(&self.tables).meta.get(id).cloned())
    }

    async fn set_cell_if_absent(
        &self,
        id: &GridId,
        field: &str,
        value: &str,
    ) -> Result<bool, StoreError> {
        let mut tables = lock(&self.tables);
        let cells = tables.cells.entry(id.clone()).or_default();
        if cells.contains_key(field) {
            return Ok(false);
        }
        cells.insert(field.to_string(), value.to_string());
        Ok(true)
    }

    async fn delete_cell(&self, id: &GridId, field: &str) -> Result<bool, StoreError> {
        let mut tables = lock(&self.tables);
        let removed = tables
            .cells
            .get_mut(id)
            .is_some_and(|cells| cells.shift_remove(field).is_some());
        Ok(removed)
    }

    async fn list_cells(&self, id: &GridId) -> Result<Vec<(String, String)>, StoreError> {
        let tables = lock(&self.tables);
        Ok(tables
            .cells
            .get(id)
            .map(|cells| {
                cells
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn publish(&self, topic: &str, payload: &str) -> Result<(), StoreError> {
        let mut topics = lock(&self.topics);
        if let Some(tx) = topics.get(topic) {
            if tx.send(payload.to_string()).is_err() {
                debug!(topic, "no subscribers left, dropping topic");
                topics.remove(topic);
            }
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<EventStream, StoreError> {
        let rx = {
            let mut topics = lock(&self.topics);
            topics
                .entry(topic.to_string())
                .or_insert_with(|| broadcast::channel(self.event_buffer).0)
                .subscribe()
        };
        let guard = TopicGuard {
            topics: Arc::clone(&self.topics),
            topic: topic.to_string(),
        };
        let topic = topic.to_string();
        let inner = BroadcastStream::new(rx)
            .filter_map(move |item| {
                ready(match item {
                    Ok(payload) => Some(payload),
                    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                        warn!(topic = %topic, skipped, "subscriber lagged, events skipped");
                        None
                    }
                })
            })
            .boxed();
        Ok(TopicStream {
            inner,
            _guard: guard,
        }
        .boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn gid() -> GridId {
        GridId::from("g_mem")
    }

    #[tokio::test]
    async fn metadata_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get_grid(&gid()).await.unwrap(), None);
        let record = GridRecord {
            dimensions: "2,2".into(),
            default_value: "\"free\"".into(),
        };
        store.put_grid(&gid(), record.clone()).await.unwrap();
        assert_eq!(store.get_grid(&gid()).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn set_if_absent_only_writes_once() {
        let store = MemoryStore::new();
        assert!(store.set_cell_if_absent(&gid(), "0:0", "1").await.unwrap());
        assert!(!store.set_cell_if_absent(&gid(), "0:0", "2").await.unwrap());
        assert_eq!(
            store.list_cells(&gid()).await.unwrap(),
            vec![("0:0".to_string(), "1".to_string())]
        );
    }

    #[tokio::test]
    async fn delete_reports_whether_removed() {
        let store = MemoryStore::new();
        assert!(!store.delete_cell(&gid(), "0:0").await.unwrap());
        store.set_cell_if_absent(&gid(), "0:0", "1").await.unwrap();
        assert!(store.delete_cell(&gid(), "0:0").await.unwrap());
        assert!(!store.delete_cell(&gid(), "0:0").await.unwrap());
        assert!(store.list_cells(&gid()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn listing_follows_insertion_order() {
        let store = MemoryStore::new();
        for key in ["2:1", "0:0", "1:3"] {
            store.set_cell_if_absent(&gid(), key, "x").await.unwrap();
        }
        let keys: Vec<String> = store
            .list_cells(&gid())
            .await
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, ["2:1", "0:0", "1:3"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_set_if_absent_has_one_winner() {
        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..64)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .set_cell_if_absent(&gid(), "1:1", &i.to_string())
                        .await
                        .unwrap()
                })
            })
            .collect();
        let mut wins = 0;
        for h in handles {
            if h.await.unwrap() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(store.list_cells(&gid()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_ok() {
        let store = MemoryStore::new();
        store.publish("t", "hello").await.unwrap();
        assert_eq!(store.topic_count(), 0);
    }

    #[tokio::test]
    async fn subscriber_receives_only_later_payloads() {
        let store = MemoryStore::new();
        store.publish("t", "before").await.unwrap();
        let mut sub = store.subscribe("t").await.unwrap();
        store.publish("t", "after").await.unwrap();
        assert_eq!(sub.next().await.as_deref(), Some("after"));
    }

    #[tokio::test]
    async fn dropping_stream_releases_topic() {
        let store = MemoryStore::new();
        let sub = store.subscribe("t").await.unwrap();
        assert_eq!(store.subscriber_count("t"), 1);
        drop(sub);
        assert_eq!(store.subscriber_count("t"), 0);
        assert_eq!(store.topic_count(), 0);
    }

    #[tokio::test]
    async fn idle_topics_are_freed_without_publishing() {
        let store = MemoryStore::new();
        for i in 0..1000 {
            let sub = store.subscribe(&format!("grid:g_{i}:events")).await.unwrap();
            drop(sub);
        }
        assert_eq!(store.topic_count(), 0);
    }

    #[tokio::test]
    async fn topic_survives_until_last_subscriber_leaves() {
        let store = MemoryStore::new();
        let first = store.subscribe("t").await.unwrap();
        let mut second = store.subscribe("t").await.unwrap();
        drop(first);
        assert_eq!(store.topic_count(), 1);
        store.publish("t", "still here").await.unwrap();
        assert_eq!(second.next().await.as_deref(), Some("still here"));
        drop(second);
        assert_eq!(store.topic_count(), 0);
    }

    #[tokio::test]
    async fn lagging_subscriber_skips_but_keeps_streaming() {
        let store = MemoryStore::with_event_buffer(2);
        let mut sub = store.subscribe("t").await.unwrap();
        for i in 0..5 {
            store.publish("t", &i.to_string()).await.unwrap();
        }
        // Buffer of 2 keeps only the newest two payloads.
        assert_eq!(sub.next().await.as_deref(), Some("3"));
        assert_eq!(sub.next().await.as_deref(), Some("4"));
    }
}
