//! Redis-backed store.
//!
//! Layout per grid:
//!
//! | Key | Type | Contents |
//! |-----|------|----------|
//! | `grid:{id}:meta` | hash | `dimensions`, `default` |
//! | `grid:{id}:cells` | hash | coordinate key → JSON value |
//! | `grid:{id}:events` | pub/sub channel | JSON [`GridEvent`](gridlock_core::GridEvent) payloads |
//!
//! Commands share one multiplexed connection. Each subscriber gets its
//! own pub/sub connection, closed when its stream is dropped.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::ready;
use futures_util::StreamExt;
use gridlock_core::GridId;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, IntoConnectionInfo, RedisResult, Script};
use tracing::{info, warn};

use crate::error::StoreError;
use crate::store::{EventStream, GridRecord, Store};

const META_DIMENSIONS_FIELD: &str = "dimensions";
const META_DEFAULT_FIELD: &str = "default";

/// Set a hash field only if it is unset, as one server-side step.
///
/// Returns 1 if the field was written, 0 if it already held a value.
const CLAIM_SCRIPT: &str = r#"
local existing = redis.call("HGET", KEYS[1], ARGV[1])
if existing ~= false and existing ~= nil then
  return 0
end
redis.call("HSET", KEYS[1], ARGV[1], ARGV[2])
return 1
"#;

/// [`Store`] implementation on top of a shared Redis server.
pub struct RedisStore {
    client: redis::Client,
    conn: MultiplexedConnection,
    claim_script: Script,
    op_timeout: Duration,
}

impl RedisStore {
    /// Connect to `info`, either a typed [`redis::ConnectionInfo`] or a
    /// `redis://[:password@]host:port/db` URL.
    ///
    /// Every subsequent command, including this initial connect, is
    /// bounded by `op_timeout`.
    pub async fn connect<T: IntoConnectionInfo>(
        info: T,
        op_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = redis::Client::open(info).map_err(unavailable)?;
        let conn = bounded(op_timeout, "CONNECT", client.get_multiplexed_async_connection()).await?;
        info!(timeout_ms = op_timeout.as_millis() as u64, "connected to redis");
        Ok(Self {
            client,
            conn,
            claim_script: Script::new(CLAIM_SCRIPT),
            op_timeout,
        })
    }

    async fn run<T, F>(&self, op: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = RedisResult<T>>,
    {
        bounded(self.op_timeout, op, fut).await
    }
}

async fn bounded<T, F>(after: Duration, op: &'static str, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = RedisResult<T>>,
{
    match tokio::time::timeout(after, fut).await {
        Ok(result) => result.map_err(unavailable),
        Err(_) => Err(StoreError::Timeout { op, after }),
    }
}

fn unavailable(e: redis::RedisError) -> StoreError {
    StoreError::Unavailable {
        reason: e.to_string(),
    }
}

#[async_trait]
impl Store for RedisStore {
    fn backend_name(&self) -> &'static str {
        "redis"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let pong: String = self
            .run("PING", redis::cmd("PING").query_async(&mut conn))
            .await?;
        if pong != "PONG" {
            return Err(StoreError::Unavailable {
                reason: format!("unexpected PING reply {pong:?}"),
            });
        }
        Ok(())
    }

    async fn put_grid(&self, id: &GridId, record: GridRecord) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let key = id.meta_key();
        let fields = [
            (META_DIMENSIONS_FIELD, record.dimensions.as_str()),
            (META_DEFAULT_FIELD, record.default_value.as_str()),
        ];
        self.run("HSET", conn.hset_multiple(&key, &fields)).await
    }

    async fn get_grid(&self, id: &GridId) -> Result<Option<GridRecord>, StoreError> {
        let mut conn = self.conn.clone();
        let key = id.meta_key();
        let mut vals: HashMap<String, String> = self.run("HGETALL", conn.hgetall(&key)).await?;
        if vals.is_empty() {
            return Ok(None);
        }
        Ok(Some(GridRecord {
            dimensions: vals.remove(META_DIMENSIONS_FIELD).unwrap_or_default(),
            default_value: vals.remove(META_DEFAULT_FIELD).unwrap_or_default(),
        }))
    }

    async fn set_cell_if_absent(
        &self,
        id: &GridId,
        field: &str,
        value: &str,
    ) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let mut invocation = self.claim_script.prepare_invoke();
        invocation.key(id.cells_key()).arg(field).arg(value);
        let written: i64 = self
            .run("EVALSHA", invocation.invoke_async(&mut conn))
            .await?;
        Ok(written == 1)
    }

    async fn delete_cell(&self, id: &GridId, field: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let key = id.cells_key();
        let removed: i64 = self.run("HDEL", conn.hdel(&key, field)).await?;
        Ok(removed > 0)
    }

    async fn list_cells(&self, id: &GridId) -> Result<Vec<(String, String)>, StoreError> {
        let mut conn = self.conn.clone();
        let key = id.cells_key();
        let entries: HashMap<String, String> = self.run("HGETALL", conn.hgetall(&key)).await?;
        Ok(entries.into_iter().collect())
    }

    async fn publish(&self, topic: &str, payload: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _receivers: i64 = self.run("PUBLISH", conn.publish(topic, payload)).await?;
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<EventStream, StoreError> {
        let mut pubsub = self.run("CONNECT", self.client.get_async_pubsub()).await?;
        self.run("SUBSCRIBE", pubsub.subscribe(topic)).await?;
        let topic = topic.to_string();
        let stream = pubsub.into_on_message().filter_map(move |msg| {
            ready(match msg.get_payload::<String>() {
                Ok(payload) => Some(payload),
                Err(e) => {
                    warn!(topic = %topic, error = %e, "dropping non-text pub/sub payload");
                    None
                }
            })
        });
        Ok(stream.boxed())
    }
}
