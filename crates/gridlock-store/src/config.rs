//! Store configuration, validation, and backend construction.

use std::sync::Arc;
use std::time::Duration;

use redis::{ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use thiserror::Error;
use tracing::info;

use crate::error::StoreError;
use crate::memory::{MemoryStore, DEFAULT_EVENT_BUFFER};
use crate::redis_store::RedisStore;
use crate::store::Store;

/// Default bound on every backend operation.
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(5);

/// Which backend to run against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local [`MemoryStore`]. State is lost on exit and not
    /// shared between instances.
    Memory,
    /// Shared [`RedisStore`].
    Redis {
        /// Server address, `host:port`.
        addr: String,
        /// AUTH password; `None` skips authentication.
        password: Option<String>,
        /// Logical database index.
        db: i64,
    },
}

impl StoreBackend {
    /// Build a Redis backend from its address parts. An empty password
    /// means none.
    pub fn redis(addr: &str, password: &str, db: i64) -> Self {
        Self::Redis {
            addr: addr.to_string(),
            password: (!password.is_empty()).then(|| password.to_string()),
            db,
        }
    }
}

fn redis_connection_info(
    addr: &str,
    password: Option<&str>,
    db: i64,
) -> Result<ConnectionInfo, ConfigError> {
    let invalid = || ConfigError::InvalidRedisAddr {
        addr: addr.to_string(),
    };
    let (host, port) = addr.rsplit_once(':').ok_or_else(invalid)?;
    let port: u16 = port.parse().map_err(|_| invalid())?;
    if host.is_empty() {
        return Err(invalid());
    }
    Ok(ConnectionInfo {
        addr: ConnectionAddr::Tcp(host.to_string(), port),
        redis: RedisConnectionInfo {
            db,
            password: password.map(str::to_string),
            ..RedisConnectionInfo::default()
        },
    })
}

/// Configuration consumed by [`connect`].
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Backend selection. Default: memory.
    pub backend: StoreBackend,
    /// Bound on each backend operation. Default: 5 s.
    pub op_timeout: Duration,
    /// Per-subscriber buffer for the memory backend's topics. Default: 256.
    pub event_buffer: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            op_timeout: DEFAULT_OP_TIMEOUT,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl StoreConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.op_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.event_buffer == 0 {
            return Err(ConfigError::ZeroEventBuffer);
        }
        if let StoreBackend::Redis { addr, password, db } = &self.backend {
            redis_connection_info(addr, password.as_deref(), *db)?;
        }
        Ok(())
    }
}

/// Errors detected by [`StoreConfig::validate`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `op_timeout` is zero.
    #[error("store operation timeout must be non-zero")]
    ZeroTimeout,
    /// `event_buffer` is zero.
    #[error("event buffer must hold at least one event")]
    ZeroEventBuffer,
    /// The Redis address is not `host:port`.
    #[error("invalid redis address {addr:?}, expected host:port")]
    InvalidRedisAddr {
        /// The rejected address.
        addr: String,
    },
}

/// Validate `config` and open the selected backend.
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn Store>, StoreError> {
    config.validate()?;
    let store: Arc<dyn Store> = match &config.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::with_event_buffer(config.event_buffer)),
        StoreBackend::Redis { addr, password, db } => {
            let info = redis_connection_info(addr, password.as_deref(), *db)?;
            Arc::new(RedisStore::connect(info, config.op_timeout).await?)
        }
    };
    info!(backend = store.backend_name(), "store ready");
    Ok(store)
}
