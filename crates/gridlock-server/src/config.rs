//! Command-line and environment configuration.

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use gridlock_store::memory::DEFAULT_EVENT_BUFFER;
use gridlock_store::{StoreBackend, StoreConfig};

/// Which store backend to run against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// Process-local; state is lost on exit.
    Memory,
    /// Shared Redis server.
    Redis,
}

/// Log line format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// Gridlock server options.
#[derive(Debug, Parser)]
#[command(
    name = "gridlock-server",
    version,
    about = "Real-time N-dimensional grid claim server"
)]
pub struct Args {
    /// Address to listen on.
    #[arg(long, env = "GRIDLOCK_BIND", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// Store backend.
    #[arg(long, env = "GRIDLOCK_STORE", value_enum, default_value_t = StoreKind::Redis)]
    pub store: StoreKind,

    /// Redis `host:port`.
    #[arg(long, env = "REDIS_ADDR", default_value = "localhost:6379")]
    pub redis_addr: String,

    /// Redis password; empty for none.
    #[arg(long, env = "REDIS_PASSWORD", default_value = "", hide_env_values = true)]
    pub redis_password: String,

    /// Redis logical database.
    #[arg(long, env = "REDIS_DB", default_value_t = 0)]
    pub redis_db: i64,

    /// Bound on each store operation, in milliseconds.
    #[arg(long, default_value_t = 5000)]
    pub store_timeout_ms: u64,

    /// Per-subscriber event buffer of the memory backend.
    #[arg(long, default_value_t = DEFAULT_EVENT_BUFFER)]
    pub event_buffer: usize,

    /// Log filter directive (e.g. `info`, `gridlock_engine=debug`).
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log line format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Listener settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind: SocketAddr,
}

impl Args {
    /// Store settings selected by these options.
    pub fn store_config(&self) -> StoreConfig {
        let backend = match self.store {
            StoreKind::Memory => StoreBackend::Memory,
            StoreKind::Redis => {
                StoreBackend::redis(&self.redis_addr, &self.redis_password, self.redis_db)
            }
        };
        StoreConfig {
            backend,
            op_timeout: Duration::from_millis(self.store_timeout_ms),
            event_buffer: self.event_buffer,
        }
    }

    /// Listener settings selected by these options.
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig { bind: self.bind }
    }
}
