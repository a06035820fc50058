//! Error types for storage backends.

use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;

/// Infrastructure failures reported by a [`Store`](crate::Store).
///
/// None of these are retried by the engine; retry policy belongs to
/// the caller.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backend rejected the command or the connection failed.
    #[error("store unavailable: {reason}")]
    Unavailable {
        /// Backend-provided description.
        reason: String,
    },
    /// The operation did not complete within the configured timeout.
    #[error("store operation {op} timed out after {after:?}")]
    Timeout {
        /// Name of the backend command.
        op: &'static str,
        /// The timeout that elapsed.
        after: Duration,
    },
    /// Stored data could not be interpreted.
    #[error("corrupt stored data: {reason}")]
    Corrupt {
        /// What failed to parse.
        reason: String,
    },
    /// The store configuration is invalid.
    #[error("invalid store configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}
