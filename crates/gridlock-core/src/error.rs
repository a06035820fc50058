//! Error types for grid operations.
//!
//! Validation errors are caller mistakes and are never retried.
//! [`GridError::CellAlreadySet`] is the routine losing side of a claim
//! race. [`GridError::MalformedKey`] indicates corrupt stored data and
//! is kept internal to the engine.

use thiserror::Error;

/// Errors arising from grid creation, lookup, and cell addressing.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    /// `dimensions` is empty or contains a non-positive entry.
    #[error("invalid dimensions: {reason}")]
    InvalidDimensions {
        /// What was wrong with the requested dimensions.
        reason: String,
    },
    /// No metadata exists for the requested grid.
    #[error("grid not found")]
    GridNotFound {
        /// The identifier that was looked up.
        id: String,
    },
    /// The coordinate has a different number of axes than the grid.
    #[error("coord dimension mismatch: expected {expected} axes, got {got}")]
    DimensionMismatch {
        /// Axis count of the grid.
        expected: usize,
        /// Axis count of the coordinate.
        got: usize,
    },
    /// A coordinate component lies outside `[0, dimensions[axis])`.
    #[error("coord out of bounds: axis {axis} value {value} not in [0, {bound})")]
    OutOfBounds {
        /// Index of the offending axis.
        axis: usize,
        /// The offending component.
        value: i64,
        /// Exclusive upper bound of that axis.
        bound: i64,
    },
    /// The cell is already claimed.
    #[error("cell already set")]
    CellAlreadySet,
    /// A stored coordinate key could not be decoded.
    #[error("malformed coordinate key {key:?}")]
    MalformedKey {
        /// The raw stored key.
        key: String,
    },
}

impl GridError {
    /// Whether this error is a caller-side validation failure.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidDimensions { .. } | Self::DimensionMismatch { .. } | Self::OutOfBounds { .. }
        )
    }
}
