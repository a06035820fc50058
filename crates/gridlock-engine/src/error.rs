//! Error type returned by engine operations.

use gridlock_core::GridError;
use gridlock_store::StoreError;
use thiserror::Error;

/// Either a domain outcome ([`GridError`]) or an infrastructure
/// failure ([`StoreError`]).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Validation, lookup, or claim-conflict outcome.
    #[error(transparent)]
    Grid(#[from] GridError),
    /// The backing store failed or returned unreadable data.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Whether this is the routine losing side of a claim race.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Grid(GridError::CellAlreadySet))
    }

    /// Whether the grid does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Grid(GridError::GridNotFound { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_conflict_and_not_found() {
        assert!(EngineError::from(GridError::CellAlreadySet).is_conflict());
        assert!(EngineError::from(GridError::GridNotFound { id: "g".into() }).is_not_found());
        let store = EngineError::from(StoreError::Unavailable {
            reason: "down".into(),
        });
        assert!(!store.is_conflict());
        assert!(!store.is_not_found());
        assert_eq!(store.to_string(), "store unavailable: down");
    }
}
