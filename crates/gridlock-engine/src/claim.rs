//! First-claim-wins cell writes.
//!
//! A claim is one call to
//! [`Store::set_cell_if_absent`](gridlock_store::Store::set_cell_if_absent).
//! The engine never reads a cell before writing it, so the store's
//! atomic primitive is the only arbiter between racing claimants.

use std::sync::Arc;

use gridlock_core::{decode_coord, encode_coord, CellView, GridError, GridId, Value};
use gridlock_store::Store;
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::metrics::EngineMetrics;
use crate::registry::GridRegistry;

/// Conditional writes, releases, and listings of claimed cells.
#[derive(Clone)]
pub struct ClaimEngine {
    registry: GridRegistry,
    store: Arc<dyn Store>,
    metrics: Arc<EngineMetrics>,
}

impl ClaimEngine {
    /// Create an engine sharing `registry`'s store.
    pub fn new(registry: GridRegistry, store: Arc<dyn Store>, metrics: Arc<EngineMetrics>) -> Self {
        Self {
            registry,
            store,
            metrics,
        }
    }

    /// Claim the cell at `coord` with `value`.
    ///
    /// Fails with [`GridError::CellAlreadySet`] if any value is already
    /// stored there, including one written by a concurrent caller that
    /// won the race. Publishes nothing.
    pub async fn claim(&self, id: &GridId, coord: &[i64], value: &Value) -> Result<(), EngineError> {
        self.registry.get_validated(id, coord).await?;
        let key = encode_coord(coord);
        let won = self
            .store
            .set_cell_if_absent(id, &key, &value.to_string())
            .await?;
        if !won {
            self.metrics.claim_conflict();
            debug!(grid_id = %id, coord = %key, "claim lost");
            return Err(GridError::CellAlreadySet.into());
        }
        self.metrics.claim_won();
        debug!(grid_id = %id, coord = %key, "cell claimed");
        Ok(())
    }

    /// Release the cell at `coord`.
    ///
    /// Succeeds whether or not the cell was claimed. Returns `true` if a
    /// stored value was actually removed.
    pub async fn release(&self, id: &GridId, coord: &[i64]) -> Result<bool, EngineError> {
        self.registry.get_validated(id, coord).await?;
        let key = encode_coord(coord);
        let removed = self.store.delete_cell(id, &key).await?;
        if removed {
            self.metrics.released();
            debug!(grid_id = %id, coord = %key, "cell released");
        }
        Ok(removed)
    }

    /// Every currently claimed cell of a grid, in store order.
    pub async fn list_cells(&self, id: &GridId) -> Result<Vec<CellView>, EngineError> {
        self.registry.get_grid(id).await?;
        self.cells_of(id).await
    }

    /// List cells without re-checking that the grid exists.
    pub(crate) async fn cells_of(&self, id: &GridId) -> Result<Vec<CellView>, EngineError> {
        let entries = self.store.list_cells(id).await?;
        let mut cells = Vec::with_capacity(entries.len());
        for (key, raw) in entries {
            let coord = match decode_coord(&key) {
                Ok(coord) => coord,
                Err(e) => {
                    warn!(grid_id = %id, error = %e, "skipping unreadable cell key");
                    continue;
                }
            };
            let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
            cells.push(CellView { coord, value });
        }
        Ok(cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridlock_store::MemoryStore;
    use serde_json::json;
    use smallvec::smallvec;

    async fn engine() -> (ClaimEngine, GridId, Arc<MemoryStore>, Arc<EngineMetrics>) {
        let store = Arc::new(MemoryStore::new());
        let metrics = Arc::new(EngineMetrics::new());
        let registry = GridRegistry::new(store.clone(), Arc::clone(&metrics));
        let grid = registry.create_grid(vec![2, 2], None).await.unwrap();
        let engine = ClaimEngine::new(registry, store.clone(), Arc::clone(&metrics));
        (engine, grid.id, store, metrics)
    }

    #[tokio::test]
    async fn second_claim_conflicts() {
        let (engine, id, _, metrics) = engine().await;
        engine.claim(&id, &[0, 1], &json!("held:a")).await.unwrap();
        let err = engine.claim(&id, &[0, 1], &json!("held:b")).await.unwrap_err();
        assert!(err.is_conflict());
        let snap = metrics.snapshot();
        assert_eq!(snap.claims_won, 1);
        assert_eq!(snap.claim_conflicts, 1);
        assert_eq!(
            engine.list_cells(&id).await.unwrap(),
            vec![CellView {
                coord: smallvec![0, 1],
                value: json!("held:a"),
            }]
        );
    }

    #[tokio::test]
    async fn release_is_idempotent() {
        let (engine, id, _, metrics) = engine().await;
        assert!(!engine.release(&id, &[1, 1]).await.unwrap());
        engine.claim(&id, &[1, 1], &json!(7)).await.unwrap();
        assert!(engine.release(&id, &[1, 1]).await.unwrap());
        assert!(!engine.release(&id, &[1, 1]).await.unwrap());
        assert_eq!(metrics.snapshot().releases, 1);
        assert!(engine.list_cells(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_coords_never_touch_cells() {
        let (engine, id, store, _) = engine().await;
        let coords: [&[i64]; 3] = [&[2, 0], &[-1, 0], &[0]];
        for coord in coords {
            let err = engine.claim(&id, coord, &json!(1)).await.unwrap_err();
            assert!(matches!(
                err,
                EngineError::Grid(GridError::OutOfBounds { .. } | GridError::DimensionMismatch { .. })
            ));
        }
        assert!(store.list_cells(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn listing_tolerates_corrupt_entries() {
        let (engine, id, store, _) = engine().await;
        store.set_cell_if_absent(&id, "0:0", "{\"k\":1}").await.unwrap();
        store.set_cell_if_absent(&id, "0:x", "1").await.unwrap();
        store.set_cell_if_absent(&id, "1:0", "not json").await.unwrap();
        let cells = engine.list_cells(&id).await.unwrap();
        assert_eq!(
            cells,
            vec![
                CellView {
                    coord: smallvec![0, 0],
                    value: json!({"k": 1}),
                },
                CellView {
                    coord: smallvec![1, 0],
                    value: json!("not json"),
                },
            ]
        );
    }

    #[tokio::test]
    async fn structured_values_pass_through() {
        let (engine, id, _, _) = engine().await;
        let value = json!({"owner": "a", "tags": [1, true, null]});
        engine.claim(&id, &[1, 0], &value).await.unwrap();
        assert_eq!(engine.list_cells(&id).await.unwrap()[0].value, value);
    }
}
