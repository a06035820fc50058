//! The facade used by request handlers.

use std::sync::Arc;

use gridlock_core::{encode_coord, CellView, Grid, GridEvent, GridId, Value};
use gridlock_store::{Store, StoreError};
use smallvec::SmallVec;
use tracing::debug;

use crate::claim::ClaimEngine;
use crate::error::EngineError;
use crate::fanout::{EventFanout, Subscription};
use crate::metrics::{EngineMetrics, MetricsSnapshot};
use crate::registry::GridRegistry;

/// A grid together with its currently claimed cells.
#[derive(Clone, Debug, PartialEq)]
pub struct GridState {
    /// Grid metadata.
    pub grid: Grid,
    /// Claimed cells, in store order.
    pub cells: Vec<CellView>,
}

/// Registry, claim engine, and fan-out over one shared store.
///
/// Cheap to clone; every clone shares the same store handle and
/// counters. Mutations publish their event only after the store has
/// confirmed the write.
#[derive(Clone)]
pub struct GridService {
    store: Arc<dyn Store>,
    registry: GridRegistry,
    claims: ClaimEngine,
    fanout: EventFanout,
    metrics: Arc<EngineMetrics>,
}

// Compile-time assertion: GridService must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<GridService>();
};

impl GridService {
    /// Build a service over `store`.
    pub fn new(store: Arc<dyn Store>) -> Self {
        let metrics = Arc::new(EngineMetrics::new());
        let registry = GridRegistry::new(Arc::clone(&store), Arc::clone(&metrics));
        let claims = ClaimEngine::new(registry.clone(), Arc::clone(&store), Arc::clone(&metrics));
        let fanout = EventFanout::new(Arc::clone(&store), Arc::clone(&metrics));
        Self {
            store,
            registry,
            claims,
            fanout,
            metrics,
        }
    }

    /// Create a grid. See [`GridRegistry::create_grid`].
    pub async fn create_grid(
        &self,
        dimensions: Vec<i64>,
        default_value: Option<Value>,
    ) -> Result<Grid, EngineError> {
        self.registry.create_grid(dimensions, default_value).await
    }

    /// Load a grid's metadata.
    pub async fn get_grid(&self, id: &GridId) -> Result<Grid, EngineError> {
        self.registry.get_grid(id).await
    }

    /// Load a grid and all of its claimed cells.
    pub async fn grid_state(&self, id: &GridId) -> Result<GridState, EngineError> {
        let grid = self.registry.get_grid(id).await?;
        let cells = self.claims.cells_of(id).await?;
        Ok(GridState { grid, cells })
    }

    /// Claimed cells of a grid.
    pub async fn list_cells(&self, id: &GridId) -> Result<Vec<CellView>, EngineError> {
        self.claims.list_cells(id).await
    }

    /// Claim a cell, then announce it to subscribers.
    ///
    /// A conflict is reported as
    /// [`GridError::CellAlreadySet`](gridlock_core::GridError::CellAlreadySet)
    /// and publishes nothing.
    pub async fn claim(&self, id: &GridId, coord: &[i64], value: Value) -> Result<(), EngineError> {
        self.claims.claim(id, coord, &value).await?;
        self.fanout
            .publish(&GridEvent::CellClaimed {
                grid_id: id.clone(),
                coord: SmallVec::from_slice(coord),
                value,
            })
            .await;
        Ok(())
    }

    /// Release a cell, announcing it only if a claim was removed.
    ///
    /// Releasing an unclaimed cell succeeds silently.
    pub async fn release(&self, id: &GridId, coord: &[i64]) -> Result<(), EngineError> {
        if self.claims.release(id, coord).await? {
            self.fanout
                .publish(&GridEvent::CellReleased {
                    grid_id: id.clone(),
                    coord: SmallVec::from_slice(coord),
                })
                .await;
        } else {
            debug!(grid_id = %id, coord = %encode_coord(coord), "release of unclaimed cell");
        }
        Ok(())
    }

    /// Open a live event stream for an existing grid.
    ///
    /// Fails with [`GridError::GridNotFound`](gridlock_core::GridError::GridNotFound)
    /// if the grid does not exist.
    pub async fn subscribe(&self, id: &GridId) -> Result<Subscription, EngineError> {
        self.registry.get_grid(id).await?;
        self.fanout.subscribe(id).await
    }

    /// Check that the store is reachable.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.store.ping().await
    }

    /// Name of the backing store.
    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    /// Current engine counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
