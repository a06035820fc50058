//! Grid creation and lookup.

use std::sync::Arc;

use gridlock_core::{decode_dimensions, encode_dimensions, Dimensions, Grid, GridError, GridId, Value};
use gridlock_store::{GridRecord, Store, StoreError};
use tracing::{info, warn};

use crate::error::EngineError;
use crate::metrics::EngineMetrics;

/// Creates grids and reconstructs them from stored metadata.
#[derive(Clone)]
pub struct GridRegistry {
    store: Arc<dyn Store>,
    metrics: Arc<EngineMetrics>,
}

impl GridRegistry {
    /// Create a registry over `store`.
    pub fn new(store: Arc<dyn Store>, metrics: Arc<EngineMetrics>) -> Self {
        Self { store, metrics }
    }

    /// Create and persist a new grid.
    ///
    /// Fails with [`GridError::InvalidDimensions`] before touching the
    /// store if `dimensions` is empty or has a non-positive entry. A JSON
    /// `null` default is treated as no default.
    pub async fn create_grid(
        &self,
        dimensions: Vec<i64>,
        default_value: Option<Value>,
    ) -> Result<Grid, EngineError> {
        let dimensions = Dimensions::new(dimensions)?;
        let default_value = default_value.filter(|v| !v.is_null());
        let record = GridRecord {
            dimensions: encode_dimensions(dimensions.as_slice()),
            default_value: default_value
                .as_ref()
                .map(Value::to_string)
                .unwrap_or_default(),
        };

        let id = GridId::generate();
        self.store.put_grid(&id, record).await?;
        self.metrics.grid_created();
        info!(grid_id = %id, dimensions = ?dimensions.as_slice(), "grid created");

        Ok(Grid {
            id,
            dimensions,
            default_value,
        })
    }

    /// Load a grid's metadata.
    ///
    /// Fails with [`GridError::GridNotFound`] if no record exists. A
    /// stored default that does not parse is replaced by "no default"
    /// and logged; unreadable dimensions are reported as
    /// [`StoreError::Corrupt`].
    pub async fn get_grid(&self, id: &GridId) -> Result<Grid, EngineError> {
        let record = self
            .store
            .get_grid(id)
            .await?
            .ok_or_else(|| GridError::GridNotFound { id: id.to_string() })?;

        let dims = decode_dimensions(&record.dimensions).map_err(|e| StoreError::Corrupt {
            reason: format!("grid {id} dimensions {:?}: {e}", record.dimensions),
        })?;
        let dimensions = Dimensions::new(dims).map_err(|e| StoreError::Corrupt {
            reason: format!("grid {id}: {e}"),
        })?;

        Ok(Grid {
            id: id.clone(),
            dimensions,
            default_value: decode_default(id, &record.default_value),
        })
    }

    /// Load a grid and check that `coord` addresses one of its cells.
    pub async fn get_validated(&self, id: &GridId, coord: &[i64]) -> Result<Grid, EngineError> {
        let grid = self.get_grid(id).await?;
        grid.validate_coord(coord)?;
        Ok(grid)
    }
}

fn decode_default(id: &GridId, raw: &str) -> Option<Value> {
    if raw.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(v) => Some(v).filter(|v| !v.is_null()),
        Err(e) => {
            warn!(grid_id = %id, error = %e, "unreadable stored default, treating as none");
            None
        }
    }
}
