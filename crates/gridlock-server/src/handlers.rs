//! JSON request handlers.
//!
//! Bodies are decoded from raw bytes regardless of `Content-Type`, so
//! clients that omit the header are still served.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use gridlock_core::{CellView, GridId, Value};
use gridlock_engine::MetricsSnapshot;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::error::ApiError;
use crate::AppState;

/// Body of `POST /grids`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGridRequest {
    /// Per-axis bounds. Missing and `null` are both rejected as invalid
    /// dimensions rather than as malformed JSON.
    #[serde(default)]
    pub dimensions: Option<Vec<i64>>,
    /// Display-only default.
    #[serde(default)]
    pub default_value: Option<Value>,
}

/// Reply to `POST /grids`.
#[derive(Debug, Serialize)]
pub struct CreateGridResponse {
    /// New grid identifier.
    pub id: GridId,
    /// Per-axis bounds.
    pub dimensions: Vec<i64>,
}

/// Reply to `GET /grids/{id}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridStateResponse {
    /// Grid identifier.
    pub id: GridId,
    /// Per-axis bounds.
    pub dimensions: Vec<i64>,
    /// Display-only default, omitted when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    /// Claimed cells.
    pub cells: Vec<CellView>,
}

/// Body of `POST /grids/{id}/claim`.
#[derive(Debug, Deserialize)]
pub struct ClaimRequest {
    /// Target cell.
    #[serde(default)]
    pub coord: Option<Vec<i64>>,
    /// Claim payload; `null` when omitted.
    #[serde(default)]
    pub value: Value,
}

/// Body of `POST /grids/{id}/release`.
#[derive(Debug, Deserialize)]
pub struct ReleaseRequest {
    /// Target cell.
    #[serde(default)]
    pub coord: Option<Vec<i64>>,
}

/// Reply to a successful claim or release.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    /// Always `true`; failures use [`ApiError`].
    pub success: bool,
}

const SUCCESS: SuccessResponse = SuccessResponse { success: true };

fn decode<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    Ok(serde_json::from_slice(body)?)
}

fn require_coord(coord: Option<Vec<i64>>) -> Result<Vec<i64>, ApiError> {
    match coord {
        Some(coord) if !coord.is_empty() => Ok(coord),
        _ => Err(ApiError::CoordRequired),
    }
}

/// `POST /grids`
pub async fn create_grid(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<CreateGridResponse>), ApiError> {
    let req: CreateGridRequest = decode(&body)?;
    let grid = state
        .service
        .create_grid(req.dimensions.unwrap_or_default(), req.default_value)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateGridResponse {
            id: grid.id,
            dimensions: grid.dimensions.as_slice().to_vec(),
        }),
    ))
}

/// `GET /grids/{id}`
pub async fn get_grid(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GridStateResponse>, ApiError> {
    let grid_state = state.service.grid_state(&GridId::from(id)).await?;
    let grid = grid_state.grid;
    Ok(Json(GridStateResponse {
        id: grid.id,
        dimensions: grid.dimensions.as_slice().to_vec(),
        default_value: grid.default_value,
        cells: grid_state.cells,
    }))
}

/// `POST /grids/{id}/claim`
pub async fn claim_cell(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<SuccessResponse>, ApiError> {
    let req: ClaimRequest = decode(&body)?;
    let coord = require_coord(req.coord)?;
    state
        .service
        .claim(&GridId::from(id), &coord, req.value)
        .await?;
    Ok(Json(SUCCESS))
}

/// `POST /grids/{id}/release`
pub async fn release_cell(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<SuccessResponse>, ApiError> {
    let req: ReleaseRequest = decode(&body)?;
    let coord = require_coord(req.coord)?;
    state.service.release(&GridId::from(id), &coord).await?;
    Ok(Json(SUCCESS))
}

/// `GET /metrics`
pub async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.service.metrics())
}

/// `GET /healthz`
pub async fn healthz(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    if let Err(e) = state.service.ping().await {
        warn!(error = %e, "health check failed");
        return Err(ApiError::Internal);
    }
    Ok(Json(json!({ "status": "ok" })))
}

/// Fallback for unmatched paths.
pub async fn not_found() -> ApiError {
    ApiError::RouteNotFound
}
