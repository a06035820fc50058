//! Error type for the HTTP boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gridlock_core::GridError;
use gridlock_engine::EngineError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors a request handler can answer with.
///
/// Every variant renders as a JSON body. Infrastructure details never
/// leave the process; they are logged when the error is built.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body is not valid JSON for the endpoint.
    #[error("invalid JSON")]
    InvalidJson,

    /// A claim or release body without a coordinate.
    #[error("coord required")]
    CoordRequired,

    /// Dimensions or coordinate rejected by validation.
    #[error("{0}")]
    Validation(GridError),

    /// The grid does not exist.
    #[error("grid not found")]
    GridNotFound,

    /// No route matches the request path.
    #[error("not found")]
    RouteNotFound,

    /// The cell is already claimed.
    #[error("cell already set")]
    Conflict,

    /// Store failure or corrupt data.
    #[error("internal error")]
    Internal,
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    ///
    /// - Body and validation problems: 400 Bad Request
    /// - Unknown grid or route: 404 Not Found
    /// - Claim conflict: 409 Conflict
    /// - Everything else: 500 Internal Server Error
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidJson | Self::CoordRequired | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::GridNotFound | Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Grid(GridError::GridNotFound { .. }) => Self::GridNotFound,
            EngineError::Grid(GridError::CellAlreadySet) => Self::Conflict,
            EngineError::Grid(g) if g.is_validation() => Self::Validation(g),
            other => {
                error!(error = %other, "request failed");
                Self::Internal
            }
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(_: serde_json::Error) -> Self {
        Self::InvalidJson
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            // Claim conflicts share the shape of a successful claim reply.
            Self::Conflict => json!({ "success": false, "error": self.to_string() }),
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
