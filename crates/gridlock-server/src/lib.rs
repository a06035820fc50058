//! HTTP and WebSocket boundary for the Gridlock claim server.
//!
//! [`router`] wires the JSON endpoints and the live event stream onto a
//! shared [`AppState`]:
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | POST | `/grids` | [`handlers::create_grid`] |
//! | GET | `/grids/{id}` | [`handlers::get_grid`] |
//! | POST | `/grids/{id}/claim` | [`handlers::claim_cell`] |
//! | POST | `/grids/{id}/release` | [`handlers::release_cell`] |
//! | GET | `/grids/{id}/ws` | [`ws::grid_events`] |
//! | GET | `/metrics` | [`handlers::metrics`] |
//! | GET | `/healthz` | [`handlers::healthz`] |
//!
//! Every response carries permissive CORS headers and every `OPTIONS`
//! request is answered with 204 directly.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod ws;

use axum::extract::Request;
use axum::http::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN,
};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use gridlock_engine::GridService;
use tokio_util::sync::CancellationToken;

pub use config::{Args, LogFormat, ServerConfig, StoreKind};
pub use error::ApiError;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// The claim service.
    pub service: GridService,
    /// Cancelled when the server shuts down; ends live event streams.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Wrap `service` with a fresh shutdown token.
    pub fn new(service: GridService) -> Self {
        Self {
            service,
            shutdown: CancellationToken::new(),
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/grids", post(handlers::create_grid))
        .route("/grids/{id}", get(handlers::get_grid))
        .route("/grids/{id}/claim", post(handlers::claim_cell))
        .route("/grids/{id}/release", post(handlers::release_cell))
        .route("/grids/{id}/ws", get(ws::grid_events))
        .route("/metrics", get(handlers::metrics))
        .route("/healthz", get(handlers::healthz))
        .fallback(handlers::not_found)
        .layer(middleware::from_fn(cors))
        .with_state(state)
}

async fn cors(req: Request, next: Next) -> Response {
    let mut res = if req.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };
    apply_cors_headers(res.headers_mut());
    res
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
}
