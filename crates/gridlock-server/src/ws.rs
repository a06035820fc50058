//! Live grid events over WebSocket.
//!
//! The grid is looked up first, so an unknown grid is answered with a
//! plain 404. A request that is not a valid upgrade is then refused
//! without touching the store again. Only after that is the subscription
//! opened, still before the upgrade response, so no event published
//! after the handshake completes can be missed.
//!
//! Each connection then runs two halves bound to one
//! [`CancellationToken`]: a reader task that drains inbound frames only
//! to notice the client leaving, and a writer loop that forwards events.
//! Whichever half stops first cancels the other. The token is a child of
//! the server's shutdown token.

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use gridlock_core::GridId;
use gridlock_engine::Subscription;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::AppState;

/// `GET /grids/{id}/ws`
pub async fn grid_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, ApiError> {
    let grid_id = GridId::from(id);
    state.service.get_grid(&grid_id).await?;
    let upgrade = match upgrade {
        Ok(upgrade) => upgrade,
        Err(rejection) => return Ok(rejection.into_response()),
    };
    let subscription = state.service.subscribe(&grid_id).await?;
    let token = state.shutdown.child_token();
    Ok(upgrade.on_upgrade(move |socket| stream_events(socket, subscription, grid_id, token)))
}

async fn stream_events(
    socket: WebSocket,
    subscription: Subscription,
    grid_id: GridId,
    token: CancellationToken,
) {
    info!(grid_id = %grid_id, "event stream opened");
    let (mut sink, mut inbound) = socket.split();

    let reader = tokio::spawn({
        let token = token.clone();
        async move {
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    frame = inbound.next() => match frame {
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Err(e)) => {
                            debug!(error = %e, "websocket read failed");
                            break;
                        }
                        Some(Ok(_)) => {}
                    },
                }
            }
            token.cancel();
        }
    });

    let mut events = Box::pin(subscription.until(token.clone()));
    while let Some(event) = events.next().await {
        let payload = match event.to_json() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(grid_id = %grid_id, error = %e, "event not serializable, skipped");
                continue;
            }
        };
        if let Err(e) = sink.send(Message::Text(payload.into())).await {
            debug!(grid_id = %grid_id, error = %e, "websocket write failed");
            break;
        }
    }
    token.cancel();
    drop(events);

    if let Err(e) = sink.close().await {
        debug!(grid_id = %grid_id, error = %e, "websocket close failed");
    }
    if let Err(e) = reader.await {
        warn!(grid_id = %grid_id, error = %e, "websocket reader task failed");
    }
    info!(grid_id = %grid_id, "event stream closed");
}
