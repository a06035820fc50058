//! Best-effort event publication and live per-grid subscriptions.
//!
//! Delivery is at-most-what-the-store-delivers: no replay for late
//! subscribers, no buffering for disconnected ones. A failed publish is
//! logged and counted but never returned, since the claim or release it
//! describes has already committed.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::future::ready;
use futures_util::stream::{self, BoxStream};
use futures_util::{Stream, StreamExt};
use gridlock_core::{GridEvent, GridId};
use gridlock_store::Store;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::metrics::EngineMetrics;

/// Publishes [`GridEvent`]s to a grid's topic and opens subscriptions.
#[derive(Clone)]
pub struct EventFanout {
    store: Arc<dyn Store>,
    metrics: Arc<EngineMetrics>,
}

impl EventFanout {
    /// Create a fan-out over `store`'s topics.
    pub fn new(store: Arc<dyn Store>, metrics: Arc<EngineMetrics>) -> Self {
        Self { store, metrics }
    }

    /// Send `event` to every current subscriber of its grid.
    ///
    /// Never fails; problems are logged and counted in
    /// [`MetricsSnapshot::publish_failures`](crate::MetricsSnapshot::publish_failures).
    pub async fn publish(&self, event: &GridEvent) {
        let topic = event.grid_id().events_topic();
        let payload = match event.to_json() {
            Ok(payload) => payload,
            Err(e) => {
                self.metrics.publish_failed();
                warn!(topic = %topic, error = %e, "event not serializable, dropped");
                return;
            }
        };
        match self.store.publish(&topic, &payload).await {
            Ok(()) => {
                self.metrics.event_published();
                debug!(topic = %topic, "event published");
            }
            Err(e) => {
                self.metrics.publish_failed();
                warn!(topic = %topic, error = %e, "event publish failed, dropped");
            }
        }
    }

    /// Open a live stream of `id`'s events.
    ///
    /// The first item is always [`GridEvent::Hello`]. Only events
    /// published after this returns are delivered. Does not check that
    /// the grid exists.
    pub async fn subscribe(&self, id: &GridId) -> Result<Subscription, EngineError> {
        let topic = id.events_topic();
        let raw = self.store.subscribe(&topic).await?;
        self.metrics.subscription_opened();
        debug!(topic = %topic, "subscription opened");

        let hello = GridEvent::Hello {
            grid_id: id.clone(),
        };
        let events = raw.filter_map(move |payload| {
            ready(match GridEvent::from_json(&payload) {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!(topic = %topic, error = %e, "skipping unreadable event payload");
                    None
                }
            })
        });

        Ok(Subscription {
            inner: stream::once(ready(hello)).chain(events).boxed(),
            _guard: SubscriptionGuard {
                metrics: Arc::clone(&self.metrics),
            },
        })
    }
}

/// A live stream of one grid's events.
///
/// Dropping it unsubscribes from the store.
pub struct Subscription {
    inner: BoxStream<'static, GridEvent>,
    _guard: SubscriptionGuard,
}

impl Subscription {
    /// End the stream as soon as `token` is cancelled, even while it is
    /// waiting for the next event.
    pub fn until(self, token: CancellationToken) -> impl Stream<Item = GridEvent> + Send + 'static {
        self.take_until(token.cancelled_owned())
    }
}

impl Stream for Subscription {
    type Item = GridEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<GridEvent>> {
        self.inner.poll_next_unpin(cx)
    }
}

struct SubscriptionGuard {
    metrics: Arc<EngineMetrics>,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.metrics.subscription_closed();
    }
}
