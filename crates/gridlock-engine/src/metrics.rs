//! Cumulative counters for engine activity.
//!
//! [`EngineMetrics`] is shared by every component of a
//! [`GridService`](crate::GridService) and updated with relaxed atomics
//! on the hot path. [`MetricsSnapshot`] is the plain value read out for
//! reporting.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Live counters, safe to update from any handler.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    grids_created: AtomicU64,
    claims_won: AtomicU64,
    claim_conflicts: AtomicU64,
    releases: AtomicU64,
    events_published: AtomicU64,
    publish_failures: AtomicU64,
    subscriptions_opened: AtomicU64,
    subscriptions_closed: AtomicU64,
}

// Compile-time assertion: EngineMetrics must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<EngineMetrics>();
};

impl EngineMetrics {
    /// Create a zeroed set of counters.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn grid_created(&self) {
        self.grids_created.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn claim_won(&self) {
        self.claims_won.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn claim_conflict(&self) {
        self.claim_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn released(&self) {
        self.releases.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn event_published(&self) {
        self.events_published.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn publish_failed(&self) {
        self.publish_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn subscription_opened(&self) {
        self.subscriptions_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn subscription_closed(&self) {
        self.subscriptions_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters.
    ///
    /// Counters are read independently, so a snapshot taken under load
    /// may be off by in-flight operations.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let opened = self.subscriptions_opened.load(Ordering::Relaxed);
        let closed = self.subscriptions_closed.load(Ordering::Relaxed);
        MetricsSnapshot {
            grids_created: self.grids_created.load(Ordering::Relaxed),
            claims_won: self.claims_won.load(Ordering::Relaxed),
            claim_conflicts: self.claim_conflicts.load(Ordering::Relaxed),
            releases: self.releases.load(Ordering::Relaxed),
            events_published: self.events_published.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
            active_subscribers: opened.saturating_sub(closed),
        }
    }
}

/// Point-in-time copy of [`EngineMetrics`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Grids created by this instance.
    pub grids_created: u64,
    /// Claims that won the conditional write.
    pub claims_won: u64,
    /// Claims rejected because the cell was already set.
    pub claim_conflicts: u64,
    /// Releases that removed a claim.
    pub releases: u64,
    /// Events handed to the store's broadcast.
    pub events_published: u64,
    /// Events dropped because publication failed.
    pub publish_failures: u64,
    /// Subscriptions currently open on this instance.
    pub active_subscribers: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        assert_eq!(EngineMetrics::new().snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn counters_accumulate() {
        let m = EngineMetrics::new();
        m.grid_created();
        m.claim_won();
        m.claim_won();
        m.claim_conflict();
        m.released();
        m.event_published();
        m.publish_failed();
        m.subscription_opened();
        m.subscription_opened();
        m.subscription_closed();
        let s = m.snapshot();
        assert_eq!(s.grids_created, 1);
        assert_eq!(s.claims_won, 2);
        assert_eq!(s.claim_conflicts, 1);
        assert_eq!(s.releases, 1);
        assert_eq!(s.events_published, 1);
        assert_eq!(s.publish_failures, 1);
        assert_eq!(s.active_subscribers, 1);
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let json = serde_json::to_value(MetricsSnapshot::default()).unwrap();
        assert_eq!(json["claimConflicts"], 0);
        assert_eq!(json["activeSubscribers"], 0);
    }
}
