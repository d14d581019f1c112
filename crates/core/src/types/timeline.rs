//! Per-status timestamps for an order.
//!
//! An order remembers when it reached each status. The single-order update
//! path only ever records the *first* time a status is reached; the admin
//! bulk path overwrites with the latest time. Both operations live here so
//! the difference is explicit and testable.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::OrderStatus;

/// Mapping from status to the instant the order reached it.
///
/// Statuses the order never reached are simply absent.
///
/// ```
/// use bazaar_core::{OrderStatus, StatusTimeline};
/// use chrono::{Duration, Utc};
///
/// let placed_at = Utc::now();
/// let mut timeline = StatusTimeline::placed(placed_at);
///
/// assert!(timeline.record_first(OrderStatus::Shipped, placed_at + Duration::hours(2)));
/// assert!(!timeline.record_first(OrderStatus::Placed, placed_at + Duration::hours(3)));
/// assert_eq!(timeline.get(OrderStatus::Placed), Some(placed_at));
/// assert_eq!(timeline.get(OrderStatus::Delivered), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusTimeline(BTreeMap<OrderStatus, DateTime<Utc>>);

impl StatusTimeline {
    /// An empty timeline.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// A timeline for a freshly created order, stamped `placed` at `at`.
    #[must_use]
    pub fn placed(at: DateTime<Utc>) -> Self {
        let mut timeline = Self::new();
        timeline.record_first(OrderStatus::Placed, at);
        timeline
    }

    /// Stamp `status` with `at` unless it already has a timestamp.
    ///
    /// Returns `true` if the timestamp was written.
    pub fn record_first(&mut self, status: OrderStatus, at: DateTime<Utc>) -> bool {
        if self.0.contains_key(&status) {
            return false;
        }
        self.0.insert(status, at);
        true
    }

    /// Stamp `status` with `at`, replacing any earlier timestamp.
    pub fn record_latest(&mut self, status: OrderStatus, at: DateTime<Utc>) {
        self.0.insert(status, at);
    }

    /// When the order reached `status`, if it ever did.
    #[must_use]
    pub fn get(&self, status: OrderStatus) -> Option<DateTime<Utc>> {
        self.0.get(&status).copied()
    }

    /// Every status paired with its timestamp, `None` where unreached.
    #[must_use]
    pub fn complete(&self) -> BTreeMap<OrderStatus, Option<DateTime<Utc>>> {
        OrderStatus::ALL
            .into_iter()
            .map(|status| (status, self.get(status)))
            .collect()
    }

    /// Number of statuses reached.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no status has been reached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
