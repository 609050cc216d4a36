//! Cache entries and their lifecycle states.

use crate::QueryKey;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use talentloom_core::ServiceError;
use tokio::time::Instant;

/// Fetch lifecycle of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryStatus {
    /// Never fetched.
    Idle,
    /// A fetch is in flight; previous data stays readable.
    Loading,
    Success,
    Error,
}

/// One keyed record of the query store.
///
/// `Success` always carries data and `Error` always carries an error. A
/// failed refetch keeps the data of the last success.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: QueryKey,
    pub data: Option<Value>,
    pub status: QueryStatus,
    pub error: Option<ServiceError>,
    /// When the current data was last written by a fetch or an authoritative set.
    pub fetched_at: Option<Instant>,
    pub stale_after: Duration,
    /// Marked by an invalidation, cleared by the next authoritative write.
    pub invalidated: bool,
    pub subscriber_count: usize,
    pub(crate) last_active: Instant,
}

impl CacheEntry {
    pub(crate) fn new(key: QueryKey, stale_after: Duration) -> Self {
        Self {
            key,
            data: None,
            status: QueryStatus::Idle,
            error: None,
            fetched_at: None,
            stale_after,
            invalidated: false,
            subscriber_count: 0,
            last_active: Instant::now(),
        }
    }

    /// Age of the current data, if it was ever fetched.
    pub fn age(&self, now: Instant) -> Option<Duration> {
        self.fetched_at.map(|at| now.saturating_duration_since(at))
    }

    /// Invalidated, never fetched, or older than `stale_after`. A zero
    /// window is stale as soon as the data lands.
    pub fn is_stale(&self, now: Instant) -> bool {
        if self.invalidated {
            return true;
        }
        self.age(now)
            .is_none_or(|age| self.stale_after.is_zero() || age > self.stale_after)
    }

    /// An observer mounting on this entry should issue a fetch.
    pub fn needs_fetch(&self, now: Instant) -> bool {
        self.status == QueryStatus::Error || self.is_stale(now)
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }
}
