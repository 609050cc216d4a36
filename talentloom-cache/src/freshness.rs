//! Freshness settings for query observers.
//!
//! Each observer declares whether it may fetch at all, how long fetched data
//! stays fresh, and an optional polling cadence.

use crate::keys::Resource;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use talentloom_core::{ConfigError, DurationMs};

const MINUTE_MS: DurationMs = 60 * 1000;

/// Options of one observer binding.
///
/// Deserializes from `enabled`, `stale_after_ms` and `refetch_interval_ms`;
/// any other member is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    pub enabled: bool,
    pub stale_after_ms: DurationMs,
    pub refetch_interval_ms: Option<DurationMs>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            stale_after_ms: 0,
            refetch_interval_ms: None,
        }
    }
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults for a resource, before any configuration overrides.
    pub fn for_resource(resource: Resource) -> Self {
        let stale_after_ms = match resource {
            Resource::Candidates | Resource::Jobs | Resource::Dashboard => 5 * MINUTE_MS,
            Resource::CandidateSearch | Resource::Pipeline => 2 * MINUTE_MS,
            Resource::Offers => 3 * MINUTE_MS,
            Resource::Matches | Resource::MatchesForJob => 10 * MINUTE_MS,
            _ => 0,
        };
        Self {
            stale_after_ms,
            ..Self::default()
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after_ms = u64::try_from(stale_after.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn refetch_every(mut self, interval: Duration) -> Self {
        self.refetch_interval_ms = Some(u64::try_from(interval.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn stale_after_duration(&self) -> Duration {
        Duration::from_millis(self.stale_after_ms)
    }

    /// Polling cadence; a zero interval is treated as no polling.
    pub fn refetch_interval(&self) -> Option<Duration> {
        self.refetch_interval_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    /// Reject a polling interval of zero.
    pub fn validate(&self, field: &str) -> Result<(), ConfigError> {
        if self.refetch_interval_ms == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: format!("{}.refetch_interval_ms", field),
                reason: "must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Partial options layered over resource defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOverrides {
    pub enabled: Option<bool>,
    pub stale_after_ms: Option<DurationMs>,
    pub refetch_interval_ms: Option<DurationMs>,
}

impl QueryOverrides {
    pub fn apply(&self, base: QueryOptions) -> QueryOptions {
        QueryOptions {
            enabled: self.enabled.unwrap_or(base.enabled),
            stale_after_ms: self.stale_after_ms.unwrap_or(base.stale_after_ms),
            refetch_interval_ms: self.refetch_interval_ms.or(base.refetch_interval_ms),
        }
    }

    pub fn validate(&self, field: &str) -> Result<(), ConfigError> {
        if self.refetch_interval_ms == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: format!("{}.refetch_interval_ms", field),
                reason: "must be > 0".to_string(),
            });
        }
        Ok(())
    }
}
