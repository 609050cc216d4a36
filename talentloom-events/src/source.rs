//! Where realtime events come from.
//!
//! The feed only sees [`EventSource`]: a timer-paced replay of a fixed list
//! and a broadcast channel standing in for a streaming transport are
//! interchangeable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use talentloom_core::DomainEvent;
use tokio::sync::broadcast;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, warn};

/// Default pacing of the demo replay.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(45);

/// A stream of domain events.
#[async_trait]
pub trait EventSource: Send {
    /// Wait for the next event. `None` means the source is finished.
    async fn next_event(&mut self) -> Option<DomainEvent>;
}

/// What a replay does after its last event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExhaustionPolicy {
    /// Finish the source.
    Stop,
    /// Start again from the first event.
    #[default]
    Wrap,
}

/// Cursor over a fixed, ordered list of events, one event per tick.
#[derive(Debug)]
pub struct ReplaySource {
    events: Vec<DomainEvent>,
    cursor: usize,
    policy: ExhaustionPolicy,
    period: Duration,
    ticker: Option<Interval>,
}

impl ReplaySource {
    pub fn new(events: Vec<DomainEvent>, period: Duration, policy: ExhaustionPolicy) -> Self {
        Self {
            events,
            cursor: 0,
            policy,
            period: period.max(Duration::from_millis(1)),
            ticker: None,
        }
    }

    pub fn policy(&self) -> ExhaustionPolicy {
        self.policy
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Index of the next event to hand out.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Hand out the next event without waiting, advancing the cursor.
    ///
    /// Under `Wrap` an exhausted cursor restarts at the first event on the
    /// same call. An empty list yields nothing under either policy.
    pub fn advance(&mut self) -> Option<DomainEvent> {
        if self.cursor >= self.events.len() {
            match self.policy {
                ExhaustionPolicy::Stop => return None,
                ExhaustionPolicy::Wrap => {
                    if self.events.is_empty() {
                        return None;
                    }
                    debug!(len = self.events.len(), "replay wrapped to start");
                    self.cursor = 0;
                }
            }
        }
        let event = self.events.get(self.cursor).cloned();
        self.cursor += 1;
        event
    }

    fn ticker(&mut self) -> &mut Interval {
        let period = self.period;
        self.ticker.get_or_insert_with(|| {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        })
    }
}

#[async_trait]
impl EventSource for ReplaySource {
    async fn next_event(&mut self) -> Option<DomainEvent> {
        if self.cursor >= self.events.len()
            && (self.policy == ExhaustionPolicy::Stop || self.events.is_empty())
        {
            return None;
        }
        self.ticker().tick().await;
        self.advance()
    }
}

/// Events pushed through a broadcast channel.
#[derive(Debug)]
pub struct ChannelSource {
    receiver: broadcast::Receiver<DomainEvent>,
}

impl ChannelSource {
    pub fn new(receiver: broadcast::Receiver<DomainEvent>) -> Self {
        Self { receiver }
    }

    pub fn subscribe(sender: &broadcast::Sender<DomainEvent>) -> Self {
        Self::new(sender.subscribe())
    }
}

#[async_trait]
impl EventSource for ChannelSource {
    async fn next_event(&mut self) -> Option<DomainEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event source lagged, some events were dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("event channel closed");
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn events(n: usize) -> Vec<DomainEvent> {
        (0..n)
            .map(|i| DomainEvent::new("pipeline.updated", json!({ "n": i })))
            .collect()
    }

    #[test]
    fn test_stop_policy_finishes() {
        let mut source = ReplaySource::new(events(2), DEFAULT_TICK_INTERVAL, ExhaustionPolicy::Stop);
        assert!(source.advance().is_some());
        assert!(source.advance().is_some());
        assert!(source.advance().is_none());
        assert!(source.advance().is_none());
    }

    #[test]
    fn test_wrap_policy_restarts() {
        let mut source = ReplaySource::new(events(2), DEFAULT_TICK_INTERVAL, ExhaustionPolicy::Wrap);
        let order: Vec<_> = (0..5)
            .filter_map(|_| source.advance())
            .map(|e| e.payload["n"].clone())
            .collect();
        assert_eq!(order, vec![json!(0), json!(1), json!(0), json!(1), json!(0)]);
    }

    #[test]
    fn test_empty_wrap_yields_nothing() {
        let mut source = ReplaySource::new(Vec::new(), DEFAULT_TICK_INTERVAL, ExhaustionPolicy::Wrap);
        assert!(source.advance().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_is_paced_by_period() {
        let mut source = ReplaySource::new(events(2), Duration::from_secs(45), ExhaustionPolicy::Stop);
        let start = Instant::now();
        assert!(source.next_event().await.is_some());
        assert!(start.elapsed() >= Duration::from_secs(45));
        assert!(source.next_event().await.is_some());
        assert!(start.elapsed() >= Duration::from_secs(90));
        assert!(source.next_event().await.is_none());
    }

    #[tokio::test]
    async fn test_channel_source_ends_when_senders_drop() {
        let (tx, _) = broadcast::channel(8);
        let mut source = ChannelSource::subscribe(&tx);
        tx.send(DomainEvent::new("jobs.created", json!({}))).unwrap();
        drop(tx);
        assert!(source.next_event().await.is_some());
        assert!(source.next_event().await.is_none());
    }

    #[tokio::test]
    async fn test_channel_source_skips_lag() {
        let (tx, _) = broadcast::channel(2);
        let mut source = ChannelSource::subscribe(&tx);
        for i in 0..4 {
            tx.send(DomainEvent::new("jobs.updated", json!({ "n": i }))).unwrap();
        }
        let first = source.next_event().await.unwrap();
        assert_eq!(first.payload["n"], 2);
    }
}
