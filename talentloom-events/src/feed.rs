//! The realtime feed: one event source driving one store.

use crate::mapper::{Disposition, EventMapper};
use crate::source::EventSource;
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use talentloom_cache::QueryStore;
use talentloom_core::{CompanyId, DomainEvent, Notifier};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Counters and bookkeeping of a feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedStats {
    pub received: u64,
    pub applied: u64,
    pub out_of_scope: u64,
    pub unknown: u64,
}

#[derive(Default)]
struct FeedState {
    last_event: Option<DomainEvent>,
    channels: BTreeSet<String>,
    stats: FeedStats,
    running: bool,
}

struct FeedInner {
    store: QueryStore,
    notifier: Arc<dyn Notifier>,
    mapper: EventMapper,
    state: Mutex<FeedState>,
}

impl FeedInner {
    fn lock(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Dispatches events from a source, or published locally, into a store.
///
/// Handles are cheap clones of the same feed.
#[derive(Clone)]
pub struct RealtimeFeed {
    inner: Arc<FeedInner>,
}

impl RealtimeFeed {
    pub fn new(store: QueryStore, notifier: Arc<dyn Notifier>, scope: Option<CompanyId>) -> Self {
        Self {
            inner: Arc::new(FeedInner {
                store,
                notifier,
                mapper: EventMapper::new(scope),
                state: Mutex::new(FeedState::default()),
            }),
        }
    }

    pub fn mapper(&self) -> &EventMapper {
        &self.inner.mapper
    }

    /// Handle one event now.
    pub fn dispatch(&self, event: DomainEvent) -> Disposition {
        let inner = &self.inner;
        let disposition = inner
            .mapper
            .dispatch(&event, &inner.store, inner.notifier.as_ref());
        let mut state = inner.lock();
        state.stats.received += 1;
        match &disposition {
            Disposition::Applied(_) => state.stats.applied += 1,
            Disposition::OutOfScope { .. } => state.stats.out_of_scope += 1,
            Disposition::Unknown { .. } => state.stats.unknown += 1,
        }
        state.last_event = Some(event);
        disposition
    }

    /// Send a locally originated event on `channel`.
    ///
    /// The event is stamped with the current time and, when the feed has a
    /// scope, with the active company, then handled like a received event.
    pub fn publish(&self, channel: &str, mut event: DomainEvent) -> Disposition {
        event.timestamp = Utc::now();
        if let Some(scope) = self.inner.mapper.scope() {
            event.company_id = Some(scope.clone());
        }
        debug!(channel, event_type = %event.event_type, "publishing event");
        self.dispatch(event)
    }

    /// Run `source` on its own task until it finishes or the handle shuts it
    /// down. Must be called within a tokio runtime.
    pub fn start<S>(&self, source: S) -> FeedHandle
    where
        S: EventSource + 'static,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        self.inner.lock().running = true;
        let feed = self.clone();
        let task = tokio::spawn(feed.run(source, shutdown_rx));
        FeedHandle {
            shutdown: shutdown_tx,
            task,
        }
    }

    async fn run<S: EventSource>(self, mut source: S, mut shutdown: watch::Receiver<bool>) {
        info!(scope = ?self.inner.mapper.scope(), "realtime feed started");
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    debug!("realtime feed shutdown requested");
                    break;
                }
                event = source.next_event() => {
                    match event {
                        Some(event) => {
                            self.dispatch(event);
                        }
                        None => {
                            debug!("event source finished");
                            break;
                        }
                    }
                }
            }
        }
        self.inner.lock().running = false;
        info!(stats = ?self.stats(), "realtime feed stopped");
    }

    /// True while a started source is being consumed.
    pub fn is_connected(&self) -> bool {
        self.inner.lock().running
    }

    /// Most recently handled event, whatever its disposition.
    pub fn last_event(&self) -> Option<DomainEvent> {
        self.inner.lock().last_event.clone()
    }

    pub fn stats(&self) -> FeedStats {
        self.inner.lock().stats.clone()
    }

    pub fn subscribe_channels<I, S>(&self, channels: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let added: Vec<String> = channels.into_iter().map(Into::into).collect();
        debug!(channels = ?added, "subscribed to channels");
        self.inner.lock().channels.extend(added);
    }

    pub fn unsubscribe_channels<I, S>(&self, channels: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = self.inner.lock();
        for channel in channels {
            state.channels.remove(channel.as_ref());
        }
    }

    /// Subscribed channel names in sorted order.
    pub fn subscribed_channels(&self) -> Vec<String> {
        self.inner.lock().channels.iter().cloned().collect()
    }

    pub fn is_subscribed(&self, channel: &str) -> bool {
        self.inner.lock().channels.contains(channel)
    }
}

impl std::fmt::Debug for RealtimeFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeFeed")
            .field("mapper", &self.inner.mapper)
            .field("stats", &self.stats())
            .finish()
    }
}

/// Control over a started feed. Dropping it also stops the feed.
#[derive(Debug)]
pub struct FeedHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl FeedHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop consuming the source and wait for the loop to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.task.await {
            tracing::warn!(error = %err, "realtime feed task failed");
        }
    }

    /// Wait for the source to finish on its own.
    pub async fn join(self) {
        let FeedHandle { shutdown, task } = self;
        if let Err(err) = task.await {
            tracing::warn!(error = %err, "realtime feed task failed");
        }
        drop(shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ExhaustionPolicy, ReplaySource};
    use serde_json::json;
    use std::time::Duration;
    use talentloom_core::{EntityIdType, NotificationCenter};

    fn feed(scope: Option<&str>) -> (RealtimeFeed, Arc<NotificationCenter>) {
        let center = Arc::new(NotificationCenter::new());
        let notifier: Arc<dyn Notifier> = center.clone();
        let feed = RealtimeFeed::new(QueryStore::new(), notifier, scope.map(CompanyId::new));
        (feed, center)
    }

    #[test]
    fn test_publish_stamps_active_company() {
        let (feed, center) = feed(Some("company_1"));
        let event = DomainEvent::new("jobs.archived", json!({})).with_company(CompanyId::new("other"));
        let disposition = feed.publish("jobs.company_1", event);
        assert!(!disposition.is_dropped());
        assert_eq!(center.len(), 1);
        assert_eq!(
            feed.last_event().and_then(|e| e.company_id),
            Some(CompanyId::new("company_1"))
        );
    }

    #[test]
    fn test_channel_bookkeeping() {
        let (feed, _) = feed(None);
        feed.subscribe_channels(["pipeline.company_1", "pipeline.1"]);
        feed.subscribe_channels(vec!["pipeline.1".to_string()]);
        assert_eq!(feed.subscribed_channels(), vec!["pipeline.1", "pipeline.company_1"]);
        feed.unsubscribe_channels(["pipeline.1", "never.subscribed"]);
        assert!(!feed.is_subscribed("pipeline.1"));
        assert!(feed.is_subscribed("pipeline.company_1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_policy_ends_feed() {
        let (feed, center) = feed(None);
        let events = vec![
            DomainEvent::new("pipeline.created", json!({})),
            DomainEvent::new("offers.updated", json!({})),
        ];
        let handle = feed.start(ReplaySource::new(
            events,
            Duration::from_secs(45),
            ExhaustionPolicy::Stop,
        ));
        assert!(feed.is_connected());
        handle.join().await;
        assert!(!feed.is_connected());
        assert_eq!(feed.stats().applied, 2);
        assert_eq!(center.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_wrapping_feed() {
        let (feed, _) = feed(None);
        let handle = feed.start(ReplaySource::new(
            vec![DomainEvent::new("pipeline.updated", json!({}))],
            Duration::from_secs(45),
            ExhaustionPolicy::Wrap,
        ));
        tokio::time::sleep(Duration::from_secs(140)).await;
        assert_eq!(feed.stats().received, 3);
        handle.shutdown().await;
        assert!(!feed.is_connected());
        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(feed.stats().received, 3);
    }
}
