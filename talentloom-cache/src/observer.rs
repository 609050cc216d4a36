//! Query observers (the hook layer).
//!
//! A [`QueryObserver`] binds one consumer to one cache key for as long as it
//! lives: it subscribes on creation, fetches when the entry is missing,
//! failed or stale, refetches after invalidations and on an optional
//! cadence, and publishes typed [`QueryState`] snapshots on a watch channel.
//! Dropping it unsubscribes. A fetch it started still lands in the store.

use crate::entry::{CacheEntry, QueryStatus};
use crate::freshness::QueryOptions;
use crate::store::{QueryFn, QueryStore, SharedFetch, StoreSignal, Subscription};
use crate::QueryKey;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use talentloom_core::ServiceError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// What a consumer sees of its key.
///
/// Failures are state, never panics or returned errors. Data of the last
/// success stays visible while a refetch is loading or after it failed.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<T> {
    pub data: Option<T>,
    pub status: QueryStatus,
    pub error: Option<ServiceError>,
    pub is_stale: bool,
}

impl<T> QueryState<T> {
    pub fn idle() -> Self {
        Self {
            data: None,
            status: QueryStatus::Idle,
            error: None,
            is_stale: true,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    /// Settled means a fetch finished, successfully or not.
    pub fn is_settled(&self) -> bool {
        matches!(self.status, QueryStatus::Success | QueryStatus::Error)
    }
}

impl<T: DeserializeOwned + Clone> QueryState<T> {
    fn from_entry(entry: &CacheEntry, previous: &QueryState<T>) -> Self {
        let now = Instant::now();
        let mut state = QueryState {
            data: None,
            status: entry.status,
            error: entry.error.clone(),
            is_stale: entry.is_stale(now),
        };
        match &entry.data {
            None => {}
            Some(value) => match serde_json::from_value::<T>(value.clone()) {
                Ok(data) => state.data = Some(data),
                Err(err) => {
                    tracing::warn!(key = %entry.key, error = %err, "cached data has unexpected shape");
                    state.data = previous.data.clone();
                    state.status = QueryStatus::Error;
                    state.error = Some(ServiceError::from(err));
                }
            },
        }
        state
    }
}

/// Live binding of a consumer to one cache key.
pub struct QueryObserver<T> {
    key: QueryKey,
    store: QueryStore,
    fetcher: QueryFn,
    options: QueryOptions,
    state: watch::Receiver<QueryState<T>>,
    driver: JoinHandle<()>,
    _subscription: Subscription,
}

impl<T> QueryObserver<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Mount an observer. Must be called within a tokio runtime.
    pub fn spawn(store: &QueryStore, key: QueryKey, fetcher: QueryFn, options: QueryOptions) -> Self {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel::<StoreSignal>();
        let subscription = store.observe(
            &key,
            Some(options.stale_after_duration()),
            Arc::new(move |signal: &StoreSignal| {
                let _ = signal_tx.send(signal.clone());
            }),
        );

        let initial = store
            .get(&key)
            .map(|entry| QueryState::from_entry(&entry, &QueryState::idle()))
            .unwrap_or_else(QueryState::idle);
        let (state_tx, state_rx) = watch::channel(initial);

        if options.enabled {
            let needs_fetch = store
                .get(&key)
                .is_none_or(|entry| entry.needs_fetch(Instant::now()));
            if needs_fetch {
                tracing::debug!(%key, "observer mounted on stale entry");
                drop(store.fetch(&key, Arc::clone(&fetcher)));
            }
        }

        let driver = tokio::spawn(drive::<T>(
            store.clone(),
            key.clone(),
            Arc::clone(&fetcher),
            options,
            signal_rx,
            state_tx,
        ));

        Self {
            key,
            store: store.clone(),
            fetcher,
            options,
            state: state_rx,
            driver,
            _subscription: subscription,
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Latest published state.
    pub fn state(&self) -> QueryState<T> {
        self.state.borrow().clone()
    }

    /// A receiver of every published state, for consumers that poll on
    /// their own schedule.
    pub fn watch(&self) -> watch::Receiver<QueryState<T>> {
        self.state.clone()
    }

    /// Wait for the next published state. False once the observer stopped.
    pub async fn changed(&mut self) -> bool {
        self.state.changed().await.is_ok()
    }

    /// Wait until a published state satisfies `predicate`.
    pub async fn wait_for<F>(&mut self, mut predicate: F) -> QueryState<T>
    where
        F: FnMut(&QueryState<T>) -> bool,
    {
        let found = match self.state.wait_for(|state| predicate(state)).await {
            Ok(state) => Some(state.clone()),
            Err(_) => None,
        };
        found.unwrap_or_else(|| self.state.borrow().clone())
    }

    /// Fetch now, joining a fetch already in flight.
    pub fn refetch(&self) -> SharedFetch {
        self.store.fetch(&self.key, Arc::clone(&self.fetcher))
    }
}

impl<T> Drop for QueryObserver<T> {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

impl<T> std::fmt::Debug for QueryObserver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryObserver")
            .field("key", &self.key)
            .field("options", &self.options)
            .finish()
    }
}

fn polling(every: Option<Duration>) -> Option<Interval> {
    every.map(|period| {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker
    })
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

async fn drive<T>(
    store: QueryStore,
    key: QueryKey,
    fetcher: QueryFn,
    options: QueryOptions,
    mut signals: mpsc::UnboundedReceiver<StoreSignal>,
    state_tx: watch::Sender<QueryState<T>>,
) where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    let mut ticker = if options.enabled {
        polling(options.refetch_interval())
    } else {
        None
    };

    loop {
        tokio::select! {
            signal = signals.recv() => {
                let Some(signal) = signal else { break };
                let next = QueryState::from_entry(signal.entry(), &state_tx.borrow());
                state_tx.send_replace(next);
                if matches!(signal, StoreSignal::Invalidated(_)) && options.enabled {
                    tracing::debug!(%key, "refetching invalidated query");
                    drop(store.fetch(&key, Arc::clone(&fetcher)));
                }
            }
            _ = next_tick(&mut ticker) => {
                tracing::debug!(%key, "interval refetch");
                drop(store.fetch(&key, Arc::clone(&fetcher)));
            }
        }
    }
}
