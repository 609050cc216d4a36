//! The keyed query store.
//!
//! One owned [`QueryStore`] holds every cache entry of a client. Handles are
//! cheap clones of the same store. Listeners registered through
//! [`QueryStore::subscribe`] are invoked synchronously for their exact key,
//! after the internal lock has been released, so a listener may call back
//! into the store.
//!
//! A fetch in flight is detached from its key when the key is invalidated or
//! optimistically patched. A detached fetch still resolves for everyone
//! holding its handle, but its outcome is never written over the entry.

use crate::entry::{CacheEntry, QueryStatus};
use crate::QueryKey;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use talentloom_core::{ServiceError, ServiceResult};
use tokio::time::Instant;

/// Produces the remote data of one key.
pub type QueryFn = Arc<dyn Fn() -> BoxFuture<'static, ServiceResult<Value>> + Send + Sync>;

/// Handle on a fetch in flight; every clone resolves to the same outcome.
pub type SharedFetch = Shared<BoxFuture<'static, ServiceResult<Value>>>;

/// Callback registered for one key.
pub type Listener = Arc<dyn Fn(&StoreSignal) + Send + Sync>;

/// Wrap a typed async fetcher as a [`QueryFn`].
pub fn query_fn<T, F, Fut>(fetch: F) -> QueryFn
where
    T: Serialize + Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ServiceResult<T>> + Send + 'static,
{
    Arc::new(move || {
        let fut = fetch();
        async move {
            let value = fut.await?;
            Ok(serde_json::to_value(value)?)
        }
        .boxed()
    })
}

/// What a listener is told about its key.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreSignal {
    /// Data, status or error of the entry changed.
    Updated(CacheEntry),
    /// The entry was marked stale by a prefix invalidation.
    Invalidated(CacheEntry),
}

impl StoreSignal {
    pub fn entry(&self) -> &CacheEntry {
        match self {
            StoreSignal::Updated(entry) | StoreSignal::Invalidated(entry) => entry,
        }
    }
}

/// Counters since the store was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub fetches_started: u64,
    /// Fetch requests that joined one already in flight.
    pub dedup_joins: u64,
    /// Listener invocations.
    pub notifications: u64,
    /// Entries marked stale by invalidations.
    pub invalidations: u64,
    /// In-flight fetches detached by an invalidation or optimistic patch.
    pub superseded: u64,
    pub entries: usize,
}

struct InFlight {
    id: u64,
    shared: SharedFetch,
}

#[derive(Default)]
struct StoreState {
    entries: HashMap<QueryKey, CacheEntry>,
    listeners: HashMap<QueryKey, Vec<(u64, Listener)>>,
    in_flight: HashMap<QueryKey, InFlight>,
    next_listener_id: u64,
    next_fetch_id: u64,
    stats: CacheStats,
}

impl StoreState {
    fn entry_mut(&mut self, key: &QueryKey, stale_after: Duration) -> &mut CacheEntry {
        self.entries
            .entry(key.clone())
            .or_insert_with(|| CacheEntry::new(key.clone(), stale_after))
    }

    fn listeners_of(&self, key: &QueryKey) -> Vec<Listener> {
        self.listeners
            .get(key)
            .map(|ls| ls.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default()
    }

    /// Detach every fetch in flight under `prefix` from its key.
    fn detach_fetches(&mut self, prefix: &QueryKey) -> usize {
        let before = self.in_flight.len();
        self.in_flight.retain(|key, _| !prefix.is_prefix_of(key));
        let detached = before - self.in_flight.len();
        self.stats.superseded += detached as u64;
        detached
    }
}

type Pending = Vec<(Listener, StoreSignal)>;

struct StoreInner {
    state: Mutex<StoreState>,
    default_stale_after: Duration,
}

impl StoreInner {
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove_listener(&self, key: &QueryKey, id: u64) {
        let mut state = self.lock();
        let mut removed = false;
        if let Some(listeners) = state.listeners.get_mut(key) {
            let before = listeners.len();
            listeners.retain(|(lid, _)| *lid != id);
            removed = listeners.len() != before;
            if listeners.is_empty() {
                state.listeners.remove(key);
            }
        }
        if let Some(entry) = state.entries.get_mut(key) {
            if removed {
                entry.subscriber_count = entry.subscriber_count.saturating_sub(1);
            }
            entry.last_active = Instant::now();
        }
    }
}

/// Shared in-memory store of query entries.
#[derive(Clone)]
pub struct QueryStore {
    inner: Arc<StoreInner>,
}

impl Default for QueryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for QueryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryStore")
            .field("stats", &self.stats())
            .finish()
    }
}

impl QueryStore {
    /// Store whose entries are stale as soon as they are fetched unless an
    /// observer configures otherwise.
    pub fn new() -> Self {
        Self::with_default_stale_after(Duration::ZERO)
    }

    pub fn with_default_stale_after(default_stale_after: Duration) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: Mutex::new(StoreState::default()),
                default_stale_after,
            }),
        }
    }

    fn deliver(&self, pending: Pending) {
        if pending.is_empty() {
            return;
        }
        self.inner.lock().stats.notifications += pending.len() as u64;
        for (listener, signal) in pending {
            listener(&signal);
        }
    }

    /// Snapshot of the entry at `key`.
    pub fn get(&self, key: &QueryKey) -> Option<CacheEntry> {
        self.inner.lock().entries.get(key).cloned()
    }

    /// Data of the entry at `key`.
    pub fn data(&self, key: &QueryKey) -> Option<Value> {
        self.inner
            .lock()
            .entries
            .get(key)
            .and_then(|entry| entry.data.clone())
    }

    /// Keys of every entry currently stored.
    pub fn keys(&self) -> Vec<QueryKey> {
        self.inner.lock().entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.inner.lock().in_flight.contains_key(key)
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.inner.lock();
        CacheStats {
            entries: state.entries.len(),
            ..state.stats
        }
    }

    /// Authoritative write: the entry becomes fresh `Success` data.
    ///
    /// Subscribers of `key` are notified only if data, status or error
    /// actually changed. Writing with no subscribers still stores the data.
    pub fn set(&self, key: &QueryKey, data: Value) {
        let pending = {
            let mut state = self.inner.lock();
            let default = self.inner.default_stale_after;
            let changed = write_success(state.entry_mut(key, default), data);
            match changed {
                Some(entry) => broadcast(&state, key, StoreSignal::Updated(entry)),
                None => Vec::new(),
            }
        };
        self.deliver(pending);
    }

    /// Typed variant of [`Self::set`].
    pub fn set_typed<T: Serialize>(&self, key: &QueryKey, data: &T) -> ServiceResult<()> {
        self.set(key, serde_json::to_value(data)?);
        Ok(())
    }

    /// Replace the data at `key` with `patch(current)`, leaving status and
    /// freshness untouched.
    ///
    /// Returns the prior data, or `None` without calling `patch` when the
    /// entry is missing or holds no data.
    pub fn update<F>(&self, key: &QueryKey, patch: F) -> Option<Value>
    where
        F: FnOnce(&Value) -> Value,
    {
        self.patch(key, patch, false)
    }

    /// Like [`Self::update`], first detaching fetches in flight under `key`
    /// so their results cannot overwrite the patched data.
    ///
    /// Nothing is detached when the entry holds no data.
    pub fn optimistic_update<F>(&self, key: &QueryKey, patch: F) -> Option<Value>
    where
        F: FnOnce(&Value) -> Value,
    {
        self.patch(key, patch, true)
    }

    fn patch<F>(&self, key: &QueryKey, patch: F, detach: bool) -> Option<Value>
    where
        F: FnOnce(&Value) -> Value,
    {
        let (prior, pending) = {
            let mut state = self.inner.lock();
            let has_data = state.entries.get(key).is_some_and(|e| e.data.is_some());
            if detach && has_data {
                let detached = state.detach_fetches(key);
                if detached > 0 {
                    tracing::debug!(%key, detached, "optimistic patch superseded fetches");
                }
            }
            let entry = state.entries.get_mut(key)?;
            let prior = entry.data.clone()?;
            let next = patch(&prior);
            if next == prior {
                return Some(prior);
            }
            entry.data = Some(next);
            entry.last_active = Instant::now();
            let snapshot = entry.clone();
            (prior, broadcast(&state, key, StoreSignal::Updated(snapshot)))
        };
        self.deliver(pending);
        Some(prior)
    }

    /// Put `data` back at `key` without touching status or freshness.
    ///
    /// Used to roll back an optimistic patch; a missing entry is recreated.
    pub fn restore(&self, key: &QueryKey, data: Value) {
        let pending = {
            let mut state = self.inner.lock();
            let default = self.inner.default_stale_after;
            let entry = state.entry_mut(key, default);
            if entry.data.as_ref() == Some(&data) {
                Vec::new()
            } else {
                entry.data = Some(data);
                entry.last_active = Instant::now();
                let snapshot = entry.clone();
                broadcast(&state, key, StoreSignal::Updated(snapshot))
            }
        };
        self.deliver(pending);
    }

    /// Mark every entry under `prefix` stale and tell its subscribers.
    ///
    /// Returns how many entries matched; zero matches is not an error.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let (matched, pending) = {
            let mut state = self.inner.lock();
            let mut marked = Vec::new();
            for (key, entry) in state.entries.iter_mut() {
                if prefix.is_prefix_of(key) {
                    entry.invalidated = true;
                    marked.push(entry.clone());
                }
            }
            state.stats.invalidations += marked.len() as u64;
            state.detach_fetches(prefix);
            let matched = marked.len();
            let mut pending = Vec::new();
            for entry in marked {
                let key = entry.key.clone();
                pending.extend(broadcast(&state, &key, StoreSignal::Invalidated(entry)));
            }
            (matched, pending)
        };
        tracing::debug!(%prefix, matched, "invalidated");
        self.deliver(pending);
        matched
    }

    /// Register `listener` for `key`, creating an `Idle` entry if needed.
    pub fn subscribe(&self, key: &QueryKey, listener: Listener) -> Subscription {
        self.observe(key, None, listener)
    }

    /// Like [`Self::subscribe`], also setting the entry's freshness window.
    pub fn observe(
        &self,
        key: &QueryKey,
        stale_after: Option<Duration>,
        listener: Listener,
    ) -> Subscription {
        let mut state = self.inner.lock();
        let default = self.inner.default_stale_after;
        let entry = state.entry_mut(key, stale_after.unwrap_or(default));
        if let Some(stale_after) = stale_after {
            entry.stale_after = stale_after;
        }
        entry.subscriber_count += 1;
        entry.last_active = Instant::now();
        state.next_listener_id += 1;
        let id = state.next_listener_id;
        state
            .listeners
            .entry(key.clone())
            .or_default()
            .push((id, listener));
        Subscription {
            store: Arc::downgrade(&self.inner),
            key: key.clone(),
            id,
            active: true,
        }
    }

    /// Fetch `key` through `fetcher`, or join the fetch already in flight.
    ///
    /// The entry turns `Loading` while keeping its data. The fetch runs on
    /// its own task and writes its outcome into the store even if every
    /// caller drops the returned handle.
    pub fn fetch(&self, key: &QueryKey, fetcher: QueryFn) -> SharedFetch {
        let (shared, pending) = {
            let mut state = self.inner.lock();
            if let Some(existing) = state.in_flight.get(key) {
                let existing = existing.shared.clone();
                state.stats.dedup_joins += 1;
                tracing::debug!(%key, "joined in-flight fetch");
                return existing;
            }
            state.stats.fetches_started += 1;
            let default = self.inner.default_stale_after;
            let entry = state.entry_mut(key, default);
            let pending = if entry.status == QueryStatus::Loading {
                Vec::new()
            } else {
                entry.status = QueryStatus::Loading;
                let snapshot = entry.clone();
                broadcast(&state, key, StoreSignal::Updated(snapshot))
            };

            state.next_fetch_id += 1;
            let id = state.next_fetch_id;
            let store = self.clone();
            let task_key = key.clone();
            let handle = tokio::spawn(async move {
                let outcome = fetcher().await;
                store.complete(&task_key, id, outcome.clone());
                outcome
            });
            let shared = async move {
                match handle.await {
                    Ok(outcome) => outcome,
                    Err(err) => Err(ServiceError::unknown(format!("fetch task failed: {}", err))),
                }
            }
            .boxed()
            .shared();
            state.in_flight.insert(
                key.clone(),
                InFlight {
                    id,
                    shared: shared.clone(),
                },
            );
            tracing::debug!(%key, "fetch started");
            (shared, pending)
        };
        self.deliver(pending);
        shared
    }

    fn complete(&self, key: &QueryKey, id: u64, outcome: ServiceResult<Value>) {
        let pending = {
            let mut state = self.inner.lock();
            match state.in_flight.get(key).map(|flight| flight.id) {
                Some(current) if current == id => {
                    state.in_flight.remove(key);
                }
                Some(_) => {
                    tracing::debug!(%key, "superseded fetch finished; a newer one is in flight");
                    return;
                }
                None => {
                    tracing::debug!(%key, "superseded fetch finished");
                    let changed = state.entries.get_mut(key).and_then(settle_superseded);
                    let pending = match changed {
                        Some(entry) => broadcast(&state, key, StoreSignal::Updated(entry)),
                        None => Vec::new(),
                    };
                    drop(state);
                    self.deliver(pending);
                    return;
                }
            }
            let default = self.inner.default_stale_after;
            let entry = state.entry_mut(key, default);
            let changed = match outcome {
                Ok(data) => {
                    tracing::debug!(%key, "fetch succeeded");
                    write_success(entry, data)
                }
                Err(err) => {
                    tracing::warn!(%key, error = %err, "fetch failed");
                    write_error(entry, err)
                }
            };
            match changed {
                Some(entry) => broadcast(&state, key, StoreSignal::Updated(entry)),
                None => Vec::new(),
            }
        };
        self.deliver(pending);
    }

    /// Drop entries nobody observes whose last activity is at least `grace`
    /// old. Entries with a fetch in flight are kept.
    pub fn prune_unobserved(&self, grace: Duration) -> usize {
        let now = Instant::now();
        let mut state = self.inner.lock();
        let StoreState {
            entries, in_flight, ..
        } = &mut *state;
        let before = entries.len();
        entries.retain(|key, entry| {
            entry.subscriber_count > 0
                || in_flight.contains_key(key)
                || now.saturating_duration_since(entry.last_active) < grace
        });
        let pruned = before - entries.len();
        if pruned > 0 {
            tracing::debug!(pruned, "pruned unobserved entries");
        }
        pruned
    }
}

/// Apply a successful write; returns the new snapshot if anything a
/// subscriber can see changed.
fn write_success(entry: &mut CacheEntry, data: Value) -> Option<CacheEntry> {
    let now = Instant::now();
    let changed = entry.data.as_ref() != Some(&data)
        || entry.status != QueryStatus::Success
        || entry.error.is_some();
    entry.data = Some(data);
    entry.status = QueryStatus::Success;
    entry.error = None;
    entry.fetched_at = Some(now);
    entry.invalidated = false;
    entry.last_active = now;
    changed.then(|| entry.clone())
}

/// Leave `Loading` after a detached fetch finished with nothing newer in
/// flight. Data, freshness and the invalidation mark are untouched.
fn settle_superseded(entry: &mut CacheEntry) -> Option<CacheEntry> {
    if entry.status != QueryStatus::Loading {
        return None;
    }
    entry.status = if entry.error.is_some() {
        QueryStatus::Error
    } else if entry.data.is_some() {
        QueryStatus::Success
    } else {
        QueryStatus::Idle
    };
    entry.last_active = Instant::now();
    Some(entry.clone())
}

fn write_error(entry: &mut CacheEntry, error: ServiceError) -> Option<CacheEntry> {
    let before = (entry.status, entry.error.clone());
    entry.status = QueryStatus::Error;
    entry.error = Some(error);
    entry.last_active = Instant::now();
    let changed = before.0 != entry.status || before.1.as_ref() != entry.error.as_ref();
    changed.then(|| entry.clone())
}

fn broadcast(state: &StoreState, key: &QueryKey, signal: StoreSignal) -> Pending {
    state
        .listeners_of(key)
        .into_iter()
        .map(|listener| (listener, signal.clone()))
        .collect()
}

/// Registration of one listener. Dropping it unsubscribes.
pub struct Subscription {
    store: Weak<StoreInner>,
    key: QueryKey,
    id: u64,
    active: bool,
}

impl Subscription {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn is_active(&self) -> bool {
        self.active && self.store.strong_count() > 0
    }

    /// Remove the listener now; later calls are no-ops.
    pub fn unsubscribe(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(store) = self.store.upgrade() {
            store.remove_listener(&self.key, self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("active", &self.active)
            .finish()
    }
}
