//! TalentLoom Cache - Query Synchronization Layer
//!
//! Hierarchical query keys and the registry of every key the dashboard uses,
//! a shared keyed store with exact-key notification and prefix
//! invalidation, observers that keep one consumer in sync with one key, and
//! the optimistic mutation controller.

mod entry;
mod freshness;
mod key;
pub mod keys;
mod mutation;
mod observer;
mod store;

pub use entry::{CacheEntry, QueryStatus};
pub use freshness::{QueryOptions, QueryOverrides};
pub use key::QueryKey;
pub use keys::Resource;
pub use mutation::{
    MutationController, MutationSpec, OptimisticSnapshot, Patch, PendingMutation, Reconcile,
};
pub use observer::{QueryObserver, QueryState};
pub use store::{
    query_fn, CacheStats, Listener, QueryFn, QueryStore, SharedFetch, StoreSignal, Subscription,
};
