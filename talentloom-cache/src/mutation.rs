//! Optimistic mutations.
//!
//! A mutation runs in phases: an optional synchronous patch of the affected
//! key (taking a snapshot first), the write itself, then reconcile-or-rollback
//! with a user notification, and finally a settle invalidation of the
//! affected key. Failed writes are never retried.

use crate::store::QueryStore;
use crate::QueryKey;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use talentloom_core::{Notification, Notifier, ServiceResult};

/// Optimistic transformation of the cached value at the affected key.
pub type Patch = Box<dyn FnOnce(&Value) -> Value + Send>;

/// Merge of an authoritative write result into the store.
pub type Reconcile<R> = Box<dyn FnOnce(&QueryStore, &R) + Send>;

enum SuccessNotice<R> {
    Message(String),
    Built(Box<dyn FnOnce(&R) -> Notification + Send>),
}

impl<R> SuccessNotice<R> {
    fn into_notification(self, result: &R) -> Notification {
        match self {
            SuccessNotice::Message(message) => Notification::success(message),
            SuccessNotice::Built(build) => build(result),
        }
    }
}

/// Data at a key before an optimistic patch, kept until the mutation settles.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimisticSnapshot {
    pub key: QueryKey,
    pub prior_data: Value,
}

/// Declarative description of one mutation.
pub struct MutationSpec<R> {
    name: String,
    key: QueryKey,
    patch: Option<Patch>,
    reconcile: Option<Reconcile<R>>,
    invalidates: Vec<QueryKey>,
    success: Option<SuccessNotice<R>>,
    error_message: String,
}

impl<R> MutationSpec<R> {
    /// `key` is the affected key: the one patched optimistically and
    /// invalidated when the mutation settles.
    pub fn new(name: impl Into<String>, key: QueryKey) -> Self {
        let name = name.into();
        Self {
            error_message: format!("{} failed", name),
            name,
            key,
            patch: None,
            reconcile: None,
            invalidates: Vec::new(),
            success: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn is_optimistic(&self) -> bool {
        self.patch.is_some()
    }

    pub fn optimistic<F>(mut self, patch: F) -> Self
    where
        F: FnOnce(&Value) -> Value + Send + 'static,
    {
        self.patch = Some(Box::new(patch));
        self
    }

    pub fn reconcile<F>(mut self, reconcile: F) -> Self
    where
        F: FnOnce(&QueryStore, &R) + Send + 'static,
    {
        self.reconcile = Some(Box::new(reconcile));
        self
    }

    /// Also invalidate `prefix` after a successful write.
    pub fn invalidates(mut self, prefix: QueryKey) -> Self {
        self.invalidates.push(prefix);
        self
    }

    pub fn success_message(mut self, message: impl Into<String>) -> Self {
        self.success = Some(SuccessNotice::Message(message.into()));
        self
    }

    /// Build the success notification from the write result.
    pub fn success_with<F>(mut self, notice: F) -> Self
    where
        F: FnOnce(&R) -> Notification + Send + 'static,
    {
        self.success = Some(SuccessNotice::Built(Box::new(notice)));
        self
    }

    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = message.into();
        self
    }
}

impl<R> std::fmt::Debug for MutationSpec<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationSpec")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("optimistic", &self.patch.is_some())
            .field("invalidates", &self.invalidates)
            .finish()
    }
}

/// Drives mutations against one store, reporting to one notifier.
#[derive(Clone)]
pub struct MutationController {
    store: QueryStore,
    notifier: Arc<dyn Notifier>,
}

impl MutationController {
    pub fn new(store: QueryStore, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    pub fn store(&self) -> &QueryStore {
        &self.store
    }

    /// Apply the optimistic patch, if any, and return the mutation awaiting
    /// its write outcome.
    ///
    /// Fetches in flight for the affected key are superseded so they cannot
    /// overwrite the patch. Without data at the key the patch is skipped;
    /// the remaining phases still run.
    pub fn begin<R>(&self, mut spec: MutationSpec<R>) -> PendingMutation<R> {
        let snapshot = spec.patch.take().and_then(|patch| {
            let prior = self.store.optimistic_update(&spec.key, patch)?;
            Some(OptimisticSnapshot {
                key: spec.key.clone(),
                prior_data: prior,
            })
        });
        if snapshot.is_some() {
            tracing::debug!(mutation = %spec.name, key = %spec.key, "applied optimistic patch");
        }
        PendingMutation {
            controller: self.clone(),
            spec,
            snapshot,
        }
    }

    /// Run a whole mutation: patch, await `write`, then settle.
    pub async fn run<R, Fut>(&self, spec: MutationSpec<R>, write: Fut) -> ServiceResult<R>
    where
        Fut: Future<Output = ServiceResult<R>>,
    {
        let pending = self.begin(spec);
        let outcome = write.await;
        pending.finish(outcome)
    }
}

impl std::fmt::Debug for MutationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationController")
            .field("store", &self.store)
            .finish()
    }
}

/// A mutation whose optimistic phase has run.
///
/// Dropping it without [`PendingMutation::finish`] leaves the patch in place
/// until the next fetch of the key.
pub struct PendingMutation<R> {
    controller: MutationController,
    spec: MutationSpec<R>,
    snapshot: Option<OptimisticSnapshot>,
}

impl<R> PendingMutation<R> {
    pub fn snapshot(&self) -> Option<&OptimisticSnapshot> {
        self.snapshot.as_ref()
    }

    /// Reconcile or roll back according to `outcome`, notify, and settle.
    pub fn finish(self, outcome: ServiceResult<R>) -> ServiceResult<R> {
        let PendingMutation {
            controller,
            spec,
            snapshot,
        } = self;
        let store = &controller.store;

        match &outcome {
            Ok(result) => {
                if let Some(reconcile) = spec.reconcile {
                    reconcile(store, result);
                }
                for prefix in &spec.invalidates {
                    store.invalidate(prefix);
                }
                if let Some(success) = spec.success {
                    controller.notifier.notify(success.into_notification(result));
                }
                tracing::debug!(mutation = %spec.name, "mutation succeeded");
            }
            Err(err) => {
                let rolled_back = snapshot.is_some();
                if let Some(snapshot) = snapshot {
                    store.restore(&snapshot.key, snapshot.prior_data);
                }
                controller
                    .notifier
                    .notify(Notification::error(spec.error_message.clone()));
                tracing::warn!(mutation = %spec.name, error = %err, rolled_back, "mutation failed");
            }
        }

        store.invalidate(&spec.key);
        outcome
    }
}

impl<R> std::fmt::Debug for PendingMutation<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingMutation")
            .field("spec", &self.spec)
            .field("snapshot", &self.snapshot)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use talentloom_core::{NotificationCenter, NotificationLevel, ServiceError};

    fn controller() -> (MutationController, Arc<NotificationCenter>) {
        let center = Arc::new(NotificationCenter::new());
        let notifier: Arc<dyn Notifier> = center.clone();
        (MutationController::new(QueryStore::new(), notifier), center)
    }

    fn rename(value: &Value) -> Value {
        let mut next = value.clone();
        next["name"] = json!("patched");
        next
    }

    #[tokio::test]
    async fn test_patch_is_visible_before_write_completes() {
        let (controller, _) = controller();
        let key = QueryKey::new("jobs").push("1");
        controller.store().set(&key, json!({"name": "original"}));

        let spec = MutationSpec::<()>::new("job.update", key.clone()).optimistic(rename);
        let pending = controller.begin(spec);
        assert_eq!(controller.store().data(&key), Some(json!({"name": "patched"})));
        assert_eq!(
            pending.snapshot().map(|s| s.prior_data.clone()),
            Some(json!({"name": "original"}))
        );
        pending.finish(Ok(())).unwrap();
    }

    #[tokio::test]
    async fn test_failure_restores_snapshot_and_notifies_once() {
        let (controller, center) = controller();
        let key = QueryKey::new("jobs").push("1");
        controller.store().set(&key, json!({"name": "original"}));

        let spec = MutationSpec::<()>::new("job.update", key.clone())
            .optimistic(rename)
            .success_message("Job posting updated successfully!")
            .error_message("Failed to update job posting");
        let outcome = controller
            .run(spec, async { Err(ServiceError::transient("jobs.update", "down")) })
            .await;

        assert!(outcome.is_err());
        assert_eq!(controller.store().data(&key), Some(json!({"name": "original"})));
        assert_eq!(center.count(NotificationLevel::Error), 1);
        assert_eq!(center.count(NotificationLevel::Success), 0);
        assert_eq!(center.history()[0].message, "Failed to update job posting");
        assert!(controller.store().get(&key).unwrap().invalidated);
    }

    #[tokio::test]
    async fn test_missing_entry_skips_patch_but_settles() {
        let (controller, center) = controller();
        let key = QueryKey::new("pipeline");
        let spec = MutationSpec::new("pipeline.add", key.clone())
            .optimistic(rename)
            .success_with(|count: &u32| Notification::success(format!("{count} added")));

        let outcome = controller.run(spec, async { Ok(2u32) }).await;
        assert_eq!(outcome, Ok(2));
        assert_eq!(controller.store().data(&key), None);
        assert_eq!(center.history()[0].message, "2 added");
    }

    #[tokio::test]
    async fn test_success_reconciles_and_invalidates_dependents() {
        let (controller, _) = controller();
        let list = QueryKey::new("jobs");
        let detail = QueryKey::new("jobs").push("1");
        let dashboard = QueryKey::new("dashboard");
        controller.store().set(&list, json!([]));
        controller.store().set(&dashboard, json!({}));

        let merge_key = detail.clone();
        let spec = MutationSpec::new("job.update", list.clone())
            .reconcile(move |store: &QueryStore, job: &Value| store.set(&merge_key, job.clone()))
            .invalidates(dashboard.clone());
        controller.run(spec, async { Ok(json!({"id": "1"})) }).await.unwrap();

        let store = controller.store();
        assert_eq!(store.data(&detail), Some(json!({"id": "1"})));
        assert!(store.get(&dashboard).unwrap().invalidated);
        assert!(store.get(&list).unwrap().invalidated);
        assert!(store.get(&detail).unwrap().invalidated);
    }
}
