//! The application root: one facade, one store, one notifier.

use crate::config::ClientConfig;
use std::sync::Arc;
use talentloom_api::{LatencyProfile, MockRecruitingApi, RecruitingApi};
use talentloom_cache::{MutationController, QueryOptions, QueryStore, Resource};
use talentloom_core::{NotificationCenter, Notifier};
use talentloom_events::RealtimeFeed;

/// Shared handle to the dashboard data layer.
///
/// Clones share the same store, notifications and realtime feed.
#[derive(Clone)]
pub struct TalentloomClient {
    pub(crate) api: Arc<dyn RecruitingApi>,
    pub(crate) store: QueryStore,
    pub(crate) notifications: Arc<NotificationCenter>,
    pub(crate) mutations: MutationController,
    pub(crate) feed: RealtimeFeed,
    pub(crate) config: Arc<ClientConfig>,
}

impl TalentloomClient {
    pub fn new(api: Arc<dyn RecruitingApi>, config: ClientConfig) -> Self {
        let store = QueryStore::new();
        let notifications = Arc::new(NotificationCenter::new());
        let notifier: Arc<dyn Notifier> = notifications.clone();
        let mutations = MutationController::new(store.clone(), Arc::clone(&notifier));
        let feed = RealtimeFeed::new(store.clone(), notifier, config.company());
        tracing::debug!(company = ?config.company_id, "client created");
        Self {
            api,
            store,
            notifications,
            mutations,
            feed,
            config: Arc::new(config),
        }
    }

    /// Client over the in-memory services described by `config.mock_api`.
    pub fn with_mock_api(config: ClientConfig) -> Self {
        let api = mock_api(&config);
        Self::new(Arc::new(api), config)
    }

    pub fn api(&self) -> &Arc<dyn RecruitingApi> {
        &self.api
    }

    pub fn store(&self) -> &QueryStore {
        &self.store
    }

    pub fn notifications(&self) -> &Arc<NotificationCenter> {
        &self.notifications
    }

    pub fn mutations(&self) -> &MutationController {
        &self.mutations
    }

    pub fn feed(&self) -> &RealtimeFeed {
        &self.feed
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn query_options(&self, resource: Resource) -> QueryOptions {
        self.config.query_options(resource)
    }
}

impl std::fmt::Debug for TalentloomClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TalentloomClient")
            .field("store", &self.store)
            .field("feed", &self.feed)
            .field("company_id", &self.config.company_id)
            .finish()
    }
}

/// Build the mock services a config asks for.
pub fn mock_api(config: &ClientConfig) -> MockRecruitingApi {
    let settings = &config.mock_api;
    let api = if settings.seed_demo_data {
        MockRecruitingApi::seeded()
    } else {
        MockRecruitingApi::empty()
    };
    api.with_latency(LatencyProfile::scaled(settings.latency_scale))
        .with_failure_rate(settings.failure_rate)
}
