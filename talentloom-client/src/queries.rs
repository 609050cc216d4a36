//! Typed query bindings, one per dashboard read.
//!
//! Each binding resolves its options from the resource defaults and the
//! configured overrides, then applies its own enable rule: detail queries
//! need a non-empty id and searches need more than two characters.

use crate::client::TalentloomClient;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use talentloom_cache::{keys, query_fn, QueryFn, QueryKey, QueryObserver, Resource};
use talentloom_core::{
    BillingPlan, Candidate, CandidateFilters, CandidateId, EntityIdType, ExportId, ExportStatus,
    Invoice, JobId, JobPosting, KpiData, MatchScore, Offer, OfferId, Payout, PipelineItem,
    PipelineItemId, StageSuggestion,
};

/// Searches shorter than this many characters never fetch.
const MIN_SEARCH_CHARS: usize = 3;

fn is_searchable(query: &str) -> bool {
    query.chars().count() >= MIN_SEARCH_CHARS
}

impl TalentloomClient {
    fn bind<T>(&self, resource: Resource, key: QueryKey, fetcher: QueryFn, allowed: bool) -> QueryObserver<T>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        let mut options = self.query_options(resource);
        options.enabled = options.enabled && allowed;
        tracing::debug!(%key, %resource, enabled = options.enabled, "binding query");
        QueryObserver::spawn(&self.store, key, fetcher, options)
    }

    pub fn candidates(&self, filters: CandidateFilters) -> QueryObserver<Vec<Candidate>> {
        let api = Arc::clone(&self.api);
        let key = keys::candidates(&filters);
        let fetcher = query_fn(move || {
            let api = Arc::clone(&api);
            let filters = filters.clone();
            async move { api.list_candidates(&filters).await }
        });
        self.bind(Resource::Candidates, key, fetcher, true)
    }

    pub fn candidate_search(&self, query: &str) -> QueryObserver<Vec<Candidate>> {
        let api = Arc::clone(&self.api);
        let allowed = is_searchable(query);
        let key = keys::candidate_search(query);
        let query = query.to_string();
        let fetcher = query_fn(move || {
            let api = Arc::clone(&api);
            let query = query.clone();
            async move { api.search_candidates(&query).await }
        });
        self.bind(Resource::CandidateSearch, key, fetcher, allowed)
    }

    pub fn candidate(&self, id: &CandidateId) -> QueryObserver<Candidate> {
        let api = Arc::clone(&self.api);
        let allowed = !id.as_str().is_empty();
        let id = id.clone();
        let key = keys::candidate(&id);
        let fetcher = query_fn(move || {
            let api = Arc::clone(&api);
            let id = id.clone();
            async move { api.get_candidate(&id).await }
        });
        self.bind(Resource::CandidateDetail, key, fetcher, allowed)
    }

    pub fn jobs(&self) -> QueryObserver<Vec<JobPosting>> {
        let api = Arc::clone(&self.api);
        let fetcher = query_fn(move || {
            let api = Arc::clone(&api);
            async move { api.list_jobs().await }
        });
        self.bind(Resource::Jobs, keys::jobs(), fetcher, true)
    }

    pub fn job(&self, id: &JobId) -> QueryObserver<JobPosting> {
        let api = Arc::clone(&self.api);
        let allowed = !id.as_str().is_empty();
        let id = id.clone();
        let key = keys::job(&id);
        let fetcher = query_fn(move || {
            let api = Arc::clone(&api);
            let id = id.clone();
            async move { api.get_job(&id).await }
        });
        self.bind(Resource::JobDetail, key, fetcher, allowed)
    }

    pub fn pipeline(&self) -> QueryObserver<Vec<PipelineItem>> {
        let api = Arc::clone(&self.api);
        let fetcher = query_fn(move || {
            let api = Arc::clone(&api);
            async move { api.list_pipeline().await }
        });
        self.bind(Resource::Pipeline, keys::pipeline(), fetcher, true)
    }

    pub fn pipeline_suggestion(&self, id: &PipelineItemId) -> QueryObserver<StageSuggestion> {
        let api = Arc::clone(&self.api);
        let allowed = !id.as_str().is_empty();
        let id = id.clone();
        let key = keys::pipeline_suggestion(&id);
        let fetcher = query_fn(move || {
            let api = Arc::clone(&api);
            let id = id.clone();
            async move { api.stage_suggestion(&id).await }
        });
        self.bind(Resource::PipelineSuggestion, key, fetcher, allowed)
    }

    pub fn offers(&self) -> QueryObserver<Vec<Offer>> {
        let api = Arc::clone(&self.api);
        let fetcher = query_fn(move || {
            let api = Arc::clone(&api);
            async move { api.list_offers().await }
        });
        self.bind(Resource::Offers, keys::offers(), fetcher, true)
    }

    pub fn offer_summary(&self, id: &OfferId) -> QueryObserver<String> {
        let api = Arc::clone(&self.api);
        let allowed = !id.as_str().is_empty();
        let id = id.clone();
        let key = keys::offer_summary(&id);
        let fetcher = query_fn(move || {
            let api = Arc::clone(&api);
            let id = id.clone();
            async move { api.offer_summary(&id).await }
        });
        self.bind(Resource::OfferSummary, key, fetcher, allowed)
    }

    pub fn matches(&self) -> QueryObserver<Vec<MatchScore>> {
        let api = Arc::clone(&self.api);
        let fetcher = query_fn(move || {
            let api = Arc::clone(&api);
            async move { api.list_matches().await }
        });
        self.bind(Resource::Matches, keys::matches(), fetcher, true)
    }

    pub fn matches_for_job(&self, job_id: &JobId) -> QueryObserver<Vec<MatchScore>> {
        let api = Arc::clone(&self.api);
        let allowed = !job_id.as_str().is_empty();
        let job_id = job_id.clone();
        let key = keys::matches_for_job(&job_id);
        let fetcher = query_fn(move || {
            let api = Arc::clone(&api);
            let job_id = job_id.clone();
            async move { api.matches_for_job(&job_id).await }
        });
        self.bind(Resource::MatchesForJob, key, fetcher, allowed)
    }

    pub fn match_explanation(
        &self,
        candidate_id: &CandidateId,
        job_id: &JobId,
    ) -> QueryObserver<String> {
        let api = Arc::clone(&self.api);
        let allowed = !candidate_id.as_str().is_empty() && !job_id.as_str().is_empty();
        let candidate_id = candidate_id.clone();
        let job_id = job_id.clone();
        let key = keys::match_explanation(&candidate_id, &job_id);
        let fetcher = query_fn(move || {
            let api = Arc::clone(&api);
            let candidate_id = candidate_id.clone();
            let job_id = job_id.clone();
            async move { api.match_explanation(&candidate_id, &job_id).await }
        });
        self.bind(Resource::MatchExplanation, key, fetcher, allowed)
    }

    pub fn dashboard(&self) -> QueryObserver<KpiData> {
        let api = Arc::clone(&self.api);
        let fetcher = query_fn(move || {
            let api = Arc::clone(&api);
            async move { api.kpis().await }
        });
        self.bind(Resource::Dashboard, keys::dashboard(), fetcher, true)
    }

    pub fn dashboard_narrative(&self) -> QueryObserver<String> {
        let api = Arc::clone(&self.api);
        let fetcher = query_fn(move || {
            let api = Arc::clone(&api);
            async move { api.kpi_narrative().await }
        });
        self.bind(Resource::DashboardNarrative, keys::dashboard_narrative(), fetcher, true)
    }

    pub fn export_status(&self, id: &ExportId) -> QueryObserver<ExportStatus> {
        let api = Arc::clone(&self.api);
        let allowed = !id.as_str().is_empty();
        let id = id.clone();
        let key = keys::export_status(&id);
        let fetcher = query_fn(move || {
            let api = Arc::clone(&api);
            let id = id.clone();
            async move { api.export_status(&id).await }
        });
        self.bind(Resource::ExportStatus, key, fetcher, allowed)
    }

    pub fn billing_plan(&self) -> QueryObserver<BillingPlan> {
        let api = Arc::clone(&self.api);
        let fetcher = query_fn(move || {
            let api = Arc::clone(&api);
            async move { api.plan().await }
        });
        self.bind(Resource::BillingPlan, keys::billing_plan(), fetcher, true)
    }

    pub fn invoices(&self) -> QueryObserver<Vec<Invoice>> {
        let api = Arc::clone(&self.api);
        let fetcher = query_fn(move || {
            let api = Arc::clone(&api);
            async move { api.list_invoices().await }
        });
        self.bind(Resource::Invoices, keys::invoices(), fetcher, true)
    }

    pub fn payouts(&self) -> QueryObserver<Vec<Payout>> {
        let api = Arc::clone(&self.api);
        let fetcher = query_fn(move || {
            let api = Arc::clone(&api);
            async move { api.list_payouts().await }
        });
        self.bind(Resource::Payouts, keys::payouts(), fetcher, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use talentloom_api::{LatencyProfile, MockRecruitingApi, Operation};
    use talentloom_cache::{QueryOverrides, QueryStatus};
    use talentloom_core::ServiceError;

    fn client_over(api: Arc<MockRecruitingApi>, config: ClientConfig) -> TalentloomClient {
        TalentloomClient::new(api, config)
    }

    fn instant() -> Arc<MockRecruitingApi> {
        Arc::new(MockRecruitingApi::seeded().with_latency(LatencyProfile::instant()))
    }

    #[test]
    fn test_search_threshold() {
        assert!(!is_searchable(""));
        assert!(!is_searchable("ru"));
        assert!(is_searchable("rus"));
        assert!(is_searchable("éüö"));
    }

    #[tokio::test]
    async fn test_pipeline_loads_seeded_board() {
        let client = client_over(instant(), ClientConfig::default());
        let mut board = client.pipeline();
        let state = board.wait_for(|s| s.is_settled()).await;
        assert_eq!(state.status, QueryStatus::Success);
        assert!(!state.data.unwrap_or_default().is_empty());
        assert_eq!(board.options().stale_after_ms, 120_000);
    }

    #[tokio::test]
    async fn test_short_search_never_fetches() {
        let api = instant();
        let client = client_over(Arc::clone(&api), ClientConfig::default());
        let search = client.candidate_search("ab");
        tokio::task::yield_now().await;
        assert!(!search.options().enabled);
        assert_eq!(search.state().status, QueryStatus::Idle);
        assert_eq!(api.calls().count(Operation::SearchCandidates), 0);
    }

    #[tokio::test]
    async fn test_empty_id_disables_detail() {
        let api = instant();
        let client = client_over(Arc::clone(&api), ClientConfig::default());
        let job = client.job(&JobId::new(""));
        let matches = client.matches_for_job(&JobId::new(""));
        tokio::task::yield_now().await;
        assert!(!job.options().enabled);
        assert!(!matches.options().enabled);
        assert_eq!(api.calls().count(Operation::GetJob), 0);
        assert_eq!(api.calls().count(Operation::MatchesForJob), 0);
    }

    #[tokio::test]
    async fn test_configured_override_disables_resource() {
        let api = instant();
        let mut config = ClientConfig::default();
        config.queries.insert(
            "offers".to_string(),
            QueryOverrides {
                enabled: Some(false),
                ..Default::default()
            },
        );
        let client = client_over(Arc::clone(&api), config);
        let offers = client.offers();
        tokio::task::yield_now().await;
        assert!(!offers.options().enabled);
        assert_eq!(api.calls().count(Operation::ListOffers), 0);
    }

    #[tokio::test]
    async fn test_missing_detail_surfaces_not_found() {
        let client = client_over(instant(), ClientConfig::default());
        let mut candidate = client.candidate(&CandidateId::new("missing"));
        let state = candidate.wait_for(|s| s.is_settled()).await;
        assert!(state.is_error());
        assert!(state.data.is_none());
        assert!(matches!(state.error, Some(ServiceError::NotFound { .. })));
    }
}
