//! Remote service facade.
//!
//! One trait per resource. Every call is slow and fallible: callers must be
//! prepared for any latency and for every [`ServiceError`] variant. Calls are
//! not abortable and carry no timeout.

use async_trait::async_trait;
use talentloom_core::{
    BillingPlan, Candidate, CandidateFilters, CandidateId, CandidatePatch, ExportFormat,
    ExportId, ExportJob, ExportParams, ExportStatus, IndexRefresh, Invoice, JobId, JobPatch,
    JobPosting, KpiData, MatchScore, NewCandidate, NewJobPosting, NewOffer, NewPayout, Offer,
    OfferId, OfferPatch, OfferStatus, PaymentMethod, PaymentMethodRequest, Payout, PipelineItem,
    PipelineItemId, PipelinePatch, PipelineStage, PlanChange, ServiceError, ServiceResult,
    StageSuggestion,
};

#[async_trait]
pub trait CandidatesApi: Send + Sync {
    async fn list_candidates(&self, filters: &CandidateFilters) -> ServiceResult<Vec<Candidate>>;

    async fn get_candidate(&self, id: &CandidateId) -> ServiceResult<Candidate>;

    /// Semantic search with a plain name/skill substring fallback.
    async fn search_candidates(&self, query: &str) -> ServiceResult<Vec<Candidate>>;

    async fn create_candidate(&self, input: NewCandidate) -> ServiceResult<Candidate>;

    async fn update_candidate(
        &self,
        id: &CandidateId,
        patch: CandidatePatch,
    ) -> ServiceResult<Candidate>;
}

#[async_trait]
pub trait JobsApi: Send + Sync {
    async fn list_jobs(&self) -> ServiceResult<Vec<JobPosting>>;

    async fn get_job(&self, id: &JobId) -> ServiceResult<JobPosting>;

    async fn search_jobs(&self, query: &str) -> ServiceResult<Vec<JobPosting>>;

    async fn create_job(&self, input: NewJobPosting) -> ServiceResult<JobPosting>;

    async fn update_job(&self, id: &JobId, patch: JobPatch) -> ServiceResult<JobPosting>;
}

#[async_trait]
pub trait PipelineApi: Send + Sync {
    async fn list_pipeline(&self) -> ServiceResult<Vec<PipelineItem>>;

    async fn get_pipeline_item(&self, id: &PipelineItemId) -> ServiceResult<PipelineItem>;

    async fn search_pipeline(&self, query: &str) -> ServiceResult<Vec<PipelineItem>>;

    /// Put a candidate on a job's board in the `sourced` stage.
    async fn add_to_pipeline(
        &self,
        candidate_id: &CandidateId,
        job_id: &JobId,
    ) -> ServiceResult<PipelineItem>;

    async fn update_pipeline_item(
        &self,
        id: &PipelineItemId,
        patch: PipelinePatch,
    ) -> ServiceResult<PipelineItem>;

    async fn move_pipeline_item(
        &self,
        id: &PipelineItemId,
        stage: PipelineStage,
    ) -> ServiceResult<PipelineItem>;

    /// Never fails: falls back to a canned suggestion.
    async fn stage_suggestion(&self, id: &PipelineItemId) -> ServiceResult<StageSuggestion>;
}

#[async_trait]
pub trait OffersApi: Send + Sync {
    async fn list_offers(&self) -> ServiceResult<Vec<Offer>>;

    async fn get_offer(&self, id: &OfferId) -> ServiceResult<Offer>;

    async fn search_offers(&self, query: &str) -> ServiceResult<Vec<Offer>>;

    async fn create_offer(&self, input: NewOffer) -> ServiceResult<Offer>;

    async fn update_offer(&self, id: &OfferId, patch: OfferPatch) -> ServiceResult<Offer>;

    async fn update_offer_status(&self, id: &OfferId, status: OfferStatus)
        -> ServiceResult<Offer>;

    /// Never fails: falls back to a canned summary.
    async fn offer_summary(&self, id: &OfferId) -> ServiceResult<String>;
}

#[async_trait]
pub trait MatchesApi: Send + Sync {
    async fn list_matches(&self) -> ServiceResult<Vec<MatchScore>>;

    async fn matches_for_job(&self, job_id: &JobId) -> ServiceResult<Vec<MatchScore>>;

    /// Never fails: falls back to a canned explanation.
    async fn match_explanation(
        &self,
        candidate_id: &CandidateId,
        job_id: &JobId,
    ) -> ServiceResult<String>;

    async fn refresh_index(&self) -> ServiceResult<IndexRefresh>;
}

#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn kpis(&self) -> ServiceResult<KpiData>;

    /// Never fails: falls back to a canned narrative.
    async fn kpi_narrative(&self) -> ServiceResult<String>;
}

#[async_trait]
pub trait BillingApi: Send + Sync {
    async fn plan(&self) -> ServiceResult<BillingPlan>;

    async fn update_plan(&self, plan_name: &str) -> ServiceResult<PlanChange>;

    async fn add_payment_method(&self, request: PaymentMethodRequest)
        -> ServiceResult<PaymentMethod>;

    async fn list_invoices(&self) -> ServiceResult<Vec<Invoice>>;
}

#[async_trait]
pub trait PayoutsApi: Send + Sync {
    async fn list_payouts(&self) -> ServiceResult<Vec<Payout>>;

    async fn create_payout(&self, input: NewPayout) -> ServiceResult<Payout>;
}

#[async_trait]
pub trait ReportsApi: Send + Sync {
    async fn export_async(
        &self,
        format: ExportFormat,
        params: ExportParams,
    ) -> ServiceResult<ExportJob>;

    async fn export_status(&self, id: &ExportId) -> ServiceResult<ExportStatus>;
}

/// The full facade the dashboard talks to.
pub trait RecruitingApi:
    CandidatesApi
    + JobsApi
    + PipelineApi
    + OffersApi
    + MatchesApi
    + DashboardApi
    + BillingApi
    + PayoutsApi
    + ReportsApi
{
}

impl<T> RecruitingApi for T where
    T: CandidatesApi
        + JobsApi
        + PipelineApi
        + OffersApi
        + MatchesApi
        + DashboardApi
        + BillingApi
        + PayoutsApi
        + ReportsApi
{
}

/// Reject blank required text fields before a write is issued.
pub fn require_text(field: &str, value: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::validation(field, "must not be empty"));
    }
    Ok(())
}
