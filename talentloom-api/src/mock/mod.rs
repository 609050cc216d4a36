//! In-memory implementation of the remote service facade.
//!
//! Every call sleeps for the operation's simulated latency, consults the
//! [`FaultInjector`], and then reads or writes shared in-memory state so that
//! writes are visible to later reads.

mod faults;
mod latency;
mod seed;

pub use faults::{CallLog, FaultInjector};
pub use latency::{LatencyProfile, Operation};

use crate::traits::{
    require_text, BillingApi, CandidatesApi, DashboardApi, JobsApi, MatchesApi, OffersApi,
    PayoutsApi, PipelineApi, ReportsApi,
};
use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use std::collections::{BTreeMap, HashMap};
use talentloom_core::{
    replace_by_id, BillingPlan, Candidate, CandidateFilters, CandidateId, CandidatePatch,
    EntityIdType, ExportFormat, ExportId, ExportJob, ExportParams, ExportStatus, IndexRefresh,
    Invoice, JobId, JobPatch, JobPosting, JobStatus, KpiData, MatchScore, NewCandidate,
    NewJobPosting, NewOffer, NewPayout, Offer, OfferId, OfferPatch, OfferStatus, PaymentMethod,
    PaymentMethodId, PaymentMethodRequest, Payout, PayoutId, PayoutStatus, PipelineItem,
    PipelineItemId, PipelinePatch, PipelineStage, PlanChange, ServiceError, ServiceResult,
    StageSuggestion,
};
use tokio::sync::RwLock;

const FALLBACK_STAGE_REASONING: &str =
    "Based on candidate profile and current stage, interview is the recommended next step.";
const FALLBACK_OFFER_SUMMARY: &str =
    "Comprehensive offer package with competitive compensation and benefits.";
const FALLBACK_MATCH_EXPLANATION: &str = "This candidate shows strong alignment with the role requirements based on skills, experience, and availability.";
const FALLBACK_KPI_NARRATIVE: &str =
    "Your hiring performance shows positive trends across key metrics.";
const AVG_TIME_TO_HIRE_DAYS: f64 = 18.5;

#[derive(Debug, Default)]
struct MockState {
    candidates: Vec<Candidate>,
    jobs: Vec<JobPosting>,
    pipeline: Vec<PipelineItem>,
    offers: Vec<Offer>,
    matches: Vec<MatchScore>,
    plan: Option<BillingPlan>,
    invoices: Vec<Invoice>,
    payouts: Vec<Payout>,
    payment_methods: Vec<PaymentMethod>,
    /// Pinned export outcomes; unpinned exports are sampled per status call.
    exports: HashMap<ExportId, Option<ExportStatus>>,
}

impl MockState {
    fn seeded() -> Self {
        Self {
            candidates: seed::candidates(),
            jobs: seed::jobs(),
            pipeline: seed::pipeline(),
            offers: seed::offers(),
            matches: seed::matches(),
            plan: Some(seed::plan()),
            invoices: seed::invoices(),
            payouts: seed::payouts(),
            payment_methods: Vec::new(),
            exports: HashMap::new(),
        }
    }

    fn candidate(&self, id: &CandidateId) -> ServiceResult<&Candidate> {
        self.candidates
            .iter()
            .find(|c| &c.id == id)
            .ok_or_else(|| ServiceError::not_found("Candidate", id.as_str()))
    }

    fn job(&self, id: &JobId) -> ServiceResult<&JobPosting> {
        self.jobs
            .iter()
            .find(|j| &j.id == id)
            .ok_or_else(|| ServiceError::not_found("JobPosting", id.as_str()))
    }

    fn pipeline_item_mut(&mut self, id: &PipelineItemId) -> ServiceResult<&mut PipelineItem> {
        self.pipeline
            .iter_mut()
            .find(|i| &i.id == id)
            .ok_or_else(|| ServiceError::not_found("PipelineItem", id.as_str()))
    }

    fn offer_mut(&mut self, id: &OfferId) -> ServiceResult<&mut Offer> {
        self.offers
            .iter_mut()
            .find(|o| &o.id == id)
            .ok_or_else(|| ServiceError::not_found("Offer", id.as_str()))
    }

    fn kpis(&self) -> KpiData {
        let mut pipeline_by_stage: BTreeMap<PipelineStage, u32> =
            PipelineStage::ALL.into_iter().map(|s| (s, 0)).collect();
        for item in &self.pipeline {
            *pipeline_by_stage.entry(item.stage).or_insert(0) += 1;
        }
        let stage_count = |stage| pipeline_by_stage.get(&stage).copied().unwrap_or(0);
        KpiData {
            active_jobs: count(self.jobs.iter().filter(|j| j.status == JobStatus::Active)),
            total_candidates: count(self.candidates.iter()),
            interviews_scheduled: stage_count(PipelineStage::Interview),
            offers_extended: count(self.offers.iter().filter(|o| {
                matches!(
                    o.status,
                    OfferStatus::Sent | OfferStatus::Viewed | OfferStatus::Accepted
                )
            })),
            hires_this_month: stage_count(PipelineStage::Hired),
            avg_time_to_hire_days: AVG_TIME_TO_HIRE_DAYS,
            pipeline_by_stage,
        }
    }
}

fn count<I: Iterator>(iter: I) -> u32 {
    u32::try_from(iter.count()).unwrap_or(u32::MAX)
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Stage a card would typically move to next on the board.
fn suggested_next(stage: PipelineStage) -> PipelineStage {
    match stage {
        PipelineStage::Sourced => PipelineStage::Shortlisted,
        PipelineStage::Shortlisted => PipelineStage::Interview,
        PipelineStage::Interview => PipelineStage::Offer,
        PipelineStage::Offer | PipelineStage::Hired => PipelineStage::Hired,
        PipelineStage::Rejected => PipelineStage::Rejected,
    }
}

/// In-memory recruiting services with simulated latency and failures.
#[derive(Debug)]
pub struct MockRecruitingApi {
    state: RwLock<MockState>,
    latency: LatencyProfile,
    faults: FaultInjector,
    calls: CallLog,
}

impl Default for MockRecruitingApi {
    fn default() -> Self {
        Self::seeded()
    }
}

impl MockRecruitingApi {
    /// Services preloaded with the demo data set.
    pub fn seeded() -> Self {
        Self::with_state(MockState::seeded())
    }

    /// Services with no data at all.
    pub fn empty() -> Self {
        Self::with_state(MockState::default())
    }

    fn with_state(state: MockState) -> Self {
        Self {
            state: RwLock::new(state),
            latency: LatencyProfile::default(),
            faults: FaultInjector::default(),
            calls: CallLog::default(),
        }
    }

    pub fn with_latency(mut self, latency: LatencyProfile) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_failure_rate(mut self, failure_rate: f64) -> Self {
        self.faults = FaultInjector::new(failure_rate);
        self
    }

    pub fn latency(&self) -> LatencyProfile {
        self.latency
    }

    pub fn faults(&self) -> &FaultInjector {
        &self.faults
    }

    pub fn calls(&self) -> &CallLog {
        &self.calls
    }

    /// Shorthand for [`FaultInjector::fail_next`].
    pub fn fail_next(&self, operation: Operation, error: ServiceError) {
        self.faults.fail_next(operation, error);
    }

    /// Pin the outcome reported for an export instead of sampling one.
    pub async fn set_export_status(&self, id: &ExportId, status: ExportStatus) {
        self.state
            .write()
            .await
            .exports
            .insert(id.clone(), Some(status));
    }

    pub async fn payment_methods(&self) -> Vec<PaymentMethod> {
        self.state.read().await.payment_methods.clone()
    }

    async fn enter(&self, operation: Operation) -> ServiceResult<()> {
        self.calls.record(operation);
        self.latency.wait(operation).await;
        let outcome = self.faults.check(operation);
        if let Err(ref err) = outcome {
            tracing::debug!(%operation, error = %err, "mock call failed");
        }
        outcome
    }

    /// Like [`Self::enter`], for calls backed by an assistant provider that
    /// degrade to canned text instead of failing.
    async fn enter_assisted(&self, operation: Operation) -> bool {
        match self.enter(operation).await {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(%operation, error = %err, "assistant unavailable, using fallback");
                false
            }
        }
    }
}

#[async_trait]
impl CandidatesApi for MockRecruitingApi {
    async fn list_candidates(&self, filters: &CandidateFilters) -> ServiceResult<Vec<Candidate>> {
        self.enter(Operation::ListCandidates).await?;
        let state = self.state.read().await;
        Ok(state
            .candidates
            .iter()
            .filter(|c| filters.matches(c))
            .cloned()
            .collect())
    }

    async fn get_candidate(&self, id: &CandidateId) -> ServiceResult<Candidate> {
        self.enter(Operation::GetCandidate).await?;
        self.state.read().await.candidate(id).cloned()
    }

    async fn search_candidates(&self, query: &str) -> ServiceResult<Vec<Candidate>> {
        self.enter(Operation::SearchCandidates).await?;
        let needle = query.to_lowercase();
        let state = self.state.read().await;
        Ok(state
            .candidates
            .iter()
            .filter(|c| {
                contains_ci(&c.name, &needle) || c.skills.iter().any(|s| contains_ci(s, &needle))
            })
            .cloned()
            .collect())
    }

    async fn create_candidate(&self, input: NewCandidate) -> ServiceResult<Candidate> {
        self.enter(Operation::CreateCandidate).await?;
        require_text("name", &input.name)?;
        require_text("email", &input.email)?;
        let now = Utc::now();
        let candidate = Candidate {
            id: CandidateId::generate(),
            name: input.name,
            email: input.email,
            skills: input.skills,
            track: input.track,
            reputation: 0.0,
            experience: input.experience,
            location: input.location,
            availability: input.availability,
            salary_expectation: None,
            bio: input.bio,
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.candidates.push(candidate.clone());
        Ok(candidate)
    }

    async fn update_candidate(
        &self,
        id: &CandidateId,
        patch: CandidatePatch,
    ) -> ServiceResult<Candidate> {
        self.enter(Operation::UpdateCandidate).await?;
        if let Some(name) = &patch.name {
            require_text("name", name)?;
        }
        let mut state = self.state.write().await;
        let candidate = state
            .candidates
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| ServiceError::not_found("Candidate", id.as_str()))?;
        if let Some(name) = patch.name {
            candidate.name = name;
        }
        if let Some(skills) = patch.skills {
            candidate.skills = skills;
        }
        if let Some(location) = patch.location {
            candidate.location = location;
        }
        if let Some(availability) = patch.availability {
            candidate.availability = availability;
        }
        if let Some(bio) = patch.bio {
            candidate.bio = bio;
        }
        candidate.updated_at = Utc::now();
        Ok(candidate.clone())
    }
}

#[async_trait]
impl JobsApi for MockRecruitingApi {
    async fn list_jobs(&self) -> ServiceResult<Vec<JobPosting>> {
        self.enter(Operation::ListJobs).await?;
        Ok(self.state.read().await.jobs.clone())
    }

    async fn get_job(&self, id: &JobId) -> ServiceResult<JobPosting> {
        self.enter(Operation::GetJob).await?;
        self.state.read().await.job(id).cloned()
    }

    async fn search_jobs(&self, query: &str) -> ServiceResult<Vec<JobPosting>> {
        self.enter(Operation::SearchJobs).await?;
        let needle = query.to_lowercase();
        let state = self.state.read().await;
        Ok(state
            .jobs
            .iter()
            .filter(|j| {
                contains_ci(&j.title, &needle) || j.skills.iter().any(|s| contains_ci(s, &needle))
            })
            .cloned()
            .collect())
    }

    async fn create_job(&self, input: NewJobPosting) -> ServiceResult<JobPosting> {
        self.enter(Operation::CreateJob).await?;
        require_text("title", &input.title)?;
        let now = Utc::now();
        let job = JobPosting {
            id: JobId::generate(),
            title: input.title,
            description: input.description,
            requirements: input.requirements,
            skills: input.skills,
            track: input.track,
            experience_level: input.experience_level,
            location: input.location,
            remote: input.remote,
            salary_range: input.salary_range,
            company_id: input.company_id,
            company_name: input.company_name,
            status: input.status,
            applications_count: 0,
            views_count: 0,
            created_at: now,
            updated_at: now,
            expires_at: None,
        };
        self.state.write().await.jobs.push(job.clone());
        Ok(job)
    }

    async fn update_job(&self, id: &JobId, patch: JobPatch) -> ServiceResult<JobPosting> {
        self.enter(Operation::UpdateJob).await?;
        if let Some(title) = &patch.title {
            require_text("title", title)?;
        }
        let mut state = self.state.write().await;
        let mut job = state.job(id)?.clone();
        if let Some(title) = patch.title {
            job.title = title;
        }
        if let Some(description) = patch.description {
            job.description = description;
        }
        if let Some(skills) = patch.skills {
            job.skills = skills;
        }
        if let Some(status) = patch.status {
            job.status = status;
        }
        if let Some(salary_range) = patch.salary_range {
            job.salary_range = salary_range;
        }
        job.updated_at = Utc::now();
        replace_by_id(&mut state.jobs, &job);
        Ok(job)
    }
}

#[async_trait]
impl PipelineApi for MockRecruitingApi {
    async fn list_pipeline(&self) -> ServiceResult<Vec<PipelineItem>> {
        self.enter(Operation::ListPipeline).await?;
        Ok(self.state.read().await.pipeline.clone())
    }

    async fn get_pipeline_item(&self, id: &PipelineItemId) -> ServiceResult<PipelineItem> {
        self.enter(Operation::GetPipelineItem).await?;
        let state = self.state.read().await;
        state
            .pipeline
            .iter()
            .find(|i| &i.id == id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("PipelineItem", id.as_str()))
    }

    async fn search_pipeline(&self, query: &str) -> ServiceResult<Vec<PipelineItem>> {
        self.enter(Operation::SearchPipeline).await?;
        let needle = query.to_lowercase();
        let state = self.state.read().await;
        Ok(state
            .pipeline
            .iter()
            .filter(|i| {
                contains_ci(&i.candidate_name, &needle)
                    || contains_ci(&i.job_title, &needle)
                    || contains_ci(&i.notes, &needle)
            })
            .cloned()
            .collect())
    }

    async fn add_to_pipeline(
        &self,
        candidate_id: &CandidateId,
        job_id: &JobId,
    ) -> ServiceResult<PipelineItem> {
        self.enter(Operation::AddToPipeline).await?;
        let mut state = self.state.write().await;
        let candidate_name = state.candidate(candidate_id)?.name.clone();
        let job_title = state.job(job_id)?.title.clone();
        let now = Utc::now();
        let item = PipelineItem {
            id: PipelineItemId::generate(),
            candidate_id: candidate_id.clone(),
            candidate_name,
            job_id: job_id.clone(),
            job_title,
            stage: PipelineStage::Sourced,
            notes: String::new(),
            added_at: now,
            updated_at: now,
            added_by: "Current User".to_string(),
            match_score: None,
        };
        state.pipeline.push(item.clone());
        Ok(item)
    }

    async fn update_pipeline_item(
        &self,
        id: &PipelineItemId,
        patch: PipelinePatch,
    ) -> ServiceResult<PipelineItem> {
        self.enter(Operation::UpdatePipelineItem).await?;
        let mut state = self.state.write().await;
        let item = state.pipeline_item_mut(id)?;
        if let Some(notes) = patch.notes {
            item.notes = notes;
        }
        if let Some(score) = patch.match_score {
            item.match_score = Some(score);
        }
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    async fn move_pipeline_item(
        &self,
        id: &PipelineItemId,
        stage: PipelineStage,
    ) -> ServiceResult<PipelineItem> {
        self.enter(Operation::MovePipelineItem).await?;
        let mut state = self.state.write().await;
        let item = state.pipeline_item_mut(id)?;
        item.stage = stage;
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    async fn stage_suggestion(&self, id: &PipelineItemId) -> ServiceResult<StageSuggestion> {
        let fallback = StageSuggestion {
            stage: PipelineStage::Interview,
            confidence: 0.7,
            reasoning: FALLBACK_STAGE_REASONING.to_string(),
        };
        if !self.enter_assisted(Operation::StageSuggestion).await {
            return Ok(fallback);
        }
        let state = self.state.read().await;
        let Some(item) = state.pipeline.iter().find(|i| &i.id == id) else {
            return Ok(fallback);
        };
        let stage = suggested_next(item.stage);
        Ok(StageSuggestion {
            stage,
            confidence: 0.85,
            reasoning: format!(
                "{} is currently {} for {}; {} is the usual next step.",
                item.candidate_name, item.stage, item.job_title, stage
            ),
        })
    }
}

#[async_trait]
impl OffersApi for MockRecruitingApi {
    async fn list_offers(&self) -> ServiceResult<Vec<Offer>> {
        self.enter(Operation::ListOffers).await?;
        Ok(self.state.read().await.offers.clone())
    }

    async fn get_offer(&self, id: &OfferId) -> ServiceResult<Offer> {
        self.enter(Operation::GetOffer).await?;
        let state = self.state.read().await;
        state
            .offers
            .iter()
            .find(|o| &o.id == id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("Offer", id.as_str()))
    }

    async fn search_offers(&self, query: &str) -> ServiceResult<Vec<Offer>> {
        self.enter(Operation::SearchOffers).await?;
        let needle = query.to_lowercase();
        let state = self.state.read().await;
        Ok(state
            .offers
            .iter()
            .filter(|o| contains_ci(&o.candidate_name, &needle) || contains_ci(&o.job_title, &needle))
            .cloned()
            .collect())
    }

    async fn create_offer(&self, input: NewOffer) -> ServiceResult<Offer> {
        self.enter(Operation::CreateOffer).await?;
        if input.salary.amount == 0 {
            return Err(ServiceError::validation("salary.amount", "must be positive"));
        }
        let mut state = self.state.write().await;
        let candidate_name = state.candidate(&input.candidate_id)?.name.clone();
        let job_title = state.job(&input.job_id)?.title.clone();
        let now = Utc::now();
        let offer = Offer {
            id: OfferId::generate(),
            candidate_id: input.candidate_id,
            candidate_name,
            job_id: input.job_id,
            job_title,
            status: OfferStatus::Draft,
            salary: input.salary,
            start_date: input.start_date,
            expires_at: input.expires_at,
            terms: input.terms,
            benefits: input.benefits,
            created_at: now,
            updated_at: now,
            sent_at: None,
            responded_at: None,
        };
        state.offers.push(offer.clone());
        Ok(offer)
    }

    async fn update_offer(&self, id: &OfferId, patch: OfferPatch) -> ServiceResult<Offer> {
        self.enter(Operation::UpdateOffer).await?;
        let mut state = self.state.write().await;
        let offer = state.offer_mut(id)?;
        if let Some(salary) = patch.salary {
            offer.salary = salary;
        }
        if let Some(terms) = patch.terms {
            offer.terms = terms;
        }
        if let Some(benefits) = patch.benefits {
            offer.benefits = benefits;
        }
        if let Some(expires_at) = patch.expires_at {
            offer.expires_at = expires_at;
        }
        offer.updated_at = Utc::now();
        Ok(offer.clone())
    }

    async fn update_offer_status(
        &self,
        id: &OfferId,
        status: OfferStatus,
    ) -> ServiceResult<Offer> {
        self.enter(Operation::UpdateOfferStatus).await?;
        let mut state = self.state.write().await;
        let offer = state.offer_mut(id)?;
        let now = Utc::now();
        offer.status = status;
        offer.updated_at = now;
        if status == OfferStatus::Sent && offer.sent_at.is_none() {
            offer.sent_at = Some(now);
        }
        if matches!(status, OfferStatus::Accepted | OfferStatus::Rejected) {
            offer.responded_at = Some(now);
        }
        Ok(offer.clone())
    }

    async fn offer_summary(&self, id: &OfferId) -> ServiceResult<String> {
        if !self.enter_assisted(Operation::OfferSummary).await {
            return Ok(FALLBACK_OFFER_SUMMARY.to_string());
        }
        let state = self.state.read().await;
        let Some(offer) = state.offers.iter().find(|o| &o.id == id) else {
            return Ok(FALLBACK_OFFER_SUMMARY.to_string());
        };
        let benefits = if offer.benefits.is_empty() {
            String::new()
        } else {
            format!(" Benefits: {}.", offer.benefits.join(", "))
        };
        Ok(format!(
            "{} is offered the {} role at {} {} ({}).{}",
            offer.candidate_name,
            offer.job_title,
            offer.salary.amount,
            offer.salary.currency,
            offer.terms,
            benefits
        ))
    }
}

#[async_trait]
impl MatchesApi for MockRecruitingApi {
    async fn list_matches(&self) -> ServiceResult<Vec<MatchScore>> {
        self.enter(Operation::ListMatches).await?;
        Ok(self.state.read().await.matches.clone())
    }

    async fn matches_for_job(&self, job_id: &JobId) -> ServiceResult<Vec<MatchScore>> {
        self.enter(Operation::MatchesForJob).await?;
        let state = self.state.read().await;
        let mut matches: Vec<MatchScore> = state
            .matches
            .iter()
            .filter(|m| &m.job_id == job_id)
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(matches)
    }

    async fn match_explanation(
        &self,
        candidate_id: &CandidateId,
        job_id: &JobId,
    ) -> ServiceResult<String> {
        if !self.enter_assisted(Operation::MatchExplanation).await {
            return Ok(FALLBACK_MATCH_EXPLANATION.to_string());
        }
        let state = self.state.read().await;
        let found = state
            .matches
            .iter()
            .find(|m| &m.candidate_id == candidate_id && &m.job_id == job_id);
        Ok(match found {
            Some(m) if !m.reasons.is_empty() => {
                format!("Match score {:.0}: {}.", m.score, m.reasons.join(", "))
            }
            _ => FALLBACK_MATCH_EXPLANATION.to_string(),
        })
    }

    async fn refresh_index(&self) -> ServiceResult<IndexRefresh> {
        self.enter(Operation::RefreshIndex).await?;
        Ok(IndexRefresh {
            job_id: format!("idx_{}", uuid::Uuid::now_v7()),
        })
    }
}

#[async_trait]
impl DashboardApi for MockRecruitingApi {
    async fn kpis(&self) -> ServiceResult<KpiData> {
        self.enter(Operation::Kpis).await?;
        Ok(self.state.read().await.kpis())
    }

    async fn kpi_narrative(&self) -> ServiceResult<String> {
        if !self.enter_assisted(Operation::KpiNarrative).await {
            return Ok(FALLBACK_KPI_NARRATIVE.to_string());
        }
        let kpis = self.state.read().await.kpis();
        Ok(format!(
            "{} active jobs with {} candidates in the talent pool. {} interviews scheduled, \
             {} offers extended and {} hires so far, averaging {:.1} days to hire.",
            kpis.active_jobs,
            kpis.total_candidates,
            kpis.interviews_scheduled,
            kpis.offers_extended,
            kpis.hires_this_month,
            kpis.avg_time_to_hire_days
        ))
    }
}

#[async_trait]
impl BillingApi for MockRecruitingApi {
    async fn plan(&self) -> ServiceResult<BillingPlan> {
        self.enter(Operation::GetPlan).await?;
        self.state
            .read()
            .await
            .plan
            .clone()
            .ok_or_else(|| ServiceError::not_found("BillingPlan", "current"))
    }

    async fn update_plan(&self, plan_name: &str) -> ServiceResult<PlanChange> {
        self.enter(Operation::UpdatePlan).await?;
        require_text("plan_name", plan_name)?;
        let mut state = self.state.write().await;
        let plan = state.plan.get_or_insert_with(seed::plan);
        plan.name = plan_name.to_string();
        Ok(PlanChange {
            success: true,
            message: format!("Successfully upgraded to {} plan", plan_name),
        })
    }

    async fn add_payment_method(
        &self,
        request: PaymentMethodRequest,
    ) -> ServiceResult<PaymentMethod> {
        self.enter(Operation::AddPaymentMethod).await?;
        require_text("holder_name", &request.holder_name)?;
        if request.last4.len() != 4 || !request.last4.chars().all(|c| c.is_ascii_digit()) {
            return Err(ServiceError::validation("last4", "must be four digits"));
        }
        let method = PaymentMethod {
            id: PaymentMethodId::new(format!("pm_{}", uuid::Uuid::now_v7().simple())),
            wallet_id: Some("wallet_company".to_string()),
        };
        self.state
            .write()
            .await
            .payment_methods
            .push(method.clone());
        Ok(method)
    }

    async fn list_invoices(&self) -> ServiceResult<Vec<Invoice>> {
        self.enter(Operation::ListInvoices).await?;
        Ok(self.state.read().await.invoices.clone())
    }
}

#[async_trait]
impl PayoutsApi for MockRecruitingApi {
    async fn list_payouts(&self) -> ServiceResult<Vec<Payout>> {
        self.enter(Operation::ListPayouts).await?;
        Ok(self.state.read().await.payouts.clone())
    }

    async fn create_payout(&self, input: NewPayout) -> ServiceResult<Payout> {
        self.enter(Operation::CreatePayout).await?;
        if input.amount == 0 {
            return Err(ServiceError::validation("amount", "must be positive"));
        }
        let payout = Payout {
            id: PayoutId::new(format!("payout_{}", uuid::Uuid::now_v7().simple())),
            candidate_id: input.candidate_id,
            amount: input.amount,
            currency: input.currency,
            status: PayoutStatus::Processing,
            description: input.description,
            processed_at: None,
            created_at: Utc::now(),
        };
        self.state.write().await.payouts.push(payout.clone());
        Ok(payout)
    }
}

#[async_trait]
impl ReportsApi for MockRecruitingApi {
    async fn export_async(
        &self,
        format: ExportFormat,
        params: ExportParams,
    ) -> ServiceResult<ExportJob> {
        self.enter(Operation::ExportAsync).await?;
        require_text("report", &params.report)?;
        let job_id = ExportId::new(format!("export_{}", uuid::Uuid::now_v7().simple()));
        self.state.write().await.exports.insert(job_id.clone(), None);
        tracing::debug!(%job_id, format = %format, report = %params.report, "export queued");
        Ok(ExportJob { job_id, format })
    }

    async fn export_status(&self, id: &ExportId) -> ServiceResult<ExportStatus> {
        self.enter(Operation::ExportStatus).await?;
        if let Some(Some(pinned)) = self.state.read().await.exports.get(id) {
            return Ok(pinned.clone());
        }
        let status = match rand::rng().random_range(0..3) {
            0 => ExportStatus::Processing,
            1 => ExportStatus::Completed {
                download_url: format!("https://api.talentloom.com/exports/{}", id),
            },
            _ => ExportStatus::Failed,
        };
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use talentloom_core::{Availability, Compensation, PayFrequency};

    fn api() -> MockRecruitingApi {
        MockRecruitingApi::seeded().with_latency(LatencyProfile::instant())
    }

    #[tokio::test]
    async fn test_move_is_visible_to_later_reads() {
        let api = api();
        let id = PipelineItemId::new("p1");
        let moved = api
            .move_pipeline_item(&id, PipelineStage::Interview)
            .await
            .unwrap();
        assert_eq!(moved.stage, PipelineStage::Interview);

        let items = api.list_pipeline().await.unwrap();
        let p1 = items.iter().find(|i| i.id == id).unwrap();
        assert_eq!(p1.stage, PipelineStage::Interview);
    }

    #[tokio::test]
    async fn test_move_unknown_item_is_not_found() {
        let api = api();
        let err = api
            .move_pipeline_item(&PipelineItemId::new("nope"), PipelineStage::Hired)
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::not_found("PipelineItem", "nope"));
    }

    #[tokio::test]
    async fn test_scripted_failure_leaves_state_untouched() {
        let api = api();
        api.fail_next(
            Operation::MovePipelineItem,
            ServiceError::transient("pipeline.move", "timeout"),
        );
        let id = PipelineItemId::new("p1");
        assert!(api.move_pipeline_item(&id, PipelineStage::Offer).await.is_err());

        let items = api.list_pipeline().await.unwrap();
        let p1 = items.iter().find(|i| i.id == id).unwrap();
        assert_eq!(p1.stage, PipelineStage::Shortlisted);
        assert_eq!(api.calls().count(Operation::MovePipelineItem), 1);
    }

    #[tokio::test]
    async fn test_candidate_filters_and_search() {
        let api = api();
        let filters = CandidateFilters {
            availability: vec![Availability::Busy],
            ..Default::default()
        };
        let busy = api.list_candidates(&filters).await.unwrap();
        assert_eq!(busy.len(), 1);
        assert_eq!(busy[0].name, "Elena Rodriguez");

        let python = api.search_candidates("PYTHON").await.unwrap();
        assert_eq!(python.len(), 1);
        assert_eq!(python[0].name, "Marcus Johnson");
    }

    #[tokio::test]
    async fn test_assisted_calls_fall_back_instead_of_failing() {
        let api = api();
        api.fail_next(Operation::StageSuggestion, ServiceError::unknown("provider down"));
        let suggestion = api
            .stage_suggestion(&PipelineItemId::new("p1"))
            .await
            .unwrap();
        assert_eq!(suggestion.stage, PipelineStage::Interview);
        assert_eq!(suggestion.reasoning, FALLBACK_STAGE_REASONING);

        api.fail_next(Operation::KpiNarrative, ServiceError::unknown("provider down"));
        assert_eq!(api.kpi_narrative().await.unwrap(), FALLBACK_KPI_NARRATIVE);
    }

    #[tokio::test]
    async fn test_kpis_follow_state() {
        let api = api();
        let before = api.kpis().await.unwrap();
        assert_eq!(before.interviews_scheduled, 1);
        assert_eq!(before.pipeline_by_stage.len(), PipelineStage::ALL.len());

        api.move_pipeline_item(&PipelineItemId::new("p1"), PipelineStage::Interview)
            .await
            .unwrap();
        let after = api.kpis().await.unwrap();
        assert_eq!(after.interviews_scheduled, 2);
        assert_eq!(after.pipeline_by_stage[&PipelineStage::Shortlisted], 0);
    }

    #[tokio::test]
    async fn test_export_status_download_url_iff_completed() {
        let api = api();
        let job = api
            .export_async(
                ExportFormat::Csv,
                ExportParams {
                    report: "pipeline".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        for _ in 0..20 {
            let status = api.export_status(&job.job_id).await.unwrap();
            assert_eq!(
                status.download_url().is_some(),
                matches!(status, ExportStatus::Completed { .. })
            );
        }

        let pinned = ExportStatus::Completed {
            download_url: "https://x".to_string(),
        };
        api.set_export_status(&job.job_id, pinned.clone()).await;
        assert_eq!(api.export_status(&job.job_id).await.unwrap(), pinned);
    }

    #[tokio::test]
    async fn test_create_offer_resolves_names() {
        let api = api();
        let offer = api
            .create_offer(NewOffer {
                candidate_id: CandidateId::new("2"),
                job_id: JobId::new("2"),
                salary: Compensation {
                    amount: 120_000,
                    currency: "USD".to_string(),
                    frequency: PayFrequency::Yearly,
                },
                start_date: Utc::now(),
                expires_at: Utc::now(),
                terms: "Full-time".to_string(),
                benefits: Vec::new(),
            })
            .await
            .unwrap();
        assert_eq!(offer.candidate_name, "Marcus Johnson");
        assert_eq!(offer.status, OfferStatus::Draft);
        assert_eq!(api.list_offers().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_blank_plan_name_is_rejected() {
        let api = api();
        let err = api.update_plan("  ").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_payment_method_requires_four_digits() {
        let api = api();
        let request = |last4: &str| PaymentMethodRequest {
            holder_name: "TechCorp Inc.".to_string(),
            last4: last4.to_string(),
            brand: "visa".to_string(),
        };
        assert!(api.add_payment_method(request("42")).await.is_err());
        let method = api.add_payment_method(request("4242")).await.unwrap();
        assert!(method.id.as_str().starts_with("pm_"));
        assert_eq!(api.payment_methods().await, vec![method]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_is_simulated() {
        let api = MockRecruitingApi::seeded();
        let start = tokio::time::Instant::now();
        api.list_jobs().await.unwrap();
        assert!(start.elapsed() >= Operation::ListJobs.base_latency());
    }
}
