//! Registry of every query key the dashboard uses.
//!
//! List keys are single segments so that invalidating a resource reaches
//! every detail, search and derived key below it.

use crate::QueryKey;
use serde_json::Value;
use std::fmt;
use talentloom_core::{
    CandidateFilters, CandidateId, EntityIdType, ExportId, JobId, OfferId, PipelineItemId,
};

pub const CANDIDATES: &str = "candidates";
pub const JOBS: &str = "jobs";
pub const PIPELINE: &str = "pipeline";
pub const OFFERS: &str = "offers";
pub const MATCHES: &str = "matches";
pub const DASHBOARD: &str = "dashboard";
pub const REPORTS: &str = "reports";
pub const BILLING: &str = "billing";
pub const PAYOUTS: &str = "payouts";

/// Kind of query a key belongs to; selects default freshness settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {
    Candidates,
    CandidateSearch,
    CandidateDetail,
    Jobs,
    JobDetail,
    Pipeline,
    PipelineSuggestion,
    Offers,
    OfferSummary,
    Matches,
    MatchesForJob,
    MatchExplanation,
    Dashboard,
    DashboardNarrative,
    ExportStatus,
    BillingPlan,
    Invoices,
    Payouts,
}

impl Resource {
    pub const ALL: [Resource; 18] = [
        Resource::Candidates,
        Resource::CandidateSearch,
        Resource::CandidateDetail,
        Resource::Jobs,
        Resource::JobDetail,
        Resource::Pipeline,
        Resource::PipelineSuggestion,
        Resource::Offers,
        Resource::OfferSummary,
        Resource::Matches,
        Resource::MatchesForJob,
        Resource::MatchExplanation,
        Resource::Dashboard,
        Resource::DashboardNarrative,
        Resource::ExportStatus,
        Resource::BillingPlan,
        Resource::Invoices,
        Resource::Payouts,
    ];

    /// Name used for per-resource configuration tables.
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Candidates => "candidates",
            Resource::CandidateSearch => "candidate_search",
            Resource::CandidateDetail => "candidate",
            Resource::Jobs => "jobs",
            Resource::JobDetail => "job",
            Resource::Pipeline => "pipeline",
            Resource::PipelineSuggestion => "pipeline_suggestion",
            Resource::Offers => "offers",
            Resource::OfferSummary => "offer_summary",
            Resource::Matches => "matches",
            Resource::MatchesForJob => "matches_for_job",
            Resource::MatchExplanation => "match_explanation",
            Resource::Dashboard => "dashboard",
            Resource::DashboardNarrative => "dashboard_narrative",
            Resource::ExportStatus => "export_status",
            Resource::BillingPlan => "billing_plan",
            Resource::Invoices => "invoices",
            Resource::Payouts => "payouts",
        }
    }

    pub fn from_name(name: &str) -> Option<Resource> {
        Resource::ALL.into_iter().find(|r| r.as_str() == name)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `["candidates"]`, or `["candidates", filters]` when any filter is set.
pub fn candidates(filters: &CandidateFilters) -> QueryKey {
    let params = if filters.is_empty() {
        None
    } else {
        serde_json::to_value(filters).ok()
    };
    QueryKey::new(CANDIDATES).with_params(params)
}

/// Prefix shared by every candidate key.
pub fn all_candidates() -> QueryKey {
    QueryKey::new(CANDIDATES)
}

pub fn candidate_search(query: &str) -> QueryKey {
    QueryKey::new(CANDIDATES).push("search").push(query)
}

pub fn candidate(id: &CandidateId) -> QueryKey {
    QueryKey::new(CANDIDATES).push(id.as_str())
}

pub fn jobs() -> QueryKey {
    QueryKey::new(JOBS)
}

pub fn job(id: &JobId) -> QueryKey {
    QueryKey::new(JOBS).push(id.as_str())
}

pub fn pipeline() -> QueryKey {
    QueryKey::new(PIPELINE)
}

pub fn pipeline_suggestion(id: &PipelineItemId) -> QueryKey {
    QueryKey::new(PIPELINE).push("suggestion").push(id.as_str())
}

pub fn offers() -> QueryKey {
    QueryKey::new(OFFERS)
}

pub fn offer_summary(id: &OfferId) -> QueryKey {
    QueryKey::new(OFFERS).push("summary").push(id.as_str())
}

pub fn matches() -> QueryKey {
    QueryKey::new(MATCHES)
}

pub fn matches_for_job(job_id: &JobId) -> QueryKey {
    QueryKey::new(MATCHES).push("job").push(job_id.as_str())
}

pub fn match_explanation(candidate_id: &CandidateId, job_id: &JobId) -> QueryKey {
    QueryKey::new(MATCHES)
        .push("explanation")
        .push(candidate_id.as_str())
        .push(job_id.as_str())
}

pub fn dashboard() -> QueryKey {
    QueryKey::new(DASHBOARD)
}

pub fn dashboard_narrative() -> QueryKey {
    QueryKey::new(DASHBOARD).push("narrative")
}

pub fn export_status(id: &ExportId) -> QueryKey {
    QueryKey::new(REPORTS).push("export").push(id.as_str())
}

pub fn billing_plan() -> QueryKey {
    QueryKey::new(BILLING).push("plan")
}

pub fn invoices() -> QueryKey {
    QueryKey::new(BILLING).push("invoices")
}

pub fn payouts() -> QueryKey {
    QueryKey::new(PAYOUTS)
}

/// Classify a key by its shape; `None` for keys outside the registry.
pub fn resource_of(key: &QueryKey) -> Option<Resource> {
    let segments = key.segments();
    let text = |i: usize| segments.get(i).and_then(Value::as_str);
    let resource = match (text(0)?, segments.len()) {
        (CANDIDATES, 1) => Resource::Candidates,
        (CANDIDATES, 2) if segments[1].is_object() => Resource::Candidates,
        (CANDIDATES, 3) if text(1) == Some("search") => Resource::CandidateSearch,
        (CANDIDATES, 2) => Resource::CandidateDetail,
        (JOBS, 1) => Resource::Jobs,
        (JOBS, 2) => Resource::JobDetail,
        (PIPELINE, 1) => Resource::Pipeline,
        (PIPELINE, 3) if text(1) == Some("suggestion") => Resource::PipelineSuggestion,
        (OFFERS, 1) => Resource::Offers,
        (OFFERS, 3) if text(1) == Some("summary") => Resource::OfferSummary,
        (MATCHES, 1) => Resource::Matches,
        (MATCHES, 3) if text(1) == Some("job") => Resource::MatchesForJob,
        (MATCHES, 4) if text(1) == Some("explanation") => Resource::MatchExplanation,
        (DASHBOARD, 1) => Resource::Dashboard,
        (DASHBOARD, 2) if text(1) == Some("narrative") => Resource::DashboardNarrative,
        (REPORTS, 3) if text(1) == Some("export") => Resource::ExportStatus,
        (BILLING, 2) if text(1) == Some("plan") => Resource::BillingPlan,
        (BILLING, 2) if text(1) == Some("invoices") => Resource::Invoices,
        (PAYOUTS, 1) => Resource::Payouts,
        _ => return None,
    };
    Some(resource)
}
