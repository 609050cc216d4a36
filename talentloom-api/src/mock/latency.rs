//! Simulated network latency per facade operation.

use std::fmt;
use std::time::Duration;

/// Every facade operation the mock services can delay or fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    ListCandidates,
    GetCandidate,
    SearchCandidates,
    CreateCandidate,
    UpdateCandidate,
    ListJobs,
    GetJob,
    SearchJobs,
    CreateJob,
    UpdateJob,
    ListPipeline,
    GetPipelineItem,
    SearchPipeline,
    AddToPipeline,
    UpdatePipelineItem,
    MovePipelineItem,
    StageSuggestion,
    ListOffers,
    GetOffer,
    SearchOffers,
    CreateOffer,
    UpdateOffer,
    UpdateOfferStatus,
    OfferSummary,
    ListMatches,
    MatchesForJob,
    MatchExplanation,
    RefreshIndex,
    Kpis,
    KpiNarrative,
    GetPlan,
    UpdatePlan,
    AddPaymentMethod,
    ListInvoices,
    ListPayouts,
    CreatePayout,
    ExportAsync,
    ExportStatus,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ListCandidates => "candidates.list",
            Operation::GetCandidate => "candidates.get",
            Operation::SearchCandidates => "candidates.search",
            Operation::CreateCandidate => "candidates.create",
            Operation::UpdateCandidate => "candidates.update",
            Operation::ListJobs => "jobs.list",
            Operation::GetJob => "jobs.get",
            Operation::SearchJobs => "jobs.search",
            Operation::CreateJob => "jobs.create",
            Operation::UpdateJob => "jobs.update",
            Operation::ListPipeline => "pipeline.list",
            Operation::GetPipelineItem => "pipeline.get",
            Operation::SearchPipeline => "pipeline.search",
            Operation::AddToPipeline => "pipeline.add",
            Operation::UpdatePipelineItem => "pipeline.update",
            Operation::MovePipelineItem => "pipeline.move",
            Operation::StageSuggestion => "pipeline.suggest_stage",
            Operation::ListOffers => "offers.list",
            Operation::GetOffer => "offers.get",
            Operation::SearchOffers => "offers.search",
            Operation::CreateOffer => "offers.create",
            Operation::UpdateOffer => "offers.update",
            Operation::UpdateOfferStatus => "offers.update_status",
            Operation::OfferSummary => "offers.summary",
            Operation::ListMatches => "matches.list",
            Operation::MatchesForJob => "matches.for_job",
            Operation::MatchExplanation => "matches.explain",
            Operation::RefreshIndex => "matches.refresh_index",
            Operation::Kpis => "dashboard.kpis",
            Operation::KpiNarrative => "dashboard.narrative",
            Operation::GetPlan => "billing.plan",
            Operation::UpdatePlan => "billing.update_plan",
            Operation::AddPaymentMethod => "billing.add_payment_method",
            Operation::ListInvoices => "billing.invoices",
            Operation::ListPayouts => "payouts.list",
            Operation::CreatePayout => "payouts.create",
            Operation::ExportAsync => "reports.export",
            Operation::ExportStatus => "reports.export_status",
        }
    }

    /// Base latency of the operation before scaling.
    pub fn base_latency(&self) -> Duration {
        let ms = match self {
            Operation::ListCandidates => 800,
            Operation::GetCandidate | Operation::GetJob | Operation::GetOffer => 500,
            Operation::SearchCandidates => 600,
            Operation::CreateCandidate | Operation::CreateJob | Operation::CreateOffer => 1000,
            Operation::UpdateCandidate | Operation::UpdateJob => 800,
            Operation::ListJobs | Operation::ListOffers => 700,
            Operation::SearchJobs | Operation::SearchOffers | Operation::SearchPipeline => 600,
            Operation::ListPipeline => 600,
            Operation::GetPipelineItem => 400,
            Operation::AddToPipeline => 800,
            Operation::UpdatePipelineItem => 400,
            Operation::MovePipelineItem => 500,
            Operation::UpdateOffer | Operation::UpdateOfferStatus => 600,
            Operation::ListMatches => 800,
            Operation::MatchesForJob => 600,
            Operation::StageSuggestion
            | Operation::OfferSummary
            | Operation::MatchExplanation
            | Operation::KpiNarrative => 300,
            Operation::RefreshIndex => 1200,
            Operation::Kpis | Operation::GetPlan | Operation::ExportStatus => 500,
            Operation::UpdatePlan => 1500,
            Operation::AddPaymentMethod | Operation::CreatePayout => 1000,
            Operation::ListInvoices => 600,
            Operation::ListPayouts => 700,
            Operation::ExportAsync => 2000,
        };
        Duration::from_millis(ms)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scales the base latency of every operation.
///
/// A scale of zero turns the simulated network into an instant one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyProfile {
    scale: f64,
}

impl Default for LatencyProfile {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

impl LatencyProfile {
    pub fn scaled(scale: f64) -> Self {
        Self {
            scale: if scale.is_finite() { scale.max(0.0) } else { 1.0 },
        }
    }

    pub fn instant() -> Self {
        Self { scale: 0.0 }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn delay_for(&self, operation: Operation) -> Duration {
        operation.base_latency().mul_f64(self.scale)
    }

    pub async fn wait(&self, operation: Operation) {
        let delay = self.delay_for(operation);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_latency() {
        let profile = LatencyProfile::scaled(0.5);
        assert_eq!(
            profile.delay_for(Operation::ListCandidates),
            Duration::from_millis(400)
        );
        assert_eq!(
            LatencyProfile::instant().delay_for(Operation::ExportAsync),
            Duration::ZERO
        );
    }

    #[test]
    fn test_negative_and_nan_scales_are_sanitized() {
        assert_eq!(LatencyProfile::scaled(-3.0).scale(), 0.0);
        assert_eq!(LatencyProfile::scaled(f64::NAN).scale(), 1.0);
    }

    #[test]
    fn test_operation_names_are_namespaced() {
        assert_eq!(Operation::MovePipelineItem.to_string(), "pipeline.move");
        assert_eq!(Operation::ExportStatus.as_str(), "reports.export_status");
    }
}
