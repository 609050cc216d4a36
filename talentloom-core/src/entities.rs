//! Core entity structures
//!
//! These are the records exchanged with the remote services and stored as
//! cached data. The data layer treats them as opaque beyond their ids.

use crate::{
    Availability, CandidateId, CompanyId, EntityIdType, ExperienceLevel, ExportFormat, ExportId,
    InvoiceId, JobId, JobStatus, OfferId, OfferStatus, PayFrequency, PaymentMethodId, PayoutId,
    PayoutStatus, PipelineItemId, PipelineStage, Timestamp,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A record addressable by a typed id.
pub trait Entity {
    type Id: EntityIdType;

    fn id(&self) -> &Self::Id;
}

/// Replace the element of `items` sharing `updated`'s id.
///
/// Returns false when no element matched and the list was left untouched.
pub fn replace_by_id<T: Entity + Clone>(items: &mut [T], updated: &T) -> bool {
    match items.iter_mut().find(|item| item.id() == updated.id()) {
        Some(slot) => {
            *slot = updated.clone();
            true
        }
        None => false,
    }
}

/// Minimum and maximum of a salary band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: u64,
    pub max: u64,
    pub currency: String,
}

// ============================================================================
// CANDIDATES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub email: String,
    pub skills: Vec<String>,
    pub track: String,
    pub reputation: f64,
    pub experience: String,
    pub location: String,
    pub availability: Availability,
    pub salary_expectation: Option<SalaryRange>,
    pub bio: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Entity for Candidate {
    type Id = CandidateId;

    fn id(&self) -> &CandidateId {
        &self.id
    }
}

/// Fields supplied when creating a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCandidate {
    pub name: String,
    pub email: String,
    pub skills: Vec<String>,
    pub track: String,
    pub experience: String,
    pub location: String,
    pub availability: Availability,
    pub bio: String,
}

/// Partial update of a candidate; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidatePatch {
    pub name: Option<String>,
    pub skills: Option<Vec<String>>,
    pub location: Option<String>,
    pub availability: Option<Availability>,
    pub bio: Option<String>,
}

/// Filters accepted by the candidate list.
///
/// Part of the cache key of a filtered list, so field order is stable and
/// empty filters serialize to an empty object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateFilters {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub availability: Vec<Availability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<String>,
}

impl CandidateFilters {
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty() && self.availability.is_empty() && self.track.is_none()
    }

    /// Skill filters match case-insensitively by substring; the other
    /// filters match exactly.
    pub fn matches(&self, candidate: &Candidate) -> bool {
        let skills_ok = self.skills.is_empty()
            || self.skills.iter().any(|wanted| {
                let wanted = wanted.to_lowercase();
                candidate
                    .skills
                    .iter()
                    .any(|skill| skill.to_lowercase().contains(&wanted))
            });
        let availability_ok =
            self.availability.is_empty() || self.availability.contains(&candidate.availability);
        let track_ok = self
            .track
            .as_ref()
            .is_none_or(|track| track == &candidate.track);
        skills_ok && availability_ok && track_ok
    }
}

// ============================================================================
// JOBS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: JobId,
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub skills: Vec<String>,
    pub track: String,
    pub experience_level: ExperienceLevel,
    pub location: String,
    pub remote: bool,
    pub salary_range: SalaryRange,
    pub company_id: CompanyId,
    pub company_name: String,
    pub status: JobStatus,
    pub applications_count: u32,
    pub views_count: u32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub expires_at: Option<Timestamp>,
}

impl Entity for JobPosting {
    type Id = JobId;

    fn id(&self) -> &JobId {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewJobPosting {
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub skills: Vec<String>,
    pub track: String,
    pub experience_level: ExperienceLevel,
    pub location: String,
    pub remote: bool,
    pub salary_range: SalaryRange,
    pub company_id: CompanyId,
    pub company_name: String,
    pub status: JobStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub skills: Option<Vec<String>>,
    pub status: Option<JobStatus>,
    pub salary_range: Option<SalaryRange>,
}

// ============================================================================
// PIPELINE
// ============================================================================

/// One candidate's card on one job's hiring board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineItem {
    pub id: PipelineItemId,
    pub candidate_id: CandidateId,
    pub candidate_name: String,
    pub job_id: JobId,
    pub job_title: String,
    pub stage: PipelineStage,
    pub notes: String,
    pub added_at: Timestamp,
    pub updated_at: Timestamp,
    pub added_by: String,
    pub match_score: Option<f64>,
}

impl Entity for PipelineItem {
    type Id = PipelineItemId;

    fn id(&self) -> &PipelineItemId {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelinePatch {
    pub notes: Option<String>,
    pub match_score: Option<f64>,
}

/// Suggested next stage for a pipeline card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSuggestion {
    pub stage: PipelineStage,
    pub confidence: f64,
    pub reasoning: String,
}

// ============================================================================
// OFFERS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compensation {
    pub amount: u64,
    pub currency: String,
    pub frequency: PayFrequency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub candidate_id: CandidateId,
    pub candidate_name: String,
    pub job_id: JobId,
    pub job_title: String,
    pub status: OfferStatus,
    pub salary: Compensation,
    pub start_date: Timestamp,
    pub expires_at: Timestamp,
    pub terms: String,
    pub benefits: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub sent_at: Option<Timestamp>,
    pub responded_at: Option<Timestamp>,
}

impl Entity for Offer {
    type Id = OfferId;

    fn id(&self) -> &OfferId {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOffer {
    pub candidate_id: CandidateId,
    pub job_id: JobId,
    pub salary: Compensation,
    pub start_date: Timestamp,
    pub expires_at: Timestamp,
    pub terms: String,
    pub benefits: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OfferPatch {
    pub salary: Option<Compensation>,
    pub terms: Option<String>,
    pub benefits: Option<Vec<String>>,
    pub expires_at: Option<Timestamp>,
}

// ============================================================================
// MATCHING & DASHBOARD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    pub candidate_id: CandidateId,
    pub job_id: JobId,
    pub score: f64,
    pub reasons: Vec<String>,
    pub skills_match: f64,
    pub experience_match: f64,
    pub availability_match: f64,
    pub location_match: f64,
}

/// Handle of a matching-index rebuild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRefresh {
    pub job_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiData {
    pub active_jobs: u32,
    pub total_candidates: u32,
    pub interviews_scheduled: u32,
    pub offers_extended: u32,
    pub hires_this_month: u32,
    pub avg_time_to_hire_days: f64,
    pub pipeline_by_stage: BTreeMap<PipelineStage, u32>,
}

// ============================================================================
// BILLING & PAYOUTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingPlan {
    pub name: String,
    pub price: u64,
    pub currency: String,
    pub frequency: String,
    pub features: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanChange {
    pub success: bool,
    pub message: String,
}

/// Card or account details handed to the payment provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethodRequest {
    pub holder_name: String,
    pub last4: String,
    pub brand: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: PaymentMethodId,
    pub wallet_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub date: String,
    pub amount: u64,
    pub status: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payout {
    pub id: PayoutId,
    pub candidate_id: CandidateId,
    pub amount: u64,
    pub currency: String,
    pub status: PayoutStatus,
    pub description: String,
    pub processed_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl Entity for Payout {
    type Id = PayoutId;

    fn id(&self) -> &PayoutId {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPayout {
    pub candidate_id: CandidateId,
    pub amount: u64,
    pub currency: String,
    pub description: String,
}

// ============================================================================
// REPORTS
// ============================================================================

/// Parameters of an asynchronous report export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportParams {
    pub report: String,
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
}

/// Handle returned when an export is queued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportJob {
    pub job_id: ExportId,
    pub format: ExportFormat,
}

/// Progress of an export job.
///
/// A download URL exists exactly when the export completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ExportStatus {
    Processing,
    Completed { download_url: String },
    Failed,
}

impl ExportStatus {
    pub fn download_url(&self) -> Option<&str> {
        match self {
            ExportStatus::Completed { download_url } => Some(download_url),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn candidate(skills: &[&str], availability: Availability, track: &str) -> Candidate {
        Candidate {
            id: CandidateId::new("c1"),
            name: "Sarah Chen".to_string(),
            email: "sarah@example.com".to_string(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            track: track.to_string(),
            reputation: 4.8,
            experience: "5 years".to_string(),
            location: "Remote".to_string(),
            availability,
            salary_expectation: None,
            bio: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_candidate_filter_skill_substring() {
        let c = candidate(&["TypeScript", "Rust"], Availability::Available, "backend");
        let filters = CandidateFilters {
            skills: vec!["script".to_string()],
            ..Default::default()
        };
        assert!(filters.matches(&c));

        let filters = CandidateFilters {
            skills: vec!["go".to_string()],
            ..Default::default()
        };
        assert!(!filters.matches(&c));
    }

    #[test]
    fn test_candidate_filter_track_and_availability() {
        let c = candidate(&["Rust"], Availability::Busy, "backend");
        let filters = CandidateFilters {
            availability: vec![Availability::Available],
            ..Default::default()
        };
        assert!(!filters.matches(&c));

        let filters = CandidateFilters {
            track: Some("backend".to_string()),
            ..Default::default()
        };
        assert!(filters.matches(&c));
        assert!(CandidateFilters::default().matches(&c));
    }

    #[test]
    fn test_empty_filters_serialize_to_empty_object() {
        let json = serde_json::to_value(CandidateFilters::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn test_export_status_download_url_only_when_completed() {
        let done = ExportStatus::Completed {
            download_url: "https://x".to_string(),
        };
        assert_eq!(done.download_url(), Some("https://x"));
        assert_eq!(ExportStatus::Processing.download_url(), None);

        let json = serde_json::to_value(&done).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["download_url"], "https://x");
        let failed = serde_json::to_value(ExportStatus::Failed).unwrap();
        assert!(failed.get("download_url").is_none());
    }

    #[test]
    fn test_replace_by_id() {
        let mut items = vec![
            candidate(&["Rust"], Availability::Available, "a"),
        ];
        let mut updated = items[0].clone();
        updated.name = "Renamed".to_string();
        assert!(replace_by_id(&mut items, &updated));
        assert_eq!(items[0].name, "Renamed");

        updated.id = CandidateId::new("other");
        assert!(!replace_by_id(&mut items, &updated));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_availability() -> impl Strategy<Value = Availability> {
            prop_oneof![
                Just(Availability::Available),
                Just(Availability::Busy),
                Just(Availability::Unavailable),
            ]
        }

        proptest! {
            #[test]
            fn prop_empty_filters_match_everyone(
                skills in prop::collection::vec("[A-Za-z+#]{1,10}", 0..5),
                availability in arb_availability(),
                track in "[a-z]{1,8}",
            ) {
                let refs: Vec<&str> = skills.iter().map(String::as_str).collect();
                let c = candidate(&refs, availability, &track);
                prop_assert!(CandidateFilters::default().matches(&c));
            }

            #[test]
            fn prop_any_skill_fragment_matches_ignoring_case(
                skill in "[A-Za-z]{2,12}",
                start in 0usize..12,
                len in 1usize..12,
                upper in any::<bool>(),
            ) {
                let start = start % skill.len();
                let end = (start + len).min(skill.len());
                let fragment = &skill[start..end];
                let fragment = if upper {
                    fragment.to_uppercase()
                } else {
                    fragment.to_lowercase()
                };
                let c = candidate(&[skill.as_str()], Availability::Available, "backend");
                let filters = CandidateFilters {
                    skills: vec![fragment],
                    ..Default::default()
                };
                prop_assert!(filters.matches(&c));
            }

            #[test]
            fn prop_availability_filter_is_exact(
                wanted in arb_availability(),
                actual in arb_availability(),
            ) {
                let c = candidate(&["Rust"], actual, "backend");
                let filters = CandidateFilters {
                    availability: vec![wanted],
                    ..Default::default()
                };
                prop_assert_eq!(filters.matches(&c), wanted == actual);
            }

            #[test]
            fn prop_replace_by_id_touches_only_the_match(
                count in 1usize..8,
                target in 0usize..8,
            ) {
                let target = target % count;
                let mut items: Vec<Candidate> = (0..count)
                    .map(|i| {
                        let mut c = candidate(&["Rust"], Availability::Available, "backend");
                        c.id = CandidateId::new(format!("c{}", i));
                        c
                    })
                    .collect();
                let before = items.clone();
                let mut updated = items[target].clone();
                updated.name = "Renamed".to_string();

                prop_assert!(replace_by_id(&mut items, &updated));
                prop_assert_eq!(items.len(), before.len());
                for (i, (now, was)) in items.iter().zip(&before).enumerate() {
                    if i == target {
                        prop_assert_eq!(now, &updated);
                    } else {
                        prop_assert_eq!(now, was);
                    }
                }
            }
        }
    }
}
