//! Enum types for TalentLoom entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error when parsing an enum from its wire string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {kind}: {value}")]
pub struct EnumParseError {
    pub kind: &'static str,
    pub value: String,
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Column of the hiring board a pipeline card sits in.
///
/// No workflow ordering is implied between stages: a card may move from any
/// stage to any other stage. `Ord` only gives stage-keyed maps a stable order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    Sourced,
    Shortlisted,
    Interview,
    Offer,
    Hired,
    Rejected,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 6] = [
        PipelineStage::Sourced,
        PipelineStage::Shortlisted,
        PipelineStage::Interview,
        PipelineStage::Offer,
        PipelineStage::Hired,
        PipelineStage::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Sourced => "sourced",
            PipelineStage::Shortlisted => "shortlisted",
            PipelineStage::Interview => "interview",
            PipelineStage::Offer => "offer",
            PipelineStage::Hired => "hired",
            PipelineStage::Rejected => "rejected",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineStage {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PipelineStage::ALL
            .into_iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| EnumParseError {
                kind: "pipeline stage",
                value: s.to_string(),
            })
    }
}

// ============================================================================
// OFFERS
// ============================================================================

/// Lifecycle status of an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    Draft,
    Sent,
    Viewed,
    Accepted,
    Rejected,
    Expired,
}

impl OfferStatus {
    pub const ALL: [OfferStatus; 6] = [
        OfferStatus::Draft,
        OfferStatus::Sent,
        OfferStatus::Viewed,
        OfferStatus::Accepted,
        OfferStatus::Rejected,
        OfferStatus::Expired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OfferStatus::Draft => "draft",
            OfferStatus::Sent => "sent",
            OfferStatus::Viewed => "viewed",
            OfferStatus::Accepted => "accepted",
            OfferStatus::Rejected => "rejected",
            OfferStatus::Expired => "expired",
        }
    }

    /// Whether the candidate has answered (or the offer lapsed).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OfferStatus::Accepted | OfferStatus::Rejected | OfferStatus::Expired
        )
    }
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OfferStatus {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OfferStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| EnumParseError {
                kind: "offer status",
                value: s.to_string(),
            })
    }
}

/// Pay period of an offered salary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayFrequency {
    Hourly,
    Monthly,
    Yearly,
}

// ============================================================================
// CANDIDATES & JOBS
// ============================================================================

/// Whether a candidate is open to new roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Available,
    Busy,
    Unavailable,
}

/// Seniority requested by a job posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Entry,
    Mid,
    Senior,
    Lead,
}

/// Publication status of a job posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Draft,
    Active,
    Paused,
    Closed,
}

// ============================================================================
// BILLING & REPORTS
// ============================================================================

/// Settlement status of a payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// File format of a report export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Pdf,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
