//! Identity types for TalentLoom entities

use chrono::{DateTime, Utc};
use std::fmt;
use std::hash::Hash;
use uuid::Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Duration in milliseconds for staleness and polling values.
pub type DurationMs = u64;

/// Common behaviour for the string-backed entity identifiers.
///
/// Identifiers are opaque strings issued by the remote services. Freshly
/// created entities get a UUIDv7 so they sort by creation time.
pub trait EntityIdType: Clone + Eq + Hash + fmt::Display + Send + Sync + 'static {
    /// Human readable entity name used in error messages.
    const ENTITY_NAME: &'static str;

    /// Wrap a raw identifier.
    fn new(value: impl Into<String>) -> Self;

    /// Borrow the raw identifier.
    fn as_str(&self) -> &str;

    /// Generate a new time-sortable identifier.
    fn generate() -> Self {
        Self::new(Uuid::now_v7().to_string())
    }

    /// An empty identifier never addresses a real entity.
    fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }
}

macro_rules! define_entity_id {
    ($(#[$meta:meta])* $name:ident, $entity:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl EntityIdType for $name {
            const ENTITY_NAME: &'static str = $entity;

            fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_entity_id!(
    /// Identifier of a candidate profile.
    CandidateId,
    "Candidate"
);
define_entity_id!(
    /// Identifier of a job posting.
    JobId,
    "JobPosting"
);
define_entity_id!(
    /// Identifier of a pipeline card (one candidate on one job).
    PipelineItemId,
    "PipelineItem"
);
define_entity_id!(
    /// Identifier of an offer.
    OfferId,
    "Offer"
);
define_entity_id!(
    /// Identifier of a hiring company (the tenant scope).
    CompanyId,
    "Company"
);
define_entity_id!(
    /// Identifier of an asynchronous report export job.
    ExportId,
    "Export"
);
define_entity_id!(
    /// Identifier of a placement payout.
    PayoutId,
    "Payout"
);
define_entity_id!(
    /// Identifier of a stored payment method.
    PaymentMethodId,
    "PaymentMethod"
);
define_entity_id!(InvoiceId, "Invoice");
