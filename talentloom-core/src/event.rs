//! Server-push domain events as they arrive on the wire.

use crate::{CompanyId, EntityIdType, JobId, Timestamp};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One event of the realtime feed.
///
/// `event_type` is kept as the raw dotted name (`"pipeline.moved"`) so that
/// types this client does not know can still be carried and logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub payload: Value,
    pub timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<CompanyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
}

impl DomainEvent {
    /// Event stamped now, without tenant or job scope.
    pub fn new(event_type: impl Into<String>, payload: Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
            timestamp: Utc::now(),
            company_id: None,
            job_id: None,
        }
    }

    pub fn with_company(mut self, company_id: CompanyId) -> Self {
        self.company_id = Some(company_id);
        self
    }

    pub fn with_job(mut self, job_id: JobId) -> Self {
        self.job_id = Some(job_id);
        self
    }

    /// String member of the payload.
    pub fn payload_str(&self, field: &str) -> Option<&str> {
        self.payload.get(field).and_then(Value::as_str)
    }
}

/// The demo realtime feed of `company`, in replay order.
pub fn demo_events(company: &CompanyId) -> Vec<DomainEvent> {
    vec![
        DomainEvent::new(
            "pipeline.moved",
            json!({
                "candidateId": "1",
                "newStage": "interview",
                "candidateName": "Sarah Chen",
                "jobId": "1"
            }),
        )
        .with_company(company.clone())
        .with_job(JobId::new("1")),
        DomainEvent::new(
            "offers.created",
            json!({
                "candidateId": "2",
                "jobTitle": "Backend Engineer",
                "candidateName": "Marcus Johnson",
                "offerId": "offer_1"
            }),
        )
        .with_company(company.clone())
        .with_job(JobId::new("2")),
        DomainEvent::new(
            "jobs.created",
            json!({"jobId": "3", "title": "Full Stack Developer", "companyName": "TechCorp"}),
        )
        .with_company(company.clone()),
        DomainEvent::new(
            "reports.ready",
            json!({
                "exportId": "export_123",
                "type": "csv",
                "downloadUrl": "https://api.talentloom.com/exports/export_123"
            }),
        )
        .with_company(company.clone()),
        DomainEvent::new(
            "matches.updated",
            json!({"jobId": "1", "newMatchesCount": 5, "topScore": 95}),
        )
        .with_company(company.clone())
        .with_job(JobId::new("1")),
    ]
}
