//! TalentLoom Test Utilities
//!
//! Shared test infrastructure for the TalentLoom workspace:
//! - Proptest generators for query keys, JSON payloads and pipeline cards
//! - Fixtures: an instant mock facade and the demo realtime events
//! - An instrumented fetcher that counts how often it is invoked
//! - Assertions over recorded notifications

pub use talentloom_api::{LatencyProfile, MockRecruitingApi, Operation};
pub use talentloom_core::{
    CandidateId, CompanyId, DomainEvent, EntityIdType, JobId, Notification, NotificationCenter,
    NotificationLevel, PipelineItem, PipelineItemId, PipelineStage, ServiceError, ServiceResult,
    Timestamp,
};

use futures_util::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

pub use fixtures::canned_events;

// ============================================================================
// INSTRUMENTED FETCHER
// ============================================================================

/// Fetch function that counts its invocations.
///
/// Clones share the counter and the scripted response, so a test can hand a
/// clone to the code under test and inspect the original.
#[derive(Debug, Clone)]
pub struct CountingFetcher {
    calls: Arc<AtomicUsize>,
    response: Arc<Mutex<ServiceResult<Value>>>,
    delay: Duration,
}

impl CountingFetcher {
    pub fn new(value: Value) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            response: Arc::new(Mutex::new(Ok(value))),
            delay: Duration::from_millis(100),
        }
    }

    pub fn failing(error: ServiceError) -> Self {
        let fetcher = Self::new(Value::Null);
        fetcher.respond_with(Err(error));
        fetcher
    }

    /// Simulated latency of every call (tokio time, so paused tests control it).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Change what later calls resolve to.
    pub fn respond_with(&self, outcome: ServiceResult<Value>) {
        *self.response.lock().unwrap_or_else(PoisonError::into_inner) = outcome;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Start one fetch. The response is captured when the call is made.
    pub fn call(&self) -> BoxFuture<'static, ServiceResult<Value>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .response
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let delay = self.delay;
        async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            outcome
        }
        .boxed()
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for TalentLoom data.

    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    /// One key segment: a short name or a small number.
    pub fn arb_segment() -> impl Strategy<Value = Value> {
        prop_oneof![
            "[a-z]{1,6}".prop_map(Value::from),
            (0u32..50).prop_map(Value::from),
        ]
    }

    /// Raw segments of a query key: a resource name then up to three more.
    pub fn arb_query_key() -> impl Strategy<Value = Vec<Value>> {
        ("[a-z]{1,8}", prop::collection::vec(arb_segment(), 0..4)).prop_map(|(resource, rest)| {
            let mut segments = vec![Value::String(resource)];
            segments.extend(rest);
            segments
        })
    }

    /// Arbitrary JSON without floats, nested at most three levels.
    pub fn arb_json_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            "[a-zA-Z0-9 ]{0,12}".prop_map(Value::from),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                    .prop_map(|members| Value::Object(members.into_iter().collect())),
            ]
        })
    }

    pub fn arb_pipeline_stage() -> impl Strategy<Value = PipelineStage> {
        prop::sample::select(PipelineStage::ALL.to_vec())
    }

    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        // 2020-01-01 .. 2030-01-01
        (1577836800i64..1893456000i64)
            .prop_map(|secs| chrono::DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now))
    }

    pub fn arb_pipeline_item() -> impl Strategy<Value = PipelineItem> {
        (
            1u32..1000,
            "[A-Z][a-z]{2,8} [A-Z][a-z]{2,10}",
            1u32..10,
            arb_pipeline_stage(),
            arb_timestamp(),
            proptest::option::of(0u32..=100),
        )
            .prop_map(|(n, candidate_name, job, stage, added_at, score)| PipelineItem {
                id: PipelineItemId::new(format!("p{}", n)),
                candidate_id: CandidateId::new(n.to_string()),
                candidate_name,
                job_id: JobId::new(job.to_string()),
                job_title: format!("Job {}", job),
                stage,
                notes: String::new(),
                added_at,
                updated_at: added_at,
                added_by: "Current User".to_string(),
                match_score: score.map(f64::from),
            })
    }

    /// A non-empty board whose cards have distinct ids `p1..pn`.
    pub fn arb_pipeline() -> impl Strategy<Value = Vec<PipelineItem>> {
        prop::collection::vec(arb_pipeline_item(), 1..8).prop_map(|mut items| {
            for (i, item) in items.iter_mut().enumerate() {
                item.id = PipelineItemId::new(format!("p{}", i + 1));
            }
            items
        })
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built values for common scenarios.

    use super::*;
    use chrono::Utc;

    pub const COMPANY: &str = "company_1";

    pub fn company() -> CompanyId {
        CompanyId::new(COMPANY)
    }

    /// Seeded mock facade with every delay removed.
    pub fn instant_api() -> MockRecruitingApi {
        MockRecruitingApi::seeded().with_latency(LatencyProfile::instant())
    }

    pub fn pipeline_item(id: &str, stage: PipelineStage) -> PipelineItem {
        let now = Utc::now();
        PipelineItem {
            id: PipelineItemId::new(id),
            candidate_id: CandidateId::new("1"),
            candidate_name: "Sarah Chen".to_string(),
            job_id: JobId::new("1"),
            job_title: "Senior Frontend Developer".to_string(),
            stage,
            notes: String::new(),
            added_at: now,
            updated_at: now,
            added_by: "Current User".to_string(),
            match_score: Some(92.0),
        }
    }

    /// The demo feed: five events of `company_1`, in replay order.
    pub fn canned_events() -> Vec<DomainEvent> {
        talentloom_core::demo_events(&company())
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over recorded notifications.

    use super::*;

    /// Exactly one notification of `level` was recorded; returns it.
    pub fn assert_single_notification(
        center: &NotificationCenter,
        level: NotificationLevel,
    ) -> Notification {
        let mut matching: Vec<Notification> = center
            .history()
            .into_iter()
            .filter(|n| n.level == level)
            .collect();
        assert_eq!(
            matching.len(),
            1,
            "expected exactly one {:?} notification, got {:?}",
            level,
            matching
        );
        matching.remove(0)
    }

    pub fn assert_no_notification(center: &NotificationCenter, level: NotificationLevel) {
        assert_eq!(
            center.count(level),
            0,
            "unexpected {:?} notification in {:?}",
            level,
            center.history()
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use talentloom_core::Notifier;

    #[tokio::test(start_paused = true)]
    async fn test_counting_fetcher_counts_and_scripts() {
        let fetcher = CountingFetcher::new(serde_json::json!([1]));
        let clone = fetcher.clone();
        assert_eq!(clone.call().await, Ok(serde_json::json!([1])));

        fetcher.respond_with(Err(ServiceError::transient("pipeline.list", "down")));
        assert!(clone.call().await.is_err());
        assert_eq!(fetcher.calls(), 2);
    }

    #[test]
    fn test_canned_events_are_scoped_to_demo_company() {
        let events = canned_events();
        assert_eq!(events.len(), 5);
        assert!(events
            .iter()
            .all(|e| e.company_id.as_ref() == Some(&fixtures::company())));
        assert_eq!(events[0].event_type, "pipeline.moved");
        assert_eq!(events[4].payload["newMatchesCount"], 5);
    }

    #[test]
    fn test_single_notification_assertion() {
        let center = NotificationCenter::new();
        center.notify(Notification::success("Candidate moved successfully!"));
        let n = assertions::assert_single_notification(&center, NotificationLevel::Success);
        assert_eq!(n.message, "Candidate moved successfully!");
        assertions::assert_no_notification(&center, NotificationLevel::Error);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn prop_generated_keys_start_with_a_resource(segments in generators::arb_query_key()) {
            prop_assert!(!segments.is_empty());
            prop_assert!(segments[0].is_string());
        }

        #[test]
        fn prop_generated_boards_have_distinct_ids(items in generators::arb_pipeline()) {
            let mut ids: Vec<_> = items.iter().map(|i| i.id.clone()).collect();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), items.len());
        }
    }
}
