//! Realtime events refreshing live query bindings.

use std::sync::Arc;
use std::time::Duration;
use talentloom_client::{ClientConfig, TalentloomClient};
use talentloom_events::{ExhaustionPolicy, ReplaySource};
use talentloom_test_utils::fixtures::{company, instant_api};
use talentloom_test_utils::{
    canned_events, CompanyId, DomainEvent, EntityIdType, NotificationLevel, Operation,
};

fn scoped_config() -> ClientConfig {
    ClientConfig {
        company_id: Some(company().to_string()),
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_pipeline_event_refetches_bound_board() {
    let api = Arc::new(instant_api());
    let client = TalentloomClient::new(api.clone(), scoped_config());
    let mut board = client.pipeline();
    board.wait_for(|s| s.is_success()).await;
    assert_eq!(api.calls().count(Operation::ListPipeline), 1);

    let handle = client.start_feed(ReplaySource::new(
        canned_events().into_iter().take(1).collect(),
        Duration::from_secs(45),
        ExhaustionPolicy::Stop,
    ));
    handle.join().await;

    board
        .wait_for(|_| api.calls().count(Operation::ListPipeline) >= 2)
        .await;
    let state = board.wait_for(|s| s.is_success() && !s.is_stale).await;
    assert!(!state.data.unwrap_or_default().is_empty());
    let info = client.notifications().history();
    assert_eq!(info.len(), 1);
    assert_eq!(info[0].level, NotificationLevel::Info);
    assert_eq!(info[0].message, "Sarah Chen moved to interview stage");
}

#[tokio::test(start_paused = true)]
async fn test_foreign_company_event_leaves_bindings_alone() {
    let api = Arc::new(instant_api());
    let client = TalentloomClient::new(api.clone(), scoped_config());
    let mut jobs = client.jobs();
    jobs.wait_for(|s| s.is_success()).await;

    let foreign = DomainEvent::new("jobs.archived", serde_json::json!({}))
        .with_company(CompanyId::new("company_2"));
    let handle = client.start_feed(ReplaySource::new(
        vec![foreign],
        Duration::from_secs(1),
        ExhaustionPolicy::Stop,
    ));
    handle.join().await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(api.calls().count(Operation::ListJobs), 1);
    assert!(!jobs.state().is_stale);
    assert!(client.notifications().is_empty());
    assert_eq!(client.feed().stats().out_of_scope, 1);
}
