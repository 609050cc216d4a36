//! Realtime wiring: which channels the dashboard listens on and which
//! source feeds them.

use crate::client::TalentloomClient;
use talentloom_core::{demo_events, CompanyId, DomainEvent, EntityIdType, JobId};
use talentloom_events::{channels, Disposition, EventSource, FeedHandle, ReplaySource};

/// Tenant the demo replay belongs to when no company is configured.
pub const DEMO_COMPANY: &str = "company_1";

impl TalentloomClient {
    fn active_company(&self) -> CompanyId {
        self.config
            .company()
            .unwrap_or_else(|| CompanyId::new(DEMO_COMPANY))
    }

    /// Subscribe to every dashboard channel of the active company, plus the
    /// per-job pipeline channel when a job is open. Returns the names added.
    pub fn subscribe_dashboard_channels(&self, job: Option<&JobId>) -> Vec<String> {
        let company = self.active_company();
        let mut names = channels::pipeline_channels(&company, job);
        names.push(channels::jobs_channel(&company));
        names.push(channels::offers_channel(&company));
        names.push(channels::reports_channel(&company));
        self.feed.subscribe_channels(names.clone());
        names
    }

    /// Replay of the demo events paced by the configured tick.
    pub fn demo_source(&self) -> ReplaySource {
        let realtime = &self.config.realtime;
        ReplaySource::new(
            demo_events(&self.active_company()),
            realtime.tick_interval(),
            realtime.exhaustion,
        )
    }

    /// Start the demo replay unless realtime is disabled.
    pub fn start_realtime(&self) -> Option<FeedHandle> {
        if !self.config.realtime.enabled {
            tracing::info!("realtime updates disabled");
            return None;
        }
        self.subscribe_dashboard_channels(None);
        Some(self.start_feed(self.demo_source()))
    }

    /// Drive the store from an arbitrary event source.
    pub fn start_feed<S>(&self, source: S) -> FeedHandle
    where
        S: EventSource + 'static,
    {
        self.feed.start(source)
    }

    /// Handle a locally originated event as if it had been received.
    pub fn publish(&self, channel: &str, event: DomainEvent) -> Disposition {
        self.feed.publish(channel, event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use serde_json::json;
    use std::time::Duration;
    use talentloom_cache::keys;
    use talentloom_events::ExhaustionPolicy;

    #[test]
    fn test_dashboard_channels_for_configured_company() {
        let config = ClientConfig {
            company_id: Some("acme".to_string()),
            ..Default::default()
        };
        let client = TalentloomClient::with_mock_api(config);
        let added = client.subscribe_dashboard_channels(Some(&JobId::new("7")));
        assert_eq!(
            added,
            vec!["pipeline.acme", "pipeline.7", "jobs.acme", "offers.acme", "reports.acme"]
        );
        assert_eq!(client.feed().subscribed_channels().len(), 5);
    }

    #[test]
    fn test_disabled_realtime_starts_nothing() {
        let mut config = ClientConfig::default();
        config.realtime.enabled = false;
        let client = TalentloomClient::with_mock_api(config);
        assert!(client.start_realtime().is_none());
        assert!(client.feed().subscribed_channels().is_empty());
    }

    #[test]
    fn test_publish_invalidates_jobs() {
        let client = TalentloomClient::with_mock_api(ClientConfig::default());
        client.store().set(&keys::jobs(), json!([]));
        let disposition = client.publish(
            "jobs.company_1",
            DomainEvent::new("jobs.created", json!({"title": "Data Engineer"})),
        );
        assert!(!disposition.is_dropped());
        assert!(client.store().get(&keys::jobs()).unwrap().invalidated);
        assert_eq!(
            client.notifications().history()[0].message,
            "New job posting created: Data Engineer"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_demo_replay_stops_when_configured() {
        let mut config = ClientConfig::default();
        config.realtime.tick_interval_ms = 1_000;
        config.realtime.exhaustion = ExhaustionPolicy::Stop;
        config.mock_api.latency_scale = 0.0;
        let client = TalentloomClient::with_mock_api(config);
        let handle = client.start_realtime().unwrap();
        assert!(client.feed().is_subscribed("reports.company_1"));
        tokio::time::sleep(Duration::from_millis(5_500)).await;
        assert!(handle.is_finished());
        assert_eq!(client.feed().stats().applied, 5);
        assert_eq!(client.notifications().len(), 5);
        handle.join().await;
        assert!(!client.feed().is_connected());
    }
}
