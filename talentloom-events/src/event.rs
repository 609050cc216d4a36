//! The closed set of realtime event types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use talentloom_core::{DomainEvent, EnumParseError};

/// Type of a [`DomainEvent`] this client knows how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "pipeline.created")]
    PipelineCreated,
    #[serde(rename = "pipeline.moved")]
    PipelineMoved,
    #[serde(rename = "pipeline.updated")]
    PipelineUpdated,
    #[serde(rename = "jobs.created")]
    JobsCreated,
    #[serde(rename = "jobs.updated")]
    JobsUpdated,
    #[serde(rename = "jobs.archived")]
    JobsArchived,
    #[serde(rename = "offers.created")]
    OffersCreated,
    #[serde(rename = "offers.updated")]
    OffersUpdated,
    #[serde(rename = "reports.ready")]
    ReportsReady,
    #[serde(rename = "matches.updated")]
    MatchesUpdated,
}

impl EventType {
    pub const ALL: [EventType; 10] = [
        EventType::PipelineCreated,
        EventType::PipelineMoved,
        EventType::PipelineUpdated,
        EventType::JobsCreated,
        EventType::JobsUpdated,
        EventType::JobsArchived,
        EventType::OffersCreated,
        EventType::OffersUpdated,
        EventType::ReportsReady,
        EventType::MatchesUpdated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::PipelineCreated => "pipeline.created",
            EventType::PipelineMoved => "pipeline.moved",
            EventType::PipelineUpdated => "pipeline.updated",
            EventType::JobsCreated => "jobs.created",
            EventType::JobsUpdated => "jobs.updated",
            EventType::JobsArchived => "jobs.archived",
            EventType::OffersCreated => "offers.created",
            EventType::OffersUpdated => "offers.updated",
            EventType::ReportsReady => "reports.ready",
            EventType::MatchesUpdated => "matches.updated",
        }
    }

    /// Type of `event`, or `None` for a type outside the known set.
    pub fn of(event: &DomainEvent) -> Option<EventType> {
        event.event_type.parse().ok()
    }

    /// Leading segment of the dotted name, which is also the channel family.
    pub fn family(&self) -> &'static str {
        match self {
            EventType::PipelineCreated | EventType::PipelineMoved | EventType::PipelineUpdated => {
                "pipeline"
            }
            EventType::JobsCreated | EventType::JobsUpdated | EventType::JobsArchived => "jobs",
            EventType::OffersCreated | EventType::OffersUpdated => "offers",
            EventType::ReportsReady => "reports",
            EventType::MatchesUpdated => "matches",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| EnumParseError {
                kind: "event type",
                value: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_names_round_trip() {
        for t in EventType::ALL {
            assert_eq!(t.as_str().parse::<EventType>(), Ok(t));
            assert_eq!(serde_json::to_value(t).unwrap(), json!(t.as_str()));
        }
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let event = DomainEvent::new("candidates.merged", json!({}));
        assert_eq!(EventType::of(&event), None);
        assert!("Pipeline.Moved".parse::<EventType>().is_err());
    }

    #[test]
    fn test_family() {
        assert_eq!(EventType::JobsArchived.family(), "jobs");
        assert_eq!(EventType::MatchesUpdated.family(), "matches");
    }
}
