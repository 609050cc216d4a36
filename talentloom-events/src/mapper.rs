//! Translation of domain events into cache invalidations and notifications.
//!
//! Mapping is pure: [`EventMapper::map`] decides, [`EventEffect::apply`]
//! acts on a store and a notifier. The transport an event arrived on plays
//! no part.

use crate::event::EventType;
use serde_json::Value;
use talentloom_cache::{keys, QueryKey, QueryStore};
use talentloom_core::{
    CompanyId, DomainEvent, EntityIdType, ExportId, JobId, Notification, NotificationAction,
    Notifier, OfferId,
};
use tracing::{debug, warn};

/// What handling one in-scope event of a known type amounts to.
#[derive(Debug, Clone, PartialEq)]
pub struct EventEffect {
    pub event_type: EventType,
    /// Prefixes to invalidate, in order.
    pub invalidations: Vec<QueryKey>,
    pub notification: Option<Notification>,
}

impl EventEffect {
    fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            invalidations: Vec::new(),
            notification: None,
        }
    }

    fn invalidate(mut self, key: QueryKey) -> Self {
        self.invalidations.push(key);
        self
    }

    fn invalidate_if(self, key: Option<QueryKey>) -> Self {
        match key {
            Some(key) => self.invalidate(key),
            None => self,
        }
    }

    fn notify(mut self, notification: Notification) -> Self {
        self.notification = Some(notification);
        self
    }

    /// Invalidate every prefix, then emit the notification.
    ///
    /// Returns how many cache entries were marked stale.
    pub fn apply(&self, store: &QueryStore, notifier: &dyn Notifier) -> usize {
        let marked: usize = self
            .invalidations
            .iter()
            .map(|prefix| store.invalidate(prefix))
            .sum();
        if let Some(notification) = &self.notification {
            notifier.notify(notification.clone());
        }
        marked
    }
}

/// Outcome of mapping one event.
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    Applied(EventEffect),
    /// Tagged with a company other than the active scope.
    OutOfScope { company_id: CompanyId },
    /// Type outside the known set.
    Unknown { event_type: String },
}

impl Disposition {
    pub fn effect(&self) -> Option<&EventEffect> {
        match self {
            Disposition::Applied(effect) => Some(effect),
            _ => None,
        }
    }

    pub fn is_dropped(&self) -> bool {
        !matches!(self, Disposition::Applied(_))
    }
}

/// Maps events for one active tenant scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventMapper {
    scope: Option<CompanyId>,
}

impl EventMapper {
    /// With no scope every event is accepted.
    pub fn new(scope: Option<CompanyId>) -> Self {
        Self { scope }
    }

    pub fn scope(&self) -> Option<&CompanyId> {
        self.scope.as_ref()
    }

    /// Events without a company tag are always in scope.
    pub fn in_scope(&self, event: &DomainEvent) -> bool {
        match (&self.scope, &event.company_id) {
            (Some(scope), Some(company)) => scope == company,
            _ => true,
        }
    }

    pub fn map(&self, event: &DomainEvent) -> Disposition {
        if !self.in_scope(event) {
            let company_id = event.company_id.clone().unwrap_or_else(|| CompanyId::new(""));
            debug!(event_type = %event.event_type, company = %company_id, "dropped out-of-scope event");
            return Disposition::OutOfScope { company_id };
        }
        let Some(event_type) = EventType::of(event) else {
            warn!(event_type = %event.event_type, "unknown realtime event");
            return Disposition::Unknown {
                event_type: event.event_type.clone(),
            };
        };
        Disposition::Applied(effect_of(event_type, event))
    }

    /// Map `event` and apply the effect, if any.
    pub fn dispatch(
        &self,
        event: &DomainEvent,
        store: &QueryStore,
        notifier: &dyn Notifier,
    ) -> Disposition {
        let disposition = self.map(event);
        if let Disposition::Applied(effect) = &disposition {
            let marked = effect.apply(store, notifier);
            debug!(event_type = %effect.event_type, marked, "applied realtime event");
        }
        disposition
    }
}

fn effect_of(event_type: EventType, event: &DomainEvent) -> EventEffect {
    let effect = EventEffect::new(event_type);
    let job_id = event
        .job_id
        .clone()
        .or_else(|| event.payload_str("jobId").map(JobId::new));

    match event_type {
        EventType::PipelineMoved => effect
            .invalidate(keys::pipeline())
            .invalidate_if(job_id.as_ref().map(keys::matches_for_job))
            .notify(Notification::info(format!(
                "{} moved to {} stage",
                payload_text(event, "candidateName"),
                payload_text(event, "newStage")
            ))),
        EventType::PipelineCreated => effect
            .invalidate(keys::pipeline())
            .invalidate(keys::dashboard())
            .notify(Notification::info("New candidate added to pipeline")),
        EventType::PipelineUpdated => effect.invalidate(keys::pipeline()),
        EventType::OffersCreated => effect
            .invalidate(keys::offers())
            .invalidate(keys::dashboard())
            .notify(Notification::info(format!(
                "New offer created for {}",
                payload_text(event, "candidateName")
            ))),
        EventType::OffersUpdated => effect
            .invalidate(keys::offers())
            .invalidate_if(
                event
                    .payload_str("offerId")
                    .map(|id| keys::offer_summary(&OfferId::new(id))),
            )
            .notify(Notification::info("Offer status updated")),
        EventType::JobsCreated => effect
            .invalidate(keys::jobs())
            .invalidate(keys::dashboard())
            .notify(Notification::info(format!(
                "New job posting created: {}",
                payload_text(event, "title")
            ))),
        EventType::JobsUpdated => effect
            .invalidate(keys::jobs())
            .invalidate_if(job_id.as_ref().map(keys::job)),
        EventType::JobsArchived => effect
            .invalidate(keys::jobs())
            .invalidate(keys::dashboard())
            .notify(Notification::info("Job posting archived")),
        EventType::ReportsReady => {
            let message = match event.payload_str("type") {
                Some(kind) => format!("{} export ready for download!", kind.to_uppercase()),
                None => "Export ready for download!".to_string(),
            };
            let mut notification = Notification::success(message);
            if let Some(url) = event.payload_str("downloadUrl") {
                notification = notification.with_action(NotificationAction::Download {
                    label: "Download".to_string(),
                    url: url.to_string(),
                });
            }
            effect
                .invalidate_if(
                    event
                        .payload_str("exportId")
                        .map(|id| keys::export_status(&ExportId::new(id))),
                )
                .notify(notification)
        }
        EventType::MatchesUpdated => effect
            .invalidate_if(job_id.as_ref().map(keys::matches_for_job))
            .invalidate(keys::matches())
            .notify(Notification::info(format!(
                "New matches found: {} candidates",
                payload_text(event, "newMatchesCount")
            ))),
    }
}

/// Payload member rendered for a message; strings unquoted.
fn payload_text(event: &DomainEvent, field: &str) -> String {
    match event.payload.get(field) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => "unknown".to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use talentloom_core::NotificationLevel;

    fn scoped() -> EventMapper {
        EventMapper::new(Some(CompanyId::new("c1")))
    }

    #[test]
    fn test_pipeline_moved_targets_job_matches() {
        let event = DomainEvent::new(
            "pipeline.moved",
            json!({"candidateName": "Sarah Chen", "newStage": "interview"}),
        )
        .with_job(JobId::new("1"));
        let effect = scoped().map(&event).effect().cloned().unwrap();
        assert_eq!(
            effect.invalidations,
            vec![keys::pipeline(), keys::matches_for_job(&JobId::new("1"))]
        );
        assert_eq!(
            effect.notification.unwrap().message,
            "Sarah Chen moved to interview stage"
        );
    }

    #[test]
    fn test_pipeline_updated_is_silent() {
        let effect = scoped()
            .map(&DomainEvent::new("pipeline.updated", json!({})))
            .effect()
            .cloned()
            .unwrap();
        assert_eq!(effect.invalidations, vec![keys::pipeline()]);
        assert!(effect.notification.is_none());
    }

    #[test]
    fn test_offer_update_targets_summary_when_named() {
        let with_id = DomainEvent::new("offers.updated", json!({"offerId": "o1"}));
        let effect = scoped().map(&with_id).effect().cloned().unwrap();
        assert_eq!(
            effect.invalidations,
            vec![keys::offers(), keys::offer_summary(&OfferId::new("o1"))]
        );

        let without = DomainEvent::new("offers.updated", json!({}));
        let effect = scoped().map(&without).effect().cloned().unwrap();
        assert_eq!(effect.invalidations, vec![keys::offers()]);
    }

    #[test]
    fn test_matches_count_is_rendered_plain() {
        let event = DomainEvent::new("matches.updated", json!({"newMatchesCount": 5}));
        let effect = scoped().map(&event).effect().cloned().unwrap();
        assert_eq!(effect.invalidations, vec![keys::matches()]);
        assert_eq!(
            effect.notification.unwrap().message,
            "New matches found: 5 candidates"
        );
    }

    #[test]
    fn test_report_without_type_or_url() {
        let event = DomainEvent::new("reports.ready", json!({"exportId": "e9"}));
        let n = scoped()
            .map(&event)
            .effect()
            .and_then(|e| e.notification.clone())
            .unwrap();
        assert_eq!(n.level, NotificationLevel::Success);
        assert_eq!(n.message, "Export ready for download!");
        assert!(n.action.is_none());
    }

    #[test]
    fn test_scope_rules() {
        let foreign = DomainEvent::new("jobs.archived", json!({})).with_company(CompanyId::new("c2"));
        let untagged = DomainEvent::new("jobs.archived", json!({}));
        assert!(!scoped().in_scope(&foreign));
        assert!(scoped().in_scope(&untagged));
        assert!(EventMapper::new(None).in_scope(&foreign));
        assert!(matches!(
            scoped().map(&foreign),
            Disposition::OutOfScope { .. }
        ));
    }

    #[test]
    fn test_unknown_type_is_dropped() {
        let d = scoped().map(&DomainEvent::new("candidates.merged", json!({})));
        assert_eq!(
            d,
            Disposition::Unknown {
                event_type: "candidates.merged".to_string()
            }
        );
        assert!(d.is_dropped());
    }
}
