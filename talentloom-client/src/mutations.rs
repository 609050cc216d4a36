//! Typed mutations, one per dashboard write.
//!
//! Every write goes through the [`MutationController`](talentloom_cache::MutationController)
//! so it gets the same phases: optional optimistic patch, write, reconcile or
//! rollback with a notification, settle invalidation.

use crate::client::TalentloomClient;
use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use talentloom_cache::{keys, MutationSpec, QueryKey, QueryStore};
use talentloom_core::{
    Candidate, CandidateId, CandidatePatch, Entity, EntityIdType, JobId, JobPatch, JobPosting,
    NewCandidate, NewJobPosting, NewOffer, NewPayout, Notification, Offer, OfferId, OfferStatus,
    PaymentMethod, PaymentMethodRequest, Payout, PipelineItem, PipelineItemId, PipelinePatch,
    PipelineStage, PlanChange, ServiceResult,
};

/// A write the dashboard can issue, tagged by resource.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationInput {
    CreateJob(NewJobPosting),
    UpdateJob { id: JobId, patch: JobPatch },
    MovePipelineItem { id: PipelineItemId, stage: PipelineStage },
    AddToPipeline { candidate_id: CandidateId, job_id: JobId },
    UpdatePipelineItem { id: PipelineItemId, patch: PipelinePatch },
    CreateOffer(NewOffer),
    UpdateOfferStatus { id: OfferId, status: OfferStatus },
    CreateCandidate(NewCandidate),
    UpdateCandidate { id: CandidateId, patch: CandidatePatch },
    UpdatePlan { plan_name: String },
    AddPaymentMethod(PaymentMethodRequest),
    CreatePayout(NewPayout),
}

impl MutationInput {
    pub fn name(&self) -> &'static str {
        match self {
            MutationInput::CreateJob(_) => "create job",
            MutationInput::UpdateJob { .. } => "update job",
            MutationInput::MovePipelineItem { .. } => "move pipeline item",
            MutationInput::AddToPipeline { .. } => "add to pipeline",
            MutationInput::UpdatePipelineItem { .. } => "update pipeline item",
            MutationInput::CreateOffer(_) => "create offer",
            MutationInput::UpdateOfferStatus { .. } => "update offer status",
            MutationInput::CreateCandidate(_) => "create candidate",
            MutationInput::UpdateCandidate { .. } => "update candidate",
            MutationInput::UpdatePlan { .. } => "update plan",
            MutationInput::AddPaymentMethod(_) => "add payment method",
            MutationInput::CreatePayout(_) => "create payout",
        }
    }

    /// Key patched optimistically and invalidated when the write settles.
    pub fn affected_key(&self) -> QueryKey {
        match self {
            MutationInput::CreateJob(_) | MutationInput::UpdateJob { .. } => keys::jobs(),
            MutationInput::MovePipelineItem { .. }
            | MutationInput::AddToPipeline { .. }
            | MutationInput::UpdatePipelineItem { .. } => keys::pipeline(),
            MutationInput::CreateOffer(_) | MutationInput::UpdateOfferStatus { .. } => {
                keys::offers()
            }
            MutationInput::CreateCandidate(_) | MutationInput::UpdateCandidate { .. } => {
                keys::all_candidates()
            }
            MutationInput::UpdatePlan { .. } | MutationInput::AddPaymentMethod(_) => {
                keys::billing_plan()
            }
            MutationInput::CreatePayout(_) => keys::payouts(),
        }
    }
}

/// Authoritative result of a [`MutationInput`].
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutput {
    Job(JobPosting),
    PipelineItem(PipelineItem),
    Offer(Offer),
    Candidate(Candidate),
    PlanChange(PlanChange),
    PaymentMethod(PaymentMethod),
    Payout(Payout),
}

impl TalentloomClient {
    /// Run any mutation by its tagged input.
    pub async fn mutate(&self, input: MutationInput) -> ServiceResult<MutationOutput> {
        match input {
            MutationInput::CreateJob(new) => self.create_job(new).await.map(MutationOutput::Job),
            MutationInput::UpdateJob { id, patch } => {
                self.update_job(&id, patch).await.map(MutationOutput::Job)
            }
            MutationInput::MovePipelineItem { id, stage } => self
                .move_pipeline_item(&id, stage)
                .await
                .map(MutationOutput::PipelineItem),
            MutationInput::AddToPipeline {
                candidate_id,
                job_id,
            } => self
                .add_to_pipeline(&candidate_id, &job_id)
                .await
                .map(MutationOutput::PipelineItem),
            MutationInput::UpdatePipelineItem { id, patch } => self
                .update_pipeline_item(&id, patch)
                .await
                .map(MutationOutput::PipelineItem),
            MutationInput::CreateOffer(new) => {
                self.create_offer(new).await.map(MutationOutput::Offer)
            }
            MutationInput::UpdateOfferStatus { id, status } => self
                .update_offer_status(&id, status)
                .await
                .map(MutationOutput::Offer),
            MutationInput::CreateCandidate(new) => self
                .create_candidate(new)
                .await
                .map(MutationOutput::Candidate),
            MutationInput::UpdateCandidate { id, patch } => self
                .update_candidate(&id, patch)
                .await
                .map(MutationOutput::Candidate),
            MutationInput::UpdatePlan { plan_name } => self
                .update_plan(&plan_name)
                .await
                .map(MutationOutput::PlanChange),
            MutationInput::AddPaymentMethod(request) => self
                .add_payment_method(request)
                .await
                .map(MutationOutput::PaymentMethod),
            MutationInput::CreatePayout(new) => {
                self.create_payout(new).await.map(MutationOutput::Payout)
            }
        }
    }

    pub async fn create_job(&self, input: NewJobPosting) -> ServiceResult<JobPosting> {
        let spec = MutationSpec::new("create job", keys::jobs())
            .success_message("Job posting created successfully!")
            .error_message("Failed to create job posting");
        self.mutations.run(spec, self.api.create_job(input)).await
    }

    /// The updated posting also lands in the job's detail entry.
    pub async fn update_job(&self, id: &JobId, patch: JobPatch) -> ServiceResult<JobPosting> {
        let spec = MutationSpec::new("update job", keys::jobs())
            .reconcile(|store: &QueryStore, job: &JobPosting| {
                replace_in_list(store, &keys::jobs(), job);
                set_detail(store, &keys::job(&job.id), job);
            })
            .success_message("Job posting updated successfully!")
            .error_message("Failed to update job posting");
        self.mutations.run(spec, self.api.update_job(id, patch)).await
    }

    /// Moves the card on the cached board before the write is issued.
    pub async fn move_pipeline_item(
        &self,
        id: &PipelineItemId,
        stage: PipelineStage,
    ) -> ServiceResult<PipelineItem> {
        let stage_value = serde_json::to_value(stage)?;
        let now = serde_json::to_value(Utc::now())?;
        let item_id = id.as_str().to_string();
        let spec = MutationSpec::new("move pipeline item", keys::pipeline())
            .optimistic(move |board: &Value| {
                patch_list_item(board, &item_id, |item| {
                    item.insert("stage".to_string(), stage_value);
                    item.insert("updated_at".to_string(), now);
                })
            })
            .reconcile(|store: &QueryStore, item: &PipelineItem| {
                replace_in_list(store, &keys::pipeline(), item);
            })
            .success_message("Candidate moved successfully!")
            .error_message("Failed to move candidate");
        self.mutations
            .run(spec, self.api.move_pipeline_item(id, stage))
            .await
    }

    pub async fn add_to_pipeline(
        &self,
        candidate_id: &CandidateId,
        job_id: &JobId,
    ) -> ServiceResult<PipelineItem> {
        let spec = MutationSpec::new("add to pipeline", keys::pipeline())
            .success_message("Candidate added to pipeline!")
            .error_message("Failed to add candidate to pipeline");
        self.mutations
            .run(spec, self.api.add_to_pipeline(candidate_id, job_id))
            .await
    }

    /// Notes and score of the card are patched before the write is issued.
    pub async fn update_pipeline_item(
        &self,
        id: &PipelineItemId,
        patch: PipelinePatch,
    ) -> ServiceResult<PipelineItem> {
        let item_id = id.as_str().to_string();
        let notes = patch.notes.clone();
        let match_score = patch.match_score.map(Value::from);
        let spec = MutationSpec::new("update pipeline item", keys::pipeline())
            .optimistic(move |board: &Value| {
                patch_list_item(board, &item_id, |item| {
                    if let Some(notes) = notes {
                        item.insert("notes".to_string(), Value::String(notes));
                    }
                    if let Some(score) = match_score {
                        item.insert("match_score".to_string(), score);
                    }
                })
            })
            .reconcile(|store: &QueryStore, item: &PipelineItem| {
                replace_in_list(store, &keys::pipeline(), item);
            })
            .success_message("Pipeline item updated!")
            .error_message("Failed to update pipeline item");
        self.mutations
            .run(spec, self.api.update_pipeline_item(id, patch))
            .await
    }

    pub async fn create_offer(&self, input: NewOffer) -> ServiceResult<Offer> {
        let spec = MutationSpec::new("create offer", keys::offers())
            .success_message("Offer created successfully!")
            .error_message("Failed to create offer");
        self.mutations.run(spec, self.api.create_offer(input)).await
    }

    /// The cached offer list shows the new status before the write is issued.
    pub async fn update_offer_status(
        &self,
        id: &OfferId,
        status: OfferStatus,
    ) -> ServiceResult<Offer> {
        let status_value = serde_json::to_value(status)?;
        let offer_id = id.as_str().to_string();
        let spec = MutationSpec::new("update offer status", keys::offers())
            .optimistic(move |offers: &Value| {
                patch_list_item(offers, &offer_id, |offer| {
                    offer.insert("status".to_string(), status_value);
                })
            })
            .reconcile(|store: &QueryStore, offer: &Offer| {
                replace_in_list(store, &keys::offers(), offer);
            })
            .success_message("Offer status updated!")
            .error_message("Failed to update offer status");
        self.mutations
            .run(spec, self.api.update_offer_status(id, status))
            .await
    }

    pub async fn create_candidate(&self, input: NewCandidate) -> ServiceResult<Candidate> {
        let spec = MutationSpec::new("create candidate", keys::all_candidates())
            .invalidates(keys::dashboard())
            .success_message("Candidate created successfully!")
            .error_message("Failed to create candidate");
        self.mutations.run(spec, self.api.create_candidate(input)).await
    }

    pub async fn update_candidate(
        &self,
        id: &CandidateId,
        patch: CandidatePatch,
    ) -> ServiceResult<Candidate> {
        let spec = MutationSpec::new("update candidate", keys::all_candidates())
            .reconcile(|store: &QueryStore, candidate: &Candidate| {
                set_detail(store, &keys::candidate(&candidate.id), candidate);
            })
            .success_message("Candidate updated successfully!")
            .error_message("Failed to update candidate");
        self.mutations
            .run(spec, self.api.update_candidate(id, patch))
            .await
    }

    pub async fn update_plan(&self, plan_name: &str) -> ServiceResult<PlanChange> {
        let name = plan_name.to_string();
        let spec = MutationSpec::new("update plan", keys::billing_plan())
            .invalidates(keys::invoices())
            .success_with(move |_: &PlanChange| {
                Notification::success(format!("Successfully upgraded to {} plan!", name))
            })
            .error_message("Failed to update plan");
        self.mutations.run(spec, self.api.update_plan(plan_name)).await
    }

    pub async fn add_payment_method(
        &self,
        request: PaymentMethodRequest,
    ) -> ServiceResult<PaymentMethod> {
        let spec = MutationSpec::new("add payment method", keys::billing_plan())
            .success_message("Payment method added successfully!")
            .error_message("Failed to add payment method");
        self.mutations
            .run(spec, self.api.add_payment_method(request))
            .await
    }

    pub async fn create_payout(&self, input: NewPayout) -> ServiceResult<Payout> {
        let spec = MutationSpec::new("create payout", keys::payouts())
            .success_message("Payout created successfully!")
            .error_message("Failed to create payout");
        self.mutations.run(spec, self.api.create_payout(input)).await
    }
}

/// Copy of a cached list with `edit` applied to the element whose `id` is
/// `id`. Anything that is not a list comes back unchanged.
fn patch_list_item<F>(list: &Value, id: &str, edit: F) -> Value
where
    F: FnOnce(&mut Map<String, Value>),
{
    let Value::Array(items) = list else {
        return list.clone();
    };
    let mut items = items.clone();
    if let Some(item) = items
        .iter_mut()
        .find(|item| item.get("id").and_then(Value::as_str) == Some(id))
    {
        if let Some(fields) = item.as_object_mut() {
            edit(fields);
        }
    }
    Value::Array(items)
}

/// Swap the authoritative record into a cached list, matched by id.
fn replace_in_list<T>(store: &QueryStore, key: &QueryKey, record: &T)
where
    T: Entity + Serialize,
{
    let value = match serde_json::to_value(record) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(%key, error = %err, "could not encode mutation result");
            return;
        }
    };
    let id = record.id().as_str().to_string();
    store.update(key, |list| {
        patch_list_item(list, &id, |fields| {
            if let Value::Object(updated) = value {
                *fields = updated;
            }
        })
    });
}

fn set_detail<T: Serialize>(store: &QueryStore, key: &QueryKey, record: &T) {
    if let Err(err) = store.set_typed(key, record) {
        tracing::warn!(%key, error = %err, "could not cache mutation result");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use serde_json::json;
    use std::sync::Arc;
    use talentloom_api::{LatencyProfile, MockRecruitingApi, Operation};
    use talentloom_core::{NotificationLevel, ServiceError};

    fn client() -> (TalentloomClient, Arc<MockRecruitingApi>) {
        let api = Arc::new(MockRecruitingApi::seeded().with_latency(LatencyProfile::instant()));
        let client = TalentloomClient::new(api.clone(), ClientConfig::default());
        (client, api)
    }

    #[test]
    fn test_patch_list_item_touches_only_matching_id() {
        let list = json!([{"id": "a", "stage": "sourced"}, {"id": "b", "stage": "sourced"}]);
        let patched = patch_list_item(&list, "b", |item| {
            item.insert("stage".to_string(), json!("offer"));
        });
        assert_eq!(patched[0]["stage"], "sourced");
        assert_eq!(patched[1]["stage"], "offer");
        assert_eq!(patch_list_item(&json!({"id": "b"}), "b", |_| {}), json!({"id": "b"}));
        assert_eq!(patch_list_item(&list, "zzz", |_| {}), list);
    }

    #[test]
    fn test_affected_keys() {
        let mv = MutationInput::MovePipelineItem {
            id: PipelineItemId::new("p1"),
            stage: PipelineStage::Interview,
        };
        assert_eq!(mv.affected_key(), keys::pipeline());
        assert_eq!(mv.name(), "move pipeline item");
        let plan = MutationInput::UpdatePlan {
            plan_name: "Enterprise".to_string(),
        };
        assert_eq!(plan.affected_key(), keys::billing_plan());
    }

    #[tokio::test]
    async fn test_update_job_merges_detail() {
        let (client, _) = client();
        let patch = JobPatch {
            title: Some("Staff Frontend Engineer".to_string()),
            ..Default::default()
        };
        let job = client.update_job(&JobId::new("1"), patch).await.unwrap();
        assert_eq!(job.title, "Staff Frontend Engineer");
        let cached = client.store().get(&keys::job(&JobId::new("1"))).unwrap();
        assert_eq!(cached.data.unwrap()["title"], "Staff Frontend Engineer");
        assert!(cached.invalidated);
        let notice = client.notifications().history().pop().unwrap();
        assert_eq!(notice.message, "Job posting updated successfully!");
    }

    #[tokio::test]
    async fn test_offer_status_failure_restores_list() {
        let (client, api) = client();
        let offers = serde_json::to_value(
            talentloom_api::OffersApi::list_offers(api.as_ref()).await.unwrap(),
        )
        .unwrap();
        client.store().set(&keys::offers(), offers.clone());
        let id = OfferId::new(offers[0]["id"].as_str().unwrap());

        api.fail_next(
            Operation::UpdateOfferStatus,
            ServiceError::transient("offers.update_status", "timeout"),
        );
        let result = client.update_offer_status(&id, OfferStatus::Accepted).await;
        assert!(result.is_err());
        assert_eq!(client.store().data(&keys::offers()), Some(offers));
        let notice = client.notifications().history().pop().unwrap();
        assert_eq!(notice.level, NotificationLevel::Error);
        assert_eq!(notice.message, "Failed to update offer status");
    }

    #[tokio::test]
    async fn test_plan_upgrade_names_plan() {
        let (client, _) = client();
        let output = client
            .mutate(MutationInput::UpdatePlan {
                plan_name: "Enterprise".to_string(),
            })
            .await
            .unwrap();
        assert!(matches!(output, MutationOutput::PlanChange(_)));
        let notice = client.notifications().history().pop().unwrap();
        assert_eq!(notice.message, "Successfully upgraded to Enterprise plan!");
    }

    #[tokio::test]
    async fn test_add_to_pipeline_without_cached_board() {
        let (client, api) = client();
        let item = client
            .add_to_pipeline(&CandidateId::new("2"), &JobId::new("1"))
            .await
            .unwrap();
        assert_eq!(item.stage, PipelineStage::Sourced);
        assert_eq!(api.calls().count(Operation::AddToPipeline), 1);
        assert!(client.store().get(&keys::pipeline()).is_none());
        assert_eq!(client.notifications().count(NotificationLevel::Success), 1);
    }
}
