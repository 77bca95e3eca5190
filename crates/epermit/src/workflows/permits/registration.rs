use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use super::domain::{
    ActivityLevel, ContactInfo, Entity, EntityId, EntityKind, IntentId, IntentRegistration,
    IntentStatus, PermitApplication, PermitClassification, PermitId, PermitStatus,
    ReviewMetadata, SiteLocation, TransitionRecord, UserId,
};
use super::repository::PermitStore;
use crate::workflows::{Clock, RepositoryError, SystemClock};

static ENTITY_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static INTENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static PERMIT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_entity_id() -> EntityId {
    let id = ENTITY_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    EntityId(format!("ent-{id:06}"))
}

fn next_intent_id() -> IntentId {
    let id = INTENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    IntentId(format!("int-{id:06}"))
}

fn next_permit_id() -> PermitId {
    let id = PERMIT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    PermitId(format!("pa-{id:06}"))
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityRegistration {
    pub owner: UserId,
    pub name: String,
    pub kind: EntityKind,
    #[serde(default)]
    pub contact: ContactInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IntentSubmission {
    pub entity_id: EntityId,
    pub applicant: UserId,
    pub activity_description: String,
    pub activity_level: ActivityLevel,
    pub site: SiteLocation,
    #[serde(default)]
    pub existing_permit_id: Option<PermitId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PermitDraftRequest {
    pub intent_id: IntentId,
    pub applicant: UserId,
    pub title: String,
    pub permit_type: String,
    pub classification: PermitClassification,
}

/// Applicant-side operations: registering entities and intents, drafting and submitting permits.
pub struct ApplicantService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> ApplicantService<S>
where
    S: PermitStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn register_entity(&self, request: EntityRegistration) -> Result<Entity, ApplicantError> {
        let name = required("name", &request.name)?;

        let entity = Entity {
            id: next_entity_id(),
            owner: request.owner,
            name,
            kind: request.kind,
            contact: request.contact,
            suspended: false,
            suspension_reason: None,
            created_at: self.clock.now(),
        };

        let stored = self.store.insert_entity(entity)?;
        info!(entity = %stored.id, "entity registered");
        Ok(stored)
    }

    pub fn register_intent(
        &self,
        submission: IntentSubmission,
    ) -> Result<IntentRegistration, ApplicantError> {
        let activity_description =
            required("activity_description", &submission.activity_description)?;
        let province = required("site.province", &submission.site.province)?;

        let entity = self
            .store
            .fetch_entity(&submission.entity_id)?
            .ok_or_else(|| ApplicantError::EntityNotFound(submission.entity_id.clone()))?;
        if entity.suspended {
            return Err(ApplicantError::EntitySuspended(entity.id));
        }

        let intent = IntentRegistration {
            id: next_intent_id(),
            entity_id: entity.id,
            applicant: submission.applicant,
            activity_description,
            activity_level: submission.activity_level,
            site: SiteLocation {
                province,
                ..submission.site
            },
            existing_permit_id: submission.existing_permit_id,
            status: IntentStatus::Pending,
            review: ReviewMetadata::default(),
            frozen: false,
            created_at: self.clock.now(),
        };

        let stored = self.store.insert_intent(intent)?;
        info!(intent = %stored.id, entity = %stored.entity_id, "intent registered");
        Ok(stored)
    }

    /// Start a draft permit application from an approved intent owned by the applicant.
    pub fn create_permit(
        &self,
        request: PermitDraftRequest,
    ) -> Result<PermitApplication, ApplicantError> {
        let title = required("title", &request.title)?;
        let permit_type = required("permit_type", &request.permit_type)?;

        let intent = self
            .store
            .fetch_intent(&request.intent_id)?
            .ok_or_else(|| ApplicantError::IntentNotFound(request.intent_id.clone()))?;
        if intent.applicant != request.applicant {
            return Err(ApplicantError::NotOwner(request.applicant));
        }
        if intent.frozen {
            return Err(ApplicantError::EntitySuspended(intent.entity_id));
        }
        if intent.status != IntentStatus::Approved {
            return Err(ApplicantError::IntentNotApproved {
                status: intent.status.label(),
            });
        }

        let permit = PermitApplication {
            id: next_permit_id(),
            entity_id: intent.entity_id,
            applicant: intent.applicant,
            intent_id: Some(intent.id),
            title,
            permit_type,
            classification: request.classification,
            activity_level: intent.activity_level,
            status: PermitStatus::Draft,
            approval_date: None,
            permit_number: None,
            review: ReviewMetadata::default(),
            frozen: false,
            created_at: self.clock.now(),
        };

        Ok(self.store.insert_permit(permit)?)
    }

    /// Drafts are the only applicant-editable state; submission hands the record to staff.
    pub fn submit_permit(
        &self,
        id: &PermitId,
        applicant: &UserId,
    ) -> Result<PermitApplication, ApplicantError> {
        let mut permit = self
            .store
            .fetch_permit(id)?
            .ok_or_else(|| ApplicantError::PermitNotFound(id.clone()))?;
        if &permit.applicant != applicant {
            return Err(ApplicantError::NotOwner(applicant.clone()));
        }
        if permit.frozen {
            return Err(ApplicantError::EntitySuspended(permit.entity_id));
        }
        if permit.status != PermitStatus::Draft {
            return Err(ApplicantError::NotDraft {
                status: permit.status.label(),
            });
        }

        permit.status = PermitStatus::Submitted;
        permit.review.history.push(TransitionRecord {
            from: PermitStatus::Draft,
            to: PermitStatus::Submitted,
            actor: applicant.clone(),
            at: self.clock.now(),
            notes: None,
        });
        self.store.update_permit(permit.clone())?;
        info!(permit = %permit.id, "permit application submitted");
        Ok(permit)
    }

    pub fn intent(&self, id: &IntentId) -> Result<IntentRegistration, ApplicantError> {
        self.store
            .fetch_intent(id)?
            .ok_or_else(|| ApplicantError::IntentNotFound(id.clone()))
    }

    pub fn permit(&self, id: &PermitId) -> Result<PermitApplication, ApplicantError> {
        self.store
            .fetch_permit(id)?
            .ok_or_else(|| ApplicantError::PermitNotFound(id.clone()))
    }
}

fn required(field: &'static str, value: &str) -> Result<String, ApplicantError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ApplicantError::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApplicantError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("entity {0} not found")]
    EntityNotFound(EntityId),
    #[error("intent registration {0} not found")]
    IntentNotFound(IntentId),
    #[error("permit application {0} not found")]
    PermitNotFound(PermitId),
    #[error("entity {0} is suspended")]
    EntitySuspended(EntityId),
    #[error("user {0} does not own this record")]
    NotOwner(UserId),
    #[error("intent registration must be approved first (currently {status})")]
    IntentNotApproved { status: &'static str },
    #[error("only draft applications can be submitted (currently {status})")]
    NotDraft { status: &'static str },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
