use std::sync::Arc;

use axum::body::to_bytes;
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::config::WorkflowConfig;
use crate::workflows::memory::{InMemoryNotificationCenter, InMemoryPermitStore};
use crate::workflows::notifications::{
    Notification, NotificationError, NotificationId, NotificationPublisher,
};
use crate::workflows::permits::{
    ActivityLevel, ContactInfo, Entity, EntityId, EntityKind, FreezeReport, IntentId,
    IntentRegistration, IntentStatus, PermitActionKind, PermitActionRecord, PermitApplication,
    PermitClassification, PermitId, PermitStatus, PermitStore, PermitWorkflow, Profile,
    ReviewMetadata, ReviewRequest, SiteLocation, StaffUnit, UserId, UserRole,
};
use crate::workflows::{FixedClock, RepositoryError};

pub(crate) const APPLICANT: &str = "applicant-1";
pub(crate) const REGISTRY: &str = "registry-officer";
pub(crate) const COMPLIANCE: &str = "compliance-officer";
pub(crate) const FINANCE: &str = "finance-officer";
pub(crate) const DIRECTOR: &str = "managing-director";
pub(crate) const ADMIN: &str = "admin-1";
pub(crate) const SUPER_ADMIN: &str = "super-admin-1";
pub(crate) const ENTITY: &str = "ent-kumul";

pub(crate) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0)
        .single()
        .expect("valid instant")
}

pub(crate) fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(now()))
}

pub(crate) fn user(id: &str) -> UserId {
    UserId(id.to_string())
}

pub(crate) fn profile(id: &str, name: &str, role: UserRole, unit: Option<StaffUnit>) -> Profile {
    Profile {
        user_id: user(id),
        full_name: name.to_string(),
        email: format!("{id}@cepa.gov.pg"),
        role,
        unit,
        position: None,
    }
}

pub(crate) fn staff_profiles() -> Vec<Profile> {
    vec![
        profile(APPLICANT, "Mary Kauc", UserRole::Public, None),
        profile(REGISTRY, "Kila Registry", UserRole::Officer, Some(StaffUnit::Registry)),
        profile(
            COMPLIANCE,
            "Tau Compliance",
            UserRole::Officer,
            Some(StaffUnit::Compliance),
        ),
        profile(FINANCE, "Ruth Finance", UserRole::Officer, Some(StaffUnit::Finance)),
        profile(
            DIRECTOR,
            "Gabriel MD",
            UserRole::Director,
            Some(StaffUnit::ManagingDirector),
        ),
        profile(ADMIN, "Ops Admin", UserRole::Admin, None),
        profile(SUPER_ADMIN, "Root Admin", UserRole::SuperAdmin, None),
    ]
}

pub(crate) fn entity() -> Entity {
    Entity {
        id: EntityId(ENTITY.to_string()),
        owner: user(APPLICANT),
        name: "Kumul Minerals Ltd".to_string(),
        kind: EntityKind::Company,
        contact: ContactInfo {
            email: Some("info@kumul.pg".to_string()),
            phone: None,
            address: Some("Lae, Morobe".to_string()),
        },
        suspended: false,
        suspension_reason: None,
        created_at: now(),
    }
}

pub(crate) fn intent(id: &str, status: IntentStatus) -> IntentRegistration {
    IntentRegistration {
        id: IntentId(id.to_string()),
        entity_id: EntityId(ENTITY.to_string()),
        applicant: user(APPLICANT),
        activity_description: "Alluvial gold mining, Watut River".to_string(),
        activity_level: ActivityLevel::Two,
        site: SiteLocation {
            province: "Morobe".to_string(),
            district: Some("Bulolo".to_string()),
            description: None,
        },
        existing_permit_id: None,
        status,
        review: ReviewMetadata::default(),
        frozen: false,
        created_at: now(),
    }
}

pub(crate) fn permit(id: &str, status: PermitStatus) -> PermitApplication {
    PermitApplication {
        id: PermitId(id.to_string()),
        entity_id: EntityId(ENTITY.to_string()),
        applicant: user(APPLICANT),
        intent_id: Some(IntentId("int-approved".to_string())),
        title: "Watut tailings discharge".to_string(),
        permit_type: "Water Discharge".to_string(),
        classification: PermitClassification {
            category: "Mining".to_string(),
            subcategory: Some("Alluvial".to_string()),
        },
        activity_level: ActivityLevel::Two,
        status,
        approval_date: None,
        permit_number: None,
        review: ReviewMetadata::default(),
        frozen: false,
        created_at: now(),
    }
}

pub(crate) fn action(kind: PermitActionKind, id: &str, permits: &[&str]) -> PermitActionRecord {
    PermitActionRecord {
        id: id.to_string(),
        kind,
        permit_ids: permits
            .iter()
            .map(|permit| PermitId(permit.to_string()))
            .collect(),
    }
}

/// Store with staff profiles and one registered entity.
pub(crate) fn seeded_store() -> InMemoryPermitStore {
    let store = InMemoryPermitStore::default();
    for profile in staff_profiles() {
        store.insert_profile(profile).expect("seed profile");
    }
    store.insert_entity(entity()).expect("seed entity");
    store
}

pub(crate) fn review(reviewer: &str, status: &str, notes: &str) -> ReviewRequest {
    ReviewRequest {
        reviewer_id: user(reviewer),
        status: status.to_string(),
        notes: notes.to_string(),
        attachments: Vec::new(),
    }
}

pub(crate) type MemoryWorkflow = PermitWorkflow<InMemoryPermitStore, InMemoryNotificationCenter>;

pub(crate) fn build_workflow() -> (
    Arc<MemoryWorkflow>,
    Arc<InMemoryPermitStore>,
    Arc<InMemoryNotificationCenter>,
) {
    let store = Arc::new(seeded_store());
    let center = Arc::new(InMemoryNotificationCenter::default());
    let workflow = Arc::new(PermitWorkflow::new(
        store.clone(),
        center.clone(),
        &WorkflowConfig::default(),
        fixed_clock(),
    ));
    (workflow, store, center)
}

pub(crate) async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// Every call fails, proving that a code path never touched storage.
pub(crate) struct UnavailableStore;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("offline".to_string()))
}

impl PermitStore for UnavailableStore {
    fn insert_entity(&self, _entity: Entity) -> Result<Entity, RepositoryError> {
        offline()
    }

    fn fetch_entity(&self, _id: &EntityId) -> Result<Option<Entity>, RepositoryError> {
        offline()
    }

    fn fetch_profile(&self, _id: &UserId) -> Result<Option<Profile>, RepositoryError> {
        offline()
    }

    fn update_profile(&self, _profile: Profile) -> Result<(), RepositoryError> {
        offline()
    }

    fn insert_intent(
        &self,
        _intent: IntentRegistration,
    ) -> Result<IntentRegistration, RepositoryError> {
        offline()
    }

    fn update_intent(&self, _intent: IntentRegistration) -> Result<(), RepositoryError> {
        offline()
    }

    fn fetch_intent(&self, _id: &IntentId) -> Result<Option<IntentRegistration>, RepositoryError> {
        offline()
    }

    fn list_intents(&self) -> Result<Vec<IntentRegistration>, RepositoryError> {
        offline()
    }

    fn insert_permit(
        &self,
        _permit: PermitApplication,
    ) -> Result<PermitApplication, RepositoryError> {
        offline()
    }

    fn update_permit(&self, _permit: PermitApplication) -> Result<(), RepositoryError> {
        offline()
    }

    fn fetch_permit(&self, _id: &PermitId) -> Result<Option<PermitApplication>, RepositoryError> {
        offline()
    }

    fn list_permits(&self) -> Result<Vec<PermitApplication>, RepositoryError> {
        offline()
    }

    fn fetch_permit_action(
        &self,
        _kind: PermitActionKind,
        _id: &str,
    ) -> Result<Option<PermitActionRecord>, RepositoryError> {
        offline()
    }

    fn set_entity_frozen(
        &self,
        _id: &EntityId,
        _frozen: bool,
        _reason: Option<&str>,
    ) -> Result<FreezeReport, RepositoryError> {
        offline()
    }
}

#[derive(Default)]
pub(crate) struct FailingPublisher;

impl NotificationPublisher for FailingPublisher {
    fn publish(&self, _notification: Notification) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp relay down".to_string()))
    }

    fn for_user(&self, _user_id: &UserId) -> Result<Vec<Notification>, NotificationError> {
        Ok(Vec::new())
    }

    fn mark_read(&self, id: &NotificationId) -> Result<(), NotificationError> {
        Err(NotificationError::NotFound(id.clone()))
    }
}
