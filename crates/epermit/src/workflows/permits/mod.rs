//! Entity registration, intent and permit applications, and the multi-unit review workflow.

pub mod administration;
pub mod domain;
pub mod policy;
pub mod registration;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
pub(crate) mod tests;

use std::sync::Arc;

pub use administration::{AdministrationError, AdministrationService, RoleUpdate};
pub use domain::{
    ActivityLevel, AttachmentRef, ContactInfo, DocumentCategory, Entity, EntityId, EntityKind,
    FreezeReport, IntentId, IntentRegistration, IntentStatus, PermitActionKind,
    PermitActionRecord, PermitApplication, PermitClassification, PermitId, PermitStatus, Profile,
    ReviewMetadata, SiteLocation, StaffUnit, TransitionRecord, UserId, UserRole,
};
pub use policy::{ReviewStatus, Reviewable, TransitionDenied};
pub use registration::{
    ApplicantError, ApplicantService, EntityRegistration, IntentSubmission, PermitDraftRequest,
};
pub use repository::PermitStore;
pub use router::permit_router;
pub use service::{ReviewError, ReviewPolicy, ReviewRequest, ReviewService};

use crate::config::WorkflowConfig;
use crate::workflows::notifications::{
    Notification, NotificationError, NotificationId, NotificationPublisher,
};
use crate::workflows::Clock;

/// Applicant, reviewer, and admin services sharing one store and notification sink.
pub struct PermitWorkflow<S, N> {
    pub applicants: ApplicantService<S>,
    pub reviews: ReviewService<S, N>,
    pub administration: AdministrationService<S>,
    notifications: Arc<N>,
}

impl<S, N> PermitWorkflow<S, N>
where
    S: PermitStore + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(
        store: Arc<S>,
        notifications: Arc<N>,
        config: &WorkflowConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            applicants: ApplicantService::with_clock(store.clone(), clock.clone()),
            reviews: ReviewService::with_clock(
                store.clone(),
                notifications.clone(),
                ReviewPolicy::from(config),
                clock,
            ),
            administration: AdministrationService::new(store),
            notifications,
        }
    }

    pub fn notifications_for(&self, user: &UserId) -> Result<Vec<Notification>, NotificationError> {
        let mut notifications = self.notifications.for_user(user)?;
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }

    pub fn mark_notification_read(&self, id: &NotificationId) -> Result<(), NotificationError> {
        self.notifications.mark_read(id)
    }
}
