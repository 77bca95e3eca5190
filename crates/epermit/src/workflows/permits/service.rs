use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Datelike;
use serde::Deserialize;
use tracing::{info, warn};

use super::domain::{
    AttachmentRef, IntentId, IntentRegistration, IntentStatus, PermitApplication, PermitId,
    PermitStatus, Profile, TransitionRecord, UserId,
};
use super::policy::{authorize, ReviewStatus, Reviewable, TransitionDenied};
use super::repository::PermitStore;
use crate::config::WorkflowConfig;
use crate::workflows::notifications::{
    review_notice, Notification, NotificationError, NotificationId, NotificationPublisher,
    NotificationTone,
};
use crate::workflows::{Clock, RepositoryError, SystemClock};

static NOTIFICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static PERMIT_NUMBER_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_notification_id() -> NotificationId {
    let id = NOTIFICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    NotificationId(format!("ntf-{id:06}"))
}

fn next_permit_number(year: i32) -> String {
    let id = PERMIT_NUMBER_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("CEPA-{year}-{id:05}")
}

/// Reviewer decision as submitted from the review forms.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRequest {
    pub reviewer_id: UserId,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub attachments: Vec<AttachmentRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewPolicy {
    pub notes_required: bool,
}

impl Default for ReviewPolicy {
    fn default() -> Self {
        Self {
            notes_required: true,
        }
    }
}

impl From<&WorkflowConfig> for ReviewPolicy {
    fn from(config: &WorkflowConfig) -> Self {
        Self {
            notes_required: config.review_notes_required,
        }
    }
}

struct Decision<S> {
    status: S,
    notes: Option<String>,
    attachments: Vec<AttachmentRef>,
}

/// Reviewer-driven status changes on intents and permit applications.
pub struct ReviewService<S, N> {
    store: Arc<S>,
    notifications: Arc<N>,
    clock: Arc<dyn Clock>,
    policy: ReviewPolicy,
}

impl<S, N> ReviewService<S, N>
where
    S: PermitStore + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(store: Arc<S>, notifications: Arc<N>, policy: ReviewPolicy) -> Self {
        Self::with_clock(store, notifications, policy, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<S>,
        notifications: Arc<N>,
        policy: ReviewPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            notifications,
            clock,
            policy,
        }
    }

    pub fn review_intent(
        &self,
        id: &IntentId,
        request: ReviewRequest,
    ) -> Result<IntentRegistration, ReviewError> {
        let decision: Decision<IntentStatus> =
            self.validate(request.status, request.notes, request.attachments)?;
        let reviewer = self.reviewer(&request.reviewer_id)?;
        let mut intent = self
            .store
            .fetch_intent(id)?
            .ok_or_else(|| ReviewError::NotFound {
                subject: IntentRegistration::SUBJECT,
                id: id.0.clone(),
            })?;

        self.transition(&mut intent, &reviewer, decision)?;
        self.store.update_intent(intent.clone())?;
        info!(
            intent = %intent.id,
            status = intent.status.label(),
            reviewer = %reviewer.user_id,
            "intent reviewed"
        );

        self.notify(&intent, &reviewer)?;
        Ok(intent)
    }

    pub fn review_permit(
        &self,
        id: &PermitId,
        request: ReviewRequest,
    ) -> Result<PermitApplication, ReviewError> {
        let decision: Decision<PermitStatus> =
            self.validate(request.status, request.notes, request.attachments)?;
        let reviewer = self.reviewer(&request.reviewer_id)?;
        let mut permit = self
            .store
            .fetch_permit(id)?
            .ok_or_else(|| ReviewError::NotFound {
                subject: PermitApplication::SUBJECT,
                id: id.0.clone(),
            })?;

        self.transition(&mut permit, &reviewer, decision)?;
        if permit.status == PermitStatus::Approved {
            let today = self.clock.today();
            permit.approval_date = Some(today);
            permit.permit_number = Some(next_permit_number(today.year()));
        }
        self.store.update_permit(permit.clone())?;
        info!(
            permit = %permit.id,
            status = permit.status.label(),
            reviewer = %reviewer.user_id,
            "permit reviewed"
        );

        self.notify(&permit, &reviewer)?;
        Ok(permit)
    }

    fn validate<T: ReviewStatus>(
        &self,
        status: String,
        notes: String,
        attachments: Vec<AttachmentRef>,
    ) -> Result<Decision<T>, ReviewError> {
        let status = status.trim();
        if status.is_empty() {
            return Err(ReviewError::MissingDecision);
        }

        let notes = notes.trim();
        if notes.is_empty() && self.policy.notes_required {
            return Err(ReviewError::MissingNotes);
        }

        let status =
            T::parse(status).ok_or_else(|| ReviewError::UnknownStatus(status.to_string()))?;

        Ok(Decision {
            status,
            notes: (!notes.is_empty()).then(|| notes.to_string()),
            attachments,
        })
    }

    fn reviewer(&self, id: &UserId) -> Result<Profile, ReviewError> {
        self.store
            .fetch_profile(id)?
            .ok_or_else(|| ReviewError::UnknownReviewer(id.clone()))
    }

    fn transition<R: Reviewable>(
        &self,
        record: &mut R,
        reviewer: &Profile,
        decision: Decision<R::Status>,
    ) -> Result<(), ReviewError> {
        if record.is_frozen() {
            return Err(ReviewError::Frozen {
                subject: R::SUBJECT,
                id: record.record_id(),
            });
        }

        let from = record.status();
        authorize(reviewer, from, decision.status)?;

        let now = self.clock.now();
        record.set_status(decision.status);
        let review = record.review_mut();
        review.notes = decision.notes.clone();
        review.reviewed_by = Some(reviewer.user_id.clone());
        review.reviewed_at = Some(now);
        review
            .attachments
            .extend(decision.attachments.into_iter().map(|mut attachment| {
                attachment.uploaded_at.get_or_insert(now);
                attachment
            }));
        review.history.push(TransitionRecord {
            from,
            to: decision.status,
            actor: reviewer.user_id.clone(),
            at: now,
            notes: decision.notes,
        });

        Ok(())
    }

    /// The status write has already landed; a failure here is reported, never compensated.
    fn notify<R: Reviewable>(&self, record: &R, reviewer: &Profile) -> Result<(), ReviewError> {
        let status = record.status().label();
        let (title, message) = review_notice(
            R::SUBJECT,
            record.headline(),
            status,
            reviewer.display_name(),
            record.review().notes.as_deref(),
        );

        let notification = Notification {
            id: next_notification_id(),
            user_id: record.applicant().clone(),
            title,
            message,
            tone: NotificationTone::for_status(status),
            subject: record.notification_subject(),
            read: false,
            created_at: self.clock.now(),
        };

        self.notifications.publish(notification).map_err(|source| {
            warn!(
                record = %record.record_id(),
                error = %source,
                "review saved but notification failed"
            );
            ReviewError::NotificationFailed {
                subject: R::SUBJECT,
                id: record.record_id(),
                source,
            }
        })
    }
}

/// Error raised by the review workflow.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("a review decision (status) is required")]
    MissingDecision,
    #[error("review notes are required")]
    MissingNotes,
    #[error("unknown review status '{0}'")]
    UnknownStatus(String),
    #[error("reviewer {0} not found")]
    UnknownReviewer(UserId),
    #[error("{subject} {id} not found")]
    NotFound { subject: &'static str, id: String },
    #[error("{subject} {id} is frozen while its entity is suspended")]
    Frozen { subject: &'static str, id: String },
    #[error(transparent)]
    Denied(#[from] TransitionDenied),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("{subject} {id} was updated but the applicant notification failed: {source}")]
    NotificationFailed {
        subject: &'static str,
        id: String,
        source: NotificationError,
    },
}

impl ReviewError {
    /// Validation failures are raised before any store call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ReviewError::MissingDecision | ReviewError::MissingNotes | ReviewError::UnknownStatus(_)
        )
    }
}
