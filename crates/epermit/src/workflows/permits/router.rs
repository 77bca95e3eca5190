use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::administration::{AdministrationError, RoleUpdate};
use super::domain::{EntityId, IntentId, PermitId, UserId};
use super::policy::TransitionDenied;
use super::registration::{
    ApplicantError, EntityRegistration, IntentSubmission, PermitDraftRequest,
};
use super::repository::PermitStore;
use super::service::{ReviewError, ReviewRequest};
use super::PermitWorkflow;
use crate::workflows::notifications::{NotificationError, NotificationId, NotificationPublisher};

type WorkflowState<S, N> = State<Arc<PermitWorkflow<S, N>>>;

/// Router exposing applicant, reviewer, and admin endpoints.
pub fn permit_router<S, N>(workflow: Arc<PermitWorkflow<S, N>>) -> Router
where
    S: PermitStore + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route("/api/v1/entities", post(register_entity_handler::<S, N>))
        .route(
            "/api/v1/entities/:entity_id/suspend",
            post(suspend_entity_handler::<S, N>),
        )
        .route(
            "/api/v1/entities/:entity_id/activate",
            post(activate_entity_handler::<S, N>),
        )
        .route(
            "/api/v1/profiles/:user_id/role",
            post(update_role_handler::<S, N>),
        )
        .route("/api/v1/intents", post(register_intent_handler::<S, N>))
        .route("/api/v1/intents/:intent_id", get(intent_handler::<S, N>))
        .route(
            "/api/v1/intents/:intent_id/review",
            post(review_intent_handler::<S, N>),
        )
        .route("/api/v1/permits", post(create_permit_handler::<S, N>))
        .route("/api/v1/permits/:permit_id", get(permit_handler::<S, N>))
        .route(
            "/api/v1/permits/:permit_id/submit",
            post(submit_permit_handler::<S, N>),
        )
        .route(
            "/api/v1/permits/:permit_id/review",
            post(review_permit_handler::<S, N>),
        )
        .route(
            "/api/v1/users/:user_id/notifications",
            get(notifications_handler::<S, N>),
        )
        .route(
            "/api/v1/notifications/:notification_id/read",
            post(mark_read_handler::<S, N>),
        )
        .with_state(workflow)
}

#[derive(Debug, Deserialize)]
pub(crate) struct SuspendPayload {
    pub(crate) actor_id: UserId,
    #[serde(default)]
    pub(crate) reason: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActorPayload {
    pub(crate) actor_id: UserId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RoleUpdatePayload {
    pub(crate) actor_id: UserId,
    #[serde(flatten)]
    pub(crate) update: RoleUpdate,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitPayload {
    pub(crate) applicant: UserId,
}

pub(crate) async fn register_entity_handler<S, N>(
    State(workflow): WorkflowState<S, N>,
    Json(request): Json<EntityRegistration>,
) -> Response
where
    S: PermitStore + 'static,
    N: NotificationPublisher + 'static,
{
    match workflow.applicants.register_entity(request) {
        Ok(entity) => (StatusCode::CREATED, Json(entity)).into_response(),
        Err(err) => applicant_error_response(err),
    }
}

pub(crate) async fn suspend_entity_handler<S, N>(
    State(workflow): WorkflowState<S, N>,
    Path(entity_id): Path<String>,
    Json(payload): Json<SuspendPayload>,
) -> Response
where
    S: PermitStore + 'static,
    N: NotificationPublisher + 'static,
{
    let entity_id = EntityId(entity_id);
    match workflow
        .administration
        .suspend_entity(&entity_id, &payload.actor_id, &payload.reason)
    {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => administration_error_response(err),
    }
}

pub(crate) async fn activate_entity_handler<S, N>(
    State(workflow): WorkflowState<S, N>,
    Path(entity_id): Path<String>,
    Json(payload): Json<ActorPayload>,
) -> Response
where
    S: PermitStore + 'static,
    N: NotificationPublisher + 'static,
{
    let entity_id = EntityId(entity_id);
    match workflow
        .administration
        .activate_entity(&entity_id, &payload.actor_id)
    {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => administration_error_response(err),
    }
}

pub(crate) async fn update_role_handler<S, N>(
    State(workflow): WorkflowState<S, N>,
    Path(user_id): Path<String>,
    Json(payload): Json<RoleUpdatePayload>,
) -> Response
where
    S: PermitStore + 'static,
    N: NotificationPublisher + 'static,
{
    let target = UserId(user_id);
    match workflow
        .administration
        .update_staff_role(&payload.actor_id, &target, payload.update)
    {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(err) => administration_error_response(err),
    }
}

pub(crate) async fn register_intent_handler<S, N>(
    State(workflow): WorkflowState<S, N>,
    Json(submission): Json<IntentSubmission>,
) -> Response
where
    S: PermitStore + 'static,
    N: NotificationPublisher + 'static,
{
    match workflow.applicants.register_intent(submission) {
        Ok(intent) => (StatusCode::CREATED, Json(intent)).into_response(),
        Err(err) => applicant_error_response(err),
    }
}

pub(crate) async fn intent_handler<S, N>(
    State(workflow): WorkflowState<S, N>,
    Path(intent_id): Path<String>,
) -> Response
where
    S: PermitStore + 'static,
    N: NotificationPublisher + 'static,
{
    match workflow.applicants.intent(&IntentId(intent_id)) {
        Ok(intent) => (StatusCode::OK, Json(intent)).into_response(),
        Err(err) => applicant_error_response(err),
    }
}

pub(crate) async fn review_intent_handler<S, N>(
    State(workflow): WorkflowState<S, N>,
    Path(intent_id): Path<String>,
    Json(request): Json<ReviewRequest>,
) -> Response
where
    S: PermitStore + 'static,
    N: NotificationPublisher + 'static,
{
    match workflow.reviews.review_intent(&IntentId(intent_id), request) {
        Ok(intent) => (StatusCode::OK, Json(intent)).into_response(),
        Err(err) => review_error_response(err),
    }
}

pub(crate) async fn create_permit_handler<S, N>(
    State(workflow): WorkflowState<S, N>,
    Json(request): Json<PermitDraftRequest>,
) -> Response
where
    S: PermitStore + 'static,
    N: NotificationPublisher + 'static,
{
    match workflow.applicants.create_permit(request) {
        Ok(permit) => (StatusCode::CREATED, Json(permit)).into_response(),
        Err(err) => applicant_error_response(err),
    }
}

pub(crate) async fn permit_handler<S, N>(
    State(workflow): WorkflowState<S, N>,
    Path(permit_id): Path<String>,
) -> Response
where
    S: PermitStore + 'static,
    N: NotificationPublisher + 'static,
{
    match workflow.applicants.permit(&PermitId(permit_id)) {
        Ok(permit) => (StatusCode::OK, Json(permit)).into_response(),
        Err(err) => applicant_error_response(err),
    }
}

pub(crate) async fn submit_permit_handler<S, N>(
    State(workflow): WorkflowState<S, N>,
    Path(permit_id): Path<String>,
    Json(payload): Json<SubmitPayload>,
) -> Response
where
    S: PermitStore + 'static,
    N: NotificationPublisher + 'static,
{
    match workflow
        .applicants
        .submit_permit(&PermitId(permit_id), &payload.applicant)
    {
        Ok(permit) => (StatusCode::OK, Json(permit)).into_response(),
        Err(err) => applicant_error_response(err),
    }
}

pub(crate) async fn review_permit_handler<S, N>(
    State(workflow): WorkflowState<S, N>,
    Path(permit_id): Path<String>,
    Json(request): Json<ReviewRequest>,
) -> Response
where
    S: PermitStore + 'static,
    N: NotificationPublisher + 'static,
{
    match workflow.reviews.review_permit(&PermitId(permit_id), request) {
        Ok(permit) => (StatusCode::OK, Json(permit)).into_response(),
        Err(err) => review_error_response(err),
    }
}

pub(crate) async fn notifications_handler<S, N>(
    State(workflow): WorkflowState<S, N>,
    Path(user_id): Path<String>,
) -> Response
where
    S: PermitStore + 'static,
    N: NotificationPublisher + 'static,
{
    match workflow.notifications_for(&UserId(user_id)) {
        Ok(notifications) => (StatusCode::OK, Json(notifications)).into_response(),
        Err(err) => notification_error_response(err),
    }
}

pub(crate) async fn mark_read_handler<S, N>(
    State(workflow): WorkflowState<S, N>,
    Path(notification_id): Path<String>,
) -> Response
where
    S: PermitStore + 'static,
    N: NotificationPublisher + 'static,
{
    match workflow.mark_notification_read(&NotificationId(notification_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => notification_error_response(err),
    }
}

fn error_body(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

pub(crate) fn review_error_response(err: ReviewError) -> Response {
    let status = match &err {
        ReviewError::MissingDecision | ReviewError::MissingNotes | ReviewError::UnknownStatus(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ReviewError::UnknownReviewer(_) => StatusCode::FORBIDDEN,
        ReviewError::NotFound { .. } => StatusCode::NOT_FOUND,
        ReviewError::Frozen { .. } => StatusCode::CONFLICT,
        ReviewError::Denied(TransitionDenied::Forbidden { .. }) => StatusCode::FORBIDDEN,
        ReviewError::Denied(_) => StatusCode::CONFLICT,
        ReviewError::Repository(err) => err.status_code(),
        ReviewError::NotificationFailed { .. } => {
            let payload = json!({
                "error": err.to_string(),
                "status_saved": true,
            });
            return (StatusCode::BAD_GATEWAY, Json(payload)).into_response();
        }
    };
    error_body(status, err.to_string())
}

pub(crate) fn applicant_error_response(err: ApplicantError) -> Response {
    let status = match &err {
        ApplicantError::MissingField(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ApplicantError::EntityNotFound(_)
        | ApplicantError::IntentNotFound(_)
        | ApplicantError::PermitNotFound(_) => StatusCode::NOT_FOUND,
        ApplicantError::NotOwner(_) => StatusCode::FORBIDDEN,
        ApplicantError::EntitySuspended(_)
        | ApplicantError::IntentNotApproved { .. }
        | ApplicantError::NotDraft { .. } => StatusCode::CONFLICT,
        ApplicantError::Repository(err) => err.status_code(),
    };
    error_body(status, err.to_string())
}

pub(crate) fn administration_error_response(err: AdministrationError) -> Response {
    let status = match &err {
        AdministrationError::MissingReason => StatusCode::UNPROCESSABLE_ENTITY,
        AdministrationError::Forbidden(_) | AdministrationError::SelfRoleChange => {
            StatusCode::FORBIDDEN
        }
        AdministrationError::ProfileNotFound(_) | AdministrationError::EntityNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        AdministrationError::AlreadySuspended(_) | AdministrationError::NotSuspended(_) => {
            StatusCode::CONFLICT
        }
        AdministrationError::Repository(err) => err.status_code(),
    };
    error_body(status, err.to_string())
}

fn notification_error_response(err: NotificationError) -> Response {
    let status = match &err {
        NotificationError::NotFound(_) => StatusCode::NOT_FOUND,
        NotificationError::Transport(_) => StatusCode::BAD_GATEWAY,
    };
    error_body(status, err.to_string())
}
