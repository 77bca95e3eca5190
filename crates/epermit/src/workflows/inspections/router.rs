use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{InspectionId, InspectionRequest, InvoiceId};
use super::repository::InspectionLedger;
use super::resolver::ResolveError;
use super::service::{
    InspectionFilter, InspectionProgress, InspectionService, InspectionServiceError,
    ScheduleOutcome,
};
use crate::workflows::permits::PermitStore;

type InspectionState<S, L> = State<Arc<InspectionService<S, L>>>;

/// Router for scheduling inspections and settling their invoices.
pub fn inspection_router<S, L>(service: Arc<InspectionService<S, L>>) -> Router
where
    S: PermitStore + 'static,
    L: InspectionLedger + 'static,
{
    Router::new()
        .route(
            "/api/v1/inspections",
            post(schedule_handler::<S, L>).get(list_handler::<S, L>),
        )
        .route(
            "/api/v1/inspections/:inspection_id",
            get(inspection_handler::<S, L>).delete(delete_handler::<S, L>),
        )
        .route(
            "/api/v1/inspections/:inspection_id/suspend",
            post(suspend_handler::<S, L>),
        )
        .route(
            "/api/v1/inspections/:inspection_id/reactivate",
            post(reactivate_handler::<S, L>),
        )
        .route(
            "/api/v1/inspections/:inspection_id/status",
            post(status_handler::<S, L>),
        )
        .route(
            "/api/v1/inspections/:inspection_id/invoice",
            get(invoice_handler::<S, L>),
        )
        .route(
            "/api/v1/invoices/:invoice_id/pay",
            post(pay_invoice_handler::<S, L>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SuspendPayload {
    #[serde(default)]
    pub(crate) reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusPayload {
    pub(crate) action: InspectionProgress,
}

pub(crate) async fn schedule_handler<S, L>(
    State(service): InspectionState<S, L>,
    Json(request): Json<InspectionRequest>,
) -> Response
where
    S: PermitStore + 'static,
    L: InspectionLedger + 'static,
{
    match service.schedule(request) {
        Ok(outcome @ ScheduleOutcome::Scheduled { .. }) => {
            (StatusCode::CREATED, Json(outcome)).into_response()
        }
        Ok(outcome @ ScheduleOutcome::PartialSuccess { .. }) => {
            (StatusCode::MULTI_STATUS, Json(outcome)).into_response()
        }
        Err(err) => inspection_error_response(err),
    }
}

pub(crate) async fn list_handler<S, L>(
    State(service): InspectionState<S, L>,
    Query(filter): Query<InspectionFilter>,
) -> Response
where
    S: PermitStore + 'static,
    L: InspectionLedger + 'static,
{
    match service.list(&filter) {
        Ok(inspections) => (StatusCode::OK, Json(inspections)).into_response(),
        Err(err) => inspection_error_response(err),
    }
}

pub(crate) async fn inspection_handler<S, L>(
    State(service): InspectionState<S, L>,
    Path(inspection_id): Path<String>,
) -> Response
where
    S: PermitStore + 'static,
    L: InspectionLedger + 'static,
{
    match service.inspection(&InspectionId(inspection_id)) {
        Ok(inspection) => (StatusCode::OK, Json(inspection)).into_response(),
        Err(err) => inspection_error_response(err),
    }
}

pub(crate) async fn delete_handler<S, L>(
    State(service): InspectionState<S, L>,
    Path(inspection_id): Path<String>,
) -> Response
where
    S: PermitStore + 'static,
    L: InspectionLedger + 'static,
{
    match service.delete(&InspectionId(inspection_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => inspection_error_response(err),
    }
}

pub(crate) async fn suspend_handler<S, L>(
    State(service): InspectionState<S, L>,
    Path(inspection_id): Path<String>,
    Json(payload): Json<SuspendPayload>,
) -> Response
where
    S: PermitStore + 'static,
    L: InspectionLedger + 'static,
{
    match service.suspend(&InspectionId(inspection_id), payload.reason.as_deref()) {
        Ok(inspection) => (StatusCode::OK, Json(inspection)).into_response(),
        Err(err) => inspection_error_response(err),
    }
}

pub(crate) async fn reactivate_handler<S, L>(
    State(service): InspectionState<S, L>,
    Path(inspection_id): Path<String>,
) -> Response
where
    S: PermitStore + 'static,
    L: InspectionLedger + 'static,
{
    match service.reactivate(&InspectionId(inspection_id)) {
        Ok(inspection) => (StatusCode::OK, Json(inspection)).into_response(),
        Err(err) => inspection_error_response(err),
    }
}

pub(crate) async fn status_handler<S, L>(
    State(service): InspectionState<S, L>,
    Path(inspection_id): Path<String>,
    Json(payload): Json<StatusPayload>,
) -> Response
where
    S: PermitStore + 'static,
    L: InspectionLedger + 'static,
{
    match service.update_status(&InspectionId(inspection_id), payload.action) {
        Ok(inspection) => (StatusCode::OK, Json(inspection)).into_response(),
        Err(err) => inspection_error_response(err),
    }
}

pub(crate) async fn invoice_handler<S, L>(
    State(service): InspectionState<S, L>,
    Path(inspection_id): Path<String>,
) -> Response
where
    S: PermitStore + 'static,
    L: InspectionLedger + 'static,
{
    let id = InspectionId(inspection_id);
    match service.invoice_for(&id) {
        Ok(Some(invoice)) => (StatusCode::OK, Json(invoice)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("inspection {id} has no invoice") })),
        )
            .into_response(),
        Err(err) => inspection_error_response(err),
    }
}

pub(crate) async fn pay_invoice_handler<S, L>(
    State(service): InspectionState<S, L>,
    Path(invoice_id): Path<String>,
) -> Response
where
    S: PermitStore + 'static,
    L: InspectionLedger + 'static,
{
    match service.record_payment(&InvoiceId(invoice_id)) {
        Ok(invoice) => (StatusCode::OK, Json(invoice)).into_response(),
        Err(err) => inspection_error_response(err),
    }
}

pub(crate) fn inspection_error_response(err: InspectionServiceError) -> Response {
    let status = match &err {
        InspectionServiceError::Validation(_)
        | InspectionServiceError::Resolve(ResolveError::MissingUnderlyingPermit { .. })
        | InspectionServiceError::Resolve(ResolveError::MissingReference) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        InspectionServiceError::Resolve(ResolveError::NotFound { .. })
        | InspectionServiceError::NotFound(_)
        | InspectionServiceError::InvoiceNotFound(_) => StatusCode::NOT_FOUND,
        InspectionServiceError::InvalidState { .. }
        | InspectionServiceError::InvoiceNotPayable { .. } => StatusCode::CONFLICT,
        InspectionServiceError::Resolve(ResolveError::Repository(err))
        | InspectionServiceError::Repository(err) => err.status_code(),
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}
