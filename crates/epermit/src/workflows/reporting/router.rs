use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use super::{ExportDataset, PermitAnalytics, ReportingService};
use crate::error::AppError;
use crate::workflows::inspections::InspectionLedger;
use crate::workflows::permits::PermitStore;

type ReportingState<S, L> = State<Arc<ReportingService<S, L>>>;

pub fn reporting_router<S, L>(service: Arc<ReportingService<S, L>>) -> Router
where
    S: PermitStore + 'static,
    L: InspectionLedger + 'static,
{
    Router::new()
        .route("/api/v1/reports/summary", get(summary_handler::<S, L>))
        .route(
            "/api/v1/reports/export/:dataset",
            get(export_handler::<S, L>),
        )
        .with_state(service)
}

pub(crate) async fn summary_handler<S, L>(
    State(service): ReportingState<S, L>,
) -> Result<Json<PermitAnalytics>, AppError>
where
    S: PermitStore + 'static,
    L: InspectionLedger + 'static,
{
    Ok(Json(service.summary()?))
}

pub(crate) async fn export_handler<S, L>(
    State(service): ReportingState<S, L>,
    Path(dataset): Path<String>,
) -> Result<Response, AppError>
where
    S: PermitStore + 'static,
    L: InspectionLedger + 'static,
{
    let dataset = ExportDataset::parse(&dataset)?;
    let body = service.export(dataset)?;
    let disposition = format!("attachment; filename=\"{}\"", dataset.file_name());
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
