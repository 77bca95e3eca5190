use crate::infra::{AppState, Services};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use epermit::workflows::inspections::inspection_router;
use epermit::workflows::permits::permit_router;
use epermit::workflows::reporting::reporting_router;
use serde_json::json;
use std::sync::atomic::Ordering;

/// Permit, inspection, and reporting APIs plus the operational endpoints.
pub(crate) fn with_service_routes(services: &Services) -> Router {
    permit_router(services.permits.clone())
        .merge(inspection_router(services.inspections.clone()))
        .merge(reporting_router(services.reporting.clone()))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::{TimeZone, Utc};
    use epermit::config::WorkflowConfig;
    use epermit::workflows::permits::{Profile, StaffUnit, UserId, UserRole};
    use epermit::workflows::FixedClock;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(ready: bool) -> (Router, Services) {
        let clock = Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0)
                .single()
                .expect("valid timestamp"),
        ));
        let services = Services::in_memory(&WorkflowConfig::default(), clock);
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        let router = with_service_routes(&services).layer(Extension(state));
        (router, services)
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.expect("router responds");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    #[tokio::test]
    async fn readiness_reflects_the_flag() {
        let (router, _) = app(false);
        let (status, body) = send(
            router,
            Request::get("/ready").body(Body::empty()).expect("request builds"),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "initializing");

        let (router, _) = app(true);
        let (status, _) = send(
            router,
            Request::get("/ready").body(Body::empty()).expect("request builds"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn health_and_summary_share_one_router() {
        let (router, _) = app(true);
        let (status, body) = send(
            router.clone(),
            Request::get("/health").body(Body::empty()).expect("request builds"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = send(
            router,
            Request::get("/api/v1/reports/summary")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_travel_cost"], "0");
        assert_eq!(body["invoices"]["issued"], 0);
    }

    #[tokio::test]
    async fn registered_intents_can_be_inspected_over_http() {
        let (router, services) = app(true);
        services
            .store
            .insert_profile(Profile {
                user_id: UserId("registry".to_string()),
                full_name: "Registry Desk".to_string(),
                email: "registry@cepa.gov.pg".to_string(),
                role: UserRole::Officer,
                unit: Some(StaffUnit::Registry),
                position: None,
            })
            .expect("seed profile");

        let (status, entity) = send(
            router.clone(),
            post(
                "/api/v1/entities",
                json!({ "owner": "applicant", "name": "Hides Gas Ltd", "kind": "company" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, intent) = send(
            router.clone(),
            post(
                "/api/v1/intents",
                json!({
                    "entity_id": entity["id"],
                    "applicant": "applicant",
                    "activity_description": "Gas conditioning plant",
                    "activity_level": 3,
                    "site": { "province": "Hela" },
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, outcome) = send(
            router.clone(),
            post(
                "/api/v1/inspections",
                json!({
                    "source_id": intent["id"],
                    "category": "Intent Registration",
                    "inspection_type": "Site verification",
                    "scheduled_date": "2024-04-10",
                    "number_of_days": 2,
                    "accommodation_cost": "150",
                    "transportation_cost": "400",
                    "daily_allowance": "60",
                    "province": "Hela",
                    "requested_by": "registry",
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(outcome["invoice"]["amount"], "820");
        assert_eq!(outcome["invoice"]["payer"], "applicant");

        let (status, body) = send(
            router,
            Request::get("/api/v1/reports/summary")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["inspections_by_status"]["scheduled"], 1);
        assert_eq!(body["invoices"]["outstanding"], "820");
    }
}
