use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use super::common::*;
use crate::workflows::reporting::{reporting_router, ExportDataset, ExportError};

#[test]
fn dataset_names_accept_a_csv_suffix() {
    assert_eq!(ExportDataset::parse("permits").unwrap(), ExportDataset::Permits);
    assert_eq!(
        ExportDataset::parse("Invoices.csv").unwrap(),
        ExportDataset::Invoices
    );
    assert!(matches!(
        ExportDataset::parse("payroll"),
        Err(ExportError::UnknownDataset(name)) if name == "payroll"
    ));
}

#[test]
fn empty_datasets_export_an_empty_body() {
    let fixture = empty_fixture();
    assert_eq!(fixture.reporting.export(ExportDataset::Invoices).unwrap(), "");
}

#[test]
fn inspection_export_has_one_row_per_inspection() {
    let fixture = busy_fixture();
    let csv = fixture.reporting.export(ExportDataset::Inspections).unwrap();
    let mut lines = csv.lines();

    let header = lines.next().expect("header row");
    assert!(header.starts_with("id,permit_id,intent_id,entity_id,source_category"));
    assert!(header.ends_with("total_travel_cost"));

    let rows: Vec<&str> = lines.collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[0].contains("Permit Renewal,ren-1"));
    assert!(rows[0].ends_with(",590"));
    assert!(rows.iter().any(|row| row.contains(",cancelled,")));
}

#[test]
fn invoice_export_reports_payment_state() {
    let fixture = busy_fixture();
    let csv = fixture.reporting.export(ExportDataset::Invoices).unwrap();
    let rows: Vec<&str> = csv.lines().skip(1).collect();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows.iter().filter(|row| row.contains(",paid,")).count(), 1);
    assert_eq!(rows.iter().filter(|row| row.contains(",unpaid,")).count(), 2);
}

#[tokio::test]
async fn export_route_serves_csv_attachments() {
    let fixture = busy_fixture();
    let router = reporting_router(fixture.reporting.clone());

    let response = router
        .clone()
        .oneshot(
            Request::get("/api/v1/reports/export/permits.csv")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"permits.csv\""
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = String::from_utf8(bytes.to_vec()).unwrap();
    assert_eq!(body.lines().count(), 3);

    let response = router
        .oneshot(
            Request::get("/api/v1/reports/export/payroll")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn summary_route_serializes_money_as_strings() {
    let fixture = busy_fixture();
    let response = reporting_router(fixture.reporting.clone())
        .oneshot(
            Request::get("/api/v1/reports/summary")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["total_travel_cost"], "690");
    assert_eq!(body["invoices"]["issued"], 3);
    assert_eq!(body["permits_by_activity_level"]["3"], 1);
}
