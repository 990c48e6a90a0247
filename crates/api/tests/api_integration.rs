//! API integration tests.
//!
//! These tests drive the router over a mock database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    middleware::from_fn_with_state,
};
use chrono::Utc;
use gridwatch_api::{StreamingState, middleware::{AppState, auth_middleware}, router as api_router};
use gridwatch_common::{
    GeocodingResolver, MediaStore,
    config::{GeocodingConfig, MediaConfig},
};
use gridwatch_core::{
    NoOpEventPublisher, NotificationService, OutageReportService, ReportExporter,
};
use gridwatch_db::repositories::{
    NotificationRepository, OutageReportRepository, UserRepository,
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower::ServiceExt;

type Row = BTreeMap<&'static str, sea_orm::Value>;

fn user_row(id: &str, token: &str) -> Row {
    let mut row = Row::new();
    row.insert("id", id.into());
    row.insert("username", "asha".into());
    row.insert("email", "asha@example.com".into());
    row.insert("token", token.into());
    row.insert("created_at", Utc::now().into());
    row
}

fn report_row(id: &str) -> Row {
    let mut row = Row::new();
    row.insert("id", id.into());
    row.insert("reporter_id", "u1".into());
    row.insert("title", "Feeder trip".into());
    row.insert("description", sea_orm::Value::String(None));
    row.insert("region", sea_orm::Value::String(None));
    row.insert("manual_location", sea_orm::Value::String(None));
    row.insert("latitude", sea_orm::Value::Double(None));
    row.insert("longitude", sea_orm::Value::Double(None));
    row.insert("location_name", sea_orm::Value::String(None));
    row.insert("media_url", sea_orm::Value::String(None));
    row.insert("status", "PENDING".into());
    row.insert("reported_at", Utc::now().into());
    row.insert("resolved_at", sea_orm::Value::ChronoDateTimeUtc(None));
    row
}

fn count_row(n: i64) -> Row {
    let mut row = Row::new();
    row.insert("num_items", n.into());
    row
}

fn app_over(db: DatabaseConnection) -> Router {
    let conn = Arc::new(db);
    let notification_service = NotificationService::new(
        NotificationRepository::new(conn.clone()),
        UserRepository::new(conn.clone()),
    );
    let report_service = OutageReportService::new(
        OutageReportRepository::new(conn.clone()),
        notification_service.clone(),
        GeocodingResolver::new(&GeocodingConfig::default()),
        MediaStore::new(&MediaConfig {
            root: std::env::temp_dir().join("gridwatch-api-test"),
            base_url: "/uploads".to_string(),
        }),
        Arc::new(NoOpEventPublisher),
    );
    let state = AppState {
        report_service,
        notification_service,
        exporter: ReportExporter::new(OutageReportRepository::new(conn.clone())),
        user_repo: UserRepository::new(conn),
        streaming: StreamingState::new(),
    };

    api_router()
        .layer(from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

fn authed(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, "Bearer test-token")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = app_over(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/outages")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_token_is_unauthorized() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<Row>::new()])
        .into_connection();
    let app = app_over(db);

    let response = app
        .oneshot(authed("GET", "/outages"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn lists_reports_for_authenticated_user() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user_row("u1", "test-token")]])
        .append_query_results([vec![report_row("r1"), report_row("r2")]])
        .into_connection();
    let app = app_over(db);

    let response = app
        .oneshot(authed("GET", "/outages"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["markerColor"], "red");
    assert_eq!(body[0]["status"], "PENDING");
}

#[tokio::test]
async fn summary_aggregates_counts() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user_row("u1", "test-token")]])
        .append_query_results([vec![count_row(5)]])
        .append_query_results([vec![count_row(2)]])
        .append_query_results([vec![count_row(1)]])
        .append_query_results([vec![count_row(2)]])
        .into_connection();
    let app = app_over(db);

    let response = app
        .oneshot(authed("GET", "/outages/summary"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["total"], 5);
    assert_eq!(body["pending"], 2);
    assert_eq!(body["inProgress"], 1);
    assert_eq!(body["resolved"], 2);
}

#[tokio::test]
async fn rejects_unknown_status_value() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user_row("u1", "test-token")]])
        .into_connection();
    let app = app_over(db);

    let request = Request::builder()
        .method("PUT")
        .uri("/outages/r1/status")
        .header(header::AUTHORIZATION, "Bearer test-token")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"status":"FIXED"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rejects_unsupported_export_format() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user_row("u1", "test-token")]])
        .into_connection();
    let app = app_over(db);

    let response = app
        .oneshot(authed(
            "GET",
            "/outages/generate?fromDate=2025-06-01&toDate=2025-06-30&format=csv",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn export_sets_download_headers() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user_row("u1", "test-token")]])
        .append_query_results([vec![report_row("r1")]])
        .into_connection();
    let app = app_over(db);

    let response = app
        .oneshot(authed(
            "GET",
            "/outages/generate?fromDate=2025-06-01&toDate=2025-06-30&format=excel",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"outage_report_2025-06-01_to_2025-06-30.xlsx\""
    );
}

#[tokio::test]
async fn unread_count_is_scoped_to_the_user() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user_row("u1", "test-token")]])
        .append_query_results([vec![count_row(3)]])
        .into_connection();
    let app = app_over(db);

    let response = app
        .oneshot(authed("GET", "/notifications/unread/count"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["count"], 3);
}