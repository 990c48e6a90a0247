//! Outage report endpoints.

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use gridwatch_common::{AppError, AppResult};
use gridwatch_core::{CreateReportInput, ExportFormat, MediaUpload, StatusSummary, marker_color};
use gridwatch_db::entities::outage_report::{Model as ReportModel, OutageStatus};
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState};

/// Outage report response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub id: String,
    pub reporter_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    pub status: OutageStatus,
    pub marker_color: String,
    pub reported_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<String>,
}

impl From<ReportModel> for ReportResponse {
    fn from(report: ReportModel) -> Self {
        Self {
            marker_color: marker_color(report.status).to_string(),
            id: report.id,
            reporter_id: report.reporter_id,
            title: report.title,
            description: report.description,
            region: report.region,
            manual_location: report.manual_location,
            latitude: report.latitude,
            longitude: report.longitude,
            location_name: report.location_name,
            media_url: report.media_url,
            status: report.status,
            reported_at: report.reported_at.to_rfc3339(),
            resolved_at: report.resolved_at.map(|at| at.to_rfc3339()),
        }
    }
}

/// The JSON `report` part of the intake form.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    pub title: String,
    pub description: Option<String>,
    pub region: Option<String>,
    pub manual_location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Status update request.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Export query parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    pub from_date: String,
    pub to_date: String,
    pub format: String,
}

/// Create a new outage report from a multipart form.
///
/// The `report` part carries the attributes as JSON; an optional `media`
/// part carries an attachment.
async fn create_report(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<ReportResponse>)> {
    let mut request: Option<CreateReportRequest> = None;
    let mut media: Option<MediaUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart data: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "report" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid multipart data: {e}")))?;
                request = Some(
                    serde_json::from_str(&text)
                        .map_err(|e| AppError::BadRequest(format!("Invalid report JSON: {e}")))?,
                );
            }
            "media" => {
                let original_name = field
                    .file_name()
                    .map_or_else(|| "unnamed".to_string(), ToString::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read media: {e}")))?;
                if !data.is_empty() {
                    media = Some(MediaUpload {
                        data: data.to_vec(),
                        original_name,
                    });
                }
            }
            _ => {}
        }
    }

    let request =
        request.ok_or_else(|| AppError::Validation("Missing report part".to_string()))?;

    let report = state
        .report_service
        .create_report(
            CreateReportInput {
                reporter_id: user.id,
                title: request.title,
                description: request.description,
                region: request.region,
                manual_location: request.manual_location,
                latitude: request.latitude,
                longitude: request.longitude,
            },
            media,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ReportResponse::from(report))))
}

/// Get every report, newest first.
async fn get_all_reports(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> AppResult<Json<Vec<ReportResponse>>> {
    let reports = state.report_service.get_all_reports().await?;
    Ok(Json(reports.into_iter().map(ReportResponse::from).collect()))
}

/// Get the authenticated user's own reports.
async fn get_my_reports(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<ReportResponse>>> {
    let reports = state.report_service.get_user_reports(&user.id).await?;
    Ok(Json(reports.into_iter().map(ReportResponse::from).collect()))
}

/// Get aggregate counts per status.
async fn get_summary(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> AppResult<Json<StatusSummary>> {
    Ok(Json(state.report_service.get_status_summary().await?))
}

/// Move a report to a new status. Status names are case insensitive.
async fn update_status(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> AppResult<Json<ReportResponse>> {
    let status: OutageStatus = req
        .status
        .parse()
        .map_err(AppError::BadRequest)?;
    let report = state.report_service.update_status(&id, status).await?;
    Ok(Json(ReportResponse::from(report)))
}

/// Delete a report and its media.
async fn delete_report(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.report_service.delete_report(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Export reports in a date range as a downloadable document.
async fn generate_export(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Query(query): Query<ExportQuery>,
) -> AppResult<Response> {
    let format: ExportFormat = query.format.parse()?;
    let document = state
        .exporter
        .export(&query.from_date, &query.to_date, format)
        .await?;

    let disposition = format!("attachment; filename=\"{}\"", document.filename);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, document.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.bytes,
    )
        .into_response())
}

/// Create the outages router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_report).get(get_all_reports))
        .route("/my", get(get_my_reports))
        .route("/summary", get(get_summary))
        .route("/generate", get(generate_export))
        .route("/{id}", delete(delete_report))
        .route("/{id}/status", put(update_status))
}
