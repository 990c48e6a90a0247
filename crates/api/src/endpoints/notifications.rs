//! Notification inbox endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, put},
};
use gridwatch_common::AppResult;
use gridwatch_db::entities::notification::Model as NotificationModel;
use serde::Serialize;

use crate::{extractors::AuthUser, middleware::AppState};

/// Notification response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_report_id: Option<String>,
    pub created_at: String,
}

impl From<NotificationModel> for NotificationResponse {
    fn from(n: NotificationModel) -> Self {
        Self {
            id: n.id,
            title: n.title,
            message: n.message,
            is_read: n.is_read,
            related_report_id: n.related_report_id,
            created_at: n.created_at.to_rfc3339(),
        }
    }
}

/// Unread count response.
#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub count: u64,
}

/// Bulk update response.
#[derive(Debug, Serialize)]
pub struct MarkAllResponse {
    pub updated: u64,
}

/// Get the authenticated user's inbox, newest first.
async fn get_notifications(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<NotificationResponse>>> {
    let notifications = state.notification_service.get_inbox(&user.id).await?;
    Ok(Json(
        notifications
            .into_iter()
            .map(NotificationResponse::from)
            .collect(),
    ))
}

/// Get only unread notifications.
async fn get_unread(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<NotificationResponse>>> {
    let notifications = state.notification_service.get_unread(&user.id).await?;
    Ok(Json(
        notifications
            .into_iter()
            .map(NotificationResponse::from)
            .collect(),
    ))
}

/// Count unread notifications.
async fn get_unread_count(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<UnreadCountResponse>> {
    let count = state.notification_service.count_unread(&user.id).await?;
    Ok(Json(UnreadCountResponse { count }))
}

/// Mark one notification as read.
async fn mark_as_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<NotificationResponse>> {
    let notification = state
        .notification_service
        .mark_as_read(&id, &user.id)
        .await?;
    Ok(Json(NotificationResponse::from(notification)))
}

/// Mark the whole inbox as read.
async fn mark_all_as_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<MarkAllResponse>> {
    let updated = state.notification_service.mark_all_as_read(&user.id).await?;
    Ok(Json(MarkAllResponse { updated }))
}

/// Delete one notification.
async fn delete_notification(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.notification_service.delete(&id, &user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Create the notifications router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_notifications))
        .route("/unread", get(get_unread))
        .route("/unread/count", get(get_unread_count))
        .route("/read-all", put(mark_all_as_read))
        .route("/{id}/read", put(mark_as_read))
        .route("/{id}", delete(delete_notification))
}
