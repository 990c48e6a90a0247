//! API middleware.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use gridwatch_core::{NotificationService, OutageReportService, ReportExporter};
use gridwatch_db::repositories::UserRepository;

use crate::streaming::StreamingState;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub report_service: OutageReportService,
    pub notification_service: NotificationService,
    pub exporter: ReportExporter,
    pub user_repo: UserRepository,
    pub streaming: StreamingState,
}

/// Authentication middleware.
///
/// Resolves a `Bearer` token to a user and stores the user model in the
/// request extensions. Requests without a valid token pass through
/// unauthenticated; protected handlers reject them via the extractor.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.user_repo.find_by_token(token).await {
            Ok(Some(user)) => {
                req.extensions_mut().insert(user);
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(error = %err, "token lookup failed");
            }
        }
    }

    next.run(req).await
}
