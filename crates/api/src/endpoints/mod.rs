//! API endpoints.

mod notifications;
mod outages;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/outages", outages::router())
        .nest("/notifications", notifications::router())
}
