//! Event publisher service.
//!
//! Provides an abstraction for publishing real-time outage events.
//! The actual implementation lives in the api crate (WebSocket broadcast).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gridwatch_common::AppResult;
use gridwatch_db::entities::outage_report::{self, OutageStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Map marker color for a report status.
pub fn marker_color(status: OutageStatus) -> &'static str {
    match status {
        OutageStatus::Pending => "red",
        OutageStatus::InProgress => "orange",
        OutageStatus::Resolved => "green",
    }
}

/// Map-ready projection of an outage report, sent to subscribers when a
/// report is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutageProjection {
    pub id: String,
    pub title: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_name: Option<String>,
    pub status: OutageStatus,
    pub reported_at: DateTime<Utc>,
    pub marker_color: String,
}

impl From<&outage_report::Model> for OutageProjection {
    fn from(report: &outage_report::Model) -> Self {
        Self {
            id: report.id.clone(),
            title: report.title.clone(),
            latitude: report.latitude,
            longitude: report.longitude,
            location_name: report.location_name.clone(),
            status: report.status,
            reported_at: report.reported_at,
            marker_color: marker_color(report.status).to_string(),
        }
    }
}

/// Trait for publishing real-time outage events.
///
/// This allows the core services to publish events without directly
/// depending on the streaming implementation.
#[async_trait]
pub trait OutageEventPublisher: Send + Sync {
    /// Publish a report created event.
    async fn publish_created(&self, projection: OutageProjection) -> AppResult<()>;

    /// Publish a status changed event.
    async fn publish_status_changed(
        &self,
        id: &str,
        status: OutageStatus,
        resolved_at: Option<DateTime<Utc>>,
    ) -> AppResult<()>;

    /// Publish a report deleted event.
    async fn publish_deleted(&self, id: &str) -> AppResult<()>;
}

/// A no-op implementation for testing or when streaming is disabled.
#[derive(Clone, Default)]
pub struct NoOpEventPublisher;

#[async_trait]
impl OutageEventPublisher for NoOpEventPublisher {
    async fn publish_created(&self, _projection: OutageProjection) -> AppResult<()> {
        Ok(())
    }

    async fn publish_status_changed(
        &self,
        _id: &str,
        _status: OutageStatus,
        _resolved_at: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        Ok(())
    }

    async fn publish_deleted(&self, _id: &str) -> AppResult<()> {
        Ok(())
    }
}

/// Wrapper for boxed publisher trait object.
pub type EventPublisherService = Arc<dyn OutageEventPublisher>;
