//! Outage report service.

use crate::services::event_publisher::{EventPublisherService, OutageProjection};
use crate::services::notification::NotificationService;
use crate::services::transition;
use gridwatch_common::{AppError, AppResult, GeocodingResolver, IdGenerator, MediaStore};
use gridwatch_db::{
    entities::outage_report::{self, OutageStatus},
    repositories::OutageReportRepository,
};
use sea_orm::Set;
use serde::Serialize;

/// Input for creating a new outage report.
#[derive(Debug, Clone)]
pub struct CreateReportInput {
    pub reporter_id: String,
    pub title: String,
    pub description: Option<String>,
    pub region: Option<String>,
    pub manual_location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A media attachment received alongside a report.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub data: Vec<u8>,
    pub original_name: String,
}

/// Aggregate counts per status.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub total: u64,
    pub pending: u64,
    pub in_progress: u64,
    pub resolved: u64,
}

/// Outage report service for business logic.
#[derive(Clone)]
pub struct OutageReportService {
    report_repo: OutageReportRepository,
    notifications: NotificationService,
    geocoder: GeocodingResolver,
    media: MediaStore,
    event_publisher: EventPublisherService,
    id_gen: IdGenerator,
}

impl OutageReportService {
    #[must_use]
    pub fn new(
        report_repo: OutageReportRepository,
        notifications: NotificationService,
        geocoder: GeocodingResolver,
        media: MediaStore,
        event_publisher: EventPublisherService,
    ) -> Self {
        Self {
            report_repo,
            notifications,
            geocoder,
            media,
            event_publisher,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create and persist a new outage report.
    ///
    /// Coordinates must come in pairs. When both are present the location
    /// name is resolved through reverse geocoding; resolution failures fall
    /// back to a sentinel instead of failing the intake. A media write
    /// failure aborts the whole operation so no report references a file
    /// that was never stored.
    pub async fn create_report(
        &self,
        input: CreateReportInput,
        media: Option<MediaUpload>,
    ) -> AppResult<outage_report::Model> {
        if input.title.trim().is_empty() {
            return Err(AppError::Validation("Title must not be empty".to_string()));
        }
        if input.latitude.is_some() != input.longitude.is_some() {
            return Err(AppError::Validation(
                "Latitude and longitude must be provided together".to_string(),
            ));
        }

        let location_name = match (input.latitude, input.longitude) {
            (Some(lat), Some(lon)) => Some(self.geocoder.resolve(lat, lon).await),
            _ => None,
        };

        let media_url = match media {
            Some(upload) => Some(self.media.store(&upload.data, &upload.original_name).await?),
            None => None,
        };

        let now = chrono::Utc::now();
        let model = outage_report::ActiveModel {
            id: Set(self.id_gen.generate()),
            reporter_id: Set(input.reporter_id.clone()),
            title: Set(input.title.clone()),
            description: Set(input.description),
            region: Set(input.region),
            manual_location: Set(input.manual_location),
            latitude: Set(input.latitude),
            longitude: Set(input.longitude),
            location_name: Set(location_name),
            media_url: Set(media_url),
            status: Set(OutageStatus::Pending),
            reported_at: Set(now),
            resolved_at: Set(None),
        };

        let report = self.report_repo.insert(model).await?;

        // Broadcast after the report is durable. A publish failure is logged
        // and never surfaced to the reporter.
        if let Err(err) = self
            .event_publisher
            .publish_created(OutageProjection::from(&report))
            .await
        {
            tracing::warn!(report_id = %report.id, error = %err, "failed to publish created event");
        }

        Ok(report)
    }

    /// Move a report to a new status.
    ///
    /// Entering `Resolved` stamps the resolution time. The timestamp is kept
    /// if the report later leaves `Resolved`, so it records the most recent
    /// resolution.
    pub async fn update_status(
        &self,
        report_id: &str,
        requested: OutageStatus,
    ) -> AppResult<outage_report::Model> {
        let existing = self
            .report_repo
            .find_by_id(report_id)
            .await?
            .ok_or_else(|| AppError::ReportNotFound(report_id.to_string()))?;

        let next = transition::apply(existing.status, requested);

        let mut model: outage_report::ActiveModel = existing.clone().into();
        model.status = Set(next);
        if transition::enters_resolved(next) {
            model.resolved_at = Set(Some(chrono::Utc::now()));
        }

        let updated = self.report_repo.update(model).await?;

        if let Err(err) = self
            .event_publisher
            .publish_status_changed(&updated.id, updated.status, updated.resolved_at)
            .await
        {
            tracing::warn!(report_id = %updated.id, error = %err, "failed to publish status event");
        }

        let message = format!(
            "Your report '{}' is now {}",
            updated.title,
            updated.status.as_str()
        );
        if let Err(err) = self
            .notifications
            .notify(&updated.reporter_id, "Outage status updated", &message, Some(&updated.id))
            .await
        {
            tracing::warn!(report_id = %updated.id, error = %err, "failed to notify reporter");
        }

        Ok(updated)
    }

    /// Delete a report and its stored media.
    ///
    /// The media file is removed best effort. A missing or undeletable file
    /// is logged and does not block removal of the report row.
    pub async fn delete_report(&self, report_id: &str) -> AppResult<()> {
        let existing = self
            .report_repo
            .find_by_id(report_id)
            .await?
            .ok_or_else(|| AppError::ReportNotFound(report_id.to_string()))?;

        if let Some(url) = &existing.media_url {
            if let Err(err) = self.media.delete(url).await {
                tracing::warn!(report_id, media_url = %url, error = %err, "failed to delete media file");
            }
        }

        self.report_repo.delete(existing).await?;

        if let Err(err) = self.event_publisher.publish_deleted(report_id).await {
            tracing::warn!(report_id, error = %err, "failed to publish deleted event");
        }

        Ok(())
    }

    /// Get every report, newest first.
    pub async fn get_all_reports(&self) -> AppResult<Vec<outage_report::Model>> {
        self.report_repo.find_all().await
    }

    /// Get the reports submitted by one user, newest first.
    pub async fn get_user_reports(&self, reporter_id: &str) -> AppResult<Vec<outage_report::Model>> {
        self.report_repo.find_by_reporter(reporter_id).await
    }

    /// Count reports in total and per status.
    pub async fn get_status_summary(&self) -> AppResult<StatusSummary> {
        Ok(StatusSummary {
            total: self.report_repo.count_all().await?,
            pending: self.report_repo.count_by_status(OutageStatus::Pending).await?,
            in_progress: self
                .report_repo
                .count_by_status(OutageStatus::InProgress)
                .await?,
            resolved: self
                .report_repo
                .count_by_status(OutageStatus::Resolved)
                .await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::event_publisher::{NoOpEventPublisher, OutageEventPublisher};
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use gridwatch_common::config::{GeocodingConfig, MediaConfig};
    use gridwatch_db::repositories::{NotificationRepository, UserRepository};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    /// Captures publish calls so tests can assert which topics fired.
    #[derive(Default)]
    struct RecordingPublisher {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl OutageEventPublisher for RecordingPublisher {
        async fn publish_created(&self, projection: OutageProjection) -> AppResult<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("created:{}", projection.id));
            Ok(())
        }

        async fn publish_status_changed(
            &self,
            id: &str,
            status: OutageStatus,
            _resolved_at: Option<DateTime<Utc>>,
        ) -> AppResult<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("status-changed:{id}:{}", status.as_str()));
            Ok(())
        }

        async fn publish_deleted(&self, id: &str) -> AppResult<()> {
            self.calls.lock().unwrap().push(format!("deleted:{id}"));
            Ok(())
        }
    }

    fn service_with(
        conn: Arc<DatabaseConnection>,
        publisher: EventPublisherService,
    ) -> OutageReportService {
        let notifications = NotificationService::new(
            NotificationRepository::new(conn.clone()),
            UserRepository::new(conn.clone()),
        );
        OutageReportService::new(
            OutageReportRepository::new(conn),
            notifications,
            GeocodingResolver::new(&GeocodingConfig::default()),
            MediaStore::new(&MediaConfig {
                root: std::env::temp_dir().join("gridwatch-core-test"),
                base_url: "/uploads".to_string(),
            }),
            publisher,
        )
    }

    fn service_over(db: DatabaseConnection) -> OutageReportService {
        service_with(Arc::new(db), Arc::new(NoOpEventPublisher))
    }

    fn plain_input(title: &str) -> CreateReportInput {
        CreateReportInput {
            reporter_id: "u1".to_string(),
            title: title.to_string(),
            description: None,
            region: None,
            manual_location: None,
            latitude: None,
            longitude: None,
        }
    }

    fn report_row(
        id: &str,
        status: OutageStatus,
        resolved_at: Option<chrono::DateTime<Utc>>,
    ) -> BTreeMap<&'static str, sea_orm::Value> {
        let mut row = BTreeMap::new();
        row.insert("id", id.into());
        row.insert("reporter_id", "u1".into());
        row.insert("title", "Transformer fire".into());
        row.insert("description", sea_orm::Value::String(None));
        row.insert("region", sea_orm::Value::String(None));
        row.insert("manual_location", sea_orm::Value::String(None));
        row.insert("latitude", sea_orm::Value::Double(None));
        row.insert("longitude", sea_orm::Value::Double(None));
        row.insert("location_name", sea_orm::Value::String(None));
        row.insert("media_url", sea_orm::Value::String(None));
        row.insert("status", status.as_str().into());
        row.insert("reported_at", Utc::now().into());
        row.insert("resolved_at", resolved_at.into());
        row
    }

    fn notification_row(message: &str) -> BTreeMap<&'static str, sea_orm::Value> {
        let mut row = BTreeMap::new();
        row.insert("id", "n1".into());
        row.insert("recipient_id", "u1".into());
        row.insert("title", "Outage status updated".into());
        row.insert("message", message.into());
        row.insert("is_read", false.into());
        row.insert("related_report_id", sea_orm::Value::String(None));
        row.insert("created_at", Utc::now().into());
        row
    }

    #[tokio::test]
    async fn create_report_rejects_half_a_coordinate_pair() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = service_over(db);

        let result = service
            .create_report(
                CreateReportInput {
                    reporter_id: "u1".to_string(),
                    title: "Line down".to_string(),
                    description: None,
                    region: None,
                    manual_location: None,
                    latitude: Some(-6.16),
                    longitude: None,
                },
                None,
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn create_report_rejects_blank_title() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = service_over(db);

        let result = service
            .create_report(
                CreateReportInput {
                    reporter_id: "u1".to_string(),
                    title: "   ".to_string(),
                    description: None,
                    region: None,
                    manual_location: None,
                    latitude: None,
                    longitude: None,
                },
                None,
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn update_status_on_missing_report_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<BTreeMap<&str, sea_orm::Value>>::new()])
            .into_connection();
        let service = service_over(db);

        let result = service.update_status("missing", OutageStatus::Resolved).await;
        assert!(matches!(result, Err(AppError::ReportNotFound(_))));
    }

    #[tokio::test]
    async fn resolving_a_report_stamps_resolved_at() {
        let resolved_row = {
            let mut row = report_row("r1", OutageStatus::Resolved, Some(Utc::now()));
            row.insert("status", OutageStatus::Resolved.as_str().into());
            row
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // find_by_id, then the UPDATE .. RETURNING row, then the
            // reporter notification INSERT .. RETURNING row.
            .append_query_results([vec![report_row("r1", OutageStatus::Pending, None)]])
            .append_query_results([vec![resolved_row]])
            .append_query_results([vec![notification_row(
                "Your report 'Transformer fire' is now RESOLVED",
            )]])
            .into_connection();
        let service = service_over(db);

        let updated = service.update_status("r1", OutageStatus::Resolved).await.unwrap();
        assert_eq!(updated.status, OutageStatus::Resolved);
        assert!(updated.resolved_at.is_some());
    }

    #[tokio::test]
    async fn create_report_writes_only_the_report_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![report_row("r1", OutageStatus::Pending, None)]])
            .into_connection();
        let conn = Arc::new(db);
        let service = service_with(conn.clone(), Arc::new(NoOpEventPublisher));

        let report = service
            .create_report(plain_input("Transformer fire"), None)
            .await
            .unwrap();
        assert_eq!(report.status, OutageStatus::Pending);

        // Creation must not materialize inbox entries; only the status
        // update path notifies.
        drop(service);
        let log = Arc::try_unwrap(conn).unwrap().into_transaction_log();
        assert_eq!(log.len(), 1);
        let stmt = format!("{:?}", log[0]);
        assert!(stmt.contains("outage_report"));
        assert!(!stmt.contains("notification"));
    }

    #[tokio::test]
    async fn create_report_publishes_on_the_created_topic() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![report_row("r1", OutageStatus::Pending, None)]])
            .into_connection();
        let publisher = Arc::new(RecordingPublisher::default());
        let service = service_with(Arc::new(db), publisher.clone());

        service
            .create_report(plain_input("Transformer fire"), None)
            .await
            .unwrap();

        assert_eq!(*publisher.calls.lock().unwrap(), vec!["created:r1"]);
    }

    #[tokio::test]
    async fn update_status_publishes_the_new_status() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![report_row("r1", OutageStatus::Pending, None)]])
            .append_query_results([vec![report_row(
                "r1",
                OutageStatus::InProgress,
                None,
            )]])
            .append_query_results([vec![notification_row(
                "Your report 'Transformer fire' is now IN_PROGRESS",
            )]])
            .into_connection();
        let publisher = Arc::new(RecordingPublisher::default());
        let service = service_with(Arc::new(db), publisher.clone());

        service
            .update_status("r1", OutageStatus::InProgress)
            .await
            .unwrap();

        assert_eq!(
            *publisher.calls.lock().unwrap(),
            vec!["status-changed:r1:IN_PROGRESS"]
        );
    }

    #[tokio::test]
    async fn successive_updates_apply_the_latest_status() {
        // No locking between updates: whichever write lands last owns the
        // status column.
        let stamp = Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![report_row("r1", OutageStatus::Pending, None)]])
            .append_query_results([vec![report_row("r1", OutageStatus::Resolved, Some(stamp))]])
            .append_query_results([vec![notification_row(
                "Your report 'Transformer fire' is now RESOLVED",
            )]])
            .append_query_results([vec![report_row("r1", OutageStatus::Resolved, Some(stamp))]])
            .append_query_results([vec![report_row(
                "r1",
                OutageStatus::InProgress,
                Some(stamp),
            )]])
            .append_query_results([vec![notification_row(
                "Your report 'Transformer fire' is now IN_PROGRESS",
            )]])
            .into_connection();
        let service = service_over(db);

        service.update_status("r1", OutageStatus::Resolved).await.unwrap();
        let latest = service
            .update_status("r1", OutageStatus::InProgress)
            .await
            .unwrap();

        assert_eq!(latest.status, OutageStatus::InProgress);
        assert_eq!(latest.resolved_at, Some(stamp));
    }

    #[tokio::test]
    async fn leaving_resolved_keeps_the_resolution_timestamp() {
        let stamp = Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![report_row("r1", OutageStatus::Resolved, Some(stamp))]])
            .append_query_results([vec![report_row("r1", OutageStatus::Pending, Some(stamp))]])
            .append_query_results([vec![notification_row(
                "Your report 'Transformer fire' is now PENDING",
            )]])
            .into_connection();
        let conn = Arc::new(db);
        let service = service_with(conn.clone(), Arc::new(NoOpEventPublisher));

        let updated = service.update_status("r1", OutageStatus::Pending).await.unwrap();
        assert_eq!(updated.status, OutageStatus::Pending);
        assert_eq!(updated.resolved_at, Some(stamp));

        // The UPDATE statement must set the status column only; the old
        // resolution timestamp stays untouched in the row.
        drop(service);
        let log = Arc::try_unwrap(conn).unwrap().into_transaction_log();
        let update_stmt = format!("{:?}", log[1]).replace("\\\"", "\"");
        assert!(update_stmt.contains("UPDATE"));
        assert!(update_stmt.contains(r#""status" ="#));
        assert!(!update_stmt.contains(r#""resolved_at" ="#));
    }

    #[tokio::test]
    async fn delete_missing_report_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<BTreeMap<&str, sea_orm::Value>>::new()])
            .into_connection();
        let service = service_over(db);

        let result = service.delete_report("missing").await;
        assert!(matches!(result, Err(AppError::ReportNotFound(_))));
    }
}
