//! Outage report repository.

use std::sync::Arc;

use crate::entities::{OutageReport, outage_report, outage_report::OutageStatus};
use gridwatch_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
};

/// Outage report repository for database operations.
#[derive(Clone)]
pub struct OutageReportRepository {
    db: Arc<DatabaseConnection>,
}

impl OutageReportRepository {
    /// Create a new outage report repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a report by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<outage_report::Model>> {
        OutageReport::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a new report.
    pub async fn insert(&self, model: outage_report::ActiveModel) -> AppResult<outage_report::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an existing report.
    ///
    /// Last write wins: concurrent updates to the same id are not
    /// serialized here.
    pub async fn update(&self, model: outage_report::ActiveModel) -> AppResult<outage_report::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a report.
    pub async fn delete(&self, model: outage_report::Model) -> AppResult<()> {
        model
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// All reports, newest first.
    pub async fn find_all(&self) -> AppResult<Vec<outage_report::Model>> {
        OutageReport::find()
            .order_by_desc(outage_report::Column::ReportedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Reports submitted by one user, newest first.
    pub async fn find_by_reporter(&self, reporter_id: &str) -> AppResult<Vec<outage_report::Model>> {
        OutageReport::find()
            .filter(outage_report::Column::ReporterId.eq(reporter_id))
            .order_by_desc(outage_report::Column::ReportedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Reports whose `reported_at` falls in the inclusive range, oldest first.
    pub async fn find_by_reported_at_between(
        &self,
        start: sea_orm::prelude::DateTimeUtc,
        end: sea_orm::prelude::DateTimeUtc,
    ) -> AppResult<Vec<outage_report::Model>> {
        OutageReport::find()
            .filter(outage_report::Column::ReportedAt.gte(start))
            .filter(outage_report::Column::ReportedAt.lte(end))
            .order_by_asc(outage_report::Column::ReportedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all reports.
    pub async fn count_all(&self) -> AppResult<u64> {
        OutageReport::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count reports with the given status.
    pub async fn count_by_status(&self, status: OutageStatus) -> AppResult<u64> {
        OutageReport::find()
            .filter(outage_report::Column::Status.eq(status))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
