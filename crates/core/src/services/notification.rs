//! Notification service.

use gridwatch_common::{AppError, AppResult, IdGenerator};
use gridwatch_db::{
    entities::notification,
    repositories::{NotificationRepository, UserRepository},
};
use sea_orm::Set;

/// Notification service for inbox and fan-out logic.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl NotificationService {
    #[must_use]
    pub const fn new(notification_repo: NotificationRepository, user_repo: UserRepository) -> Self {
        Self {
            notification_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a notification for a single recipient.
    pub async fn notify(
        &self,
        recipient_id: &str,
        title: &str,
        message: &str,
        related_report_id: Option<&str>,
    ) -> AppResult<notification::Model> {
        let model = notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            recipient_id: Set(recipient_id.to_string()),
            title: Set(title.to_string()),
            message: Set(message.to_string()),
            is_read: Set(false),
            related_report_id: Set(related_report_id.map(ToString::to_string)),
            created_at: Set(chrono::Utc::now()),
        };

        self.notification_repo.create(model).await
    }

    /// Fan a notification out to every known user except `excluded_id`.
    ///
    /// A failure for one recipient is logged and skipped so the remaining
    /// recipients still get their copy. Returns the number delivered.
    pub async fn notify_all_except(
        &self,
        excluded_id: &str,
        title: &str,
        message: &str,
        related_report_id: Option<&str>,
    ) -> AppResult<usize> {
        let users = self.user_repo.find_all().await?;
        let mut delivered = 0;

        for user in users {
            if user.id == excluded_id {
                continue;
            }
            match self
                .notify(&user.id, title, message, related_report_id)
                .await
            {
                Ok(_) => delivered += 1,
                Err(err) => {
                    tracing::warn!(
                        recipient_id = %user.id,
                        error = %err,
                        "failed to deliver notification, skipping recipient"
                    );
                }
            }
        }

        Ok(delivered)
    }

    /// Get all notifications for a recipient, newest first.
    pub async fn get_inbox(&self, recipient_id: &str) -> AppResult<Vec<notification::Model>> {
        self.notification_repo.find_by_recipient(recipient_id).await
    }

    /// Get unread notifications for a recipient, newest first.
    pub async fn get_unread(&self, recipient_id: &str) -> AppResult<Vec<notification::Model>> {
        self.notification_repo.find_unread(recipient_id).await
    }

    /// Count unread notifications for a recipient.
    pub async fn count_unread(&self, recipient_id: &str) -> AppResult<u64> {
        self.notification_repo.count_unread(recipient_id).await
    }

    /// Mark one notification as read.
    ///
    /// The notification must belong to `recipient_id`.
    pub async fn mark_as_read(
        &self,
        notification_id: &str,
        recipient_id: &str,
    ) -> AppResult<notification::Model> {
        let existing = self
            .notification_repo
            .find_by_id(notification_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

        if existing.recipient_id != recipient_id {
            return Err(AppError::NotFound("Notification not found".to_string()));
        }

        if existing.is_read {
            return Ok(existing);
        }

        self.notification_repo
            .mark_as_read(notification_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))
    }

    /// Mark every notification for a recipient as read. Returns the number
    /// updated.
    pub async fn mark_all_as_read(&self, recipient_id: &str) -> AppResult<u64> {
        self.notification_repo.mark_all_as_read(recipient_id).await
    }

    /// Delete one notification from the recipient's inbox.
    pub async fn delete(&self, notification_id: &str, recipient_id: &str) -> AppResult<()> {
        let existing = self
            .notification_repo
            .find_by_id(notification_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

        if existing.recipient_id != recipient_id {
            return Err(AppError::NotFound("Notification not found".to_string()));
        }

        self.notification_repo.delete(notification_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn notification_row(
        id: &str,
        recipient_id: &str,
        is_read: bool,
    ) -> BTreeMap<&'static str, sea_orm::Value> {
        let mut row = BTreeMap::new();
        row.insert("id", id.into());
        row.insert("recipient_id", recipient_id.into());
        row.insert("title", "Outage update".into());
        row.insert("message", "Status changed".into());
        row.insert("is_read", is_read.into());
        row.insert(
            "related_report_id",
            sea_orm::Value::String(None),
        );
        row.insert("created_at", Utc::now().into());
        row
    }

    fn user_row(id: &str) -> BTreeMap<&'static str, sea_orm::Value> {
        let mut row = BTreeMap::new();
        row.insert("id", id.into());
        row.insert("username", id.into());
        row.insert("email", format!("{id}@example.com").into());
        row.insert("token", "tok".into());
        row.insert("created_at", Utc::now().into());
        row
    }

    #[tokio::test]
    async fn fan_out_skips_the_originator() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user_row("u1"), user_row("u2"), user_row("u3")]])
            .append_query_results([
                vec![notification_row("n1", "u2", false)],
                vec![notification_row("n2", "u3", false)],
            ])
            .into_connection();
        let conn = Arc::new(db);
        let service = NotificationService::new(
            NotificationRepository::new(conn.clone()),
            UserRepository::new(conn),
        );

        let delivered = service
            .notify_all_except("u1", "Planned maintenance", "Feeder F3 offline tonight", None)
            .await
            .unwrap();
        assert_eq!(delivered, 2);
    }

    #[tokio::test]
    async fn mark_as_read_rejects_foreign_recipient() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![notification_row("n1", "owner", false)]])
            .into_connection();
        let conn = Arc::new(db);
        let service = NotificationService::new(
            NotificationRepository::new(conn.clone()),
            UserRepository::new(conn),
        );

        let result = service.mark_as_read("n1", "intruder").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn mark_as_read_is_idempotent_for_read_notifications() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![notification_row("n1", "owner", true)]])
            .into_connection();
        let conn = Arc::new(db);
        let service = NotificationService::new(
            NotificationRepository::new(conn.clone()),
            UserRepository::new(conn),
        );

        let model = service.mark_as_read("n1", "owner").await.unwrap();
        assert!(model.is_read);
    }

    #[tokio::test]
    async fn delete_checks_ownership_before_removing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![notification_row("n1", "owner", false)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let conn = Arc::new(db);
        let service = NotificationService::new(
            NotificationRepository::new(conn.clone()),
            UserRepository::new(conn),
        );

        service.delete("n1", "owner").await.unwrap();
    }
}
