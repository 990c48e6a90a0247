//! Notification entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The user receiving the notification.
    pub recipient_id: String,

    pub title: String,

    pub message: String,

    /// Has this notification been read?
    #[sea_orm(default_value = false)]
    pub is_read: bool,

    /// Originating report, if the notification was report-driven.
    #[sea_orm(nullable)]
    pub related_report_id: Option<String>,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::RecipientId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Recipient,

    #[sea_orm(
        belongs_to = "super::outage_report::Entity",
        from = "Column::RelatedReportId",
        to = "super::outage_report::Column::Id",
        on_delete = "SetNull"
    )]
    RelatedReport,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Recipient.def()
    }
}

impl Related<super::outage_report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RelatedReport.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
