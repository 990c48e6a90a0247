//! User entity.
//!
//! Minimal collaborator record: registration and credential management live
//! outside this system, but reports and notifications reference users by id.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub username: String,

    #[sea_orm(unique)]
    pub email: String,

    /// Opaque API token presented by the collaborator's auth layer.
    #[serde(skip_serializing)]
    pub token: String,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::outage_report::Entity")]
    OutageReport,

    #[sea_orm(has_many = "super::notification::Entity")]
    Notification,
}

impl Related<super::outage_report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OutageReport.def()
    }
}

impl Related<super::notification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notification.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
