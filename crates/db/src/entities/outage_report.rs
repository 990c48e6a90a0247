//! Outage report entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Report lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutageStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,
    #[sea_orm(string_value = "RESOLVED")]
    Resolved,
}

impl OutageStatus {
    /// Wire representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Resolved => "RESOLVED",
        }
    }
}

impl std::str::FromStr for OutageStatus {
    type Err = String;

    /// Case-insensitive parse of a status value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "RESOLVED" => Ok(Self::Resolved),
            other => Err(format!("Unknown status: {other}")),
        }
    }
}

impl std::fmt::Display for OutageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "outage_report")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The submitting user; immutable after creation.
    pub reporter_id: String,

    pub title: String,

    #[sea_orm(nullable)]
    pub description: Option<String>,

    #[sea_orm(nullable)]
    pub region: Option<String>,

    /// Free-text location entered by the submitter.
    #[sea_orm(nullable)]
    pub manual_location: Option<String>,

    #[sea_orm(nullable)]
    pub latitude: Option<f64>,

    #[sea_orm(nullable)]
    pub longitude: Option<f64>,

    /// Derived place name from reverse geocoding.
    #[sea_orm(nullable)]
    pub location_name: Option<String>,

    /// Public URL of the uploaded attachment, if any.
    #[sea_orm(nullable)]
    pub media_url: Option<String>,

    pub status: OutageStatus,

    /// Set exactly once at creation (server clock).
    pub reported_at: DateTimeUtc,

    /// Stamped on transition into RESOLVED; never cleared afterwards.
    #[sea_orm(nullable)]
    pub resolved_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ReporterId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Reporter,

    #[sea_orm(has_many = "super::notification::Entity")]
    Notification,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reporter.def()
    }
}

impl Related<super::notification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notification.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_parse_case_insensitive() {
        assert_eq!(OutageStatus::from_str("resolved"), Ok(OutageStatus::Resolved));
        assert_eq!(OutageStatus::from_str("Pending"), Ok(OutageStatus::Pending));
        assert_eq!(OutageStatus::from_str("in_progress"), Ok(OutageStatus::InProgress));
    }

    #[test]
    fn test_status_parse_unknown() {
        assert!(OutageStatus::from_str("CLOSED").is_err());
    }

    #[test]
    fn test_status_serde_wire_format() {
        let json = serde_json::to_string(&OutageStatus::InProgress).unwrap_or_default();
        assert_eq!(json, "\"IN_PROGRESS\"");
    }
}
