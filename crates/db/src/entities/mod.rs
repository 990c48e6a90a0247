//! Database entities.

pub mod notification;
pub mod outage_report;
pub mod user;

pub use notification::Entity as Notification;
pub use outage_report::Entity as OutageReport;
pub use user::Entity as User;
