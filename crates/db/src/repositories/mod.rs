//! Database repositories.

mod notification;
mod outage_report;
mod user;

pub use notification::NotificationRepository;
pub use outage_report::OutageReportRepository;
pub use user::UserRepository;
