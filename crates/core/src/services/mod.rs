//! Business services.

pub mod event_publisher;
pub mod export;
pub mod notification;
pub mod outage_report;
pub mod transition;

pub use event_publisher::{
    EventPublisherService, NoOpEventPublisher, OutageEventPublisher, OutageProjection,
    marker_color,
};
pub use export::{ExportFormat, ExportedDocument, ReportExporter};
pub use notification::NotificationService;
pub use outage_report::{
    CreateReportInput, MediaUpload, OutageReportService, StatusSummary,
};
