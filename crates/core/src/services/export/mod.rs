//! Report export service.
//!
//! Renders a date range of outage reports as a downloadable PDF or Excel
//! document. Both renderers share the same tabular projection so the two
//! formats never drift apart.

mod excel;
mod pdf;

use chrono::{DateTime, NaiveDate, Utc};
use gridwatch_common::{AppError, AppResult};
use gridwatch_db::{entities::outage_report, repositories::OutageReportRepository};
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const MISSING: &str = "N/A";

pub(crate) const COLUMNS: [&str; 5] = ["Title", "Location", "Status", "Reported At", "Resolved At"];

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Excel,
}

impl ExportFormat {
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Excel => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Excel => "xlsx",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "excel" | "xlsx" => Ok(Self::Excel),
            _ => Err(AppError::Validation(format!("Unsupported format: {s}"))),
        }
    }
}

/// A rendered export ready to be served.
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub filename: String,
}

/// Renders exports over the report store.
#[derive(Clone)]
pub struct ReportExporter {
    report_repo: OutageReportRepository,
}

impl ReportExporter {
    #[must_use]
    pub const fn new(report_repo: OutageReportRepository) -> Self {
        Self { report_repo }
    }

    /// Export every report whose `reported_at` falls inside the inclusive
    /// `from..=to` date range.
    ///
    /// Dates are `YYYY-MM-DD`; the range covers `from` 00:00:00 through
    /// `to` 23:59:59. An empty result is an error rather than an empty
    /// document.
    pub async fn export(
        &self,
        from: &str,
        to: &str,
        format: ExportFormat,
    ) -> AppResult<ExportedDocument> {
        let from_date = parse_date(from)?;
        let to_date = parse_date(to)?;

        let start = day_start(from_date);
        let end = day_end(to_date);

        let reports = self
            .report_repo
            .find_by_reported_at_between(start, end)
            .await?;
        if reports.is_empty() {
            return Err(AppError::NotFound(
                "No reports found for the selected date range".to_string(),
            ));
        }

        let bytes = match format {
            ExportFormat::Pdf => {
                // The PDF subtitle reflects the dates actually covered, not
                // the requested bounds. The result set is ordered ascending
                // by reported_at.
                let period = match (reports.first(), reports.last()) {
                    (Some(first), Some(last)) => format!(
                        "Period: {} to {}",
                        first.reported_at.format(DATE_FORMAT),
                        last.reported_at.format(DATE_FORMAT)
                    ),
                    _ => format!("Period: {from} to {to}"),
                };
                pdf::render(&reports, &period)?
            }
            ExportFormat::Excel => excel::render(&reports)?,
        };

        Ok(ExportedDocument {
            bytes,
            content_type: format.content_type(),
            filename: format!("outage_report_{from}_to_{to}.{}", format.extension()),
        })
    }
}

fn parse_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| {
        AppError::Validation("Invalid date format. Please use YYYY-MM-DD format".to_string())
    })
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .unwrap_or_else(|| date.and_time(chrono::NaiveTime::MIN))
        .and_utc()
}

fn day_end(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(23, 59, 59)
        .unwrap_or_else(|| date.and_time(chrono::NaiveTime::MIN))
        .and_utc()
}

/// Location column value. Geocoded name wins, manually entered location is
/// the fallback.
pub(crate) fn location_of(report: &outage_report::Model) -> String {
    report
        .location_name
        .clone()
        .or_else(|| report.manual_location.clone())
        .unwrap_or_else(|| MISSING.to_string())
}

pub(crate) fn row_of(report: &outage_report::Model) -> [String; 5] {
    [
        report.title.clone(),
        location_of(report),
        report.status.as_str().to_string(),
        report.reported_at.format(TIMESTAMP_FORMAT).to_string(),
        report
            .resolved_at
            .map_or_else(|| MISSING.to_string(), |at| at.format(TIMESTAMP_FORMAT).to_string()),
    ]
}
