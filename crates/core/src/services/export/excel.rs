//! Excel renderer for report exports.

use gridwatch_common::{AppError, AppResult};
use gridwatch_db::entities::outage_report;
use rust_xlsxwriter::{Color, Format, Workbook};

/// Render the reports as a single worksheet. The header sits at row 0 and
/// data starts at row 1, so consumers can index rows without an offset.
pub(super) fn render(reports: &[outage_report::Model]) -> AppResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name("Outage Report")
        .map_err(|e| AppError::Export(e.to_string()))?;

    let header_format = Format::new().set_bold().set_background_color(Color::Silver);
    for (col, header) in super::COLUMNS.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(|e| AppError::Export(e.to_string()))?;
    }

    for (i, report) in reports.iter().enumerate() {
        let row = 1 + i as u32;
        for (col, value) in super::row_of(report).iter().enumerate() {
            worksheet
                .write_string(row, col as u16, value)
                .map_err(|e| AppError::Export(e.to_string()))?;
        }
    }

    worksheet.autofit();

    workbook
        .save_to_buffer()
        .map_err(|e| AppError::Export(e.to_string()))
}
