//! PDF renderer for report exports.

use gridwatch_common::{AppError, AppResult};
use gridwatch_db::entities::outage_report;
use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point,
};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const ROW_HEIGHT: f32 = 7.0;
const BODY_SIZE: f32 = 9.0;
const HEADER_SIZE: f32 = 10.0;

// Left edge of each column, in mm from the page edge.
const COLUMN_X: [f32; 5] = [15.0, 72.0, 118.0, 142.0, 169.0];
// Widest string each column can hold before truncation.
const COLUMN_CHARS: [usize; 5] = [30, 24, 12, 19, 19];

/// Render the reports as a paginated A4 table.
pub(super) fn render(
    reports: &[outage_report::Model],
    period: &str,
) -> AppResult<Vec<u8>> {
    let (doc, first_page, first_layer) =
        PdfDocument::new("Outage Report", Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| AppError::Export(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| AppError::Export(e.to_string()))?;

    let mut layer = doc.get_page(first_page).get_layer(first_layer);

    layer.use_text(
        "Outage Report",
        18.0,
        Mm(centered_x("Outage Report", 18.0)),
        Mm(PAGE_HEIGHT - 20.0),
        &bold,
    );
    layer.use_text(
        period,
        11.0,
        Mm(centered_x(period, 11.0)),
        Mm(PAGE_HEIGHT - 28.0),
        &font,
    );

    let mut y = PAGE_HEIGHT - 42.0;
    write_header(&layer, &bold, y);
    y -= ROW_HEIGHT;

    for report in reports {
        if y < MARGIN + ROW_HEIGHT {
            let (page, page_layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            layer = doc.get_page(page).get_layer(page_layer);
            y = PAGE_HEIGHT - MARGIN - ROW_HEIGHT;
            write_header(&layer, &bold, y);
            y -= ROW_HEIGHT;
        }

        let row = super::row_of(report);
        for (i, value) in row.iter().enumerate() {
            layer.use_text(
                truncated(value, COLUMN_CHARS[i]),
                BODY_SIZE,
                Mm(COLUMN_X[i]),
                Mm(y),
                &font,
            );
        }
        y -= ROW_HEIGHT;
    }

    doc.save_to_bytes().map_err(|e| AppError::Export(e.to_string()))
}

fn write_header(layer: &PdfLayerReference, bold: &IndirectFontRef, y: f32) {
    for (i, title) in super::COLUMNS.iter().enumerate() {
        layer.use_text(*title, HEADER_SIZE, Mm(COLUMN_X[i]), Mm(y), bold);
    }
    layer.set_outline_thickness(0.5);
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(MARGIN), Mm(y - 2.0)), false),
            (Point::new(Mm(PAGE_WIDTH - MARGIN), Mm(y - 2.0)), false),
        ],
        is_closed: false,
    });
}

// Helvetica averages roughly half an em per glyph, close enough to center
// a heading.
fn centered_x(text: &str, font_size: f32) -> f32 {
    let text_width_mm = text.chars().count() as f32 * font_size * 0.5 * 0.352_778;
    ((PAGE_WIDTH - text_width_mm) / 2.0).max(MARGIN)
}

fn truncated(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        value.to_string()
    } else {
        let kept: String = value.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
