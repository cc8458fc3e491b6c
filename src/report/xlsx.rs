//! Spreadsheet rendering of a run

use std::fs;
use std::path::Path;

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook};
use tracing::info;

use crate::core::{Result, RunLog, StepStatus};
use crate::report::summary::{ReportSheet, Summary};

const FONT: &str = "Meiryo";
const SHEET_NAME: &str = "Test Results";
const HEADERS: [&str; 6] = ["No.", "Step", "Result", "Detail", "Executed At", "Screenshot"];
const COLUMN_WIDTHS: [f64; 6] = [6.0, 35.0, 10.0, 55.0, 20.0, 40.0];

/// Fill and font colours for a status
fn status_colors(status: StepStatus) -> (u32, u32) {
    match status {
        StepStatus::Pass => (0xC6EFCE, 0x006100),
        StepStatus::Fail => (0xFFC7CE, 0x9C0006),
        // NotRun never reaches a finished report; style it like Skip
        StepStatus::Skip | StepStatus::NotRun => (0xFFEB9C, 0x9C6500),
    }
}

fn header_format() -> Format {
    Format::new()
        .set_font_name(FONT)
        .set_font_size(11)
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(0x4472C4))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Thin)
}

fn body_format() -> Format {
    Format::new()
        .set_font_name(FONT)
        .set_font_size(10)
        .set_align(FormatAlign::Top)
        .set_border(FormatBorder::Thin)
}

fn status_format(status: StepStatus) -> Format {
    let (fill, font) = status_colors(status);
    Format::new()
        .set_font_name(FONT)
        .set_font_color(Color::RGB(font))
        .set_background_color(Color::RGB(fill))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::Top)
        .set_border(FormatBorder::Thin)
}

/// Write the report for `log` to `path`, creating parent directories
pub fn write_report(log: &RunLog, path: &Path) -> Result<Summary> {
    let sheet = ReportSheet::from_log(log);

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let header = header_format();
    for (col, title) in HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *title, &header)?;
    }

    let body = body_format();
    let number = body_format().set_align(FormatAlign::Center);
    let detail = body_format().set_text_wrap();

    for (i, row) in sheet.rows.iter().enumerate() {
        let r = (i + 1) as u32;
        worksheet.write_number_with_format(r, 0, row.number as f64, &number)?;
        worksheet.write_string_with_format(r, 1, row.step.as_str(), &body)?;
        worksheet.write_string_with_format(
            r,
            2,
            row.status.label(),
            &status_format(row.status),
        )?;
        worksheet.write_string_with_format(r, 3, row.detail.as_str(), &detail)?;
        worksheet.write_string_with_format(r, 4, row.timestamp.as_str(), &body)?;
        worksheet.write_string_with_format(r, 5, row.screenshot.as_str(), &body)?;
    }

    for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
        worksheet.set_column_width(col as u16, *width)?;
    }

    // One blank row between the table and the summary
    let summary_row = sheet.rows.len() as u32 + 2;
    for (offset, (text, status)) in sheet.summary_lines().into_iter().enumerate() {
        let format = match status {
            None if offset == 0 => Format::new().set_font_name(FONT).set_font_size(11).set_bold(),
            None => Format::new().set_font_name(FONT).set_font_size(10),
            Some(status) => Format::new()
                .set_font_name(FONT)
                .set_font_color(Color::RGB(status_colors(status).1)),
        };
        worksheet.write_string_with_format(summary_row + offset as u32, 0, text, &format)?;
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    workbook.save(path)?;

    info!(path = %path.display(), rows = sheet.rows.len(), "report written");
    Ok(sheet.summary)
}
