//! Report output
//!
//! Turns the run log into a styled spreadsheet with a summary block.

mod summary;
mod xlsx;

pub use summary::{ReportRow, ReportSheet, Summary};
pub use xlsx::write_report;
