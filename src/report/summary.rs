//! Tabular view of a run, independent of the file format

use serde::Serialize;

use crate::core::{RunLog, StepStatus};

/// Step counts by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl Summary {
    pub fn from_log(log: &RunLog) -> Self {
        Self {
            total: log.len(),
            passed: log.count(StepStatus::Pass),
            failed: log.count(StepStatus::Fail),
            skipped: log.count(StepStatus::Skip),
        }
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "OK={}, NG={}, SKIP={}, total={}",
            self.passed, self.failed, self.skipped, self.total
        )
    }
}

/// One data row of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    /// 1-based sequence number
    pub number: usize,
    pub step: String,
    pub status: StepStatus,
    pub detail: String,
    pub timestamp: String,
    pub screenshot: String,
}

/// Everything the report shows, in display order
#[derive(Debug, Clone, Serialize)]
pub struct ReportSheet {
    pub rows: Vec<ReportRow>,
    pub summary: Summary,
}

impl ReportSheet {
    pub fn from_log(log: &RunLog) -> Self {
        let rows = log
            .iter()
            .enumerate()
            .map(|(i, record)| ReportRow {
                number: i + 1,
                step: record.step_name().to_string(),
                status: record.status,
                detail: record.detail.clone(),
                timestamp: record.timestamp.clone(),
                screenshot: record
                    .screenshot_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            })
            .collect();

        Self {
            rows,
            summary: Summary::from_log(log),
        }
    }

    /// Lines of the summary block below the table
    pub fn summary_lines(&self) -> [(String, Option<StepStatus>); 5] {
        let s = &self.summary;
        [
            ("Summary".to_string(), None),
            (format!("  Total: {} steps", s.total), None),
            (format!("  OK: {}", s.passed), Some(StepStatus::Pass)),
            (format!("  NG: {}", s.failed), Some(StepStatus::Fail)),
            (format!("  SKIP: {}", s.skipped), Some(StepStatus::Skip)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample_log() -> RunLog {
        let mut log = RunLog::new();
        let launch = log.begin("Launch browser");
        log[launch].mark_pass("started");
        let load = log.begin("Load page");
        log[load].mark_pass("loaded");
        log[load].screenshot_path = Some(PathBuf::from("screenshots/01_page_loaded.png"));
        let detect = log.begin("Detect text input");
        log[detect].mark_fail("not found");
        let enter = log.begin("Enter text");
        log[enter].mark_skip("no input");
        log
    }

    #[test]
    fn test_rows_follow_log_order() {
        let sheet = ReportSheet::from_log(&sample_log());
        assert_eq!(sheet.rows.len(), 4);
        assert_eq!(sheet.rows[0].number, 1);
        assert_eq!(sheet.rows[1].screenshot, "screenshots/01_page_loaded.png");
        assert_eq!(sheet.rows[2].status, StepStatus::Fail);
        assert!(sheet.rows[3].screenshot.is_empty());
    }

    #[test]
    fn test_summary_tally() {
        let summary = Summary::from_log(&sample_log());
        assert_eq!(
            summary,
            Summary {
                total: 4,
                passed: 2,
                failed: 1,
                skipped: 1
            }
        );
        assert_eq!(summary.to_string(), "OK=2, NG=1, SKIP=1, total=4");
    }

    #[test]
    fn test_summary_lines() {
        let sheet = ReportSheet::from_log(&sample_log());
        let lines = sheet.summary_lines();
        assert_eq!(lines[1].0, "  Total: 4 steps");
        assert_eq!(lines[3], ("  NG: 1".to_string(), Some(StepStatus::Fail)));
    }
}
