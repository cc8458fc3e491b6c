//! Shared types used across form-smoke modules
//!
//! Contains the per-step result record and the run log that collects them.

use std::ops::{Index, IndexMut};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Timestamp format used for record and banner times
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time formatted with [`TIMESTAMP_FORMAT`]
pub fn now_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Outcome of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Created but not yet marked
    NotRun,
    /// Step succeeded
    Pass,
    /// Step failed
    Fail,
    /// Step was deliberately not executed
    Skip,
}

impl StepStatus {
    /// Short label used in the console and the report
    pub fn label(&self) -> &'static str {
        match self {
            StepStatus::NotRun => "NOT RUN",
            StepStatus::Pass => "OK",
            StepStatus::Fail => "NG",
            StepStatus::Skip => "SKIP",
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of one executed step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    step_name: String,
    /// Current status
    pub status: StepStatus,
    /// Explanation set by the mark operation
    pub detail: String,
    /// Time of the mark operation, empty until marked
    pub timestamp: String,
    /// Screenshot captured as evidence for this step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot_path: Option<PathBuf>,
}

impl StepResult {
    /// Create an unmarked record
    pub fn new(step_name: impl Into<String>) -> Self {
        Self {
            step_name: step_name.into(),
            status: StepStatus::NotRun,
            detail: String::new(),
            timestamp: String::new(),
            screenshot_path: None,
        }
    }

    /// Label given at creation
    pub fn step_name(&self) -> &str {
        &self.step_name
    }

    pub fn mark_pass(&mut self, detail: impl Into<String>) {
        self.mark(StepStatus::Pass, detail.into());
    }

    pub fn mark_fail(&mut self, detail: impl Into<String>) {
        self.mark(StepStatus::Fail, detail.into());
    }

    pub fn mark_skip(&mut self, detail: impl Into<String>) {
        self.mark(StepStatus::Skip, detail.into());
    }

    fn mark(&mut self, status: StepStatus, detail: String) {
        debug_assert_eq!(
            self.status,
            StepStatus::NotRun,
            "step '{}' marked twice",
            self.step_name
        );
        self.status = status;
        self.detail = detail;
        self.timestamp = now_timestamp();
    }

    pub fn is_marked(&self) -> bool {
        self.status != StepStatus::NotRun
    }
}

/// Ordered, append-only log of step results
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunLog {
    records: Vec<StepResult>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fresh record for `step_name` and return its position
    pub fn begin(&mut self, step_name: impl Into<String>) -> usize {
        self.records.push(StepResult::new(step_name));
        self.records.len() - 1
    }

    pub fn records(&self) -> &[StepResult] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records with the given status
    pub fn count(&self, status: StepStatus) -> usize {
        self.records.iter().filter(|r| r.status == status).count()
    }

    pub fn has_failures(&self) -> bool {
        self.count(StepStatus::Fail) > 0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StepResult> {
        self.records.iter()
    }
}

impl Index<usize> for RunLog {
    type Output = StepResult;

    fn index(&self, index: usize) -> &StepResult {
        &self.records[index]
    }
}

impl IndexMut<usize> for RunLog {
    fn index_mut(&mut self, index: usize) -> &mut StepResult {
        &mut self.records[index]
    }
}

impl<'a> IntoIterator for &'a RunLog {
    type Item = &'a StepResult;
    type IntoIter = std::slice::Iter<'a, StepResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_unmarked() {
        let record = StepResult::new("Launch browser");
        assert_eq!(record.step_name(), "Launch browser");
        assert_eq!(record.status, StepStatus::NotRun);
        assert!(record.detail.is_empty());
        assert!(record.timestamp.is_empty());
        assert!(record.screenshot_path.is_none());
    }

    #[test]
    fn test_mark_sets_status_detail_and_timestamp() {
        let mut record = StepResult::new("Load page");
        record.mark_fail("timed out");
        assert_eq!(record.status, StepStatus::Fail);
        assert_eq!(record.detail, "timed out");
        // "YYYY-mm-dd HH:MM:SS"
        assert_eq!(record.timestamp.len(), 19);
        assert!(record.is_marked());
    }

    #[test]
    #[should_panic(expected = "marked twice")]
    #[cfg(debug_assertions)]
    fn test_double_mark_panics_in_debug() {
        let mut record = StepResult::new("Click submit");
        record.mark_pass("");
        record.mark_fail("again");
    }

    #[test]
    fn test_run_log_counts() {
        let mut log = RunLog::new();
        let a = log.begin("a");
        log[a].mark_pass("ok");
        let b = log.begin("b");
        log[b].mark_fail("broken");
        let c = log.begin("c");
        log[c].mark_skip("no input");

        assert_eq!(log.len(), 3);
        assert_eq!(log.count(StepStatus::Pass), 1);
        assert_eq!(log.count(StepStatus::Fail), 1);
        assert_eq!(log.count(StepStatus::Skip), 1);
        assert!(log.has_failures());
        assert_eq!(log.records()[1].step_name(), "b");
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(StepStatus::Pass.to_string(), "OK");
        assert_eq!(StepStatus::Fail.to_string(), "NG");
        assert_eq!(StepStatus::Skip.to_string(), "SKIP");
    }
}
