//! Console progress output
//!
//! Human-facing lines printed while the run advances. Diagnostics go through
//! `tracing` instead.

use crate::core::{now_timestamp, StepResult};
use crate::report::Summary;

const RULE: &str = "============================================================";

/// Banner printed before the first step
pub fn print_banner(url: &str) {
    println!("{}", RULE);
    println!("Form smoke test");
    println!("Target URL: {}", url);
    println!("Started:    {}", now_timestamp());
    println!("{}", RULE);
}

/// One line for a finished step
pub fn step_line(record: &StepResult) -> String {
    let headline = record.detail.lines().next().unwrap_or_default();
    if headline.is_empty() {
        format!("  [{}] {}", record.status, record.step_name())
    } else {
        format!("  [{}] {}: {}", record.status, record.step_name(), headline)
    }
}

pub fn print_step(record: &StepResult) {
    println!("{}", step_line(record));
}

pub fn print_report_saved(path: &std::path::Path) {
    println!("\nReport saved: {}", path.display());
}

/// Closing summary
pub fn print_summary(summary: &Summary) {
    println!("\n{}", RULE);
    println!("Finished: {}", summary);
    println!("{}", RULE);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_line_uses_first_detail_line() {
        let mut record = StepResult::new("Check console errors");
        record.mark_fail("Console errors: 2\n[PageError] a\n[PageError] b");
        assert_eq!(
            step_line(&record),
            "  [NG] Check console errors: Console errors: 2"
        );
    }

    #[test]
    fn test_step_line_without_detail() {
        let mut record = StepResult::new("Click submit button");
        record.mark_pass("");
        assert_eq!(step_line(&record), "  [OK] Click submit button");
    }
}
