//! Smoke test runner
//!
//! Drives the fixed eight-step sequence against one page session:
//!
//! 1. launch the browser and attach console listeners (fatal on failure)
//! 2. load the target URL (fatal on failure)
//! 3. detect a text input
//! 4. enter the test text
//! 5. detect a submit button
//! 6. click it and let the page settle
//! 7. look for on-screen error indicators
//! 8. look for console errors
//!
//! Every step appends one record to the run log. Steps 4 and 6 are skipped
//! when their element was not found. The report is written on every exit path.

mod screenshot;

pub use screenshot::ScreenshotStore;

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::browser::{BrowserDriver, ConsoleEntry, ConsoleLog, LaunchOptions};
use crate::cli::progress;
use crate::core::{Config, Result, RunLog, StepStatus};
use crate::report::{self, Summary};
use crate::selector::{self, error_queries, input_queries, nth, submit_queries, Match};

/// Marker appended when console errors are cut off
const TRUNCATION_MARKER: &str = "...";

/// Fixed step labels, in execution order
pub mod steps {
    pub const LAUNCH: &str = "Launch browser";
    pub const LOAD: &str = "Load page";
    pub const DETECT_INPUT: &str = "Detect text input";
    pub const DETECT_SUBMIT: &str = "Detect submit button";
    pub const CLICK_SUBMIT: &str = "Click submit button";
    pub const SCREEN_ERRORS: &str = "Check on-screen errors";
    pub const CONSOLE_ERRORS: &str = "Check console errors";

    /// Step 4 carries the text it types
    pub fn enter_text(text: &str) -> String {
        format!("Enter text ('{}')", text)
    }
}

/// What a step concluded
#[derive(Debug, Clone, PartialEq, Eq)]
enum Verdict {
    Pass(String),
    Fail(String),
    Skip(String),
}

/// Verdict plus optional visual evidence
#[derive(Debug)]
struct StepOutcome {
    verdict: Verdict,
    screenshot: Option<PathBuf>,
}

impl StepOutcome {
    fn new(verdict: Verdict) -> Self {
        Self {
            verdict,
            screenshot: None,
        }
    }

    fn with_screenshot(mut self, path: Option<PathBuf>) -> Self {
        self.screenshot = path;
        self
    }
}

/// Result of a complete run
#[derive(Debug)]
pub struct RunOutcome {
    /// Records in execution order
    pub log: RunLog,
    /// Console errors captured during the session
    pub console: Vec<ConsoleEntry>,
    /// Whether a fatal step stopped the sequence
    pub aborted: bool,
    /// Counts written to the report
    pub summary: Summary,
    pub report_path: PathBuf,
    /// The unconditional end-of-run capture, if it succeeded
    pub final_screenshot: Option<PathBuf>,
}

impl RunOutcome {
    /// 1 when any step failed, 0 otherwise
    pub fn exit_code(&self) -> u8 {
        if self.log.has_failures() {
            1
        } else {
            0
        }
    }
}

/// Runs the smoke sequence with a given driver
pub struct SmokeRunner<D: BrowserDriver> {
    config: Config,
    url: String,
    driver: D,
    log: RunLog,
    console: ConsoleLog,
    shots: ScreenshotStore,
    final_screenshot: Option<PathBuf>,
    print_progress: bool,
}

impl<D: BrowserDriver> SmokeRunner<D> {
    /// Create a runner; fails when no target URL can be resolved
    pub fn new(config: Config, driver: D) -> Result<Self> {
        let url = config.target_url()?;
        let shots = ScreenshotStore::new(config.output.screenshot_dir.clone());
        Ok(Self {
            config,
            url,
            driver,
            log: RunLog::new(),
            console: ConsoleLog::new(),
            shots,
            final_screenshot: None,
            print_progress: true,
        })
    }

    /// Suppress the stdout progress lines
    pub fn quiet(mut self) -> Self {
        self.print_progress = false;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Execute all steps, write the report, and release the browser
    ///
    /// Step failures are recorded, never returned; only a report write error
    /// surfaces as `Err`.
    pub async fn run(mut self) -> Result<RunOutcome> {
        if self.print_progress {
            progress::print_banner(&self.url);
        }
        info!(url = %self.url, "smoke run started");

        let aborted = !(self.launch().await && self.session().await);

        if let Err(e) = self.driver.close().await {
            warn!(error = %e, "failed to close browser session");
        }

        self.finish(aborted)
    }

    fn finish(self, aborted: bool) -> Result<RunOutcome> {
        let report_path = self.config.output.report_path.clone();
        let summary = report::write_report(&self.log, &report_path)?;

        if self.print_progress {
            progress::print_report_saved(&report_path);
            progress::print_summary(&summary);
        }
        info!(%summary, aborted, "smoke run finished");

        Ok(RunOutcome {
            console: self.console.snapshot(),
            log: self.log,
            aborted,
            summary,
            report_path,
            final_screenshot: self.final_screenshot,
        })
    }

    /// Apply an outcome to the record at `idx` and announce it
    fn conclude(&mut self, idx: usize, outcome: StepOutcome) {
        let record = &mut self.log[idx];
        match outcome.verdict {
            Verdict::Pass(detail) => record.mark_pass(detail),
            Verdict::Fail(detail) => record.mark_fail(detail),
            Verdict::Skip(detail) => record.mark_skip(detail),
        }
        if outcome.screenshot.is_some() {
            record.screenshot_path = outcome.screenshot;
        }

        match record.status {
            StepStatus::Fail => warn!(step = record.step_name(), detail = %record.detail, "step failed"),
            status => info!(step = record.step_name(), %status, "step finished"),
        }
        if self.print_progress {
            progress::print_step(record);
        }
    }

    /// Best-effort screenshot; a failed capture never changes a verdict
    async fn capture(&self, label: &str) -> Option<PathBuf> {
        match self.shots.capture(&self.driver, label).await {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(label, error = %e, "screenshot failed");
                None
            }
        }
    }

    /// Step 1
    async fn launch(&mut self) -> bool {
        let idx = self.log.begin(steps::LAUNCH);
        let options = LaunchOptions::from(&self.config.browser);

        let result = match self.driver.launch(&options).await {
            Ok(()) => self.driver.attach_console(self.console.clone()).await,
            Err(e) => Err(e),
        };

        let (ok, verdict) = match result {
            Ok(()) => (
                true,
                Verdict::Pass(format!(
                    "Chromium ({}) started, viewport {}x{}, locale {}",
                    if options.headed { "headed" } else { "headless" },
                    options.viewport_width,
                    options.viewport_height,
                    options.locale
                )),
            ),
            Err(e) => (false, Verdict::Fail(format!("Browser launch failed: {}", e))),
        };
        self.conclude(idx, StepOutcome::new(verdict));
        ok
    }

    /// Steps 2 to 8 plus the final capture; false when the load step aborted
    async fn session(&mut self) -> bool {
        let idx = self.log.begin(steps::LOAD);
        let (outcome, loaded) = self.load_page().await;
        self.conclude(idx, outcome);
        if !loaded {
            return false;
        }

        let idx = self.log.begin(steps::DETECT_INPUT);
        let (outcome, input) = self.detect_input().await;
        self.conclude(idx, outcome);

        let idx = self.log.begin(steps::enter_text(&self.config.checks.input_text));
        let outcome = self.enter_text(input.as_ref()).await;
        self.conclude(idx, outcome);

        let idx = self.log.begin(steps::DETECT_SUBMIT);
        let (outcome, button) = self.detect_submit().await;
        self.conclude(idx, outcome);

        let idx = self.log.begin(steps::CLICK_SUBMIT);
        let outcome = self.click_submit(button.as_ref()).await;
        self.conclude(idx, outcome);

        let idx = self.log.begin(steps::SCREEN_ERRORS);
        let outcome = self.check_screen_errors().await;
        self.conclude(idx, outcome);

        let idx = self.log.begin(steps::CONSOLE_ERRORS);
        let outcome = self.check_console_errors().await;
        self.conclude(idx, outcome);

        self.final_screenshot = self.capture("99_final_state").await;
        true
    }

    /// Step 2
    async fn load_page(&self) -> (StepOutcome, bool) {
        let timeout = self.config.browser.page_load_timeout();
        let result = match self.driver.navigate(&self.url, timeout).await {
            Ok(()) => self.driver.title().await,
            Err(e) => Err(e),
        };

        match result {
            Ok(title) => {
                let shot = self.capture("01_page_loaded").await;
                let outcome = StepOutcome::new(Verdict::Pass(format!(
                    "Page loaded (title: {})",
                    title
                )));
                (outcome.with_screenshot(shot), true)
            }
            Err(e) if e.is_timeout() => {
                let shot = self.capture("01_page_timeout").await;
                let outcome = StepOutcome::new(Verdict::Fail(format!(
                    "Load timeout ({}ms): page did not reach network idle",
                    timeout.as_millis()
                )));
                (outcome.with_screenshot(shot), false)
            }
            Err(e) => {
                let shot = self.capture("01_page_error").await;
                let outcome =
                    StepOutcome::new(Verdict::Fail(format!("Page load error: {}", e)));
                (outcome.with_screenshot(shot), false)
            }
        }
    }

    async fn describe_input(&self) -> Result<Option<(Match, String)>> {
        let Some(found) = selector::resolve(&self.driver, &input_queries()).await? else {
            return Ok(None);
        };
        let id = self.driver.attribute(&found.locator, "id").await?;
        let placeholder = self.driver.attribute(&found.locator, "placeholder").await?;
        let description = format!(
            "<{}> id={}, placeholder={}",
            found.query.label,
            id.as_deref().unwrap_or("(no id)"),
            placeholder.as_deref().unwrap_or("(no placeholder)")
        );
        Ok(Some((found, description)))
    }

    /// Step 3
    async fn detect_input(&self) -> (StepOutcome, Option<Match>) {
        match self.describe_input().await {
            Ok(Some((found, description))) => {
                debug!(locator = %found.locator, "text input");
                (
                    StepOutcome::new(Verdict::Pass(format!("Found {}", description))),
                    Some(found),
                )
            }
            Ok(None) => {
                let shot = self.capture("02_no_textbox").await;
                let outcome = StepOutcome::new(Verdict::Fail(
                    "No visible text input found".to_string(),
                ));
                (outcome.with_screenshot(shot), None)
            }
            Err(e) => {
                let shot = self.capture("02_textbox_error").await;
                let outcome = StepOutcome::new(Verdict::Fail(format!(
                    "Text input detection error: {}",
                    e
                )));
                (outcome.with_screenshot(shot), None)
            }
        }
    }

    async fn type_into(&self, locator: &str, text: &str) -> Result<String> {
        self.driver.focus(locator).await?;
        self.driver.fill(locator, text).await?;
        self.driver.input_value(locator).await
    }

    /// Step 4
    async fn enter_text(&self, input: Option<&Match>) -> StepOutcome {
        let Some(input) = input else {
            return StepOutcome::new(Verdict::Skip(
                "Skipped: no text input was found".to_string(),
            ));
        };

        let expected = &self.config.checks.input_text;
        match self.type_into(&input.locator, expected).await {
            Ok(actual) if actual == *expected => {
                let shot = self.capture("03_text_entered").await;
                StepOutcome::new(Verdict::Pass(format!("Entered '{}'", actual)))
                    .with_screenshot(shot)
            }
            Ok(actual) => {
                let shot = self.capture("03_text_mismatch").await;
                StepOutcome::new(Verdict::Fail(format!(
                    "Value mismatch (expected '{}', got '{}')",
                    expected, actual
                )))
                .with_screenshot(shot)
            }
            Err(e) => {
                let shot = self.capture("03_text_error").await;
                StepOutcome::new(Verdict::Fail(format!("Text entry error: {}", e)))
                    .with_screenshot(shot)
            }
        }
    }

    async fn describe_submit(&self) -> Result<Option<(Match, String)>> {
        let queries = submit_queries(&self.config.checks.submit_labels);
        let Some(found) = selector::resolve(&self.driver, &queries).await? else {
            return Ok(None);
        };

        let mut label = self.driver.inner_text(&found.locator).await?.trim().to_string();
        if label.is_empty() {
            // <input type="submit"> carries its caption in `value`
            label = self
                .driver
                .attribute(&found.locator, "value")
                .await?
                .unwrap_or_default();
        }
        let id = self.driver.attribute(&found.locator, "id").await?;
        let description = format!(
            "'{}' id={}",
            label,
            id.as_deref().unwrap_or("(no id)")
        );
        Ok(Some((found, description)))
    }

    /// Step 5
    async fn detect_submit(&self) -> (StepOutcome, Option<Match>) {
        match self.describe_submit().await {
            Ok(Some((found, description))) => {
                debug!(locator = %found.locator, "submit button");
                (
                    StepOutcome::new(Verdict::Pass(format!("Found {}", description))),
                    Some(found),
                )
            }
            Ok(None) => {
                let shot = self.capture("04_no_button").await;
                let outcome =
                    StepOutcome::new(Verdict::Fail("No submit button found".to_string()));
                (outcome.with_screenshot(shot), None)
            }
            Err(e) => {
                let shot = self.capture("04_button_error").await;
                let outcome = StepOutcome::new(Verdict::Fail(format!(
                    "Submit button detection error: {}",
                    e
                )));
                (outcome.with_screenshot(shot), None)
            }
        }
    }

    /// Step 6
    async fn click_submit(&self, button: Option<&Match>) -> StepOutcome {
        let Some(button) = button else {
            return StepOutcome::new(Verdict::Skip(
                "Skipped: no submit button was found".to_string(),
            ));
        };

        let browser = &self.config.browser;
        let result = match self
            .driver
            .click(&button.locator, browser.action_timeout())
            .await
        {
            // Let asynchronous handlers run before anything is inspected
            Ok(()) => self.driver.wait(browser.settle()).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                let shot = self.capture("05_after_click").await;
                StepOutcome::new(Verdict::Pass("Button clicked".to_string())).with_screenshot(shot)
            }
            Err(e) => {
                let shot = self.capture("05_click_error").await;
                StepOutcome::new(Verdict::Fail(format!("Click error: {}", e)))
                    .with_screenshot(shot)
            }
        }
    }

    /// Visible, non-empty error indicators as `[selector] text` lines
    async fn scan_screen_errors(&self) -> Result<Vec<String>> {
        let limit = self.config.checks.error_text_limit;
        let mut found = Vec::new();

        for query in error_queries(&self.config.checks.error_selectors) {
            let count = self.driver.count(&query.selector).await?;
            for index in 0..count {
                let locator = nth(&query.selector, index);
                if !self.driver.is_visible(&locator).await? {
                    continue;
                }
                let text = self.driver.inner_text(&locator).await?;
                let text = text.trim();
                if !text.is_empty() {
                    found.push(format!("[{}] {}", query.label, truncate_chars(text, limit)));
                }
            }
        }
        Ok(found)
    }

    /// Step 7
    async fn check_screen_errors(&self) -> StepOutcome {
        match self.scan_screen_errors().await {
            Ok(found) if found.is_empty() => {
                StepOutcome::new(Verdict::Pass("No on-screen errors".to_string()))
            }
            Ok(found) => {
                let shot = self.capture("06_ui_errors").await;
                StepOutcome::new(Verdict::Fail(format!(
                    "On-screen errors: {}\n{}",
                    found.len(),
                    found.join("\n")
                )))
                .with_screenshot(shot)
            }
            Err(e) => {
                let shot = self.capture("06_check_error").await;
                StepOutcome::new(Verdict::Fail(format!("On-screen error check failed: {}", e)))
                    .with_screenshot(shot)
            }
        }
    }

    /// Step 8
    async fn check_console_errors(&self) -> StepOutcome {
        // The watcher may lag behind the page; read everything raised so far
        if let Err(e) = self.driver.flush_console().await {
            return StepOutcome::new(Verdict::Fail(format!(
                "Console error check failed: {}",
                e
            )));
        }

        let entries = self.console.snapshot();
        if entries.is_empty() {
            StepOutcome::new(Verdict::Pass("No console errors".to_string()))
        } else {
            StepOutcome::new(Verdict::Fail(console_detail(
                &entries,
                self.config.checks.max_console_errors,
            )))
        }
    }
}

/// First `limit` characters of `text`
fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Count header, up to `max` entries, and a marker when some were left out
fn console_detail(entries: &[ConsoleEntry], max: usize) -> String {
    let mut lines = vec![format!("Console errors: {}", entries.len())];
    lines.extend(entries.iter().take(max).map(ToString::to_string));
    if entries.len() > max {
        lines.push(TRUNCATION_MARKER.to_string());
    }
    lines.join("\n")
}
