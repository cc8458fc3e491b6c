//! Browser driver backed by the agent-browser CLI
//!
//! Each operation is one `agent-browser` invocation against a named session.
//! Console events are buffered by the agent-browser daemon; a background
//! watcher drains them into the [`ConsoleLog`] while the session is open.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::browser::console::ConsoleLog;
use crate::browser::response::CliResponse;
use crate::browser::traits::{BrowserDriver, LaunchOptions};
use crate::core::{Result, SmokeError};

const PROGRAM: &str = "agent-browser";

/// Invocation settings shared by the driver and its console watcher
#[derive(Debug, Clone)]
struct CliSession {
    /// Session name for isolation
    session_name: String,
    /// Whether to run in headed mode
    headed: bool,
}

impl CliSession {
    fn base_args(&self) -> Vec<&str> {
        let mut args = vec!["--session", self.session_name.as_str()];
        if self.headed {
            args.push("--headed");
        }
        args
    }

    /// Run an agent-browser command
    async fn run(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(PROGRAM);
        cmd.args(self.base_args());
        cmd.args(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        // Timeouts drop the future; don't leave the child behind
        cmd.kill_on_drop(true);

        debug!(session = %self.session_name, ?args, "agent-browser");

        let output = cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SmokeError::AgentBrowserNotFound
            } else {
                SmokeError::browser(format!("Failed to run agent-browser: {}", e))
            }
        })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(SmokeError::browser(format!(
                "agent-browser {} failed: {}",
                args.first().copied().unwrap_or_default(),
                stderr.trim()
            )))
        }
    }

    /// Run a command and parse its JSON envelope
    async fn run_json(&self, args: &[&str]) -> Result<CliResponse> {
        let mut full_args: Vec<&str> = args.to_vec();
        full_args.push("--json");
        let output = self.run(&full_args).await?;
        CliResponse::parse(&output)
    }

    /// Synchronous close for use from `Drop`
    fn close_blocking(&self) {
        let status = std::process::Command::new(PROGRAM)
            .args(self.base_args())
            .arg("close")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        if let Err(e) = status {
            warn!(error = %e, "failed to close agent-browser session");
        }
    }
}

/// Positions already copied out of the daemon's buffers
#[derive(Debug, Default)]
struct ConsoleCursor {
    console_seen: usize,
    errors_seen: usize,
}

async fn collect_console(
    cli: &CliSession,
    log: &ConsoleLog,
    cursor: &mut ConsoleCursor,
) -> Result<()> {
    let console = cli.run_json(&["console"]).await?;
    let (total, errors) = console.console_errors();
    // A shrinking buffer means the daemon cleared it
    if total < cursor.console_seen {
        cursor.console_seen = 0;
    }
    for (position, entry) in errors {
        if position >= cursor.console_seen {
            log.push(entry);
        }
    }
    cursor.console_seen = total;

    let page_errors = cli.run_json(&["errors"]).await?.page_errors();
    if page_errors.len() < cursor.errors_seen {
        cursor.errors_seen = 0;
    }
    let seen = page_errors.len();
    for entry in page_errors.into_iter().skip(cursor.errors_seen) {
        log.push(entry);
    }
    cursor.errors_seen = seen;

    Ok(())
}

/// Console log plus its read position
///
/// Shared by the background watcher and explicit flushes. A pass holds the
/// cursor for its whole duration, so concurrent passes never copy an event
/// twice.
#[derive(Debug, Clone)]
struct ConsoleFeed {
    log: ConsoleLog,
    cursor: Arc<AsyncMutex<ConsoleCursor>>,
}

impl ConsoleFeed {
    fn new(log: ConsoleLog) -> Self {
        Self {
            log,
            cursor: Arc::new(AsyncMutex::new(ConsoleCursor::default())),
        }
    }

    async fn collect(&self, cli: &CliSession) -> Result<()> {
        let mut cursor = self.cursor.lock().await;
        collect_console(cli, &self.log, &mut cursor).await
    }
}

/// Background task polling console buffers into a [`ConsoleFeed`]
struct ConsoleWatcher {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl ConsoleWatcher {
    fn spawn(cli: CliSession, feed: ConsoleFeed, every: Duration) -> Self {
        let (stop, mut stop_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = feed.collect(&cli).await {
                            debug!(error = %e, "console poll failed");
                        }
                    }
                    _ = stop_rx.changed() => break,
                }
            }

            // Pick up anything raised since the last tick
            if let Err(e) = feed.collect(&cli).await {
                warn!(error = %e, "final console collection failed");
            }
        });

        Self { stop, handle }
    }

    async fn stop(self) {
        let _ = self.stop.send(true);
        if let Err(e) = self.handle.await {
            warn!(error = %e, "console watcher ended abnormally");
        }
    }
}

/// [`BrowserDriver`] implementation over the agent-browser CLI
pub struct AgentBrowser {
    cli: CliSession,
    console_poll: Duration,
    feed: Option<ConsoleFeed>,
    watcher: Option<ConsoleWatcher>,
    open: bool,
}

impl AgentBrowser {
    /// Create a driver for the named session
    pub fn new(session_name: impl Into<String>) -> Self {
        Self {
            cli: CliSession {
                session_name: session_name.into(),
                headed: false,
            },
            console_poll: Duration::from_millis(250),
            feed: None,
            watcher: None,
            open: false,
        }
    }

    /// Check if agent-browser is installed
    pub async fn is_available() -> bool {
        Command::new(PROGRAM)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    pub fn session_name(&self) -> &str {
        &self.cli.session_name
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl Default for AgentBrowser {
    fn default() -> Self {
        Self::new("form-smoke")
    }
}

async fn within<T, F>(operation: &str, limit: Duration, work: F) -> Result<T>
where
    F: std::future::Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, work).await {
        Ok(result) => result,
        Err(_) => Err(SmokeError::timeout(operation, limit)),
    }
}

/// Extra headers carrying the locale; the page's `navigator.language` is not
/// affected
fn locale_headers(locale: &str) -> String {
    serde_json::json!({ "Accept-Language": locale }).to_string()
}

fn missing_field(what: &str, selector: &str) -> SmokeError {
    SmokeError::browser(format!("no {} returned for {}", what, selector))
}

#[async_trait]
impl BrowserDriver for AgentBrowser {
    async fn launch(&mut self, options: &LaunchOptions) -> Result<()> {
        self.cli.headed = options.headed;
        self.console_poll = options.console_poll;

        let width = options.viewport_width.to_string();
        let height = options.viewport_height.to_string();
        // The first command starts the browser for this session
        self.cli
            .run(&["set", "viewport", width.as_str(), height.as_str()])
            .await?;
        self.open = true;

        let headers = locale_headers(&options.locale);
        self.cli.run(&["set", "headers", headers.as_str()]).await?;
        Ok(())
    }

    async fn attach_console(&mut self, log: ConsoleLog) -> Result<()> {
        if !self.open {
            return Err(SmokeError::browser("session is not open"));
        }
        if let Some(previous) = self.watcher.take() {
            previous.stop().await;
        }
        let feed = ConsoleFeed::new(log);
        self.watcher = Some(ConsoleWatcher::spawn(
            self.cli.clone(),
            feed.clone(),
            self.console_poll,
        ));
        self.feed = Some(feed);
        Ok(())
    }

    async fn flush_console(&self) -> Result<()> {
        match &self.feed {
            Some(feed) => feed.collect(&self.cli).await,
            None => Ok(()),
        }
    }

    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        within("page load", timeout, async {
            self.cli.run(&["open", url]).await?;
            self.cli.run(&["wait", "--load", "networkidle"]).await?;
            Ok::<(), SmokeError>(())
        })
        .await
    }

    async fn title(&self) -> Result<String> {
        self.cli
            .run(&["get", "title"])
            .await
            .map(|s| s.trim().to_string())
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        self.cli
            .run_json(&["get", "count", selector])
            .await?
            .usize_field(&["count"])
            .ok_or_else(|| missing_field("count", selector))
    }

    async fn is_visible(&self, selector: &str) -> Result<bool> {
        self.cli
            .run_json(&["is", "visible", selector])
            .await?
            .bool_field(&["visible", "result"])
            .ok_or_else(|| missing_field("visibility", selector))
    }

    async fn inner_text(&self, selector: &str) -> Result<String> {
        self.cli
            .run_json(&["get", "text", selector])
            .await?
            .string_field(&["text"])
            .ok_or_else(|| missing_field("text", selector))
    }

    async fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>> {
        Ok(self
            .cli
            .run_json(&["get", "attr", selector, name])
            .await?
            .string_field(&["value", name])
            .filter(|v| !v.is_empty()))
    }

    async fn focus(&self, selector: &str) -> Result<()> {
        self.cli.run(&["focus", selector]).await?;
        Ok(())
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<()> {
        self.cli.run(&["fill", selector, text]).await?;
        Ok(())
    }

    async fn input_value(&self, selector: &str) -> Result<String> {
        self.cli
            .run_json(&["get", "value", selector])
            .await?
            .string_field(&["value"])
            .ok_or_else(|| missing_field("value", selector))
    }

    async fn click(&self, selector: &str, timeout: Duration) -> Result<()> {
        within("click", timeout, async {
            self.cli.run(&["click", selector]).await?;
            Ok::<(), SmokeError>(())
        })
        .await
    }

    async fn wait(&self, duration: Duration) -> Result<()> {
        tokio::time::sleep(duration).await;
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        let path = path.to_string_lossy().into_owned();
        self.cli.run(&["screenshot", path.as_str()]).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(watcher) = self.watcher.take() {
            watcher.stop().await;
        }
        self.feed = None;
        if !self.open {
            return Ok(());
        }
        self.open = false;
        self.cli.run(&["close"]).await?;
        Ok(())
    }
}

impl Drop for AgentBrowser {
    fn drop(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.handle.abort();
        }
        if self.open {
            self.cli.close_blocking();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_creation() {
        let executor = AgentBrowser::new("test-session");
        assert_eq!(executor.session_name(), "test-session");
        assert!(!executor.cli.headed);
        assert!(!executor.is_open());
    }

    #[test]
    fn test_base_args_include_headed_flag() {
        let mut cli = CliSession {
            session_name: "s1".to_string(),
            headed: false,
        };
        assert_eq!(cli.base_args(), vec!["--session", "s1"]);
        cli.headed = true;
        assert_eq!(cli.base_args(), vec!["--session", "s1", "--headed"]);
    }

    #[tokio::test]
    async fn test_close_without_launch_is_noop() {
        let mut executor = AgentBrowser::new("never-launched");
        assert!(executor.close().await.is_ok());
    }

    #[tokio::test]
    async fn test_flush_without_console_is_noop() {
        let executor = AgentBrowser::new("no-console");
        assert!(executor.flush_console().await.is_ok());
    }

    #[test]
    fn test_locale_goes_into_accept_language() {
        let headers: serde_json::Value = serde_json::from_str(&locale_headers("ja-JP")).unwrap();
        assert_eq!(headers, serde_json::json!({ "Accept-Language": "ja-JP" }));
    }

    #[test]
    fn test_missing_field_names_selector() {
        let err = missing_field("visibility", "textarea:visible >> nth=0");
        assert_eq!(
            err.to_string(),
            "Browser error: no visibility returned for textarea:visible >> nth=0"
        );
    }

    #[tokio::test]
    async fn test_attach_console_requires_open_session() {
        let mut executor = AgentBrowser::new("closed");
        assert!(executor.attach_console(ConsoleLog::new()).await.is_err());
    }
}
