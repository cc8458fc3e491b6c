//! Browser driver trait for abstracting automation backends
//!
//! The runner only talks to a page through this trait, so the agent-browser
//! CLI can be swapped for an in-memory page in tests.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::browser::console::ConsoleLog;
use crate::core::config::BrowserConfig;
use crate::core::Result;

/// Session settings applied at launch
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Show the browser window
    pub headed: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Sent as the `Accept-Language` header; `navigator.language` keeps the
    /// browser default
    pub locale: String,
    /// Interval for collecting buffered console events
    pub console_poll: Duration,
}

impl From<&BrowserConfig> for LaunchOptions {
    fn from(config: &BrowserConfig) -> Self {
        Self {
            headed: config.headed,
            viewport_width: config.viewport_width,
            viewport_height: config.viewport_height,
            locale: config.locale.clone(),
            console_poll: config.console_poll(),
        }
    }
}

/// Capabilities the smoke runner needs from a browser
///
/// Selectors use Playwright locator syntax (`:visible`, `:has-text()`,
/// `>> nth=N`).
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Start a session with the given viewport and locale
    async fn launch(&mut self, options: &LaunchOptions) -> Result<()>;

    /// Start appending console errors and uncaught exceptions to `log`
    async fn attach_console(&mut self, log: ConsoleLog) -> Result<()>;

    /// Deliver every event raised so far to the attached log before returning
    async fn flush_console(&self) -> Result<()>;

    /// Navigate and wait for network idle, failing with a timeout error past `timeout`
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()>;

    async fn title(&self) -> Result<String>;

    /// Number of elements matching `selector`
    async fn count(&self, selector: &str) -> Result<usize>;

    async fn is_visible(&self, selector: &str) -> Result<bool>;

    async fn inner_text(&self, selector: &str) -> Result<String>;

    /// Attribute value, `None` when absent or empty
    async fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>>;

    async fn focus(&self, selector: &str) -> Result<()>;

    /// Replace the value of an input
    async fn fill(&self, selector: &str, text: &str) -> Result<()>;

    async fn input_value(&self, selector: &str) -> Result<String>;

    /// Click, failing with a timeout error past `timeout`
    async fn click(&self, selector: &str, timeout: Duration) -> Result<()>;

    /// Let the page run for a fixed duration
    async fn wait(&self, duration: Duration) -> Result<()>;

    /// Capture the viewport as PNG
    async fn screenshot(&self, path: &Path) -> Result<()>;

    /// Release the session; further calls are invalid
    async fn close(&mut self) -> Result<()>;
}
