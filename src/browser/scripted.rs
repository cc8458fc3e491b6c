//! In-memory browser driver
//!
//! A [`ScriptedPage`] maps selectors to the elements they match, plus the
//! page's behaviour on load and on click. Used to exercise the runner without
//! a real browser.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::browser::console::{ConsoleEntry, ConsoleLog};
use crate::browser::traits::{BrowserDriver, LaunchOptions};
use crate::core::{Result, SmokeError};

/// One element as seen through a selector
#[derive(Debug, Clone, Default)]
pub struct ScriptedElement {
    pub visible: bool,
    pub text: String,
    pub value: String,
    pub attributes: HashMap<String, String>,
    /// Emulates `maxlength`: filled text is cut to this many characters
    pub max_length: Option<usize>,
}

impl ScriptedElement {
    pub fn visible() -> Self {
        Self {
            visible: true,
            ..Self::default()
        }
    }

    pub fn hidden() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }
}

/// How navigation behaves
#[derive(Debug, Clone, Default)]
pub enum LoadBehavior {
    /// Loads immediately
    #[default]
    Ready,
    /// Never reaches network idle
    Hang,
    /// Navigation error with the given message
    Fail(String),
}

/// Description of the page under test
#[derive(Debug, Clone, Default)]
pub struct ScriptedPage {
    pub title: String,
    pub elements: HashMap<String, Vec<ScriptedElement>>,
    pub load: LoadBehavior,
    /// Refuse to start the browser with this message
    pub launch_error: Option<String>,
    /// Click error with this message
    pub click_error: Option<String>,
    /// Console output emitted while the page loads
    pub on_load: Vec<ConsoleEntry>,
    /// Console output emitted by a click
    pub on_click: Vec<ConsoleEntry>,
    /// Console output raised by a click that reaches the log only on a flush
    /// or at close, like events still sitting in the daemon's buffer
    pub on_click_buffered: Vec<ConsoleEntry>,
    /// Elements that appear after a click
    pub revealed_on_click: Vec<(String, ScriptedElement)>,
    /// Selectors whose evaluation fails, with the error message
    pub query_errors: HashMap<String, String>,
}

impl ScriptedPage {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Add an element matched by `selector`
    pub fn with(mut self, selector: impl Into<String>, element: ScriptedElement) -> Self {
        self.elements.entry(selector.into()).or_default().push(element);
        self
    }

    pub fn load(mut self, load: LoadBehavior) -> Self {
        self.load = load;
        self
    }

    pub fn launch_error(mut self, message: impl Into<String>) -> Self {
        self.launch_error = Some(message.into());
        self
    }

    pub fn click_error(mut self, message: impl Into<String>) -> Self {
        self.click_error = Some(message.into());
        self
    }

    pub fn on_load(mut self, entry: ConsoleEntry) -> Self {
        self.on_load.push(entry);
        self
    }

    pub fn on_click(mut self, entry: ConsoleEntry) -> Self {
        self.on_click.push(entry);
        self
    }

    pub fn on_click_buffered(mut self, entry: ConsoleEntry) -> Self {
        self.on_click_buffered.push(entry);
        self
    }

    pub fn reveal_on_click(
        mut self,
        selector: impl Into<String>,
        element: ScriptedElement,
    ) -> Self {
        self.revealed_on_click.push((selector.into(), element));
        self
    }

    /// Make counting `selector` fail
    pub fn query_error(mut self, selector: impl Into<String>, message: impl Into<String>) -> Self {
        self.query_errors.insert(selector.into(), message.into());
        self
    }
}

/// Observable state of a scripted session
#[derive(Debug, Default)]
pub struct ScriptedState {
    pub page: ScriptedPage,
    pub launched: Option<LaunchOptions>,
    pub closed: bool,
    pub console: Option<ConsoleLog>,
    /// Raised but not yet delivered to `console`
    pub buffered: Vec<ConsoleEntry>,
    /// Every driver call, in order
    pub calls: Vec<String>,
    pub screenshots: Vec<PathBuf>,
    pub waited: Duration,
}

/// [`BrowserDriver`] over a [`ScriptedPage`]
#[derive(Debug, Clone)]
pub struct ScriptedBrowser {
    state: Arc<Mutex<ScriptedState>>,
}

/// Split `base >> nth=N` into the base selector and index
fn split_nth(selector: &str) -> (&str, Option<usize>) {
    match selector.rsplit_once(" >> nth=") {
        Some((base, index)) => match index.trim().parse() {
            Ok(n) => (base, Some(n)),
            Err(_) => (selector, None),
        },
        None => (selector, None),
    }
}

impl ScriptedBrowser {
    pub fn new(page: ScriptedPage) -> Self {
        Self {
            state: Arc::new(Mutex::new(ScriptedState {
                page,
                ..ScriptedState::default()
            })),
        }
    }

    /// Shared view of the session, valid after the driver is moved
    pub fn handle(&self) -> Arc<Mutex<ScriptedState>> {
        Arc::clone(&self.state)
    }

    fn lock(&self) -> MutexGuard<'_, ScriptedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: String) -> MutexGuard<'_, ScriptedState> {
        let mut state = self.lock();
        state.calls.push(call);
        state
    }

    fn with_element<T>(
        &self,
        selector: &str,
        f: impl FnOnce(&mut ScriptedElement) -> T,
    ) -> Result<T> {
        let (base, index) = split_nth(selector);
        let mut state = self.lock();
        state
            .page
            .elements
            .get_mut(base)
            .and_then(|matches| matches.get_mut(index.unwrap_or(0)))
            .map(f)
            .ok_or_else(|| SmokeError::browser(format!("no element matches {}", selector)))
    }

    fn emit(state: &ScriptedState, entries: &[ConsoleEntry]) {
        if let Some(log) = &state.console {
            for entry in entries {
                log.push(entry.clone());
            }
        }
    }

    fn deliver_buffered(state: &mut ScriptedState) {
        let pending = std::mem::take(&mut state.buffered);
        Self::emit(state, &pending);
    }
}

#[async_trait]
impl BrowserDriver for ScriptedBrowser {
    async fn launch(&mut self, options: &LaunchOptions) -> Result<()> {
        let mut state = self.record("launch".to_string());
        if let Some(message) = &state.page.launch_error {
            return Err(SmokeError::browser(message.clone()));
        }
        state.launched = Some(options.clone());
        Ok(())
    }

    async fn attach_console(&mut self, log: ConsoleLog) -> Result<()> {
        let mut state = self.record("attach_console".to_string());
        state.console = Some(log);
        Ok(())
    }

    async fn flush_console(&self) -> Result<()> {
        let mut state = self.record("flush_console".to_string());
        Self::deliver_buffered(&mut state);
        Ok(())
    }

    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        let load = {
            let state = self.record(format!("navigate {}", url));
            Self::emit(&state, &state.page.on_load);
            state.page.load.clone()
        };

        match load {
            LoadBehavior::Ready => Ok(()),
            LoadBehavior::Fail(message) => Err(SmokeError::browser(message)),
            LoadBehavior::Hang => {
                match tokio::time::timeout(timeout, std::future::pending::<()>()).await {
                    Ok(()) => Ok(()),
                    Err(_) => Err(SmokeError::timeout("page load", timeout)),
                }
            }
        }
    }

    async fn title(&self) -> Result<String> {
        Ok(self.record("title".to_string()).page.title.clone())
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        let state = self.record(format!("count {}", selector));
        let (base, _) = split_nth(selector);
        if let Some(message) = state.page.query_errors.get(base) {
            return Err(SmokeError::browser(message.clone()));
        }
        Ok(state.page.elements.get(base).map(Vec::len).unwrap_or(0))
    }

    async fn is_visible(&self, selector: &str) -> Result<bool> {
        drop(self.record(format!("is_visible {}", selector)));
        // Playwright reports false rather than failing for missing elements
        Ok(self.with_element(selector, |el| el.visible).unwrap_or(false))
    }

    async fn inner_text(&self, selector: &str) -> Result<String> {
        drop(self.record(format!("inner_text {}", selector)));
        self.with_element(selector, |el| el.text.clone())
    }

    async fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>> {
        drop(self.record(format!("attribute {} {}", selector, name)));
        self.with_element(selector, |el| {
            el.attributes.get(name).filter(|v| !v.is_empty()).cloned()
        })
    }

    async fn focus(&self, selector: &str) -> Result<()> {
        drop(self.record(format!("focus {}", selector)));
        self.with_element(selector, |_| ())
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<()> {
        drop(self.record(format!("fill {}", selector)));
        self.with_element(selector, |el| {
            el.value = match el.max_length {
                Some(max) => text.chars().take(max).collect(),
                None => text.to_string(),
            };
        })
    }

    async fn input_value(&self, selector: &str) -> Result<String> {
        drop(self.record(format!("input_value {}", selector)));
        self.with_element(selector, |el| el.value.clone())
    }

    async fn click(&self, selector: &str, _timeout: Duration) -> Result<()> {
        drop(self.record(format!("click {}", selector)));
        self.with_element(selector, |_| ())?;

        let mut state = self.lock();
        if let Some(message) = &state.page.click_error {
            return Err(SmokeError::browser(message.clone()));
        }
        Self::emit(&state, &state.page.on_click);
        let raised = state.page.on_click_buffered.clone();
        state.buffered.extend(raised);
        let revealed = std::mem::take(&mut state.page.revealed_on_click);
        for (selector, element) in revealed {
            state.page.elements.entry(selector).or_default().push(element);
        }
        Ok(())
    }

    async fn wait(&self, duration: Duration) -> Result<()> {
        self.record(format!("wait {}ms", duration.as_millis())).waited += duration;
        tokio::time::sleep(duration).await;
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        self.record(format!("screenshot {}", path.display()))
            .screenshots
            .push(path.to_path_buf());
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = self.record("close".to_string());
        Self::deliver_buffered(&mut state);
        state.closed = true;
        state.console = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_nth() {
        assert_eq!(split_nth("button >> nth=2"), ("button", Some(2)));
        assert_eq!(split_nth("textarea:visible"), ("textarea:visible", None));
    }

    #[tokio::test]
    async fn test_fill_respects_max_length() {
        let driver = ScriptedBrowser::new(
            ScriptedPage::new("Form").with("input", ScriptedElement::visible().max_length(3)),
        );
        driver.fill("input >> nth=0", "abcdef").await.unwrap();
        assert_eq!(driver.input_value("input >> nth=0").await.unwrap(), "abc");
    }

    #[tokio::test]
    async fn test_click_emits_console_and_reveals_elements() {
        let mut driver = ScriptedBrowser::new(
            ScriptedPage::new("Form")
                .with("button", ScriptedElement::visible().text("送信"))
                .on_click(ConsoleEntry::page_error("boom"))
                .reveal_on_click(".error", ScriptedElement::visible().text("failed")),
        );
        let log = ConsoleLog::new();
        driver.attach_console(log.clone()).await.unwrap();

        assert_eq!(driver.count(".error").await.unwrap(), 0);
        driver.click("button >> nth=0", Duration::from_secs(1)).await.unwrap();

        assert_eq!(log.len(), 1);
        assert_eq!(driver.count(".error").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_buffered_click_output_waits_for_flush() {
        let mut driver = ScriptedBrowser::new(
            ScriptedPage::new("Form")
                .with("button", ScriptedElement::visible())
                .on_click_buffered(ConsoleEntry::page_error("late")),
        );
        let log = ConsoleLog::new();
        driver.attach_console(log.clone()).await.unwrap();

        driver.click("button >> nth=0", Duration::from_secs(1)).await.unwrap();
        assert!(log.is_empty());

        driver.flush_console().await.unwrap();
        assert_eq!(log.snapshot(), vec![ConsoleEntry::page_error("late")]);

        // Delivered once only
        driver.flush_console().await.unwrap();
        assert_eq!(log.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_load_times_out() {
        let driver = ScriptedBrowser::new(ScriptedPage::new("Slow").load(LoadBehavior::Hang));
        let err = driver
            .navigate("http://slow.test", Duration::from_secs(30))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }
}
