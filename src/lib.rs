//! form-smoke - browser smoke test for a single web form
//!
//! Opens the form in a Chromium session driven by agent-browser, types into
//! the first text input, presses the submit button, and records on-screen and
//! console errors. Each step lands in a spreadsheet report with screenshots.
//!
//! # Architecture
//!
//! - **Core**: Configuration, errors, and step records
//! - **Browser**: Driver trait with the agent-browser and scripted backends
//! - **Selector**: Candidate queries for inputs, buttons, and error banners
//! - **Runner**: The fixed step sequence
//! - **Report**: Spreadsheet output
//! - **CLI**: Progress lines for the terminal
//!
//! # Usage
//!
//! ```rust,no_run
//! use form_smoke::{AgentBrowser, Config, SmokeRunner};
//!
//! #[tokio::main]
//! async fn main() -> form_smoke::Result<()> {
//!     let config = Config::load(None)?;
//!     let driver = AgentBrowser::new(config.browser.session_name.clone());
//!     let outcome = SmokeRunner::new(config, driver)?.run().await?;
//!     std::process::exit(outcome.exit_code() as i32);
//! }
//! ```

pub mod browser;
pub mod cli;
pub mod core;
pub mod report;
pub mod runner;
pub mod selector;

// Re-export commonly used items
pub use browser::{AgentBrowser, BrowserDriver};
#[cfg(any(test, feature = "testing"))]
pub use browser::ScriptedBrowser;
pub use core::{Config, Result, SmokeError, StepStatus};
pub use runner::{RunOutcome, SmokeRunner};
