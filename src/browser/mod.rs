//! Browser automation module
//!
//! Defines the driver boundary the runner works against, the agent-browser
//! implementation used in production, and, with the `testing` feature, a
//! scripted page for tests.

mod console;
mod executor;
mod response;
#[cfg(any(test, feature = "testing"))]
mod scripted;
mod traits;

pub use console::{ConsoleEntry, ConsoleLog, ConsoleSource};
pub use executor::AgentBrowser;
pub use response::CliResponse;
#[cfg(any(test, feature = "testing"))]
pub use scripted::{LoadBehavior, ScriptedBrowser, ScriptedElement, ScriptedPage, ScriptedState};
pub use traits::{BrowserDriver, LaunchOptions};
