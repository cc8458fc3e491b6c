//! Console error log shared between the driver and the runner
//!
//! The driver appends from its event source while the page session is alive;
//! the runner only reads once interaction with the page is over.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

/// Where a captured message came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsoleSource {
    /// `console.*` call at the given level
    Console(String),
    /// Uncaught exception in the page
    PageError,
}

/// One captured console or page error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleEntry {
    pub source: ConsoleSource,
    pub text: String,
}

impl ConsoleEntry {
    /// A `console.error` message
    pub fn console_error(text: impl Into<String>) -> Self {
        Self {
            source: ConsoleSource::Console("error".to_string()),
            text: text.into(),
        }
    }

    /// An uncaught page exception
    pub fn page_error(text: impl Into<String>) -> Self {
        Self {
            source: ConsoleSource::PageError,
            text: text.into(),
        }
    }
}

impl std::fmt::Display for ConsoleEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            ConsoleSource::Console(level) => write!(f, "[{}] {}", level, self.text),
            ConsoleSource::PageError => write!(f, "[PageError] {}", self.text),
        }
    }
}

/// Append-only, thread-safe list of console errors
#[derive(Debug, Clone, Default)]
pub struct ConsoleLog {
    entries: Arc<Mutex<Vec<ConsoleEntry>>>,
}

impl ConsoleLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: ConsoleEntry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    /// Copy of the entries captured so far, in arrival order
    pub fn snapshot(&self) -> Vec<ConsoleEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_display() {
        assert_eq!(
            ConsoleEntry::console_error("boom").to_string(),
            "[error] boom"
        );
        assert_eq!(
            ConsoleEntry::page_error("TypeError: x is undefined").to_string(),
            "[PageError] TypeError: x is undefined"
        );
    }

    #[test]
    fn test_clones_share_entries() {
        let log = ConsoleLog::new();
        let producer = log.clone();

        let handle = std::thread::spawn(move || {
            for i in 0..5 {
                producer.push(ConsoleEntry::console_error(format!("e{}", i)));
            }
        });
        handle.join().unwrap();

        assert_eq!(log.len(), 5);
        assert_eq!(log.snapshot()[4].text, "e4");
    }
}
