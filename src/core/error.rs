//! Custom error types for form-smoke
//!
//! Provides a unified error handling system across all modules.

use std::time::Duration;

use thiserror::Error;

/// Main error type for smoke test operations
#[derive(Error, Debug)]
pub enum SmokeError {
    /// Browser automation errors
    #[error("Browser error: {0}")]
    Browser(String),

    /// A browser operation did not finish in time
    #[error("{operation} timed out after {}ms", .limit.as_millis())]
    Timeout {
        operation: String,
        limit: Duration,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Spreadsheet writer errors
    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Agent-browser not installed
    #[error("agent-browser not found. Install with: npm install -g agent-browser && agent-browser install")]
    AgentBrowserNotFound,
}

/// Convenience Result type for smoke test operations
pub type Result<T> = std::result::Result<T, SmokeError>;

impl SmokeError {
    /// Create a browser error
    pub fn browser(msg: impl Into<String>) -> Self {
        Self::Browser(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a timeout error for the named operation
    pub fn timeout(operation: impl Into<String>, limit: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            limit,
        }
    }

    /// Whether this error came from an exceeded time limit
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display() {
        let err = SmokeError::timeout("navigate", Duration::from_millis(30000));
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "navigate timed out after 30000ms");
    }

    #[test]
    fn test_browser_error_is_not_timeout() {
        let err = SmokeError::browser("net::ERR_NAME_NOT_RESOLVED");
        assert!(!err.is_timeout());
        assert!(err.to_string().contains("ERR_NAME_NOT_RESOLVED"));
    }

    #[test]
    fn test_source_errors_convert() {
        let io: SmokeError = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "locked").into();
        assert!(matches!(io, SmokeError::Io(_)));

        let json: SmokeError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(json, SmokeError::Json(_)));
        assert!(!json.is_timeout());
    }
}
