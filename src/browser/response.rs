//! Parsing for agent-browser `--json` output
//!
//! Every command answers with `{"success": .., "data": .., "error": ..}`. The
//! shape of `data` depends on the command, so accessors look up a list of
//! candidate keys and fall back to a bare scalar.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::browser::console::ConsoleEntry;
use crate::core::{Result, SmokeError};

/// Envelope returned by agent-browser in JSON mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliResponse {
    /// Whether the operation succeeded
    #[serde(default)]
    pub success: bool,
    /// Command-specific payload
    #[serde(default)]
    pub data: Option<Value>,
    /// Error message when `success` is false
    #[serde(default)]
    pub error: Option<String>,
}

impl CliResponse {
    /// Parse stdout of a `--json` invocation
    pub fn parse(output: &str) -> Result<Self> {
        let response: CliResponse = serde_json::from_str(output.trim())?;
        if !response.success {
            return Err(SmokeError::browser(
                response
                    .error
                    .unwrap_or_else(|| "agent-browser reported failure".to_string()),
            ));
        }
        Ok(response)
    }

    fn field(&self, keys: &[&str]) -> Option<&Value> {
        let data = self.data.as_ref()?;
        match data {
            Value::Object(map) => keys.iter().find_map(|k| map.get(*k)),
            other => Some(other),
        }
    }

    pub fn usize_field(&self, keys: &[&str]) -> Option<usize> {
        self.field(keys)
            .and_then(Value::as_u64)
            .map(|n| n as usize)
    }

    pub fn bool_field(&self, keys: &[&str]) -> Option<bool> {
        self.field(keys).and_then(Value::as_bool)
    }

    pub fn string_field(&self, keys: &[&str]) -> Option<String> {
        match self.field(keys)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Console messages at `error` level, in buffer order
    ///
    /// Returns the total buffered message count alongside, so callers can
    /// track what they have already seen.
    pub fn console_errors(&self) -> (usize, Vec<(usize, ConsoleEntry)>) {
        let items = self.list(&["messages", "console", "logs"]);
        let errors = items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| {
                let level = item
                    .get("type")
                    .or_else(|| item.get("level"))
                    .and_then(Value::as_str)
                    .unwrap_or("log");
                if level != "error" {
                    return None;
                }
                let text = item
                    .get("text")
                    .or_else(|| item.get("message"))
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                Some((i, ConsoleEntry::console_error(text)))
            })
            .collect();
        (items.len(), errors)
    }

    /// Uncaught page exceptions, in buffer order
    pub fn page_errors(&self) -> Vec<ConsoleEntry> {
        self.list(&["errors", "pageErrors"])
            .iter()
            .map(|item| {
                let text = match item {
                    Value::String(s) => s.clone(),
                    other => other
                        .get("message")
                        .or_else(|| other.get("text"))
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| other.to_string()),
                };
                ConsoleEntry::page_error(text)
            })
            .collect()
    }

    fn list(&self, keys: &[&str]) -> Vec<Value> {
        match self.field(keys) {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_failure_envelope() {
        let err = CliResponse::parse(r#"{"success": false, "error": "Element not found"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("Element not found"));
    }

    #[test]
    fn test_scalar_and_object_data() {
        let object = CliResponse::parse(r#"{"success": true, "data": {"count": 3}}"#).unwrap();
        assert_eq!(object.usize_field(&["count"]), Some(3));

        let scalar = CliResponse::parse(r#"{"success": true, "data": true}"#).unwrap();
        assert_eq!(scalar.bool_field(&["visible"]), Some(true));

        let text = CliResponse::parse(r#"{"success": true, "data": {"title": "Form"}}"#).unwrap();
        assert_eq!(text.string_field(&["title", "text"]).as_deref(), Some("Form"));
    }

    #[test]
    fn test_unrecognised_payload_has_no_field() {
        let response =
            CliResponse::parse(r#"{"success": true, "data": {"unexpected": 1}}"#).unwrap();
        assert_eq!(response.bool_field(&["visible", "result"]), None);
        assert_eq!(response.string_field(&["text"]), None);

        let empty = CliResponse::parse(r#"{"success": true}"#).unwrap();
        assert_eq!(empty.string_field(&["value"]), None);
    }

    #[test]
    fn test_console_errors_keep_buffer_positions() {
        let response = CliResponse::parse(
            r#"{"success": true, "data": {"messages": [
                {"type": "log", "text": "ready"},
                {"type": "error", "text": "Failed to load resource"},
                {"type": "warning", "text": "deprecated"}
            ]}}"#,
        )
        .unwrap();

        let (total, errors) = response.console_errors();
        assert_eq!(total, 3);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, 1);
        assert_eq!(errors[0].1.to_string(), "[error] Failed to load resource");
    }

    #[test]
    fn test_page_errors_accept_strings_and_objects() {
        let response = CliResponse::parse(
            r#"{"success": true, "data": {"errors": [
                "ReferenceError: foo is not defined",
                {"message": "TypeError: bar"}
            ]}}"#,
        )
        .unwrap();

        let errors = response.page_errors();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[1].to_string(), "[PageError] TypeError: bar");
    }
}
