//! Configuration management for form-smoke
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/form-smoke/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::error::{Result, SmokeError};

/// Main configuration for a smoke run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// What to test
    #[serde(default)]
    pub target: TargetConfig,
    /// Browser session settings
    #[serde(default)]
    pub browser: BrowserConfig,
    /// Detection heuristics and thresholds
    #[serde(default)]
    pub checks: ChecksConfig,
    /// Where artifacts are written
    #[serde(default)]
    pub output: OutputConfig,
}

/// Target application
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// URL under test; falls back to `deploy_config` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Deployment descriptor holding `ownerDeploymentId`
    pub deploy_config: PathBuf,
}

/// Browser session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Session name for agent-browser
    pub session_name: String,
    /// Whether to run in headed mode (visible browser)
    pub headed: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Value sent as the page locale / Accept-Language
    pub locale: String,
    /// Navigation limit in ms
    pub page_load_timeout_ms: u64,
    /// Click limit in ms
    pub action_timeout_ms: u64,
    /// Pause after the submit click in ms
    pub settle_ms: u64,
    /// How often buffered console events are collected, in ms
    pub console_poll_ms: u64,
}

/// Detection heuristics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChecksConfig {
    /// Text typed into the detected input
    pub input_text: String,
    /// Button labels tried in priority order
    pub submit_labels: Vec<String>,
    /// Selectors that indicate an on-screen error
    pub error_selectors: Vec<String>,
    /// Console entries listed in the report before truncation
    pub max_console_errors: usize,
    /// Characters kept from each on-screen error text
    pub error_text_limit: usize,
}

/// Output artifacts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Spreadsheet report path
    pub report_path: PathBuf,
    /// Directory for screenshots
    pub screenshot_dir: PathBuf,
}

fn env_flag(name: &str) -> Option<bool> {
    env::var(name).ok().map(|v| v == "true" || v == "1")
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            url: env::var("FORM_SMOKE_URL").ok().filter(|u| !u.trim().is_empty()),
            deploy_config: env::var("FORM_SMOKE_DEPLOY_CONFIG")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("deploy-config.json")),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            session_name: env::var("FORM_SMOKE_SESSION")
                .unwrap_or_else(|_| "form-smoke".to_string()),
            headed: env_flag("FORM_SMOKE_HEADED").unwrap_or(false),
            viewport_width: 1280,
            viewport_height: 720,
            locale: "ja-JP".to_string(),
            page_load_timeout_ms: 30_000,
            action_timeout_ms: 10_000,
            settle_ms: 3_000,
            console_poll_ms: 250,
        }
    }
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            input_text: env::var("FORM_SMOKE_INPUT_TEXT")
                .unwrap_or_else(|_| "テスト入力".to_string()),
            submit_labels: ["送信", "保存", "登録", "追加", "確認"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            error_selectors: [
                ".error",
                ".alert-danger",
                ".error-message",
                "[role=\"alert\"]",
                ".toast-error",
                // SweetAlert2 dialogs
                ".swal2-popup",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            max_console_errors: 10,
            error_text_limit: 100,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_path: env::var("FORM_SMOKE_REPORT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("test_results.xlsx")),
            screenshot_dir: env::var("FORM_SMOKE_SCREENSHOTS")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("screenshots")),
        }
    }
}

/// Subset of the deployment descriptor we read
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeployDescriptor {
    #[serde(default)]
    owner_deployment_id: Option<String>,
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("form-smoke")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from an explicit file, the default file, or defaults
    /// Priority: explicit path > default config file > env-aware defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        match path {
            Some(p) => Self::load_from_file(p),
            None => {
                let default_path = Self::config_file();
                if default_path.exists() {
                    Self::load_from_file(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            SmokeError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text; missing sections use defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| SmokeError::config(format!("Failed to parse config: {}", e)))
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| SmokeError::config(format!("Failed to serialize config: {}", e)))
    }

    /// Resolve the URL under test
    ///
    /// An explicit `target.url` wins; otherwise the Apps Script exec URL is
    /// derived from `ownerDeploymentId` in the deployment descriptor.
    pub fn target_url(&self) -> Result<String> {
        if let Some(url) = self.target.url.as_deref().map(str::trim) {
            if !url.is_empty() {
                return Ok(url.to_string());
            }
        }

        let path = &self.target.deploy_config;
        if !path.exists() {
            return Err(SmokeError::config(format!(
                "No target URL. Pass --url, set FORM_SMOKE_URL, or provide {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path)?;
        let descriptor: DeployDescriptor = serde_json::from_str(&content)?;
        let id = descriptor
            .owner_deployment_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                SmokeError::config(format!("{} has no ownerDeploymentId", path.display()))
            })?;

        Ok(format!("https://script.google.com/macros/s/{}/exec", id))
    }

    /// Check that the configuration can drive a run
    pub fn validate(&self) -> Result<()> {
        let raw = self.target_url()?;
        let parsed = url::Url::parse(&raw)
            .map_err(|e| SmokeError::config(format!("Invalid target URL '{}': {}", raw, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SmokeError::config(format!(
                "Target URL must be http(s), got '{}'",
                parsed.scheme()
            )));
        }

        if self.browser.page_load_timeout_ms == 0 || self.browser.action_timeout_ms == 0 {
            return Err(SmokeError::config("Timeouts must be greater than zero"));
        }

        if self.checks.input_text.is_empty() {
            return Err(SmokeError::config("Test input text must not be empty"));
        }

        Ok(())
    }
}

impl BrowserConfig {
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_millis(self.page_load_timeout_ms)
    }

    pub fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.action_timeout_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn console_poll(&self) -> Duration {
        Duration::from_millis(self.console_poll_ms.max(10))
    }
}
