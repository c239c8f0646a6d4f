use crate::error::Result;
use crate::paths;
use crate::setting::CHANGE_EVENT_SUFFIX;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_PRE_DEPLOYMENT_PATTERN: &str = "(?i)pre-deployment validation failed";

// ---------------------------------------------------------------------------
// ConfigWarning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub field: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// ExplorerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// How long a pre-deployment rejection keeps the busy state while
    /// waiting for a late notification.
    #[serde(default = "default_late_wait_ms")]
    pub late_notification_wait_ms: u64,
    /// Matched against local submission errors that may still be followed
    /// by a deployment notification.
    #[serde(default = "default_pre_deployment_pattern")]
    pub pre_deployment_failure_pattern: String,
    #[serde(default = "default_change_event_suffix")]
    pub change_event_suffix: String,
    /// Shown when a failure notification carries no message.
    #[serde(default = "default_generic_failure")]
    pub generic_failure_message: String,
}

fn default_late_wait_ms() -> u64 {
    15_000
}

fn default_pre_deployment_pattern() -> String {
    DEFAULT_PRE_DEPLOYMENT_PATTERN.to_string()
}

fn default_change_event_suffix() -> String {
    CHANGE_EVENT_SUFFIX.to_string()
}

fn default_generic_failure() -> String {
    "The deployment failed. Review your changes and try again.".to_string()
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            late_notification_wait_ms: default_late_wait_ms(),
            pre_deployment_failure_pattern: default_pre_deployment_pattern(),
            change_event_suffix: default_change_event_suffix(),
            generic_failure_message: default_generic_failure(),
        }
    }
}

impl ExplorerConfig {
    /// Load `<root>/.trigger-explorer/config.yaml`, or defaults if absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: ExplorerConfig = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn late_notification_wait(&self) -> Duration {
        Duration::from_millis(self.late_notification_wait_ms)
    }

    /// Compiled failure pattern; an invalid pattern falls back to the default.
    pub fn pre_deployment_regex(&self) -> Regex {
        Regex::new(&self.pre_deployment_failure_pattern).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "invalid pre_deployment_failure_pattern, using default");
            Regex::new(DEFAULT_PRE_DEPLOYMENT_PATTERN).unwrap()
        })
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        if let Err(e) = Regex::new(&self.pre_deployment_failure_pattern) {
            warnings.push(ConfigWarning {
                field: "pre_deployment_failure_pattern".into(),
                message: format!("invalid regex: {e}"),
            });
        }
        if self.late_notification_wait_ms == 0 {
            warnings.push(ConfigWarning {
                field: "late_notification_wait_ms".into(),
                message: "a zero wait surfaces pre-deployment failures immediately".into(),
            });
        }
        if self.change_event_suffix.trim().is_empty() {
            warnings.push(ConfigWarning {
                field: "change_event_suffix".into(),
                message: "empty suffix disables change-event detection".into(),
            });
        }
        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
