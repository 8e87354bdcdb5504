//! Watch configuration persisted in the workspace

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration for watch runs, stored as `.sheetwatch/config.json`.
///
/// Every field has a default so configs written by older versions keep
/// loading after new fields are added.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchConfig {
    #[serde(default = "default_version")]
    pub version: String,

    /// Identifier column for stable row keys, matched case-insensitively
    #[serde(default = "default_id_column")]
    pub id_column: String,

    /// Age in milliseconds after which a lock marker is presumed abandoned
    #[serde(default = "default_stale_lock_ms")]
    pub stale_lock_ms: u64,

    /// Maximum number of change records reported per tab
    #[serde(default = "default_tab_change_cap")]
    pub tab_change_cap: usize,

    /// Deadline in milliseconds for fetching the source document
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Deadline in milliseconds for notification delivery
    #[serde(default = "default_notify_timeout_ms")]
    pub notify_timeout_ms: u64,

    /// Default source locator used when `run` is invoked without one
    #[serde(default)]
    pub source: Option<String>,

    /// Shell command that receives the notification payload on stdin
    #[serde(default)]
    pub notify_command: Option<String>,

    /// Write CSV artifacts for changed tabs and attach their references
    #[serde(default = "default_export_changed_tabs")]
    pub export_changed_tabs: bool,
}

fn default_version() -> String {
    crate::FORMAT_VERSION.to_string()
}

fn default_id_column() -> String {
    crate::DEFAULT_ID_COLUMN.to_string()
}

fn default_stale_lock_ms() -> u64 {
    crate::DEFAULT_STALE_LOCK_MS
}

fn default_tab_change_cap() -> usize {
    crate::DEFAULT_TAB_CHANGE_CAP
}

fn default_fetch_timeout_ms() -> u64 {
    crate::DEFAULT_FETCH_TIMEOUT_MS
}

fn default_notify_timeout_ms() -> u64 {
    crate::DEFAULT_NOTIFY_TIMEOUT_MS
}

fn default_export_changed_tabs() -> bool {
    true
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            id_column: default_id_column(),
            stale_lock_ms: default_stale_lock_ms(),
            tab_change_cap: default_tab_change_cap(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            notify_timeout_ms: default_notify_timeout_ms(),
            source: None,
            notify_command: None,
            export_changed_tabs: default_export_changed_tabs(),
        }
    }
}

impl WatchConfig {
    /// Load the configuration, falling back to defaults when the file is absent
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| crate::error::SheetwatchError::config(format!(
                "invalid config at {}: {}",
                path.display(),
                e
            )))?;
        Ok(config)
    }

    /// Persist the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
