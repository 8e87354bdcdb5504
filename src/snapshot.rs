//! Snapshot and state documents: the committed truth between runs
//!
//! A snapshot holds one tab's {headers, rows} exactly as last committed. The
//! state document holds the per-tab fingerprint map and the last-checked
//! timestamp. Both are only ever replaced through an atomic rename, so a
//! crash mid-write leaves the prior document intact.

use crate::error::{Result, SheetwatchError};
use crate::workspace::SheetwatchWorkspace;
use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn default_format_version() -> String {
    crate::FORMAT_VERSION.to_string()
}

/// One column after header normalization.
///
/// Blank headers get a positional placeholder name; repeated names get
/// `#2`, `#3`, … in first-seen order so row maps stay keyable.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveColumn {
    pub key: String,
    pub placeholder: bool,
}

/// Derive effective column names from a raw header row
pub fn effective_columns(headers: &[String]) -> Vec<EffectiveColumn> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    let mut taken: IndexSet<String> = IndexSet::new();

    headers
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            let trimmed = raw.trim();
            let (base, placeholder) = if trimmed.is_empty() {
                (format!("(column {})", i + 1), true)
            } else {
                (trimmed.to_string(), false)
            };

            let seen = counts.entry(base.clone()).or_insert(0);
            *seen += 1;
            let mut key = if *seen == 1 {
                base.clone()
            } else {
                format!("{}#{}", base, seen)
            };
            // A header like "amount#2" can occupy a key the counter would
            // mint; a shadowed key would drop a column from every row map
            while !taken.insert(key.clone()) {
                *seen += 1;
                key = format!("{}#{}", base, seen);
            }

            EffectiveColumn { key, placeholder }
        })
        .collect()
}

/// Committed {headers, rows} for one tab
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TabSnapshot {
    #[serde(default = "default_format_version")]
    pub format_version: String,
    pub tab: String,
    /// Raw header row as fetched (may repeat or be blank)
    pub headers: Vec<String>,
    /// Data rows keyed by effective column name, in source order
    pub rows: Vec<IndexMap<String, String>>,
}

impl TabSnapshot {
    /// Extract a snapshot from a raw matrix (row 0 = headers).
    ///
    /// Rows that are entirely blank after trimming are dropped here, before
    /// any diffing happens. Missing trailing cells read as empty.
    pub fn from_matrix(tab: &str, matrix: &[Vec<String>]) -> Self {
        let headers = matrix.first().cloned().unwrap_or_default();
        let columns = effective_columns(&headers);

        let rows = matrix
            .iter()
            .skip(1)
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .map(|row| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(i, col)| {
                        let value = row.get(i).cloned().unwrap_or_default();
                        (col.key.clone(), value)
                    })
                    .collect()
            })
            .collect();

        Self {
            format_version: default_format_version(),
            tab: tab.to_string(),
            headers,
            rows,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }
}

/// Persisted run state: fingerprint per tab plus last-checked timestamp
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchState {
    #[serde(default = "default_format_version")]
    pub format_version: String,
    pub tab_fingerprints: IndexMap<String, String>,
    pub checked_at: DateTime<Utc>,
}

impl WatchState {
    pub fn new(tab_fingerprints: IndexMap<String, String>, checked_at: DateTime<Utc>) -> Self {
        Self {
            format_version: default_format_version(),
            tab_fingerprints,
            checked_at,
        }
    }
}

/// Durable storage for snapshots and state under the workspace directory
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    workspace: SheetwatchWorkspace,
}

impl SnapshotStore {
    pub fn new(workspace: SheetwatchWorkspace) -> Self {
        Self { workspace }
    }

    /// Load the state document, or `None` before the first commit
    pub fn load_state(&self) -> Result<Option<WatchState>> {
        let path = self.workspace.state_path();
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        let state: WatchState = serde_json::from_str(&content)
            .map_err(|_| SheetwatchError::InvalidSnapshot { path })?;
        Ok(Some(state))
    }

    /// Atomically replace the state document
    pub fn save_state(&self, state: &WatchState) -> Result<()> {
        let bytes = serde_json::to_string_pretty(state)?;
        self.atomic_write(&self.workspace.state_path(), bytes.as_bytes())
    }

    /// Load one tab's committed snapshot
    pub fn load_snapshot(&self, tab: &str) -> Result<TabSnapshot> {
        let path = self.workspace.snapshot_path(tab);
        if !path.exists() {
            return Err(SheetwatchError::SnapshotNotFound {
                tab: tab.to_string(),
            });
        }

        let content = fs::read_to_string(&path)?;
        let snapshot: TabSnapshot = serde_json::from_str(&content)
            .map_err(|_| SheetwatchError::InvalidSnapshot { path })?;
        Ok(snapshot)
    }

    pub fn snapshot_exists(&self, tab: &str) -> bool {
        self.workspace.snapshot_exists(tab)
    }

    /// Atomically replace one tab's snapshot document
    pub fn save_snapshot(&self, snapshot: &TabSnapshot) -> Result<()> {
        let bytes = serde_json::to_string_pretty(snapshot)?;
        self.atomic_write(
            &self.workspace.snapshot_path(&snapshot.tab),
            bytes.as_bytes(),
        )
    }

    /// Remove one tab's snapshot; absent files are not an error
    pub fn delete_snapshot(&self, tab: &str) -> Result<()> {
        let path = self.workspace.snapshot_path(tab);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SheetwatchError::persist(format!(
                "cannot remove {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Write to a temp sibling, then rename over the target. The rename is
    /// the only externally visible step, so readers see old-or-new, never a
    /// partial document.
    fn atomic_write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, data).map_err(|e| {
            SheetwatchError::persist(format!("cannot write {}: {}", tmp.display(), e))
        })?;
        fs::rename(&tmp, path).map_err(|e| {
            SheetwatchError::persist(format!("cannot replace {}: {}", path.display(), e))
        })?;
        Ok(())
    }
}
