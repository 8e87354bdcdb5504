//! Header and row diffing with stable row keys
//!
//! Rows are matched by identifier value when the tab has an identifier
//! column, and by a content signature otherwise. Index-based matching is
//! never used: one inserted row must never cascade false changes across
//! every row below it.

use crate::snapshot::{effective_columns, EffectiveColumn, TabSnapshot};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// What a single change record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    /// A blank cell gained a value
    Added,
    /// A cell value changed
    Updated,
    /// A cell value became blank
    Cleared,
    RowAdded,
    RowDeleted,
    HeaderAdded,
    HeaderRemoved,
    HeaderOrderChanged,
    /// Synthetic marker appended when the per-tab cap was hit
    Truncated,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ChangeKind::Added => "Added",
            ChangeKind::Updated => "Updated",
            ChangeKind::Cleared => "Cleared",
            ChangeKind::RowAdded => "Row Added",
            ChangeKind::RowDeleted => "Row Deleted",
            ChangeKind::HeaderAdded => "Header Added",
            ChangeKind::HeaderRemoved => "Header Removed",
            ChangeKind::HeaderOrderChanged => "Header Order Changed",
            ChangeKind::Truncated => "Truncated",
        };
        write!(f, "{}", label)
    }
}

/// How serious a change record is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Shape changed: headers, tab presence, row existence
    Structural,
    /// A cell value changed
    Data,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Severity::Structural => "STRUCTURAL",
            Severity::Data => "DATA",
            Severity::Info => "INFO",
        };
        write!(f, "{}", label)
    }
}

/// One detected change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub row_key: String,
    pub column: String,
    pub kind: ChangeKind,
    pub before: String,
    pub after: String,
    pub severity: Severity,
}

impl ChangeRecord {
    fn header(kind: ChangeKind, before: String, after: String) -> Self {
        Self {
            row_key: String::new(),
            column: String::new(),
            kind,
            before,
            after,
            severity: Severity::Structural,
        }
    }

    fn truncated(omitted: usize) -> Self {
        Self {
            row_key: String::new(),
            column: String::new(),
            kind: ChangeKind::Truncated,
            before: String::new(),
            after: format!("{} more change(s) omitted", omitted),
            severity: Severity::Info,
        }
    }

    /// One-line rendering for reports and console output
    pub fn summary_line(&self) -> String {
        let detail = match self.kind {
            ChangeKind::Added => format!("{} {}: added '{}'", self.row_key, self.column, self.after),
            ChangeKind::Updated => format!(
                "{} {}: '{}' -> '{}'",
                self.row_key, self.column, self.before, self.after
            ),
            ChangeKind::Cleared => {
                format!("{} {}: cleared '{}'", self.row_key, self.column, self.before)
            }
            ChangeKind::RowAdded => {
                if self.after.is_empty() {
                    self.row_key.clone()
                } else {
                    format!("{} ({})", self.row_key, self.after)
                }
            }
            ChangeKind::RowDeleted => {
                if self.before.is_empty() {
                    self.row_key.clone()
                } else {
                    format!("{} ({})", self.row_key, self.before)
                }
            }
            ChangeKind::HeaderAdded => self.after.clone(),
            ChangeKind::HeaderRemoved => self.before.clone(),
            ChangeKind::HeaderOrderChanged => format!("{} -> {}", self.before, self.after),
            ChangeKind::Truncated => self.after.clone(),
        };
        format!("[{}] {}: {}", self.severity, self.kind, detail)
    }
}

/// All changes of one run, keyed by tab
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeSet {
    /// Per-tab records; tabs with an empty diff are not listed
    pub changes_by_tab: IndexMap<String, Vec<ChangeRecord>>,
    /// Tabs with no prior fingerprint
    pub added_tabs: Vec<String>,
    /// Tabs whose fingerprint exists but which are gone upstream
    pub removed_tabs: Vec<String>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.changes_by_tab.is_empty() && self.added_tabs.is_empty() && self.removed_tabs.is_empty()
    }

    pub fn total_records(&self) -> usize {
        self.changes_by_tab.values().map(Vec::len).sum()
    }

    /// Record a tab's diff; empty diffs are dropped
    pub fn insert_tab(&mut self, tab: impl Into<String>, records: Vec<ChangeRecord>) {
        if !records.is_empty() {
            self.changes_by_tab.insert(tab.into(), records);
        }
    }
}

/// Diffs two snapshots of a tab into change records
pub struct TabDiffer {
    id_column: String,
    change_cap: usize,
}

impl TabDiffer {
    pub fn new(id_column: impl Into<String>, change_cap: usize) -> Self {
        Self {
            id_column: id_column.into(),
            change_cap,
        }
    }

    /// Full diff of one tab: header records, then row records, capped
    pub fn diff_tab(&self, prev: &TabSnapshot, curr: &TabSnapshot) -> Vec<ChangeRecord> {
        let mut records = Self::diff_headers(&prev.headers, &curr.headers);
        records.extend(self.diff_rows(prev, curr));
        self.apply_cap(records)
    }

    /// Compare two raw header rows.
    ///
    /// Headers are trimmed and blank entries dropped on both sides. All
    /// added names collapse into one record, likewise all removed names.
    /// An order record is emitted only when the name sets are identical
    /// but the sequences differ.
    pub fn diff_headers(prev: &[String], curr: &[String]) -> Vec<ChangeRecord> {
        let prev_names: Vec<&str> = prev
            .iter()
            .map(|h| h.trim())
            .filter(|h| !h.is_empty())
            .collect();
        let curr_names: Vec<&str> = curr
            .iter()
            .map(|h| h.trim())
            .filter(|h| !h.is_empty())
            .collect();

        let prev_set: IndexSet<&str> = prev_names.iter().copied().collect();
        let curr_set: IndexSet<&str> = curr_names.iter().copied().collect();

        let added: Vec<&str> = curr_set.difference(&prev_set).copied().collect();
        let removed: Vec<&str> = prev_set.difference(&curr_set).copied().collect();

        let mut records = Vec::new();

        if !added.is_empty() {
            records.push(ChangeRecord::header(
                ChangeKind::HeaderAdded,
                String::new(),
                added.join(", "),
            ));
        }
        if !removed.is_empty() {
            records.push(ChangeRecord::header(
                ChangeKind::HeaderRemoved,
                removed.join(", "),
                String::new(),
            ));
        }

        if added.is_empty() && removed.is_empty() && prev_names != curr_names {
            records.push(ChangeRecord::header(
                ChangeKind::HeaderOrderChanged,
                prev_names.join(", "),
                curr_names.join(", "),
            ));
        }

        records
    }

    /// Compare the row sets of two snapshots.
    ///
    /// Structural records (whole rows appearing or disappearing) come
    /// first, then cell-level records for rows present on both sides.
    pub fn diff_rows(&self, prev: &TabSnapshot, curr: &TabSnapshot) -> Vec<ChangeRecord> {
        let prev_keys = self.row_keys(prev);
        let curr_keys = self.row_keys(curr);

        let prev_map: IndexMap<&str, &IndexMap<String, String>> = prev_keys
            .iter()
            .map(|k| k.as_str())
            .zip(prev.rows.iter())
            .collect();
        let curr_map: IndexMap<&str, &IndexMap<String, String>> = curr_keys
            .iter()
            .map(|k| k.as_str())
            .zip(curr.rows.iter())
            .collect();

        let mut records = Vec::new();

        for (key, row) in &curr_map {
            if !prev_map.contains_key(*key) {
                records.push(ChangeRecord {
                    row_key: key.to_string(),
                    column: String::new(),
                    kind: ChangeKind::RowAdded,
                    before: String::new(),
                    after: row_preview(row),
                    severity: Severity::Structural,
                });
            }
        }
        for (key, row) in &prev_map {
            if !curr_map.contains_key(*key) {
                records.push(ChangeRecord {
                    row_key: key.to_string(),
                    column: String::new(),
                    kind: ChangeKind::RowDeleted,
                    before: row_preview(row),
                    after: String::new(),
                    severity: Severity::Structural,
                });
            }
        }

        let columns = comparable_columns(prev, curr);
        for (key, curr_row) in &curr_map {
            let Some(prev_row) = prev_map.get(*key) else {
                continue;
            };

            for column in &columns {
                let before = prev_row.get(column).map(|v| v.trim()).unwrap_or("");
                let after = curr_row.get(column).map(|v| v.trim()).unwrap_or("");
                if before == after {
                    continue;
                }

                let kind = if before.is_empty() {
                    ChangeKind::Added
                } else if after.is_empty() {
                    ChangeKind::Cleared
                } else {
                    ChangeKind::Updated
                };

                records.push(ChangeRecord {
                    row_key: key.to_string(),
                    column: column.clone(),
                    kind,
                    before: before.to_string(),
                    after: after.to_string(),
                    severity: Severity::Data,
                });
            }
        }

        records
    }

    /// Derive the stable key of every row, in row order.
    ///
    /// Key is `id:<value>` when the identifier column exists and the row has
    /// a non-blank value there, `sig:<hash>` otherwise. Colliding keys get
    /// `#2`, `#3`, … appended in first-seen order, skipping over keys a
    /// literal id value already occupies.
    pub fn row_keys(&self, snapshot: &TabSnapshot) -> Vec<String> {
        let columns = effective_columns(&snapshot.headers);
        let id_key = columns
            .iter()
            .find(|c| !c.placeholder && c.key.eq_ignore_ascii_case(&self.id_column))
            .map(|c| c.key.clone());

        let mut counts: IndexMap<String, usize> = IndexMap::new();
        let mut taken: IndexSet<String> = IndexSet::new();

        snapshot
            .rows
            .iter()
            .map(|row| {
                let id_value = id_key
                    .as_deref()
                    .and_then(|k| row.get(k))
                    .map(|v| v.trim())
                    .filter(|v| !v.is_empty());

                let base = match id_value {
                    Some(value) => format!("id:{}", value),
                    None => format!("sig:{}", signature_hash(row, &columns)),
                };

                let seen = counts.entry(base.clone()).or_insert(0);
                *seen += 1;
                let mut key = if *seen == 1 {
                    base.clone()
                } else {
                    format!("{}#{}", base, seen)
                };
                // An id like "R1#2" can occupy a key the counter would mint
                // for a duplicate; every row must keep a key of its own.
                while !taken.insert(key.clone()) {
                    *seen += 1;
                    key = format!("{}#{}", base, seen);
                }
                key
            })
            .collect()
    }

    /// Truncate to the per-tab cap and mark the cut. Records arrive
    /// structural-first, so truncation always drops data records before
    /// structural ones.
    fn apply_cap(&self, mut records: Vec<ChangeRecord>) -> Vec<ChangeRecord> {
        if records.len() <= self.change_cap {
            return records;
        }

        let omitted = records.len() - self.change_cap;
        records.truncate(self.change_cap);
        records.push(ChangeRecord::truncated(omitted));
        records
    }
}

/// Content signature of a row: sorted (column, trimmed value) pairs, blank
/// values and placeholder columns excluded, hashed with length prefixes.
fn signature_hash(row: &IndexMap<String, String>, columns: &[EffectiveColumn]) -> String {
    let mut pairs: Vec<(&str, &str)> = columns
        .iter()
        .filter(|c| !c.placeholder)
        .filter_map(|c| row.get(&c.key).map(|v| (c.key.as_str(), v.trim())))
        .filter(|(_, v)| !v.is_empty())
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    let mut hasher = blake3::Hasher::new();
    for (column, value) in &pairs {
        hasher.update(&(column.len() as u64).to_le_bytes());
        hasher.update(column.as_bytes());
        hasher.update(&(value.len() as u64).to_le_bytes());
        hasher.update(value.as_bytes());
    }
    let hex = hasher.finalize().to_hex();
    hex.as_str()[..16].to_string()
}

/// Union of comparable columns: current tab's order first, then columns
/// that only the previous side had. Placeholder columns never compare.
fn comparable_columns(prev: &TabSnapshot, curr: &TabSnapshot) -> Vec<String> {
    let mut columns: IndexSet<String> = effective_columns(&curr.headers)
        .into_iter()
        .filter(|c| !c.placeholder)
        .map(|c| c.key)
        .collect();
    for column in effective_columns(&prev.headers) {
        if !column.placeholder {
            columns.insert(column.key);
        }
    }
    columns.into_iter().collect()
}

/// Compact rendering of a row's leading non-blank cells
fn row_preview(row: &IndexMap<String, String>) -> String {
    let cells: Vec<String> = row
        .iter()
        .filter(|(_, v)| !v.trim().is_empty())
        .map(|(c, v)| format!("{}={}", c, v.trim()))
        .collect();

    if cells.len() > 3 {
        format!("{}, …", cells[..3].join(", "))
    } else {
        cells.join(", ")
    }
}
