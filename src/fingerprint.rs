//! Whole-tab fingerprints and the gate that decides which tabs to diff

use crate::source::Workbook;
use blake3::Hasher;
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A fingerprint value represented as a hex string
pub type Fingerprint = String;

/// Compute the fingerprint of one raw matrix (header row + data rows,
/// unnormalized). Every row and cell is length-prefixed so content cannot
/// shift across a cell or row boundary without altering the digest.
pub fn fingerprint_matrix(matrix: &[Vec<String>]) -> Fingerprint {
    let mut hasher = Hasher::new();
    for row in matrix {
        hasher.update(&(row.len() as u64).to_le_bytes());
        for cell in row {
            hasher.update(&(cell.len() as u64).to_le_bytes());
            hasher.update(cell.as_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

/// Fingerprint every tab of a workbook, in tab order
pub fn fingerprint_workbook(workbook: &Workbook) -> IndexMap<String, Fingerprint> {
    let pairs: Vec<(String, Fingerprint)> = workbook
        .tabs
        .par_iter()
        .map(|tab| (tab.name.clone(), fingerprint_matrix(&tab.matrix)))
        .collect();
    pairs.into_iter().collect()
}

/// How each tab compares against the previous run's fingerprints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabClassification {
    /// Fingerprint equal to the stored one; no diff cost paid
    pub unchanged: Vec<String>,
    /// Fingerprint differs; proceeds to diffing
    pub changed: Vec<String>,
    /// No stored fingerprint; brand-new tab
    pub added: Vec<String>,
    /// Stored fingerprint with no current tab
    pub removed: Vec<String>,
    /// Current fingerprints for all present tabs, in tab order
    pub current: IndexMap<String, Fingerprint>,
}

impl TabClassification {
    pub fn has_changes(&self) -> bool {
        !self.changed.is_empty() || !self.added.is_empty() || !self.removed.is_empty()
    }

    /// Tabs that must be staged for commit (changed or added)
    pub fn tabs_to_stage(&self) -> Vec<&str> {
        self.changed
            .iter()
            .chain(self.added.iter())
            .map(|s| s.as_str())
            .collect()
    }
}

/// Compare current fingerprints against the previous run's map
pub fn classify_tabs(
    current: IndexMap<String, Fingerprint>,
    previous: &IndexMap<String, Fingerprint>,
) -> TabClassification {
    let mut unchanged = Vec::new();
    let mut changed = Vec::new();
    let mut added = Vec::new();

    for (name, fingerprint) in &current {
        match previous.get(name) {
            Some(prior) if prior == fingerprint => unchanged.push(name.clone()),
            Some(_) => changed.push(name.clone()),
            None => added.push(name.clone()),
        }
    }

    let removed: Vec<String> = previous
        .keys()
        .filter(|name| !current.contains_key(*name))
        .cloned()
        .collect();

    TabClassification {
        unchanged,
        changed,
        added,
        removed,
        current,
    }
}
