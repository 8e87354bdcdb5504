//! Changed-tab exports
//!
//! Tabs that changed in a run can be written out in full, so downstream
//! consumers receive current content alongside the diff records instead
//! of having to re-fetch the document themselves.

use crate::error::{Result, SheetwatchError};
use crate::source::RawTab;
use crate::workspace::sanitize_component;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Reference to one exported file, carried in notification payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub tab: String,
    pub path: PathBuf,
    pub format: String,
}

/// Writes the current content of one tab to a file under `dir`
pub trait TabExporter: Send + Sync {
    fn export(&self, tab: &RawTab, dir: &Path) -> Result<ArtifactRef>;
}

/// CSV exporter. Cells containing commas, quotes, or line breaks are
/// quoted with doubled inner quotes.
pub struct CsvExporter;

impl CsvExporter {
    fn render(matrix: &[Vec<String>]) -> String {
        let mut content = String::new();

        for row in matrix {
            let cells: Vec<String> = row.iter().map(|v| escape_csv_value(v)).collect();
            content.push_str(&cells.join(","));
            content.push('\n');
        }

        content
    }
}

impl TabExporter for CsvExporter {
    fn export(&self, tab: &RawTab, dir: &Path) -> Result<ArtifactRef> {
        std::fs::create_dir_all(dir).map_err(|e| {
            SheetwatchError::export(format!(
                "failed to create export directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        // Same stem scheme as snapshots: sanitized name plus a short hash of
        // the raw name so distinct tabs cannot collide on one file
        let digest = blake3::hash(tab.name.as_bytes()).to_hex();
        let file_name = format!(
            "{}-{}.csv",
            sanitize_component(&tab.name),
            &digest.as_str()[..8]
        );
        let path = dir.join(file_name);

        std::fs::write(&path, Self::render(&tab.matrix)).map_err(|e| {
            SheetwatchError::export(format!("failed to write {}: {}", path.display(), e))
        })?;

        log::debug!("Exported tab '{}' to {}", tab.name, path.display());

        Ok(ArtifactRef {
            tab: tab.name.clone(),
            path,
            format: "csv".to_string(),
        })
    }
}

fn escape_csv_value(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
