//! Document sources: turn a locator into an ordered set of tab matrices
//!
//! A source returns the raw text content of every tab — row 0 is the header
//! row, everything below is data. No types, no formulas, no styling.

use crate::error::{Result, SheetwatchError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One tab of the fetched document, as a rectangular text matrix
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawTab {
    pub name: String,
    pub matrix: Vec<Vec<String>>,
}

impl RawTab {
    /// The header row (empty slice when the tab has no rows at all)
    pub fn headers(&self) -> &[String] {
        self.matrix.first().map(|r| r.as_slice()).unwrap_or(&[])
    }

    /// Data rows below the header row
    pub fn data_rows(&self) -> &[Vec<String>] {
        if self.matrix.is_empty() {
            &[]
        } else {
            &self.matrix[1..]
        }
    }
}

/// A fetched document: tabs in source order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Workbook {
    pub tabs: Vec<RawTab>,
}

impl Workbook {
    pub fn tab_names(&self) -> Vec<&str> {
        self.tabs.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&RawTab> {
        self.tabs.iter().find(|t| t.name == name)
    }

    /// Tab names must be unique; fingerprints and snapshots are keyed by them
    pub fn check_unique_names(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for tab in &self.tabs {
            if !seen.insert(tab.name.as_str()) {
                return Err(SheetwatchError::parse(format!(
                    "duplicate tab name: {}",
                    tab.name
                )));
            }
        }
        Ok(())
    }
}

/// Fetches a document from a locator.
///
/// Implementations must return within the configured fetch deadline and
/// report overruns as errors; the run aborts rather than hang.
pub trait DocumentSource: Send + Sync {
    fn fetch(&self, locator: &str) -> Result<Workbook>;
}

/// Reads a whole workbook from a single JSON file:
/// `{"tabs": [{"name": "...", "matrix": [["h1","h2"], ...]}, ...]}`
#[derive(Debug, Default)]
pub struct JsonWorkbookSource;

impl DocumentSource for JsonWorkbookSource {
    fn fetch(&self, locator: &str) -> Result<Workbook> {
        let content = fs::read_to_string(locator).map_err(|e| {
            SheetwatchError::fetch(format!("cannot read {}: {}", locator, e))
        })?;
        let workbook: Workbook = serde_json::from_str(&content).map_err(|e| {
            SheetwatchError::parse(format!("invalid workbook in {}: {}", locator, e))
        })?;
        workbook.check_unique_names()?;
        log::debug!("Fetched {} tabs from {}", workbook.tabs.len(), locator);
        Ok(workbook)
    }
}

/// Reads a directory of CSV files as one workbook: every `*.csv` file is a
/// tab named after the file stem, in file-name order.
#[derive(Debug, Default)]
pub struct CsvDirectorySource;

impl DocumentSource for CsvDirectorySource {
    fn fetch(&self, locator: &str) -> Result<Workbook> {
        let dir = Path::new(locator);
        let mut files = Vec::new();

        let entries = fs::read_dir(dir).map_err(|e| {
            SheetwatchError::fetch(format!("cannot read directory {}: {}", locator, e))
        })?;
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map(|e| e == "csv").unwrap_or(false) {
                files.push(path);
            }
        }
        files.sort();

        let mut tabs = Vec::new();
        for path in files {
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| {
                    SheetwatchError::fetch(format!("unreadable file name: {}", path.display()))
                })?
                .to_string();
            let content = fs::read_to_string(&path).map_err(|e| {
                SheetwatchError::fetch(format!("cannot read {}: {}", path.display(), e))
            })?;
            let matrix = parse_csv(&content)
                .map_err(|e| SheetwatchError::parse(format!("{}: {}", path.display(), e)))?;
            tabs.push(RawTab {
                name,
                matrix: pad_rectangular(matrix),
            });
        }

        let workbook = Workbook { tabs };
        workbook.check_unique_names()?;
        log::debug!("Fetched {} tabs from {}", workbook.tabs.len(), locator);
        Ok(workbook)
    }
}

/// Pick a source implementation for a locator: a directory is read as CSV
/// files, a `.json` file as a workbook document.
pub fn source_for_locator(locator: &str) -> Result<Box<dyn DocumentSource>> {
    let path = Path::new(locator);
    if path.is_dir() {
        Ok(Box::new(CsvDirectorySource))
    } else if path.extension().map(|e| e == "json").unwrap_or(false) {
        Ok(Box::new(JsonWorkbookSource))
    } else {
        Err(SheetwatchError::fetch(format!(
            "unsupported source locator: {} (expected a directory of CSV files or a .json workbook)",
            locator
        )))
    }
}

/// Parse CSV text into rows of fields. Handles quoted fields with embedded
/// commas, newlines, and doubled quotes; accepts both LF and CRLF endings.
pub fn parse_csv(content: &str) -> std::result::Result<Vec<Vec<String>>, String> {
    let mut rows = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                record.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut record));
            }
            '\n' => {
                record.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err("unterminated quoted field".to_string());
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        rows.push(record);
    }

    Ok(rows)
}

/// Pad ragged rows with empty cells so every row has the same width
fn pad_rectangular(mut matrix: Vec<Vec<String>>) -> Vec<Vec<String>> {
    let width = matrix.iter().map(|r| r.len()).max().unwrap_or(0);
    for row in &mut matrix {
        while row.len() < width {
            row.push(String::new());
        }
    }
    matrix
}
