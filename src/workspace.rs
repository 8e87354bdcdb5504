//! Workspace management for sheetwatch state

use crate::config::WatchConfig;
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Manages the .sheetwatch workspace directory
#[derive(Debug, Clone)]
pub struct SheetwatchWorkspace {
    /// Project root directory (where .sheetwatch/ lives)
    pub root: PathBuf,
    /// .sheetwatch/ directory path
    pub sheetwatch_dir: PathBuf,
    /// .sheetwatch/snapshots/ directory path
    pub snapshots_dir: PathBuf,
    /// .sheetwatch/reports/ directory path
    pub reports_dir: PathBuf,
    /// .sheetwatch/exports/ directory path
    pub exports_dir: PathBuf,
}

impl SheetwatchWorkspace {
    /// Find existing workspace or create a new one
    pub fn find_or_create(start_dir: Option<&Path>) -> Result<Self> {
        let current_dir = std::env::current_dir()?;
        let start = start_dir.unwrap_or(&current_dir);

        if let Some(workspace) = Self::find_existing(start)? {
            return Ok(workspace);
        }

        let root = start.to_path_buf();
        Self::create_new(root)
    }

    /// Find existing .sheetwatch workspace by walking up the directory tree
    fn find_existing(start_dir: &Path) -> Result<Option<Self>> {
        let mut current = start_dir;

        loop {
            let sheetwatch_dir = current.join(".sheetwatch");
            if sheetwatch_dir.exists() && sheetwatch_dir.is_dir() {
                return Ok(Some(Self::from_root(current.to_path_buf())?));
            }

            // A .git directory marks a plausible project root; stop there
            let git_dir = current.join(".git");
            if git_dir.exists() {
                break;
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        Ok(None)
    }

    /// Create a new workspace in the specified root directory
    pub fn create_new(root: PathBuf) -> Result<Self> {
        let workspace = Self::from_root(root)?;

        fs::create_dir_all(&workspace.sheetwatch_dir)?;
        fs::create_dir_all(&workspace.snapshots_dir)?;
        fs::create_dir_all(&workspace.reports_dir)?;
        fs::create_dir_all(&workspace.exports_dir)?;

        // Write a default config if none exists yet
        if !workspace.config_path().exists() {
            WatchConfig::default().save(&workspace.config_path())?;
        }

        workspace.ensure_gitignore()?;

        log::info!(
            "Created sheetwatch workspace at: {}",
            workspace.root.display()
        );

        Ok(workspace)
    }

    /// Create workspace from root directory path
    pub fn from_root(root: PathBuf) -> Result<Self> {
        let sheetwatch_dir = root.join(".sheetwatch");
        let snapshots_dir = sheetwatch_dir.join("snapshots");
        let reports_dir = sheetwatch_dir.join("reports");
        let exports_dir = sheetwatch_dir.join("exports");

        Ok(Self {
            root,
            sheetwatch_dir,
            snapshots_dir,
            reports_dir,
            exports_dir,
        })
    }

    /// Path of the persisted state document
    pub fn state_path(&self) -> PathBuf {
        self.sheetwatch_dir.join("state.json")
    }

    /// Path of the run lock marker
    pub fn lock_path(&self) -> PathBuf {
        self.sheetwatch_dir.join("lock.json")
    }

    /// Path of the workspace configuration file
    pub fn config_path(&self) -> PathBuf {
        self.sheetwatch_dir.join("config.json")
    }

    /// Path of the snapshot document for one tab.
    ///
    /// The file stem combines the sanitized tab name with a short hash of the
    /// raw name, so tabs whose names sanitize identically ("Q1/Q2" vs "Q1 Q2")
    /// still map to distinct files.
    pub fn snapshot_path(&self, tab: &str) -> PathBuf {
        let digest = blake3::hash(tab.as_bytes()).to_hex();
        let stem = sanitize_component(tab);
        self.snapshots_dir
            .join(format!("{}-{}.json", stem, &digest.as_str()[..8]))
    }

    /// List the tab names of all committed snapshots
    pub fn list_snapshot_tabs(&self) -> Result<Vec<String>> {
        let mut tabs = Vec::new();

        if !self.snapshots_dir.exists() {
            return Ok(tabs);
        }

        for entry in fs::read_dir(&self.snapshots_dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().map(|e| e == "json").unwrap_or(false) {
                // The real tab name is embedded in the document itself since
                // file stems are sanitized
                let content = fs::read_to_string(&path)?;
                let doc: serde_json::Value = serde_json::from_str(&content)?;
                if let Some(name) = doc.get("tab").and_then(|v| v.as_str()) {
                    tabs.push(name.to_string());
                }
            }
        }

        tabs.sort();
        Ok(tabs)
    }

    /// Check if a committed snapshot exists for a tab
    pub fn snapshot_exists(&self, tab: &str) -> bool {
        self.snapshot_path(tab).exists()
    }

    /// Ensure .gitignore covers the transient workspace files
    pub fn ensure_gitignore(&self) -> Result<()> {
        let gitignore_path = self.root.join(".gitignore");
        let sheetwatch_ignore =
            "# Ignore transient sheetwatch files\n.sheetwatch/lock.json\n.sheetwatch/exports/\n.sheetwatch/reports/\n";

        if gitignore_path.exists() {
            let content = fs::read_to_string(&gitignore_path)?;
            if !content.contains(".sheetwatch/lock.json") {
                let new_content = if content.ends_with('\n') {
                    format!("{}\n{}", content, sheetwatch_ignore)
                } else {
                    format!("{}\n\n{}", content, sheetwatch_ignore)
                };
                fs::write(gitignore_path, new_content)?;
                log::info!("Updated .gitignore with sheetwatch entries");
            }
        } else {
            fs::write(gitignore_path, sheetwatch_ignore)?;
            log::info!("Created .gitignore with sheetwatch entries");
        }

        Ok(())
    }

    /// Get workspace statistics
    pub fn stats(&self) -> Result<WorkspaceStats> {
        let mut stats = WorkspaceStats::default();

        if self.snapshots_dir.exists() {
            for entry in fs::read_dir(&self.snapshots_dir)? {
                let entry = entry?;
                if entry.path().extension().map(|e| e == "json").unwrap_or(false) {
                    stats.snapshot_count += 1;
                    stats.total_snapshot_size += entry.metadata()?.len();
                }
            }
        }

        if self.state_path().exists() {
            stats.state_size = fs::metadata(self.state_path())?.len();
        }

        if self.reports_dir.exists() {
            for entry in WalkDir::new(&self.reports_dir) {
                let entry = entry?;
                if entry.file_type().is_file() {
                    stats.report_count += 1;
                    stats.total_report_size += entry.metadata()?.len();
                }
            }
        }

        if self.exports_dir.exists() {
            for entry in WalkDir::new(&self.exports_dir) {
                let entry = entry?;
                if entry.file_type().is_file() {
                    stats.export_count += 1;
                    stats.total_export_size += entry.metadata()?.len();
                }
            }
        }

        Ok(stats)
    }
}

/// Replace path-hostile characters in a tab name
pub(crate) fn sanitize_component(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Statistics about the workspace
#[derive(Debug, Default)]
pub struct WorkspaceStats {
    pub snapshot_count: usize,
    pub report_count: usize,
    pub export_count: usize,
    pub total_snapshot_size: u64,
    pub total_report_size: u64,
    pub total_export_size: u64,
    pub state_size: u64,
}
