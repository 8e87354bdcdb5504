//! Run coordination: fetch, fingerprint, diff, notify, commit
//!
//! A run advances persistent state only after every notification channel
//! has accepted the payload. Any failure before that point leaves the
//! workspace exactly as the previous run committed it, so the next run
//! re-detects and re-delivers the same changes. Duplicate notifications
//! are the accepted cost.

use crate::config::WatchConfig;
use crate::diff::{ChangeRecord, ChangeSet, TabDiffer};
use crate::error::{Result, SheetwatchError};
use crate::export::{ArtifactRef, TabExporter};
use crate::fingerprint::{classify_tabs, fingerprint_workbook, TabClassification};
use crate::lock::RunLock;
use crate::notify::{Notifier, NotifyPayload};
use crate::progress::ProgressReporter;
use crate::snapshot::{SnapshotStore, TabSnapshot, WatchState};
use crate::source::{DocumentSource, Workbook};
use crate::workspace::SheetwatchWorkspace;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

/// What one run saw and did
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub document: String,
    pub checked_at: DateTime<Utc>,
    /// True when no prior fingerprints existed and this run captured a baseline
    pub first_run: bool,
    pub dry_run: bool,
    /// False for dry runs, true once snapshots and state were persisted
    pub committed: bool,
    /// True when the payload went out to the notification channels
    pub notified: bool,
    /// True when this run took over an abandoned lock marker
    pub stale_lock_recovered: bool,
    pub tabs_seen: usize,
    pub duration_ms: u64,
    pub changes: ChangeSet,
    pub attachments: Vec<ArtifactRef>,
}

/// Drives one watch run end to end
pub struct RunCoordinator {
    workspace: SheetwatchWorkspace,
    config: WatchConfig,
    store: SnapshotStore,
    source: Arc<dyn DocumentSource>,
    notifiers: Vec<Box<dyn Notifier>>,
    exporter: Option<Box<dyn TabExporter>>,
    progress: ProgressReporter,
}

impl RunCoordinator {
    pub fn new(
        workspace: SheetwatchWorkspace,
        config: WatchConfig,
        source: Box<dyn DocumentSource>,
    ) -> Self {
        Self {
            store: SnapshotStore::new(workspace.clone()),
            workspace,
            config,
            source: Arc::from(source),
            notifiers: Vec::new(),
            exporter: None,
            progress: ProgressReporter::new_minimal(),
        }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    pub fn with_exporter(mut self, exporter: Box<dyn TabExporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Execute one run against the given document locator.
    ///
    /// With `dry_run` set, detection runs in full but nothing is exported,
    /// notified, or committed.
    pub fn run(&mut self, locator: &str, dry_run: bool) -> Result<RunReport> {
        let started = Instant::now();
        let lock = RunLock::acquire(&self.workspace.lock_path(), self.config.stale_lock_ms)?;
        let checked_at = Utc::now();

        let state = self.store.load_state()?;
        let first_run = state
            .as_ref()
            .map(|s| s.tab_fingerprints.is_empty())
            .unwrap_or(true);
        let previous = state.map(|s| s.tab_fingerprints).unwrap_or_default();

        let workbook = self.fetch_document(locator)?;
        workbook.check_unique_names()?;
        self.progress
            .finish_fetch(&format!("📥 Fetched {} tab(s)", workbook.tabs.len()));

        let current = fingerprint_workbook(&workbook);
        let classification = classify_tabs(current, &previous);
        self.progress.finish_hash(&format!(
            "🔍 {} unchanged, {} changed, {} added, {} removed",
            classification.unchanged.len(),
            classification.changed.len(),
            classification.added.len(),
            classification.removed.len()
        ));

        // Stage new snapshots for every tab whose content moved
        let staged: IndexMap<String, TabSnapshot> = classification
            .tabs_to_stage()
            .iter()
            .filter_map(|name| workbook.get(name))
            .map(|tab| (tab.name.clone(), TabSnapshot::from_matrix(&tab.name, &tab.matrix)))
            .collect();

        let mut changes = ChangeSet {
            added_tabs: classification.added.clone(),
            removed_tabs: classification.removed.clone(),
            ..ChangeSet::default()
        };
        for (tab, records) in self.diff_changed_tabs(&classification, &staged)? {
            changes.insert_tab(tab, records);
        }
        self.progress.finish_diff(&format!(
            "📋 {} change record(s) in {} tab(s)",
            changes.total_records(),
            changes.changes_by_tab.len()
        ));

        let worth_delivering = !first_run && !dry_run && !changes.is_empty();

        let mut attachments = Vec::new();
        if worth_delivering {
            if let Some(exporter) = &self.exporter {
                attachments = self.export_changed_tabs(&workbook, &changes, exporter.as_ref())?;
            }
        }

        if worth_delivering {
            let payload = NotifyPayload {
                document: locator.to_string(),
                checked_at,
                changes: changes.clone(),
                attachments: attachments.clone(),
            };
            for notifier in &self.notifiers {
                notifier.deliver(&payload)?;
                log::info!("Notification delivered via {}", notifier.name());
            }
        }

        let committed = !dry_run;
        if committed {
            self.commit(&classification, &staged, checked_at)?;
        }

        let message = if dry_run {
            "🔎 Dry run complete, nothing committed".to_string()
        } else if first_run {
            format!(
                "📸 Baseline captured for {} tab(s)",
                classification.current.len()
            )
        } else if changes.is_empty() {
            "✅ No changes".to_string()
        } else {
            format!("📣 {} change record(s) delivered", changes.total_records())
        };
        self.progress.finish_deliver(&message);

        Ok(RunReport {
            document: locator.to_string(),
            checked_at,
            first_run,
            dry_run,
            committed,
            notified: worth_delivering,
            stale_lock_recovered: lock.recovered_from_stale(),
            tabs_seen: workbook.tabs.len(),
            duration_ms: started.elapsed().as_millis() as u64,
            changes,
            attachments,
        })
    }

    /// Fetch with the configured deadline. The source runs on a worker
    /// thread; a fetch that outlives the deadline is abandoned to finish
    /// on its own.
    fn fetch_document(&self, locator: &str) -> Result<Workbook> {
        let source = Arc::clone(&self.source);
        let locator = locator.to_string();
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || {
            let _ = tx.send(source.fetch(&locator));
        });

        match rx.recv_timeout(Duration::from_millis(self.config.fetch_timeout_ms)) {
            Ok(result) => result,
            Err(_) => Err(SheetwatchError::timeout(
                "document fetch",
                self.config.fetch_timeout_ms,
            )),
        }
    }

    /// Diff every changed tab against its committed snapshot, in parallel
    fn diff_changed_tabs(
        &self,
        classification: &TabClassification,
        staged: &IndexMap<String, TabSnapshot>,
    ) -> Result<Vec<(String, Vec<ChangeRecord>)>> {
        let differ = TabDiffer::new(self.config.id_column.clone(), self.config.tab_change_cap);

        let mut inputs: Vec<(TabSnapshot, &TabSnapshot)> = Vec::new();
        for tab in &classification.changed {
            let Some(curr) = staged.get(tab) else {
                continue;
            };
            let prev = match self.store.load_snapshot(tab) {
                Ok(snapshot) => snapshot,
                Err(SheetwatchError::SnapshotNotFound { .. }) => {
                    // State knows the tab but its snapshot file is gone.
                    // Diff against nothing rather than refusing the run.
                    log::warn!(
                        "No committed snapshot for changed tab '{}', treating all content as new",
                        tab
                    );
                    TabSnapshot::from_matrix(tab, &[])
                }
                Err(e) => return Err(e),
            };
            inputs.push((prev, curr));
        }

        Ok(inputs
            .par_iter()
            .map(|(prev, curr)| (curr.tab.clone(), differ.diff_tab(prev, curr)))
            .collect())
    }

    /// Export the full current content of every tab that changed or appeared
    fn export_changed_tabs(
        &self,
        workbook: &Workbook,
        changes: &ChangeSet,
        exporter: &dyn TabExporter,
    ) -> Result<Vec<ArtifactRef>> {
        let mut tabs: Vec<&str> = changes.changes_by_tab.keys().map(String::as_str).collect();
        tabs.extend(changes.added_tabs.iter().map(String::as_str));

        let mut artifacts = Vec::new();
        for tab in tabs {
            if let Some(raw) = workbook.get(tab) {
                artifacts.push(exporter.export(raw, &self.workspace.exports_dir)?);
            }
        }
        Ok(artifacts)
    }

    /// Persist the staged run. Snapshots are written before state: a crash
    /// in between leaves snapshots newer than state, which the next run
    /// resolves as a fingerprint mismatch with an empty diff and then
    /// re-commits. State pointing at missing snapshots would not heal.
    fn commit(
        &self,
        classification: &TabClassification,
        staged: &IndexMap<String, TabSnapshot>,
        checked_at: DateTime<Utc>,
    ) -> Result<()> {
        for snapshot in staged.values() {
            self.store.save_snapshot(snapshot)?;
        }
        for tab in &classification.removed {
            self.store.delete_snapshot(tab)?;
        }

        let state = WatchState::new(classification.current.clone(), checked_at);
        self.store.save_state(&state)?;

        log::info!(
            "Committed state for {} tab(s) ({} staged, {} removed)",
            classification.current.len(),
            staged.len(),
            classification.removed.len()
        );
        Ok(())
    }
}
