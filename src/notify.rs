//! Change notification delivery
//!
//! Notification sits between staging and commit: state only advances after
//! every channel has reported success, so a failed delivery surfaces again
//! as a duplicate on the next run instead of being lost. Consumers must
//! tolerate repeats.

use crate::diff::ChangeSet;
use crate::error::{Result, SheetwatchError};
use crate::export::ArtifactRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Everything a notification channel gets to see about one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyPayload {
    /// Locator of the watched document
    pub document: String,
    pub checked_at: DateTime<Utc>,
    pub changes: ChangeSet,
    /// Exported files produced by this run
    pub attachments: Vec<ArtifactRef>,
}

/// A delivery channel for change notifications
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;
    fn deliver(&self, payload: &NotifyPayload) -> Result<()>;
}

/// Writes a JSON report and a human-readable text report into a directory
pub struct FileNotifier {
    reports_dir: PathBuf,
}

impl FileNotifier {
    pub fn new(reports_dir: PathBuf) -> Self {
        Self { reports_dir }
    }
}

impl Notifier for FileNotifier {
    fn name(&self) -> &str {
        "report file"
    }

    fn deliver(&self, payload: &NotifyPayload) -> Result<()> {
        std::fs::create_dir_all(&self.reports_dir).map_err(|e| {
            SheetwatchError::notify(format!(
                "failed to create report directory {}: {}",
                self.reports_dir.display(),
                e
            ))
        })?;

        // Subsecond stamp plus a counter so close-together runs never
        // overwrite an earlier report pair
        let stamp = payload.checked_at.format("%Y%m%d-%H%M%S-%3f").to_string();
        let mut stem = format!("report-{}", stamp);
        let mut attempt = 1;
        while self.reports_dir.join(format!("{}.json", stem)).exists()
            || self.reports_dir.join(format!("{}.txt", stem)).exists()
        {
            attempt += 1;
            stem = format!("report-{}-{}", stamp, attempt);
        }
        let json_path = self.reports_dir.join(format!("{}.json", stem));
        let text_path = self.reports_dir.join(format!("{}.txt", stem));

        let json = serde_json::to_string_pretty(payload)?;
        std::fs::write(&json_path, json).map_err(|e| {
            SheetwatchError::notify(format!("failed to write {}: {}", json_path.display(), e))
        })?;
        std::fs::write(&text_path, render_text_report(payload)).map_err(|e| {
            SheetwatchError::notify(format!("failed to write {}: {}", text_path.display(), e))
        })?;

        log::info!("Wrote change report to {}", json_path.display());
        Ok(())
    }
}

/// Pipes the payload as JSON into an external command's stdin.
///
/// The command runs through the platform shell and must exit zero within
/// the timeout; a stalled or failing command keeps the run uncommitted.
pub struct CommandNotifier {
    command: String,
    timeout_ms: u64,
}

impl CommandNotifier {
    pub fn new(command: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            command: command.into(),
            timeout_ms,
        }
    }

    fn shell() -> (&'static str, &'static str) {
        if cfg!(windows) {
            ("cmd", "/C")
        } else {
            ("sh", "-c")
        }
    }
}

impl Notifier for CommandNotifier {
    fn name(&self) -> &str {
        "command"
    }

    fn deliver(&self, payload: &NotifyPayload) -> Result<()> {
        let json = serde_json::to_string_pretty(payload)?;
        let (shell, flag) = Self::shell();

        log::debug!("Running notify command: {}", self.command);

        let mut child = Command::new(shell)
            .arg(flag)
            .arg(&self.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                SheetwatchError::notify(format!("failed to spawn '{}': {}", self.command, e))
            })?;

        // Feed stdin from a separate thread so a consumer that never reads
        // cannot block the deadline loop below. A command that exits without
        // reading closes the pipe, which ends the writer too.
        let stdin = child.stdin.take();
        std::thread::spawn(move || {
            if let Some(mut stdin) = stdin {
                let _ = stdin.write_all(json.as_bytes());
            }
        });

        let deadline = Instant::now() + Duration::from_millis(self.timeout_ms);
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    if status.success() {
                        return Ok(());
                    }
                    return Err(SheetwatchError::notify(format!(
                        "notify command exited with {}",
                        status
                    )));
                }
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(SheetwatchError::timeout(
                            "notify command",
                            self.timeout_ms,
                        ));
                    }
                    std::thread::sleep(Duration::from_millis(25));
                }
                Err(e) => {
                    return Err(SheetwatchError::notify(format!(
                        "failed to poll notify command: {}",
                        e
                    )));
                }
            }
        }
    }
}

/// Render the human-readable report body
pub fn render_text_report(payload: &NotifyPayload) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Changes in '{}' at {}\n",
        payload.document,
        payload.checked_at.to_rfc3339()
    ));
    out.push_str(&format!(
        "Total: {} record(s) across {} tab(s)\n",
        payload.changes.total_records(),
        payload.changes.changes_by_tab.len()
    ));

    if !payload.changes.added_tabs.is_empty() {
        out.push_str(&format!(
            "Tabs added: {}\n",
            payload.changes.added_tabs.join(", ")
        ));
    }
    if !payload.changes.removed_tabs.is_empty() {
        out.push_str(&format!(
            "Tabs removed: {}\n",
            payload.changes.removed_tabs.join(", ")
        ));
    }

    for (tab, records) in &payload.changes.changes_by_tab {
        out.push_str(&format!("\n[{}] {} change(s)\n", tab, records.len()));
        for record in records {
            out.push_str(&format!("  {}\n", record.summary_line()));
        }
    }

    if !payload.attachments.is_empty() {
        out.push_str("\nExports:\n");
        for artifact in &payload.attachments {
            out.push_str(&format!(
                "  {} ({})\n",
                artifact.path.display(),
                artifact.tab
            ));
        }
    }

    out
}
