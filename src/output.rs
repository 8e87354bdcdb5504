//! Output formatting utilities

use crate::diff::{ChangeSet, Severity};
use crate::error::Result;
use crate::runner::RunReport;
use crate::snapshot::{TabSnapshot, WatchState};
use crate::workspace::WorkspaceStats;

/// Pretty printer for sheetwatch output
pub struct PrettyPrinter;

impl PrettyPrinter {
    /// Print the outcome of one run
    pub fn print_run_report(report: &RunReport) {
        println!("📊 Run against '{}'", report.document);
        println!("├─ Checked at: {}", report.checked_at.to_rfc3339());
        println!("├─ Tabs seen: {}", report.tabs_seen);

        if report.first_run {
            println!("├─ 📸 First run: baseline captured, nothing to compare yet");
        }
        if report.dry_run {
            println!("├─ 🔎 Dry run: nothing exported, notified, or committed");
        }
        if report.stale_lock_recovered {
            println!("├─ ⚠️  Recovered a stale lock from an earlier run");
        }

        Self::print_change_set(&report.changes);

        if !report.attachments.is_empty() {
            println!("├─ 📦 Exports:");
            for artifact in &report.attachments {
                println!("│  └─ {} ({})", artifact.path.display(), artifact.tab);
            }
        }

        if report.notified {
            println!("├─ 📣 Notifications delivered");
        }

        if report.committed {
            println!("└─ ✅ State committed ({} ms)", report.duration_ms);
        } else {
            println!("└─ ⏭️  State unchanged ({} ms)", report.duration_ms);
        }
    }

    /// Print a change set as a tree
    pub fn print_change_set(changes: &ChangeSet) {
        if changes.is_empty() {
            println!("├─ ✅ No changes detected");
            return;
        }

        if !changes.added_tabs.is_empty() {
            println!("├─ ➕ Tabs added: {}", changes.added_tabs.join(", "));
        }
        if !changes.removed_tabs.is_empty() {
            println!("├─ ➖ Tabs removed: {}", changes.removed_tabs.join(", "));
        }

        for (tab, records) in &changes.changes_by_tab {
            let structural = records
                .iter()
                .filter(|r| r.severity == Severity::Structural)
                .count();
            println!(
                "├─ 📋 {}: {} change(s), {} structural",
                tab,
                records.len(),
                structural
            );

            for record in records.iter().take(10) {
                println!("│  ├─ {}", record.summary_line());
            }
            if records.len() > 10 {
                println!("│  └─ ... and {} more", records.len() - 10);
            }
        }
    }

    /// Print the last committed state alongside workspace statistics
    pub fn print_status(state: Option<&WatchState>, stats: &WorkspaceStats) {
        println!("📊 sheetwatch status");

        match state {
            None => println!("├─ No committed state yet (next run captures a baseline)"),
            Some(state) => {
                println!("├─ Last checked: {}", state.checked_at.to_rfc3339());
                println!("├─ Watched tabs: {}", state.tab_fingerprints.len());
                for tab in state.tab_fingerprints.keys() {
                    println!("│  ├─ {}", tab);
                }
            }
        }

        println!("├─ Snapshots: {}", stats.snapshot_count);
        println!("├─ Reports: {}", stats.report_count);
        println!("├─ Exports: {}", stats.export_count);
        println!(
            "└─ Disk usage: {}",
            format_bytes(
                stats.total_snapshot_size
                    + stats.total_report_size
                    + stats.total_export_size
                    + stats.state_size
            )
        );
    }

    /// Print the tab names that have committed snapshots
    pub fn print_tab_list(tabs: &[String]) {
        if tabs.is_empty() {
            println!("No committed snapshots found.");
            return;
        }

        println!("📋 Watched tabs:");
        for (i, tab) in tabs.iter().enumerate() {
            let prefix = if i == tabs.len() - 1 { "└─" } else { "├─" };
            println!("{} {}", prefix, tab);
        }
    }

    /// Print one committed snapshot, up to `row_limit` rows
    pub fn print_snapshot(snapshot: &TabSnapshot, row_limit: usize) {
        println!("📋 Tab: {}", snapshot.tab);
        println!("├─ Headers: {}", snapshot.headers.join(", "));
        println!("├─ Columns: {}", snapshot.column_count());
        println!("├─ Rows: {}", snapshot.row_count());

        for row in snapshot.rows.iter().take(row_limit) {
            let cells: Vec<String> = row
                .iter()
                .map(|(column, value)| format!("{}={}", column, value))
                .collect();
            println!("│  ├─ {}", cells.join(", "));
        }

        if snapshot.rows.len() > row_limit {
            println!("└─ ... and {} more row(s)", snapshot.rows.len() - row_limit);
        } else {
            println!("└─ (end)");
        }
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    /// Format any serializable data as JSON
    pub fn format<T: serde::Serialize + ?Sized>(data: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(data)?)
    }

    /// Format the status view as JSON
    pub fn format_status(state: Option<&WatchState>, stats: &WorkspaceStats) -> Result<String> {
        let json = serde_json::json!({
            "last_checked": state.map(|s| s.checked_at.to_rfc3339()),
            "watched_tabs": state.map(|s| s.tab_fingerprints.keys().cloned().collect::<Vec<_>>()),
            "snapshot_count": stats.snapshot_count,
            "report_count": stats.report_count,
            "export_count": stats.export_count,
            "total_snapshot_size": stats.total_snapshot_size,
            "total_report_size": stats.total_report_size,
            "total_export_size": stats.total_export_size,
            "state_size": stats.state_size
        });
        Ok(serde_json::to_string_pretty(&json)?)
    }
}

/// Format bytes in human-readable format
fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}
