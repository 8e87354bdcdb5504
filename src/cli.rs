//! Command-line interface for sheetwatch

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sheetwatch")]
#[command(about = "A change watcher for multi-tab tabular documents")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override workspace location
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize sheetwatch workspace
    Init {
        /// Force initialization even if workspace exists
        #[arg(long)]
        force: bool,
    },

    /// Check a document for changes and commit the new state
    Run {
        /// Document locator: a JSON workbook file or a directory of CSV
        /// files, one per tab. Defaults to the configured source.
        input: Option<String>,

        /// Detect and report changes without exporting, notifying, or committing
        #[arg(long)]
        dry_run: bool,

        /// Shell command that receives the change payload on stdin
        #[arg(long)]
        notify_command: Option<String>,

        /// Skip CSV exports of changed tabs
        #[arg(long)]
        no_export: bool,

        /// Override the identifier column used for row matching
        #[arg(long)]
        id_column: Option<String>,

        /// Override the per-tab change record cap (must be > 0)
        #[arg(long, value_parser = validate_cap)]
        cap: Option<usize>,

        /// Output the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the last committed state
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List tabs with committed snapshots
    List {
        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Show the committed snapshot of one tab
    Show {
        /// Tab name to display
        tab: String,

        /// Maximum number of rows to print
        #[arg(long, default_value = "20")]
        rows: usize,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },
}

/// Parse output format string
#[derive(Debug, Clone)]
pub enum OutputFormat {
    Pretty,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {}. Use 'pretty' or 'json'", s)),
        }
    }
}

/// Validate that the change record cap is greater than 0
fn validate_cap(s: &str) -> Result<usize, String> {
    let cap: usize = s
        .parse()
        .map_err(|_| format!("Invalid cap: '{}'. Must be a positive integer.", s))?;

    if cap == 0 {
        return Err("Cap must be greater than 0".to_string());
    }

    Ok(cap)
}
