//! # sheetwatch
//!
//! A change watcher for multi-tab tabular documents: fingerprints every tab,
//! diffs changed tabs with stable row keys, and advances its committed state
//! only after the downstream notification succeeds.

pub mod cli;
pub mod config;
pub mod error;
pub mod workspace;
pub mod source;
pub mod fingerprint;
pub mod snapshot;
pub mod lock;
pub mod diff;
pub mod notify;
pub mod export;
pub mod runner;
pub mod commands;
pub mod output;
pub mod progress;

pub use error::{Result, SheetwatchError};
pub use workspace::SheetwatchWorkspace;
pub use runner::RunCoordinator;

/// Current format version for sheetwatch documents
pub const FORMAT_VERSION: &str = "1.0.0";

/// Default identifier column for stable row keys (matched case-insensitively)
pub const DEFAULT_ID_COLUMN: &str = "id";

/// Default age in milliseconds after which a lock marker is presumed abandoned
pub const DEFAULT_STALE_LOCK_MS: u64 = 600_000;

/// Default maximum number of change records reported per tab
pub const DEFAULT_TAB_CHANGE_CAP: usize = 200;

/// Default deadline in milliseconds for fetching the source document
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 30_000;

/// Default deadline in milliseconds for notification delivery
pub const DEFAULT_NOTIFY_TIMEOUT_MS: u64 = 30_000;
