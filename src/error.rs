//! Error types for sheetwatch operations

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SheetwatchError>;

#[derive(Error, Debug)]
pub enum SheetwatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Workspace error: {0}")]
    Workspace(String),

    #[error("Another run is already active (lock held for {held_for_ms} ms)")]
    LockContention { held_for_ms: u64 },

    #[error("Fetch failure: {message}")]
    Fetch { message: String },

    #[error("Parse failure: {message}")]
    Parse { message: String },

    #[error("Notification failure: {message}")]
    Notify { message: String },

    #[error("Persist failure: {message}")]
    Persist { message: String },

    #[error("Export failure: {message}")]
    Export { message: String },

    #[error("{operation} did not complete within {after_ms} ms")]
    Timeout { operation: String, after_ms: u64 },

    #[error("Snapshot not found for tab: {tab}")]
    SnapshotNotFound { tab: String },

    #[error("Invalid snapshot format: {path}")]
    InvalidSnapshot { path: PathBuf },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Walkdir error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

impl SheetwatchError {
    pub fn workspace(msg: impl Into<String>) -> Self {
        Self::Workspace(msg.into())
    }

    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch {
            message: msg.into(),
        }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    pub fn notify(msg: impl Into<String>) -> Self {
        Self::Notify {
            message: msg.into(),
        }
    }

    pub fn persist(msg: impl Into<String>) -> Self {
        Self::Persist {
            message: msg.into(),
        }
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export {
            message: msg.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, after_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            after_ms,
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    /// True for lock contention, which callers treat as a clean no-op
    /// rather than a failure.
    pub fn is_contention(&self) -> bool {
        matches!(self, Self::LockContention { .. })
    }
}
