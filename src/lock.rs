//! Exclusive run lock with age-based staleness recovery
//!
//! The lock marker is a JSON file created with `O_CREAT | O_EXCL`, so only
//! one run can hold it. A marker older than the staleness threshold is
//! presumed abandoned by a crashed run and may be taken over.

use crate::error::{Result, SheetwatchError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use uuid::Uuid;

/// Metadata stored in the lock marker file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockMarker {
    /// Random id of the run holding the lock
    pub owner_id: String,
    /// When the lock was acquired
    pub started_at: DateTime<Utc>,
    /// Whether acquisition displaced a stale marker
    pub recovered_from_stale: bool,
}

impl LockMarker {
    fn current(recovered_from_stale: bool) -> Self {
        Self {
            owner_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            recovered_from_stale,
        }
    }
}

/// A held run lock. The marker file is removed when this is dropped, which
/// covers normal return, error, and early return alike.
pub struct RunLock {
    path: PathBuf,
    marker: LockMarker,
}

impl RunLock {
    /// Attempt to acquire the run lock.
    ///
    /// If the marker already exists, its filesystem modification time decides:
    /// younger than `stale_after_ms` means another run is active
    /// (`LockContention`); older means the previous run is presumed dead, the
    /// marker is removed, and creation is retried exactly once with
    /// `recovered_from_stale` set.
    ///
    /// Known limitation: the staleness check and the re-create are not atomic
    /// across processes. This guards a single scheduled job, not a
    /// distributed system — single retry, no stronger guarantee.
    pub fn acquire(path: &Path, stale_after_ms: u64) -> Result<Self> {
        match Self::try_create(path, false) {
            Ok(lock) => Ok(lock),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                let age = match marker_age(path) {
                    Ok(age) => age,
                    // Marker vanished between the failed create and the stat:
                    // the holder just released. One plain retry.
                    Err(stat_err) if stat_err.kind() == std::io::ErrorKind::NotFound => {
                        return Self::try_create(path, false).map_err(SheetwatchError::from);
                    }
                    Err(stat_err) => return Err(stat_err.into()),
                };

                if age >= Duration::from_millis(stale_after_ms) {
                    log::warn!(
                        "Taking over stale lock marker at {} ({} ms old)",
                        path.display(),
                        age.as_millis()
                    );
                    if let Err(rm_err) = std::fs::remove_file(path) {
                        if rm_err.kind() != std::io::ErrorKind::NotFound {
                            return Err(rm_err.into());
                        }
                    }
                    match Self::try_create(path, true) {
                        Ok(lock) => Ok(lock),
                        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                            // Lost the takeover race to another process
                            Err(SheetwatchError::LockContention {
                                held_for_ms: held_for_ms(path),
                            })
                        }
                        Err(e) => Err(e.into()),
                    }
                } else {
                    Err(SheetwatchError::LockContention {
                        held_for_ms: age.as_millis() as u64,
                    })
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Create the marker file exclusively and write the metadata
    fn try_create(path: &Path, recovered_from_stale: bool) -> std::io::Result<Self> {
        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;

        let marker = LockMarker::current(recovered_from_stale);
        let json = serde_json::to_string_pretty(&marker).map_err(std::io::Error::other)?;
        if let Err(e) = file.write_all(json.as_bytes()).and_then(|_| file.sync_all()) {
            // Don't leave a half-written marker blocking future runs
            let _ = std::fs::remove_file(path);
            return Err(e);
        }

        log::debug!(
            "Acquired run lock at {} (owner {})",
            path.display(),
            marker.owner_id
        );

        Ok(Self {
            path: path.to_path_buf(),
            marker,
        })
    }

    pub fn marker(&self) -> &LockMarker {
        &self.marker
    }

    pub fn recovered_from_stale(&self) -> bool {
        self.marker.recovered_from_stale
    }

    fn release(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        self.release();
    }
}

/// Age of the marker file, from its filesystem modification time
fn marker_age(path: &Path) -> std::io::Result<Duration> {
    let modified = std::fs::metadata(path)?.modified()?;
    Ok(SystemTime::now()
        .duration_since(modified)
        .unwrap_or(Duration::ZERO))
}

fn held_for_ms(path: &Path) -> u64 {
    marker_age(path)
        .map(|age| age.as_millis() as u64)
        .unwrap_or(0)
}

/// Read the marker of a held lock (for status display), if any
pub fn read_marker(path: &Path) -> Option<LockMarker> {
    let content = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}
