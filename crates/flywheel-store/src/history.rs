// flywheel-store/src/history.rs
// ============================================================================
// Module: File-Backed History Log
// Description: `HistoryLog` implementation over a newline-delimited file.
// Purpose: Append-only record of fix outcomes and crank summaries (§6).
// Dependencies: flywheel-core, crate::atomic
// ============================================================================

//! ## Overview
//! The history log is never rewritten, only appended to (§6: "Append-only;
//! never rewritten"). [`FileHistoryLog::append`] takes the same advisory
//! lock the backlog store uses, so a crank that is mid-write to the backlog
//! never interleaves with a concurrent history append from another process.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use flywheel_core::HistoryLog;
use flywheel_core::HistoryLogError;
use flywheel_core::HistoryRecord;

use crate::atomic::FileLock;
use crate::atomic::append;

// ============================================================================
// SECTION: Log
// ============================================================================

/// A [`HistoryLog`] backed by a newline-delimited JSON file.
pub struct FileHistoryLog {
    /// Path to the ndjson log file.
    path: PathBuf,
    /// Path to the advisory lock sentinel shared with the backlog store.
    lock_path: PathBuf,
}

impl FileHistoryLog {
    /// Opens a history log at `path`, serializing writers through `lock_path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, lock_path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock_path: lock_path.into() }
    }

    /// Returns the log file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryLog for FileHistoryLog {
    fn append(&self, record: &HistoryRecord) -> Result<(), HistoryLogError> {
        let _lock = FileLock::acquire(&self.lock_path).map_err(|err| HistoryLogError::Io(err.to_string()))?;
        let mut line = serde_json::to_vec(record)
            .map_err(|err| HistoryLogError::WriteFailed(format!("failed to serialize record: {err}")))?;
        line.push(b'\n');
        append(&self.path, &line).map_err(|err| HistoryLogError::Io(err.to_string()))
    }

    fn read_all(&self) -> Result<Vec<HistoryRecord>, HistoryLogError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(HistoryLogError::Io(err.to_string())),
        };
        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line)
                    .map_err(|err| HistoryLogError::Io(format!("malformed history record: {err}")))
            })
            .collect()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
