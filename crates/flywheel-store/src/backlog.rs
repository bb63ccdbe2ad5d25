// flywheel-store/src/backlog.rs
// ============================================================================
// Module: File-Backed Backlog Store
// Description: `BacklogStore` implementation over a single JSON document.
// Purpose: Persist issues, fix attempts, and implementation history (C1).
// Dependencies: flywheel-core, crate::atomic
// ============================================================================

//! ## Overview
//! The backlog is a single JSON document, single-writer within one
//! flywheel process (§5). [`FileBacklogStore::save`] takes the shared
//! advisory lock before writing so that, if multiple orchestrators ever
//! target the same backlog path, writes serialize rather than race.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use flywheel_core::Backlog;
use flywheel_core::BacklogStore;
use flywheel_core::BacklogStoreError;

use crate::atomic::FileLock;
use crate::atomic::write_atomic;

// ============================================================================
// SECTION: Store
// ============================================================================

/// A [`BacklogStore`] backed by a single JSON file on disk.
pub struct FileBacklogStore {
    /// Path to the backlog document.
    path: PathBuf,
    /// Path to the advisory lock sentinel shared with the history log.
    lock_path: PathBuf,
}

impl FileBacklogStore {
    /// Opens a backlog store at `path`, serializing writers through
    /// `lock_path` (§5: the backlog and history log share one lock).
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, lock_path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock_path: lock_path.into() }
    }

    /// Returns the backlog document path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BacklogStore for FileBacklogStore {
    fn load(&self) -> Result<Backlog, BacklogStoreError> {
        let bytes = std::fs::read(&self.path).map_err(|err| BacklogStoreError::Io(err.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|err| BacklogStoreError::Corrupt(err.to_string()))
    }

    fn save(&self, backlog: &Backlog) -> Result<(), BacklogStoreError> {
        let _lock = FileLock::acquire(&self.lock_path).map_err(|err| BacklogStoreError::Io(err.to_string()))?;
        let bytes = serde_json::to_vec_pretty(backlog)
            .map_err(|err| BacklogStoreError::Io(format!("failed to serialize backlog: {err}")))?;
        write_atomic(&self.path, &bytes).map_err(|err| BacklogStoreError::Io(err.to_string()))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
