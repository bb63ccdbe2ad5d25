// flywheel-store/src/atomic.rs
// ============================================================================
// Module: Atomic File Writes & Advisory Locking
// Description: Write-temp-then-rename discipline and cross-process advisory
//              locking shared by the backlog, history, and baseline stores.
// Purpose: Guarantee a concurrent reader never observes a partial write
//          (§5), and that a single flywheel process serializes writers
//          when more than one orchestrator targets the same backlog.
// Dependencies: fs2, std::fs
// ============================================================================

//! ## Overview
//! Every durable write in this crate goes through [`write_atomic`]: the
//! full document is written to a temp file in the same directory as the
//! target, fsynced, then renamed over the target. Rename is atomic on the
//! filesystems this crate targets, so a reader either sees the old file or
//! the new one, never a half-written one.
//!
//! [`FileLock`] wraps an advisory `flock` on a sentinel file. The backlog
//! store and history log share one lock path per flywheel instance (§5:
//! "the history log uses append-only writes guarded by the same lock").

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;

use fs2::FileExt;

// ============================================================================
// SECTION: Atomic Write
// ============================================================================

/// Writes `bytes` to `path` atomically via write-temp-then-rename.
///
/// # Errors
/// Returns an [`io::Error`] if the temp file cannot be created, written,
/// synced, or renamed into place.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = path.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "target path has no parent directory")
    })?;
    std::fs::create_dir_all(dir)?;
    let temp = tempfile::NamedTempFile::new_in(dir)?;
    std::fs::write(temp.path(), bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

/// Appends `bytes` to `path`, creating it if absent, and fsyncs before
/// returning. Used for the append-only history log and trend log.
///
/// # Errors
/// Returns an [`io::Error`] on open, write, or sync failure.
pub fn append(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    use std::io::Write;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

// ============================================================================
// SECTION: Advisory Lock
// ============================================================================

/// An exclusive advisory lock on a sentinel file, released on drop.
pub struct FileLock {
    /// The open handle the lock is held through.
    file: File,
}

impl FileLock {
    /// Blocks until an exclusive lock on `path` is acquired.
    ///
    /// # Errors
    /// Returns an [`io::Error`] if the sentinel file cannot be opened or
    /// the lock cannot be acquired.
    pub fn acquire(path: &Path) -> io::Result<Self> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new().create(true).write(true).truncate(false).open(path)?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
