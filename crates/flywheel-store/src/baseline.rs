// flywheel-store/src/baseline.rs
// ============================================================================
// Module: File-Backed Baseline Store
// Description: Stable "latest" baseline plus an archive of superseded ones.
// Purpose: Back the regression gate (§4.4) and the SHS trend log (§7).
// Dependencies: flywheel-core, crate::atomic
// ============================================================================

//! ## Overview
//! `latest.json` always holds the currently accepted [`Baseline`]. When a
//! new crank's baseline is accepted, the prior one is archived under
//! [`Baseline::archive_key`] rather than discarded (§3 invariant 4), and one
//! row is appended to a rolling ndjson trend log so `flywheel measure` can
//! plot the SHS history (§4.4, §7).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::path::Path;
use std::path::PathBuf;

use flywheel_core::Baseline;
use serde::Deserialize;
use serde::Serialize;

use crate::atomic::append;
use crate::atomic::write_atomic;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failure modes for [`FileBaselineStore`] operations.
#[derive(Debug, thiserror::Error)]
pub enum BaselineStoreError {
    /// An underlying filesystem operation failed.
    #[error("baseline store I/O error: {0}")]
    Io(String),
    /// The stored baseline document could not be parsed.
    #[error("baseline store document is corrupt: {0}")]
    Corrupt(String),
}

impl From<io::Error> for BaselineStoreError {
    fn from(err: io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// ============================================================================
// SECTION: Trend Row
// ============================================================================

/// One row of the rolling SHS trend log (§7).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendRow {
    /// The crank this row records.
    pub crank_number: u64,
    /// The accepted Skill Health Score.
    pub shs: f64,
    /// Change relative to the prior accepted baseline.
    pub shs_delta: f64,
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Manages the stable "latest" baseline, its archive, and the trend log.
pub struct FileBaselineStore {
    /// Directory the baseline store owns. Contains `latest.json`,
    /// `archive/`, and `trend.ndjson`.
    root: PathBuf,
}

impl FileBaselineStore {
    /// Opens a baseline store rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn latest_path(&self) -> PathBuf {
        self.root.join("latest.json")
    }

    fn archive_dir(&self) -> PathBuf {
        self.root.join("archive")
    }

    fn trend_path(&self) -> PathBuf {
        self.root.join("trend.ndjson")
    }

    /// Returns the root directory this store manages.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Loads the currently accepted baseline, if one exists yet.
    ///
    /// # Errors
    /// Returns [`BaselineStoreError`] on I/O failure or a corrupt document.
    pub fn load_latest(&self) -> Result<Option<Baseline>, BaselineStoreError> {
        match std::fs::read(self.latest_path()) {
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map(Some).map_err(|err| BaselineStoreError::Corrupt(err.to_string()))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Accepts `new_baseline` as the latest one, archiving whatever was
    /// previously latest and appending a trend row.
    ///
    /// # Errors
    /// Returns [`BaselineStoreError`] if the archive, write, or trend append
    /// fails.
    pub fn accept(&self, new_baseline: &Baseline, crank_number: u64, shs_delta: f64) -> Result<(), BaselineStoreError> {
        if let Some(previous) = self.load_latest()? {
            let key = previous
                .archive_key()
                .map_err(|err| BaselineStoreError::Io(format!("failed to format archive key: {err}")))?;
            let archive_path = self.archive_dir().join(key);
            let bytes = serde_json::to_vec_pretty(&previous)
                .map_err(|err| BaselineStoreError::Io(format!("failed to serialize archived baseline: {err}")))?;
            write_atomic(&archive_path, &bytes)?;
        }

        let bytes = serde_json::to_vec_pretty(new_baseline)
            .map_err(|err| BaselineStoreError::Io(format!("failed to serialize baseline: {err}")))?;
        write_atomic(&self.latest_path(), &bytes)?;

        let row = TrendRow { crank_number, shs: new_baseline.shs, shs_delta };
        let mut line =
            serde_json::to_vec(&row).map_err(|err| BaselineStoreError::Io(format!("failed to serialize trend row: {err}")))?;
        line.push(b'\n');
        append(&self.trend_path(), &line)?;
        Ok(())
    }

    /// Reads the full trend log in append order.
    ///
    /// # Errors
    /// Returns [`BaselineStoreError`] on I/O failure or a malformed row.
    pub fn read_trend(&self) -> Result<Vec<TrendRow>, BaselineStoreError> {
        let contents = match std::fs::read_to_string(self.trend_path()) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(|err| BaselineStoreError::Corrupt(err.to_string())))
            .collect()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
