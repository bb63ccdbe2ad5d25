// flywheel-core/src/core/baseline.rs
// ============================================================================
// Module: Baseline
// Description: Last-accepted SHS/per-test snapshot and the ratchet ledger.
// Purpose: Define `Baseline` (§3) and the archive key used by C6.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The baseline is replaced atomically whenever the regression gate (§4.4)
//! passes; the previous one is archived under a `v<version>-<timestamp>`
//! key rather than discarded (§3 invariant 4). The ratchet ledger tracks,
//! per test, how many consecutive cranks it has held composite ≥
//! `RATCHET_THRESHOLD`, which the regression gate reads to decide whether a
//! test's drop this crank is a true regression.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use super::identifiers::TestId;
use super::time::Timestamp;

// ============================================================================
// SECTION: Baseline
// ============================================================================

/// Snapshot of the last-accepted run, used by the regression gate (§4.4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Baseline {
    /// The accepted Skill Health Score.
    pub shs: f64,
    /// Composite score per test as of the last accepted crank.
    pub per_test_composite: BTreeMap<TestId, f64>,
    /// Consecutive-crank streak count for tests that have ratcheted
    /// (composite ≥ `RATCHET_THRESHOLD` for ≥ `RATCHET_CONSECUTIVE` cranks).
    pub ratcheted_tests: BTreeMap<TestId, u32>,
    /// Version tag this baseline was accepted under.
    pub version_tag: String,
    /// When this baseline was written.
    pub timestamp: Timestamp,
}

impl Baseline {
    /// The archive key this baseline is stored under once superseded
    /// (§6: `v<version>-<timestamp>.json`).
    ///
    /// # Errors
    /// Returns an error when the baseline's timestamp cannot be formatted.
    pub fn archive_key(&self) -> Result<String, time::error::Format> {
        let stamp = self.timestamp.to_rfc3339()?;
        Ok(format!("v{}-{stamp}.json", self.version_tag))
    }

    /// Returns whether `test_id` is currently ratcheted, i.e. has held
    /// `RATCHET_THRESHOLD` for at least `consecutive` cranks.
    #[must_use]
    pub fn is_ratcheted(&self, test_id: &TestId, consecutive: u32) -> bool {
        self.ratcheted_tests
            .get(test_id)
            .is_some_and(|streak| *streak >= consecutive)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
