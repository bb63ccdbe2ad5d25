// flywheel-core/src/core/summary.rs
// ============================================================================
// Module: Crank Summary
// Description: The single append-only record a crank contributes to the
//              history log.
// Purpose: Define `CrankSummary` (§3, §4.7).
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Exactly one [`CrankSummary`] is appended to the history log per crank
//! (§3 invariant 5). It carries the user-visible numbers the orchestrator
//! prints at the end of a run (§7): SHS, SHS delta, test counts, observed
//! failure-pattern tags, and the fix outcome if a fix was attempted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use super::identifiers::IssueId;
use super::issue::FixOutcome;
use super::time::Timestamp;

// ============================================================================
// SECTION: Crank Summary
// ============================================================================

/// The per-crank record appended to the history log (C2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrankSummary {
    /// Monotonically increasing crank number.
    pub crank_number: u64,
    /// Version tag of the toolkit at the time of this crank.
    pub version_tag: String,
    /// When the crank completed.
    pub timestamp: Timestamp,
    /// Skill Health Score for this crank.
    pub shs: f64,
    /// Change in SHS relative to the prior accepted baseline.
    pub shs_delta: f64,
    /// Total number of tests scheduled this crank.
    pub total_tests: u64,
    /// Number of tests with status `pass`.
    pub passed_tests: u64,
    /// Number of tests with `completion == 1` and status `pass`.
    pub perfect_tests: u64,
    /// Failure-pattern tags observed across this crank's tests.
    pub failure_pattern_tags: Vec<String>,
    /// The issue a fix was attempted against this crank, if any.
    pub fix_issue_id: Option<IssueId>,
    /// The outcome of that fix attempt, if any.
    pub fix_outcome: Option<FixOutcome>,
}

// ============================================================================
// SECTION: History Records
// ============================================================================

/// A fix outcome as appended to the history log, distinct from the copy
/// kept inside the issue's own `fix_attempts` (§3 invariant 3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixOutcomeRecord {
    /// The issue this outcome concerns.
    pub issue_id: IssueId,
    /// The crank this outcome was recorded in.
    pub crank_number: u64,
    /// When the outcome was recorded.
    pub timestamp: Timestamp,
    /// The fix's outcome.
    pub outcome: FixOutcome,
    /// Free-text details about the attempt.
    pub details: Option<String>,
    /// Source files touched by the attempt.
    pub changed_files: Vec<String>,
    /// Change in Skill Health Score this attempt produced, if measured.
    pub shs_delta: Option<f64>,
}

/// One append-only history log record (§6): a `fix_outcome` or a `crank`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistoryRecord {
    /// A fix attempt's outcome.
    FixOutcome(FixOutcomeRecord),
    /// A crank summary.
    Crank(CrankSummary),
}
