// flywheel-core/src/core/issue.rs
// ============================================================================
// Module: Backlog Issues
// Description: Issue, fix attempt, status, and outcome types for the backlog.
// Purpose: Model the append-only fix history the decision engine ranks and
//          the crank orchestrator mutates.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! An issue is identified once, mutated only by appending votes or fix
//! attempts, and never deleted; its fix history is the ledger the decision
//! engine (§4.1) reads to compute recent-failure penalties, persistence
//! boosts, and the design-review lock-out.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use super::identifiers::IssueId;
use super::identifiers::TestId;
use super::time::Timestamp;

// ============================================================================
// SECTION: Status & Outcome
// ============================================================================

/// Lifecycle state of a backlog issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    /// Open and eligible for selection.
    Open,
    /// A fix was accepted and did not regress over one baseline update.
    Implemented,
    /// Closed without implementation (e.g. duplicate, won't-fix).
    Closed,
}

/// Outcome of a single fix attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixOutcome {
    /// The fix resolved the issue without regression.
    Fixed,
    /// The fix did not resolve the issue.
    Failed,
    /// The fix was accepted then reverted in a later crank.
    Reverted,
    /// The fix partially addressed the issue.
    Partial,
}

impl FixOutcome {
    /// Returns whether this outcome counts toward the recent-failure penalty
    /// and the design-review lock-out tail count (§4.1).
    #[must_use]
    pub const fn counts_as_failure(self) -> bool {
        matches!(self, Self::Failed | Self::Reverted)
    }
}

// ============================================================================
// SECTION: Fix Attempt
// ============================================================================

/// One append-only record of a fix applied to an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixAttempt {
    /// When the attempt was recorded.
    pub date: Timestamp,
    /// The crank number this attempt belongs to.
    pub crank_number: u64,
    /// The attempt's outcome.
    pub outcome: FixOutcome,
    /// Free-text details about the attempt.
    pub details: Option<String>,
    /// Source files touched by the attempt.
    pub changed_files: Vec<String>,
    /// Change in Skill Health Score this attempt produced, if measured.
    pub shs_delta: Option<f64>,
}

// ============================================================================
// SECTION: Issue
// ============================================================================

/// A backlog issue, with its full append-only fix history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Stable, hierarchical identifier (e.g. `3.12`). Never reused.
    pub id: IssueId,
    /// Short human-readable title.
    pub title: String,
    /// Section of the toolkit this issue concerns.
    pub section: String,
    /// Non-negative vote count; monotonically non-decreasing while open.
    pub votes: u64,
    /// Current lifecycle status.
    pub status: IssueStatus,
    /// Free-text symptom descriptions.
    pub symptoms: Vec<String>,
    /// Description of the behavior expected once fixed.
    pub expected_behavior: String,
    /// Optional known workaround.
    pub workaround: Option<String>,
    /// Source files suspected to contain the defect.
    pub suspected_source_files: Vec<String>,
    /// Failure-pattern tags this issue has been associated with, used by the
    /// persistence-boost modifier (§4.1).
    pub failure_pattern_tags: Vec<String>,
    /// Append-only list of fix attempts, oldest first.
    pub fix_attempts: Vec<FixAttempt>,
    /// Where this issue originated; `"runner-feedback"` for issues minted by
    /// the feedback applier (§4.6), absent for hand-authored issues.
    #[serde(default)]
    pub source: Option<String>,
    /// For runner-feedback-originated issues, the test ids the feedback was
    /// observed from (§4.6).
    #[serde(default)]
    pub source_tests: Vec<TestId>,
}

impl Issue {
    /// Returns the most recent fix attempt, if any.
    #[must_use]
    pub fn last_attempt(&self) -> Option<&FixAttempt> {
        self.fix_attempts.last()
    }

    /// Returns the number of consecutive failed/reverted attempts at the
    /// tail of the fix history (§4.1 design-review lock-out).
    #[must_use]
    pub fn consecutive_failures_at_tail(&self) -> u64 {
        self.fix_attempts
            .iter()
            .rev()
            .take_while(|attempt| attempt.outcome.counts_as_failure())
            .count() as u64
    }

    /// Returns whether the last attempt failed or was reverted within
    /// `window` cranks of `current_crank` (§4.1 recent-failure penalty).
    #[must_use]
    pub fn recent_failure_within(&self, current_crank: u64, window: u64) -> bool {
        self.last_attempt().is_some_and(|attempt| {
            attempt.outcome.counts_as_failure()
                && current_crank.saturating_sub(attempt.crank_number) <= window
        })
    }
}

// ============================================================================
// SECTION: Backlog Document
// ============================================================================

/// The on-disk backlog document (§6): open/closed issues plus an archive of
/// implemented ones, with a last-updated timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backlog {
    /// Issues that are `open` or `closed`.
    pub issues: Vec<Issue>,
    /// Issues that have transitioned to `implemented`, archived here.
    pub implemented: Vec<Issue>,
    /// When the backlog was last written.
    pub last_updated: Timestamp,
}

impl Backlog {
    /// Returns an iterator over currently open issues.
    pub fn open_issues(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|issue| issue.status == IssueStatus::Open)
    }

    /// Finds an issue by id across both the active and implemented lists.
    #[must_use]
    pub fn find(&self, id: &IssueId) -> Option<&Issue> {
        self.issues
            .iter()
            .chain(self.implemented.iter())
            .find(|issue| &issue.id == id)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
