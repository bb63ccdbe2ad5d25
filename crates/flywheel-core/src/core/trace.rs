// flywheel-core/src/core/trace.rs
// ============================================================================
// Module: Test Definitions & Traces
// Description: Test definition, milestone, trace, and per-test result types.
// Purpose: Model the artifacts the runner pool produces and the validator
//          consumes (§3, §6).
// Dependencies: flywheel-logic, serde, serde_json
// ============================================================================

//! ## Overview
//! A [`TestDefinition`] is authored once and never mutated; a [`Trace`] is
//! produced fresh by a runner each crank. The required-field shape check
//! (§6: "any missing required field → `status=error`") lives in
//! [`Trace::from_json`], which distinguishes a structurally absent
//! `milestoneResults` from a present-but-empty one.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use super::feedback::FeedbackEntryRaw;
use super::identifiers::MilestoneId;
use super::identifiers::TestId;
use super::verify::Snapshot;
use super::verify::VerifyBlock;

// ============================================================================
// SECTION: Test Category
// ============================================================================

/// Closed set of test categories (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestCategory {
    /// A read-only interaction.
    Read,
    /// An interaction that creates new state.
    Create,
    /// An interaction that updates existing state.
    Update,
    /// An interaction that deletes state.
    Delete,
    /// An interaction involving file upload/download/manipulation.
    FileManipulation,
    /// Anything not covered by the above.
    Other,
}

// ============================================================================
// SECTION: Budget
// ============================================================================

/// Resource budget a test is measured against (§4.3 efficiency formula).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    /// Maximum number of agent steps before the test is considered over budget.
    pub max_steps: u64,
    /// Maximum wall-clock time, in milliseconds.
    pub max_time_ms: u64,
}

// ============================================================================
// SECTION: Milestone & Test Definition
// ============================================================================

/// One checkpoint within a test, weighted toward the test's completion score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    /// Identifier unique within the owning test definition.
    pub id: MilestoneId,
    /// Contribution to completion, in `[0, 1]`.
    pub weight: f64,
    /// Recursive predicate evaluated by the validator (§4.3).
    pub verify: VerifyBlock,
}

/// A structured test document (§6). `id` is authoritative over filename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestDefinition {
    /// Stable test identifier.
    pub id: TestId,
    /// The URL a runner navigates to for this test.
    pub url: String,
    /// Closed-set category tag.
    pub category: TestCategory,
    /// Prose description of the task the runner performs.
    pub task: String,
    /// Ordered milestones; `sum(weight) <= 1`.
    pub milestones: Vec<Milestone>,
    /// Step/time budget for the efficiency sub-score.
    pub budget: Budget,
}

impl TestDefinition {
    /// Sum of this test's milestone weights.
    #[must_use]
    pub fn total_milestone_weight(&self) -> f64 {
        self.milestones.iter().map(|m| m.weight).sum()
    }

    /// Returns whether the milestone weights respect the `§3` invariant:
    /// each weight in `[0, 1]` and their sum at most `1`.
    #[must_use]
    pub fn has_valid_milestone_weights(&self) -> bool {
        self.milestones.iter().all(|m| (0.0..=1.0).contains(&m.weight))
            && self.total_milestone_weight() <= 1.0
    }
}

// ============================================================================
// SECTION: Trace
// ============================================================================

/// Passed/total counts for response-quality checks a runner performed
/// against the skill's replies (§4.3 `responseQuality`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseChecks {
    /// Number of response checks that passed.
    pub passed: u64,
    /// Total number of response checks attempted.
    pub total: u64,
}

/// A validated trace: the four required fields from §3/§6, plus the
/// optional verification snapshot and the resource/error counters §4.3's
/// sub-score formulas read (not subject to the required-field shape
/// check; absent counters score as if nothing ran).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trace {
    /// The test this trace belongs to.
    pub test_id: TestId,
    /// Total wall-clock duration of the run, in milliseconds.
    pub wall_clock_ms: u64,
    /// Per-milestone pass/fail as observed directly by the runner.
    pub milestone_results: BTreeMap<MilestoneId, bool>,
    /// Free-form feedback entries the runner captured.
    pub feedback: Vec<FeedbackEntryRaw>,
    /// Opaque snapshot captured at the end of the run, if any.
    #[serde(default)]
    pub snapshot: Option<Snapshot>,
    /// Agent steps consumed, for the efficiency sub-score.
    #[serde(default)]
    pub steps_used: u64,
    /// Errors encountered during the run, for the resilience sub-score.
    #[serde(default)]
    pub errors: u64,
    /// Of `errors`, how many the runner recovered from without aborting.
    #[serde(default)]
    pub recovered_errors: u64,
    /// Response-quality checks the runner performed, if any.
    #[serde(default)]
    pub response_checks: Option<ResponseChecks>,
}

/// Raw on-disk shape used only to detect a structurally absent field before
/// deserializing into [`Trace`] proper.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTrace {
    test_id: Option<TestId>,
    wall_clock_ms: Option<u64>,
    milestone_results: Option<BTreeMap<MilestoneId, bool>>,
    #[serde(default)]
    feedback: Vec<FeedbackEntryRaw>,
    #[serde(default)]
    snapshot: Option<Snapshot>,
    #[serde(default)]
    steps_used: u64,
    #[serde(default)]
    errors: u64,
    #[serde(default)]
    recovered_errors: u64,
    #[serde(default)]
    response_checks: Option<ResponseChecks>,
}

/// Error produced when a trace document fails the required-field shape
/// check (§3: "A trace missing the milestone-results field scores zero").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceError {
    /// The document could not be parsed as JSON at all.
    InvalidJson(String),
    /// A required field was absent.
    MissingField(&'static str),
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson(reason) => write!(f, "trace is not valid json: {reason}"),
            Self::MissingField(field) => write!(f, "trace is missing required field `{field}`"),
        }
    }
}

impl std::error::Error for TraceError {}

impl Trace {
    /// Parses and shape-checks a trace document.
    ///
    /// # Errors
    /// Returns [`TraceError::InvalidJson`] when the bytes aren't JSON, or
    /// [`TraceError::MissingField`] when a required field is absent.
    pub fn from_json(bytes: &[u8]) -> Result<Self, TraceError> {
        let raw: RawTrace =
            serde_json::from_slice(bytes).map_err(|err| TraceError::InvalidJson(err.to_string()))?;
        Ok(Self {
            test_id: raw.test_id.ok_or(TraceError::MissingField("testId"))?,
            wall_clock_ms: raw.wall_clock_ms.ok_or(TraceError::MissingField("wallClockMs"))?,
            milestone_results: raw
                .milestone_results
                .ok_or(TraceError::MissingField("milestoneResults"))?,
            feedback: raw.feedback,
            snapshot: raw.snapshot,
            steps_used: raw.steps_used,
            errors: raw.errors,
            recovered_errors: raw.recovered_errors,
            response_checks: raw.response_checks,
        })
    }
}

// ============================================================================
// SECTION: Per-Test Result
// ============================================================================

/// Outcome category of a scored test (§3, §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    /// Composite score met `PASS_THRESHOLD`.
    Pass,
    /// Composite score fell short of `PASS_THRESHOLD`.
    Fail,
    /// The trace was unloadable or malformed; composite forced to 0.
    Error,
    /// The test was not scheduled this crank.
    Skipped,
}

/// Per-milestone verdict, distinguishing a definite failure from a
/// fail-closed `unverifiable` result (§4.3, §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneOutcome {
    /// The verify block evaluated to true.
    Achieved,
    /// The verify block evaluated to false.
    Failed,
    /// Neither the snapshot nor a live context could decide the verify block.
    Unverifiable,
}

/// The validator's per-test scoring output (§4.3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerTestResult {
    /// The test this result belongs to.
    pub test_id: TestId,
    /// Overall pass/fail/error/skipped verdict.
    pub status: TestStatus,
    /// Per-milestone verdicts.
    pub milestone_outcomes: BTreeMap<MilestoneId, MilestoneOutcome>,
    /// Weighted sum of achieved milestone weights, in `[0, 1]`.
    pub completion: f64,
    /// Step/time efficiency sub-score, in `[0, 1]`.
    pub efficiency: f64,
    /// Error-recovery sub-score, in `[0, 1]`.
    pub resilience: f64,
    /// Passed/total response-check ratio, in `[0, 1]`.
    pub response_quality: f64,
    /// Weighted composite of the four sub-scores, in `[0, 1]`.
    pub composite: f64,
}

impl PerTestResult {
    /// Whether this result counts as a "perfect" test (§4.3:
    /// `completion == 1` and `status = pass`).
    #[must_use]
    pub fn is_perfect(&self) -> bool {
        (self.completion - 1.0).abs() < f64::EPSILON && self.status == TestStatus::Pass
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
