// flywheel-engine/src/scoring.rs
// ============================================================================
// Module: Scoring & Baseline Manager (C6)
// Description: Aggregates per-test results into a Skill Health Score,
//              compares against the last-accepted baseline, and runs the
//              regression gate.
// Purpose: Implement §4.4's SHS formula, baseline delta classification,
//          and regression gate.
// Dependencies: flywheel-core, flywheel-config
// ============================================================================

//! ## Overview
//! [`score_suite`] folds a crank's [`PerTestResult`]s into an [`ShsOutcome`].
//! [`compare_to_baseline`] classifies each overlapping test as
//! `improvement`/`regression`/`unchanged` at the ±0.1 delta threshold (§4.4).
//! [`evaluate_gate`] applies the two regression-gate conditions, and
//! [`next_baseline`] builds the [`Baseline`] the orchestrator hands to
//! [`flywheel_store::FileBaselineStore::accept`] once the gate passes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use flywheel_config::FlywheelConfig;
use flywheel_core::Baseline;
use flywheel_core::PerTestResult;
use flywheel_core::TestCategory;
use flywheel_core::TestId;
use flywheel_core::TestStatus;
use flywheel_core::Timestamp;

// ============================================================================
// SECTION: Skill Health Score
// ============================================================================

/// The Skill Health Score, or `Empty` when the suite had no tests (§4.4:
/// "the orchestrator must surface this as a distinct `empty` result rather
/// than zero").
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShsOutcome {
    /// The computed score, in `[0, 100]`.
    Score(f64),
    /// No tests were run this crank.
    Empty,
}

/// The five metrics the SHS weights together, alongside the score itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreSummary {
    /// The aggregate score, or `Empty` when `total == 0`.
    pub shs: ShsOutcome,
    /// `passed / total`.
    pub pass_rate: f64,
    /// Mean of per-test completion.
    pub avg_completion: f64,
    /// `perfectCount / total`.
    pub perfect_rate: f64,
    /// Mean of per-test efficiency.
    pub avg_efficiency: f64,
    /// `categoriesWithAtLeastOnePass / totalCategories`.
    pub category_coverage: f64,
    /// Total tests scored this crank.
    pub total: usize,
    /// Tests with `status = pass`.
    pub passed: usize,
    /// Tests with `completion == 1 && status = pass`.
    pub perfect: usize,
}

/// Computes the Skill Health Score from a crank's results (§4.4).
///
/// `categories` maps each result's test id to its category, used for the
/// `categoryCoverage` term; a test id absent from the map is excluded from
/// the denominator of categories tracked, never from `total`.
#[must_use]
pub fn score_suite(results: &[PerTestResult], categories: &BTreeMap<TestId, TestCategory>) -> ScoreSummary {
    let total = results.len();
    if total == 0 {
        return ScoreSummary {
            shs: ShsOutcome::Empty,
            pass_rate: 0.0,
            avg_completion: 0.0,
            perfect_rate: 0.0,
            avg_efficiency: 0.0,
            category_coverage: 0.0,
            total: 0,
            passed: 0,
            perfect: 0,
        };
    }

    let passed = results.iter().filter(|r| r.status == TestStatus::Pass).count();
    let perfect = results.iter().filter(|r| r.is_perfect()).count();

    let pass_rate = ratio(passed, total);
    let avg_completion = mean(results.iter().map(|r| r.completion));
    let perfect_rate = ratio(perfect, total);
    let avg_efficiency = mean(results.iter().map(|r| r.efficiency));
    let category_coverage = category_coverage(results, categories);

    let shs = 100.0
        * (0.40 * pass_rate + 0.25 * avg_completion + 0.15 * perfect_rate + 0.10 * avg_efficiency + 0.10 * category_coverage);

    ScoreSummary {
        shs: ShsOutcome::Score(shs),
        pass_rate,
        avg_completion,
        perfect_rate,
        avg_efficiency,
        category_coverage,
        total,
        passed,
        perfect,
    }
}

fn category_coverage(results: &[PerTestResult], categories: &BTreeMap<TestId, TestCategory>) -> f64 {
    let tracked: BTreeSet<TestCategory> = categories.values().copied().collect();
    if tracked.is_empty() {
        return 0.0;
    }
    let covered = tracked
        .iter()
        .filter(|category| {
            results.iter().any(|result| {
                result.status == TestStatus::Pass && categories.get(&result.test_id) == Some(*category)
            })
        })
        .count();
    ratio(covered, tracked.len())
}

#[allow(clippy::cast_precision_loss, reason = "suite sizes are small enough to round-trip through f64")]
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 { 0.0 } else { numerator as f64 / denominator as f64 }
}

#[allow(clippy::cast_precision_loss, reason = "suite sizes are small enough to round-trip through f64")]
fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let count = values.len();
    if count == 0 {
        return 0.0;
    }
    values.sum::<f64>() / count as f64
}

// ============================================================================
// SECTION: Baseline Comparison
// ============================================================================

/// Classification of one test's movement against the baseline (§4.4: delta
/// beyond ±0.1 is significant; smaller deltas are noise).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TestDelta {
    /// New this crank; no baseline composite to compare against.
    New,
    /// Composite rose by more than `0.1`.
    Improvement(f64),
    /// Composite fell by more than `0.1`.
    Regression(f64),
    /// Composite moved by at most `0.1` in either direction.
    Unchanged(f64),
}

/// Significance threshold for a composite delta (§4.4).
const DELTA_SIGNIFICANCE: f64 = 0.1;

/// Compares this crank's results against the last-accepted baseline.
///
/// Returns `None` when `baseline` is absent (§4.4: `isFirst`, every test is
/// `new`); otherwise one [`TestDelta`] per result.
#[must_use]
pub fn compare_to_baseline(results: &[PerTestResult], baseline: Option<&Baseline>) -> Option<BTreeMap<TestId, TestDelta>> {
    let baseline = baseline?;
    Some(
        results
            .iter()
            .map(|result| {
                let delta = match baseline.per_test_composite.get(&result.test_id) {
                    None => TestDelta::New,
                    Some(previous) => {
                        let delta = result.composite - previous;
                        if delta > DELTA_SIGNIFICANCE {
                            TestDelta::Improvement(delta)
                        } else if delta < -DELTA_SIGNIFICANCE {
                            TestDelta::Regression(delta)
                        } else {
                            TestDelta::Unchanged(delta)
                        }
                    }
                };
                (result.test_id.clone(), delta)
            })
            .collect(),
    )
}

// ============================================================================
// SECTION: Regression Gate
// ============================================================================

/// Outcome of the regression gate (§4.4).
#[derive(Debug, Clone, PartialEq)]
pub enum GateResult {
    /// Both gate conditions held; the new baseline may be accepted.
    Pass,
    /// At least one condition failed; the baseline stays unchanged and any
    /// fix applied this crank must be reverted.
    Fail {
        /// Ids of previously-ratcheted tests that dropped below threshold.
        dropped_ratcheted_tests: Vec<TestId>,
        /// Whether the SHS margin condition itself failed.
        shs_below_margin: bool,
    },
}

/// Applies the two regression-gate conditions from §4.4:
/// 1. `newSHS >= baselineSHS - SHS_MARGIN`.
/// 2. No test ratcheted for `ratchet_consecutive` cranks has composite below
///    `ratchet_threshold` this crank.
///
/// Called only when `new_shs` is a real score; an `empty` suite never
/// reaches the gate.
#[must_use]
pub fn evaluate_gate(new_shs: f64, baseline: &Baseline, results: &[PerTestResult], config: &FlywheelConfig) -> GateResult {
    let shs_below_margin = new_shs < baseline.shs - config.shs_margin;

    let dropped_ratcheted_tests: Vec<TestId> = results
        .iter()
        .filter(|result| {
            baseline.is_ratcheted(&result.test_id, config.ratchet_consecutive)
                && result.composite < config.ratchet_threshold
        })
        .map(|result| result.test_id.clone())
        .collect();

    if shs_below_margin || !dropped_ratcheted_tests.is_empty() {
        GateResult::Fail { dropped_ratcheted_tests, shs_below_margin }
    } else {
        GateResult::Pass
    }
}

// ============================================================================
// SECTION: Next Baseline
// ============================================================================

/// Builds the [`Baseline`] to accept once the regression gate passes,
/// advancing the ratchet streak for every test that held
/// `ratchet_threshold` this crank and resetting it otherwise.
#[must_use]
pub fn next_baseline(
    shs: f64,
    results: &[PerTestResult],
    previous: Option<&Baseline>,
    version_tag: &str,
    config: &FlywheelConfig,
) -> Baseline {
    let mut per_test_composite = BTreeMap::new();
    let mut ratcheted_tests = BTreeMap::new();

    for result in results {
        per_test_composite.insert(result.test_id.clone(), result.composite);

        let prior_streak = previous
            .and_then(|baseline| baseline.ratcheted_tests.get(&result.test_id))
            .copied()
            .unwrap_or(0);
        let streak = if result.composite >= config.ratchet_threshold { prior_streak + 1 } else { 0 };
        if streak > 0 {
            ratcheted_tests.insert(result.test_id.clone(), streak);
        }
    }

    Baseline {
        shs,
        per_test_composite,
        ratcheted_tests,
        version_tag: version_tag.to_string(),
        timestamp: Timestamp::now(),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
