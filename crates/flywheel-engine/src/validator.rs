// flywheel-engine/src/validator.rs
// ============================================================================
// Module: Validator (C5)
// Description: Evaluates each test's milestones against its trace and
//              computes per-test scores.
// Purpose: Implement §4.3's offline-first, live-fallback scoring pipeline.
// Dependencies: flywheel-core, flywheel-config, flywheel-logic
// ============================================================================

//! ## Overview
//! [`validate_test`] loads a trace (already shape-checked by the caller via
//! [`flywheel_core::Trace::from_json`]), evaluates every milestone's verify
//! block against a [`flywheel_core::VerifyContext`] built from the trace's
//! snapshot and an optional live browser context, and folds the result
//! into the four §4.3 sub-scores plus their weighted composite.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use flywheel_config::FlywheelConfig;
use flywheel_core::LiveBrowserContext;
use flywheel_core::MilestoneOutcome;
use flywheel_core::PerTestResult;
use flywheel_core::TestDefinition;
use flywheel_core::TestStatus;
use flywheel_core::Trace;
use flywheel_core::VerifyContext;
use flywheel_logic::KleeneLogic;
use flywheel_logic::TriState;

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Scores one test's trace against its definition (§4.3).
///
/// `live` is the still-open runner's browser context, if the run hasn't
/// already been torn down; pass `None` once the run directory has been
/// sealed so every milestone falls back to `unverifiable` instead of
/// `failed` when the snapshot alone can't decide it.
#[must_use]
pub fn validate_test(test: &TestDefinition, trace: &Trace, live: Option<&dyn LiveBrowserContext>, config: &FlywheelConfig) -> PerTestResult {
    let context = VerifyContext::new(trace.snapshot.as_ref(), live);
    let logic = KleeneLogic;

    let mut milestone_outcomes = BTreeMap::new();
    let mut completion = 0.0;
    for milestone in &test.milestones {
        let outcome = match milestone.verify.eval_tristate(&context, 0, &logic) {
            TriState::True => MilestoneOutcome::Achieved,
            TriState::False => MilestoneOutcome::Failed,
            TriState::Unknown => MilestoneOutcome::Unverifiable,
        };
        if outcome == MilestoneOutcome::Achieved {
            completion += milestone.weight;
        }
        milestone_outcomes.insert(milestone.id.clone(), outcome);
    }
    completion = completion.clamp(0.0, 1.0);

    let efficiency = efficiency_score(trace.steps_used, &test.budget);
    let resilience = resilience_score(trace.errors, trace.recovered_errors);
    let response_quality = trace.response_checks.map_or(1.0, |checks| {
        if checks.total == 0 { 1.0 } else { f64_ratio(checks.passed, checks.total) }
    });

    let composite = 0.60 * completion + 0.15 * efficiency + 0.10 * resilience + 0.15 * response_quality;
    let status = if composite >= config.pass_threshold { TestStatus::Pass } else { TestStatus::Fail };

    PerTestResult {
        test_id: test.id.clone(),
        status,
        milestone_outcomes,
        completion,
        efficiency,
        resilience,
        response_quality,
        composite,
    }
}

/// Builds the `error` result for a trace that failed its shape check or
/// was never produced (§4.2 missing-trace recovery, §4.3 step 1).
#[must_use]
pub fn error_result(test: &TestDefinition) -> PerTestResult {
    PerTestResult {
        test_id: test.id.clone(),
        status: TestStatus::Error,
        milestone_outcomes: BTreeMap::new(),
        completion: 0.0,
        efficiency: 0.0,
        resilience: 0.0,
        response_quality: 0.0,
        composite: 0.0,
    }
}

/// `efficiency = max(0, 1 - max(0, stepsUsed - budget) / budget)`; when
/// `maxSteps` is zero or unspecified, efficiency is `1` iff no steps were
/// used (§4.3).
fn efficiency_score(steps_used: u64, budget: &flywheel_core::Budget) -> f64 {
    if budget.max_steps == 0 {
        return if steps_used == 0 { 1.0 } else { 0.0 };
    }
    let overage = steps_used.saturating_sub(budget.max_steps);
    (1.0 - f64_ratio(overage, budget.max_steps)).max(0.0)
}

/// `resilience = 1` with no errors, else `0.5 + 0.5 * recovered / errors`,
/// clamped to `[0, 1]` (§4.3).
fn resilience_score(errors: u64, recovered_errors: u64) -> f64 {
    if errors == 0 {
        return 1.0;
    }
    (0.5 + 0.5 * f64_ratio(recovered_errors, errors)).clamp(0.0, 1.0)
}

#[allow(clippy::cast_precision_loss, reason = "trace counters are small enough to round-trip through f64")]
fn f64_ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 { 0.0 } else { numerator as f64 / denominator as f64 }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
