// flywheel-engine/src/orchestrator.rs
// ============================================================================
// Module: Crank Orchestrator (C9)
// Description: Drives the full crank lifecycle across every other
//              component, enforcing the state machine and invariants.
// Purpose: Implement §4.7's SELECT → ... → DONE state machine.
// Dependencies: flywheel-core, flywheel-config, flywheel-logic (via
//               validator), tracing
// ============================================================================

//! ## Overview
//! [`run_crank`] drives one crank through `SELECT → FIX → MEASURE →
//! VALIDATE → FEEDBACK_EXTRACT → MATCH_WAIT → FEEDBACK_APPLY → RECORD →
//! DONE`, delegating to the other engine modules at each step and to the
//! collaborator traits (`BacklogStore`, `HistoryLog`, `Runner`, `Fixer`,
//! `Matcher`) `flywheel-core` defines. It never reads a collaborator's
//! free-text output (§5 context-window protection) — only the structured
//! artifacts those traits return or that MATCH_WAIT polls for on disk.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use flywheel_config::FlywheelConfig;
use flywheel_core::Backlog;
use flywheel_core::BacklogStore;
use flywheel_core::BacklogStoreError;
use flywheel_core::Baseline;
use flywheel_core::FeedbackEntryNormalized;
use flywheel_core::Fixer;
use flywheel_core::FixerError;
use flywheel_core::FixOutcome;
use flywheel_core::HistoryLog;
use flywheel_core::HistoryLogError;
use flywheel_core::HistoryRecord;
use flywheel_core::Issue;
use flywheel_core::IssueId;
use flywheel_core::LiveBrowserContext;
use flywheel_core::MatchDecision;
use flywheel_core::Matcher;
use flywheel_core::MatcherError;
use flywheel_core::PerTestResult;
use flywheel_core::Runner;
use flywheel_core::RunnerError;
use flywheel_core::TestDefinition;
use flywheel_core::Timestamp;
use flywheel_core::Trace;
use flywheel_core::TraceError;
use thiserror::Error;
use tracing::info;
use tracing::warn;

use crate::decision;
use crate::decision::DecisionError;
use crate::decision::Recommendation;
use crate::feedback_apply;
use crate::feedback_apply::ApplySummary;
use crate::feedback_extract;
use crate::scoring;
use crate::scoring::GateResult;
use crate::scoring::ScoreSummary;
use crate::scoring::ShsOutcome;
use crate::validator;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Composed failure modes across the whole crank lifecycle, mirroring each
/// collaborator's own error type (§4.7, §7).
#[derive(Debug, Error)]
pub enum CrankError {
    /// The decision engine could not produce recommendations.
    #[error(transparent)]
    Decision(#[from] DecisionError),
    /// The backlog store failed.
    #[error(transparent)]
    BacklogStore(#[from] BacklogStoreError),
    /// The history log failed.
    #[error(transparent)]
    HistoryLog(#[from] HistoryLogError),
    /// A runner failed to spawn or be supervised (trace-level errors are
    /// recovered, not surfaced here — see [`MeasureOutcome`]).
    #[error(transparent)]
    Runner(#[from] RunnerError),
    /// The fixer failed to spawn or be supervised.
    #[error(transparent)]
    Fixer(#[from] FixerError),
    /// The matcher could not be spawned.
    #[error(transparent)]
    Matcher(#[from] MatcherError),
    /// MATCH_WAIT exceeded `matcher_timeout_ms` without the decisions file
    /// appearing (§5, distinct from a runner failure).
    #[error("matcher did not produce a decisions file within the timeout")]
    MatcherTimeout,
    /// The crank was cancelled before RECORD.
    #[error("crank was cancelled")]
    Cancelled,
}

// ============================================================================
// SECTION: Crank Mode
// ============================================================================

/// Which phases a crank runs (§4.7 measure-only mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrankMode {
    /// The full `SELECT → ... → DONE` lifecycle.
    Full,
    /// Skips SELECT and FIX; runs MEASURE through RECORD with no fix
    /// outcome appended.
    MeasureOnly,
}

// ============================================================================
// SECTION: Crank Outcome
// ============================================================================

/// What happened to the fix attempted this crank, if any.
#[derive(Debug, Clone, PartialEq)]
pub enum FixPhaseOutcome {
    /// Measure-only mode; no issue was selected.
    Skipped,
    /// The decision engine returned nothing to fix.
    NoCandidates,
    /// The fixer reported failure; no measurement followed.
    FixerFailed { issue_id: IssueId },
    /// The fixer reported success and measurement proceeded.
    Applied { issue_id: IssueId, changed_files: Vec<String> },
}

/// The full result of one crank, ready to be printed by the CLI (§4.7
/// "user-visible behavior").
#[derive(Debug, Clone, PartialEq)]
pub struct CrankOutcome {
    /// What happened during FIX, if anything was attempted.
    pub fix_phase: FixPhaseOutcome,
    /// The suite's score summary this crank, or `None` when the crank
    /// stopped before MEASURE produced a score (e.g. fixer failed).
    pub score: Option<ScoreSummary>,
    /// The regression gate's verdict, or `None` when scoring was skipped.
    pub gate: Option<GateResult>,
    /// The final fix outcome recorded for this crank, if a fix was
    /// attempted (distinct from `fix_phase` once the gate decides revert).
    pub fix_outcome: Option<FixOutcome>,
    /// The applier's summary, if feedback was processed.
    pub apply_summary: Option<ApplySummary>,
}

// ============================================================================
// SECTION: Collaborators
// ============================================================================

/// The external collaborators one crank drives, bundled so [`run_crank`]
/// takes one argument instead of five.
pub struct Collaborators<'a> {
    /// Single-writer backlog persistence (C1).
    pub backlog_store: &'a dyn BacklogStore,
    /// Append-only fix/crank history (C2).
    pub history_log: &'a dyn HistoryLog,
    /// Executes test definitions (C4).
    pub runner: &'a dyn Runner,
    /// Applies a code fix for the selected issue.
    pub fixer: &'a dyn Fixer,
    /// Invokes the external semantic matcher.
    pub matcher: &'a dyn Matcher,
}

// ============================================================================
// SECTION: Run Crank
// ============================================================================

/// Drives one crank end to end.
///
/// `tests` is the fixed suite this crank measures; `run_dir` is this
/// crank's exclusive scratch directory for trace/feedback/decisions files
/// (§5: "never mutated after RECORD completes"); `version_tag` labels the
/// resulting baseline if one is accepted.
///
/// # Errors
/// Returns [`CrankError`] for collaborator failures and for a MATCH_WAIT
/// timeout. A runner producing a malformed trace, or the regression gate
/// failing, are NOT errors — they are ordinary outcomes reported in the
/// returned [`CrankOutcome`] (§4.7: "the regression-gate failure is
/// non-fatal").
#[allow(clippy::too_many_arguments, reason = "the crank lifecycle genuinely threads this many collaborators and knobs")]
pub fn run_crank(
    mode: CrankMode,
    current_crank: u64,
    version_tag: &str,
    tests: &[TestDefinition],
    run_dir: &Path,
    collaborators: &Collaborators<'_>,
    baseline: Option<&Baseline>,
    config: &FlywheelConfig,
) -> Result<(CrankOutcome, Backlog, Option<Baseline>), CrankError> {
    let mut backlog = collaborators.backlog_store.load()?;

    // SELECT / FIX
    let fix_phase = if mode == CrankMode::MeasureOnly {
        FixPhaseOutcome::Skipped
    } else {
        select_and_fix(&mut backlog, current_crank, collaborators.fixer, config)?
    };

    if let FixPhaseOutcome::FixerFailed { issue_id } = &fix_phase {
        record_fix_outcome(&mut backlog, issue_id, FixOutcome::Failed, current_crank, None);
        collaborators.backlog_store.save(&backlog)?;
        let empty_score = ScoreSummary {
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
        append_crank_summary(collaborators.history_log, current_crank, version_tag, &empty_score, 0.0, &[], Some(issue_id.clone()), Some(FixOutcome::Failed))?;
        return Ok((
            CrankOutcome { fix_phase, score: None, gate: None, fix_outcome: Some(FixOutcome::Failed), apply_summary: None },
            backlog,
            baseline.cloned(),
        ));
    }

    // MEASURE
    let (results, categories, traces) = measure(tests, run_dir, collaborators.runner, config)?;

    // VALIDATE already folded into `measure`; compute SHS/gate here.
    let score = scoring::score_suite(&results, &categories);

    let gate = match score.shs {
        ShsOutcome::Empty => None,
        ShsOutcome::Score(shs) => baseline.map(|baseline| scoring::evaluate_gate(shs, baseline, &results, config)),
    };

    // FEEDBACK_EXTRACT
    let raw_feedback: Vec<_> = traces.iter().flat_map(|trace| trace.feedback.clone()).collect();
    let normalized = feedback_extract::extract_feedback(&raw_feedback);

    // MATCH_WAIT
    let decisions = if normalized.is_empty() {
        Vec::new()
    } else {
        run_match_wait(collaborators.matcher, run_dir, &normalized, &backlog, config)?
    };

    // FEEDBACK_APPLY
    let apply_summary = feedback_apply::apply_feedback(&mut backlog, &normalized, &decisions, config);

    // RECORD
    let fix_outcome = finalize_fix_outcome(&fix_phase, &gate);
    if let (FixPhaseOutcome::Applied { issue_id, .. }, Some(outcome)) = (&fix_phase, fix_outcome) {
        let shs_delta = match (score.shs, baseline) {
            (ShsOutcome::Score(shs), Some(baseline)) => Some(shs - baseline.shs),
            _ => None,
        };
        record_fix_outcome(&mut backlog, issue_id, outcome, current_crank, shs_delta);
    }

    collaborators.backlog_store.save(&backlog)?;

    let next_baseline = match (score.shs, &gate) {
        (ShsOutcome::Score(shs), Some(GateResult::Pass) | None) => {
            Some(scoring::next_baseline(shs, &results, baseline, version_tag, config))
        }
        _ => baseline.cloned(),
    };

    let failure_pattern_tags = observed_failure_pattern_tags(&backlog, &apply_summary);
    let shs_delta = match (score.shs, baseline) {
        (ShsOutcome::Score(shs), Some(baseline)) => shs - baseline.shs,
        (ShsOutcome::Score(shs), None) => shs,
        (ShsOutcome::Empty, _) => 0.0,
    };

    append_crank_summary(
        collaborators.history_log,
        current_crank,
        version_tag,
        &score,
        shs_delta,
        &failure_pattern_tags,
        fix_issue_id(&fix_phase),
        fix_outcome,
    )?;

    info!(crank = current_crank, shs = ?score.shs, gate = ?gate, "crank complete");

    Ok((
        CrankOutcome { fix_phase, score: Some(score), gate, fix_outcome, apply_summary: Some(apply_summary) },
        backlog,
        next_baseline,
    ))
}

// ============================================================================
// SECTION: SELECT / FIX
// ============================================================================

fn select_and_fix(
    backlog: &mut Backlog,
    current_crank: u64,
    fixer: &dyn Fixer,
    config: &FlywheelConfig,
) -> Result<FixPhaseOutcome, CrankError> {
    let ranked: Vec<Recommendation> = decision::rank_issues(backlog, current_crank, config);
    let Some(top) = ranked.first() else {
        return Ok(FixPhaseOutcome::NoCandidates);
    };
    let Some(issue) = backlog.find(&top.issue_id).cloned() else {
        return Ok(FixPhaseOutcome::NoCandidates);
    };

    let report = fixer.apply(&issue)?;
    if report.succeeded {
        Ok(FixPhaseOutcome::Applied { issue_id: issue.id, changed_files: report.changed_files })
    } else {
        Ok(FixPhaseOutcome::FixerFailed { issue_id: issue.id })
    }
}

fn record_fix_outcome(backlog: &mut Backlog, issue_id: &IssueId, outcome: FixOutcome, current_crank: u64, shs_delta: Option<f64>) {
    if let Some(issue) = backlog.issues.iter_mut().find(|issue| &issue.id == issue_id) {
        issue.fix_attempts.push(flywheel_core::FixAttempt {
            date: Timestamp::now(),
            crank_number: current_crank,
            outcome,
            details: None,
            changed_files: Vec::new(),
            shs_delta,
        });
        if outcome == FixOutcome::Fixed {
            issue.status = flywheel_core::IssueStatus::Implemented;
        }
    }
}

fn fix_issue_id(fix_phase: &FixPhaseOutcome) -> Option<IssueId> {
    match fix_phase {
        FixPhaseOutcome::Applied { issue_id, .. } | FixPhaseOutcome::FixerFailed { issue_id } => Some(issue_id.clone()),
        FixPhaseOutcome::Skipped | FixPhaseOutcome::NoCandidates => None,
    }
}

/// Resolves the fix outcome once the gate is known (§4.7 regression
/// handling): a passed gate keeps `fixed`; a failed gate reverts it.
fn finalize_fix_outcome(fix_phase: &FixPhaseOutcome, gate: &Option<GateResult>) -> Option<FixOutcome> {
    match fix_phase {
        FixPhaseOutcome::Applied { .. } => match gate {
            Some(GateResult::Fail { .. }) => Some(FixOutcome::Reverted),
            Some(GateResult::Pass) | None => Some(FixOutcome::Fixed),
        },
        FixPhaseOutcome::FixerFailed { .. } => Some(FixOutcome::Failed),
        FixPhaseOutcome::Skipped | FixPhaseOutcome::NoCandidates => None,
    }
}

// ============================================================================
// SECTION: MEASURE / VALIDATE
// ============================================================================

/// Runs every test, reads back its trace, and validates it, recovering a
/// single missing-trace retry per test before scoring it `error` (§4.2).
fn measure(
    tests: &[TestDefinition],
    run_dir: &Path,
    runner: &dyn Runner,
    config: &FlywheelConfig,
) -> Result<(Vec<PerTestResult>, std::collections::BTreeMap<flywheel_core::TestId, flywheel_core::TestCategory>, Vec<Trace>), CrankError> {
    let mut results = Vec::with_capacity(tests.len());
    let mut categories = std::collections::BTreeMap::new();
    let mut traces = Vec::with_capacity(tests.len());

    for test in tests {
        categories.insert(test.id.clone(), test.category);
        let test_dir = run_dir.join(test.id.as_str());

        let trace = run_with_retry(test, &test_dir, runner)?;
        match trace {
            Some(trace) => {
                let result = validator::validate_test(test, &trace, live_context_for(&test_dir).as_deref(), config);
                traces.push(trace);
                results.push(result);
            }
            None => {
                warn!(test_id = %test.id, "trace unrecoverable after retry, scoring as error");
                results.push(validator::error_result(test));
            }
        }
    }

    Ok((results, categories, traces))
}

/// Runs `test` once, retries exactly once on a missing/malformed trace
/// (§4.2), and returns the shape-checked trace if either attempt produced one.
fn run_with_retry(test: &TestDefinition, run_dir: &Path, runner: &dyn Runner) -> Result<Option<Trace>, CrankError> {
    for attempt in 0..2 {
        runner.run(test, run_dir)?;
        match read_trace(run_dir) {
            Ok(trace) => return Ok(Some(trace)),
            Err(err) => warn!(test_id = %test.id, attempt, error = %err, "trace missing or malformed"),
        }
    }
    Ok(None)
}

fn read_trace(run_dir: &Path) -> Result<Trace, TraceError> {
    let path = run_dir.join("trace.json");
    let bytes = std::fs::read(&path).map_err(|err| TraceError::InvalidJson(err.to_string()))?;
    Trace::from_json(&bytes)
}

/// Returns the runner's live browser context for fallback verification, if
/// this implementation exposes one. The default runner contract writes an
/// offline snapshot only, so this is `None` unless a concrete `Runner`
/// leaves a live context reachable for the duration of VALIDATE.
fn live_context_for(_run_dir: &Path) -> Option<Box<dyn LiveBrowserContext>> {
    None
}

// ============================================================================
// SECTION: MATCH_WAIT
// ============================================================================

/// Spawns the matcher and polls `run_dir` for its output file (§4.7, §5).
fn run_match_wait(
    matcher: &dyn Matcher,
    run_dir: &Path,
    normalized: &[FeedbackEntryNormalized],
    backlog: &Backlog,
    config: &FlywheelConfig,
) -> Result<Vec<MatchDecision>, CrankError> {
    let extracted_path = run_dir.join("extracted-feedback.json");
    let open_issues_path = run_dir.join("open-issues.json");
    let output_path = run_dir.join("match-decisions.json");

    std::fs::write(&extracted_path, serde_json::to_vec_pretty(normalized).unwrap_or_default())
        .map_err(|err| CrankError::Matcher(MatcherError::Io(err.to_string())))?;
    let open_issues: Vec<&Issue> = backlog.open_issues().collect();
    std::fs::write(&open_issues_path, serde_json::to_vec_pretty(&open_issues).unwrap_or_default())
        .map_err(|err| CrankError::Matcher(MatcherError::Io(err.to_string())))?;

    matcher.spawn(&extracted_path, &open_issues_path, &output_path)?;

    poll_for_decisions(&output_path, config)
}

fn poll_for_decisions(output_path: &Path, config: &FlywheelConfig) -> Result<Vec<MatchDecision>, CrankError> {
    let deadline = Instant::now() + Duration::from_millis(config.matcher_timeout_ms);
    let poll_interval = Duration::from_millis(config.matcher_poll_interval_ms);

    loop {
        if output_path.exists() {
            let bytes = std::fs::read(output_path).map_err(|err| CrankError::Matcher(MatcherError::Io(err.to_string())))?;
            let decisions: Vec<MatchDecision> =
                serde_json::from_slice(&bytes).map_err(|err| CrankError::Matcher(MatcherError::Io(err.to_string())))?;
            return Ok(decisions);
        }
        if Instant::now() >= deadline {
            return Err(CrankError::MatcherTimeout);
        }
        thread::sleep(poll_interval);
    }
}

// ============================================================================
// SECTION: RECORD
// ============================================================================

/// Union of failure-pattern tags carried by issues this crank's feedback
/// touched (upvoted or newly minted), deduplicated. §3 ties failure-pattern
/// tags to issues rather than to individual traces, so this is the closest
/// per-crank observation the orchestrator can report without inventing a
/// trace-level tagging scheme the specification never names.
fn observed_failure_pattern_tags(backlog: &Backlog, apply_summary: &ApplySummary) -> Vec<String> {
    let touched: std::collections::BTreeSet<&IssueId> = apply_summary
        .upvotes
        .iter()
        .map(|upvote| &upvote.issue_id)
        .chain(apply_summary.minted.iter().map(|minted| &minted.issue_id))
        .collect();

    let mut tags: std::collections::BTreeSet<String> = std::collections::BTreeSet::new();
    for issue_id in touched {
        if let Some(issue) = backlog.find(issue_id) {
            tags.extend(issue.failure_pattern_tags.iter().cloned());
        }
    }
    tags.into_iter().collect()
}

#[allow(clippy::too_many_arguments, reason = "mirrors CrankSummary's own field count; splitting would just move the list")]
fn append_crank_summary(
    history_log: &dyn HistoryLog,
    current_crank: u64,
    version_tag: &str,
    score: &ScoreSummary,
    shs_delta: f64,
    failure_pattern_tags: &[String],
    fix_issue_id: Option<IssueId>,
    fix_outcome: Option<FixOutcome>,
) -> Result<(), CrankError> {
    let shs_value = match score.shs {
        ShsOutcome::Score(shs) => shs,
        ShsOutcome::Empty => 0.0,
    };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, reason = "suite sizes fit comfortably in u64")]
    let record = HistoryRecord::Crank(flywheel_core::CrankSummary {
        crank_number: current_crank,
        version_tag: version_tag.to_string(),
        timestamp: Timestamp::now(),
        shs: shs_value,
        shs_delta,
        total_tests: score.total as u64,
        passed_tests: score.passed as u64,
        perfect_tests: score.perfect as u64,
        failure_pattern_tags: failure_pattern_tags.to_vec(),
        fix_issue_id,
        fix_outcome,
    });
    history_log.append(&record)?;
    Ok(())
}

// ============================================================================
// SECTION: Single-Mode Entry Points (§6 CLI surface)
// ============================================================================

/// Runs SELECT and FIX against the top-ranked recommendation, recording
/// the fixer's own verdict immediately without measuring it (§6
/// `flywheel fix-only`: "apply top recommendation without
/// re-measurement").
///
/// The recorded [`FixOutcome`] (`fixed` or `failed`) reflects only the
/// fixer's self-reported success, not a regression-gated one — there is
/// no measurement this call to gate it against. A later `crank` or
/// `measure` run is expected to confirm the fix; unlike a fix applied
/// during a full crank, this orchestrator has no mechanism to revert a
/// fix-only attempt retroactively if that later measurement regresses
/// (§9 open question: accepted gap, since reverting requires the fix
/// attempt and its measurement to share one crank).
///
/// # Errors
/// Returns [`CrankError`] for backlog or fixer collaborator failures.
pub fn run_fix_only(
    backlog_store: &dyn BacklogStore,
    fixer: &dyn Fixer,
    current_crank: u64,
    config: &FlywheelConfig,
) -> Result<FixPhaseOutcome, CrankError> {
    let mut backlog = backlog_store.load()?;
    let fix_phase = select_and_fix(&mut backlog, current_crank, fixer, config)?;

    match &fix_phase {
        FixPhaseOutcome::Applied { issue_id, .. } => {
            record_fix_outcome(&mut backlog, issue_id, FixOutcome::Fixed, current_crank, None);
        }
        FixPhaseOutcome::FixerFailed { issue_id } => {
            record_fix_outcome(&mut backlog, issue_id, FixOutcome::Failed, current_crank, None);
        }
        FixPhaseOutcome::Skipped | FixPhaseOutcome::NoCandidates => {}
    }

    backlog_store.save(&backlog)?;
    Ok(fix_phase)
}

/// Runs and validates exactly one test, outside the crank lifecycle (§6
/// `flywheel test <TEST_ID>`: "no SELECT/FIX/RECORD phases"). Applies the
/// same single-retry-on-missing-trace policy as MEASURE (§4.2).
///
/// # Errors
/// Returns [`CrankError`] if the runner fails to spawn or be supervised.
pub fn run_single_test(
    test: &TestDefinition,
    run_dir: &Path,
    runner: &dyn Runner,
    config: &FlywheelConfig,
) -> Result<PerTestResult, CrankError> {
    let trace = run_with_retry(test, run_dir, runner)?;
    Ok(match trace {
        Some(trace) => validator::validate_test(test, &trace, live_context_for(run_dir).as_deref(), config),
        None => {
            warn!(test_id = %test.id, "trace unrecoverable after retry, scoring as error");
            validator::error_result(test)
        }
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
