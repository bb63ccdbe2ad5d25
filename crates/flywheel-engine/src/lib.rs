// flywheel-engine/src/lib.rs
// ============================================================================
// Module: Flywheel Engine Library
// Description: Public API surface for the crank lifecycle: decision engine,
//              validator, scoring/baseline manager, feedback
//              extractor/applier, and the orchestrator that drives them.
// Purpose: Expose run_crank and its supporting types to flywheel-cli.
// Dependencies: flywheel-core, flywheel-config, flywheel-logic
// ============================================================================

//! ## Overview
//! Flywheel engine implements every stage of one crank (§4): selecting an
//! issue to fix (`decision`), scoring a test suite against its traces
//! (`validator`), aggregating scores into a Skill Health Score and running
//! the regression gate (`scoring`), normalizing and applying runner
//! feedback (`feedback_extract`, `feedback_apply`), and driving the whole
//! `SELECT → ... → DONE` state machine (`orchestrator`). It is
//! backend-agnostic: persistence, execution, and matching are injected as
//! `flywheel-core` trait objects, so this crate has no I/O of its own
//! beyond what `orchestrator` needs to talk to the matcher and read traces.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod decision;
pub mod feedback_apply;
pub mod feedback_extract;
pub mod orchestrator;
pub mod scoring;
pub mod validator;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use decision::rank_issues;
pub use decision::rank_issues_opt;
pub use decision::DecisionError;
pub use decision::Recommendation;

pub use feedback_apply::apply_feedback;
pub use feedback_apply::canonical_section;
pub use feedback_apply::ApplySummary;
pub use feedback_apply::MintedIssue;
pub use feedback_apply::SkipReason;
pub use feedback_apply::SkippedEntry;
pub use feedback_apply::UpvoteRecord;

pub use feedback_extract::extract_feedback;

pub use scoring::compare_to_baseline;
pub use scoring::evaluate_gate;
pub use scoring::next_baseline;
pub use scoring::score_suite;
pub use scoring::GateResult;
pub use scoring::ScoreSummary;
pub use scoring::ShsOutcome;
pub use scoring::TestDelta;

pub use validator::error_result;
pub use validator::validate_test;

pub use orchestrator::run_crank;
pub use orchestrator::run_fix_only;
pub use orchestrator::run_single_test;
pub use orchestrator::Collaborators;
pub use orchestrator::CrankError;
pub use orchestrator::CrankMode;
pub use orchestrator::CrankOutcome;
pub use orchestrator::FixPhaseOutcome;
