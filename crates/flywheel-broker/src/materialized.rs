// flywheel-broker/src/materialized.rs
// ============================================================================
// Module: Materialized Runner
// Description: A `Runner` backend over traces already written by a prior
//              `RunnerPool::run_suite` call.
// Purpose: Let the orchestrator's sequential per-test MEASURE loop consume
//          traces that were actually produced concurrently (§5).
// Dependencies: flywheel-core
// ============================================================================

//! ## Overview
//! The crank orchestrator drives MEASURE one test at a time through a
//! single [`Runner`], retrying a test once on a missing trace (§4.2). The
//! runner pool, by contrast, fans every test out concurrently and returns
//! once the whole batch is done. [`MaterializedRunner`] bridges the two: a
//! caller runs the suite once through [`crate::pool::RunnerPool`], then
//! wires this type into the orchestrator's `Collaborators` so its
//! already-sequential retry loop observes traces that already exist on
//! disk instead of re-running anything.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;

use flywheel_core::Runner;
use flywheel_core::RunnerError;
use flywheel_core::TestDefinition;
use flywheel_core::TestId;

// ============================================================================
// SECTION: Materialized Runner
// ============================================================================

/// Replays the outcome of a prior concurrent [`crate::pool::RunnerPool`]
/// run (§5) as a single-test [`Runner`].
///
/// A missing entry for a requested test id is treated as success: the
/// orchestrator's own trace read then fails closed if nothing was written,
/// exactly as it would for a single [`Runner`] that silently produced
/// nothing.
pub struct MaterializedRunner {
    outcomes: BTreeMap<TestId, Result<(), RunnerError>>,
}

impl MaterializedRunner {
    /// Builds a materialized runner from a prior pool run's outcomes.
    #[must_use]
    pub fn new(outcomes: impl IntoIterator<Item = (TestId, Result<(), RunnerError>)>) -> Self {
        Self { outcomes: outcomes.into_iter().collect() }
    }
}

impl Runner for MaterializedRunner {
    fn run(&self, test: &TestDefinition, _run_dir: &Path) -> Result<(), RunnerError> {
        match self.outcomes.get(&test.id) {
            Some(Ok(())) | None => Ok(()),
            Some(Err(RunnerError::Spawn(detail))) => Err(RunnerError::Spawn(detail.clone())),
            Some(Err(RunnerError::Timeout)) => Err(RunnerError::Timeout),
            Some(Err(RunnerError::Io(detail))) => Err(RunnerError::Io(detail.clone())),
        }
    }
}
