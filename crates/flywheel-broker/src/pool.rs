// flywheel-broker/src/pool.rs
// ============================================================================
// Module: Runner Pool (C4)
// Description: Bounded-concurrency fan-out over a test suite, collecting one
//              trace per test and supporting a graceful, timed cancellation.
// Purpose: Implement §5's concurrency model for MEASURE.
// Dependencies: flywheel-core, tokio
// ============================================================================

//! ## Overview
//! [`RunnerPool`] runs every test definition in a suite against a shared
//! [`Runner`] backend, bounding in-flight runs to `max_concurrent` permits
//! and sorting results by test id before returning them — callers (the
//! crank orchestrator) never observe runner completion order (§5 ordering
//! guarantees). Each test's run is dispatched to a blocking task since
//! [`Runner::run`] is a synchronous, possibly slow, call.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use flywheel_core::Runner;
use flywheel_core::RunnerError;
use flywheel_core::TestDefinition;
use flywheel_core::TestId;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by the runner pool itself, distinct from a single test's
/// [`RunnerError`] (carried per-job in [`RunOutcome`]).
#[derive(Debug, Error)]
pub enum RunnerPoolError {
    /// A dispatched job panicked or was aborted before reporting a result.
    #[error("runner task failed: {0}")]
    Join(String),
    /// The pool's semaphore was closed before every job could be dispatched.
    #[error("runner pool closed before dispatch completed")]
    PoolClosed,
}

// ============================================================================
// SECTION: Run Outcome
// ============================================================================

/// One test's outcome from a pool run: either the backend's own result, a
/// pool-level timeout on shutdown, or a cancellation before dispatch.
#[derive(Debug)]
pub struct RunOutcome {
    /// The test this outcome belongs to.
    pub test_id: TestId,
    /// The backend's result, or a pool-synthesized failure.
    pub result: Result<(), RunnerError>,
}

impl RunOutcome {
    fn cancelled(test_id: TestId) -> Self {
        Self { test_id, result: Err(RunnerError::Io("cancelled before dispatch".to_string())) }
    }
}

// ============================================================================
// SECTION: Runner Pool
// ============================================================================

/// Bounded-concurrency fan-out over a test suite (§5).
pub struct RunnerPool {
    max_concurrent: usize,
    shutdown_grace: Duration,
}

impl RunnerPool {
    /// Creates a pool bounding concurrency to `max_concurrent` runners, with
    /// `shutdown_grace` given to in-flight jobs after cancellation before
    /// they are abandoned.
    #[must_use]
    pub fn new(max_concurrent: usize, shutdown_grace: Duration) -> Self {
        Self { max_concurrent: max_concurrent.max(1), shutdown_grace }
    }

    /// Runs every test in `tests` against `backend`, writing each test's
    /// trace under `run_dir/<test_id>/`. Honors `cancel`: tests not yet
    /// dispatched when it flips are recorded as cancelled, and in-flight
    /// jobs get `shutdown_grace` to finish before being abandoned.
    ///
    /// Results are returned sorted by test id, independent of completion
    /// order (§5 ordering guarantees).
    ///
    /// # Errors
    /// Returns [`RunnerPoolError`] when a dispatched job panics or when the
    /// semaphore closes unexpectedly. A backend's own per-test failure is
    /// never an error here — it is carried in that test's [`RunOutcome`].
    pub async fn run_suite(
        &self,
        tests: &[TestDefinition],
        run_dir: &Path,
        backend: Arc<dyn Runner + Send + Sync>,
        cancel: Arc<AtomicBool>,
    ) -> Result<Vec<RunOutcome>, RunnerPoolError> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut join_set: JoinSet<(TestId, Result<(), RunnerError>)> = JoinSet::new();
        let mut outcomes = Vec::with_capacity(tests.len());
        let mut pending: BTreeSet<TestId> = BTreeSet::new();

        for test in tests {
            if cancel.load(Ordering::SeqCst) {
                outcomes.push(RunOutcome::cancelled(test.id.clone()));
                continue;
            }
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|_err| RunnerPoolError::PoolClosed)?;
            let backend = Arc::clone(&backend);
            let test_def = test.clone();
            let test_dir = run_dir.join(test.id.as_str());
            pending.insert(test.id.clone());
            join_set.spawn_blocking(move || {
                let _permit = permit;
                let result = backend.run(&test_def, &test_dir);
                (test_def.id, result)
            });
        }

        while !pending.is_empty() {
            let joined = if cancel.load(Ordering::SeqCst) {
                match tokio::time::timeout(self.shutdown_grace, join_set.join_next()).await {
                    Ok(joined) => joined,
                    Err(_elapsed) => {
                        warn!(remaining = pending.len(), "runner pool shutdown grace elapsed, abandoning remaining runs");
                        join_set.abort_all();
                        for test_id in pending {
                            outcomes.push(RunOutcome { test_id, result: Err(RunnerError::Timeout) });
                        }
                        break;
                    }
                }
            } else {
                join_set.join_next().await
            };
            let Some(joined) = joined else { break };
            let (test_id, result) = joined.map_err(|err| RunnerPoolError::Join(err.to_string()))?;
            pending.remove(&test_id);
            outcomes.push(RunOutcome { test_id, result });
        }

        outcomes.sort_by(|a, b| a.test_id.as_str().cmp(b.test_id.as_str()));
        Ok(outcomes)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
