// flywheel-broker/src/lib.rs
// ============================================================================
// Module: Flywheel Broker Library
// Description: Runner pool fan-out, subprocess supervision, and trace
//              materialization for the MEASURE phase (C4).
// Purpose: Provide the concrete `Runner` backends and the bounded-
//          concurrency pool the crank orchestrator's MEASURE phase relies
//          on (§4.2, §5).
// Dependencies: flywheel-core, tokio
// ============================================================================

//! ## Overview
//! Flywheel broker supplies every external-process collaborator the crank
//! orchestrator drives (§4, §5): a bounded-concurrency fan-out over a test
//! suite (`pool`), a production `Runner` backend that supervises a child
//! process per test (`subprocess`), an adapter that lets the
//! orchestrator's own sequential MEASURE loop read back results that were
//! actually produced concurrently (`materialized`), a `Fixer` backend that
//! reads back a structured fix report (`subprocess_fixer`), and a
//! `Matcher` backend that spawns the external semantic matcher and
//! detaches, leaving the orchestrator to poll for its output
//! (`subprocess_matcher`).

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod materialized;
pub mod pool;
pub mod subprocess;
pub mod subprocess_fixer;
pub mod subprocess_matcher;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use materialized::MaterializedRunner;
pub use pool::RunOutcome;
pub use pool::RunnerPool;
pub use pool::RunnerPoolError;
pub use subprocess::SubprocessRunner;
pub use subprocess_fixer::SubprocessFixer;
pub use subprocess_matcher::SubprocessMatcher;
