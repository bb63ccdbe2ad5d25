// flywheel-cli/src/lib.rs
// ============================================================================
// Module: Flywheel CLI Library
// Description: Shared helpers for the flywheel command-line interface: the
//              on-disk workspace layout and the test-suite loader.
// Purpose: Keep path conventions and suite parsing in one place so the
//          binary entry point and its tests agree on them.
// Dependencies: flywheel-core, serde_json
// ============================================================================

//! ## Overview
//! Flywheel treats its working directory as a message bus (§9): one
//! `flywheel/` subdirectory holds the backlog, history log, baseline
//! archive, test suite definition, and per-crank run directories. This
//! library module centralizes those path conventions ([`Workspace`]) and
//! the suite-loading helper the binary needs before it can call into
//! `flywheel-engine`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod workspace;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use workspace::SuiteError;
pub use workspace::Workspace;
pub use workspace::load_suite;
