// flywheel-core/src/interfaces/mod.rs
// ============================================================================
// Module: Flywheel Interfaces
// Description: Backend-agnostic interfaces for persistence, test execution,
//              and semantic matching.
// Purpose: Define the contract surfaces the orchestrator drives against.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the crank orchestrator integrates with external
//! systems without embedding backend-specific details: where the backlog
//! and history log live, how a test is actually run, and how the external
//! semantic matcher is invoked. Implementations must be deterministic
//! where the specification requires it and fail closed on missing or
//! invalid data.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::Backlog;
use crate::core::HistoryRecord;
use crate::core::Issue;
use crate::core::TestDefinition;

// ============================================================================
// SECTION: Backlog Store
// ============================================================================

/// Errors raised by a [`BacklogStore`] implementation.
#[derive(Debug, Error)]
pub enum BacklogStoreError {
    /// The backlog could not be read or written.
    #[error("backlog io error: {0}")]
    Io(String),
    /// The backlog failed its schema check (§7 `BacklogCorrupt`, fatal).
    #[error("backlog is corrupt: {0}")]
    Corrupt(String),
}

/// Persists the single-writer backlog document (C1).
///
/// Implementations must make `save` atomic: write the full document to a
/// temp file, then rename over the stable path, so a concurrent reader
/// never observes a partial write (§5).
pub trait BacklogStore {
    /// Loads the current backlog.
    ///
    /// # Errors
    /// Returns [`BacklogStoreError::Corrupt`] when the document fails its
    /// schema check, or [`BacklogStoreError::Io`] on a read failure.
    fn load(&self) -> Result<Backlog, BacklogStoreError>;

    /// Atomically replaces the backlog document.
    ///
    /// # Errors
    /// Returns [`BacklogStoreError::Io`] when the write or rename fails.
    fn save(&self, backlog: &Backlog) -> Result<(), BacklogStoreError>;
}

// ============================================================================
// SECTION: History Log
// ============================================================================

/// Errors raised by a [`HistoryLog`] implementation.
#[derive(Debug, Error)]
pub enum HistoryLogError {
    /// The append-only write failed (§7 `HistoryWriteFailed`, fatal
    /// post-measurement).
    #[error("history log write failed: {0}")]
    WriteFailed(String),
    /// The log could not be read back.
    #[error("history log io error: {0}")]
    Io(String),
}

/// Append-only timeline of fix outcomes and crank summaries (C2).
pub trait HistoryLog {
    /// Appends one record. Never rewrites or reorders existing records.
    ///
    /// # Errors
    /// Returns [`HistoryLogError::WriteFailed`] when the append fails.
    fn append(&self, record: &HistoryRecord) -> Result<(), HistoryLogError>;

    /// Reads all records in append order, oldest first.
    ///
    /// # Errors
    /// Returns [`HistoryLogError::Io`] when the log cannot be read.
    fn read_all(&self) -> Result<Vec<HistoryRecord>, HistoryLogError>;
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Errors raised by a [`Runner`] implementation.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The runner could not be spawned.
    #[error("failed to spawn runner: {0}")]
    Spawn(String),
    /// The runner did not signal completion within its allotted time.
    #[error("runner timed out")]
    Timeout,
    /// An I/O error occurred while supervising the runner.
    #[error("runner io error: {0}")]
    Io(String),
}

/// Executes one test definition in a fresh run directory (C4).
///
/// A runner is a restricted agent: it reads the test definition and skill
/// documentation, invokes the skill in headless mode, captures a
/// verification snapshot (possibly null), and writes exactly one trace
/// file. It must not modify source code, perform version-control writes,
/// install packages, or create files outside `run_dir` (§4.2).
pub trait Runner {
    /// Runs `test`, writing its trace into `run_dir`.
    ///
    /// # Errors
    /// Returns [`RunnerError`] when the runner cannot be spawned, times
    /// out, or hits an I/O failure while supervising it. A successful
    /// return does not guarantee a well-formed trace was written — the
    /// caller re-checks the trace's shape independently (§4.2).
    fn run(&self, test: &TestDefinition, run_dir: &Path) -> Result<(), RunnerError>;
}

// ============================================================================
// SECTION: Fixer
// ============================================================================

/// Errors raised by a [`Fixer`] implementation.
#[derive(Debug, Error)]
pub enum FixerError {
    /// The fixer could not be spawned.
    #[error("failed to spawn fixer: {0}")]
    Spawn(String),
    /// An I/O error occurred while supervising the fixer.
    #[error("fixer io error: {0}")]
    Io(String),
}

/// The outcome a [`Fixer`] reports for one attempt against an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixReport {
    /// Whether the fixer's own test run came back green.
    pub succeeded: bool,
    /// Source files the fixer touched.
    pub changed_files: Vec<String>,
    /// Free-text details about the attempt, if any.
    pub details: Option<String>,
}

/// Applies a code fix for the chosen issue (§4.1, §4.7 FIX).
///
/// A fixer is an external collaborator, invoked with exactly one issue at a
/// time; the orchestrator reads only its [`FixReport`], never free-text
/// process output (§5 context-window protection).
pub trait Fixer {
    /// Attempts a fix for `issue`.
    ///
    /// # Errors
    /// Returns [`FixerError`] when the fixer cannot be spawned or hits an
    /// I/O failure while being supervised. A successful return does not by
    /// itself mean the fix succeeded — check [`FixReport::succeeded`].
    fn apply(&self, issue: &Issue) -> Result<FixReport, FixerError>;
}

// ============================================================================
// SECTION: Matcher
// ============================================================================

/// Errors raised by a [`Matcher`] implementation.
#[derive(Debug, Error)]
pub enum MatcherError {
    /// The external matcher process could not be spawned.
    #[error("failed to spawn matcher: {0}")]
    Spawn(String),
    /// An I/O error occurred while invoking the matcher.
    #[error("matcher io error: {0}")]
    Io(String),
}

/// Invokes the external semantic matcher (§4.7 MATCH_WAIT).
///
/// The orchestrator communicates with the matcher exclusively through
/// on-disk artifacts and never reads its free-text output (§5
/// context-window protection). Polling for the resulting
/// match-decisions file is the orchestrator's responsibility, not this
/// trait's.
pub trait Matcher {
    /// Spawns the matcher against the extracted-feedback and open-issues
    /// documents, directing its output to `output_path`.
    ///
    /// # Errors
    /// Returns [`MatcherError`] when the matcher cannot be spawned.
    fn spawn(
        &self,
        extracted_feedback_path: &Path,
        open_issues_path: &Path,
        output_path: &Path,
    ) -> Result<(), MatcherError>;
}
