// flywheel-store/src/lib.rs
// ============================================================================
// Module: Flywheel Store
// Description: File-backed persistence for the backlog, history log, and
//              baseline archive.
// Purpose: Provide the durable collaborators the orchestrator (C9) drives
//          against: a `BacklogStore`, a `HistoryLog`, and a baseline
//          archive for the regression gate (§5, §6).
// Dependencies: flywheel-core, fs2, tempfile
// ============================================================================

//! ## Overview
//! Every document this crate manages is written with write-temp-then-rename
//! (see [`atomic::write_atomic`]) so a concurrent reader never observes a
//! partial write. The backlog and history log share one advisory lock
//! (§5); the baseline archive is owned by a single writer, the orchestrator,
//! and does not need cross-document locking of its own.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod atomic;
pub mod backlog;
pub mod baseline;
pub mod history;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use atomic::FileLock;
pub use atomic::append;
pub use atomic::write_atomic;
pub use backlog::FileBacklogStore;
pub use baseline::BaselineStoreError;
pub use baseline::FileBaselineStore;
pub use baseline::TrendRow;
pub use history::FileHistoryLog;
