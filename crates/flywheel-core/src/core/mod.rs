// flywheel-core/src/core/mod.rs
// ============================================================================
// Module: Flywheel Core Types
// Description: Canonical flywheel data model shared by every other crate.
// Purpose: Provide stable, serializable types for the backlog, traces, and
//          scoring artifacts.
// Dependencies: flywheel-logic, serde
// ============================================================================

//! ## Overview
//! Flywheel core types define the backlog/issue schema, test definitions
//! and traces, verify blocks, scoring artifacts, baselines, and runner
//! feedback. These types are the canonical source of truth every other
//! crate in the workspace builds on.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod baseline;
pub mod feedback;
pub mod hashing;
pub mod identifiers;
pub mod issue;
pub mod summary;
pub mod time;
pub mod trace;
pub mod verify;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use baseline::Baseline;
pub use feedback::Confidence;
pub use feedback::FeedbackArea;
pub use feedback::FeedbackEntryNormalized;
pub use feedback::FeedbackEntryRaw;
pub use feedback::FeedbackType;
pub use feedback::MatchDecision;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::HashError;
pub use identifiers::FeedbackId;
pub use identifiers::IssueId;
pub use identifiers::MilestoneId;
pub use identifiers::TestId;
pub use issue::Backlog;
pub use issue::FixAttempt;
pub use issue::FixOutcome;
pub use issue::Issue;
pub use issue::IssueStatus;
pub use summary::CrankSummary;
pub use summary::FixOutcomeRecord;
pub use summary::HistoryRecord;
pub use time::Timestamp;
pub use trace::Budget;
pub use trace::Milestone;
pub use trace::MilestoneOutcome;
pub use trace::PerTestResult;
pub use trace::ResponseChecks;
pub use trace::TestCategory;
pub use trace::TestDefinition;
pub use trace::TestStatus;
pub use trace::Trace;
pub use trace::TraceError;
pub use verify::LiveBrowserContext;
pub use verify::Snapshot;
pub use verify::VerifyBlock;
pub use verify::VerifyContext;
pub use verify::VerifyPrimitive;
