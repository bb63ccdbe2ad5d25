// flywheel-engine/src/feedback_apply.rs
// ============================================================================
// Module: Feedback Applier (C8)
// Description: Turns matched feedback into upvotes and unmatched feedback
//              into new backlog issues.
// Purpose: Implement §4.6's per-entry rules and id-assignment scheme.
// Dependencies: flywheel-core, flywheel-config
// ============================================================================

//! ## Overview
//! [`apply_feedback`] walks each normalized feedback entry alongside its
//! [`MatchDecision`], mutates a [`Backlog`] in place per §4.6's five rules,
//! and returns an [`ApplySummary`] the orchestrator folds into the crank
//! record. The backlog mutation itself is in-memory; persisting it through
//! [`flywheel_store::FileBacklogStore::save`] is the orchestrator's job, so
//! the single atomic write §4.6 requires covers the whole backlog document.

// ============================================================================
// SECTION: Imports
// ============================================================================

use flywheel_config::FlywheelConfig;
use flywheel_core::Backlog;
use flywheel_core::Confidence;
use flywheel_core::FeedbackArea;
use flywheel_core::FeedbackEntryNormalized;
use flywheel_core::FeedbackId;
use flywheel_core::FeedbackType;
use flywheel_core::Issue;
use flywheel_core::IssueId;
use flywheel_core::IssueStatus;
use flywheel_core::MatchDecision;
use flywheel_core::Timestamp;

// ============================================================================
// SECTION: Canonical Area → Section Map
// ============================================================================

/// The section a newly minted issue is filed under, keyed by the feedback
/// area that produced it. §4.6 requires "each area maps to a canonical
/// section" but leaves the concrete mapping unspecified; this table is this
/// repository's resolution of that open question, chosen to mirror the
/// section names feedback areas most directly correspond to.
#[must_use]
pub fn canonical_section(area: FeedbackArea) -> &'static str {
    match area {
        FeedbackArea::Actions => "actions",
        FeedbackArea::Snapshot => "snapshot",
        FeedbackArea::Navigation => "navigation",
        FeedbackArea::Iframe => "iframe",
        FeedbackArea::Input => "input",
        FeedbackArea::ErrorHandling => "error-handling",
        FeedbackArea::ShadowDom => "shadow-dom",
        FeedbackArea::Timing => "timing",
        FeedbackArea::Other => "other",
    }
}

// ============================================================================
// SECTION: Apply Summary
// ============================================================================

/// One upvote applied to an existing issue (§4.6 rule 1).
#[derive(Debug, Clone, PartialEq)]
pub struct UpvoteRecord {
    /// The issue that was upvoted.
    pub issue_id: IssueId,
    /// The vote delta applied.
    pub delta: u64,
    /// The feedback entry that produced this upvote.
    pub feedback_id: FeedbackId,
    /// The matcher's confidence in the match.
    pub confidence: Confidence,
}

/// A new issue minted from unmatched feedback (§4.6 rules 3-4).
#[derive(Debug, Clone, PartialEq)]
pub struct MintedIssue {
    /// The newly assigned issue id.
    pub issue_id: IssueId,
    /// The feedback entry that produced this issue.
    pub feedback_id: FeedbackId,
}

/// A feedback entry the applier deliberately left untouched (§4.6 rules 2, 5).
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEntry {
    /// The feedback entry that was skipped.
    pub feedback_id: FeedbackId,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Why a feedback entry produced no backlog mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The match confidence was too low to act on.
    LowConfidence,
    /// The entry was an improvement below `IMPROVEMENT_THRESHOLD`.
    InsufficientImprovementCount,
    /// The entry was a bare observation.
    Observation,
}

/// The applier's record of what it did with one crank's feedback (§4.6).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApplySummary {
    /// Every upvote applied.
    pub upvotes: Vec<UpvoteRecord>,
    /// Every issue minted.
    pub minted: Vec<MintedIssue>,
    /// Every entry skipped, and why.
    pub skipped: Vec<SkippedEntry>,
}

// ============================================================================
// SECTION: Application
// ============================================================================

/// Applies `entries` and their matcher `decisions` to `backlog` in place,
/// per §4.6's five rules, and returns a summary of what happened.
///
/// `decisions` is searched by feedback id; an entry with no corresponding
/// decision is treated as unmatched with no confidence, which is always
/// either minted (bug/workaround, or improvement past threshold) or
/// skipped, never upvoted.
pub fn apply_feedback(
    backlog: &mut Backlog,
    entries: &[FeedbackEntryNormalized],
    decisions: &[MatchDecision],
    config: &FlywheelConfig,
) -> ApplySummary {
    let mut summary = ApplySummary::default();

    for entry in entries {
        let decision = decisions.iter().find(|decision| decision.feedback_id == entry.id);
        match decision.and_then(|decision| decision.matched_issue_id.as_ref().map(|id| (id, decision.confidence))) {
            Some((issue_id, Some(Confidence::High | Confidence::Medium))) => {
                let confidence = decision.and_then(|d| d.confidence).unwrap_or(Confidence::Medium);
                if let Some(issue) = backlog.issues.iter_mut().find(|issue| &issue.id == issue_id) {
                    issue.votes += entry.count;
                }
                summary.upvotes.push(UpvoteRecord {
                    issue_id: issue_id.clone(),
                    delta: entry.count,
                    feedback_id: entry.id.clone(),
                    confidence,
                });
            }
            Some((_, Some(Confidence::Low))) => {
                summary.skipped.push(SkippedEntry { feedback_id: entry.id.clone(), reason: SkipReason::LowConfidence });
            }
            _ => apply_unmatched(backlog, entry, config, &mut summary),
        }
    }

    summary
}

fn apply_unmatched(backlog: &mut Backlog, entry: &FeedbackEntryNormalized, config: &FlywheelConfig, summary: &mut ApplySummary) {
    let should_mint = match entry.feedback_type {
        FeedbackType::Bug | FeedbackType::Workaround => true,
        FeedbackType::Improvement => entry.count >= u64::from(config.improvement_threshold),
        FeedbackType::Observation => false,
    };

    if !should_mint {
        let reason = if entry.feedback_type == FeedbackType::Observation {
            SkipReason::Observation
        } else {
            SkipReason::InsufficientImprovementCount
        };
        summary.skipped.push(SkippedEntry { feedback_id: entry.id.clone(), reason });
        return;
    }

    let section = canonical_section(entry.area);
    let issue_id = next_issue_id(backlog, section);
    let issue = Issue {
        id: issue_id.clone(),
        title: entry.title.clone(),
        section: section.to_string(),
        votes: entry.count,
        status: IssueStatus::Open,
        symptoms: vec![entry.detail.clone()],
        expected_behavior: String::new(),
        workaround: None,
        suspected_source_files: entry.files.clone(),
        failure_pattern_tags: Vec::new(),
        fix_attempts: Vec::new(),
        source: Some("runner-feedback".to_string()),
        source_tests: entry.tests.clone(),
    };
    backlog.issues.push(issue);
    summary.minted.push(MintedIssue { issue_id, feedback_id: entry.id.clone() });
}

/// Assigns the next id within `section` (§4.6): `<major>.<maxMinor+1>` if
/// the section already has issues, else `<max existing major> + 1` . 0.
fn next_issue_id(backlog: &Backlog, section: &str) -> IssueId {
    let all_issues = backlog.issues.iter().chain(backlog.implemented.iter());

    let section_majors: Vec<(u64, u64)> =
        all_issues.clone().filter(|issue| issue.section == section).filter_map(|issue| issue.id.major_minor()).collect();

    if let Some(major) = section_majors.first().map(|(major, _)| *major) {
        let max_minor = section_majors.iter().map(|(_, minor)| *minor).max().unwrap_or(0);
        return IssueId::new(format!("{major}.{}", max_minor + 1));
    }

    let max_major = all_issues.filter_map(|issue| issue.id.major_minor()).map(|(major, _)| major).max().unwrap_or(0);
    IssueId::new(format!("{}.0", max_major + 1))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
