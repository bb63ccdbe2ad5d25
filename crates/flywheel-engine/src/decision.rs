// flywheel-engine/src/decision.rs
// ============================================================================
// Module: Decision Engine (C3)
// Description: Ranks open issues using votes, attempt history, and
//              failure-pattern persistence.
// Purpose: Produce the candidate list SELECT chooses from (§4.1).
// Dependencies: flywheel-core, flywheel-config
// ============================================================================

//! ## Overview
//! [`rank_issues`] computes one priority per open issue from its vote
//! count, then applies the recent-failure penalty, the persistence boost,
//! and the design-review lockout in that order, matching §4.1's written
//! sequence. Ordering is made deterministic by a three-level sort key:
//! priority, then votes, then issue id.

// ============================================================================
// SECTION: Imports
// ============================================================================

use flywheel_config::FlywheelConfig;
use flywheel_core::Backlog;
use flywheel_core::FixOutcome;
use flywheel_core::Issue;
use flywheel_core::IssueId;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failure modes for [`rank_issues`].
#[derive(Debug, Error)]
pub enum DecisionError {
    /// No backlog was available to rank (C1 absent).
    #[error("backlog is missing")]
    BacklogMissing,
}

// ============================================================================
// SECTION: Recommendation
// ============================================================================

/// One ranked candidate returned by the decision engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    /// The recommended issue's id.
    pub issue_id: IssueId,
    /// Final priority after all modifiers.
    pub priority: f64,
    /// Whether this issue has been locked out for design review.
    pub needs_design_review: bool,
}

// ============================================================================
// SECTION: Ranking
// ============================================================================

/// Ranks every open issue in `backlog` for the crank numbered
/// `current_crank`, applying the modifiers in §4.1.
///
/// # Errors
/// Returns [`DecisionError::BacklogMissing`] only when called with a
/// `None` backlog reference via [`rank_issues_opt`]; this function itself
/// always succeeds given a `Backlog`.
#[must_use]
pub fn rank_issues(backlog: &Backlog, current_crank: u64, config: &FlywheelConfig) -> Vec<Recommendation> {
    let mut locked_out = Vec::new();
    let mut candidates: Vec<Recommendation> = backlog
        .open_issues()
        .filter_map(|issue| {
            let recommendation = score_issue(issue, current_crank, config);
            if recommendation.needs_design_review {
                locked_out.push(recommendation.issue_id.clone());
                None
            } else {
                Some(recommendation)
            }
        })
        .collect();

    candidates.sort_by(|left, right| {
        right
            .priority
            .partial_cmp(&left.priority)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                let left_votes = backlog.find(&left.issue_id).map_or(0, |issue| issue.votes);
                let right_votes = backlog.find(&right.issue_id).map_or(0, |issue| issue.votes);
                right_votes.cmp(&left_votes)
            })
            .then_with(|| left.issue_id.as_str().cmp(right.issue_id.as_str()))
    });

    candidates
}

/// Same as [`rank_issues`], failing closed when the backlog itself is
/// absent rather than merely empty.
///
/// # Errors
/// Returns [`DecisionError::BacklogMissing`] when `backlog` is `None`.
pub fn rank_issues_opt(
    backlog: Option<&Backlog>,
    current_crank: u64,
    config: &FlywheelConfig,
) -> Result<Vec<Recommendation>, DecisionError> {
    backlog.map(|backlog| rank_issues(backlog, current_crank, config)).ok_or(DecisionError::BacklogMissing)
}

/// Computes one issue's modified priority and design-review status.
fn score_issue(issue: &Issue, current_crank: u64, config: &FlywheelConfig) -> Recommendation {
    let consecutive_failures = issue.consecutive_failures_at_tail();
    if consecutive_failures >= u64::from(config.max_consecutive_failures) {
        return Recommendation { issue_id: issue.id.clone(), priority: 0.0, needs_design_review: true };
    }

    #[allow(clippy::cast_precision_loss, reason = "vote counts are small enough to round-trip through f64")]
    let mut priority = issue.votes as f64;

    if issue.recent_failure_within(current_crank, u64::from(config.recent_window)) {
        priority *= config.recent_penalty;
    }

    if persisted_failure_pattern(issue, current_crank, config) {
        priority *= config.persist_boost;
    }

    Recommendation { issue_id: issue.id.clone(), priority, needs_design_review: false }
}

/// Whether any of this issue's failure-pattern tags were observed in at
/// least `persist_window` of the most recent cranks, read off the tags
/// recorded on this issue's own fix attempts (the only place §4.1 grants
/// the decision engine a per-crank failure-pattern signal without
/// re-reading the full history log).
fn persisted_failure_pattern(issue: &Issue, current_crank: u64, config: &FlywheelConfig) -> bool {
    if issue.failure_pattern_tags.is_empty() {
        return false;
    }
    let window = u64::from(config.persist_window);
    let occurrences = issue
        .fix_attempts
        .iter()
        .filter(|attempt| {
            matches!(attempt.outcome, FixOutcome::Failed | FixOutcome::Reverted)
                && current_crank.saturating_sub(attempt.crank_number) < window
        })
        .count();
    u64::try_from(occurrences).unwrap_or(u64::MAX) >= window
}

// ============================================================================
// SECTION: Tests
// ============================================================================
