// flywheel-core/src/core/feedback.rs
// ============================================================================
// Module: Feedback Entries
// Description: Raw and normalized runner feedback, and the external
//              matcher's output contract.
// Purpose: Define the types C7 (extractor) and C8 (applier) exchange (§3,
//          §4.5, §4.6).
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Runners emit free-form [`FeedbackEntryRaw`] entries inside a trace. The
//! extractor (§4.5) normalizes, deduplicates, and ranks them into
//! [`FeedbackEntryNormalized`] entries; an external semantic matcher then
//! returns one [`MatchDecision`] per normalized entry, which the applier
//! (§4.6) is the sole consumer of.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use super::identifiers::FeedbackId;
use super::identifiers::IssueId;
use super::identifiers::TestId;

// ============================================================================
// SECTION: Feedback Type & Area
// ============================================================================

/// Closed set of feedback categories (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackType {
    /// A suggested enhancement to the toolkit.
    Improvement,
    /// A defect the runner observed.
    Bug,
    /// A workaround the runner had to apply.
    Workaround,
    /// A neutral observation, not actionable on its own.
    Observation,
}

/// Closed set of feedback areas (§4.5). Anything outside this set is
/// rewritten to [`FeedbackArea::Other`] during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeedbackArea {
    /// Clicking, hovering, dragging, and other interaction primitives.
    Actions,
    /// Snapshot capture behavior.
    Snapshot,
    /// Page/route navigation.
    Navigation,
    /// Iframe handling.
    Iframe,
    /// Form/field input handling.
    Input,
    /// Error surfacing and recovery.
    ErrorHandling,
    /// Shadow DOM traversal.
    ShadowDom,
    /// Timing, waits, and races.
    Timing,
    /// Anything not covered by the above.
    Other,
}

impl FeedbackArea {
    /// Infers an area from free text by keyword match (§4.5), used when an
    /// entry is missing its area. Falls back to [`Self::Other`].
    #[must_use]
    pub fn infer_from(title: &str, detail: &str) -> Self {
        let haystack = format!("{title} {detail}").to_lowercase();
        const RULES: &[(&[&str], FeedbackArea)] = &[
            (&["iframe"], FeedbackArea::Iframe),
            (&["click", "hover", "drag"], FeedbackArea::Actions),
            (&["shadow dom", "shadow-dom", "shadowroot"], FeedbackArea::ShadowDom),
            (&["snapshot"], FeedbackArea::Snapshot),
            (&["navigate", "navigation", "redirect"], FeedbackArea::Navigation),
            (&["input", "type", "fill", "field"], FeedbackArea::Input),
            (&["timeout", "race", "wait", "timing"], FeedbackArea::Timing),
            (&["error", "exception", "crash"], FeedbackArea::ErrorHandling),
        ];
        RULES
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|kw| haystack.contains(kw)))
            .map_or(Self::Other, |(_, area)| *area)
    }
}

// ============================================================================
// SECTION: Feedback Entries
// ============================================================================

/// A feedback entry exactly as written by a runner into a trace (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntryRaw {
    /// The category of feedback.
    #[serde(rename = "type")]
    pub feedback_type: FeedbackType,
    /// The area this feedback concerns, if the runner supplied one.
    pub area: Option<FeedbackArea>,
    /// Short title; may be empty and derived from `detail`.
    pub title: String,
    /// Free-text description.
    pub detail: String,
    /// Files the runner suspects are relevant.
    pub files: Option<Vec<String>>,
    /// The test this entry originated from.
    pub test_id: TestId,
}

/// A deduplicated, ranked feedback entry (§4.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntryNormalized {
    /// Dedup-stable identifier, assigned in output rank order (`fb-NNN`).
    pub id: FeedbackId,
    /// The category of feedback.
    #[serde(rename = "type")]
    pub feedback_type: FeedbackType,
    /// The resolved area (never `None` after normalization).
    pub area: FeedbackArea,
    /// Title, possibly derived from `detail`.
    pub title: String,
    /// Free-text description from the first entry absorbed into this group.
    pub detail: String,
    /// Union of suspected files across absorbed entries.
    pub files: Vec<String>,
    /// Number of raw entries merged into this one.
    pub count: u64,
    /// Originating test ids, in first-seen order.
    pub tests: Vec<TestId>,
}

// ============================================================================
// SECTION: Match Decision
// ============================================================================

/// Confidence level an external matcher assigns to a match (§3, §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Strong semantic match.
    High,
    /// Plausible but uncertain match.
    Medium,
    /// Weak match; the applier must not upvote on this alone.
    Low,
}

/// One matcher verdict for a normalized feedback entry (§3, §4.6). The
/// applier is the sole consumer of this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDecision {
    /// The normalized feedback entry this decision is about.
    pub feedback_id: FeedbackId,
    /// The issue the matcher believes this feedback concerns, if any.
    pub matched_issue_id: Option<IssueId>,
    /// The matcher's confidence in `matched_issue_id`, if a match was made.
    pub confidence: Option<Confidence>,
    /// One-sentence free-text justification; never parsed by the applier.
    pub reasoning: String,
}

// ============================================================================
// SECTION: Tests
// ============================================================================
