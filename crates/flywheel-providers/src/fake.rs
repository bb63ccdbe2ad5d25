// flywheel-providers/src/fake.rs
// ============================================================================
// Module: Fake Browser Context
// Description: In-memory `LiveBrowserContext` double for tests.
// Purpose: Exercise the verify evaluator's live-fallback path without a
//          real browser (§4.3).
// Dependencies: flywheel-core
// ============================================================================

//! ## Overview
//! [`FakeBrowserContext`] lets tests script exactly what a "still-open run"
//! would answer, including the absence of an answer (`None`), which the
//! evaluator must treat as `unverifiable` rather than `false` (§3 milestone
//! outcomes distinguish `failed` from `unverifiable`).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use flywheel_core::LiveBrowserContext;

// ============================================================================
// SECTION: Fake
// ============================================================================

/// A scripted [`LiveBrowserContext`] for deterministic tests.
#[derive(Debug, Clone, Default)]
pub struct FakeBrowserContext {
    /// The page URL to report, if any.
    pub url: Option<String>,
    /// Scripted `eval_truthy` results keyed by expression.
    pub eval_results: BTreeMap<String, bool>,
    /// Scripted `dom_exists` results keyed by selector.
    pub dom_present: BTreeMap<String, bool>,
    /// Scripted `dom_text` results keyed by selector.
    pub dom_text: BTreeMap<String, String>,
}

impl FakeBrowserContext {
    /// Returns an empty context where every query is unanswered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LiveBrowserContext for FakeBrowserContext {
    fn current_url(&self) -> Option<String> {
        self.url.clone()
    }

    fn eval_truthy(&self, expression: &str) -> Option<bool> {
        self.eval_results.get(expression).copied()
    }

    fn dom_exists(&self, selector: &str) -> Option<bool> {
        self.dom_present.get(selector).copied()
    }

    fn dom_text(&self, selector: &str) -> Option<String> {
        self.dom_text.get(selector).cloned()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
