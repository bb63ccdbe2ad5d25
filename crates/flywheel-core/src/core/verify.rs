// flywheel-core/src/core/verify.rs
// ============================================================================
// Module: Verify Blocks
// Description: The recursive verify predicate algebra evaluated by the
//              validator against a trace's snapshot and, on fallback, a
//              runner's live browser context.
// Purpose: Define `VerifyPrimitive`, `VerifyBlock`, `Snapshot`, and the
//          snapshot-first/live-fallback evaluation strategy.
// Dependencies: flywheel-logic, regex, serde
// ============================================================================

//! ## Overview
//! A milestone's verify block is a [`flywheel_logic::Requirement`] whose
//! leaves are [`VerifyPrimitive`] values. Evaluation is tri-state: a
//! primitive yields `True`/`False` when it can be decided from the
//! snapshot, or `Unknown` when the snapshot doesn't carry the state the
//! primitive needs and no live browser context is available to fall back
//! to. The validator (§4.3) maps `Unknown` to `unverifiable`, which is
//! scored as not-achieved but recorded distinctly from an outright `false`.
//!
//! Evaluation always goes through one [`VerifyPrimitive`] reader,
//! [`VerifyContext`], which bundles an optional snapshot and an optional
//! live context so a single `impl` can try the snapshot first and only
//! reach for the live context when the snapshot is silent on the
//! requested state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use flywheel_logic::Requirement;
use flywheel_logic::Row;
use flywheel_logic::TriState;
use flywheel_logic::TriStateConditionEval;
use regex::Regex;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Verify Primitives
// ============================================================================

/// Leaf predicates a verify block can assert against a test run.
///
/// String comparisons for [`VerifyPrimitive::UrlContains`] and
/// [`VerifyPrimitive::DomText`] are case-sensitive substring checks.
/// [`VerifyPrimitive::UrlMatches`] is a regular-expression full-string
/// match (`^pattern$` semantics via [`regex::Regex::is_match`] over the
/// whole URL, anchored by the caller).
#[derive(Debug, Clone, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyPrimitive {
    /// The final URL contains this substring.
    UrlContains(String),
    /// The final URL matches this regular expression, full-string.
    UrlMatches(String),
    /// A captured JavaScript expression evaluated to a truthy value.
    EvalTruthy(String),
    /// A DOM node matching this selector exists.
    DomExists(String),
    /// A DOM node matching this selector (first arg) contains this text (second arg).
    DomText(String, String),
}

/// A recursive boolean expression over [`VerifyPrimitive`] leaves.
pub type VerifyBlock = Requirement<VerifyPrimitive>;

// ============================================================================
// SECTION: Verification Snapshot
// ============================================================================

/// Opaque blob captured at the end of a test run for offline validation.
///
/// The snapshot records everything a milestone's verify block might need
/// without requiring a live browser: the final URL, any captured eval
/// results keyed by expression, and a flattened view of queried DOM state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// The document URL at the moment the snapshot was captured.
    pub url: Option<String>,
    /// Results of `eval_truthy` expressions the runner captured proactively.
    pub eval_results: BTreeMap<String, bool>,
    /// Selectors confirmed present in the DOM at capture time.
    pub dom_present: BTreeMap<String, bool>,
    /// Text content captured for selectors the runner inspected.
    pub dom_text: BTreeMap<String, String>,
}

// ============================================================================
// SECTION: Live Browser Context
// ============================================================================

/// Read-only access to a still-open runner's browser context.
///
/// The validator may read from a runner's live browser only for fallback
/// verification of milestones the snapshot left undecided; it must never
/// mutate the page. Implementations live in `flywheel-providers`.
pub trait LiveBrowserContext {
    /// Returns the current document URL, if reachable.
    fn current_url(&self) -> Option<String>;
    /// Evaluates a JavaScript expression and returns its truthiness.
    fn eval_truthy(&self, expression: &str) -> Option<bool>;
    /// Reports whether a selector currently matches a DOM node.
    fn dom_exists(&self, selector: &str) -> Option<bool>;
    /// Returns the text content of the first node matching a selector.
    fn dom_text(&self, selector: &str) -> Option<String>;
}

// ============================================================================
// SECTION: Verify Context (Unified Reader)
// ============================================================================

/// The single reader type verify blocks evaluate against.
///
/// Bundles an optional snapshot and an optional live browser context so one
/// `TriStateConditionEval` impl can try the snapshot first and fall back to
/// the live context only when the snapshot doesn't decide the primitive.
pub struct VerifyContext<'a> {
    snapshot: Option<&'a Snapshot>,
    live: Option<&'a dyn LiveBrowserContext>,
}

impl<'a> VerifyContext<'a> {
    /// Builds a context from a possibly-absent snapshot and live context.
    #[must_use]
    pub const fn new(snapshot: Option<&'a Snapshot>, live: Option<&'a dyn LiveBrowserContext>) -> Self {
        Self { snapshot, live }
    }

    /// Builds a snapshot-only context (no live fallback available).
    #[must_use]
    pub const fn snapshot_only(snapshot: &'a Snapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            live: None,
        }
    }
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

impl TriStateConditionEval for VerifyPrimitive {
    type Reader<'a> = VerifyContext<'a>;

    fn eval_row_tristate(&self, reader: &Self::Reader<'_>, _row: Row) -> TriState {
        match self {
            Self::UrlContains(needle) => eval_url(reader, |url| url.contains(needle.as_str())),
            Self::UrlMatches(pattern) => eval_url(reader, |url| full_string_match(pattern, url)),
            Self::EvalTruthy(expression) => eval_eval_truthy(reader, expression),
            Self::DomExists(selector) => eval_dom_exists(reader, selector),
            Self::DomText(selector, needle) => eval_dom_text(reader, selector, needle),
        }
    }
}

/// Anchors `pattern` to the whole string and reports whether it matches.
/// An invalid pattern fails closed rather than propagating an error.
fn full_string_match(pattern: &str, haystack: &str) -> bool {
    let anchored = format!("^(?:{pattern})$");
    Regex::new(&anchored).is_ok_and(|re| re.is_match(haystack))
}

/// Resolves the document URL from the snapshot, falling back to the live
/// context, then applies `predicate`. `Unknown` when neither source has a URL.
fn eval_url(ctx: &VerifyContext<'_>, predicate: impl Fn(&str) -> bool) -> TriState {
    if let Some(snapshot) = ctx.snapshot {
        if let Some(url) = snapshot.url.as_deref() {
            return TriState::from(predicate(url));
        }
    }
    match ctx.live.and_then(LiveBrowserContext::current_url) {
        Some(url) => TriState::from(predicate(&url)),
        None => TriState::Unknown,
    }
}

fn eval_eval_truthy(ctx: &VerifyContext<'_>, expression: &str) -> TriState {
    if let Some(snapshot) = ctx.snapshot {
        if let Some(result) = snapshot.eval_results.get(expression) {
            return TriState::from(*result);
        }
    }
    match ctx.live.and_then(|live| live.eval_truthy(expression)) {
        Some(result) => TriState::from(result),
        None => TriState::Unknown,
    }
}

fn eval_dom_exists(ctx: &VerifyContext<'_>, selector: &str) -> TriState {
    if let Some(snapshot) = ctx.snapshot {
        if let Some(present) = snapshot.dom_present.get(selector) {
            return TriState::from(*present);
        }
    }
    match ctx.live.and_then(|live| live.dom_exists(selector)) {
        Some(present) => TriState::from(present),
        None => TriState::Unknown,
    }
}

fn eval_dom_text(ctx: &VerifyContext<'_>, selector: &str, needle: &str) -> TriState {
    if let Some(snapshot) = ctx.snapshot {
        if let Some(text) = snapshot.dom_text.get(selector) {
            return TriState::from(text.contains(needle));
        }
    }
    match ctx.live.and_then(|live| live.dom_text(selector)) {
        Some(text) => TriState::from(text.contains(needle)),
        None => TriState::Unknown,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
