// flywheel-providers/src/playwright_context.rs
// ============================================================================
// Module: Playwright Live Browser Context
// Description: `LiveBrowserContext` over a still-open Playwright page.
// Purpose: Back verify-block live fallback for milestones the snapshot
//          didn't capture (§4.3).
// Dependencies: flywheel-core, playwright, tokio
// ============================================================================

//! ## Overview
//! A runner keeps its page open until the test's budget is exhausted or the
//! verify pass completes (§4.2). [`PlaywrightContext`] wraps that page so
//! the verify evaluator can read it, without giving the evaluator any way
//! to mutate it — every method here is a read, matching §5's "the
//! validator may read a runner's live browser context only for fallback
//! verification and never mutates it."
//!
//! Playwright's API is async; [`flywheel_core::LiveBrowserContext`] is
//! sync, so each call blocks on a dedicated runtime handle rather than
//! forcing every caller through `async fn`, the same blocking-bridge shape
//! the teacher's HTTP provider uses over `reqwest::blocking`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use flywheel_core::LiveBrowserContext;
use playwright::api::Page;
use tokio::runtime::Handle;
use tokio::sync::Mutex;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failure modes constructing a [`PlaywrightContext`].
#[derive(Debug, thiserror::Error)]
pub enum PlaywrightContextError {
    /// No Tokio runtime handle was available in the current context.
    #[error("no tokio runtime handle available: {0}")]
    NoRuntime(String),
}

// ============================================================================
// SECTION: Context
// ============================================================================

/// A [`LiveBrowserContext`] backed by a single, still-open Playwright page.
///
/// Every accessor swallows driver errors into `None` rather than
/// propagating them, matching the verify evaluator's fail-closed contract
/// (§4.3: evaluation errors yield `false`, not an exception).
pub struct PlaywrightContext {
    page: Arc<Mutex<Page>>,
    runtime: Handle,
}

impl PlaywrightContext {
    /// Wraps `page`, blocking future calls on the runtime reachable from
    /// the caller's context.
    ///
    /// # Errors
    /// Returns [`PlaywrightContextError::NoRuntime`] when called outside a
    /// Tokio runtime.
    pub fn new(page: Arc<Mutex<Page>>) -> Result<Self, PlaywrightContextError> {
        let runtime = Handle::try_current().map_err(|err| PlaywrightContextError::NoRuntime(err.to_string()))?;
        Ok(Self { page, runtime })
    }
}

impl LiveBrowserContext for PlaywrightContext {
    fn current_url(&self) -> Option<String> {
        let page = Arc::clone(&self.page);
        self.runtime.block_on(async move {
            let page = page.lock().await;
            page.url().ok()
        })
    }

    fn eval_truthy(&self, expression: &str) -> Option<bool> {
        let page = Arc::clone(&self.page);
        let expression = expression.to_owned();
        self.runtime.block_on(async move {
            let page = page.lock().await;
            let value: serde_json::Value = page.eval(&expression).await.ok()?;
            Some(is_truthy(&value))
        })
    }

    fn dom_exists(&self, selector: &str) -> Option<bool> {
        let page = Arc::clone(&self.page);
        let selector = selector.to_owned();
        self.runtime.block_on(async move {
            let page = page.lock().await;
            page.query_selector(&selector).await.ok().map(|found| found.is_some())
        })
    }

    fn dom_text(&self, selector: &str) -> Option<String> {
        let page = Arc::clone(&self.page);
        let selector = selector.to_owned();
        self.runtime.block_on(async move {
            let page = page.lock().await;
            let handle = page.query_selector(&selector).await.ok()??;
            handle.inner_text().await.ok()
        })
    }
}

/// JavaScript truthiness for the subset of values `eval_truthy` sees.
fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(flag) => *flag,
        serde_json::Value::Number(number) => number.as_f64().is_some_and(|value| value != 0.0),
        serde_json::Value::String(text) => !text.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
