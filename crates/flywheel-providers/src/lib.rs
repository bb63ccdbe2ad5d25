// flywheel-providers/src/lib.rs
// ============================================================================
// Module: Flywheel Providers
// Description: Concrete `LiveBrowserContext` implementations.
// Purpose: Back the verify-block live-fallback path (§4.3) with a real
//          browser driver and a fake for tests.
// Dependencies: flywheel-core, playwright
// ============================================================================

//! ## Overview
//! `flywheel-core::core::verify` defines the snapshot-first evaluator and
//! the [`flywheel_core::LiveBrowserContext`] trait it falls back to for
//! milestones whose verifier needs state the snapshot didn't capture. This
//! crate supplies that trait's implementations: [`PlaywrightContext`],
//! which drives a still-open page via the `playwright` crate, and
//! [`FakeBrowserContext`], an in-memory double for deterministic tests.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod fake;
pub mod playwright_context;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use fake::FakeBrowserContext;
pub use playwright_context::PlaywrightContext;
pub use playwright_context::PlaywrightContextError;
