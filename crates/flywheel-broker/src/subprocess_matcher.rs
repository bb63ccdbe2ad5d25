// flywheel-broker/src/subprocess_matcher.rs
// ============================================================================
// Module: Subprocess Matcher Backend
// Description: Spawns an external semantic matcher process and detaches,
//              leaving the orchestrator to poll for its output artifact.
// Purpose: Production `Matcher` backend for MATCH_WAIT (§4.7, §5).
// Dependencies: flywheel-core, std::process
// ============================================================================

//! ## Overview
//! [`SubprocessMatcher::spawn`] only launches the configured executable and
//! returns once the spawn itself succeeds; it never waits on the child
//! (§4.7: "the orchestrator communicates with the matcher exclusively
//! through on-disk artifacts" and polls for them itself). A background
//! thread reaps the child so it never lingers as a zombie.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Stdio;

use flywheel_core::Matcher;
use flywheel_core::MatcherError;

// ============================================================================
// SECTION: Subprocess Matcher
// ============================================================================

/// Spawns a configured executable once per MATCH_WAIT invocation (§4.7).
///
/// The executable is invoked as:
/// `<program> --extracted-feedback <path> --open-issues <path> --output
/// <path>`, with stdin/stdout/stderr all discarded. It is expected to
/// write a match-decisions JSON array to `--output` at its own pace; the
/// orchestrator polls for that file rather than waiting on this call.
pub struct SubprocessMatcher {
    program: PathBuf,
}

impl SubprocessMatcher {
    /// Creates a matcher that invokes `program`.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }
}

impl Matcher for SubprocessMatcher {
    fn spawn(&self, extracted_feedback_path: &Path, open_issues_path: &Path, output_path: &Path) -> Result<(), MatcherError> {
        let child = Command::new(&self.program)
            .arg("--extracted-feedback")
            .arg(extracted_feedback_path)
            .arg("--open-issues")
            .arg(open_issues_path)
            .arg("--output")
            .arg(output_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| MatcherError::Spawn(err.to_string()))?;

        std::thread::spawn(move || {
            let mut child = child;
            let _ = child.wait();
        });

        Ok(())
    }
}
