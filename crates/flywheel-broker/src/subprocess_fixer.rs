// flywheel-broker/src/subprocess_fixer.rs
// ============================================================================
// Module: Subprocess Fixer Backend
// Description: Runs an external fixer as a child process against one issue
//              and reads back its structured fix report.
// Purpose: Production `Fixer` backend for the FIX phase (§4.1, §4.7).
// Dependencies: flywheel-core, serde_json, std::process, tempfile
// ============================================================================

//! ## Overview
//! [`SubprocessFixer`] spawns the configured executable once per issue,
//! handing it the issue as a JSON file and reading back a `FixReport` JSON
//! file it is expected to write before exiting. As with
//! [`crate::subprocess::SubprocessRunner`], the child's own stdio is
//! discarded entirely — only the structured report is read (§5
//! context-window protection).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::process::Command;
use std::process::Stdio;
use std::time::Duration;
use std::time::Instant;

use flywheel_core::FixReport;
use flywheel_core::Fixer;
use flywheel_core::FixerError;
use flywheel_core::Issue;

/// How often [`SubprocessFixer::apply`] polls a child for completion.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

// ============================================================================
// SECTION: Subprocess Fixer
// ============================================================================

/// Spawns a configured executable as a child process per fix attempt
/// (§4.1).
///
/// The executable is invoked as:
/// `<program> --issue-path <issue.json> --report-path <report.json>`, with
/// stdin/stdout/stderr all discarded. It is expected to write exactly one
/// `FixReport` as JSON to `report-path` before exiting.
pub struct SubprocessFixer {
    program: PathBuf,
    timeout: Duration,
}

impl SubprocessFixer {
    /// Creates a fixer that invokes `program`, killing it if it runs
    /// longer than `timeout`.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self { program: program.into(), timeout }
    }
}

impl Fixer for SubprocessFixer {
    fn apply(&self, issue: &Issue) -> Result<FixReport, FixerError> {
        let scratch = tempfile::tempdir().map_err(|err| FixerError::Io(err.to_string()))?;
        let issue_path = scratch.path().join("issue.json");
        let report_path = scratch.path().join("report.json");

        let issue_json = serde_json::to_vec_pretty(issue).map_err(|err| FixerError::Io(err.to_string()))?;
        std::fs::write(&issue_path, issue_json).map_err(|err| FixerError::Io(err.to_string()))?;

        let mut child = Command::new(&self.program)
            .arg("--issue-path")
            .arg(&issue_path)
            .arg("--report-path")
            .arg(&report_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| FixerError::Spawn(err.to_string()))?;

        let started = Instant::now();
        loop {
            if let Some(status) = child.try_wait().map_err(|err| FixerError::Io(err.to_string()))? {
                if !status.success() {
                    return Err(FixerError::Io(format!("fixer exited with {status}")));
                }
                break;
            }
            if started.elapsed() >= self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                return Err(FixerError::Io("fixer timed out".to_string()));
            }
            std::thread::sleep(POLL_INTERVAL);
        }

        let bytes = std::fs::read(&report_path).map_err(|err| FixerError::Io(err.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|err| FixerError::Io(err.to_string()))
    }
}
