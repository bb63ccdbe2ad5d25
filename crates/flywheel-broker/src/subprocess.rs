// flywheel-broker/src/subprocess.rs
// ============================================================================
// Module: Subprocess Runner Backend
// Description: Runs a test definition as a child process, discarding its
//              stdio, and killing it if it overruns its budgeted time.
// Purpose: Production `Runner` backend for the runner pool (§4.2).
// Dependencies: flywheel-core, std::process
// ============================================================================

//! ## Overview
//! [`SubprocessRunner`] is the production [`Runner`] backend: it spawns the
//! configured executable as a restricted child process per test, passing
//! the test id and run directory, and discards the child's stdio entirely
//! (§5 context-window protection — a runner's own chatter never reaches the
//! orchestrator). A runner must not modify source, touch version control,
//! install packages, or write outside its run directory (§4.2); enforcing
//! that is the executable's responsibility, not this supervisor's — this
//! type only spawns, times out, and reports.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Stdio;
use std::time::Duration;
use std::time::Instant;

use flywheel_core::Runner;
use flywheel_core::RunnerError;
use flywheel_core::TestDefinition;

/// How often [`SubprocessRunner::run`] polls a child for completion while
/// waiting out its budget.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

// ============================================================================
// SECTION: Subprocess Runner
// ============================================================================

/// Spawns a configured executable as a child process per test (§4.2).
///
/// The executable is invoked as:
/// `<program> --test-id <id> --run-dir <dir>`, with stdin/stdout/stderr all
/// discarded. It is expected to write exactly one `trace.json` into
/// `run_dir` before exiting; this type does not itself validate the trace.
pub struct SubprocessRunner {
    program: PathBuf,
    timeout: Duration,
}

impl SubprocessRunner {
    /// Creates a runner that invokes `program`, killing it if it runs
    /// longer than `timeout`.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self { program: program.into(), timeout }
    }
}

impl Runner for SubprocessRunner {
    fn run(&self, test: &TestDefinition, run_dir: &Path) -> Result<(), RunnerError> {
        std::fs::create_dir_all(run_dir).map_err(|err| RunnerError::Io(err.to_string()))?;

        let mut child = Command::new(&self.program)
            .arg("--test-id")
            .arg(test.id.as_str())
            .arg("--run-dir")
            .arg(run_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| RunnerError::Spawn(err.to_string()))?;

        let started = Instant::now();
        loop {
            if let Some(status) = child.try_wait().map_err(|err| RunnerError::Io(err.to_string()))? {
                return if status.success() {
                    Ok(())
                } else {
                    Err(RunnerError::Io(format!("runner exited with {status}")))
                };
            }
            if started.elapsed() >= self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                return Err(RunnerError::Timeout);
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}
