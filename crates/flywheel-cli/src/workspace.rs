// flywheel-cli/src/workspace.rs
// ============================================================================
// Module: Workspace Layout
// Description: Path conventions for the `flywheel/` working directory and
//              the test-suite document loader.
// Purpose: Give the CLI a single source of truth for where every durable
//          document and external-collaborator binary lives (§9 filesystem
//          as message bus).
// Dependencies: flywheel-core, serde_json
// ============================================================================

//! ## Overview
//! Every flywheel invocation operates on one workspace root (the current
//! directory unless a future flag overrides it). [`Workspace`] resolves
//! every path the CLI needs beneath `<root>/flywheel/`: the backlog
//! document, the shared advisory lock, the history log, the baseline
//! archive, the test suite definition, per-crank run directories, and the
//! conventional locations for the external runner/fixer/matcher
//! executables.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use flywheel_core::TestDefinition;
use thiserror::Error;

// ============================================================================
// SECTION: Workspace
// ============================================================================

/// Resolves every on-disk path flywheel reads or writes, rooted at one
/// workspace directory.
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Roots a workspace at `root` (typically the current directory).
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn state_dir(&self) -> PathBuf {
        self.root.join("flywheel")
    }

    /// The backlog document (C1).
    #[must_use]
    pub fn backlog_path(&self) -> PathBuf {
        self.state_dir().join("backlog.json")
    }

    /// The advisory lock sentinel shared by the backlog and history log
    /// (§5), also held for the duration of a whole crank (§9).
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        self.state_dir().join("flywheel.lock")
    }

    /// The append-only crank/fix history log (C2).
    #[must_use]
    pub fn history_path(&self) -> PathBuf {
        self.state_dir().join("history.ndjson")
    }

    /// Root directory for the baseline archive and trend log.
    #[must_use]
    pub fn baseline_root(&self) -> PathBuf {
        self.state_dir().join("baselines")
    }

    /// The test suite definition: a JSON array of [`TestDefinition`].
    #[must_use]
    pub fn suite_path(&self) -> PathBuf {
        self.state_dir().join("tests.json")
    }

    /// The scratch directory for one crank's runner output (§5: "never
    /// mutated after RECORD completes").
    #[must_use]
    pub fn run_dir(&self, crank_number: u64) -> PathBuf {
        self.state_dir().join("runs").join(crank_number.to_string())
    }

    /// Conventional location of the external runner executable.
    #[must_use]
    pub fn runner_program(&self) -> PathBuf {
        self.state_dir().join("bin").join("runner")
    }

    /// Conventional location of the external fixer executable.
    #[must_use]
    pub fn fixer_program(&self) -> PathBuf {
        self.state_dir().join("bin").join("fixer")
    }

    /// Conventional location of the external semantic matcher executable.
    #[must_use]
    pub fn matcher_program(&self) -> PathBuf {
        self.state_dir().join("bin").join("matcher")
    }
}

// ============================================================================
// SECTION: Suite Loader
// ============================================================================

/// Failure modes for [`load_suite`].
#[derive(Debug, Error)]
pub enum SuiteError {
    /// The suite file could not be read.
    #[error("suite io error: {0}")]
    Io(String),
    /// The suite file was not a valid JSON array of test definitions.
    #[error("suite parse error: {0}")]
    Parse(String),
    /// The suite file was syntactically valid but empty.
    #[error("suite at {0} defines no tests")]
    Empty(PathBuf),
}

/// Loads the fixed test suite a crank measures against.
///
/// # Errors
/// Returns [`SuiteError`] when the file cannot be read, fails to parse as
/// a JSON array of [`TestDefinition`], or parses to an empty suite.
pub fn load_suite(path: &Path) -> Result<Vec<TestDefinition>, SuiteError> {
    let bytes = std::fs::read(path).map_err(|err| SuiteError::Io(err.to_string()))?;
    let tests: Vec<TestDefinition> = serde_json::from_slice(&bytes).map_err(|err| SuiteError::Parse(err.to_string()))?;
    if tests.is_empty() {
        return Err(SuiteError::Empty(path.to_path_buf()));
    }
    Ok(tests)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
