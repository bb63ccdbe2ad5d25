#![cfg_attr(
    test,
    allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        clippy::dbg_macro,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only output and panic-based assertions are permitted."
    )
)]
// flywheel-cli/src/main.rs
// ============================================================================
// Module: Flywheel CLI Entry Point
// Description: Command dispatcher for the crank lifecycle's four modes.
// Purpose: Wire concrete collaborators (file-backed persistence, subprocess
//          runner/fixer/matcher) into `flywheel-engine::run_crank` and its
//          single-mode entry points.
// Dependencies: clap, flywheel-broker, flywheel-config, flywheel-core,
//               flywheel-engine, flywheel-store, fs2, tokio, tracing.
// ============================================================================

//! ## Overview
//! The flywheel CLI is a thin wiring layer: every lifecycle rule lives in
//! `flywheel-engine`, every durable document in `flywheel-store`, and
//! every external-process collaborator in `flywheel-broker`. This binary
//! only resolves the workspace layout (`flywheel_cli::workspace`),
//! constructs the concrete collaborators, holds the whole-crank advisory
//! lock (§9), and renders the result.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use clap::Subcommand;
use flywheel_broker::MaterializedRunner;
use flywheel_broker::RunnerPool;
use flywheel_broker::SubprocessFixer;
use flywheel_broker::SubprocessMatcher;
use flywheel_broker::SubprocessRunner;
use flywheel_cli::workspace::Workspace;
use flywheel_config::FlywheelConfig;
use flywheel_core::HistoryLog;
use flywheel_core::HistoryRecord;
use flywheel_engine::CrankError;
use flywheel_engine::CrankMode;
use flywheel_engine::CrankOutcome;
use flywheel_engine::Collaborators;
use flywheel_engine::FixPhaseOutcome;
use flywheel_store::FileBacklogStore;
use flywheel_store::FileBaselineStore;
use flywheel_store::FileHistoryLog;
use fs2::FileExt;
use thiserror::Error;
use tracing::info;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition (§6 CLI surface).
#[derive(Parser, Debug)]
#[command(name = "flywheel", disable_help_subcommand = true, arg_required_else_help = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// The four crank lifecycle modes (§6).
#[derive(Subcommand, Debug)]
enum Commands {
    /// Full crank: SELECT → FIX → MEASURE → ... → RECORD.
    Crank {
        /// Optional config file path (defaults to `flywheel.toml` semantics).
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
    /// MEASURE through RECORD only; skips SELECT and FIX.
    Measure {
        /// Optional config file path.
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
    /// Applies the top recommendation without re-measuring it.
    FixOnly {
        /// Optional config file path.
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
    /// Runs and validates exactly one test, outside the crank lifecycle.
    Test {
        /// The test id to run.
        test_id: String,
        /// Optional config file path.
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Top-level CLI error wrapper.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl From<CrankError> for CliError {
    fn from(err: CrankError) -> Self {
        Self::new(err.to_string())
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code (§7: zero on success, non-zero
/// on hard errors; a regression-gate failure is non-fatal and still
/// exits zero since the orchestrator itself reverts the fix).
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::try_init().ok();
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let workspace = Workspace::new(std::env::current_dir().map_err(|err| CliError::new(err.to_string()))?);

    match cli.command {
        Commands::Crank { config } => command_crank(&workspace, config.as_deref(), CrankMode::Full).await,
        Commands::Measure { config } => command_crank(&workspace, config.as_deref(), CrankMode::MeasureOnly).await,
        Commands::FixOnly { config } => command_fix_only(&workspace, config.as_deref()),
        Commands::Test { test_id, config } => command_test(&workspace, config.as_deref(), &test_id),
    }
}

// ============================================================================
// SECTION: Crank / Measure
// ============================================================================

async fn command_crank(workspace: &Workspace, config_path: Option<&std::path::Path>, mode: CrankMode) -> CliResult<ExitCode> {
    let config = FlywheelConfig::load(config_path).map_err(|err| CliError::new(err.to_string()))?;
    let lock = acquire_crank_lock(workspace)?;

    let backlog_store = FileBacklogStore::new(workspace.backlog_path(), workspace.lock_path());
    let history_log = FileHistoryLog::new(workspace.history_path(), workspace.lock_path());
    let baseline_store = FileBaselineStore::new(workspace.baseline_root());

    let tests = flywheel_cli::workspace::load_suite(&workspace.suite_path()).map_err(|err| CliError::new(err.to_string()))?;
    let current_crank = next_crank_number(&history_log)?;
    let run_dir = workspace.run_dir(current_crank);

    let cancel = Arc::new(AtomicBool::new(false));
    let pool = RunnerPool::new(config.max_concurrent_runners as usize, Duration::from_millis(config.runner_shutdown_grace_ms));
    let subprocess_runner: Arc<dyn flywheel_core::Runner + Send + Sync> =
        Arc::new(SubprocessRunner::new(workspace.runner_program(), Duration::from_millis(config.matcher_timeout_ms)));
    let outcomes = pool
        .run_suite(&tests, &run_dir, subprocess_runner, cancel)
        .await
        .map_err(|err| CliError::new(err.to_string()))?;
    let runner = MaterializedRunner::new(outcomes.into_iter().map(|outcome| (outcome.test_id, outcome.result)));

    let fixer = SubprocessFixer::new(workspace.fixer_program(), Duration::from_millis(config.matcher_timeout_ms));
    let matcher = SubprocessMatcher::new(workspace.matcher_program());

    let collaborators = Collaborators { backlog_store: &backlog_store, history_log: &history_log, runner: &runner, fixer: &fixer, matcher: &matcher };

    let baseline = baseline_store.load_latest().map_err(|err| CliError::new(err.to_string()))?;
    let version_tag = env!("CARGO_PKG_VERSION");

    let (outcome, _backlog, next_baseline) =
        flywheel_engine::run_crank(mode, current_crank, version_tag, &tests, &run_dir, &collaborators, baseline.as_ref(), &config)?;

    if let Some(next_baseline) = next_baseline {
        if baseline.as_ref() != Some(&next_baseline) {
            let shs_delta = match outcome.score.map(|score| score.shs) {
                Some(flywheel_engine::ShsOutcome::Score(shs)) => baseline.as_ref().map_or(shs, |base| shs - base.shs),
                _ => 0.0,
            };
            baseline_store.accept(&next_baseline, current_crank, shs_delta).map_err(|err| CliError::new(err.to_string()))?;
        }
    }

    drop(lock);
    write_stdout_line(&render_crank_outcome(&outcome)).map_err(|err| CliError::new(err.to_string()))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Fix-Only
// ============================================================================

fn command_fix_only(workspace: &Workspace, config_path: Option<&std::path::Path>) -> CliResult<ExitCode> {
    let config = FlywheelConfig::load(config_path).map_err(|err| CliError::new(err.to_string()))?;
    let lock = acquire_crank_lock(workspace)?;

    let backlog_store = FileBacklogStore::new(workspace.backlog_path(), workspace.lock_path());
    let history_log = FileHistoryLog::new(workspace.history_path(), workspace.lock_path());
    let current_crank = next_crank_number(&history_log)?;
    let fixer = SubprocessFixer::new(workspace.fixer_program(), Duration::from_millis(config.matcher_timeout_ms));

    let fix_phase = flywheel_engine::run_fix_only(&backlog_store, &fixer, current_crank, &config)?;
    drop(lock);

    write_stdout_line(&render_fix_phase(&fix_phase)).map_err(|err| CliError::new(err.to_string()))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Single Test
// ============================================================================

fn command_test(workspace: &Workspace, config_path: Option<&std::path::Path>, test_id: &str) -> CliResult<ExitCode> {
    let config = FlywheelConfig::load(config_path).map_err(|err| CliError::new(err.to_string()))?;
    let tests = flywheel_cli::workspace::load_suite(&workspace.suite_path()).map_err(|err| CliError::new(err.to_string()))?;
    let test = tests
        .iter()
        .find(|test| test.id.as_str() == test_id)
        .ok_or_else(|| CliError::new(format!("no test with id {test_id:?} in the configured suite")))?;

    let runner = SubprocessRunner::new(workspace.runner_program(), Duration::from_millis(config.matcher_timeout_ms));
    let run_dir = workspace.run_dir(0).join("adhoc").join(test_id);
    let result = flywheel_engine::run_single_test(test, &run_dir, &runner, &config)?;

    let line = format!("{test_id}: {:?} (completion={:.2}, efficiency={:.2})", result.status, result.completion, result.efficiency);
    write_stdout_line(&line).map_err(|err| CliError::new(err.to_string()))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Acquires the whole-crank advisory lock (§9): a second orchestrator
/// process targeting the same workspace blocks here rather than racing.
fn acquire_crank_lock(workspace: &Workspace) -> CliResult<std::fs::File> {
    let lock_path = workspace.lock_path();
    if let Some(dir) = lock_path.parent() {
        std::fs::create_dir_all(dir).map_err(|err| CliError::new(err.to_string()))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .open(&lock_path)
        .map_err(|err| CliError::new(err.to_string()))?;
    file.lock_exclusive().map_err(|err| CliError::new(err.to_string()))?;
    Ok(file)
}

/// The next crank number: one past the highest `crank_number` recorded in
/// the history log, or `1` if none has run yet.
fn next_crank_number(history_log: &FileHistoryLog) -> CliResult<u64> {
    let records = history_log.read_all().map_err(|err| CliError::new(err.to_string()))?;
    Ok(records
        .iter()
        .filter_map(|record| match record {
            HistoryRecord::Crank(summary) => Some(summary.crank_number),
            HistoryRecord::FixOutcome(_) => None,
        })
        .max()
        .map_or(1, |max| max + 1))
}

/// Renders a crank's outcome as the multi-line report printed to stdout.
fn render_crank_outcome(outcome: &CrankOutcome) -> String {
    let mut lines = vec![format!("fix phase: {}", render_fix_phase(&outcome.fix_phase))];

    lines.push(match &outcome.score {
        Some(score) => match score.shs {
            flywheel_engine::ShsOutcome::Score(shs) => format!("shs: {shs:.2} (pass_rate={:.2}, total={})", score.pass_rate, score.total),
            flywheel_engine::ShsOutcome::Empty => "shs: empty (no tests scheduled)".to_string(),
        },
        None => "shs: not measured this run".to_string(),
    });

    lines.push(match &outcome.gate {
        Some(flywheel_engine::GateResult::Pass) => "gate: pass".to_string(),
        Some(flywheel_engine::GateResult::Fail { dropped_ratcheted_tests, shs_below_margin }) => {
            format!("gate: fail (shs_below_margin={shs_below_margin}, dropped_ratcheted={})", dropped_ratcheted_tests.len())
        }
        None => "gate: not evaluated".to_string(),
    });

    if let Some(summary) = &outcome.apply_summary {
        lines.push(format!("feedback: {} upvoted, {} minted, {} skipped", summary.upvotes.len(), summary.minted.len(), summary.skipped.len()));
    }

    info!(?outcome.fix_outcome, "crank finished");
    lines.join("\n")
}

fn render_fix_phase(fix_phase: &FixPhaseOutcome) -> String {
    match fix_phase {
        FixPhaseOutcome::Skipped => "skipped (measure-only mode)".to_string(),
        FixPhaseOutcome::NoCandidates => "no open issues to fix".to_string(),
        FixPhaseOutcome::FixerFailed { issue_id } => format!("fixer failed on {issue_id}"),
        FixPhaseOutcome::Applied { issue_id, changed_files } => {
            format!("applied fix for {issue_id} ({} files changed)", changed_files.len())
        }
    }
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
