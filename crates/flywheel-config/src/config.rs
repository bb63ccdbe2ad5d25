// flywheel-config/src/config.rs
// ============================================================================
// Module: Flywheel Configuration
// Description: Configuration loading and validation for the crank
//              orchestrator.
// Purpose: Provide strict, fail-closed config parsing with sane defaults
//          for every named tunable in §4/§5.
// Dependencies: flywheel-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file. A missing file is not an
//! error — every field defaults to the numeric constant spec.md names —
//! but a present, malformed, or out-of-range file fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;

/// Default bound on simultaneously running runners (§4.2 scheduling model).
pub const DEFAULT_MAX_CONCURRENT_RUNNERS: u32 = 6;
/// Default grace period the runner pool waits after signaling cancellation.
pub const DEFAULT_RUNNER_SHUTDOWN_GRACE_MS: u64 = 5_000;
/// Default lookback window for the recent-failure penalty (§4.1).
pub const DEFAULT_RECENT_WINDOW: u32 = 2;
/// Default multiplier applied under the recent-failure penalty.
pub const DEFAULT_RECENT_PENALTY: f64 = 0.3;
/// Default lookback window for the persistence boost (§4.1).
pub const DEFAULT_PERSIST_WINDOW: u32 = 3;
/// Default multiplier applied under the persistence boost.
pub const DEFAULT_PERSIST_BOOST: f64 = 1.5;
/// Default consecutive-failure count that locks an issue out for design
/// review (§4.1, §8 design-review lockout).
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 3;
/// Default composite score a test must clear to count as `pass` (§4.3).
pub const DEFAULT_PASS_THRESHOLD: f64 = 0.5;
/// Default slack the regression gate allows below the baseline SHS (§4.4).
pub const DEFAULT_SHS_MARGIN: f64 = 1.0;
/// Default composite score a ratcheted test must hold (§4.4).
pub const DEFAULT_RATCHET_THRESHOLD: f64 = 0.7;
/// Default consecutive cranks a test must hold `RATCHET_THRESHOLD` to
/// become ratcheted (§4.4).
pub const DEFAULT_RATCHET_CONSECUTIVE: u32 = 3;
/// Default minimum occurrence count before an improvement-type feedback
/// entry mints a new issue (§4.6).
pub const DEFAULT_IMPROVEMENT_THRESHOLD: u32 = 2;
/// Default time budget for the external semantic matcher (§4.7).
pub const DEFAULT_MATCHER_TIMEOUT_MS: u64 = 120_000;
/// Default interval between polls for the matcher's output artifact.
pub const DEFAULT_MATCHER_POLL_INTERVAL_MS: u64 = 500;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failure modes for loading or validating a [`FlywheelConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("config io error: {0}")]
    Io(String),
    /// The config file contents were not valid TOML.
    #[error("config parse error: {0}")]
    Parse(String),
    /// The config failed validation after parsing successfully.
    #[error("config invalid: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Every tunable named across §4 (crank stages) and §5 (concurrency)
/// of the specification, with defaults matching the numeric constants
/// spec.md names for each.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct FlywheelConfig {
    /// Bound on simultaneously running runners (§4.2).
    pub max_concurrent_runners: u32,
    /// Grace period, in milliseconds, the runner pool waits for outstanding
    /// runners to stop after a cancellation signal (§4.2).
    pub runner_shutdown_grace_ms: u64,
    /// Lookback window, in cranks, for the recent-failure penalty (§4.1).
    pub recent_window: u32,
    /// Multiplier applied to priority under the recent-failure penalty.
    pub recent_penalty: f64,
    /// Lookback window, in cranks, for the persistence boost (§4.1).
    pub persist_window: u32,
    /// Multiplier applied to priority under the persistence boost.
    pub persist_boost: f64,
    /// Consecutive failed/reverted attempts that trigger design-review
    /// lockout (§4.1, §8).
    pub max_consecutive_failures: u32,
    /// Composite score threshold a test must clear to count as `pass`
    /// (§4.3).
    pub pass_threshold: f64,
    /// Slack the regression gate allows below the baseline SHS (§4.4).
    pub shs_margin: f64,
    /// Composite score threshold a ratcheted test must hold (§4.4).
    pub ratchet_threshold: f64,
    /// Consecutive cranks a test must hold `ratchet_threshold` to become
    /// ratcheted (§4.4).
    pub ratchet_consecutive: u32,
    /// Minimum occurrence count before an improvement-type feedback entry
    /// mints a new issue (§4.6).
    pub improvement_threshold: u32,
    /// Time budget, in milliseconds, allotted to the external semantic
    /// matcher before it is treated as non-responsive (§4.7).
    pub matcher_timeout_ms: u64,
    /// Interval, in milliseconds, between polls for the matcher's output
    /// artifact (§4.7).
    pub matcher_poll_interval_ms: u64,
}

impl Default for FlywheelConfig {
    fn default() -> Self {
        Self {
            max_concurrent_runners: DEFAULT_MAX_CONCURRENT_RUNNERS,
            runner_shutdown_grace_ms: DEFAULT_RUNNER_SHUTDOWN_GRACE_MS,
            recent_window: DEFAULT_RECENT_WINDOW,
            recent_penalty: DEFAULT_RECENT_PENALTY,
            persist_window: DEFAULT_PERSIST_WINDOW,
            persist_boost: DEFAULT_PERSIST_BOOST,
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
            pass_threshold: DEFAULT_PASS_THRESHOLD,
            shs_margin: DEFAULT_SHS_MARGIN,
            ratchet_threshold: DEFAULT_RATCHET_THRESHOLD,
            ratchet_consecutive: DEFAULT_RATCHET_CONSECUTIVE,
            improvement_threshold: DEFAULT_IMPROVEMENT_THRESHOLD,
            matcher_timeout_ms: DEFAULT_MATCHER_TIMEOUT_MS,
            matcher_poll_interval_ms: DEFAULT_MATCHER_POLL_INTERVAL_MS,
        }
    }
}

impl FlywheelConfig {
    /// Loads configuration from `path`, or returns the default
    /// configuration when `path` is `None`.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when the file cannot be read, exceeds the
    /// size limit, fails to parse, or fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self = toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every field for internal consistency.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] when any field is out of range:
    /// zero concurrency or window bounds, or a ratio field outside
    /// `[0.0, 1.0]` where the specification treats it as a score
    /// threshold.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_runners == 0 {
            return Err(ConfigError::Invalid("max_concurrent_runners must be greater than zero".to_string()));
        }
        if self.recent_window == 0 {
            return Err(ConfigError::Invalid("recent_window must be greater than zero".to_string()));
        }
        if self.persist_window == 0 {
            return Err(ConfigError::Invalid("persist_window must be greater than zero".to_string()));
        }
        if self.max_consecutive_failures == 0 {
            return Err(ConfigError::Invalid("max_consecutive_failures must be greater than zero".to_string()));
        }
        if self.ratchet_consecutive == 0 {
            return Err(ConfigError::Invalid("ratchet_consecutive must be greater than zero".to_string()));
        }
        if self.improvement_threshold == 0 {
            return Err(ConfigError::Invalid("improvement_threshold must be greater than zero".to_string()));
        }
        if !(0.0..=1.0).contains(&self.pass_threshold) {
            return Err(ConfigError::Invalid("pass_threshold must be within [0.0, 1.0]".to_string()));
        }
        if !(0.0..=1.0).contains(&self.ratchet_threshold) {
            return Err(ConfigError::Invalid("ratchet_threshold must be within [0.0, 1.0]".to_string()));
        }
        if self.recent_penalty < 0.0 {
            return Err(ConfigError::Invalid("recent_penalty must not be negative".to_string()));
        }
        if self.persist_boost < 0.0 {
            return Err(ConfigError::Invalid("persist_boost must not be negative".to_string()));
        }
        if self.shs_margin < 0.0 {
            return Err(ConfigError::Invalid("shs_margin must not be negative".to_string()));
        }
        if self.matcher_timeout_ms == 0 {
            return Err(ConfigError::Invalid("matcher_timeout_ms must be greater than zero".to_string()));
        }
        if self.matcher_poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("matcher_poll_interval_ms must be greater than zero".to_string()));
        }
        if self.matcher_poll_interval_ms > self.matcher_timeout_ms {
            return Err(ConfigError::Invalid(
                "matcher_poll_interval_ms must not exceed matcher_timeout_ms".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
