// flywheel-core/src/core/time.rs
// ============================================================================
// Module: Flywheel Timestamps
// Description: ISO-8601 timestamp wrapper shared across on-disk documents.
// Purpose: Give every timestamped field (issues, history, baselines) one
//          serialization format.
// Dependencies: time, serde
// ============================================================================

//! ## Overview
//! All on-disk documents stamp times as RFC 3339 / ISO-8601 strings. This
//! module centralizes that format so every component formats and parses the
//! same way.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::error::Format as FormatError;
use time::error::Parse as ParseError;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// An ISO-8601 (RFC 3339) timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    /// Captures the current UTC time.
    #[must_use]
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    /// Wraps an existing [`OffsetDateTime`].
    #[must_use]
    pub const fn from_datetime(value: OffsetDateTime) -> Self {
        Self(value)
    }

    /// Returns the underlying [`OffsetDateTime`].
    #[must_use]
    pub const fn as_datetime(&self) -> OffsetDateTime {
        self.0
    }

    /// Parses an RFC 3339 string into a timestamp.
    ///
    /// # Errors
    /// Returns an error when `value` is not a valid RFC 3339 timestamp.
    pub fn parse(value: &str) -> Result<Self, ParseError> {
        OffsetDateTime::parse(value, &Rfc3339).map(Self)
    }

    /// Formats this timestamp as an RFC 3339 string.
    ///
    /// # Errors
    /// Returns an error when the underlying datetime cannot be formatted
    /// (practically unreachable for valid `OffsetDateTime` values).
    pub fn to_rfc3339(self) -> Result<String, FormatError> {
        self.0.format(&Rfc3339)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_rfc3339() {
            Ok(text) => f.write_str(&text),
            Err(_) => f.write_str("<invalid-timestamp>"),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let text = self.to_rfc3339().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::expect_used, reason = "test assertions may panic on failure")]
mod tests {
    use super::Timestamp;

    #[test]
    fn round_trips_through_rfc3339() {
        let ts = Timestamp::now();
        let text = ts.to_rfc3339().expect("formats");
        let parsed = Timestamp::parse(&text).expect("parses");
        assert_eq!(ts, parsed);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(Timestamp::parse("not-a-timestamp").is_err());
    }
}
