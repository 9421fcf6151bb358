#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Severity scale for roach reports.
//!
//! A report only carries a severity when roaches were actually seen. The
//! scale is a subjective 1-5 rating of infestation intensity and travels
//! over the wire as a plain integer.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Infestation intensity for a positive report, from 1 (a single sighting)
/// to 5 (a full infestation).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(try_from = "u8", into = "u8")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Level 1: one or two roaches seen
    Sighting = 1,
    /// Level 2: occasional sightings
    Light = 2,
    /// Level 3: regular sightings
    Moderate = 3,
    /// Level 4: seen daily, in several rooms
    Heavy = 4,
    /// Level 5: visible infestation
    Infested = 5,
}

impl Severity {
    /// Returns the numeric value of this severity level.
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Creates a severity level from a numeric value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not in the range 1-5.
    pub fn from_value(value: u8) -> Result<Self, InvalidSeverityError> {
        match value {
            1 => Ok(Self::Sighting),
            2 => Ok(Self::Light),
            3 => Ok(Self::Moderate),
            4 => Ok(Self::Heavy),
            5 => Ok(Self::Infested),
            _ => Err(InvalidSeverityError {
                value: i64::from(value),
            }),
        }
    }

    /// Creates a severity level from a wide integer, as stored in the
    /// database or sent by a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not in the range 1-5.
    pub fn from_i64(value: i64) -> Result<Self, InvalidSeverityError> {
        u8::try_from(value)
            .map_err(|_| InvalidSeverityError { value })
            .and_then(Self::from_value)
    }
}

impl From<Severity> for u8 {
    fn from(severity: Severity) -> Self {
        severity.value()
    }
}

impl TryFrom<u8> for Severity {
    type Error = InvalidSeverityError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

/// Error returned when attempting to create a [`Severity`] from an invalid
/// numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidSeverityError {
    /// The invalid severity value that was provided.
    pub value: i64,
}

impl std::fmt::Display for InvalidSeverityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid severity value {}: expected 1-5", self.value)
    }
}

impl std::error::Error for InvalidSeverityError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_from_value_roundtrip() {
        for v in 1..=5u8 {
            let severity = Severity::from_value(v).unwrap();
            assert_eq!(severity.value(), v);
        }
        assert!(Severity::from_value(0).is_err());
        assert!(Severity::from_value(6).is_err());
    }

    #[test]
    fn severity_from_i64_rejects_out_of_range() {
        assert_eq!(Severity::from_i64(3).unwrap(), Severity::Moderate);
        assert_eq!(
            Severity::from_i64(-1).unwrap_err(),
            InvalidSeverityError { value: -1 }
        );
        assert_eq!(
            Severity::from_i64(300).unwrap_err(),
            InvalidSeverityError { value: 300 }
        );
    }

    #[test]
    fn severity_serializes_as_integer() {
        let json = serde_json::to_string(&Severity::Heavy).unwrap();
        assert_eq!(json, "4");

        let parsed: Severity = serde_json::from_str("2").unwrap();
        assert_eq!(parsed, Severity::Light);

        assert!(serde_json::from_str::<Severity>("9").is_err());
    }
}
