#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Derived statistics attached to building responses.
//!
//! Stats are recomputed from a building's reports on every request and are
//! never persisted.

use serde::{Deserialize, Serialize};

/// Aggregated report statistics for a single building.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingStats {
    /// Number of reports filed.
    pub total_reports: u64,
    /// Number of reports where roaches were seen.
    pub positive_reports: u64,
    /// Share of positive reports, rounded to a whole percent (0-100).
    pub percent_positive: u8,
    /// Mean severity across all reports, rounded to one decimal place.
    pub avg_severity: f64,
}

impl BuildingStats {
    /// Stats for a building with no reports.
    pub const EMPTY: Self = Self {
        total_reports: 0,
        positive_reports: 0,
        percent_positive: 0,
        avg_severity: 0.0,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case() {
        let stats = BuildingStats {
            total_reports: 2,
            positive_reports: 1,
            percent_positive: 50,
            avg_severity: 1.5,
        };
        let value = serde_json::to_value(stats).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "totalReports": 2,
                "positiveReports": 1,
                "percentPositive": 50,
                "avgSeverity": 1.5,
            })
        );
    }

    #[test]
    fn empty_matches_default() {
        assert_eq!(BuildingStats::EMPTY, BuildingStats::default());
    }
}
