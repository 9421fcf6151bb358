#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Report statistics aggregation.
//!
//! Reduces the reports filed against a building into the [`BuildingStats`]
//! block shown on building detail pages and used to color list and map
//! markers. Every output is an order-independent reduction, so the same
//! set of reports always yields the same stats.
//!
//! Rounding is done in integer arithmetic (round half up) so that values
//! like `1/200 = 0.5%` land on the expected side instead of depending on
//! floating point representation.

use roach_reports_analytics_models::BuildingStats;
use roach_reports_database_models::{ReportRow, ReportWithImages};
use roach_reports_report_models::Severity;

/// Anything that carries the two report fields the aggregation needs.
pub trait ReportSample {
    /// Whether roaches were seen.
    fn has_roaches(&self) -> bool;

    /// Reported severity, if any.
    fn severity(&self) -> Option<Severity>;
}

impl ReportSample for ReportRow {
    fn has_roaches(&self) -> bool {
        self.has_roaches
    }

    fn severity(&self) -> Option<Severity> {
        self.severity
    }
}

impl ReportSample for ReportWithImages {
    fn has_roaches(&self) -> bool {
        self.report.has_roaches
    }

    fn severity(&self) -> Option<Severity> {
        self.report.severity
    }
}

impl<T: ReportSample + ?Sized> ReportSample for &T {
    fn has_roaches(&self) -> bool {
        (**self).has_roaches()
    }

    fn severity(&self) -> Option<Severity> {
        (**self).severity()
    }
}

/// Computes [`BuildingStats`] for a building's reports.
///
/// A missing severity contributes 0 to the severity sum but still counts
/// towards the average's denominator.
#[must_use]
pub fn aggregate<I>(reports: I) -> BuildingStats
where
    I: IntoIterator,
    I::Item: ReportSample,
{
    let mut total = 0u64;
    let mut positive = 0u64;
    let mut severity_sum = 0u64;

    for report in reports {
        total += 1;
        if report.has_roaches() {
            positive += 1;
        }
        severity_sum += report.severity().map_or(0, |s| u64::from(s.value()));
    }

    if total == 0 {
        return BuildingStats::EMPTY;
    }

    // positive <= total, so this is at most 100
    let percent_positive = u8::try_from(round_half_up(positive * 100, total)).unwrap_or(100);

    // severity_sum <= 5 * total, so this is at most 50
    #[allow(clippy::cast_precision_loss)]
    let avg_severity = round_half_up(severity_sum * 10, total) as f64 / 10.0;

    BuildingStats {
        total_reports: total,
        positive_reports: positive,
        percent_positive,
        avg_severity,
    }
}

/// `round(numerator / denominator)` with halves rounded up.
const fn round_half_up(numerator: u64, denominator: u64) -> u64 {
    (numerator * 2 + denominator) / (denominator * 2)
}
