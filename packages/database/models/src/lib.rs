#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Database row types and insert payloads.
//!
//! These types represent the shapes of data as stored in and retrieved from
//! the `SQLite` database. They are distinct from the API response types in
//! `roach_reports_server_models`, which control the wire format.

use chrono::{DateTime, Utc};
use roach_reports_report_models::Severity;
use serde::{Deserialize, Serialize};

/// A geographic bounding box in WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western longitude boundary.
    pub west: f64,
    /// Southern latitude boundary.
    pub south: f64,
    /// Eastern longitude boundary.
    pub east: f64,
    /// Northern latitude boundary.
    pub north: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from the given coordinates.
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Whether the point lies inside the box. Edges count as inside.
    #[must_use]
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.south..=self.north).contains(&latitude)
            && (self.west..=self.east).contains(&longitude)
    }
}

/// A latitude/longitude pair. Buildings either have both or neither.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
}

/// A building row as retrieved from the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingRow {
    /// Primary key (UUID).
    pub id: String,
    /// Street address.
    pub address: String,
    /// City.
    pub city: Option<String>,
    /// State abbreviation.
    pub state: Option<String>,
    /// ZIP code.
    pub zip: Option<String>,
    /// Latitude (WGS84), if the building was geocoded.
    pub latitude: Option<f64>,
    /// Longitude (WGS84), if the building was geocoded.
    pub longitude: Option<f64>,
    /// When the building was first submitted.
    pub created_at: DateTime<Utc>,
}

impl BuildingRow {
    /// Returns the building's coordinates when both are present.
    #[must_use]
    pub const fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }
}

/// A report row as retrieved from the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Primary key (UUID).
    pub id: String,
    /// Building this report is attached to.
    pub building_id: String,
    /// Apartment or unit label.
    pub unit: Option<String>,
    /// Whether roaches were seen.
    pub has_roaches: bool,
    /// Infestation severity. Always `None` when `has_roaches` is false.
    pub severity: Option<Severity>,
    /// Free-text notes.
    pub notes: Option<String>,
    /// When the report was submitted.
    pub created_at: DateTime<Utc>,
}

/// A photo attached to a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportImageRow {
    /// Primary key (UUID).
    pub id: String,
    /// Report this image belongs to.
    pub report_id: String,
    /// Public image URL.
    pub image_url: String,
    /// When the image was attached.
    pub created_at: DateTime<Utc>,
}

/// A report together with its images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportWithImages {
    /// The report itself.
    pub report: ReportRow,
    /// Attached images, oldest first.
    pub images: Vec<ReportImageRow>,
}

/// A building with every report filed against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingWithReports {
    /// The building.
    pub building: BuildingRow,
    /// Reports, newest first.
    pub reports: Vec<ReportWithImages>,
}

/// Fields for inserting a new building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBuilding {
    /// Street address.
    pub address: String,
    /// City.
    pub city: Option<String>,
    /// State abbreviation.
    pub state: Option<String>,
    /// ZIP code.
    pub zip: Option<String>,
    /// Coordinates, if known at submission time.
    pub coordinates: Option<Coordinates>,
}

/// Fields for inserting a new report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReport {
    /// Building the report is filed against.
    pub building_id: String,
    /// Apartment or unit label.
    pub unit: Option<String>,
    /// Whether roaches were seen.
    pub has_roaches: bool,
    /// Infestation severity.
    pub severity: Option<Severity>,
    /// Free-text notes.
    pub notes: Option<String>,
}

impl NewReport {
    /// Severity as it should be persisted: dropped for negative reports.
    #[must_use]
    pub const fn stored_severity(&self) -> Option<Severity> {
        if self.has_roaches {
            self.severity
        } else {
            None
        }
    }
}

/// Fields for attaching an image to a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReportImage {
    /// Report the image belongs to.
    pub report_id: String,
    /// Public image URL.
    pub image_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_contains_is_inclusive() {
        let bbox = BoundingBox::new(-74.0, 40.0, -73.0, 41.0);
        assert!(bbox.contains(40.0, -74.0));
        assert!(bbox.contains(41.0, -73.0));
        assert!(bbox.contains(40.5, -73.5));
        assert!(!bbox.contains(41.0001, -73.5));
        assert!(!bbox.contains(40.5, -72.9999));
    }

    #[test]
    fn stored_severity_drops_negative_reports() {
        let mut report = NewReport {
            building_id: "b".to_string(),
            unit: None,
            has_roaches: false,
            severity: Some(Severity::Heavy),
            notes: None,
        };
        assert_eq!(report.stored_severity(), None);

        report.has_roaches = true;
        assert_eq!(report.stored_severity(), Some(Severity::Heavy));
    }
}
