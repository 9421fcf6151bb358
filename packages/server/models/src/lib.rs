#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the roach reports server.
//!
//! Responses are serialized to camelCase JSON. They are separate from the
//! database row types to allow independent evolution of the API contract.
//! Request bodies and query strings are deserialized into the raw types in
//! [`requests`] and then validated into database insert payloads.

pub mod requests;

use chrono::{DateTime, Utc};
use roach_reports_analytics_models::BuildingStats;
use roach_reports_database_models::{
    BuildingRow, BuildingWithReports, ReportImageRow, ReportRow, ReportWithImages,
};
use roach_reports_report_models::Severity;
use serde::{Deserialize, Serialize};

/// A building as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiBuilding {
    /// Unique building ID.
    pub id: String,
    /// Street address.
    pub address: String,
    /// City.
    pub city: Option<String>,
    /// State abbreviation.
    pub state: Option<String>,
    /// ZIP code.
    pub zip: Option<String>,
    /// Latitude.
    pub latitude: Option<f64>,
    /// Longitude.
    pub longitude: Option<f64>,
    /// When the building was submitted (ISO 8601).
    pub created_at: DateTime<Utc>,
}

impl From<BuildingRow> for ApiBuilding {
    fn from(row: BuildingRow) -> Self {
        Self {
            id: row.id,
            address: row.address,
            city: row.city,
            state: row.state,
            zip: row.zip,
            latitude: row.latitude,
            longitude: row.longitude,
            created_at: row.created_at,
        }
    }
}

/// A building with its report stats, as shown in search and map results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiBuildingSummary {
    /// The building.
    #[serde(flatten)]
    pub building: ApiBuilding,
    /// Aggregated report stats.
    pub stats: BuildingStats,
}

/// A building with every report and the aggregated stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiBuildingDetail {
    /// The building.
    #[serde(flatten)]
    pub building: ApiBuilding,
    /// Reports, newest first.
    pub reports: Vec<ApiReport>,
    /// Aggregated report stats.
    pub stats: BuildingStats,
}

impl ApiBuildingDetail {
    /// Builds the detail response from a fetched building and its stats.
    #[must_use]
    pub fn new(fetched: BuildingWithReports, stats: BuildingStats) -> Self {
        Self {
            building: fetched.building.into(),
            reports: fetched.reports.into_iter().map(ApiReport::from).collect(),
            stats,
        }
    }
}

/// A report as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiReport {
    /// Unique report ID.
    pub id: String,
    /// Building the report was filed against.
    pub building_id: String,
    /// Apartment or unit label.
    pub unit: Option<String>,
    /// Whether roaches were seen.
    pub has_roaches: bool,
    /// Severity (1-5), only for positive reports.
    pub severity: Option<Severity>,
    /// Free-text notes.
    pub notes: Option<String>,
    /// When the report was submitted (ISO 8601).
    pub created_at: DateTime<Utc>,
    /// Attached photos.
    pub images: Vec<ApiReportImage>,
}

impl From<ReportRow> for ApiReport {
    fn from(row: ReportRow) -> Self {
        Self {
            id: row.id,
            building_id: row.building_id,
            unit: row.unit,
            has_roaches: row.has_roaches,
            severity: row.severity,
            notes: row.notes,
            created_at: row.created_at,
            images: Vec::new(),
        }
    }
}

impl From<ReportWithImages> for ApiReport {
    fn from(value: ReportWithImages) -> Self {
        Self {
            images: value.images.into_iter().map(ApiReportImage::from).collect(),
            ..value.report.into()
        }
    }
}

/// A report photo as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiReportImage {
    /// Unique image ID.
    pub id: String,
    /// Report the image belongs to.
    pub report_id: String,
    /// Public image URL.
    pub image_url: String,
    /// When the image was attached (ISO 8601).
    pub created_at: DateTime<Utc>,
}

impl From<ReportImageRow> for ApiReportImage {
    fn from(row: ReportImageRow) -> Self {
        Self {
            id: row.id,
            report_id: row.report_id,
            image_url: row.image_url,
            created_at: row.created_at,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Human-readable error message.
    pub error: String,
}
