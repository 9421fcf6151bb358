//! Raw request parameters and their validated forms.
//!
//! Query strings are taken as optional strings so that a missing or
//! unparsable number produces our own error message instead of the
//! extractor's. Bodies reject unknown fields.

use roach_reports_database_models::{Coordinates, NewBuilding, NewReport, NewReportImage};
use roach_reports_report_models::Severity;
use serde::Deserialize;

/// Default number of search results.
pub const DEFAULT_SEARCH_LIMIT: u32 = 20;

/// Upper bound on search results.
pub const MAX_SEARCH_LIMIT: u32 = 100;

/// Minimum trimmed length of a search query.
pub const MIN_SEARCH_QUERY_CHARS: usize = 2;

/// A request that failed validation. Maps to HTTP 400.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required field is absent or blank.
    #[error("{0}")]
    Missing(String),
    /// A field is present but malformed or out of range.
    #[error("{0}")]
    Invalid(String),
}

/// Query parameters for `GET /api/buildings/nearby`.
#[derive(Debug, Default, Deserialize)]
pub struct NearbyQueryParams {
    /// Center latitude.
    pub lat: Option<String>,
    /// Center longitude.
    pub lng: Option<String>,
    /// Radius in meters.
    pub radius: Option<String>,
}

/// Parsed nearby-search parameters. Range checks happen in the spatial
/// filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyRequest {
    /// Center latitude.
    pub lat: f64,
    /// Center longitude.
    pub lng: f64,
    /// Radius in meters, if given.
    pub radius: Option<f64>,
}

impl TryFrom<NearbyQueryParams> for NearbyRequest {
    type Error = ValidationError;

    fn try_from(params: NearbyQueryParams) -> Result<Self, Self::Error> {
        let (Some(lat), Some(lng)) = (non_blank(params.lat), non_blank(params.lng)) else {
            return Err(ValidationError::Missing(
                "lat and lng are required".to_string(),
            ));
        };

        Ok(Self {
            lat: parse_number("lat", &lat)?,
            lng: parse_number("lng", &lng)?,
            radius: non_blank(params.radius)
                .map(|r| parse_number("radius", &r))
                .transpose()?,
        })
    }
}

/// Query parameters for `GET /api/buildings/search`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQueryParams {
    /// Address substring.
    pub q: Option<String>,
    /// Maximum number of results.
    pub limit: Option<String>,
}

/// Validated search parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Trimmed query.
    pub q: String,
    /// Result limit in `1..=MAX_SEARCH_LIMIT`.
    pub limit: u32,
}

impl TryFrom<SearchQueryParams> for SearchRequest {
    type Error = ValidationError;

    fn try_from(params: SearchQueryParams) -> Result<Self, Self::Error> {
        let q = params.q.as_deref().map(str::trim).unwrap_or_default();
        if q.chars().count() < MIN_SEARCH_QUERY_CHARS {
            return Err(ValidationError::Invalid(format!(
                "q must be at least {MIN_SEARCH_QUERY_CHARS} characters"
            )));
        }

        let limit = match non_blank(params.limit) {
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| ValidationError::Invalid(format!("limit must be an integer: {raw}")))?
                .clamp(1, i64::from(MAX_SEARCH_LIMIT)),
            None => i64::from(DEFAULT_SEARCH_LIMIT),
        };

        Ok(Self {
            q: q.to_string(),
            limit: u32::try_from(limit).unwrap_or(DEFAULT_SEARCH_LIMIT),
        })
    }
}

/// Query parameters for `GET /api/geocode/autocomplete`.
#[derive(Debug, Default, Deserialize)]
pub struct AutocompleteQueryParams {
    /// Text typed so far.
    pub q: Option<String>,
    /// Session token from a previous response.
    pub session: Option<String>,
}

/// Body of `POST /api/buildings`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateBuildingBody {
    /// Street address.
    pub address: Option<String>,
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
}

impl TryFrom<CreateBuildingBody> for NewBuilding {
    type Error = ValidationError;

    fn try_from(body: CreateBuildingBody) -> Result<Self, Self::Error> {
        let address = non_blank(body.address)
            .ok_or_else(|| ValidationError::Missing("address is required".to_string()))?;

        let coordinates = match (body.latitude, body.longitude) {
            (None, None) => None,
            (Some(latitude), Some(longitude)) => {
                if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
                    return Err(ValidationError::Invalid(format!(
                        "latitude must be between -90 and 90: {latitude}"
                    )));
                }
                if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
                    return Err(ValidationError::Invalid(format!(
                        "longitude must be between -180 and 180: {longitude}"
                    )));
                }
                Some(Coordinates {
                    latitude,
                    longitude,
                })
            }
            _ => {
                return Err(ValidationError::Invalid(
                    "latitude and longitude must be provided together".to_string(),
                ));
            }
        };

        Ok(Self {
            address,
            city: non_blank(body.city),
            state: non_blank(body.state),
            zip: non_blank(body.zip),
            coordinates,
        })
    }
}

/// Body of `POST /api/reports`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateReportBody {
    /// Building the report is filed against.
    pub building_id: Option<String>,
    /// Apartment or unit label.
    pub unit: Option<String>,
    /// Whether roaches were seen.
    pub has_roaches: Option<bool>,
    /// Severity 1-5.
    pub severity: Option<i64>,
    /// Free-text notes.
    pub notes: Option<String>,
}

impl TryFrom<CreateReportBody> for NewReport {
    type Error = ValidationError;

    fn try_from(body: CreateReportBody) -> Result<Self, Self::Error> {
        let building_id = non_blank(body.building_id)
            .ok_or_else(|| ValidationError::Missing("building_id is required".to_string()))?;
        let has_roaches = body
            .has_roaches
            .ok_or_else(|| ValidationError::Missing("has_roaches is required".to_string()))?;

        let severity = if has_roaches {
            body.severity
                .map(|value| {
                    Severity::from_i64(value).map_err(|e| ValidationError::Invalid(e.to_string()))
                })
                .transpose()?
        } else {
            None
        };

        Ok(Self {
            building_id,
            unit: non_blank(body.unit),
            has_roaches,
            severity,
            notes: non_blank(body.notes),
        })
    }
}

/// Body of `POST /api/reports/{id}/images`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateReportImageBody {
    /// Public image URL.
    pub image_url: Option<String>,
}

impl CreateReportImageBody {
    /// Validates the body for the report with `report_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the URL is missing or not http(s).
    pub fn validate(self, report_id: &str) -> Result<NewReportImage, ValidationError> {
        let image_url = non_blank(self.image_url)
            .ok_or_else(|| ValidationError::Missing("image_url is required".to_string()))?;

        let lower = image_url.to_ascii_lowercase();
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return Err(ValidationError::Invalid(format!(
                "image_url must be an http or https URL: {image_url}"
            )));
        }

        Ok(NewReportImage {
            report_id: report_id.to_string(),
            image_url,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_number(name: &str, raw: &str) -> Result<f64, ValidationError> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ValidationError::Invalid(format!("{name} must be a number: {raw}")))
}
