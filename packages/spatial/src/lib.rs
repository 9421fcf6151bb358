#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Nearby-building search by bounding box.
//!
//! A circular search radius is approximated by a latitude/longitude box
//! using the equirectangular approximation: one degree of latitude is
//! taken as 111 km, and a degree of longitude shrinks with the cosine of
//! the center latitude. The approximation is good at city scale in
//! mid-latitudes and breaks down near the poles, where the longitude delta
//! diverges, so centers within 0.1 degree of a pole are rejected.
//!
//! The box does not wrap across the antimeridian.

use roach_reports_database_models::{BoundingBox, BuildingRow, Coordinates};
use thiserror::Error;

/// Meters per degree of latitude.
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// Radius used when the caller does not provide one.
pub const DEFAULT_RADIUS_METERS: f64 = 1000.0;

/// Most buildings a nearby search returns. Callers needing more must
/// narrow the radius.
pub const MAX_NEARBY_RESULTS: usize = 100;

/// Centers at or beyond this absolute latitude are rejected.
pub const MAX_CENTER_LATITUDE: f64 = 89.9;

/// Errors from building a nearby search.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpatialError {
    /// A coordinate or radius was missing, out of range, or not finite.
    #[error("{0}")]
    InvalidArgument(String),
}

/// Anything with optional coordinates that can be tested against a box.
pub trait Located {
    /// The item's coordinates, or `None` if it was never geocoded.
    fn coordinates(&self) -> Option<Coordinates>;
}

impl Located for BuildingRow {
    fn coordinates(&self) -> Option<Coordinates> {
        Self::coordinates(self)
    }
}

impl Located for Coordinates {
    fn coordinates(&self) -> Option<Coordinates> {
        Some(*self)
    }
}

/// A validated center point and radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbySearch {
    center: Coordinates,
    radius_meters: f64,
    bbox: BoundingBox,
}

impl NearbySearch {
    /// Validates the center and radius and precomputes the bounding box.
    ///
    /// `radius_meters` defaults to [`DEFAULT_RADIUS_METERS`].
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::InvalidArgument`] if a coordinate is not
    /// finite or out of range, the center is within 0.1 degree of a pole,
    /// or the radius is not a positive finite number.
    pub fn new(
        center_lat: f64,
        center_lng: f64,
        radius_meters: Option<f64>,
    ) -> Result<Self, SpatialError> {
        if !center_lat.is_finite() || !(-90.0..=90.0).contains(&center_lat) {
            return Err(SpatialError::InvalidArgument(format!(
                "lat must be between -90 and 90, got {center_lat}"
            )));
        }
        if !center_lng.is_finite() || !(-180.0..=180.0).contains(&center_lng) {
            return Err(SpatialError::InvalidArgument(format!(
                "lng must be between -180 and 180, got {center_lng}"
            )));
        }
        if center_lat.abs() >= MAX_CENTER_LATITUDE {
            return Err(SpatialError::InvalidArgument(format!(
                "lat {center_lat} is too close to a pole for a radius search"
            )));
        }

        let radius_meters = radius_meters.unwrap_or(DEFAULT_RADIUS_METERS);
        if !radius_meters.is_finite() || radius_meters <= 0.0 {
            return Err(SpatialError::InvalidArgument(format!(
                "radius must be a positive number of meters, got {radius_meters}"
            )));
        }

        let lat_delta = radius_meters / METERS_PER_DEGREE;
        let lng_delta = radius_meters / (METERS_PER_DEGREE * center_lat.to_radians().cos());

        let bbox = BoundingBox::new(
            center_lng - lng_delta,
            center_lat - lat_delta,
            center_lng + lng_delta,
            center_lat + lat_delta,
        );

        log::trace!("Nearby search ({center_lat}, {center_lng}) r={radius_meters}m -> {bbox:?}");

        Ok(Self {
            center: Coordinates {
                latitude: center_lat,
                longitude: center_lng,
            },
            radius_meters,
            bbox,
        })
    }

    /// The search center.
    #[must_use]
    pub const fn center(&self) -> Coordinates {
        self.center
    }

    /// The search radius in meters.
    #[must_use]
    pub const fn radius_meters(&self) -> f64 {
        self.radius_meters
    }

    /// The bounding box approximating the search circle.
    #[must_use]
    pub const fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }

    /// Half-height of the box in degrees of latitude.
    #[must_use]
    pub fn lat_delta(&self) -> f64 {
        (self.bbox.north - self.bbox.south) / 2.0
    }

    /// Half-width of the box in degrees of longitude.
    #[must_use]
    pub fn lng_delta(&self) -> f64 {
        (self.bbox.east - self.bbox.west) / 2.0
    }

    /// Whether an item falls inside the box. Items without coordinates
    /// never match.
    #[must_use]
    pub fn matches<T: Located + ?Sized>(&self, item: &T) -> bool {
        item.coordinates()
            .is_some_and(|c| self.bbox.contains(c.latitude, c.longitude))
    }

    /// Keeps the items inside the box, in their original order, up to
    /// [`MAX_NEARBY_RESULTS`].
    #[must_use]
    pub fn filter<T, I>(&self, items: I) -> Vec<T>
    where
        T: Located,
        I: IntoIterator<Item = T>,
    {
        items
            .into_iter()
            .filter(|item| self.matches(item))
            .take(MAX_NEARBY_RESULTS)
            .collect()
    }
}
