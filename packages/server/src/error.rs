//! Mapping of domain errors onto HTTP responses.
//!
//! Every error body has the shape `{"error": "<message>"}`.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use roach_reports_database::DbError;
use roach_reports_geocoder::GeocodeError;
use roach_reports_server_models::ApiErrorBody;
use roach_reports_server_models::requests::ValidationError;
use roach_reports_spatial::SpatialError;

/// Errors returned by request handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request was malformed or out of range.
    #[error("{0}")]
    InvalidArgument(String),

    /// The requested entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The database failed.
    #[error("{0}")]
    Store(#[from] DbError),

    /// The geocoding provider failed.
    #[error("{0}")]
    Geocoder(GeocodeError),

    /// Geocoding is turned off for this deployment.
    #[error("Geocoding is disabled")]
    GeocoderDisabled,
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::InvalidArgument(e.to_string())
    }
}

impl From<SpatialError> for ApiError {
    fn from(e: SpatialError) -> Self {
        match e {
            SpatialError::InvalidArgument(message) => Self::InvalidArgument(message),
        }
    }
}

impl From<GeocodeError> for ApiError {
    fn from(e: GeocodeError) -> Self {
        match e {
            GeocodeError::Disabled => Self::GeocoderDisabled,
            other => Self::Geocoder(other),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Geocoder(_) => StatusCode::BAD_GATEWAY,
            Self::GeocoderDisabled => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Self::Store(e) => log::error!("Store failure: {e}"),
            Self::Geocoder(e) => log::error!("Geocoder failure: {e}"),
            _ => {}
        }

        HttpResponse::build(self.status_code()).json(ApiErrorBody {
            error: self.to_string(),
        })
    }
}
