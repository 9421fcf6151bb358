#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Address geocoding and autocomplete for roach reports.
//!
//! Buildings submitted without coordinates are geocoded through
//! **Nominatim / OpenStreetMap** before they are stored. The same provider
//! backs the address autocomplete used while typing a building address.
//!
//! The provider is configured by a TOML file (see [`config`]); the
//! embedded default lives in `services/nominatim.toml`. Autocomplete
//! session bookkeeping is an explicit [`autocomplete::AutocompleteSession`]
//! value owned by the caller.

pub mod address;
pub mod autocomplete;
pub mod config;
pub mod nominatim;

use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;

use crate::autocomplete::{AutocompleteSession, QueryDecision};
use crate::config::GeocoderConfig;

/// A geocoding result with coordinates and metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedAddress {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// The matched/canonical address returned by the geocoder.
    pub matched_address: Option<String>,
}

/// An address to be geocoded, with all available context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressInput {
    /// Street address (e.g., "100 N State St").
    pub street: String,
    /// City name.
    pub city: Option<String>,
    /// State abbreviation.
    pub state: Option<String>,
    /// ZIP code, if available.
    pub zip: Option<String>,
}

/// One autocomplete suggestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    /// Display label for the suggestion.
    pub label: String,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
}

/// Suggestions for one keystroke of an autocomplete session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutocompleteResponse {
    /// Session token to send with the next keystroke.
    pub session_token: String,
    /// Matching addresses; empty when the query was skipped.
    pub suggestions: Vec<Suggestion>,
}

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// The geocoder is turned off in its configuration.
    #[error("Geocoding is disabled")]
    Disabled,

    /// The configuration file could not be read or parsed.
    #[error("Config error: {message}")]
    Config {
        /// Description of the configuration problem.
        message: String,
    },
}

/// Nominatim client bound to one configuration.
#[derive(Debug, Clone)]
pub struct Geocoder {
    client: reqwest::Client,
    config: GeocoderConfig,
}

impl Geocoder {
    /// Builds an HTTP client with the configured user agent and timeout.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn new(config: GeocoderConfig) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    /// The configuration this geocoder was built with.
    #[must_use]
    pub const fn config(&self) -> &GeocoderConfig {
        &self.config
    }

    /// Whether requests will be sent at all.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Geocodes a street address.
    ///
    /// Tries a structured search on the cleaned street first, then falls
    /// back to a free-form search on the one-line address.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the geocoder is disabled, the HTTP
    /// request fails, or the response cannot be parsed.
    pub async fn geocode(
        &self,
        input: &AddressInput,
    ) -> Result<Option<GeocodedAddress>, GeocodeError> {
        if !self.config.enabled {
            return Err(GeocodeError::Disabled);
        }

        let street = address::strip_unit(&input.street);
        if street.is_empty() {
            return Ok(None);
        }

        let structured = AddressInput {
            street,
            ..input.clone()
        };

        if let Some(found) =
            nominatim::geocode_structured(&self.client, &self.config, &structured).await?
        {
            return Ok(Some(found));
        }

        let one_line = address::one_line(&structured);
        log::debug!("Structured geocode missed, trying free-form: {one_line}");
        nominatim::geocode_freeform(&self.client, &self.config, &one_line).await
    }

    /// Returns address suggestions for the text typed so far.
    ///
    /// The session decides whether a request is sent at all: queries that
    /// are too short, unchanged, or arrive inside the debounce window
    /// return no suggestions without touching the network.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the geocoder is disabled, the HTTP
    /// request fails, or the response cannot be parsed.
    pub async fn autocomplete(
        &self,
        session: &mut AutocompleteSession,
        input: &str,
    ) -> Result<AutocompleteResponse, GeocodeError> {
        if !self.config.enabled {
            return Err(GeocodeError::Disabled);
        }

        let now = Instant::now();
        let query = match session.decide(input, now, &self.config) {
            QueryDecision::Query(query) => query,
            decision => {
                log::trace!(
                    "Autocomplete session {} skipped: {decision:?}",
                    session.token()
                );
                return Ok(AutocompleteResponse {
                    session_token: session.token().to_string(),
                    suggestions: Vec::new(),
                });
            }
        };

        session.record(&query, now);

        let suggestions = nominatim::search_suggestions(
            &self.client,
            &self.config,
            &query,
            self.config.autocomplete_limit,
        )
        .await?;

        Ok(AutocompleteResponse {
            session_token: session.token().to_string(),
            suggestions,
        })
    }
}
