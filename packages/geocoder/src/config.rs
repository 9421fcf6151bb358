//! Geocoder configuration loaded from TOML.
//!
//! The default configuration is embedded at compile time from
//! `services/nominatim.toml`. Deployments can point `GEOCODER_CONFIG` at
//! another file, e.g. to use a self-hosted Nominatim instance.

use std::path::Path;

use serde::Deserialize;

use crate::GeocodeError;

const EMBEDDED_TOML: &str = include_str!("../services/nominatim.toml");

/// Nominatim provider settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeocoderConfig {
    /// Unique identifier (e.g., `"nominatim"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Whether requests are sent at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Search endpoint (e.g., `"https://nominatim.openstreetmap.org/search"`).
    pub base_url: String,
    /// `User-Agent` header. The public Nominatim instance rejects requests
    /// without an identifying agent.
    pub user_agent: String,
    /// Comma-separated ISO country codes to restrict results to.
    #[serde(default)]
    pub country_codes: Option<String>,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum suggestions per autocomplete request.
    #[serde(default = "default_autocomplete_limit")]
    pub autocomplete_limit: u32,
    /// Minimum trimmed input length before suggestions are requested.
    #[serde(default = "default_autocomplete_min_chars")]
    pub autocomplete_min_chars: usize,
    /// Minimum gap between two upstream requests in one session.
    #[serde(default = "default_autocomplete_debounce_ms")]
    pub autocomplete_debounce_ms: u64,
}

const fn default_true() -> bool {
    true
}

const fn default_timeout_ms() -> u64 {
    5000
}

const fn default_autocomplete_limit() -> u32 {
    5
}

const fn default_autocomplete_min_chars() -> usize {
    3
}

const fn default_autocomplete_debounce_ms() -> u64 {
    300
}

impl GeocoderConfig {
    /// Returns the embedded default configuration.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed (this is a compile-time
    /// guarantee since the config is embedded).
    #[must_use]
    pub fn embedded() -> Self {
        Self::from_toml_str(EMBEDDED_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse embedded geocoder config: {e}"))
    }

    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Config`] if the TOML is invalid or a
    /// required field is missing.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, GeocodeError> {
        toml::de::from_str(toml_str).map_err(|e| GeocodeError::Config {
            message: e.to_string(),
        })
    }

    /// Loads the configuration from `path`, or the embedded default when
    /// `path` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Config`] if the file cannot be read or
    /// parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, GeocodeError> {
        let Some(path) = path else {
            return Ok(Self::embedded());
        };

        let contents = std::fs::read_to_string(path).map_err(|e| GeocodeError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;

        let config = Self::from_toml_str(&contents)?;
        log::info!(
            "Loaded geocoder config '{}' from {}",
            config.id,
            path.display()
        );
        Ok(config)
    }
}
