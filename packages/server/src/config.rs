//! Server settings read from the environment at startup.

use std::path::PathBuf;
use std::str::FromStr;

use roach_reports_database::paths;

/// Runtime settings for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to bind (`BIND_ADDR`, default `127.0.0.1`).
    pub bind_addr: String,
    /// Port to listen on (`PORT`, default 8080).
    pub port: u16,
    /// `SQLite` file (`DATABASE_PATH`, default `data/roach_reports.db`).
    pub database_path: PathBuf,
    /// Geocoder TOML override (`GEOCODER_CONFIG`).
    pub geocoder_config: Option<PathBuf>,
    /// Whether to build a geocoder at all (`GEOCODING_ENABLED`, default true).
    pub geocoding_enabled: bool,
}

impl ServerConfig {
    /// Reads every setting from the environment, falling back to defaults
    /// for unset or unparsable values.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_or("PORT", 8080),
            database_path: paths::db_path_from_env(),
            geocoder_config: std::env::var("GEOCODER_CONFIG")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            geocoding_enabled: std::env::var("GEOCODING_ENABLED")
                .map_or(true, |v| parse_flag(&v).unwrap_or(true)),
        }
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Invalid {key} value '{raw}', using default");
            default
        }),
        Err(_) => default,
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
