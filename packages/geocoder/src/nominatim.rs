//! Nominatim / OpenStreetMap geocoder client.
//!
//! The public instance allows at most **1 request per second** and
//! requires an identifying `User-Agent`; both are the caller's
//! responsibility (see [`crate::config::GeocoderConfig`]).
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use crate::config::GeocoderConfig;
use crate::{AddressInput, GeocodeError, GeocodedAddress, Suggestion};

/// Geocodes a single address using the Nominatim structured search
/// endpoint.
///
/// # Errors
///
/// Returns [`GeocodeError`] if the HTTP request or response parsing fails.
pub async fn geocode_structured(
    client: &reqwest::Client,
    config: &GeocoderConfig,
    input: &AddressInput,
) -> Result<Option<GeocodedAddress>, GeocodeError> {
    let mut params = vec![("street", input.street.clone())];
    if let Some(city) = &input.city {
        params.push(("city", city.clone()));
    }
    if let Some(state) = &input.state {
        params.push(("state", state.clone()));
    }
    if let Some(zip) = &input.zip {
        params.push(("postalcode", zip.clone()));
    }
    params.push(("limit", "1".to_string()));

    let body = search(client, config, params).await?;
    parse_response(&body)
}

/// Geocodes a free-form query (e.g. a one-line address).
///
/// # Errors
///
/// Returns [`GeocodeError`] if the HTTP request or response parsing fails.
pub async fn geocode_freeform(
    client: &reqwest::Client,
    config: &GeocoderConfig,
    query: &str,
) -> Result<Option<GeocodedAddress>, GeocodeError> {
    let body = search(
        client,
        config,
        vec![("q", query.to_string()), ("limit", "1".to_string())],
    )
    .await?;
    parse_response(&body)
}

/// Fetches up to `limit` address suggestions for a partial query.
///
/// # Errors
///
/// Returns [`GeocodeError`] if the HTTP request or response parsing fails.
pub async fn search_suggestions(
    client: &reqwest::Client,
    config: &GeocoderConfig,
    query: &str,
    limit: u32,
) -> Result<Vec<Suggestion>, GeocodeError> {
    let body = search(
        client,
        config,
        vec![("q", query.to_string()), ("limit", limit.to_string())],
    )
    .await?;
    parse_suggestions(&body)
}

async fn search(
    client: &reqwest::Client,
    config: &GeocoderConfig,
    mut params: Vec<(&str, String)>,
) -> Result<serde_json::Value, GeocodeError> {
    params.push(("format", "jsonv2".to_string()));
    if let Some(codes) = &config.country_codes {
        params.push(("countrycodes", codes.clone()));
    }

    let resp = client.get(&config.base_url).query(&params).send().await?;

    if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(GeocodeError::RateLimited);
    }

    let resp = resp.error_for_status()?;
    Ok(resp.json().await?)
}

/// Parses a Nominatim search response, keeping the first result.
fn parse_response(body: &serde_json::Value) -> Result<Option<GeocodedAddress>, GeocodeError> {
    let results = as_results(body)?;

    let Some(first) = results.first() else {
        return Ok(None);
    };

    let (latitude, longitude) = parse_lat_lon(first)?;

    Ok(Some(GeocodedAddress {
        latitude,
        longitude,
        matched_address: first["display_name"].as_str().map(String::from),
    }))
}

/// Parses a Nominatim search response into suggestions. Entries without a
/// display name are skipped.
fn parse_suggestions(body: &serde_json::Value) -> Result<Vec<Suggestion>, GeocodeError> {
    let results = as_results(body)?;

    let mut suggestions = Vec::with_capacity(results.len());
    for entry in results {
        let Some(label) = entry["display_name"].as_str() else {
            continue;
        };
        let (latitude, longitude) = parse_lat_lon(entry)?;
        suggestions.push(Suggestion {
            label: label.to_string(),
            latitude,
            longitude,
        });
    }

    Ok(suggestions)
}

fn as_results(body: &serde_json::Value) -> Result<&Vec<serde_json::Value>, GeocodeError> {
    body.as_array().ok_or_else(|| GeocodeError::Parse {
        message: "Nominatim response is not an array".to_string(),
    })
}

/// Nominatim returns coordinates as strings.
fn parse_lat_lon(entry: &serde_json::Value) -> Result<(f64, f64), GeocodeError> {
    let lat = entry["lat"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| GeocodeError::Parse {
            message: "Missing lat in Nominatim response".to_string(),
        })?;

    let lon = entry["lon"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| GeocodeError::Parse {
            message: "Missing lon in Nominatim response".to_string(),
        })?;

    Ok((lat, lon))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nominatim_result() {
        let body = serde_json::json!([{
            "lat": "40.7128",
            "lon": "-74.0060",
            "display_name": "City Hall, New York, NY, USA"
        }]);
        let result = parse_response(&body).unwrap().unwrap();
        assert!((result.latitude - 40.7128).abs() < 1e-4);
        assert!((result.longitude - -74.0060).abs() < 1e-4);
        assert_eq!(
            result.matched_address.as_deref(),
            Some("City Hall, New York, NY, USA")
        );
    }

    #[test]
    fn parses_nominatim_empty() {
        let body = serde_json::json!([]);
        assert!(parse_response(&body).unwrap().is_none());
        assert!(parse_suggestions(&body).unwrap().is_empty());
    }

    #[test]
    fn rejects_non_array_body() {
        let body = serde_json::json!({"error": "bad request"});
        assert!(matches!(
            parse_response(&body),
            Err(GeocodeError::Parse { .. })
        ));
    }

    #[test]
    fn rejects_missing_coordinates() {
        let body = serde_json::json!([{ "display_name": "Somewhere", "lat": "1.0" }]);
        assert!(parse_response(&body).is_err());
    }

    #[test]
    fn parses_suggestions_skipping_unlabeled() {
        let body = serde_json::json!([
            { "lat": "41.88", "lon": "-87.62", "display_name": "100 N State St, Chicago" },
            { "lat": "41.00", "lon": "-87.00" },
            { "lat": "41.89", "lon": "-87.63", "display_name": "100 W State St, Chicago" }
        ]);
        let suggestions = parse_suggestions(&body).unwrap();
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].label, "100 N State St, Chicago");
        assert!((suggestions[1].latitude - 41.89).abs() < 1e-9);
    }
}
