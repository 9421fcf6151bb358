#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for roach reports.
//!
//! Serves the REST API for searching buildings, viewing aggregated report
//! stats, and submitting reports with photos. Data lives in a single
//! `SQLite` file; address geocoding and autocomplete go through Nominatim
//! when enabled.

pub mod config;
pub mod error;
mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use roach_reports_database::db;
use roach_reports_geocoder::Geocoder;
use roach_reports_geocoder::config::GeocoderConfig;
use switchy_database::Database;

use crate::config::ServerConfig;
use crate::error::ApiError;

/// Shared application state.
pub struct AppState {
    /// `SQLite` database holding buildings, reports, and images.
    pub db: Arc<dyn Database>,
    /// Nominatim client. `None` when geocoding is turned off.
    pub geocoder: Option<Arc<Geocoder>>,
}

/// Registers the `/api` scope with every route.
///
/// Extractor failures (malformed JSON, unknown body fields) are reported
/// with the same `{"error": ...}` body as every other error.
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::InvalidArgument(err.to_string()).into());
    let query_config = web::QueryConfig::default()
        .error_handler(|err, _req| ApiError::InvalidArgument(err.to_string()).into());

    cfg.service(
        web::scope("/api")
            .app_data(json_config)
            .app_data(query_config)
            .route("/health", web::get().to(handlers::health))
            .route("/buildings", web::post().to(handlers::create_building))
            .route("/buildings/nearby", web::get().to(handlers::nearby_buildings))
            .route("/buildings/search", web::get().to(handlers::search_buildings))
            .route("/buildings/{id}", web::get().to(handlers::building_detail))
            .route("/reports", web::post().to(handlers::create_report))
            .route(
                "/reports/{id}/images",
                web::post().to(handlers::create_report_image),
            )
            .route(
                "/geocode/autocomplete",
                web::get().to(handlers::autocomplete),
            ),
    );
}

/// Builds the geocoder from `GEOCODER_CONFIG` (or the embedded default),
/// unless geocoding is turned off.
fn build_geocoder(config: &ServerConfig) -> std::io::Result<Option<Arc<Geocoder>>> {
    if !config.geocoding_enabled {
        log::info!("Geocoding disabled by GEOCODING_ENABLED");
        return Ok(None);
    }

    let geocoder_config = GeocoderConfig::load(config.geocoder_config.as_deref())
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    let geocoder =
        Geocoder::new(geocoder_config).map_err(|e| std::io::Error::other(e.to_string()))?;

    log::info!(
        "Using geocoder '{}' at {}",
        geocoder.config().name,
        geocoder.config().base_url
    );
    Ok(Some(Arc::new(geocoder)))
}

/// Starts the roach reports API server.
///
/// Reads [`ServerConfig`] from the environment, opens the database
/// (creating the schema if needed), builds the geocoder, and starts the
/// Actix-Web HTTP server. The caller provides the async runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the database cannot be opened,
/// the geocoder configuration is invalid, or the HTTP server fails to bind
/// or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = ServerConfig::from_env();

    log::info!("Opening database at {}...", config.database_path.display());
    let db_conn = db::open(&config.database_path)
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    let geocoder = build_geocoder(&config)?;

    let state = web::Data::new(AppState {
        db: Arc::from(db_conn),
        geocoder,
    });

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.bind_addr.clone(), config.port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use roach_reports_server_models::ApiErrorBody;
    use serde_json::{Value, json};
    use std::path::PathBuf;

    async fn state_with_geocoder(
        geocoder: Option<Arc<Geocoder>>,
    ) -> (web::Data<AppState>, PathBuf) {
        let path = std::env::temp_dir().join(format!(
            "roach_reports_server_test_{}.db",
            uuid::Uuid::new_v4()
        ));
        let db = db::open(&path).await.unwrap();
        let state = web::Data::new(AppState {
            db: Arc::from(db),
            geocoder,
        });
        (state, path)
    }

    async fn state() -> (web::Data<AppState>, PathBuf) {
        state_with_geocoder(None).await
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(App::new().app_data($state.clone()).configure(configure)).await
        };
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let (state, path) = state().await;
        let app = app!(state);

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["healthy"], true);

        let _ = std::fs::remove_file(path);
    }

    #[actix_web::test]
    async fn nearby_without_lat_is_bad_request() {
        let (state, path) = state().await;
        let app = app!(state);

        let req = test::TestRequest::get()
            .uri("/api/buildings/nearby?lng=-74.0")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: ApiErrorBody = test::read_body_json(resp).await;
        assert_eq!(body.error, "lat and lng are required");

        let _ = std::fs::remove_file(path);
    }

    #[actix_web::test]
    async fn nearby_near_pole_is_bad_request() {
        let (state, path) = state().await;
        let app = app!(state);

        let req = test::TestRequest::get()
            .uri("/api/buildings/nearby?lat=89.95&lng=0")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let _ = std::fs::remove_file(path);
    }

    #[actix_web::test]
    async fn unknown_building_is_not_found() {
        let (state, path) = state().await;
        let app = app!(state);

        let req = test::TestRequest::get()
            .uri("/api/buildings/does-not-exist")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: ApiErrorBody = test::read_body_json(resp).await;
        assert!(body.error.contains("does-not-exist"));

        let _ = std::fs::remove_file(path);
    }

    #[actix_web::test]
    async fn report_for_unknown_building_is_not_found() {
        let (state, path) = state().await;
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/reports")
            .set_json(json!({ "building_id": "nope", "has_roaches": true, "severity": 2 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let _ = std::fs::remove_file(path);
    }

    #[actix_web::test]
    async fn unknown_body_field_is_bad_request() {
        let (state, path) = state().await;
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/buildings")
            .set_json(json!({ "address": "1 Main St", "landlord": "someone" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: ApiErrorBody = test::read_body_json(resp).await;
        assert!(!body.error.is_empty());

        let _ = std::fs::remove_file(path);
    }

    #[actix_web::test]
    async fn autocomplete_without_geocoder_is_unavailable() {
        let (state, path) = state().await;
        let app = app!(state);

        let req = test::TestRequest::get()
            .uri("/api/geocode/autocomplete?q=100+Main")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

        let _ = std::fs::remove_file(path);
    }

    #[actix_web::test]
    async fn building_detail_carries_computed_stats() {
        let (state, path) = state().await;
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/buildings")
            .set_json(json!({
                "address": "123 Main St",
                "city": "New York",
                "state": "NY",
                "latitude": 40.7128,
                "longitude": -74.0060
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let building: Value = test::read_body_json(resp).await;
        let building_id = building["id"].as_str().unwrap().to_string();

        let reports = [
            json!({ "building_id": building_id, "has_roaches": true, "severity": 4, "unit": "2A" }),
            json!({ "building_id": building_id, "has_roaches": false, "severity": 3 }),
        ];
        let mut report_ids = Vec::new();
        for report in reports {
            let req = test::TestRequest::post()
                .uri("/api/reports")
                .set_json(report)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::CREATED);
            let created: Value = test::read_body_json(resp).await;
            report_ids.push(created["id"].as_str().unwrap().to_string());
        }

        let req = test::TestRequest::post()
            .uri(&format!("/api/reports/{}/images", report_ids[0]))
            .set_json(json!({ "image_url": "https://img.example.com/roach.jpg" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::get()
            .uri(&format!("/api/buildings/{building_id}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let detail: Value = test::read_body_json(resp).await;

        assert_eq!(detail["address"], "123 Main St");
        assert_eq!(detail["stats"]["totalReports"], 2);
        assert_eq!(detail["stats"]["positiveReports"], 1);
        assert_eq!(detail["stats"]["percentPositive"], 50);
        assert_eq!(detail["stats"]["avgSeverity"], 2.0);

        let reports = detail["reports"].as_array().unwrap();
        assert_eq!(reports.len(), 2);
        let negative = reports
            .iter()
            .find(|r| r["hasRoaches"] == false)
            .unwrap();
        assert!(negative["severity"].is_null());
        let positive = reports.iter().find(|r| r["hasRoaches"] == true).unwrap();
        assert_eq!(
            positive["images"][0]["imageUrl"],
            "https://img.example.com/roach.jpg"
        );

        let _ = std::fs::remove_file(path);
    }

    #[actix_web::test]
    async fn nearby_and_search_attach_stats() {
        let (state, path) = state().await;
        let app = app!(state);

        for (address, lat, lng) in [
            ("10 Near St", 40.7130, -74.0055),
            ("20 Far Ave", 40.7400, -74.0055),
        ] {
            let req = test::TestRequest::post()
                .uri("/api/buildings")
                .set_json(json!({ "address": address, "latitude": lat, "longitude": lng }))
                .to_request();
            assert_eq!(
                test::call_service(&app, req).await.status(),
                StatusCode::CREATED
            );
        }
        let req = test::TestRequest::post()
            .uri("/api/buildings")
            .set_json(json!({ "address": "30 Nowhere Rd" }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::CREATED
        );

        let req = test::TestRequest::get()
            .uri("/api/buildings/nearby?lat=40.7128&lng=-74.0060&radius=1000")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let nearby: Value = test::read_body_json(resp).await;
        let nearby = nearby.as_array().unwrap();
        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0]["address"], "10 Near St");
        assert_eq!(nearby[0]["stats"]["totalReports"], 0);

        let req = test::TestRequest::get()
            .uri("/api/buildings/search?q=st")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let found: Value = test::read_body_json(resp).await;
        assert_eq!(found.as_array().unwrap().len(), 1);

        let req = test::TestRequest::get()
            .uri("/api/buildings/search?q=x")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let _ = std::fs::remove_file(path);
    }

    #[actix_web::test]
    async fn unreachable_geocoder_stores_building_without_coordinates() {
        let config = GeocoderConfig {
            base_url: "http://127.0.0.1:9/search".to_string(),
            timeout_ms: 2000,
            ..GeocoderConfig::embedded()
        };
        let geocoder = Geocoder::new(config).unwrap();
        let (state, path) = state_with_geocoder(Some(Arc::new(geocoder))).await;
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/buildings")
            .set_json(json!({ "address": "123 Main St", "city": "New York", "state": "NY" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let building: Value = test::read_body_json(resp).await;
        assert_eq!(building["address"], "123 Main St");
        assert!(building["latitude"].is_null());
        assert!(building["longitude"].is_null());

        let _ = std::fs::remove_file(path);
    }

    #[actix_web::test]
    async fn image_for_unknown_report_is_not_found() {
        let (state, path) = state().await;
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/reports/no-such-report/images")
            .set_json(json!({ "image_url": "https://img.example.com/roach.jpg" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: ApiErrorBody = test::read_body_json(resp).await;
        assert!(body.error.contains("no-such-report"));

        let _ = std::fs::remove_file(path);
    }
}
