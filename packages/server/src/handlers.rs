//! HTTP handler functions for the roach reports API.

use actix_web::{HttpResponse, web};
use roach_reports_analytics::aggregate;
use roach_reports_database::queries;
use roach_reports_database_models::{BuildingRow, Coordinates, NewBuilding, NewReport};
use roach_reports_geocoder::AddressInput;
use roach_reports_geocoder::autocomplete::AutocompleteSession;
use roach_reports_server_models::requests::{
    AutocompleteQueryParams, CreateBuildingBody, CreateReportBody, CreateReportImageBody,
    NearbyQueryParams, NearbyRequest, SearchQueryParams, SearchRequest,
};
use roach_reports_server_models::{
    ApiBuilding, ApiBuildingDetail, ApiBuildingSummary, ApiHealth, ApiReport, ApiReportImage,
};
use roach_reports_spatial::{MAX_NEARBY_RESULTS, NearbySearch};
use switchy_database::Database;

use crate::AppState;
use crate::error::ApiError;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/buildings/nearby`
///
/// Buildings inside the bounding box around `lat`/`lng`, each with its
/// report stats.
pub async fn nearby_buildings(
    state: web::Data<AppState>,
    params: web::Query<NearbyQueryParams>,
) -> Result<HttpResponse, ApiError> {
    let request = NearbyRequest::try_from(params.into_inner())?;
    let search = NearbySearch::new(request.lat, request.lng, request.radius)?;

    let candidates =
        queries::buildings_in_bbox(state.db.as_ref(), &search.bounding_box(), MAX_NEARBY_RESULTS)
            .await?;
    let buildings = search.filter(candidates);

    let center = search.center();
    log::debug!(
        "Nearby search at ({}, {}) r={}m matched {} buildings",
        center.latitude,
        center.longitude,
        search.radius_meters(),
        buildings.len()
    );

    let summaries = summarize(state.db.as_ref(), buildings).await?;
    Ok(HttpResponse::Ok().json(summaries))
}

/// `GET /api/buildings/search`
pub async fn search_buildings(
    state: web::Data<AppState>,
    params: web::Query<SearchQueryParams>,
) -> Result<HttpResponse, ApiError> {
    let request = SearchRequest::try_from(params.into_inner())?;

    let buildings = queries::search_buildings(state.db.as_ref(), &request.q, request.limit).await?;
    let summaries = summarize(state.db.as_ref(), buildings).await?;
    Ok(HttpResponse::Ok().json(summaries))
}

/// `GET /api/buildings/{id}`
///
/// The building with every report (newest first) and aggregated stats.
pub async fn building_detail(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    let fetched = queries::get_building_with_reports(state.db.as_ref(), &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Building not found: {id}")))?;

    let stats = aggregate(&fetched.reports);
    Ok(HttpResponse::Ok().json(ApiBuildingDetail::new(fetched, stats)))
}

/// `POST /api/buildings`
///
/// Geocodes the address when no coordinates were supplied. A failed
/// lookup is logged and the building is stored without coordinates.
pub async fn create_building(
    state: web::Data<AppState>,
    body: web::Json<CreateBuildingBody>,
) -> Result<HttpResponse, ApiError> {
    let mut building = NewBuilding::try_from(body.into_inner())?;

    if building.coordinates.is_none() {
        building.coordinates = geocode_building(&state, &building).await;
    }

    let row = queries::insert_building(state.db.as_ref(), &building).await?;
    log::info!("Created building {} at {}", row.id, row.address);

    Ok(HttpResponse::Created().json(ApiBuilding::from(row)))
}

/// `POST /api/reports`
pub async fn create_report(
    state: web::Data<AppState>,
    body: web::Json<CreateReportBody>,
) -> Result<HttpResponse, ApiError> {
    let report = NewReport::try_from(body.into_inner())?;

    if queries::get_building(state.db.as_ref(), &report.building_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound(format!(
            "Building not found: {}",
            report.building_id
        )));
    }

    let row = queries::insert_report(state.db.as_ref(), &report).await?;
    log::info!("Created report {} for building {}", row.id, row.building_id);

    Ok(HttpResponse::Created().json(ApiReport::from(row)))
}

/// `POST /api/reports/{id}/images`
pub async fn create_report_image(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<CreateReportImageBody>,
) -> Result<HttpResponse, ApiError> {
    let report_id = path.into_inner();
    let image = body.into_inner().validate(&report_id)?;

    if queries::get_report(state.db.as_ref(), &report_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound(format!("Report not found: {report_id}")));
    }

    let row = queries::insert_report_image(state.db.as_ref(), &image).await?;
    Ok(HttpResponse::Created().json(ApiReportImage::from(row)))
}

/// `GET /api/geocode/autocomplete`
///
/// Address suggestions for the text typed so far. The session token is
/// echoed back so the client can reuse it for the next keystroke.
pub async fn autocomplete(
    state: web::Data<AppState>,
    params: web::Query<AutocompleteQueryParams>,
) -> Result<HttpResponse, ApiError> {
    let geocoder = state.geocoder.as_ref().ok_or(ApiError::GeocoderDisabled)?;
    let params = params.into_inner();

    let mut session = AutocompleteSession::resume_or_new(params.session.as_deref());
    let response = geocoder
        .autocomplete(&mut session, params.q.as_deref().unwrap_or_default())
        .await?;

    Ok(HttpResponse::Ok().json(response))
}

/// Attaches report stats to each building, keeping the input order.
async fn summarize(
    db: &dyn Database,
    buildings: Vec<BuildingRow>,
) -> Result<Vec<ApiBuildingSummary>, ApiError> {
    let ids: Vec<String> = buildings.iter().map(|b| b.id.clone()).collect();
    let mut reports = queries::reports_for_buildings(db, &ids).await?;

    Ok(buildings
        .into_iter()
        .map(|building| {
            let stats = aggregate(reports.remove(&building.id).unwrap_or_default());
            ApiBuildingSummary {
                building: building.into(),
                stats,
            }
        })
        .collect())
}

async fn geocode_building(state: &AppState, building: &NewBuilding) -> Option<Coordinates> {
    let geocoder = state.geocoder.as_ref().filter(|g| g.is_enabled())?;

    let input = AddressInput {
        street: building.address.clone(),
        city: building.city.clone(),
        state: building.state.clone(),
        zip: building.zip.clone(),
    };

    match geocoder.geocode(&input).await {
        Ok(Some(found)) => Some(Coordinates {
            latitude: found.latitude,
            longitude: found.longitude,
        }),
        Ok(None) => {
            log::info!("No geocoding match for '{}'", building.address);
            None
        }
        Err(e) => {
            log::warn!(
                "Geocoding '{}' failed, storing without coordinates: {e}",
                building.address
            );
            None
        }
    }
}
