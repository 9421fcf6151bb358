//! Query functions for buildings, reports, and report images.
//!
//! All queries go through `query_raw_params()` / `exec_raw_params()` with
//! positional `$n` parameters. Timestamps are stored as fixed-width
//! RFC 3339 text so that lexical order matches chronological order.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use moosicbox_json_utils::database::ToValue as _;
use roach_reports_database_models::{
    BoundingBox, BuildingRow, BuildingWithReports, NewBuilding, NewReport, NewReportImage,
    ReportImageRow, ReportRow, ReportWithImages,
};
use roach_reports_report_models::Severity;
use switchy_database::{Database, DatabaseValue, Row};

use crate::DbError;

/// Maximum number of ids bound into a single `IN (...)` list.
const IN_CHUNK_SIZE: usize = 500;

const BUILDING_COLUMNS: &str =
    "id, address, city, state, zip, latitude, longitude, created_at";

const REPORT_COLUMNS: &str = "id, building_id, unit, has_roaches, severity, notes, created_at";

const IMAGE_COLUMNS: &str = "id, report_id, image_url, created_at";

// ---------------------------------------------------------------------------
// Inserts
// ---------------------------------------------------------------------------

/// Inserts a new building and returns the stored row.
///
/// # Errors
///
/// Returns [`DbError`] if the insert fails.
pub async fn insert_building(
    db: &dyn Database,
    building: &NewBuilding,
) -> Result<BuildingRow, DbError> {
    let row = BuildingRow {
        id: new_id(),
        address: building.address.clone(),
        city: building.city.clone(),
        state: building.state.clone(),
        zip: building.zip.clone(),
        latitude: building.coordinates.map(|c| c.latitude),
        longitude: building.coordinates.map(|c| c.longitude),
        created_at: Utc::now(),
    };

    db.exec_raw_params(
        "INSERT INTO buildings (id, address, city, state, zip, latitude, longitude, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        &[
            DatabaseValue::String(row.id.clone()),
            DatabaseValue::String(row.address.clone()),
            opt_string(row.city.as_deref()),
            opt_string(row.state.as_deref()),
            opt_string(row.zip.as_deref()),
            row.latitude.map_or(DatabaseValue::Null, DatabaseValue::Real64),
            row.longitude.map_or(DatabaseValue::Null, DatabaseValue::Real64),
            DatabaseValue::String(format_timestamp(row.created_at)),
        ],
    )
    .await?;

    log::debug!("Inserted building {} ({})", row.id, row.address);

    Ok(row)
}

/// Inserts a new report and returns the stored row.
///
/// Severity is dropped for reports without roaches.
///
/// # Errors
///
/// Returns [`DbError`] if the insert fails.
pub async fn insert_report(db: &dyn Database, report: &NewReport) -> Result<ReportRow, DbError> {
    let row = ReportRow {
        id: new_id(),
        building_id: report.building_id.clone(),
        unit: report.unit.clone(),
        has_roaches: report.has_roaches,
        severity: report.stored_severity(),
        notes: report.notes.clone(),
        created_at: Utc::now(),
    };

    db.exec_raw_params(
        "INSERT INTO reports (id, building_id, unit, has_roaches, severity, notes, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
        &[
            DatabaseValue::String(row.id.clone()),
            DatabaseValue::String(row.building_id.clone()),
            opt_string(row.unit.as_deref()),
            DatabaseValue::Int64(i64::from(row.has_roaches)),
            row.severity.map_or(DatabaseValue::Null, |s| {
                DatabaseValue::Int64(i64::from(s.value()))
            }),
            opt_string(row.notes.as_deref()),
            DatabaseValue::String(format_timestamp(row.created_at)),
        ],
    )
    .await?;

    log::debug!(
        "Inserted report {} for building {}",
        row.id,
        row.building_id
    );

    Ok(row)
}

/// Attaches an image to a report and returns the stored row.
///
/// # Errors
///
/// Returns [`DbError`] if the insert fails.
pub async fn insert_report_image(
    db: &dyn Database,
    image: &NewReportImage,
) -> Result<ReportImageRow, DbError> {
    let row = ReportImageRow {
        id: new_id(),
        report_id: image.report_id.clone(),
        image_url: image.image_url.clone(),
        created_at: Utc::now(),
    };

    db.exec_raw_params(
        "INSERT INTO report_images (id, report_id, image_url, created_at)
         VALUES ($1, $2, $3, $4)",
        &[
            DatabaseValue::String(row.id.clone()),
            DatabaseValue::String(row.report_id.clone()),
            DatabaseValue::String(row.image_url.clone()),
            DatabaseValue::String(format_timestamp(row.created_at)),
        ],
    )
    .await?;

    Ok(row)
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

/// Fetches a single building by id.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row cannot be converted.
pub async fn get_building(db: &dyn Database, id: &str) -> Result<Option<BuildingRow>, DbError> {
    let rows = db
        .query_raw_params(
            &format!("SELECT {BUILDING_COLUMNS} FROM buildings WHERE id = $1"),
            &[DatabaseValue::String(id.to_string())],
        )
        .await?;

    rows.first().map(building_from_row).transpose()
}

/// Fetches a single report by id.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row cannot be converted.
pub async fn get_report(db: &dyn Database, id: &str) -> Result<Option<ReportRow>, DbError> {
    let rows = db
        .query_raw_params(
            &format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = $1"),
            &[DatabaseValue::String(id.to_string())],
        )
        .await?;

    rows.first().map(report_from_row).transpose()
}

/// Fetches a building with all of its reports (newest first), each with
/// its images (oldest first).
///
/// Returns `None` if the building does not exist.
///
/// # Errors
///
/// Returns [`DbError`] if any query fails or a row cannot be converted.
pub async fn get_building_with_reports(
    db: &dyn Database,
    id: &str,
) -> Result<Option<BuildingWithReports>, DbError> {
    let Some(building) = get_building(db, id).await? else {
        return Ok(None);
    };

    let report_rows = db
        .query_raw_params(
            &format!(
                "SELECT {REPORT_COLUMNS} FROM reports
                 WHERE building_id = $1
                 ORDER BY created_at DESC, rowid DESC"
            ),
            &[DatabaseValue::String(id.to_string())],
        )
        .await?;

    let reports = report_rows
        .iter()
        .map(report_from_row)
        .collect::<Result<Vec<_>, _>>()?;

    let report_ids: Vec<String> = reports.iter().map(|r| r.id.clone()).collect();
    let mut images = images_for_reports(db, &report_ids).await?;

    let reports = reports
        .into_iter()
        .map(|report| ReportWithImages {
            images: images.remove(&report.id).unwrap_or_default(),
            report,
        })
        .collect();

    Ok(Some(BuildingWithReports { building, reports }))
}

/// Case-insensitive substring search over building addresses, ordered by
/// address.
///
/// `%` and `_` in the query match literally.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row cannot be converted.
pub async fn search_buildings(
    db: &dyn Database,
    query: &str,
    limit: u32,
) -> Result<Vec<BuildingRow>, DbError> {
    let pattern = format!("%{}%", escape_like(query));

    let rows = db
        .query_raw_params(
            &format!(
                "SELECT {BUILDING_COLUMNS} FROM buildings
                 WHERE address LIKE $1 ESCAPE '\\'
                 ORDER BY address
                 LIMIT $2"
            ),
            &[
                DatabaseValue::String(pattern),
                DatabaseValue::Int64(i64::from(limit)),
            ],
        )
        .await?;

    rows.iter().map(building_from_row).collect()
}

/// Fetches buildings whose coordinates fall inside `bbox` (edges
/// included), in insertion order. Buildings without coordinates are never
/// returned.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row cannot be converted.
pub async fn buildings_in_bbox(
    db: &dyn Database,
    bbox: &BoundingBox,
    limit: usize,
) -> Result<Vec<BuildingRow>, DbError> {
    let rows = db
        .query_raw_params(
            &format!(
                "SELECT {BUILDING_COLUMNS} FROM buildings
                 WHERE latitude IS NOT NULL AND longitude IS NOT NULL
                   AND latitude BETWEEN $1 AND $2
                   AND longitude BETWEEN $3 AND $4
                 ORDER BY rowid
                 LIMIT $5"
            ),
            &[
                DatabaseValue::Real64(bbox.south),
                DatabaseValue::Real64(bbox.north),
                DatabaseValue::Real64(bbox.west),
                DatabaseValue::Real64(bbox.east),
                DatabaseValue::Int64(i64::try_from(limit).unwrap_or(i64::MAX)),
            ],
        )
        .await?;

    rows.iter().map(building_from_row).collect()
}

/// Fetches every report for the given buildings, grouped by building id.
///
/// Buildings without reports are absent from the map.
///
/// # Errors
///
/// Returns [`DbError`] if any query fails or a row cannot be converted.
pub async fn reports_for_buildings(
    db: &dyn Database,
    building_ids: &[String],
) -> Result<BTreeMap<String, Vec<ReportRow>>, DbError> {
    let mut grouped: BTreeMap<String, Vec<ReportRow>> = BTreeMap::new();

    for chunk in building_ids.chunks(IN_CHUNK_SIZE) {
        let sql = format!(
            "SELECT {REPORT_COLUMNS} FROM reports WHERE building_id IN ({})",
            placeholders(chunk.len())
        );
        let params: Vec<DatabaseValue> = chunk
            .iter()
            .map(|id| DatabaseValue::String(id.clone()))
            .collect();

        for row in &db.query_raw_params(&sql, &params).await? {
            let report = report_from_row(row)?;
            grouped
                .entry(report.building_id.clone())
                .or_default()
                .push(report);
        }
    }

    Ok(grouped)
}

async fn images_for_reports(
    db: &dyn Database,
    report_ids: &[String],
) -> Result<BTreeMap<String, Vec<ReportImageRow>>, DbError> {
    let mut grouped: BTreeMap<String, Vec<ReportImageRow>> = BTreeMap::new();

    for chunk in report_ids.chunks(IN_CHUNK_SIZE) {
        let sql = format!(
            "SELECT {IMAGE_COLUMNS} FROM report_images
             WHERE report_id IN ({})
             ORDER BY created_at, rowid",
            placeholders(chunk.len())
        );
        let params: Vec<DatabaseValue> = chunk
            .iter()
            .map(|id| DatabaseValue::String(id.clone()))
            .collect();

        for row in &db.query_raw_params(&sql, &params).await? {
            let image = image_from_row(row)?;
            grouped
                .entry(image.report_id.clone())
                .or_default()
                .push(image);
        }
    }

    Ok(grouped)
}

// ---------------------------------------------------------------------------
// Row conversion
// ---------------------------------------------------------------------------

fn building_from_row(row: &Row) -> Result<BuildingRow, DbError> {
    Ok(BuildingRow {
        id: required_string(row, "id")?,
        address: required_string(row, "address")?,
        city: row.to_value("city").unwrap_or(None),
        state: row.to_value("state").unwrap_or(None),
        zip: row.to_value("zip").unwrap_or(None),
        latitude: row.to_value("latitude").unwrap_or(None),
        longitude: row.to_value("longitude").unwrap_or(None),
        created_at: parse_timestamp(&required_string(row, "created_at")?)?,
    })
}

fn report_from_row(row: &Row) -> Result<ReportRow, DbError> {
    let has_roaches = required_i64(row, "has_roaches")?;
    let severity: Option<i64> = row.to_value("severity").unwrap_or(None);
    let severity = severity
        .map(Severity::from_i64)
        .transpose()
        .map_err(|e| DbError::Conversion {
            message: e.to_string(),
        })?;

    Ok(ReportRow {
        id: required_string(row, "id")?,
        building_id: required_string(row, "building_id")?,
        unit: row.to_value("unit").unwrap_or(None),
        has_roaches: has_roaches != 0,
        severity,
        notes: row.to_value("notes").unwrap_or(None),
        created_at: parse_timestamp(&required_string(row, "created_at")?)?,
    })
}

fn image_from_row(row: &Row) -> Result<ReportImageRow, DbError> {
    Ok(ReportImageRow {
        id: required_string(row, "id")?,
        report_id: required_string(row, "report_id")?,
        image_url: required_string(row, "image_url")?,
        created_at: parse_timestamp(&required_string(row, "created_at")?)?,
    })
}

fn required_string(row: &Row, column: &str) -> Result<String, DbError> {
    let value: String = row.to_value(column).map_err(|e| DbError::Conversion {
        message: format!("Failed to read column {column}: {e}"),
    })?;
    Ok(value)
}

fn required_i64(row: &Row, column: &str) -> Result<i64, DbError> {
    let value: i64 = row.to_value(column).map_err(|e| DbError::Conversion {
        message: format!("Failed to read column {column}: {e}"),
    })?;
    Ok(value)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn opt_string(value: Option<&str>) -> DatabaseValue {
    value.map_or(DatabaseValue::Null, |v| DatabaseValue::String(v.to_string()))
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::Conversion {
            message: format!("Invalid timestamp {value:?}: {e}"),
        })
}

fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|i| format!("${i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use roach_reports_database_models::Coordinates;

    use super::*;

    fn temp_db_path() -> PathBuf {
        std::env::temp_dir().join(format!("roach_reports_test_{}.db", uuid::Uuid::new_v4()))
    }

    async fn test_db() -> (Box<dyn Database>, PathBuf) {
        let path = temp_db_path();
        let db = crate::db::open(&path).await.unwrap();
        (db, path)
    }

    fn new_building(address: &str, coordinates: Option<(f64, f64)>) -> NewBuilding {
        NewBuilding {
            address: address.to_string(),
            city: Some("New York".to_string()),
            state: Some("NY".to_string()),
            zip: None,
            coordinates: coordinates.map(|(latitude, longitude)| Coordinates {
                latitude,
                longitude,
            }),
        }
    }

    fn new_report(building_id: &str, has_roaches: bool, severity: Option<u8>) -> NewReport {
        NewReport {
            building_id: building_id.to_string(),
            unit: Some("4B".to_string()),
            has_roaches,
            severity: severity.map(|v| Severity::from_value(v).unwrap()),
            notes: None,
        }
    }

    #[test]
    fn placeholders_are_numbered() {
        assert_eq!(placeholders(1), "$1");
        assert_eq!(placeholders(3), "$1, $2, $3");
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("100% Main_St"), "100\\% Main\\_St");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn timestamps_roundtrip() {
        let now = Utc::now();
        let parsed = parse_timestamp(&format_timestamp(now)).unwrap();
        assert_eq!(
            parsed.timestamp_micros(),
            now.timestamp_micros(),
            "microsecond precision is kept"
        );
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[tokio::test]
    async fn building_roundtrip_with_reports_and_images() {
        let (db, path) = test_db().await;

        let building = insert_building(
            db.as_ref(),
            &new_building("123 Main St", Some((40.7128, -74.0060))),
        )
        .await
        .unwrap();

        let first = insert_report(db.as_ref(), &new_report(&building.id, true, Some(3)))
            .await
            .unwrap();
        let second = insert_report(db.as_ref(), &new_report(&building.id, false, Some(4)))
            .await
            .unwrap();
        assert_eq!(second.severity, None, "negative reports drop severity");

        insert_report_image(
            db.as_ref(),
            &NewReportImage {
                report_id: first.id.clone(),
                image_url: "https://img.example.com/a.jpg".to_string(),
            },
        )
        .await
        .unwrap();

        let fetched = get_building_with_reports(db.as_ref(), &building.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.building.id, building.id);
        assert_eq!(fetched.building.latitude, Some(40.7128));
        assert_eq!(fetched.reports.len(), 2);
        assert_eq!(fetched.reports[0].report.id, second.id, "newest first");
        assert_eq!(fetched.reports[1].report.severity, Some(Severity::Moderate));
        assert_eq!(fetched.reports[1].images.len(), 1);
        assert!(fetched.reports[0].images.is_empty());

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn missing_rows_are_none() {
        let (db, path) = test_db().await;

        assert!(get_building(db.as_ref(), "nope").await.unwrap().is_none());
        assert!(get_report(db.as_ref(), "nope").await.unwrap().is_none());
        assert!(
            get_building_with_reports(db.as_ref(), "nope")
                .await
                .unwrap()
                .is_none()
        );

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn search_matches_substring_case_insensitively() {
        let (db, path) = test_db().await;

        insert_building(db.as_ref(), &new_building("123 Main St", None))
            .await
            .unwrap();
        insert_building(db.as_ref(), &new_building("45 Maiden Ln", None))
            .await
            .unwrap();
        insert_building(db.as_ref(), &new_building("9 Broadway", None))
            .await
            .unwrap();

        let found = search_buildings(db.as_ref(), "mai", 20).await.unwrap();
        let addresses: Vec<&str> = found.iter().map(|b| b.address.as_str()).collect();
        assert_eq!(addresses, vec!["123 Main St", "45 Maiden Ln"]);

        let limited = search_buildings(db.as_ref(), "mai", 1).await.unwrap();
        assert_eq!(limited.len(), 1);

        assert!(search_buildings(db.as_ref(), "%", 20).await.unwrap().is_empty());

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn bbox_query_skips_outside_and_ungeocoded() {
        let (db, path) = test_db().await;

        let inside = insert_building(
            db.as_ref(),
            &new_building("inside", Some((40.715, -74.010))),
        )
        .await
        .unwrap();
        insert_building(db.as_ref(), &new_building("outside", Some((40.80, -74.006))))
            .await
            .unwrap();
        insert_building(db.as_ref(), &new_building("nowhere", None))
            .await
            .unwrap();

        let bbox = BoundingBox::new(-74.02, 40.70, -73.99, 40.72);
        let found = buildings_in_bbox(db.as_ref(), &bbox, 100).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, inside.id);

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn reports_grouped_by_building() {
        let (db, path) = test_db().await;

        let a = insert_building(db.as_ref(), &new_building("a", None))
            .await
            .unwrap();
        let b = insert_building(db.as_ref(), &new_building("b", None))
            .await
            .unwrap();
        let c = insert_building(db.as_ref(), &new_building("c", None))
            .await
            .unwrap();

        insert_report(db.as_ref(), &new_report(&a.id, true, Some(2)))
            .await
            .unwrap();
        insert_report(db.as_ref(), &new_report(&a.id, false, None))
            .await
            .unwrap();
        insert_report(db.as_ref(), &new_report(&b.id, true, Some(5)))
            .await
            .unwrap();

        let grouped = reports_for_buildings(
            db.as_ref(),
            &[a.id.clone(), b.id.clone(), c.id.clone()],
        )
        .await
        .unwrap();

        assert_eq!(grouped.get(&a.id).map(Vec::len), Some(2));
        assert_eq!(grouped.get(&b.id).map(Vec::len), Some(1));
        assert!(!grouped.contains_key(&c.id));

        assert!(reports_for_buildings(db.as_ref(), &[]).await.unwrap().is_empty());

        let _ = std::fs::remove_file(path);
    }
}
