//! Table definitions.

use switchy_database::Database;

use crate::DbError;

const STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS buildings (
        id          TEXT PRIMARY KEY,
        address     TEXT NOT NULL,
        city        TEXT,
        state       TEXT,
        zip         TEXT,
        latitude    REAL,
        longitude   REAL,
        created_at  TEXT NOT NULL,
        CHECK ((latitude IS NULL) = (longitude IS NULL))
    )",
    "CREATE INDEX IF NOT EXISTS idx_buildings_location
     ON buildings (latitude, longitude)",
    "CREATE TABLE IF NOT EXISTS reports (
        id          TEXT PRIMARY KEY,
        building_id TEXT NOT NULL REFERENCES buildings(id) ON DELETE CASCADE,
        unit        TEXT,
        has_roaches INTEGER NOT NULL CHECK (has_roaches IN (0, 1)),
        severity    INTEGER CHECK (severity IS NULL OR severity BETWEEN 1 AND 5),
        notes       TEXT,
        created_at  TEXT NOT NULL,
        CHECK (has_roaches = 1 OR severity IS NULL)
    )",
    "CREATE INDEX IF NOT EXISTS idx_reports_building
     ON reports (building_id, created_at)",
    "CREATE TABLE IF NOT EXISTS report_images (
        id          TEXT PRIMARY KEY,
        report_id   TEXT NOT NULL REFERENCES reports(id) ON DELETE CASCADE,
        image_url   TEXT NOT NULL,
        created_at  TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_report_images_report
     ON report_images (report_id)",
];

/// Creates all tables and indexes if they don't already exist.
///
/// # Errors
///
/// Returns [`DbError`] if any statement fails.
pub async fn ensure_schema(db: &dyn Database) -> Result<(), DbError> {
    for statement in STATEMENTS {
        db.exec_raw(statement).await?;
    }

    log::debug!("Database schema ready");
    Ok(())
}
