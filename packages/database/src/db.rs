//! Database connection utilities.

use std::path::Path;

use switchy_database::Database;
use switchy_database_connection::init_sqlite_rusqlite;

use crate::{DbError, paths, schema};

/// Opens (or creates) the `SQLite` database at `path` and ensures the
/// schema exists.
///
/// # Errors
///
/// Returns [`DbError`] if the parent directory cannot be created, the
/// database cannot be opened, or schema creation fails.
pub async fn open(path: &Path) -> Result<Box<dyn Database>, DbError> {
    if let Some(parent) = path.parent() {
        paths::ensure_dir(parent)?;
    }

    let db = init_sqlite_rusqlite(Some(path)).map_err(|e| DbError::Connection(e.to_string()))?;

    schema::ensure_schema(db.as_ref()).await?;

    Ok(db)
}

/// Opens the database named by the `DATABASE_PATH` environment variable
/// (default `data/roach_reports.db`).
///
/// # Errors
///
/// Returns [`DbError`] if the database cannot be opened.
pub async fn connect_from_env() -> Result<Box<dyn Database>, DbError> {
    let path = paths::db_path_from_env();
    log::info!("Opening database at {}", path.display());
    open(&path).await
}
