#![allow(clippy::module_name_repetitions)]
//! Default file locations.

use std::path::{Path, PathBuf};

/// Default database file, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "data/roach_reports.db";

/// Returns the database path from `DATABASE_PATH`, falling back to
/// [`DEFAULT_DB_PATH`].
#[must_use]
pub fn db_path_from_env() -> PathBuf {
    std::env::var("DATABASE_PATH").map_or_else(|_| PathBuf::from(DEFAULT_DB_PATH), PathBuf::from)
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.as_os_str().is_empty() && !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
