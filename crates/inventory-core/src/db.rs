// crates/inventory-core/src/db.rs

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use tracing::info;

use crate::config::normalize_database_url;
use crate::error::{PipelineError, Result};

pub type DbPool = Pool<Sqlite>;

/// Opens the SQLite store, creating the file if it does not exist yet.
///
/// Both jobs are strictly sequential, so the pool holds a single connection.
pub async fn connect(database_url: &str) -> Result<DbPool> {
    let url = normalize_database_url(database_url);
    if !url.starts_with("sqlite:") {
        return Err(PipelineError::Config(format!(
            "unsupported database url: {database_url}"
        )));
    }

    let options = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    info!(url = %url, "Database connection established");
    Ok(pool)
}

/// A private in-memory store. The connection is never recycled, otherwise the
/// database would vanish with it.
pub async fn connect_in_memory() -> Result<DbPool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    Ok(pool)
}
