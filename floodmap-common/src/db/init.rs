//! Database initialization
//!
//! Creates the SQLite file and the `reports` table on first run. Safe to call
//! on every startup: all statements are idempotent.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Open (creating if needed) the report database at `db_path`
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;

    // WAL lets the read-only API service query while reports are being written
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    create_reports_table(&pool).await?;

    Ok(pool)
}

/// Create the reports table and its indexes
///
/// `created_at` is stored as epoch milliseconds. The `sin_half_*`,
/// `cos_half_*` and `cos_lat` columns hold the position's
/// [`HaversineTerms`](crate::geo::HaversineTerms), written once at insert so
/// the radius query needs only arithmetic.
pub async fn create_reports_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reports (
            guid TEXT PRIMARY KEY,
            user_id TEXT,
            latitude REAL NOT NULL CHECK (latitude BETWEEN -90 AND 90),
            longitude REAL NOT NULL CHECK (longitude BETWEEN -180 AND 180),
            sin_half_lat REAL NOT NULL,
            cos_half_lat REAL NOT NULL,
            sin_half_lon REAL NOT NULL,
            cos_half_lon REAL NOT NULL,
            cos_lat REAL NOT NULL,
            severity TEXT NOT NULL CHECK (severity IN ('low', 'medium', 'high', 'extreme')),
            description TEXT NOT NULL DEFAULT '',
            photo_urls TEXT NOT NULL DEFAULT '[]',
            manual_location INTEGER NOT NULL DEFAULT 0,
            confirm_count INTEGER NOT NULL DEFAULT 0 CHECK (confirm_count >= 0),
            deny_count INTEGER NOT NULL DEFAULT 0 CHECK (deny_count >= 0),
            source TEXT NOT NULL DEFAULT 'Internal',
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_reports_created_at ON reports(created_at)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_reports_position ON reports(latitude, longitude)")
        .execute(pool)
        .await?;

    Ok(())
}
