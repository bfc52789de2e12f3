//! Database initialization
//!
//! Opens (or creates) the SQLite database, creates the `clip` and `config`
//! tables if needed and seeds the single config row with defaults.
//! Safe to run on every startup.

use crate::db::models::DEFAULT_VOLUME;
use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::{debug, info};

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
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

    // WAL lets the fetch handlers read while an update commits
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Open a private in-memory database with the full schema
///
/// Uses a single connection that is never recycled: every SQLite
/// `:memory:` connection is its own database.
pub async fn init_in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create tables (idempotent) and seed the config row
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_clip_table(pool).await?;
    create_config_table(pool).await?;
    seed_config(pool).await?;
    Ok(())
}

async fn create_clip_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS clip (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            path TEXT NOT NULL,
            is_valid INTEGER NOT NULL DEFAULT 1,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_config_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS config (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            monitor_volume REAL NOT NULL,
            routed_volume REAL NOT NULL,
            routed_muted INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert the default config row if the table is empty
async fn seed_config(pool: &SqlitePool) -> Result<()> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM config WHERE id = 1)")
        .fetch_one(pool)
        .await?;

    if !exists {
        sqlx::query(
            "INSERT INTO config (id, monitor_volume, routed_volume, routed_muted) VALUES (1, ?, ?, 0)",
        )
        .bind(DEFAULT_VOLUME)
        .bind(DEFAULT_VOLUME)
        .execute(pool)
        .await?;

        info!("Seeded config record with default volumes ({})", DEFAULT_VOLUME);
    } else {
        debug!("Config record already present");
    }

    Ok(())
}
