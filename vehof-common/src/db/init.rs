//! Database initialization
//!
//! One SQLite file holds both durable collections:
//! - `videos`: normalized catalog entities keyed by `id`
//! - `flags`: per-entity user annotations keyed by `id`
//!
//! The layout is a single schema generation recorded in `schema_version`.
//! There are no migrations: a database stamped with any other generation
//! has both collections dropped and recreated.

use crate::Result;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Current schema generation
pub const SCHEMA_VERSION: i64 = 1;

/// Open (creating if needed) the database and ensure the schema
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // WAL lets query-time reads proceed while a flag write is in flight
    let db_url = format!("sqlite://{}", db_path.display());
    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    init_schema(&pool).await?;

    Ok(pool)
}

/// Create tables on an already-open pool (idempotent)
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    wipe_if_foreign_generation(pool).await?;
    create_videos_table(pool).await?;
    create_flags_table(pool).await?;

    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(SCHEMA_VERSION)
        .execute(pool)
        .await?;

    Ok(())
}

/// Stored schema generation, if any
pub async fn stored_schema_version(pool: &SqlitePool) -> Result<Option<i64>> {
    let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(pool)
        .await?;
    Ok(version)
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn wipe_if_foreign_generation(pool: &SqlitePool) -> Result<()> {
    let stored = stored_schema_version(pool).await?;
    match stored {
        Some(version) if version != SCHEMA_VERSION => {
            warn!(
                stored = version,
                current = SCHEMA_VERSION,
                "Schema generation changed, wiping catalog and flags"
            );
            let mut tx = pool.begin().await?;
            sqlx::query("DROP TABLE IF EXISTS videos").execute(&mut *tx).await?;
            sqlx::query("DROP TABLE IF EXISTS flags").execute(&mut *tx).await?;
            sqlx::query("DELETE FROM schema_version").execute(&mut *tx).await?;
            tx.commit().await?;
        }
        _ => {}
    }
    Ok(())
}

async fn create_videos_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS videos (
            id TEXT PRIMARY KEY,
            media_id TEXT,
            url TEXT NOT NULL,
            title TEXT NOT NULL,
            owner TEXT,
            owner_url TEXT,
            duration TEXT,
            duration_seconds INTEGER,
            published_date TEXT,
            view_count TEXT,
            subscription_count TEXT,
            tags TEXT,
            gpt_tags TEXT,
            summary TEXT,
            format TEXT,
            topic TEXT,
            topics TEXT NOT NULL DEFAULT '[]'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_videos_title ON videos(title)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_videos_owner ON videos(owner)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_videos_published_date ON videos(published_date)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_flags_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS flags (
            id TEXT PRIMARY KEY,
            watched INTEGER NOT NULL DEFAULT 0,
            watch_later INTEGER NOT NULL DEFAULT 0,
            favorite INTEGER NOT NULL DEFAULT 0,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_flags_updated_at ON flags(updated_at)")
        .execute(pool)
        .await?;

    Ok(())
}
