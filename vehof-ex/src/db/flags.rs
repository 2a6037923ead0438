//! Annotation Store
//!
//! Per-entity user flags in the `flags` table. Lifecycle is independent of
//! the catalog: re-importing the archive never touches flags.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use vehof_common::{Flag, Result};

/// Durable flag collection keyed by entity id
#[derive(Debug, Clone)]
pub struct AnnotationStore {
    pool: SqlitePool,
}

impl AnnotationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_all(&self) -> Result<Vec<Flag>> {
        let rows = sqlx::query(
            "SELECT id, watched, watch_later, favorite, updated_at FROM flags ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(flag_from_row).collect())
    }

    pub async fn get(&self, id: &str) -> Result<Option<Flag>> {
        let row = sqlx::query(
            "SELECT id, watched, watch_later, favorite, updated_at FROM flags WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(flag_from_row))
    }

    pub async fn count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM flags")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    /// Whole-row replace of one flag
    pub async fn put(&self, flag: &Flag) -> Result<()> {
        sqlx::query(UPSERT_FLAG)
            .bind(&flag.id)
            .bind(flag.watched)
            .bind(flag.watch_later)
            .bind(flag.favorite)
            .bind(flag.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn bulk_upsert(&self, flags: &[Flag]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for flag in flags {
            sqlx::query(UPSERT_FLAG)
                .bind(&flag.id)
                .bind(flag.watched)
                .bind(flag.watch_later)
                .bind(flag.favorite)
                .bind(flag.updated_at)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM flags").execute(&self.pool).await?;
        Ok(())
    }

    /// Clear as part of a caller-owned transaction
    pub async fn clear_in(tx: &mut Transaction<'_, Sqlite>) -> Result<()> {
        sqlx::query("DELETE FROM flags").execute(&mut **tx).await?;
        Ok(())
    }
}

const UPSERT_FLAG: &str = r#"
    INSERT INTO flags (id, watched, watch_later, favorite, updated_at)
    VALUES (?, ?, ?, ?, ?)
    ON CONFLICT(id) DO UPDATE SET
        watched = excluded.watched,
        watch_later = excluded.watch_later,
        favorite = excluded.favorite,
        updated_at = excluded.updated_at
"#;

fn flag_from_row(row: &SqliteRow) -> Flag {
    Flag {
        id: row.get("id"),
        watched: row.get("watched"),
        watch_later: row.get("watch_later"),
        favorite: row.get("favorite"),
        updated_at: row.get("updated_at"),
    }
}
