//! Catalog Store
//!
//! Keyed collection of normalized entities in the `videos` table. Rows come
//! back in first-insertion order (`rowid`), which is the "original order"
//! preserved by queries without a sort key.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use vehof_common::{Entity, Error, Result};

const SELECT_COLUMNS: &str = r#"
    SELECT id, media_id, url, title, owner, owner_url, duration, duration_seconds,
           published_date, view_count, subscription_count, tags, gpt_tags,
           summary, format, topic, topics
    FROM videos
"#;

/// Durable entity collection keyed by `id`
#[derive(Debug, Clone)]
pub struct CatalogStore {
    pool: SqlitePool,
}

impl CatalogStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Every entity, in first-insertion order
    pub async fn get_all(&self) -> Result<Vec<Entity>> {
        let rows = sqlx::query(&format!("{} ORDER BY rowid", SELECT_COLUMNS))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(entity_from_row).collect()
    }

    pub async fn get(&self, id: &str) -> Result<Option<Entity>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(entity_from_row).transpose()
    }

    pub async fn count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM videos")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    /// Replace-by-key upsert of a batch in one transaction
    ///
    /// Either every row of the batch is written or none is. An existing id
    /// keeps its original insertion position.
    pub async fn bulk_upsert(&self, entities: &[Entity]) -> Result<()> {
        if entities.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for entity in entities {
            upsert_entity(&mut tx, entity).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM videos").execute(&self.pool).await?;
        Ok(())
    }

    /// Clear as part of a caller-owned transaction
    pub async fn clear_in(tx: &mut Transaction<'_, Sqlite>) -> Result<()> {
        sqlx::query("DELETE FROM videos").execute(&mut **tx).await?;
        Ok(())
    }
}

async fn upsert_entity(tx: &mut Transaction<'_, Sqlite>, entity: &Entity) -> Result<()> {
    let topics = serde_json::to_string(&entity.topics)
        .map_err(|e| Error::Internal(format!("Encode topics for {}: {}", entity.id, e)))?;

    sqlx::query(
        r#"
        INSERT INTO videos (
            id, media_id, url, title, owner, owner_url, duration, duration_seconds,
            published_date, view_count, subscription_count, tags, gpt_tags,
            summary, format, topic, topics
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            media_id = excluded.media_id,
            url = excluded.url,
            title = excluded.title,
            owner = excluded.owner,
            owner_url = excluded.owner_url,
            duration = excluded.duration,
            duration_seconds = excluded.duration_seconds,
            published_date = excluded.published_date,
            view_count = excluded.view_count,
            subscription_count = excluded.subscription_count,
            tags = excluded.tags,
            gpt_tags = excluded.gpt_tags,
            summary = excluded.summary,
            format = excluded.format,
            topic = excluded.topic,
            topics = excluded.topics
        "#,
    )
    .bind(&entity.id)
    .bind(&entity.media_id)
    .bind(&entity.url)
    .bind(&entity.title)
    .bind(&entity.owner)
    .bind(&entity.owner_url)
    .bind(&entity.duration)
    .bind(entity.duration_seconds)
    .bind(&entity.published_date)
    .bind(&entity.view_count)
    .bind(&entity.subscription_count)
    .bind(&entity.tags)
    .bind(&entity.gpt_tags)
    .bind(&entity.summary)
    .bind(&entity.format)
    .bind(&entity.topic)
    .bind(topics)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

fn entity_from_row(row: &SqliteRow) -> Result<Entity> {
    let id: String = row.get("id");
    let topics_json: String = row.get("topics");
    let topics: Vec<String> = serde_json::from_str(&topics_json)
        .map_err(|e| Error::Internal(format!("Decode topics for {}: {}", id, e)))?;

    Ok(Entity {
        id,
        media_id: row.get("media_id"),
        url: row.get("url"),
        title: row.get("title"),
        owner: row.get("owner"),
        owner_url: row.get("owner_url"),
        duration: row.get("duration"),
        duration_seconds: row.get("duration_seconds"),
        published_date: row.get("published_date"),
        view_count: row.get("view_count"),
        subscription_count: row.get("subscription_count"),
        tags: row.get("tags"),
        gpt_tags: row.get("gpt_tags"),
        summary: row.get("summary"),
        format: row.get("format"),
        topic: row.get("topic"),
        topics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vehof_common::db::init::init_database;
    use vehof_common::{normalize, RawRecord};

    async fn setup() -> (TempDir, CatalogStore) {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("vehof.db")).await.unwrap();
        (dir, CatalogStore::new(pool))
    }

    fn entity(url: &str, title: &str, topic: &str) -> Entity {
        normalize(RawRecord {
            url: Some(url.to_string()),
            title: Some(title.to_string()),
            topic: Some(topic.to_string()),
            duration: Some("10:00".to_string()),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_upsert_and_read_back() {
        let (_dir, store) = setup().await;
        let e = entity("https://youtu.be/aaaaaa1", "First", "Art, History");

        store.bulk_upsert(&[e.clone()]).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.get("aaaaaa1").await.unwrap(), Some(e));
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_key_and_keeps_position() {
        let (_dir, store) = setup().await;
        let a = entity("https://youtu.be/aaaaaa1", "A", "");
        let b = entity("https://youtu.be/bbbbbb2", "B", "");
        store.bulk_upsert(&[a, b]).await.unwrap();

        let a2 = entity("https://youtu.be/aaaaaa1", "A revised", "Science");
        store.bulk_upsert(&[a2]).await.unwrap();

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].title, "A revised");
        assert_eq!(all[0].topics, vec!["Science"]);
        assert_eq!(all[1].title, "B");
    }

    #[tokio::test]
    async fn test_clear() {
        let (_dir, store) = setup().await;
        store
            .bulk_upsert(&[entity("https://youtu.be/aaaaaa1", "A", "")])
            .await
            .unwrap();

        store.clear().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
