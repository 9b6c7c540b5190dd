use crate::models::{NewPageVisit, PageVisit};
use crate::storage::trait_def::{to_micros, LatestVisitRow, VisitRow};
use crate::storage::{Storage, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;

pub struct SqliteStorage {
    pool: Arc<SqlitePool>,
}

impl SqliteStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS page_visits (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT NOT NULL,
                datetime_visited INTEGER NOT NULL,
                link_count INTEGER NOT NULL,
                word_count INTEGER NOT NULL,
                image_count INTEGER NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS ix_page_visits_url ON page_visits(url)")
            .execute(self.pool.as_ref())
            .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS ix_page_visits_url_datetime ON page_visits(url, datetime_visited)",
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn ping(&self) -> StorageResult<()> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }

    async fn insert_visit(&self, visit: &NewPageVisit) -> StorageResult<PageVisit> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_as::<_, VisitRow>(
            r#"
            INSERT INTO page_visits (url, datetime_visited, link_count, word_count, image_count)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, url, datetime_visited, link_count, word_count, image_count
            "#,
        )
        .bind(&visit.url)
        .bind(to_micros(&visit.datetime_visited))
        .bind(visit.link_count)
        .bind(visit.word_count)
        .bind(visit.image_count)
        .fetch_one(&mut *tx)
        .await;

        let row = match inserted {
            Ok(row) => row,
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "rollback after failed insert also failed");
                }
                return Err(StorageError::Database(e));
            }
        };

        tx.commit().await?;
        PageVisit::try_from(row)
    }

    async fn list_visits(
        &self,
        url: &str,
        limit: i64,
        offset: i64,
    ) -> StorageResult<Vec<PageVisit>> {
        let rows = sqlx::query_as::<_, VisitRow>(
            r#"
            SELECT id, url, datetime_visited, link_count, word_count, image_count
            FROM page_visits
            WHERE url = ?
            ORDER BY datetime_visited DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(url)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.into_iter().map(PageVisit::try_from).collect()
    }

    async fn latest_with_count(&self, url: &str) -> StorageResult<Option<(PageVisit, i64)>> {
        let row = sqlx::query_as::<_, LatestVisitRow>(
            r#"
            SELECT id, url, datetime_visited, link_count, word_count, image_count,
                   COUNT(*) OVER (PARTITION BY url) AS visit_count
            FROM page_visits
            WHERE url = ?
            ORDER BY datetime_visited DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(url)
        .fetch_optional(self.pool.as_ref())
        .await?;

        match row {
            Some(row) => {
                let visit_count = row.visit_count;
                Ok(Some((PageVisit::try_from(row.visit)?, visit_count)))
            }
            None => Ok(None),
        }
    }
}
