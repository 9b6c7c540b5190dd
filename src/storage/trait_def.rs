use crate::models::{NewPageVisit, PageVisit};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (create the visits table and its indexes)
    async fn init(&self) -> Result<()>;

    /// Cheap round trip used by the health endpoint
    async fn ping(&self) -> StorageResult<()>;

    /// Insert a visit inside its own transaction and return the stored row.
    /// The transaction is rolled back before any error is returned.
    async fn insert_visit(&self, visit: &NewPageVisit) -> StorageResult<PageVisit>;

    /// Visits for `url`, most recent first (ties by id, newest first)
    async fn list_visits(&self, url: &str, limit: i64, offset: i64)
        -> StorageResult<Vec<PageVisit>>;

    /// Most recent visit for `url` together with the total visit count,
    /// read in a single statement
    async fn latest_with_count(&self, url: &str) -> StorageResult<Option<(PageVisit, i64)>>;
}

/// Row shape shared by both backends. Instants are stored as microseconds
/// since the Unix epoch so that ordering is exact.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct VisitRow {
    pub id: i64,
    pub url: String,
    pub datetime_visited: i64,
    pub link_count: i64,
    pub word_count: i64,
    pub image_count: i64,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct LatestVisitRow {
    #[sqlx(flatten)]
    pub visit: VisitRow,
    pub visit_count: i64,
}

impl TryFrom<VisitRow> for PageVisit {
    type Error = StorageError;

    fn try_from(row: VisitRow) -> StorageResult<Self> {
        let datetime_visited = from_micros(row.datetime_visited)?;
        Ok(PageVisit {
            id: row.id,
            url: row.url,
            datetime_visited,
            link_count: row.link_count,
            word_count: row.word_count,
            image_count: row.image_count,
        })
    }
}

pub(crate) fn to_micros(instant: &DateTime<Utc>) -> i64 {
    instant.timestamp_micros()
}

pub(crate) fn from_micros(micros: i64) -> StorageResult<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros).ok_or_else(|| {
        StorageError::Other(anyhow::anyhow!(
            "stored timestamp {micros} is out of range"
        ))
    })
}
