use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted visit row. `url` is always normalized and `datetime_visited`
/// keeps full precision in UTC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageVisit {
    pub id: i64,
    pub url: String,
    pub datetime_visited: DateTime<Utc>,
    pub link_count: i64,
    pub word_count: i64,
    pub image_count: i64,
}

/// Validated insert payload; the id is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewPageVisit {
    pub url: String,
    pub datetime_visited: DateTime<Utc>,
    pub link_count: i64,
    pub word_count: i64,
    pub image_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateVisitRequest {
    pub url: String,
    pub link_count: i64,
    pub word_count: i64,
    pub image_count: i64,
    #[serde(default)]
    pub datetime_visited: Option<VisitTime>,
    /// Display offset in hours for the returned `datetime_visited`
    #[serde(default)]
    pub timezone_offset: Option<f64>,
}

/// Caller-supplied visit time: an ISO-8601 string (date-only and
/// minute-precision forms included; a trailing `Z` or no zone means UTC)
/// or a Unix timestamp in seconds or milliseconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum VisitTime {
    Epoch(f64),
    Text(String),
}

/// A visit as returned to callers, with `datetime_visited` rendered for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormattedVisit {
    pub id: i64,
    pub url: String,
    pub link_count: i64,
    pub word_count: i64,
    pub image_count: i64,
    pub datetime_visited: String,
}

/// Latest visit for a URL plus the number of visits recorded for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMetricsSummary {
    pub url: String,
    pub link_count: i64,
    pub word_count: i64,
    pub image_count: i64,
    pub last_visited: String,
    pub visit_count: i64,
}
