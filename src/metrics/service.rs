use chrono::Utc;
use tracing::{debug, warn};

use super::datetime::{format_datetime, resolve_visit_time};
use super::error::{MetricsError, MetricsResult};
use super::normalize::normalize_url;
use super::validate::{validate_counts, validate_pagination, validate_timezone_offset, validate_url};
use crate::models::{CreateVisitRequest, FormattedVisit, NewPageVisit, PageMetricsSummary, PageVisit};
use crate::storage::Storage;

pub fn format_visit(visit: &PageVisit, tz_offset_hours: Option<f64>) -> FormattedVisit {
    FormattedVisit {
        id: visit.id,
        url: visit.url.clone(),
        link_count: visit.link_count,
        word_count: visit.word_count,
        image_count: visit.image_count,
        datetime_visited: format_datetime(&visit.datetime_visited, tz_offset_hours),
    }
}

/// Record one visit. Input is validated before anything is written; the
/// insert is a single transaction that the storage rolls back on failure.
pub async fn create_visit(
    storage: &dyn Storage,
    request: CreateVisitRequest,
) -> MetricsResult<FormattedVisit> {
    validate_url(&request.url)?;
    validate_timezone_offset(request.timezone_offset)?;
    validate_counts(request.link_count, request.word_count, request.image_count)?;

    let datetime_visited = match &request.datetime_visited {
        Some(value) => resolve_visit_time(value)?,
        None => Utc::now(),
    };

    let visit = NewPageVisit {
        url: normalize_url(&request.url),
        datetime_visited,
        link_count: request.link_count,
        word_count: request.word_count,
        image_count: request.image_count,
    };

    let stored = storage.insert_visit(&visit).await.map_err(|e| {
        warn!(url = %visit.url, error = %e, "failed to record visit");
        MetricsError::Persistence(e)
    })?;

    debug!(id = stored.id, url = %stored.url, "recorded visit");
    Ok(format_visit(&stored, request.timezone_offset))
}

/// Visits for a URL, most recent first.
pub async fn list_visits(
    storage: &dyn Storage,
    url: &str,
    limit: i64,
    offset: i64,
    tz_offset_hours: Option<f64>,
) -> MetricsResult<Vec<FormattedVisit>> {
    validate_pagination(limit, offset)?;
    validate_url(url)?;
    validate_timezone_offset(tz_offset_hours)?;

    let url = normalize_url(url);
    let visits = storage.list_visits(&url, limit, offset).await?;

    Ok(visits
        .iter()
        .map(|visit| format_visit(visit, tz_offset_hours))
        .collect())
}

/// Latest visit plus total visit count, or `None` when the URL was never
/// recorded. Mapping `None` to a protocol status is left to the caller.
pub async fn get_latest_metrics(
    storage: &dyn Storage,
    url: &str,
    tz_offset_hours: Option<f64>,
) -> MetricsResult<Option<PageMetricsSummary>> {
    validate_url(url)?;
    validate_timezone_offset(tz_offset_hours)?;

    let url = normalize_url(url);
    let Some((latest, visit_count)) = storage.latest_with_count(&url).await? else {
        return Ok(None);
    };

    Ok(Some(PageMetricsSummary {
        last_visited: format_datetime(&latest.datetime_visited, tz_offset_hours),
        url: latest.url,
        link_count: latest.link_count,
        word_count: latest.word_count,
        image_count: latest.image_count,
        visit_count,
    }))
}
