use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::metrics::{self, MetricsError, DEFAULT_VISIT_LIMIT};
use crate::models::{CreateVisitRequest, FormattedVisit, PageMetricsSummary};
use crate::storage::Storage;

pub struct AppState {
    pub storage: Arc<dyn Storage>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}

#[derive(Deserialize)]
pub struct MetricsQuery {
    pub url: String,
    pub tz_offset: Option<f64>,
}

#[derive(Deserialize)]
pub struct VisitsQuery {
    pub url: String,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    pub tz_offset: Option<f64>,
}

fn default_limit() -> i64 {
    DEFAULT_VISIT_LIMIT
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(err: MetricsError) -> ApiError {
    match err {
        MetricsError::InvalidInput(message) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse { error: message }),
        ),
        MetricsError::Persistence(e) => {
            tracing::error!("Storage failure: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Database error".to_string(),
                }),
            )
        }
    }
}

/// Latest metrics for a URL
pub async fn get_metrics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MetricsQuery>,
) -> Result<Json<PageMetricsSummary>, ApiError> {
    let summary = metrics::get_latest_metrics(state.storage.as_ref(), &query.url, query.tz_offset)
        .await
        .map_err(error_response)?;

    match summary {
        Some(summary) => Ok(Json(summary)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("No visits recorded for URL: {}", query.url),
            }),
        )),
    }
}

/// Paginated visit history for a URL, most recent first
pub async fn list_visits(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VisitsQuery>,
) -> Result<Json<Vec<FormattedVisit>>, ApiError> {
    let visits = metrics::list_visits(
        state.storage.as_ref(),
        &query.url,
        query.limit,
        query.offset,
        query.tz_offset,
    )
    .await
    .map_err(error_response)?;

    Ok(Json(visits))
}

/// Record a visit
pub async fn create_visit(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateVisitRequest>,
) -> Result<(StatusCode, Json<FormattedVisit>), ApiError> {
    let visit = metrics::create_visit(state.storage.as_ref(), payload)
        .await
        .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(visit)))
}

/// Liveness plus database connectivity
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    match state.storage.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
                database: "connected".to_string(),
            }),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable".to_string(),
                    database: "disconnected".to_string(),
                }),
            )
        }
    }
}

pub async fn home() -> &'static str {
    "Welcome to the History Sidepanel API"
}
