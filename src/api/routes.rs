use axum::{
    extract::DefaultBodyLimit, http::HeaderValue, middleware, routing::get, Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::HttpConfig;
use crate::storage::Storage;

use super::handlers::{create_visit, get_metrics, health_check, home, list_visits, AppState};
use super::rate_limit::{rate_limit_middleware, ClientRateLimiter};

pub fn create_api_router(storage: Arc<dyn Storage>, http: &HttpConfig) -> Router {
    let state = Arc::new(AppState { storage });

    let mut router: Router<Arc<AppState>> = Router::new()
        .route("/", get(home))
        .route("/health", get(health_check))
        .route("/metrics", get(get_metrics))
        .route("/visits", get(list_visits).post(create_visit));

    if let Some(limiter) = ClientRateLimiter::from_config(&http.rate_limit) {
        router = router.layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));
    }

    router
        .layer(DefaultBodyLimit::max(http.max_request_bytes))
        .layer(cors_layer(&http.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let values: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin '{origin}'");
                    None
                }
            })
            .collect();
        AllowOrigin::list(values)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}
