//! HTTP API integration tests
//!
//! These drive the router directly with `oneshot` against an in-memory
//! SQLite store, covering status codes and JSON shapes of every endpoint.

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
    Router,
};
use sidepanel::api;
use sidepanel::config::{HttpConfig, RateLimitConfig};
use sidepanel::models::{NewPageVisit, PageVisit};
use sidepanel::storage::{SqliteStorage, Storage, StorageError, StorageResult};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceExt;

/// Helper to create test storage
async fn create_test_storage() -> Arc<dyn Storage> {
    let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
    storage.init().await.unwrap();
    Arc::new(storage)
}

fn create_app(storage: Arc<dyn Storage>) -> Router {
    api::create_api_router(storage, &HttpConfig::default())
}

/// Storage whose database is unreachable
struct UnavailableStorage;

impl UnavailableStorage {
    fn fail<T>() -> StorageResult<T> {
        Err(StorageError::Other(anyhow::anyhow!("connection refused")))
    }
}

#[async_trait]
impl Storage for UnavailableStorage {
    async fn init(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn ping(&self) -> StorageResult<()> {
        Self::fail()
    }

    async fn insert_visit(&self, _visit: &NewPageVisit) -> StorageResult<PageVisit> {
        Self::fail()
    }

    async fn list_visits(
        &self,
        _url: &str,
        _limit: i64,
        _offset: i64,
    ) -> StorageResult<Vec<PageVisit>> {
        Self::fail()
    }

    async fn latest_with_count(&self, _url: &str) -> StorageResult<Option<(PageVisit, i64)>> {
        Self::fail()
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_visit(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/visits")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_visit_from(client: SocketAddr, body: Value) -> Request<Body> {
    let mut request = post_visit(body);
    request.extensions_mut().insert(ConnectInfo(client));
    request
}

fn small_visit() -> Value {
    json!({"url": "https://a.com", "link_count": 1, "word_count": 1, "image_count": 1})
}

#[tokio::test]
async fn test_health_reports_database() {
    let app = create_app(create_test_storage().await);

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "database": "connected"}));
}

#[tokio::test]
async fn test_home() {
    let app = create_app(create_test_storage().await);

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("Welcome"));
}

#[tokio::test]
async fn test_create_visit_returns_created() {
    let app = create_app(create_test_storage().await);

    let (status, body) = send(
        &app,
        post_visit(json!({
            "url": "https://example.com/",
            "link_count": 10,
            "word_count": 500,
            "image_count": 5,
            "datetime_visited": "2025-01-01T00:00:00Z",
            "timezone_offset": 2.5
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["id"].as_i64().unwrap() > 0);
    assert_eq!(body["url"], "https://example.com");
    assert_eq!(body["link_count"], 10);
    assert_eq!(body["word_count"], 500);
    assert_eq!(body["image_count"], 5);
    assert_eq!(body["datetime_visited"], "January 01, 2025 at 02:30 AM");
}

#[tokio::test]
async fn test_create_visit_rejects_bad_input() {
    let app = create_app(create_test_storage().await);

    let bad_bodies = [
        json!({"url": "example.com", "link_count": 1, "word_count": 1, "image_count": 1}),
        json!({"url": "", "link_count": 1, "word_count": 1, "image_count": 1}),
        json!({"url": "https://a.com", "link_count": 1, "word_count": 1, "image_count": 1, "timezone_offset": 20}),
        json!({"url": "https://a.com", "link_count": 1, "word_count": 1, "image_count": 1, "datetime_visited": "soon"}),
    ];

    for body in bad_bodies {
        let (status, response) = send(&app, post_visit(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(response["error"].is_string());
    }

    // Nothing was written
    let (status, _) = send(&app, get("/metrics?url=https://a.com")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_visit_rejects_non_integer_counts() {
    let app = create_app(create_test_storage().await);

    let (status, _) = send(
        &app,
        post_visit(json!({
            "url": "https://a.com",
            "link_count": "many",
            "word_count": 1,
            "image_count": 1
        })),
    )
    .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_metrics_not_found() {
    let app = create_app(create_test_storage().await);

    let (status, body) = send(&app, get("/metrics?url=https://nowhere.test")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["error"],
        "No visits recorded for URL: https://nowhere.test"
    );
}

#[tokio::test]
async fn test_metrics_summary_after_visits() {
    let app = create_app(create_test_storage().await);

    for (day, links) in [("02", 2), ("01", 1)] {
        let (status, _) = send(
            &app,
            post_visit(json!({
                "url": "https://a.com",
                "link_count": links,
                "word_count": links * 10,
                "image_count": links * 100,
                "datetime_visited": format!("2025-01-{day}T00:00:00Z")
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, get("/metrics?url=https://a.com/&tz_offset=0")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "url": "https://a.com",
            "link_count": 2,
            "word_count": 20,
            "image_count": 200,
            "last_visited": "January 02, 2025 at 12:00 AM",
            "visit_count": 2
        })
    );
}

#[tokio::test]
async fn test_metrics_rejects_out_of_range_offset() {
    let app = create_app(create_test_storage().await);

    let (status, _) = send(&app, get("/metrics?url=https://a.com&tz_offset=-13")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_visits_limit_bounds() {
    let app = create_app(create_test_storage().await);

    let (status, _) = send(&app, get("/visits?url=https://a.com&limit=0")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get("/visits?url=https://a.com&limit=101")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get("/visits?url=https://a.com&offset=-1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, get("/visits?url=https://a.com&limit=100")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_list_visits_pagination() {
    let storage = create_test_storage().await;
    let app = create_app(Arc::clone(&storage));

    let base = chrono::DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    for i in 0..60 {
        storage
            .insert_visit(&NewPageVisit {
                url: "https://a.com".to_string(),
                datetime_visited: base + chrono::Duration::minutes(i),
                link_count: i,
                word_count: 0,
                image_count: 0,
            })
            .await
            .unwrap();
    }

    // Default limit is 50
    let (status, body) = send(&app, get("/visits?url=https://a.com")).await;
    assert_eq!(status, StatusCode::OK);
    let visits = body.as_array().unwrap();
    assert_eq!(visits.len(), 50);
    assert_eq!(visits[0]["link_count"], 59);
    assert_eq!(visits[49]["link_count"], 10);

    let (_, body) = send(&app, get("/visits?url=https://a.com/&limit=5&offset=55&tz_offset=0")).await;
    let visits = body.as_array().unwrap();
    let links: Vec<i64> = visits
        .iter()
        .map(|v| v["link_count"].as_i64().unwrap())
        .collect();
    assert_eq!(links, vec![4, 3, 2, 1, 0]);
    assert_eq!(visits[4]["datetime_visited"], "January 01, 2025 at 12:00 AM");
}

#[tokio::test]
async fn test_list_returns_latest_first_scenario() {
    let app = create_app(create_test_storage().await);

    for (at, counts) in [
        ("2025-03-01T10:00:00Z", (1, 10, 100)),
        ("2025-03-01T11:00:00Z", (2, 20, 200)),
    ] {
        send(
            &app,
            post_visit(json!({
                "url": "https://a.com",
                "link_count": counts.0,
                "word_count": counts.1,
                "image_count": counts.2,
                "datetime_visited": at
            })),
        )
        .await;
    }

    let (status, body) = send(&app, get("/visits?url=https://a.com&limit=1&tz_offset=0")).await;
    assert_eq!(status, StatusCode::OK);
    let visits = body.as_array().unwrap();
    assert_eq!(visits.len(), 1);
    assert_eq!(visits[0]["link_count"], 2);
    assert_eq!(visits[0]["word_count"], 20);
    assert_eq!(visits[0]["image_count"], 200);
    assert_eq!(visits[0]["datetime_visited"], "March 01, 2025 at 11:00 AM");
}

#[tokio::test]
async fn test_missing_url_parameter() {
    let app = create_app(create_test_storage().await);

    let (status, _) = send(&app, get("/visits")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get("/metrics")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_visit_accepts_date_only_and_epoch() {
    let app = create_app(create_test_storage().await);

    for visited in [json!("2025-01-01"), json!(1735689600), json!("2025-01-01T00:00")] {
        let (status, body) = send(
            &app,
            post_visit(json!({
                "url": "https://a.com",
                "link_count": 1,
                "word_count": 1,
                "image_count": 1,
                "datetime_visited": visited,
                "timezone_offset": 0
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "rejected {visited}");
        assert_eq!(body["datetime_visited"], "January 01, 2025 at 12:00 AM");
    }
}

#[tokio::test]
async fn test_database_failure_is_opaque_server_error() {
    let app = create_app(Arc::new(UnavailableStorage));

    let (status, body) = send(&app, post_visit(small_visit())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Database error"}));

    let (status, body) = send(&app, get("/metrics?url=https://a.com")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Database error"}));

    let (status, body) = send(&app, get("/visits?url=https://a.com")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Database error"}));

    // Validation still runs before the store is touched
    let (status, _) = send(&app, get("/visits?url=https://a.com&limit=0")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({"status": "unavailable", "database": "disconnected"}));
}

#[tokio::test]
async fn test_write_quota_returns_too_many_requests() {
    let http = HttpConfig {
        rate_limit: RateLimitConfig {
            enabled: true,
            read_per_minute: 300,
            write_per_minute: 2,
        },
        ..HttpConfig::default()
    };
    let app = api::create_api_router(create_test_storage().await, &http);
    let client: SocketAddr = "203.0.113.7:50000".parse().unwrap();

    for _ in 0..2 {
        let (status, _) = send(&app, post_visit_from(client, small_visit())).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, post_visit_from(client, small_visit())).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body["error"].is_string());

    // Reads have their own quota and other clients their own buckets
    let (status, body) = send(&app, get("/metrics?url=https://a.com")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["visit_count"], 2);

    let other: SocketAddr = "198.51.100.20:40000".parse().unwrap();
    let (status, _) = send(&app, post_visit_from(other, small_visit())).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_rate_limit_can_be_disabled() {
    let http = HttpConfig {
        rate_limit: RateLimitConfig {
            enabled: false,
            read_per_minute: 1,
            write_per_minute: 1,
        },
        ..HttpConfig::default()
    };
    let app = api::create_api_router(create_test_storage().await, &http);

    for _ in 0..3 {
        let (status, _) = send(&app, post_visit(small_visit())).await;
        assert_eq!(status, StatusCode::CREATED);
    }
}
