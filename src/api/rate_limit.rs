//! Per-client-IP rate limiting with separate read and write quotas

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::{Arc, Weak};
use std::time::Duration;

use super::handlers::ErrorResponse;
use crate::config::RateLimitConfig;

const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

pub struct ClientRateLimiter {
    read: DefaultKeyedRateLimiter<IpAddr>,
    write: DefaultKeyedRateLimiter<IpAddr>,
}

impl ClientRateLimiter {
    /// `None` when rate limiting is disabled or a quota is zero.
    pub fn from_config(config: &RateLimitConfig) -> Option<Arc<Self>> {
        if !config.enabled {
            return None;
        }
        let (Some(read), Some(write)) = (
            NonZeroU32::new(config.read_per_minute),
            NonZeroU32::new(config.write_per_minute),
        ) else {
            tracing::warn!("Rate limit quota of zero configured, rate limiting disabled");
            return None;
        };

        let limiter = Arc::new(Self {
            read: RateLimiter::keyed(Quota::per_minute(read)),
            write: RateLimiter::keyed(Quota::per_minute(write)),
        });

        // Drop state for idle clients; the task ends with the limiter
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let weak = Arc::downgrade(&limiter);
            handle.spawn(cleanup_idle_clients(weak));
        }

        Some(limiter)
    }

    /// Returns false when the client has used up the quota for this method.
    pub fn check(&self, method: &Method, client: IpAddr) -> bool {
        let limiter = if is_read(method) {
            &self.read
        } else {
            &self.write
        };
        limiter.check_key(&client).is_ok()
    }
}

async fn cleanup_idle_clients(limiter: Weak<ClientRateLimiter>) {
    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
    loop {
        interval.tick().await;
        let Some(limiter) = limiter.upgrade() else {
            break;
        };
        limiter.read.retain_recent();
        limiter.write.retain_recent();
    }
}

fn is_read(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Requests without connection info (in-process callers) share one bucket.
fn client_ip(request: &Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

pub async fn rate_limit_middleware(
    State(limiter): State<Arc<ClientRateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_ip(&request);

    if !limiter.check(request.method(), client) {
        tracing::warn!(client = %client, method = %request.method(), "Rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse {
                error: "Too many requests. Please wait before retrying.".to_string(),
            }),
        )
            .into_response();
    }

    next.run(request).await
}
