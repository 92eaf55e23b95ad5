//! # Verification Rate Limiting
//!
//! Fixed-window rate limiter keyed by client address, applied to the public
//! verification route to slow credential ID enumeration. In-memory and per
//! process.
//!
//! The key is the peer socket address. `X-Forwarded-For` is only honored
//! when [`RateLimitConfig::trust_forwarded_for`] is set, since any client
//! can write that header. At most [`MAX_TRACKED_CLIENTS`] buckets are held;
//! once that many clients are active inside one window, new clients are
//! refused until buckets expire.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use parking_lot::Mutex;

use crate::error::ErrorBody;
use crate::middleware::metrics::ApiMetrics;

/// Upper bound on tracked client buckets.
pub const MAX_TRACKED_CLIENTS: usize = 10_000;

/// Key used when neither a peer address nor a trusted header is available.
const UNKNOWN_CLIENT: &str = "anonymous";

/// Rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window.
    pub max_requests: u64,
    /// Window duration.
    pub window: Duration,
    /// Key on the first `X-Forwarded-For` hop instead of the peer address.
    pub trust_forwarded_for: bool,
}

impl RateLimitConfig {
    /// `max_requests` per minute, keyed on the peer address.
    pub fn per_minute(max_requests: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(60),
            trust_forwarded_for: false,
        }
    }

    /// Set whether `X-Forwarded-For` is trusted.
    pub fn trusting_forwarded_for(mut self, trust: bool) -> Self {
        self.trust_forwarded_for = trust;
        self
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::per_minute(crate::state::DEFAULT_VERIFY_RATE_LIMIT)
    }
}

#[derive(Debug, Clone)]
struct BucketState {
    count: u64,
    window_start: Instant,
}

/// Shared rate limiter state.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: Arc<Mutex<HashMap<String, BucketState>>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given config.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Check if a request from the given key should be allowed.
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> bool {
        let window = self.config.window;
        let mut buckets = self.buckets.lock();

        if !buckets.contains_key(key) && buckets.len() >= MAX_TRACKED_CLIENTS {
            buckets.retain(|_, b| now.duration_since(b.window_start) < window);
            if buckets.len() >= MAX_TRACKED_CLIENTS {
                tracing::warn!(
                    tracked = buckets.len(),
                    "rate limiter full, refusing new client"
                );
                return false;
            }
        }

        let bucket = buckets.entry(key.to_string()).or_insert(BucketState {
            count: 0,
            window_start: now,
        });

        if now.duration_since(bucket.window_start) >= window {
            bucket.count = 0;
            bucket.window_start = now;
        }

        if bucket.count >= self.config.max_requests {
            false
        } else {
            bucket.count += 1;
            true
        }
    }

    /// Number of tracked clients.
    pub fn tracked_clients(&self) -> usize {
        self.buckets.lock().len()
    }
}

/// Rate limit key for a request.
///
/// The first `X-Forwarded-For` hop when `trust_forwarded_for` is set and the
/// header is present, else the peer IP, else `"anonymous"`.
pub fn client_key(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_forwarded_for: bool,
) -> String {
    let forwarded = trust_forwarded_for
        .then(|| {
            headers
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        })
        .flatten();

    match (forwarded, peer) {
        (Some(hop), _) => hop.to_string(),
        (None, Some(addr)) => addr.ip().to_string(),
        (None, None) => UNKNOWN_CLIENT.to_string(),
    }
}

/// Middleware that enforces per-client rate limits.
///
/// The peer address comes from `ConnectInfo<SocketAddr>`, which the binary
/// provides via `into_make_service_with_connect_info`.
pub async fn rate_limit_middleware(request: Request, next: Next) -> Response {
    let limiter = request.extensions().get::<RateLimiter>().cloned();

    if let Some(limiter) = limiter {
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let key = client_key(request.headers(), peer, limiter.config.trust_forwarded_for);
        if !limiter.check(&key) {
            tracing::warn!(client = %key, "verification rate limit exceeded");
            if let Some(metrics) = request.extensions().get::<ApiMetrics>() {
                metrics.record_rate_limited();
            }
            let body = ErrorBody::new("RATE_LIMITED", "rate limit exceeded");
            let retry_after = HeaderValue::from(limiter.config.window.as_secs());
            return (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_after)],
                Json(body),
            )
                .into_response();
        }
    }

    next.run(request).await
}
