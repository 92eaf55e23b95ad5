//! # Request Metrics
//!
//! Lightweight in-process counters using atomics: total requests, error
//! responses, and public verification outcomes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use serde::Serialize;
use utoipa::ToSchema;

use certreg_registry::VerificationResult;

/// Shared metrics state.
#[derive(Debug, Clone, Default)]
pub struct ApiMetrics {
    request_count: Arc<AtomicU64>,
    error_count: Arc<AtomicU64>,
    verified_valid: Arc<AtomicU64>,
    verified_revoked: Arc<AtomicU64>,
    verified_not_found: Arc<AtomicU64>,
    rate_limited: Arc<AtomicU64>,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub errors: u64,
    pub verifications_valid: u64,
    pub verifications_revoked: u64,
    pub verifications_not_found: u64,
    pub rate_limited: u64,
}

impl ApiMetrics {
    /// Create a new metrics instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return current request count.
    pub fn requests(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Return current error count.
    pub fn errors(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Count a verification outcome.
    pub fn record_verification(&self, result: &VerificationResult) {
        let counter = match result {
            VerificationResult::Valid(_) => &self.verified_valid,
            VerificationResult::Revoked { .. } => &self.verified_revoked,
            VerificationResult::NotFound => &self.verified_not_found,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a request rejected by the rate limiter.
    pub fn record_rate_limited(&self) {
        self.rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    /// Read every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests(),
            errors: self.errors(),
            verifications_valid: self.verified_valid.load(Ordering::Relaxed),
            verifications_revoked: self.verified_revoked.load(Ordering::Relaxed),
            verifications_not_found: self.verified_not_found.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
        }
    }
}

/// Middleware that increments request and error counters.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();
    let response = next.run(request).await;
    if let Some(m) = metrics {
        m.request_count.fetch_add(1, Ordering::Relaxed);
        if response.status().is_server_error() || response.status().is_client_error() {
            m.error_count.fetch_add(1, Ordering::Relaxed);
        }
    }
    response
}
