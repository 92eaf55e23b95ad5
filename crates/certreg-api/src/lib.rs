//! # certreg-api — Axum API Service for the Certificate Registry
//!
//! HTTP surface over [`certreg_registry::CertificateRegistry`], running on
//! either the in-memory stores or PostgreSQL.
//!
//! ## API Surface
//!
//! | Route                                         | Module                     | Auth        |
//! |-----------------------------------------------|----------------------------|-------------|
//! | `GET /v1/verify/:credential_id`               | [`routes::verify`]         | none        |
//! | `POST /v1/certificates`                       | [`routes::certificates`]   | instructor  |
//! | `GET /v1/certificates/:credential_id`         | [`routes::certificates`]   | instructor  |
//! | `POST /v1/certificates/:credential_id/revoke` | [`routes::certificates`]   | instructor  |
//! | `GET /v1/courses/:course_id/certificates`     | [`routes::certificates`]   | instructor  |
//! | `POST /v1/templates`, `GET /v1/templates/:id` | [`routes::templates`]      | admin / instructor |
//! | `PUT /v1/courses/:course_id`                  | [`routes::courses`]        | admin       |
//! | `GET /v1/metrics`                             | this module                | admin       |
//! | `GET /openapi.json`                           | [`openapi`]                | instructor  |
//! | `GET /health/*`                               | this module                | none        |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! public:  TraceLayer → Metrics → RateLimit → Handler
//! managed: TraceLayer → Metrics → Auth → Handler
//! ```

pub mod auth;
pub mod backend;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};

use crate::auth::{require_role, AuthConfig, CallerIdentity, Role};
use crate::error::AppError;
use crate::middleware::metrics::{ApiMetrics, MetricsSnapshot};
use crate::middleware::rate_limit::{RateLimitConfig, RateLimiter};
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Verification and health checks are mounted outside the auth middleware
/// so they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };
    let metrics = ApiMetrics::new();
    let limiter = RateLimiter::new(
        RateLimitConfig::per_minute(state.config.verify_rate_limit)
            .trusting_forwarded_for(state.config.trust_forwarded_for),
    );

    if auth_config.token.is_none() {
        tracing::warn!("AUTH_TOKEN not set, management API is open with admin access");
    }

    // Public verification, rate limited per client.
    let public = routes::verify::router()
        .layer(from_fn(middleware::rate_limit::rate_limit_middleware))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(middleware::tracing_layer::layer())
        .layer(Extension(limiter))
        .layer(Extension(metrics.clone()))
        .with_state(state.clone());

    // Authenticated management API.
    let api = Router::new()
        .merge(routes::certificates::router())
        .merge(routes::templates::router())
        .merge(routes::courses::router())
        .merge(openapi::router())
        .route("/v1/metrics", get(metrics_snapshot))
        .layer(from_fn(auth::auth_middleware))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(middleware::tracing_layer::layer())
        .layer(Extension(auth_config))
        .layer(Extension(metrics))
        .with_state(state.clone());

    // Unauthenticated health checks.
    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .with_state(state);

    Router::new().merge(health).merge(public).merge(api)
}

/// GET /v1/metrics — Request and verification counters. Admin only.
async fn metrics_snapshot(
    caller: CallerIdentity,
    Extension(metrics): Extension<ApiMetrics>,
) -> Result<Json<MetricsSnapshot>, AppError> {
    require_role(&caller, Role::Admin)?;
    Ok(Json(metrics.snapshot()))
}

/// Liveness check. 200 while the process is up.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness check. 503 if the database does not answer.
async fn readiness(State(state): State<AppState>) -> Response {
    if let Some(pool) = state.backend.pool() {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!("Database health check failed: {e}");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }
    (StatusCode::OK, "ready").into_response()
}
