//! # Public Verification
//!
//! `GET /v1/verify/:credential_id` answers "is this certificate real, and
//! is it still valid?" for anyone holding a credential ID. No
//! authentication.
//!
//! A miss of any kind (unknown ID, malformed ID, undecodable path segment)
//! returns the same 404 body so callers learn nothing beyond "not found".
//! Internal identifiers, the issuing account, and the revocation reason are
//! never exposed here.

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use certreg_registry::{VerificationResult, VerifiedCertificate};

use super::{CourseView, TemplateView};
use crate::error::AppError;
use crate::middleware::metrics::ApiMetrics;
use crate::state::AppState;

/// Verification status of a found certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Valid,
    Revoked,
}

/// Public verification response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VerificationResponse {
    pub status: VerificationStatus,
    pub credential_id: String,
    pub student_name: String,
    pub course_name: String,
    pub instructor_name: String,
    pub course_hours: u32,
    pub issued_at: DateTime<Utc>,
    pub is_revoked: bool,
    /// Present exactly when `is_revoked` is true.
    pub revoked_at: Option<DateTime<Utc>>,
    /// Styling for rendering, if the certificate has a template that still exists.
    pub template: Option<TemplateView>,
    /// Current course metadata, if the course reference still exists.
    pub course: Option<CourseView>,
}

impl VerificationResponse {
    fn build(status: VerificationStatus, verified: VerifiedCertificate) -> Self {
        let VerifiedCertificate {
            certificate,
            template,
            course,
        } = verified;
        let facts = certificate.facts();
        Self {
            status,
            credential_id: certificate.credential_id().to_string(),
            student_name: facts.student_name().to_string(),
            course_name: facts.course_name().to_string(),
            instructor_name: facts.instructor_name().to_string(),
            course_hours: facts.course_hours(),
            issued_at: certificate.issued_at(),
            is_revoked: certificate.is_revoked(),
            revoked_at: certificate.revoked_at(),
            template: template.map(TemplateView::from),
            course: course.map(CourseView::from),
        }
    }

    /// Map a registry outcome to a response, or `None` for a miss.
    pub fn from_result(result: VerificationResult) -> Option<Self> {
        match result {
            VerificationResult::NotFound => None,
            VerificationResult::Valid(v) => Some(Self::build(VerificationStatus::Valid, v)),
            VerificationResult::Revoked { certificate, .. } => {
                Some(Self::build(VerificationStatus::Revoked, certificate))
            }
        }
    }
}

/// Build the public verification router.
///
/// The credential ID is captured as a wildcard so that extra path segments
/// reach the handler and get the standard not-found body. An empty segment
/// does not match a wildcard, hence the separate `/v1/verify/` route.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/verify/", get(verify_without_id))
        .route("/v1/verify/*credential_id", get(verify_certificate))
}

/// GET /v1/verify/:credential_id — Verify a certificate.
#[utoipa::path(
    get,
    path = "/v1/verify/{credential_id}",
    params(("credential_id" = String, Path, description = "Public credential ID")),
    responses(
        (status = 200, description = "Certificate found (valid or revoked)", body = VerificationResponse),
        (status = 404, description = "Certificate not found", body = crate::error::ErrorBody),
        (status = 429, description = "Rate limit exceeded", body = crate::error::ErrorBody),
    ),
    tag = "verification"
)]
pub async fn verify_certificate(
    State(state): State<AppState>,
    Extension(metrics): Extension<ApiMetrics>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<VerificationResponse>, AppError> {
    let Ok(Path(credential_id)) = path else {
        metrics.record_verification(&VerificationResult::NotFound);
        return Err(AppError::certificate_not_found());
    };

    let result = if credential_id.contains('/') {
        VerificationResult::NotFound
    } else {
        state.registry.verify(&credential_id).await?
    };
    metrics.record_verification(&result);

    VerificationResponse::from_result(result)
        .map(Json)
        .ok_or_else(AppError::certificate_not_found)
}

/// GET /v1/verify/ with no credential ID.
async fn verify_without_id(
    Extension(metrics): Extension<ApiMetrics>,
) -> Result<Json<VerificationResponse>, AppError> {
    metrics.record_verification(&VerificationResult::NotFound);
    Err(AppError::certificate_not_found())
}
