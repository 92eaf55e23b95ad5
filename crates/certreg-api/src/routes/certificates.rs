//! # Certificate Management API
//!
//! Authenticated endpoints for the issuance hook, management lookup,
//! revocation, and per-course listing.
//!
//! ## Endpoints
//!
//! - `POST /v1/certificates` — issue. Called by the course-completion system
//!   once its own completion rules are met; no completion policy is applied
//!   here.
//! - `GET /v1/certificates/:credential_id` — full record.
//! - `POST /v1/certificates/:credential_id/revoke` — one-way, idempotent.
//! - `GET /v1/courses/:course_id/certificates` — records for a course.
//!
//! Instructors only see and revoke certificates issued under their own
//! subject. Anything they may not manage is reported as not found.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use certreg_core::{CertificateFacts, CertificateLinks};
use certreg_registry::{IssueRequest, RevokeOutcome};

use super::CertificateRecord;
use crate::auth::{require_role, CallerIdentity, Role};
use crate::error::AppError;
use crate::extractors::{extract_json, extract_optional_json};
use crate::state::AppState;

/// Request to issue a certificate.
#[derive(Debug, Deserialize, ToSchema)]
pub struct IssueCertificateRequest {
    pub student_name: String,
    pub course_name: String,
    pub instructor_name: String,
    pub course_hours: u32,
    #[serde(default)]
    pub course_id: Option<Uuid>,
    #[serde(default)]
    pub template_id: Option<Uuid>,
}

impl IssueCertificateRequest {
    fn into_issue_request(self, caller: &CallerIdentity) -> Result<IssueRequest, AppError> {
        let facts = CertificateFacts::new(
            self.student_name,
            self.course_name,
            self.instructor_name,
            self.course_hours,
        )?;
        Ok(IssueRequest {
            facts,
            links: CertificateLinks {
                course_id: self.course_id,
                template_id: self.template_id,
                issued_by: caller.subject.clone(),
            },
        })
    }
}

/// Optional revocation body.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RevokeRequest {
    /// Free-text reason, kept for administrators. Never shown publicly.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Revocation result.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RevokeResponse {
    /// False when the certificate was already revoked and nothing changed.
    pub revoked_now: bool,
    pub certificate: CertificateRecord,
}

/// Build the certificates router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/certificates", post(issue_certificate))
        .route("/v1/certificates/:credential_id", get(get_certificate))
        .route(
            "/v1/certificates/:credential_id/revoke",
            post(revoke_certificate),
        )
        .route(
            "/v1/courses/:course_id/certificates",
            get(list_course_certificates),
        )
}

/// POST /v1/certificates — Issue a certificate.
#[utoipa::path(
    post,
    path = "/v1/certificates",
    request_body = IssueCertificateRequest,
    responses(
        (status = 201, description = "Certificate issued", body = CertificateRecord),
        (status = 400, description = "Malformed body", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid facts or unknown course/template", body = crate::error::ErrorBody),
    ),
    tag = "certificates"
)]
pub async fn issue_certificate(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<IssueCertificateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CertificateRecord>), AppError> {
    require_role(&caller, Role::Instructor)?;
    let request = extract_json(body)?.into_issue_request(&caller)?;
    let certificate = state.registry.issue(request).await?;
    Ok((StatusCode::CREATED, Json(CertificateRecord::from(&certificate))))
}

/// GET /v1/certificates/:credential_id — Management lookup.
#[utoipa::path(
    get,
    path = "/v1/certificates/{credential_id}",
    params(("credential_id" = String, Path, description = "Public credential ID")),
    responses(
        (status = 200, description = "Certificate found", body = CertificateRecord),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "certificates"
)]
pub async fn get_certificate(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(credential_id): Path<String>,
) -> Result<Json<CertificateRecord>, AppError> {
    let certificate = state
        .registry
        .get(&credential_id)
        .await?
        .filter(|c| caller.can_manage(c))
        .ok_or_else(AppError::certificate_not_found)?;
    Ok(Json(CertificateRecord::from(&certificate)))
}

/// POST /v1/certificates/:credential_id/revoke — Revoke a certificate.
///
/// Revoking an already revoked certificate succeeds without changing the
/// original `revoked_at` or reason.
#[utoipa::path(
    post,
    path = "/v1/certificates/{credential_id}/revoke",
    params(("credential_id" = String, Path, description = "Public credential ID")),
    request_body = RevokeRequest,
    responses(
        (status = 200, description = "Certificate revoked (or already revoked)", body = RevokeResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 422, description = "Reason too long", body = crate::error::ErrorBody),
    ),
    tag = "certificates"
)]
pub async fn revoke_certificate(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(credential_id): Path<String>,
    body: Result<Json<RevokeRequest>, JsonRejection>,
) -> Result<Json<RevokeResponse>, AppError> {
    let request: RevokeRequest = extract_optional_json(body)?;

    // Ownership is checked before the conditional update. Revocation never
    // changes issued_by, so the check cannot go stale.
    let existing = state
        .registry
        .get(&credential_id)
        .await?
        .ok_or_else(AppError::certificate_not_found)?;
    if !caller.can_manage(&existing) {
        tracing::warn!(
            credential_id = %credential_id,
            role = caller.role.as_str(),
            subject = ?caller.subject,
            "revocation denied: caller does not manage certificate"
        );
        return Err(AppError::certificate_not_found());
    }

    let outcome = state.registry.revoke(&credential_id, request.reason).await?;
    let revoked_now = matches!(outcome, RevokeOutcome::Revoked(_));
    Ok(Json(RevokeResponse {
        revoked_now,
        certificate: CertificateRecord::from(outcome.certificate()),
    }))
}

/// GET /v1/courses/:course_id/certificates — Certificates issued for a course.
#[utoipa::path(
    get,
    path = "/v1/courses/{course_id}/certificates",
    params(("course_id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Certificates, oldest first", body = Vec<CertificateRecord>),
    ),
    tag = "certificates"
)]
pub async fn list_course_certificates(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(course_id): Path<Uuid>,
) -> Result<Json<Vec<CertificateRecord>>, AppError> {
    let certificates = state.registry.list_for_course(course_id).await?;
    Ok(Json(
        certificates
            .iter()
            .filter(|c| caller.can_manage(c))
            .map(CertificateRecord::from)
            .collect(),
    ))
}
