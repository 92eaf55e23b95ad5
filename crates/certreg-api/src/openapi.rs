//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Certificate Registry API",
        version = "0.1.0",
        description = "Issuance, public verification, and revocation of course completion certificates.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        // Verification
        crate::routes::verify::verify_certificate,
        // Certificates
        crate::routes::certificates::issue_certificate,
        crate::routes::certificates::get_certificate,
        crate::routes::certificates::revoke_certificate,
        crate::routes::certificates::list_course_certificates,
        // Templates
        crate::routes::templates::create_template,
        crate::routes::templates::get_template,
        // Courses
        crate::routes::courses::upsert_course,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::TemplateView,
        crate::routes::CourseView,
        crate::routes::CertificateRecord,
        crate::routes::verify::VerificationStatus,
        crate::routes::verify::VerificationResponse,
        crate::routes::certificates::IssueCertificateRequest,
        crate::routes::certificates::RevokeRequest,
        crate::routes::certificates::RevokeResponse,
        crate::routes::templates::CreateTemplateRequest,
        crate::routes::courses::UpsertCourseRequest,
        crate::middleware::metrics::MetricsSnapshot,
    )),
    tags(
        (name = "verification", description = "Public certificate verification"),
        (name = "certificates", description = "Issuance, lookup, and revocation"),
        (name = "templates", description = "Certificate template styling"),
        (name = "courses", description = "Course reference sync"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json — Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
