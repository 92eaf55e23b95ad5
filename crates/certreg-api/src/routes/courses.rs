//! # Course References
//!
//! Sync hook for the course-management system. The registry mirrors just
//! enough course metadata to decorate verification responses; changing it
//! never alters an issued certificate.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::put;
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use certreg_core::CourseReference;

use super::CourseView;
use crate::auth::{require_role, CallerIdentity, Role};
use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::AppState;

/// Course metadata pushed by the course-management system.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpsertCourseRequest {
    pub title: String,
    pub instructor_name: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Build the courses router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/courses/:course_id", put(upsert_course))
}

/// PUT /v1/courses/:course_id — Register or refresh a course reference.
#[utoipa::path(
    put,
    path = "/v1/courses/{course_id}",
    params(("course_id" = Uuid, Path, description = "Course ID in the course-management system")),
    request_body = UpsertCourseRequest,
    responses(
        (status = 200, description = "Course reference stored", body = CourseView),
        (status = 403, description = "Admin role required", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid title, instructor, or URL", body = crate::error::ErrorBody),
    ),
    tag = "courses"
)]
pub async fn upsert_course(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(course_id): Path<Uuid>,
    body: Result<Json<UpsertCourseRequest>, JsonRejection>,
) -> Result<Json<CourseView>, AppError> {
    require_role(&caller, Role::Admin)?;
    let req = extract_json(body)?;
    let course = CourseReference::new(course_id, req.title, req.instructor_name, req.url)?;
    state.backend.upsert_course(&course).await?;
    tracing::info!(course_id = %course_id, "course reference stored");
    Ok(Json(CourseView::from(course)))
}
