//! # Certificate Templates
//!
//! Visual styling for rendered certificates. Templates only affect how a
//! certificate looks; certified facts never come from here.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use certreg_core::CertificateTemplate;
use certreg_registry::ReferenceResolver;

use super::TemplateView;
use crate::auth::{require_role, CallerIdentity, Role};
use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::AppState;

/// Request to create a template.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTemplateRequest {
    pub name: String,
    /// `#RRGGBB`.
    pub primary_color: String,
    /// `#RRGGBB`.
    pub secondary_color: String,
    #[serde(default)]
    pub logo_url: Option<String>,
}

/// Build the templates router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/templates", post(create_template))
        .route("/v1/templates/:id", get(get_template))
}

/// POST /v1/templates — Create a certificate template.
#[utoipa::path(
    post,
    path = "/v1/templates",
    request_body = CreateTemplateRequest,
    responses(
        (status = 201, description = "Template created", body = TemplateView),
        (status = 403, description = "Admin role required", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid name, color, or logo URL", body = crate::error::ErrorBody),
    ),
    tag = "templates"
)]
pub async fn create_template(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateTemplateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TemplateView>), AppError> {
    require_role(&caller, Role::Admin)?;
    let req = extract_json(body)?;
    let template =
        CertificateTemplate::new(req.name, req.primary_color, req.secondary_color, req.logo_url)?;
    state.backend.save_template(&template).await?;
    tracing::info!(template_id = %template.id, "certificate template created");
    Ok((StatusCode::CREATED, Json(TemplateView::from(template))))
}

/// GET /v1/templates/:id — Fetch a template.
#[utoipa::path(
    get,
    path = "/v1/templates/{id}",
    params(("id" = Uuid, Path, description = "Template ID")),
    responses(
        (status = 200, description = "Template found", body = TemplateView),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "templates"
)]
pub async fn get_template(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<TemplateView>, AppError> {
    let template = state
        .backend
        .template(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("template {id} not found")))?;
    Ok(Json(TemplateView::from(template)))
}
