//! # API Route Modules
//!
//! - `verify` — public, unauthenticated credential verification.
//! - `certificates` — issuance hook, management lookup, revocation, and
//!   per-course listing.
//! - `templates` — certificate template management (styling only).
//! - `courses` — course reference sync hook for the course-management
//!   system.
//!
//! The response views shared across modules live here.

pub mod certificates;
pub mod courses;
pub mod templates;
pub mod verify;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use certreg_core::{CertificateTemplate, CourseReference, IssuedCertificate};

/// Template styling as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TemplateView {
    pub id: Uuid,
    pub name: String,
    /// `#rrggbb`.
    pub primary_color: String,
    /// `#rrggbb`.
    pub secondary_color: String,
    pub logo_url: Option<String>,
}

impl From<CertificateTemplate> for TemplateView {
    fn from(t: CertificateTemplate) -> Self {
        Self {
            id: t.id,
            name: t.name,
            primary_color: t.primary_color.as_str().to_string(),
            secondary_color: t.secondary_color.as_str().to_string(),
            logo_url: t.logo_url,
        }
    }
}

/// Course metadata as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CourseView {
    pub id: Uuid,
    pub title: String,
    pub instructor_name: String,
    pub url: Option<String>,
}

impl From<CourseReference> for CourseView {
    fn from(c: CourseReference) -> Self {
        Self {
            id: c.id,
            title: c.title,
            instructor_name: c.instructor_name,
            url: c.url,
        }
    }
}

/// Full issuance record for the authenticated management API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CertificateRecord {
    pub id: Uuid,
    pub credential_id: String,
    pub student_name: String,
    pub course_name: String,
    pub instructor_name: String,
    pub course_hours: u32,
    pub course_id: Option<Uuid>,
    pub template_id: Option<Uuid>,
    pub issued_by: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub is_revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
    pub revocation_reason: Option<String>,
}

impl From<&IssuedCertificate> for CertificateRecord {
    fn from(c: &IssuedCertificate) -> Self {
        let facts = c.facts();
        let links = c.links();
        Self {
            id: c.id(),
            credential_id: c.credential_id().to_string(),
            student_name: facts.student_name().to_string(),
            course_name: facts.course_name().to_string(),
            instructor_name: facts.instructor_name().to_string(),
            course_hours: facts.course_hours(),
            course_id: links.course_id,
            template_id: links.template_id,
            issued_by: links.issued_by.clone(),
            issued_at: c.issued_at(),
            is_revoked: c.is_revoked(),
            revoked_at: c.revoked_at(),
            revocation_reason: c.revocation().and_then(|r| r.reason.clone()),
        }
    }
}
