//! Issued certificate persistence operations.
//!
//! All functions take a `&PgPool` and operate on the `issued_certificates`
//! table. Rows are validated on the way out; a row that fails validation is
//! reported as [`StoreError::Corrupt`] rather than served.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use certreg_core::{CertificateFacts, CertificateLinks, CertificateParts, IssuedCertificate, Revocation};
use certreg_registry::{RevokeOutcome, StoreError};

use super::store_error;

const COLUMNS: &str = "id, credential_id, student_name, course_name, instructor_name,
     course_hours, course_id, template_id, issued_by, issued_at,
     is_revoked, revoked_at, revocation_reason";

/// Insert a newly issued certificate.
///
/// A credential ID collision surfaces as [`StoreError::DuplicateCredential`].
pub async fn insert(pool: &PgPool, record: &IssuedCertificate) -> Result<(), StoreError> {
    let facts = record.facts();
    let links = record.links();
    let revocation = record.revocation();
    sqlx::query(
        "INSERT INTO issued_certificates (id, credential_id, student_name, course_name,
         instructor_name, course_hours, course_id, template_id, issued_by, issued_at,
         is_revoked, revoked_at, revocation_reason)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
    )
    .bind(record.id())
    .bind(record.credential_id().as_str())
    .bind(facts.student_name())
    .bind(facts.course_name())
    .bind(facts.instructor_name())
    .bind(i64::from(facts.course_hours()))
    .bind(links.course_id)
    .bind(links.template_id)
    .bind(&links.issued_by)
    .bind(record.issued_at())
    .bind(record.is_revoked())
    .bind(revocation.map(|r| r.revoked_at))
    .bind(revocation.and_then(|r| r.reason.as_deref()))
    .execute(pool)
    .await
    .map_err(store_error)?;
    Ok(())
}

/// Fetch a certificate by exact credential ID.
pub async fn find_by_credential(
    pool: &PgPool,
    credential_id: &str,
) -> Result<Option<IssuedCertificate>, StoreError> {
    let row = sqlx::query_as::<_, CertificateRow>(&format!(
        "SELECT {COLUMNS} FROM issued_certificates WHERE credential_id = $1"
    ))
    .bind(credential_id)
    .fetch_optional(pool)
    .await
    .map_err(store_error)?;
    row.map(CertificateRow::into_record).transpose()
}

/// Revoke a certificate unless it is already revoked.
///
/// The conditional `UPDATE ... WHERE is_revoked = FALSE` is the atomic
/// step; when it touches no row the current record is read back to tell
/// "already revoked" from "not found".
pub async fn revoke_if_active(
    pool: &PgPool,
    credential_id: &str,
    revocation: &Revocation,
) -> Result<Option<RevokeOutcome>, StoreError> {
    let updated = sqlx::query_as::<_, CertificateRow>(&format!(
        "UPDATE issued_certificates
         SET is_revoked = TRUE, revoked_at = $2, revocation_reason = $3
         WHERE credential_id = $1 AND is_revoked = FALSE
         RETURNING {COLUMNS}"
    ))
    .bind(credential_id)
    .bind(revocation.revoked_at)
    .bind(revocation.reason.as_deref())
    .fetch_optional(pool)
    .await
    .map_err(store_error)?;

    if let Some(row) = updated {
        return Ok(Some(RevokeOutcome::Revoked(row.into_record()?)));
    }
    Ok(find_by_credential(pool, credential_id)
        .await?
        .map(RevokeOutcome::AlreadyRevoked))
}

/// List certificates issued for a course, oldest first.
pub async fn list_by_course(
    pool: &PgPool,
    course_id: Uuid,
) -> Result<Vec<IssuedCertificate>, StoreError> {
    let rows = sqlx::query_as::<_, CertificateRow>(&format!(
        "SELECT {COLUMNS} FROM issued_certificates
         WHERE course_id = $1 ORDER BY issued_at, credential_id"
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
    .map_err(store_error)?;
    rows.into_iter().map(CertificateRow::into_record).collect()
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct CertificateRow {
    id: Uuid,
    credential_id: String,
    student_name: String,
    course_name: String,
    instructor_name: String,
    course_hours: i64,
    course_id: Option<Uuid>,
    template_id: Option<Uuid>,
    issued_by: Option<String>,
    issued_at: DateTime<Utc>,
    is_revoked: bool,
    revoked_at: Option<DateTime<Utc>>,
    revocation_reason: Option<String>,
}

impl CertificateRow {
    fn into_record(self) -> Result<IssuedCertificate, StoreError> {
        let corrupt = |detail: String| {
            tracing::error!(credential_id = %self.credential_id, %detail, "corrupt certificate row");
            StoreError::Corrupt(format!("certificate {}: {detail}", self.credential_id))
        };
        let course_hours = u32::try_from(self.course_hours)
            .map_err(|_| corrupt(format!("course_hours out of range: {}", self.course_hours)))?;
        let facts = CertificateFacts::new(
            self.student_name.clone(),
            self.course_name.clone(),
            self.instructor_name.clone(),
            course_hours,
        )
        .map_err(|e| corrupt(e.to_string()))?;
        let parts = CertificateParts {
            id: self.id,
            credential_id: self.credential_id.clone(),
            facts,
            links: CertificateLinks {
                course_id: self.course_id,
                template_id: self.template_id,
                issued_by: self.issued_by.clone(),
            },
            issued_at: self.issued_at,
            is_revoked: self.is_revoked,
            revoked_at: self.revoked_at,
            revocation_reason: self.revocation_reason.clone(),
        };
        IssuedCertificate::from_parts(parts).map_err(|e| corrupt(e.to_string()))
    }
}
