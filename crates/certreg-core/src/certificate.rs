//! # Issued Certificates
//!
//! The issuance record and the write-once snapshot of facts it certifies.
//!
//! An [`IssuedCertificate`] is created exactly once (issuance), may be
//! mutated exactly once (revocation), and is never deleted. Certified facts
//! are held in a [`CertificateFacts`] value that exposes no setters; a
//! correction means revoking the record and issuing a new one under a new
//! credential ID.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::identity::CredentialId;

/// Maximum length of any certified name field, in characters.
pub const MAX_NAME_LEN: usize = 255;

/// Maximum length of a revocation reason, in characters.
pub const MAX_REASON_LEN: usize = 1000;

/// Trim a text field and check it is non-empty and within `max` characters.
pub(crate) fn bounded_text(
    field: &'static str,
    value: impl Into<String>,
    max: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.into().trim().to_string();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    let actual = trimmed.chars().count();
    if actual > max {
        return Err(ValidationError::FieldTooLong { field, max, actual });
    }
    Ok(trimmed)
}

/// Current time, truncated to microseconds.
///
/// `TIMESTAMPTZ` columns keep microsecond precision; a timestamp handed back
/// at issuance or revocation must equal the one every later read returns.
pub fn stored_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

// ---------------------------------------------------------------------------
// Certified facts
// ---------------------------------------------------------------------------

/// Snapshot of the course-completion facts a certificate attests to.
///
/// Captured at issuance time and stored on the certificate row itself. The
/// snapshot is never recomputed from the live course or user profile, so a
/// certificate keeps saying what it said on the day it was issued even if
/// the course is renamed or the instructor account is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateFacts {
    student_name: String,
    course_name: String,
    instructor_name: String,
    course_hours: u32,
}

impl CertificateFacts {
    /// Build a validated snapshot.
    ///
    /// Names are trimmed and must be non-empty and at most
    /// [`MAX_NAME_LEN`] characters.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyField`] or
    /// [`ValidationError::FieldTooLong`] for the first offending field.
    pub fn new(
        student_name: impl Into<String>,
        course_name: impl Into<String>,
        instructor_name: impl Into<String>,
        course_hours: u32,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            student_name: bounded_text("student_name", student_name, MAX_NAME_LEN)?,
            course_name: bounded_text("course_name", course_name, MAX_NAME_LEN)?,
            instructor_name: bounded_text("instructor_name", instructor_name, MAX_NAME_LEN)?,
            course_hours,
        })
    }

    /// Name of the student the certificate was issued to.
    pub fn student_name(&self) -> &str {
        &self.student_name
    }

    /// Course name as it read at issuance.
    pub fn course_name(&self) -> &str {
        &self.course_name
    }

    /// Instructor name as it read at issuance.
    pub fn instructor_name(&self) -> &str {
        &self.instructor_name
    }

    /// Certified course hours.
    pub fn course_hours(&self) -> u32 {
        self.course_hours
    }
}

// ---------------------------------------------------------------------------
// Revocation
// ---------------------------------------------------------------------------

/// Record of a certificate's revocation.
///
/// Present on an [`IssuedCertificate`] if and only if it has been revoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Revocation {
    /// When the certificate was revoked.
    pub revoked_at: DateTime<Utc>,
    /// Optional free-text reason recorded by the revoking party.
    pub reason: Option<String>,
}

impl Revocation {
    /// Build a revocation stamped with the current time.
    ///
    /// A blank reason is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::FieldTooLong`] if the reason exceeds
    /// [`MAX_REASON_LEN`] characters.
    pub fn now(reason: Option<String>) -> Result<Self, ValidationError> {
        Self::at(stored_now(), reason)
    }

    /// Build a revocation with an explicit timestamp.
    ///
    /// # Errors
    ///
    /// Same as [`Revocation::now`].
    pub fn at(revoked_at: DateTime<Utc>, reason: Option<String>) -> Result<Self, ValidationError> {
        let reason = match reason {
            Some(r) if !r.trim().is_empty() => Some(bounded_text("reason", r, MAX_REASON_LEN)?),
            _ => None,
        };
        Ok(Self { revoked_at, reason })
    }
}

// ---------------------------------------------------------------------------
// Issued certificate
// ---------------------------------------------------------------------------

/// Links from a certificate to rendering metadata and to its issuer.
///
/// None of these are certified facts. The course and template are only used
/// to enrich a verification response; `issued_by` is used by the management
/// surface to decide who may revoke.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateLinks {
    /// Course the certificate was issued for, if known to the registry.
    pub course_id: Option<Uuid>,
    /// Template used to style the certificate.
    pub template_id: Option<Uuid>,
    /// Subject identifier of the account that issued the certificate.
    pub issued_by: Option<String>,
}

/// Raw field set of a persisted certificate.
///
/// Used by store implementations to rebuild an [`IssuedCertificate`] from a
/// row. The revocation columns are kept separate here so that
/// [`IssuedCertificate::from_parts`] can reject rows where they disagree.
#[derive(Debug, Clone)]
pub struct CertificateParts {
    /// Internal identifier.
    pub id: Uuid,
    /// Stored credential ID.
    pub credential_id: String,
    /// Stored certified facts.
    pub facts: CertificateFacts,
    /// Stored links.
    pub links: CertificateLinks,
    /// Issuance timestamp.
    pub issued_at: DateTime<Utc>,
    /// Stored revocation flag.
    pub is_revoked: bool,
    /// Stored revocation timestamp.
    pub revoked_at: Option<DateTime<Utc>>,
    /// Stored revocation reason.
    pub revocation_reason: Option<String>,
}

/// An issued completion certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedCertificate {
    id: Uuid,
    credential_id: CredentialId,
    facts: CertificateFacts,
    links: CertificateLinks,
    issued_at: DateTime<Utc>,
    revocation: Option<Revocation>,
}

impl IssuedCertificate {
    /// Create a new, unrevoked certificate with a fresh internal ID.
    pub fn issue(
        credential_id: CredentialId,
        facts: CertificateFacts,
        links: CertificateLinks,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            credential_id,
            facts,
            links,
            issued_at,
            revocation: None,
        }
    }

    /// Rebuild a certificate from persisted fields.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidCredentialId`] if the stored ID is
    /// not URL-safe, or [`ValidationError::InconsistentRevocation`] if the
    /// revocation flag and timestamp disagree.
    pub fn from_parts(parts: CertificateParts) -> Result<Self, ValidationError> {
        let credential_id = CredentialId::new(parts.credential_id)?;
        let revocation = match (parts.is_revoked, parts.revoked_at) {
            (true, Some(revoked_at)) => Some(Revocation {
                revoked_at,
                reason: parts.revocation_reason,
            }),
            (false, None) => None,
            (is_revoked, revoked_at) => {
                return Err(ValidationError::InconsistentRevocation {
                    is_revoked,
                    has_timestamp: revoked_at.is_some(),
                })
            }
        };
        Ok(Self {
            id: parts.id,
            credential_id,
            facts: parts.facts,
            links: parts.links,
            issued_at: parts.issued_at,
            revocation,
        })
    }

    /// Apply a revocation if none is present.
    ///
    /// Returns `true` if the revocation was applied, `false` if the
    /// certificate was already revoked (the existing record is kept).
    pub fn revoke(&mut self, revocation: Revocation) -> bool {
        if self.revocation.is_some() {
            return false;
        }
        self.revocation = Some(revocation);
        true
    }

    /// Internal identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Public credential ID.
    pub fn credential_id(&self) -> &CredentialId {
        &self.credential_id
    }

    /// Certified-fact snapshot.
    pub fn facts(&self) -> &CertificateFacts {
        &self.facts
    }

    /// Course, template, and issuer links.
    pub fn links(&self) -> &CertificateLinks {
        &self.links
    }

    /// Issuance timestamp.
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Revocation record, if revoked.
    pub fn revocation(&self) -> Option<&Revocation> {
        self.revocation.as_ref()
    }

    /// Whether the certificate has been revoked.
    pub fn is_revoked(&self) -> bool {
        self.revocation.is_some()
    }

    /// Revocation timestamp, present if and only if revoked.
    pub fn revoked_at(&self) -> Option<DateTime<Utc>> {
        self.revocation.as_ref().map(|r| r.revoked_at)
    }
}
