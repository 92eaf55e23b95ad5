//! # Store Contracts
//!
//! The registry's view of its collaborators. Both traits return `Send`
//! futures so a registry can be shared across Tokio tasks and used from
//! Axum handlers.
//!
//! ## Atomicity requirements
//!
//! - [`CertificateStore::insert`] must enforce credential-ID uniqueness
//!   atomically and report a collision as
//!   [`StoreError::DuplicateCredential`], never overwrite.
//! - [`CertificateStore::revoke_if_active`] must be a single conditional
//!   update (set-if-not-already-revoked) so concurrent revocations of the
//!   same certificate agree on one `revoked_at`.

use std::future::Future;

use uuid::Uuid;

use certreg_core::{CertificateTemplate, CourseReference, IssuedCertificate, Revocation};

use crate::error::StoreError;

/// Result of a revocation attempt on an existing certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevokeOutcome {
    /// The certificate was active and is now revoked.
    Revoked(IssuedCertificate),
    /// The certificate was already revoked; nothing changed.
    AlreadyRevoked(IssuedCertificate),
}

impl RevokeOutcome {
    /// The certificate as it stands after the attempt.
    pub fn certificate(&self) -> &IssuedCertificate {
        match self {
            Self::Revoked(c) | Self::AlreadyRevoked(c) => c,
        }
    }

    /// Consume the outcome, returning the certificate.
    pub fn into_certificate(self) -> IssuedCertificate {
        match self {
            Self::Revoked(c) | Self::AlreadyRevoked(c) => c,
        }
    }
}

/// Durable record store for issued certificates.
///
/// Certificates are never physically deleted, so there is no delete
/// operation.
pub trait CertificateStore: Send + Sync {
    /// Persist a newly issued certificate.
    ///
    /// Fails with [`StoreError::DuplicateCredential`] if its credential ID
    /// is already present.
    fn insert(
        &self,
        certificate: IssuedCertificate,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Exact, case-sensitive lookup by credential ID.
    fn find_by_credential(
        &self,
        credential_id: &str,
    ) -> impl Future<Output = Result<Option<IssuedCertificate>, StoreError>> + Send;

    /// Apply `revocation` if the certificate is not already revoked.
    ///
    /// Returns `None` if no certificate has this credential ID.
    fn revoke_if_active(
        &self,
        credential_id: &str,
        revocation: Revocation,
    ) -> impl Future<Output = Result<Option<RevokeOutcome>, StoreError>> + Send;

    /// All certificates linked to a course, oldest first.
    fn list_by_course(
        &self,
        course_id: Uuid,
    ) -> impl Future<Output = Result<Vec<IssuedCertificate>, StoreError>> + Send;
}

/// Read-only lookup of display metadata.
pub trait ReferenceResolver: Send + Sync {
    /// Resolve a course reference.
    fn course(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<CourseReference>, StoreError>> + Send;

    /// Resolve a certificate template.
    fn template(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<CertificateTemplate>, StoreError>> + Send;
}
