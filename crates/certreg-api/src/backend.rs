//! # Storage Backend
//!
//! Runtime selection between the in-memory stores and PostgreSQL. The
//! registry is generic over its store; the API picks one concrete
//! [`Backend`] at startup and the registry sees a single type either way.

use sqlx::PgPool;
use uuid::Uuid;

use certreg_core::{CertificateTemplate, CourseReference, IssuedCertificate, Revocation};
use certreg_registry::{
    CertificateStore, MemoryCertificateStore, MemoryReferences, ReferenceResolver, RevokeOutcome,
    StoreError,
};

use crate::db;

/// Where certificates, templates, and course references live.
#[derive(Debug, Clone)]
pub enum Backend {
    /// Process-local stores. State is lost on restart.
    Memory {
        /// Issued certificates.
        certificates: MemoryCertificateStore,
        /// Templates and course references.
        references: MemoryReferences,
    },
    /// PostgreSQL via a shared connection pool.
    Postgres(PgPool),
}

impl Backend {
    /// Fresh, empty in-memory backend.
    pub fn memory() -> Self {
        Self::Memory {
            certificates: MemoryCertificateStore::new(),
            references: MemoryReferences::new(),
        }
    }

    /// Short label for logs and the readiness check.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Memory { .. } => "memory",
            Self::Postgres(_) => "postgres",
        }
    }

    /// The connection pool, when running on PostgreSQL.
    pub fn pool(&self) -> Option<&PgPool> {
        match self {
            Self::Postgres(pool) => Some(pool),
            Self::Memory { .. } => None,
        }
    }

    /// Persist a new certificate template.
    pub async fn save_template(&self, template: &CertificateTemplate) -> Result<(), StoreError> {
        match self {
            Self::Memory { references, .. } => {
                references.upsert_template(template.clone());
                Ok(())
            }
            Self::Postgres(pool) => db::references::insert_template(pool, template).await,
        }
    }

    /// Register or refresh a course reference.
    pub async fn upsert_course(&self, course: &CourseReference) -> Result<(), StoreError> {
        match self {
            Self::Memory { references, .. } => {
                references.upsert_course(course.clone());
                Ok(())
            }
            Self::Postgres(pool) => db::references::upsert_course(pool, course).await,
        }
    }
}

impl Default for Backend {
    fn default() -> Self {
        Self::memory()
    }
}

impl CertificateStore for Backend {
    async fn insert(&self, certificate: IssuedCertificate) -> Result<(), StoreError> {
        match self {
            Self::Memory { certificates, .. } => certificates.insert(certificate).await,
            Self::Postgres(pool) => db::certificates::insert(pool, &certificate).await,
        }
    }

    async fn find_by_credential(
        &self,
        credential_id: &str,
    ) -> Result<Option<IssuedCertificate>, StoreError> {
        match self {
            Self::Memory { certificates, .. } => {
                certificates.find_by_credential(credential_id).await
            }
            Self::Postgres(pool) => db::certificates::find_by_credential(pool, credential_id).await,
        }
    }

    async fn revoke_if_active(
        &self,
        credential_id: &str,
        revocation: Revocation,
    ) -> Result<Option<RevokeOutcome>, StoreError> {
        match self {
            Self::Memory { certificates, .. } => {
                certificates.revoke_if_active(credential_id, revocation).await
            }
            Self::Postgres(pool) => {
                db::certificates::revoke_if_active(pool, credential_id, &revocation).await
            }
        }
    }

    async fn list_by_course(&self, course_id: Uuid) -> Result<Vec<IssuedCertificate>, StoreError> {
        match self {
            Self::Memory { certificates, .. } => certificates.list_by_course(course_id).await,
            Self::Postgres(pool) => db::certificates::list_by_course(pool, course_id).await,
        }
    }
}

impl ReferenceResolver for Backend {
    async fn course(&self, id: Uuid) -> Result<Option<CourseReference>, StoreError> {
        match self {
            Self::Memory { references, .. } => references.course(id).await,
            Self::Postgres(pool) => db::references::get_course(pool, id).await,
        }
    }

    async fn template(&self, id: Uuid) -> Result<Option<CertificateTemplate>, StoreError> {
        match self {
            Self::Memory { references, .. } => references.template(id).await,
            Self::Postgres(pool) => db::references::get_template(pool, id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certreg_core::{CertificateFacts, CertificateLinks, CredentialId};
    use chrono::Utc;

    #[tokio::test]
    async fn memory_backend_round_trips_references() {
        let backend = Backend::memory();
        assert_eq!(backend.kind(), "memory");
        assert!(backend.pool().is_none());

        let template = CertificateTemplate::new("Classic", "#003366", "#ffcc00", None).unwrap();
        backend.save_template(&template).await.unwrap();
        assert_eq!(backend.template(template.id).await.unwrap(), Some(template));

        let course =
            CourseReference::new(Uuid::new_v4(), "Intro to Algorithms", "Grace Hopper", None)
                .unwrap();
        backend.upsert_course(&course).await.unwrap();
        let renamed = CourseReference {
            title: "Algorithms I".to_string(),
            ..course.clone()
        };
        backend.upsert_course(&renamed).await.unwrap();
        assert_eq!(backend.course(course.id).await.unwrap(), Some(renamed));
    }

    #[tokio::test]
    async fn memory_backend_dispatches_certificate_store() {
        let backend = Backend::default();
        let cert = IssuedCertificate::issue(
            CredentialId::new("CRED-abc").unwrap(),
            CertificateFacts::new("Ada Lovelace", "Intro to Algorithms", "Grace Hopper", 40)
                .unwrap(),
            CertificateLinks::default(),
            Utc::now(),
        );
        backend.insert(cert.clone()).await.unwrap();
        assert!(matches!(
            backend.insert(cert).await,
            Err(StoreError::DuplicateCredential)
        ));
        let outcome = backend
            .revoke_if_active("CRED-abc", Revocation::now(None).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(outcome, RevokeOutcome::Revoked(_)));
    }
}
