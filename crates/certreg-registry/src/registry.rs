//! # Certificate Registry
//!
//! Issuance, verification, and revocation over injected collaborators.
//!
//! ## Operations
//!
//! - [`CertificateRegistry::issue`] — snapshot the completion facts, mint a
//!   credential ID, persist. Collisions are regenerated, never surfaced.
//! - [`CertificateRegistry::verify`] — anonymous lookup returning one of
//!   three explicit outcomes. Unknown and malformed IDs are both
//!   [`VerificationResult::NotFound`].
//! - [`CertificateRegistry::revoke`] — one-way, idempotent.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use certreg_core::{
    stored_now, CertificateFacts, CertificateLinks, CertificateTemplate, CourseReference,
    IssuedCertificate, Revocation, MAX_CREDENTIAL_ID_LEN,
};

use crate::error::{RegistryError, StoreError};
use crate::generator::{CredentialIdGenerator, RandomCredentialIds};
use crate::store::{CertificateStore, ReferenceResolver, RevokeOutcome};

/// Number of credential IDs tried before issuance gives up.
pub const MAX_ISSUE_ATTEMPTS: u32 = 5;

/// Input to [`CertificateRegistry::issue`].
#[derive(Debug, Clone)]
pub struct IssueRequest {
    /// Snapshot of the facts being certified.
    pub facts: CertificateFacts,
    /// Course, template, and issuer links.
    pub links: CertificateLinks,
}

/// A found certificate together with its display metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedCertificate {
    /// The issuance record, snapshot included.
    pub certificate: IssuedCertificate,
    /// Template styling, if the certificate has one and it still exists.
    pub template: Option<CertificateTemplate>,
    /// Course metadata, if the certificate has one and it still exists.
    pub course: Option<CourseReference>,
}

/// Outcome of a verification lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResult {
    /// No certificate has this credential ID.
    NotFound,
    /// The certificate exists and is not revoked.
    Valid(VerifiedCertificate),
    /// The certificate exists and has been revoked.
    Revoked {
        /// The certificate and its display metadata.
        certificate: VerifiedCertificate,
        /// When it was revoked.
        revoked_at: DateTime<Utc>,
    },
}

impl VerificationResult {
    /// Short label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Valid(_) => "valid",
            Self::Revoked { .. } => "revoked",
        }
    }
}

/// The certificate registry.
///
/// Cheap to share behind an `Arc`; all state lives in the injected store.
pub struct CertificateRegistry<S, R> {
    store: S,
    references: R,
    ids: Arc<dyn CredentialIdGenerator>,
}

impl<S, R> std::fmt::Debug for CertificateRegistry<S, R>
where
    S: std::fmt::Debug,
    R: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateRegistry")
            .field("store", &self.store)
            .field("references", &self.references)
            .finish_non_exhaustive()
    }
}

impl<S, R> CertificateRegistry<S, R>
where
    S: CertificateStore,
    R: ReferenceResolver,
{
    /// Create a registry that mints IDs from the OS CSPRNG.
    pub fn new(store: S, references: R) -> Self {
        Self::with_generator(store, references, RandomCredentialIds)
    }

    /// Create a registry with a custom credential ID generator.
    pub fn with_generator(
        store: S,
        references: R,
        ids: impl CredentialIdGenerator + 'static,
    ) -> Self {
        Self {
            store,
            references,
            ids: Arc::new(ids),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The underlying reference resolver.
    pub fn references(&self) -> &R {
        &self.references
    }

    /// Issue a new certificate.
    ///
    /// Referenced course and template must resolve at issuance time. The
    /// certified facts are copied onto the record as given.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::UnknownCourse`] / [`RegistryError::UnknownTemplate`]
    ///   for dangling references.
    /// - [`RegistryError::CredentialGenerationExhausted`] if
    ///   [`MAX_ISSUE_ATTEMPTS`] generated IDs all collided.
    /// - [`RegistryError::Store`] on store failure.
    pub async fn issue(&self, request: IssueRequest) -> Result<IssuedCertificate, RegistryError> {
        if let Some(course_id) = request.links.course_id {
            if self.references.course(course_id).await?.is_none() {
                return Err(RegistryError::UnknownCourse(course_id));
            }
        }
        if let Some(template_id) = request.links.template_id {
            if self.references.template(template_id).await?.is_none() {
                return Err(RegistryError::UnknownTemplate(template_id));
            }
        }

        for attempt in 1..=MAX_ISSUE_ATTEMPTS {
            let certificate = IssuedCertificate::issue(
                self.ids.generate(),
                request.facts.clone(),
                request.links.clone(),
                stored_now(),
            );
            match self.store.insert(certificate.clone()).await {
                Ok(()) => {
                    tracing::info!(
                        credential_id = %certificate.credential_id(),
                        course_id = ?certificate.links().course_id,
                        issued_by = ?certificate.links().issued_by,
                        "certificate issued"
                    );
                    return Ok(certificate);
                }
                Err(StoreError::DuplicateCredential) => {
                    tracing::warn!(attempt, "credential ID collision, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::error!(
            attempts = MAX_ISSUE_ATTEMPTS,
            "credential ID generation exhausted; generator is not producing unique IDs"
        );
        Err(RegistryError::CredentialGenerationExhausted {
            attempts: MAX_ISSUE_ATTEMPTS,
        })
    }

    /// Verify a credential ID supplied by an anonymous caller.
    ///
    /// Matching is exact and case-sensitive. No format check is applied
    /// beyond a length bound, so a malformed ID and an absent one produce
    /// the same [`VerificationResult::NotFound`].
    ///
    /// # Errors
    ///
    /// Only store or resolver failures.
    pub async fn verify(&self, credential_id: &str) -> Result<VerificationResult, RegistryError> {
        if credential_id.is_empty() || credential_id.len() > MAX_CREDENTIAL_ID_LEN {
            tracing::debug!(len = credential_id.len(), "verification: out-of-range ID");
            return Ok(VerificationResult::NotFound);
        }

        let result = match self.store.find_by_credential(credential_id).await? {
            None => VerificationResult::NotFound,
            Some(certificate) => {
                let verified = self.decorate(certificate).await?;
                match verified.certificate.revoked_at() {
                    Some(revoked_at) => VerificationResult::Revoked {
                        certificate: verified,
                        revoked_at,
                    },
                    None => VerificationResult::Valid(verified),
                }
            }
        };

        tracing::info!(credential_id, outcome = result.as_str(), "verification");
        Ok(result)
    }

    /// Revoke a certificate.
    ///
    /// Revoking an already revoked certificate is a no-op that returns
    /// [`RevokeOutcome::AlreadyRevoked`] with the original `revoked_at`.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::NotFound`] if the credential ID is unknown.
    /// - [`RegistryError::Validation`] if the reason is too long.
    /// - [`RegistryError::Store`] on store failure.
    pub async fn revoke(
        &self,
        credential_id: &str,
        reason: Option<String>,
    ) -> Result<RevokeOutcome, RegistryError> {
        if credential_id.is_empty() || credential_id.len() > MAX_CREDENTIAL_ID_LEN {
            return Err(RegistryError::NotFound);
        }
        let revocation = Revocation::now(reason)?;

        match self
            .store
            .revoke_if_active(credential_id, revocation)
            .await?
        {
            Some(outcome @ RevokeOutcome::Revoked(_)) => {
                tracing::info!(credential_id, "certificate revoked");
                Ok(outcome)
            }
            Some(outcome @ RevokeOutcome::AlreadyRevoked(_)) => {
                tracing::debug!(credential_id, "revocation no-op: already revoked");
                Ok(outcome)
            }
            None => Err(RegistryError::NotFound),
        }
    }

    /// Management lookup by exact credential ID.
    pub async fn get(&self, credential_id: &str) -> Result<Option<IssuedCertificate>, RegistryError> {
        if credential_id.is_empty() || credential_id.len() > MAX_CREDENTIAL_ID_LEN {
            return Ok(None);
        }
        Ok(self.store.find_by_credential(credential_id).await?)
    }

    /// All certificates issued for a course, oldest first.
    pub async fn list_for_course(
        &self,
        course_id: Uuid,
    ) -> Result<Vec<IssuedCertificate>, RegistryError> {
        Ok(self.store.list_by_course(course_id).await?)
    }

    async fn decorate(
        &self,
        certificate: IssuedCertificate,
    ) -> Result<VerifiedCertificate, RegistryError> {
        let template = match certificate.links().template_id {
            Some(id) => self.references.template(id).await?,
            None => None,
        };
        let course = match certificate.links().course_id {
            Some(id) => self.references.course(id).await?,
            None => None,
        };
        Ok(VerifiedCertificate {
            certificate,
            template,
            course,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryCertificateStore, MemoryReferences};
    use certreg_core::CredentialId;
    use chrono::SubsecRound;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Yields the queued IDs in order, then repeats the last one.
    struct QueuedIds(Mutex<VecDeque<&'static str>>);

    impl QueuedIds {
        fn new(ids: &[&'static str]) -> Self {
            Self(Mutex::new(ids.iter().copied().collect()))
        }
    }

    impl CredentialIdGenerator for QueuedIds {
        fn generate(&self) -> CredentialId {
            let mut q = self.0.lock();
            let next = if q.len() > 1 {
                q.pop_front().unwrap()
            } else {
                *q.front().unwrap()
            };
            CredentialId::new(next).unwrap()
        }
    }

    type MemRegistry = CertificateRegistry<MemoryCertificateStore, MemoryReferences>;

    fn registry() -> MemRegistry {
        CertificateRegistry::new(MemoryCertificateStore::new(), MemoryReferences::new())
    }

    fn facts() -> CertificateFacts {
        CertificateFacts::new("Ada Lovelace", "Intro to Algorithms", "Grace Hopper", 40).unwrap()
    }

    fn request() -> IssueRequest {
        IssueRequest {
            facts: facts(),
            links: CertificateLinks::default(),
        }
    }

    #[tokio::test]
    async fn issue_persists_unrevoked_record() {
        let reg = registry();
        let before = Utc::now().trunc_subsecs(6);
        let cert = reg.issue(request()).await.unwrap();
        assert!(!cert.is_revoked());
        assert!(cert.issued_at() >= before);
        assert_eq!(reg.store().len(), 1);
        assert_eq!(reg.get(cert.credential_id().as_str()).await.unwrap(), Some(cert));
    }

    #[tokio::test]
    async fn issued_and_revoked_timestamps_are_microsecond_precision() {
        let reg = registry();
        let cert = reg.issue(request()).await.unwrap();
        assert_eq!(cert.issued_at(), cert.issued_at().trunc_subsecs(6));

        let outcome = reg
            .revoke(cert.credential_id().as_str(), None)
            .await
            .unwrap();
        let revoked_at = outcome.certificate().revoked_at().unwrap();
        assert_eq!(revoked_at, revoked_at.trunc_subsecs(6));
    }

    #[tokio::test]
    async fn issue_retries_after_collision() {
        let store = MemoryCertificateStore::new();
        let reg = CertificateRegistry::with_generator(
            store.clone(),
            MemoryReferences::new(),
            QueuedIds::new(&["CRED-taken", "CRED-taken", "CRED-fresh"]),
        );
        let first = reg.issue(request()).await.unwrap();
        assert_eq!(first.credential_id(), &"CRED-taken");

        let second = reg.issue(request()).await.unwrap();
        assert_eq!(second.credential_id(), &"CRED-fresh");
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn issue_gives_up_when_generator_always_collides() {
        let reg = CertificateRegistry::with_generator(
            MemoryCertificateStore::new(),
            MemoryReferences::new(),
            QueuedIds::new(&["CRED-stuck"]),
        );
        reg.issue(request()).await.unwrap();
        let err = reg.issue(request()).await.unwrap_err();
        assert!(matches!(
            err,
            RegistryError::CredentialGenerationExhausted {
                attempts: MAX_ISSUE_ATTEMPTS
            }
        ));
        assert_eq!(reg.store().len(), 1);
    }

    #[tokio::test]
    async fn issue_rejects_unknown_course_and_template() {
        let reg = registry();
        let course_id = Uuid::new_v4();
        let err = reg
            .issue(IssueRequest {
                facts: facts(),
                links: CertificateLinks {
                    course_id: Some(course_id),
                    ..Default::default()
                },
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownCourse(id) if id == course_id));

        let template_id = Uuid::new_v4();
        let err = reg
            .issue(IssueRequest {
                facts: facts(),
                links: CertificateLinks {
                    template_id: Some(template_id),
                    ..Default::default()
                },
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownTemplate(id) if id == template_id));
        assert!(reg.store().is_empty());
    }

    #[tokio::test]
    async fn verify_valid_includes_template_and_course() {
        let reg = registry();
        let course =
            CourseReference::new(Uuid::new_v4(), "Intro to Algorithms", "Grace Hopper", None)
                .unwrap();
        let template = CertificateTemplate::new("Classic", "#003366", "#ffcc00", None).unwrap();
        reg.references().upsert_course(course.clone());
        reg.references().upsert_template(template.clone());

        let cert = reg
            .issue(IssueRequest {
                facts: facts(),
                links: CertificateLinks {
                    course_id: Some(course.id),
                    template_id: Some(template.id),
                    issued_by: Some("instructor-1".into()),
                },
            })
            .await
            .unwrap();

        match reg.verify(cert.credential_id().as_str()).await.unwrap() {
            VerificationResult::Valid(v) => {
                assert_eq!(v.certificate, cert);
                assert_eq!(v.template, Some(template));
                assert_eq!(v.course, Some(course));
            }
            other => panic!("expected Valid, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn verify_unknown_and_malformed_are_both_not_found() {
        let reg = registry();
        for candidate in ["CRED-does-not-exist", "", "not a credential", "../../etc/passwd"] {
            assert_eq!(reg.verify(candidate).await.unwrap(), VerificationResult::NotFound);
        }
        let huge = "C".repeat(MAX_CREDENTIAL_ID_LEN + 1);
        assert_eq!(reg.verify(&huge).await.unwrap(), VerificationResult::NotFound);
    }

    #[tokio::test]
    async fn verify_after_revoke_reports_revocation_time() {
        let reg = registry();
        let cert = reg.issue(request()).await.unwrap();
        let id = cert.credential_id().as_str().to_string();

        let outcome = reg.revoke(&id, Some("plagiarism".into())).await.unwrap();
        let revoked_at = outcome.certificate().revoked_at().unwrap();

        match reg.verify(&id).await.unwrap() {
            VerificationResult::Revoked {
                certificate,
                revoked_at: at,
            } => {
                assert_eq!(at, revoked_at);
                assert_eq!(certificate.certificate.facts(), cert.facts());
                assert_eq!(
                    certificate.certificate.revocation().unwrap().reason.as_deref(),
                    Some("plagiarism")
                );
            }
            other => panic!("expected Revoked, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn second_revoke_is_silent_noop() {
        let reg = registry();
        let cert = reg.issue(request()).await.unwrap();
        let id = cert.credential_id().as_str();

        let first = reg.revoke(id, None).await.unwrap();
        assert!(matches!(first, RevokeOutcome::Revoked(_)));
        let second = reg.revoke(id, Some("again".into())).await.unwrap();
        assert!(matches!(second, RevokeOutcome::AlreadyRevoked(_)));
        assert_eq!(
            first.certificate().revoked_at(),
            second.certificate().revoked_at()
        );
        assert!(second.certificate().revocation().unwrap().reason.is_none());
    }

    #[tokio::test]
    async fn revoke_unknown_is_not_found() {
        let reg = registry();
        assert!(matches!(
            reg.revoke("CRED-missing", None).await,
            Err(RegistryError::NotFound)
        ));
        assert!(matches!(reg.revoke("", None).await, Err(RegistryError::NotFound)));
    }

    #[tokio::test]
    async fn revoke_with_overlong_reason_is_rejected_and_leaves_record_active() {
        let reg = registry();
        let cert = reg.issue(request()).await.unwrap();
        let id = cert.credential_id().as_str();
        let err = reg
            .revoke(id, Some("x".repeat(certreg_core::MAX_REASON_LEN + 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Validation(_)));
        assert!(matches!(
            reg.verify(id).await.unwrap(),
            VerificationResult::Valid(_)
        ));
    }

    #[tokio::test]
    async fn list_for_course_returns_only_that_course() {
        let reg = registry();
        let course =
            CourseReference::new(Uuid::new_v4(), "Intro to Algorithms", "Grace Hopper", None)
                .unwrap();
        reg.references().upsert_course(course.clone());
        let linked = IssueRequest {
            facts: facts(),
            links: CertificateLinks {
                course_id: Some(course.id),
                ..Default::default()
            },
        };
        reg.issue(linked.clone()).await.unwrap();
        reg.issue(linked).await.unwrap();
        reg.issue(request()).await.unwrap();

        assert_eq!(reg.list_for_course(course.id).await.unwrap().len(), 2);
        assert!(reg.list_for_course(Uuid::new_v4()).await.unwrap().is_empty());
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(VerificationResult::NotFound.as_str(), "not_found");
    }
}
