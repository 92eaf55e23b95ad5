//! # In-Memory Stores
//!
//! Thread-safe, cloneable implementations of [`CertificateStore`] and
//! [`ReferenceResolver`] for development mode and tests.
//!
//! All operations are synchronous under a `parking_lot::RwLock` (never held
//! across `.await`) and are wrapped in ready futures. Check-and-insert and
//! check-and-revoke each run under a single write-lock acquisition, which
//! gives the same atomicity a unique index and a conditional `UPDATE` give
//! the PostgreSQL store. `parking_lot` locks do not poison, so a panicking
//! writer cannot wedge the store.

use std::collections::HashMap;
use std::future::{ready, Future};
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use certreg_core::{CertificateTemplate, CourseReference, IssuedCertificate, Revocation};

use crate::error::StoreError;
use crate::store::{CertificateStore, ReferenceResolver, RevokeOutcome};

/// In-memory certificate store keyed by credential ID.
#[derive(Debug, Clone, Default)]
pub struct MemoryCertificateStore {
    records: Arc<RwLock<HashMap<String, IssuedCertificate>>>,
}

impl MemoryCertificateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored certificates.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert_now(&self, certificate: IssuedCertificate) -> Result<(), StoreError> {
        let mut guard = self.records.write();
        let key = certificate.credential_id().as_str().to_string();
        if guard.contains_key(&key) {
            return Err(StoreError::DuplicateCredential);
        }
        guard.insert(key, certificate);
        Ok(())
    }

    fn revoke_now(&self, credential_id: &str, revocation: Revocation) -> Option<RevokeOutcome> {
        let mut guard = self.records.write();
        let record = guard.get_mut(credential_id)?;
        if record.revoke(revocation) {
            Some(RevokeOutcome::Revoked(record.clone()))
        } else {
            Some(RevokeOutcome::AlreadyRevoked(record.clone()))
        }
    }

    fn list_now(&self, course_id: Uuid) -> Vec<IssuedCertificate> {
        let mut matching: Vec<IssuedCertificate> = self
            .records
            .read()
            .values()
            .filter(|c| c.links().course_id == Some(course_id))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            a.issued_at()
                .cmp(&b.issued_at())
                .then_with(|| a.credential_id().cmp(b.credential_id()))
        });
        matching
    }
}

impl CertificateStore for MemoryCertificateStore {
    fn insert(
        &self,
        certificate: IssuedCertificate,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        ready(self.insert_now(certificate))
    }

    fn find_by_credential(
        &self,
        credential_id: &str,
    ) -> impl Future<Output = Result<Option<IssuedCertificate>, StoreError>> + Send {
        ready(Ok(self.records.read().get(credential_id).cloned()))
    }

    fn revoke_if_active(
        &self,
        credential_id: &str,
        revocation: Revocation,
    ) -> impl Future<Output = Result<Option<RevokeOutcome>, StoreError>> + Send {
        ready(Ok(self.revoke_now(credential_id, revocation)))
    }

    fn list_by_course(
        &self,
        course_id: Uuid,
    ) -> impl Future<Output = Result<Vec<IssuedCertificate>, StoreError>> + Send {
        ready(Ok(self.list_now(course_id)))
    }
}

/// In-memory course references and certificate templates.
#[derive(Debug, Clone, Default)]
pub struct MemoryReferences {
    courses: Arc<RwLock<HashMap<Uuid, CourseReference>>>,
    templates: Arc<RwLock<HashMap<Uuid, CertificateTemplate>>>,
}

impl MemoryReferences {
    /// Create an empty reference set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a course reference.
    pub fn upsert_course(&self, course: CourseReference) {
        self.courses.write().insert(course.id, course);
    }

    /// Remove a course reference, as when the course is deleted upstream.
    pub fn remove_course(&self, id: &Uuid) -> Option<CourseReference> {
        self.courses.write().remove(id)
    }

    /// Insert or replace a template.
    pub fn upsert_template(&self, template: CertificateTemplate) {
        self.templates.write().insert(template.id, template);
    }
}

impl ReferenceResolver for MemoryReferences {
    fn course(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<CourseReference>, StoreError>> + Send {
        ready(Ok(self.courses.read().get(&id).cloned()))
    }

    fn template(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<CertificateTemplate>, StoreError>> + Send {
        ready(Ok(self.templates.read().get(&id).cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certreg_core::{CertificateFacts, CertificateLinks, CredentialId};
    use chrono::{Duration, Utc};

    fn cert(credential: &str, course_id: Option<Uuid>) -> IssuedCertificate {
        IssuedCertificate::issue(
            CredentialId::new(credential).unwrap(),
            CertificateFacts::new("Ada Lovelace", "Intro to Algorithms", "Grace Hopper", 40)
                .unwrap(),
            CertificateLinks {
                course_id,
                ..Default::default()
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn insert_then_find() {
        let store = MemoryCertificateStore::new();
        store.insert(cert("CRED-a", None)).await.unwrap();
        let found = store.find_by_credential("CRED-a").await.unwrap().unwrap();
        assert_eq!(found.credential_id(), &"CRED-a");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected_without_overwrite() {
        let store = MemoryCertificateStore::new();
        let original = cert("CRED-a", None);
        store.insert(original.clone()).await.unwrap();

        let err = store.insert(cert("CRED-a", None)).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateCredential));

        let stored = store.find_by_credential("CRED-a").await.unwrap().unwrap();
        assert_eq!(stored.id(), original.id());
    }

    #[tokio::test]
    async fn lookup_is_exact() {
        let store = MemoryCertificateStore::new();
        store.insert(cert("CRED-abc", None)).await.unwrap();
        for candidate in ["cred-abc", "CRED-ab", "CRED-abcd", " CRED-abc", ""] {
            assert!(
                store.find_by_credential(candidate).await.unwrap().is_none(),
                "matched {candidate:?}"
            );
        }
    }

    #[tokio::test]
    async fn revoke_if_active_is_conditional() {
        let store = MemoryCertificateStore::new();
        store.insert(cert("CRED-a", None)).await.unwrap();

        let first_at = Utc::now();
        let outcome = store
            .revoke_if_active("CRED-a", Revocation::at(first_at, None).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(outcome, RevokeOutcome::Revoked(_)));

        let later = Revocation::at(first_at + Duration::minutes(5), None).unwrap();
        let outcome = store
            .revoke_if_active("CRED-a", later)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(outcome, RevokeOutcome::AlreadyRevoked(_)));
        assert_eq!(outcome.certificate().revoked_at(), Some(first_at));
    }

    #[tokio::test]
    async fn revoke_unknown_returns_none() {
        let store = MemoryCertificateStore::new();
        let result = store
            .revoke_if_active("CRED-missing", Revocation::now(None).unwrap())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn concurrent_revocations_agree_on_one_timestamp() {
        let store = MemoryCertificateStore::new();
        store.insert(cert("CRED-a", None)).await.unwrap();

        let base = Utc::now();
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let r = Revocation::at(base + Duration::seconds(i), None).unwrap();
                    store.revoke_if_active("CRED-a", r).await.unwrap().unwrap()
                })
            })
            .collect();

        let mut applied = 0;
        let mut timestamps = Vec::new();
        for h in handles {
            let outcome = h.await.unwrap();
            if matches!(outcome, RevokeOutcome::Revoked(_)) {
                applied += 1;
            }
            timestamps.push(outcome.certificate().revoked_at().unwrap());
        }
        assert_eq!(applied, 1);
        assert!(timestamps.windows(2).all(|w| w[0] == w[1]));
    }

    #[tokio::test]
    async fn list_by_course_filters_and_orders() {
        let store = MemoryCertificateStore::new();
        let course = Uuid::new_v4();
        let other = Uuid::new_v4();
        store.insert(cert("CRED-1", Some(course))).await.unwrap();
        store.insert(cert("CRED-2", Some(other))).await.unwrap();
        store.insert(cert("CRED-3", Some(course))).await.unwrap();
        store.insert(cert("CRED-4", None)).await.unwrap();

        let listed = store.list_by_course(course).await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|c| c.credential_id().as_str()).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&"CRED-1"));
        assert!(ids.contains(&"CRED-3"));
        assert!(listed
            .windows(2)
            .all(|w| w[0].issued_at() <= w[1].issued_at()));
    }

    #[tokio::test]
    async fn clones_share_records() {
        let store = MemoryCertificateStore::new();
        let clone = store.clone();
        clone.insert(cert("CRED-a", None)).await.unwrap();
        assert_eq!(store.len(), 1);
        assert!(!store.is_empty());
    }

    #[tokio::test]
    async fn references_resolve_and_remove() {
        let refs = MemoryReferences::new();
        let course =
            CourseReference::new(Uuid::new_v4(), "Intro to Algorithms", "Grace Hopper", None)
                .unwrap();
        let template = CertificateTemplate::new("Classic", "#003366", "#ffcc00", None).unwrap();
        refs.upsert_course(course.clone());
        refs.upsert_template(template.clone());

        assert_eq!(refs.course(course.id).await.unwrap(), Some(course.clone()));
        assert_eq!(refs.template(template.id).await.unwrap(), Some(template));

        assert!(refs.remove_course(&course.id).is_some());
        assert!(refs.course(course.id).await.unwrap().is_none());
    }
}
